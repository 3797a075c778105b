// src/hardware/sim.rs - Simulated actuators that record every call
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{
    Actuators, Clock, HardwareError, PenActuator, PenState, PwmOutput, ServoPen, StepMotor,
};
use crate::config::Config;
use crate::motion::stepper::{Direction, Motor};

/// One observable actuator call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ActuatorEvent {
    Step { motor: Motor, direction: Direction },
    Pen(PenState),
}

/// Shared, ordered log of actuator calls.
#[derive(Debug, Clone, Default)]
pub struct Trace {
    events: Arc<Mutex<Vec<ActuatorEvent>>>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ActuatorEvent>> {
        // A panicking recorder leaves the log intact
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn push(&self, event: ActuatorEvent) {
        self.lock().push(event);
    }

    pub fn events(&self) -> Vec<ActuatorEvent> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of step pulses sent to `motor`.
    pub fn step_count(&self, motor: Motor) -> usize {
        self.lock()
            .iter()
            .filter(|e| matches!(e, ActuatorEvent::Step { motor: m, .. } if *m == motor))
            .count()
    }

    /// Net signed steps sent to `motor`.
    pub fn net_steps(&self, motor: Motor) -> i64 {
        self.lock()
            .iter()
            .map(|e| match e {
                ActuatorEvent::Step { motor: m, direction } if *m == motor => direction.sign(),
                _ => 0,
            })
            .sum()
    }

    /// Pen transitions in order.
    pub fn pen_states(&self) -> Vec<PenState> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                ActuatorEvent::Pen(state) => Some(*state),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug)]
pub struct SimMotor {
    motor: Motor,
    trace: Trace,
}

impl SimMotor {
    pub fn new(motor: Motor, trace: Trace) -> Self {
        Self { motor, trace }
    }
}

impl StepMotor for SimMotor {
    fn step(&mut self, direction: Direction) -> Result<(), HardwareError> {
        tracing::trace!("{:?} step {:?}", self.motor, direction);
        self.trace.push(ActuatorEvent::Step { motor: self.motor, direction });
        Ok(())
    }
}

/// PWM channel that only remembers what it was told.
#[derive(Debug, Default)]
pub struct SimPwm {
    freq: Option<u32>,
    duty: Option<u16>,
}

impl SimPwm {
    pub fn freq(&self) -> Option<u32> {
        self.freq
    }

    pub fn duty(&self) -> Option<u16> {
        self.duty
    }
}

impl PwmOutput for SimPwm {
    fn set_freq(&mut self, hz: u32) -> Result<(), HardwareError> {
        self.freq = Some(hz);
        Ok(())
    }

    fn set_duty_u16(&mut self, duty: u16) -> Result<(), HardwareError> {
        self.duty = Some(duty);
        Ok(())
    }
}

/// Records pen transitions, then forwards them to the wrapped actuator.
#[derive(Debug)]
pub struct RecordingPen<P> {
    inner: P,
    trace: Trace,
}

impl<P: PenActuator> RecordingPen<P> {
    pub fn new(inner: P, trace: Trace) -> Self {
        Self { inner, trace }
    }
}

impl<P: PenActuator> PenActuator for RecordingPen<P> {
    fn set(&mut self, state: PenState) -> Result<(), HardwareError> {
        self.trace.push(ActuatorEvent::Pen(state));
        self.inner.set(state)
    }
}

/// Builds a full set of simulated actuators sharing one trace.
pub struct SimulatedHardware;

impl SimulatedHardware {
    pub fn build(config: &Config, clock: Box<dyn Clock>) -> Result<(Actuators, Trace), HardwareError> {
        let trace = Trace::new();
        let servo = ServoPen::new(SimPwm::default(), &config.pen)?;
        let actuators = Actuators::new(
            Box::new(SimMotor::new(Motor::M1, trace.clone())),
            Box::new(SimMotor::new(Motor::M2, trace.clone())),
            Box::new(RecordingPen::new(servo, trace.clone())),
            clock,
        );
        Ok((actuators, trace))
    }
}
