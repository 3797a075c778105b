// src/hardware/mod.rs - Actuator interfaces consumed by the motion core
pub mod servo;
pub mod sim;

use serde::Serialize;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::motion::stepper::{Direction, Motor};

pub use servo::{PwmOutput, ServoPen};
pub use sim::{ActuatorEvent, SimPwm, SimulatedHardware, Trace};

#[derive(Debug, Error)]
pub enum HardwareError {
    #[error("Motor {motor:?} fault: {reason}")]
    Motor { motor: Motor, reason: String },
    #[error("Pen actuator fault: {0}")]
    Pen(String),
}

/// Pen carriage state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum PenState {
    #[default]
    Up,
    Down,
}

// Trait-based interfaces so the motion logic never owns concrete hardware.

pub trait StepMotor: Send {
    /// Advance the motor by one physical step.
    fn step(&mut self, direction: Direction) -> Result<(), HardwareError>;
}

pub trait PenActuator: Send {
    fn set(&mut self, state: PenState) -> Result<(), HardwareError>;
}

/// Source of delays between pulses and after pen moves.
pub trait Clock: Send {
    fn sleep(&mut self, duration: Duration);
    /// Total time spent in `sleep` (or wall time, for real clocks) so far.
    fn elapsed(&self) -> Duration;
}

/// Blocks the calling thread for every delay.
#[derive(Debug)]
pub struct SystemClock {
    started: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { started: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }

    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Accumulates requested delays without waiting.
#[derive(Debug, Default, Clone)]
pub struct VirtualClock {
    now: Duration,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for VirtualClock {
    fn sleep(&mut self, duration: Duration) {
        self.now += duration;
    }

    fn elapsed(&self) -> Duration {
        self.now
    }
}

/// Everything the motion executor drives: both motors, the pen and a clock.
pub struct Actuators {
    pub m1: Box<dyn StepMotor>,
    pub m2: Box<dyn StepMotor>,
    pub pen: Box<dyn PenActuator>,
    pub clock: Box<dyn Clock>,
}

impl Actuators {
    pub fn new(
        m1: Box<dyn StepMotor>,
        m2: Box<dyn StepMotor>,
        pen: Box<dyn PenActuator>,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self { m1, m2, pen, clock }
    }

    pub fn motor(&mut self, motor: Motor) -> &mut dyn StepMotor {
        match motor {
            Motor::M1 => self.m1.as_mut(),
            Motor::M2 => self.m2.as_mut(),
        }
    }
}

impl std::fmt::Debug for Actuators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Actuators").finish_non_exhaustive()
    }
}
