// src/motion/controller.rs - Owns the plotter state and executes moves on the actuators
use serde::Serialize;
use std::time::Duration;

use super::arc::{ArcError, ArcInterpolator, ArcSpec};
use super::kinematics::{Kinematics, Point, StepPair, WallKinematics};
use super::stepper::{CoordinatedMove, Direction, DirectionInvert, Motor};
use super::MotionError;
use crate::config::Config;
use crate::hardware::{Actuators, PenState};

/// Where the pen is, in both representations.
///
/// `steps` is always the kinematics of `position`; both change together once
/// a move has completed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlotterState {
    pub position: Point,
    pub pen: PenState,
    pub steps: StepPair,
}

/// Counters for pulses and pen transitions issued so far.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MotionStats {
    pub moves: u64,
    pub pulses_m1: u64,
    pub pulses_m2: u64,
    pub pen_transitions: u64,
    pub degenerate_arcs: u64,
}

pub struct MotionController {
    kinematics: WallKinematics,
    invert: DirectionInvert,
    interpolator: ArcInterpolator,
    step_interval: Duration,
    pen_settle: Duration,
    state: PlotterState,
    actuators: Actuators,
    stats: MotionStats,
}

impl MotionController {
    /// Start at `config.machine.start` with the pen up.
    pub fn new(config: &Config, actuators: Actuators) -> Self {
        let kinematics = WallKinematics::new(config.anchors());
        let start = config.start();
        let state = PlotterState {
            position: start,
            pen: PenState::Up,
            steps: kinematics.cartesian_to_motors(start),
        };
        tracing::info!(
            "Motion controller ready at {} ({}), {:.5} mm/step",
            start,
            state.steps,
            kinematics.mm_per_step()
        );
        Self {
            kinematics,
            invert: DirectionInvert {
                m1: config.motors.invert_m1,
                m2: config.motors.invert_m2,
            },
            interpolator: ArcInterpolator::new(
                config.arc.segment_length,
                config.arc.correction_interval,
            ),
            step_interval: config.motors.step_interval(),
            pen_settle: config.pen.settle_delay(),
            state,
            actuators,
            stats: MotionStats::default(),
        }
    }

    pub fn state(&self) -> &PlotterState {
        &self.state
    }

    pub fn stats(&self) -> &MotionStats {
        &self.stats
    }

    pub fn kinematics(&self) -> &WallKinematics {
        &self.kinematics
    }

    /// Time reported by the injected clock.
    pub fn elapsed(&self) -> Duration {
        self.actuators.clock.elapsed()
    }

    /// Hand the actuators back, e.g. to reuse them for another job.
    pub fn into_actuators(self) -> Actuators {
        self.actuators
    }

    /// Single coordinated move: kinematics of `target`, then one Bresenham
    /// pulse sequence from the current step pair.
    pub fn move_to(&mut self, target: Point) -> Result<(), MotionError> {
        if !self.kinematics.is_valid_position(target) {
            tracing::warn!("Target {} lies outside the drawing area", target);
        }
        let target_steps = self.kinematics.cartesian_to_motors(target);
        let plan = CoordinatedMove::new(self.state.steps, target_steps, self.invert);
        tracing::debug!(
            "Move {} -> {} ({} -> {}, major {:?} {} / minor {})",
            self.state.position,
            target,
            self.state.steps,
            target_steps,
            plan.major_motor(),
            plan.major_steps(),
            plan.minor_steps()
        );

        for pulse in plan {
            self.actuators.motor(pulse.motor).step(pulse.direction)?;
            match pulse.motor {
                Motor::M1 => self.stats.pulses_m1 += 1,
                Motor::M2 => self.stats.pulses_m2 += 1,
            }
            if pulse.major {
                self.actuators.clock.sleep(self.step_interval);
            }
        }

        // Snap to the target rather than accumulating pulses
        self.state.steps = target_steps;
        self.state.position = target;
        self.stats.moves += 1;
        Ok(())
    }

    /// Straight line to `target`, subdivided so no sub-move is longer than
    /// one step length.
    pub fn line_to(&mut self, target: Point) -> Result<(), MotionError> {
        let start = self.state.position;
        let distance = start.distance(target);
        let spacing = self.kinematics.mm_per_step();
        if distance <= spacing {
            return self.move_to(target);
        }

        let segments = (distance / spacing).ceil() as u64;
        tracing::debug!("Line {} -> {} in {} segments", start, target, segments);
        for i in 1..segments {
            self.move_to(start.lerp(target, i as f64 / segments as f64))?;
        }
        self.move_to(target)
    }

    /// Arc from the current position to `destination` around
    /// `current - offset`. Returns `false` when the arc was too short to draw.
    pub fn arc_to(
        &mut self,
        destination: Point,
        offset: Point,
        clockwise: bool,
    ) -> Result<bool, MotionError> {
        let spec = ArcSpec {
            current: self.state.position,
            destination,
            offset,
            clockwise,
        };
        let path = match self.interpolator.interpolate(&spec) {
            Ok(path) => path,
            Err(ArcError::Degenerate { travel_mm }) => {
                tracing::debug!("Skipping degenerate arc ({} mm)", travel_mm);
                self.stats.degenerate_arcs += 1;
                return Ok(false);
            }
        };
        tracing::debug!(
            "Arc {} -> {} around {}: {:.3} mm in {} segments",
            spec.current,
            destination,
            path.center,
            path.travel_mm(),
            path.segments
        );
        for point in path.points {
            self.move_to(point)?;
        }
        Ok(true)
    }

    /// Raise or lower the pen and wait for the servo to settle.
    pub fn set_pen(&mut self, pen: PenState) -> Result<(), MotionError> {
        self.actuators.pen.set(pen)?;
        self.actuators.clock.sleep(self.pen_settle);
        self.state.pen = pen;
        self.stats.pen_transitions += 1;
        Ok(())
    }

    /// Pulse one motor by `steps` for calibration.
    ///
    /// The tracked state is left alone: jogging is how the carriage is
    /// brought to the position the controller already assumes.
    pub fn jog(&mut self, motor: Motor, steps: i64) -> Result<(), MotionError> {
        let direction = Direction::for_delta(steps, self.invert.for_motor(motor));
        tracing::info!("Jogging {:?} by {} steps", motor, steps);
        for _ in 0..steps.unsigned_abs() {
            self.actuators.motor(motor).step(direction)?;
            self.actuators.clock.sleep(self.step_interval);
        }
        match motor {
            Motor::M1 => self.stats.pulses_m1 += steps.unsigned_abs(),
            Motor::M2 => self.stats.pulses_m2 += steps.unsigned_abs(),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::{SimulatedHardware, Trace, VirtualClock};

    fn controller(config: &Config) -> (MotionController, Trace) {
        let (hw, trace) = SimulatedHardware::build(config, Box::new(VirtualClock::new())).unwrap();
        (MotionController::new(config, hw), trace)
    }

    fn config() -> Config {
        let mut config = Config::default();
        config.motors.mm_per_step = Some(0.1);
        config.motors.invert_m1 = false;
        config
    }

    #[test]
    fn test_initial_state_matches_kinematics() {
        let config = config();
        let (mc, trace) = controller(&config);
        assert_eq!(mc.state().position, Point::ORIGIN);
        assert_eq!(mc.state().steps, StepPair::new(2358, 2358));
        assert_eq!(mc.state().pen, PenState::Up);
        assert!(trace.is_empty());
    }

    #[test]
    fn test_move_to_emits_step_deltas() {
        let config = config();
        let (mut mc, trace) = controller(&config);
        let before = mc.state().steps;
        let target = Point::new(-125.0, 100.0);
        mc.move_to(target).unwrap();

        let after = mc.state().steps;
        assert_eq!(after, mc.kinematics().cartesian_to_motors(target));
        assert_eq!(trace.net_steps(Motor::M1), after.m1 - before.m1);
        assert_eq!(trace.net_steps(Motor::M2), after.m2 - before.m2);
        assert_eq!(mc.state().position, target);
    }

    #[test]
    fn test_line_to_keeps_state_consistent() {
        let config = config();
        let (mut mc, trace) = controller(&config);
        let start = mc.state().steps;
        mc.line_to(Point::new(30.0, -20.0)).unwrap();
        let end = mc.state().steps;
        assert_eq!(end, mc.kinematics().cartesian_to_motors(Point::new(30.0, -20.0)));
        assert_eq!(trace.net_steps(Motor::M1), end.m1 - start.m1);
        assert_eq!(trace.net_steps(Motor::M2), end.m2 - start.m2);
        // sqrt(30^2 + 20^2) / 0.1 -> 361 sub-moves
        assert_eq!(mc.stats().moves, 361);
    }

    #[test]
    fn test_short_line_is_direct() {
        let config = config();
        let (mut mc, _) = controller(&config);
        mc.line_to(Point::new(0.05, 0.0)).unwrap();
        assert_eq!(mc.stats().moves, 1);
    }

    #[test]
    fn test_inverted_motor_reverses_pulses() {
        let mut config = config();
        config.motors.invert_m1 = true;
        let (mut mc, trace) = controller(&config);
        let before = mc.state().steps;
        mc.move_to(Point::new(-50.0, 0.0)).unwrap();
        let delta = mc.state().steps.m1 - before.m1;
        assert!(delta < 0);
        assert_eq!(trace.net_steps(Motor::M1), -delta);
    }

    #[test]
    fn test_degenerate_arc_is_noop() {
        let config = config();
        let (mut mc, trace) = controller(&config);
        let drawn = mc.arc_to(Point::ORIGIN, Point::ORIGIN, false).unwrap();
        assert!(!drawn);
        assert!(trace.is_empty());
        assert_eq!(mc.stats().degenerate_arcs, 1);
    }

    #[test]
    fn test_full_circle_returns_to_start() {
        let config = config();
        let (mut mc, trace) = controller(&config);
        let start = mc.state().steps;
        assert!(mc.arc_to(Point::ORIGIN, Point::new(20.0, 0.0), true).unwrap());
        assert_eq!(mc.state().steps, start);
        assert_eq!(trace.net_steps(Motor::M1), 0);
        assert_eq!(trace.net_steps(Motor::M2), 0);
        assert!(trace.step_count(Motor::M1) > 0);
    }

    #[test]
    fn test_pen_settles_on_clock() {
        let config = config();
        let (mut mc, trace) = controller(&config);
        mc.set_pen(PenState::Down).unwrap();
        assert_eq!(mc.state().pen, PenState::Down);
        assert_eq!(mc.elapsed(), Duration::from_millis(500));
        assert_eq!(trace.pen_states(), vec![PenState::Down]);
    }

    #[test]
    fn test_jog_leaves_state_untouched() {
        let config = config();
        let (mut mc, trace) = controller(&config);
        let before = *mc.state();
        mc.jog(Motor::M2, -100).unwrap();
        assert_eq!(*mc.state(), before);
        assert_eq!(trace.net_steps(Motor::M2), -100);
        assert_eq!(trace.step_count(Motor::M1), 0);
    }
}
