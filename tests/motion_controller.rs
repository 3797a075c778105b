// Integration tests for the motion controller against simulated actuators

#[cfg(test)]
mod tests {
    use std::time::Duration;
    use wallplot_rs::hardware::{ActuatorEvent, PenState, SimulatedHardware, Trace, VirtualClock};
    use wallplot_rs::motion::{CoordinatedMove, DirectionInvert, Kinematics, Motor};
    use wallplot_rs::{Config, MotionController, Point};

    fn create_test_config() -> Config {
        let mut config = Config::default();
        config.motors.mm_per_step = Some(0.1);
        config.motors.steps_per_second = 1000.0;
        config
    }

    fn create_controller(config: &Config) -> (MotionController, Trace) {
        let (hw, trace) = SimulatedHardware::build(config, Box::new(VirtualClock::new())).unwrap();
        (MotionController::new(config, hw), trace)
    }

    #[test]
    fn test_line_is_subdivided_at_step_length() {
        let config = create_test_config();
        let (mut mc, trace) = create_controller(&config);
        let target = Point::new(30.0, -20.0);
        mc.line_to(target).unwrap();

        // 36.06 mm at 0.1 mm per sub-move
        assert_eq!(mc.stats().moves, 361);
        assert_eq!(mc.state().position, target);
        assert_eq!(mc.state().steps, mc.kinematics().cartesian_to_motors(target));
        assert_eq!(trace.step_count(Motor::M1) as u64, mc.stats().pulses_m1);
        assert_eq!(trace.step_count(Motor::M2) as u64, mc.stats().pulses_m2);
    }

    #[test]
    fn test_inverted_motor_net_steps() {
        let config = create_test_config();
        let (mut mc, trace) = create_controller(&config);
        let before = mc.state().steps;
        mc.move_to(Point::new(-40.0, 60.0)).unwrap();
        let after = mc.state().steps;

        // M1 is mounted inverted by default, M2 is not
        assert_eq!(trace.net_steps(Motor::M1), -(after.m1 - before.m1));
        assert_eq!(trace.net_steps(Motor::M2), after.m2 - before.m2);
    }

    #[test]
    fn test_one_interval_per_major_pulse() {
        let config = create_test_config();
        let (mut mc, _trace) = create_controller(&config);
        let from = mc.state().steps;
        let target = Point::new(20.0, 5.0);
        let to = mc.kinematics().cartesian_to_motors(target);
        let major = CoordinatedMove::new(from, to, DirectionInvert::default()).major_steps();

        mc.move_to(target).unwrap();
        assert_eq!(mc.elapsed(), Duration::from_millis(major));
    }

    #[test]
    fn test_zero_move_emits_nothing() {
        let config = create_test_config();
        let (mut mc, trace) = create_controller(&config);
        mc.move_to(Point::ORIGIN).unwrap();
        assert!(trace.is_empty());
        assert_eq!(mc.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_pen_waits_for_settle() {
        let config = create_test_config();
        let (mut mc, trace) = create_controller(&config);
        mc.set_pen(PenState::Down).unwrap();
        assert_eq!(mc.state().pen, PenState::Down);
        assert_eq!(mc.elapsed(), Duration::from_millis(500));
        assert_eq!(trace.events(), vec![ActuatorEvent::Pen(PenState::Down)]);
    }

    #[test]
    fn test_full_circle_returns_to_start() {
        let config = create_test_config();
        let (mut mc, trace) = create_controller(&config);
        let start = Point::new(20.0, 0.0);
        mc.move_to(start).unwrap();
        let start_steps = mc.state().steps;
        trace.clear();

        // Center at current - offset = origin
        assert!(mc.arc_to(start, Point::new(20.0, 0.0), false).unwrap());
        assert_eq!(mc.state().position, start);
        assert_eq!(mc.state().steps, start_steps);
        assert_eq!(trace.net_steps(Motor::M1), 0);
        assert_eq!(trace.net_steps(Motor::M2), 0);
        assert!(trace.step_count(Motor::M1) > 0);
    }

    #[test]
    fn test_degenerate_arc_is_skipped() {
        let config = create_test_config();
        let (mut mc, trace) = create_controller(&config);
        let drawn = mc.arc_to(Point::ORIGIN, Point::ORIGIN, true).unwrap();
        assert!(!drawn);
        assert!(trace.is_empty());
        assert_eq!(mc.stats().degenerate_arcs, 1);
        assert_eq!(mc.state().position, Point::ORIGIN);
    }

    #[test]
    fn test_jog_leaves_state_alone() {
        let config = create_test_config();
        let (mut mc, trace) = create_controller(&config);
        let before = *mc.state();
        mc.jog(Motor::M2, -12).unwrap();
        mc.jog(Motor::M1, 5).unwrap();

        assert_eq!(*mc.state(), before);
        assert_eq!(trace.net_steps(Motor::M2), -12);
        assert_eq!(trace.net_steps(Motor::M1), -5);
        assert_eq!(mc.elapsed(), Duration::from_millis(17));
    }
}
