// src/hardware/servo.rs - Hobby servo pen lift driven by a 50 Hz PWM output
use super::{HardwareError, PenActuator, PenState};
use crate::config::PenConfig;

pub const SERVO_PWM_FREQ_HZ: u32 = 50;

/// A PWM channel with a 16-bit duty cycle.
pub trait PwmOutput: Send {
    fn set_freq(&mut self, hz: u32) -> Result<(), HardwareError>;
    fn set_duty_u16(&mut self, duty: u16) -> Result<(), HardwareError>;
}

/// Maps pen states to servo angles and angles to duty cycles.
#[derive(Debug)]
pub struct ServoPen<P: PwmOutput> {
    pwm: P,
    up_angle: f64,
    down_angle: f64,
    min_duty: u16,
    max_duty: u16,
    current_angle: Option<f64>,
}

impl<P: PwmOutput> ServoPen<P> {
    pub fn new(mut pwm: P, config: &PenConfig) -> Result<Self, HardwareError> {
        pwm.set_freq(SERVO_PWM_FREQ_HZ)?;
        Ok(Self {
            pwm,
            up_angle: config.up_angle,
            down_angle: config.down_angle,
            min_duty: config.servo_min_duty,
            max_duty: config.servo_max_duty,
            current_angle: None,
        })
    }

    /// Duty cycle for `angle`, clamped to the servo's 0..=180 degree range.
    pub fn angle_to_duty(&self, angle: f64) -> u16 {
        let angle = angle.clamp(0.0, 180.0);
        let span = self.max_duty as f64 - self.min_duty as f64;
        (self.min_duty as f64 + span * angle / 180.0) as u16
    }

    pub fn write_angle(&mut self, angle: f64) -> Result<(), HardwareError> {
        let angle = angle.clamp(0.0, 180.0);
        let duty = self.angle_to_duty(angle);
        self.pwm.set_duty_u16(duty)?;
        self.current_angle = Some(angle);
        Ok(())
    }

    pub fn current_angle(&self) -> Option<f64> {
        self.current_angle
    }

    pub fn pwm(&self) -> &P {
        &self.pwm
    }
}

impl<P: PwmOutput> PenActuator for ServoPen<P> {
    fn set(&mut self, state: PenState) -> Result<(), HardwareError> {
        let angle = match state {
            PenState::Up => self.up_angle,
            PenState::Down => self.down_angle,
        };
        tracing::debug!("Pen {:?} (servo {} deg)", state, angle);
        self.write_angle(angle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::SimPwm;

    fn pen() -> ServoPen<SimPwm> {
        ServoPen::new(SimPwm::default(), &PenConfig::default()).unwrap()
    }

    #[test]
    fn test_angle_to_duty_range() {
        let pen = pen();
        assert_eq!(pen.angle_to_duty(0.0), 1000);
        assert_eq!(pen.angle_to_duty(90.0), 5000);
        assert_eq!(pen.angle_to_duty(180.0), 9000);
        assert_eq!(pen.angle_to_duty(-20.0), 1000);
        assert_eq!(pen.angle_to_duty(400.0), 9000);
    }

    #[test]
    fn test_pen_states_drive_configured_angles() {
        let mut pen = pen();
        assert_eq!(pen.pwm().freq(), Some(SERVO_PWM_FREQ_HZ));
        pen.set(PenState::Down).unwrap();
        assert_eq!(pen.current_angle(), Some(50.0));
        // 1000 + 8000 * 50 / 180
        assert_eq!(pen.pwm().duty(), Some(3222));
        pen.set(PenState::Up).unwrap();
        assert_eq!(pen.current_angle(), Some(110.0));
        assert_eq!(pen.pwm().duty(), Some(5888));
    }
}
