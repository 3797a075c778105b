// src/motion/stepper.rs - Coordinated two-motor stepping
use serde::Serialize;

use super::kinematics::StepPair;

/// One of the two cable motors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Motor {
    M1,
    M2,
}

/// Physical rotation direction handed to a motor driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    Forward,
    Reverse,
}

impl Direction {
    /// Direction for a signed step delta, flipped when the motor is mounted inverted.
    pub fn for_delta(delta: i64, invert: bool) -> Self {
        match (delta >= 0, invert) {
            (true, false) | (false, true) => Direction::Forward,
            _ => Direction::Reverse,
        }
    }

    pub fn sign(self) -> i64 {
        match self {
            Direction::Forward => 1,
            Direction::Reverse => -1,
        }
    }
}

/// A single step pulse on one motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepPulse {
    pub motor: Motor,
    pub direction: Direction,
    /// True for pulses on the axis with the larger step count. Each major
    /// pulse starts a new stepping interval.
    pub major: bool,
}

/// Per-motor direction inversion flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectionInvert {
    pub m1: bool,
    pub m2: bool,
}

impl DirectionInvert {
    pub fn for_motor(&self, motor: Motor) -> bool {
        match motor {
            Motor::M1 => self.m1,
            Motor::M2 => self.m2,
        }
    }
}

/// Bresenham interleaving of two motors' pulses for one move.
///
/// Yields exactly `major` pulses on the motor with the larger delta and
/// `minor` pulses on the other. A minor pulse always directly follows the
/// major pulse that tipped the error accumulator over. After `k` major
/// pulses the minor count is `floor(k * minor / major)`.
#[derive(Debug, Clone)]
pub struct CoordinatedMove {
    major_motor: Motor,
    major_dir: Direction,
    minor_dir: Direction,
    major: u64,
    minor: u64,
    emitted: u64,
    error: u64,
    minor_due: bool,
}

impl CoordinatedMove {
    pub fn new(current: StepPair, target: StepPair, invert: DirectionInvert) -> Self {
        let d1 = target.m1 - current.m1;
        let d2 = target.m2 - current.m2;
        let dir1 = Direction::for_delta(d1, invert.m1);
        let dir2 = Direction::for_delta(d2, invert.m2);
        let abs1 = d1.unsigned_abs();
        let abs2 = d2.unsigned_abs();

        // Ties go to motor 1
        let (major_motor, major_dir, minor_dir, major, minor) = if abs1 >= abs2 {
            (Motor::M1, dir1, dir2, abs1, abs2)
        } else {
            (Motor::M2, dir2, dir1, abs2, abs1)
        };

        Self {
            major_motor,
            major_dir,
            minor_dir,
            major,
            minor,
            emitted: 0,
            error: 0,
            minor_due: false,
        }
    }

    pub fn major_motor(&self) -> Motor {
        self.major_motor
    }

    pub fn minor_motor(&self) -> Motor {
        match self.major_motor {
            Motor::M1 => Motor::M2,
            Motor::M2 => Motor::M1,
        }
    }

    /// Step count of the axis that moves furthest.
    pub fn major_steps(&self) -> u64 {
        self.major
    }

    pub fn minor_steps(&self) -> u64 {
        self.minor
    }

    pub fn is_empty(&self) -> bool {
        self.major == 0
    }
}

impl Iterator for CoordinatedMove {
    type Item = StepPulse;

    fn next(&mut self) -> Option<StepPulse> {
        if self.minor_due {
            self.minor_due = false;
            return Some(StepPulse {
                motor: self.minor_motor(),
                direction: self.minor_dir,
                major: false,
            });
        }
        if self.emitted >= self.major {
            return None;
        }
        self.emitted += 1;
        self.error += self.minor;
        if self.error >= self.major {
            self.error -= self.major;
            self.minor_due = true;
        }
        Some(StepPulse {
            motor: self.major_motor,
            direction: self.major_dir,
            major: true,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining_major = self.major - self.emitted;
        // Minor pulses still owed: total minus those already released
        let released_minor = if self.major == 0 {
            0
        } else {
            self.emitted * self.minor / self.major
        };
        let remaining = remaining_major + (self.minor - released_minor) + self.minor_due as u64;
        (remaining as usize, Some(remaining as usize))
    }
}

impl ExactSizeIterator for CoordinatedMove {}
