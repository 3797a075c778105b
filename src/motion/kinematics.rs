// src/motion/kinematics.rs
use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum KinematicsError {
    #[error("Cable lengths {left:.3} mm / {right:.3} mm do not meet at any point")]
    Unreachable { left: f64, right: f64 },
}

/// Cartesian point in millimetres. Also used for relative vectors.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        (self - other).length()
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Linear interpolation; `t = 0` is `self`, `t = 1` is `other`.
    pub fn lerp(self, other: Point, t: f64) -> Point {
        self + (other - self) * t
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;
    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}

/// Absolute step counts of both motors, measured from each motor's zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StepPair {
    pub m1: i64,
    pub m2: i64,
}

impl StepPair {
    pub const fn new(m1: i64, m2: i64) -> Self {
        Self { m1, m2 }
    }
}

impl std::fmt::Display for StepPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "M1={} M2={}", self.m1, self.m2)
    }
}

/// Fixed anchor geometry of a two-cable wall plotter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorConfig {
    /// Motor 1 anchor.
    pub left: Point,
    /// Motor 2 anchor.
    pub right: Point,
    /// Lowest y of the drawing area.
    pub bottom_y: f64,
    pub mm_per_step: f64,
}

/// Kinematics handler for a cable plotter
pub trait Kinematics {
    /// Convert a Cartesian point to motor step counts
    fn cartesian_to_motors(&self, point: Point) -> StepPair;

    /// Convert motor step counts back to a Cartesian point
    fn motors_to_cartesian(&self, steps: StepPair) -> Result<Point, KinematicsError>;

    /// Check if the point lies inside the drawing area
    fn is_valid_position(&self, point: Point) -> bool;
}

/// V-plotter kinematics: each motor's step count is proportional to the
/// length of cable between its anchor and the pen.
#[derive(Debug, Clone, Copy)]
pub struct WallKinematics {
    anchors: AnchorConfig,
}

impl WallKinematics {
    pub fn new(anchors: AnchorConfig) -> Self {
        Self { anchors }
    }

    pub fn anchors(&self) -> &AnchorConfig {
        &self.anchors
    }

    pub fn mm_per_step(&self) -> f64 {
        self.anchors.mm_per_step
    }

    /// Cable lengths from each anchor to `point`, unrounded.
    pub fn cable_lengths(&self, point: Point) -> (f64, f64) {
        (point.distance(self.anchors.left), point.distance(self.anchors.right))
    }
}

impl Kinematics for WallKinematics {
    fn cartesian_to_motors(&self, point: Point) -> StepPair {
        let (l1, l2) = self.cable_lengths(point);
        StepPair {
            m1: (l1 / self.anchors.mm_per_step).round() as i64,
            m2: (l2 / self.anchors.mm_per_step).round() as i64,
        }
    }

    fn motors_to_cartesian(&self, steps: StepPair) -> Result<Point, KinematicsError> {
        let r1 = steps.m1 as f64 * self.anchors.mm_per_step;
        let r2 = steps.m2 as f64 * self.anchors.mm_per_step;
        let a = self.anchors.left;
        let b = self.anchors.right;
        let d = a.distance(b);
        if d == 0.0 {
            return Err(KinematicsError::Unreachable { left: r1, right: r2 });
        }

        // Intersection of the circles of radius r1 around A and r2 around B
        let along = (r1 * r1 - r2 * r2 + d * d) / (2.0 * d);
        let h_sq = r1 * r1 - along * along;
        if !(h_sq >= 0.0) {
            return Err(KinematicsError::Unreachable { left: r1, right: r2 });
        }
        let h = h_sq.sqrt();
        let unit = (b - a) * (1.0 / d);
        let base = a + unit * along;
        let perp = Point::new(-unit.y, unit.x);
        let p1 = base + perp * h;
        let p2 = base - perp * h;

        // The pen hangs below the anchors
        Ok(if p1.y <= p2.y { p1 } else { p2 })
    }

    fn is_valid_position(&self, point: Point) -> bool {
        let left_x = self.anchors.left.x.min(self.anchors.right.x);
        let right_x = self.anchors.left.x.max(self.anchors.right.x);
        let top_y = self.anchors.left.y.min(self.anchors.right.y);
        point.x >= left_x && point.x <= right_x && point.y >= self.anchors.bottom_y && point.y < top_y
    }
}
