//! Arc interpolation.
//!
//! An arc is flattened into chords of roughly `segment_length` millimetres.
//! The radius vector is advanced by a fixed rotation per segment, which is
//! cheap but accumulates rounding error, so every `correction_interval`
//! segments it is recomputed exactly from the absolute angle.

use std::f64::consts::TAU;
use thiserror::Error;

use super::kinematics::Point;

/// Arcs shorter than this are not drawn.
pub const MIN_ARC_TRAVEL_MM: f64 = 0.001;

#[derive(Debug, Error, PartialEq)]
pub enum ArcError {
    #[error("Arc travel of {travel_mm} mm is below the {MIN_ARC_TRAVEL_MM} mm minimum")]
    Degenerate { travel_mm: f64 },
}

/// A circular move request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcSpec {
    pub current: Point,
    pub destination: Point,
    /// Signed offset between the arc center and the current position:
    /// `center = current - offset`.
    pub offset: Point,
    pub clockwise: bool,
}

impl ArcSpec {
    pub fn center(&self) -> Point {
        self.current - self.offset
    }

    pub fn radius(&self) -> f64 {
        self.offset.length()
    }

    /// Signed angle swept from `current` to `destination` around the center.
    /// Counter-clockwise travel lies in `[0, 2π)`, clockwise in `[-2π, 0)`.
    /// Identical endpoints describe a full circle.
    pub fn angular_travel(&self) -> f64 {
        let center = self.center();
        let r = self.current - center;
        let rt = self.destination - center;

        let mut travel = (r.x * rt.y - r.y * rt.x).atan2(r.x * rt.x + r.y * rt.y);
        if travel < 0.0 {
            travel += TAU;
        }
        if self.clockwise {
            travel -= TAU;
        }
        if travel == 0.0 && self.current == self.destination {
            travel = TAU;
        }
        travel
    }
}

/// Result of flattening an arc.
#[derive(Debug, Clone)]
pub struct ArcPath {
    pub center: Point,
    pub radius: f64,
    pub angular_travel: f64,
    pub segments: usize,
    /// Chord endpoints in drawing order; the last one is the destination.
    pub points: Vec<Point>,
}

impl ArcPath {
    /// Arc length `|angular_travel| * radius`.
    pub fn travel_mm(&self) -> f64 {
        (self.angular_travel * self.radius).abs()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ArcInterpolator {
    segment_length: f64,
    correction_interval: u32,
}

impl ArcInterpolator {
    pub fn new(segment_length: f64, correction_interval: u32) -> Self {
        Self { segment_length, correction_interval }
    }

    pub fn segment_length(&self) -> f64 {
        self.segment_length
    }

    pub fn correction_interval(&self) -> u32 {
        self.correction_interval
    }

    pub fn interpolate(&self, spec: &ArcSpec) -> Result<ArcPath, ArcError> {
        let center = spec.center();
        let radius = spec.radius();
        let angular_travel = spec.angular_travel();

        let travel_mm = (angular_travel * radius).abs();
        if travel_mm < MIN_ARC_TRAVEL_MM {
            return Err(ArcError::Degenerate { travel_mm });
        }

        let segments = ((travel_mm / self.segment_length).floor() as usize).max(1);
        let theta = angular_travel / segments as f64;
        let (sin_t, cos_t) = theta.sin_cos();

        let mut points = Vec::with_capacity(segments);
        let mut r = spec.offset;
        let mut until_correction = self.correction_interval;

        for i in 1..segments {
            if until_correction == 0 {
                until_correction = self.correction_interval;
                let (sin_i, cos_i) = (i as f64 * theta).sin_cos();
                r = rotate(spec.offset, sin_i, cos_i);
            } else {
                r = rotate(r, sin_t, cos_t);
                until_correction -= 1;
            }
            points.push(center + r);
        }
        points.push(spec.destination);

        tracing::trace!(
            "Arc around {} r={:.3}: {:.4} rad in {} segments",
            center,
            radius,
            angular_travel,
            segments
        );

        Ok(ArcPath { center, radius, angular_travel, segments, points })
    }
}

fn rotate(v: Point, sin: f64, cos: f64) -> Point {
    Point::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}
