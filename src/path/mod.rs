// src/path/mod.rs - Path files: parsing and normalization
pub mod normalize;
pub mod parser;

pub use normalize::{normalize, BoundingBox, FitTransform};
pub use parser::{parse_path_file, parse_point, ParsedJob, SkippedToken};

use serde::Serialize;
use thiserror::Error;

use crate::motion::kinematics::Point;

#[derive(Debug, Error, PartialEq)]
pub enum PathError {
    #[error("Malformed point '{token}' on line {line}")]
    MalformedPoint { line: usize, token: String },
    #[error("No drawable area in input (bounding box {width} x {height})")]
    EmptyOrDegenerateInput { width: f64, height: f64 },
}

/// One continuous pen-down path.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Stroke {
    pub points: Vec<Point>,
}

/// A parsed job scaled into the drawing envelope, ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedJob {
    pub strokes: Vec<Stroke>,
    pub transform: FitTransform,
    pub skipped: Vec<SkippedToken>,
}

impl NormalizedJob {
    /// Parse and normalize in one go.
    pub fn from_source(content: &str, target_width: f64, target_height: f64) -> Result<Self, PathError> {
        Self::from_parsed(parse_path_file(content), target_width, target_height)
    }

    pub fn from_parsed(parsed: ParsedJob, target_width: f64, target_height: f64) -> Result<Self, PathError> {
        let (strokes, transform) = normalize(&parsed.strokes, target_width, target_height)?;
        Ok(Self { strokes, transform, skipped: parsed.skipped })
    }

    pub fn point_count(&self) -> usize {
        self.strokes.iter().map(|s| s.points.len()).sum()
    }
}
