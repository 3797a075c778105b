//! Path file parser.
//!
//! One stroke per line; points separated by `;`, each point `x,y`. Blank
//! lines are ignored. A token that is not exactly two decimals is skipped
//! without discarding the rest of its line.

use serde::Serialize;

use super::{PathError, Stroke};
use crate::motion::kinematics::Point;

/// A token that was dropped while parsing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedToken {
    /// 1-based line number in the source.
    pub line: usize,
    pub token: String,
}

/// Strokes read from a path file, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedJob {
    pub strokes: Vec<Stroke>,
    pub skipped: Vec<SkippedToken>,
}

impl ParsedJob {
    pub fn point_count(&self) -> usize {
        self.strokes.iter().map(|s| s.points.len()).sum()
    }
}

/// Parse a single `x,y` token.
pub fn parse_point(token: &str, line: usize) -> Result<Point, PathError> {
    let malformed = || PathError::MalformedPoint { line, token: token.to_string() };
    let mut parts = token.split(',');
    let (Some(x), Some(y), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(malformed());
    };
    let x: f64 = x.trim().parse().map_err(|_| malformed())?;
    let y: f64 = y.trim().parse().map_err(|_| malformed())?;
    if !(x.is_finite() && y.is_finite()) {
        return Err(malformed());
    }
    Ok(Point::new(x, y))
}

/// Parse the whole contents of a path file.
pub fn parse_path_file(content: &str) -> ParsedJob {
    let mut job = ParsedJob::default();

    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let line_no = index + 1;

        let mut points = Vec::new();
        for token in line.split(';') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            match parse_point(token, line_no) {
                Ok(p) => points.push(p),
                Err(e) => {
                    tracing::warn!("Skipping point: {}", e);
                    job.skipped.push(SkippedToken { line: line_no, token: token.to_string() });
                }
            }
        }

        if points.is_empty() {
            tracing::debug!("Line {} has no valid points", line_no);
            continue;
        }
        job.strokes.push(Stroke { points });
    }

    tracing::debug!(
        "Parsed {} strokes ({} points, {} skipped tokens)",
        job.strokes.len(),
        job.point_count(),
        job.skipped.len()
    );
    job
}
