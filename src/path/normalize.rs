// src/path/normalize.rs - Fit a job into the drawing envelope
use serde::Serialize;

use super::{PathError, Stroke};
use crate::motion::kinematics::Point;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Bounds over every point of every stroke, or `None` without points.
    pub fn of_strokes(strokes: &[Stroke]) -> Option<Self> {
        let mut points = strokes.iter().flat_map(|s| s.points.iter());
        let first = points.next()?;
        let init = BoundingBox { min_x: first.x, max_x: first.x, min_y: first.y, max_y: first.y };
        Some(points.fold(init, |b, p| BoundingBox {
            min_x: b.min_x.min(p.x),
            max_x: b.max_x.max(p.x),
            min_y: b.min_y.min(p.y),
            max_y: b.max_y.max(p.y),
        }))
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Point {
        Point::new((self.min_x + self.max_x) / 2.0, (self.min_y + self.max_y) / 2.0)
    }
}

/// Uniform scale about the bounding-box center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FitTransform {
    pub bbox: BoundingBox,
    pub scale: f64,
    pub center: Point,
}

impl FitTransform {
    /// Aspect-preserving fit of `bbox` into `target_width` x `target_height`.
    pub fn fit(bbox: BoundingBox, target_width: f64, target_height: f64) -> Result<Self, PathError> {
        let (width, height) = (bbox.width(), bbox.height());
        if width == 0.0 || height == 0.0 {
            return Err(PathError::EmptyOrDegenerateInput { width, height });
        }
        let scale = (target_width / width).min(target_height / height);
        Ok(Self { bbox, scale, center: bbox.center() })
    }

    pub fn apply(&self, p: Point) -> Point {
        (p - self.center) * self.scale
    }
}

/// Centers the strokes on the origin and scales them to the envelope.
///
/// Fails with `EmptyOrDegenerateInput` when there is nothing to scale; the
/// caller must not draw in that case.
pub fn normalize(
    strokes: &[Stroke],
    target_width: f64,
    target_height: f64,
) -> Result<(Vec<Stroke>, FitTransform), PathError> {
    let bbox = BoundingBox::of_strokes(strokes)
        .ok_or(PathError::EmptyOrDegenerateInput { width: 0.0, height: 0.0 })?;
    let transform = FitTransform::fit(bbox, target_width, target_height)?;

    tracing::info!(
        "Input bounds X: {} to {}, Y: {} to {}; scale {:.4}",
        bbox.min_x,
        bbox.max_x,
        bbox.min_y,
        bbox.max_y,
        transform.scale
    );

    let scaled = strokes
        .iter()
        .map(|s| Stroke { points: s.points.iter().map(|p| transform.apply(*p)).collect() })
        .collect();
    Ok((scaled, transform))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stroke(points: &[(f64, f64)]) -> Stroke {
        Stroke { points: points.iter().map(|&p| Point::from(p)).collect() }
    }

    #[test]
    fn test_bounding_box() {
        let strokes = vec![stroke(&[(0.0, 5.0), (3.0, -1.0)]), stroke(&[(-2.0, 4.0)])];
        let bbox = BoundingBox::of_strokes(&strokes).unwrap();
        assert_eq!(bbox, BoundingBox { min_x: -2.0, max_x: 3.0, min_y: -1.0, max_y: 5.0 });
        assert_eq!(bbox.center(), Point::new(0.5, 2.0));
        assert!(BoundingBox::of_strokes(&[]).is_none());
    }

    #[test]
    fn test_square_job_scales_by_ten() {
        let strokes = vec![stroke(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)])];
        let (out, t) = normalize(&strokes, 100.0, 100.0).unwrap();
        assert_eq!(t.scale, 10.0);
        assert_eq!(t.center, Point::new(5.0, 5.0));
        assert_eq!(
            out[0].points,
            vec![Point::new(-50.0, -50.0), Point::new(50.0, -50.0), Point::new(50.0, 50.0)]
        );
    }

    #[test]
    fn test_limiting_axis_sets_scale() {
        // 40 wide, 10 high into 100x100: width limits
        let strokes = vec![stroke(&[(0.0, 0.0), (40.0, 10.0)])];
        let (out, t) = normalize(&strokes, 100.0, 100.0).unwrap();
        assert_eq!(t.scale, 2.5);
        assert_eq!(out[0].points, vec![Point::new(-50.0, -12.5), Point::new(50.0, 12.5)]);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(matches!(
            normalize(&[], 100.0, 100.0),
            Err(PathError::EmptyOrDegenerateInput { .. })
        ));
        let point = vec![stroke(&[(1.0, 1.0)])];
        assert!(normalize(&point, 100.0, 100.0).is_err());
        let flat = vec![stroke(&[(0.0, 1.0), (5.0, 1.0)])];
        assert!(matches!(
            normalize(&flat, 100.0, 100.0),
            Err(PathError::EmptyOrDegenerateInput { width, height }) if width == 5.0 && height == 0.0
        ));
    }
}
