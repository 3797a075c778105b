// src/plotter.rs - Stroke sequencing on top of the motion controller
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::config::{Config, ConfigError};
use crate::hardware::{Actuators, HardwareError, PenState};
use crate::motion::{MotionController, MotionError, MotionStats, PlotterState, Point};
use crate::path::{NormalizedJob, PathError, Stroke};

#[derive(Debug, Error)]
pub enum PlotterError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Path error: {0}")]
    Path(#[from] PathError),
    #[error("Motion error: {0}")]
    Motion(#[from] MotionError),
    #[error("Hardware error: {0}")]
    Hardware(#[from] HardwareError),
}

/// One step of a drawing plan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum DrawCommand {
    PenUp,
    PenDown,
    LineTo(Point),
    ArcTo { destination: Point, offset: Point, clockwise: bool },
}

/// Turn strokes into pen and move commands, ending with a return to `home`.
///
/// Each stroke is: pen up, travel to its first point, pen down, lines
/// through the remaining points, pen up.
pub fn plan_strokes(strokes: &[Stroke], home: Point) -> Vec<DrawCommand> {
    let mut plan = Vec::new();
    for stroke in strokes {
        let Some((first, rest)) = stroke.points.split_first() else {
            continue;
        };
        plan.push(DrawCommand::PenUp);
        plan.push(DrawCommand::LineTo(*first));
        plan.push(DrawCommand::PenDown);
        plan.extend(rest.iter().map(|p| DrawCommand::LineTo(*p)));
        plan.push(DrawCommand::PenUp);
    }
    plan.push(DrawCommand::LineTo(home));
    plan
}

/// Test pattern for checking a freshly hung machine: a 100 mm square
/// around the origin, a circle of radius 40 mm inside it, then home.
pub fn calibration_pattern(home: Point) -> Vec<DrawCommand> {
    let square = [
        (50.0, 0.0),
        (50.0, 50.0),
        (0.0, 50.0),
        (-50.0, 50.0),
        (-50.0, 0.0),
        (-50.0, -50.0),
        (0.0, -50.0),
        (50.0, -50.0),
        (50.0, 0.0),
    ];
    let mut plan = vec![DrawCommand::PenUp, DrawCommand::LineTo(Point::from(square[0])), DrawCommand::PenDown];
    plan.extend(square[1..].iter().map(|&p| DrawCommand::LineTo(Point::from(p))));
    plan.push(DrawCommand::PenUp);

    let circle_start = Point::new(40.0, 0.0);
    plan.push(DrawCommand::LineTo(circle_start));
    plan.push(DrawCommand::PenDown);
    plan.push(DrawCommand::ArcTo { destination: circle_start, offset: circle_start, clockwise: false });
    plan.push(DrawCommand::PenUp);
    plan.push(DrawCommand::LineTo(home));
    plan
}

/// Summary of a finished job.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub strokes: usize,
    pub points: usize,
    pub skipped_tokens: usize,
    pub commands: usize,
    pub motion: MotionStats,
    pub elapsed_secs: f64,
    pub final_state: PlotterState,
}

/// Drives whole jobs: plans strokes and executes them in order.
pub struct Plotter {
    controller: MotionController,
    home: Point,
}

impl Plotter {
    pub fn new(config: &Config, actuators: Actuators) -> Result<Self, PlotterError> {
        config.validate()?;
        Ok(Self {
            controller: MotionController::new(config, actuators),
            home: config.home(),
        })
    }

    pub fn state(&self) -> &PlotterState {
        self.controller.state()
    }

    pub fn controller(&self) -> &MotionController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut MotionController {
        &mut self.controller
    }

    pub fn home(&self) -> Point {
        self.home
    }

    /// Execute commands in order; each one completes before the next starts.
    pub fn execute(&mut self, plan: &[DrawCommand]) -> Result<(), PlotterError> {
        for command in plan {
            match *command {
                DrawCommand::PenUp => self.controller.set_pen(PenState::Up)?,
                DrawCommand::PenDown => self.controller.set_pen(PenState::Down)?,
                DrawCommand::LineTo(p) => self.controller.line_to(p)?,
                DrawCommand::ArcTo { destination, offset, clockwise } => {
                    self.controller.arc_to(destination, offset, clockwise)?;
                }
            }
        }
        Ok(())
    }

    /// Draw every stroke of a normalized job and return home.
    pub fn draw_job(&mut self, job: &NormalizedJob) -> Result<JobReport, PlotterError> {
        let plan = plan_strokes(&job.strokes, self.home);
        self.run(&plan, job.strokes.len(), job.point_count(), job.skipped.len())
    }

    /// Draw the built-in calibration pattern.
    pub fn draw_calibration(&mut self) -> Result<JobReport, PlotterError> {
        let plan = calibration_pattern(self.home);
        self.run(&plan, 2, 0, 0)
    }

    fn run(
        &mut self,
        plan: &[DrawCommand],
        strokes: usize,
        points: usize,
        skipped_tokens: usize,
    ) -> Result<JobReport, PlotterError> {
        let id = Uuid::new_v4();
        let started_at = Utc::now();
        let stats_before = self.controller.stats().clone();
        let elapsed_before = self.controller.elapsed();
        tracing::info!("Job {}: {} strokes, {} commands", id, strokes, plan.len());

        if let Err(e) = self.execute(plan) {
            tracing::error!("Job {} aborted: {}", id, e);
            return Err(e);
        }

        let stats = self.controller.stats();
        let motion = MotionStats {
            moves: stats.moves - stats_before.moves,
            pulses_m1: stats.pulses_m1 - stats_before.pulses_m1,
            pulses_m2: stats.pulses_m2 - stats_before.pulses_m2,
            pen_transitions: stats.pen_transitions - stats_before.pen_transitions,
            degenerate_arcs: stats.degenerate_arcs - stats_before.degenerate_arcs,
        };
        let elapsed = self.controller.elapsed().saturating_sub(elapsed_before);
        tracing::info!(
            "Job {} complete: {} moves, {} / {} pulses, {:.1}s",
            id,
            motion.moves,
            motion.pulses_m1,
            motion.pulses_m2,
            elapsed.as_secs_f64()
        );

        Ok(JobReport {
            id,
            started_at,
            finished_at: Utc::now(),
            strokes,
            points,
            skipped_tokens,
            commands: plan.len(),
            motion,
            elapsed_secs: elapsed.as_secs_f64(),
            final_state: *self.controller.state(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stroke(points: &[(f64, f64)]) -> Stroke {
        Stroke { points: points.iter().map(|&p| Point::from(p)).collect() }
    }

    #[test]
    fn test_plan_single_stroke() {
        let plan = plan_strokes(&[stroke(&[(-50.0, -50.0), (50.0, -50.0), (50.0, 50.0)])], Point::ORIGIN);
        assert_eq!(
            plan,
            vec![
                DrawCommand::PenUp,
                DrawCommand::LineTo(Point::new(-50.0, -50.0)),
                DrawCommand::PenDown,
                DrawCommand::LineTo(Point::new(50.0, -50.0)),
                DrawCommand::LineTo(Point::new(50.0, 50.0)),
                DrawCommand::PenUp,
                DrawCommand::LineTo(Point::ORIGIN),
            ]
        );
    }

    #[test]
    fn test_plan_skips_empty_strokes() {
        let plan = plan_strokes(&[Stroke::default(), stroke(&[(1.0, 1.0)])], Point::new(5.0, 5.0));
        assert_eq!(
            plan,
            vec![
                DrawCommand::PenUp,
                DrawCommand::LineTo(Point::new(1.0, 1.0)),
                DrawCommand::PenDown,
                DrawCommand::PenUp,
                DrawCommand::LineTo(Point::new(5.0, 5.0)),
            ]
        );
    }

    #[test]
    fn test_calibration_pattern_shape() {
        let plan = calibration_pattern(Point::ORIGIN);
        let pen_downs = plan.iter().filter(|c| **c == DrawCommand::PenDown).count();
        assert_eq!(pen_downs, 2);
        assert!(plan.iter().any(|c| matches!(c, DrawCommand::ArcTo { .. })));
        assert_eq!(plan.last(), Some(&DrawCommand::LineTo(Point::ORIGIN)));
    }
}
