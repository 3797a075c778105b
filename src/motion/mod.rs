// src/motion/mod.rs - Kinematics, coordinated stepping and arc interpolation
pub mod arc;
pub mod controller;
pub mod kinematics;
pub mod stepper;

pub use arc::{ArcError, ArcInterpolator, ArcPath, ArcSpec};
pub use controller::{MotionController, MotionStats, PlotterState};
pub use kinematics::{AnchorConfig, Kinematics, KinematicsError, Point, StepPair, WallKinematics};
pub use stepper::{CoordinatedMove, Direction, DirectionInvert, Motor, StepPulse};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MotionError {
    #[error("Hardware error: {0}")]
    Hardware(#[from] crate::hardware::HardwareError),
}
