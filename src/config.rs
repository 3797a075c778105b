//! # Plotter Configuration
//!
//! Machine geometry, motor, pen, arc and job settings, loaded once at startup
//! and never mutated afterwards.
//!
//! ## Example: TOML Configuration
//!
//! ```toml
//! [machine]
//! left_anchor = [-125.0, 200.0]
//! right_anchor = [125.0, 200.0]
//! bottom_y = -200.0
//!
//! [motors]
//! steps_per_turn = 2048
//! spool_diameter = 28.0
//! invert_m1 = true
//!
//! [pen]
//! up_angle = 110.0
//! down_angle = 50.0
//! settle_ms = 500
//!
//! [arc]
//! segment_length = 1.0
//! correction_interval = 25
//! ```
//!
//! Every field has a default, so an empty file describes the stock
//! 250 mm-wide machine with 28BYJ-48 motors.

// src/config.rs - Single configuration file
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::time::Duration;
use thiserror::Error;

use crate::motion::kinematics::{AnchorConfig, Point};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration struct for the plotter.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub machine: MachineConfig,
    #[serde(default)]
    pub motors: MotorConfig,
    #[serde(default)]
    pub pen: PenConfig,
    #[serde(default)]
    pub arc: ArcConfig,
    #[serde(default)]
    pub job: JobConfig,
}

/// Anchor geometry and fixed coordinates of the drawing surface.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MachineConfig {
    #[serde(default = "default_left_anchor")]
    pub left_anchor: [f64; 2],
    #[serde(default = "default_right_anchor")]
    pub right_anchor: [f64; 2],
    /// Lowest reachable y of the drawing area.
    #[serde(default = "default_bottom_y")]
    pub bottom_y: f64,
    /// Where the pen is assumed to be when the plotter powers up.
    #[serde(default)]
    pub start: [f64; 2],
    /// Where the pen returns after a job.
    #[serde(default)]
    pub home: [f64; 2],
    #[serde(default)]
    pub name: Option<String>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            left_anchor: default_left_anchor(),
            right_anchor: default_right_anchor(),
            bottom_y: default_bottom_y(),
            start: [0.0, 0.0],
            home: [0.0, 0.0],
            name: None,
        }
    }
}

/// Stepper motor and spool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MotorConfig {
    #[serde(default = "default_steps_per_turn")]
    pub steps_per_turn: u32,
    #[serde(default = "default_spool_diameter")]
    pub spool_diameter: f64,
    /// Overrides the value derived from the spool when set.
    #[serde(default)]
    pub mm_per_step: Option<f64>,
    #[serde(default = "default_invert_m1")]
    pub invert_m1: bool,
    #[serde(default)]
    pub invert_m2: bool,
    #[serde(default = "default_steps_per_second")]
    pub steps_per_second: f64,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            steps_per_turn: default_steps_per_turn(),
            spool_diameter: default_spool_diameter(),
            mm_per_step: None,
            invert_m1: default_invert_m1(),
            invert_m2: false,
            steps_per_second: default_steps_per_second(),
        }
    }
}

impl MotorConfig {
    /// Cable length wound or unwound by one motor step.
    pub fn mm_per_step(&self) -> f64 {
        self.mm_per_step
            .unwrap_or_else(|| self.spool_diameter * PI / self.steps_per_turn as f64)
    }

    /// Delay between two major-axis pulses.
    pub fn step_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.steps_per_second)
    }
}

/// Pen servo configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PenConfig {
    #[serde(default = "default_pen_up_angle")]
    pub up_angle: f64,
    #[serde(default = "default_pen_down_angle")]
    pub down_angle: f64,
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    #[serde(default = "default_servo_min_duty")]
    pub servo_min_duty: u16,
    #[serde(default = "default_servo_max_duty")]
    pub servo_max_duty: u16,
}

impl Default for PenConfig {
    fn default() -> Self {
        Self {
            up_angle: default_pen_up_angle(),
            down_angle: default_pen_down_angle(),
            settle_ms: default_settle_ms(),
            servo_min_duty: default_servo_min_duty(),
            servo_max_duty: default_servo_max_duty(),
        }
    }
}

impl PenConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// Arc interpolation parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArcConfig {
    #[serde(default = "default_arc_segment_length")]
    pub segment_length: f64,
    /// Segments between exact recomputations of the radius vector.
    #[serde(default = "default_arc_correction_interval")]
    pub correction_interval: u32,
}

impl Default for ArcConfig {
    fn default() -> Self {
        Self {
            segment_length: default_arc_segment_length(),
            correction_interval: default_arc_correction_interval(),
        }
    }
}

/// Target envelope that path files are scaled into.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JobConfig {
    #[serde(default = "default_target_size")]
    pub target_width: f64,
    #[serde(default = "default_target_size")]
    pub target_height: f64,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            target_width: default_target_size(),
            target_height: default_target_size(),
        }
    }
}

impl Config {
    /// Anchor geometry used by the kinematics.
    pub fn anchors(&self) -> AnchorConfig {
        AnchorConfig {
            left: Point::from(self.machine.left_anchor),
            right: Point::from(self.machine.right_anchor),
            bottom_y: self.machine.bottom_y,
            mm_per_step: self.motors.mm_per_step(),
        }
    }

    pub fn start(&self) -> Point {
        Point::from(self.machine.start)
    }

    pub fn home(&self) -> Point {
        Point::from(self.machine.home)
    }

    /// Reject values the motion pipeline cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mm_per_step = self.motors.mm_per_step();
        if !(mm_per_step.is_finite() && mm_per_step > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "mm_per_step must be > 0 (got {})",
                mm_per_step
            )));
        }
        let steps_per_second = self.motors.steps_per_second;
        if !(steps_per_second.is_finite() && steps_per_second > 0.0)
            || Duration::try_from_secs_f64(1.0 / steps_per_second).is_err()
        {
            return Err(ConfigError::Invalid(format!(
                "motors.steps_per_second must be a positive rate (got {})",
                steps_per_second
            )));
        }
        let [lx, ly] = self.machine.left_anchor;
        let [rx, ry] = self.machine.right_anchor;
        if lx == rx && ly == ry {
            return Err(ConfigError::Invalid(
                "left and right anchors must not coincide".to_string(),
            ));
        }
        if self.machine.bottom_y >= ly.min(ry) {
            return Err(ConfigError::Invalid(
                "machine.bottom_y must lie below the anchors".to_string(),
            ));
        }
        let segment_length = self.arc.segment_length;
        if !(segment_length.is_finite() && segment_length > 0.0) {
            return Err(ConfigError::Invalid("arc.segment_length must be > 0".to_string()));
        }
        let envelope_ok = |v: f64| v.is_finite() && v > 0.0;
        if !(envelope_ok(self.job.target_width) && envelope_ok(self.job.target_height)) {
            return Err(ConfigError::Invalid(
                "job target envelope must have positive width and height".to_string(),
            ));
        }
        for angle in [self.pen.up_angle, self.pen.down_angle] {
            if !(0.0..=180.0).contains(&angle) {
                return Err(ConfigError::Invalid(format!(
                    "pen angle {} is outside 0..=180",
                    angle
                )));
            }
        }
        Ok(())
    }
}

// Default value functions
fn default_left_anchor() -> [f64; 2] { [-125.0, 200.0] }
fn default_right_anchor() -> [f64; 2] { [125.0, 200.0] }
fn default_bottom_y() -> f64 { -200.0 }
fn default_steps_per_turn() -> u32 { 2048 }
fn default_spool_diameter() -> f64 { 28.0 }
fn default_invert_m1() -> bool { true }
fn default_steps_per_second() -> f64 { 600.0 }
fn default_pen_up_angle() -> f64 { 110.0 }
fn default_pen_down_angle() -> f64 { 50.0 }
fn default_settle_ms() -> u64 { 500 }
fn default_servo_min_duty() -> u16 { 1000 }
fn default_servo_max_duty() -> u16 { 9000 }
fn default_arc_segment_length() -> f64 { 1.0 }
fn default_arc_correction_interval() -> u32 { 25 }
fn default_target_size() -> f64 { 100.0 }

/// Load configuration from a TOML file at the given path.
pub fn load_config(path: &str) -> Result<Config, ConfigError> {
    let config: Config = match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("Failed to parse config TOML: {}", e);
                return Err(ConfigError::Toml(e));
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file '{}': {}", path, e);
            return Err(ConfigError::Io(e));
        }
    };
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.machine.left_anchor, [-125.0, 200.0]);
        assert_eq!(config.machine.right_anchor, [125.0, 200.0]);
        assert_eq!(config.motors.steps_per_turn, 2048);
        assert!(config.motors.invert_m1);
        assert!(!config.motors.invert_m2);
        assert_eq!(config.pen.settle_ms, 500);
        assert_eq!(config.arc.correction_interval, 25);
        assert_eq!(config.job.target_width, 100.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_mm_per_step_from_spool() {
        let motors = MotorConfig::default();
        let expected = 28.0 * PI / 2048.0;
        assert!((motors.mm_per_step() - expected).abs() < 1e-12);

        let overridden = MotorConfig { mm_per_step: Some(0.1), ..Default::default() };
        assert_eq!(overridden.mm_per_step(), 0.1);
    }

    #[test]
    fn test_load_config_success() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("plotter.toml");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "[machine]\nleft_anchor = [-300.0, 250.0]\nright_anchor = [300.0, 250.0]\n\n[arc]\ncorrection_interval = 10").unwrap();
        file.flush().unwrap();
        let config = load_config(file_path.to_str().unwrap()).unwrap();
        assert_eq!(config.machine.left_anchor, [-300.0, 250.0]);
        assert_eq!(config.arc.correction_interval, 10);
        // Defaults for missing fields
        assert_eq!(config.arc.segment_length, 1.0);
        assert_eq!(config.pen.up_angle, 110.0);
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let config = load_config(concat!(env!("CARGO_MANIFEST_DIR"), "/plotter.toml")).unwrap();
        let defaults = Config::default();
        assert_eq!(config.machine.name.as_deref(), Some("wallplot"));
        assert_eq!(config.anchors(), defaults.anchors());
        assert_eq!(config.motors.step_interval(), defaults.motors.step_interval());
        assert_eq!(config.pen.down_angle, defaults.pen.down_angle);
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent_plotter.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("bad.toml");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "not a valid toml").unwrap();
        file.flush().unwrap();
        let result = load_config(file_path.to_str().unwrap());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_validate_rejects_bad_geometry() {
        let mut config = Config::default();
        config.machine.bottom_y = 300.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.motors.mm_per_step = Some(0.0);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.pen.down_angle = 200.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_nan_rates_are_rejected() {
        for toml in [
            "[motors]\nsteps_per_second = nan\n",
            "[motors]\nsteps_per_second = inf\n",
            "[motors]\nsteps_per_second = 1e-300\n",
            "[arc]\nsegment_length = nan\n",
            "[job]\ntarget_width = nan\n",
            "[job]\ntarget_height = inf\n",
        ] {
            let dir = tempdir().unwrap();
            let file_path = dir.path().join("plotter.toml");
            std::fs::write(&file_path, toml).unwrap();
            let result = load_config(file_path.to_str().unwrap());
            assert!(matches!(result, Err(ConfigError::Invalid(_))), "accepted {:?}", toml);
        }
    }
}
