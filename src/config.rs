//! Controller configuration loaded from JSON.
//!
//! Every field has a default, so a config file only needs to name what it
//! changes:
//!
//! ```
//! use tickwise::config::ControllerConfig;
//!
//! let config = ControllerConfig::from_json(
//!     r#"{
//!         "control_loop": { "rate_hz": 100.0 },
//!         "tracker": { "theta": { "kp": 4.0 } }
//!     }"#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.control_loop.rate_hz, 100.0);
//! assert_eq!(config.tracker.theta.kp, 4.0);
//! assert_eq!(config.tracker.period_secs, 0.02);
//! ```

use crate::control::{HolonomicController, PidConfig, Tolerance};
use crate::runtime::{ControlLoopConfig, MAX_RATE_HZ, MIN_RATE_HZ};
use serde::{Deserialize, Serialize};
use std::path::Path;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid config: {}", .problems.join("; "))]
    Invalid { problems: Vec<String> },
}

/// Gains and limits for the trajectory tracker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub x: PidConfig,
    pub y: PidConfig,
    pub theta: PidConfig,
    /// Control period in seconds, used as the PID time step
    pub period_secs: f64,
    pub tolerance: Tolerance,
    /// `false` runs feed-forward only
    pub feedback_enabled: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            x: PidConfig::p(1.0),
            y: PidConfig::p(1.0),
            theta: PidConfig::p(1.0),
            period_secs: 0.02,
            tolerance: Tolerance::default(),
            feedback_enabled: true,
        }
    }
}

impl TrackerConfig {
    /// Build a controller with these gains.
    pub fn controller(&self) -> HolonomicController {
        let mut controller =
            HolonomicController::new(self.x, self.y, self.theta, self.period_secs)
                .with_tolerance(self.tolerance);
        controller.set_enabled(self.feedback_enabled);
        controller
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        into_result(self.checks())
    }

    fn checks(&self) -> Validation<(), NonEmptyVec<String>> {
        let mut checks = vec![positive("tracker.period_secs", self.period_secs)];
        checks.extend(pid_checks("tracker.x", &self.x));
        checks.extend(pid_checks("tracker.y", &self.y));
        checks.extend(pid_checks("tracker.theta", &self.theta));
        checks.push(positive(
            "tracker.tolerance.translation",
            self.tolerance.translation,
        ));
        checks.push(positive("tracker.tolerance.rotation", self.tolerance.rotation));
        Validation::all_vec(checks).map(|_| ())
    }
}

/// Everything the robot's control code needs at startup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub control_loop: ControlLoopConfig,
    pub tracker: TrackerConfig,
}

impl ControllerConfig {
    /// Parse and validate.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Report every invalid field at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = vec![
            within(
                "control_loop.rate_hz",
                self.control_loop.rate_hz,
                MIN_RATE_HZ,
                MAX_RATE_HZ,
            ),
            non_empty("control_loop.name", &self.control_loop.name),
            self.tracker.checks(),
        ];
        into_result(Validation::all_vec(checks).map(|_| ()))
    }
}

fn into_result(validation: Validation<(), NonEmptyVec<String>>) -> Result<(), ConfigError> {
    match validation {
        Validation::Success(_) => Ok(()),
        Validation::Failure(problems) => Err(ConfigError::Invalid {
            problems: problems.iter().cloned().collect(),
        }),
    }
}

fn positive(field: &str, value: f64) -> Validation<(), NonEmptyVec<String>> {
    if value.is_finite() && value > 0.0 {
        Validation::success(())
    } else {
        Validation::fail(format!("{field} must be a positive number, got {value}"))
    }
}

fn within(field: &str, value: f64, min: f64, max: f64) -> Validation<(), NonEmptyVec<String>> {
    if (min..=max).contains(&value) {
        Validation::success(())
    } else {
        Validation::fail(format!("{field} must be between {min} and {max}, got {value}"))
    }
}

fn non_negative(field: &str, value: f64) -> Validation<(), NonEmptyVec<String>> {
    if value.is_finite() && value >= 0.0 {
        Validation::success(())
    } else {
        Validation::fail(format!("{field} must be zero or positive, got {value}"))
    }
}

fn non_empty(field: &str, value: &str) -> Validation<(), NonEmptyVec<String>> {
    if value.trim().is_empty() {
        Validation::fail(format!("{field} must not be empty"))
    } else {
        Validation::success(())
    }
}

fn pid_checks(prefix: &str, pid: &PidConfig) -> Vec<Validation<(), NonEmptyVec<String>>> {
    let mut checks = vec![
        non_negative(&format!("{prefix}.kp"), pid.kp),
        non_negative(&format!("{prefix}.ki"), pid.ki),
        non_negative(&format!("{prefix}.kd"), pid.kd),
    ];
    if let Some(limit) = pid.output_limit {
        checks.push(positive(&format!("{prefix}.output_limit"), limit));
    }
    if let Some(limit) = pid.integral_limit {
        checks.push(positive(&format!("{prefix}.integral_limit"), limit));
    }
    if let Some(range) = pid.continuous_input {
        checks.push(positive(&format!("{prefix}.continuous_input span"), range.span()));
    }
    checks
}
