//! Feed-forward plus feedback controller for a holonomic drivetrain.

use super::geometry::{ChassisSpeeds, Pose2d, Rotation2d, Translation2d};
use super::pid::{Pid, PidConfig};
use super::trajectory::TrajectorySample;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// How close to the reference counts as "there".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerance {
    /// Per-axis position tolerance (m)
    pub translation: f64,
    /// Heading tolerance (rad)
    pub rotation: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            translation: 0.05,
            rotation: 2f64.to_radians(),
        }
    }
}

/// Tracks a trajectory sample with three independent PID loops.
///
/// Translation: the sample's path speed is projected onto the path heading
/// as field-relative feed-forward, and x/y PIDs correct position error.
/// Rotation: a heading PID (continuous over `-π..π`) turns the chassis
/// towards a target heading. The sum is converted to robot-relative speeds
/// using the measured heading.
#[derive(Debug, Clone)]
pub struct HolonomicController {
    x: Pid,
    y: Pid,
    theta: Pid,
    period: f64,
    enabled: bool,
    tolerance: Tolerance,
    translation_error: Translation2d,
    rotation_error: Rotation2d,
}

impl HolonomicController {
    /// `period` is the control period in seconds used as the PID time step.
    pub fn new(x: PidConfig, y: PidConfig, theta: PidConfig, period: f64) -> Self {
        let theta = match theta.continuous_input {
            Some(_) => theta,
            None => theta.with_continuous_input(-PI, PI),
        };
        Self {
            x: Pid::new(x),
            y: Pid::new(y),
            theta: Pid::new(theta),
            period,
            enabled: true,
            tolerance: Tolerance::default(),
            translation_error: Translation2d::default(),
            rotation_error: Rotation2d::ZERO,
        }
    }

    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Robot-relative speeds that move `current` towards `reference` while
    /// turning to `target_heading`.
    pub fn calculate(
        &mut self,
        current: Pose2d,
        reference: &TrajectorySample,
        target_heading: Rotation2d,
    ) -> ChassisSpeeds {
        let x_ff = reference.velocity * reference.pose.rotation.cos();
        let y_ff = reference.velocity * reference.pose.rotation.sin();

        self.translation_error = reference.pose.translation - current.translation;
        self.rotation_error = target_heading - current.rotation;

        if !self.enabled {
            return ChassisSpeeds::from_field_relative(x_ff, y_ff, 0.0, current.rotation);
        }

        let x_fb = self.x.update(reference.pose.x(), current.x(), self.period);
        let y_fb = self.y.update(reference.pose.y(), current.y(), self.period);
        let omega = self.theta.update(
            target_heading.radians(),
            current.rotation.radians(),
            self.period,
        );

        ChassisSpeeds::from_field_relative(x_ff + x_fb, y_ff + y_fb, omega, current.rotation)
    }

    /// With feedback disabled only the feed-forward term is applied.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Error from the last `calculate()` call is within tolerance.
    pub fn at_reference(&self) -> bool {
        self.translation_error.x.abs() < self.tolerance.translation
            && self.translation_error.y.abs() < self.tolerance.translation
            && self.rotation_error.radians().abs() < self.tolerance.rotation
    }

    pub fn translation_error(&self) -> Translation2d {
        self.translation_error
    }

    pub fn rotation_error(&self) -> Rotation2d {
        self.rotation_error
    }

    /// Clear integrators and stored errors.
    pub fn reset(&mut self) {
        self.x.reset();
        self.y.reset();
        self.theta.reset();
        self.translation_error = Translation2d::default();
        self.rotation_error = Rotation2d::ZERO;
    }
}
