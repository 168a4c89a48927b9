//! Planar geometry and drivetrain value types.
//!
//! Field coordinates follow the usual robot convention: x forward, y to the
//! left, angles counter-clockwise positive, all in metres and radians.

use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};
use std::ops::{Add, Neg, Sub};

/// A heading, kept wrapped to `(-π, π]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Rotation2d {
    radians: f64,
}

impl Rotation2d {
    pub const ZERO: Self = Self { radians: 0.0 };

    pub fn new(radians: f64) -> Self {
        let wrapped = (radians + PI).rem_euclid(TAU) - PI;
        // rem_euclid maps +π onto -π; keep the upper end of the interval.
        let radians = if wrapped <= -PI { PI } else { wrapped };
        Self { radians }
    }

    pub fn from_degrees(degrees: f64) -> Self {
        Self::new(degrees.to_radians())
    }

    pub fn radians(&self) -> f64 {
        self.radians
    }

    pub fn degrees(&self) -> f64 {
        self.radians.to_degrees()
    }

    pub fn cos(&self) -> f64 {
        self.radians.cos()
    }

    pub fn sin(&self) -> f64 {
        self.radians.sin()
    }

    pub fn rotate_by(&self, other: Rotation2d) -> Self {
        Self::new(self.radians + other.radians)
    }

    /// Linear interpolation along the shortest arc.
    pub fn interpolate(&self, end: Rotation2d, t: f64) -> Self {
        let delta = (end - *self).radians;
        Self::new(self.radians + delta * t.clamp(0.0, 1.0))
    }
}

impl From<f64> for Rotation2d {
    fn from(radians: f64) -> Self {
        Self::new(radians)
    }
}

impl From<Rotation2d> for f64 {
    fn from(rotation: Rotation2d) -> Self {
        rotation.radians
    }
}

impl Sub for Rotation2d {
    type Output = Rotation2d;

    fn sub(self, rhs: Rotation2d) -> Rotation2d {
        Rotation2d::new(self.radians - rhs.radians)
    }
}

impl Neg for Rotation2d {
    type Output = Rotation2d;

    fn neg(self) -> Rotation2d {
        Rotation2d::new(-self.radians)
    }
}

/// A point or displacement on the field.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Translation2d {
    pub x: f64,
    pub y: f64,
}

impl Translation2d {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn norm(&self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn rotate_by(&self, rotation: Rotation2d) -> Self {
        let (sin, cos) = (rotation.sin(), rotation.cos());
        Self {
            x: self.x * cos - self.y * sin,
            y: self.x * sin + self.y * cos,
        }
    }

    pub fn interpolate(&self, end: Translation2d, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            x: self.x + (end.x - self.x) * t,
            y: self.y + (end.y - self.y) * t,
        }
    }
}

impl Add for Translation2d {
    type Output = Translation2d;

    fn add(self, rhs: Translation2d) -> Translation2d {
        Translation2d::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Translation2d {
    type Output = Translation2d;

    fn sub(self, rhs: Translation2d) -> Translation2d {
        Translation2d::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Position plus heading.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose2d {
    pub translation: Translation2d,
    pub rotation: Rotation2d,
}

impl Pose2d {
    pub fn new(x: f64, y: f64, rotation: Rotation2d) -> Self {
        Self {
            translation: Translation2d::new(x, y),
            rotation,
        }
    }

    pub fn x(&self) -> f64 {
        self.translation.x
    }

    pub fn y(&self) -> f64 {
        self.translation.y
    }

    pub fn interpolate(&self, end: Pose2d, t: f64) -> Self {
        Self {
            translation: self.translation.interpolate(end.translation, t),
            rotation: self.rotation.interpolate(end.rotation, t),
        }
    }
}

/// Velocity of the chassis in the robot frame.
///
/// `vx` is forward, `vy` is to the left (m/s) and `omega` is the
/// counter-clockwise turn rate (rad/s).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ChassisSpeeds {
    pub vx: f64,
    pub vy: f64,
    pub omega: f64,
}

impl ChassisSpeeds {
    pub fn new(vx: f64, vy: f64, omega: f64) -> Self {
        Self { vx, vy, omega }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    /// Convert field-relative velocities to the robot frame of a robot
    /// currently facing `robot_heading`.
    ///
    /// ```
    /// use tickwise::control::{ChassisSpeeds, Rotation2d};
    ///
    /// // Driving "north" on the field while facing west is a pure sideways
    /// // strafe to the robot's right.
    /// let speeds = ChassisSpeeds::from_field_relative(
    ///     1.0,
    ///     0.0,
    ///     0.0,
    ///     Rotation2d::from_degrees(90.0),
    /// );
    /// assert!(speeds.vx.abs() < 1e-9);
    /// assert!((speeds.vy + 1.0).abs() < 1e-9);
    /// ```
    pub fn from_field_relative(vx: f64, vy: f64, omega: f64, robot_heading: Rotation2d) -> Self {
        let (sin, cos) = (robot_heading.sin(), robot_heading.cos());
        Self {
            vx: vx * cos + vy * sin,
            vy: -vx * sin + vy * cos,
            omega,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.vx == 0.0 && self.vy == 0.0 && self.omega == 0.0
    }
}

/// Command for one swerve module: wheel speed (m/s) and steering angle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ModuleState {
    pub speed: f64,
    pub angle: Rotation2d,
}

impl ModuleState {
    pub fn new(speed: f64, angle: Rotation2d) -> Self {
        Self { speed, angle }
    }
}
