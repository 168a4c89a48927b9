//! Precomputed, time-indexed trajectories.
//!
//! Trajectories are produced offline by a path planner and loaded as data.
//! They are validated once on construction so sampling inside the control
//! loop never fails.

use super::geometry::{Pose2d, Rotation2d};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while constructing or loading a trajectory.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TrajectoryError {
    #[error("Trajectory has no samples")]
    Empty,

    #[error("Sample {index} contains a non-finite value")]
    NonFinite { index: usize },

    #[error("Sample {index} at t={time}s is earlier than the sample before it")]
    OutOfOrder { index: usize, time: f64 },

    #[error("First sample starts at negative time t={0}s")]
    NegativeStart(f64),

    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),
}

/// One point of a trajectory.
///
/// `pose.rotation` is the direction of travel along the path, while
/// `holonomic_rotation` is where the chassis should face; a holonomic drive
/// can strafe, so the two differ in general.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectorySample {
    /// Seconds since the start of the trajectory
    pub time: f64,
    pub pose: Pose2d,
    pub holonomic_rotation: Rotation2d,
    /// Speed along the path (m/s)
    pub velocity: f64,
    #[serde(default)]
    pub acceleration: f64,
    #[serde(default)]
    pub curvature: f64,
}

impl TrajectorySample {
    fn is_finite(&self) -> bool {
        [
            self.time,
            self.pose.x(),
            self.pose.y(),
            self.pose.rotation.radians(),
            self.holonomic_rotation.radians(),
            self.velocity,
            self.acceleration,
            self.curvature,
        ]
        .iter()
        .all(|v| v.is_finite())
    }

    fn interpolate(&self, end: &TrajectorySample, t: f64) -> Self {
        let lerp = |a: f64, b: f64| a + (b - a) * t;
        Self {
            time: lerp(self.time, end.time),
            pose: self.pose.interpolate(end.pose, t),
            holonomic_rotation: self.holonomic_rotation.interpolate(end.holonomic_rotation, t),
            velocity: lerp(self.velocity, end.velocity),
            acceleration: lerp(self.acceleration, end.acceleration),
            curvature: lerp(self.curvature, end.curvature),
        }
    }
}

/// A validated, time-ordered sequence of samples.
///
/// # Example
/// ```
/// use tickwise::control::{Pose2d, Rotation2d, Trajectory, TrajectorySample};
///
/// let sample = |time: f64, x: f64| TrajectorySample {
///     time,
///     pose: Pose2d::new(x, 0.0, Rotation2d::ZERO),
///     holonomic_rotation: Rotation2d::ZERO,
///     velocity: 1.0,
///     acceleration: 0.0,
///     curvature: 0.0,
/// };
///
/// let trajectory = Trajectory::new(vec![sample(0.0, 0.0), sample(2.0, 2.0)]).unwrap();
/// assert_eq!(trajectory.total_time(), 2.0);
/// assert_eq!(trajectory.sample(0.5).pose.x(), 0.5);
/// // Sampling past the end is clamped to the final state.
/// assert_eq!(trajectory.sample(10.0), *trajectory.final_state());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TrajectorySample>", into = "Vec<TrajectorySample>")]
pub struct Trajectory {
    samples: Vec<TrajectorySample>,
}

impl Trajectory {
    /// Validate and wrap `samples`: non-empty, finite, starting at t >= 0
    /// and ordered by time.
    pub fn new(samples: Vec<TrajectorySample>) -> Result<Self, TrajectoryError> {
        let first = samples.first().ok_or(TrajectoryError::Empty)?;
        if first.time < 0.0 {
            return Err(TrajectoryError::NegativeStart(first.time));
        }

        for (index, sample) in samples.iter().enumerate() {
            if !sample.is_finite() {
                return Err(TrajectoryError::NonFinite { index });
            }
        }

        for (index, pair) in samples.windows(2).enumerate() {
            if pair[1].time < pair[0].time {
                return Err(TrajectoryError::OutOfOrder {
                    index: index + 1,
                    time: pair[1].time,
                });
            }
        }

        Ok(Self { samples })
    }

    /// State at `time` seconds, interpolated between the surrounding
    /// samples. Times before the start or after the end are clamped.
    pub fn sample(&self, time: f64) -> TrajectorySample {
        let first = self.initial_state();
        let last = self.final_state();

        if time.is_nan() || time <= first.time {
            return *first;
        }
        if time >= last.time {
            return *last;
        }

        // first.time < time < last.time, so 1 <= next < len
        let next = self.samples.partition_point(|s| s.time <= time);
        let before = &self.samples[next - 1];
        let after = &self.samples[next];
        let span = after.time - before.time;
        before.interpolate(after, (time - before.time) / span)
    }

    /// Duration of the trajectory in seconds.
    pub fn total_time(&self) -> f64 {
        self.final_state().time
    }

    pub fn initial_state(&self) -> &TrajectorySample {
        &self.samples[0]
    }

    pub fn final_state(&self) -> &TrajectorySample {
        &self.samples[self.samples.len() - 1]
    }

    /// Pose of the first sample (heading = direction of travel).
    pub fn initial_pose(&self) -> Pose2d {
        self.initial_state().pose
    }

    /// First position with the chassis heading, for seeding odometry.
    pub fn initial_holonomic_pose(&self) -> Pose2d {
        let first = self.initial_state();
        Pose2d {
            translation: first.pose.translation,
            rotation: first.holonomic_rotation,
        }
    }

    pub fn samples(&self) -> &[TrajectorySample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false: construction rejects empty trajectories.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn from_json(json: &str) -> Result<Self, TrajectoryError> {
        serde_json::from_str(json).map_err(|e| TrajectoryError::DeserializationFailed(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, TrajectoryError> {
        serde_json::to_string(self).map_err(|e| TrajectoryError::SerializationFailed(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TrajectoryError> {
        bincode::deserialize(bytes)
            .map_err(|e| TrajectoryError::DeserializationFailed(e.to_string()))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, TrajectoryError> {
        bincode::serialize(self).map_err(|e| TrajectoryError::SerializationFailed(e.to_string()))
    }
}

impl TryFrom<Vec<TrajectorySample>> for Trajectory {
    type Error = TrajectoryError;

    fn try_from(samples: Vec<TrajectorySample>) -> Result<Self, Self::Error> {
        Self::new(samples)
    }
}

impl From<Trajectory> for Vec<TrajectorySample> {
    fn from(trajectory: Trajectory) -> Self {
        trajectory.samples
    }
}
