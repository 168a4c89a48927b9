//! Trajectory following and the control primitives it is built from.
//!
//! The pieces compose leaves first: geometry value types, a scalar [`Pid`],
//! the [`HolonomicController`] combining three of them, [`Kinematics`] to
//! turn chassis speeds into module commands, and the [`TrajectoryTracker`]
//! that drives all of it from a [`Trajectory`] and a [`Clock`].

mod action;
mod geometry;
mod holonomic;
mod kinematics;
mod pid;
mod timer;
mod tracker;
mod trajectory;

pub use action::{Action, ActionRunner, ActionStatus, SeriesAction};
pub use geometry::{ChassisSpeeds, ModuleState, Pose2d, Rotation2d, Translation2d};
pub use holonomic::{HolonomicController, Tolerance};
pub use kinematics::{Kinematics, SwerveKinematics};
pub use pid::{InputRange, Pid, PidConfig};
pub use timer::{Clock, ManualClock, MonotonicClock, Timer};
pub use tracker::{TrackerPhase, TrajectoryTracker};
pub use trajectory::{Trajectory, TrajectoryError, TrajectorySample};
