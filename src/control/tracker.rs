//! Closed-loop trajectory following for a swerve drivetrain.

use super::action::Action;
use super::geometry::{ChassisSpeeds, ModuleState, Pose2d, Rotation2d};
use super::holonomic::HolonomicController;
use super::kinematics::Kinematics;
use super::timer::{Clock, MonotonicClock, Timer};
use super::trajectory::Trajectory;
use crate::config::TrackerConfig;
use tracing::{debug, info, warn};

/// Lifecycle of a [`TrajectoryTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerPhase {
    Idle,
    Running,
    Finished,
}

type PoseSource = Box<dyn Fn() -> Pose2d + Send>;
type ModuleSink = Box<dyn FnMut(&[ModuleState]) + Send>;

/// Follows one trajectory, emitting module commands every `update()`.
///
/// The tracker samples the trajectory at the elapsed time, reads the
/// measured pose, runs the [`HolonomicController`] and hands the resulting
/// module states to the output sink. The heading target is the final
/// sample's holonomic rotation for the whole run.
///
/// Finishing is the caller's decision: `update()` keeps commanding the
/// (clamped) final sample after the duration elapsed, and only `done()`
/// stops the drive.
///
/// # Example
/// ```
/// use std::sync::{Arc, Mutex};
/// use std::time::Duration;
/// use tickwise::control::{
///     HolonomicController, ManualClock, ModuleState, PidConfig, Pose2d, Rotation2d,
///     SwerveKinematics, Trajectory, TrajectorySample, TrajectoryTracker, Translation2d,
/// };
///
/// let trajectory = Trajectory::new(vec![
///     TrajectorySample {
///         time: 0.0,
///         pose: Pose2d::new(0.0, 0.0, Rotation2d::ZERO),
///         holonomic_rotation: Rotation2d::ZERO,
///         velocity: 0.0,
///         acceleration: 1.0,
///         curvature: 0.0,
///     },
///     TrajectorySample {
///         time: 1.0,
///         pose: Pose2d::new(0.5, 0.0, Rotation2d::ZERO),
///         holonomic_rotation: Rotation2d::ZERO,
///         velocity: 1.0,
///         acceleration: 0.0,
///         curvature: 0.0,
///     },
/// ])
/// .unwrap();
///
/// let kinematics = SwerveKinematics::new(vec![
///     Translation2d::new(0.3, 0.3),
///     Translation2d::new(0.3, -0.3),
/// ]);
/// let controller =
///     HolonomicController::new(PidConfig::p(1.0), PidConfig::p(1.0), PidConfig::p(1.0), 0.02);
///
/// let commands: Arc<Mutex<Vec<Vec<ModuleState>>>> = Arc::default();
/// let sink = Arc::clone(&commands);
/// let clock = ManualClock::new();
///
/// let mut tracker = TrajectoryTracker::new(
///     trajectory,
///     || Pose2d::default(),
///     kinematics,
///     controller,
///     move |states: &[ModuleState]| sink.lock().unwrap().push(states.to_vec()),
/// )
/// .with_clock(clock.clone());
///
/// tracker.start();
/// tracker.update();
/// clock.advance(Duration::from_secs(1));
/// assert!(tracker.is_finished());
/// tracker.done();
///
/// let commands = commands.lock().unwrap();
/// assert_eq!(commands.len(), 2);
/// assert!(commands[1].iter().all(|m| m.speed == 0.0));
/// ```
pub struct TrajectoryTracker<K: Kinematics, C: Clock = MonotonicClock> {
    trajectory: Trajectory,
    pose: PoseSource,
    kinematics: K,
    controller: HolonomicController,
    output: ModuleSink,
    timer: Timer<C>,
    target_heading: Rotation2d,
    phase: TrackerPhase,
    last_command: Option<ChassisSpeeds>,
}

impl<K: Kinematics> TrajectoryTracker<K, MonotonicClock> {
    pub fn new<P, O>(
        trajectory: Trajectory,
        pose: P,
        kinematics: K,
        controller: HolonomicController,
        output: O,
    ) -> Self
    where
        P: Fn() -> Pose2d + Send + 'static,
        O: FnMut(&[ModuleState]) + Send + 'static,
    {
        let target_heading = trajectory.final_state().holonomic_rotation;
        Self {
            trajectory,
            pose: Box::new(pose),
            kinematics,
            controller,
            output: Box::new(output),
            timer: Timer::new(),
            target_heading,
            phase: TrackerPhase::Idle,
            last_command: None,
        }
    }

    /// Build the controller from `config`.
    pub fn from_config<P, O>(
        trajectory: Trajectory,
        pose: P,
        kinematics: K,
        config: &TrackerConfig,
        output: O,
    ) -> Self
    where
        P: Fn() -> Pose2d + Send + 'static,
        O: FnMut(&[ModuleState]) + Send + 'static,
    {
        Self::new(trajectory, pose, kinematics, config.controller(), output)
    }
}

impl<K: Kinematics, C: Clock> TrajectoryTracker<K, C> {
    /// Measure elapsed time with `clock` instead.
    pub fn with_clock<C2: Clock>(self, clock: C2) -> TrajectoryTracker<K, C2> {
        TrajectoryTracker {
            trajectory: self.trajectory,
            pose: self.pose,
            kinematics: self.kinematics,
            controller: self.controller,
            output: self.output,
            timer: Timer::with_clock(clock),
            target_heading: self.target_heading,
            phase: self.phase,
            last_command: self.last_command,
        }
    }

    /// Reset the controller and (re)start the clock from zero.
    pub fn start(&mut self) {
        self.controller.reset();
        self.timer.reset();
        self.timer.start();
        self.phase = TrackerPhase::Running;
        self.last_command = None;
        info!(
            duration = self.trajectory.total_time(),
            samples = self.trajectory.len(),
            "trajectory started"
        );
    }

    /// Emit one command. Ignored unless running.
    pub fn update(&mut self) {
        if self.phase != TrackerPhase::Running {
            warn!(phase = ?self.phase, "trajectory update ignored while not running");
            return;
        }

        let elapsed = self.timer.get();
        let reference = self.trajectory.sample(elapsed);
        let pose = (self.pose)();
        let speeds = self
            .controller
            .calculate(pose, &reference, self.target_heading);
        let states = self.kinematics.to_module_states(&speeds);
        (self.output)(&states);
        self.last_command = Some(speeds);

        debug!(
            elapsed,
            error_x = self.controller.translation_error().x,
            error_y = self.controller.translation_error().y,
            error_theta = self.controller.rotation_error().radians(),
            "trajectory update"
        );
    }

    /// Elapsed time has reached the trajectory's duration.
    pub fn is_finished(&self) -> bool {
        self.timer.has_elapsed(self.trajectory.total_time())
    }

    /// Stop the clock and command zero speed, once.
    pub fn done(&mut self) {
        if self.phase == TrackerPhase::Finished {
            warn!("trajectory already done");
            return;
        }

        self.timer.stop();
        let stop = ChassisSpeeds::zero();
        let states = self.kinematics.to_module_states(&stop);
        (self.output)(&states);
        self.last_command = Some(stop);
        self.phase = TrackerPhase::Finished;
        info!(
            elapsed = self.timer.get(),
            at_reference = self.controller.at_reference(),
            "trajectory done"
        );
    }

    pub fn phase(&self) -> TrackerPhase {
        self.phase
    }

    /// Seconds since `start()`.
    pub fn elapsed(&self) -> f64 {
        self.timer.get()
    }

    /// First sampled pose of the trajectory.
    pub fn initial_pose(&self) -> Pose2d {
        self.trajectory.initial_pose()
    }

    /// First position with the chassis heading, for resetting odometry.
    pub fn initial_holonomic_pose(&self) -> Pose2d {
        self.trajectory.initial_holonomic_pose()
    }

    pub fn target_heading(&self) -> Rotation2d {
        self.target_heading
    }

    /// Chassis speeds most recently sent to the sink.
    pub fn last_command(&self) -> Option<ChassisSpeeds> {
        self.last_command
    }

    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    pub fn controller(&self) -> &HolonomicController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut HolonomicController {
        &mut self.controller
    }
}

impl<K: Kinematics + Send, C: Clock> Action for TrajectoryTracker<K, C> {
    fn start(&mut self) {
        TrajectoryTracker::start(self)
    }

    fn update(&mut self) {
        TrajectoryTracker::update(self)
    }

    fn is_finished(&self) -> bool {
        TrajectoryTracker::is_finished(self)
    }

    fn done(&mut self) {
        TrajectoryTracker::done(self)
    }
}
