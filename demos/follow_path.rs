//! Follow a Path
//!
//! This demo drives a simulated swerve chassis along an S-curve.
//!
//! Key concepts:
//! - Trajectories as time-indexed samples
//! - Feed-forward plus PID feedback toward the sampled pose
//! - Heading held at the final holonomic rotation
//! - Tracker gains loaded from a JSON config file
//!
//! Run with: cargo run --example follow_path [config.json]

use std::f64::consts::PI;
use std::sync::{Arc, Mutex};
use tickwise::config::ControllerConfig;
use tickwise::control::{
    ActionRunner, ActionStatus, ChassisSpeeds, ModuleState, Pose2d, Rotation2d,
    SwerveKinematics, Trajectory, TrajectorySample, TrajectoryTracker, Translation2d,
};
use tickwise::runtime::{ControlLoop, Subsystem};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// An S-curve 3 m forward and 1 m left, turning the chassis to face back.
fn s_curve() -> Result<Trajectory, Box<dyn std::error::Error>> {
    const DURATION: f64 = 3.0;
    const STEPS: usize = 60;

    let samples = (0..=STEPS)
        .map(|step| {
            let s = step as f64 / STEPS as f64;
            // Smoothstep progress: zero speed at both ends
            let progress = s * s * (3.0 - 2.0 * s);
            let speed = 6.0 * s * (1.0 - s) / DURATION;

            let x = 3.0 * progress;
            let y = 0.5 * (1.0 - (PI * progress).cos());
            let dx = 3.0_f64;
            let dy = 0.5 * PI * (PI * progress).sin();
            let path_length_rate = dx.hypot(dy);

            TrajectorySample {
                time: s * DURATION,
                pose: Pose2d::new(x, y, Rotation2d::new(dy.atan2(dx))),
                holonomic_rotation: Rotation2d::from_degrees(180.0 * progress),
                velocity: speed * path_length_rate,
                acceleration: 0.0,
                curvature: 0.0,
            }
        })
        .collect();

    Ok(Trajectory::new(samples)?)
}

/// Integrates the commanded chassis speeds into a field pose.
struct SimulatedDrive {
    runner: ActionRunner<TrajectoryTracker<SwerveKinematics>>,
    pose: Arc<Mutex<Pose2d>>,
    dt: f64,
}

impl Subsystem for SimulatedDrive {
    fn name(&self) -> &str {
        "drivetrain"
    }

    fn tick(&mut self) {
        self.runner.tick();

        let speeds = self
            .runner
            .action()
            .last_command()
            .unwrap_or_else(ChassisSpeeds::zero);
        if let Ok(mut pose) = self.pose.lock() {
            let heading = pose.rotation;
            let field = Translation2d::new(speeds.vx, speeds.vy).rotate_by(heading);
            *pose = Pose2d::new(
                pose.x() + field.x * self.dt,
                pose.y() + field.y * self.dt,
                heading.rotate_by(Rotation2d::new(speeds.omega * self.dt)),
            );
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    println!("=== Follow a Path ===\n");

    let config = match std::env::args().nth(1) {
        Some(path) => ControllerConfig::from_path(path)?,
        None => ControllerConfig::from_json(
            r#"{ "tracker": { "x": { "kp": 2.0 }, "y": { "kp": 2.0 }, "theta": { "kp": 3.0 } } }"#,
        )?,
    };

    let trajectory = s_curve()?;
    let pose = Arc::new(Mutex::new(trajectory.initial_holonomic_pose()));
    let start = trajectory.initial_holonomic_pose();

    let kinematics = SwerveKinematics::new(vec![
        Translation2d::new(0.29, 0.29),
        Translation2d::new(0.29, -0.29),
        Translation2d::new(-0.29, 0.29),
        Translation2d::new(-0.29, -0.29),
    ])
    .with_max_module_speed(4.4);

    let source = Arc::clone(&pose);
    let tracker = TrajectoryTracker::from_config(
        trajectory,
        move || source.lock().map(|pose| *pose).unwrap_or_default(),
        kinematics,
        &config.tracker,
        |states: &[ModuleState]| {
            let fastest = states.iter().map(|m| m.speed).fold(0.0, f64::max);
            tracing::trace!(fastest, "module command");
        },
    );
    let mut runner = ActionRunner::new(tracker);
    runner.start();

    let drive = SimulatedDrive {
        runner,
        pose: Arc::clone(&pose),
        dt: config.control_loop.period().as_secs_f64(),
    };
    let done = Arc::new(tokio::sync::Notify::new());

    println!(
        "Start: ({:.2}, {:.2}) facing {:.0}°",
        start.x(),
        start.y(),
        start.rotation.degrees()
    );

    let mut control = ControlLoop::new(config.control_loop.clone());
    control.register(Watch {
        drive,
        done: Arc::clone(&done),
    });
    let stats = control.run_until(done.notified()).await;

    let end = pose.lock().map(|pose| *pose).unwrap_or_default();
    info!(cycles = stats.cycles, "path complete");
    println!(
        "End:   ({:.2}, {:.2}) facing {:.0}°",
        end.x(),
        end.y(),
        end.rotation.degrees()
    );
    println!("Target: (3.00, 1.00) facing 180°");

    println!("\n=== Demo Complete ===");
    Ok(())
}

/// Stops the loop once the path action has finished.
struct Watch {
    drive: SimulatedDrive,
    done: Arc<tokio::sync::Notify>,
}

impl Subsystem for Watch {
    fn name(&self) -> &str {
        self.drive.name()
    }

    fn tick(&mut self) {
        self.drive.tick();
        if self.drive.runner.status() == ActionStatus::Finished {
            self.done.notify_one();
        }
    }
}
