//! Chassis speeds to per-module commands.

use super::geometry::{ChassisSpeeds, ModuleState, Rotation2d, Translation2d};

/// Converts a robot-relative chassis velocity into one command per module.
pub trait Kinematics {
    /// Takes `&mut self` so implementations can remember where each wheel
    /// last pointed.
    fn to_module_states(&mut self, speeds: &ChassisSpeeds) -> Vec<ModuleState>;

    /// Number of modules every command contains.
    fn module_count(&self) -> usize;
}

/// Inverse kinematics for a swerve drive.
///
/// Each module's velocity is the chassis velocity plus `omega × r`, where
/// `r` is the module's offset from the centre of rotation. When a maximum
/// wheel speed is set, every module is scaled by the same factor so the
/// fastest one sits at the limit and the commanded direction is preserved.
///
/// A module commanded to zero speed keeps the angle it was last driven at,
/// so stopping never swings the wheels. Before any motion that angle is zero.
///
/// # Example
/// ```
/// use tickwise::control::{ChassisSpeeds, Kinematics, SwerveKinematics, Translation2d};
///
/// let mut kinematics = SwerveKinematics::new(vec![
///     Translation2d::new(0.3, 0.3),
///     Translation2d::new(0.3, -0.3),
///     Translation2d::new(-0.3, 0.3),
///     Translation2d::new(-0.3, -0.3),
/// ]);
///
/// let states = kinematics.to_module_states(&ChassisSpeeds::new(1.5, 0.0, 0.0));
/// assert!(states.iter().all(|s| (s.speed - 1.5).abs() < 1e-9));
///
/// let stopped = kinematics.to_module_states(&ChassisSpeeds::zero());
/// assert!(stopped.iter().all(|s| s.speed == 0.0));
/// ```
#[derive(Debug, Clone)]
pub struct SwerveKinematics {
    modules: Vec<Translation2d>,
    max_module_speed: Option<f64>,
    last_angles: Vec<Rotation2d>,
}

impl SwerveKinematics {
    pub fn new(modules: Vec<Translation2d>) -> Self {
        Self {
            last_angles: vec![Rotation2d::ZERO; modules.len()],
            modules,
            max_module_speed: None,
        }
    }

    /// Scale commands so no wheel exceeds `speed` (m/s).
    pub fn with_max_module_speed(mut self, speed: f64) -> Self {
        self.max_module_speed = Some(speed.abs());
        self
    }

    pub fn modules(&self) -> &[Translation2d] {
        &self.modules
    }

    /// Angle each module was last commanded to while moving.
    pub fn last_angles(&self) -> &[Rotation2d] {
        &self.last_angles
    }
}

impl Kinematics for SwerveKinematics {
    fn to_module_states(&mut self, speeds: &ChassisSpeeds) -> Vec<ModuleState> {
        let mut states: Vec<ModuleState> = self
            .modules
            .iter()
            .zip(self.last_angles.iter_mut())
            .map(|(offset, last)| {
                let vx = speeds.vx - speeds.omega * offset.y;
                let vy = speeds.vy + speeds.omega * offset.x;
                let speed = vx.hypot(vy);
                // A stopped wheel has no direction; hold the previous one.
                if speed > 0.0 {
                    *last = Rotation2d::new(vy.atan2(vx));
                }
                ModuleState::new(speed, *last)
            })
            .collect();

        if let Some(limit) = self.max_module_speed {
            let fastest = states.iter().map(|s| s.speed).fold(0.0_f64, f64::max);
            if fastest > limit {
                let scale = limit / fastest;
                for state in &mut states {
                    state.speed *= scale;
                }
            }
        }

        states
    }

    fn module_count(&self) -> usize {
        self.modules.len()
    }
}
