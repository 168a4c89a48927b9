//! Scalar PID controller used for each axis of the holonomic controller.

use serde::{Deserialize, Serialize};

/// Input range treated as circular, e.g. `-π..π` for a heading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputRange {
    pub min: f64,
    pub max: f64,
}

impl InputRange {
    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

/// PID controller configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PidConfig {
    /// Proportional gain
    pub kp: f64,
    /// Integral gain
    pub ki: f64,
    /// Derivative gain
    pub kd: f64,
    /// Symmetric output clamp, `None` for unlimited
    pub output_limit: Option<f64>,
    /// Clamp on the accumulated integral, `None` for unlimited
    pub integral_limit: Option<f64>,
    /// Wrap the error around this range instead of subtracting linearly
    pub continuous_input: Option<InputRange>,
}

impl Default for PidConfig {
    fn default() -> Self {
        Self {
            kp: 1.0,
            ki: 0.0,
            kd: 0.0,
            output_limit: None,
            integral_limit: None,
            continuous_input: None,
        }
    }
}

impl PidConfig {
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self {
            kp,
            ki,
            kd,
            ..Default::default()
        }
    }

    /// Create a P-only config
    pub fn p(kp: f64) -> Self {
        Self::new(kp, 0.0, 0.0)
    }

    pub fn with_output_limit(mut self, limit: f64) -> Self {
        self.output_limit = Some(limit.abs());
        self
    }

    pub fn with_integral_limit(mut self, limit: f64) -> Self {
        self.integral_limit = Some(limit.abs());
        self
    }

    /// Treat `min..max` as circular (headings).
    pub fn with_continuous_input(mut self, min: f64, max: f64) -> Self {
        self.continuous_input = Some(InputRange { min, max });
        self
    }
}

/// PID controller
///
/// # Example
/// ```
/// use tickwise::control::{Pid, PidConfig};
/// use std::f64::consts::PI;
///
/// let mut heading = Pid::new(PidConfig::p(2.0).with_continuous_input(-PI, PI));
///
/// // 170° to -170° is a 20° turn, not a 340° one.
/// let output = heading.update((-170.0f64).to_radians(), 170.0f64.to_radians(), 0.02);
/// assert!((output - 2.0 * 20.0f64.to_radians()).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Pid {
    config: PidConfig,
    integral: f64,
    prev_error: Option<f64>,
}

impl Pid {
    pub fn new(config: PidConfig) -> Self {
        Self {
            config,
            integral: 0.0,
            prev_error: None,
        }
    }

    /// Create a P-only controller
    pub fn p(kp: f64) -> Self {
        Self::new(PidConfig::p(kp))
    }

    /// Compute the output driving `measurement` towards `setpoint`.
    ///
    /// `dt` is the time since the previous update in seconds. The integral
    /// and derivative terms are skipped for a non-positive `dt`, and the
    /// derivative is skipped on the first update after a reset.
    #[inline]
    pub fn update(&mut self, setpoint: f64, measurement: f64, dt: f64) -> f64 {
        let error = self.error(setpoint, measurement);
        self.update_error(error, dt)
    }

    /// Update with a pre-computed error (setpoint - measurement).
    pub fn update_error(&mut self, error: f64, dt: f64) -> f64 {
        let mut output = self.config.kp * error;

        if dt > 0.0 {
            self.integral += error * dt;
            if let Some(limit) = self.config.integral_limit {
                self.integral = self.integral.clamp(-limit, limit);
            }
            output += self.config.ki * self.integral;

            if let Some(prev) = self.prev_error {
                output += self.config.kd * (error - prev) / dt;
            }
        }
        self.prev_error = Some(error);

        match self.config.output_limit {
            Some(limit) => output.clamp(-limit, limit),
            None => output,
        }
    }

    /// Setpoint minus measurement, wrapped for continuous inputs.
    pub fn error(&self, setpoint: f64, measurement: f64) -> f64 {
        let raw = setpoint - measurement;
        match self.config.continuous_input {
            Some(range) if range.span() > 0.0 => {
                let span = range.span();
                let half = span / 2.0;
                (raw + half).rem_euclid(span) - half
            }
            _ => raw,
        }
    }

    /// Forget the integral and the previous error.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = None;
    }

    /// Error seen on the most recent update.
    pub fn last_error(&self) -> Option<f64> {
        self.prev_error
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }

    pub fn config(&self) -> &PidConfig {
        &self.config
    }

    pub fn set_gains(&mut self, kp: f64, ki: f64, kd: f64) {
        self.config.kp = kp;
        self.config.ki = ki;
        self.config.kd = kd;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn p_controller() {
        let mut pid = Pid::p(2.0);
        // Error = 10 - 5 = 5, P term = 2 * 5 = 10
        assert_relative_eq!(pid.update(10.0, 5.0, 0.02), 10.0, epsilon = 1e-10);
    }

    #[test]
    fn integral_accumulates_and_is_limited() {
        let mut pid = Pid::new(PidConfig::new(0.0, 1.0, 0.0).with_integral_limit(0.5));

        assert_relative_eq!(pid.update(1.0, 0.0, 0.1), 0.1, epsilon = 1e-12);
        assert_relative_eq!(pid.update(1.0, 0.0, 0.1), 0.2, epsilon = 1e-12);
        for _ in 0..100 {
            pid.update(1.0, 0.0, 0.1);
        }
        assert_relative_eq!(pid.integral(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn derivative_skips_first_update() {
        let mut pid = Pid::new(PidConfig::new(0.0, 0.0, 1.0));

        assert_relative_eq!(pid.update(1.0, 0.0, 0.1), 0.0);
        // Error shrinks from 1.0 to 0.5 over 0.1 s
        assert_relative_eq!(pid.update(1.0, 0.5, 0.1), -5.0, epsilon = 1e-9);
    }

    #[test]
    fn output_is_clamped() {
        let mut pid = Pid::new(PidConfig::p(10.0).with_output_limit(3.0));
        assert_relative_eq!(pid.update(10.0, 0.0, 0.02), 3.0);
        assert_relative_eq!(pid.update(-10.0, 0.0, 0.02), -3.0);
    }

    #[test]
    fn continuous_input_wraps_error() {
        let pid = Pid::new(PidConfig::p(1.0).with_continuous_input(-PI, PI));
        assert_relative_eq!(pid.error(0.9 * PI, -0.9 * PI), -0.2 * PI, epsilon = 1e-9);
        assert_relative_eq!(pid.error(0.25, 0.0), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn non_positive_dt_only_uses_p() {
        let mut pid = Pid::new(PidConfig::new(1.0, 5.0, 5.0));
        assert_relative_eq!(pid.update(2.0, 1.0, 0.0), 1.0);
        assert_relative_eq!(pid.integral(), 0.0);
    }

    #[test]
    fn reset_clears_state() {
        let mut pid = Pid::new(PidConfig::new(1.0, 1.0, 0.0));
        pid.update(10.0, 5.0, 0.1);
        assert!(pid.integral() > 0.0);

        pid.reset();
        assert_relative_eq!(pid.integral(), 0.0);
        assert_eq!(pid.last_error(), None);
    }

    #[test]
    fn config_defaults_fill_missing_fields() {
        let config: PidConfig = serde_json::from_str(r#"{ "kp": 4.0 }"#).unwrap();
        assert_relative_eq!(config.kp, 4.0);
        assert_relative_eq!(config.ki, 0.0);
        assert_eq!(config.output_limit, None);
    }
}
