//! Fixed-rate driver loop over all subsystems.

use super::subsystem::Subsystem;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

/// Slowest loop rate accepted by config validation.
pub const MIN_RATE_HZ: f64 = 1.0;

/// Fastest loop rate accepted by config validation.
pub const MAX_RATE_HZ: f64 = 1000.0;

const DEFAULT_PERIOD: Duration = Duration::from_millis(20);

/// Configuration for a control loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlLoopConfig {
    /// Target loop rate in Hz
    pub rate_hz: f64,
    /// Name for logging
    pub name: String,
    /// Whether to warn on timing overruns
    pub warn_on_overrun: bool,
}

impl Default for ControlLoopConfig {
    fn default() -> Self {
        Self {
            rate_hz: 50.0,
            name: "control_loop".to_string(),
            warn_on_overrun: true,
        }
    }
}

impl ControlLoopConfig {
    pub fn new(rate_hz: f64) -> Self {
        Self {
            rate_hz,
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Target period; 20 ms when the rate gives no representable non-zero period.
    pub fn period(&self) -> Duration {
        Duration::try_from_secs_f64(1.0 / self.rate_hz)
            .ok()
            .filter(|period| !period.is_zero())
            .unwrap_or(DEFAULT_PERIOD)
    }
}

/// Timing and fault counters for a control loop
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControlLoopStats {
    /// Cycles run
    pub cycles: u64,
    /// Cycles that took longer than the period
    pub overruns: u64,
    /// Subsystem ticks that panicked
    pub faults: u64,
    pub total_cycle_time: Duration,
    pub max_cycle_time: Duration,
    pub last_cycle_time: Duration,
}

impl ControlLoopStats {
    fn record(&mut self, cycle_time: Duration, overrun: bool, faults: usize) {
        self.cycles += 1;
        self.total_cycle_time += cycle_time;
        self.max_cycle_time = self.max_cycle_time.max(cycle_time);
        self.last_cycle_time = cycle_time;
        if overrun {
            self.overruns += 1;
        }
        self.faults += faults as u64;
    }

    pub fn average_cycle_time(&self) -> Duration {
        match u32::try_from(self.cycles) {
            Ok(0) => Duration::ZERO,
            Ok(cycles) => self.total_cycle_time / cycles,
            Err(_) => self.total_cycle_time.div_f64(self.cycles as f64),
        }
    }

    /// Get the overrun ratio (0.0 to 1.0)
    pub fn overrun_ratio(&self) -> f64 {
        if self.cycles == 0 {
            0.0
        } else {
            self.overruns as f64 / self.cycles as f64
        }
    }
}

/// What happened during one call to [`ControlLoop::tick_all`].
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    /// 1-based cycle number
    pub cycle: u64,
    pub duration: Duration,
    pub overrun: bool,
    /// Subsystems whose tick panicked this cycle
    pub faulted: Vec<String>,
}

impl CycleReport {
    pub fn is_clean(&self) -> bool {
        self.faulted.is_empty()
    }
}

struct Registered {
    subsystem: Box<dyn Subsystem>,
    faults: u64,
}

/// Ticks every registered subsystem once per cycle, in registration order.
pub struct ControlLoop {
    config: ControlLoopConfig,
    subsystems: Vec<Registered>,
    stats: ControlLoopStats,
}

impl ControlLoop {
    pub fn new(config: ControlLoopConfig) -> Self {
        Self {
            config,
            subsystems: Vec::new(),
            stats: ControlLoopStats::default(),
        }
    }

    /// Add a subsystem; it is ticked after those registered before it.
    pub fn register(&mut self, subsystem: impl Subsystem + 'static) -> &mut Self {
        self.subsystems.push(Registered {
            subsystem: Box::new(subsystem),
            faults: 0,
        });
        self
    }

    /// Run one cycle.
    pub fn tick_all(&mut self) -> CycleReport {
        let started = Instant::now();
        let mut faulted = Vec::new();

        for entry in &mut self.subsystems {
            let result = panic::catch_unwind(AssertUnwindSafe(|| entry.subsystem.tick()));
            if let Err(payload) = result {
                entry.faults += 1;
                error!(
                    control_loop = %self.config.name,
                    subsystem = entry.subsystem.name(),
                    faults = entry.faults,
                    message = %panic_message(payload.as_ref()),
                    "subsystem tick panicked"
                );
                faulted.push(entry.subsystem.name().to_string());
            }
        }

        let duration = started.elapsed();
        let period = self.config.period();
        let overrun = duration > period;
        self.stats.record(duration, overrun, faulted.len());

        if overrun && self.config.warn_on_overrun {
            warn!(
                control_loop = %self.config.name,
                cycle = self.stats.cycles,
                overrun_by = ?(duration - period),
                "loop overrun"
            );
        }

        CycleReport {
            cycle: self.stats.cycles,
            duration,
            overrun,
            faulted,
        }
    }

    /// Tick at the configured rate until `shutdown` resolves.
    ///
    /// Late cycles are skipped rather than run back to back.
    pub async fn run_until<F>(&mut self, shutdown: F) -> ControlLoopStats
    where
        F: Future<Output = ()>,
    {
        let mut interval = tokio::time::interval(self.config.period());
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut shutdown = std::pin::pin!(shutdown);

        info!(
            control_loop = %self.config.name,
            rate_hz = self.config.rate_hz,
            subsystems = self.subsystems.len(),
            "control loop started"
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = interval.tick() => {
                    self.tick_all();
                }
            }
        }

        info!(
            control_loop = %self.config.name,
            cycles = self.stats.cycles,
            overruns = self.stats.overruns,
            faults = self.stats.faults,
            "control loop stopped"
        );
        self.stats
    }

    pub fn stats(&self) -> ControlLoopStats {
        self.stats
    }

    pub fn config(&self) -> &ControlLoopConfig {
        &self.config
    }

    /// Panics caught so far for the named subsystem.
    pub fn faults(&self, subsystem: &str) -> Option<u64> {
        self.subsystems
            .iter()
            .find(|entry| entry.subsystem.name() == subsystem)
            .map(|entry| entry.faults)
    }

    /// Names of registered subsystems in tick order.
    pub fn subsystems(&self) -> impl Iterator<Item = &str> + '_ {
        self.subsystems.iter().map(|entry| entry.subsystem.name())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
