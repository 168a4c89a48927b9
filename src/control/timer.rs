//! Elapsed-time measurement with a swappable clock.
//!
//! Controllers take their time from a [`Clock`] so tests can step time by
//! hand with a [`ManualClock`] instead of sleeping.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Monotonic time source.
pub trait Clock: Send {
    /// Time since an arbitrary fixed origin.
    fn now(&self) -> Duration;
}

/// Wall time from [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock that only moves when told to. Clones share the same time.
///
/// ```
/// use tickwise::control::{Clock, ManualClock};
/// use std::time::Duration;
///
/// let clock = ManualClock::new();
/// let handle = clock.clone();
/// handle.advance(Duration::from_millis(20));
/// assert_eq!(clock.now(), Duration::from_millis(20));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.nanos.fetch_add(saturating_nanos(by), Ordering::SeqCst);
    }

    pub fn set(&self, to: Duration) {
        self.nanos.store(saturating_nanos(to), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

fn saturating_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

/// Stopwatch over a [`Clock`].
#[derive(Debug, Clone)]
pub struct Timer<C: Clock = MonotonicClock> {
    clock: C,
    started_at: Option<Duration>,
    accumulated: Duration,
}

impl Timer<MonotonicClock> {
    pub fn new() -> Self {
        Self::with_clock(MonotonicClock::new())
    }
}

impl Default for Timer<MonotonicClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> Timer<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            started_at: None,
            accumulated: Duration::ZERO,
        }
    }

    /// Start counting; a no-op while already running.
    pub fn start(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(self.clock.now());
        }
    }

    /// Freeze the elapsed time.
    pub fn stop(&mut self) {
        self.accumulated = self.elapsed();
        self.started_at = None;
    }

    /// Zero the elapsed time; a running timer keeps running from zero.
    pub fn reset(&mut self) {
        self.accumulated = Duration::ZERO;
        if self.started_at.is_some() {
            self.started_at = Some(self.clock.now());
        }
    }

    pub fn elapsed(&self) -> Duration {
        match self.started_at {
            Some(start) => self.accumulated + self.clock.now().saturating_sub(start),
            None => self.accumulated,
        }
    }

    /// Elapsed time in seconds.
    pub fn get(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }

    /// True once at least `seconds` have elapsed.
    pub fn has_elapsed(&self, seconds: f64) -> bool {
        self.get() >= seconds
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopped_timer_does_not_advance() {
        let clock = ManualClock::new();
        let timer = Timer::with_clock(clock.clone());

        clock.advance(Duration::from_secs(3));
        assert_eq!(timer.elapsed(), Duration::ZERO);
        assert!(!timer.is_running());
    }

    #[test]
    fn start_stop_accumulates() {
        let clock = ManualClock::new();
        let mut timer = Timer::with_clock(clock.clone());

        timer.start();
        clock.advance(Duration::from_millis(500));
        timer.stop();
        clock.advance(Duration::from_secs(10));
        assert_eq!(timer.elapsed(), Duration::from_millis(500));

        timer.start();
        clock.advance(Duration::from_millis(250));
        assert_eq!(timer.elapsed(), Duration::from_millis(750));
    }

    #[test]
    fn start_while_running_keeps_origin() {
        let clock = ManualClock::new();
        let mut timer = Timer::with_clock(clock.clone());

        timer.start();
        clock.advance(Duration::from_secs(1));
        timer.start();
        assert_eq!(timer.elapsed(), Duration::from_secs(1));
    }

    #[test]
    fn reset_restarts_running_timer_from_zero() {
        let clock = ManualClock::new();
        let mut timer = Timer::with_clock(clock.clone());

        timer.start();
        clock.advance(Duration::from_secs(2));
        timer.reset();
        assert_eq!(timer.elapsed(), Duration::ZERO);

        clock.advance(Duration::from_secs(1));
        assert!(timer.has_elapsed(1.0));
        assert!(!timer.has_elapsed(1.5));
    }

    #[test]
    fn manual_clock_set() {
        let clock = ManualClock::new();
        clock.set(Duration::from_millis(40));
        assert_eq!(clock.now(), Duration::from_millis(40));
    }
}
