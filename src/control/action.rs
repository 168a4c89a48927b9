//! Time-extended behaviours run from a state's `execute()`.
//!
//! An [`Action`] is started once, updated every tick until it reports
//! finished, then closed with `done()`. States own an [`ActionRunner`] and
//! call [`ActionRunner::tick`] from `execute()`; leaving the state early
//! calls [`ActionRunner::cancel`] from `exit()`.

use tracing::debug;

/// A unit of work spread over several control cycles.
pub trait Action: Send {
    /// Called once before the first `update()`.
    fn start(&mut self);

    /// Called every tick while not finished.
    fn update(&mut self);

    fn is_finished(&self) -> bool;

    /// Called once, either after `is_finished()` turned true or on
    /// cancellation. Must leave the actuators safe.
    fn done(&mut self);
}

impl<A: Action + ?Sized> Action for Box<A> {
    fn start(&mut self) {
        (**self).start()
    }

    fn update(&mut self) {
        (**self).update()
    }

    fn is_finished(&self) -> bool {
        (**self).is_finished()
    }

    fn done(&mut self) {
        (**self).done()
    }
}

/// Where an [`ActionRunner`] is in its action's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionStatus {
    NotStarted,
    Running,
    Finished,
}

/// Drives one action with exactly-once `start()` and `done()`.
///
/// # Example
/// ```
/// use tickwise::control::{Action, ActionRunner, ActionStatus};
///
/// struct Wait {
///     ticks: u32,
/// }
///
/// impl Action for Wait {
///     fn start(&mut self) {}
///     fn update(&mut self) {
///         self.ticks -= 1;
///     }
///     fn is_finished(&self) -> bool {
///         self.ticks == 0
///     }
///     fn done(&mut self) {}
/// }
///
/// let mut runner = ActionRunner::new(Wait { ticks: 2 });
/// runner.start();
/// assert_eq!(runner.tick(), ActionStatus::Running);
/// assert_eq!(runner.tick(), ActionStatus::Running);
/// assert_eq!(runner.tick(), ActionStatus::Finished);
/// ```
#[derive(Debug)]
pub struct ActionRunner<A: Action> {
    action: A,
    status: ActionStatus,
}

impl<A: Action> ActionRunner<A> {
    pub fn new(action: A) -> Self {
        Self {
            action,
            status: ActionStatus::NotStarted,
        }
    }

    /// Start (or restart) the action.
    pub fn start(&mut self) {
        if self.status == ActionStatus::Running {
            self.action.done();
        }
        self.action.start();
        self.status = ActionStatus::Running;
    }

    /// Advance one control cycle: `done()` if finished, `update()` otherwise.
    pub fn tick(&mut self) -> ActionStatus {
        if self.status == ActionStatus::Running {
            if self.action.is_finished() {
                self.action.done();
                self.status = ActionStatus::Finished;
                debug!("action finished");
            } else {
                self.action.update();
            }
        }
        self.status
    }

    /// Stop a running action early. No-op otherwise.
    pub fn cancel(&mut self) {
        if self.status == ActionStatus::Running {
            self.action.done();
            self.status = ActionStatus::Finished;
            debug!("action cancelled");
        }
    }

    pub fn status(&self) -> ActionStatus {
        self.status
    }

    pub fn action(&self) -> &A {
        &self.action
    }

    pub fn action_mut(&mut self) -> &mut A {
        &mut self.action
    }

    pub fn into_inner(self) -> A {
        self.action
    }
}

/// Runs actions one after another; the next starts on the tick the
/// previous one finishes.
#[derive(Default)]
pub struct SeriesAction {
    actions: Vec<Box<dyn Action>>,
    current: usize,
}

impl SeriesAction {
    pub fn new(actions: Vec<Box<dyn Action>>) -> Self {
        let current = actions.len();
        Self { actions, current }
    }

    /// Append an action to the end of the series.
    pub fn then(mut self, action: impl Action + 'static) -> Self {
        self.actions.push(Box::new(action));
        if self.current == self.actions.len() - 1 {
            self.current = self.actions.len();
        }
        self
    }

    /// Index of the running action, if any.
    pub fn current_index(&self) -> Option<usize> {
        (self.current < self.actions.len()).then_some(self.current)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl Action for SeriesAction {
    fn start(&mut self) {
        self.current = 0;
        if let Some(first) = self.actions.first_mut() {
            first.start();
        }
    }

    fn update(&mut self) {
        let Some(action) = self.actions.get_mut(self.current) else {
            return;
        };

        action.update();
        if action.is_finished() {
            action.done();
            self.current += 1;
            if let Some(next) = self.actions.get_mut(self.current) {
                next.start();
            }
        }
    }

    fn is_finished(&self) -> bool {
        self.current >= self.actions.len()
    }

    fn done(&mut self) {
        if let Some(action) = self.actions.get_mut(self.current) {
            action.done();
        }
        self.current = self.actions.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    type Log = Arc<Mutex<Vec<String>>>;

    struct Step {
        name: &'static str,
        remaining: u32,
        log: Log,
    }

    impl Step {
        fn new(name: &'static str, ticks: u32, log: &Log) -> Self {
            Self {
                name,
                remaining: ticks,
                log: Arc::clone(log),
            }
        }

        fn record(&self, event: &str) {
            self.log.lock().unwrap().push(format!("{}:{event}", self.name));
        }
    }

    impl Action for Step {
        fn start(&mut self) {
            self.record("start");
        }

        fn update(&mut self) {
            self.remaining = self.remaining.saturating_sub(1);
            self.record("update");
        }

        fn is_finished(&self) -> bool {
            self.remaining == 0
        }

        fn done(&mut self) {
            self.record("done");
        }
    }

    fn events(log: &Log) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    #[test]
    fn runner_calls_done_once() {
        let log = Log::default();
        let mut runner = ActionRunner::new(Step::new("a", 1, &log));

        assert_eq!(runner.tick(), ActionStatus::NotStarted);
        runner.start();
        runner.tick();
        runner.tick();
        runner.tick();
        runner.cancel();

        assert_eq!(events(&log), vec!["a:start", "a:update", "a:done"]);
        assert_eq!(runner.status(), ActionStatus::Finished);
    }

    #[test]
    fn cancel_closes_running_action() {
        let log = Log::default();
        let mut runner = ActionRunner::new(Step::new("a", 10, &log));

        runner.start();
        runner.tick();
        runner.cancel();

        assert_eq!(events(&log), vec!["a:start", "a:update", "a:done"]);
    }

    #[test]
    fn restart_closes_previous_run() {
        let log = Log::default();
        let mut runner = ActionRunner::new(Step::new("a", 10, &log));

        runner.start();
        runner.start();

        assert_eq!(events(&log), vec!["a:start", "a:done", "a:start"]);
        assert_eq!(runner.status(), ActionStatus::Running);
    }

    #[test]
    fn series_runs_in_order() {
        let log = Log::default();
        let mut series = SeriesAction::default()
            .then(Step::new("a", 1, &log))
            .then(Step::new("b", 2, &log));
        assert!(series.is_finished());

        series.start();
        assert_eq!(series.current_index(), Some(0));
        while !series.is_finished() {
            series.update();
        }
        series.done();

        assert_eq!(
            events(&log),
            vec![
                "a:start", "a:update", "a:done", "b:start", "b:update", "b:update", "b:done"
            ]
        );
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn cancelling_series_stops_current_action() {
        let log = Log::default();
        let mut series = SeriesAction::new(vec![
            Box::new(Step::new("a", 1, &log)),
            Box::new(Step::new("b", 5, &log)),
        ]);

        series.start();
        series.update();
        series.update();
        series.done();

        assert!(series.is_finished());
        assert_eq!(
            events(&log),
            vec!["a:start", "a:update", "a:done", "b:start", "b:update", "b:done"]
        );
    }
}
