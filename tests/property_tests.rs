//! Property-based tests for the state machine engine and trajectory tracking.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated inputs.

use chrono::Utc;
use proptest::prelude::*;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tickwise::builder::StateMachineBuilder;
use tickwise::control::{
    HolonomicController, ManualClock, ModuleState, PidConfig, Pose2d, Rotation2d,
    SwerveKinematics, Trajectory, TrajectorySample, TrajectoryTracker, Translation2d,
};
use tickwise::core::{Activation, State, StateHistory, StateTransition, Transitions};
use tickwise::machine::StateMachine;
use tickwise::state_enum;

state_enum! {
    enum Mode {
        Idle,
        Intake,
        Score,
    }
}

const MODES: [Mode; 3] = [Mode::Idle, Mode::Intake, Mode::Score];

#[derive(Default, Debug)]
struct Counts {
    inits: u32,
    exits: u32,
    executes: u32,
}

#[derive(Clone, Copy, Default, Debug)]
struct Request {
    target: Option<Mode>,
}

struct Node {
    key: Mode,
}

impl State<Mode, Counts, Request> for Node {
    fn build(&self, transitions: &mut Transitions<Mode, Counts, Request>) {
        for target in MODES.into_iter().filter(|m| *m != self.key) {
            transitions.on(target, move |r: &Request| r.target == Some(target));
        }
    }

    fn init(&mut self, counts: &mut Counts, _: &Request, _: Mode) -> Activation<Mode> {
        counts.inits += 1;
        Activation::Continue
    }

    fn execute(&mut self, counts: &mut Counts, _: &Request) {
        counts.executes += 1;
    }

    fn exit(&mut self, counts: &mut Counts, _: &Request, _: Mode) {
        counts.exits += 1;
    }
}

fn machine() -> StateMachine<Mode, Counts, Request> {
    StateMachineBuilder::new("mode")
        .state(Mode::Idle, Node { key: Mode::Idle })
        .state(Mode::Intake, Node { key: Mode::Intake })
        .state(Mode::Score, Node { key: Mode::Score })
        .initial(Mode::Idle)
        .build(Counts::default())
        .unwrap()
}

prop_compose! {
    fn arbitrary_mode()(variant in 0..3usize) -> Mode {
        MODES[variant]
    }
}

prop_compose! {
    fn arbitrary_request()(target in proptest::option::of(arbitrary_mode())) -> Request {
        Request { target }
    }
}

fn line_trajectory(total: f64, heading_deg: f64) -> Trajectory {
    let sample = |time: f64, x: f64, velocity: f64| TrajectorySample {
        time,
        pose: Pose2d::new(x, 0.0, Rotation2d::ZERO),
        holonomic_rotation: Rotation2d::from_degrees(heading_deg),
        velocity,
        acceleration: 0.0,
        curvature: 0.0,
    };
    Trajectory::new(vec![
        sample(0.0, 0.0, 0.0),
        sample(total / 2.0, total / 2.0, 1.0),
        sample(total, total, 0.5),
    ])
    .unwrap()
}

type Commands = Arc<Mutex<Vec<Vec<ModuleState>>>>;

fn line_tracker(
    total: f64,
    pose: Pose2d,
) -> (
    TrajectoryTracker<SwerveKinematics, ManualClock>,
    ManualClock,
    Commands,
) {
    let kinematics = SwerveKinematics::new(vec![
        Translation2d::new(0.3, 0.3),
        Translation2d::new(0.3, -0.3),
        Translation2d::new(-0.3, 0.3),
        Translation2d::new(-0.3, -0.3),
    ]);
    let controller =
        HolonomicController::new(PidConfig::p(1.5), PidConfig::p(1.5), PidConfig::p(2.5), 0.02);
    let commands = Commands::default();
    let sink = Arc::clone(&commands);
    let clock = ManualClock::new();
    let tracker = TrajectoryTracker::new(
        line_trajectory(total, 30.0),
        move || pose,
        kinematics,
        controller,
        move |states: &[ModuleState]| sink.lock().unwrap().push(states.to_vec()),
    )
    .with_clock(clock.clone());
    (tracker, clock, commands)
}

proptest! {
    #[test]
    fn first_true_guard_wins(outcomes in prop::collection::vec(any::<bool>(), 1..8)) {
        let mut transitions: Transitions<Mode, (), Vec<bool>> = Transitions::new();
        for (index, _) in outcomes.iter().enumerate() {
            transitions.on(MODES[index % 3], move |o: &Vec<bool>| o[index]);
        }

        let expected = outcomes.iter().position(|o| *o).map(|index| MODES[index % 3]);
        prop_assert_eq!(transitions.select(&(), &outcomes), expected);
        // Evaluation order and result are stable across repeated selections.
        prop_assert_eq!(transitions.select(&(), &outcomes), expected);
    }

    #[test]
    fn lifecycle_hooks_fire_exactly_once_per_transition(
        requests in prop::collection::vec(arbitrary_request(), 0..60)
    ) {
        let mut machine = machine();
        let observer = machine.observer();
        let mut transitions = 0u32;

        for request in &requests {
            let before = machine.current_state();
            let outcome = machine.tick(request);

            let expected = match request.target {
                Some(target) if target != before => target,
                _ => before,
            };
            prop_assert_eq!(machine.current_state(), expected);
            prop_assert_eq!(outcome.current(), expected);
            prop_assert_eq!(observer.current_state(), machine.current_state());
            if outcome.transitioned() {
                transitions += 1;
            }
        }

        let counts = machine.context();
        prop_assert_eq!(counts.inits, transitions);
        prop_assert_eq!(counts.exits, transitions);
        prop_assert_eq!(counts.executes as usize, requests.len());
        prop_assert_eq!(machine.ticks() as usize, requests.len());
        prop_assert_eq!(machine.history().len() as u32, transitions);
    }

    #[test]
    fn no_op_ticks_only_execute(ticks in 1..50usize) {
        let mut machine = machine();
        for _ in 0..ticks {
            machine.tick(&Request::default());
        }

        let counts = machine.context();
        prop_assert_eq!(counts.executes as usize, ticks);
        prop_assert_eq!(counts.inits, 0);
        prop_assert_eq!(counts.exits, 0);
        prop_assert!(machine.history().is_empty());
    }

    #[test]
    fn history_never_exceeds_capacity(capacity in 1..20usize, records in 0..60usize) {
        let mut history = StateHistory::with_capacity(capacity);
        for tick in 0..records {
            history.record(StateTransition {
                from: MODES[tick % 3],
                to: MODES[(tick + 1) % 3],
                timestamp: Utc::now(),
                tick: tick as u64,
            });
        }

        prop_assert_eq!(history.len(), records.min(capacity));
        if let Some(last) = history.last() {
            prop_assert_eq!(last.tick, records as u64 - 1);
        }
    }

    #[test]
    fn is_finished_matches_elapsed_time(total_ms in 20..5000u64, elapsed_ms in 0..10_000u64) {
        let total = Duration::from_millis(total_ms).as_secs_f64();
        let (mut tracker, clock, _commands) = line_tracker(total, Pose2d::default());
        tracker.start();
        clock.advance(Duration::from_millis(elapsed_ms));

        prop_assert_eq!(tracker.is_finished(), elapsed_ms >= total_ms);
    }

    #[test]
    fn sampling_past_the_end_repeats_the_final_command(
        total_ms in 20..5000u64,
        overshoot_ms in 1..10_000u64,
        x in -2.0..2.0f64,
        y in -2.0..2.0f64,
        heading in -180.0..180.0f64,
    ) {
        let pose = Pose2d::new(x, y, Rotation2d::from_degrees(heading));
        let total = Duration::from_millis(total_ms).as_secs_f64();

        let (mut at_end, clock, _) = line_tracker(total, pose);
        at_end.start();
        clock.advance(Duration::from_millis(total_ms));
        at_end.update();

        let (mut past_end, clock, _) = line_tracker(total, pose);
        past_end.start();
        clock.advance(Duration::from_millis(total_ms + overshoot_ms));
        past_end.update();

        prop_assert_eq!(at_end.last_command(), past_end.last_command());
    }

    #[test]
    fn done_always_commands_zero(
        elapsed_ms in 0..3000u64,
        x in -2.0..2.0f64,
        heading in -180.0..180.0f64,
    ) {
        let pose = Pose2d::new(x, 0.5, Rotation2d::from_degrees(heading));
        let (mut tracker, clock, commands) = line_tracker(2.0, pose);
        tracker.start();
        clock.advance(Duration::from_millis(elapsed_ms));
        tracker.update();
        tracker.done();

        let commands = commands.lock().unwrap();
        prop_assert_eq!(commands.len(), 2);
        prop_assert!(commands[1].iter().all(|m| m.speed == 0.0));
    }
}
