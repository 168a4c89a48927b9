//! Coordinated Subsystems
//!
//! This demo runs an arm, a claw and the status LEDs in one control loop.
//!
//! Key concepts:
//! - One state machine per subsystem, each owning its hardware
//! - Cross-subsystem coordination through observers
//! - Init fallback when a state cannot act (scoring with an empty claw)
//! - Fixed-rate ticking with per-subsystem fault isolation
//!
//! Run with: RUST_LOG=debug cargo run --example subsystems

use std::time::{Duration, Instant};
use tickwise::builder::StateMachineBuilder;
use tickwise::core::{Activation, Guard, State, Transitions};
use tickwise::machine::StateObserver;
use tickwise::runtime::{ControlLoop, ControlLoopConfig, MachineSubsystem};
use tickwise::state_enum;
use tracing::debug;
use tracing_subscriber::EnvFilter;

state_enum! {
    enum ClawState {
        Open,
        Closed,
    }
}

state_enum! {
    enum ArmState {
        Stowed,
        ScoreHigh,
        Release,
    }
}

state_enum! {
    enum LedState {
        Searching,
        Holding,
    }
}

/// Scripted driver station: what the driver holds down at `t` seconds.
#[derive(Clone, Copy, Debug, Default)]
struct Driver {
    close_claw: bool,
    score: bool,
}

impl Driver {
    fn at(t: f64) -> Self {
        Self {
            close_claw: (0.2..1.4).contains(&t),
            score: (0.1..2.0).contains(&t),
        }
    }
}

struct Claw {
    solenoid: bool,
}

impl Claw {
    fn set_solenoid(&mut self, closed: bool) {
        if self.solenoid != closed {
            debug!(closed, "claw solenoid");
        }
        self.solenoid = closed;
    }
}

struct Arm {
    claw: StateObserver<ClawState>,
    angle_setpoint: f64,
}

impl Arm {
    fn set_angle(&mut self, radians: f64) {
        if self.angle_setpoint != radians {
            debug!(radians, "arm setpoint");
        }
        self.angle_setpoint = radians;
    }
}

struct Leds {
    claw: StateObserver<ClawState>,
    pattern: &'static str,
}

struct ClawOpen;
struct ClawClosed;

impl State<ClawState, Claw, Driver> for ClawOpen {
    fn build(&self, transitions: &mut Transitions<ClawState, Claw, Driver>) {
        transitions.on(ClawState::Closed, |d: &Driver| d.close_claw);
    }

    fn execute(&mut self, claw: &mut Claw, _: &Driver) {
        claw.set_solenoid(false);
    }
}

impl State<ClawState, Claw, Driver> for ClawClosed {
    fn build(&self, transitions: &mut Transitions<ClawState, Claw, Driver>) {
        transitions.on(ClawState::Open, |d: &Driver| !d.close_claw);
    }

    fn execute(&mut self, claw: &mut Claw, _: &Driver) {
        claw.set_solenoid(true);
    }
}

struct Stowed;
struct ScoreHigh;
struct Release;

impl State<ArmState, Arm, Driver> for Stowed {
    fn build(&self, transitions: &mut Transitions<ArmState, Arm, Driver>) {
        transitions.on(ArmState::ScoreHigh, |d: &Driver| d.score);
    }

    fn execute(&mut self, arm: &mut Arm, _: &Driver) {
        arm.set_angle(0.0);
    }
}

impl State<ArmState, Arm, Driver> for ScoreHigh {
    fn build(&self, transitions: &mut Transitions<ArmState, Arm, Driver>) {
        transitions
            .on(ArmState::Stowed, |d: &Driver| !d.score)
            .on_guard(
                ArmState::Release,
                Guard::new(|arm: &Arm, _: &Driver| arm.claw.is_in(ClawState::Open)),
            );
    }

    fn init(&mut self, arm: &mut Arm, _: &Driver, _: ArmState) -> Activation<ArmState> {
        if arm.claw.is_in(ClawState::Closed) {
            Activation::Continue
        } else {
            Activation::FallBack(ArmState::Stowed)
        }
    }

    fn execute(&mut self, arm: &mut Arm, _: &Driver) {
        arm.set_angle(1.9);
    }
}

impl State<ArmState, Arm, Driver> for Release {
    fn build(&self, transitions: &mut Transitions<ArmState, Arm, Driver>) {
        transitions.on(ArmState::Stowed, |d: &Driver| !d.score);
    }

    fn execute(&mut self, arm: &mut Arm, _: &Driver) {
        arm.set_angle(1.6);
    }
}

struct Show(LedState);

impl State<LedState, Leds, ()> for Show {
    fn build(&self, transitions: &mut Transitions<LedState, Leds, ()>) {
        match self.0 {
            LedState::Searching => transitions.on_guard(
                LedState::Holding,
                Guard::new(|leds: &Leds, _: &()| leds.claw.is_in(ClawState::Closed)),
            ),
            LedState::Holding => transitions.on_guard(
                LedState::Searching,
                Guard::new(|leds: &Leds, _: &()| leds.claw.is_in(ClawState::Open)),
            ),
        };
    }

    fn execute(&mut self, leds: &mut Leds, _: &()) {
        let pattern = match self.0 {
            LedState::Searching => "blink yellow",
            LedState::Holding => "solid green",
        };
        if leds.pattern != pattern {
            debug!(pattern, "leds");
        }
        leds.pattern = pattern;
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    println!("=== Coordinated Subsystems ===\n");

    let claw = StateMachineBuilder::new("claw")
        .state(ClawState::Open, ClawOpen)
        .state(ClawState::Closed, ClawClosed)
        .initial(ClawState::Open)
        .build(Claw { solenoid: false })?;
    let claw_view = claw.observer();

    let arm = StateMachineBuilder::new("arm")
        .state(ArmState::Stowed, Stowed)
        .state(ArmState::ScoreHigh, ScoreHigh)
        .state(ArmState::Release, Release)
        .initial(ArmState::Stowed)
        .build(Arm {
            claw: claw.observer(),
            angle_setpoint: 0.0,
        })?;
    let arm_view = arm.observer();

    let leds = StateMachineBuilder::new("leds")
        .state(LedState::Searching, Show(LedState::Searching))
        .state(LedState::Holding, Show(LedState::Holding))
        .initial(LedState::Searching)
        .build(Leds {
            claw: claw.observer(),
            pattern: "off",
        })?;
    let led_view = leds.observer();

    let started = Instant::now();
    let driver = move || Driver::at(started.elapsed().as_secs_f64());

    let mut control = ControlLoop::new(ControlLoopConfig::new(50.0).with_name("robot"));
    control
        .register(MachineSubsystem::new(claw, driver))
        .register(MachineSubsystem::new(arm, driver))
        .register(MachineSubsystem::new(leds, || ()));

    println!("Driver script:");
    println!("  0.1s  hold score   (arm falls back: claw still empty)");
    println!("  0.2s  close claw   (arm re-enters ScoreHigh, LEDs go green)");
    println!("  1.4s  open claw    (arm releases)");
    println!("  2.0s  let go       (arm stows)\n");

    let shutdown = async {
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(2500)) => {}
            _ = tokio::signal::ctrl_c() => {}
        }
    };
    let stats = control.run_until(shutdown).await;

    println!("\nFinal states:");
    println!("  claw: {:?}", claw_view.current_state());
    println!("  arm:  {:?}", arm_view.current_state());
    println!("  leds: {:?}", led_view.current_state());

    println!("\nLoop statistics:");
    println!("  cycles:   {}", stats.cycles);
    println!("  overruns: {}", stats.overruns);
    println!("  faults:   {}", stats.faults);
    println!("  average:  {:?}", stats.average_cycle_time());

    println!("\n=== Demo Complete ===");
    Ok(())
}
