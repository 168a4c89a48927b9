//! Serializable snapshots of a running state machine.
//!
//! A snapshot records which state a subsystem was in, how many ticks it ran
//! and the transitions it took. States themselves (and their hardware) are
//! not serializable, so a snapshot is a record for inspection and replay
//! tooling, not a way to rebuild a machine.

use crate::core::{StateHistory, StateKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod error;

pub use error::SnapshotError;

/// Version identifier for the snapshot format
pub const SNAPSHOT_VERSION: u32 = 1;

/// Point-in-time record of one machine.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct MachineSnapshot<K: StateKey> {
    /// Snapshot format version
    pub version: u32,

    /// Unique snapshot identifier
    pub id: Uuid,

    /// Name of the subsystem the machine drives
    pub machine: String,

    /// When the snapshot was taken
    pub taken_at: DateTime<Utc>,

    /// Current state at the time of the snapshot
    pub current_state: K,

    /// Ticks run so far
    pub ticks: u64,

    /// Retained transition history
    pub history: StateHistory<K>,
}

impl<K: StateKey> MachineSnapshot<K> {
    pub fn new(
        machine: impl Into<String>,
        current_state: K,
        ticks: u64,
        history: StateHistory<K>,
    ) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            id: Uuid::new_v4(),
            machine: machine.into(),
            taken_at: Utc::now(),
            current_state,
            ticks,
            history,
        }
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON and validate.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_str(json)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Serialize to the compact binary format.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserialize from the compact binary format and validate.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let snapshot: Self = bincode::deserialize(bytes)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Accept the snapshot only if it was taken from the machine named `machine`.
    pub fn for_machine(self, machine: &str) -> Result<Self, SnapshotError> {
        if self.machine == machine {
            Ok(self)
        } else {
            Err(SnapshotError::WrongMachine {
                expected: machine.to_string(),
                found: self.machine,
            })
        }
    }

    fn validate(&self) -> Result<(), SnapshotError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::FormatVersion {
                found: self.version,
                expected: SNAPSHOT_VERSION,
            });
        }

        if let Some(last) = self.history.last() {
            if last.to != self.current_state {
                return Err(SnapshotError::StateMismatch {
                    recorded: last.to.name(),
                    current: self.current_state.name(),
                });
            }
            if last.tick > self.ticks {
                return Err(SnapshotError::TickOutOfRange {
                    tick: last.tick,
                    ticks: self.ticks,
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StateTransition;

    crate::state_enum! {
        enum ArmState {
            Idle,
            ScoreHigh,
            Stowed,
        }
    }

    fn snapshot() -> MachineSnapshot<ArmState> {
        let mut history = StateHistory::new();
        history.record(StateTransition {
            from: ArmState::Idle,
            to: ArmState::ScoreHigh,
            timestamp: Utc::now(),
            tick: 3,
        });
        history.record(StateTransition {
            from: ArmState::ScoreHigh,
            to: ArmState::Stowed,
            timestamp: Utc::now(),
            tick: 40,
        });
        MachineSnapshot::new("arm", ArmState::Stowed, 52, history)
    }

    #[test]
    fn json_preserves_state_and_history() {
        let original = snapshot();
        let json = original.to_json().unwrap();
        let restored = MachineSnapshot::<ArmState>::from_json(&json).unwrap();

        assert_eq!(restored.id, original.id);
        assert_eq!(restored.machine, "arm");
        assert_eq!(restored.current_state, ArmState::Stowed);
        assert_eq!(restored.ticks, 52);
        assert_eq!(
            restored.history.get_path(),
            vec![&ArmState::Idle, &ArmState::ScoreHigh, &ArmState::Stowed]
        );
    }

    #[test]
    fn binary_format_is_smaller_than_json() {
        let original = snapshot();
        let bytes = original.to_bytes().unwrap();
        let json = original.to_json().unwrap();
        assert!(bytes.len() < json.len());

        let restored = MachineSnapshot::<ArmState>::from_bytes(&bytes).unwrap();
        assert_eq!(restored.current_state, original.current_state);
        assert_eq!(restored.history.len(), 2);
    }

    #[test]
    fn rejects_unknown_version() {
        let mut future = snapshot();
        future.version = SNAPSHOT_VERSION + 1;
        let json = future.to_json().unwrap();

        match MachineSnapshot::<ArmState>::from_json(&json) {
            Err(SnapshotError::FormatVersion { found, expected }) => {
                assert_eq!(found, SNAPSHOT_VERSION + 1);
                assert_eq!(expected, SNAPSHOT_VERSION);
            }
            other => panic!("Expected FormatVersion, got {other:?}"),
        }
    }

    #[test]
    fn rejects_history_disagreeing_with_current_state() {
        let mut tampered = snapshot();
        tampered.current_state = ArmState::Idle;
        let json = tampered.to_json().unwrap();

        match MachineSnapshot::<ArmState>::from_json(&json) {
            Err(SnapshotError::StateMismatch { recorded, current }) => {
                assert_eq!(recorded, "Stowed");
                assert_eq!(current, "Idle");
            }
            other => panic!("Expected StateMismatch, got {other:?}"),
        }
    }

    #[test]
    fn rejects_transition_after_last_tick() {
        let mut tampered = snapshot();
        tampered.ticks = 12;
        let bytes = tampered.to_bytes().unwrap();

        assert!(matches!(
            MachineSnapshot::<ArmState>::from_bytes(&bytes),
            Err(SnapshotError::TickOutOfRange { tick: 40, ticks: 12 })
        ));
    }

    #[test]
    fn for_machine_rejects_another_subsystem() {
        let json = snapshot().to_json().unwrap();

        let arm = MachineSnapshot::<ArmState>::from_json(&json)
            .and_then(|s| s.for_machine("arm"))
            .unwrap();
        assert_eq!(arm.current_state, ArmState::Stowed);

        let err = MachineSnapshot::<ArmState>::from_json(&json)
            .and_then(|s| s.for_machine("claw"))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "snapshot belongs to machine 'arm', expected 'claw'"
        );
        assert!(matches!(
            err,
            SnapshotError::WrongMachine { ref expected, ref found }
                if expected == "claw" && found == "arm"
        ));
    }

    #[test]
    fn rejects_garbage_input() {
        assert!(matches!(
            MachineSnapshot::<ArmState>::from_json("{not json"),
            Err(SnapshotError::Json(_))
        ));
        assert!(matches!(
            MachineSnapshot::<ArmState>::from_bytes(&[1, 2, 3]),
            Err(SnapshotError::Binary(_))
        ));
    }
}
