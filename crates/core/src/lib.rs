//! Core vocabulary for quorus consensus.
//!
//! This crate provides the event/action model shared by the state machines:
//!
//! - [`Event`]: All possible inputs to a state machine
//! - [`Action`]: All possible outputs from a state machine
//! - [`StateMachine`]: The trait that all state machines implement
//!
//! # Architecture
//!
//! ```text
//! Events → StateMachine::handle() → Actions
//! ```
//!
//! The state machine is:
//! - **Synchronous**: No async, no .await
//! - **Deterministic**: Same state + event = same actions
//! - **Pure-ish**: Mutates self, but performs no I/O
//!
//! All I/O is handled by the runner, which delivers events, executes the
//! returned actions (timers, broadcasts, telemetry), and feeds
//! `EnqueueInternal` actions straight back in before any external input.

mod action;
mod event;

pub use action::Action;
pub use event::Event;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Phase of a consensus round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Phase {
    Idle,
    Propose,
    Prevote,
    Precommit,
    Commit,
    Finalize,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Idle => "IDLE",
            Phase::Propose => "PROPOSE",
            Phase::Prevote => "PREVOTE",
            Phase::Precommit => "PRECOMMIT",
            Phase::Commit => "COMMIT",
            Phase::Finalize => "FINALIZE",
        }
    }

    /// Stable index for per-phase latency tracking.
    pub fn index(&self) -> usize {
        match self {
            Phase::Idle => 0,
            Phase::Propose => 1,
            Phase::Prevote => 2,
            Phase::Precommit => 3,
            Phase::Commit => 4,
            Phase::Finalize => 5,
        }
    }

    pub const COUNT: usize = 6;
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Timer identification.
///
/// Timer ids carry enough context for the runner to synthesize the timeout
/// event when they fire, and for stale timers to be recognized and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerId {
    /// Per-phase timeout for one (height, round).
    Phase { height: u64, round: u64, phase: Phase },
    /// Whole-round view-change timeout for one (height, round).
    ViewChange { height: u64, round: u64 },
}

/// The contract every deterministic state machine implements.
pub trait StateMachine {
    /// Inject the current time. The runner calls this before every
    /// [`handle`](StateMachine::handle); the machine never reads a clock.
    fn set_time(&mut self, now: Duration);

    /// Process one event and return the resulting actions.
    fn handle(&mut self, event: Event) -> Vec<Action>;
}
