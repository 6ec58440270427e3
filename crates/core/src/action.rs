//! Action types for the deterministic state machine.

use crate::{Event, Phase, TimerId};
use quorus_types::{Equivocation, Hash};
use std::time::Duration;

/// Actions the state machine wants to perform.
///
/// Actions are **commands** - they describe something to do. The runner
/// executes actions and may convert results back into events.
#[derive(Debug, Clone)]
pub enum Action {
    // ═══════════════════════════════════════════════════════════════════════
    // Timers
    // ═══════════════════════════════════════════════════════════════════════
    /// Set a timer to fire after a duration. Replaces any timer with the
    /// same id.
    SetTimer { id: TimerId, duration: Duration },

    /// Cancel a previously set timer.
    CancelTimer { id: TimerId },

    // ═══════════════════════════════════════════════════════════════════════
    // Internal (fed back as events with Internal priority)
    // ═══════════════════════════════════════════════════════════════════════
    /// Enqueue an internal event for immediate processing, ahead of any
    /// pending external input.
    EnqueueInternal { event: Event },

    // ═══════════════════════════════════════════════════════════════════════
    // Notifications (observed by the runner, no feedback)
    // ═══════════════════════════════════════════════════════════════════════
    /// The round entered a new phase.
    PhaseChanged { phase: Phase, height: u64, round: u64 },

    /// The engine advanced to a new round at the same height.
    ViewChange {
        height: u64,
        new_round: u64,
        reason: String,
    },

    /// A block reached commit quorum and left the round engine.
    Finalized {
        hash: Hash,
        height: u64,
        round: u64,
        round_time_ms: u64,
    },

    /// A validator double-voted; surfaced for audit and telemetry.
    ReportEquivocation { equivocation: Equivocation },

    /// The engine exhausted its round budget for a height and stopped.
    /// Recovery is an operator decision, never automatic.
    Halted { height: u64, reason: String },
}

impl Action {
    /// Short name for logging and telemetry.
    pub fn type_name(&self) -> &'static str {
        match self {
            // Timers
            Action::SetTimer { .. } => "SetTimer",
            Action::CancelTimer { .. } => "CancelTimer",

            // Internal
            Action::EnqueueInternal { .. } => "EnqueueInternal",

            // Notifications
            Action::PhaseChanged { .. } => "PhaseChanged",
            Action::ViewChange { .. } => "ViewChange",
            Action::Finalized { .. } => "Finalized",
            Action::ReportEquivocation { .. } => "ReportEquivocation",
            Action::Halted { .. } => "Halted",
        }
    }
}
