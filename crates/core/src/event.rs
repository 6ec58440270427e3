//! Event types for the deterministic state machine.

use crate::Phase;
use quorus_types::{BlockProposal, Hash, ViewChangeRequest, Vote, VoteKind};

/// All possible inputs to the consensus state machines.
///
/// Events are **passive data** - they describe something that happened.
/// The state machine processes events and returns actions. Internal events
/// are consequences of prior processing and are applied before anything
/// still waiting in the inbox: a quorum that formed while handling a vote
/// always beats a timeout for the same round.
#[derive(Debug, Clone)]
pub enum Event {
    // ═══════════════════════════════════════════════════════════════════════
    // Network inputs
    // ═══════════════════════════════════════════════════════════════════════
    /// A block proposal arrived for the current (height, round).
    ///
    /// Sender identity comes from `proposal.proposer` and its signature.
    ProposalReceived { proposal: BlockProposal },

    /// A consensus vote arrived.
    ///
    /// Sender identity comes from `vote.voter` and its signature.
    VoteReceived { vote: Vote },

    /// Another validator asked to advance to a new round.
    ViewChangeRequested { request: ViewChangeRequest },

    // ═══════════════════════════════════════════════════════════════════════
    // Timers
    // ═══════════════════════════════════════════════════════════════════════
    /// A phase ran out of its timeout budget without quorum.
    PhaseTimeout { height: u64, round: u64, phase: Phase },

    /// The whole round ran out of its view-change budget.
    ViewChangeTimeout { height: u64, round: u64 },

    // ═══════════════════════════════════════════════════════════════════════
    // Internal
    // ═══════════════════════════════════════════════════════════════════════
    /// A vote slot accumulated quorum power behind one target.
    ///
    /// `target == None` is a nil quorum.
    QuorumReached {
        kind: VoteKind,
        height: u64,
        round: u64,
        target: Option<Hash>,
    },
}

impl Event {
    /// Short name for logging and telemetry.
    pub fn type_name(&self) -> &'static str {
        match self {
            Event::ProposalReceived { .. } => "ProposalReceived",
            Event::VoteReceived { .. } => "VoteReceived",
            Event::ViewChangeRequested { .. } => "ViewChangeRequested",
            Event::PhaseTimeout { .. } => "PhaseTimeout",
            Event::ViewChangeTimeout { .. } => "ViewChangeTimeout",
            Event::QuorumReached { .. } => "QuorumReached",
        }
    }
}
