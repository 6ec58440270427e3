//! Round engine errors.

use quorus_core::Phase;

/// Errors the round engine surfaces to its caller.
///
/// Protocol-level rejections (bad votes, stale timers, wrong proposers) are
/// not errors: they are logged and dropped, and the round either reaches
/// quorum or times out into a view change.
#[derive(Debug, thiserror::Error)]
pub enum ConsensusError {
    #[error("no proposer available for height {height} round {round}")]
    NoProposer { height: u64, round: u64 },

    #[error("expected {expected} phase, currently in {actual}")]
    WrongPhase { expected: Phase, actual: Phase },
}
