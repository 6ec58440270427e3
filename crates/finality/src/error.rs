//! Finality engine errors.

use quorus_types::{Address, Hash};

#[derive(Debug, thiserror::Error)]
pub enum FinalityError {
    #[error("block {0} is not registered for verification")]
    UnknownBlock(Hash),

    #[error("block {0} is already registered")]
    DuplicateBlock(Hash),

    #[error("verifier {0} is not in the active validator set")]
    UnknownVerifier(Address),

    #[error("verifier {0} already voted on block {1}")]
    DuplicateVote(Address, Hash),

    #[error("invalid verification vote signature from {0}")]
    InvalidSignature(Address),
}
