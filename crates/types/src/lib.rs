//! Core types for quorus consensus.
//!
//! This crate provides the foundational types used throughout the consensus
//! implementation:
//!
//! - **Primitives**: Hash, Address, signatures, the crypto provider seam
//! - **Validators**: stake-weighted validator set with exact quorum math
//! - **Consensus types**: BlockProposal, Vote, AggregatedVotes, ViewChangeRequest
//! - **Finality types**: VerificationVote, FinalityResult, BlockReward
//!
//! # Design Philosophy
//!
//! This crate is self-contained and depends on no other workspace crates,
//! making it the foundation layer. All stake arithmetic is arbitrary
//! precision; quorum comparisons never touch floating point.

mod address;
mod block;
mod crypto;
mod finality;
mod hash;
mod validator;
mod vote;

pub use address::Address;
pub use block::{BlockData, BlockProposal};
pub use crypto::{CryptoProvider, NodeCrypto, Signature};
pub use finality::{
    BlockReward, FinalityResult, FinalityStatus, RewardRole, VerificationOutcome,
    VerificationVote, Verdict,
};
pub use hash::{Hash, HexError};
pub use validator::{quorum_threshold, Validator, ValidatorSet};
pub use vote::{
    AggregatedVotes, Equivocation, ViewChangeRequest, Vote, VoteKind, VoteRecord,
};
