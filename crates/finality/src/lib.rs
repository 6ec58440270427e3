//! Independent block verification and finality.
//!
//! Runs after consensus commit, never inside it. Committed blocks are
//! registered here, re-verified by every validator, confirmed by quorum of
//! verification votes, and finalized once the chain head moves far enough
//! past them. Finalized blocks carry the reward split for their proposer and
//! verifiers.

mod config;
mod engine;
mod error;

pub use config::FinalityConfig;
pub use engine::{FinalityEngine, FinalitySummary, FinalizedBlock};
pub use error::FinalityError;
