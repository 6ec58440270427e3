//! Block proposal and committed block data.

use crate::{Address, Hash, Signature};
use num_bigint::BigUint;

/// A block proposed for one (height, round) by the designated proposer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockProposal {
    pub height: u64,
    pub round: u64,
    pub proposer: Address,
    pub parent: Hash,
    pub hash: Hash,
    pub state_root: Hash,
    pub tx_root: Hash,
    pub receipts_root: Hash,
    pub timestamp_ms: u64,
    /// Proposer's signature over the block hash.
    pub signature: Signature,
}

/// A committed block as handed from the coordinator to the finality engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockData {
    pub height: u64,
    pub hash: Hash,
    pub parent: Hash,
    pub state_root: Hash,
    pub tx_root: Hash,
    pub receipts_root: Hash,
    pub transactions: Vec<Hash>,
    /// Gas fees collected in this block, split by the reward schedule.
    pub gas_fees: BigUint,
    pub timestamp_ms: u64,
    pub proposer: Address,
}
