//! Finality engine configuration.

use num_bigint::BigUint;

/// Knobs for the verification and finality lifecycle.
#[derive(Debug, Clone)]
pub struct FinalityConfig {
    /// Height lag behind the chain head at which a confirmed block becomes
    /// finalized.
    pub finality_depth: u64,
    /// How many finalized entries to retain before the cleanup sweep evicts
    /// the oldest.
    pub retention: usize,
    /// Fixed reward paid to the proposer of every finalized block.
    pub proposer_reward: BigUint,
    /// Fixed reward paid to each verifier of every finalized block.
    pub verifier_reward: BigUint,
}

impl Default for FinalityConfig {
    fn default() -> Self {
        FinalityConfig {
            finality_depth: 6,
            retention: 100,
            // 2 tokens and 0.1 token at 18 decimals.
            proposer_reward: BigUint::from(2_000_000_000_000_000_000u64),
            verifier_reward: BigUint::from(100_000_000_000_000_000u64),
        }
    }
}
