//! Node-level consensus configuration.
//!
//! One serde-friendly struct covers the round engine, the finality engine
//! and the coordinator's pacing. All amounts are plain integers so the
//! config can round-trip through JSON and the HTTP config endpoint.

use num_bigint::BigUint;
use quorus_bft::BftConfig;
use quorus_finality::FinalityConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Effective node configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    /// Height the chain resumes from; the first produced block is one above.
    pub start_height: u64,
    /// Target time between block productions.
    pub block_time_ms: u64,
    /// Floor for the adaptive inter-block delay.
    pub min_block_delay_ms: u64,
    /// Budget for a single consensus phase.
    pub phase_timeout_ms: u64,
    /// Budget for a whole round before a view change, doubled per round.
    pub view_change_timeout_ms: u64,
    /// Rounds attempted at one height before the engine halts.
    pub max_rounds_per_height: u64,
    /// Height lag at which confirmed blocks finalize.
    pub finality_depth: u64,
    /// Finalized entries kept before the retention sweep evicts.
    pub finality_retention: usize,
    /// Committee size below which health takes a deduction.
    pub min_validators: usize,
    /// Rolling sample window for latency metrics.
    pub metrics_window: usize,
    /// Fixed reward per finalized block for the proposer, in base units.
    pub proposer_reward: u64,
    /// Fixed reward per finalized block for each verifier, in base units.
    pub verifier_reward: u64,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        ConsensusConfig {
            start_height: 0,
            block_time_ms: 100,
            min_block_delay_ms: 10,
            phase_timeout_ms: 20,
            view_change_timeout_ms: 500,
            max_rounds_per_height: 10,
            finality_depth: 6,
            finality_retention: 100,
            min_validators: 4,
            metrics_window: 2000,
            // 2 tokens and 0.1 token at 18 decimals.
            proposer_reward: 2_000_000_000_000_000_000,
            verifier_reward: 100_000_000_000_000_000,
        }
    }
}

impl ConsensusConfig {
    pub fn block_time(&self) -> Duration {
        Duration::from_millis(self.block_time_ms)
    }

    pub fn min_block_delay(&self) -> Duration {
        Duration::from_millis(self.min_block_delay_ms)
    }

    pub fn bft(&self) -> BftConfig {
        BftConfig {
            phase_timeout: Duration::from_millis(self.phase_timeout_ms),
            view_change_timeout: Duration::from_millis(self.view_change_timeout_ms),
            max_rounds_per_height: self.max_rounds_per_height,
            metrics_window: self.metrics_window,
        }
    }

    pub fn finality(&self) -> FinalityConfig {
        FinalityConfig {
            finality_depth: self.finality_depth,
            retention: self.finality_retention,
            proposer_reward: BigUint::from(self.proposer_reward),
            verifier_reward: BigUint::from(self.verifier_reward),
        }
    }
}
