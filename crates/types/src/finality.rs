//! Finality lifecycle and reward types.

use crate::{Address, Hash, Signature};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A verifier's judgement of a committed block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Valid,
    Invalid,
    Abstain,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Verdict::Valid => "valid",
            Verdict::Invalid => "invalid",
            Verdict::Abstain => "abstain",
        };
        f.write_str(s)
    }
}

/// A vote from the independent re-verification pass. Distinct from consensus
/// votes; these never feed the round engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationVote {
    pub block: Hash,
    pub height: u64,
    pub verifier: Address,
    pub verdict: Verdict,
    pub power: BigUint,
    pub signature: Signature,
    pub timestamp_ms: u64,
}

impl VerificationVote {
    /// Signing message for a verification vote: `verify:height:block:verdict`.
    pub fn signing_message(block: &Hash, height: u64, verdict: Verdict) -> String {
        format!("verify:{height}:{block}:{verdict}")
    }
}

/// Lifecycle of a block in the finality engine.
///
/// Transitions are monotonic: pending → {confirmed, rejected},
/// confirmed → finalized. Finalized and rejected are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinalityStatus {
    Pending,
    Confirmed,
    Rejected,
    Finalized,
}

impl FinalityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FinalityStatus::Pending => "pending",
            FinalityStatus::Confirmed => "confirmed",
            FinalityStatus::Rejected => "rejected",
            FinalityStatus::Finalized => "finalized",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, FinalityStatus::Finalized | FinalityStatus::Rejected)
    }
}

impl fmt::Display for FinalityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verification state of one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalityResult {
    pub height: u64,
    pub hash: Hash,
    pub status: FinalityStatus,
    pub valid_power: BigUint,
    pub invalid_power: BigUint,
    pub abstain_power: BigUint,
    pub vote_count: usize,
    pub required_quorum: BigUint,
    pub registered_at_ms: u64,
    pub confirmed_at_ms: Option<u64>,
    pub finalized_at_ms: Option<u64>,
}

impl FinalityResult {
    /// Milliseconds from registration to confirmation.
    pub fn confirmation_latency_ms(&self) -> Option<u64> {
        self.confirmed_at_ms
            .map(|t| t.saturating_sub(self.registered_at_ms))
    }
}

/// Who a reward is paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardRole {
    Proposer,
    Verifier,
}

/// One reward entry for a finalized block. Carries role and power provenance
/// for audit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockReward {
    pub block: Hash,
    pub height: u64,
    pub recipient: Address,
    pub role: RewardRole,
    /// Fixed schedule amount for the role.
    pub fixed: BigUint,
    /// This recipient's share of the block's gas fees.
    pub gas_share: BigUint,
    pub power: BigUint,
}

impl BlockReward {
    pub fn total(&self) -> BigUint {
        &self.fixed + &self.gas_share
    }
}

/// Outcome of recomputing a block's integrity. Failure is data, not an error
/// path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationOutcome {
    pub valid: bool,
    pub error: Option<String>,
}

impl VerificationOutcome {
    pub fn ok() -> Self {
        VerificationOutcome {
            valid: true,
            error: None,
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        VerificationOutcome {
            valid: false,
            error: Some(error.into()),
        }
    }
}
