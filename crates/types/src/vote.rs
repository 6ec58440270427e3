//! Consensus votes and incremental power aggregation.

use crate::{Address, Hash, Signature};
use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Which phase a vote belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteKind {
    Prevote,
    Precommit,
    Commit,
}

impl VoteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteKind::Prevote => "prevote",
            VoteKind::Precommit => "precommit",
            VoteKind::Commit => "commit",
        }
    }
}

impl fmt::Display for VoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single validator vote for one (height, round, kind) slot.
///
/// `target == None` is the nil vote: the validator saw no acceptable
/// proposal. At most one vote per validator per slot counts; later conflicting
/// votes are equivocations and are recorded, never merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vote {
    pub kind: VoteKind,
    pub height: u64,
    pub round: u64,
    pub target: Option<Hash>,
    pub voter: Address,
    pub power: BigUint,
    pub signature: Signature,
    pub timestamp_ms: u64,
}

impl Vote {
    /// Domain-separated signing message: `kind:height:round:target`.
    pub fn signing_message(
        kind: VoteKind,
        height: u64,
        round: u64,
        target: &Option<Hash>,
    ) -> String {
        let target = target.unwrap_or(Hash::ZERO);
        format!("{kind}:{height}:{round}:{target}")
    }

    pub fn message(&self) -> String {
        Self::signing_message(self.kind, self.height, self.round, &self.target)
    }
}

/// Outcome of feeding one vote into a tally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteRecord {
    /// First vote from this validator in this slot.
    Added,
    /// Identical to an earlier vote; the tally is unchanged.
    Duplicate,
    /// Conflicts with an earlier vote in the same slot; the tally is
    /// unchanged and the conflict must be surfaced.
    Equivocation { previous: Option<Hash> },
}

/// An observed double-vote, kept for audit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Equivocation {
    pub voter: Address,
    pub kind: VoteKind,
    pub height: u64,
    pub round: u64,
    pub first: Option<Hash>,
    pub second: Option<Hash>,
}

/// Incremental power tally for one (height, round, kind) slot.
///
/// Running sums per target, updated as each vote arrives. The quorum check is
/// O(1): the leading target is maintained on insert, never recomputed by
/// rescanning.
#[derive(Debug, Clone)]
pub struct AggregatedVotes {
    kind: VoteKind,
    height: u64,
    round: u64,
    by_voter: HashMap<Address, Option<Hash>>,
    power: HashMap<Option<Hash>, BigUint>,
    voters: HashMap<Option<Hash>, Vec<Address>>,
    leading: Option<Option<Hash>>,
}

impl AggregatedVotes {
    pub fn new(kind: VoteKind, height: u64, round: u64) -> Self {
        AggregatedVotes {
            kind,
            height,
            round,
            by_voter: HashMap::new(),
            power: HashMap::new(),
            voters: HashMap::new(),
            leading: None,
        }
    }

    pub fn kind(&self) -> VoteKind {
        self.kind
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    /// Record one vote. Duplicates and equivocations leave the sums untouched.
    pub fn record(
        &mut self,
        voter: Address,
        target: Option<Hash>,
        power: &BigUint,
    ) -> VoteRecord {
        if let Some(previous) = self.by_voter.get(&voter) {
            if *previous == target {
                return VoteRecord::Duplicate;
            }
            return VoteRecord::Equivocation {
                previous: *previous,
            };
        }
        self.by_voter.insert(voter, target);
        let bucket = self.power.entry(target).or_insert_with(BigUint::zero);
        *bucket += power;
        self.voters.entry(target).or_default().push(voter);

        let bucket = bucket.clone();
        let lead_power = self
            .leading
            .as_ref()
            .and_then(|t| self.power.get(t))
            .cloned()
            .unwrap_or_else(BigUint::zero);
        if self.leading.is_none() || bucket > lead_power {
            self.leading = Some(target);
        }
        VoteRecord::Added
    }

    /// Accumulated power behind one target.
    pub fn power_for(&self, target: &Option<Hash>) -> BigUint {
        self.power.get(target).cloned().unwrap_or_else(BigUint::zero)
    }

    /// The target currently holding the most power, with that power.
    pub fn leading(&self) -> Option<(Option<Hash>, &BigUint)> {
        let target = self.leading?;
        self.power.get(&target).map(|p| (target, p))
    }

    /// The target that has reached `threshold`, if any.
    pub fn quorum(&self, threshold: &BigUint) -> Option<Option<Hash>> {
        let (target, power) = self.leading()?;
        (power >= threshold).then_some(target)
    }

    pub fn vote_count(&self) -> usize {
        self.by_voter.len()
    }

    pub fn participants_for(&self, target: &Option<Hash>) -> &[Address] {
        self.voters.get(target).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// A request to advance to a new round after a timeout or detected fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewChangeRequest {
    pub height: u64,
    pub new_round: u64,
    pub requester: Address,
    pub reason: String,
    pub signature: Signature,
    pub timestamp_ms: u64,
}
