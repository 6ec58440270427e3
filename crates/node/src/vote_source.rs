//! Vote origin seam.
//!
//! The coordinator drives the whole committee in process; this trait decides
//! how each validator behaves when a phase asks for its vote. The default is
//! honest, the other implementations model offline and faulty validators
//! deterministically for tests and load experiments.

use quorus_core::Phase;
use quorus_types::{Address, Hash};
use rand::Rng;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;

/// Context a validator sees when asked to vote.
#[derive(Debug, Clone, Copy)]
pub struct VoteContext {
    pub height: u64,
    pub round: u64,
    pub phase: Phase,
    /// Hash of the proposal on the table, if one arrived.
    pub proposal: Option<Hash>,
}

/// What a validator does with its vote slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteDecision {
    /// Follow the protocol: vote the proposal or the observed quorum.
    Honest,
    /// Cast an explicit nil vote.
    Nil,
    /// Cast nothing at all.
    Silent,
}

pub trait VoteSource: Send + Sync {
    fn decide(&mut self, ctx: &VoteContext, voter: &Address) -> VoteDecision;
}

/// Every validator follows the protocol.
#[derive(Debug, Clone, Copy, Default)]
pub struct HonestVoteSource;

impl VoteSource for HonestVoteSource {
    fn decide(&mut self, _ctx: &VoteContext, _voter: &Address) -> VoteDecision {
        VoteDecision::Honest
    }
}

/// A fixed subset of validators never votes; the rest are honest.
#[derive(Debug, Clone, Default)]
pub struct SilentVoteSource {
    silent: HashSet<Address>,
}

impl SilentVoteSource {
    pub fn new(silent: impl IntoIterator<Item = Address>) -> Self {
        SilentVoteSource {
            silent: silent.into_iter().collect(),
        }
    }
}

impl VoteSource for SilentVoteSource {
    fn decide(&mut self, _ctx: &VoteContext, voter: &Address) -> VoteDecision {
        if self.silent.contains(voter) {
            VoteDecision::Silent
        } else {
            VoteDecision::Honest
        }
    }
}

/// Validators misbehave with seeded randomness, so a run is replayable.
#[derive(Debug, Clone)]
pub struct FaultyVoteSource {
    rng: ChaCha8Rng,
    nil_rate: f64,
    silent_rate: f64,
}

impl FaultyVoteSource {
    pub fn new(seed: u64, nil_rate: f64, silent_rate: f64) -> Self {
        FaultyVoteSource {
            rng: ChaCha8Rng::seed_from_u64(seed),
            nil_rate,
            silent_rate,
        }
    }
}

impl VoteSource for FaultyVoteSource {
    fn decide(&mut self, _ctx: &VoteContext, _voter: &Address) -> VoteDecision {
        let roll: f64 = self.rng.random();
        if roll < self.silent_rate {
            VoteDecision::Silent
        } else if roll < self.silent_rate + self.nil_rate {
            VoteDecision::Nil
        } else {
            VoteDecision::Honest
        }
    }
}
