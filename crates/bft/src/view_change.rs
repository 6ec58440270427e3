//! View change vote tracking for liveness.
//!
//! Peer requests to advance the round are aggregated by voting power. Once
//! accumulated power reaches f+1 (at least one honest validator must be
//! among the requesters) the engine advances even if its own timers have not
//! fired yet.
//!
//! # Exponential Backoff
//!
//! The whole-round timeout doubles with each consecutive round at the same
//! height, up to a cap, so a struggling height does not thrash through its
//! round budget during a partition.

use num_bigint::BigUint;
use num_traits::Zero;
use quorus_types::{Address, ViewChangeRequest};
use std::collections::HashMap;
use std::time::Duration;

/// Maximum multiplier for exponential backoff (2^6 = 64x base timeout).
const MAX_BACKOFF_EXPONENT: u32 = 6;

/// View-change timeout for a round, with exponential backoff.
pub fn backoff_timeout(base: Duration, round: u64) -> Duration {
    let exponent = (round.min(MAX_BACKOFF_EXPONENT as u64)) as u32;
    base * 2u32.pow(exponent)
}

/// Signing message for a view-change request.
pub fn view_change_message(height: u64, new_round: u64) -> String {
    format!("viewchange:{height}:{new_round}")
}

/// Outcome of recording a peer view-change request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestRecord {
    /// First request from this validator for this round; carries the
    /// accumulated power now behind the round.
    Added { accumulated: BigUint },
    /// Same validator already asked for this round.
    Duplicate,
}

/// Power-weighted aggregation of peer view-change requests, per target round.
#[derive(Debug, Default)]
pub struct ViewChangeVotes {
    requests: HashMap<u64, HashMap<Address, ViewChangeRequest>>,
    power: HashMap<u64, BigUint>,
}

impl ViewChangeVotes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one request, idempotent per (round, requester).
    pub fn record(&mut self, request: ViewChangeRequest, power: &BigUint) -> RequestRecord {
        let round = request.new_round;
        let entries = self.requests.entry(round).or_default();
        if entries.contains_key(&request.requester) {
            return RequestRecord::Duplicate;
        }
        entries.insert(request.requester, request);
        let accumulated = self.power.entry(round).or_insert_with(BigUint::zero);
        *accumulated += power;
        RequestRecord::Added {
            accumulated: accumulated.clone(),
        }
    }

    pub fn power_for(&self, round: u64) -> BigUint {
        self.power.get(&round).cloned().unwrap_or_else(BigUint::zero)
    }

    /// Drop request state for rounds the engine has already reached.
    pub fn clear_through(&mut self, round: u64) {
        self.requests.retain(|&r, _| r > round);
        self.power.retain(|&r, _| r > round);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quorus_types::Signature;

    fn request(round: u64, requester: u8) -> ViewChangeRequest {
        ViewChangeRequest {
            height: 5,
            new_round: round,
            requester: Address::from_public_key(&[requester]),
            reason: "phase timeout".into(),
            signature: Signature::default(),
            timestamp_ms: 0,
        }
    }

    #[test]
    fn accumulates_power_once_per_requester() {
        let mut votes = ViewChangeVotes::new();
        let p = BigUint::from(25u8);
        assert_eq!(
            votes.record(request(1, 0), &p),
            RequestRecord::Added {
                accumulated: BigUint::from(25u8)
            }
        );
        assert_eq!(votes.record(request(1, 0), &p), RequestRecord::Duplicate);
        assert_eq!(
            votes.record(request(1, 1), &p),
            RequestRecord::Added {
                accumulated: BigUint::from(50u8)
            }
        );
        assert_eq!(votes.power_for(1), BigUint::from(50u8));
    }

    #[test]
    fn clear_through_drops_stale_rounds() {
        let mut votes = ViewChangeVotes::new();
        let p = BigUint::from(10u8);
        votes.record(request(1, 0), &p);
        votes.record(request(2, 1), &p);
        votes.clear_through(1);
        assert_eq!(votes.power_for(1), BigUint::from(0u8));
        assert_eq!(votes.power_for(2), BigUint::from(10u8));
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let base = Duration::from_millis(500);
        assert_eq!(backoff_timeout(base, 0), base);
        assert_eq!(backoff_timeout(base, 1), base * 2);
        assert_eq!(backoff_timeout(base, 3), base * 8);
        assert_eq!(backoff_timeout(base, 6), base * 64);
        // Capped beyond the max exponent.
        assert_eq!(backoff_timeout(base, 40), base * 64);
    }
}
