//! Validator set with stake-weighted quorum math.
//!
//! All power arithmetic is `BigUint`; quorum comparisons must never go
//! through floating point.

use crate::Address;
use num_bigint::BigUint;
use num_traits::Zero;
use std::collections::HashMap;

/// A single validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validator {
    pub address: Address,
    /// Stake-weighted voting power.
    pub power: BigUint,
    /// Raw public key material; the default crypto provider derives addresses
    /// from it, a real signer would verify against it.
    pub public_key: Vec<u8>,
    pub active: bool,
}

impl Validator {
    pub fn new(address: Address, power: impl Into<BigUint>) -> Self {
        Validator {
            address,
            power: power.into(),
            public_key: address.as_bytes().to_vec(),
            active: true,
        }
    }
}

/// An immutable snapshot of the active validator set.
///
/// Sets are replaced wholesale, never mutated, so an in-progress round always
/// observes a stable committee. Inactive validators are dropped on
/// construction and do not count toward total power.
#[derive(Debug, Clone, Default)]
pub struct ValidatorSet {
    validators: Vec<Validator>,
    by_address: HashMap<Address, usize>,
    total_power: BigUint,
    quorum_threshold: BigUint,
}

impl ValidatorSet {
    pub fn new(validators: impl IntoIterator<Item = Validator>) -> Self {
        let validators: Vec<Validator> =
            validators.into_iter().filter(|v| v.active).collect();
        let by_address = validators
            .iter()
            .enumerate()
            .map(|(i, v)| (v.address, i))
            .collect();
        let total_power: BigUint = validators.iter().map(|v| &v.power).sum();
        let quorum_threshold = quorum_threshold(&total_power);
        ValidatorSet {
            validators,
            by_address,
            total_power,
            quorum_threshold,
        }
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Validator> {
        self.validators.iter()
    }

    pub fn addresses(&self) -> impl Iterator<Item = &Address> {
        self.validators.iter().map(|v| &v.address)
    }

    pub fn get(&self, address: &Address) -> Option<&Validator> {
        self.by_address.get(address).map(|&i| &self.validators[i])
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.by_address.contains_key(address)
    }

    pub fn power_of(&self, address: &Address) -> Option<&BigUint> {
        self.get(address).map(|v| &v.power)
    }

    pub fn total_power(&self) -> &BigUint {
        &self.total_power
    }

    /// Minimum accumulated power for a binding decision: floor(T * 2/3) + 1.
    pub fn quorum_threshold(&self) -> &BigUint {
        &self.quorum_threshold
    }

    /// Minimum power that guarantees at least one honest requester: f + 1,
    /// computed as T - quorum + 1.
    pub fn fault_threshold(&self) -> BigUint {
        &self.total_power - &self.quorum_threshold + 1u8
    }

    /// Deterministic stake-weighted proposer for (height, round).
    ///
    /// Every participant re-derives the same proposer: walk the committee in
    /// order, accumulating power until it exceeds `(height * 1000 + round)
    /// mod T`. Heavier validators own proportionally more of the seed space.
    pub fn proposer_for(&self, height: u64, round: u64) -> Option<&Validator> {
        if self.validators.is_empty() || self.total_power.is_zero() {
            return None;
        }
        let seed = BigUint::from(height) * 1000u32 + round;
        let target = seed % &self.total_power;
        let mut accumulated = BigUint::zero();
        for validator in &self.validators {
            accumulated += &validator.power;
            if accumulated > target {
                return Some(validator);
            }
        }
        self.validators.first()
    }
}

/// floor(total * 2/3) + 1 over exact integers.
pub fn quorum_threshold(total_power: &BigUint) -> BigUint {
    total_power * 2u8 / 3u8 + 1u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(powers: &[u64]) -> ValidatorSet {
        ValidatorSet::new(powers.iter().enumerate().map(|(i, &p)| {
            Validator::new(Address::from_public_key(format!("v{i}").as_bytes()), p)
        }))
    }

    #[test]
    fn quorum_threshold_four_equal_validators() {
        // Four validators at 25 power each.
        let s = set(&[25, 25, 25, 25]);
        assert_eq!(*s.total_power(), BigUint::from(100u8));
        assert_eq!(*s.quorum_threshold(), BigUint::from(67u8));
    }

    #[test]
    fn quorum_threshold_safety_margin() {
        // q*3 > T*2 and (q-1)*3 <= T*2 for assorted totals.
        for total in [1u64, 2, 3, 4, 66, 67, 99, 100, 1_000_000, u64::MAX] {
            let t = BigUint::from(total);
            let q = quorum_threshold(&t);
            assert!(&q * 3u8 > &t * 2u8, "total={total}");
            assert!((&q - 1u8) * 3u8 <= &t * 2u8, "total={total}");
        }
    }

    #[test]
    fn fault_threshold_is_f_plus_one() {
        let s = set(&[25, 25, 25, 25]);
        // T=100, q=67: f+1 = 34.
        assert_eq!(s.fault_threshold(), BigUint::from(34u8));
    }

    #[test]
    fn inactive_validators_are_excluded() {
        let mut inactive = Validator::new(Address::from_public_key(b"vx"), 50u64);
        inactive.active = false;
        let s = ValidatorSet::new(vec![
            Validator::new(Address::from_public_key(b"v0"), 25u64),
            inactive.clone(),
        ]);
        assert_eq!(s.len(), 1);
        assert_eq!(*s.total_power(), BigUint::from(25u8));
        assert!(!s.contains(&inactive.address));
    }

    #[test]
    fn proposer_is_deterministic_and_in_set() {
        let s = set(&[10, 20, 30, 40]);
        for height in 0..20u64 {
            for round in 0..3u64 {
                let a = s.proposer_for(height, round).unwrap().address;
                let b = s.proposer_for(height, round).unwrap().address;
                assert_eq!(a, b);
                assert!(s.contains(&a));
            }
        }
    }

    #[test]
    fn proposer_rotates_on_round_change() {
        let s = set(&[1, 1, 1, 1]);
        let picks: Vec<Address> = (0..4u64)
            .map(|round| s.proposer_for(5, round).unwrap().address)
            .collect();
        // Equal powers with a mod-4 seed walk the committee round-robin.
        assert_eq!(picks.iter().collect::<std::collections::HashSet<_>>().len(), 4);
    }

    #[test]
    fn empty_set_has_no_proposer() {
        let s = ValidatorSet::new(vec![]);
        assert!(s.proposer_for(1, 0).is_none());
    }
}
