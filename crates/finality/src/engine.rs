//! Verification tally and finality lifecycle.
//!
//! The finality engine is an independent second opinion on committed blocks:
//! it re-verifies block integrity through validator votes, promotes status
//! through pending → confirmed → finalized, and computes reward splits for
//! finalized blocks. It never feeds back into block production, so a stalled
//! verification pass cannot stall the chain and a bug in the round engine
//! cannot hide a corrupted block.

use crate::config::FinalityConfig;
use crate::error::FinalityError;
use num_bigint::BigUint;
use num_traits::Zero;
use quorus_types::{
    Address, BlockData, BlockReward, CryptoProvider, FinalityResult, FinalityStatus, Hash,
    RewardRole, ValidatorSet, VerificationOutcome, VerificationVote, Verdict,
};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

struct TrackedBlock {
    data: BlockData,
    result: FinalityResult,
    verdicts: HashMap<Address, Verdict>,
}

/// A newly finalized block with its reward entries.
pub struct FinalizedBlock {
    pub result: FinalityResult,
    pub rewards: Vec<BlockReward>,
}

/// Summary counts for the read-only surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinalitySummary {
    pub pending: usize,
    pub confirmed: usize,
    pub rejected: usize,
    pub finalized: usize,
    pub latest_finalized_height: Option<u64>,
}

/// The verification and finality engine.
pub struct FinalityEngine {
    config: FinalityConfig,
    validators: Arc<ValidatorSet>,
    crypto: Arc<dyn CryptoProvider>,
    now: Duration,
    blocks: HashMap<Hash, TrackedBlock>,
    /// Finalized hashes in finalization order, for the retention sweep.
    finalized_order: VecDeque<Hash>,
}

impl FinalityEngine {
    pub fn new(
        config: FinalityConfig,
        validators: Arc<ValidatorSet>,
        crypto: Arc<dyn CryptoProvider>,
    ) -> Self {
        FinalityEngine {
            config,
            validators,
            crypto,
            now: Duration::ZERO,
            blocks: HashMap::new(),
            finalized_order: VecDeque::new(),
        }
    }

    pub fn set_time(&mut self, now: Duration) {
        self.now = now;
    }

    pub fn set_validators(&mut self, validators: Arc<ValidatorSet>) {
        self.validators = validators;
    }

    fn now_ms(&self) -> u64 {
        self.now.as_millis() as u64
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Registration and verification
    // ═══════════════════════════════════════════════════════════════════════

    /// Open a pending verification record for a committed block.
    #[instrument(skip(self, block), fields(height = block.height, hash = %block.hash))]
    pub fn register_block(&mut self, block: BlockData) -> Result<(), FinalityError> {
        if self.blocks.contains_key(&block.hash) {
            return Err(FinalityError::DuplicateBlock(block.hash));
        }
        let result = FinalityResult {
            height: block.height,
            hash: block.hash,
            status: FinalityStatus::Pending,
            valid_power: BigUint::zero(),
            invalid_power: BigUint::zero(),
            abstain_power: BigUint::zero(),
            vote_count: 0,
            required_quorum: self.validators.quorum_threshold().clone(),
            registered_at_ms: self.now_ms(),
            confirmed_at_ms: None,
            finalized_at_ms: None,
        };
        debug!("block registered for verification");
        self.blocks.insert(
            block.hash,
            TrackedBlock {
                data: block,
                result,
                verdicts: HashMap::new(),
            },
        );
        Ok(())
    }

    /// Recompute a block's integrity. Failure is returned as data.
    pub fn verify_block(&self, block: &BlockData) -> VerificationOutcome {
        let tx_root = self.crypto.merkle_root(&block.transactions);
        if tx_root != block.tx_root {
            return VerificationOutcome::fail("transaction root mismatch");
        }
        let hash = self.crypto.block_hash(
            &block.parent,
            &block.state_root,
            &block.tx_root,
            &block.receipts_root,
            block.timestamp_ms,
        );
        if hash != block.hash {
            return VerificationOutcome::fail("block hash mismatch");
        }
        VerificationOutcome::ok()
    }

    /// Tally one verification vote.
    ///
    /// A validator contributes to exactly one verdict bucket per block;
    /// repeat votes are rejected. Status moves out of pending once one
    /// bucket's power reaches quorum, and never moves again here.
    #[instrument(skip(self, vote), fields(
        block = %vote.block,
        verifier = %vote.verifier,
        verdict = %vote.verdict,
    ))]
    pub fn submit_vote(
        &mut self,
        vote: VerificationVote,
    ) -> Result<FinalityStatus, FinalityError> {
        let Some(power) = self.validators.power_of(&vote.verifier).cloned() else {
            return Err(FinalityError::UnknownVerifier(vote.verifier));
        };
        let message =
            VerificationVote::signing_message(&vote.block, vote.height, vote.verdict);
        if !self
            .crypto
            .verify(&vote.verifier, message.as_bytes(), &vote.signature)
        {
            return Err(FinalityError::InvalidSignature(vote.verifier));
        }
        let tracked = self
            .blocks
            .get_mut(&vote.block)
            .ok_or(FinalityError::UnknownBlock(vote.block))?;
        if tracked.verdicts.contains_key(&vote.verifier) {
            return Err(FinalityError::DuplicateVote(vote.verifier, vote.block));
        }

        tracked.verdicts.insert(vote.verifier, vote.verdict);
        tracked.result.vote_count += 1;
        match vote.verdict {
            Verdict::Valid => tracked.result.valid_power += &power,
            Verdict::Invalid => tracked.result.invalid_power += &power,
            Verdict::Abstain => tracked.result.abstain_power += &power,
        }

        if tracked.result.status == FinalityStatus::Pending {
            let quorum = &tracked.result.required_quorum;
            if tracked.result.valid_power >= *quorum {
                tracked.result.status = FinalityStatus::Confirmed;
                tracked.result.confirmed_at_ms = Some(self.now.as_millis() as u64);
                info!(
                    height = tracked.result.height,
                    valid_power = %tracked.result.valid_power,
                    "block confirmed"
                );
            } else if tracked.result.invalid_power >= *quorum {
                tracked.result.status = FinalityStatus::Rejected;
                warn!(
                    height = tracked.result.height,
                    invalid_power = %tracked.result.invalid_power,
                    "block rejected by verification quorum"
                );
            }
        }
        Ok(tracked.result.status)
    }

    /// Run the verification pass for one block: every active validator
    /// recomputes integrity and votes accordingly.
    pub fn run_verification_pass(
        &mut self,
        hash: &Hash,
    ) -> Result<FinalityStatus, FinalityError> {
        let tracked = self
            .blocks
            .get(hash)
            .ok_or(FinalityError::UnknownBlock(*hash))?;
        let outcome = self.verify_block(&tracked.data);
        let verdict = if outcome.valid {
            Verdict::Valid
        } else {
            debug!(hash = %hash, error = ?outcome.error, "integrity check failed");
            Verdict::Invalid
        };
        let height = tracked.data.height;

        let verifiers: Vec<Address> = self.validators.addresses().copied().collect();
        let mut status = FinalityStatus::Pending;
        for verifier in verifiers {
            let message = VerificationVote::signing_message(hash, height, verdict);
            let vote = VerificationVote {
                block: *hash,
                height,
                verifier,
                verdict,
                power: self
                    .validators
                    .power_of(&verifier)
                    .cloned()
                    .unwrap_or_else(BigUint::zero),
                signature: self.crypto.sign(&verifier, message.as_bytes()),
                timestamp_ms: self.now_ms(),
            };
            status = self.submit_vote(vote)?;
        }
        Ok(status)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Finalization sweep
    // ═══════════════════════════════════════════════════════════════════════

    /// Promote confirmed blocks whose height lag from `head_height` reaches
    /// the finality depth, compute their rewards, and evict finalized
    /// entries beyond the retention bound.
    pub fn advance_head(&mut self, head_height: u64) -> Vec<FinalizedBlock> {
        let mut newly: Vec<Hash> = self
            .blocks
            .values()
            .filter(|t| {
                t.result.status == FinalityStatus::Confirmed
                    && head_height.saturating_sub(t.result.height) >= self.config.finality_depth
            })
            .map(|t| t.result.hash)
            .collect();
        // Finalize in chain order so the retention queue stays ordered.
        newly.sort_by_key(|h| self.blocks[h].result.height);

        let now_ms = self.now_ms();
        let mut out = Vec::with_capacity(newly.len());
        for hash in newly {
            let tracked = self
                .blocks
                .get_mut(&hash)
                .filter(|t| t.result.status == FinalityStatus::Confirmed);
            let Some(tracked) = tracked else { continue };
            tracked.result.status = FinalityStatus::Finalized;
            tracked.result.finalized_at_ms = Some(now_ms);
            self.finalized_order.push_back(hash);
            info!(
                height = tracked.result.height,
                hash = %hash,
                head_height,
                "block finalized"
            );
            let result = tracked.result.clone();
            let rewards = self.compute_rewards(&hash);
            out.push(FinalizedBlock { result, rewards });
        }

        while self.finalized_order.len() > self.config.retention {
            if let Some(evicted) = self.finalized_order.pop_front() {
                self.blocks.remove(&evicted);
                debug!(hash = %evicted, "finalized entry evicted by retention sweep");
            }
        }
        out
    }

    /// Reward split for a finalized block: the proposer takes a fixed reward
    /// plus 70% of gas fees; the remaining 30% is divided evenly across the
    /// verifiers that voted valid, each on top of a fixed per-verifier
    /// reward. Integer division dust goes to the proposer so the gas total
    /// always balances.
    fn compute_rewards(&self, hash: &Hash) -> Vec<BlockReward> {
        let Some(tracked) = self.blocks.get(hash) else {
            return Vec::new();
        };
        let block = &tracked.data;
        let mut verifiers: Vec<Address> = tracked
            .verdicts
            .iter()
            .filter(|(_, v)| **v == Verdict::Valid)
            .map(|(a, _)| *a)
            .collect();
        verifiers.sort();

        let gas = &block.gas_fees;
        let proposer_share = gas * 7u8 / 10u8;
        let verifier_pool = gas * 3u8 / 10u8;
        let per_verifier = if verifiers.is_empty() {
            BigUint::zero()
        } else {
            &verifier_pool / verifiers.len()
        };
        let distributed = &per_verifier * verifiers.len();
        let dust = gas - &proposer_share - &distributed;

        let mut rewards = Vec::with_capacity(verifiers.len() + 1);
        rewards.push(BlockReward {
            block: *hash,
            height: block.height,
            recipient: block.proposer,
            role: RewardRole::Proposer,
            fixed: self.config.proposer_reward.clone(),
            gas_share: proposer_share + dust,
            power: self
                .validators
                .power_of(&block.proposer)
                .cloned()
                .unwrap_or_else(BigUint::zero),
        });
        for verifier in verifiers {
            rewards.push(BlockReward {
                block: *hash,
                height: block.height,
                recipient: verifier,
                role: RewardRole::Verifier,
                fixed: self.config.verifier_reward.clone(),
                gas_share: per_verifier.clone(),
                power: self
                    .validators
                    .power_of(&verifier)
                    .cloned()
                    .unwrap_or_else(BigUint::zero),
            });
        }
        rewards
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Read-only surface
    // ═══════════════════════════════════════════════════════════════════════

    pub fn status_of(&self, hash: &Hash) -> Option<FinalityStatus> {
        self.blocks.get(hash).map(|t| t.result.status)
    }

    pub fn result_of(&self, hash: &Hash) -> Option<&FinalityResult> {
        self.blocks.get(hash).map(|t| &t.result)
    }

    pub fn pending_blocks(&self) -> Vec<Hash> {
        self.blocks
            .values()
            .filter(|t| t.result.status == FinalityStatus::Pending)
            .map(|t| t.result.hash)
            .collect()
    }

    pub fn summary(&self) -> FinalitySummary {
        let mut summary = FinalitySummary::default();
        for tracked in self.blocks.values() {
            match tracked.result.status {
                FinalityStatus::Pending => summary.pending += 1,
                FinalityStatus::Confirmed => summary.confirmed += 1,
                FinalityStatus::Rejected => summary.rejected += 1,
                FinalityStatus::Finalized => {
                    summary.finalized += 1;
                    summary.latest_finalized_height = summary
                        .latest_finalized_height
                        .max(Some(tracked.result.height));
                }
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quorus_types::{NodeCrypto, Validator};

    fn crypto() -> Arc<dyn CryptoProvider> {
        Arc::new(NodeCrypto)
    }

    fn validators(n: usize) -> Arc<ValidatorSet> {
        Arc::new(ValidatorSet::new((0..n).map(|i| {
            Validator::new(Address::from_public_key(format!("v{i}").as_bytes()), 25u64)
        })))
    }

    fn engine(n: usize) -> FinalityEngine {
        FinalityEngine::new(FinalityConfig::default(), validators(n), crypto())
    }

    /// A block whose roots and hash are internally consistent.
    fn block(engine: &FinalityEngine, height: u64, gas: u64) -> BlockData {
        let transactions: Vec<Hash> = (0..3)
            .map(|i| Hash::from(blake3::hash(format!("tx-{height}-{i}").as_bytes())))
            .collect();
        let tx_root = engine.crypto.merkle_root(&transactions);
        let parent = Hash::from(blake3::hash(format!("parent-{height}").as_bytes()));
        let state_root = Hash::from(blake3::hash(b"state"));
        let receipts_root = Hash::from(blake3::hash(b"receipts"));
        let timestamp_ms = height * 100;
        let hash = engine.crypto.block_hash(
            &parent,
            &state_root,
            &tx_root,
            &receipts_root,
            timestamp_ms,
        );
        let proposer = *engine.validators.addresses().next().unwrap();
        BlockData {
            height,
            hash,
            parent,
            state_root,
            tx_root,
            receipts_root,
            transactions,
            gas_fees: BigUint::from(gas),
            timestamp_ms,
            proposer,
        }
    }

    fn vote(
        engine: &FinalityEngine,
        verifier: Address,
        block: &BlockData,
        verdict: Verdict,
    ) -> VerificationVote {
        let message = VerificationVote::signing_message(&block.hash, block.height, verdict);
        VerificationVote {
            block: block.hash,
            height: block.height,
            verifier,
            verdict,
            power: engine.validators.power_of(&verifier).cloned().unwrap(),
            signature: engine.crypto.sign(&verifier, message.as_bytes()),
            timestamp_ms: 0,
        }
    }

    fn confirm(engine: &mut FinalityEngine, b: &BlockData) {
        engine.register_block(b.clone()).unwrap();
        assert_eq!(
            engine.run_verification_pass(&b.hash).unwrap(),
            FinalityStatus::Confirmed
        );
    }

    #[test]
    fn intact_block_confirms_through_verification_pass() {
        let mut engine = engine(4);
        let b = block(&engine, 1, 1_000);
        engine.register_block(b.clone()).unwrap();

        let status = engine.run_verification_pass(&b.hash).unwrap();
        assert_eq!(status, FinalityStatus::Confirmed);

        let result = engine.result_of(&b.hash).unwrap();
        assert_eq!(result.vote_count, 4);
        assert_eq!(result.valid_power, BigUint::from(100u8));
        assert!(result.invalid_power.is_zero());
    }

    #[test]
    fn tampered_block_is_rejected() {
        let mut engine = engine(4);
        let mut b = block(&engine, 1, 1_000);
        b.transactions.push(Hash::from(blake3::hash(b"forged")));
        engine.register_block(b.clone()).unwrap();

        let outcome = engine.verify_block(&b);
        assert!(!outcome.valid);
        assert_eq!(outcome.error.as_deref(), Some("transaction root mismatch"));

        let status = engine.run_verification_pass(&b.hash).unwrap();
        assert_eq!(status, FinalityStatus::Rejected);
        // Rejected blocks never finalize, whatever the head does.
        assert!(engine.advance_head(1_000).is_empty());
        assert_eq!(engine.status_of(&b.hash), Some(FinalityStatus::Rejected));
    }

    #[test]
    fn confirmation_requires_quorum_not_majority() {
        let mut engine = engine(4);
        let b = block(&engine, 1, 0);
        engine.register_block(b.clone()).unwrap();
        let verifiers: Vec<Address> = engine.validators.addresses().copied().collect();

        // Two of four (50 power) is below the 67 quorum.
        for v in &verifiers[..2] {
            let status = engine.submit_vote(vote(&engine, *v, &b, Verdict::Valid)).unwrap();
            assert_eq!(status, FinalityStatus::Pending);
        }
        // The third valid vote crosses it.
        let status = engine
            .submit_vote(vote(&engine, verifiers[2], &b, Verdict::Valid))
            .unwrap();
        assert_eq!(status, FinalityStatus::Confirmed);
    }

    #[test]
    fn abstain_power_counts_toward_neither_side() {
        let mut engine = engine(4);
        let b = block(&engine, 1, 0);
        engine.register_block(b.clone()).unwrap();
        let verifiers: Vec<Address> = engine.validators.addresses().copied().collect();

        for v in &verifiers {
            engine.submit_vote(vote(&engine, *v, &b, Verdict::Abstain)).unwrap();
        }
        let result = engine.result_of(&b.hash).unwrap();
        assert_eq!(result.status, FinalityStatus::Pending);
        assert_eq!(result.abstain_power, BigUint::from(100u8));
    }

    #[test]
    fn duplicate_and_unknown_votes_are_rejected() {
        let mut engine = engine(4);
        let b = block(&engine, 1, 0);
        engine.register_block(b.clone()).unwrap();
        let verifier = *engine.validators.addresses().next().unwrap();

        engine.submit_vote(vote(&engine, verifier, &b, Verdict::Valid)).unwrap();
        assert!(matches!(
            engine.submit_vote(vote(&engine, verifier, &b, Verdict::Invalid)),
            Err(FinalityError::DuplicateVote(..))
        ));

        let stranger = Address::from_public_key(b"not-a-validator");
        let mut bad = vote(&engine, verifier, &b, Verdict::Valid);
        bad.verifier = stranger;
        assert!(matches!(
            engine.submit_vote(bad),
            Err(FinalityError::UnknownVerifier(_))
        ));

        assert!(matches!(
            engine.register_block(b.clone()),
            Err(FinalityError::DuplicateBlock(_))
        ));
    }

    #[test]
    fn bad_signature_is_rejected() {
        let mut engine = engine(4);
        let b = block(&engine, 1, 0);
        engine.register_block(b.clone()).unwrap();
        let verifier = *engine.validators.addresses().next().unwrap();

        let mut v = vote(&engine, verifier, &b, Verdict::Valid);
        // Signed for a different verdict than the one claimed.
        v.verdict = Verdict::Invalid;
        assert!(matches!(
            engine.submit_vote(v),
            Err(FinalityError::InvalidSignature(_))
        ));
    }

    #[test]
    fn finalization_happens_exactly_at_depth() {
        let mut engine = engine(4);
        let b = block(&engine, 10, 1_000);
        confirm(&mut engine, &b);

        // Lag 5 is one short of the depth of 6.
        assert!(engine.advance_head(15).is_empty());
        assert_eq!(engine.status_of(&b.hash), Some(FinalityStatus::Confirmed));

        let finalized = engine.advance_head(16);
        assert_eq!(finalized.len(), 1);
        assert_eq!(finalized[0].result.status, FinalityStatus::Finalized);
        assert_eq!(finalized[0].result.height, 10);

        // Already finalized, never reported twice.
        assert!(engine.advance_head(17).is_empty());
        assert_eq!(engine.summary().latest_finalized_height, Some(10));
    }

    #[test]
    fn rewards_split_seventy_thirty_with_four_verifiers() {
        let mut engine = engine(4);
        let gas = 1_000u64;
        let b = block(&engine, 10, gas);
        confirm(&mut engine, &b);
        engine.set_time(Duration::from_millis(500));

        let finalized = engine.advance_head(16);
        let rewards = &finalized[0].rewards;
        assert_eq!(rewards.len(), 5);

        let proposer = &rewards[0];
        assert_eq!(proposer.role, RewardRole::Proposer);
        assert_eq!(proposer.recipient, b.proposer);
        assert_eq!(proposer.fixed, BigUint::from(2_000_000_000_000_000_000u64));
        assert_eq!(proposer.gas_share, BigUint::from(700u64));

        for verifier in &rewards[1..] {
            assert_eq!(verifier.role, RewardRole::Verifier);
            assert_eq!(verifier.fixed, BigUint::from(100_000_000_000_000_000u64));
            assert_eq!(verifier.gas_share, BigUint::from(75u64));
        }

        // Gas shares cover the whole fee pot.
        let distributed: BigUint = rewards.iter().map(|r| &r.gas_share).sum();
        assert_eq!(distributed, BigUint::from(gas));
    }

    #[test]
    fn division_dust_goes_to_the_proposer() {
        let mut engine = engine(4);
        // 1003: 70% = 702, 30% pool = 300, 75 each, 1 unit of dust.
        let b = block(&engine, 10, 1_003);
        confirm(&mut engine, &b);

        let finalized = engine.advance_head(16);
        let rewards = &finalized[0].rewards;
        assert_eq!(rewards[0].gas_share, BigUint::from(703u64));
        for verifier in &rewards[1..] {
            assert_eq!(verifier.gas_share, BigUint::from(75u64));
        }
        let distributed: BigUint = rewards.iter().map(|r| &r.gas_share).sum();
        assert_eq!(distributed, BigUint::from(1_003u64));
    }

    #[test]
    fn only_valid_voters_earn_verifier_rewards() {
        let mut engine = engine(4);
        let b = block(&engine, 10, 1_000);
        engine.register_block(b.clone()).unwrap();
        let verifiers: Vec<Address> = engine.validators.addresses().copied().collect();

        for v in &verifiers[..3] {
            engine.submit_vote(vote(&engine, *v, &b, Verdict::Valid)).unwrap();
        }
        engine
            .submit_vote(vote(&engine, verifiers[3], &b, Verdict::Abstain))
            .unwrap();
        assert_eq!(engine.status_of(&b.hash), Some(FinalityStatus::Confirmed));

        let finalized = engine.advance_head(16);
        let rewards = &finalized[0].rewards;
        // Proposer plus the three valid voters; the abstainer earns nothing.
        assert_eq!(rewards.len(), 4);
        assert!(rewards[1..]
            .iter()
            .all(|r| verifiers[..3].contains(&r.recipient)));
        assert_eq!(rewards[1].gas_share, BigUint::from(100u64));
    }

    #[test]
    fn retention_sweep_evicts_oldest_finalized_only() {
        let mut engine = FinalityEngine::new(
            FinalityConfig {
                retention: 3,
                ..FinalityConfig::default()
            },
            validators(4),
            crypto(),
        );

        let blocks: Vec<BlockData> = (1..=5).map(|h| block(&engine, h, 100)).collect();
        for b in &blocks[..4] {
            confirm(&mut engine, b);
        }
        // The fifth stays pending; retention must never touch it.
        engine.register_block(blocks[4].clone()).unwrap();

        let finalized = engine.advance_head(100);
        assert_eq!(finalized.len(), 4);
        // Finalized in chain order.
        let heights: Vec<u64> = finalized.iter().map(|f| f.result.height).collect();
        assert_eq!(heights, vec![1, 2, 3, 4]);

        // Oldest finalized entry evicted, latest three retained.
        assert_eq!(engine.status_of(&blocks[0].hash), None);
        for b in &blocks[1..4] {
            assert_eq!(engine.status_of(&b.hash), Some(FinalityStatus::Finalized));
        }
        assert_eq!(engine.status_of(&blocks[4].hash), Some(FinalityStatus::Pending));

        let summary = engine.summary();
        assert_eq!(summary.finalized, 3);
        assert_eq!(summary.pending, 1);
        assert_eq!(summary.latest_finalized_height, Some(4));
    }

    #[test]
    fn confirmation_latency_is_measured_from_registration() {
        let mut engine = engine(4);
        let b = block(&engine, 1, 0);
        engine.set_time(Duration::from_millis(100));
        engine.register_block(b.clone()).unwrap();
        engine.set_time(Duration::from_millis(340));
        engine.run_verification_pass(&b.hash).unwrap();

        let result = engine.result_of(&b.hash).unwrap();
        assert_eq!(result.confirmation_latency_ms(), Some(240));
    }
}
