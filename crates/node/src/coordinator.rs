//! The consensus coordinator.
//!
//! Owns the round engine, the finality engine and all I/O around them: it
//! injects time, arms real timers for `SetTimer` actions, solicits committee
//! votes through the [`VoteSource`] seam, registers committed blocks for
//! verification, and publishes a read-only snapshot for the HTTP API.
//!
//! The engines stay deterministic; everything async lives here.

use crate::config::ConsensusConfig;
use crate::health;
use crate::metrics::metrics;
use crate::rpc::{BlockSummary, FinalitySnapshot, NodeSnapshot, RpcState, ValidatorEntry};
use crate::timers::TimerManager;
use crate::vote_source::{VoteContext, VoteDecision, VoteSource};
use anyhow::anyhow;
use num_bigint::BigUint;
use quorus_bft::RoundEngine;
use quorus_core::{Action, Event, Phase, StateMachine};
use quorus_finality::FinalityEngine;
use quorus_types::{Address, BlockData, CryptoProvider, Hash, ValidatorSet, VoteKind};
use rand::Rng;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::VecDeque;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, trace, warn};

/// Capacity of the recent-blocks ring.
const RECENT_BLOCKS: usize = 100;

/// Rounds averaged for the adaptive inter-block delay.
const DELAY_WINDOW: usize = 5;

/// Control inputs for a running coordinator.
#[derive(Debug)]
pub enum Command {
    /// Begin producing blocks.
    Start,
    /// Stop producing after the in-flight height settles.
    Stop,
    /// Swap the committee at the next round boundary.
    SetValidators(Arc<ValidatorSet>),
    /// Tear the loop down.
    Shutdown,
}

/// Cloneable control handle for a spawned coordinator.
#[derive(Clone)]
pub struct CoordinatorHandle {
    commands: mpsc::Sender<Command>,
    rpc: RpcState,
}

impl CoordinatorHandle {
    pub async fn start(&self) -> anyhow::Result<()> {
        self.send(Command::Start).await
    }

    pub async fn stop(&self) -> anyhow::Result<()> {
        self.send(Command::Stop).await
    }

    pub async fn set_validators(&self, validators: Arc<ValidatorSet>) -> anyhow::Result<()> {
        self.send(Command::SetValidators(validators)).await
    }

    pub async fn shutdown(&self) -> anyhow::Result<()> {
        self.send(Command::Shutdown).await
    }

    async fn send(&self, command: Command) -> anyhow::Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| anyhow!("coordinator is gone"))
    }

    /// Shared state the RPC server reads from.
    pub fn rpc_state(&self) -> RpcState {
        self.rpc.clone()
    }

    /// Latest published snapshot.
    pub async fn snapshot(&self) -> NodeSnapshot {
        self.rpc.snapshot.read().await.clone()
    }
}

/// Payload synthesized for the height in flight; becomes the committed
/// block's body.
struct PendingPayload {
    transactions: Vec<Hash>,
    gas_fees: BigUint,
    state_root: Hash,
    receipts_root: Hash,
}

pub struct Coordinator {
    config: ConsensusConfig,
    crypto: Arc<dyn CryptoProvider>,
    engine: RoundEngine,
    finality: FinalityEngine,
    vote_source: Box<dyn VoteSource>,
    timers: TimerManager,
    events: mpsc::Receiver<Event>,
    commands: mpsc::Receiver<Command>,
    rpc: RpcState,
    started_at: Instant,
    producing: bool,
    next_block_at: Option<Instant>,
    parent: Hash,
    payload: Option<PendingPayload>,
    pending_validators: Option<Arc<ValidatorSet>>,
    recent_blocks: VecDeque<BlockSummary>,
    rng: ChaCha8Rng,
}

impl Coordinator {
    pub fn new(
        config: ConsensusConfig,
        validators: Arc<ValidatorSet>,
        crypto: Arc<dyn CryptoProvider>,
        vote_source: Box<dyn VoteSource>,
    ) -> (Self, CoordinatorHandle) {
        let (event_tx, events) = mpsc::channel(256);
        let (command_tx, commands) = mpsc::channel(16);
        let rpc = RpcState::new();

        let engine = RoundEngine::new(config.bft(), validators.clone(), crypto.clone());
        let finality = FinalityEngine::new(config.finality(), validators, crypto.clone());

        let coordinator = Coordinator {
            config,
            crypto,
            engine,
            finality,
            vote_source,
            timers: TimerManager::new(event_tx),
            events,
            commands,
            rpc: rpc.clone(),
            started_at: Instant::now(),
            producing: false,
            next_block_at: None,
            parent: Hash::ZERO,
            payload: None,
            pending_validators: None,
            recent_blocks: VecDeque::with_capacity(RECENT_BLOCKS),
            rng: ChaCha8Rng::seed_from_u64(0),
        };
        let handle = CoordinatorHandle {
            commands: command_tx,
            rpc,
        };
        (coordinator, handle)
    }

    /// Drive the coordinator until shutdown.
    pub async fn run(mut self) {
        info!("coordinator started");
        loop {
            let deadline = self
                .next_block_at
                .unwrap_or_else(|| Instant::now() + Duration::from_secs(3600));

            tokio::select! {
                maybe = self.commands.recv() => match maybe {
                    Some(Command::Start) => {
                        info!("block production enabled");
                        self.producing = true;
                        self.rpc.ready.store(true, Ordering::SeqCst);
                        if self.next_block_at.is_none() {
                            self.next_block_at = Some(Instant::now());
                        }
                    }
                    Some(Command::Stop) => {
                        info!("block production disabled");
                        self.producing = false;
                        self.next_block_at = None;
                        self.rpc.ready.store(false, Ordering::SeqCst);
                        self.publish().await;
                    }
                    Some(Command::SetValidators(validators)) => {
                        debug!(
                            validators = validators.len(),
                            "committee swap queued for the next round boundary"
                        );
                        self.pending_validators = Some(validators);
                    }
                    Some(Command::Shutdown) | None => break,
                },
                Some(event) = self.events.recv() => {
                    self.dispatch(event);
                    self.publish().await;
                }
                _ = tokio::time::sleep_until(deadline), if self.next_block_at.is_some() => {
                    self.next_block_at = None;
                    self.begin_block();
                    self.publish().await;
                }
            }
        }
        self.timers.cancel_all();
        info!("coordinator stopped");
    }

    fn now(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Feed one external event through the engine.
    fn dispatch(&mut self, event: Event) {
        trace!(event = event.type_name(), "dispatch");
        let now = self.now();
        self.engine.set_time(now);
        self.finality.set_time(now);
        let actions = self.engine.handle(event);
        self.apply(actions);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Block production
    // ═══════════════════════════════════════════════════════════════════════

    /// Kick off consensus for the next height.
    #[instrument(skip(self))]
    fn begin_block(&mut self) {
        if !self.producing {
            return;
        }
        // Committee swaps apply only here, at the height boundary, so an
        // in-flight round always sees a stable set.
        if let Some(validators) = self.pending_validators.take() {
            self.engine.set_validators(validators.clone());
            self.finality.set_validators(validators);
        }

        // A resuming node seeds the chain position from its configuration;
        // from then on the engine's own height leads.
        let height = self.engine.height().max(self.config.start_height) + 1;
        self.payload = Some(self.synthesize_payload(height));

        let now = self.now();
        self.engine.set_time(now);
        self.finality.set_time(now);
        let actions = self.engine.begin_height(height);
        self.apply(actions);
    }

    /// Build the body the proposer will commit to. Seeded randomness keeps
    /// runs replayable.
    fn synthesize_payload(&mut self, height: u64) -> PendingPayload {
        let count: u64 = self.rng.random_range(100..=500);
        let transactions = (0..count)
            .map(|i| {
                let mut hasher = blake3::Hasher::new();
                hasher.update(&height.to_le_bytes());
                hasher.update(&i.to_le_bytes());
                Hash::from(hasher.finalize())
            })
            .collect();
        let gas_fees = BigUint::from(self.rng.random_range(1_000_000u64..=10_000_000));
        PendingPayload {
            transactions,
            gas_fees,
            state_root: Hash::from(blake3::hash(&height.to_le_bytes())),
            receipts_root: Hash::from(blake3::hash(&(height ^ u64::MAX).to_le_bytes())),
        }
    }

    /// Execute engine actions, feeding internal events straight back.
    fn apply(&mut self, actions: Vec<Action>) {
        for action in actions {
            match action {
                Action::SetTimer { id, duration } => self.timers.set_timer(id, duration),
                Action::CancelTimer { id } => self.timers.cancel_timer(id),
                Action::EnqueueInternal { event } => {
                    // Internal events outrank anything waiting in the
                    // channel; process them inline.
                    let followups = self.engine.handle(event);
                    self.apply(followups);
                }
                Action::PhaseChanged { phase, .. } => self.on_phase(phase),
                Action::ViewChange {
                    height,
                    new_round,
                    reason,
                } => {
                    warn!(height, new_round, %reason, "view change");
                    metrics().view_changes.inc();
                }
                Action::Finalized {
                    hash,
                    height,
                    round,
                    round_time_ms,
                } => self.on_finalized(hash, height, round, round_time_ms),
                Action::ReportEquivocation { equivocation } => {
                    warn!(
                        voter = %equivocation.voter,
                        kind = %equivocation.kind,
                        height = equivocation.height,
                        round = equivocation.round,
                        "equivocation reported"
                    );
                    metrics().equivocations.inc();
                }
                Action::Halted { height, reason } => {
                    error!(height, %reason, "consensus halted");
                    metrics().halts.inc();
                    self.producing = false;
                    self.next_block_at = None;
                    self.rpc.ready.store(false, Ordering::SeqCst);
                }
            }
        }
    }

    fn on_phase(&mut self, phase: Phase) {
        match phase {
            Phase::Propose => self.propose(),
            Phase::Prevote => self.solicit(VoteKind::Prevote),
            Phase::Precommit => self.solicit(VoteKind::Precommit),
            Phase::Commit => self.solicit(VoteKind::Commit),
            Phase::Finalize | Phase::Idle => {}
        }
    }

    /// Create and deliver the proposal for the current round.
    fn propose(&mut self) {
        let Some(payload) = self.payload.as_ref() else {
            warn!("propose phase without a payload");
            return;
        };
        let tx_root = self.crypto.merkle_root(&payload.transactions);
        match self.engine.create_proposal(
            self.parent,
            payload.state_root,
            tx_root,
            payload.receipts_root,
        ) {
            Ok(proposal) => {
                let actions = self.engine.handle(Event::ProposalReceived { proposal });
                self.apply(actions);
            }
            // Production failures waste the round; the view-change timer
            // picks it up.
            Err(e) => warn!(error = %e, "block production failed"),
        }
    }

    /// Ask every validator for its vote in the current phase and deliver
    /// the batch.
    ///
    /// Quorum actions are collected and applied after the whole batch so
    /// late votes in the same phase still count toward participation.
    fn solicit(&mut self, kind: VoteKind) {
        let ctx = VoteContext {
            height: self.engine.height(),
            round: self.engine.round(),
            phase: self.engine.phase(),
            proposal: self.engine.proposal().map(|p| p.hash),
        };
        let voters: Vec<Address> = self.engine.validators().addresses().copied().collect();

        let mut queued = Vec::new();
        for voter in voters {
            let vote = match self.vote_source.decide(&ctx, &voter) {
                VoteDecision::Honest => self.engine.create_vote(kind, &voter),
                VoteDecision::Nil => self.engine.create_nil_vote(kind, &voter),
                VoteDecision::Silent => None,
            };
            if let Some(vote) = vote {
                queued.extend(self.engine.handle(Event::VoteReceived { vote }));
            }
        }
        self.apply(queued);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Finalization
    // ═══════════════════════════════════════════════════════════════════════

    #[instrument(skip(self), fields(height, round))]
    fn on_finalized(&mut self, hash: Hash, height: u64, round: u64, round_time_ms: u64) {
        let Some(proposal) = self.engine.proposal().filter(|p| p.hash == hash).cloned()
        else {
            warn!(%hash, "finalized block without a matching proposal");
            return;
        };
        let Some(payload) = self.payload.take() else {
            warn!(%hash, "finalized block without a payload");
            return;
        };

        let tx_count = payload.transactions.len() as u64;
        self.engine.record_transactions(tx_count);

        let block = BlockData {
            height,
            hash,
            parent: proposal.parent,
            state_root: proposal.state_root,
            tx_root: proposal.tx_root,
            receipts_root: proposal.receipts_root,
            transactions: payload.transactions,
            gas_fees: payload.gas_fees.clone(),
            timestamp_ms: proposal.timestamp_ms,
            proposer: proposal.proposer,
        };
        if let Err(e) = self.finality.register_block(block) {
            warn!(error = %e, "finality registration failed");
        } else {
            match self.finality.run_verification_pass(&hash) {
                Ok(status) => debug!(%hash, %status, "verification pass complete"),
                Err(e) => warn!(error = %e, "verification pass failed"),
            }
        }
        for finalized in self.finality.advance_head(height) {
            info!(
                height = finalized.result.height,
                rewards = finalized.rewards.len(),
                "block finalized with rewards"
            );
            metrics().rewards_paid.inc_by(finalized.rewards.len() as f64);
        }

        metrics().blocks_finalized.inc();
        metrics().block_height.set(height as f64);
        metrics().round_time.observe(round_time_ms as f64 / 1000.0);
        metrics().transactions_total.inc_by(tx_count as f64);

        if self.recent_blocks.len() == RECENT_BLOCKS {
            self.recent_blocks.pop_front();
        }
        self.recent_blocks.push_back(BlockSummary {
            height,
            hash: hash.to_string(),
            round,
            round_time_ms,
            transactions: tx_count,
            gas_fees: payload.gas_fees.to_string(),
            timestamp_ms: proposal.timestamp_ms,
        });
        self.parent = hash;

        if self.producing {
            let delay = self.adaptive_delay();
            trace!(delay_ms = delay.as_millis() as u64, "next block scheduled");
            self.next_block_at = Some(Instant::now() + delay);
        }
    }

    /// Inter-block delay holding the configured cadence: rounds that ran
    /// over the target shrink the pause, fast rounds stretch it, and the
    /// configured floor always wins.
    fn adaptive_delay(&self) -> Duration {
        let target = self.config.block_time_ms as f64;
        let recent: Vec<f64> = self
            .recent_blocks
            .iter()
            .rev()
            .take(DELAY_WINDOW)
            .map(|b| b.round_time_ms as f64)
            .collect();
        if recent.is_empty() {
            return self.config.block_time();
        }
        let avg = recent.iter().sum::<f64>() / recent.len() as f64;
        let delay = (target - (avg - target)).max(self.config.min_block_delay_ms as f64);
        Duration::from_millis(delay as u64)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Snapshot publication
    // ═══════════════════════════════════════════════════════════════════════

    async fn publish(&self) {
        let consensus = self.engine.metrics();
        let report =
            health::evaluate(&consensus, self.engine.validators().len(), &self.config);
        metrics().health_score.set(report.score as f64);

        let summary = self.finality.summary();
        metrics().finality_pending.set(summary.pending as f64);

        let validators = self.engine.validators();
        let snapshot = NodeSnapshot {
            status: self.engine.status().as_str().to_string(),
            height: self.engine.height(),
            round: self.engine.round(),
            phase: self.engine.phase().name().to_string(),
            validators: validators
                .iter()
                .map(|v| ValidatorEntry {
                    address: v.address.to_string(),
                    power: v.power.to_string(),
                })
                .collect(),
            total_power: validators.total_power().to_string(),
            quorum_threshold: validators.quorum_threshold().to_string(),
            metrics: consensus,
            health: report,
            recent_blocks: self.recent_blocks.iter().rev().cloned().collect(),
            config: self.config.clone(),
            finality: FinalitySnapshot {
                pending: summary.pending,
                confirmed: summary.confirmed,
                rejected: summary.rejected,
                finalized: summary.finalized,
                latest_finalized_height: summary.latest_finalized_height,
            },
            equivocations: self.engine.equivocations().len(),
        };
        *self.rpc.snapshot.write().await = snapshot;
    }
}
