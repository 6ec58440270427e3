//! Five-phase BFT round engine.
//!
//! Decides exactly one block per height through PROPOSE → PREVOTE →
//! PRECOMMIT → COMMIT → FINALIZE, with Tendermint-style locking for safety
//! and view changes for liveness. The engine is a deterministic state
//! machine: events in, actions out, time injected by the runner.
//!
//! Rejected inputs (stale votes, wrong proposers, bad signatures) are logged
//! and dropped, never raised as errors. A stalled round either reaches
//! quorum or times out into a view change; the only terminal state is a
//! halt after the per-height round budget is exhausted.

use crate::config::BftConfig;
use crate::error::ConsensusError;
use crate::metrics::{ConsensusMetrics, MetricsTracker};
use crate::view_change::{
    backoff_timeout, view_change_message, RequestRecord, ViewChangeVotes,
};
use num_bigint::BigUint;
use quorus_core::{Action, Event, Phase, StateMachine, TimerId};
use quorus_types::{
    Address, AggregatedVotes, BlockProposal, CryptoProvider, Equivocation, Hash, ValidatorSet,
    ViewChangeRequest, Vote, VoteKind, VoteRecord,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, trace, warn};

/// Most recent equivocations retained for the audit surface; older entries
/// are evicted so the log stays bounded over chain history.
const EQUIVOCATION_LOG: usize = 256;

/// Overall engine condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    /// No round in flight.
    Idle,
    /// A round is in progress.
    Running,
    /// Round budget for the current height exhausted; waiting for an
    /// operator to re-seed the engine.
    Halted,
}

impl EngineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineStatus::Idle => "idle",
            EngineStatus::Running => "running",
            EngineStatus::Halted => "halted",
        }
    }
}

/// Per-round mutable state.
///
/// Round-scoped fields reset on every round advance; the safety lock and
/// valid-round proof persist across rounds within a height and clear on
/// height advance.
#[derive(Debug, Clone)]
pub struct RoundState {
    pub height: u64,
    pub round: u64,
    pub phase: Phase,
    pub proposer: Option<Address>,
    pub proposal: Option<BlockProposal>,
    /// Safety lock: (round, hash) this engine is bound to at this height.
    pub locked: Option<(u64, Hash)>,
    /// Liveness proof: highest (round, hash) that reached precommit quorum.
    pub valid: Option<(u64, Hash)>,
    prevotes: AggregatedVotes,
    precommits: AggregatedVotes,
    commits: AggregatedVotes,
    started_at: Duration,
    phase_started_at: [Duration; Phase::COUNT],
}

impl RoundState {
    fn new(height: u64, round: u64, now: Duration) -> Self {
        let mut phase_started_at = [Duration::ZERO; Phase::COUNT];
        phase_started_at[Phase::Propose.index()] = now;
        RoundState {
            height,
            round,
            phase: Phase::Propose,
            proposer: None,
            proposal: None,
            locked: None,
            valid: None,
            prevotes: AggregatedVotes::new(VoteKind::Prevote, height, round),
            precommits: AggregatedVotes::new(VoteKind::Precommit, height, round),
            commits: AggregatedVotes::new(VoteKind::Commit, height, round),
            started_at: now,
            phase_started_at,
        }
    }

    fn tally_mut(&mut self, kind: VoteKind) -> &mut AggregatedVotes {
        match kind {
            VoteKind::Prevote => &mut self.prevotes,
            VoteKind::Precommit => &mut self.precommits,
            VoteKind::Commit => &mut self.commits,
        }
    }

    fn vote_count(&self) -> usize {
        self.prevotes.vote_count() + self.precommits.vote_count() + self.commits.vote_count()
    }
}

/// The earliest phase in which a vote kind is acceptable.
fn phase_for(kind: VoteKind) -> Phase {
    match kind {
        VoteKind::Prevote => Phase::Prevote,
        VoteKind::Precommit => Phase::Precommit,
        VoteKind::Commit => Phase::Commit,
    }
}

/// The deterministic five-phase round engine.
pub struct RoundEngine {
    config: BftConfig,
    crypto: Arc<dyn CryptoProvider>,
    validators: Arc<ValidatorSet>,
    now: Duration,
    status: EngineStatus,
    state: RoundState,
    view_change: ViewChangeVotes,
    equivocations: Vec<Equivocation>,
    metrics: MetricsTracker,
}

impl RoundEngine {
    pub fn new(
        config: BftConfig,
        validators: Arc<ValidatorSet>,
        crypto: Arc<dyn CryptoProvider>,
    ) -> Self {
        let metrics = MetricsTracker::new(config.metrics_window);
        info!(
            validators = validators.len(),
            total_power = %validators.total_power(),
            quorum = %validators.quorum_threshold(),
            "round engine initialized"
        );
        RoundEngine {
            config,
            crypto,
            validators,
            now: Duration::ZERO,
            status: EngineStatus::Idle,
            state: RoundState::new(0, 0, Duration::ZERO),
            view_change: ViewChangeVotes::new(),
            equivocations: Vec::new(),
            metrics,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Accessors
    // ═══════════════════════════════════════════════════════════════════════

    pub fn status(&self) -> EngineStatus {
        self.status
    }

    pub fn height(&self) -> u64 {
        self.state.height
    }

    pub fn round(&self) -> u64 {
        self.state.round
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn proposer(&self) -> Option<&Address> {
        self.state.proposer.as_ref()
    }

    pub fn proposal(&self) -> Option<&BlockProposal> {
        self.state.proposal.as_ref()
    }

    pub fn locked(&self) -> Option<(u64, Hash)> {
        self.state.locked
    }

    pub fn valid(&self) -> Option<(u64, Hash)> {
        self.state.valid
    }

    pub fn validators(&self) -> &Arc<ValidatorSet> {
        &self.validators
    }

    pub fn equivocations(&self) -> &[Equivocation] {
        &self.equivocations
    }

    /// Time spent in the current phase.
    pub fn phase_elapsed(&self) -> Duration {
        self.now
            .saturating_sub(self.state.phase_started_at[self.state.phase.index()])
    }

    /// Metrics snapshot including the current round's participation rate.
    pub fn metrics(&self) -> ConsensusMetrics {
        let expected = self.validators.len() * 3;
        let participation = if expected == 0 {
            0.0
        } else {
            self.state.vote_count() as f64 * 100.0 / expected as f64
        };
        self.metrics.snapshot(participation)
    }

    /// Replace the validator snapshot. Takes effect immediately; callers
    /// swap at round boundaries so an in-flight round keeps a stable view.
    pub fn set_validators(&mut self, validators: Arc<ValidatorSet>) {
        info!(
            validators = validators.len(),
            total_power = %validators.total_power(),
            quorum = %validators.quorum_threshold(),
            "validator set replaced"
        );
        self.validators = validators;
    }

    /// Fold a finalized block's transaction count into throughput metrics.
    pub fn record_transactions(&mut self, count: u64) {
        self.metrics.record_transactions(count);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Round lifecycle
    // ═══════════════════════════════════════════════════════════════════════

    /// Start consensus for a new height at round 0. Clears any lock held
    /// from the previous height and lifts a halt.
    #[instrument(skip(self), fields(height = height))]
    pub fn begin_height(&mut self, height: u64) -> Vec<Action> {
        self.state.locked = None;
        self.state.valid = None;
        self.status = EngineStatus::Idle;
        self.start_round(height, 0)
    }

    fn start_round(&mut self, height: u64, round: u64) -> Vec<Action> {
        if self.validators.is_empty() {
            warn!(height, round, "cannot start round with empty validator set");
            return Vec::new();
        }
        let locked = if height == self.state.height {
            self.state.locked
        } else {
            None
        };
        let valid = if height == self.state.height {
            self.state.valid
        } else {
            None
        };

        self.state = RoundState::new(height, round, self.now);
        self.state.locked = locked;
        self.state.valid = valid;
        self.state.proposer = self
            .validators
            .proposer_for(height, round)
            .map(|v| v.address);
        self.status = EngineStatus::Running;
        self.metrics.round_started();

        debug!(
            height,
            round,
            proposer = ?self.state.proposer,
            locked = ?self.state.locked,
            "round started"
        );

        vec![
            Action::SetTimer {
                id: TimerId::Phase {
                    height,
                    round,
                    phase: Phase::Propose,
                },
                duration: self.config.phase_timeout,
            },
            Action::SetTimer {
                id: TimerId::ViewChange { height, round },
                duration: backoff_timeout(self.config.view_change_timeout, round),
            },
            Action::PhaseChanged {
                phase: Phase::Propose,
                height,
                round,
            },
        ]
    }

    fn transition(&mut self, next: Phase) -> Vec<Action> {
        let previous = self.state.phase;
        let elapsed = self
            .now
            .saturating_sub(self.state.phase_started_at[previous.index()]);
        self.metrics
            .record_phase(previous, elapsed.as_millis() as u64);

        self.state.phase = next;
        self.state.phase_started_at[next.index()] = self.now;
        trace!(from = %previous, to = %next, "phase transition");

        let mut actions = vec![Action::CancelTimer {
            id: TimerId::Phase {
                height: self.state.height,
                round: self.state.round,
                phase: previous,
            },
        }];
        if matches!(next, Phase::Prevote | Phase::Precommit | Phase::Commit) {
            actions.push(Action::SetTimer {
                id: TimerId::Phase {
                    height: self.state.height,
                    round: self.state.round,
                    phase: next,
                },
                duration: self.config.phase_timeout,
            });
        }
        actions.push(Action::PhaseChanged {
            phase: next,
            height: self.state.height,
            round: self.state.round,
        });
        actions
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Proposals
    // ═══════════════════════════════════════════════════════════════════════

    /// Build and sign the proposal for the current (height, round).
    pub fn create_proposal(
        &self,
        parent: Hash,
        state_root: Hash,
        tx_root: Hash,
        receipts_root: Hash,
    ) -> Result<BlockProposal, ConsensusError> {
        if self.state.phase != Phase::Propose {
            return Err(ConsensusError::WrongPhase {
                expected: Phase::Propose,
                actual: self.state.phase,
            });
        }
        let proposer = self.state.proposer.ok_or(ConsensusError::NoProposer {
            height: self.state.height,
            round: self.state.round,
        })?;
        let timestamp_ms = self.now.as_millis() as u64;
        let hash = self
            .crypto
            .block_hash(&parent, &state_root, &tx_root, &receipts_root, timestamp_ms);
        let signature = self.crypto.sign(&proposer, hash.as_bytes());
        Ok(BlockProposal {
            height: self.state.height,
            round: self.state.round,
            proposer,
            parent,
            hash,
            state_root,
            tx_root,
            receipts_root,
            timestamp_ms,
            signature,
        })
    }

    #[instrument(skip(self, proposal), fields(
        height = proposal.height,
        round = proposal.round,
        hash = %proposal.hash,
    ))]
    fn on_proposal(&mut self, proposal: BlockProposal) -> Vec<Action> {
        if self.status != EngineStatus::Running || self.state.phase != Phase::Propose {
            debug!(phase = %self.state.phase, "proposal outside propose phase, dropped");
            return Vec::new();
        }
        if proposal.height != self.state.height || proposal.round != self.state.round {
            debug!("proposal for a different slot, dropped");
            return Vec::new();
        }
        if Some(proposal.proposer) != self.state.proposer {
            warn!(
                expected = ?self.state.proposer,
                got = %proposal.proposer,
                "proposal from wrong proposer"
            );
            return Vec::new();
        }
        // A forged or corrupted proposal is treated as absent: validators
        // will prevote nil and the round times out.
        let recomputed = self.crypto.block_hash(
            &proposal.parent,
            &proposal.state_root,
            &proposal.tx_root,
            &proposal.receipts_root,
            proposal.timestamp_ms,
        );
        if recomputed != proposal.hash {
            warn!("proposal hash does not match contents");
            return Vec::new();
        }
        if !self
            .crypto
            .verify(&proposal.proposer, proposal.hash.as_bytes(), &proposal.signature)
        {
            warn!("invalid proposal signature");
            return Vec::new();
        }

        self.state.proposal = Some(proposal);
        self.transition(Phase::Prevote)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Votes
    // ═══════════════════════════════════════════════════════════════════════

    /// Build this validator's honest vote for the current phase.
    ///
    /// Prevotes enforce the lock rule: a locked validator votes for the
    /// proposal only if it matches the lock, or if a precommit quorum was
    /// seen for a different hash at a strictly higher round than the lock;
    /// otherwise it votes nil. Precommits follow the prevote quorum;
    /// commits follow the precommit quorum.
    ///
    /// Returns `None` when this validator has nothing to vote in the current
    /// phase (no proposal yet, no quorum to follow, unknown validator).
    pub fn create_vote(&self, kind: VoteKind, voter: &Address) -> Option<Vote> {
        if !self.validators.contains(voter) || self.state.phase != phase_for(kind) {
            return None;
        }
        let target = match kind {
            VoteKind::Prevote => {
                let proposal = self.state.proposal.as_ref()?;
                match self.state.locked {
                    Some((locked_round, locked_hash)) => {
                        if proposal.hash == locked_hash {
                            Some(proposal.hash)
                        } else if self
                            .state
                            .valid
                            .map_or(false, |(valid_round, _)| valid_round > locked_round)
                        {
                            debug!(
                                locked_round,
                                "unlocking: valid round proof outranks the lock"
                            );
                            Some(proposal.hash)
                        } else {
                            None
                        }
                    }
                    None => Some(proposal.hash),
                }
            }
            VoteKind::Precommit => {
                match self
                    .state
                    .prevotes
                    .quorum(self.validators.quorum_threshold())
                {
                    Some(Some(hash)) => Some(hash),
                    // No prevote quorum for an actual block: precommit nil.
                    Some(None) | None => None,
                }
            }
            VoteKind::Commit => {
                match self
                    .state
                    .precommits
                    .quorum(self.validators.quorum_threshold())
                {
                    Some(Some(hash)) => Some(hash),
                    Some(None) | None => return None,
                }
            }
        };
        Some(self.build_vote(kind, voter, target))
    }

    /// Build an explicit nil vote, used when a validator rejects the
    /// proposal outright.
    pub fn create_nil_vote(&self, kind: VoteKind, voter: &Address) -> Option<Vote> {
        if !self.validators.contains(voter) || self.state.phase != phase_for(kind) {
            return None;
        }
        Some(self.build_vote(kind, voter, None))
    }

    fn build_vote(&self, kind: VoteKind, voter: &Address, target: Option<Hash>) -> Vote {
        let message = Vote::signing_message(kind, self.state.height, self.state.round, &target);
        let power = self
            .validators
            .power_of(voter)
            .cloned()
            .unwrap_or_else(|| BigUint::from(0u8));
        Vote {
            kind,
            height: self.state.height,
            round: self.state.round,
            target,
            voter: *voter,
            power,
            signature: self.crypto.sign(voter, message.as_bytes()),
            timestamp_ms: self.now.as_millis() as u64,
        }
    }

    /// Sign a view-change request for a peer round advance.
    pub fn create_view_change_request(
        &self,
        requester: &Address,
        new_round: u64,
        reason: impl Into<String>,
    ) -> Option<ViewChangeRequest> {
        if !self.validators.contains(requester) {
            return None;
        }
        let message = view_change_message(self.state.height, new_round);
        Some(ViewChangeRequest {
            height: self.state.height,
            new_round,
            requester: *requester,
            reason: reason.into(),
            signature: self.crypto.sign(requester, message.as_bytes()),
            timestamp_ms: self.now.as_millis() as u64,
        })
    }

    #[instrument(skip(self, vote), fields(
        kind = %vote.kind,
        height = vote.height,
        round = vote.round,
        voter = %vote.voter,
    ))]
    fn on_vote(&mut self, vote: Vote) -> Vec<Action> {
        if self.status != EngineStatus::Running {
            debug!(status = ?self.status, "vote while not running, dropped");
            return Vec::new();
        }
        if vote.height != self.state.height || vote.round != self.state.round {
            debug!("vote for a different slot, dropped");
            return Vec::new();
        }
        if self.state.phase < phase_for(vote.kind) {
            debug!(phase = %self.state.phase, "vote ahead of current phase, dropped");
            return Vec::new();
        }
        let Some(power) = self.validators.power_of(&vote.voter).cloned() else {
            warn!("vote from unknown validator");
            return Vec::new();
        };
        if vote.power != power {
            warn!(claimed = %vote.power, actual = %power, "vote carries wrong power");
            return Vec::new();
        }
        if !self
            .crypto
            .verify(&vote.voter, vote.message().as_bytes(), &vote.signature)
        {
            warn!("invalid vote signature");
            return Vec::new();
        }

        let threshold = self.validators.quorum_threshold().clone();
        let kind = vote.kind;
        let tally = self.state.tally_mut(kind);
        match tally.record(vote.voter, vote.target, &power) {
            VoteRecord::Added => {
                trace!(count = tally.vote_count(), "vote recorded");
                if let Some(target) = tally.quorum(&threshold) {
                    return vec![Action::EnqueueInternal {
                        event: Event::QuorumReached {
                            kind,
                            height: self.state.height,
                            round: self.state.round,
                            target,
                        },
                    }];
                }
                Vec::new()
            }
            VoteRecord::Duplicate => {
                trace!("duplicate vote, ignored");
                Vec::new()
            }
            VoteRecord::Equivocation { previous } => {
                let equivocation = Equivocation {
                    voter: vote.voter,
                    kind,
                    height: vote.height,
                    round: vote.round,
                    first: previous,
                    second: vote.target,
                };
                warn!(
                    first = ?previous,
                    second = ?vote.target,
                    "equivocation detected"
                );
                if self.equivocations.len() == EQUIVOCATION_LOG {
                    self.equivocations.remove(0);
                }
                self.equivocations.push(equivocation.clone());
                vec![Action::ReportEquivocation { equivocation }]
            }
        }
    }

    #[instrument(skip(self), fields(kind = %kind, height, round, target = ?target))]
    fn on_quorum(
        &mut self,
        kind: VoteKind,
        height: u64,
        round: u64,
        target: Option<Hash>,
    ) -> Vec<Action> {
        if self.status != EngineStatus::Running
            || height != self.state.height
            || round != self.state.round
        {
            debug!("stale quorum notification, dropped");
            return Vec::new();
        }
        match (kind, self.state.phase) {
            (VoteKind::Prevote, Phase::Prevote) => {
                match target {
                    Some(hash) => {
                        // Lock only on actual blocks. Locking on nil would
                        // wedge liveness: later rounds could never propose.
                        let outranks = self
                            .state
                            .locked
                            .map_or(true, |(locked_round, _)| round > locked_round);
                        if outranks {
                            self.state.locked = Some((round, hash));
                            info!(%hash, round, "locked");
                        }
                    }
                    None => {
                        debug!("nil prevote quorum, proceeding unlocked");
                    }
                }
                self.transition(Phase::Precommit)
            }
            (VoteKind::Precommit, Phase::Precommit) => match target {
                Some(hash) => {
                    self.state.valid = Some((round, hash));
                    info!(%hash, round, "valid round recorded");
                    self.transition(Phase::Commit)
                }
                None => {
                    // A nil precommit quorum means the round is dead.
                    info!("nil precommit quorum, round failed");
                    self.initiate_view_change("nil precommit quorum")
                }
            },
            (VoteKind::Commit, Phase::Commit) => match target {
                Some(_) => {
                    let mut actions = self.transition(Phase::Finalize);
                    actions.extend(self.finalize_block());
                    actions
                }
                None => self.initiate_view_change("nil commit quorum"),
            },
            _ => {
                debug!(phase = %self.state.phase, "quorum for an already-passed phase");
                Vec::new()
            }
        }
    }

    fn finalize_block(&mut self) -> Vec<Action> {
        let Some(proposal) = self.state.proposal.as_ref() else {
            warn!("finalize without a proposal");
            return Vec::new();
        };
        let hash = proposal.hash;
        let height = self.state.height;
        let round = self.state.round;
        let round_time_ms = self.now.saturating_sub(self.state.started_at).as_millis() as u64;

        self.metrics
            .round_succeeded(round_time_ms, height, self.now.as_millis() as u64);
        self.state.locked = None;
        self.state.valid = None;
        self.view_change.clear_through(round);
        self.status = EngineStatus::Idle;

        info!(%hash, height, round, round_time_ms, "block finalized");

        vec![
            Action::CancelTimer {
                id: TimerId::ViewChange { height, round },
            },
            Action::Finalized {
                hash,
                height,
                round,
                round_time_ms,
            },
        ]
    }

    // ═══════════════════════════════════════════════════════════════════════
    // View change
    // ═══════════════════════════════════════════════════════════════════════

    fn on_phase_timeout(&mut self, height: u64, round: u64, phase: Phase) -> Vec<Action> {
        if self.status != EngineStatus::Running
            || height != self.state.height
            || round != self.state.round
            || phase != self.state.phase
        {
            trace!(height, round, %phase, "stale phase timer, dropped");
            return Vec::new();
        }
        if matches!(phase, Phase::Finalize | Phase::Idle) {
            return Vec::new();
        }
        info!(height, round, %phase, "phase timed out without quorum");
        self.initiate_view_change(format!("{phase} timeout"))
    }

    fn on_view_change_timeout(&mut self, height: u64, round: u64) -> Vec<Action> {
        if self.status != EngineStatus::Running
            || height != self.state.height
            || round != self.state.round
            || self.state.phase == Phase::Finalize
        {
            trace!(height, round, "stale view-change timer, dropped");
            return Vec::new();
        }
        info!(height, round, "round exceeded its view-change budget");
        self.initiate_view_change("view change timeout")
    }

    #[instrument(skip(self, request), fields(
        height = request.height,
        new_round = request.new_round,
        requester = %request.requester,
    ))]
    fn on_view_change_request(&mut self, request: ViewChangeRequest) -> Vec<Action> {
        if self.status != EngineStatus::Running || request.height != self.state.height {
            debug!("view-change request for a different height, dropped");
            return Vec::new();
        }
        if request.new_round <= self.state.round {
            debug!("view-change request for a past round, dropped");
            return Vec::new();
        }
        let Some(power) = self.validators.power_of(&request.requester).cloned() else {
            warn!("view-change request from unknown validator");
            return Vec::new();
        };
        let message = view_change_message(request.height, request.new_round);
        if !self
            .crypto
            .verify(&request.requester, message.as_bytes(), &request.signature)
        {
            warn!("invalid view-change request signature");
            return Vec::new();
        }

        let new_round = request.new_round;
        match self.view_change.record(request, &power) {
            RequestRecord::Duplicate => Vec::new(),
            RequestRecord::Added { accumulated } => {
                let fault_threshold = self.validators.fault_threshold();
                debug!(
                    power = %accumulated,
                    threshold = %fault_threshold,
                    "view-change power accumulated"
                );
                if accumulated >= fault_threshold {
                    // f+1 guarantees at least one honest requester.
                    self.initiate_view_change(format!(
                        "f+1 power requested round {new_round}"
                    ))
                } else {
                    Vec::new()
                }
            }
        }
    }

    fn initiate_view_change(&mut self, reason: impl Into<String>) -> Vec<Action> {
        if self.status == EngineStatus::Halted {
            return Vec::new();
        }
        let reason = reason.into();
        let height = self.state.height;
        let round = self.state.round;

        let mut actions = vec![
            Action::CancelTimer {
                id: TimerId::Phase {
                    height,
                    round,
                    phase: self.state.phase,
                },
            },
            Action::CancelTimer {
                id: TimerId::ViewChange { height, round },
            },
        ];

        if round >= self.config.max_rounds_per_height {
            self.status = EngineStatus::Halted;
            self.metrics.round_failed();
            warn!(height, round, %reason, "round budget exhausted, halting");
            actions.push(Action::Halted {
                height,
                reason: format!("max rounds reached after: {reason}"),
            });
            return actions;
        }

        let new_round = round + 1;
        self.metrics.view_change();
        self.metrics.round_failed();
        self.view_change.clear_through(new_round);
        info!(height, round, new_round, %reason, "view change");

        actions.push(Action::ViewChange {
            height,
            new_round,
            reason,
        });
        // The lock survives the round advance; start_round preserves it for
        // the same height.
        actions.extend(self.start_round(height, new_round));
        actions
    }
}

impl StateMachine for RoundEngine {
    fn set_time(&mut self, now: Duration) {
        self.now = now;
    }

    fn handle(&mut self, event: Event) -> Vec<Action> {
        match event {
            Event::ProposalReceived { proposal } => self.on_proposal(proposal),
            Event::VoteReceived { vote } => self.on_vote(vote),
            Event::ViewChangeRequested { request } => self.on_view_change_request(request),
            Event::PhaseTimeout {
                height,
                round,
                phase,
            } => self.on_phase_timeout(height, round, phase),
            Event::ViewChangeTimeout { height, round } => {
                self.on_view_change_timeout(height, round)
            }
            Event::QuorumReached {
                kind,
                height,
                round,
                target,
            } => self.on_quorum(kind, height, round, target),
        }
    }
}
