//! Rolling consensus metrics.
//!
//! Bounded windows keep the cost of every update constant regardless of how
//! long the chain has been running.

use quorus_core::Phase;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A bounded sample window with average and percentile queries.
#[derive(Debug, Clone)]
pub struct LatencyWindow {
    samples: VecDeque<u64>,
    cap: usize,
}

impl LatencyWindow {
    pub fn new(cap: usize) -> Self {
        LatencyWindow {
            samples: VecDeque::with_capacity(cap.min(1024)),
            cap: cap.max(1),
        }
    }

    pub fn push(&mut self, sample_ms: u64) {
        if self.samples.len() == self.cap {
            self.samples.pop_front();
        }
        self.samples.push_back(sample_ms);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn average(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<u64>() as f64 / self.samples.len() as f64
    }

    /// Nearest-rank percentile over the window, `p` in [0, 1].
    pub fn percentile(&self, p: f64) -> u64 {
        if self.samples.is_empty() {
            return 0;
        }
        let mut sorted: Vec<u64> = self.samples.iter().copied().collect();
        sorted.sort_unstable();
        let idx = ((sorted.len() as f64 * p) as usize).min(sorted.len() - 1);
        sorted[idx]
    }
}

/// Snapshot of consensus performance, safe to serialize for the HTTP surface.
///
/// Latencies are reporting-only floats; quorum math never goes near these.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsensusMetrics {
    pub total_rounds: u64,
    pub successful_rounds: u64,
    pub failed_rounds: u64,
    pub view_changes: u64,
    pub avg_round_time_ms: f64,
    /// Indexed by `Phase::index()`; slot 0 (idle) is always zero.
    pub avg_phase_times_ms: [f64; Phase::COUNT],
    pub voting_participation_rate: f64,
    pub quorum_achievement_rate: f64,
    pub last_block_height: u64,
    pub last_block_time_ms: u64,
    pub current_tps: f64,
    pub peak_tps: f64,
    pub total_transactions: u64,
    pub p50_latency_ms: u64,
    pub p95_latency_ms: u64,
    pub p99_latency_ms: u64,
}

/// Accumulates round and phase timings behind the snapshot type.
#[derive(Debug, Clone)]
pub struct MetricsTracker {
    round_latencies: LatencyWindow,
    phase_latencies: [LatencyWindow; Phase::COUNT],
    total_rounds: u64,
    successful_rounds: u64,
    failed_rounds: u64,
    view_changes: u64,
    last_block_height: u64,
    last_block_time_ms: u64,
    last_round_time_ms: u64,
    total_transactions: u64,
    current_tps: f64,
    peak_tps: f64,
}

impl MetricsTracker {
    pub fn new(window: usize) -> Self {
        MetricsTracker {
            round_latencies: LatencyWindow::new(window),
            phase_latencies: std::array::from_fn(|_| LatencyWindow::new(window)),
            total_rounds: 0,
            successful_rounds: 0,
            failed_rounds: 0,
            view_changes: 0,
            last_block_height: 0,
            last_block_time_ms: 0,
            last_round_time_ms: 0,
            total_transactions: 0,
            current_tps: 0.0,
            peak_tps: 0.0,
        }
    }

    pub fn round_started(&mut self) {
        self.total_rounds += 1;
    }

    pub fn round_succeeded(&mut self, round_time_ms: u64, height: u64, now_ms: u64) {
        self.successful_rounds += 1;
        self.round_latencies.push(round_time_ms);
        self.last_round_time_ms = round_time_ms;
        self.last_block_height = height;
        self.last_block_time_ms = now_ms;
    }

    pub fn round_failed(&mut self) {
        self.failed_rounds += 1;
    }

    pub fn view_change(&mut self) {
        self.view_changes += 1;
    }

    pub fn record_phase(&mut self, phase: Phase, elapsed_ms: u64) {
        if phase != Phase::Idle {
            self.phase_latencies[phase.index()].push(elapsed_ms);
        }
    }

    /// Fold a finalized block's transaction count into throughput tracking.
    /// TPS is derived from the most recent round time.
    pub fn record_transactions(&mut self, count: u64) {
        self.total_transactions += count;
        if self.last_round_time_ms > 0 {
            self.current_tps = count as f64 * 1000.0 / self.last_round_time_ms as f64;
            if self.current_tps > self.peak_tps {
                self.peak_tps = self.current_tps;
            }
        }
    }

    pub fn view_changes_total(&self) -> u64 {
        self.view_changes
    }

    pub fn snapshot(&self, participation_rate: f64) -> ConsensusMetrics {
        let avg_phase_times_ms = std::array::from_fn(|i| self.phase_latencies[i].average());
        ConsensusMetrics {
            total_rounds: self.total_rounds,
            successful_rounds: self.successful_rounds,
            failed_rounds: self.failed_rounds,
            view_changes: self.view_changes,
            avg_round_time_ms: self.round_latencies.average(),
            avg_phase_times_ms,
            voting_participation_rate: participation_rate,
            quorum_achievement_rate: self.successful_rounds as f64 * 100.0
                / (self.total_rounds.max(1)) as f64,
            last_block_height: self.last_block_height,
            last_block_time_ms: self.last_block_time_ms,
            current_tps: self.current_tps,
            peak_tps: self.peak_tps,
            total_transactions: self.total_transactions,
            p50_latency_ms: self.round_latencies.percentile(0.50),
            p95_latency_ms: self.round_latencies.percentile(0.95),
            p99_latency_ms: self.round_latencies.percentile(0.99),
        }
    }
}
