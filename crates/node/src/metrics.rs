//! Prometheus metrics for the node.
//!
//! Counters and gauges the coordinator updates as it drives rounds; scraped
//! through `GET /metrics`. Domain-level only, traces carry the event-level
//! detail.

use prometheus::{
    register_counter, register_gauge, register_histogram, Counter, Gauge, Histogram,
};
use std::sync::OnceLock;

static METRICS: OnceLock<Metrics> = OnceLock::new();

pub struct Metrics {
    pub blocks_finalized: Counter,
    pub block_height: Gauge,
    pub round_time: Histogram,
    pub view_changes: Counter,
    pub halts: Counter,
    pub equivocations: Counter,
    pub transactions_total: Counter,
    pub health_score: Gauge,
    pub finality_pending: Gauge,
    pub rewards_paid: Counter,
}

impl Metrics {
    fn new() -> Self {
        // Round-time buckets from 10ms to 5s.
        let round_buckets = vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0];

        Metrics {
            blocks_finalized: register_counter!(
                "quorus_blocks_finalized_total",
                "Blocks that reached commit quorum"
            )
            .unwrap(),

            block_height: register_gauge!("quorus_block_height", "Latest finalized height")
                .unwrap(),

            round_time: register_histogram!(
                "quorus_round_time_seconds",
                "Wall time from round start to finalize",
                round_buckets
            )
            .unwrap(),

            view_changes: register_counter!(
                "quorus_view_changes_total",
                "Round advances forced by timeouts or f+1 requests"
            )
            .unwrap(),

            halts: register_counter!(
                "quorus_halts_total",
                "Heights that exhausted their round budget"
            )
            .unwrap(),

            equivocations: register_counter!(
                "quorus_equivocations_total",
                "Double votes detected in one slot"
            )
            .unwrap(),

            transactions_total: register_counter!(
                "quorus_transactions_total",
                "Transactions carried by finalized blocks"
            )
            .unwrap(),

            health_score: register_gauge!(
                "quorus_health_score",
                "Current consensus health score, 0 to 100"
            )
            .unwrap(),

            finality_pending: register_gauge!(
                "quorus_finality_pending",
                "Blocks registered but not yet confirmed"
            )
            .unwrap(),

            rewards_paid: register_counter!(
                "quorus_rewards_paid_total",
                "Reward entries issued for finalized blocks"
            )
            .unwrap(),
        }
    }
}

/// Global metrics handle; registers on first use.
pub fn metrics() -> &'static Metrics {
    METRICS.get_or_init(Metrics::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_initializes_once() {
        let m = metrics();
        m.blocks_finalized.inc();
        let again = metrics();
        again.blocks_finalized.inc();
        assert_eq!(m.blocks_finalized.get(), again.blocks_finalized.get());
        assert!(m.blocks_finalized.get() >= 2.0);
    }
}
