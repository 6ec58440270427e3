//! Shared state between the coordinator and the RPC handlers.
//!
//! The coordinator publishes a whole [`NodeSnapshot`] after every block or
//! view change; handlers only ever read it. Powers are pre-rendered as
//! decimal strings so the HTTP surface never touches big-integer types.

use crate::config::ConsensusConfig;
use crate::health::HealthReport;
use quorus_bft::ConsensusMetrics;
use serde::{Deserialize, Serialize};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

/// Shared state for RPC handlers.
#[derive(Clone)]
pub struct RpcState {
    /// Ready flag for the readiness probe.
    pub ready: Arc<AtomicBool>,
    /// Latest published snapshot.
    pub snapshot: Arc<RwLock<NodeSnapshot>>,
    /// Server start time for uptime reporting.
    pub start_time: Instant,
}

impl RpcState {
    pub fn new() -> Self {
        RpcState {
            ready: Arc::new(AtomicBool::new(false)),
            snapshot: Arc::new(RwLock::new(NodeSnapshot::default())),
            start_time: Instant::now(),
        }
    }
}

impl Default for RpcState {
    fn default() -> Self {
        Self::new()
    }
}

/// One committee member as the API reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorEntry {
    pub address: String,
    /// Decimal string; stake powers exceed u64.
    pub power: String,
}

/// One finalized block in the recent-blocks ring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockSummary {
    pub height: u64,
    pub hash: String,
    pub round: u64,
    pub round_time_ms: u64,
    pub transactions: u64,
    pub gas_fees: String,
    pub timestamp_ms: u64,
}

/// Finality lifecycle counts for the summary endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinalitySnapshot {
    pub pending: usize,
    pub confirmed: usize,
    pub rejected: usize,
    pub finalized: usize,
    pub latest_finalized_height: Option<u64>,
}

/// Everything the read-only API serves, published wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub status: String,
    pub height: u64,
    pub round: u64,
    pub phase: String,
    pub validators: Vec<ValidatorEntry>,
    pub total_power: String,
    pub quorum_threshold: String,
    pub metrics: ConsensusMetrics,
    pub health: HealthReport,
    pub recent_blocks: Vec<BlockSummary>,
    pub config: ConsensusConfig,
    pub finality: FinalitySnapshot,
    pub equivocations: usize,
}

impl Default for NodeSnapshot {
    fn default() -> Self {
        NodeSnapshot {
            status: "idle".to_string(),
            height: 0,
            round: 0,
            phase: "IDLE".to_string(),
            validators: Vec::new(),
            total_power: "0".to_string(),
            quorum_threshold: "0".to_string(),
            metrics: ConsensusMetrics::default(),
            health: HealthReport::default(),
            recent_blocks: Vec::new(),
            config: ConsensusConfig::default(),
            finality: FinalitySnapshot::default(),
            equivocations: 0,
        }
    }
}
