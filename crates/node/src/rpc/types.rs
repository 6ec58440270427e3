//! Response types for the RPC API.

use super::state::{BlockSummary, FinalitySnapshot, ValidatorEntry};
use crate::health::HealthReport;
use quorus_bft::ConsensusMetrics;
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════
// Health & Readiness
// ═══════════════════════════════════════════════════════════════════════════

/// Response for `/health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        HealthResponse {
            status: "ok".to_string(),
        }
    }
}

/// Response for `/ready`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyResponse {
    pub status: String,
    pub ready: bool,
}

// ═══════════════════════════════════════════════════════════════════════════
// Consensus
// ═══════════════════════════════════════════════════════════════════════════

/// Response for `/api/v1/consensus/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusStatusResponse {
    /// Engine status: "idle", "running" or "halted".
    pub status: String,
    pub height: u64,
    pub round: u64,
    pub phase: String,
    pub validators: Vec<ValidatorEntry>,
    pub total_power: String,
    pub quorum_threshold: String,
    pub equivocations: usize,
    pub uptime_secs: u64,
    pub version: String,
}

/// Response for `/api/v1/consensus/metrics`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusMetricsResponse {
    #[serde(flatten)]
    pub metrics: ConsensusMetrics,
}

/// One phase in the `/api/v1/consensus/phases` breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseTimingEntry {
    pub phase: String,
    pub avg_ms: f64,
}

/// Response for `/api/v1/consensus/phases`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhasesResponse {
    pub phases: Vec<PhaseTimingEntry>,
    pub avg_round_time_ms: f64,
}

/// Response for `/api/v1/consensus/health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusHealthResponse {
    #[serde(flatten)]
    pub report: HealthReport,
}

/// Response for `/api/v1/consensus/blocks`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentBlocksResponse {
    pub blocks: Vec<BlockSummary>,
}

/// Response for `/api/v1/finality/summary`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalitySummaryResponse {
    #[serde(flatten)]
    pub summary: FinalitySnapshot,
}
