//! Read-only HTTP API for the node.
//!
//! Endpoint groups:
//!
//! # Health & Readiness
//!
//! - `GET /health` - liveness probe (200 whenever the server runs)
//! - `GET /ready` - readiness probe (200 once the coordinator produces, 503 otherwise)
//!
//! # Metrics & Observability
//!
//! - `GET /metrics` - Prometheus metrics in text format
//! - `GET /api/v1/consensus/status` - engine status, height, round, committee
//! - `GET /api/v1/consensus/metrics` - full consensus metrics snapshot
//! - `GET /api/v1/consensus/phases` - per-phase latency breakdown
//! - `GET /api/v1/consensus/health` - health score, band and findings
//! - `GET /api/v1/consensus/blocks` - recent finalized blocks
//! - `GET /api/v1/consensus/config` - effective configuration
//! - `GET /api/v1/finality/summary` - finality lifecycle counts
//!
//! Every endpoint is an idempotent read; there are no mutation routes.

mod handlers;
mod routes;
mod server;
mod state;
mod types;

pub use routes::create_router;
pub use server::{RpcServer, RpcServerConfig, RpcServerError, RpcServerHandle};
pub use state::{BlockSummary, FinalitySnapshot, NodeSnapshot, RpcState, ValidatorEntry};
pub use types::*;
