//! Five-phase BFT round engine.
//!
//! This crate implements the consensus state machine as a synchronous,
//! event-driven model: the runner injects time and events, the engine
//! returns actions. See [`RoundEngine`] for the protocol itself.

mod config;
mod engine;
mod error;
mod metrics;
mod view_change;

pub use config::BftConfig;
pub use engine::{EngineStatus, RoundEngine, RoundState};
pub use error::ConsensusError;
pub use metrics::{ConsensusMetrics, LatencyWindow, MetricsTracker};
pub use view_change::{backoff_timeout, view_change_message, RequestRecord, ViewChangeVotes};
