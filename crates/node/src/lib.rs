//! Node runtime for the quorus consensus engine.
//!
//! Ties the deterministic engines to the real world: a tokio coordinator
//! loop drives rounds and finality, tokio timers back the engine's timer
//! actions, an axum server exposes the read-only API, and Prometheus plus
//! tracing cover observability.

pub mod config;
pub mod coordinator;
pub mod health;
pub mod metrics;
pub mod rpc;
pub mod telemetry;
pub mod timers;
pub mod vote_source;

pub use config::ConsensusConfig;
pub use coordinator::{Command, Coordinator, CoordinatorHandle};
pub use health::{evaluate, HealthBand, HealthReport};
pub use telemetry::{init_telemetry, TelemetryError};
pub use timers::TimerManager;
pub use vote_source::{
    FaultyVoteSource, HonestVoteSource, SilentVoteSource, VoteContext, VoteDecision, VoteSource,
};
