//! Round engine configuration.

use std::time::Duration;

/// Timing and budget knobs for the round engine.
///
/// Defaults are tuned for a ~100ms block time: 20ms per phase, a 500ms
/// whole-round budget before a view change, and at most 10 rounds per height
/// before the engine halts and waits for an operator.
#[derive(Debug, Clone)]
pub struct BftConfig {
    /// Budget for a single phase to reach quorum.
    pub phase_timeout: Duration,
    /// Budget for a whole round before a coordinated view change.
    pub view_change_timeout: Duration,
    /// Rounds attempted at one height before halting.
    pub max_rounds_per_height: u64,
    /// Rolling window size for latency metrics.
    pub metrics_window: usize,
}

impl Default for BftConfig {
    fn default() -> Self {
        BftConfig {
            phase_timeout: Duration::from_millis(20),
            view_change_timeout: Duration::from_millis(500),
            max_rounds_per_height: 10,
            metrics_window: 2000,
        }
    }
}
