//! Consensus health scoring.
//!
//! A block production run is summarized into a 0..=100 score by applying
//! fixed deductions to a perfect baseline. Each firing threshold contributes
//! a human-readable finding so an operator can see what pulled the score
//! down without reading raw metrics.

use crate::config::ConsensusConfig;
use quorus_bft::ConsensusMetrics;
use serde::{Deserialize, Serialize};

/// Score band for the health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthBand {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthBand {
    fn for_score(score: u32) -> Self {
        if score >= 90 {
            HealthBand::Healthy
        } else if score >= 70 {
            HealthBand::Degraded
        } else {
            HealthBand::Unhealthy
        }
    }
}

/// Outcome of one health evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub score: u32,
    pub band: HealthBand,
    pub findings: Vec<String>,
}

impl Default for HealthReport {
    fn default() -> Self {
        HealthReport {
            score: 100,
            band: HealthBand::Healthy,
            findings: Vec::new(),
        }
    }
}

/// Score the current run.
///
/// Deductions are additive; a committee can be dinged for slow rounds and
/// weak participation at the same time.
pub fn evaluate(
    metrics: &ConsensusMetrics,
    validator_count: usize,
    config: &ConsensusConfig,
) -> HealthReport {
    // Nothing has run yet, nothing to judge.
    if metrics.total_rounds == 0 {
        return HealthReport::default();
    }

    let mut deductions: u32 = 0;
    let mut findings = Vec::new();
    let target_ms = config.block_time_ms as f64;

    let success = metrics.quorum_achievement_rate;
    if success < 99.0 {
        deductions += 20;
        findings.push(format!("quorum achievement {success:.2}% below 99%"));
    } else if success < 99.9 {
        deductions += 5;
        findings.push(format!("quorum achievement {success:.2}% below 99.9%"));
    }

    if metrics.p99_latency_ms as f64 > 2.0 * target_ms {
        deductions += 15;
        findings.push(format!(
            "p99 round latency {}ms above 2x the {}ms target",
            metrics.p99_latency_ms, config.block_time_ms
        ));
    } else if metrics.p95_latency_ms as f64 > 1.5 * target_ms {
        deductions += 5;
        findings.push(format!(
            "p95 round latency {}ms above 1.5x the {}ms target",
            metrics.p95_latency_ms, config.block_time_ms
        ));
    }

    let view_change_rate = metrics.view_changes as f64 / metrics.total_rounds as f64;
    if view_change_rate > 0.01 {
        deductions += 20;
        findings.push(format!(
            "view-change rate {view_change_rate:.4} above 1 per 100 rounds"
        ));
    } else if view_change_rate > 0.001 {
        deductions += 5;
        findings.push(format!(
            "view-change rate {view_change_rate:.4} above 1 per 1000 rounds"
        ));
    }

    let participation = metrics.voting_participation_rate;
    if participation < 90.0 {
        deductions += 15;
        findings.push(format!("participation {participation:.1}% below 90%"));
    } else if participation < 95.0 {
        deductions += 5;
        findings.push(format!("participation {participation:.1}% below 95%"));
    }

    if validator_count < config.min_validators {
        deductions += 10;
        findings.push(format!(
            "{} active validators below the floor of {}",
            validator_count, config.min_validators
        ));
    }

    let score = 100u32.saturating_sub(deductions);
    HealthReport {
        score,
        band: HealthBand::for_score(score),
        findings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perfect() -> ConsensusMetrics {
        ConsensusMetrics {
            total_rounds: 1000,
            successful_rounds: 1000,
            view_changes: 0,
            quorum_achievement_rate: 100.0,
            voting_participation_rate: 100.0,
            p95_latency_ms: 100,
            p99_latency_ms: 120,
            ..ConsensusMetrics::default()
        }
    }

    fn config() -> ConsensusConfig {
        ConsensusConfig::default()
    }

    #[test]
    fn perfect_run_scores_100() {
        let report = evaluate(&perfect(), 4, &config());
        assert_eq!(report.score, 100);
        assert_eq!(report.band, HealthBand::Healthy);
        assert!(report.findings.is_empty());
    }

    #[test]
    fn no_rounds_is_healthy_by_default() {
        let report = evaluate(&ConsensusMetrics::default(), 0, &config());
        assert_eq!(report.score, 100);
    }

    #[test]
    fn deductions_are_additive() {
        let mut m = perfect();
        m.quorum_achievement_rate = 98.0; // -20
        m.voting_participation_rate = 85.0; // -15
        let report = evaluate(&m, 3, &config()); // -10 for small committee
        assert_eq!(report.score, 55);
        assert_eq!(report.band, HealthBand::Unhealthy);
        assert_eq!(report.findings.len(), 3);
    }

    #[test]
    fn latency_thresholds_prefer_the_heavier_deduction() {
        let mut m = perfect();
        // p99 above 2x target (200ms) fires alone, p95 check is skipped.
        m.p99_latency_ms = 250;
        m.p95_latency_ms = 240;
        let report = evaluate(&m, 4, &config());
        assert_eq!(report.score, 85);
        assert_eq!(report.findings.len(), 1);

        // Only p95 above 1.5x target fires the lighter one.
        let mut m = perfect();
        m.p95_latency_ms = 160;
        m.p99_latency_ms = 190;
        let report = evaluate(&m, 4, &config());
        assert_eq!(report.score, 95);
    }

    #[test]
    fn view_change_rate_bands() {
        let mut m = perfect();
        m.view_changes = 5; // 0.005 per round
        let report = evaluate(&m, 4, &config());
        assert_eq!(report.score, 95);

        m.view_changes = 20; // 0.02 per round
        let report = evaluate(&m, 4, &config());
        assert_eq!(report.score, 80);
    }

    #[test]
    fn band_edges_are_exact() {
        assert_eq!(HealthBand::for_score(90), HealthBand::Healthy);
        assert_eq!(HealthBand::for_score(89), HealthBand::Degraded);
        assert_eq!(HealthBand::for_score(70), HealthBand::Degraded);
        assert_eq!(HealthBand::for_score(69), HealthBand::Unhealthy);
    }
}
