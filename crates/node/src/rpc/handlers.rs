//! HTTP request handlers for the RPC API.

use super::state::RpcState;
use super::types::*;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use prometheus::{Encoder, TextEncoder};
use quorus_core::Phase;
use std::sync::atomic::Ordering;

// ═══════════════════════════════════════════════════════════════════════════
// Health & Readiness
// ═══════════════════════════════════════════════════════════════════════════

/// Handler for `GET /health` - liveness probe.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

/// Handler for `GET /ready` - readiness probe.
pub async fn ready_handler(State(state): State<RpcState>) -> impl IntoResponse {
    if state.ready.load(Ordering::SeqCst) {
        (
            StatusCode::OK,
            Json(ReadyResponse {
                status: "ready".to_string(),
                ready: true,
            }),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyResponse {
                status: "not_ready".to_string(),
                ready: false,
            }),
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Prometheus
// ═══════════════════════════════════════════════════════════════════════════

/// Handler for `GET /metrics` - Prometheus text format.
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = ?e, "failed to encode metrics");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "failed to encode metrics".to_string(),
        )
            .into_response();
    }

    (
        [(
            axum::http::header::CONTENT_TYPE,
            encoder.format_type().to_string(),
        )],
        buffer,
    )
        .into_response()
}

// ═══════════════════════════════════════════════════════════════════════════
// Consensus
// ═══════════════════════════════════════════════════════════════════════════

/// Handler for `GET /api/v1/consensus/status`.
pub async fn consensus_status_handler(State(state): State<RpcState>) -> impl IntoResponse {
    let snapshot = state.snapshot.read().await;
    Json(ConsensusStatusResponse {
        status: snapshot.status.clone(),
        height: snapshot.height,
        round: snapshot.round,
        phase: snapshot.phase.clone(),
        validators: snapshot.validators.clone(),
        total_power: snapshot.total_power.clone(),
        quorum_threshold: snapshot.quorum_threshold.clone(),
        equivocations: snapshot.equivocations,
        uptime_secs: state.start_time.elapsed().as_secs(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handler for `GET /api/v1/consensus/metrics`.
pub async fn consensus_metrics_handler(State(state): State<RpcState>) -> impl IntoResponse {
    let snapshot = state.snapshot.read().await;
    Json(ConsensusMetricsResponse {
        metrics: snapshot.metrics.clone(),
    })
}

/// Handler for `GET /api/v1/consensus/phases`.
pub async fn consensus_phases_handler(State(state): State<RpcState>) -> impl IntoResponse {
    let snapshot = state.snapshot.read().await;
    let phases = [
        Phase::Propose,
        Phase::Prevote,
        Phase::Precommit,
        Phase::Commit,
        Phase::Finalize,
    ]
    .into_iter()
    .map(|phase| PhaseTimingEntry {
        phase: phase.name().to_string(),
        avg_ms: snapshot.metrics.avg_phase_times_ms[phase.index()],
    })
    .collect();

    Json(PhasesResponse {
        phases,
        avg_round_time_ms: snapshot.metrics.avg_round_time_ms,
    })
}

/// Handler for `GET /api/v1/consensus/health`.
pub async fn consensus_health_handler(State(state): State<RpcState>) -> impl IntoResponse {
    let snapshot = state.snapshot.read().await;
    Json(ConsensusHealthResponse {
        report: snapshot.health.clone(),
    })
}

/// Handler for `GET /api/v1/consensus/blocks`.
pub async fn consensus_blocks_handler(State(state): State<RpcState>) -> impl IntoResponse {
    let snapshot = state.snapshot.read().await;
    Json(RecentBlocksResponse {
        blocks: snapshot.recent_blocks.clone(),
    })
}

/// Handler for `GET /api/v1/consensus/config`.
pub async fn consensus_config_handler(State(state): State<RpcState>) -> impl IntoResponse {
    let snapshot = state.snapshot.read().await;
    Json(snapshot.config.clone())
}

// ═══════════════════════════════════════════════════════════════════════════
// Finality
// ═══════════════════════════════════════════════════════════════════════════

/// Handler for `GET /api/v1/finality/summary`.
pub async fn finality_summary_handler(State(state): State<RpcState>) -> impl IntoResponse {
    let snapshot = state.snapshot.read().await;
    Json(FinalitySummaryResponse {
        summary: snapshot.finality.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, Router};
    use tower::ServiceExt;

    #[tokio::test]
    async fn ready_follows_the_flag() {
        let state = RpcState::new();
        let app = Router::new()
            .route("/ready", axum::routing::get(ready_handler))
            .with_state(state.clone());

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        state.ready.store(true, Ordering::SeqCst);
        let response = app
            .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn status_reflects_the_published_snapshot() {
        let state = RpcState::new();
        {
            let mut snapshot = state.snapshot.write().await;
            snapshot.status = "running".to_string();
            snapshot.height = 42;
            snapshot.round = 1;
            snapshot.phase = "PREVOTE".to_string();
            snapshot.total_power = "400".to_string();
            snapshot.quorum_threshold = "267".to_string();
        }

        let app = Router::new()
            .route("/status", axum::routing::get(consensus_status_handler))
            .with_state(state);

        let response = app
            .oneshot(Request::builder().uri("/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        let resp: ConsensusStatusResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp.status, "running");
        assert_eq!(resp.height, 42);
        assert_eq!(resp.phase, "PREVOTE");
        assert_eq!(resp.quorum_threshold, "267");
    }

    #[tokio::test]
    async fn phases_cover_the_five_consensus_phases() {
        let app = Router::new()
            .route("/phases", axum::routing::get(consensus_phases_handler))
            .with_state(RpcState::new());

        let response = app
            .oneshot(Request::builder().uri("/phases").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        let resp: PhasesResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp.phases.len(), 5);
        assert_eq!(resp.phases[0].phase, "PROPOSE");
        assert_eq!(resp.phases[4].phase, "FINALIZE");
    }
}
