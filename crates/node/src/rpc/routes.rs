//! Route configuration for the RPC API.

use super::handlers::*;
use super::state::RpcState;
use axum::{routing::get, Router};

/// Create the full router with all RPC routes.
pub fn create_router(state: RpcState) -> Router {
    Router::new()
        // Health & readiness probes (no prefix)
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        // Metrics (no prefix, for Prometheus scraping)
        .route("/metrics", get(metrics_handler))
        // API v1 routes
        .nest("/api/v1", api_v1_routes())
        .with_state(state)
}

/// Create the `/api/v1` router.
fn api_v1_routes() -> Router<RpcState> {
    Router::new()
        .route("/consensus/status", get(consensus_status_handler))
        .route("/consensus/metrics", get(consensus_metrics_handler))
        .route("/consensus/phases", get(consensus_phases_handler))
        .route("/consensus/health", get(consensus_health_handler))
        .route("/consensus/blocks", get(consensus_blocks_handler))
        .route("/consensus/config", get(consensus_config_handler))
        .route("/finality/summary", get(finality_summary_handler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    async fn status_of(path: &str) -> axum::http::StatusCode {
        let app = create_router(RpcState::new());
        let response = app
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        response.status()
    }

    #[tokio::test]
    async fn all_read_routes_resolve() {
        for path in [
            "/health",
            "/metrics",
            "/api/v1/consensus/status",
            "/api/v1/consensus/metrics",
            "/api/v1/consensus/phases",
            "/api/v1/consensus/health",
            "/api/v1/consensus/blocks",
            "/api/v1/consensus/config",
            "/api/v1/finality/summary",
        ] {
            assert_eq!(
                status_of(path).await,
                axum::http::StatusCode::OK,
                "route {path}"
            );
        }
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        assert_eq!(
            status_of("/api/v1/consensus/unknown").await,
            axum::http::StatusCode::NOT_FOUND
        );
    }
}
