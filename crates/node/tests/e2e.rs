//! End-to-end tests for the node.
//!
//! A real coordinator drives blocks under paused tokio time while the HTTP
//! router is exercised against the same shared state the server would use.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use quorus_node::rpc::{create_router, RpcServer, RpcServerConfig};
use quorus_node::{ConsensusConfig, Coordinator, CoordinatorHandle, HonestVoteSource};
use quorus_types::{Address, NodeCrypto, Validator, ValidatorSet};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use tracing_test::traced_test;

fn committee(n: usize) -> Arc<ValidatorSet> {
    Arc::new(ValidatorSet::new((0..n).map(|i| {
        Validator::new(Address::from_public_key(format!("v{i}").as_bytes()), 250u64)
    })))
}

async fn running_node() -> (CoordinatorHandle, tokio::task::JoinHandle<()>) {
    let (coordinator, handle) = Coordinator::new(
        ConsensusConfig::default(),
        committee(4),
        Arc::new(NodeCrypto),
        Box::new(HonestVoteSource),
    );
    let task = tokio::spawn(coordinator.run());
    handle.start().await.unwrap();
    (handle, task)
}

async fn wait_for_height(handle: &CoordinatorHandle, height: u64) {
    loop {
        if handle.snapshot().await.metrics.last_block_height >= height {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

async fn get_json(handle: &CoordinatorHandle, path: &str) -> Value {
    let app = create_router(handle.rpc_state());
    let response = app
        .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK, "GET {path}");
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[traced_test]
#[tokio::test(start_paused = true)]
async fn status_endpoint_tracks_a_live_run() {
    let (handle, task) = running_node().await;
    wait_for_height(&handle, 3).await;

    let status = get_json(&handle, "/api/v1/consensus/status").await;
    assert_eq!(status["status"], "running");
    assert_eq!(status["validators"].as_array().unwrap().len(), 4);
    assert_eq!(status["total_power"], "1000");
    assert_eq!(status["quorum_threshold"], "667");
    assert_eq!(status["equivocations"], 0);

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn metrics_and_phases_report_consistent_numbers() {
    let (handle, task) = running_node().await;
    wait_for_height(&handle, 5).await;

    let metrics = get_json(&handle, "/api/v1/consensus/metrics").await;
    let successful = metrics["successful_rounds"].as_u64().unwrap();
    assert!(successful >= 5);
    assert_eq!(metrics["failed_rounds"], 0);
    assert_eq!(metrics["voting_participation_rate"], 100.0);
    assert!(metrics["total_transactions"].as_u64().unwrap() >= 100);

    let phases = get_json(&handle, "/api/v1/consensus/phases").await;
    let names: Vec<&str> = phases["phases"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["phase"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        ["PROPOSE", "PREVOTE", "PRECOMMIT", "COMMIT", "FINALIZE"]
    );

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn blocks_and_finality_surface_the_chain() {
    let (handle, task) = running_node().await;
    wait_for_height(&handle, 8).await;

    let blocks = get_json(&handle, "/api/v1/consensus/blocks").await;
    let list = blocks["blocks"].as_array().unwrap();
    assert!(!list.is_empty());
    // Newest first, contiguous heights.
    let first = list[0]["height"].as_u64().unwrap();
    let second = list[1]["height"].as_u64().unwrap();
    assert_eq!(first, second + 1);
    assert!(list[0]["hash"].as_str().unwrap().starts_with("0x"));

    let finality = get_json(&handle, "/api/v1/finality/summary").await;
    assert!(finality["finalized"].as_u64().unwrap() >= 1);
    assert_eq!(finality["rejected"], 0);

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn health_endpoint_scores_a_clean_run() {
    let (handle, task) = running_node().await;
    wait_for_height(&handle, 3).await;

    let health = get_json(&handle, "/api/v1/consensus/health").await;
    assert_eq!(health["score"], 100);
    assert_eq!(health["band"], "healthy");
    assert_eq!(health["findings"].as_array().unwrap().len(), 0);

    let config = get_json(&handle, "/api/v1/consensus/config").await;
    assert_eq!(config["block_time_ms"], 100);
    assert_eq!(config["finality_depth"], 6);

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn server_serves_over_a_real_socket() {
    let (coordinator, handle) = Coordinator::new(
        ConsensusConfig::default(),
        committee(4),
        Arc::new(NodeCrypto),
        Box::new(HonestVoteSource),
    );
    let task = tokio::spawn(coordinator.run());

    let server = RpcServer::new(
        RpcServerConfig {
            listen_addr: "127.0.0.1:0".parse().unwrap(),
        },
        handle.rpc_state(),
    );
    let server_handle = server.start().await.unwrap();
    let addr = server_handle.local_addr();

    let body = http_get(addr, "/health").await;
    assert_eq!(body["status"], "ok");

    // Not producing yet: readiness is 503.
    let stream = tokio::net::TcpStream::connect(addr).await;
    assert!(stream.is_ok());

    handle.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    let ready = http_get(addr, "/ready").await;
    assert_eq!(ready["ready"], true);

    handle.shutdown().await.unwrap();
    task.await.unwrap();
    server_handle.abort();
}

/// Minimal GET over a raw TCP stream; avoids pulling an HTTP client in just
/// for two requests.
async fn http_get(addr: std::net::SocketAddr, path: &str) -> Value {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    let text = String::from_utf8(response).unwrap();
    let body = text.split("\r\n\r\n").nth(1).unwrap();
    serde_json::from_str(body.trim()).unwrap()
}
