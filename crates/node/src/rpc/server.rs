//! RPC server implementation.

use super::routes::create_router;
use super::state::RpcState;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Errors from the RPC server.
#[derive(Debug, Error)]
pub enum RpcServerError {
    #[error("failed to bind to address: {0}")]
    Bind(#[from] std::io::Error),
}

/// Configuration for the RPC server.
#[derive(Debug, Clone)]
pub struct RpcServerConfig {
    /// Address to listen on.
    pub listen_addr: SocketAddr,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        RpcServerConfig {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }
}

/// Handle for controlling a running RPC server.
pub struct RpcServerHandle {
    task: JoinHandle<()>,
    ready_flag: Arc<AtomicBool>,
    local_addr: SocketAddr,
}

impl RpcServerHandle {
    /// Mark the node as ready (for the readiness probe).
    pub fn set_ready(&self, ready: bool) {
        self.ready_flag.store(ready, Ordering::SeqCst);
    }

    /// The address the server actually bound, useful with port 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Abort the server.
    pub fn abort(&self) {
        self.task.abort();
    }

    /// Wait for the server to finish.
    pub async fn join(self) -> Result<(), tokio::task::JoinError> {
        self.task.await
    }
}

/// Read-only RPC server for the node.
pub struct RpcServer {
    config: RpcServerConfig,
    state: RpcState,
}

impl RpcServer {
    /// Create a server over shared state the coordinator publishes into.
    pub fn new(config: RpcServerConfig, state: RpcState) -> Self {
        RpcServer { config, state }
    }

    /// Bind and start serving; returns a handle for control.
    pub async fn start(self) -> Result<RpcServerHandle, RpcServerError> {
        let ready_flag = self.state.ready.clone();
        let router = create_router(self.state);

        let listener = tokio::net::TcpListener::bind(self.config.listen_addr).await?;
        let local_addr = listener.local_addr()?;
        info!(addr = %local_addr, "RPC server listening");

        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                error!(error = ?e, "RPC server error");
            }
        });

        Ok(RpcServerHandle {
            task,
            ready_flag,
            local_addr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_listens_on_8080() {
        assert_eq!(RpcServerConfig::default().listen_addr.port(), 8080);
    }

    #[tokio::test]
    async fn server_binds_an_ephemeral_port() {
        let config = RpcServerConfig {
            listen_addr: "127.0.0.1:0".parse().unwrap(),
        };
        let handle = RpcServer::new(config, RpcState::new()).start().await.unwrap();
        assert_ne!(handle.local_addr().port(), 0);
        handle.abort();
    }
}
