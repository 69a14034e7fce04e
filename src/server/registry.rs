// ABOUTME: Per-process server registry
// ABOUTME: Owns the shared levels and starts the broadcast server once on first use

use crate::analyzer::SharedLevels;
use crate::server::broadcast::{wait_for_addr, BroadcastServer, ServerHandle};
use crate::server::config::ServerConfig;
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;

/// Explicit per-process registry for the widget feed.
///
/// Constructed once at process start and passed by reference to whatever
/// publishes levels. Preserves one-server-per-process semantics without a
/// hidden global: the broadcast server is started on first use and stopped
/// exactly once.
pub struct ServerRegistry {
    config: ServerConfig,
    levels: Arc<SharedLevels>,
    server: Mutex<Option<ServerHandle>>,
}

impl ServerRegistry {
    /// Create a registry; the server is not started yet.
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            levels: Arc::new(SharedLevels::new()),
            server: Mutex::new(None),
        }
    }

    /// Shared level state the analyzer writes into.
    pub fn levels(&self) -> Arc<SharedLevels> {
        Arc::clone(&self.levels)
    }

    /// Start the broadcast server if it is not already running. Idempotent.
    pub fn ensure_started(&self) {
        let mut server = self.server.lock();
        if server.is_none() {
            let broadcast = BroadcastServer::new(self.config.clone(), Arc::clone(&self.levels));
            *server = Some(broadcast.start());
        }
    }

    /// Wait for the feed's bound address.
    ///
    /// None if the server was never started or exited on a bind failure.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        let rx = self.server.lock().as_ref().map(|h| h.addr_receiver());
        match rx {
            Some(rx) => wait_for_addr(rx).await,
            None => None,
        }
    }

    /// Stop the server if it is running. Idempotent.
    pub async fn shutdown(&self) {
        let handle = self.server.lock().take();
        if let Some(mut handle) = handle {
            handle.stop().await;
        }
    }
}
