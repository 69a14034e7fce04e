// ABOUTME: Single-connection WebSocket broadcast server
// ABOUTME: Accepts one widget at a time and streams level frames at a fixed cadence

use crate::analyzer::SharedLevels;
use crate::server::config::ServerConfig;
use crate::ws::frame::{encode_text_frame, BarsPayload};
use crate::ws::handshake;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};

/// Single-connection WebSocket broadcast server for the widget feed.
///
/// Lifecycle per connection: accepted, handshaking, streaming, closed. Only
/// one widget is served at a time; a second connection attempt is accepted
/// only after the first disconnects. Frames are built fresh from the current
/// level snapshot on every tick and discarded on send failure, never queued.
pub struct BroadcastServer {
    config: ServerConfig,
    levels: Arc<SharedLevels>,
}

/// Handle to a running broadcast server.
pub struct ServerHandle {
    shutdown: watch::Sender<bool>,
    addr_rx: watch::Receiver<Option<SocketAddr>>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl ServerHandle {
    /// Wait until the listener is bound and return its address.
    ///
    /// Returns None if the loop exited before binding (degraded mode after a
    /// bind failure).
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        wait_for_addr(self.addr_rx.clone()).await
    }

    /// Receiver for the bound listener address (None until bound).
    pub(crate) fn addr_receiver(&self) -> watch::Receiver<Option<SocketAddr>> {
        self.addr_rx.clone()
    }

    /// Signal the loop to exit and wait for it to finish. Idempotent.
    pub async fn stop(&mut self) {
        let _ = self.shutdown.send(true);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

/// Resolve the bound address out of the handle's watch channel.
pub(crate) async fn wait_for_addr(
    mut rx: watch::Receiver<Option<SocketAddr>>,
) -> Option<SocketAddr> {
    loop {
        if let Some(addr) = *rx.borrow() {
            return Some(addr);
        }
        if rx.changed().await.is_err() {
            // Loop exited; report whatever was published
            return *rx.borrow();
        }
    }
}

impl BroadcastServer {
    /// Create a server that snapshots `levels` on every broadcast tick.
    pub fn new(config: ServerConfig, levels: Arc<SharedLevels>) -> Self {
        Self { config, levels }
    }

    /// Spawn the server loop and return a handle immediately.
    ///
    /// Binding happens inside the loop: a bind failure is logged and the loop
    /// exits early, leaving the process without a widget feed until restart.
    /// Client errors of any kind never stop the server.
    pub fn start(self) -> ServerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (addr_tx, addr_rx) = watch::channel(None);

        let task = tokio::spawn(async move {
            self.run(shutdown_rx, addr_tx).await;
        });

        ServerHandle {
            shutdown: shutdown_tx,
            addr_rx,
            task: Some(task),
        }
    }

    /// Accept loop: one connection at a time, back to listening on any
    /// client failure.
    async fn run(
        self,
        mut shutdown: watch::Receiver<bool>,
        addr_tx: watch::Sender<Option<SocketAddr>>,
    ) {
        let listener = match TcpListener::bind(self.config.bind_addr).await {
            Ok(listener) => listener,
            Err(e) => {
                log::error!(
                    "Failed to bind widget feed on {}: {}",
                    self.config.bind_addr,
                    e
                );
                return;
            }
        };

        let local_addr = listener.local_addr().ok();
        if let Some(addr) = local_addr {
            log::info!("Widget feed listening on ws://{}", addr);
        }
        let _ = addr_tx.send(local_addr);

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            log::info!("Widget connection from {}", peer);
                            self.serve_client(stream, &mut shutdown).await;
                            log::info!("Widget connection closed");
                        }
                        Err(e) => {
                            log::warn!("accept() failed: {}", e);
                        }
                    }
                    if *shutdown.borrow() {
                        break;
                    }
                }
                changed = shutdown.changed() => {
                    // A closed channel means the handle is gone; stop either way
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        log::info!("Widget feed stopped");
    }

    /// Handshake and stream to a single widget until it drops or stop is
    /// requested.
    async fn serve_client(&self, stream: TcpStream, shutdown: &mut watch::Receiver<bool>) {
        let mut stream = BufReader::new(stream);

        let key = match handshake::read_client_key(&mut stream).await {
            Ok(key) => key,
            Err(e) => {
                log::warn!("Handshake failed: {}", e);
                return;
            }
        };

        let accept = handshake::accept_key(&key);
        let response = handshake::upgrade_response(&accept);
        if let Err(e) = stream.get_mut().write_all(response.as_bytes()).await {
            log::warn!("Failed to send upgrade response: {}", e);
            return;
        }
        log::debug!("Handshake complete, streaming levels");

        let mut ticker = interval(self.config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let payload = BarsPayload::from(&self.levels.snapshot());
                    let json = match serde_json::to_string(&payload) {
                        Ok(json) => json,
                        Err(e) => {
                            log::error!("Failed to serialize level payload: {}", e);
                            return;
                        }
                    };
                    let frame = encode_text_frame(json.as_bytes());
                    if let Err(e) = stream.get_mut().write_all(&frame).await {
                        log::info!("Widget write failed, closing: {}", e);
                        return;
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        return;
                    }
                }
            }
        }
    }
}
