// ABOUTME: Broadcast server configuration
// ABOUTME: Bind address and streaming cadence for the widget feed

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Default widget feed port.
pub const DEFAULT_PORT: u16 = 9450;

/// Broadcast server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Address to bind the listener to. Loopback only: the feed is meant for
    /// widgets on the same machine and is never exposed beyond localhost.
    pub bind_addr: SocketAddr,
    /// Interval between broadcast frames (~16 updates/second)
    pub tick_interval: Duration,
}

impl ServerConfig {
    /// Create a configuration with the defaults (127.0.0.1:9450, 60 ms ticks).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the port, keeping the loopback address. Port 0 binds ephemerally.
    pub fn port(mut self, port: u16) -> Self {
        self.bind_addr.set_port(port);
        self
    }

    /// Set the broadcast tick interval.
    pub fn tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), DEFAULT_PORT),
            tick_interval: Duration::from_millis(60),
        }
    }
}
