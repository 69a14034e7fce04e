// ABOUTME: Widget feed server module
// ABOUTME: Broadcast loop, configuration, and the per-process registry

mod broadcast;
mod config;
mod registry;

pub use broadcast::{BroadcastServer, ServerHandle};
pub use config::{ServerConfig, DEFAULT_PORT};
pub use registry::ServerRegistry;
