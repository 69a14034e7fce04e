// ABOUTME: Main library entry point for levelcast
// ABOUTME: Exports the band analyzer, capture engine, and WebSocket broadcast server

//! # levelcast
//!
//! Streaming audio level analysis for browser-based visual widgets.
//!
//! `levelcast` turns a live PCM stream into a small, continuously-updated
//! numeric summary — an overall loudness estimate plus a 12-band energy
//! spectrum — and republishes that summary over a minimal, hand-implemented
//! WebSocket connection on loopback. One widget at a time, text frames only,
//! best-effort delivery.
//!
//! ## Example: publishing levels
//!
//! ```no_run
//! use levelcast::analyzer::BandAnalyzer;
//! use levelcast::server::{ServerConfig, ServerRegistry};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let registry = ServerRegistry::new(ServerConfig::default());
//!     registry.ensure_started();
//!
//!     let analyzer = Arc::new(BandAnalyzer::new(48_000, registry.levels()));
//!
//!     // Host audio callback, on whatever thread the host owns:
//!     let samples = vec![0.0f32; 960];
//!     analyzer.process(&[&samples], samples.len());
//! }
//! ```

#![warn(missing_docs)]

/// Band-energy analysis and shared level state
pub mod analyzer;
/// Capture source abstraction and pull-based capture engine
pub mod capture;
/// WebSocket broadcast server and per-process registry
pub mod server;
/// Hand-implemented WebSocket handshake and frame encoding
pub mod ws;

pub use analyzer::{AnalysisConfig, BandAnalyzer, LevelState, SharedLevels};
pub use capture::{CaptureEngine, CaptureSource};
pub use server::{BroadcastServer, ServerConfig, ServerRegistry};

/// Result type for levelcast operations
pub type Result<T> = std::result::Result<T, error::Error>;

/// Error types for levelcast
pub mod error {
    use thiserror::Error;

    /// Error types for levelcast operations
    #[derive(Error, Debug)]
    pub enum Error {
        /// WebSocket upgrade handshake failure
        #[error("handshake error: {0}")]
        Handshake(String),

        /// Audio capture failure
        #[error("capture error: {0}")]
        Capture(String),

        /// Underlying socket I/O error
        #[error("I/O error: {0}")]
        Io(#[from] std::io::Error),
    }
}
