// ABOUTME: Minimal WebSocket support for the widget feed
// ABOUTME: Hand-implemented handshake and frame encoding, server-to-client only

/// Text frame encoding and the wire payload
pub mod frame;
/// Opening handshake: header parsing, accept key, 101 response
pub mod handshake;
