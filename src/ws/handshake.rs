// ABOUTME: WebSocket opening handshake, server side
// ABOUTME: Header parsing, accept-key derivation, and the 101 upgrade response

use crate::error::Error;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use sha1::{Digest, Sha1};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Fixed GUID appended to the client key before hashing (RFC 6455, section 1.3).
const WEBSOCKET_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Header name is matched case-sensitively, as sent by every browser.
const KEY_HEADER: &str = "Sec-WebSocket-Key:";

/// Read request header lines until the blank line and return the value of the
/// `Sec-WebSocket-Key` header.
///
/// Lines may be CRLF- or LF-terminated. Anything that is not the key header
/// is ignored: this is a minimal handshake reader, not a full HTTP parser.
/// Missing key before the blank line is a handshake error.
pub async fn read_client_key<R>(reader: &mut R) -> crate::Result<String>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    let mut key = None;

    loop {
        line.clear();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            return Err(Error::Handshake(
                "connection closed during handshake".to_string(),
            ));
        }
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.is_empty() {
            break; // headers end
        }
        if let Some(value) = header_value(trimmed) {
            key = Some(value.to_string());
        }
    }

    key.ok_or_else(|| Error::Handshake("missing Sec-WebSocket-Key header".to_string()))
}

/// Extract the key value if `line` is the `Sec-WebSocket-Key` header,
/// trimming horizontal whitespace around the value.
fn header_value(line: &str) -> Option<&str> {
    line.strip_prefix(KEY_HEADER)
        .map(|rest| rest.trim_matches([' ', '\t']))
}

/// Derive the `Sec-WebSocket-Accept` value for a client key
/// (RFC 6455, section 4.2.2): base64 of SHA-1 over key + GUID.
pub fn accept_key(client_key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(client_key.as_bytes());
    hasher.update(WEBSOCKET_GUID.as_bytes());
    BASE64.encode(hasher.finalize())
}

/// Build the 101 Switching Protocols response completing the upgrade.
pub fn upgrade_response(accept_key: &str) -> String {
    format!(
        "HTTP/1.1 101 Switching Protocols\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Accept: {accept_key}\r\n\r\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc6455_accept_key_vector() {
        // Worked example from RFC 6455 section 1.3; exact byte match required
        assert_eq!(
            accept_key("dGhlIHNhbXBsZSBub25jZQ=="),
            "s3pPLMBiTxaQ9kYGzzhZRbK+xOo="
        );
    }

    #[test]
    fn test_upgrade_response_format() {
        let response = upgrade_response("s3pPLMBiTxaQ9kYGzzhZRbK+xOo=");
        assert!(response.starts_with("HTTP/1.1 101 Switching Protocols\r\n"));
        assert!(response.contains("Upgrade: websocket\r\n"));
        assert!(response.contains("Connection: Upgrade\r\n"));
        assert!(response.contains("Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=\r\n"));
        assert!(response.ends_with("\r\n\r\n"));
    }

    #[tokio::test]
    async fn test_read_key_from_crlf_request() {
        let request = b"GET /feed HTTP/1.1\r\n\
            Host: 127.0.0.1:9450\r\n\
            Upgrade: websocket\r\n\
            Sec-WebSocket-Key:  dGhlIHNhbXBsZSBub25jZQ== \r\n\
            Sec-WebSocket-Version: 13\r\n\
            \r\n";
        let mut reader = &request[..];
        let key = read_client_key(&mut reader).await.unwrap();
        assert_eq!(key, "dGhlIHNhbXBsZSBub25jZQ==");
    }

    #[tokio::test]
    async fn test_read_key_accepts_bare_lf_lines() {
        let request = b"GET / HTTP/1.1\nSec-WebSocket-Key: abc123\n\n";
        let mut reader = &request[..];
        let key = read_client_key(&mut reader).await.unwrap();
        assert_eq!(key, "abc123");
    }

    #[tokio::test]
    async fn test_missing_key_is_an_error() {
        let request = b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n";
        let mut reader = &request[..];
        let err = read_client_key(&mut reader).await.unwrap_err();
        assert!(err.to_string().contains("missing Sec-WebSocket-Key"));
    }

    #[tokio::test]
    async fn test_truncated_request_is_an_error() {
        let request = b"GET / HTTP/1.1\r\nSec-WebSocket-Key: abc\r\n";
        let mut reader = &request[..];
        // stream ends before the blank line
        assert!(read_client_key(&mut reader).await.is_err());
    }

    #[tokio::test]
    async fn test_malformed_lines_are_ignored() {
        let request = b"garbage without colon\r\n\
            :: weird ::\r\n\
            Sec-WebSocket-Key: thekey\r\n\
            \r\n";
        let mut reader = &request[..];
        let key = read_client_key(&mut reader).await.unwrap();
        assert_eq!(key, "thekey");
    }
}
