// ABOUTME: WebSocket text frame encoding, unmasked server-to-client
// ABOUTME: Serializes the 12-band payload sent on every broadcast tick

use crate::analyzer::{LevelState, BAND_COUNT};
use serde::Serialize;

/// FIN=1, opcode=1 (text)
const TEXT_FRAME_HEADER: u8 = 0x81;

/// Wire payload for one broadcast tick: `{"bars":[v0,...,v11]}`.
///
/// The aggregate level is intentionally absent: only the 12 band levels go on
/// the wire.
#[derive(Debug, Clone, Serialize)]
pub struct BarsPayload {
    /// Clamped band levels, low frequency first
    pub bars: [f32; BAND_COUNT],
}

impl From<&LevelState> for BarsPayload {
    fn from(state: &LevelState) -> Self {
        Self {
            bars: state.bands.map(|v| v.clamp(0.0, 1.0)),
        }
    }
}

/// Encode a UTF-8 payload as a single unmasked, unfragmented text frame.
///
/// Server-to-client frames are never masked per RFC 6455. Length uses the
/// 7-bit form below 126 bytes, the 16-bit form up to 65535, and the 64-bit
/// form beyond that.
pub fn encode_text_frame(payload: &[u8]) -> Vec<u8> {
    let len = payload.len();
    let mut frame = Vec::with_capacity(len + 10);
    frame.push(TEXT_FRAME_HEADER);

    if len < 126 {
        frame.push(len as u8);
    } else if len <= u16::MAX as usize {
        frame.push(126);
        frame.extend_from_slice(&(len as u16).to_be_bytes());
    } else {
        frame.push(127);
        frame.extend_from_slice(&(len as u64).to_be_bytes());
    }

    frame.extend_from_slice(payload);
    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_payload_single_length_byte() {
        let frame = encode_text_frame(&[b'x'; 10]);
        assert_eq!(frame[0], 0x81);
        assert_eq!(frame[1], 10);
        assert_eq!(frame.len(), 2 + 10);
    }

    #[test]
    fn test_medium_payload_u16_length() {
        let frame = encode_text_frame(&[b'x'; 200]);
        assert_eq!(frame[0], 0x81);
        assert_eq!(frame[1], 126);
        assert_eq!(u16::from_be_bytes([frame[2], frame[3]]), 200);
        assert_eq!(frame.len(), 4 + 200);
    }

    #[test]
    fn test_large_payload_u64_length() {
        let frame = encode_text_frame(&[b'x'; 70_000]);
        assert_eq!(frame[0], 0x81);
        assert_eq!(frame[1], 127);
        let mut be = [0u8; 8];
        be.copy_from_slice(&frame[2..10]);
        assert_eq!(u64::from_be_bytes(be), 70_000);
        assert_eq!(frame.len(), 10 + 70_000);
    }

    #[test]
    fn test_mask_bit_never_set() {
        for size in [0, 10, 200, 70_000] {
            let frame = encode_text_frame(&vec![b'x'; size]);
            assert_eq!(frame[1] & 0x80, 0, "mask bit set for {size}-byte payload");
        }
    }

    #[test]
    fn test_payload_has_twelve_clamped_entries() {
        let mut state = LevelState::default();
        state.bands[0] = -0.5;
        state.bands[11] = 1.5;
        state.bands[5] = 0.25;

        let payload = BarsPayload::from(&state);
        assert_eq!(payload.bars.len(), 12);
        assert_eq!(payload.bars[0], 0.0);
        assert_eq!(payload.bars[11], 1.0);

        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.starts_with("{\"bars\":["));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["bars"].as_array().unwrap().len(), 12);
    }
}
