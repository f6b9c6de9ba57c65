//! Wire packet for the frame stream.
//!
//! One outbound message type crosses the network: a [`FramePacket`]
//! tagged with [`STREAM_EVENT`], whose payload is
//! `compress(encode(frame))`. No resolution or pixel-format metadata is
//! carried — peers agree on those out of band. The sequence number lets
//! receivers discard stale frames when the transport reorders delivery.

use serde::{Deserialize, Serialize};

use crate::error::StreamError;

/// Event tag identifying frame-stream messages on the transport.
pub const STREAM_EVENT: u8 = 1;

/// One frame on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FramePacket {
    /// Monotonically increasing per-sender frame identifier.
    pub sequence: u64,

    /// Capture timestamp in microseconds since the stream started.
    pub timestamp_us: u64,

    /// Compressed encoded image bytes.
    pub payload: Vec<u8>,
}

impl FramePacket {
    /// Assemble a packet.
    pub fn new(sequence: u64, timestamp_us: u64, payload: Vec<u8>) -> Self {
        Self {
            sequence,
            timestamp_us,
            payload,
        }
    }

    /// Serialize to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, StreamError> {
        bincode::serialize(self).map_err(|e| StreamError::Wire(e.to_string()))
    }

    /// Deserialize from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StreamError> {
        bincode::deserialize(bytes).map_err(|e| StreamError::Wire(e.to_string()))
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packet_roundtrip() {
        let packet = FramePacket::new(42, 1_000_000, vec![0xAB; 64]);
        let bytes = packet.to_bytes().unwrap();
        let decoded = FramePacket::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn truncated_bytes_rejected() {
        let packet = FramePacket::new(1, 2, vec![3; 32]);
        let bytes = packet.to_bytes().unwrap();
        let err = FramePacket::from_bytes(&bytes[..bytes.len() / 2]).unwrap_err();
        assert!(matches!(err, StreamError::Wire(_)));
    }
}
