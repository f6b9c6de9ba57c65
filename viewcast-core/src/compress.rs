//! Lossless wire compression.
//!
//! Encoded images are zstd-compressed before they go on the wire. The
//! sender side runs at a fixed cadence, so [`StreamCompressor`] keeps
//! one scratch buffer and resets it before each use instead of
//! allocating per tick. The returned slice borrows that scratch: the
//! caller must consume it before the next `compress`, which is exactly
//! the single-loop discipline the sender runs under.
//!
//! Decompression operates on a freshly received packet each time and
//! needs no shared state.

use crate::error::StreamError;

/// Fixed zstd level; the quality knob lives in the lossy stage.
pub const ZSTD_LEVEL: i32 = 3;

/// Zstd compressor with a reusable scratch buffer.
#[derive(Debug)]
pub struct StreamCompressor {
    scratch: Vec<u8>,
    level: i32,
}

impl StreamCompressor {
    /// Create a compressor at the default level.
    pub fn new() -> Self {
        Self::with_level(ZSTD_LEVEL)
    }

    /// Create a compressor at an explicit zstd level.
    pub fn with_level(level: i32) -> Self {
        Self {
            scratch: Vec::new(),
            level,
        }
    }

    /// Compress `input` into the scratch buffer and return it.
    pub fn compress(&mut self, input: &[u8]) -> Result<&[u8], StreamError> {
        self.scratch.clear();
        zstd::stream::copy_encode(input, &mut self.scratch, self.level)
            .map_err(|e| StreamError::Compress(format!("zstd encode failed: {e}")))?;
        Ok(&self.scratch)
    }

    /// Decompress one inbound packet.
    pub fn decompress(input: &[u8]) -> Result<Vec<u8>, StreamError> {
        if input.is_empty() {
            return Err(StreamError::EmptyPayload);
        }
        zstd::decode_all(input)
            .map_err(|e| StreamError::Decompress(format!("zstd decode failed: {e}")))
    }
}

impl Default for StreamCompressor {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let mut comp = StreamCompressor::new();
        let input: Vec<u8> = (0..10_000).map(|i| (i % 251) as u8).collect();

        let wire = comp.compress(&input).unwrap().to_vec();
        assert!(!wire.is_empty());

        let back = StreamCompressor::decompress(&wire).unwrap();
        assert_eq!(back, input);
    }

    #[test]
    fn repetitive_input_shrinks() {
        let mut comp = StreamCompressor::new();
        let input = vec![0xABu8; 50_000];
        let wire = comp.compress(&input).unwrap();
        assert!(wire.len() < input.len());
    }

    #[test]
    fn scratch_resets_between_ticks() {
        let mut comp = StreamCompressor::new();

        let big = comp.compress(&vec![1u8; 20_000]).unwrap().to_vec();
        let small = comp.compress(b"tiny").unwrap().to_vec();

        // A stale scratch would leak the first payload into the second.
        assert_ne!(big, small);
        assert_eq!(StreamCompressor::decompress(&small).unwrap(), b"tiny");
    }

    #[test]
    fn explicit_level_roundtrips() {
        let mut comp = StreamCompressor::with_level(1);
        let input = b"fast level still decodes".repeat(100);
        let wire = comp.compress(&input).unwrap().to_vec();
        assert_eq!(StreamCompressor::decompress(&wire).unwrap(), input);
    }

    #[test]
    fn empty_input_rejected() {
        let err = StreamCompressor::decompress(&[]).unwrap_err();
        assert!(matches!(err, StreamError::EmptyPayload));
    }

    #[test]
    fn garbage_input_rejected() {
        let err = StreamCompressor::decompress(&[0xDE, 0xAD, 0xBE, 0xEF]).unwrap_err();
        assert!(matches!(err, StreamError::Decompress(_)));
    }
}
