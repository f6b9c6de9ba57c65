//! Domain-specific error types for the streaming pipeline.
//!
//! All fallible operations return `Result<T, StreamError>`.
//! No panics on invalid input — every error is typed and recoverable.

use thiserror::Error;

/// The canonical error type for the viewcast pipeline.
#[derive(Debug, Error)]
pub enum StreamError {
    // ── Initialization Errors ────────────────────────────────────
    /// A required collaborator was never wired in. Fatal and permanent:
    /// the component disables itself for its lifetime.
    #[error("missing required collaborator: {0}")]
    MissingCollaborator(&'static str),

    /// A second streaming loop was started while one is still running.
    #[error("streaming loop already running")]
    AlreadyRunning,

    /// A lifecycle transition was requested from the wrong phase.
    #[error("invalid phase transition: {0}")]
    InvalidTransition(&'static str),

    // ── Codec Errors ─────────────────────────────────────────────
    /// Lossy image encoding failed.
    #[error("encode error: {0}")]
    Encode(String),

    /// Lossy image decoding failed; the frame is dropped, not retried.
    #[error("decode error: {0}")]
    Decode(String),

    /// Lossless compression of an encoded image failed.
    #[error("compress error: {0}")]
    Compress(String),

    /// Lossless decompression of an inbound packet failed.
    #[error("decompress error: {0}")]
    Decompress(String),

    /// An inbound payload carried no bytes at all.
    #[error("empty payload")]
    EmptyPayload,

    // ── Wire Errors ──────────────────────────────────────────────
    /// Serialization or deserialization of a wire packet failed.
    #[error("wire encoding error: {0}")]
    Wire(String),

    // ── Session Errors ───────────────────────────────────────────
    /// The session transport reported a delivery failure.
    #[error("session error: {0}")]
    Session(String),

    /// A channel to or from the session was closed unexpectedly.
    #[error("channel closed")]
    ChannelClosed,
}

// ── Convenient From implementations ──────────────────────────────

impl From<Box<bincode::ErrorKind>> for StreamError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        StreamError::Wire(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let e = StreamError::MissingCollaborator("render source");
        assert!(e.to_string().contains("render source"));

        let e = StreamError::EmptyPayload;
        assert!(e.to_string().contains("empty"));
    }

    #[test]
    fn from_bincode() {
        let bad: Result<u64, _> = bincode::deserialize(&[0x01]);
        let e: StreamError = bad.unwrap_err().into();
        assert!(matches!(e, StreamError::Wire(_)));
    }
}
