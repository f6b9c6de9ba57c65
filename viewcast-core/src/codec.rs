//! Lossy frame codec.
//!
//! [`FrameEncoder`] turns a raw [`Frame`] into JPEG bytes at the
//! configured quality; [`FrameDecoder`] reverses it into the receiver's
//! configured pixel layout. Quality only trades fidelity for payload
//! size — dimensions always survive the round trip.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{ImageBuffer, RgbImage};

use crate::error::StreamError;
use crate::frame::{Frame, PixelFormat};

// ── FrameEncoder ─────────────────────────────────────────────────

/// JPEG encoder at a fixed quality level.
#[derive(Debug, Clone, Copy)]
pub struct FrameEncoder {
    quality: u8,
}

impl FrameEncoder {
    /// Create an encoder. Quality is clamped to 0..=100.
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.min(100),
        }
    }

    /// Configured quality level.
    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Encode a frame to JPEG bytes.
    pub fn encode(&self, frame: &Frame) -> Result<Vec<u8>, StreamError> {
        let rgb = frame.to_rgb8();
        let img: RgbImage = ImageBuffer::from_raw(frame.width, frame.height, rgb)
            .ok_or_else(|| StreamError::Encode("pixel buffer does not match dimensions".into()))?;

        let mut out = Cursor::new(Vec::new());
        // The jpeg encoder floors quality at 1.
        let encoder = JpegEncoder::new_with_quality(&mut out, self.quality.max(1));
        img.write_with_encoder(encoder)
            .map_err(|e| StreamError::Encode(format!("jpeg encode failed: {e}")))?;

        Ok(out.into_inner())
    }
}

// ── FrameDecoder ─────────────────────────────────────────────────

/// JPEG decoder producing frames in a fixed pixel layout.
#[derive(Debug, Clone, Copy)]
pub struct FrameDecoder {
    format: PixelFormat,
}

impl FrameDecoder {
    /// Create a decoder targeting `format`.
    pub fn new(format: PixelFormat) -> Self {
        Self { format }
    }

    /// Decode JPEG bytes into a frame.
    ///
    /// Empty or malformed input yields an error; the caller drops the
    /// frame and moves on to the next packet.
    pub fn decode(&self, bytes: &[u8]) -> Result<Frame, StreamError> {
        if bytes.is_empty() {
            return Err(StreamError::EmptyPayload);
        }

        let img = image::load_from_memory_with_format(bytes, image::ImageFormat::Jpeg)
            .map_err(|e| StreamError::Decode(format!("jpeg decode failed: {e}")))?;
        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();

        Ok(Frame::from_rgb8(rgb.as_raw(), width, height, self.format))
    }
}

// ── Tests ────────────────────────────────────────────────────────
