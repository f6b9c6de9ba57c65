//! Frame capture from a render source.
//!
//! [`RenderSource`] is the seam to whatever produces pixels — a real
//! render target in a host application, a synthetic pattern in tests
//! and the demo. [`FrameCapturer`] owns the pool and the derived
//! capture dimensions, and copies the source's current contents into a
//! pooled buffer once per tick.

use crate::config::StreamConfig;
use crate::error::StreamError;
use crate::frame::{Frame, PixelFormat};
use crate::pool::{FramePool, PooledFrame};

// ── RenderSource ─────────────────────────────────────────────────

/// Something that can be sampled into a frame.
///
/// `read_into` must fill the frame at the frame's own dimensions and
/// format; the capturer decides both.
pub trait RenderSource: Send {
    /// Copy the target's current contents into `frame`.
    fn read_into(&mut self, frame: &mut Frame) -> Result<(), StreamError>;
}

// ── FrameCapturer ────────────────────────────────────────────────

/// Samples a render source into pooled buffers at fixed dimensions.
pub struct FrameCapturer {
    pool: FramePool,
    width: u32,
    height: u32,
    format: PixelFormat,
}

impl FrameCapturer {
    /// Create a capturer; dimensions derive from the config's height at
    /// 16:9.
    pub fn new(config: &StreamConfig) -> Self {
        Self {
            pool: FramePool::new(config.pooling),
            width: config.target_width(),
            height: config.target_height(),
            format: config.pixel_format,
        }
    }

    /// Capture width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Capture height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Configured pixel layout.
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Sample the source into a pooled buffer.
    pub fn capture(&mut self, source: &mut dyn RenderSource) -> Result<PooledFrame, StreamError> {
        let mut pooled = self.pool.acquire(self.width, self.height, self.format);
        source.read_into(pooled.frame_mut())?;
        Ok(pooled)
    }

    /// Return a capture buffer to the pool.
    pub fn release(&mut self, frame: PooledFrame) {
        self.pool.release(frame);
    }

    /// Free idle pool buffers past their grace period.
    pub fn evict_idle(&mut self) -> usize {
        self.pool.evict_idle()
    }

    /// Destroy all cached buffers (teardown).
    pub fn clear(&mut self) {
        self.pool.clear();
    }

    /// The underlying pool.
    pub fn pool(&self) -> &FramePool {
        &self.pool
    }
}

// ── GradientSource ───────────────────────────────────────────────

/// Synthetic render target: a smooth diagonal gradient that drifts one
/// step per sample, so consecutive captures differ like a live scene.
#[derive(Debug, Default)]
pub struct GradientSource {
    phase: u32,
}

impl GradientSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RenderSource for GradientSource {
    fn read_into(&mut self, frame: &mut Frame) -> Result<(), StreamError> {
        let (width, height) = (frame.width, frame.height);
        let mut rgb = Vec::with_capacity((width * height * 3) as usize);

        for y in 0..height {
            for x in 0..width {
                let xs = x.wrapping_add(self.phase) % width.max(1);
                rgb.push((xs * 255 / width.max(1)) as u8);
                rgb.push((y * 255 / height.max(1)) as u8);
                rgb.push(((x + y) * 255 / (width + height).max(1)) as u8);
            }
        }

        frame.fill_from_rgb8(&rgb);
        self.phase = self.phase.wrapping_add(1);
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_dimensions_derive_from_height() {
        let config = StreamConfig::new().with_desired_height(500);
        let capturer = FrameCapturer::new(&config);
        assert_eq!(capturer.width(), 888);
        assert_eq!(capturer.height(), 500);
    }

    #[test]
    fn capture_fills_a_pooled_buffer() {
        let config = StreamConfig::new().with_desired_height(36).with_pooling(true);
        let mut capturer = FrameCapturer::new(&config);
        let mut source = GradientSource::new();

        let frame = capturer.capture(&mut source).unwrap();
        assert_eq!(frame.frame().width, 64);
        assert_eq!(frame.frame().height, 36);
        assert!(frame.frame().data.iter().any(|&b| b != 0));

        let id = frame.id();
        capturer.release(frame);

        // Same shape next tick → same buffer back.
        let frame = capturer.capture(&mut source).unwrap();
        assert_eq!(frame.id(), id);
    }

    #[test]
    fn consecutive_captures_differ() {
        let config = StreamConfig::new().with_desired_height(36);
        let mut capturer = FrameCapturer::new(&config);
        let mut source = GradientSource::new();

        let a = capturer.capture(&mut source).unwrap().into_frame();
        let b = capturer.capture(&mut source).unwrap().into_frame();
        assert_ne!(a.data, b.data);
    }
}
