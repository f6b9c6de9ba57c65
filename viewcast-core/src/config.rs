//! Streaming configuration.
//!
//! All options are set once before the pipeline starts; nothing here is
//! hot-reloadable mid-session.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::frame::PixelFormat;

// ── FrameRatePreset ──────────────────────────────────────────────

/// The eight discrete capture cadences the sender can run at.
///
/// Each preset maps to a per-tick wait interval of exactly `1/fps`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FrameRatePreset {
    Fps1,
    Fps5,
    #[default]
    Fps10,
    Fps15,
    Fps20,
    Fps24,
    Fps30,
    Fps60,
}

impl FrameRatePreset {
    /// Every preset, in ascending order.
    pub const ALL: [FrameRatePreset; 8] = [
        FrameRatePreset::Fps1,
        FrameRatePreset::Fps5,
        FrameRatePreset::Fps10,
        FrameRatePreset::Fps15,
        FrameRatePreset::Fps20,
        FrameRatePreset::Fps24,
        FrameRatePreset::Fps30,
        FrameRatePreset::Fps60,
    ];

    /// Frames per second this preset targets.
    pub const fn fps(self) -> u32 {
        match self {
            FrameRatePreset::Fps1 => 1,
            FrameRatePreset::Fps5 => 5,
            FrameRatePreset::Fps10 => 10,
            FrameRatePreset::Fps15 => 15,
            FrameRatePreset::Fps20 => 20,
            FrameRatePreset::Fps24 => 24,
            FrameRatePreset::Fps30 => 30,
            FrameRatePreset::Fps60 => 60,
        }
    }

    /// Per-tick wait interval: `1/fps`.
    pub fn interval(self) -> Duration {
        Duration::from_secs(1) / self.fps()
    }
}

impl std::fmt::Display for FrameRatePreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} fps", self.fps())
    }
}

// ── StreamConfig ─────────────────────────────────────────────────

/// Configuration for one streaming pipeline (sender or receiver side).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Capture height in pixels; the width derives from it at 16:9.
    pub desired_height: u32,

    /// Lossy encode quality (0-100, larger = higher fidelity).
    pub quality: u8,

    /// Capture cadence.
    pub frame_rate: FrameRatePreset,

    /// Raw pixel layout; must match between peers.
    pub pixel_format: PixelFormat,

    /// Whether capture buffers are pooled and reused across ticks.
    pub pooling: bool,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            desired_height: 500,
            quality: 35,
            frame_rate: FrameRatePreset::default(),
            pixel_format: PixelFormat::default(),
            pooling: false,
        }
    }
}

impl StreamConfig {
    /// Create a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the capture height.
    pub fn with_desired_height(mut self, height: u32) -> Self {
        self.desired_height = height.max(1);
        self
    }

    /// Set the lossy encode quality.
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.min(100);
        self
    }

    /// Set the capture cadence.
    pub fn with_frame_rate(mut self, preset: FrameRatePreset) -> Self {
        self.frame_rate = preset;
        self
    }

    /// Set the raw pixel layout.
    pub fn with_pixel_format(mut self, format: PixelFormat) -> Self {
        self.pixel_format = format;
        self
    }

    /// Enable or disable buffer pooling.
    pub fn with_pooling(mut self, pooling: bool) -> Self {
        self.pooling = pooling;
        self
    }

    /// Capture width derived from the configured height at 16:9.
    ///
    /// Integer truncation, so 500 → 888.
    pub fn target_width(&self) -> u32 {
        self.desired_height * 16 / 9
    }

    /// Capture height.
    pub fn target_height(&self) -> u32 {
        self.desired_height
    }
}

// ── Tests ────────────────────────────────────────────────────────
