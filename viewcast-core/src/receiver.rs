//! Receiver-side pipeline: dispatch, decode, apply.
//!
//! Inbound events are filtered by tag, counted, decompressed, decoded,
//! and the resulting frame is published through a `watch` channel so a
//! presentation layer can always read the latest image without blocking
//! the receive loop. A malformed or stale packet is logged and dropped;
//! the pipeline keeps accepting whatever arrives next.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::codec::FrameDecoder;
use crate::compress::StreamCompressor;
use crate::config::StreamConfig;
use crate::error::StreamError;
use crate::frame::Frame;
use crate::monitor::RateMonitor;
use crate::session::StreamSession;
use crate::wire::{FramePacket, STREAM_EVENT};

// ── Constants ────────────────────────────────────────────────────

/// Initial presentation buffer width, before the first frame arrives.
pub const RECEIVE_WIDTH: u32 = 756;

/// Initial presentation buffer height.
pub const RECEIVE_HEIGHT: u32 = 425;

/// Cadence at which the rate-monitor clock advances.
const MONITOR_TICK: Duration = Duration::from_millis(100);

// ── ReceiverStats ────────────────────────────────────────────────

/// Live statistics exposed to the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceiverStats {
    /// Most recently published packets-per-second.
    pub packets_per_second: u32,
    /// Total packets accepted since start (including dropped ones).
    pub total_packets: u64,
    /// Total wire bytes received.
    pub total_bytes: u64,
    /// Dimensions of the last applied frame.
    pub width: u32,
    pub height: u32,
}

// ── FrameReceiver ────────────────────────────────────────────────

/// Receives the frame stream and publishes the latest decoded image.
pub struct FrameReceiver {
    decoder: FrameDecoder,
    monitor: RateMonitor,
    last_sequence: Option<u64>,
    cancel: CancellationToken,
    frame_tx: watch::Sender<Frame>,
    frame_rx: watch::Receiver<Frame>,
    stats_tx: watch::Sender<ReceiverStats>,
    stats_rx: watch::Receiver<ReceiverStats>,
    stats: ReceiverStats,
    applied: u64,
}

impl FrameReceiver {
    /// Create a receiver; the initial presentation buffer uses the
    /// fixed receive resolution until the first frame replaces it.
    pub fn new(config: &StreamConfig) -> Self {
        let initial = Frame::new(RECEIVE_WIDTH, RECEIVE_HEIGHT, config.pixel_format);
        let (frame_tx, frame_rx) = watch::channel(initial);
        let (stats_tx, stats_rx) = watch::channel(ReceiverStats::default());

        Self {
            decoder: FrameDecoder::new(config.pixel_format),
            monitor: RateMonitor::new(),
            last_sequence: None,
            cancel: CancellationToken::new(),
            frame_tx,
            frame_rx,
            stats_tx,
            stats_rx,
            stats: ReceiverStats::default(),
            applied: 0,
        }
    }

    /// Latest decoded frame, updated on every successful apply.
    pub fn frame_receiver(&self) -> watch::Receiver<Frame> {
        self.frame_rx.clone()
    }

    /// Live statistics channel.
    pub fn stats_receiver(&self) -> watch::Receiver<ReceiverStats> {
        self.stats_rx.clone()
    }

    /// A cloneable handle that stops the receive loop.
    pub fn cancel_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Number of frames successfully applied.
    pub fn frames_applied(&self) -> u64 {
        self.applied
    }

    /// Dispatch one inbound event.
    ///
    /// Events carrying a different tag are ignored. For matching
    /// events, drops are logged and recovered locally — the next valid
    /// packet is still applied.
    pub fn handle_event(&mut self, tag: u8, payload: &[u8]) {
        if tag != STREAM_EVENT {
            return;
        }

        self.monitor.record_packet();
        self.stats.total_packets += 1;
        self.stats.total_bytes += payload.len() as u64;

        match self.apply(payload) {
            Ok(true) => {
                let _ = self.stats_tx.send(self.stats.clone());
            }
            Ok(false) => {} // stale frame, already logged
            Err(err) => warn!(%err, "inbound frame dropped"),
        }
    }

    /// Advance the rate-monitor clock; publishes stats at each window.
    pub fn advance_clock(&mut self, dt: Duration) {
        if let Some(rate) = self.monitor.advance(dt) {
            self.stats.packets_per_second = rate;
            let _ = self.stats_tx.send(self.stats.clone());
        }
    }

    /// Run the receive loop until cancelled or the session closes.
    pub async fn run(&mut self, session: Arc<dyn StreamSession>) -> Result<(), StreamError> {
        let mut ticker = tokio::time::interval_at(
            tokio::time::Instant::now() + MONITOR_TICK,
            MONITOR_TICK,
        );

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => self.advance_clock(MONITOR_TICK),
                event = session.recv_event() => match event {
                    Ok((tag, payload)) => self.handle_event(tag, &payload),
                    Err(_) => break, // session closed
                },
            }
        }

        Ok(())
    }

    // ── Internal ─────────────────────────────────────────────────

    /// Returns `Ok(true)` when a frame was applied, `Ok(false)` when a
    /// stale packet was discarded.
    fn apply(&mut self, payload: &[u8]) -> Result<bool, StreamError> {
        if payload.is_empty() {
            return Err(StreamError::EmptyPayload);
        }

        let packet = FramePacket::from_bytes(payload)?;

        if let Some(last) = self.last_sequence {
            if packet.sequence <= last {
                debug!(sequence = packet.sequence, last, "stale frame discarded");
                return Ok(false);
            }
        }

        let image = StreamCompressor::decompress(&packet.payload)?;
        let frame = self.decoder.decode(&image)?;

        debug!(
            sequence = packet.sequence,
            wire_len = payload.len(),
            image_len = image.len(),
            "frame applied"
        );

        self.last_sequence = Some(packet.sequence);
        self.applied += 1;
        self.stats.width = frame.width;
        self.stats.height = frame.height;
        let _ = self.frame_tx.send(frame);

        Ok(true)
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::FrameEncoder;
    use crate::frame::PixelFormat;

    fn packet_bytes(sequence: u64) -> Vec<u8> {
        let rgb: Vec<u8> = (0..16 * 9).flat_map(|i| [i as u8, 0, 255 - i as u8]).collect();
        let frame = Frame::from_rgb8(&rgb, 16, 9, PixelFormat::Rgb8);
        let jpeg = FrameEncoder::new(75).encode(&frame).unwrap();
        let wire = StreamCompressor::new().compress(&jpeg).unwrap().to_vec();
        FramePacket::new(sequence, 0, wire).to_bytes().unwrap()
    }

    #[test]
    fn valid_packet_applies_and_publishes() {
        let mut receiver = FrameReceiver::new(&StreamConfig::default());
        let mut frame_rx = receiver.frame_receiver();

        assert_eq!(frame_rx.borrow().width, RECEIVE_WIDTH);
        assert_eq!(frame_rx.borrow().height, RECEIVE_HEIGHT);

        receiver.handle_event(STREAM_EVENT, &packet_bytes(0));

        assert_eq!(receiver.frames_applied(), 1);
        let frame = frame_rx.borrow_and_update();
        assert_eq!(frame.width, 16);
        assert_eq!(frame.height, 9);
    }

    #[test]
    fn other_tags_are_ignored() {
        let mut receiver = FrameReceiver::new(&StreamConfig::default());
        receiver.handle_event(STREAM_EVENT + 1, &packet_bytes(0));
        assert_eq!(receiver.frames_applied(), 0);
        assert_eq!(receiver.stats_receiver().borrow().total_packets, 0);
    }

    #[test]
    fn empty_payload_dropped_pipeline_survives() {
        let mut receiver = FrameReceiver::new(&StreamConfig::default());

        receiver.handle_event(STREAM_EVENT, &[]);
        assert_eq!(receiver.frames_applied(), 0);

        // Still accepts the next valid packet.
        receiver.handle_event(STREAM_EVENT, &packet_bytes(0));
        assert_eq!(receiver.frames_applied(), 1);
    }

    #[test]
    fn malformed_payload_dropped() {
        let mut receiver = FrameReceiver::new(&StreamConfig::default());
        receiver.handle_event(STREAM_EVENT, &[0xFF; 24]);
        assert_eq!(receiver.frames_applied(), 0);

        receiver.handle_event(STREAM_EVENT, &packet_bytes(0));
        assert_eq!(receiver.frames_applied(), 1);
    }

    #[test]
    fn stale_sequences_discarded() {
        let mut receiver = FrameReceiver::new(&StreamConfig::default());

        receiver.handle_event(STREAM_EVENT, &packet_bytes(5));
        receiver.handle_event(STREAM_EVENT, &packet_bytes(3)); // reordered
        receiver.handle_event(STREAM_EVENT, &packet_bytes(5)); // duplicate
        receiver.handle_event(STREAM_EVENT, &packet_bytes(6));

        assert_eq!(receiver.frames_applied(), 2);
        // All four packets still counted for the rate display.
        assert_eq!(receiver.stats_receiver().borrow().total_packets, 4);
    }

    #[test]
    fn rate_published_at_window_boundary() {
        let mut receiver = FrameReceiver::new(&StreamConfig::default());

        for i in 0..10 {
            receiver.handle_event(STREAM_EVENT, &packet_bytes(i));
        }
        receiver.advance_clock(Duration::from_secs(1));

        let stats = receiver.stats_receiver().borrow().clone();
        assert_eq!(stats.packets_per_second, 10);
        assert_eq!(stats.total_packets, 10);
        assert_eq!(stats.width, 16);
    }
}
