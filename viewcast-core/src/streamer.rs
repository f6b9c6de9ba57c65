//! Sender-side streaming service.
//!
//! Orchestrates the full outbound pipeline once per tick:
//!
//! 1. [`FrameCapturer`] samples the render source into a pooled buffer.
//! 2. [`FrameEncoder`] produces JPEG bytes at the configured quality.
//! 3. [`StreamCompressor`] shrinks them into the reused scratch buffer.
//! 4. The session delivers the resulting [`FramePacket`] to the other
//!    participants, tagged [`STREAM_EVENT`].
//!
//! The loop is paced by a [`FrameScheduler`] to the configured
//! frame-rate preset and respects a `CancellationToken` shutdown.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::capture::{FrameCapturer, RenderSource};
use crate::codec::FrameEncoder;
use crate::compress::StreamCompressor;
use crate::config::StreamConfig;
use crate::error::StreamError;
use crate::frame::Frame;
use crate::sched::{FrameScheduler, TokioScheduler};
use crate::session::StreamSession;
use crate::wire::{FramePacket, STREAM_EVENT};

// ── StreamPhase ──────────────────────────────────────────────────

/// Lifecycle of the sender pipeline.
///
/// ```text
///  Idle ──► Validating ──► Streaming ──► Stopped
///               │                           ▲
///               └───────────────────────────┘
/// ```
///
/// `Stopped` is terminal: a streamer that failed validation or was torn
/// down stays disabled for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamPhase {
    /// Not yet initialized.
    #[default]
    Idle,
    /// Checking required collaborators.
    Validating,
    /// The cadence loop is running.
    Streaming,
    /// Torn down or failed validation. Terminal.
    Stopped,
}

impl std::fmt::Display for StreamPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Validating => write!(f, "Validating"),
            Self::Streaming => write!(f, "Streaming"),
            Self::Stopped => write!(f, "Stopped"),
        }
    }
}

impl StreamPhase {
    /// Transition to `Validating`. Valid from: `Idle`.
    pub fn begin_validation(&mut self) -> Result<(), StreamError> {
        match self {
            Self::Idle => {
                *self = Self::Validating;
                Ok(())
            }
            _ => Err(StreamError::InvalidTransition(
                "cannot validate: not in Idle state",
            )),
        }
    }

    /// Transition to `Streaming`. Valid from: `Validating`.
    pub fn begin_streaming(&mut self) -> Result<(), StreamError> {
        match self {
            Self::Validating => {
                *self = Self::Streaming;
                Ok(())
            }
            _ => Err(StreamError::InvalidTransition(
                "cannot stream: not in Validating state",
            )),
        }
    }

    /// Transition to `Stopped`. Valid from any state; terminal.
    pub fn halt(&mut self) {
        *self = Self::Stopped;
    }

    /// Whether the cadence loop is active.
    pub fn is_streaming(&self) -> bool {
        matches!(self, Self::Streaming)
    }
}

// ── Builder ──────────────────────────────────────────────────────

/// Assembles a [`FrameStreamer`], validating collaborators.
pub struct FrameStreamerBuilder {
    config: StreamConfig,
    session: Option<Arc<dyn StreamSession>>,
    source: Option<Box<dyn RenderSource>>,
    scheduler: Arc<dyn FrameScheduler>,
}

impl FrameStreamerBuilder {
    fn new(config: StreamConfig) -> Self {
        Self {
            config,
            session: None,
            source: None,
            scheduler: Arc::new(TokioScheduler),
        }
    }

    /// Wire in the session handle.
    pub fn with_session(mut self, session: Arc<dyn StreamSession>) -> Self {
        self.session = Some(session);
        self
    }

    /// Wire in the render source.
    pub fn with_source(mut self, source: Box<dyn RenderSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Replace the scheduler (tests).
    pub fn with_scheduler(mut self, scheduler: Arc<dyn FrameScheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Validate collaborators and build.
    ///
    /// A missing session or render source is a configuration error, not
    /// a transient fault: the build fails and the component never runs.
    pub fn build(self) -> Result<FrameStreamer, StreamError> {
        let mut phase = StreamPhase::Idle;
        phase.begin_validation()?;

        let Some(session) = self.session else {
            return Err(StreamError::MissingCollaborator("session handle"));
        };
        let Some(source) = self.source else {
            return Err(StreamError::MissingCollaborator("render source"));
        };

        let encoder = FrameEncoder::new(self.config.quality);
        let capturer = FrameCapturer::new(&self.config);

        Ok(FrameStreamer {
            config: self.config,
            session,
            source,
            scheduler: self.scheduler,
            capturer,
            encoder,
            compressor: StreamCompressor::new(),
            phase,
            cancel: CancellationToken::new(),
            loop_active: Arc::new(AtomicBool::new(false)),
            sequence: 0,
        })
    }
}

// ── FrameStreamer ────────────────────────────────────────────────

/// Sender pipeline: capture → encode → compress → emit, on a fixed
/// cadence, while this endpoint is the session's designated sender.
pub struct FrameStreamer {
    config: StreamConfig,
    session: Arc<dyn StreamSession>,
    source: Box<dyn RenderSource>,
    scheduler: Arc<dyn FrameScheduler>,
    capturer: FrameCapturer,
    encoder: FrameEncoder,
    compressor: StreamCompressor,
    phase: StreamPhase,
    cancel: CancellationToken,
    loop_active: Arc<AtomicBool>,
    sequence: u64,
}

impl std::fmt::Debug for FrameStreamer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameStreamer")
            .field("phase", &self.phase)
            .field("sequence", &self.sequence)
            .finish_non_exhaustive()
    }
}

impl FrameStreamer {
    /// Start assembling a streamer.
    pub fn builder(config: StreamConfig) -> FrameStreamerBuilder {
        FrameStreamerBuilder::new(config)
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> StreamPhase {
        self.phase
    }

    /// Number of frames emitted so far.
    pub fn frames_sent(&self) -> u64 {
        self.sequence
    }

    /// A cloneable handle that stops the loop from another task.
    pub fn cancel_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run the cadence loop until cancelled or the session disconnects.
    ///
    /// Eligibility is re-evaluated whenever the session status changes:
    /// while this endpoint is not the designated sender the loop parks
    /// on the status watch instead of ticking.
    ///
    /// Steady-state faults (encode, compress, send) drop the current
    /// frame with a log and the loop proceeds to its next tick; none of
    /// them propagate out of here.
    pub async fn run(&mut self) -> Result<(), StreamError> {
        if self.loop_active.swap(true, Ordering::SeqCst) {
            return Err(StreamError::AlreadyRunning);
        }

        let result = self.stream_loop().await;

        // Teardown: destroy pooled buffers and clear lookup tables,
        // whichever way the loop exited.
        self.capturer.clear();
        self.phase.halt();
        self.loop_active.store(false, Ordering::SeqCst);
        result
    }

    /// Signal the loop to stop. The loop observes the token at every
    /// suspension point rather than completing another full tick.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    async fn stream_loop(&mut self) -> Result<(), StreamError> {
        self.phase.begin_streaming()?;

        let mut status_rx = self.session.status();
        let interval = self.config.frame_rate.interval();
        let epoch = tokio::time::Instant::now();

        debug!(
            width = self.capturer.width(),
            height = self.capturer.height(),
            fps = self.config.frame_rate.fps(),
            participants = self.session.participant_count(),
            "stream loop started"
        );

        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            let status = *status_rx.borrow_and_update();
            if !status.connected {
                break;
            }
            if !status.eligible() {
                // Park until promoted (or cancelled / disconnected).
                tokio::select! {
                    _ = self.cancel.cancelled() => break,
                    changed = status_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        continue;
                    }
                }
            }

            let tick_start = tokio::time::Instant::now();

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = self.scheduler.render_boundary() => {}
            }

            if let Err(err) = self.tick(epoch).await {
                warn!(%err, "frame dropped");
            }

            self.capturer.evict_idle();

            let remaining = interval.saturating_sub(tick_start.elapsed());
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = self.scheduler.wait(remaining) => {}
            }
        }

        Ok(())
    }

    /// One capture→encode→compress→emit cycle.
    async fn tick(&mut self, epoch: tokio::time::Instant) -> Result<(), StreamError> {
        let frame = self.capturer.capture(self.source.as_mut())?;

        let result = self.emit(frame.frame(), epoch).await;

        // The buffer goes back to the pool even when the emit failed.
        self.capturer.release(frame);
        result
    }

    async fn emit(&mut self, frame: &Frame, epoch: tokio::time::Instant) -> Result<(), StreamError> {
        let encoded = self.encoder.encode(frame)?;
        let wire = self.compressor.compress(&encoded)?;

        debug!(
            sequence = self.sequence,
            wire_len = wire.len(),
            image_len = encoded.len(),
            "sending frame"
        );

        let packet = FramePacket::new(
            self.sequence,
            epoch.elapsed().as_micros() as u64,
            wire.to_vec(),
        );
        self.sequence += 1;

        self.session.send_event(STREAM_EVENT, packet.to_bytes()?).await
    }
}

// ── Tests ────────────────────────────────────────────────────────
