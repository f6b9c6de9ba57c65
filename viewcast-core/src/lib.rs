//! # viewcast-core
//!
//! Fixed-cadence frame streaming between session participants: the
//! designated sender samples a render source, encodes and compresses
//! each frame, and emits it as an opaque tagged packet; every other
//! participant reverses the pipeline and presents the latest image.
//!
//! ## Architecture
//!
//! ```text
//! SENDER                                      RECEIVER
//! ┌─────────────────────────┐                ┌──────────────────────┐
//! │ FrameCapturer (pooled)  │                │ RateMonitor          │
//! │   ↓                     │                │   ↓                  │
//! │ FrameEncoder (jpeg)     │    session     │ StreamCompressor     │
//! │   ↓                     │ ──────────►    │   ↓                  │
//! │ StreamCompressor (zstd) │   event tag    │ FrameDecoder         │
//! │   ↓                     │                │   ↓                  │
//! │ StreamSession::send     │                │ watch-published frame│
//! └─────────────────────────┘                └──────────────────────┘
//! ```
//!
//! ## Sub-modules
//!
//! | Module     | Purpose                                            |
//! |----------- |----------------------------------------------------|
//! | `frame`    | Raw frame and pixel-layout types                   |
//! | `config`   | Streaming configuration and frame-rate presets     |
//! | `pool`     | Reusable frame-buffer pool with idle eviction      |
//! | `capture`  | Render-source seam and pooled capture              |
//! | `codec`    | Lossy JPEG encoder / decoder                       |
//! | `compress` | Lossless zstd wire compression                     |
//! | `wire`     | Wire packet and stream event tag                   |
//! | `session`  | Session contract and in-process loopback           |
//! | `sched`    | Cadence scheduling seam                            |
//! | `monitor`  | Fixed-window packets-per-second monitor            |
//! | `streamer` | Sender state machine and cadence loop              |
//! | `receiver` | Inbound dispatch, decode, apply, stats             |

pub mod capture;
pub mod codec;
pub mod compress;
pub mod config;
pub mod error;
pub mod frame;
pub mod monitor;
pub mod pool;
pub mod receiver;
pub mod sched;
pub mod session;
pub mod streamer;
pub mod wire;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use capture::{FrameCapturer, GradientSource, RenderSource};
pub use codec::{FrameDecoder, FrameEncoder};
pub use compress::{StreamCompressor, ZSTD_LEVEL};
pub use config::{FrameRatePreset, StreamConfig};
pub use error::StreamError;
pub use frame::{Frame, PixelFormat};
pub use monitor::RateMonitor;
pub use pool::{FramePool, IDLE_GRACE, PooledFrame};
pub use receiver::{FrameReceiver, RECEIVE_HEIGHT, RECEIVE_WIDTH, ReceiverStats};
pub use sched::{FrameScheduler, TokioScheduler};
pub use session::{LoopbackHub, LoopbackSession, SessionRole, SessionStatus, StreamSession};
pub use streamer::{FrameStreamer, FrameStreamerBuilder, StreamPhase};
pub use wire::{FramePacket, STREAM_EVENT};
