//! Cadence scheduling seam.
//!
//! The sender loop has exactly two suspension points per tick: wait for
//! the render target to finish its current frame, then wait out the
//! remainder of the tick interval. [`FrameScheduler`] makes both
//! explicit so the pacing logic runs against tokio's (pausable) clock
//! instead of a real render pipeline.

use std::time::Duration;

use async_trait::async_trait;

/// The streaming loop's timing dependencies.
#[async_trait]
pub trait FrameScheduler: Send + Sync {
    /// Suspend until the render target has completed its current frame.
    async fn render_boundary(&self);

    /// Suspend for the remainder of the tick interval.
    async fn wait(&self, interval: Duration);
}

/// Production scheduler on the tokio clock.
///
/// Under `#[tokio::test(start_paused = true)]` the clock is virtual and
/// cadence tests are fully deterministic.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioScheduler;

#[async_trait]
impl FrameScheduler for TokioScheduler {
    async fn render_boundary(&self) {
        tokio::task::yield_now().await;
    }

    async fn wait(&self, interval: Duration) {
        tokio::time::sleep(interval).await;
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn wait_respects_virtual_time() {
        let sched = TokioScheduler;
        let start = tokio::time::Instant::now();
        sched.wait(Duration::from_millis(100)).await;
        assert_eq!(start.elapsed(), Duration::from_millis(100));
    }

    #[tokio::test]
    async fn render_boundary_yields() {
        // Must complete without external wakeups.
        TokioScheduler.render_boundary().await;
    }
}
