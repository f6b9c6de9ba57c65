//! Inbound packet rate measurement.
//!
//! Fixed-window counting, not a sliding window: every accepted packet
//! bumps a counter, and once a full second of clock ticks has
//! accumulated the counter is published as packets-per-second and both
//! counter and elapsed time reset. A burst straddling a window boundary
//! undercounts one window and overcounts the next — fine for display,
//! not for rate limiting.

use std::time::Duration;

/// Fixed-window packets-per-second monitor.
#[derive(Debug)]
pub struct RateMonitor {
    window: Duration,
    packet_count: u32,
    elapsed: Duration,
    last_rate: u32,
}

impl RateMonitor {
    /// Create a monitor with a one-second window.
    pub fn new() -> Self {
        Self::with_window(Duration::from_secs(1))
    }

    /// Create a monitor with a custom window.
    pub fn with_window(window: Duration) -> Self {
        Self {
            window,
            packet_count: 0,
            elapsed: Duration::ZERO,
            last_rate: 0,
        }
    }

    /// Count one accepted inbound packet.
    pub fn record_packet(&mut self) {
        self.packet_count += 1;
    }

    /// Advance the monitor clock by `dt`.
    ///
    /// When a full window has elapsed, publishes the current count as
    /// the rate, resets counter and elapsed time, and returns the
    /// published value.
    pub fn advance(&mut self, dt: Duration) -> Option<u32> {
        self.elapsed += dt;
        if self.elapsed < self.window {
            return None;
        }

        let rate = self.packet_count;
        self.last_rate = rate;
        self.packet_count = 0;
        self.elapsed = Duration::ZERO;
        Some(rate)
    }

    /// The most recently published rate.
    pub fn rate(&self) -> u32 {
        self.last_rate
    }

    /// Packets counted so far in the current window.
    pub fn pending(&self) -> u32 {
        self.packet_count
    }
}

impl Default for RateMonitor {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publishes_count_at_window_boundary() {
        let mut monitor = RateMonitor::new();
        for _ in 0..7 {
            monitor.record_packet();
        }

        assert_eq!(monitor.advance(Duration::from_millis(999)), None);
        assert_eq!(monitor.advance(Duration::from_millis(1)), Some(7));
        assert_eq!(monitor.rate(), 7);
    }

    #[test]
    fn counter_resets_after_publish() {
        let mut monitor = RateMonitor::new();
        monitor.record_packet();
        monitor.advance(Duration::from_secs(1));

        assert_eq!(monitor.pending(), 0);
        // Empty second window publishes zero.
        assert_eq!(monitor.advance(Duration::from_secs(1)), Some(0));
    }

    #[test]
    fn exact_count_in_one_window() {
        let mut monitor = RateMonitor::new();
        for _ in 0..10 {
            monitor.record_packet();
            monitor.advance(Duration::from_millis(100));
        }
        // The 10th advance crossed the boundary.
        assert_eq!(monitor.rate(), 10);
        assert_eq!(monitor.pending(), 0);
    }

    #[test]
    fn custom_window() {
        let mut monitor = RateMonitor::with_window(Duration::from_millis(500));
        monitor.record_packet();
        assert_eq!(monitor.advance(Duration::from_millis(499)), None);
        assert_eq!(monitor.advance(Duration::from_millis(1)), Some(1));
    }

    #[test]
    fn boundary_straddling_burst_splits() {
        let mut monitor = RateMonitor::new();
        monitor.record_packet();
        monitor.advance(Duration::from_secs(1));
        monitor.record_packet();
        monitor.record_packet();
        let rate = monitor.advance(Duration::from_secs(1)).unwrap();
        assert_eq!(rate, 2);
    }
}
