//! Loopback demonstration: one sender and one viewer in the same
//! process, wired through a [`LoopbackHub`].
//!
//! Run with `RUST_LOG=debug` to watch per-frame payload sizes.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use viewcast_core::{
    FrameRatePreset, FrameReceiver, FrameStreamer, GradientSource, LoopbackHub, SessionRole,
    StreamConfig,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let hub = LoopbackHub::new();
    let sender_session = Arc::new(hub.join(SessionRole::Sender));
    let viewer_session = Arc::new(hub.join(SessionRole::Viewer));

    let config = StreamConfig::new()
        .with_desired_height(500)
        .with_quality(35)
        .with_frame_rate(FrameRatePreset::Fps10)
        .with_pooling(true);

    info!(
        width = config.target_width(),
        height = config.target_height(),
        fps = config.frame_rate.fps(),
        "starting loopback stream"
    );

    let mut streamer = FrameStreamer::builder(config.clone())
        .with_session(sender_session)
        .with_source(Box::new(GradientSource::new()))
        .build()?;
    let stream_cancel = streamer.cancel_handle();

    let mut receiver = FrameReceiver::new(&config);
    let recv_cancel = receiver.cancel_handle();
    let stats_rx = receiver.stats_receiver();

    let sender_task = tokio::spawn(async move { streamer.run().await });
    let receiver_task = tokio::spawn(async move { receiver.run(viewer_session).await });

    for _ in 0..5 {
        tokio::time::sleep(Duration::from_secs(1)).await;
        let stats = stats_rx.borrow().clone();
        info!(
            pps = stats.packets_per_second,
            total = stats.total_packets,
            bytes = stats.total_bytes,
            width = stats.width,
            height = stats.height,
            "receiving"
        );
    }

    stream_cancel.cancel();
    recv_cancel.cancel();
    sender_task.await??;
    receiver_task.await??;

    info!("loopback stream stopped");
    Ok(())
}
