//! Stats sampler use case — derives instantaneous call statistics.
//!
//! Runs a 1-second tick loop once a session exists, diffing each engine
//! snapshot against the previous one of the same session. The sampler is
//! the sole owner of the rolling snapshot history (depth 1).

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::domain::stats::{StatsReport, StatsSnapshot};

use super::ports::{AppEvents, MediaEngine};

/// Fixed sampling period.
pub const SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

pub struct StatsSampler {
    engine: Arc<dyn MediaEngine>,
    app_events: Arc<dyn AppEvents>,
    /// The immediately previous snapshot; only valid within one session.
    previous: Option<StatsSnapshot>,
}

impl StatsSampler {
    pub fn new(engine: Arc<dyn MediaEngine>, app_events: Arc<dyn AppEvents>) -> Self {
        Self {
            engine,
            app_events,
            previous: None,
        }
    }

    /// Discard snapshot history. Must be called on session reset — a delta
    /// is only valid against a snapshot of the same session.
    pub fn reset(&mut self) {
        self.previous = None;
    }

    /// Fold one snapshot into the history and derive the report.
    ///
    /// Per-stream bitrate is `(bytes_now - bytes_prev) * 8 / elapsed_secs`,
    /// contributing 0 when elapsed time is non-positive or no bytes were
    /// sent since the last sample. Loss is computed from the cumulative
    /// counters of the latest snapshot only.
    pub fn observe(&mut self, snapshot: StatsSnapshot) -> StatsReport {
        let mut report = StatsReport {
            codec_mime: snapshot.codec_mime.clone(),
            ..StatsReport::default()
        };

        if let Some(previous) = &self.previous {
            let elapsed_secs = (snapshot.timestamp_ms - previous.timestamp_ms) / 1000.0;
            for stream in &snapshot.outbound_video {
                let Some(prev) = previous
                    .outbound_video
                    .iter()
                    .find(|p| p.stream_id == stream.stream_id)
                else {
                    continue;
                };
                let bytes_sent = stream.bytes_sent.saturating_sub(prev.bytes_sent);
                if elapsed_secs > 0.0 && bytes_sent > 0 {
                    let bitrate = ((bytes_sent * 8) as f64 / elapsed_secs).round() as u64;
                    report
                        .per_stream_bitrate_bps
                        .insert(stream.stream_id.clone(), bitrate);
                    report.total_bitrate_bps += bitrate;
                }
            }
        }

        // Main stream: largest width*height product among current streams.
        let mut highest_resolution = 0u64;
        for stream in &snapshot.outbound_video {
            if stream.scalability_mode.is_some() {
                report.scalability_mode = stream.scalability_mode.clone();
            }
            let resolution = u64::from(stream.frame_width) * u64::from(stream.frame_height);
            if resolution > highest_resolution {
                highest_resolution = resolution;
                report.main_stream_id = Some(stream.stream_id.clone());
                report.main_resolution = Some((stream.frame_width, stream.frame_height));
                report.main_framerate = Some(stream.frames_per_second);
            }
        }

        let loss = snapshot.inbound_loss;
        let total = loss.packets_lost + loss.packets_received;
        if total > 0 {
            let percent = loss.packets_lost as f64 / total as f64 * 100.0;
            // Two-decimal precision, as displayed to the user.
            report.loss_percent = Some((percent * 100.0).round() / 100.0);
        }

        self.previous = Some(snapshot);
        report
    }

    /// Run the periodic sampling loop until `stop` flips to true.
    ///
    /// A failed stats poll is logged and skipped; the loop keeps going so a
    /// transient engine hiccup does not kill observability.
    pub async fn run(mut self, mut stop: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(SAMPLE_INTERVAL);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                result = stop.changed() => {
                    if result.is_err() || *stop.borrow() {
                        debug!("stats sampler stopping");
                        return;
                    }
                    continue;
                }
            }

            match self.engine.fetch_stats().await {
                Ok(snapshot) => {
                    let report = self.observe(snapshot);
                    debug!(
                        total_kbps = report.total_bitrate_bps / 1000,
                        loss = ?report.loss_percent,
                        "sampled stats"
                    );
                    self.app_events.stats(&report).await;
                }
                Err(e) => warn!("stats poll failed: {e}"),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
