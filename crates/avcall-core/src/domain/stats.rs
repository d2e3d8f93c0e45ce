//! Statistics snapshot and report types.
//!
//! A [`StatsSnapshot`] is the typed boundary view of one engine statistics
//! poll; two consecutive snapshots of the same session are diffed into a
//! [`StatsReport`]. The core only ever reads snapshots, never mutates them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Snapshot (engine boundary)
// ---------------------------------------------------------------------------

/// Per outbound video stream counters from one statistics poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundVideoStats {
    /// Engine-assigned stream id, stable across polls within one session.
    pub stream_id: String,
    /// Cumulative bytes sent on this stream.
    pub bytes_sent: u64,
    pub frame_width: u32,
    pub frame_height: u32,
    pub frames_per_second: f64,
    /// Scalability mode the encoder reports for this stream, if any.
    pub scalability_mode: Option<String>,
}

/// Cumulative inbound video loss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InboundLossStats {
    pub packets_lost: u64,
    pub packets_received: u64,
}

/// One statistics poll of the media engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Engine clock, milliseconds.
    pub timestamp_ms: f64,
    pub outbound_video: Vec<OutboundVideoStats>,
    pub inbound_loss: InboundLossStats,
    /// Negotiated outbound video codec, e.g. `video/AV01`.
    pub codec_mime: Option<String>,
}

// ---------------------------------------------------------------------------
// Report (derived delta)
// ---------------------------------------------------------------------------

/// Instantaneous view derived from two consecutive snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsReport {
    /// Sum of per-stream instantaneous bitrates, bits/sec.
    pub total_bitrate_bps: u64,
    /// Instantaneous bitrate per outbound video stream, bits/sec.
    pub per_stream_bitrate_bps: HashMap<String, u64>,
    /// The stream with the largest `width * height` product.
    pub main_stream_id: Option<String>,
    pub main_resolution: Option<(u32, u32)>,
    pub main_framerate: Option<f64>,
    /// Inbound loss as a percentage, rounded to two decimals. `None` until
    /// any inbound packet has been counted.
    pub loss_percent: Option<f64>,
    pub codec_mime: Option<String>,
    pub scalability_mode: Option<String>,
}
