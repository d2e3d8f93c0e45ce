//! Call lifecycle and media-boundary value types.
//!
//! These are **pure data** — no I/O, no engine dependencies.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Call phase
// ---------------------------------------------------------------------------

/// Lifecycle state of a call attempt. Exactly one value is live per session.
///
/// `Ended` is terminal for the attempt; a new call restarts at `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallPhase {
    /// No call attempt in progress.
    Idle,
    /// Local offer sent, awaiting the remote answer.
    Outgoing,
    /// Remote offer received, composing the local answer.
    Incoming,
    /// Description exchange complete; media is (or is becoming) live.
    Active,
    /// Call torn down.
    Ended,
}

impl CallPhase {
    /// True while a call attempt exists (anything between `Idle` and `Ended`).
    pub fn is_in_call(self) -> bool {
        matches!(self, Self::Outgoing | Self::Incoming | Self::Active)
    }
}

// ---------------------------------------------------------------------------
// Session descriptions
// ---------------------------------------------------------------------------

/// Whether a description is an offer or an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpType {
    Offer,
    Answer,
}

/// A session description as produced by the media engine or received from
/// the remote peer. The `sdp` blob is opaque multi-line text (CRLF- or
/// LF-separated); only the codec-preference rewriter ever looks inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub kind: SdpType,
    pub sdp: String,
}

// ---------------------------------------------------------------------------
// Codec capability descriptor
// ---------------------------------------------------------------------------

/// One codec reported by the media engine's capability query.
/// Read-only to this core; used only for preference matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecDescriptor {
    pub mime_type: String,
    pub payload_type: String,
    pub clock_rate: u32,
}

// ---------------------------------------------------------------------------
// ICE candidates (opaque)
// ---------------------------------------------------------------------------

/// An engine-native ICE candidate record. Forwarded opaquely between the
/// signaling channel and the media engine — never parsed or mutated here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IceCandidate(pub serde_json::Value);

// ---------------------------------------------------------------------------
// Capture boundary types
// ---------------------------------------------------------------------------

/// Ideal capture constraints passed to the capture boundary. `None` means
/// "let the device decide".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptureHints {
    pub ideal_width: Option<u32>,
    pub ideal_height: Option<u32>,
    pub ideal_fps: Option<f64>,
}

impl CaptureHints {
    /// No constraints at all — device-chosen defaults.
    pub fn auto() -> Self {
        Self::default()
    }
}

/// Inclusive min/max range reported by the capture device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapRange<T> {
    pub min: T,
    pub max: T,
}

/// Actual negotiated capability ranges of the acquired capture device,
/// used to populate user-facing selectable presets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptureCapabilities {
    pub width: Option<CapRange<u32>>,
    pub height: Option<CapRange<u32>>,
    pub frame_rate: Option<CapRange<f64>>,
}

/// Resolution presets offered to the user, filtered by device capability.
pub const RESOLUTION_PRESETS: &[(u32, u32)] = &[
    (320, 240),
    (640, 360),
    (640, 480),
    (960, 540),
    (1024, 576),
    (1280, 720),
    (1280, 960),
    (1920, 1080),
    (2560, 1440),
    (3840, 2160),
];

/// Frame-rate presets offered to the user, filtered by device capability.
pub const FPS_PRESETS: &[f64] = &[15.0, 24.0, 30.0, 60.0, 90.0, 120.0];

impl CaptureCapabilities {
    /// Resolution presets this device can actually produce. A missing range
    /// (device did not report one) does not filter.
    pub fn supported_resolutions(&self) -> Vec<(u32, u32)> {
        RESOLUTION_PRESETS
            .iter()
            .copied()
            .filter(|&(w, h)| {
                let w_ok = self.width.map_or(true, |r| r.min <= w && w <= r.max);
                let h_ok = self.height.map_or(true, |r| r.min <= h && h <= r.max);
                w_ok && h_ok
            })
            .collect()
    }

    /// Frame-rate presets within the device's reported range.
    pub fn supported_frame_rates(&self) -> Vec<f64> {
        FPS_PRESETS
            .iter()
            .copied()
            .filter(|&f| self.frame_rate.map_or(true, |r| r.min <= f && f <= r.max))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_in_call() {
        assert!(!CallPhase::Idle.is_in_call());
        assert!(CallPhase::Outgoing.is_in_call());
        assert!(CallPhase::Incoming.is_in_call());
        assert!(CallPhase::Active.is_in_call());
        assert!(!CallPhase::Ended.is_in_call());
    }

    #[test]
    fn session_description_wire_shape() {
        let desc = SessionDescription {
            kind: SdpType::Offer,
            sdp: "v=0".into(),
        };
        let json = serde_json::to_value(&desc).unwrap();
        assert_eq!(json["type"], "offer");
        assert_eq!(json["sdp"], "v=0");
    }

    #[test]
    fn capability_preset_filtering() {
        let caps = CaptureCapabilities {
            width: Some(CapRange { min: 320, max: 1920 }),
            height: Some(CapRange { min: 240, max: 1080 }),
            frame_rate: Some(CapRange { min: 10.0, max: 30.0 }),
        };
        let res = caps.supported_resolutions();
        assert!(res.contains(&(1920, 1080)));
        assert!(!res.contains(&(2560, 1440)));
        assert_eq!(caps.supported_frame_rates(), vec![15.0, 24.0, 30.0]);
    }

    #[test]
    fn unconstrained_capabilities_allow_everything() {
        let caps = CaptureCapabilities::default();
        assert_eq!(caps.supported_resolutions().len(), RESOLUTION_PRESETS.len());
        assert_eq!(caps.supported_frame_rates().len(), FPS_PRESETS.len());
    }
}
