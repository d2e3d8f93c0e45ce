//! Encoder parameter value types.
//!
//! An [`EncodingPlan`] is produced fresh on every (re)configuration request
//! and superseded wholesale — never mutated in place.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// User-facing encoder configuration
// ---------------------------------------------------------------------------

/// User-selected encoding settings. Values are validated only for being
/// parseable; out-of-range values pass through to the media engine, which
/// is the final arbiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Target total bitrate in bits/sec.
    pub bitrate_bps: u64,
    /// Number of SVC spatial layers (>= 1).
    pub spatial_layers: u8,
    /// Number of SVC temporal layers (>= 1).
    pub temporal_layers: u8,
    /// Whether scalable coding is requested at all.
    pub svc_enabled: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            bitrate_bps: 1_500_000,
            spatial_layers: 1,
            temporal_layers: 1,
            svc_enabled: false,
        }
    }
}

/// How SVC layering is expressed toward the media engine. Engines accept
/// either explicit per-layer entries or a single entry carrying a compact
/// `L<spatial>T<temporal>` scalability-mode string. A caller picks one
/// representation and never mixes both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SvcRepresentation {
    /// Expand one entry per spatial layer, each with its own bitrate share
    /// and downscale factor.
    LayerList,
    /// One entry with `scalability_mode = "L<s>T<t>"` and the full bitrate.
    #[default]
    ScalabilityMode,
}

// ---------------------------------------------------------------------------
// Encoding plan
// ---------------------------------------------------------------------------

/// One encoder layer (one RTP encoding entry).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    /// Optional stream id (`rid`) the engine may use to tag the layer.
    pub rid: Option<String>,
    /// Cap on this layer's bitrate in bits/sec.
    pub max_bitrate_bps: u64,
    /// Spatial downscale factor relative to the capture resolution (>= 1).
    pub scale_resolution_down_by: f64,
    /// Compact scalability mode string, e.g. `L3T2`.
    pub scalability_mode: Option<String>,
    /// Layers produced by the planner are always marked active.
    pub active: bool,
}

/// A complete target encoder-parameter set, lowest-quality layer first.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EncodingPlan {
    pub layers: Vec<LayerSpec>,
}

impl EncodingPlan {
    /// A bare-minimum plan: one active layer capped at `bitrate_bps`, no
    /// layering of any kind. Used as the degradation fallback when a full
    /// plan is rejected by the engine.
    pub fn minimal(bitrate_bps: u64) -> Self {
        Self {
            layers: vec![LayerSpec {
                rid: None,
                max_bitrate_bps: bitrate_bps,
                scale_resolution_down_by: 1.0,
                scalability_mode: None,
                active: true,
            }],
        }
    }

    /// Total of all per-layer bitrate caps.
    pub fn total_bitrate_bps(&self) -> u64 {
        self.layers.iter().map(|l| l.max_bitrate_bps).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_plan_has_one_plain_layer() {
        let plan = EncodingPlan::minimal(800_000);
        assert_eq!(plan.layers.len(), 1);
        let layer = &plan.layers[0];
        assert_eq!(layer.max_bitrate_bps, 800_000);
        assert_eq!(layer.scale_resolution_down_by, 1.0);
        assert!(layer.scalability_mode.is_none());
        assert!(layer.active);
    }
}
