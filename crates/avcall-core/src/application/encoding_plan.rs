//! Encoding parameter planner.
//!
//! Pure derivation of a target [`EncodingPlan`] from user configuration and
//! call phase, plus the degrading application of a plan to the media engine.

use tracing::{debug, warn};

use crate::domain::encoding::{EncoderConfig, EncodingPlan, LayerSpec, SvcRepresentation};

use super::error::CallError;
use super::ports::MediaEngine;

/// Bitrate share of the lowest spatial layer.
const BASE_LAYER_SHARE: f64 = 0.4;
/// Additional share gained by each higher spatial layer.
///
/// Note: shares are deliberately not normalized to sum to 100% of the
/// target for more than three layers. Reviewable heuristic; do not "fix"
/// without revisiting the observed encoder behavior it was tuned against.
const LAYER_SHARE_STEP: f64 = 0.3;

/// Inputs to one planning pass.
#[derive(Debug, Clone, Copy)]
pub struct PlanRequest {
    pub config: EncoderConfig,
    /// How layering is expressed toward the engine.
    pub representation: SvcRepresentation,
    /// True once the call is `Active`: topology and scalability mode are
    /// frozen, only bitrate may be retuned live.
    pub is_active_call: bool,
}

/// Produce a fresh target encoder-parameter set.
///
/// The returned plan supersedes `current` wholesale; every produced layer
/// is marked active.
pub fn plan(current: Option<&EncodingPlan>, request: &PlanRequest) -> EncodingPlan {
    let config = &request.config;

    // Live call: keep whatever topology is running, only retune bitrate.
    // Layer-count changes made mid-call are stored by the caller and take
    // effect at the next call setup.
    if request.is_active_call {
        if let Some(current) = current {
            if !current.layers.is_empty() {
                return retune_bitrate(current, config.bitrate_bps);
            }
        }
    }

    if !config.svc_enabled || config.spatial_layers <= 1 {
        return EncodingPlan::minimal(config.bitrate_bps);
    }

    match request.representation {
        SvcRepresentation::ScalabilityMode => {
            let mode = format!("L{}T{}", config.spatial_layers, config.temporal_layers);
            debug!(%mode, "planned single-entry SVC encoding");
            EncodingPlan {
                layers: vec![LayerSpec {
                    rid: None,
                    max_bitrate_bps: config.bitrate_bps,
                    scale_resolution_down_by: 1.0,
                    scalability_mode: Some(mode),
                    active: true,
                }],
            }
        }
        SvcRepresentation::LayerList => {
            let n = config.spatial_layers as u32;
            let layers = (0..n)
                .map(|i| {
                    let share = BASE_LAYER_SHARE + LAYER_SHARE_STEP * f64::from(i);
                    LayerSpec {
                        rid: None,
                        max_bitrate_bps: (config.bitrate_bps as f64 * share) as u64,
                        // powi, not a shift: layer counts are passed through
                        // unvalidated and the engine is the final arbiter,
                        // so this must stay total for any u8 count.
                        scale_resolution_down_by: 2f64.powi((n - 1 - i) as i32),
                        scalability_mode: None,
                        active: true,
                    }
                })
                .collect();
            EncodingPlan { layers }
        }
    }
}

/// Keep the running topology, recompute only the per-layer bitrate caps.
fn retune_bitrate(current: &EncodingPlan, bitrate_bps: u64) -> EncodingPlan {
    let n = current.layers.len() as u32;
    let layers = current
        .layers
        .iter()
        .enumerate()
        .map(|(i, layer)| {
            let max_bitrate_bps = if n == 1 {
                bitrate_bps
            } else {
                let share = BASE_LAYER_SHARE + LAYER_SHARE_STEP * i as f64;
                (bitrate_bps as f64 * share) as u64
            };
            LayerSpec {
                max_bitrate_bps,
                active: true,
                ..layer.clone()
            }
        })
        .collect();
    EncodingPlan { layers }
}

/// Apply a plan to the engine, degrading on failure.
///
/// Fallback chain: the full plan, then a minimal single-layer bitrate-only
/// plan, then an [`CallError::EncodingConfig`] with the live parameters
/// left untouched. The sender is never left with zero encodings.
///
/// Returns the plan that was actually applied.
pub async fn apply(
    engine: &dyn MediaEngine,
    plan: EncodingPlan,
) -> Result<EncodingPlan, CallError> {
    match engine.apply_encoding(&plan).await {
        Ok(()) => Ok(plan),
        Err(e) => {
            warn!("applying encoding plan failed, dropping layering: {e}");
            let minimal = EncodingPlan::minimal(plan.total_bitrate_bps());
            match engine.apply_encoding(&minimal).await {
                Ok(()) => Ok(minimal),
                Err(e) => Err(CallError::EncodingConfig(e)),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
