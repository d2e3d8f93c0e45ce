//! Error taxonomy of the call session surface.
//!
//! None of these crash the process: every variant is either a user-visible
//! status report or accompanies a degradation to a safe fallback.

/// Errors surfaced by call-session operations.
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    /// A prerequisite for the operation was missing (signaling disconnected,
    /// no local stream). No state was mutated.
    #[error("precondition failed: {0}")]
    Precondition(&'static str),

    /// The media engine rejected description creation or application. The
    /// call phase was rolled back to its pre-attempt value and the peer
    /// connection torn down.
    #[error("negotiation failed: {0}")]
    Negotiation(anyhow::Error),

    /// Applying encoder parameters failed even after dropping layering.
    /// The previously live parameters were left untouched; the call goes on.
    #[error("encoding configuration failed: {0}")]
    EncodingConfig(anyhow::Error),

    /// A signaling send was attempted while the channel was down. An
    /// already-active call continues; media flows independently of
    /// signaling once negotiated.
    #[error("signaling transport error: {0}")]
    Transport(anyhow::Error),
}
