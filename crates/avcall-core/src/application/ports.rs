//! Port traits (interfaces) that use cases depend on.
//!
//! Adapters implement these traits; use cases never reference tungstenite,
//! a concrete media engine, or capture devices directly.

use async_trait::async_trait;

use crate::domain::call::{
    CallPhase, CaptureCapabilities, CaptureHints, CodecDescriptor, IceCandidate,
    SessionDescription,
};
use crate::domain::encoding::EncodingPlan;
use crate::domain::signaling::SignalMsg;
use crate::domain::stats::{StatsReport, StatsSnapshot};

// ---------------------------------------------------------------------------
// Signaling channel
// ---------------------------------------------------------------------------

/// Ordered, at-least-once delivery of signaling messages over a
/// reconnecting transport. Inbound messages arrive on a channel handed to
/// the adapter at construction; this trait covers the outbound side and
/// the connection status.
///
/// Reconnection does not replay messages lost while disconnected — callers
/// must tolerate their absence.
#[async_trait]
pub trait SignalingChannel: Send + Sync {
    /// Send one signaling message. Fails when the transport is down.
    async fn send(&self, msg: SignalMsg) -> anyhow::Result<()>;

    /// Whether the underlying transport is currently connected.
    fn is_connected(&self) -> bool;
}

// ---------------------------------------------------------------------------
// SignalCodec (serialization)
// ---------------------------------------------------------------------------

/// Encodes / decodes signaling messages to/from wire text (JSON).
pub trait SignalCodec: Send + Sync {
    fn encode(&self, msg: &SignalMsg) -> anyhow::Result<String>;
    fn decode(&self, text: &str) -> anyhow::Result<SignalMsg>;
}

// ---------------------------------------------------------------------------
// Media engine (the real-time transport + codec implementation)
// ---------------------------------------------------------------------------

/// The native real-time communication engine this core calls into. All
/// operations that can suspend are async; the state machine awaits them
/// before advancing.
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Ordered list of video codecs the local sender supports.
    fn video_codec_capabilities(&self) -> Vec<CodecDescriptor>;

    async fn create_offer(&self) -> anyhow::Result<SessionDescription>;
    async fn create_answer(&self) -> anyhow::Result<SessionDescription>;

    async fn set_local_description(&self, desc: SessionDescription) -> anyhow::Result<()>;
    async fn set_remote_description(&self, desc: SessionDescription) -> anyhow::Result<()>;

    /// Apply a remote ICE candidate, opaquely.
    async fn add_ice_candidate(&self, candidate: IceCandidate) -> anyhow::Result<()>;

    /// The encoder parameters currently live on the video sender, if any.
    async fn current_encoding(&self) -> anyhow::Result<Option<EncodingPlan>>;

    /// Replace the video sender's encoder parameters wholesale.
    async fn apply_encoding(&self, plan: &EncodingPlan) -> anyhow::Result<()>;

    /// Poll one statistics snapshot.
    async fn fetch_stats(&self) -> anyhow::Result<StatsSnapshot>;

    /// Release the peer connection and drop remote-stream references.
    /// Safe to call more than once.
    fn close(&self);
}

// ---------------------------------------------------------------------------
// Capture boundary
// ---------------------------------------------------------------------------

/// Acquires the local audio/video stream. May suspend on user/device
/// permission prompts.
#[async_trait]
pub trait MediaCapture: Send + Sync {
    /// Acquire (or re-acquire) the local stream with the given ideal hints,
    /// returning the actual negotiated capability ranges.
    async fn acquire(&self, hints: &CaptureHints) -> anyhow::Result<CaptureCapabilities>;
}

// ---------------------------------------------------------------------------
// App events (UI bridge)
// ---------------------------------------------------------------------------

/// Emits events toward the UI layer.
#[async_trait]
pub trait AppEvents: Send + Sync {
    async fn phase_changed(&self, phase: CallPhase);
    async fn stats(&self, report: &StatsReport);
}
