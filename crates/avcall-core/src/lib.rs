//! avcall-core — negotiation core for 1:1 AV1-first video calls.
//!
//! Steers WebRTC-style offer/answer negotiation toward a preferred video
//! codec, derives scalable-encoding parameters from user configuration, and
//! samples outbound statistics for observability. The real-time engine
//! (ICE/DTLS/SRTP, codecs) and the capture devices stay behind port traits.
//!
//! # Architecture (Clean Architecture)
//!
//! - **domain**: call phases, descriptions, encoding plans, stats types (no I/O).
//! - **application**: use cases + port traits — the call state machine,
//!   the SDP codec-preference rewriter, the encoding planner, the stats sampler.
//! - **adapters**: signaling over WebSocket (reconnecting) with a JSON codec.

pub mod adapters;
pub mod application;
pub mod domain;
