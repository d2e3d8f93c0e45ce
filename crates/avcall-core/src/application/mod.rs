pub mod error;
pub mod ports;

pub mod call_session;
pub mod encoding_plan;
pub mod sdp_prefer;
pub mod stats_sampler;
