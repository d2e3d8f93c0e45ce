pub mod call;
pub mod encoding;
pub mod signaling;
pub mod stats;
