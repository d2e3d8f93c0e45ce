//! JSON-based SignalCodec implementation.

use crate::application::ports::SignalCodec;
use crate::domain::signaling::SignalMsg;

/// Encodes / decodes [`SignalMsg`] as the JSON envelope the signaling
/// server relays verbatim.
pub struct JsonSignalCodec;

impl SignalCodec for JsonSignalCodec {
    fn encode(&self, msg: &SignalMsg) -> anyhow::Result<String> {
        serde_json::to_string(msg).map_err(Into::into)
    }

    fn decode(&self, text: &str) -> anyhow::Result<SignalMsg> {
        serde_json::from_str(text).map_err(Into::into)
    }
}
