//! Signaling-plane message types.
//!
//! These travel over the out-of-band signaling channel as JSON objects with
//! a `type` discriminator. Pure data — no I/O.

use serde::{Deserialize, Serialize};

use super::call::{IceCandidate, SessionDescription};

/// Top-level signaling message envelope.
///
/// Wire shape: `{"type": "offer"|"answer"|"ice-candidate"|"hangup", ...}`.
/// Messages with an unknown `type` fail to decode; receivers log and drop
/// them, never treat them as fatal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SignalMsg {
    Offer { sdp: SessionDescription },
    Answer { sdp: SessionDescription },
    IceCandidate { candidate: IceCandidate },
    Hangup,
}

impl SignalMsg {
    /// The wire `type` tag, for logging.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Offer { .. } => "offer",
            Self::Answer { .. } => "answer",
            Self::IceCandidate { .. } => "ice-candidate",
            Self::Hangup => "hangup",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::call::SdpType;

    #[test]
    fn envelope_type_tags() {
        let offer = SignalMsg::Offer {
            sdp: SessionDescription {
                kind: SdpType::Offer,
                sdp: "v=0".into(),
            },
        };
        let json = serde_json::to_value(&offer).unwrap();
        assert_eq!(json["type"], "offer");
        assert_eq!(json["sdp"]["type"], "offer");

        let hangup = serde_json::to_value(SignalMsg::Hangup).unwrap();
        assert_eq!(hangup["type"], "hangup");

        let ice = SignalMsg::IceCandidate {
            candidate: IceCandidate(serde_json::json!({"candidate": "candidate:1 1 udp ..."})),
        };
        assert_eq!(serde_json::to_value(&ice).unwrap()["type"], "ice-candidate");
    }

    #[test]
    fn unknown_type_fails_decode() {
        let result: Result<SignalMsg, _> =
            serde_json::from_str(r#"{"type":"chat","text":"hi"}"#);
        assert!(result.is_err());
    }
}
