//! SDP codec-preference rewriter.
//!
//! Pure text transform: moves the preferred video codec's payload type to
//! the front of the `m=video` line so the remote peer negotiates it first,
//! optionally injecting a capability extension line.
//!
//! Fail-open by construction: any malformed or non-matching input is
//! returned unchanged, because a broken rewrite would break call setup
//! entirely.

use tracing::debug;

use crate::domain::call::CodecDescriptor;

/// Media-section marker for video.
const VIDEO_MEDIA_MARKER: &str = "m=video";
/// Codec-mapping attribute prefix.
const RTPMAP_PREFIX: &str = "a=rtpmap:";

/// AV1 RTP dependency-descriptor header extension, announced alongside the
/// codec preference.
pub const AV1_DEPENDENCY_DESCRIPTOR_EXTMAP: &str = "a=extmap:12 https://aomediacodec.github.io/av1-rtp-spec/#dependency-descriptor-rtp-header-extension";

// ---------------------------------------------------------------------------
// Preference
// ---------------------------------------------------------------------------

/// Which codec to steer negotiation toward.
#[derive(Debug, Clone)]
pub struct CodecPreference {
    /// Lowercase substrings matched (case-insensitively) against codec MIME
    /// types and `rtpmap` codec names, in order.
    pub matchers: Vec<String>,
    /// Extension line inserted immediately after the video media line.
    pub extension_line: Option<String>,
}

impl CodecPreference {
    /// The AV1 preference the system ships with. Matches the MIME spellings
    /// engines are known to report (`video/AV01`, `AV1`).
    pub fn av1() -> Self {
        Self {
            matchers: vec!["av01".into(), "av1".into()],
            extension_line: Some(AV1_DEPENDENCY_DESCRIPTOR_EXTMAP.into()),
        }
    }

    /// Whether any locally reported codec matches this preference.
    pub fn is_supported(&self, supported: &[CodecDescriptor]) -> bool {
        supported.iter().any(|codec| {
            let mime = codec.mime_type.to_lowercase();
            self.matchers.iter().any(|m| mime.contains(m.as_str()))
        })
    }

    fn matches_line(&self, lowercased_line: &str) -> bool {
        self.matchers.iter().any(|m| lowercased_line.contains(m.as_str()))
    }
}

// ---------------------------------------------------------------------------
// Rewrite
// ---------------------------------------------------------------------------

/// Rewrite `sdp` so the preferred codec's payload type comes first in the
/// video media line.
///
/// Idempotent: a second application is a no-op, including the extension
/// line (it is only inserted when not already present right after the
/// media line). Never changes the description type, never reorders
/// non-video media sections, and returns the input unchanged when the
/// preferred codec or the video section is absent.
pub fn rewrite(sdp: &str, supported: &[CodecDescriptor], pref: &CodecPreference) -> String {
    // Step 1: only rewrite when the local engine can actually send the
    // preferred codec.
    if !pref.is_supported(supported) {
        debug!("preferred codec not in local capabilities, leaving SDP unchanged");
        return sdp.to_string();
    }

    // Preserve the original separator when rejoining.
    let sep = if sdp.contains("\r\n") { "\r\n" } else { "\n" };
    let mut lines: Vec<String> = sdp.split(sep).map(str::to_string).collect();

    // Step 2: locate the first video media line.
    let Some(m_line_index) = lines
        .iter()
        .position(|l| l.starts_with(VIDEO_MEDIA_MARKER))
    else {
        return sdp.to_string();
    };

    // Step 3: from the media line forward, find the first rtpmap whose
    // codec name matches the preference and take its payload-type token.
    let mut payload_type: Option<String> = None;
    for line in &lines[m_line_index..] {
        if !line.starts_with(RTPMAP_PREFIX) {
            continue;
        }
        if !pref.matches_line(&line.to_lowercase()) {
            continue;
        }
        let rest = &line[RTPMAP_PREFIX.len()..];
        let token: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
        if !token.is_empty() {
            debug!(payload_type = %token, rtpmap = %line, "found preferred codec");
            payload_type = Some(token);
            break;
        }
    }
    let Some(payload_type) = payload_type else {
        return sdp.to_string();
    };

    // Step 4: move the matched payload type to the front of the media
    // line's payload list, preserving the relative order of the rest.
    let new_media_line = {
        let parts: Vec<&str> = lines[m_line_index].split(' ').collect();
        if parts.len() <= 3 {
            // Media line carries no payload list; nothing to reorder.
            return sdp.to_string();
        }
        let mut payload_types: Vec<&str> = vec![payload_type.as_str()];
        payload_types.extend(
            parts[3..]
                .iter()
                .copied()
                .filter(|&pt| pt != payload_type.as_str()),
        );
        format!("{} {}", parts[..3].join(" "), payload_types.join(" "))
    };
    lines[m_line_index] = new_media_line;

    // Step 5: inject the extension line right after the media line, unless
    // an earlier pass already put it there (keeps the rewrite idempotent).
    if let Some(ext) = &pref.extension_line {
        let already_present = lines.get(m_line_index + 1).map(String::as_str) == Some(ext.as_str());
        if !already_present {
            lines.insert(m_line_index + 1, ext.clone());
        }
    }

    lines.join(sep)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn av1_capabilities() -> Vec<CodecDescriptor> {
        vec![
            CodecDescriptor {
                mime_type: "video/VP8".into(),
                payload_type: "96".into(),
                clock_rate: 90_000,
            },
            CodecDescriptor {
                mime_type: "video/AV01".into(),
                payload_type: "98".into(),
                clock_rate: 90_000,
            },
        ]
    }

    fn sample_sdp() -> String {
        [
            "v=0",
            "o=- 0 0 IN IP4 127.0.0.1",
            "m=audio 9 UDP/TLS/RTP/SAVPF 111",
            "a=rtpmap:111 opus/48000/2",
            "m=video 9 UDP/TLS/RTP/SAVPF 96 97 98",
            "a=rtpmap:96 VP8/90000",
            "a=rtpmap:97 VP9/90000",
            "a=rtpmap:98 AV1/90000",
        ]
        .join("\n")
    }

    #[test]
    fn moves_preferred_payload_type_first() {
        // The stock matcher set: "av01" hits the capability MIME type,
        // "av1" the rtpmap codec name. No extension line here so the
        // reordering is checked on its own.
        let pref = CodecPreference {
            matchers: vec!["av01".into(), "av1".into()],
            extension_line: None,
        };
        let out = rewrite(&sample_sdp(), &av1_capabilities(), &pref);
        assert!(out.contains("m=video 9 UDP/TLS/RTP/SAVPF 98 96 97"));
        // Audio section untouched.
        assert!(out.contains("m=audio 9 UDP/TLS/RTP/SAVPF 111"));
    }

    #[test]
    fn inserts_extension_line_after_media_line() {
        let pref = CodecPreference::av1();
        let out = rewrite(&sample_sdp(), &av1_capabilities(), &pref);
        let lines: Vec<&str> = out.split('\n').collect();
        let m_index = lines.iter().position(|l| l.starts_with("m=video")).unwrap();
        assert_eq!(lines[m_index + 1], AV1_DEPENDENCY_DESCRIPTOR_EXTMAP);
    }

    #[test]
    fn rewrite_is_idempotent() {
        let pref = CodecPreference::av1();
        let once = rewrite(&sample_sdp(), &av1_capabilities(), &pref);
        let twice = rewrite(&once, &av1_capabilities(), &pref);
        assert_eq!(once, twice);
    }

    #[test]
    fn no_video_section_is_a_no_op() {
        let sdp = "v=0\nm=audio 9 UDP/TLS/RTP/SAVPF 111\na=rtpmap:111 opus/48000/2";
        let out = rewrite(sdp, &av1_capabilities(), &CodecPreference::av1());
        assert_eq!(out, sdp);
    }

    #[test]
    fn unsupported_codec_is_a_no_op() {
        let caps = vec![CodecDescriptor {
            mime_type: "video/VP8".into(),
            payload_type: "96".into(),
            clock_rate: 90_000,
        }];
        let sdp = sample_sdp();
        assert_eq!(rewrite(&sdp, &caps, &CodecPreference::av1()), sdp);
    }

    #[test]
    fn no_matching_rtpmap_is_a_no_op() {
        let sdp = [
            "v=0",
            "m=video 9 UDP/TLS/RTP/SAVPF 96 97",
            "a=rtpmap:96 VP8/90000",
            "a=rtpmap:97 VP9/90000",
        ]
        .join("\n");
        let out = rewrite(&sdp, &av1_capabilities(), &CodecPreference::av1());
        assert_eq!(out, sdp);
    }

    #[test]
    fn preserves_crlf_separators() {
        let sdp = sample_sdp().replace('\n', "\r\n");
        let out = rewrite(&sdp, &av1_capabilities(), &CodecPreference::av1());
        assert!(out.contains("\r\n"));
        assert!(out.contains("m=video 9 UDP/TLS/RTP/SAVPF 98 96 97"));
    }

    #[test]
    fn malformed_media_line_is_a_no_op() {
        let sdp = "m=video\na=rtpmap:98 AV1/90000";
        let out = rewrite(sdp, &av1_capabilities(), &CodecPreference::av1());
        assert_eq!(out, sdp);
    }

    #[test]
    fn capability_check_matches_substring_case_insensitively() {
        let pref = CodecPreference::av1();
        assert!(pref.is_supported(&av1_capabilities()));
        assert!(!pref.is_supported(&[]));
    }
}
