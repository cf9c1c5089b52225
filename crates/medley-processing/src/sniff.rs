//! Content sniffing.
//!
//! Determines a file's true MIME type from its leading bytes rather than
//! trusting the client-declared name or extension. Never trust uploaded
//! Content-Type headers: magic-number detection is what decides which
//! processing branch a file takes.

use medley_core::MediaKind;

/// Number of leading bytes the validator reads for sniffing.
pub const SNIFF_PREFIX_LEN: usize = 512;

/// Outcome of sniffing a byte prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sniffed {
    pub mime_type: String,
    pub kind: MediaKind,
}

/// Sniff the MIME type of `prefix` and derive the media kind.
///
/// Falls back to `text/plain` for printable UTF-8 without a recognizable
/// signature, and to `application/octet-stream` with kind `unknown` for
/// anything else. Unknown is rejected later by policy, not here.
pub fn sniff_mime(prefix: &[u8]) -> Sniffed {
    if let Some(kind) = infer::get(prefix) {
        let mime_type = kind.mime_type().to_string();
        let kind = MediaKind::from_mime(&mime_type);
        return Sniffed { mime_type, kind };
    }

    if looks_like_text(prefix) {
        return Sniffed {
            mime_type: "text/plain".to_string(),
            kind: MediaKind::Document,
        };
    }

    Sniffed {
        mime_type: "application/octet-stream".to_string(),
        kind: MediaKind::Unknown,
    }
}

/// Printable UTF-8 heuristic: non-empty, decodes cleanly, and contains no
/// control bytes other than whitespace.
fn looks_like_text(prefix: &[u8]) -> bool {
    if prefix.is_empty() {
        return false;
    }
    // The prefix may cut a multi-byte sequence short; ignore the tail.
    let text = match std::str::from_utf8(prefix) {
        Ok(t) => t,
        Err(e) if e.error_len().is_none() => {
            std::str::from_utf8(&prefix[..e.valid_up_to()]).unwrap_or("")
        }
        Err(_) => return false,
    };
    !text.is_empty() && !text.chars().any(|c| c.is_control() && !c.is_whitespace())
}
