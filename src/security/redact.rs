//! Secret redaction for broker payloads.
//!
//! Raw envelopes are attached to decode errors for diagnostics. Before that
//! happens, the contents of every secret-bearing element are replaced:
//! - `dbuserpwd` (ciphertext or placeholder password)
//! - `randomcode` (nonce, half of the decryption key)
//! - `appcode` (application check code, the other half)

use lazy_static::lazy_static;
use regex::Regex;
use sha2::{Digest, Sha256};

/// Elements whose text is never shown.
pub const SECRET_ELEMENTS: &[&str] = &["dbuserpwd", "randomcode", "appcode"];

/// Maximum payload characters kept in an error.
pub const MAX_PAYLOAD_PREVIEW: usize = 2048;

pub const REDACTED: &str = "[REDACTED]";

lazy_static! {
    /// One pattern per secret element. An unterminated element is redacted
    /// up to the end of the payload.
    static ref SECRET_PATTERNS: Vec<Regex> = SECRET_ELEMENTS
        .iter()
        .map(|tag| {
            Regex::new(&format!(
                r"(?is)(<{tag}(?:\s[^>/]*)?>)(.*?)(</{tag}\s*>|$)",
                tag = tag
            ))
            .unwrap()
        })
        .collect();
}

/// Redact secret element contents and cap the length.
pub fn redact_payload(payload: &str) -> String {
    let mut redacted = payload.to_string();
    for pattern in SECRET_PATTERNS.iter() {
        redacted = pattern
            .replace_all(&redacted, format!("${{1}}{}${{3}}", REDACTED).as_str())
            .into_owned();
    }

    if redacted.chars().count() > MAX_PAYLOAD_PREVIEW {
        let mut truncated: String = redacted.chars().take(MAX_PAYLOAD_PREVIEW).collect();
        truncated.push_str("...[truncated]");
        truncated
    } else {
        redacted
    }
}

/// Short SHA256 fingerprint of a payload, safe to log.
pub fn payload_fingerprint(payload: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    hex::encode(hasher.finalize())[..12].to_string()
}
