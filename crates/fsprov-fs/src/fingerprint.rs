//! SHA-256 content fingerprints
//!
//! A fingerprint is the lowercase hex SHA-256 digest of a payload (64
//! characters). It seeds entity identities and stands in for file content in
//! canonical state; content is never reconstructed from it.

use sha2::{Digest, Sha256};
use std::io::Read;

/// Length in characters of every fingerprint.
pub const FINGERPRINT_LEN: usize = 64;

/// Fingerprint a byte payload.
pub fn fingerprint(payload: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload);
    format!("{:x}", hasher.finalize())
}

/// Fingerprint string content.
pub fn fingerprint_str(content: &str) -> String {
    fingerprint(content.as_bytes())
}

/// Fingerprint everything readable from `reader`, streaming.
///
/// # Errors
///
/// Returns the reader's I/O error unchanged.
pub fn fingerprint_reader(mut reader: impl Read) -> std::io::Result<String> {
    let mut hasher = Sha256::new();
    std::io::copy(&mut reader, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}
