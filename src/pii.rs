//! Normalization and hashing of personal data before it leaves the service.
//!
//! Meta matches hashed identifiers against its own hashes, so values are
//! trimmed and lowercased before digesting. Raw values must never be logged
//! or forwarded.

use sha2::{Digest, Sha256};

/// SHA-256 of the trimmed, lowercased value (hex encoded).
pub fn sha256_hex(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.trim().to_lowercase().as_bytes());
    hex::encode(hasher.finalize())
}

/// Keeps only ASCII digits: `"+1 (555) 123-4567"` becomes `"15551234567"`.
pub fn phone_digits(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Hashed phone for the `ph` match key, `None` when the value has no digits.
pub fn hash_phone(raw: &str) -> Option<String> {
    let digits = phone_digits(raw);
    if digits.is_empty() {
        None
    } else {
        Some(sha256_hex(&digits))
    }
}
