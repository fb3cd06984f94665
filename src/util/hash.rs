use sha2::{Digest, Sha256};

/// Compute the SHA-256 fingerprint of a byte buffer as 64 lowercase hex chars.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Normalize a user-supplied SHA-256 string to canonical form.
///
/// Accepts surrounding whitespace, an optional `0x` prefix and mixed case.
/// Returns `None` when the remainder is not exactly 64 hex characters.
pub fn normalize_sha256(input: &str) -> Option<String> {
    let trimmed = input.trim();
    let bare = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if bare.len() != 64 || !bare.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    Some(bare.to_ascii_lowercase())
}
