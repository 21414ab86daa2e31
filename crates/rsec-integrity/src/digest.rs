//! Integrity anchor of a base profile.
//!
//! Hash input: every key of the base profile except its `desc.hash`, in
//! sorted order, rendered `key=value` and joined by `\n`, as UTF-8 bytes.
//! The digest is SHA-256, compared as lowercase hex against the declared
//! `SHA256:<hex>` value.

use sha2::{Digest, Sha256};

use rsec_contracts::{
    error::{RsecError, RsecResult},
    profile::{ProfileDescriptor, ProfileName},
};

/// Algorithm tags accepted in a hash declaration, compared case-insensitively.
pub const ACCEPTED_TAGS: &[&str] = &["SHA256", "SHA-256"];

const HEX_LEN: usize = 64;

/// The text the digest is computed over.
pub fn canonical_content(base: &ProfileDescriptor) -> String {
    let hash_key = base.name.key("desc.hash");
    base.entries
        .iter()
        .filter(|(k, _)| **k != hash_key)
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Lowercase hex SHA-256 of `canonical_content(base)`.
pub fn profile_digest(base: &ProfileDescriptor) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_content(base).as_bytes());
    hex::encode(hasher.finalize())
}

/// Parse `SHA256:<64 hex>` into lowercase hex.
pub fn parse_declaration(raw: &str, profile: &ProfileName) -> RsecResult<String> {
    let malformed = || RsecError::Integrity {
        reason: format!("Incorrect definition of hash value for {}", profile.prefixed()),
    };

    let (tag, value) = raw.trim().split_once(':').ok_or_else(malformed)?;
    if !ACCEPTED_TAGS.iter().any(|t| t.eq_ignore_ascii_case(tag.trim())) {
        return Err(malformed());
    }
    let value = value.trim();
    if value.len() != HEX_LEN || !value.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(malformed());
    }
    Ok(value.to_ascii_lowercase())
}

/// Check the base profile's declared hash against its content.
pub fn verify(base: &ProfileDescriptor) -> RsecResult<()> {
    let declared = base.description.hash.as_deref().ok_or_else(|| RsecError::Integrity {
        reason: format!(
            "{} is a base profile, so a hash value is mandatory",
            base.name.prefixed()
        ),
    })?;
    let expected = parse_declaration(declared, &base.name)?;

    if profile_digest(base) != expected {
        return Err(RsecError::Integrity {
            reason: format!(
                "Hex produced from profile {} does not match the declared hash value",
                base.name.prefixed()
            ),
        });
    }
    Ok(())
}
