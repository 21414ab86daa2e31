//! Profile materializer: the flat security-property table a host applies.

use std::collections::BTreeMap;

use rsec_contracts::{
    error::{RsecError, RsecResult},
    property::PropertyKey,
    resolved::{ResolvedProfile, SecureRandom},
};

/// Prefix of the host's ordered provider list.
pub const PROVIDER_KEY_PREFIX: &str = "security.provider.";

/// Pull the mandatory secure random pair out of merged properties.
///
/// Both halves are removed from `properties`, so the remaining map holds
/// only the properties written under their own host names.
pub fn take_secure_random(properties: &mut BTreeMap<PropertyKey, String>) -> RsecResult<SecureRandom> {
    let provider = properties.remove(&PropertyKey::SecureRandomProvider);
    let algorithm = properties.remove(&PropertyKey::SecureRandomAlgorithm);

    match (provider, algorithm) {
        (Some(provider), Some(algorithm))
            if !provider.trim().is_empty() && !algorithm.trim().is_empty() =>
        {
            Ok(SecureRandom {
                provider: provider.trim().to_string(),
                algorithm: algorithm.trim().to_string(),
            })
        }
        _ => Err(RsecError::Selection {
            reason: "Restricted security mode secure random is missing".to_string(),
        }),
    }
}

/// Build the output table.
///
/// `security.provider.N` for every provider, each merged property under its
/// host name, and the secure random pair.
pub fn security_table(profile: &ResolvedProfile) -> BTreeMap<String, String> {
    let mut table = BTreeMap::new();

    for provider in &profile.providers {
        if let Some(declaration) = provider.declaration() {
            table.insert(format!("{PROVIDER_KEY_PREFIX}{}", provider.position), declaration);
        }
    }
    for (key, value) in &profile.properties {
        table.insert(key.host_name().to_string(), value.clone());
    }
    table.insert(
        PropertyKey::SecureRandomProvider.host_name().to_string(),
        profile.secure_random.provider.clone(),
    );
    table.insert(
        PropertyKey::SecureRandomAlgorithm.host_name().to_string(),
        profile.secure_random.algorithm.clone(),
    );
    table
}
