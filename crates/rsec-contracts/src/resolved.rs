//! The flattened result of a resolution pass.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::profile::{ProfileDescription, ProfileName};
use crate::property::PropertyKey;
use crate::provider::ProviderEntry;

/// Where a profile stands relative to its sunset date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SunsetStatus {
    NotExpired,
    /// Within the warning window before the sunset date.
    ExpiringSoon,
    /// Past the sunset date, allowed by the ignore-expiration flag.
    ExpiredIgnored,
}

/// Outcome of sunset evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SunsetReport {
    pub date: NaiveDate,
    pub status: SunsetStatus,
}

/// The mandatory secure random pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecureRandom {
    pub provider: String,
    pub algorithm: String,
}

/// A fully merged profile, ready to hand to the bootstrap collaborator.
///
/// Never mutated after construction. A later resolution pass produces a new
/// value instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedProfile {
    /// The selected profile.
    pub name: ProfileName,
    /// Ancestor chain, root base profile first, `name` last.
    pub chain: Vec<ProfileName>,
    /// Description fields, each taken from the nearest level that sets it.
    pub description: ProfileDescription,
    pub is_fips: bool,
    pub fips_mode: Option<String>,
    /// Providers at positions `1..=N`, in order.
    pub providers: Vec<ProviderEntry>,
    /// Merged scalar properties, secure random excluded.
    pub properties: BTreeMap<PropertyKey, String>,
    pub secure_random: SecureRandom,
    pub sunset: SunsetReport,
}

impl ResolvedProfile {
    /// The root base profile whose hash anchors the chain.
    pub fn base(&self) -> &ProfileName {
        self.chain.first().unwrap_or(&self.name)
    }

    pub fn provider_class_names(&self) -> Vec<&str> {
        self.providers
            .iter()
            .filter_map(|p| p.class_name.as_deref())
            .collect()
    }

    pub fn property(&self, key: PropertyKey) -> Option<&str> {
        self.properties.get(&key).map(String::as_str)
    }
}
