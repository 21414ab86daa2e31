//! Resolver settings loaded from TOML.
//!
//! ```toml
//! expiring_soon_months = 6
//!
//! [flags]
//! suppress_sunset_warning = false
//! ignore_sunset_expiration = false
//!
//! [profile_ids]
//! "1" = "OpenJCEPlusFIPS"
//! "2" = "OpenJCEPlusFIPS.Checkpoint"
//! ```
//!
//! Every field is optional; command-line flags override what is loaded here.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use rsec_contracts::{
    error::{RsecError, RsecResult},
    selector::{PolicyFlags, CHECKPOINT_PROFILE_ID, FIPS_PROFILE_ID},
};

/// Months before the sunset date at which the expiring-soon warning starts.
pub const DEFAULT_EXPIRING_SOON_MONTHS: u32 = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverSettings {
    pub flags: PolicyFlags,
    pub expiring_soon_months: u32,
    /// Profile id → selector, e.g. `"1" → "OpenJCEPlusFIPS"`.
    pub profile_ids: BTreeMap<String, String>,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            flags: PolicyFlags::default(),
            expiring_soon_months: DEFAULT_EXPIRING_SOON_MONTHS,
            profile_ids: default_profile_ids(),
        }
    }
}

fn default_profile_ids() -> BTreeMap<String, String> {
    BTreeMap::from([
        (FIPS_PROFILE_ID.to_string(), "OpenJCEPlusFIPS".to_string()),
        (
            CHECKPOINT_PROFILE_ID.to_string(),
            "OpenJCEPlusFIPS.Checkpoint".to_string(),
        ),
    ])
}

impl ResolverSettings {
    /// Parse `s` as TOML.
    ///
    /// A `[profile_ids]` table replaces the default mapping as a whole.
    pub fn from_toml_str(s: &str) -> RsecResult<Self> {
        let settings: Self = toml::from_str(s).map_err(|e| RsecError::Selection {
            reason: format!("failed to parse resolver settings TOML: {}", e),
        })?;
        debug!(
            expiring_soon_months = settings.expiring_soon_months,
            profile_ids = settings.profile_ids.len(),
            "loaded resolver settings"
        );
        Ok(settings)
    }

    /// Read the file at `path` and parse it as TOML.
    pub fn from_file(path: &Path) -> RsecResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| RsecError::Selection {
            reason: format!("failed to read settings file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Apply command-line flag overrides. `None` keeps the loaded value.
    pub fn with_overrides(mut self, suppress: Option<bool>, ignore: Option<bool>) -> Self {
        if let Some(v) = suppress {
            self.flags.suppress_sunset_warning = v;
        }
        if let Some(v) = ignore {
            self.flags.ignore_sunset_expiration = v;
        }
        self
    }
}
