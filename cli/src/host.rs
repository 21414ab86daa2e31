//! `SecurityHost` over an in-memory copy of the host's security properties.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use rsec_contracts::{error::RsecResult, profile::PROFILE_PREFIX, source::RawProperties};
use rsec_core::{materialize::PROVIDER_KEY_PREFIX, traits::SecurityHost};

/// The effective security table: host defaults overlaid with the profile.
#[derive(Debug, Default)]
pub struct TableHost {
    baseline: BTreeMap<String, String>,
    live: Mutex<BTreeMap<String, String>>,
}

impl TableHost {
    /// Start from every non-profile property of the loaded files.
    pub fn from_raw(raw: &RawProperties) -> Self {
        let baseline: BTreeMap<String, String> = raw
            .iter()
            .filter(|(k, _)| !is_profile_key(k))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            live: Mutex::new(baseline.clone()),
            baseline,
        }
    }

    /// Snapshot of the live table.
    pub fn table(&self) -> BTreeMap<String, String> {
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

fn is_profile_key(key: &str) -> bool {
    key.strip_prefix(PROFILE_PREFIX)
        .is_some_and(|rest| rest.starts_with('.'))
}

fn is_provider_key(key: &str) -> bool {
    key.starts_with(PROVIDER_KEY_PREFIX)
}

impl SecurityHost for TableHost {
    fn apply(&self, table: &BTreeMap<String, String>) -> RsecResult<()> {
        let mut live = self.live.lock().unwrap_or_else(PoisonError::into_inner);
        live.retain(|k, _| !is_provider_key(k));
        live.extend(table.iter().map(|(k, v)| (k.clone(), v.clone())));
        debug!(entries = table.len(), "applied security table");
        Ok(())
    }

    fn restore_previous_providers(&self) -> RsecResult<()> {
        let mut live = self.live.lock().unwrap_or_else(PoisonError::into_inner);
        live.retain(|k, _| !is_provider_key(k));
        live.extend(
            self.baseline
                .iter()
                .filter(|(k, _)| is_provider_key(k))
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        debug!("restored host provider list");
        Ok(())
    }
}
