//! Publication of a resolved profile to the host.
//!
//! A `ProfileSlot` holds the profile currently in effect. Publishing applies
//! the new table through the `SecurityHost` and then swaps the slot; holders
//! of the previous `Arc` keep a valid, unchanged value.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::info;

use rsec_contracts::{error::RsecResult, resolved::ResolvedProfile};

use crate::{materialize, traits::SecurityHost};

#[derive(Debug, Default)]
pub struct ProfileSlot {
    current: RwLock<Option<Arc<ResolvedProfile>>>,
}

impl ProfileSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// The profile in effect, if any has been published.
    pub fn current(&self) -> Option<Arc<ResolvedProfile>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Apply `profile` to `host` and make it current.
    ///
    /// On a re-resolution the host first restores the provider list it had
    /// before the first publication. If the host fails, the slot keeps the
    /// previous profile.
    pub fn publish(
        &self,
        profile: ResolvedProfile,
        host: &dyn SecurityHost,
    ) -> RsecResult<Arc<ResolvedProfile>> {
        let table = materialize::security_table(&profile);
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);

        if let Some(previous) = current.as_ref() {
            info!(previous = %previous.name, next = %profile.name, "re-resolving restricted security profile");
            host.restore_previous_providers()?;
        }
        host.apply(&table)?;

        let published = Arc::new(profile);
        *current = Some(Arc::clone(&published));
        info!(profile = %published.name, entries = table.len(), "restricted security profile published");
        Ok(published)
    }
}
