//! Profile locator: selector string → `ProfileName`.

use tracing::debug;

use rsec_contracts::{
    error::{RsecError, RsecResult},
    profile::{ProfileDescriptor, ProfileName},
};

use crate::descriptor::ProfileCatalog;

/// Find the profile a selector refers to.
///
/// A dotted selector must name an existing profile. A dotless selector is
/// either an unqualified profile or a group, in which case the single member
/// marked `desc.default = true` is chosen.
pub fn locate(catalog: &ProfileCatalog, selector: &str) -> RsecResult<ProfileName> {
    let selector = selector.trim();
    let not_present = || RsecError::Selection {
        reason: format!("RestrictedSecurity.{selector} is not present in the java.security file."),
    };

    let name = ProfileName::parse(selector).ok_or_else(not_present)?;
    if name.is_full() || catalog.contains(&name) {
        if !catalog.contains(&name) {
            return Err(not_present());
        }
        debug!(profile = %name, "located profile by name");
        return Ok(name);
    }

    let members: Vec<&ProfileDescriptor> = catalog.members(name.group()).collect();
    if members.is_empty() {
        return Err(not_present());
    }

    let mut defaults = members.iter().filter(|p| p.is_default());
    let chosen = match (defaults.next(), defaults.next()) {
        (Some(only), None) => only,
        (Some(_), Some(_)) => {
            return Err(RsecError::Selection {
                reason: format!("Multiple default RestrictedSecurity profiles for {selector}"),
            })
        }
        (None, _) => {
            return Err(RsecError::Selection {
                reason: format!("No default RestrictedSecurity profile was found for {selector}"),
            })
        }
    };

    debug!(group = %selector, profile = %chosen.name, "located default profile of group");
    Ok(chosen.name.clone())
}

/// Every profile in the catalog, sorted by name.
pub fn list_profiles(catalog: &ProfileCatalog) -> Vec<&ProfileDescriptor> {
    catalog.iter().collect()
}
