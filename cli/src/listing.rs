//! Text listings printed for the `help`, `audit` and `trace` keywords.

use std::fmt::Write as _;

use rsec_contracts::{
    property::PropertyKey,
    provider::ProviderEntry,
    resolved::ResolvedProfile,
};
use rsec_core::{descriptor::ProfileCatalog, locator};

const RULE: &str = "===============================";

/// Usage of the setting string.
pub fn help() -> String {
    let mut out = String::new();
    out.push('\n');
    out.push_str("Restricted Security Mode Usage:\n");
    out.push_str(RULE);
    out.push('\n');
    out.push_str("--setting <id|name>  Select the restricted security profile mapped to <id>, or the profile named <name>.\n");
    out.push_str("--setting audit      List the name, number, policy and sunset date of every configured profile.\n");
    out.push_str("--setting trace      List the description, properties and providers of the resolved profile.\n");
    out.push_str("--setting help       Print this message.\n");
    out.push('\n');
    out.push_str("e.g.\n");
    out.push_str("    --setting 1,trace,audit,help\n");
    out.push_str("    --setting help\n");
    out.push('\n');
    out
}

/// Description block of every profile in the catalog, sorted by name.
pub fn audit(catalog: &ProfileCatalog) -> String {
    let mut out = String::new();
    out.push('\n');
    out.push_str("Restricted Security Audit Info:\n");
    out.push_str(RULE);
    out.push('\n');

    for profile in locator::list_profiles(catalog) {
        let desc = &profile.description;
        for (suffix, value) in [
            ("desc.name", &desc.name),
            ("desc.number", &desc.number),
            ("desc.policy", &desc.policy),
            ("desc.sunsetDate", &desc.sunset_date),
        ] {
            let _ = writeln!(out, "{}: {}", profile.name.key(suffix), value.as_deref().unwrap_or(""));
        }
        out.push('\n');
    }
    out
}

/// Everything the resolved profile puts in effect.
pub fn trace(profile: &ResolvedProfile) -> String {
    let name = &profile.name;
    let desc = &profile.description;
    let mut out = String::new();
    out.push('\n');
    out.push_str("Restricted Security Trace Info:\n");
    out.push_str(RULE);
    out.push('\n');

    for (suffix, value) in [
        ("desc.name", &desc.name),
        ("desc.number", &desc.number),
        ("desc.policy", &desc.policy),
        ("desc.sunsetDate", &desc.sunset_date),
        ("fips.mode", &profile.fips_mode),
    ] {
        let _ = writeln!(out, "{}: {}", name.key(suffix), value.as_deref().unwrap_or(""));
    }
    let _ = writeln!(out, "{}: {}", name.key("desc.fips"), profile.is_fips);
    out.push('\n');

    for key in PropertyKey::ALL {
        let value = match key {
            PropertyKey::SecureRandomProvider => Some(profile.secure_random.provider.as_str()),
            PropertyKey::SecureRandomAlgorithm => Some(profile.secure_random.algorithm.as_str()),
            _ => profile.property(key),
        };
        let _ = writeln!(out, "{}: {}", name.key(key.suffix()), value.unwrap_or(""));
    }
    out.push('\n');

    for provider in &profile.providers {
        let _ = writeln!(
            out,
            "{}: {}",
            name.key(&format!("jce.provider.{}", provider.position)),
            render_provider(provider)
        );
    }
    out.push('\n');
    out
}

fn render_provider(provider: &ProviderEntry) -> String {
    let declaration = provider.declaration().unwrap_or_default();
    if provider.constraints.is_empty() {
        return declaration;
    }
    let constraints = provider
        .constraints
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!("{declaration} [{constraints}]")
}
