//! Provider and service gate over a resolved profile.
//!
//! Answers the two questions a provider framework asks while running under a
//! restricted profile: may this provider be registered, and may this
//! provider supply this service?

use std::collections::BTreeMap;

use tracing::debug;

use rsec_contracts::{
    provider::{AttrValue, BindingMode, ProviderEntry, ServiceConstraint},
    resolved::ResolvedProfile,
};

/// A service a provider offers, as seen by the gate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceRequest {
    /// Provider name, e.g. `SunPKCS11-NSS-FIPS` or a class name.
    pub provider: String,
    pub service_type: String,
    pub algorithm: String,
    /// Service attributes. Names are matched case-insensitively.
    pub attributes: BTreeMap<String, String>,
    /// Implementing class, checked against `FullClassName` bindings.
    pub class_name: Option<String>,
    /// Module of the implementing class, for `ModuleAndFullClassName`.
    pub module: Option<String>,
}

/// Read-only view of a profile's provider list.
#[derive(Debug, Clone, Copy)]
pub struct ProviderGate<'a> {
    profile: &'a ResolvedProfile,
}

impl<'a> ProviderGate<'a> {
    pub fn new(profile: &'a ResolvedProfile) -> Self {
        Self { profile }
    }

    /// True when `name` is one of the profile's providers.
    ///
    /// Accepts a class name, a simple name, or a simple name with a
    /// `-argument` suffix such as `SunPKCS11-NSS-FIPS`.
    pub fn is_provider_allowed(&self, name: &str) -> bool {
        let allowed = self.find(name).is_some();
        debug!(provider = %name, allowed, "provider check");
        allowed
    }

    /// True when `service` matches at least one constraint of its provider.
    ///
    /// A provider without constraints allows every service. A provider that
    /// is not in the profile allows none.
    pub fn is_service_allowed(&self, service: &ServiceRequest) -> bool {
        let Some(entry) = self.find(&service.provider) else {
            debug!(provider = %service.provider, "service check for provider outside profile");
            return false;
        };
        let allowed = entry.constraints.is_empty()
            || entry.constraints.iter().any(|c| constraint_matches(c, service));
        debug!(
            provider = %service.provider,
            service_type = %service.service_type,
            algorithm = %service.algorithm,
            allowed,
            "service check"
        );
        allowed
    }

    fn find(&self, name: &str) -> Option<&'a ProviderEntry> {
        let wanted = normalize(name);
        self.profile
            .providers
            .iter()
            .find(|p| p.simple_name() == Some(wanted))
    }
}

/// `pkg.SunPKCS11` / `SunPKCS11-NSS-FIPS` → `SunPKCS11`.
fn normalize(name: &str) -> &str {
    let simple = name.rsplit('.').next().unwrap_or(name);
    match simple.find('-') {
        Some(pos) if pos > 0 => &simple[..pos],
        _ => simple,
    }
}

fn constraint_matches(constraint: &ServiceConstraint, service: &ServiceRequest) -> bool {
    let type_ok = constraint.service_type == "*" || constraint.service_type == service.service_type;
    let algorithm_ok = constraint.algorithm == "*" || constraint.algorithm == service.algorithm;
    if !type_ok || !algorithm_ok {
        return false;
    }

    let attributes_ok = constraint.attributes.iter().all(|(name, expected)| {
        let actual = service
            .attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.trim());
        match (expected, actual) {
            (_, None) => false,
            (AttrValue::Text(text), Some(actual)) => text.eq_ignore_ascii_case(actual),
            (AttrValue::Range { min, max }, Some(actual)) => actual
                .parse::<u32>()
                .is_ok_and(|size| (*min..=*max).contains(&size)),
        }
    });
    if !attributes_ok {
        return false;
    }

    match &constraint.binding {
        None => true,
        Some(binding) => {
            let class = service.class_name.as_deref();
            match binding.mode {
                BindingMode::FullClassName => class == Some(binding.target.as_str()),
                BindingMode::ModuleAndFullClassName => match (service.module.as_deref(), class) {
                    (Some(module), Some(class)) => binding.target == format!("{module}/{class}"),
                    _ => false,
                },
            }
        }
    }
}
