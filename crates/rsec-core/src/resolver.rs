//! The resolver: one pure pass from loaded properties to a `ResolvedProfile`.
//!
//!   Locate → Chain → Validate keys → Providers → Scalars → Integrity → Sunset → Materialize
//!
//! Nothing is published here. The caller decides what to do with the result;
//! an error at any stage means no profile at all.

use std::collections::BTreeMap;

use tracing::{debug, info};

use rsec_contracts::{
    error::RsecResult,
    profile::ProfileDescription,
    property::PropertyKey,
    resolved::ResolvedProfile,
    source::RawProperties,
};

use crate::{
    descriptor::ProfileCatalog,
    inheritance::{self, ProfileChain},
    locator, materialize,
    providers::ProviderMerger,
    traits::{IntegrityChecker, PropertyValidator},
};

/// Drives a resolution pass.
///
/// Owns the trusted validator and integrity checker; every call to
/// `resolve()` runs the full pipeline against them.
pub struct Resolver {
    validator: Box<dyn PropertyValidator>,
    integrity: Box<dyn IntegrityChecker>,
}

impl Resolver {
    pub fn new(validator: Box<dyn PropertyValidator>, integrity: Box<dyn IntegrityChecker>) -> Self {
        Self { validator, integrity }
    }

    /// Resolve the profile `selector` refers to.
    ///
    /// # Errors
    ///
    /// Any `RsecError` kind. Sunset warnings are not errors; they go to the
    /// integrity checker's diagnostic sink.
    pub fn resolve(&self, raw: &RawProperties, selector: &str) -> RsecResult<ResolvedProfile> {
        let catalog = ProfileCatalog::from_raw(raw);

        // ── Locate and build the chain ───────────────────────────────────────
        let name = locator::locate(&catalog, selector)?;
        let chain = inheritance::resolve_chain(&catalog, &name)?;
        debug!(profile = %name, depth = chain.len(), "resolving profile chain");

        // ── Key schema, nearest level first ──────────────────────────────────
        for level in chain.levels().iter().rev() {
            self.validator.check_level(level)?;
        }

        // ── Providers, root first ────────────────────────────────────────────
        let mut merger = ProviderMerger::new(name.clone());
        for level in chain.levels() {
            merger.apply_level(level)?;
        }
        let providers = merger.finish()?;

        // ── Scalar properties, root first ────────────────────────────────────
        let mut properties: BTreeMap<PropertyKey, String> = BTreeMap::new();
        for level in chain.levels() {
            properties = self.validator.merge_level(&properties, level, raw)?;
        }

        // ── Integrity anchor and sunset ──────────────────────────────────────
        self.integrity.verify_hash(chain.root())?;
        let description = merged_description(&chain);
        let sunset = self.integrity.evaluate_sunset(&name, &description)?;

        // ── Materialize ──────────────────────────────────────────────────────
        let secure_random = materialize::take_secure_random(&mut properties)?;
        let is_fips = chain
            .levels()
            .iter()
            .rev()
            .find(|l| l.fips_flag.is_some())
            .is_some_and(|l| l.is_fips());
        let fips_mode = chain.levels().iter().rev().find_map(|l| l.fips_mode.clone());

        let resolved = ResolvedProfile {
            name,
            chain: chain.names(),
            description,
            is_fips,
            fips_mode,
            providers,
            properties,
            secure_random,
            sunset,
        };

        info!(
            profile = %resolved.name,
            base = %resolved.base(),
            providers = resolved.providers.len(),
            sunset = %resolved.sunset.date,
            "restricted security profile resolved"
        );
        Ok(resolved)
    }
}

/// Description fields from the nearest level that sets each one, with the
/// root's hash.
fn merged_description(chain: &ProfileChain<'_>) -> ProfileDescription {
    let mut description = ProfileDescription::default();
    for level in chain.levels().iter().rev() {
        description.inherit_from(&level.description);
    }
    description.hash.clone_from(&chain.root().description.hash);
    description
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use chrono::NaiveDate;
    use rsec_contracts::{
        error::RsecError,
        profile::{ProfileDescriptor, ProfileName},
        resolved::{SunsetReport, SunsetStatus},
        source::SourceFile,
    };

    use super::*;
    use crate::loader;

    // ── Mock helpers ─────────────────────────────────────────────────────────

    /// Accepts every key; a level's scalar replaces the inherited one.
    struct MockValidator {
        checked: Arc<Mutex<Vec<String>>>,
    }

    impl PropertyValidator for MockValidator {
        fn check_level(&self, level: &ProfileDescriptor) -> RsecResult<()> {
            self.checked.lock().unwrap().push(level.name.to_string());
            Ok(())
        }

        fn merge_level(
            &self,
            inherited: &BTreeMap<PropertyKey, String>,
            level: &ProfileDescriptor,
            _host: &RawProperties,
        ) -> RsecResult<BTreeMap<PropertyKey, String>> {
            let mut out = inherited.clone();
            out.extend(level.scalars.iter().map(|(k, v)| (*k, v.clone())));
            Ok(out)
        }
    }

    /// Passes or fails the hash check; records the sunset description.
    struct MockIntegrity {
        hash_ok: bool,
        sunset_seen: Arc<Mutex<Option<ProfileDescription>>>,
    }

    impl IntegrityChecker for MockIntegrity {
        fn verify_hash(&self, base: &ProfileDescriptor) -> RsecResult<()> {
            if self.hash_ok {
                Ok(())
            } else {
                Err(RsecError::Integrity {
                    reason: format!(
                        "Hex produced from profile {} does not match the declared hash value",
                        base.name.prefixed()
                    ),
                })
            }
        }

        fn evaluate_sunset(
            &self,
            _profile: &ProfileName,
            description: &ProfileDescription,
        ) -> RsecResult<SunsetReport> {
            *self.sunset_seen.lock().unwrap() = Some(description.clone());
            Ok(SunsetReport {
                date: NaiveDate::from_ymd_opt(2099, 12, 31).unwrap(),
                status: SunsetStatus::NotExpired,
            })
        }
    }

    struct Harness {
        resolver: Resolver,
        checked: Arc<Mutex<Vec<String>>>,
        sunset_seen: Arc<Mutex<Option<ProfileDescription>>>,
    }

    fn harness(hash_ok: bool) -> Harness {
        let checked = Arc::new(Mutex::new(vec![]));
        let sunset_seen = Arc::new(Mutex::new(None));
        let resolver = Resolver::new(
            Box::new(MockValidator {
                checked: Arc::clone(&checked),
            }),
            Box::new(MockIntegrity {
                hash_ok,
                sunset_seen: Arc::clone(&sunset_seen),
            }),
        );
        Harness {
            resolver,
            checked,
            sunset_seen,
        }
    }

    fn raw(text: &str) -> RawProperties {
        loader::load(&[SourceFile::new("java.security", text)]).unwrap()
    }

    const CONFIG: &str = "\
RestrictedSecurity.T.Base.desc.name = Base
RestrictedSecurity.T.Base.desc.default = true
RestrictedSecurity.T.Base.desc.fips = true
RestrictedSecurity.T.Base.desc.number = Certificate #0001
RestrictedSecurity.T.Base.desc.sunsetDate = 2099-12-31
RestrictedSecurity.T.Base.desc.hash = SHA256:00
RestrictedSecurity.T.Base.fips.mode = 140-3
RestrictedSecurity.T.Base.jce.provider.1 = sun.security.provider.Sun [{SecureRandom, DRBG, *}]
RestrictedSecurity.T.Base.jce.provider.2 = com.sun.crypto.provider.SunJCE
RestrictedSecurity.T.Base.securerandom.provider = SUN
RestrictedSecurity.T.Base.securerandom.algorithm = DRBG
RestrictedSecurity.T.Base.keystore.type = PKCS12
RestrictedSecurity.T.Ext.desc.name = Extended
RestrictedSecurity.T.Ext.extends = RestrictedSecurity.T.Base
RestrictedSecurity.T.Ext.jce.provider.3 = sun.security.ec.SunEC
RestrictedSecurity.T.Ext.keystore.type = PKCS11
";

    // ── Tests ────────────────────────────────────────────────────────────────

    #[test]
    fn resolves_group_default_base_profile() {
        let h = harness(true);
        let resolved = h.resolver.resolve(&raw(CONFIG), "T").unwrap();

        assert_eq!(resolved.name.to_string(), "T.Base");
        assert!(resolved.is_fips);
        assert_eq!(resolved.fips_mode.as_deref(), Some("140-3"));
        assert_eq!(resolved.providers.len(), 2);
        assert_eq!(resolved.secure_random.provider, "SUN");
        assert_eq!(resolved.property(PropertyKey::KeystoreType), Some("PKCS12"));
        assert!(resolved.property(PropertyKey::SecureRandomProvider).is_none());
    }

    #[test]
    fn extension_inherits_and_overrides() {
        let h = harness(true);
        let resolved = h.resolver.resolve(&raw(CONFIG), "T.Ext").unwrap();

        let chain: Vec<String> = resolved.chain.iter().map(ToString::to_string).collect();
        assert_eq!(chain, vec!["T.Base", "T.Ext"]);
        assert_eq!(resolved.base().to_string(), "T.Base");
        assert_eq!(
            resolved.provider_class_names(),
            vec![
                "sun.security.provider.Sun",
                "com.sun.crypto.provider.SunJCE",
                "sun.security.ec.SunEC"
            ]
        );
        assert_eq!(resolved.property(PropertyKey::KeystoreType), Some("PKCS11"));
        assert!(resolved.is_fips);

        // Nearest description wins field by field; the hash is the root's.
        let seen = h.sunset_seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.name.as_deref(), Some("Extended"));
        assert_eq!(seen.number.as_deref(), Some("Certificate #0001"));
        assert_eq!(seen.hash.as_deref(), Some("SHA256:00"));
    }

    #[test]
    fn keys_are_checked_target_first() {
        let h = harness(true);
        h.resolver.resolve(&raw(CONFIG), "T.Ext").unwrap();
        assert_eq!(*h.checked.lock().unwrap(), vec!["T.Ext", "T.Base"]);
    }

    #[test]
    fn hash_failure_aborts_resolution() {
        let h = harness(false);
        match h.resolver.resolve(&raw(CONFIG), "T.Ext") {
            Err(RsecError::Integrity { reason }) => {
                assert!(reason.contains("RestrictedSecurity.T.Base"), "unexpected: {reason}")
            }
            other => panic!("expected Integrity error, got {:?}", other),
        }
        assert!(h.sunset_seen.lock().unwrap().is_none());
    }

    #[test]
    fn missing_secure_random_is_a_selection_error() {
        let text = CONFIG.replace("RestrictedSecurity.T.Base.securerandom.algorithm = DRBG\n", "");
        let h = harness(true);
        assert!(matches!(
            h.resolver.resolve(&raw(&text), "T"),
            Err(RsecError::Selection { reason }) if reason.contains("secure random is missing")
        ));
    }

    #[test]
    fn resolution_is_deterministic() {
        let h = harness(true);
        let props = raw(CONFIG);
        let first = h.resolver.resolve(&props, "T.Ext").unwrap();
        let second = h.resolver.resolve(&props, "T.Ext").unwrap();
        assert_eq!(first, second);
        assert_eq!(materialize::security_table(&first), materialize::security_table(&second));
    }
}
