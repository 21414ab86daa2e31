//! Inheritance resolver: follows `extends` from the target up to its base.

use std::collections::BTreeSet;

use tracing::debug;

use rsec_contracts::{
    error::{RsecError, RsecResult},
    profile::{ProfileDescriptor, ProfileName},
};

use crate::descriptor::ProfileCatalog;

/// The levels of one profile, root base profile first, target last.
#[derive(Debug, Clone)]
pub struct ProfileChain<'a> {
    levels: Vec<&'a ProfileDescriptor>,
}

impl<'a> ProfileChain<'a> {
    /// Root first.
    pub fn levels(&self) -> &[&'a ProfileDescriptor] {
        &self.levels
    }

    /// The base profile anchoring the chain's integrity.
    pub fn root(&self) -> &'a ProfileDescriptor {
        self.levels[0]
    }

    pub fn target(&self) -> &'a ProfileDescriptor {
        self.levels[self.levels.len() - 1]
    }

    pub fn names(&self) -> Vec<ProfileName> {
        self.levels.iter().map(|l| l.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// Build the chain for `target`.
///
/// Every `extends` reference must be `RestrictedSecurity.<group>.<qualifier>`
/// and must name a loaded profile. The root must declare `desc.hash`.
pub fn resolve_chain<'a>(catalog: &'a ProfileCatalog, target: &ProfileName) -> RsecResult<ProfileChain<'a>> {
    let mut current = catalog.get(target).ok_or_else(|| RsecError::Selection {
        reason: format!("{} is not present in the java.security file.", target.prefixed()),
    })?;

    let mut path = vec![current];
    let mut visited = BTreeSet::from([current.name.clone()]);

    while let Some(reference) = current.extends.as_deref() {
        let reference = reference.trim();
        let parent_name = ProfileName::parse_prefixed(reference)
            .filter(ProfileName::is_full)
            .ok_or_else(|| RsecError::Inheritance {
                reason: format!(
                    "{reference} that is supposed to extend '{}' is not a full profile name",
                    current.name.prefixed()
                ),
            })?;

        if visited.contains(&parent_name) {
            let mut cycle: Vec<String> = path.iter().map(|l| l.name.prefixed()).collect();
            cycle.push(parent_name.prefixed());
            return Err(RsecError::Inheritance {
                reason: format!("Circular inheritance detected: {}", cycle.join(" -> ")),
            });
        }

        let parent = catalog.get(&parent_name).ok_or_else(|| RsecError::Inheritance {
            reason: format!(
                "{reference} that is supposed to extend '{}' is not present in the java.security file or any appended files",
                current.name.prefixed()
            ),
        })?;

        debug!(profile = %current.name, parent = %parent.name, "following extends");
        visited.insert(parent_name);
        path.push(parent);
        current = parent;
    }

    path.reverse();
    let chain = ProfileChain { levels: path };

    let root = chain.root();
    if root.description.hash.as_deref().map_or(true, |h| h.trim().is_empty()) {
        return Err(RsecError::Integrity {
            reason: format!(
                "{} is a base profile, so a hash value is mandatory",
                root.name.prefixed()
            ),
        });
    }

    debug!(
        profile = %target,
        base = %root.name,
        depth = chain.len(),
        "resolved inheritance chain"
    );
    Ok(chain)
}

#[cfg(test)]
mod tests {
    use rsec_contracts::source::SourceFile;

    use super::*;
    use crate::loader;

    fn catalog(text: &str) -> ProfileCatalog {
        let raw = loader::load(&[SourceFile::new("main", text)]).unwrap();
        ProfileCatalog::from_raw(&raw)
    }

    fn name(s: &str) -> ProfileName {
        ProfileName::parse(s).unwrap()
    }

    #[test]
    fn chain_is_root_first() {
        let cat = catalog(
            "\
RestrictedSecurity.T.Base.desc.hash = SHA256:00
RestrictedSecurity.T.Mid.extends = RestrictedSecurity.T.Base
RestrictedSecurity.T.Leaf.extends = RestrictedSecurity.T.Mid
",
        );
        let chain = resolve_chain(&cat, &name("T.Leaf")).unwrap();
        let names: Vec<String> = chain.names().iter().map(ToString::to_string).collect();
        assert_eq!(names, vec!["T.Base", "T.Mid", "T.Leaf"]);
        assert_eq!(chain.root().name, name("T.Base"));
        assert_eq!(chain.target().name, name("T.Leaf"));
    }

    #[test]
    fn extends_must_be_a_full_prefixed_name() {
        let cat = catalog(
            "\
RestrictedSecurity.T.Base.desc.hash = SHA256:00
RestrictedSecurity.T.Leaf.extends = T.Base
",
        );
        match resolve_chain(&cat, &name("T.Leaf")) {
            Err(RsecError::Inheritance { reason }) => assert_eq!(
                reason,
                "T.Base that is supposed to extend 'RestrictedSecurity.T.Leaf' is not a full profile name"
            ),
            other => panic!("expected Inheritance error, got {:?}", other),
        }
    }

    #[test]
    fn group_only_parent_is_not_a_full_name() {
        let cat = catalog("RestrictedSecurity.T.Leaf.extends = RestrictedSecurity.T\n");
        assert!(matches!(
            resolve_chain(&cat, &name("T.Leaf")),
            Err(RsecError::Inheritance { reason }) if reason.contains("is not a full profile name")
        ));
    }

    #[test]
    fn missing_parent_is_reported() {
        let cat = catalog("RestrictedSecurity.T.Leaf.extends = RestrictedSecurity.T.Gone\n");
        match resolve_chain(&cat, &name("T.Leaf")) {
            Err(RsecError::Inheritance { reason }) => assert_eq!(
                reason,
                "RestrictedSecurity.T.Gone that is supposed to extend 'RestrictedSecurity.T.Leaf' \
                 is not present in the java.security file or any appended files"
            ),
            other => panic!("expected Inheritance error, got {:?}", other),
        }
    }

    #[test]
    fn cycles_are_detected() {
        let cat = catalog(
            "\
RestrictedSecurity.T.A.extends = RestrictedSecurity.T.B
RestrictedSecurity.T.B.extends = RestrictedSecurity.T.A
",
        );
        match resolve_chain(&cat, &name("T.A")) {
            Err(RsecError::Inheritance { reason }) => assert_eq!(
                reason,
                "Circular inheritance detected: RestrictedSecurity.T.A -> RestrictedSecurity.T.B -> RestrictedSecurity.T.A"
            ),
            other => panic!("expected Inheritance error, got {:?}", other),
        }
    }

    #[test]
    fn base_without_hash_is_an_integrity_error() {
        let cat = catalog(
            "\
RestrictedSecurity.Test-Profile-BaseWithoutHash.desc.name = X
",
        );
        match resolve_chain(&cat, &name("Test-Profile-BaseWithoutHash")) {
            Err(RsecError::Integrity { reason }) => assert_eq!(
                reason,
                "RestrictedSecurity.Test-Profile-BaseWithoutHash is a base profile, so a hash value is mandatory"
            ),
            other => panic!("expected Integrity error, got {:?}", other),
        }
    }
}
