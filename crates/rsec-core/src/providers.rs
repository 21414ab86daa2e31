//! Provider list merger.
//!
//! Levels are applied root first. The merger keeps one slot per position up
//! to the highest position seen; a slot is either a provider or empty
//! (removed). A gap may only exist at the end of the list.

use std::collections::BTreeSet;

use tracing::debug;

use rsec_contracts::{
    error::{RsecError, RsecResult},
    profile::{ProfileDescriptor, ProfileName},
    provider::ProviderEntry,
};

use crate::constraints::{self, ConstraintList};

/// One parsed `jce.provider.N` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderDecl {
    pub class_name: String,
    pub argument: Option<String>,
    pub constraints: Option<ConstraintList>,
}

/// Parse a provider declaration. `Ok(None)` is an explicit removal.
pub fn parse_declaration(value: &str) -> RsecResult<Option<ProviderDecl>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    if !brackets_balanced(value) {
        return Err(RsecError::Parse {
            reason: format!("Provider format is incorrect: {value}"),
        });
    }

    let (head, list) = match value.find('[') {
        Some(idx) => (value[..idx].trim(), Some(&value[idx..])),
        None => (value, None),
    };
    let (class_name, argument) = match head.split_once(char::is_whitespace) {
        Some((class, arg)) => (class, Some(arg.trim().to_string()).filter(|a| !a.is_empty())),
        None => (head, None),
    };

    if !is_qualified_class_name(class_name) {
        return Err(RsecError::Parse {
            reason: format!("Provider must be specified using the fully-qualified class name: {value}"),
        });
    }

    let constraints = list
        .map(|l| constraints::parse_constraints(l, class_name))
        .transpose()?;

    Ok(Some(ProviderDecl {
        class_name: class_name.to_string(),
        argument,
        constraints,
    }))
}

fn brackets_balanced(value: &str) -> bool {
    let mut stack = Vec::new();
    for c in value.chars() {
        match c {
            '(' | '[' | '{' => stack.push(c),
            ')' | ']' | '}' => {
                let open = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                if stack.pop() != Some(open) {
                    return false;
                }
            }
            _ => {}
        }
    }
    stack.is_empty()
}

/// A dotted sequence of at least two Java identifiers.
pub fn is_qualified_class_name(name: &str) -> bool {
    let mut segments = 0;
    for segment in name.split('.') {
        let mut chars = segment.chars();
        let valid_start = chars
            .next()
            .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$');
        if !valid_start || !chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$') {
            return false;
        }
        segments += 1;
    }
    segments >= 2
}

/// Accumulates provider slots across the levels of a chain.
#[derive(Debug, Clone)]
pub struct ProviderMerger {
    target: ProfileName,
    /// Index 0 is position 1. `None` marks a removed provider.
    slots: Vec<Option<ProviderEntry>>,
}

impl ProviderMerger {
    /// `target` names the profile being resolved; it appears in diagnostics.
    pub fn new(target: ProfileName) -> Self {
        Self {
            target,
            slots: Vec::new(),
        }
    }

    /// The highest position any level has declared so far.
    pub fn high_water(&self) -> u32 {
        self.slots.len() as u32
    }

    /// Apply the `jce.provider.N` declarations of one level.
    pub fn apply_level(&mut self, level: &ProfileDescriptor) -> RsecResult<()> {
        if level.is_base() && level.providers.is_empty() {
            return Err(self.no_providers());
        }

        let mut emptied_here = BTreeSet::new();
        for (&position, raw) in &level.providers {
            let high_water = self.high_water();
            let index = (position - 1) as usize;

            let Some(decl) = parse_declaration(raw)? else {
                if position > high_water || self.slots[index].is_none() {
                    return Err(RsecError::Order {
                        reason: format!(
                            "Cannot specify an empty provider in position {position}. Nothing specified before"
                        ),
                    });
                }
                self.slots[index] = None;
                emptied_here.insert(position);
                continue;
            };

            if position <= high_water {
                let previous = self.slots[index].take();
                self.slots[index] = Some(build_entry(position, decl, previous.as_ref())?);
            } else if position == high_water + 1 {
                if self.slots.iter().any(Option::is_none) {
                    return Err(cannot_add_after_removal(position));
                }
                self.slots.push(Some(build_entry(position, decl, None)?));
            } else {
                return Err(RsecError::Order {
                    reason: format!(
                        "The order numbers of providers in profile {} (or a base profile) are not consecutive.",
                        self.target.prefixed()
                    ),
                });
            }
        }

        self.check_gaps(&emptied_here)?;
        debug!(
            level = %level.name,
            declared = level.providers.len(),
            high_water = self.high_water(),
            "merged provider level"
        );
        Ok(())
    }

    /// A gap must not be followed by a provider.
    fn check_gaps(&self, emptied_here: &BTreeSet<u32>) -> RsecResult<()> {
        let Some(gap) = self.slots.iter().position(Option::is_none) else {
            return Ok(());
        };
        let Some(offset) = self.slots[gap..].iter().position(Option::is_some) else {
            return Ok(());
        };

        let empty_position = gap as u32 + 1;
        if emptied_here.contains(&empty_position) {
            Err(RsecError::Order {
                reason: format!(
                    "Cannot specify an empty provider in position {empty_position} when non-empty ones are specified after it"
                ),
            })
        } else {
            Err(cannot_add_after_removal((gap + offset) as u32 + 1))
        }
    }

    /// The final list, trailing removals dropped. Must not be empty.
    pub fn finish(self) -> RsecResult<Vec<ProviderEntry>> {
        let providers: Vec<ProviderEntry> = self.slots.iter().map_while(|slot| slot.clone()).collect();
        if providers.is_empty() {
            return Err(self.no_providers());
        }
        Ok(providers)
    }

    fn no_providers(&self) -> RsecError {
        RsecError::Order {
            reason: format!(
                "No providers are specified as part of the Restricted Security profile {}",
                self.target.prefixed()
            ),
        }
    }
}

fn cannot_add_after_removal(position: u32) -> RsecError {
    RsecError::Order {
        reason: format!(
            "Cannot add a provider in position {position} after removing the ones in previous positions"
        ),
    }
}

/// Turn a declaration into a slot entry, applying constraint edits against
/// the provider previously at the same position.
fn build_entry(
    position: u32,
    decl: ProviderDecl,
    previous: Option<&ProviderEntry>,
) -> RsecResult<ProviderEntry> {
    let constraints = match decl.constraints {
        None => Vec::new(),
        Some(ConstraintList::Plain(list)) => list,
        Some(ConstraintList::Edits(edits)) => {
            let previous = previous
                .filter(|p| p.class_name.is_some() && !p.constraints.is_empty())
                .ok_or_else(|| RsecError::Constraint {
                    reason: "Constraints of provider not previously specified cannot be modified"
                        .to_string(),
                })?;
            if previous.class_name.as_deref() != Some(decl.class_name.as_str()) {
                return Err(RsecError::Constraint {
                    reason: format!(
                        "Cannot append or remove constraints since the provider {} wasn't in this position in the profile extended",
                        decl.class_name
                    ),
                });
            }
            constraints::apply_edits(&previous.constraints, &edits)?
        }
    };

    Ok(ProviderEntry {
        position,
        class_name: Some(decl.class_name),
        argument: decl.argument,
        constraints,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use proptest::prelude::*;

    use super::*;

    fn level(name: &str, extends: Option<&str>, providers: &[(u32, &str)]) -> ProfileDescriptor {
        let mut d = ProfileDescriptor::new(ProfileName::parse(name).unwrap());
        d.extends = extends.map(str::to_string);
        d.providers = providers
            .iter()
            .map(|(p, v)| (*p, v.to_string()))
            .collect::<BTreeMap<_, _>>();
        d
    }

    fn base() -> ProfileDescriptor {
        level(
            "T.Base",
            None,
            &[
                (1, "sun.security.provider.Sun [{SecureRandom, DRBG, *}, {MessageDigest, SHA-256, *}]"),
                (2, "com.sun.crypto.provider.SunJCE"),
                (3, "sun.security.ssl.SunJSSE"),
            ],
        )
    }

    fn merge(levels: &[ProfileDescriptor]) -> RsecResult<Vec<ProviderEntry>> {
        let target = levels[levels.len() - 1].name.clone();
        let mut merger = ProviderMerger::new(target);
        for l in levels {
            merger.apply_level(l)?;
        }
        merger.finish()
    }

    fn classes(entries: &[ProviderEntry]) -> Vec<&str> {
        entries.iter().filter_map(|e| e.class_name.as_deref()).collect()
    }

    fn order_reason(result: RsecResult<Vec<ProviderEntry>>) -> String {
        match result {
            Err(RsecError::Order { reason }) => reason,
            other => panic!("expected Order error, got {:?}", other),
        }
    }

    const EXT: Option<&str> = Some("RestrictedSecurity.T.Base");

    // ── Declarations ─────────────────────────────────────────────────────────

    #[test]
    fn declaration_splits_class_argument_and_constraints() {
        let decl = parse_declaration(
            "sun.security.pkcs11.SunPKCS11 ${java.home}/conf/security/nss.fips.cfg [{Cipher, AES, *}]",
        )
        .unwrap()
        .unwrap();
        assert_eq!(decl.class_name, "sun.security.pkcs11.SunPKCS11");
        assert_eq!(decl.argument.as_deref(), Some("${java.home}/conf/security/nss.fips.cfg"));
        assert!(matches!(decl.constraints, Some(ConstraintList::Plain(ref c)) if c.len() == 1));
        assert_eq!(parse_declaration("   ").unwrap(), None);
    }

    #[test]
    fn simple_class_name_is_rejected() {
        match parse_declaration("SunJCE") {
            Err(RsecError::Parse { reason }) => {
                assert!(reason.starts_with("Provider must be specified using the fully-qualified class name"))
            }
            other => panic!("expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn unbalanced_brackets_are_rejected() {
        match parse_declaration("sun.security.provider.Sun [{SecureRandom, DRBG, *}") {
            Err(RsecError::Parse { reason }) => assert!(reason.starts_with("Provider format is incorrect")),
            other => panic!("expected Parse error, got {:?}", other),
        }
    }

    // ── Ordering ─────────────────────────────────────────────────────────────

    #[test]
    fn base_list_is_taken_in_order() {
        let list = merge(&[base()]).unwrap();
        assert_eq!(
            classes(&list),
            vec!["sun.security.provider.Sun", "com.sun.crypto.provider.SunJCE", "sun.security.ssl.SunJSSE"]
        );
        assert_eq!(list.iter().map(|e| e.position).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn non_consecutive_base_is_rejected() {
        let bad = level("T.Base", None, &[(1, "a.A"), (3, "c.C")]);
        assert_eq!(
            order_reason(merge(&[bad])),
            "The order numbers of providers in profile RestrictedSecurity.T.Base (or a base profile) are not consecutive."
        );
    }

    #[test]
    fn non_consecutive_extension_names_the_target() {
        let ext = level("T.Ext", EXT, &[(5, "e.E")]);
        assert!(order_reason(merge(&[base(), ext])).contains("RestrictedSecurity.T.Ext (or a base profile)"));
    }

    #[test]
    fn extension_replaces_and_appends() {
        let ext = level("T.Ext", EXT, &[(2, "com.example.Other"), (4, "sun.security.ec.SunEC")]);
        let list = merge(&[base(), ext]).unwrap();
        assert_eq!(
            classes(&list),
            vec![
                "sun.security.provider.Sun",
                "com.example.Other",
                "sun.security.ssl.SunJSSE",
                "sun.security.ec.SunEC"
            ]
        );
    }

    #[test]
    fn trailing_removal_shortens_the_list() {
        let ext = level("T.Ext", EXT, &[(3, "")]);
        let list = merge(&[base(), ext]).unwrap();
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn removal_before_a_kept_provider_is_rejected() {
        let ext = level("T.Ext", EXT, &[(2, "")]);
        assert_eq!(
            order_reason(merge(&[base(), ext])),
            "Cannot specify an empty provider in position 2 when non-empty ones are specified after it"
        );
    }

    #[test]
    fn adding_after_an_inherited_removal_is_rejected() {
        let mid = level("T.Mid", EXT, &[(3, "")]);
        let leaf = level("T.Leaf", Some("RestrictedSecurity.T.Mid"), &[(3, "x.Y"), (4, "x.Z")]);
        // Refilling position 3 is fine; the gap closes.
        assert!(merge(&[base(), mid.clone(), leaf]).is_ok());

        let leaf = level("T.Leaf", Some("RestrictedSecurity.T.Mid"), &[(4, "x.Z")]);
        assert_eq!(
            order_reason(merge(&[base(), mid, leaf])),
            "Cannot add a provider in position 4 after removing the ones in previous positions"
        );
    }

    #[test]
    fn removing_nothing_is_rejected() {
        let bad = level("T.Base", None, &[(1, "a.A"), (2, "")]);
        assert_eq!(
            order_reason(merge(&[bad])),
            "Cannot specify an empty provider in position 2. Nothing specified before"
        );

        let ext = level("T.Ext", EXT, &[(3, ""), (4, "")]);
        assert!(order_reason(merge(&[base(), ext])).ends_with("Nothing specified before"));
    }

    #[test]
    fn base_without_providers_is_rejected() {
        let bad = level("T.Base", None, &[]);
        assert_eq!(
            order_reason(merge(&[bad])),
            "No providers are specified as part of the Restricted Security profile RestrictedSecurity.T.Base"
        );
    }

    #[test]
    fn removing_every_provider_is_rejected() {
        let one = level("T.Base", None, &[(1, "a.A")]);
        let ext = level("T.Ext", EXT, &[(1, "")]);
        assert!(order_reason(merge(&[one, ext])).starts_with("No providers are specified"));
    }

    // ── Constraint edits ─────────────────────────────────────────────────────

    #[test]
    fn constraint_edits_apply_to_the_inherited_provider() {
        let ext = level(
            "T.Ext",
            EXT,
            &[(1, "sun.security.provider.Sun [-{MessageDigest, SHA-256, *}, +{MessageDigest, SHA-512, *}]")],
        );
        let list = merge(&[base(), ext]).unwrap();
        let algs: Vec<&str> = list[0].constraints.iter().map(|c| c.algorithm.as_str()).collect();
        assert_eq!(algs, vec!["DRBG", "SHA-512"]);
    }

    #[test]
    fn constraint_edits_need_a_constrained_provider() {
        let ext = level("T.Ext", EXT, &[(2, "com.sun.crypto.provider.SunJCE [+{Cipher, AES, *}]")]);
        match merge(&[base(), ext]) {
            Err(RsecError::Constraint { reason }) => assert_eq!(
                reason,
                "Constraints of provider not previously specified cannot be modified"
            ),
            other => panic!("expected Constraint error, got {:?}", other),
        }

        let ext = level("T.Ext", EXT, &[(4, "x.New [+{Cipher, AES, *}]")]);
        assert!(matches!(merge(&[base(), ext]), Err(RsecError::Constraint { .. })));
    }

    #[test]
    fn constraint_edits_need_the_same_class() {
        let ext = level("T.Ext", EXT, &[(1, "com.example.Impostor [+{Cipher, AES, *}]")]);
        match merge(&[base(), ext]) {
            Err(RsecError::Constraint { reason }) => assert!(reason.contains(
                "provider com.example.Impostor wasn't in this position in the profile extended"
            )),
            other => panic!("expected Constraint error, got {:?}", other),
        }
    }

    #[test]
    fn constraint_removal_of_unknown_pair_is_rejected() {
        let ext = level("T.Ext", EXT, &[(1, "sun.security.provider.Sun [-{Cipher, DES, *}]")]);
        match merge(&[base(), ext]) {
            Err(RsecError::Constraint { reason }) => {
                assert!(reason.ends_with("is not part of existing constraints"))
            }
            other => panic!("expected Constraint error, got {:?}", other),
        }
    }

    // ── Properties ───────────────────────────────────────────────────────────

    proptest! {
        #[test]
        fn accepted_chains_yield_contiguous_positions(
            base_len in 1u32..6,
            ops in proptest::collection::vec((1u32..9, any::<bool>()), 0..6),
        ) {
            let base_providers: Vec<(u32, String)> =
                (1..=base_len).map(|p| (p, format!("p.Base{p}"))).collect();
            let mut base = ProfileDescriptor::new(ProfileName::parse("T.Base").unwrap());
            base.providers = base_providers.into_iter().collect();

            let mut ext = ProfileDescriptor::new(ProfileName::parse("T.Ext").unwrap());
            ext.extends = EXT.map(str::to_string);
            for (position, remove) in ops {
                let value = if remove { String::new() } else { format!("p.Ext{position}") };
                ext.providers.insert(position, value);
            }

            if let Ok(list) = merge(&[base, ext]) {
                let positions: Vec<u32> = list.iter().map(|e| e.position).collect();
                let expected: Vec<u32> = (1..=list.len() as u32).collect();
                prop_assert_eq!(positions, expected);
                prop_assert!(list.iter().all(|e| e.class_name.is_some()));
            }
        }
    }
}
