//! Profile names and per-level profile descriptors.
//!
//! A profile is addressed as `RestrictedSecurity.<group>[.<qualifier>]` and
//! every key it declares lives under that prefix. Profiles that share a group
//! are siblings; the group name alone selects the sibling marked default.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::property::PropertyKey;

/// Namespace prefix of every profile key.
pub const PROFILE_PREFIX: &str = "RestrictedSecurity";

/// First segments of recognized property suffixes.
///
/// A qualifier may not use one of these names, otherwise
/// `RestrictedSecurity.<group>.<head>…` would be ambiguous.
pub const RESERVED_HEADS: &[&str] = &[
    "desc",
    "jce",
    "tls",
    "fips",
    "securerandom",
    "keystore",
    "certpath",
    "security",
    "extends",
];

/// A dotted profile identifier: a group plus an optional qualifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProfileName {
    group: String,
    qualifier: Option<String>,
}

impl ProfileName {
    /// Build a name from its parts. Parts are taken as given.
    pub fn new(group: impl Into<String>, qualifier: Option<String>) -> Self {
        Self {
            group: group.into(),
            qualifier,
        }
    }

    /// Parse `group` or `group.qualifier`, without the namespace prefix.
    ///
    /// Returns `None` for empty parts, more than one dot, or a reserved
    /// qualifier.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let mut parts = s.split('.');
        let group = parts.next().filter(|g| !g.is_empty())?;
        let qualifier = match parts.next() {
            None => None,
            Some(q) if q.is_empty() || RESERVED_HEADS.contains(&q) => return None,
            Some(q) => Some(q.to_string()),
        };
        if parts.next().is_some() {
            return None;
        }
        Some(Self::new(group, qualifier))
    }

    /// Parse a reference of the form `RestrictedSecurity.<name>`.
    pub fn parse_prefixed(s: &str) -> Option<Self> {
        let rest = s.trim().strip_prefix(PROFILE_PREFIX)?.strip_prefix('.')?;
        Self::parse(rest)
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    /// True when both the group and the qualifier are present.
    pub fn is_full(&self) -> bool {
        self.qualifier.is_some()
    }

    /// The name with its namespace prefix, as used in diagnostics.
    pub fn prefixed(&self) -> String {
        format!("{PROFILE_PREFIX}.{self}")
    }

    /// The full configuration key for `suffix` in this profile.
    pub fn key(&self, suffix: &str) -> String {
        format!("{}.{}", self.prefixed(), suffix)
    }
}

impl fmt::Display for ProfileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(q) => write!(f, "{}.{}", self.group, q),
            None => f.write_str(&self.group),
        }
    }
}

/// The `desc.*` block of a profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDescription {
    /// Human-readable profile name (`desc.name`).
    pub name: Option<String>,
    /// Certificate number (`desc.number`).
    pub number: Option<String>,
    /// Policy text or URL (`desc.policy`).
    pub policy: Option<String>,
    /// Raw `yyyy-MM-dd` sunset date (`desc.sunsetDate`).
    pub sunset_date: Option<String>,
    /// Raw hash declaration (`desc.hash`), e.g. `SHA256:ab12…`.
    pub hash: Option<String>,
}

impl ProfileDescription {
    /// Fill every unset field from `parent`.
    ///
    /// The hash is never inherited; only base profiles carry one.
    pub fn inherit_from(&mut self, parent: &ProfileDescription) {
        fn fill(slot: &mut Option<String>, from: &Option<String>) {
            if slot.is_none() {
                slot.clone_from(from);
            }
        }
        fill(&mut self.name, &parent.name);
        fill(&mut self.number, &parent.number);
        fill(&mut self.policy, &parent.policy);
        fill(&mut self.sunset_date, &parent.sunset_date);
    }
}

/// Everything a single profile level declares, classified by key.
///
/// Built once from the loaded properties. Values are kept as raw strings;
/// provider declarations are parsed later, level by level, so that errors
/// surface in chain order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDescriptor {
    pub name: ProfileName,
    pub description: ProfileDescription,
    /// Raw `desc.default` value.
    pub default_flag: Option<String>,
    /// Raw `desc.fips` value.
    pub fips_flag: Option<String>,
    /// `fips.mode`, e.g. `140-3`.
    pub fips_mode: Option<String>,
    /// Raw `extends` reference, e.g. `RestrictedSecurity.Group.Base`.
    pub extends: Option<String>,
    /// `jce.provider.N` declarations keyed by N. An empty string is a removal.
    pub providers: BTreeMap<u32, String>,
    /// Scalar security properties declared at this level.
    pub scalars: BTreeMap<PropertyKey, String>,
    /// Full keys under this profile's prefix that match no known suffix.
    pub unrecognized: Vec<String>,
    /// Every full key of this profile with its value, hash line included.
    pub entries: BTreeMap<String, String>,
}

impl ProfileDescriptor {
    /// An empty descriptor for `name`.
    pub fn new(name: ProfileName) -> Self {
        Self {
            name,
            description: ProfileDescription::default(),
            default_flag: None,
            fips_flag: None,
            fips_mode: None,
            extends: None,
            providers: BTreeMap::new(),
            scalars: BTreeMap::new(),
            unrecognized: Vec::new(),
            entries: BTreeMap::new(),
        }
    }

    /// A base profile declares no parent.
    pub fn is_base(&self) -> bool {
        self.extends.is_none()
    }

    pub fn is_default(&self) -> bool {
        flag_is_true(self.default_flag.as_deref())
    }

    pub fn is_fips(&self) -> bool {
        flag_is_true(self.fips_flag.as_deref())
    }
}

fn flag_is_true(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}
