//! Classifies loaded keys into one `ProfileDescriptor` per profile.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use rsec_contracts::{
    profile::{ProfileDescriptor, ProfileName, PROFILE_PREFIX, RESERVED_HEADS},
    property::{DescField, ProfileKey},
    source::RawProperties,
};

/// Every profile found in the loaded properties, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct ProfileCatalog {
    profiles: BTreeMap<ProfileName, ProfileDescriptor>,
}

impl ProfileCatalog {
    /// Group all `RestrictedSecurity.…` keys by profile.
    pub fn from_raw(raw: &RawProperties) -> Self {
        let mut profiles: BTreeMap<ProfileName, ProfileDescriptor> = BTreeMap::new();

        for (key, value) in raw.iter() {
            let Some((name, suffix)) = split_profile_key(key) else {
                continue;
            };
            let descriptor = profiles
                .entry(name.clone())
                .or_insert_with(|| ProfileDescriptor::new(name));
            classify(descriptor, key, suffix, value);
        }
        fold_stray_qualifiers(&mut profiles);

        debug!(profiles = profiles.len(), "built profile catalog");
        Self { profiles }
    }

    pub fn get(&self, name: &ProfileName) -> Option<&ProfileDescriptor> {
        self.profiles.get(name)
    }

    pub fn contains(&self, name: &ProfileName) -> bool {
        self.profiles.contains_key(name)
    }

    /// All profiles in name order.
    pub fn iter(&self) -> impl Iterator<Item = &ProfileDescriptor> {
        self.profiles.values()
    }

    /// Profiles whose group is `group`.
    pub fn members<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a ProfileDescriptor> {
        self.profiles.values().filter(move |p| p.name.group() == group)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

/// Hand the keys of a phantom qualified profile back to its unqualified owner.
///
/// For an unqualified profile `G`, a key such as `G.tlsx.disabledAlgorithms`
/// splits as profile `G.tlsx`. When such a profile has no recognized key, is
/// not the target of any `extends`, and `G` exists, its keys are typos in `G`
/// and are reported there as unrecognized.
fn fold_stray_qualifiers(profiles: &mut BTreeMap<ProfileName, ProfileDescriptor>) {
    let referenced: BTreeSet<ProfileName> = profiles
        .values()
        .filter_map(|p| p.extends.as_deref())
        .filter_map(ProfileName::parse_prefixed)
        .collect();

    let stray: Vec<ProfileName> = profiles
        .iter()
        .filter(|(name, descriptor)| {
            name.is_full()
                && descriptor.unrecognized.len() == descriptor.entries.len()
                && !referenced.contains(*name)
                && profiles.contains_key(&ProfileName::new(name.group(), None))
        })
        .map(|(name, _)| name.clone())
        .collect();

    for name in stray {
        let Some(phantom) = profiles.remove(&name) else {
            continue;
        };
        if let Some(owner) = profiles.get_mut(&ProfileName::new(name.group(), None)) {
            debug!(profile = %owner.name, keys = phantom.entries.len(), "unrecognized keys folded into profile");
            owner.entries.extend(phantom.entries);
            owner.unrecognized.extend(phantom.unrecognized);
            owner.unrecognized.sort();
        }
    }
}

/// Split `RestrictedSecurity.<group>[.<qualifier>].<suffix>`.
///
/// The segment after the group is a qualifier unless it is a reserved head
/// such as `desc` or `jce`. The suffix may be empty for malformed keys; those
/// are still attributed to a profile so they can be reported.
pub fn split_profile_key(key: &str) -> Option<(ProfileName, &str)> {
    let rest = key.strip_prefix(PROFILE_PREFIX)?.strip_prefix('.')?;
    let (group, after) = rest.split_once('.').unwrap_or((rest, ""));
    if group.is_empty() {
        return None;
    }

    let (second, after_second) = after.split_once('.').unwrap_or((after, ""));
    if second.is_empty() || RESERVED_HEADS.contains(&second) {
        return Some((ProfileName::new(group, None), after));
    }
    Some((ProfileName::new(group, Some(second.to_string())), after_second))
}

fn classify(descriptor: &mut ProfileDescriptor, key: &str, suffix: &str, value: &str) {
    descriptor.entries.insert(key.to_string(), value.to_string());
    let value = Some(value.to_string());

    match ProfileKey::parse(suffix) {
        Some(ProfileKey::Desc(field)) => {
            let desc = &mut descriptor.description;
            match field {
                DescField::Name => desc.name = value,
                DescField::Number => desc.number = value,
                DescField::Policy => desc.policy = value,
                DescField::SunsetDate => desc.sunset_date = value,
                DescField::Hash => desc.hash = value,
                DescField::Default => descriptor.default_flag = value,
                DescField::Fips => descriptor.fips_flag = value,
            }
        }
        Some(ProfileKey::FipsMode) => descriptor.fips_mode = value,
        Some(ProfileKey::Extends) => descriptor.extends = value,
        Some(ProfileKey::Provider(position)) => {
            descriptor
                .providers
                .insert(position, value.unwrap_or_default());
        }
        Some(ProfileKey::Scalar(property)) => {
            descriptor
                .scalars
                .insert(property, value.unwrap_or_default());
        }
        None => descriptor.unrecognized.push(key.to_string()),
    }
}
