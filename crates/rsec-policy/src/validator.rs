//! Schema validator for profile levels.
//!
//! `SchemaValidator` implements the `PropertyValidator` trait from rsec-core.
//!
//! Per level:
//!
//! 1. Reject unrecognized keys, all of a level's offenders in one error.
//! 2. Reject `desc.default` / `desc.fips` values other than `true`/`false`.
//! 3. Merge scalar declarations onto the inherited values (see `schema`).

use std::collections::BTreeMap;

use tracing::debug;

use rsec_contracts::{
    error::{RsecError, RsecResult},
    profile::ProfileDescriptor,
    property::PropertyKey,
    source::RawProperties,
};
use rsec_core::traits::PropertyValidator;

use crate::schema::{self, ValueOp};

#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaValidator;

impl SchemaValidator {
    pub fn new() -> Self {
        Self
    }
}

impl PropertyValidator for SchemaValidator {
    fn check_level(&self, level: &ProfileDescriptor) -> RsecResult<()> {
        if !level.unrecognized.is_empty() {
            return Err(RsecError::Schema {
                reason: format!(
                    "The property names: {} in profile {} (or a base profile) are not recognized",
                    level.unrecognized.join(", "),
                    level.name.prefixed()
                ),
            });
        }

        for (suffix, value) in [
            ("desc.default", &level.default_flag),
            ("desc.fips", &level.fips_flag),
        ] {
            if let Some(value) = value {
                let v = value.trim();
                if !v.eq_ignore_ascii_case("true") && !v.eq_ignore_ascii_case("false") {
                    return Err(RsecError::Schema {
                        reason: format!(
                            "Value '{value}' of property '{}' must be true or false",
                            level.name.key(suffix)
                        ),
                    });
                }
            }
        }

        debug!(level = %level.name, keys = level.entries.len(), "profile keys recognized");
        Ok(())
    }

    fn merge_level(
        &self,
        inherited: &BTreeMap<PropertyKey, String>,
        level: &ProfileDescriptor,
        host: &RawProperties,
    ) -> RsecResult<BTreeMap<PropertyKey, String>> {
        let mut merged = inherited.clone();

        for (&key, raw) in &level.scalars {
            let op = ValueOp::parse(raw);
            let current = inherited
                .get(&key)
                .map(String::as_str)
                .or_else(|| host.get(key.host_name()));
            let value = schema::apply(key, &level.name.key(key.suffix()), current, &op)?;

            debug!(
                level = %level.name,
                property = %key,
                edit = op.is_edit(),
                "merged property"
            );
            merged.insert(key, value);
        }
        Ok(merged)
    }
}
