//! Value operators for scalar properties.
//!
//! A declared value either replaces the inherited one, or edits an
//! appendable comma-separated list:
//!
//! ```text
//! RestrictedSecurity.G.Ext.tls.disabledAlgorithms = + TLSv1.1, DTLSv1.0
//! RestrictedSecurity.G.Ext.tls.legacyAlgorithms = - NULL
//! ```
//!
//! The operator is a leading `+` or `-` followed by whitespace, so values
//! such as `-1` stay plain.

use rsec_contracts::{
    error::{RsecError, RsecResult},
    property::PropertyKey,
};

/// Separator used when re-joining list items.
pub const ITEM_SEPARATOR: &str = ", ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueOp {
    Replace(String),
    Append(Vec<String>),
    Remove(Vec<String>),
}

impl ValueOp {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let mut chars = raw.chars();
        match (chars.next(), chars.next()) {
            (Some('+'), Some(c)) if c.is_whitespace() => Self::Append(split_items(&raw[1..])),
            (Some('-'), Some(c)) if c.is_whitespace() => Self::Remove(split_items(&raw[1..])),
            _ => Self::Replace(raw.to_string()),
        }
    }

    pub fn is_edit(&self) -> bool {
        !matches!(self, Self::Replace(_))
    }
}

/// Split a comma-separated list into trimmed, non-empty items.
pub fn split_items(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Apply `op` for `key` on top of `current`.
///
/// `full_key` is the declaring profile's key, used in diagnostics. `current`
/// is the inherited value, or the host value when no level has set one.
pub fn apply(
    key: PropertyKey,
    full_key: &str,
    current: Option<&str>,
    op: &ValueOp,
) -> RsecResult<String> {
    let items = match op {
        ValueOp::Replace(value) => return Ok(value.clone()),
        ValueOp::Append(items) | ValueOp::Remove(items) => items,
    };

    if !key.is_appendable() {
        return Err(RsecError::Schema {
            reason: format!("Property '{full_key}' is not appendable"),
        });
    }
    let current = current.ok_or_else(|| RsecError::Schema {
        reason: format!(
            "Property '{full_key}' does not exist in parent profile or java.security file. Cannot append"
        ),
    })?;

    let mut values = split_items(current);
    match op {
        ValueOp::Append(_) => {
            for item in items {
                if !values.contains(item) {
                    values.push(item.clone());
                }
            }
        }
        _ => {
            for item in items {
                let before = values.len();
                values.retain(|v| v != item);
                if values.len() == before {
                    return Err(RsecError::Schema {
                        reason: format!("Value '{item}' is not in existing values"),
                    });
                }
            }
        }
    }
    Ok(values.join(ITEM_SEPARATOR))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "RestrictedSecurity.G.Ext.tls.disabledAlgorithms";

    #[test]
    fn operators_need_trailing_whitespace() {
        assert_eq!(ValueOp::parse("+ a, b"), ValueOp::Append(vec!["a".into(), "b".into()]));
        assert_eq!(ValueOp::parse("-\tNULL"), ValueOp::Remove(vec!["NULL".into()]));
        assert_eq!(ValueOp::parse("-1"), ValueOp::Replace("-1".into()));
        assert_eq!(ValueOp::parse("SSLv3, TLSv1"), ValueOp::Replace("SSLv3, TLSv1".into()));
        assert!(!ValueOp::parse("x").is_edit());
    }

    #[test]
    fn append_skips_existing_items() {
        let out = apply(
            PropertyKey::TlsDisabledAlgorithms,
            KEY,
            Some("SSLv3, TLSv1"),
            &ValueOp::parse("+ TLSv1, TLSv1.1"),
        )
        .unwrap();
        assert_eq!(out, "SSLv3, TLSv1, TLSv1.1");
    }

    #[test]
    fn remove_drops_items() {
        let out = apply(
            PropertyKey::TlsDisabledAlgorithms,
            KEY,
            Some("SSLv3, TLSv1, RC4"),
            &ValueOp::parse("- TLSv1"),
        )
        .unwrap();
        assert_eq!(out, "SSLv3, RC4");
    }

    #[test]
    fn removing_an_absent_item_fails() {
        match apply(PropertyKey::TlsDisabledAlgorithms, KEY, Some("SSLv3"), &ValueOp::parse("- RC4")) {
            Err(RsecError::Schema { reason }) => assert_eq!(reason, "Value 'RC4' is not in existing values"),
            other => panic!("expected Schema error, got {:?}", other),
        }
    }

    #[test]
    fn operators_on_non_appendable_keys_fail() {
        let key = "RestrictedSecurity.G.Ext.keystore.type";
        match apply(PropertyKey::KeystoreType, key, Some("PKCS12"), &ValueOp::parse("+ JKS")) {
            Err(RsecError::Schema { reason }) => {
                assert_eq!(reason, format!("Property '{key}' is not appendable"))
            }
            other => panic!("expected Schema error, got {:?}", other),
        }
    }

    #[test]
    fn operators_without_a_base_value_fail() {
        match apply(PropertyKey::TlsDisabledAlgorithms, KEY, None, &ValueOp::parse("+ RC4")) {
            Err(RsecError::Schema { reason }) => assert!(reason.ends_with("Cannot append")),
            other => panic!("expected Schema error, got {:?}", other),
        }
    }

    #[test]
    fn plain_value_replaces_anything() {
        let out = apply(PropertyKey::KeystoreType, "k", None, &ValueOp::parse(" PKCS11 ")).unwrap();
        assert_eq!(out, "PKCS11");
    }
}
