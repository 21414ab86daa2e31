//! Constraint parser and edit application.
//!
//! A provider declaration may end in a bracketed list:
//!
//! ```text
//! [ {Type, Algorithm, Attributes[, Mode:Target]}, … ]
//! ```
//!
//! `Attributes` is `*` or `Name=Value` pairs joined by `:`. In an extension
//! every entry may instead carry a `+` (add) or `-` (remove) prefix, which
//! edits the constraints inherited at the same position.

use std::collections::BTreeMap;

use rsec_contracts::{
    error::{RsecError, RsecResult},
    provider::{AttrValue, Binding, BindingMode, ServiceConstraint},
};

/// Attribute whose value may be a range.
pub const KEY_SIZE_ATTR: &str = "KeySize";

/// A parsed constraint list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintList {
    /// Replaces whatever the position held before.
    Plain(Vec<ServiceConstraint>),
    /// Modifies the constraints of the inherited provider.
    Edits(Vec<ConstraintEdit>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintEdit {
    Add(ServiceConstraint),
    Remove(ServiceConstraint),
}

/// Parse the bracketed list that follows `provider`'s class name.
pub fn parse_constraints(text: &str, provider: &str) -> RsecResult<ConstraintList> {
    let incorrect = || RsecError::Parse {
        reason: format!("Incorrect constraint definition for provider {provider}"),
    };

    let inner = text
        .trim()
        .strip_prefix('[')
        .and_then(|t| t.strip_suffix(']'))
        .ok_or_else(incorrect)?;

    let mut plain = Vec::new();
    let mut edits = Vec::new();
    let mut rest = inner.trim_start();

    while !rest.is_empty() {
        let (sign, after_sign) = match rest.chars().next() {
            Some('+') => (Some('+'), rest[1..].trim_start()),
            Some('-') => (Some('-'), rest[1..].trim_start()),
            _ => (None, rest),
        };
        let body_start = after_sign.strip_prefix('{').ok_or_else(incorrect)?;
        let close = body_start.find('}').ok_or_else(incorrect)?;
        let body = &body_start[..close];
        if body.contains('{') {
            return Err(incorrect());
        }
        let constraint = parse_entry(body, provider)?;

        match sign {
            None => plain.push(constraint),
            Some('+') => edits.push(ConstraintEdit::Add(constraint)),
            Some(_) => edits.push(ConstraintEdit::Remove(constraint)),
        }

        rest = body_start[close + 1..].trim_start();
        if let Some(r) = rest.strip_prefix(',') {
            rest = r.trim_start();
            if rest.is_empty() {
                return Err(incorrect());
            }
        } else if !rest.is_empty() {
            return Err(incorrect());
        }
    }

    match (plain.is_empty(), edits.is_empty()) {
        (false, true) => Ok(ConstraintList::Plain(plain)),
        (true, false) => Ok(ConstraintList::Edits(edits)),
        _ => Err(incorrect()),
    }
}

fn parse_entry(body: &str, provider: &str) -> RsecResult<ServiceConstraint> {
    let incorrect = || RsecError::Parse {
        reason: format!("Incorrect constraint definition for provider {provider}"),
    };

    let fields: Vec<&str> = body.split(',').map(str::trim).collect();
    if !(3..=4).contains(&fields.len()) || fields.iter().any(|f| f.is_empty()) {
        return Err(incorrect());
    }

    let binding = match fields.get(3) {
        None => None,
        Some(raw) => {
            let (mode, target) = raw.split_once(':').ok_or_else(incorrect)?;
            let mode = BindingMode::parse(mode.trim()).ok_or_else(incorrect)?;
            let target = target.trim();
            if target.is_empty() {
                return Err(incorrect());
            }
            Some(Binding {
                mode,
                target: target.to_string(),
            })
        }
    };

    Ok(ServiceConstraint {
        service_type: fields[0].to_string(),
        algorithm: fields[1].to_string(),
        attributes: parse_attributes(fields[2])?,
        binding,
    })
}

/// Parse `*` or `Name=Value[:Name=Value…]`.
pub fn parse_attributes(raw: &str) -> RsecResult<BTreeMap<String, AttrValue>> {
    let incorrect = || RsecError::Parse {
        reason: format!("Constraint attributes format is incorrect: {raw}"),
    };

    let mut attributes = BTreeMap::new();
    if raw.trim() == "*" {
        return Ok(attributes);
    }

    for pair in raw.split(':') {
        let (name, value) = pair.split_once('=').ok_or_else(incorrect)?;
        let (name, value) = (name.trim(), value.trim());
        if name.is_empty() || value.is_empty() {
            return Err(incorrect());
        }
        let value = if name.eq_ignore_ascii_case(KEY_SIZE_ATTR) {
            parse_key_size(value).ok_or_else(incorrect)?
        } else {
            AttrValue::Text(value.to_string())
        };
        attributes.insert(name.to_string(), value);
    }
    Ok(attributes)
}

fn parse_key_size(value: &str) -> Option<AttrValue> {
    let (min, max) = match value.split_once('-') {
        Some((lo, hi)) => (lo.trim().parse().ok()?, hi.trim().parse().ok()?),
        None => {
            let n = value.parse().ok()?;
            (n, n)
        }
    };
    (min <= max).then_some(AttrValue::Range { min, max })
}

/// Apply `edits` in order to an inherited constraint list.
///
/// Adding an identical constraint is a no-op. Removal matches on
/// (type, algorithm) and fails when nothing matches.
pub fn apply_edits(
    existing: &[ServiceConstraint],
    edits: &[ConstraintEdit],
) -> RsecResult<Vec<ServiceConstraint>> {
    let mut out = existing.to_vec();
    for edit in edits {
        match edit {
            ConstraintEdit::Add(c) => {
                if !out.contains(c) {
                    out.push(c.clone());
                }
            }
            ConstraintEdit::Remove(c) => {
                let before = out.len();
                out.retain(|e| !e.same_service(c));
                if out.len() == before {
                    return Err(RsecError::Constraint {
                        reason: format!(
                            "Constraint {{{}, {}}} is not part of existing constraints",
                            c.service_type, c.algorithm
                        ),
                    });
                }
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(text: &str) -> Vec<ServiceConstraint> {
        match parse_constraints(text, "p.P").unwrap() {
            ConstraintList::Plain(list) => list,
            other => panic!("expected plain list, got {:?}", other),
        }
    }

    // ── Parsing ──────────────────────────────────────────────────────────────

    #[test]
    fn parses_wildcard_and_attribute_entries() {
        let list = plain(
            "[ {SecureRandom, DRBG, *}, \
               {Signature, SHA256withRSA, ImplementedIn=Software:KeySize=2048-4096} ]",
        );
        assert_eq!(list.len(), 2);
        assert!(list[0].attributes.is_empty());
        assert_eq!(list[1].algorithm, "SHA256withRSA");
        assert_eq!(
            list[1].attributes.get("KeySize"),
            Some(&AttrValue::Range { min: 2048, max: 4096 })
        );
        assert_eq!(
            list[1].attributes.get("ImplementedIn"),
            Some(&AttrValue::Text("Software".to_string()))
        );
    }

    #[test]
    fn parses_bindings() {
        let list = plain(
            "[{Cipher, AES, *, FullClassName:com.sun.crypto.provider.AESCipher}, \
              {KeyStore, PKCS12, *, ModuleAndFullClassName:java.base/sun.security.pkcs12.PKCS12KeyStore}]",
        );
        let binding = list[1].binding.as_ref().unwrap();
        assert_eq!(binding.mode, BindingMode::ModuleAndFullClassName);
        assert_eq!(binding.target, "java.base/sun.security.pkcs12.PKCS12KeyStore");
    }

    #[test]
    fn single_key_size_is_a_degenerate_range() {
        let list = plain("[{KeyPairGenerator, RSA, KeySize=3072}]");
        assert_eq!(
            list[0].attributes.get("KeySize"),
            Some(&AttrValue::Range { min: 3072, max: 3072 })
        );
    }

    #[test]
    fn parses_edit_lists() {
        match parse_constraints("[+{Cipher, AES, *}, -{MessageDigest, MD5, *}]", "p.P").unwrap() {
            ConstraintList::Edits(edits) => {
                assert!(matches!(&edits[0], ConstraintEdit::Add(c) if c.algorithm == "AES"));
                assert!(matches!(&edits[1], ConstraintEdit::Remove(c) if c.algorithm == "MD5"));
            }
            other => panic!("expected edits, got {:?}", other),
        }
    }

    #[test]
    fn malformed_lists_are_rejected() {
        for text in [
            "[]",
            "{Cipher, AES, *}",
            "[{Cipher, AES}]",
            "[{Cipher, , *}]",
            "[{Cipher, AES, *, Bogus:x.Y}]",
            "[{Cipher, AES, *} junk]",
            "[{Cipher, AES, *},]",
            "[{Cipher, AES, *}, +{Cipher, DES, *}]",
        ] {
            match parse_constraints(text, "p.P") {
                Err(RsecError::Parse { reason }) => {
                    assert_eq!(reason, "Incorrect constraint definition for provider p.P", "{text}")
                }
                other => panic!("expected Parse error for {text}, got {:?}", other),
            }
        }
    }

    #[test]
    fn malformed_attributes_are_rejected() {
        for text in ["[{Cipher, AES, Foo}]", "[{Cipher, AES, KeySize=big}]", "[{Cipher, AES, KeySize=4096-1024}]"] {
            match parse_constraints(text, "p.P") {
                Err(RsecError::Parse { reason }) => {
                    assert!(reason.starts_with("Constraint attributes format is incorrect"), "{text}")
                }
                other => panic!("expected Parse error for {text}, got {:?}", other),
            }
        }
    }

    // ── Edits ────────────────────────────────────────────────────────────────

    #[test]
    fn edits_add_and_remove_by_service() {
        let base = plain("[{Cipher, AES, *}, {MessageDigest, SHA-256, *}]");
        let edits = vec![
            ConstraintEdit::Remove(plain("[{MessageDigest, SHA-256, *}]").remove(0)),
            ConstraintEdit::Add(plain("[{Mac, HmacSHA256, *}]").remove(0)),
            ConstraintEdit::Add(plain("[{Cipher, AES, *}]").remove(0)),
        ];
        let merged = apply_edits(&base, &edits).unwrap();
        let algs: Vec<&str> = merged.iter().map(|c| c.algorithm.as_str()).collect();
        assert_eq!(algs, vec!["AES", "HmacSHA256"]);
    }

    #[test]
    fn removing_an_absent_constraint_fails() {
        let base = plain("[{Cipher, AES, *}]");
        let edits = vec![ConstraintEdit::Remove(plain("[{Signature, SHA1withDSA, *}]").remove(0))];
        match apply_edits(&base, &edits) {
            Err(RsecError::Constraint { reason }) => assert_eq!(
                reason,
                "Constraint {Signature, SHA1withDSA} is not part of existing constraints"
            ),
            other => panic!("expected Constraint error, got {:?}", other),
        }
    }
}
