//! Source loader: property-file text → `RawProperties`.
//!
//! Accepts the standard property-file syntax: `#`/`!` comments, `=`, `:` or
//! whitespace separators, backslash line continuation and the usual escapes.
//!
//! Merge rules across chained files:
//!
//! 1. Within one file the last definition of a key wins.
//! 2. Profile keys (`RestrictedSecurity.…`) may not be redefined by a later
//!    file; a profile's content is fixed by the file that declares it.
//! 3. Host counterparts of appendable properties (e.g.
//!    `jdk.tls.disabledAlgorithms`) accumulate: `earlier, later`.
//! 4. Any other host key takes the later file's value.

use std::collections::BTreeMap;

use tracing::{debug, info};

use rsec_contracts::{
    error::{RsecError, RsecResult},
    profile::PROFILE_PREFIX,
    property::PropertyKey,
    source::{RawProperties, SourceFile},
};

/// Separator between entries of an appended-files list.
pub const LIST_SEPARATOR: char = ':';

/// Load the main file followed by every appended file, in order.
pub fn load(sources: &[SourceFile]) -> RsecResult<RawProperties> {
    let mut raw = RawProperties::new();

    for source in sources {
        let index = raw.add_source(source.name.as_str());
        let parsed = parse_text(&source.text, &source.name)?;
        debug!(file = %source.name, keys = parsed.len(), "parsed property file");

        for (key, value) in parsed {
            merge_entry(&mut raw, key, value, index)?;
        }
    }

    info!(files = sources.len(), keys = raw.len(), "loaded security properties");
    Ok(raw)
}

fn merge_entry(raw: &mut RawProperties, key: String, value: String, index: usize) -> RsecResult<()> {
    let Some(previous) = raw.entry(&key).cloned() else {
        raw.insert(key, value, index);
        return Ok(());
    };

    if key.starts_with(PROFILE_PREFIX) && key[PROFILE_PREFIX.len()..].starts_with('.') {
        let earlier = raw.source_name(previous.source).unwrap_or("<unknown>");
        let later = raw.source_name(index).unwrap_or("<unknown>");
        return Err(RsecError::Parse {
            reason: format!(
                "Property '{key}' defined in '{earlier}' cannot be overridden by '{later}'"
            ),
        });
    }

    let appendable = PropertyKey::from_host_name(&key).is_some_and(PropertyKey::is_appendable);
    let merged = if appendable && !previous.value.trim().is_empty() && !value.trim().is_empty() {
        format!("{}, {}", previous.value, value)
    } else if appendable && value.trim().is_empty() {
        previous.value
    } else {
        value
    };
    debug!(key = %key, appendable, "host property redefined by appended file");
    raw.insert(key, merged, index);
    Ok(())
}

/// Split an appended-files list such as `a.security:b.security`.
///
/// A leading `=` (an unsupported override syntax) is rejected.
pub fn parse_properties_list(list: &str) -> RsecResult<Vec<String>> {
    let mut files = Vec::new();
    for entry in list.split(LIST_SEPARATOR).map(str::trim) {
        if entry.starts_with('=') {
            return Err(RsecError::Parse {
                reason: "properties list does not support '=' prefix".to_string(),
            });
        }
        if !entry.is_empty() {
            files.push(entry.to_string());
        }
    }
    Ok(files)
}

/// Parse one file into key → value, last definition winning.
pub fn parse_text(text: &str, file: &str) -> RsecResult<BTreeMap<String, String>> {
    let mut out = BTreeMap::new();
    for (line_no, logical) in logical_lines(text) {
        let (key, value) = split_key_value(&logical);
        let key = unescape(key, file, line_no)?;
        let value = unescape(value, file, line_no)?;
        out.insert(key, value.trim_end().to_string());
    }
    Ok(out)
}

/// Join continuation lines and drop comments and blanks.
///
/// Yields the 1-based number of the first physical line of each entry.
fn logical_lines(text: &str) -> Vec<(usize, String)> {
    let mut out = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (idx, physical) in text.lines().enumerate() {
        let line = physical.trim_start();
        let (start, mut buf) = match pending.take() {
            Some(p) => p,
            None => {
                if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                    continue;
                }
                (idx + 1, String::new())
            }
        };

        let trailing = line.chars().rev().take_while(|&c| c == '\\').count();
        if trailing % 2 == 1 {
            buf.push_str(&line[..line.len() - 1]);
            pending = Some((start, buf));
        } else {
            buf.push_str(line);
            out.push((start, buf));
        }
    }
    // A continuation on the last line ends the entry.
    if let Some(p) = pending {
        out.push(p);
    }
    out
}

/// Split at the first unescaped `=`, `:` or whitespace.
fn split_key_value(line: &str) -> (&str, &str) {
    let mut end = line.len();
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' | ' ' | '\t' | '\x0c' => {
                end = i;
                break;
            }
            _ => {}
        }
    }
    let key = &line[..end];

    let mut rest = line[end..].trim_start_matches([' ', '\t', '\x0c']);
    if let Some(r) = rest.strip_prefix(['=', ':']) {
        rest = r.trim_start_matches([' ', '\t', '\x0c']);
    }
    (key, rest)
}

fn unescape(s: &str, file: &str, line_no: usize) -> RsecResult<String> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0c'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let decoded = u32::from_str_radix(&hex, 16)
                    .ok()
                    .filter(|_| hex.len() == 4)
                    .and_then(char::from_u32)
                    .ok_or_else(|| RsecError::Parse {
                        reason: format!("Malformed \\uxxxx encoding at line {line_no} of {file}"),
                    })?;
                out.push(decoded);
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    Ok(out)
}
