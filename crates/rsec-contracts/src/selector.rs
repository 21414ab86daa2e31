//! Host inputs: which profile to resolve, and the sunset policy flags.
//!
//! A FIPS shorthand selects profile id `1`, checkpoint mode selects id `2`,
//! and a general setting string combines an id with the `trace`, `audit` and
//! `help` keywords, e.g. `1,trace,audit`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{RsecError, RsecResult};

/// Profile id selected by the FIPS shorthand.
pub const FIPS_PROFILE_ID: &str = "1";

/// Profile id selected when running in checkpoint mode.
pub const CHECKPOINT_PROFILE_ID: &str = "2";

/// Raw selector inputs as the host received them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectorInput {
    pub fips: bool,
    pub checkpoint: bool,
    /// General setting string, e.g. `"1,trace"`.
    pub setting: Option<String>,
    /// Explicit profile name; overrides the profile an id would select.
    pub custom_profile: Option<String>,
}

/// The parsed selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub profile_id: Option<String>,
    pub custom_profile: Option<String>,
    pub trace: bool,
    pub audit: bool,
    pub help: bool,
}

impl Selection {
    /// Interpret host inputs. Checkpoint mode wins over FIPS, and both
    /// replace any setting string.
    pub fn from_input(input: &SelectorInput) -> RsecResult<Self> {
        let setting = if input.checkpoint {
            Some(CHECKPOINT_PROFILE_ID)
        } else if input.fips {
            Some(FIPS_PROFILE_ID)
        } else {
            input.setting.as_deref()
        };

        let mut selection = match setting {
            Some(s) => Self::parse_setting(s)?,
            None => Self::default(),
        };
        selection.custom_profile = input
            .custom_profile
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);
        Ok(selection)
    }

    /// Parse `"<id>,trace,audit,help"`. Keywords are case-insensitive and
    /// may appear in any order; at most one id is allowed.
    pub fn parse_setting(setting: &str) -> RsecResult<Self> {
        let incorrect = || RsecError::Selection {
            reason: format!("user restricted security setting '{setting}' incorrect"),
        };

        let mut selection = Self::default();
        let mut seen_any = false;
        for token in setting.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            seen_any = true;
            if token.eq_ignore_ascii_case("trace") {
                selection.trace = true;
            } else if token.eq_ignore_ascii_case("audit") {
                selection.audit = true;
            } else if token.eq_ignore_ascii_case("help") {
                selection.help = true;
            } else if selection.profile_id.is_some() {
                return Err(incorrect());
            } else {
                selection.profile_id = Some(token.to_string());
            }
        }
        if !seen_any {
            return Err(incorrect());
        }
        Ok(selection)
    }

    /// True when a profile must be resolved.
    pub fn wants_profile(&self) -> bool {
        self.profile_id.is_some() || self.custom_profile.is_some()
    }

    /// The profile selector to hand to the locator, if any.
    ///
    /// A custom profile wins. Otherwise the id is looked up in `profile_ids`;
    /// a non-numeric id that is not in the table is used as a selector as is.
    pub fn profile_selector(
        &self,
        profile_ids: &BTreeMap<String, String>,
    ) -> RsecResult<Option<String>> {
        if let Some(custom) = &self.custom_profile {
            return Ok(Some(custom.clone()));
        }
        let Some(id) = &self.profile_id else {
            return Ok(None);
        };
        if let Some(mapped) = profile_ids.get(id) {
            return Ok(Some(mapped.clone()));
        }
        if id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(RsecError::Selection {
                reason: format!("profile id '{id}' is not mapped to a RestrictedSecurity profile"),
            });
        }
        Ok(Some(id.clone()))
    }
}

/// Sunset policy flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyFlags {
    /// Silence expiring-soon and expired-but-ignored warnings.
    pub suppress_sunset_warning: bool,
    /// Let an expired profile resolve instead of failing.
    pub ignore_sunset_expiration: bool,
}

/// Interpret a host flag value: absent is `false`, present without a value
/// is `true`, otherwise only a case-insensitive `true` counts.
pub fn flag_value(raw: Option<&str>) -> bool {
    match raw {
        None => false,
        Some(v) => {
            let v = v.trim();
            v.is_empty() || v.eq_ignore_ascii_case("true")
        }
    }
}
