//! Sunset date parsing and classification.

use chrono::{Months, NaiveDate};

use rsec_contracts::error::{RsecError, RsecResult};

/// Where a date stands relative to today, before policy flags apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SunsetPhase {
    NotExpired,
    ExpiringSoon,
    Expired,
}

/// Parse a mandatory `yyyy-MM-dd` sunset date.
///
/// Month and day must have two digits each; `2099-1-5` is rejected.
pub fn parse_sunset_date(raw: Option<&str>) -> RsecResult<NaiveDate> {
    raw.map(str::trim)
        .filter(|s| is_iso_shape(s))
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        .ok_or_else(|| RsecError::Sunset {
            reason: "Restricted security policy sunset date is incorrect, the correct format is yyyy-MM-dd."
                .to_string(),
        })
}

fn is_iso_shape(s: &str) -> bool {
    s.len() == 10
        && s.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// Classify `date` against `today`.
///
/// The sunset day itself is still valid. Dates up to `window_months` ahead
/// are expiring soon.
pub fn classify(date: NaiveDate, today: NaiveDate, window_months: u32) -> SunsetPhase {
    if date < today {
        return SunsetPhase::Expired;
    }
    let horizon = today
        .checked_add_months(Months::new(window_months))
        .unwrap_or(NaiveDate::MAX);
    if date <= horizon {
        SunsetPhase::ExpiringSoon
    } else {
        SunsetPhase::NotExpired
    }
}
