//! `IntegrityChecker` implementation.
//!
//!   Start → HashVerify → SunsetEvaluate → Done
//!
//! Hash failures are fatal regardless of flags. Sunset handling:
//!
//! | phase          | ignore | result          | warning (unless suppressed) |
//! |----------------|--------|-----------------|-----------------------------|
//! | NotExpired     | any    | ok              | none                        |
//! | ExpiringSoon   | any    | ok              | will expire on …            |
//! | Expired        | true   | ok              | uncertified cryptography    |
//! | Expired        | false  | `SunsetError`   | how to ignore expiration    |

use std::sync::Arc;

use tracing::{debug, warn};

use rsec_contracts::{
    error::{RsecError, RsecResult},
    profile::{ProfileDescription, ProfileDescriptor, ProfileName},
    resolved::{SunsetReport, SunsetStatus},
    selector::PolicyFlags,
};
use rsec_core::traits::{Clock, DiagnosticSink, IntegrityChecker};

use crate::{
    digest,
    sunset::{self, SunsetPhase},
};

pub const EXPIRED_IGNORED_WARNING: &str =
    "WARNING: Java will start with the requested restricted security profile but uncertified cryptography may be active";

pub const IGNORE_EXPIRATION_HINT: &str =
    "Use --ignore-sunset-expiration to allow startup while possibly using uncertified cryptography";

pub struct ProfileIntegrityChecker {
    flags: PolicyFlags,
    expiring_soon_months: u32,
    clock: Box<dyn Clock>,
    sink: Arc<dyn DiagnosticSink>,
}

impl ProfileIntegrityChecker {
    pub fn new(
        flags: PolicyFlags,
        expiring_soon_months: u32,
        clock: Box<dyn Clock>,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            flags,
            expiring_soon_months,
            clock,
            sink,
        }
    }

    fn advise(&self, message: &str) {
        if !self.flags.suppress_sunset_warning {
            self.sink.warn(message);
        }
    }
}

impl IntegrityChecker for ProfileIntegrityChecker {
    fn verify_hash(&self, base: &ProfileDescriptor) -> RsecResult<()> {
        digest::verify(base)?;
        debug!(base = %base.name, "base profile hash verified");
        Ok(())
    }

    fn evaluate_sunset(
        &self,
        profile: &ProfileName,
        description: &ProfileDescription,
    ) -> RsecResult<SunsetReport> {
        let date = sunset::parse_sunset_date(description.sunset_date.as_deref())?;
        let today = self.clock.today();

        let status = match sunset::classify(date, today, self.expiring_soon_months) {
            SunsetPhase::NotExpired => SunsetStatus::NotExpired,
            SunsetPhase::ExpiringSoon => {
                self.advise(&format!(
                    "The restricted security profile {} will expire on {date}",
                    profile.prefixed()
                ));
                SunsetStatus::ExpiringSoon
            }
            SunsetPhase::Expired if self.flags.ignore_sunset_expiration => {
                if !self.flags.suppress_sunset_warning {
                    warn!(profile = %profile, sunset = %date, "starting with an expired profile");
                }
                self.advise(EXPIRED_IGNORED_WARNING);
                SunsetStatus::ExpiredIgnored
            }
            SunsetPhase::Expired => {
                self.advise(IGNORE_EXPIRATION_HINT);
                return Err(RsecError::Sunset {
                    reason: format!(
                        "Restricted security profile {} expired on {date}",
                        profile.prefixed()
                    ),
                });
            }
        };

        debug!(profile = %profile, sunset = %date, ?status, "sunset evaluated");
        Ok(SunsetReport { date, status })
    }
}
