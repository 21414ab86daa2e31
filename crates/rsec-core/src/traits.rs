//! Trait seams of the resolution pipeline.
//!
//! - `PropertyValidator`: trusted schema checks and scalar merging
//! - `IntegrityChecker`: hash verification and sunset evaluation
//! - `DiagnosticSink`: destination for non-fatal warnings
//! - `Clock`: today's date, injectable for tests
//! - `SecurityHost`: the bootstrap collaborator that applies a result
//!
//! The resolver wires the first two together; the others are handed to the
//! implementations that need them.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use rsec_contracts::{
    error::RsecResult,
    profile::{ProfileDescription, ProfileDescriptor, ProfileName},
    property::PropertyKey,
    resolved::SunsetReport,
    source::RawProperties,
};

/// Validates the keys of each profile level and merges scalar properties.
pub trait PropertyValidator: Send + Sync {
    /// Check one level for unrecognized keys and malformed flag values.
    ///
    /// Called for every level of the chain, target first.
    fn check_level(&self, level: &ProfileDescriptor) -> RsecResult<()>;

    /// Apply one level's scalar declarations on top of `inherited`.
    ///
    /// `host` is consulted when an appendable property is extended but no
    /// level of the chain has set it yet.
    fn merge_level(
        &self,
        inherited: &BTreeMap<PropertyKey, String>,
        level: &ProfileDescriptor,
        host: &RawProperties,
    ) -> RsecResult<BTreeMap<PropertyKey, String>>;
}

/// Verifies the integrity anchor and the temporal validity of a chain.
pub trait IntegrityChecker: Send + Sync {
    /// Verify the declared hash of the root base profile.
    ///
    /// Failures are fatal regardless of any policy flag.
    fn verify_hash(&self, base: &ProfileDescriptor) -> RsecResult<()>;

    /// Evaluate the merged description's sunset date for `profile`.
    ///
    /// May emit warnings; returns an error when the profile may not be used.
    fn evaluate_sunset(
        &self,
        profile: &ProfileName,
        description: &ProfileDescription,
    ) -> RsecResult<SunsetReport>;
}

/// Receives advisory diagnostics. Never used for fatal errors.
pub trait DiagnosticSink: Send + Sync {
    fn warn(&self, message: &str);
}

/// Source of the current date.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// The bootstrap collaborator that owns the live security table.
pub trait SecurityHost: Send + Sync {
    /// Replace provider entries and set properties from `table`.
    fn apply(&self, table: &BTreeMap<String, String>) -> RsecResult<()>;

    /// Put back the provider list that was active before the first `apply`.
    ///
    /// Called before a re-resolution applies its new table.
    fn restore_previous_providers(&self) -> RsecResult<()>;
}
