//! Error types for the profile resolution pipeline.
//!
//! Every fallible operation returns `RsecResult<T>`. All variants are fatal:
//! a misconfigured trust boundary must never proceed with a partially applied
//! profile, so callers report the error and stop.

use thiserror::Error;

/// The unified error type for restricted security profile resolution.
///
/// Each variant corresponds to one stage of the pipeline. The `reason` is the
/// full diagnostic line shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RsecError {
    /// Property text, a provider declaration or a constraint list is malformed.
    #[error("ParseError: {reason}")]
    Parse { reason: String },

    /// A key is not recognized, or a property value operation is not allowed.
    #[error("SchemaError: {reason}")]
    Schema { reason: String },

    /// Provider order numbers violate the contiguity rules.
    #[error("OrderError: {reason}")]
    Order { reason: String },

    /// A base-profile reference is missing, dangling or circular.
    #[error("InheritanceError: {reason}")]
    Inheritance { reason: String },

    /// An extension edits constraints it is not allowed to edit.
    #[error("ConstraintError: {reason}")]
    Constraint { reason: String },

    /// The declared hash is absent, malformed, or does not match the content.
    ///
    /// Never suppressed by any policy flag.
    #[error("IntegrityError: {reason}")]
    Integrity { reason: String },

    /// The sunset date is malformed, or the profile has expired.
    #[error("SunsetError: {reason}")]
    Sunset { reason: String },

    /// The requested profile cannot be selected, or the result is incomplete.
    #[error("SelectionError: {reason}")]
    Selection { reason: String },
}

impl RsecError {
    /// The stable kind name, e.g. `"OrderError"`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "ParseError",
            Self::Schema { .. } => "SchemaError",
            Self::Order { .. } => "OrderError",
            Self::Inheritance { .. } => "InheritanceError",
            Self::Constraint { .. } => "ConstraintError",
            Self::Integrity { .. } => "IntegrityError",
            Self::Sunset { .. } => "SunsetError",
            Self::Selection { .. } => "SelectionError",
        }
    }

    /// The diagnostic text without the kind prefix.
    pub fn reason(&self) -> &str {
        match self {
            Self::Parse { reason }
            | Self::Schema { reason }
            | Self::Order { reason }
            | Self::Inheritance { reason }
            | Self::Constraint { reason }
            | Self::Integrity { reason }
            | Self::Sunset { reason }
            | Self::Selection { reason } => reason,
        }
    }
}

/// Convenience alias used throughout the rsec crates.
pub type RsecResult<T> = Result<T, RsecError>;
