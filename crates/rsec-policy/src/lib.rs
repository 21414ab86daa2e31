//! # rsec-policy
//!
//! The property schema, resolver settings and the provider/service gate.
//!
//! ## Overview
//!
//! [`SchemaValidator`] implements the
//! [`PropertyValidator`](rsec_core::traits::PropertyValidator) trait: it
//! rejects unrecognized keys and malformed flags, and merges scalar
//! properties level by level, honouring the `+`/`-` list operators.
//!
//! [`ResolverSettings`] is loaded from TOML and carries the sunset policy
//! flags, the expiring-soon window and the profile id table.
//!
//! [`ProviderGate`] answers provider and service admission questions against
//! a resolved profile.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use rsec_policy::{ResolverSettings, SchemaValidator};
//!
//! let settings = ResolverSettings::from_file(Path::new("rsec.toml"))?;
//! let validator = SchemaValidator::new();
//! // Pass `Box::new(validator)` to `rsec_core::Resolver::new(...)`.
//! ```

pub mod gate;
pub mod schema;
pub mod settings;
pub mod validator;

pub use gate::{ProviderGate, ServiceRequest};
pub use settings::ResolverSettings;
pub use validator::SchemaValidator;

// ── Tests ─────────────────────────────────────────────────────────────────────
