//! # rsec-core
//!
//! The restricted security profile resolution pipeline.
//!
//! This crate provides:
//! - The trait seams (`PropertyValidator`, `IntegrityChecker`,
//!   `DiagnosticSink`, `Clock`, `SecurityHost`)
//! - Loading, profile location, inheritance and provider merging
//! - The `Resolver` that runs them in order, and the `ProfileSlot` that
//!   publishes a result
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rsec_core::{loader, Resolver};
//!
//! let raw = loader::load(&sources)?;
//! let resolved = Resolver::new(validator, integrity).resolve(&raw, "OpenJCEPlusFIPS")?;
//! ```

pub mod constraints;
pub mod descriptor;
pub mod inheritance;
pub mod loader;
pub mod locator;
pub mod materialize;
pub mod providers;
pub mod publish;
pub mod resolver;
pub mod traits;

pub use publish::ProfileSlot;
pub use resolver::Resolver;
