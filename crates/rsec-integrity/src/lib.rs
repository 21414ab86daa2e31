//! # rsec-integrity
//!
//! Integrity and temporal validity of restricted security profiles.
//!
//! A base profile carries `desc.hash = SHA256:<hex>` over its own keys, and
//! every extension is anchored to the base at the root of its chain. Each
//! profile also carries a sunset date after which it is no longer certified.
//!
//! ## Modules
//!
//! - [`digest`]: canonical content and SHA-256 verification
//! - [`sunset`]: date parsing and classification
//! - [`checker`]: `ProfileIntegrityChecker`, the `IntegrityChecker` impl
//! - [`memory`]: diagnostic sinks
//! - [`clock`]: system and fixed clocks

pub mod checker;
pub mod clock;
pub mod digest;
pub mod memory;
pub mod sunset;

pub use checker::ProfileIntegrityChecker;
pub use clock::{FixedClock, SystemClock};
pub use memory::{InMemoryDiagnostics, StderrDiagnostics};

// ── Tests ─────────────────────────────────────────────────────────────────────
