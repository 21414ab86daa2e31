//! # rsec-contracts
//!
//! Shared types and error definitions for restricted security profile
//! resolution.
//!
//! All crates in the workspace import from here. No resolution logic lives in
//! this crate, only data definitions, the recognized key schema and the
//! error taxonomy.

pub mod error;
pub mod profile;
pub mod property;
pub mod provider;
pub mod resolved;
pub mod selector;
pub mod source;
