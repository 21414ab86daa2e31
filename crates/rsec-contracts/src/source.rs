//! Loaded configuration text.
//!
//! `RawProperties` is the flat key → value namespace produced by the source
//! loader. Every entry remembers which file it came from so diagnostics can
//! name it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One configuration file's contents, supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Display name used in diagnostics, usually the path.
    pub name: String,
    pub text: String,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// A single loaded value with its originating file index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEntry {
    pub value: String,
    pub source: usize,
}

/// The merged property namespace of the main file and all appended files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawProperties {
    sources: Vec<String>,
    entries: BTreeMap<String, RawEntry>,
}

impl RawProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source file name and return its index.
    pub fn add_source(&mut self, name: impl Into<String>) -> usize {
        self.sources.push(name.into());
        self.sources.len() - 1
    }

    /// Set `key`, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>, source: usize) {
        self.entries.insert(
            key.into(),
            RawEntry {
                value: value.into(),
                source,
            },
        );
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|e| e.value.as_str())
    }

    pub fn entry(&self, key: &str) -> Option<&RawEntry> {
        self.entries.get(key)
    }

    /// Name of the file that supplied `key`.
    pub fn source_of(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .and_then(|e| self.sources.get(e.source))
            .map(String::as_str)
    }

    pub fn source_name(&self, index: usize) -> Option<&str> {
        self.sources.get(index).map(String::as_str)
    }

    /// All entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(k, e)| (k.as_str(), e.value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
