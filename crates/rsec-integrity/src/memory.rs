//! Diagnostic sinks.
//!
//! `InMemoryDiagnostics` keeps every warning in a `Vec` behind a `Mutex`;
//! clones share the same buffer, so a test or front end can hand one clone
//! to the checker and read the other. `StderrDiagnostics` prints each
//! warning as it arrives.

use std::sync::{Arc, Mutex, PoisonError};

use rsec_core::traits::DiagnosticSink;

#[derive(Debug, Clone, Default)]
pub struct InMemoryDiagnostics {
    messages: Arc<Mutex<Vec<String>>>,
}

impl InMemoryDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every warning received so far, in order.
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_empty(&self) -> bool {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

impl DiagnosticSink for InMemoryDiagnostics {
    fn warn(&self, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }
}

/// Writes each warning to standard error.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrDiagnostics;

impl DiagnosticSink for StderrDiagnostics {
    fn warn(&self, message: &str) {
        eprintln!("{message}");
    }
}
