//! Collects the findings passes report while a flow runs.

use crate::code::DiagnosticCode;
use crate::diagnostic::Diagnostic;
use crate::severity::Severity;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Shared collector for [`Diagnostic`]s.
///
/// Passes take `&DiagnosticSink`, so per-tile work running on several threads
/// can report into the same sink. Error and warning totals are kept in
/// atomics and can be read without taking the lock.
pub struct DiagnosticSink {
    entries: Mutex<Vec<Diagnostic>>,
    errors: AtomicUsize,
    warnings: AtomicUsize,
}

impl DiagnosticSink {
    /// An empty sink.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            errors: AtomicUsize::new(0),
            warnings: AtomicUsize::new(0),
        }
    }

    // A panic in another reporter never leaves the vector half-pushed.
    fn entries(&self) -> MutexGuard<'_, Vec<Diagnostic>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Records a finding.
    pub fn emit(&self, diag: Diagnostic) {
        let counter = match diag.severity {
            Severity::Error => Some(&self.errors),
            Severity::Warning => Some(&self.warnings),
            Severity::Note => None,
        };
        if let Some(counter) = counter {
            counter.fetch_add(1, Ordering::Relaxed);
        }
        self.entries().push(diag);
    }

    /// Whether anything fatal has been reported.
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Errors reported so far.
    pub fn error_count(&self) -> usize {
        self.errors.load(Ordering::Relaxed)
    }

    /// Warnings reported so far.
    pub fn warning_count(&self) -> usize {
        self.warnings.load(Ordering::Relaxed)
    }

    /// How many findings carry `code`, whatever their severity.
    pub fn count_code(&self, code: DiagnosticCode) -> usize {
        self.entries().iter().filter(|d| d.code == code).count()
    }

    /// Removes and returns everything reported. The totals are not reset.
    pub fn take_all(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.entries())
    }

    /// A copy of everything reported, in emission order.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.entries().clone()
    }
}

impl Default for DiagnosticSink {
    fn default() -> Self {
        Self::new()
    }
}
