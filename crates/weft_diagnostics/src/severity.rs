//! How seriously a finding should be taken.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a [`Diagnostic`](crate::Diagnostic), least severe first.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Severity {
    /// Informational, e.g. cells the grid left empty.
    Note,
    /// The fabric builds but is probably not what was meant, e.g. a tunnel
    /// that runs off the grid.
    Warning,
    /// The fabric is inconsistent and the build fails.
    Error,
}

impl Severity {
    /// Whether a finding of this severity fails the build.
    pub fn is_error(self) -> bool {
        matches!(self, Severity::Error)
    }

    /// The SGR color number used when rendering this severity on a terminal.
    pub fn ansi_color(self) -> u8 {
        match self {
            Severity::Error => 31,
            Severity::Warning => 33,
            Severity::Note => 36,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Severity::Note => "note",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
