//! Diagnostic creation, severity management, and terminal rendering.
//!
//! Passes report non-fatal findings (a carry tunnel that runs off the top of
//! the grid, pins tied to an idle value, cells left empty) as structured
//! [`Diagnostic`]s. The thread-safe [`DiagnosticSink`] accumulates them while a
//! flow runs and [`DiagnosticRenderer`] implementations format them.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod location;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use location::Location;
pub use renderer::{DiagnosticRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
