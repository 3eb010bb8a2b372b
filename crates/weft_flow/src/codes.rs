//! Diagnostic codes emitted by the passes.

use weft_diagnostics::{Category, DiagnosticCode};

/// A direct tunnel target lies outside the grid.
pub const TUNNEL_OFF_GRID: DiagnosticCode = DiagnosticCode::new(Category::Warning, 101);
/// A direct tunnel target holds a different block.
pub const TUNNEL_TARGET_MISMATCH: DiagnosticCode = DiagnosticCode::new(Category::Warning, 102);
/// A memory write enable was tied to zero.
pub const WRITE_ENABLE_TIED: DiagnosticCode = DiagnosticCode::new(Category::Warning, 201);
/// An undriven input pin was tied to zero.
pub const PIN_TIED: DiagnosticCode = DiagnosticCode::new(Category::Warning, 202);
/// Grid cells are left empty.
pub const EMPTY_CELLS: DiagnosticCode = DiagnosticCode::new(Category::Note, 301);
/// An output pin drives nothing.
pub const UNUSED_OUTPUT: DiagnosticCode = DiagnosticCode::new(Category::Note, 302);
