//! Stable identifiers for the kinds of finding a flow can report.
//!
//! Numbers are grouped by concern: `0xx` for hard errors, `1xx` for direct
//! tunnels, `2xx` for tied-off pins and `3xx` for grid coverage.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which severity family a code belongs to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// `E` codes.
    Error,
    /// `W` codes.
    Warning,
    /// `N` codes.
    Note,
}

impl Category {
    /// The letter a code of this category is printed with.
    pub fn prefix(self) -> char {
        match self {
            Category::Error => 'E',
            Category::Warning => 'W',
            Category::Note => 'N',
        }
    }
}

/// A diagnostic code such as `W101`, printed as the category letter and a
/// three-digit number.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// Severity family.
    pub category: Category,
    /// Number within the family.
    pub number: u16,
}

impl DiagnosticCode {
    /// Builds a code; `const` so passes can declare their codes as constants.
    pub const fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OFF_GRID: DiagnosticCode = DiagnosticCode::new(Category::Warning, 101);

    #[test]
    fn printed_with_padded_number() {
        assert_eq!(OFF_GRID.to_string(), "W101");
        assert_eq!(DiagnosticCode::new(Category::Error, 4).to_string(), "E004");
    }

    #[test]
    fn category_is_part_of_identity() {
        assert_ne!(OFF_GRID, DiagnosticCode::new(Category::Note, 101));
    }

    #[test]
    fn survives_json() {
        let json = serde_json::to_string(&OFF_GRID).unwrap();
        let back: DiagnosticCode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, OFF_GRID);
    }
}
