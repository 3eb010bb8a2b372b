//! Architecture locations that diagnostics point at.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where in the architecture a diagnostic applies.
///
/// A location is a hierarchical path (block, instance, pin) plus an optional
/// grid position. Both parts may be empty for context-wide findings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Hierarchical path from the outermost named entity inwards.
    pub path: Vec<String>,
    /// Grid cell the finding refers to, if any.
    pub position: Option<(u32, u32)>,
}

impl Location {
    /// A location that points nowhere in particular.
    pub const NONE: Location = Location {
        path: Vec::new(),
        position: None,
    };

    /// Creates a location rooted at the named entity.
    pub fn entity(name: impl Into<String>) -> Self {
        Self {
            path: vec![name.into()],
            position: None,
        }
    }

    /// Appends a path segment.
    pub fn child(mut self, name: impl Into<String>) -> Self {
        self.path.push(name.into());
        self
    }

    /// Attaches a grid position.
    pub fn at(mut self, x: u32, y: u32) -> Self {
        self.position = Some((x, y));
        self
    }

    /// Returns `true` if the location carries no information.
    pub fn is_none(&self) -> bool {
        self.path.is_empty() && self.position.is_none()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.join("/"))?;
        if let Some((x, y)) = self.position {
            if !self.path.is_empty() {
                write!(f, " ")?;
            }
            write!(f, "@ ({x}, {y})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_path_and_position() {
        let loc = Location::entity("clb").child("cluster0").child("cin").at(3, 7);
        assert_eq!(loc.to_string(), "clb/cluster0/cin @ (3, 7)");
    }

    #[test]
    fn display_position_only() {
        let loc = Location::NONE.at(1, 2);
        assert_eq!(loc.to_string(), "@ (1, 2)");
    }

    #[test]
    fn none_is_none() {
        assert!(Location::NONE.is_none());
        assert!(!Location::entity("bram").is_none());
    }
}
