//! Block ports and the parameters used to create them.

use crate::geometry::{Orientation, Position};
use crate::ids::{GlobalId, PortId};
use serde::{Deserialize, Serialize};
use std::fmt;
use weft_common::Ident;

/// The direction of a port or pin, seen from the element that owns it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum PortDirection {
    /// Signal flows into the element.
    Input,
    /// Signal flows out of the element.
    Output,
}

impl PortDirection {
    /// Returns the other direction.
    pub fn flipped(self) -> PortDirection {
        match self {
            PortDirection::Input => PortDirection::Output,
            PortDirection::Output => PortDirection::Input,
        }
    }
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortDirection::Input => f.write_str("input"),
            PortDirection::Output => f.write_str("output"),
        }
    }
}

/// A port on the boundary of a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    /// The port's ID within its block.
    pub id: PortId,
    /// The port name, unique within the block.
    pub name: Ident,
    /// Bit width, at least 1.
    pub width: u32,
    /// Input or output.
    pub direction: PortDirection,
    /// The block side the port sits on.
    pub orientation: Orientation,
    /// Sub-position within the block's footprint.
    pub position: Position,
    /// The global signal this port is bound to, if any.
    pub global: Option<GlobalId>,
}

impl Port {
    /// Returns `true` if the port is bound to a global signal.
    pub fn is_global(&self) -> bool {
        self.global.is_some()
    }
}

/// Parameters for [`BlockBuilder::create_port`](crate::BlockBuilder::create_port).
#[derive(Debug, Clone, PartialEq)]
pub struct PortSpec {
    /// The port name.
    pub name: String,
    /// Bit width.
    pub width: u32,
    /// Input or output.
    pub direction: PortDirection,
    /// The block side.
    pub orientation: Orientation,
    /// Sub-position within the block, `(0, 0)` unless set.
    pub position: Position,
}

impl PortSpec {
    /// An input port at sub-position `(0, 0)`.
    pub fn input(name: impl Into<String>, width: u32, orientation: Orientation) -> Self {
        Self {
            name: name.into(),
            width,
            direction: PortDirection::Input,
            orientation,
            position: Position::ORIGIN,
        }
    }

    /// An output port at sub-position `(0, 0)`.
    pub fn output(name: impl Into<String>, width: u32, orientation: Orientation) -> Self {
        Self {
            direction: PortDirection::Output,
            ..Self::input(name, width, orientation)
        }
    }

    /// Moves the port to sub-position `(x, y)` of a multi-cell block.
    pub fn at(mut self, x: u32, y: u32) -> Self {
        self.position = Position::new(x, y);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_builders() {
        let spec = PortSpec::output("out2", 8, Orientation::EAST).at(0, 1);
        assert_eq!(spec.direction, PortDirection::Output);
        assert_eq!(spec.position, Position::new(0, 1));
        assert_eq!(spec.width, 8);
    }

    #[test]
    fn direction_flip() {
        assert_eq!(PortDirection::Input.flipped(), PortDirection::Output);
        assert_eq!(format!("{}", PortDirection::Output), "output");
    }
}
