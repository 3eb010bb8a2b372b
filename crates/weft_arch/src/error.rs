//! Error types for architecture composition.

use crate::geometry::{Dir, Position};
use std::fmt;

/// The namespace a name or reference belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    /// Blocks of the context.
    Block,
    /// Tiles of the context.
    Tile,
    /// Ports of one block.
    Port,
    /// Instances of one block.
    Instance,
    /// Pins of one instance.
    Pin,
    /// Global signals.
    Global,
    /// Routing segments.
    Segment,
    /// Primitives of the library.
    Primitive,
    /// Direct tunnels.
    Tunnel,
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Namespace::Block => "block",
            Namespace::Tile => "tile",
            Namespace::Port => "port",
            Namespace::Instance => "instance",
            Namespace::Pin => "pin",
            Namespace::Global => "global",
            Namespace::Segment => "segment",
            Namespace::Primitive => "primitive",
            Namespace::Tunnel => "tunnel",
        };
        f.write_str(s)
    }
}

/// The end of a connection an endpoint was offered as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointRole {
    /// The driving end.
    Driver,
    /// The driven end.
    Sink,
}

impl fmt::Display for EndpointRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointRole::Driver => f.write_str("driver"),
            EndpointRole::Sink => f.write_str("sink"),
        }
    }
}

/// Why a placement was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementFault {
    /// Some covered cell lies outside the grid.
    OutOfRange {
        /// Grid width.
        width: u32,
        /// Grid height.
        height: u32,
    },
    /// Some covered cell already belongs to another placement.
    Occupied {
        /// Name of the occupying tile.
        occupant: String,
        /// Root position of the occupying placement.
        at: Position,
    },
    /// An IO tile was placed away from the edge it is oriented towards.
    WrongEdge {
        /// The edge the tile belongs on.
        edge: Dir,
    },
}

impl fmt::Display for PlacementFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlacementFault::OutOfRange { width, height } => {
                write!(f, "footprint leaves the {width}x{height} grid")
            }
            PlacementFault::Occupied { occupant, at } => {
                write!(f, "cell already occupied by '{occupant}' placed at {at}")
            }
            PlacementFault::WrongEdge { edge } => {
                write!(f, "tile belongs on the {edge} edge")
            }
        }
    }
}

/// Errors raised while composing an architecture.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArchError {
    /// A name was reused within its namespace.
    #[error("{namespace} '{name}' already exists")]
    NameCollision {
        /// The namespace of the name.
        namespace: Namespace,
        /// The duplicated name.
        name: String,
    },

    /// A connection joined bit-vectors of different widths.
    #[error("width mismatch: {driver} is {driver_width} bits wide but {sink} is {sink_width} bits wide")]
    WidthMismatch {
        /// Description of the driving endpoint.
        driver: String,
        /// Width of the driving endpoint.
        driver_width: u32,
        /// Description of the driven endpoint.
        sink: String,
        /// Width of the driven endpoint.
        sink_width: u32,
    },

    /// A name or handle did not resolve.
    #[error("unresolved {kind} '{name}'")]
    UnresolvedReference {
        /// What kind of entity was referenced.
        kind: Namespace,
        /// The name (or handle) that failed to resolve.
        name: String,
    },

    /// A tile could not be placed.
    #[error("cannot place tile '{tile}' at {position}: {reason}")]
    PlacementConflict {
        /// The tile being placed.
        tile: String,
        /// The requested root position.
        position: Position,
        /// Why it was refused.
        reason: PlacementFault,
    },

    /// Auto-connect could not pair every pin of an instance.
    #[error("auto-connect of instance '{instance}' left pins unmatched: {}", .pins.join(", "))]
    UnmatchedAutoConnect {
        /// The instance being auto-connected.
        instance: String,
        /// Every pin without a compatible block port.
        pins: Vec<String>,
    },

    /// An endpoint was used on the wrong end of a connection.
    #[error("{endpoint} cannot be a connection {role}")]
    DirectionMismatch {
        /// Description of the endpoint.
        endpoint: String,
        /// The role it was offered for.
        role: EndpointRole,
    },

    /// A sink bit already has a driver.
    #[error("{sink} is already driven")]
    MultipleDrivers {
        /// Description of the sink bits.
        sink: String,
    },

    /// A port or tile orientation is not allowed where it was given.
    #[error("invalid orientation for {what}: {reason}")]
    InvalidOrientation {
        /// The entity being created.
        what: String,
        /// What is wrong with its orientation.
        reason: String,
    },

    /// Numeric or structural parameters are out of range.
    #[error("invalid parameters for {what}: {reason}")]
    InvalidParameters {
        /// The entity being created.
        what: String,
        /// What is wrong with the parameters.
        reason: String,
    },

    /// Block instancing would make the hierarchy cyclic.
    #[error("instantiating block '{child}' inside '{parent}' would create a cycle")]
    HierarchyCycle {
        /// The block receiving the instance.
        parent: String,
        /// The block being instantiated.
        child: String,
    },

    /// Composition was attempted after a flow sealed the context.
    #[error("architecture is sealed; composition is closed once a flow has started")]
    CompositionClosed,
}

impl ArchError {
    pub(crate) fn collision(namespace: Namespace, name: impl Into<String>) -> Self {
        ArchError::NameCollision {
            namespace,
            name: name.into(),
        }
    }

    pub(crate) fn unresolved(kind: Namespace, name: impl Into<String>) -> Self {
        ArchError::UnresolvedReference {
            kind,
            name: name.into(),
        }
    }

    pub(crate) fn invalid(what: impl Into<String>, reason: impl Into<String>) -> Self {
        ArchError::InvalidParameters {
            what: what.into(),
            reason: reason.into(),
        }
    }
}

/// Checks that `name` is usable as a Verilog identifier and as a file
/// stem: an ASCII letter or `_`, then ASCII letters, digits and `_`.
pub(crate) fn check_identifier(namespace: Namespace, name: &str) -> Result<(), ArchError> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ArchError::invalid(
            format!("{namespace} '{name}'"),
            "names must start with a letter or '_' and contain only letters, digits and '_'",
        ))
    }
}
