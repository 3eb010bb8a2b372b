//! Global signals, routing segment families and direct tunnels.

use crate::geometry::{Offset, Position};
use crate::ids::{BlockId, GlobalId, PortId, SegmentId, TunnelId};
use serde::{Deserialize, Serialize};
use weft_common::Ident;

/// A chip-wide 1-bit signal entering the fabric at a fixed grid position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalSignal {
    /// The signal's ID.
    pub id: GlobalId,
    /// Signal name.
    pub name: Ident,
    /// Whether the signal is a clock.
    pub is_clock: bool,
    /// Where the signal is driven from.
    pub position: Position,
}

/// A family of parallel routing wires of one length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// The segment's ID.
    pub id: SegmentId,
    /// Segment name.
    pub name: Ident,
    /// Number of cells each wire spans.
    pub length: u32,
    /// Number of parallel wires.
    pub multiplicity: u32,
}

impl Segment {
    /// Tracks this family contributes to the channel width, `None` on overflow.
    pub fn track_count(&self) -> Option<u32> {
        self.length.checked_mul(self.multiplicity)
    }
}

/// One end of a direct tunnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunnelEnd {
    /// The block.
    pub block: BlockId,
    /// A port of that block.
    pub port: PortId,
}

/// A dedicated link from an output port of one block to an input port of a
/// block at a fixed relative offset, e.g. a carry chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectTunnel {
    /// The tunnel's ID.
    pub id: TunnelId,
    /// Tunnel name.
    pub name: Ident,
    /// Driving output port.
    pub from: TunnelEnd,
    /// Driven input port.
    pub to: TunnelEnd,
    /// Position of the sink block relative to the source block.
    pub offset: Offset,
}
