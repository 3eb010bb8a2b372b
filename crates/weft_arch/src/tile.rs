//! Tiles: blocks wrapped with a placement role.

use crate::geometry::{Dir, Orientation};
use crate::ids::{BlockId, TileId};
use crate::port::Port;
use serde::{Deserialize, Serialize};
use weft_common::Ident;

/// A placeable wrapper around a block.
///
/// IO tiles carry the chip edge they sit on; logic tiles carry
/// [`Orientation::Auto`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    /// The tile's ID.
    pub id: TileId,
    /// Tile name, unique within the context.
    pub name: Ident,
    /// The wrapped block.
    pub block: BlockId,
    /// Chip edge for IO tiles, `Auto` for logic tiles.
    pub orientation: Orientation,
    /// Footprint width in cells.
    pub width: u32,
    /// Footprint height in cells.
    pub height: u32,
    /// Number of block copies per placement (IO capacity).
    pub capacity: u32,
}

impl Tile {
    /// Returns the chip edge of an IO tile.
    pub fn edge(&self) -> Option<Dir> {
        self.orientation.concrete()
    }

    /// Resolves the side a port of the wrapped block faces.
    ///
    /// Concrete orientations are returned as-is; `Auto` ports face away from
    /// the tile's edge, towards the chip interior. Returns `None` only for an
    /// `Auto` port on a logic tile, which composition rejects.
    pub fn port_side(&self, port: &Port) -> Option<Dir> {
        match port.orientation {
            Orientation::Concrete(dir) => Some(dir),
            Orientation::Auto => self.edge().map(Dir::opposite),
        }
    }
}
