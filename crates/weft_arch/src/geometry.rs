//! Grid geometry: cardinal directions, orientations, positions and extents.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A cardinal direction on the fabric grid. North is `+y`, east is `+x`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Dir {
    /// Towards larger `y`.
    North,
    /// Towards larger `x`.
    East,
    /// Towards smaller `y`.
    South,
    /// Towards smaller `x`.
    West,
}

impl Dir {
    /// All four directions, clockwise from north.
    pub const ALL: [Dir; 4] = [Dir::North, Dir::East, Dir::South, Dir::West];

    /// Returns the direction pointing the other way.
    pub fn opposite(self) -> Dir {
        match self {
            Dir::North => Dir::South,
            Dir::East => Dir::West,
            Dir::South => Dir::North,
            Dir::West => Dir::East,
        }
    }

    /// Returns the lowercase name used in generated file and tile names.
    pub fn name(self) -> &'static str {
        match self {
            Dir::North => "north",
            Dir::East => "east",
            Dir::South => "south",
            Dir::West => "west",
        }
    }

    /// Returns the unit step `(dx, dy)` for this direction.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Dir::North => (0, 1),
            Dir::East => (1, 0),
            Dir::South => (0, -1),
            Dir::West => (-1, 0),
        }
    }
}

impl fmt::Display for Dir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The orientation of a port or tile.
///
/// `Auto` means the side is resolved from context: an IO block's ports face
/// the interior of the chip, i.e. the opposite of the edge its tile sits on.
/// Anything that consumes geometry resolves `Auto` through
/// [`Tile::port_side`](crate::Tile::port_side) first.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Orientation {
    /// A fixed side.
    Concrete(Dir),
    /// Resolved from the owning tile.
    Auto,
}

impl Orientation {
    /// `Concrete(Dir::North)`.
    pub const NORTH: Orientation = Orientation::Concrete(Dir::North);
    /// `Concrete(Dir::East)`.
    pub const EAST: Orientation = Orientation::Concrete(Dir::East);
    /// `Concrete(Dir::South)`.
    pub const SOUTH: Orientation = Orientation::Concrete(Dir::South);
    /// `Concrete(Dir::West)`.
    pub const WEST: Orientation = Orientation::Concrete(Dir::West);
    /// `Auto`.
    pub const AUTO: Orientation = Orientation::Auto;

    /// Returns the concrete direction, or `None` for `Auto`.
    pub fn concrete(self) -> Option<Dir> {
        match self {
            Orientation::Concrete(dir) => Some(dir),
            Orientation::Auto => None,
        }
    }

    /// Returns `true` for `Auto`.
    pub fn is_auto(self) -> bool {
        matches!(self, Orientation::Auto)
    }
}

impl From<Dir> for Orientation {
    fn from(dir: Dir) -> Self {
        Orientation::Concrete(dir)
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Concrete(dir) => dir.fmt(f),
            Orientation::Auto => f.write_str("auto"),
        }
    }
}

/// An absolute grid coordinate, or a sub-position inside a multi-cell block.
///
/// Ordering is column-major (`x` first, then `y`), which is the order the
/// configuration chain visits placements in.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize)]
pub struct Position {
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
}

impl Position {
    /// The origin `(0, 0)`.
    pub const ORIGIN: Position = Position { x: 0, y: 0 };

    /// Creates a position.
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Adds an unsigned displacement, e.g. a sub-position to a placement root.
    pub fn plus(self, other: Position) -> Position {
        Position::new(self.x + other.x, self.y + other.y)
    }

    /// Applies a signed offset, returning `None` if a coordinate goes negative.
    pub fn offset(self, offset: Offset) -> Option<Position> {
        let x = i64::from(self.x) + i64::from(offset.dx);
        let y = i64::from(self.y) + i64::from(offset.dy);
        Some(Position::new(u32::try_from(x).ok()?, u32::try_from(y).ok()?))
    }
}

impl From<(u32, u32)> for Position {
    fn from((x, y): (u32, u32)) -> Self {
        Position::new(x, y)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A signed relative grid offset.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct Offset {
    /// Column delta.
    pub dx: i32,
    /// Row delta.
    pub dy: i32,
}

impl Offset {
    /// Creates an offset.
    pub fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }
}

impl From<(i32, i32)> for Offset {
    fn from((dx, dy): (i32, i32)) -> Self {
        Offset::new(dx, dy)
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:+}, {:+})", self.dx, self.dy)
    }
}

/// A width × height size in cells.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Extent {
    /// Number of columns.
    pub width: u32,
    /// Number of rows.
    pub height: u32,
}

impl Extent {
    /// Creates an extent.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns `true` if `pos` lies inside the extent.
    pub fn contains(&self, pos: Position) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    /// Returns `true` if the `width` × `height` rectangle rooted at `pos` fits.
    pub fn contains_rect(&self, pos: Position, width: u32, height: u32) -> bool {
        u64::from(pos.x) + u64::from(width) <= u64::from(self.width)
            && u64::from(pos.y) + u64::from(height) <= u64::from(self.height)
    }

    /// Returns the number of cells.
    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Returns the dense column-major index of `pos`.
    ///
    /// Callers check [`contains`](Self::contains) first.
    pub fn index(&self, pos: Position) -> usize {
        pos.x as usize * self.height as usize + pos.y as usize
    }

    /// Iterates over all positions in column-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> {
        let height = self.height;
        (0..self.width).flat_map(move |x| (0..height).map(move |y| Position::new(x, y)))
    }

    /// Returns the chip edges `pos` lies on (corners lie on two).
    pub fn edges_of(&self, pos: Position) -> Vec<Dir> {
        let mut edges = Vec::new();
        if pos.y + 1 == self.height {
            edges.push(Dir::North);
        }
        if pos.x + 1 == self.width {
            edges.push(Dir::East);
        }
        if pos.y == 0 {
            edges.push(Dir::South);
        }
        if pos.x == 0 {
            edges.push(Dir::West);
        }
        edges
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
