//! The fixed-size placement grid.

use crate::geometry::{Extent, Position};
use crate::ids::TileId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What happens when a placement covers an occupied cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictPolicy {
    /// Refuse the placement.
    #[default]
    Reject,
    /// Evict every placement the new footprint touches.
    Overwrite,
}

/// A tile placed with its root (lower-left) cell at some position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    /// Root cell.
    pub root: Position,
    /// The placed tile.
    pub tile: TileId,
    /// Footprint width.
    pub width: u32,
    /// Footprint height.
    pub height: u32,
}

impl Placement {
    /// Iterates over the cells this placement covers, column-major.
    pub fn cells(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.width).flat_map(move |dx| {
            (0..self.height).map(move |dy| Position::new(self.root.x + dx, self.root.y + dy))
        })
    }
}

/// Why [`Grid::place`] refused a footprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GridFault {
    OutOfRange,
    Occupied(Placement),
}

/// The top-level array of cells.
///
/// Every cell is covered by at most one placement; multi-cell tiles record
/// their root in each covered cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    extent: Extent,
    cells: Vec<Option<Position>>,
    pub(crate) placements: BTreeMap<Position, Placement>,
}

impl Grid {
    /// Creates an empty grid.
    pub fn new(extent: Extent) -> Self {
        Self {
            extent,
            cells: vec![None; extent.cell_count()],
            placements: BTreeMap::new(),
        }
    }

    /// Returns the grid size.
    pub fn extent(&self) -> Extent {
        self.extent
    }

    /// Iterates over placements in column-major root order.
    pub fn placements(&self) -> impl Iterator<Item = &Placement> {
        self.placements.values()
    }

    /// Returns the number of placements.
    pub fn placement_count(&self) -> usize {
        self.placements.len()
    }

    /// Returns the placement rooted at `root`.
    pub fn placement_at(&self, root: Position) -> Option<&Placement> {
        self.placements.get(&root)
    }

    /// Returns the placement covering `pos`, if any.
    pub fn occupant(&self, pos: Position) -> Option<&Placement> {
        if !self.extent.contains(pos) {
            return None;
        }
        self.cells[self.extent.index(pos)].and_then(|root| self.placements.get(&root))
    }

    /// Returns the cells no placement covers, column-major.
    pub fn empty_cells(&self) -> Vec<Position> {
        self.extent
            .positions()
            .filter(|&pos| self.cells[self.extent.index(pos)].is_none())
            .collect()
    }

    /// Places a footprint, returning the evicted placements.
    pub(crate) fn place(
        &mut self,
        placement: Placement,
        policy: ConflictPolicy,
    ) -> Result<Vec<Placement>, GridFault> {
        if !self
            .extent
            .contains_rect(placement.root, placement.width, placement.height)
        {
            return Err(GridFault::OutOfRange);
        }
        let mut evicted: Vec<Placement> = Vec::new();
        for cell in placement.cells() {
            if let Some(other) = self.occupant(cell) {
                if !evicted.contains(other) {
                    evicted.push(*other);
                }
            }
        }
        if let (ConflictPolicy::Reject, Some(first)) = (policy, evicted.first()) {
            return Err(GridFault::Occupied(*first));
        }
        for old in &evicted {
            self.placements.remove(&old.root);
            for cell in old.cells() {
                let index = self.extent.index(cell);
                self.cells[index] = None;
            }
        }
        for cell in placement.cells() {
            let index = self.extent.index(cell);
            self.cells[index] = Some(placement.root);
        }
        self.placements.insert(placement.root, placement);
        Ok(evicted)
    }

    /// Returns `true` if every cell index agrees with the placement map.
    pub(crate) fn is_consistent(&self) -> bool {
        if self.cells.len() != self.extent.cell_count() {
            return false;
        }
        let mut expected: Vec<Option<Position>> = vec![None; self.cells.len()];
        for placement in self.placements.values() {
            if !self
                .extent
                .contains_rect(placement.root, placement.width, placement.height)
            {
                return false;
            }
            for cell in placement.cells() {
                let slot = &mut expected[self.extent.index(cell)];
                if slot.is_some() {
                    return false;
                }
                *slot = Some(placement.root);
            }
        }
        expected == self.cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placement(x: u32, y: u32, tile: u32, height: u32) -> Placement {
        Placement {
            root: Position::new(x, y),
            tile: TileId::from_raw(tile),
            width: 1,
            height,
        }
    }

    #[test]
    fn place_and_query() {
        let mut grid = Grid::new(Extent::new(4, 4));
        grid.place(placement(2, 1, 0, 2), ConflictPolicy::Reject).unwrap();
        assert_eq!(grid.occupant(Position::new(2, 2)).unwrap().root, Position::new(2, 1));
        assert!(grid.occupant(Position::new(2, 3)).is_none());
        assert_eq!(grid.empty_cells().len(), 14);
        assert!(grid.is_consistent());
    }

    #[test]
    fn out_of_range_rejected() {
        let mut grid = Grid::new(Extent::new(4, 4));
        let fault = grid.place(placement(2, 3, 0, 2), ConflictPolicy::Reject).unwrap_err();
        assert_eq!(fault, GridFault::OutOfRange);
        assert_eq!(grid.placement_count(), 0);
    }

    #[test]
    fn overlap_rejected_by_default() {
        let mut grid = Grid::new(Extent::new(4, 4));
        grid.place(placement(1, 0, 0, 2), ConflictPolicy::Reject).unwrap();
        let fault = grid.place(placement(1, 1, 1, 1), ConflictPolicy::Reject).unwrap_err();
        assert!(matches!(fault, GridFault::Occupied(p) if p.root == Position::new(1, 0)));
    }

    #[test]
    fn overwrite_evicts_whole_footprint() {
        let mut grid = Grid::new(Extent::new(4, 4));
        grid.place(placement(1, 0, 0, 2), ConflictPolicy::Reject).unwrap();
        let evicted = grid.place(placement(1, 1, 1, 1), ConflictPolicy::Overwrite).unwrap();
        assert_eq!(evicted.len(), 1);
        assert!(grid.occupant(Position::new(1, 0)).is_none());
        assert_eq!(grid.occupant(Position::new(1, 1)).unwrap().tile, TileId::from_raw(1));
        assert!(grid.is_consistent());
    }
}
