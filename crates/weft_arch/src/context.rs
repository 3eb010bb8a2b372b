//! The architecture context: owner of every registry of a fabric.

use crate::arena::Arena;
use crate::block::{Bits, Block, BlockKind, ElementRef, NetNode, TieOff, TieValue};
use crate::builder::BlockBuilder;
use crate::error::{check_identifier, ArchError, EndpointRole, Namespace, PlacementFault};
use crate::facet::{Facet, FacetSet};
use crate::fabric::FabricData;
use crate::geometry::{Dir, Extent, Offset, Orientation, Position};
use crate::grid::{ConflictPolicy, Grid, GridFault, Placement};
use crate::ids::{BlockId, GlobalId, PrimitiveId, SegmentId, TileId, TunnelId};
use crate::port::{Port, PortDirection};
use crate::primitive::{MemoryParams, PrimitiveKind, PrimitiveLibrary, PrimitivePortSpec};
use crate::signal::{DirectTunnel, GlobalSignal, Segment, TunnelEnd};
use crate::tile::Tile;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use weft_common::{Ident, Interner};

/// The library primitive every IO block instantiates as `io`.
pub const IO_PAD_PRIMITIVE: &str = "iopad";
/// The instance name of the pad inside an IO block.
pub const IO_PAD_INSTANCE: &str = "io";

/// Lifecycle phase of a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Blocks, tiles and placements may still be created.
    Composing,
    /// A flow has started; only passes mutate the context.
    Transforming,
}

/// A compact description of a context, for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSummary {
    /// Context name.
    pub name: String,
    /// Grid width.
    pub width: u32,
    /// Grid height.
    pub height: u32,
    /// Number of blocks.
    pub blocks: usize,
    /// Number of tiles.
    pub tiles: usize,
    /// Number of primitives in the library.
    pub primitives: usize,
    /// Number of placements.
    pub placements: usize,
    /// Number of uncovered cells.
    pub empty_cells: usize,
    /// Number of global signals.
    pub globals: usize,
    /// Number of segment families.
    pub segments: usize,
    /// Number of direct tunnels.
    pub tunnels: usize,
    /// Routing channel width, 0 before routing boxes exist.
    pub channel_width: u32,
    /// Configuration chain length, 0 before config injection.
    pub config_bits: u64,
    /// Completed facets in pipeline order.
    pub facets: Vec<String>,
}

/// The root of an FPGA architecture description.
///
/// The context owns the identifier interner, globals, segments, the primitive
/// library, blocks, tiles, the placement grid and tunnels, plus all data
/// passes attach later. Names are unique within each registry and the grid
/// size never changes.
///
/// Composition methods fail with [`ArchError::CompositionClosed`] once a flow
/// has sealed the context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchitectureContext {
    name: String,
    pub(crate) interner: Interner,
    policy: ConflictPolicy,
    phase: Phase,
    pub(crate) globals: Arena<GlobalId, GlobalSignal>,
    pub(crate) global_names: BTreeMap<Ident, GlobalId>,
    pub(crate) segments: Arena<SegmentId, Segment>,
    pub(crate) segment_names: BTreeMap<Ident, SegmentId>,
    pub(crate) library: PrimitiveLibrary,
    pub(crate) blocks: Arena<BlockId, Block>,
    pub(crate) block_names: BTreeMap<Ident, BlockId>,
    pub(crate) tiles: Arena<TileId, Tile>,
    pub(crate) tile_names: BTreeMap<Ident, TileId>,
    pub(crate) grid: Grid,
    pub(crate) tunnels: Arena<TunnelId, DirectTunnel>,
    pub(crate) tunnel_names: BTreeMap<Ident, TunnelId>,
    facets: FacetSet,
    fabric: FabricData,
}

impl ArchitectureContext {
    /// Creates an empty context with a `width` × `height` grid that rejects
    /// conflicting placements.
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Result<Self, ArchError> {
        Self::with_policy(name, width, height, ConflictPolicy::Reject)
    }

    /// Creates an empty context with an explicit placement conflict policy.
    pub fn with_policy(
        name: impl Into<String>,
        width: u32,
        height: u32,
        policy: ConflictPolicy,
    ) -> Result<Self, ArchError> {
        let name = name.into();
        if width == 0 || height == 0 {
            return Err(ArchError::invalid(
                format!("context '{name}'"),
                format!("grid {width}x{height} must be at least 1x1"),
            ));
        }
        let interner = Interner::new();
        let library = PrimitiveLibrary::with_builtins(&interner);
        log::debug!("created context '{name}' with a {width}x{height} grid");
        Ok(Self {
            name,
            interner,
            policy,
            phase: Phase::Composing,
            globals: Arena::new(),
            global_names: BTreeMap::new(),
            segments: Arena::new(),
            segment_names: BTreeMap::new(),
            library,
            blocks: Arena::new(),
            block_names: BTreeMap::new(),
            tiles: Arena::new(),
            tile_names: BTreeMap::new(),
            grid: Grid::new(Extent::new(width, height)),
            tunnels: Arena::new(),
            tunnel_names: BTreeMap::new(),
            facets: FacetSet::new(),
            fabric: FabricData::default(),
        })
    }

    /// Returns the context name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the grid size.
    pub fn extent(&self) -> Extent {
        self.grid.extent()
    }

    /// Returns the placement conflict policy.
    pub fn policy(&self) -> ConflictPolicy {
        self.policy
    }

    /// Returns the lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns `true` once a flow has started.
    pub fn is_sealed(&self) -> bool {
        self.phase == Phase::Transforming
    }

    /// Closes composition. Called by the flow before its first pass.
    pub fn seal(&mut self) {
        if self.phase == Phase::Composing {
            log::debug!("sealing context '{}'", self.name);
            self.phase = Phase::Transforming;
        }
    }

    /// Returns the identifier interner.
    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    /// Resolves an identifier to its string.
    pub fn resolve(&self, ident: Ident) -> &str {
        self.interner.resolve(ident)
    }

    pub(crate) fn ensure_composing(&self) -> Result<(), ArchError> {
        match self.phase {
            Phase::Composing => Ok(()),
            Phase::Transforming => Err(ArchError::CompositionClosed),
        }
    }

    // ---------------------------------------------------------------
    // Globals and segments
    // ---------------------------------------------------------------

    /// Creates a 1-bit global signal driven from `position`.
    pub fn create_global(
        &mut self,
        name: &str,
        is_clock: bool,
        position: Position,
    ) -> Result<GlobalId, ArchError> {
        self.ensure_composing()?;
        check_identifier(Namespace::Global, name)?;
        if self.interner.get(name).is_some_and(|ident| self.global_names.contains_key(&ident)) {
            return Err(ArchError::collision(Namespace::Global, name));
        }
        if !self.extent().contains(position) {
            return Err(ArchError::invalid(
                format!("global '{name}'"),
                format!("position {position} is outside the {} grid", self.extent()),
            ));
        }
        let ident = self.interner.get_or_intern(name);
        let id = self.globals.next_id();
        self.globals.alloc(GlobalSignal {
            id,
            name: ident,
            is_clock,
            position,
        });
        self.global_names.insert(ident, id);
        Ok(id)
    }

    /// Creates a segment family of `multiplicity` wires spanning `length` cells.
    pub fn create_segment(
        &mut self,
        name: &str,
        length: u32,
        multiplicity: u32,
    ) -> Result<SegmentId, ArchError> {
        self.ensure_composing()?;
        check_identifier(Namespace::Segment, name)?;
        if self.interner.get(name).is_some_and(|ident| self.segment_names.contains_key(&ident)) {
            return Err(ArchError::collision(Namespace::Segment, name));
        }
        if length == 0 || multiplicity == 0 {
            return Err(ArchError::invalid(
                format!("segment '{name}'"),
                "length and multiplicity must be at least 1",
            ));
        }
        if length.checked_mul(multiplicity).is_none() {
            return Err(ArchError::invalid(
                format!("segment '{name}'"),
                format!("{length} x {multiplicity} tracks do not fit in 32 bits"),
            ));
        }
        let ident = self.interner.get_or_intern(name);
        let id = self.segments.next_id();
        self.segments.alloc(Segment {
            id,
            name: ident,
            length,
            multiplicity,
        });
        self.segment_names.insert(ident, id);
        Ok(id)
    }

    /// Returns the global with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if the ID was not produced by this context.
    pub fn global(&self, id: GlobalId) -> &GlobalSignal {
        self.globals.get(id)
    }

    /// Iterates over globals in creation order.
    pub fn globals(&self) -> impl Iterator<Item = &GlobalSignal> {
        self.globals.values()
    }

    /// Looks up a global by name.
    pub fn global_by_name(&self, name: &str) -> Option<GlobalId> {
        self.interner
            .get(name)
            .and_then(|ident| self.global_names.get(&ident).copied())
    }

    /// Iterates over segments in creation order.
    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments.values()
    }

    /// Returns the routing channel width, the sum of every segment family's
    /// tracks, or `None` if it does not fit in a `u32`.
    pub fn channel_width(&self) -> Option<u32> {
        self.segments
            .values()
            .try_fold(0u32, |total, segment| total.checked_add(segment.track_count()?))
    }

    /// Looks up a segment by name.
    pub fn segment_by_name(&self, name: &str) -> Option<SegmentId> {
        self.interner
            .get(name)
            .and_then(|ident| self.segment_names.get(&ident).copied())
    }

    // ---------------------------------------------------------------
    // Primitives
    // ---------------------------------------------------------------

    /// Returns the primitive library.
    pub fn library(&self) -> &PrimitiveLibrary {
        &self.library
    }

    /// Looks up a library primitive by name.
    pub fn primitive(&self, name: &str) -> Result<PrimitiveId, ArchError> {
        self.interner
            .get(name)
            .and_then(|ident| self.library.lookup(ident))
            .ok_or_else(|| ArchError::unresolved(Namespace::Primitive, name))
    }

    /// Returns the memory primitive with the given geometry, creating it on
    /// the first request. Repeated requests return the same handle.
    pub fn get_or_create_memory(
        &mut self,
        addr_width: u32,
        data_width: u32,
        dual_port: bool,
    ) -> Result<PrimitiveId, ArchError> {
        self.ensure_composing()?;
        self.library.get_or_create_memory(
            &self.interner,
            MemoryParams {
                addr_width,
                data_width,
                dual_port,
            },
        )
    }

    /// Registers a user-defined primitive.
    pub fn create_primitive(
        &mut self,
        name: &str,
        config_bits: u32,
        ports: &[PrimitivePortSpec],
    ) -> Result<PrimitiveId, ArchError> {
        self.ensure_composing()?;
        self.library.register(
            &self.interner,
            name,
            PrimitiveKind::Custom { config_bits },
            ports,
        )
    }

    // ---------------------------------------------------------------
    // Blocks
    // ---------------------------------------------------------------

    fn alloc_block(
        &mut self,
        name: &str,
        kind: BlockKind,
        width: u32,
        height: u32,
    ) -> Result<BlockId, ArchError> {
        self.ensure_composing()?;
        check_identifier(Namespace::Block, name)?;
        if self.interner.get(name).is_some_and(|ident| self.block_names.contains_key(&ident)) {
            return Err(ArchError::collision(Namespace::Block, name));
        }
        let ident = self.interner.get_or_intern(name);
        let id = self.blocks.next_id();
        self.blocks.alloc(Block::new(id, ident, kind, width, height));
        self.block_names.insert(ident, id);
        log::debug!("created block '{name}' ({width}x{height})");
        Ok(id)
    }

    /// Creates a 1×1 IO block holding `capacity` pads per tile.
    ///
    /// The block already contains the `iopad` primitive as instance `io`;
    /// its ports are added through [`block_mut`](Self::block_mut).
    pub fn create_io_block(&mut self, name: &str, capacity: u32) -> Result<BlockId, ArchError> {
        if capacity == 0 {
            return Err(ArchError::invalid(
                format!("IO block '{name}'"),
                "capacity must be at least 1",
            ));
        }
        let pad = self.primitive(IO_PAD_PRIMITIVE)?;
        let id = self.alloc_block(name, BlockKind::Io { capacity }, 1, 1)?;
        self.block_mut(id)?
            .instantiate_primitive(pad, IO_PAD_INSTANCE)?;
        Ok(id)
    }

    /// Creates an empty logic block spanning `width` × `height` cells.
    pub fn create_logic_block(
        &mut self,
        name: &str,
        width: u32,
        height: u32,
    ) -> Result<BlockId, ArchError> {
        if width == 0 || height == 0 {
            return Err(ArchError::invalid(
                format!("block '{name}'"),
                format!("size {width}x{height} must be at least 1x1"),
            ));
        }
        self.alloc_block(name, BlockKind::Logic, width, height)
    }

    /// Opens a block for composition.
    pub fn block_mut(&mut self, id: BlockId) -> Result<BlockBuilder<'_>, ArchError> {
        self.ensure_composing()?;
        if !self.blocks.contains(id) {
            return Err(ArchError::unresolved(Namespace::Block, format!("#{}", id.as_raw())));
        }
        Ok(BlockBuilder::new(self, id))
    }

    /// Returns the block with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if the ID was not produced by this context.
    pub fn block(&self, id: BlockId) -> &Block {
        self.blocks.get(id)
    }

    /// Iterates over blocks in creation order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values()
    }

    /// Looks up a block by name.
    pub fn block_by_name(&self, name: &str) -> Option<BlockId> {
        self.interner
            .get(name)
            .and_then(|ident| self.block_names.get(&ident).copied())
    }

    /// Returns the name of an instance's element.
    pub fn element_name(&self, element: ElementRef) -> &str {
        match element {
            ElementRef::Primitive(id) => self.resolve(self.library.get(id).name),
            ElementRef::Block(id) => self.resolve(self.blocks.get(id).name),
        }
    }

    /// Describes a bit range for messages, e.g. `pin 'cluster0.ia[2:0]'`.
    pub fn describe_bits(&self, block: BlockId, bits: &Bits) -> String {
        let Some(owner) = self.blocks.try_get(block) else {
            return format!("bits of unknown block #{}", block.as_raw());
        };
        let (kind, name, width) = match bits.node {
            NetNode::Port(id) => match owner.port(id) {
                Some(port) => (
                    "port",
                    format!("{}.{}", self.resolve(owner.name), self.resolve(port.name)),
                    port.width,
                ),
                None => return format!("unknown port #{}", id.as_raw()),
            },
            NetNode::Pin { instance, pin } => {
                match owner.instance(instance).and_then(|i| i.pins.get(pin as usize).map(|p| (i, p))) {
                    Some((inst, p)) => (
                        "pin",
                        format!("{}.{}", self.resolve(inst.name), self.resolve(p.name)),
                        p.width,
                    ),
                    None => return format!("unknown pin #{pin} of instance #{}", instance.as_raw()),
                }
            }
        };
        if bits.offset == 0 && bits.width == width {
            format!("{kind} '{name}'")
        } else if bits.width == 1 {
            format!("{kind} '{name}[{}]'", bits.offset)
        } else {
            format!(
                "{kind} '{name}[{}:{}]'",
                bits.offset + bits.width - 1,
                bits.offset
            )
        }
    }

    // ---------------------------------------------------------------
    // Tiles and placement
    // ---------------------------------------------------------------

    /// Wraps a block into a placeable tile.
    ///
    /// IO blocks need the concrete chip edge the tile sits on; logic blocks
    /// need [`Orientation::Auto`].
    pub fn create_tile(
        &mut self,
        name: &str,
        block: BlockId,
        orientation: Orientation,
    ) -> Result<TileId, ArchError> {
        self.ensure_composing()?;
        check_identifier(Namespace::Tile, name)?;
        if self.interner.get(name).is_some_and(|ident| self.tile_names.contains_key(&ident)) {
            return Err(ArchError::collision(Namespace::Tile, name));
        }
        let owner = self
            .blocks
            .try_get(block)
            .ok_or_else(|| ArchError::unresolved(Namespace::Block, format!("#{}", block.as_raw())))?;
        match (owner.kind, orientation) {
            (BlockKind::Io { .. }, Orientation::Auto) => {
                return Err(ArchError::InvalidOrientation {
                    what: format!("tile '{name}'"),
                    reason: "IO tiles need the chip edge they sit on".to_string(),
                })
            }
            (BlockKind::Logic, Orientation::Concrete(dir)) => {
                return Err(ArchError::InvalidOrientation {
                    what: format!("tile '{name}'"),
                    reason: format!("logic tiles are not tied to an edge, got {dir}"),
                })
            }
            _ => {}
        }
        let ident = self.interner.get_or_intern(name);
        let id = self.tiles.next_id();
        self.tiles.alloc(Tile {
            id,
            name: ident,
            block,
            orientation,
            width: owner.width,
            height: owner.height,
            capacity: owner.capacity(),
        });
        self.tile_names.insert(ident, id);
        Ok(id)
    }

    /// Returns the tile with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if the ID was not produced by this context.
    pub fn tile(&self, id: TileId) -> &Tile {
        self.tiles.get(id)
    }

    /// Iterates over tiles in creation order.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    /// Looks up a tile by name.
    pub fn tile_by_name(&self, name: &str) -> Option<TileId> {
        self.interner
            .get(name)
            .and_then(|ident| self.tile_names.get(&ident).copied())
    }

    /// Places `tile` with its root cell at `position`.
    ///
    /// Fails if any covered cell is outside the grid, if an IO tile is off
    /// its edge, or (under [`ConflictPolicy::Reject`]) if a covered cell is
    /// occupied. Under [`ConflictPolicy::Overwrite`] the occupants are evicted.
    pub fn place(&mut self, tile: TileId, position: Position) -> Result<(), ArchError> {
        self.ensure_composing()?;
        let t = self
            .tiles
            .try_get(tile)
            .ok_or_else(|| ArchError::unresolved(Namespace::Tile, format!("#{}", tile.as_raw())))?
            .clone();
        let tile_name = self.resolve(t.name).to_string();
        let extent = self.extent();
        let conflict = |reason| ArchError::PlacementConflict {
            tile: tile_name.clone(),
            position,
            reason,
        };
        if let Some(edge) = t.edge() {
            let on_edge = match edge {
                Dir::North => position.y + 1 == extent.height,
                Dir::East => position.x + 1 == extent.width,
                Dir::South => position.y == 0,
                Dir::West => position.x == 0,
            };
            if extent.contains(position) && !on_edge {
                return Err(conflict(PlacementFault::WrongEdge { edge }));
            }
        }
        let placement = Placement {
            root: position,
            tile,
            width: t.width,
            height: t.height,
        };
        match self.grid.place(placement, self.policy) {
            Ok(evicted) => {
                for old in evicted {
                    log::debug!(
                        "placing '{tile_name}' at {position} evicted '{}' at {}",
                        self.resolve(self.tiles.get(old.tile).name),
                        old.root
                    );
                }
                Ok(())
            }
            Err(GridFault::OutOfRange) => Err(conflict(PlacementFault::OutOfRange {
                width: extent.width,
                height: extent.height,
            })),
            Err(GridFault::Occupied(other)) => Err(conflict(PlacementFault::Occupied {
                occupant: self.resolve(self.tiles.get(other.tile).name).to_string(),
                at: other.root,
            })),
        }
    }

    /// Returns the placement grid.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    // ---------------------------------------------------------------
    // Direct tunnels
    // ---------------------------------------------------------------

    /// Creates a direct link from output port `from` of one block to input
    /// port `to` of a block placed at `offset` relative to the source.
    pub fn create_direct_tunnel(
        &mut self,
        name: &str,
        from: (BlockId, &str),
        to: (BlockId, &str),
        offset: Offset,
    ) -> Result<TunnelId, ArchError> {
        self.ensure_composing()?;
        check_identifier(Namespace::Tunnel, name)?;
        if self.interner.get(name).is_some_and(|ident| self.tunnel_names.contains_key(&ident)) {
            return Err(ArchError::collision(Namespace::Tunnel, name));
        }
        let source = self.tunnel_end(from)?;
        let sink = self.tunnel_end(to)?;
        let source_port = self.tunnel_port(source);
        let sink_port = self.tunnel_port(sink);
        let source_desc = format!("port '{}.{}'", self.resolve(self.blocks.get(from.0).name), from.1);
        let sink_desc = format!("port '{}.{}'", self.resolve(self.blocks.get(to.0).name), to.1);
        if source_port.direction != PortDirection::Output {
            return Err(ArchError::DirectionMismatch {
                endpoint: source_desc,
                role: EndpointRole::Driver,
            });
        }
        if sink_port.direction != PortDirection::Input {
            return Err(ArchError::DirectionMismatch {
                endpoint: sink_desc,
                role: EndpointRole::Sink,
            });
        }
        if source_port.width != sink_port.width {
            return Err(ArchError::WidthMismatch {
                driver: source_desc,
                driver_width: source_port.width,
                sink: sink_desc,
                sink_width: sink_port.width,
            });
        }
        let ident = self.interner.get_or_intern(name);
        let id = self.tunnels.next_id();
        self.tunnels.alloc(DirectTunnel {
            id,
            name: ident,
            from: source,
            to: sink,
            offset,
        });
        self.tunnel_names.insert(ident, id);
        Ok(id)
    }

    fn tunnel_end(&self, (block, port): (BlockId, &str)) -> Result<TunnelEnd, ArchError> {
        let owner = self
            .blocks
            .try_get(block)
            .ok_or_else(|| ArchError::unresolved(Namespace::Block, format!("#{}", block.as_raw())))?;
        let found = self
            .interner
            .get(port)
            .and_then(|ident| owner.port_by_name(ident))
            .ok_or_else(|| {
                ArchError::unresolved(
                    Namespace::Port,
                    format!("{}.{port}", self.resolve(owner.name)),
                )
            })?;
        Ok(TunnelEnd {
            block,
            port: found.id,
        })
    }

    /// Returns the port a tunnel end refers to.
    ///
    /// # Panics
    ///
    /// Panics if the end does not resolve; ends are checked on creation.
    pub fn tunnel_port(&self, end: TunnelEnd) -> &Port {
        self.blocks.get(end.block).ports.get(end.port)
    }

    /// Returns the tunnel with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if the ID was not produced by this context.
    pub fn tunnel(&self, id: TunnelId) -> &DirectTunnel {
        self.tunnels.get(id)
    }

    /// Iterates over tunnels in creation order.
    pub fn tunnels(&self) -> impl Iterator<Item = &DirectTunnel> {
        self.tunnels.values()
    }

    /// Looks up a tunnel by name.
    pub fn tunnel_by_name(&self, name: &str) -> Option<TunnelId> {
        self.interner
            .get(name)
            .and_then(|ident| self.tunnel_names.get(&ident).copied())
    }

    // ---------------------------------------------------------------
    // Transformation phase
    // ---------------------------------------------------------------

    /// Returns the completed facets.
    pub fn facets(&self) -> &FacetSet {
        &self.facets
    }

    /// Marks a facet complete. Returns `false` if it already was.
    pub fn mark_complete(&mut self, facet: Facet) -> bool {
        self.facets.insert(facet)
    }

    /// Returns the pass-produced data.
    pub fn fabric(&self) -> &FabricData {
        &self.fabric
    }

    /// Returns the pass-produced data for modification.
    pub fn fabric_mut(&mut self) -> &mut FabricData {
        &mut self.fabric
    }

    /// Ties undriven sink bits of a block to a constant.
    pub fn tie_off(&mut self, block: BlockId, sink: Bits, value: TieValue) -> Result<(), ArchError> {
        let owner = self
            .blocks
            .try_get(block)
            .ok_or_else(|| ArchError::unresolved(Namespace::Block, format!("#{}", block.as_raw())))?;
        crate::builder::check_bits(self, block, &sink)?;
        if owner.is_driver(sink.node) != Some(false) {
            return Err(ArchError::DirectionMismatch {
                endpoint: self.describe_bits(block, &sink),
                role: EndpointRole::Sink,
            });
        }
        if owner.is_driven(&sink) {
            return Err(ArchError::MultipleDrivers {
                sink: self.describe_bits(block, &sink),
            });
        }
        self.blocks.get_mut(block).tie_offs.push(TieOff { sink, value });
        Ok(())
    }

    /// Summarizes the context for reporting.
    pub fn summary(&self) -> ContextSummary {
        let extent = self.extent();
        ContextSummary {
            name: self.name.clone(),
            width: extent.width,
            height: extent.height,
            blocks: self.blocks.len(),
            tiles: self.tiles.len(),
            primitives: self.library.len(),
            placements: self.grid.placement_count(),
            empty_cells: self.grid.empty_cells().len(),
            globals: self.globals.len(),
            segments: self.segments.len(),
            tunnels: self.tunnels.len(),
            channel_width: self.fabric.routing.channel_width,
            config_bits: self.fabric.config.total_bits,
            facets: self.facets.iter().map(|f| f.name().to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::PortSpec;

    fn ctx() -> ArchitectureContext {
        ArchitectureContext::new("test", 4, 4).unwrap()
    }

    #[test]
    fn zero_grid_rejected() {
        let err = ArchitectureContext::new("bad", 0, 4).unwrap_err();
        assert!(matches!(err, ArchError::InvalidParameters { .. }));
    }

    #[test]
    fn global_names_unique() {
        let mut ctx = ctx();
        ctx.create_global("clk", true, Position::new(0, 1)).unwrap();
        let err = ctx.create_global("clk", true, Position::new(0, 2)).unwrap_err();
        assert!(matches!(err, ArchError::NameCollision { namespace: Namespace::Global, .. }));
    }

    #[test]
    fn global_outside_grid_rejected() {
        let mut ctx = ctx();
        let before = ctx.clone();
        let err = ctx.create_global("clk", true, Position::new(4, 0)).unwrap_err();
        assert!(matches!(err, ArchError::InvalidParameters { .. }));
        assert!(ctx.interner().get("clk").is_none());
        assert_eq!(ctx, before);
    }

    #[test]
    fn rejected_calls_leave_context_unchanged() {
        let mut ctx = ctx();
        let clb = ctx.create_logic_block("clb", 1, 1).unwrap();
        let before = ctx.clone();
        assert!(ctx.create_segment("huge", 70_000, 70_000).is_err());
        assert!(ctx.create_tile("clb_tile", clb, Orientation::NORTH).is_err());
        assert!(ctx.create_logic_block("wide", 0, 1).is_err());
        {
            let mut b = ctx.block_mut(clb).unwrap();
            assert!(b.create_input("pad", 1, Orientation::AUTO).is_err());
            assert!(b.instantiate_primitive(PrimitiveId::from_raw(999), "lut").is_err());
        }
        assert_eq!(ctx, before);
    }

    #[test]
    fn names_must_be_identifiers() {
        let mut ctx = ctx();
        for bad in ["a-b", "../x", "", "1x", "clb tile"] {
            assert!(
                matches!(
                    ctx.create_logic_block(bad, 1, 1).unwrap_err(),
                    ArchError::InvalidParameters { .. }
                ),
                "{bad:?} accepted"
            );
        }
        assert!(ctx.create_segment("L-1", 1, 1).is_err());
        let clb = ctx.create_logic_block("_clb2", 1, 1).unwrap();
        let lut = ctx.primitive("lut4").unwrap();
        let mut b = ctx.block_mut(clb).unwrap();
        assert!(b.create_input("in.0", 1, Orientation::WEST).is_err());
        assert!(b.instantiate_primitive(lut, "lut/0").is_err());
        assert_eq!(b.block().port_count(), 0);
    }

    #[test]
    fn segment_track_count_must_fit() {
        let mut ctx = ctx();
        let err = ctx.create_segment("huge", 70_000, 70_000).unwrap_err();
        assert!(matches!(err, ArchError::InvalidParameters { .. }));
        assert!(ctx.segment_by_name("huge").is_none());
        ctx.create_segment("long", 65_536, 65_535).unwrap();
        assert_eq!(ctx.channel_width(), Some(65_536 * 65_535));
        ctx.create_segment("more", 65_536, 1).unwrap();
        assert_eq!(ctx.channel_width(), None);
    }

    #[test]
    fn segment_validation() {
        let mut ctx = ctx();
        ctx.create_segment("L1", 12, 1).unwrap();
        assert!(ctx.create_segment("L0", 0, 1).is_err());
        assert!(matches!(
            ctx.create_segment("L1", 4, 2).unwrap_err(),
            ArchError::NameCollision { .. }
        ));
        assert!(ctx.segment_by_name("L1").is_some());
    }

    #[test]
    fn io_block_has_pad_instance() {
        let mut ctx = ctx();
        let iob = ctx.create_io_block("iob", 4).unwrap();
        let block = ctx.block(iob);
        let io = ctx.interner().get(IO_PAD_INSTANCE).unwrap();
        let inst = block.instance_by_name(io).unwrap();
        assert_eq!(ctx.element_name(inst.element), "iopad");
        assert_eq!(block.capacity(), 4);
    }

    #[test]
    fn block_names_unique_across_kinds() {
        let mut ctx = ctx();
        ctx.create_io_block("x", 1).unwrap();
        let err = ctx.create_logic_block("x", 1, 1).unwrap_err();
        assert!(matches!(err, ArchError::NameCollision { namespace: Namespace::Block, .. }));
    }

    #[test]
    fn tile_orientation_rules() {
        let mut ctx = ctx();
        let iob = ctx.create_io_block("iob", 1).unwrap();
        let clb = ctx.create_logic_block("clb", 1, 1).unwrap();
        assert!(matches!(
            ctx.create_tile("io_auto", iob, Orientation::AUTO).unwrap_err(),
            ArchError::InvalidOrientation { .. }
        ));
        assert!(matches!(
            ctx.create_tile("clb_north", clb, Orientation::NORTH).unwrap_err(),
            ArchError::InvalidOrientation { .. }
        ));
        ctx.create_tile("io_west", iob, Orientation::WEST).unwrap();
        ctx.create_tile("clb_tile", clb, Orientation::AUTO).unwrap();
        assert_eq!(ctx.tiles().count(), 2);
    }

    #[test]
    fn io_tile_must_sit_on_its_edge() {
        let mut ctx = ctx();
        let iob = ctx.create_io_block("iob", 1).unwrap();
        let west = ctx.create_tile("io_west", iob, Orientation::WEST).unwrap();
        ctx.place(west, Position::new(0, 1)).unwrap();
        let err = ctx.place(west, Position::new(1, 1)).unwrap_err();
        assert!(matches!(
            err,
            ArchError::PlacementConflict {
                reason: PlacementFault::WrongEdge { edge: Dir::West },
                ..
            }
        ));
    }

    #[test]
    fn occupied_and_out_of_range_placements() {
        let mut ctx = ctx();
        let bram = ctx.create_logic_block("bram", 1, 2).unwrap();
        let clb = ctx.create_logic_block("clb", 1, 1).unwrap();
        let bram_tile = ctx.create_tile("bram_tile", bram, Orientation::AUTO).unwrap();
        let clb_tile = ctx.create_tile("clb_tile", clb, Orientation::AUTO).unwrap();
        ctx.place(bram_tile, Position::new(1, 1)).unwrap();
        let err = ctx.place(clb_tile, Position::new(1, 2)).unwrap_err();
        match err {
            ArchError::PlacementConflict {
                reason: PlacementFault::Occupied { occupant, at },
                ..
            } => {
                assert_eq!(occupant, "bram_tile");
                assert_eq!(at, Position::new(1, 1));
            }
            other => panic!("unexpected error: {other}"),
        }
        let err = ctx.place(bram_tile, Position::new(2, 3)).unwrap_err();
        assert!(matches!(
            err,
            ArchError::PlacementConflict {
                reason: PlacementFault::OutOfRange { .. },
                ..
            }
        ));
        assert_eq!(ctx.grid().placement_count(), 1);
    }

    #[test]
    fn overwrite_policy_evicts() {
        let mut ctx = ArchitectureContext::with_policy("t", 4, 4, ConflictPolicy::Overwrite).unwrap();
        let clb = ctx.create_logic_block("clb", 1, 1).unwrap();
        let a = ctx.create_tile("a", clb, Orientation::AUTO).unwrap();
        let b = ctx.create_tile("b", clb, Orientation::AUTO).unwrap();
        ctx.place(a, Position::new(2, 2)).unwrap();
        ctx.place(b, Position::new(2, 2)).unwrap();
        assert_eq!(ctx.grid().placement_count(), 1);
        assert_eq!(ctx.grid().occupant(Position::new(2, 2)).unwrap().tile, b);
    }

    #[test]
    fn memory_memoized_through_context() {
        let mut ctx = ctx();
        let a = ctx.get_or_create_memory(10, 8, true).unwrap();
        let b = ctx.get_or_create_memory(10, 8, true).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn unknown_primitive_unresolved() {
        let ctx = ctx();
        assert!(matches!(
            ctx.primitive("lut9").unwrap_err(),
            ArchError::UnresolvedReference { kind: Namespace::Primitive, .. }
        ));
    }

    #[test]
    fn tunnel_checks_directions_and_widths() {
        let mut ctx = ctx();
        let clb = ctx.create_logic_block("clb", 1, 1).unwrap();
        {
            let mut b = ctx.block_mut(clb).unwrap();
            b.create_input("cin", 1, Orientation::NORTH).unwrap();
            b.create_output("cout", 1, Orientation::SOUTH).unwrap();
            b.create_output("wide", 2, Orientation::SOUTH).unwrap();
        }
        let id = ctx
            .create_direct_tunnel("carrychain", (clb, "cout"), (clb, "cin"), Offset::new(0, 1))
            .unwrap();
        assert_eq!(ctx.tunnel(id).offset, Offset::new(0, 1));
        assert!(matches!(
            ctx.create_direct_tunnel("backwards", (clb, "cin"), (clb, "cout"), Offset::new(0, -1))
                .unwrap_err(),
            ArchError::DirectionMismatch { .. }
        ));
        assert!(matches!(
            ctx.create_direct_tunnel("wide", (clb, "wide"), (clb, "cin"), Offset::new(0, 1))
                .unwrap_err(),
            ArchError::WidthMismatch { .. }
        ));
        assert!(matches!(
            ctx.create_direct_tunnel("missing", (clb, "nope"), (clb, "cin"), Offset::new(0, 1))
                .unwrap_err(),
            ArchError::UnresolvedReference { kind: Namespace::Port, .. }
        ));
    }

    #[test]
    fn sealed_context_rejects_composition() {
        let mut ctx = ctx();
        let clb = ctx.create_logic_block("clb", 1, 1).unwrap();
        ctx.seal();
        assert!(ctx.is_sealed());
        assert_eq!(ctx.create_logic_block("more", 1, 1).unwrap_err(), ArchError::CompositionClosed);
        assert!(matches!(ctx.block_mut(clb), Err(ArchError::CompositionClosed)));
        assert_eq!(ctx.create_segment("L1", 1, 1).unwrap_err(), ArchError::CompositionClosed);
    }

    #[test]
    fn tie_off_rejects_driven_bits() {
        let mut ctx = ctx();
        let clb = ctx.create_logic_block("clb", 1, 1).unwrap();
        let lut = ctx.primitive("lut4").unwrap();
        let (input, ce) = {
            let mut b = ctx.block_mut(clb).unwrap();
            let ce = b.create_port(PortSpec::input("ce", 1, Orientation::SOUTH)).unwrap();
            let inst = b.instantiate_primitive(lut, "lut").unwrap();
            let input = b.pin(inst, "in").unwrap();
            b.connect(ce, input.bit(0).unwrap()).unwrap();
            (input, ce)
        };
        ctx.seal();
        ctx.tie_off(clb, input.slice(1, 3).unwrap(), TieValue::Zero).unwrap();
        assert!(matches!(
            ctx.tie_off(clb, input.bit(0).unwrap(), TieValue::Zero).unwrap_err(),
            ArchError::MultipleDrivers { .. }
        ));
        assert!(matches!(
            ctx.tie_off(clb, ce, TieValue::Zero).unwrap_err(),
            ArchError::DirectionMismatch { .. }
        ));
    }

    #[test]
    fn tie_off_rejects_bits_of_another_block() {
        let mut ctx = ctx();
        let lut = ctx.primitive("lut4").unwrap();
        let mut pins = Vec::new();
        for name in ["a", "b"] {
            let id = ctx.create_logic_block(name, 1, 1).unwrap();
            let mut b = ctx.block_mut(id).unwrap();
            let inst = b.instantiate_primitive(lut, "lut").unwrap();
            pins.push((id, b.pin(inst, "in").unwrap()));
        }
        ctx.seal();
        let (a, a_in) = pins[0];
        let (b, _) = pins[1];
        assert!(matches!(
            ctx.tie_off(b, a_in, TieValue::Zero).unwrap_err(),
            ArchError::UnresolvedReference { kind: Namespace::Pin, .. }
        ));
        assert!(ctx.block(b).tie_offs().is_empty());
        ctx.tie_off(a, a_in, TieValue::Zero).unwrap();
    }

    #[test]
    fn describe_bits_formats() {
        let mut ctx = ctx();
        let clb = ctx.create_logic_block("clb", 1, 1).unwrap();
        let lut = ctx.primitive("lut6").unwrap();
        let pin = {
            let mut b = ctx.block_mut(clb).unwrap();
            let inst = b.instantiate_primitive(lut, "cluster0").unwrap();
            b.pin(inst, "in").unwrap()
        };
        assert_eq!(ctx.describe_bits(clb, &pin), "pin 'cluster0.in'");
        assert_eq!(ctx.describe_bits(clb, &pin.bit(2).unwrap()), "pin 'cluster0.in[2]'");
        assert_eq!(ctx.describe_bits(clb, &pin.slice(0, 3).unwrap()), "pin 'cluster0.in[2:0]'");
    }

    #[test]
    fn summary_counts() {
        let mut ctx = ctx();
        ctx.create_segment("L1", 1, 1).unwrap();
        let clb = ctx.create_logic_block("clb", 1, 1).unwrap();
        let tile = ctx.create_tile("clb_tile", clb, Orientation::AUTO).unwrap();
        ctx.place(tile, Position::new(1, 1)).unwrap();
        let summary = ctx.summary();
        assert_eq!(summary.placements, 1);
        assert_eq!(summary.empty_cells, 15);
        assert_eq!(summary.segments, 1);
        assert!(summary.facets.is_empty());
    }
}
