//! Architecture composition model for the Weft fabric builder.
//!
//! An [`ArchitectureContext`] owns everything that describes a fabric:
//! global signals, routing segment families, the [`PrimitiveLibrary`],
//! [`Block`]s and the [`Tile`]s wrapping them, the placement [`Grid`] and
//! direct tunnels. Entities refer to each other through `u32` handles
//! allocated in arenas, and names are interned in the context's
//! [`Interner`](weft_common::Interner), so a context serializes as plain data.
//!
//! # Usage
//!
//! ```
//! use weft_arch::{ArchitectureContext, Orientation, Position};
//!
//! let mut ctx = ArchitectureContext::new("top", 4, 4).unwrap();
//! let lut = ctx.primitive("lut4").unwrap();
//! let clb = ctx.create_logic_block("clb", 1, 1).unwrap();
//! {
//!     let mut b = ctx.block_mut(clb).unwrap();
//!     let inputs = b.create_input("in", 4, Orientation::WEST).unwrap();
//!     let out = b.create_output("out", 1, Orientation::EAST).unwrap();
//!     let inst = b.instantiate_primitive(lut, "lut").unwrap();
//!     b.connect(inputs, b.pin(inst, "in").unwrap()).unwrap();
//!     b.connect(b.pin(inst, "out").unwrap(), out).unwrap();
//! }
//! let tile = ctx.create_tile("clb_tile", clb, Orientation::AUTO).unwrap();
//! ctx.place(tile, Position::new(1, 1)).unwrap();
//! assert_eq!(ctx.grid().placement_count(), 1);
//! ```
//!
//! Once a flow starts it [seals](ArchitectureContext::seal) the context;
//! from then on only passes change it, recording what they completed as
//! [`Facet`]s and their results in [`FabricData`].

#![warn(missing_docs)]

pub mod arena;
pub mod block;
pub mod builder;
pub mod context;
pub mod error;
pub mod fabric;
pub mod facet;
pub mod geometry;
pub mod grid;
pub mod hierarchy;
pub mod ids;
pub mod port;
pub mod primitive;
pub mod signal;
pub mod tile;
pub mod verify;

pub use arena::{Arena, ArenaId};
pub use block::{
    Bits, Block, BlockKind, Connection, ElementRef, Instance, NetNode, Pin, TieOff, TieValue,
    UnconnectedPin,
};
pub use builder::BlockBuilder;
pub use context::{ArchitectureContext, ContextSummary, Phase, IO_PAD_INSTANCE, IO_PAD_PRIMITIVE};
pub use error::{ArchError, EndpointRole, Namespace, PlacementFault};
pub use fabric::{
    Artifact, ArtifactKind, CboxEntry, ChainSegment, ConfigChain, ConnectionBox, DefaultReason,
    DefaultTie, Defaults, FabricData, GlobalBinding, MuxGroup, PhysicalInstance, PhysicalView,
    PortBinding, RoutingData, SwitchBox, SwitchDef, TunnelLink,
};
pub use facet::{Facet, FacetSet};
pub use geometry::{Dir, Extent, Offset, Orientation, Position};
pub use grid::{ConflictPolicy, Grid, Placement};
pub use hierarchy::{block_config_bits, Hierarchy};
pub use ids::{
    BlockId, GlobalId, InstanceId, PortId, PrimitiveId, SegmentId, SwitchId, TileId, TunnelId,
};
pub use port::{Port, PortDirection, PortSpec};
pub use primitive::{
    MemoryParams, Primitive, PrimitiveKind, PrimitiveLibrary, PrimitivePort, PrimitivePortSpec,
};
pub use signal::{DirectTunnel, GlobalSignal, Segment, TunnelEnd};
pub use tile::Tile;
pub use verify::IntegrityError;
