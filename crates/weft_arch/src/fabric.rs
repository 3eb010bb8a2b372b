//! Data the flow passes attach to an architecture.
//!
//! Everything here starts empty and is filled by exactly one pass; the
//! [`Facet`](crate::Facet) a pass produces says which part is complete.

use crate::arena::Arena;
use crate::block::Bits;
use crate::geometry::{Dir, Position};
use crate::ids::{BlockId, GlobalId, PortId, SwitchId, TileId, TunnelId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// How one port of a tile attaches to the routing channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CboxEntry {
    /// The port.
    pub port: PortId,
    /// The resolved side.
    pub side: Dir,
    /// Sub-position inside the tile.
    pub position: Position,
    /// Tracks each bit connects to.
    pub tracks: u32,
}

/// A routing mux type and how many of it are instantiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MuxGroup {
    /// The switch definition.
    pub switch: SwitchId,
    /// Number of muxes.
    pub count: u32,
}

/// The connection box of a tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionBox {
    /// The tile.
    pub tile: TileId,
    /// One entry per non-global port.
    pub entries: Vec<CboxEntry>,
    /// Input muxes, filled by the switch pass.
    pub muxes: Vec<MuxGroup>,
}

/// A routing switch: an n:1 mux.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchDef {
    /// The switch's ID.
    pub id: SwitchId,
    /// Number of mux inputs.
    pub fanin: u32,
}

impl SwitchDef {
    /// Returns the library name, e.g. `mux3`.
    pub fn name(&self) -> String {
        format!("mux{}", self.fanin)
    }

    /// Returns the select bits: `ceil(log2(fanin))`.
    pub fn config_bits(&self) -> u32 {
        match self.fanin {
            0 | 1 => 0,
            n => 32 - (n - 1).leading_zeros(),
        }
    }
}

/// The switch box at one grid cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchBox {
    /// The cell.
    pub position: Position,
    /// Track-start muxes.
    pub muxes: Vec<MuxGroup>,
}

/// A placed port bound to its cell, side and routing tracks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortBinding {
    /// Root of the placement.
    pub root: Position,
    /// The cell the port sits in.
    pub cell: Position,
    /// The placed tile.
    pub tile: TileId,
    /// The port.
    pub port: PortId,
    /// The resolved side.
    pub side: Dir,
    /// Tracks per bit.
    pub tracks: u32,
}

/// A placed global port bound to its signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalBinding {
    /// Root of the placement.
    pub root: Position,
    /// The placed tile.
    pub tile: TileId,
    /// The port.
    pub port: PortId,
    /// The global it is bound to.
    pub global: GlobalId,
}

/// A direct tunnel resolved between two placements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunnelLink {
    /// The tunnel.
    pub tunnel: TunnelId,
    /// Root of the source placement.
    pub from: Position,
    /// Root of the sink placement.
    pub to: Position,
}

/// Routing resources: connection boxes, switches and bindings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutingData {
    /// Total tracks per channel.
    pub channel_width: u32,
    /// Connection boxes by tile.
    pub boxes: BTreeMap<TileId, ConnectionBox>,
    /// Switch definitions, one per fan-in.
    pub switches: Arena<SwitchId, SwitchDef>,
    /// Switch boxes by cell.
    pub switch_boxes: BTreeMap<Position, SwitchBox>,
    /// Port bindings per placement.
    pub port_bindings: Vec<PortBinding>,
    /// Global bindings per placement.
    pub global_bindings: Vec<GlobalBinding>,
    /// Resolved tunnels.
    pub tunnel_links: Vec<TunnelLink>,
}

impl RoutingData {
    /// Returns the switch with `fanin` inputs, creating it on first use.
    pub fn switch_for_fanin(&mut self, fanin: u32) -> SwitchId {
        if let Some(id) = self.find_switch(fanin) {
            return id;
        }
        let id = self.switches.next_id();
        self.switches.alloc(SwitchDef { id, fanin })
    }

    /// Looks up the switch with `fanin` inputs.
    pub fn find_switch(&self, fanin: u32) -> Option<SwitchId> {
        self.switches
            .iter()
            .find(|(_, s)| s.fanin == fanin)
            .map(|(id, _)| id)
    }

    /// Sums the select bits of a list of mux groups.
    pub fn mux_config_bits(&self, muxes: &[MuxGroup]) -> u64 {
        muxes
            .iter()
            .filter_map(|m| {
                self.switches
                    .try_get(m.switch)
                    .map(|s| u64::from(s.config_bits()) * u64::from(m.count))
            })
            .sum()
    }
}

/// A placement's window into the configuration chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSegment {
    /// Root of the placement.
    pub root: Position,
    /// The placed tile.
    pub tile: TileId,
    /// First chain bit.
    pub offset: u64,
    /// Number of chain bits.
    pub length: u64,
}

/// The bitchain configuration layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigChain {
    /// Segments in chain order.
    pub segments: Vec<ChainSegment>,
    /// Chain length in bits.
    pub total_bits: u64,
}

/// A physical instance realizing one placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicalInstance {
    /// Instance name, `<tile>_x<X>y<Y>`.
    pub name: String,
    /// Root of the placement.
    pub root: Position,
    /// The placed tile.
    pub tile: TileId,
    /// First configuration chain bit.
    pub chain_offset: u64,
    /// Number of configuration chain bits.
    pub chain_length: u64,
}

/// Physical instances in chain order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicalView {
    /// The instances.
    pub instances: Vec<PhysicalInstance>,
}

/// Which default pass tied a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DefaultReason {
    /// A memory write enable.
    MemoryWriteEnable,
    /// Any other undriven input.
    UnusedPin,
}

/// One tie-off applied by a default pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultTie {
    /// The block holding the pin.
    pub block: BlockId,
    /// The tied bits.
    pub sink: Bits,
    /// Which pass applied it.
    pub reason: DefaultReason,
}

/// Tie-offs applied by the default passes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defaults {
    /// All ties, in application order.
    pub ties: Vec<DefaultTie>,
}

impl Defaults {
    /// Counts ties applied for `reason`.
    pub fn count(&self, reason: DefaultReason) -> usize {
        self.ties.iter().filter(|t| t.reason == reason).count()
    }
}

/// The kind of file a writer emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactKind {
    /// Structural Verilog.
    Rtl,
    /// Architecture XML.
    ArchXml,
    /// Synthesis resources.
    SynthResources,
}

/// A file written by a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// What the file is.
    pub kind: ArtifactKind,
    /// Where it was written.
    pub path: PathBuf,
}

/// All pass-produced data of a context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FabricData {
    /// Routing resources.
    pub routing: RoutingData,
    /// Configuration chain.
    pub config: ConfigChain,
    /// Physical instances.
    pub physical: PhysicalView,
    /// Default tie-offs.
    pub defaults: Defaults,
    /// Emitted files.
    pub artifacts: Vec<Artifact>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switch_config_bits() {
        let bits = |fanin| SwitchDef {
            id: SwitchId::from_raw(0),
            fanin,
        }
        .config_bits();
        assert_eq!(bits(1), 0);
        assert_eq!(bits(2), 1);
        assert_eq!(bits(3), 2);
        assert_eq!(bits(4), 2);
        assert_eq!(bits(5), 3);
        assert_eq!(bits(20), 5);
    }

    #[test]
    fn switches_memoized_by_fanin() {
        let mut routing = RoutingData::default();
        let a = routing.switch_for_fanin(3);
        let b = routing.switch_for_fanin(5);
        let c = routing.switch_for_fanin(3);
        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(routing.switches.len(), 2);
    }

    #[test]
    fn mux_bits_sum() {
        let mut routing = RoutingData::default();
        let mux3 = routing.switch_for_fanin(3);
        let mux8 = routing.switch_for_fanin(8);
        let groups = [
            MuxGroup {
                switch: mux3,
                count: 10,
            },
            MuxGroup {
                switch: mux8,
                count: 2,
            },
        ];
        assert_eq!(routing.mux_config_bits(&groups), 10 * 2 + 2 * 3);
    }
}
