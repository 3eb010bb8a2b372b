//! Blocks: named containers of ports, instances and connections.

use crate::arena::Arena;
use crate::error::ArchError;
use crate::ids::{BlockId, InstanceId, PortId, PrimitiveId};
use crate::port::{Port, PortDirection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Range;
use weft_common::Ident;

/// Whether a block sits on the chip boundary or in the interior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    /// An IO block holding `capacity` pads per tile.
    Io {
        /// Number of IO pads per tile.
        capacity: u32,
    },
    /// A logic block (CLB, memory, ...).
    Logic,
}

/// The element an instance realizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ElementRef {
    /// A library primitive.
    Primitive(PrimitiveId),
    /// Another block.
    Block(BlockId),
}

/// A realized port of an instantiated element.
///
/// Pins are copied from the element when the instance is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pin {
    /// Name of the element port.
    pub name: Ident,
    /// Bit width.
    pub width: u32,
    /// Direction as seen from the element.
    pub direction: PortDirection,
}

/// An occurrence of a primitive or block inside a parent block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    /// The instance's ID within its parent.
    pub id: InstanceId,
    /// Instance name, unique within the parent.
    pub name: Ident,
    /// The element this instance realizes.
    pub element: ElementRef,
    /// Pins in the element's port order.
    pub pins: Vec<Pin>,
}

impl Instance {
    /// Returns the index of the pin named `name`.
    pub fn pin_index(&self, name: Ident) -> Option<u32> {
        self.pins.iter().position(|p| p.name == name).map(|i| i as u32)
    }
}

/// One endpoint of a connection: a block port or an instance pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NetNode {
    /// A port of the block itself.
    Port(PortId),
    /// A pin of an instance inside the block.
    Pin {
        /// The instance.
        instance: InstanceId,
        /// Index into [`Instance::pins`].
        pin: u32,
    },
}

/// A contiguous bit range of a [`NetNode`] inside one block.
///
/// Port and instance IDs are local to their block, so a range also records
/// the block it was taken from and is only accepted by that block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bits {
    /// The block whose port or instance `node` refers to.
    pub block: BlockId,
    /// The port or pin.
    pub node: NetNode,
    /// First bit.
    pub offset: u32,
    /// Number of bits.
    pub width: u32,
}

impl Bits {
    /// All bits of a node of `block` that is `width` wide.
    pub fn whole(block: BlockId, node: NetNode, width: u32) -> Self {
        Self {
            block,
            node,
            offset: 0,
            width,
        }
    }

    /// Selects `width` bits starting at `lo`, relative to this range.
    pub fn slice(self, lo: u32, width: u32) -> Result<Bits, ArchError> {
        if width == 0 || u64::from(lo) + u64::from(width) > u64::from(self.width) {
            return Err(ArchError::invalid(
                "bit slice",
                format!("[{lo}, {}) is outside a {}-bit range", u64::from(lo) + u64::from(width), self.width),
            ));
        }
        Ok(Bits {
            block: self.block,
            node: self.node,
            offset: self.offset + lo,
            width,
        })
    }

    /// Selects the single bit `index`.
    pub fn bit(self, index: u32) -> Result<Bits, ArchError> {
        self.slice(index, 1)
    }

    /// Returns the absolute bit range on the node.
    pub fn range(&self) -> Range<u32> {
        self.offset..self.offset + self.width
    }

    /// Returns `true` if both ranges share a node and at least one bit.
    pub fn overlaps(&self, other: &Bits) -> bool {
        self.block == other.block
            && self.node == other.node
            && self.offset < other.offset + other.width
            && other.offset < self.offset + self.width
    }
}

/// A directed link between equally wide bit ranges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    /// Driving bits: a block input port or an instance output pin.
    pub driver: Bits,
    /// Driven bits: a block output port or an instance input pin.
    pub sink: Bits,
    /// Optional pack-pattern tag, opaque to the core.
    pub pack_pattern: Option<Ident>,
}

/// A constant driven onto unused bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TieValue {
    /// Logic 0.
    Zero,
    /// Logic 1.
    One,
}

/// Bits tied to a constant by a default pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TieOff {
    /// The tied bits.
    pub sink: Bits,
    /// The constant value.
    pub value: TieValue,
}

/// Pin bits that are neither connected, tied nor left open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnconnectedPin {
    /// The instance owning the pin.
    pub instance: InstanceId,
    /// Index of the pin on the instance.
    pub pin: u32,
    /// Direction of the pin.
    pub direction: PortDirection,
    /// The unconnected bit indices.
    pub bits: Vec<u32>,
}

/// A named container of ports, instances and connections spanning
/// `width` × `height` grid cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// The block's ID.
    pub id: BlockId,
    /// Block name, unique within the context.
    pub name: Ident,
    /// IO or logic.
    pub kind: BlockKind,
    /// Width in cells.
    pub width: u32,
    /// Height in cells.
    pub height: u32,
    pub(crate) ports: Arena<PortId, Port>,
    pub(crate) port_names: BTreeMap<Ident, PortId>,
    pub(crate) instances: Arena<InstanceId, Instance>,
    pub(crate) instance_names: BTreeMap<Ident, InstanceId>,
    pub(crate) connections: Vec<Connection>,
    pub(crate) open: Vec<Bits>,
    pub(crate) tie_offs: Vec<TieOff>,
    /// Set once the block is instantiated in another block; its ports are frozen.
    pub(crate) frozen: bool,
}

impl Block {
    pub(crate) fn new(id: BlockId, name: Ident, kind: BlockKind, width: u32, height: u32) -> Self {
        Self {
            id,
            name,
            kind,
            width,
            height,
            ports: Arena::new(),
            port_names: BTreeMap::new(),
            instances: Arena::new(),
            instance_names: BTreeMap::new(),
            connections: Vec::new(),
            open: Vec::new(),
            tie_offs: Vec::new(),
            frozen: false,
        }
    }

    /// Returns `true` for IO blocks.
    pub fn is_io(&self) -> bool {
        matches!(self.kind, BlockKind::Io { .. })
    }

    /// Returns the pad capacity of an IO block, 1 for logic blocks.
    pub fn capacity(&self) -> u32 {
        match self.kind {
            BlockKind::Io { capacity } => capacity,
            BlockKind::Logic => 1,
        }
    }

    /// Iterates over ports in creation order.
    pub fn ports(&self) -> impl Iterator<Item = &Port> {
        self.ports.values()
    }

    /// Returns the number of ports.
    pub fn port_count(&self) -> usize {
        self.ports.len()
    }

    /// Returns the port with the given ID.
    pub fn port(&self, id: PortId) -> Option<&Port> {
        self.ports.try_get(id)
    }

    /// Looks up a port by name.
    pub fn port_by_name(&self, name: Ident) -> Option<&Port> {
        self.port_names.get(&name).map(|&id| self.ports.get(id))
    }

    /// Iterates over instances in creation order.
    pub fn instances(&self) -> impl Iterator<Item = &Instance> {
        self.instances.values()
    }

    /// Returns the instance with the given ID.
    pub fn instance(&self, id: InstanceId) -> Option<&Instance> {
        self.instances.try_get(id)
    }

    /// Looks up an instance by name.
    pub fn instance_by_name(&self, name: Ident) -> Option<&Instance> {
        self.instance_names.get(&name).map(|&id| self.instances.get(id))
    }

    /// Returns all connections in creation order.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Returns the bit ranges explicitly left unconnected.
    pub fn open_bits(&self) -> &[Bits] {
        &self.open
    }

    /// Returns the constant tie-offs applied by default passes.
    pub fn tie_offs(&self) -> &[TieOff] {
        &self.tie_offs
    }

    /// Returns the width of a node, or `None` if it does not resolve.
    pub fn node_width(&self, node: NetNode) -> Option<u32> {
        match node {
            NetNode::Port(id) => self.ports.try_get(id).map(|p| p.width),
            NetNode::Pin { instance, pin } => self
                .instances
                .try_get(instance)
                .and_then(|inst| inst.pins.get(pin as usize))
                .map(|p| p.width),
        }
    }

    /// Returns `true` if `node` can drive a connection inside this block:
    /// block inputs and instance outputs. `None` if the node does not resolve.
    pub fn is_driver(&self, node: NetNode) -> Option<bool> {
        match node {
            NetNode::Port(id) => self
                .ports
                .try_get(id)
                .map(|p| p.direction == PortDirection::Input),
            NetNode::Pin { instance, pin } => self
                .instances
                .try_get(instance)
                .and_then(|inst| inst.pins.get(pin as usize))
                .map(|p| p.direction == PortDirection::Output),
        }
    }

    /// Returns `true` if any bit of `bits` already has a driver or a tie-off.
    pub fn is_driven(&self, bits: &Bits) -> bool {
        self.connections.iter().any(|c| c.sink.overlaps(bits))
            || self.tie_offs.iter().any(|t| t.sink.overlaps(bits))
    }

    /// Lists pin bits that are neither connected, tied nor left open.
    ///
    /// Input pins count as connected when driven; output pins when they
    /// drive at least one connection.
    pub fn unconnected_pins(&self) -> Vec<UnconnectedPin> {
        let mut result = Vec::new();
        for inst in self.instances.values() {
            for (index, pin) in inst.pins.iter().enumerate() {
                let node = NetNode::Pin {
                    instance: inst.id,
                    pin: index as u32,
                };
                let bits: Vec<u32> = (0..pin.width)
                    .filter(|&bit| {
                        let probe = Bits {
                            block: self.id,
                            node,
                            offset: bit,
                            width: 1,
                        };
                        let used = match pin.direction {
                            PortDirection::Input => self.is_driven(&probe),
                            PortDirection::Output => {
                                self.connections.iter().any(|c| c.driver.overlaps(&probe))
                            }
                        };
                        !used && !self.open.iter().any(|o| o.overlaps(&probe))
                    })
                    .collect();
                if !bits.is_empty() {
                    result.push(UnconnectedPin {
                        instance: inst.id,
                        pin: index as u32,
                        direction: pin.direction,
                        bits,
                    });
                }
            }
        }
        result
    }

    /// Returns the undriven bits of input pins as contiguous ranges.
    pub fn undriven_input_bits(&self) -> Vec<Bits> {
        let mut ranges = Vec::new();
        for pin in self.unconnected_pins() {
            if pin.direction != PortDirection::Input {
                continue;
            }
            let node = NetNode::Pin {
                instance: pin.instance,
                pin: pin.pin,
            };
            let mut start = pin.bits[0];
            let mut prev = start;
            for &bit in &pin.bits[1..] {
                if bit != prev + 1 {
                    ranges.push(Bits {
                        block: self.id,
                        node,
                        offset: start,
                        width: prev - start + 1,
                    });
                    start = bit;
                }
                prev = bit;
            }
            ranges.push(Bits {
                block: self.id,
                node,
                offset: start,
                width: prev - start + 1,
            });
        }
        ranges
    }
}
