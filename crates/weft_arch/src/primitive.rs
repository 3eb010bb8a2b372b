//! The primitive library: leaf cells with fixed port interfaces.
//!
//! The library is seeded with a handful of built-ins and grows memories on
//! demand. Memory requests are memoized by their parameters, so asking twice
//! for the same geometry returns the same [`PrimitiveId`].

use crate::arena::Arena;
use crate::error::{ArchError, Namespace};
use crate::ids::PrimitiveId;
use crate::port::PortDirection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use weft_common::{Ident, Interner};

/// Largest supported memory address width.
pub const MAX_MEMORY_ADDR_WIDTH: u32 = 20;
/// Largest supported memory data width.
pub const MAX_MEMORY_DATA_WIDTH: u32 = 64;

/// A port of a primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimitivePort {
    /// Port name.
    pub name: Ident,
    /// Bit width.
    pub width: u32,
    /// Input or output.
    pub direction: PortDirection,
    /// Whether this input is a clock.
    pub is_clock: bool,
}

/// Describes a port of a user-defined primitive.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimitivePortSpec {
    /// Port name.
    pub name: String,
    /// Bit width.
    pub width: u32,
    /// Input or output.
    pub direction: PortDirection,
    /// Whether this input is a clock.
    pub is_clock: bool,
}

impl PrimitivePortSpec {
    /// A data input.
    pub fn input(name: impl Into<String>, width: u32) -> Self {
        Self {
            name: name.into(),
            width,
            direction: PortDirection::Input,
            is_clock: false,
        }
    }

    /// An output.
    pub fn output(name: impl Into<String>, width: u32) -> Self {
        Self {
            direction: PortDirection::Output,
            ..Self::input(name, width)
        }
    }

    /// A 1-bit clock input.
    pub fn clock(name: impl Into<String>) -> Self {
        Self {
            is_clock: true,
            ..Self::input(name, 1)
        }
    }
}

/// Geometry of a memory primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MemoryParams {
    /// Address width in bits.
    pub addr_width: u32,
    /// Data width in bits.
    pub data_width: u32,
    /// Two independent read/write ports instead of one.
    pub dual_port: bool,
}

impl MemoryParams {
    /// Returns the canonical library name, e.g. `memory_a10_d8_dp`.
    pub fn canonical_name(&self) -> String {
        let suffix = if self.dual_port { "_dp" } else { "" };
        format!("memory_a{}_d{}{}", self.addr_width, self.data_width, suffix)
    }

    /// Returns the number of words.
    pub fn depth(&self) -> u64 {
        1u64 << self.addr_width
    }

    /// Returns the total number of storage bits.
    pub fn capacity_bits(&self) -> u64 {
        self.depth() * u64::from(self.data_width)
    }

    /// Returns the write-enable pin names.
    pub fn write_enable_pins(&self) -> &'static [&'static str] {
        if self.dual_port {
            &["we1", "we2"]
        } else {
            &["we"]
        }
    }

    fn validate(&self) -> Result<(), ArchError> {
        let what = self.canonical_name();
        if self.addr_width == 0 || self.data_width == 0 {
            return Err(ArchError::invalid(what, "address and data widths must be at least 1"));
        }
        if self.addr_width > MAX_MEMORY_ADDR_WIDTH {
            return Err(ArchError::invalid(
                what,
                format!("address width exceeds {MAX_MEMORY_ADDR_WIDTH}"),
            ));
        }
        if self.data_width > MAX_MEMORY_DATA_WIDTH {
            return Err(ArchError::invalid(
                what,
                format!("data width exceeds {MAX_MEMORY_DATA_WIDTH}"),
            ));
        }
        Ok(())
    }

    fn ports(&self) -> Vec<PrimitivePortSpec> {
        let mut ports = vec![PrimitivePortSpec::clock("clk")];
        if self.dual_port {
            for i in 1..=2 {
                ports.push(PrimitivePortSpec::input(format!("addr{i}"), self.addr_width));
                ports.push(PrimitivePortSpec::input(format!("data{i}"), self.data_width));
                ports.push(PrimitivePortSpec::input(format!("we{i}"), 1));
                ports.push(PrimitivePortSpec::output(format!("out{i}"), self.data_width));
            }
        } else {
            ports.push(PrimitivePortSpec::input("addr", self.addr_width));
            ports.push(PrimitivePortSpec::input("data", self.data_width));
            ports.push(PrimitivePortSpec::input("we", 1));
            ports.push(PrimitivePortSpec::output("out", self.data_width));
        }
        ports
    }
}

/// What a primitive is, which determines its configuration cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PrimitiveKind {
    /// A bidirectional IO pad.
    IoPad,
    /// A k-input look-up table.
    Lut {
        /// Number of inputs.
        inputs: u32,
    },
    /// A D flip-flop.
    FlipFlop,
    /// A fracturable 6-input LUT with flip-flop and carry.
    FracLut6,
    /// A block memory.
    Memory(MemoryParams),
    /// A user-defined cell.
    Custom {
        /// Configuration bits it consumes.
        config_bits: u32,
    },
}

impl PrimitiveKind {
    /// Returns the number of configuration bits one instance consumes.
    pub fn config_bits(&self) -> u64 {
        match self {
            PrimitiveKind::IoPad => 2,
            PrimitiveKind::Lut { inputs } => 1u64 << inputs,
            PrimitiveKind::FlipFlop => 0,
            PrimitiveKind::FracLut6 => 64 + 3,
            PrimitiveKind::Memory(_) => 0,
            PrimitiveKind::Custom { config_bits } => u64::from(*config_bits),
        }
    }

    /// Returns the memory parameters if this is a memory.
    pub fn memory(&self) -> Option<&MemoryParams> {
        match self {
            PrimitiveKind::Memory(params) => Some(params),
            _ => None,
        }
    }
}

/// A leaf cell with a fixed port interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Primitive {
    /// The primitive's ID.
    pub id: PrimitiveId,
    /// Library name.
    pub name: Ident,
    /// What the cell is.
    pub kind: PrimitiveKind,
    /// Ports in declaration order.
    pub ports: Vec<PrimitivePort>,
}

impl Primitive {
    /// Finds a port by name.
    pub fn port(&self, name: Ident) -> Option<&PrimitivePort> {
        self.ports.iter().find(|p| p.name == name)
    }
}

/// Registry of primitives by name, with memoized memory construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveLibrary {
    primitives: Arena<PrimitiveId, Primitive>,
    by_name: BTreeMap<Ident, PrimitiveId>,
    memories: BTreeMap<MemoryParams, PrimitiveId>,
}

impl PrimitiveLibrary {
    /// Creates a library holding the built-in primitives:
    /// `iopad`, `lut4`, `lut6`, `flipflop` and `fraclut6sffc`.
    pub fn with_builtins(interner: &Interner) -> Self {
        let mut library = Self {
            primitives: Arena::new(),
            by_name: BTreeMap::new(),
            memories: BTreeMap::new(),
        };
        let builtins: Vec<(&str, PrimitiveKind, Vec<PrimitivePortSpec>)> = vec![
            (
                "iopad",
                PrimitiveKind::IoPad,
                vec![
                    PrimitivePortSpec::input("outpad", 1),
                    PrimitivePortSpec::output("inpad", 1),
                ],
            ),
            (
                "lut4",
                PrimitiveKind::Lut { inputs: 4 },
                vec![PrimitivePortSpec::input("in", 4), PrimitivePortSpec::output("out", 1)],
            ),
            (
                "lut6",
                PrimitiveKind::Lut { inputs: 6 },
                vec![PrimitivePortSpec::input("in", 6), PrimitivePortSpec::output("out", 1)],
            ),
            (
                "flipflop",
                PrimitiveKind::FlipFlop,
                vec![
                    PrimitivePortSpec::clock("clk"),
                    PrimitivePortSpec::input("d", 1),
                    PrimitivePortSpec::output("q", 1),
                ],
            ),
            (
                "fraclut6sffc",
                PrimitiveKind::FracLut6,
                vec![
                    PrimitivePortSpec::clock("clk"),
                    PrimitivePortSpec::input("ce", 1),
                    PrimitivePortSpec::input("sr", 1),
                    PrimitivePortSpec::input("ia", 6),
                    PrimitivePortSpec::input("ib", 1),
                    PrimitivePortSpec::input("cin", 1),
                    PrimitivePortSpec::output("cout", 1),
                    PrimitivePortSpec::output("oa", 1),
                    PrimitivePortSpec::output("ob", 1),
                    PrimitivePortSpec::output("q", 1),
                ],
            ),
        ];
        for (name, kind, ports) in builtins {
            let id = library.primitives.next_id();
            let name = interner.get_or_intern(name);
            let ports = intern_ports(interner, &ports);
            library.primitives.alloc(Primitive { id, name, kind, ports });
            library.by_name.insert(name, id);
        }
        library
    }

    /// Returns the primitive with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if the ID was not produced by this library.
    pub fn get(&self, id: PrimitiveId) -> &Primitive {
        self.primitives.get(id)
    }

    /// Returns the primitive with the given ID, or `None`.
    pub fn try_get(&self, id: PrimitiveId) -> Option<&Primitive> {
        self.primitives.try_get(id)
    }

    /// Looks up a primitive by name.
    pub fn lookup(&self, name: Ident) -> Option<PrimitiveId> {
        self.by_name.get(&name).copied()
    }

    /// Iterates over all primitives in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (PrimitiveId, &Primitive)> {
        self.primitives.iter()
    }

    /// Returns the number of primitives.
    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    /// Returns `true` if the library is empty.
    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Returns the memory primitive for `params`, creating it on first request.
    pub fn get_or_create_memory(
        &mut self,
        interner: &Interner,
        params: MemoryParams,
    ) -> Result<PrimitiveId, ArchError> {
        if let Some(&id) = self.memories.get(&params) {
            return Ok(id);
        }
        params.validate()?;
        let id = self.register(
            interner,
            &params.canonical_name(),
            PrimitiveKind::Memory(params),
            &params.ports(),
        )?;
        self.memories.insert(params, id);
        log::debug!("created memory primitive {}", params.canonical_name());
        Ok(id)
    }

    /// Registers a user-defined primitive.
    pub fn register(
        &mut self,
        interner: &Interner,
        name: &str,
        kind: PrimitiveKind,
        ports: &[PrimitivePortSpec],
    ) -> Result<PrimitiveId, ArchError> {
        if interner.get(name).is_some_and(|ident| self.by_name.contains_key(&ident)) {
            return Err(ArchError::collision(Namespace::Primitive, name));
        }
        let mut seen = Vec::with_capacity(ports.len());
        for port in ports {
            if port.width == 0 {
                return Err(ArchError::invalid(
                    format!("primitive '{name}'"),
                    format!("port '{}' has zero width", port.name),
                ));
            }
            if seen.contains(&port.name.as_str()) {
                return Err(ArchError::collision(Namespace::Port, port.name.clone()));
            }
            seen.push(port.name.as_str());
        }
        let ident = interner.get_or_intern(name);
        let id = self.primitives.next_id();
        let ports = intern_ports(interner, ports);
        self.primitives.alloc(Primitive {
            id,
            name: ident,
            kind,
            ports,
        });
        self.by_name.insert(ident, id);
        Ok(id)
    }
}

fn intern_ports(interner: &Interner, specs: &[PrimitivePortSpec]) -> Vec<PrimitivePort> {
    specs
        .iter()
        .map(|spec| PrimitivePort {
            name: interner.get_or_intern(&spec.name),
            width: spec.width,
            direction: spec.direction,
            is_clock: spec.is_clock,
        })
        .collect()
}
