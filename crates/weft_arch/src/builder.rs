//! Block composition: ports, instances and connections.

use crate::block::{Bits, Block, BlockKind, Connection, ElementRef, Instance, NetNode, Pin};
use crate::context::ArchitectureContext;
use crate::error::{check_identifier, ArchError, EndpointRole, Namespace};
use crate::geometry::{Dir, Orientation, Position};
use crate::hierarchy::Hierarchy;
use crate::ids::{BlockId, GlobalId, InstanceId, PrimitiveId};
use crate::port::{Port, PortDirection, PortSpec};

/// A handle for composing one block, obtained from
/// [`ArchitectureContext::block_mut`].
///
/// Every method validates before mutating, so a failed call leaves the
/// block unchanged.
pub struct BlockBuilder<'a> {
    ctx: &'a mut ArchitectureContext,
    id: BlockId,
}

impl<'a> BlockBuilder<'a> {
    pub(crate) fn new(ctx: &'a mut ArchitectureContext, id: BlockId) -> Self {
        Self { ctx, id }
    }

    /// Returns the block's ID.
    pub fn id(&self) -> BlockId {
        self.id
    }

    /// Returns the block being composed.
    pub fn block(&self) -> &Block {
        self.ctx.blocks.get(self.id)
    }

    fn block_mut(&mut self) -> &mut Block {
        self.ctx.blocks.get_mut(self.id)
    }

    fn block_name(&self) -> String {
        self.ctx.resolve(self.block().name).to_string()
    }

    // ---------------------------------------------------------------
    // Ports
    // ---------------------------------------------------------------

    /// Creates an input port at sub-position `(0, 0)`.
    pub fn create_input(
        &mut self,
        name: &str,
        width: u32,
        orientation: Orientation,
    ) -> Result<Bits, ArchError> {
        self.create_port(PortSpec::input(name, width, orientation))
    }

    /// Creates an output port at sub-position `(0, 0)`.
    pub fn create_output(
        &mut self,
        name: &str,
        width: u32,
        orientation: Orientation,
    ) -> Result<Bits, ArchError> {
        self.create_port(PortSpec::output(name, width, orientation))
    }

    /// Creates a port and returns all of its bits.
    pub fn create_port(&mut self, spec: PortSpec) -> Result<Bits, ArchError> {
        self.add_port(spec, None)
    }

    /// Creates a 1-bit input port named after `global` and bound to it.
    pub fn create_global(
        &mut self,
        global: GlobalId,
        orientation: Orientation,
        position: Position,
    ) -> Result<Bits, ArchError> {
        let signal = self.ctx.globals.try_get(global).ok_or_else(|| {
            ArchError::unresolved(Namespace::Global, format!("#{}", global.as_raw()))
        })?;
        let name = self.ctx.resolve(signal.name).to_string();
        let mut spec = PortSpec::input(name, 1, orientation);
        spec.position = position;
        self.add_port(spec, Some(global))
    }

    fn add_port(&mut self, spec: PortSpec, global: Option<GlobalId>) -> Result<Bits, ArchError> {
        check_identifier(Namespace::Port, &spec.name)?;
        let block = self.block();
        let what = format!("port '{}.{}'", self.block_name(), spec.name);
        if block.frozen {
            return Err(ArchError::invalid(
                what,
                "ports are frozen once the block is instantiated in another block",
            ));
        }
        if spec.width == 0 {
            return Err(ArchError::invalid(what, "width must be at least 1"));
        }
        if spec.position.x >= block.width || spec.position.y >= block.height {
            return Err(ArchError::invalid(
                what,
                format!(
                    "sub-position {} is outside the {}x{} block",
                    spec.position, block.width, block.height
                ),
            ));
        }
        match (block.kind, spec.orientation) {
            (BlockKind::Io { .. }, Orientation::Concrete(dir)) => {
                return Err(ArchError::InvalidOrientation {
                    what,
                    reason: format!("IO ports face the chip interior and must be auto, got {dir}"),
                });
            }
            (BlockKind::Logic, Orientation::Auto) => {
                return Err(ArchError::InvalidOrientation {
                    what,
                    reason: "logic block ports need a concrete side".to_string(),
                });
            }
            (BlockKind::Logic, Orientation::Concrete(dir)) => {
                if !on_boundary(dir, spec.position, block.width, block.height) {
                    return Err(ArchError::InvalidOrientation {
                        what,
                        reason: format!(
                            "the {dir} side of sub-position {} is inside the block",
                            spec.position
                        ),
                    });
                }
            }
            (BlockKind::Io { .. }, Orientation::Auto) => {}
        }
        let taken = self
            .ctx
            .interner
            .get(&spec.name)
            .is_some_and(|ident| block.port_names.contains_key(&ident));
        if taken {
            return Err(ArchError::collision(Namespace::Port, spec.name));
        }
        let ident = self.ctx.interner.get_or_intern(&spec.name);
        let block = self.block_mut();
        let id = block.ports.next_id();
        block.ports.alloc(Port {
            id,
            name: ident,
            width: spec.width,
            direction: spec.direction,
            orientation: spec.orientation,
            position: spec.position,
            global,
        });
        block.port_names.insert(ident, id);
        Ok(Bits::whole(self.id, NetNode::Port(id), spec.width))
    }

    /// Returns all bits of the port named `name`.
    pub fn port(&self, name: &str) -> Result<Bits, ArchError> {
        let block = self.block();
        self.ctx
            .interner
            .get(name)
            .and_then(|ident| block.port_by_name(ident))
            .map(|port| Bits::whole(self.id, NetNode::Port(port.id), port.width))
            .ok_or_else(|| {
                ArchError::unresolved(Namespace::Port, format!("{}.{name}", self.block_name()))
            })
    }

    // ---------------------------------------------------------------
    // Instances
    // ---------------------------------------------------------------

    /// Instantiates a library primitive.
    pub fn instantiate_primitive(
        &mut self,
        primitive: PrimitiveId,
        name: &str,
    ) -> Result<InstanceId, ArchError> {
        let prim = self.ctx.library.try_get(primitive).ok_or_else(|| {
            ArchError::unresolved(Namespace::Primitive, format!("#{}", primitive.as_raw()))
        })?;
        let pins = prim
            .ports
            .iter()
            .map(|p| Pin {
                name: p.name,
                width: p.width,
                direction: p.direction,
            })
            .collect();
        self.add_instance(name, ElementRef::Primitive(primitive), pins)
    }

    /// Instantiates another block. The child's ports are frozen afterwards.
    pub fn instantiate_block(&mut self, child: BlockId, name: &str) -> Result<InstanceId, ArchError> {
        let element = self.ctx.blocks.try_get(child).ok_or_else(|| {
            ArchError::unresolved(Namespace::Block, format!("#{}", child.as_raw()))
        })?;
        if Hierarchy::build(self.ctx).would_cycle(self.id, child) {
            return Err(ArchError::HierarchyCycle {
                parent: self.block_name(),
                child: self.ctx.resolve(element.name).to_string(),
            });
        }
        let pins = element
            .ports()
            .map(|p| Pin {
                name: p.name,
                width: p.width,
                direction: p.direction,
            })
            .collect();
        let id = self.add_instance(name, ElementRef::Block(child), pins)?;
        self.ctx.blocks.get_mut(child).frozen = true;
        Ok(id)
    }

    fn add_instance(
        &mut self,
        name: &str,
        element: ElementRef,
        pins: Vec<Pin>,
    ) -> Result<InstanceId, ArchError> {
        check_identifier(Namespace::Instance, name)?;
        let taken = self
            .ctx
            .interner
            .get(name)
            .is_some_and(|ident| self.block().instance_names.contains_key(&ident));
        if taken {
            return Err(ArchError::collision(Namespace::Instance, name));
        }
        let ident = self.ctx.interner.get_or_intern(name);
        let block = self.block_mut();
        let id = block.instances.next_id();
        block.instances.alloc(Instance {
            id,
            name: ident,
            element,
            pins,
        });
        block.instance_names.insert(ident, id);
        Ok(id)
    }

    /// Looks up an instance by name.
    pub fn instance(&self, name: &str) -> Result<InstanceId, ArchError> {
        let block = self.block();
        self.ctx
            .interner
            .get(name)
            .and_then(|ident| block.instance_by_name(ident))
            .map(|inst| inst.id)
            .ok_or_else(|| {
                ArchError::unresolved(Namespace::Instance, format!("{}.{name}", self.block_name()))
            })
    }

    /// Returns all bits of pin `name` on `instance`.
    pub fn pin(&self, instance: InstanceId, name: &str) -> Result<Bits, ArchError> {
        let inst = self.block().instance(instance).ok_or_else(|| {
            ArchError::unresolved(Namespace::Instance, format!("#{}", instance.as_raw()))
        })?;
        let index = self
            .ctx
            .interner
            .get(name)
            .and_then(|ident| inst.pin_index(ident))
            .ok_or_else(|| {
                ArchError::unresolved(
                    Namespace::Pin,
                    format!("{}.{name}", self.ctx.resolve(inst.name)),
                )
            })?;
        Ok(Bits::whole(
            self.id,
            NetNode::Pin {
                instance,
                pin: index,
            },
            inst.pins[index as usize].width,
        ))
    }

    // ---------------------------------------------------------------
    // Connections
    // ---------------------------------------------------------------

    /// Connects `driver` to `sink`.
    pub fn connect(&mut self, driver: Bits, sink: Bits) -> Result<(), ArchError> {
        self.add_connection(driver, sink, None)
    }

    /// Connects `driver` to `sink` and tags the connection with a pack pattern.
    pub fn connect_packed(
        &mut self,
        driver: Bits,
        sink: Bits,
        pack_pattern: &str,
    ) -> Result<(), ArchError> {
        self.add_connection(driver, sink, Some(pack_pattern))
    }

    fn add_connection(
        &mut self,
        driver: Bits,
        sink: Bits,
        pack_pattern: Option<&str>,
    ) -> Result<(), ArchError> {
        check_bits(self.ctx, self.id, &driver)?;
        check_bits(self.ctx, self.id, &sink)?;
        let block = self.block();
        if block.is_driver(driver.node) != Some(true) {
            return Err(ArchError::DirectionMismatch {
                endpoint: self.ctx.describe_bits(self.id, &driver),
                role: EndpointRole::Driver,
            });
        }
        if block.is_driver(sink.node) != Some(false) {
            return Err(ArchError::DirectionMismatch {
                endpoint: self.ctx.describe_bits(self.id, &sink),
                role: EndpointRole::Sink,
            });
        }
        if driver.width != sink.width {
            return Err(ArchError::WidthMismatch {
                driver: self.ctx.describe_bits(self.id, &driver),
                driver_width: driver.width,
                sink: self.ctx.describe_bits(self.id, &sink),
                sink_width: sink.width,
            });
        }
        if block.is_driven(&sink) {
            return Err(ArchError::MultipleDrivers {
                sink: self.ctx.describe_bits(self.id, &sink),
            });
        }
        let pack_pattern = pack_pattern.map(|tag| self.ctx.interner.get_or_intern(tag));
        self.block_mut().connections.push(Connection {
            driver,
            sink,
            pack_pattern,
        });
        Ok(())
    }

    /// Connects every pin of `instance` to the block port with the same
    /// name, direction and width. Returns the number of connections made.
    ///
    /// Either every pin is connected or nothing is: if any pin has no
    /// compatible, undriven partner the call fails with
    /// [`ArchError::UnmatchedAutoConnect`] listing all such pins.
    pub fn auto_connect(&mut self, instance: InstanceId) -> Result<usize, ArchError> {
        let block = self.block();
        let inst = block.instance(instance).ok_or_else(|| {
            ArchError::unresolved(Namespace::Instance, format!("#{}", instance.as_raw()))
        })?;
        let mut planned = Vec::with_capacity(inst.pins.len());
        let mut unmatched = Vec::new();
        for (index, pin) in inst.pins.iter().enumerate() {
            let pin_bits = Bits::whole(
                self.id,
                NetNode::Pin {
                    instance,
                    pin: index as u32,
                },
                pin.width,
            );
            let partner = block
                .port_by_name(pin.name)
                .filter(|port| port.direction == pin.direction && port.width == pin.width)
                .map(|port| Bits::whole(self.id, NetNode::Port(port.id), port.width));
            let Some(port_bits) = partner else {
                unmatched.push(self.ctx.resolve(pin.name).to_string());
                continue;
            };
            let (driver, sink) = match pin.direction {
                PortDirection::Input => (port_bits, pin_bits),
                PortDirection::Output => (pin_bits, port_bits),
            };
            if block.is_driven(&sink) {
                unmatched.push(self.ctx.resolve(pin.name).to_string());
                continue;
            }
            planned.push(Connection {
                driver,
                sink,
                pack_pattern: None,
            });
        }
        if !unmatched.is_empty() {
            return Err(ArchError::UnmatchedAutoConnect {
                instance: self.ctx.resolve(inst.name).to_string(),
                pins: unmatched,
            });
        }
        let count = planned.len();
        self.block_mut().connections.extend(planned);
        Ok(count)
    }

    /// Marks bits as intentionally unconnected.
    pub fn leave_open(&mut self, bits: Bits) -> Result<(), ArchError> {
        check_bits(self.ctx, self.id, &bits)?;
        self.block_mut().open.push(bits);
        Ok(())
    }
}

/// Checks that `bits` was taken from `block`, names an existing node of it
/// and stays in range.
pub(crate) fn check_bits(
    ctx: &ArchitectureContext,
    block: BlockId,
    bits: &Bits,
) -> Result<(), ArchError> {
    let owner = ctx.blocks.get(block);
    if bits.block != block {
        let foreign = ctx
            .blocks
            .try_get(bits.block)
            .map(|b| ctx.resolve(b.name).to_string())
            .unwrap_or_else(|| format!("#{}", bits.block.as_raw()));
        let (kind, node) = match bits.node {
            NetNode::Port(id) => (Namespace::Port, format!("port #{}", id.as_raw())),
            NetNode::Pin { instance, pin } => {
                (Namespace::Pin, format!("pin #{pin} of instance #{}", instance.as_raw()))
            }
        };
        return Err(ArchError::unresolved(
            kind,
            format!("{node} of block '{foreign}' in block '{}'", ctx.resolve(owner.name)),
        ));
    }
    let Some(width) = owner.node_width(bits.node) else {
        let (kind, name) = match bits.node {
            NetNode::Port(id) => (Namespace::Port, format!("#{}", id.as_raw())),
            NetNode::Pin { instance, pin } => {
                (Namespace::Pin, format!("#{pin} of instance #{}", instance.as_raw()))
            }
        };
        return Err(ArchError::unresolved(kind, name));
    };
    if bits.width == 0 || u64::from(bits.offset) + u64::from(bits.width) > u64::from(width) {
        return Err(ArchError::invalid(
            ctx.describe_bits(block, &Bits::whole(block, bits.node, width)),
            format!(
                "bits [{}, {}) exceed its width of {width}",
                bits.offset,
                u64::from(bits.offset) + u64::from(bits.width)
            ),
        ));
    }
    Ok(())
}

fn on_boundary(side: Dir, pos: Position, width: u32, height: u32) -> bool {
    match side {
        Dir::North => pos.y + 1 == height,
        Dir::East => pos.x + 1 == width,
        Dir::South => pos.y == 0,
        Dir::West => pos.x == 0,
    }
}
