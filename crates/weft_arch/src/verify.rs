//! Structural integrity checks for contexts built outside the composition
//! API, such as ones decoded from a snapshot.

use crate::arena::{Arena, ArenaId};
use crate::block::{Bits, Block, BlockKind, ElementRef};
use crate::context::ArchitectureContext;
use crate::error::{check_identifier, Namespace};
use crate::hierarchy::Hierarchy;
use std::collections::BTreeMap;
use std::fmt;
use weft_common::Ident;

/// Every dangling handle or inconsistent index found in a context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityError {
    /// One line per problem.
    pub problems: Vec<String>,
}

impl fmt::Display for IntegrityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} integrity problem(s)", self.problems.len())?;
        if let Some(first) = self.problems.first() {
            write!(f, "; first: {first}")?;
        }
        Ok(())
    }
}

impl std::error::Error for IntegrityError {}

struct Checker<'a> {
    ctx: &'a ArchitectureContext,
    problems: Vec<String>,
}

impl Checker<'_> {
    fn report(&mut self, problem: String) {
        self.problems.push(problem);
    }

    fn ident(&mut self, what: &str, ident: Ident) {
        if self.ctx.interner.try_resolve(ident).is_none() {
            self.report(format!("{what} uses unknown identifier #{}", ident.as_raw()));
        }
    }

    // Block, port and instance names end up in generated Verilog and file names.
    fn emitted_name(&mut self, namespace: Namespace, ident: Ident) {
        match self.ctx.interner.try_resolve(ident) {
            Some(name) => {
                if let Err(err) = check_identifier(namespace, name) {
                    self.report(err.to_string());
                }
            }
            None => self.report(format!("{namespace} uses unknown identifier #{}", ident.as_raw())),
        }
    }

    fn names<I: ArenaId + Ord, T>(
        &mut self,
        what: &str,
        arena: &Arena<I, T>,
        names: &BTreeMap<Ident, I>,
        name_of: impl Fn(&T) -> Ident,
    ) {
        if names.len() != arena.len() {
            self.report(format!(
                "{what} index holds {} names for {} entries",
                names.len(),
                arena.len()
            ));
        }
        for (&ident, &id) in names {
            match arena.try_get(id) {
                Some(item) if name_of(item) == ident => {}
                Some(_) => self.report(format!("{what} index maps a name to the wrong entry")),
                None => self.report(format!("{what} index points at missing #{}", id.as_raw())),
            }
        }
    }

    fn bits(&mut self, block: &Block, what: &str, bits: &Bits) {
        if bits.block != block.id {
            self.report(format!(
                "{what} in block #{} was taken from block #{}",
                block.id.as_raw(),
                bits.block.as_raw()
            ));
            return;
        }
        match block.node_width(bits.node) {
            Some(width)
                if bits.width > 0 && u64::from(bits.offset) + u64::from(bits.width) <= u64::from(width) => {}
            Some(_) => self.report(format!("{what} in block #{} exceeds its node", block.id.as_raw())),
            None => self.report(format!("{what} in block #{} is dangling", block.id.as_raw())),
        }
    }

    fn block(&mut self, block: &Block) {
        let ctx = self.ctx;
        self.emitted_name(Namespace::Block, block.name);
        self.names("port", &block.ports, &block.port_names, |p| p.name);
        self.names("instance", &block.instances, &block.instance_names, |i| i.name);
        for port in block.ports() {
            self.emitted_name(Namespace::Port, port.name);
            if let Some(global) = port.global {
                if !ctx.globals.contains(global) {
                    self.report(format!("port bound to missing global #{}", global.as_raw()));
                }
            }
            if port.position.x >= block.width || port.position.y >= block.height {
                self.report("port sub-position outside its block".to_string());
            }
        }
        for inst in block.instances() {
            self.emitted_name(Namespace::Instance, inst.name);
            let expected = match inst.element {
                ElementRef::Primitive(id) => ctx.library.try_get(id).map(|p| p.ports.len()),
                ElementRef::Block(id) => ctx.blocks.try_get(id).map(Block::port_count),
            };
            match expected {
                Some(n) if n == inst.pins.len() => {}
                Some(_) => self.report(format!(
                    "instance '{}' has pins out of sync with its element",
                    ctx.resolve(inst.name)
                )),
                None => self.report(format!(
                    "instance '{}' refers to a missing element",
                    ctx.resolve(inst.name)
                )),
            }
        }
        for conn in block.connections() {
            self.bits(block, "connection driver", &conn.driver);
            self.bits(block, "connection sink", &conn.sink);
            if let Some(tag) = conn.pack_pattern {
                self.ident("pack pattern", tag);
            }
        }
        for bits in block.open_bits() {
            self.bits(block, "open bits", bits);
        }
        for tie in block.tie_offs() {
            self.bits(block, "tie-off", &tie.sink);
        }
    }

    fn run(mut self) -> Vec<String> {
        let ctx = self.ctx;
        self.names("global", &ctx.globals, &ctx.global_names, |g| g.name);
        self.names("segment", &ctx.segments, &ctx.segment_names, |s| s.name);
        if ctx.channel_width().is_none() {
            self.report("segment track counts overflow the channel width".to_string());
        }
        self.names("block", &ctx.blocks, &ctx.block_names, |b| b.name);
        self.names("tile", &ctx.tiles, &ctx.tile_names, |t| t.name);
        self.names("tunnel", &ctx.tunnels, &ctx.tunnel_names, |t| t.name);

        for (id, prim) in ctx.library.iter() {
            if prim.id != id {
                self.report(format!("primitive #{} records the wrong ID", id.as_raw()));
            }
            self.ident("primitive", prim.name);
        }
        for (id, block) in ctx.blocks.iter() {
            if block.id != id {
                self.report(format!("block #{} records the wrong ID", id.as_raw()));
            }
            self.block(block);
        }
        for tile in ctx.tiles() {
            match ctx.blocks.try_get(tile.block) {
                Some(block) => {
                    let io = matches!(block.kind, BlockKind::Io { .. });
                    if io == tile.orientation.is_auto() {
                        self.report(format!(
                            "tile '{}' orientation does not match its block kind",
                            ctx.resolve(tile.name)
                        ));
                    }
                }
                None => self.report(format!("tile '{}' wraps a missing block", ctx.resolve(tile.name))),
            }
        }
        for tunnel in ctx.tunnels() {
            for end in [tunnel.from, tunnel.to] {
                let ok = ctx
                    .blocks
                    .try_get(end.block)
                    .is_some_and(|b| b.port(end.port).is_some());
                if !ok {
                    self.report(format!("tunnel '{}' has a dangling end", ctx.resolve(tunnel.name)));
                }
            }
        }
        if !ctx.grid.is_consistent() {
            self.report("grid cell index disagrees with its placements".to_string());
        }
        for placement in ctx.grid.placements() {
            if !ctx.tiles.contains(placement.tile) {
                self.report(format!("placement at {} holds a missing tile", placement.root));
            }
        }
        if !Hierarchy::build(ctx).is_acyclic() {
            self.report("block hierarchy is cyclic".to_string());
        }

        let routing = &ctx.fabric().routing;
        for (tile, cbox) in &routing.boxes {
            if !ctx.tiles.contains(*tile) || cbox.tile != *tile {
                self.report(format!("connection box for missing tile #{}", tile.as_raw()));
            }
        }
        let muxes = routing
            .boxes
            .values()
            .flat_map(|b| b.muxes.iter())
            .chain(routing.switch_boxes.values().flat_map(|s| s.muxes.iter()));
        let dangling_switches = muxes.filter(|m| !routing.switches.contains(m.switch)).count();
        if dangling_switches > 0 {
            self.report(format!("{dangling_switches} mux group(s) use a missing switch"));
        }
        for binding in &routing.global_bindings {
            if !ctx.globals.contains(binding.global) {
                self.report(format!("global binding at {} is dangling", binding.root));
            }
        }
        for link in &routing.tunnel_links {
            if !ctx.tunnels.contains(link.tunnel) {
                self.report(format!("tunnel link at {} is dangling", link.from));
            }
        }
        for tie in &ctx.fabric().defaults.ties {
            if !ctx.blocks.contains(tie.block) {
                self.report(format!("default tie in missing block #{}", tie.block.as_raw()));
            }
        }
        self.problems
    }
}

impl ArchitectureContext {
    /// Checks that every handle resolves and every index agrees with the
    /// data it indexes.
    ///
    /// Contexts built through the composition API always pass; this guards
    /// contexts decoded from external bytes.
    pub fn verify(&self) -> Result<(), IntegrityError> {
        let problems = Checker {
            ctx: self,
            problems: Vec::new(),
        }
        .run();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(IntegrityError { problems })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Orientation, Position};
    use crate::ids::TileId;

    fn small() -> ArchitectureContext {
        let mut ctx = ArchitectureContext::new("v", 2, 2).unwrap();
        let clb = ctx.create_logic_block("clb", 1, 1).unwrap();
        let lut = ctx.primitive("lut4").unwrap();
        {
            let mut b = ctx.block_mut(clb).unwrap();
            let a = b.create_input("a", 4, Orientation::WEST).unwrap();
            let inst = b.instantiate_primitive(lut, "lut").unwrap();
            let pin = b.pin(inst, "in").unwrap();
            b.connect(a, pin).unwrap();
        }
        let tile = ctx.create_tile("clb_tile", clb, Orientation::AUTO).unwrap();
        ctx.place(tile, Position::new(1, 1)).unwrap();
        ctx
    }

    #[test]
    fn composed_context_verifies() {
        small().verify().unwrap();
    }

    #[test]
    fn dangling_tile_handle_detected() {
        let mut ctx = small();
        ctx.grid
            .placements
            .values_mut()
            .for_each(|p| p.tile = TileId::from_raw(42));
        let err = ctx.verify().unwrap_err();
        assert!(err.problems.iter().any(|p| p.contains("missing tile")));
    }

    #[test]
    fn foreign_connection_bits_detected() {
        let mut ctx = small();
        let other = ctx.create_logic_block("other", 1, 1).unwrap();
        let clb = ctx.block_by_name("clb").unwrap();
        ctx.blocks.get_mut(clb).connections[0].driver.block = other;
        let err = ctx.verify().unwrap_err();
        assert!(err.problems.iter().any(|p| p.contains("was taken from block")));
    }

    #[test]
    fn unusable_block_name_detected() {
        let mut ctx = small();
        let clb = ctx.block_by_name("clb").unwrap();
        ctx.blocks.get_mut(clb).name = ctx.interner.get_or_intern("../clb");
        let err = ctx.verify().unwrap_err();
        assert!(err.problems.iter().any(|p| p.contains("'../clb'")));
    }

    #[test]
    fn broken_name_index_detected() {
        let mut ctx = small();
        ctx.block_names.clear();
        let err = ctx.verify().unwrap_err();
        assert!(format!("{err}").contains("integrity problem"));
    }
}
