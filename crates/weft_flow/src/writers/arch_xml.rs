//! VPR-style architecture XML.

use super::{bit_range, create_dir, emit_file};
use crate::codes;
use crate::error::PassError;
use crate::pass::Pass;
use crate::passes::SWITCH_BOX_FANIN;
use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Write};
use std::path::PathBuf;
use weft_arch::{
    ArchitectureContext, Artifact, ArtifactKind, Bits, Block, Dir, ElementRef, Facet, Hierarchy,
    NetNode, Port, PortDirection, Position, Primitive, PrimitiveId, PrimitiveKind, Tile,
};
use weft_diagnostics::{Diagnostic, DiagnosticSink, Location};

/// Writes `arch.xml`: models, a fixed layout with one `<single>` per
/// placement and an `EMPTY` entry per empty cell, the routing switch and
/// segment lists, direct tunnels and one complex block per tile.
#[derive(Debug, Clone)]
pub struct GenerateArchXml {
    dir: PathBuf,
}

impl GenerateArchXml {
    /// Creates the pass writing into `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl Pass for GenerateArchXml {
    fn name(&self) -> &'static str {
        "arch-xml"
    }

    fn requires(&self) -> &'static [Facet] {
        &[Facet::Connections]
    }

    fn produces(&self) -> &'static [Facet] {
        &[Facet::ArchDescription]
    }

    fn run(
        &self,
        ctx: &mut ArchitectureContext,
        sink: &DiagnosticSink,
    ) -> Result<Vec<Artifact>, PassError> {
        let ctx: &ArchitectureContext = ctx;
        create_dir(&self.dir)?;
        let empty = ctx.grid().empty_cells().len();
        if empty > 0 {
            sink.emit(Diagnostic::note(
                codes::EMPTY_CELLS,
                format!("{empty} grid cells are left empty"),
                Location::entity(ctx.name()),
            ));
        }
        let artifact = emit_file(&self.dir, "arch.xml", ArtifactKind::ArchXml, |w| {
            write_arch(w, ctx)
        })?;
        Ok(vec![artifact])
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn side_name(dir: Dir) -> &'static str {
    match dir {
        Dir::North => "top",
        Dir::East => "right",
        Dir::South => "bottom",
        Dir::West => "left",
    }
}

pub(crate) fn write_arch(w: &mut dyn Write, ctx: &ArchitectureContext) -> io::Result<()> {
    writeln!(w, "<?xml version=\"1.0\"?>")?;
    writeln!(w, "<architecture>")?;
    let used = Hierarchy::build(ctx).used_primitives();
    write_models(w, ctx, &used)?;
    write_layout(w, ctx)?;
    write_device(w, ctx)?;
    write_switches(w, ctx)?;
    write_segments(w, ctx)?;
    write_directs(w, ctx)?;
    writeln!(w, "  <complexblocklist>")?;
    for tile in ctx.tiles() {
        write_tile(w, ctx, tile)?;
    }
    writeln!(w, "  </complexblocklist>")?;
    writeln!(w, "</architecture>")
}

fn write_models(
    w: &mut dyn Write,
    ctx: &ArchitectureContext,
    used: &BTreeSet<PrimitiveId>,
) -> io::Result<()> {
    writeln!(w, "  <models>")?;
    for &id in used {
        let prim = ctx.library().get(id);
        if matches!(prim.kind, PrimitiveKind::Lut { .. } | PrimitiveKind::FlipFlop) {
            continue;
        }
        writeln!(w, "    <model name=\"{}\">", ctx.resolve(prim.name))?;
        for (tag, direction) in [
            ("input_ports", PortDirection::Input),
            ("output_ports", PortDirection::Output),
        ] {
            writeln!(w, "      <{tag}>")?;
            for port in prim.ports.iter().filter(|p| p.direction == direction) {
                let clock = if port.is_clock { " is_clock=\"1\"" } else { "" };
                writeln!(w, "        <port name=\"{}\"{clock}/>", ctx.resolve(port.name))?;
            }
            writeln!(w, "      </{tag}>")?;
        }
        writeln!(w, "    </model>")?;
    }
    writeln!(w, "  </models>")
}

fn write_layout(w: &mut dyn Write, ctx: &ArchitectureContext) -> io::Result<()> {
    let extent = ctx.extent();
    writeln!(w, "  <layout>")?;
    writeln!(
        w,
        "    <fixed_layout name=\"{}\" width=\"{}\" height=\"{}\">",
        escape(ctx.name()),
        extent.width,
        extent.height
    )?;
    for placement in ctx.grid().placements() {
        writeln!(
            w,
            "      <single type=\"{}\" priority=\"1\" x=\"{}\" y=\"{}\"/>",
            ctx.resolve(ctx.tile(placement.tile).name),
            placement.root.x,
            placement.root.y
        )?;
    }
    for cell in ctx.grid().empty_cells() {
        writeln!(
            w,
            "      <single type=\"EMPTY\" priority=\"1\" x=\"{}\" y=\"{}\"/>",
            cell.x, cell.y
        )?;
    }
    writeln!(w, "    </fixed_layout>")?;
    writeln!(w, "  </layout>")
}

fn write_device(w: &mut dyn Write, ctx: &ArchitectureContext) -> io::Result<()> {
    let routing = &ctx.fabric().routing;
    writeln!(w, "  <device>")?;
    writeln!(w, "    <sizing R_minW_nmos=\"0\" R_minW_pmos=\"0\"/>")?;
    writeln!(w, "    <area grid_logic_tile_area=\"0\"/>")?;
    writeln!(w, "    <chan_width_distr>")?;
    writeln!(w, "      <x distr=\"uniform\" peak=\"1.000000\"/>")?;
    writeln!(w, "      <y distr=\"uniform\" peak=\"1.000000\"/>")?;
    writeln!(w, "    </chan_width_distr>")?;
    writeln!(w, "    <switch_block type=\"wilton\" fs=\"{SWITCH_BOX_FANIN}\"/>")?;
    let widest = routing
        .boxes
        .values()
        .flat_map(|cbox| cbox.muxes.iter())
        .filter_map(|m| routing.switches.try_get(m.switch))
        .max_by_key(|s| s.fanin);
    if let Some(switch) = widest {
        writeln!(
            w,
            "    <connection_block input_switch_name=\"{}\"/>",
            switch.name()
        )?;
    }
    writeln!(w, "  </device>")
}

fn write_switches(w: &mut dyn Write, ctx: &ArchitectureContext) -> io::Result<()> {
    writeln!(w, "  <switchlist>")?;
    for switch in ctx.fabric().routing.switches.values() {
        writeln!(
            w,
            "    <switch type=\"mux\" name=\"{}\" R=\"0\" Cin=\"0\" Cout=\"0\" Tdel=\"0\" mux_trans_size=\"0\" buf_size=\"auto\"/>",
            switch.name()
        )?;
    }
    writeln!(w, "  </switchlist>")
}

fn write_segments(w: &mut dyn Write, ctx: &ArchitectureContext) -> io::Result<()> {
    let routing = &ctx.fabric().routing;
    let sb_switch = routing
        .find_switch(SWITCH_BOX_FANIN)
        .map(|id| routing.switches.get(id).name());
    writeln!(w, "  <segmentlist>")?;
    for segment in ctx.segments() {
        writeln!(
            w,
            "    <segment name=\"{}\" freq=\"{}\" length=\"{}\" type=\"unidir\" Rmetal=\"0\" Cmetal=\"0\">",
            ctx.resolve(segment.name),
            u64::from(segment.length) * u64::from(segment.multiplicity),
            segment.length
        )?;
        if let Some(name) = &sb_switch {
            writeln!(w, "      <mux name=\"{name}\"/>")?;
        }
        let sb = vec!["1"; segment.length as usize + 1].join(" ");
        let cb = vec!["1"; segment.length as usize].join(" ");
        writeln!(w, "      <sb type=\"pattern\">{sb}</sb>")?;
        writeln!(w, "      <cb type=\"pattern\">{cb}</cb>")?;
        writeln!(w, "    </segment>")?;
    }
    writeln!(w, "  </segmentlist>")
}

fn write_directs(w: &mut dyn Write, ctx: &ArchitectureContext) -> io::Result<()> {
    writeln!(w, "  <directlist>")?;
    for tunnel in ctx.tunnels() {
        let from_port = ctx.resolve(ctx.tunnel_port(tunnel.from).name);
        let to_port = ctx.resolve(ctx.tunnel_port(tunnel.to).name);
        let pairs: Vec<(&Tile, &Tile)> = ctx
            .tiles()
            .filter(|t| t.block == tunnel.from.block)
            .flat_map(|from| {
                ctx.tiles()
                    .filter(|t| t.block == tunnel.to.block)
                    .map(move |to| (from, to))
            })
            .collect();
        let tunnel_name = ctx.resolve(tunnel.name);
        for &(from, to) in &pairs {
            let from_name = ctx.resolve(from.name);
            let to_name = ctx.resolve(to.name);
            let name = if pairs.len() == 1 {
                tunnel_name.to_string()
            } else {
                format!("{tunnel_name}_{from_name}_{to_name}")
            };
            writeln!(
                w,
                "    <direct name=\"{name}\" from_pin=\"{from_name}.{from_port}\" to_pin=\"{to_name}.{to_port}\" x_offset=\"{}\" y_offset=\"{}\" z_offset=\"0\"/>",
                tunnel.offset.dx, tunnel.offset.dy
            )?;
        }
    }
    writeln!(w, "  </directlist>")
}

fn pad(depth: usize) -> String {
    " ".repeat(depth * 2)
}

fn port_tag(ctx: &ArchitectureContext, port: &Port) -> &'static str {
    match (port.global, port.direction) {
        (Some(global), _) if ctx.global(global).is_clock => "clock",
        (_, PortDirection::Input) => "input",
        (_, PortDirection::Output) => "output",
    }
}

fn write_ports(
    w: &mut dyn Write,
    ctx: &ArchitectureContext,
    block: &Block,
    depth: usize,
) -> io::Result<()> {
    for port in block.ports() {
        writeln!(
            w,
            "{}<{} name=\"{}\" num_pins=\"{}\"/>",
            pad(depth),
            port_tag(ctx, port),
            ctx.resolve(port.name),
            port.width
        )?;
    }
    Ok(())
}

/// The most common track count, preferring the smaller on ties.
fn most_common(values: impl Iterator<Item = u32>) -> u32 {
    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_default() += 1;
    }
    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
        .map_or(0, |(value, _)| value)
}

fn write_tile(w: &mut dyn Write, ctx: &ArchitectureContext, tile: &Tile) -> io::Result<()> {
    let block = ctx.block(tile.block);
    let name = ctx.resolve(tile.name);
    let capacity = if block.is_io() {
        format!(" capacity=\"{}\"", tile.capacity)
    } else {
        String::new()
    };
    writeln!(
        w,
        "    <pb_type name=\"{name}\"{capacity} width=\"{}\" height=\"{}\">",
        tile.width, tile.height
    )?;
    write_ports(w, ctx, block, 3)?;

    let entries = ctx
        .fabric()
        .routing
        .boxes
        .get(&tile.id)
        .map(|cbox| cbox.entries.as_slice())
        .unwrap_or_default();
    let direction_of = |port| block.port(port).map(|p| p.direction);
    let fc_in = most_common(
        entries
            .iter()
            .filter(|e| direction_of(e.port) == Some(PortDirection::Input))
            .map(|e| e.tracks),
    );
    let fc_out = most_common(
        entries
            .iter()
            .filter(|e| direction_of(e.port) == Some(PortDirection::Output))
            .map(|e| e.tracks),
    );
    writeln!(
        w,
        "      <fc in_type=\"abs\" in_val=\"{fc_in}\" out_type=\"abs\" out_val=\"{fc_out}\">"
    )?;
    for port in block.ports() {
        let tracks = if port.is_global() {
            Some(0)
        } else {
            entries
                .iter()
                .find(|e| e.port == port.id)
                .map(|e| e.tracks)
                .filter(|&t| {
                    t != match port.direction {
                        PortDirection::Input => fc_in,
                        PortDirection::Output => fc_out,
                    }
                })
        };
        if let Some(tracks) = tracks {
            writeln!(
                w,
                "        <fc_override port_name=\"{}\" fc_type=\"abs\" fc_val=\"{tracks}\"/>",
                ctx.resolve(port.name)
            )?;
        }
    }
    writeln!(w, "      </fc>")?;

    let mut locations: Vec<((Dir, Position), Vec<String>)> = Vec::new();
    for port in block.ports() {
        let Some(side) = tile.port_side(port) else {
            continue;
        };
        let key = (side, port.position);
        let pin = format!("{name}.{}", ctx.resolve(port.name));
        match locations.iter_mut().find(|(k, _)| *k == key) {
            Some((_, pins)) => pins.push(pin),
            None => locations.push((key, vec![pin])),
        }
    }
    writeln!(w, "      <pinlocations pattern=\"custom\">")?;
    for ((side, position), pins) in &locations {
        writeln!(
            w,
            "        <loc side=\"{}\" xoffset=\"{}\" yoffset=\"{}\">{}</loc>",
            side_name(*side),
            position.x,
            position.y,
            pins.join(" ")
        )?;
    }
    writeln!(w, "      </pinlocations>")?;

    write_block_body(w, ctx, block, name, 3)?;
    writeln!(w, "    </pb_type>")
}

fn write_block_body(
    w: &mut dyn Write,
    ctx: &ArchitectureContext,
    block: &Block,
    pb_name: &str,
    depth: usize,
) -> io::Result<()> {
    for inst in block.instances() {
        let inst_name = ctx.resolve(inst.name);
        match inst.element {
            ElementRef::Primitive(id) => {
                write_primitive_pb(w, ctx, ctx.library().get(id), inst_name, depth)?
            }
            ElementRef::Block(child) => {
                let child = ctx.block(child);
                writeln!(w, "{}<pb_type name=\"{inst_name}\" num_pb=\"1\">", pad(depth))?;
                write_ports(w, ctx, child, depth + 1)?;
                write_block_body(w, ctx, child, inst_name, depth + 1)?;
                writeln!(w, "{}</pb_type>", pad(depth))?;
            }
        }
    }

    writeln!(w, "{}<interconnect>", pad(depth))?;
    for (index, conn) in block.connections().iter().enumerate() {
        let input = endpoint(ctx, block, pb_name, &conn.driver);
        let output = endpoint(ctx, block, pb_name, &conn.sink);
        let open = format!(
            "{}<direct name=\"{pb_name}_c{index}\" input=\"{input}\" output=\"{output}\"",
            pad(depth + 1)
        );
        match conn.pack_pattern {
            Some(pattern) => {
                writeln!(w, "{open}>")?;
                writeln!(
                    w,
                    "{}<pack_pattern name=\"{}\" in_port=\"{input}\" out_port=\"{output}\"/>",
                    pad(depth + 2),
                    ctx.resolve(pattern)
                )?;
                writeln!(w, "{}</direct>", pad(depth + 1))?;
            }
            None => writeln!(w, "{open}/>")?,
        }
    }
    writeln!(w, "{}</interconnect>", pad(depth))
}

fn write_primitive_pb(
    w: &mut dyn Write,
    ctx: &ArchitectureContext,
    prim: &Primitive,
    inst_name: &str,
    depth: usize,
) -> io::Result<()> {
    let prim_name = ctx.resolve(prim.name);
    let (model, class) = match prim.kind {
        PrimitiveKind::Lut { .. } => (".names".to_string(), " class=\"lut\""),
        PrimitiveKind::FlipFlop => (".latch".to_string(), " class=\"flipflop\""),
        _ => (format!(".subckt {prim_name}"), ""),
    };
    writeln!(
        w,
        "{}<pb_type name=\"{inst_name}\" blif_model=\"{model}\" num_pb=\"1\"{class}>",
        pad(depth)
    )?;
    for port in &prim.ports {
        let port_name = ctx.resolve(port.name);
        let tag = match (port.is_clock, port.direction) {
            (true, _) => "clock",
            (false, PortDirection::Input) => "input",
            (false, PortDirection::Output) => "output",
        };
        let port_class = match (&prim.kind, port.direction, port.is_clock) {
            (PrimitiveKind::Lut { .. }, PortDirection::Input, _) => " port_class=\"lut_in\"",
            (PrimitiveKind::Lut { .. }, PortDirection::Output, _) => " port_class=\"lut_out\"",
            (PrimitiveKind::FlipFlop, _, true) => " port_class=\"clock\"",
            (PrimitiveKind::FlipFlop, PortDirection::Input, false) => " port_class=\"D\"",
            (PrimitiveKind::FlipFlop, PortDirection::Output, false) => " port_class=\"Q\"",
            _ => "",
        };
        writeln!(
            w,
            "{}<{tag} name=\"{port_name}\" num_pins=\"{}\"{port_class}/>",
            pad(depth + 1),
            port.width
        )?;
    }
    writeln!(w, "{}</pb_type>", pad(depth))
}

fn endpoint(ctx: &ArchitectureContext, block: &Block, pb_name: &str, bits: &Bits) -> String {
    let full = block.node_width(bits.node).unwrap_or(bits.width);
    let range = bit_range(bits.offset, bits.width, full);
    match bits.node {
        NetNode::Port(id) => {
            let port = block.port(id).map_or("?", |p| ctx.resolve(p.name));
            format!("{pb_name}.{port}{range}")
        }
        NetNode::Pin { instance, pin } => match block.instance(instance) {
            Some(inst) => {
                let pin_name = inst
                    .pins
                    .get(pin as usize)
                    .map_or("?", |p| ctx.resolve(p.name));
                format!("{}.{pin_name}{range}", ctx.resolve(inst.name))
            }
            None => format!("?.{pin}{range}"),
        },
    }
}
