//! Structural Verilog: primitive black boxes, one module per block, and a
//! top module instantiating every placement.

use super::{bit_range, create_dir, emit_file};
use crate::error::PassError;
use crate::pass::Pass;
use crate::passes::placement_instance_name;
use std::io::{self, Write};
use std::path::PathBuf;
use weft_arch::{
    ArchitectureContext, Artifact, ArtifactKind, Bits, Block, Facet, Hierarchy, InstanceId, NetNode,
    Placement, Primitive, PortDirection, TieValue,
};
use weft_diagnostics::DiagnosticSink;

/// Writes `primitives.v`, `<block>.v` for every block and `top.v`.
#[derive(Debug, Clone)]
pub struct GenerateRtl {
    dir: PathBuf,
}

impl GenerateRtl {
    /// Creates the pass writing into `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl Pass for GenerateRtl {
    fn name(&self) -> &'static str {
        "rtl"
    }

    fn requires(&self) -> &'static [Facet] {
        &[Facet::Connections]
    }

    fn produces(&self) -> &'static [Facet] {
        &[Facet::RtlView]
    }

    fn run(
        &self,
        ctx: &mut ArchitectureContext,
        _sink: &DiagnosticSink,
    ) -> Result<Vec<Artifact>, PassError> {
        let ctx: &ArchitectureContext = ctx;
        create_dir(&self.dir)?;
        let hierarchy = Hierarchy::build(ctx);
        let order = hierarchy.blocks_bottom_up(ctx)?;

        let mut artifacts = Vec::with_capacity(order.len() + 2);
        let primitives: Vec<&Primitive> = hierarchy
            .used_primitives()
            .into_iter()
            .map(|id| ctx.library().get(id))
            .collect();
        artifacts.push(emit_file(&self.dir, "primitives.v", ArtifactKind::Rtl, |w| {
            for prim in &primitives {
                write_blackbox(w, ctx, prim)?;
                writeln!(w)?;
            }
            Ok(())
        })?);
        for id in order {
            let block = ctx.block(id);
            let file = format!("{}.v", ctx.resolve(block.name));
            artifacts.push(emit_file(&self.dir, &file, ArtifactKind::Rtl, |w| {
                write_block(w, ctx, block)
            })?);
        }
        artifacts.push(emit_file(&self.dir, "top.v", ArtifactKind::Rtl, |w| {
            write_top(w, ctx)
        })?);
        log::info!("wrote {} Verilog files to {}", artifacts.len(), self.dir.display());
        Ok(artifacts)
    }
}

fn width_decl(width: u32) -> String {
    if width == 1 {
        String::new()
    } else {
        format!("[{}:0] ", width - 1)
    }
}

fn direction_keyword(direction: PortDirection) -> &'static str {
    match direction {
        PortDirection::Input => "input",
        PortDirection::Output => "output",
    }
}

/// Writes an empty module carrying the `blackbox` attribute.
pub(crate) fn write_blackbox(
    w: &mut dyn Write,
    ctx: &ArchitectureContext,
    prim: &Primitive,
) -> io::Result<()> {
    writeln!(w, "(* blackbox *)")?;
    writeln!(w, "module {} (", ctx.resolve(prim.name))?;
    let count = prim.ports.len();
    for (index, port) in prim.ports.iter().enumerate() {
        let sep = if index + 1 < count { "," } else { "" };
        writeln!(
            w,
            "    {} wire {}{}{sep}",
            direction_keyword(port.direction),
            width_decl(port.width),
            ctx.resolve(port.name)
        )?;
    }
    writeln!(w, ");")?;
    writeln!(w, "endmodule")
}

fn pin_wire(ctx: &ArchitectureContext, block: &Block, instance: InstanceId, pin: u32) -> String {
    match block.instance(instance) {
        Some(inst) => {
            let pin_name = inst
                .pins
                .get(pin as usize)
                .map_or("?", |p| ctx.resolve(p.name));
            format!("{}__{pin_name}", ctx.resolve(inst.name))
        }
        None => format!("inst{}__{pin}", instance.as_raw()),
    }
}

fn net_expr(ctx: &ArchitectureContext, block: &Block, bits: &Bits) -> String {
    let full = block.node_width(bits.node).unwrap_or(bits.width);
    let base = match bits.node {
        NetNode::Port(id) => block
            .port(id)
            .map_or_else(|| format!("port{}", id.as_raw()), |p| ctx.resolve(p.name).to_string()),
        NetNode::Pin { instance, pin } => pin_wire(ctx, block, instance, pin),
    };
    format!("{base}{}", bit_range(bits.offset, bits.width, full))
}

fn write_block(w: &mut dyn Write, ctx: &ArchitectureContext, block: &Block) -> io::Result<()> {
    let name = ctx.resolve(block.name);
    writeln!(w, "module {name} (")?;
    let count = block.port_count();
    for (index, port) in block.ports().enumerate() {
        let sep = if index + 1 < count { "," } else { "" };
        writeln!(
            w,
            "    {} wire {}{}{sep}",
            direction_keyword(port.direction),
            width_decl(port.width),
            ctx.resolve(port.name)
        )?;
    }
    writeln!(w, ");")?;

    for inst in block.instances() {
        writeln!(w)?;
        for (index, pin) in inst.pins.iter().enumerate() {
            writeln!(
                w,
                "    wire {}{};",
                width_decl(pin.width),
                pin_wire(ctx, block, inst.id, index as u32)
            )?;
        }
        writeln!(
            w,
            "    {} {} (",
            ctx.element_name(inst.element),
            ctx.resolve(inst.name)
        )?;
        let pins = inst.pins.len();
        for (index, pin) in inst.pins.iter().enumerate() {
            let sep = if index + 1 < pins { "," } else { "" };
            writeln!(
                w,
                "        .{}({}){sep}",
                ctx.resolve(pin.name),
                pin_wire(ctx, block, inst.id, index as u32)
            )?;
        }
        writeln!(w, "    );")?;
    }

    if !block.connections().is_empty() || !block.tie_offs().is_empty() {
        writeln!(w)?;
    }
    for conn in block.connections() {
        writeln!(
            w,
            "    assign {} = {};",
            net_expr(ctx, block, &conn.sink),
            net_expr(ctx, block, &conn.driver)
        )?;
    }
    for tie in block.tie_offs() {
        let bit = match tie.value {
            TieValue::Zero => "0",
            TieValue::One => "1",
        };
        writeln!(
            w,
            "    assign {} = {{{}{{1'b{bit}}}}};",
            net_expr(ctx, block, &tie.sink),
            tie.sink.width
        )?;
    }
    writeln!(w, "endmodule")
}

fn copy_names(ctx: &ArchitectureContext, placement: &Placement) -> Vec<String> {
    let base = placement_instance_name(ctx, placement);
    let capacity = ctx.tile(placement.tile).capacity;
    if capacity == 1 {
        vec![base]
    } else {
        (0..capacity).map(|k| format!("{base}_{k}")).collect()
    }
}

fn write_top(w: &mut dyn Write, ctx: &ArchitectureContext) -> io::Result<()> {
    let globals: Vec<&str> = ctx.globals().map(|g| ctx.resolve(g.name)).collect();
    writeln!(w, "module top (")?;
    for (index, name) in globals.iter().enumerate() {
        let sep = if index + 1 < globals.len() { "," } else { "" };
        writeln!(w, "    input wire {name}{sep}")?;
    }
    writeln!(w, ");")?;

    for placement in ctx.grid().placements() {
        let block = ctx.block(ctx.tile(placement.tile).block);
        for inst in copy_names(ctx, placement) {
            writeln!(w)?;
            for port in block.ports().filter(|p| !p.is_global()) {
                writeln!(
                    w,
                    "    wire {}{inst}__{};",
                    width_decl(port.width),
                    ctx.resolve(port.name)
                )?;
            }
            writeln!(w, "    {} {inst} (", ctx.resolve(block.name))?;
            let count = block.port_count();
            for (index, port) in block.ports().enumerate() {
                let sep = if index + 1 < count { "," } else { "" };
                let port_name = ctx.resolve(port.name);
                match port.global {
                    Some(global) => writeln!(
                        w,
                        "        .{port_name}({}){sep}",
                        ctx.resolve(ctx.global(global).name)
                    )?,
                    None => writeln!(w, "        .{port_name}({inst}__{port_name}){sep}")?,
                }
            }
            writeln!(w, "    );")?;
        }
    }

    let links = &ctx.fabric().routing.tunnel_links;
    if !links.is_empty() {
        writeln!(w)?;
    }
    for link in links {
        let tunnel = ctx.tunnel(link.tunnel);
        let (Some(from), Some(to)) = (
            ctx.grid().placement_at(link.from),
            ctx.grid().placement_at(link.to),
        ) else {
            continue;
        };
        let from_inst = &copy_names(ctx, from)[0];
        let to_inst = &copy_names(ctx, to)[0];
        writeln!(
            w,
            "    assign {to_inst}__{} = {from_inst}__{};",
            ctx.resolve(ctx.tunnel_port(tunnel.to).name),
            ctx.resolve(ctx.tunnel_port(tunnel.from).name)
        )?;
    }
    writeln!(w, "endmodule")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::{CompleteConnection, CompleteRoutingBox, CompleteSwitch};
    use crate::testing::small_fabric;

    fn render(f: impl FnOnce(&mut dyn Write) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn connected() -> ArchitectureContext {
        let mut ctx = small_fabric();
        let sink = DiagnosticSink::new();
        CompleteRoutingBox::default().run(&mut ctx, &sink).unwrap();
        CompleteSwitch.run(&mut ctx, &sink).unwrap();
        CompleteConnection.run(&mut ctx, &sink).unwrap();
        ctx
    }

    #[test]
    fn blackbox_module() {
        let ctx = small_fabric();
        let lut = ctx.library().get(ctx.primitive("lut4").unwrap());
        let text = render(|w| write_blackbox(w, &ctx, lut));
        assert_eq!(
            text,
            "(* blackbox *)\nmodule lut4 (\n    input wire [3:0] in,\n    output wire out\n);\nendmodule\n"
        );
    }

    #[test]
    fn block_module_wires_and_assigns() {
        let ctx = small_fabric();
        let clb = ctx.block(ctx.block_by_name("clb").unwrap());
        let text = render(|w| write_block(w, &ctx, clb));
        assert!(text.starts_with("module clb (\n    input wire clk,\n"));
        assert!(text.contains("    wire [3:0] lut__in;\n"));
        assert!(text.contains("    lut4 lut (\n        .in(lut__in),\n        .out(lut__out)\n    );"));
        assert!(text.contains("    assign lut__in = in;\n"));
        assert!(text.contains("    assign cout = cin;\n"));
        assert!(text.ends_with("endmodule\n"));
    }

    #[test]
    fn tie_offs_render_as_constants() {
        let mut ctx = small_fabric();
        crate::passes::ZeroMemoryWriteEnable
            .run(&mut ctx, &DiagnosticSink::new())
            .unwrap();
        let mem = ctx.block(ctx.block_by_name("mem").unwrap());
        let text = render(|w| write_block(w, &ctx, mem));
        assert!(text.contains("    assign ram__we = {1{1'b0}};\n"));
    }

    #[test]
    fn top_instantiates_every_copy() {
        let ctx = connected();
        let text = render(|w| write_top(w, &ctx));
        assert!(text.starts_with("module top (\n    input wire clk\n);"));
        assert!(text.contains("    iob io_south_x1y0_0 ("));
        assert!(text.contains("    iob io_south_x1y0_1 ("));
        assert!(text.contains("    clb clb_tile_x1y1 ("));
        assert!(text.contains("        .clk(clk),"));
        assert!(text.contains("    assign clb_tile_x1y2__cin = clb_tile_x1y1__cout;\n"));
    }

    #[test]
    fn writes_files() {
        let mut ctx = connected();
        let dir = tempfile::tempdir().unwrap();
        let pass = GenerateRtl::new(dir.path().join("rtl"));
        let artifacts = pass.run(&mut ctx, &DiagnosticSink::new()).unwrap();
        let names: Vec<String> = artifacts
            .iter()
            .map(|a| a.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names[0], "primitives.v");
        assert_eq!(names.last().map(String::as_str), Some("top.v"));
        assert!(names.contains(&"clb.v".to_string()));
        assert!(names.contains(&"iob.v".to_string()));
        assert!(artifacts.iter().all(|a| a.path.exists()));
    }
}
