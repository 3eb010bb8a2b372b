//! Synthesis resources: black boxes, memory inference rules and the
//! technology map from inferred memories onto memory primitives.

use super::rtl::write_blackbox;
use super::{create_dir, emit_file};
use crate::error::PassError;
use crate::pass::Pass;
use std::io::{self, Write};
use std::path::PathBuf;
use weft_arch::{
    ArchitectureContext, Artifact, ArtifactKind, Facet, Hierarchy, MemoryParams, Primitive,
};
use weft_diagnostics::DiagnosticSink;

/// Writes `blackbox.v`, `bram.rules` and `memory_map.v`.
///
/// Only dual-port memories are offered for inference: one port reads and
/// the other writes, and the read port's write enable is tied to zero in
/// the map.
#[derive(Debug, Clone)]
pub struct GenerateSynthResources {
    dir: PathBuf,
}

impl GenerateSynthResources {
    /// Creates the pass writing into `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl Pass for GenerateSynthResources {
    fn name(&self) -> &'static str {
        "synth"
    }

    fn requires(&self) -> &'static [Facet] {
        &[Facet::MemoryDefaults, Facet::PinDefaults]
    }

    fn produces(&self) -> &'static [Facet] {
        &[Facet::SynthResources]
    }

    fn run(
        &self,
        ctx: &mut ArchitectureContext,
        _sink: &DiagnosticSink,
    ) -> Result<Vec<Artifact>, PassError> {
        let ctx: &ArchitectureContext = ctx;
        create_dir(&self.dir)?;
        let used: Vec<&Primitive> = Hierarchy::build(ctx)
            .used_primitives()
            .into_iter()
            .map(|id| ctx.library().get(id))
            .collect();
        let memories: Vec<(&Primitive, MemoryParams)> = used
            .iter()
            .filter_map(|prim| prim.kind.memory().map(|params| (*prim, *params)))
            .filter(|(_, params)| params.dual_port)
            .collect();

        let blackbox = emit_file(&self.dir, "blackbox.v", ArtifactKind::SynthResources, |w| {
            for prim in &used {
                write_blackbox(w, ctx, prim)?;
                writeln!(w)?;
            }
            Ok(())
        })?;
        let rules = emit_file(&self.dir, "bram.rules", ArtifactKind::SynthResources, |w| {
            for (_, params) in &memories {
                write_bram_rule(w, params)?;
            }
            Ok(())
        })?;
        let map = emit_file(&self.dir, "memory_map.v", ArtifactKind::SynthResources, |w| {
            for (prim, params) in &memories {
                write_memory_map(w, ctx.resolve(prim.name), params)?;
            }
            Ok(())
        })?;
        log::info!(
            "wrote synthesis resources for {} primitives, {} inferable memories",
            used.len(),
            memories.len()
        );
        Ok(vec![blackbox, rules, map])
    }
}

/// The cell name inference produces for a memory, e.g. `$__WEFT_MEMORY_A10_D8_DP`.
pub fn bram_cell_name(params: &MemoryParams) -> String {
    format!("$__WEFT_{}", params.canonical_name().to_uppercase())
}

fn write_bram_rule(w: &mut dyn Write, params: &MemoryParams) -> io::Result<()> {
    let cell = bram_cell_name(params);
    writeln!(w, "bram {cell}")?;
    writeln!(w, "  init 0")?;
    writeln!(w, "  abits {}", params.addr_width)?;
    writeln!(w, "  dbits {}", params.data_width)?;
    writeln!(w, "  groups 2")?;
    writeln!(w, "  ports  1 1")?;
    writeln!(w, "  wrmode 0 1")?;
    writeln!(w, "  enable 1 1")?;
    writeln!(w, "  transp 0 0")?;
    writeln!(w, "  clocks 1 1")?;
    writeln!(w, "  clkpol 1 1")?;
    writeln!(w, "endbram")?;
    writeln!(w)?;
    writeln!(w, "match {cell}")?;
    writeln!(w, "  make_transp")?;
    writeln!(w, "endmatch")?;
    writeln!(w)
}

fn write_memory_map(w: &mut dyn Write, prim_name: &str, params: &MemoryParams) -> io::Result<()> {
    let a = params.addr_width;
    let d = params.data_width;
    writeln!(
        w,
        "module \\{} (CLK1, A1ADDR, A1DATA, A1EN, B1ADDR, B1DATA, B1EN);",
        bram_cell_name(params)
    )?;
    writeln!(w, "    input CLK1;")?;
    writeln!(w, "    input [{}:0] A1ADDR;", a - 1)?;
    writeln!(w, "    output [{}:0] A1DATA;", d - 1)?;
    writeln!(w, "    input A1EN;")?;
    writeln!(w, "    input [{}:0] B1ADDR;", a - 1)?;
    writeln!(w, "    input [{}:0] B1DATA;", d - 1)?;
    writeln!(w, "    input B1EN;")?;
    writeln!(w)?;
    writeln!(w, "    {prim_name} _TECHMAP_REPLACE_ (")?;
    writeln!(w, "        .clk(CLK1),")?;
    writeln!(w, "        .addr1(A1ADDR),")?;
    writeln!(w, "        .data1({{{d}{{1'b0}}}}),")?;
    writeln!(w, "        .we1(1'b0),")?;
    writeln!(w, "        .out1(A1DATA),")?;
    writeln!(w, "        .addr2(B1ADDR),")?;
    writeln!(w, "        .data2(B1DATA),")?;
    writeln!(w, "        .we2(B1EN),")?;
    writeln!(w, "        .out2()")?;
    writeln!(w, "    );")?;
    writeln!(w, "endmodule")?;
    writeln!(w)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> MemoryParams {
        MemoryParams {
            addr_width: 10,
            data_width: 8,
            dual_port: true,
        }
    }

    fn render(f: impl FnOnce(&mut dyn Write) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn cell_name() {
        assert_eq!(bram_cell_name(&params()), "$__WEFT_MEMORY_A10_D8_DP");
    }

    #[test]
    fn rule_geometry() {
        let text = render(|w| write_bram_rule(w, &params()));
        assert!(text.starts_with("bram $__WEFT_MEMORY_A10_D8_DP\n"));
        assert!(text.contains("  abits 10\n"));
        assert!(text.contains("  dbits 8\n"));
        assert!(text.contains("match $__WEFT_MEMORY_A10_D8_DP\n"));
    }

    #[test]
    fn map_ties_read_port_write_enable() {
        let text = render(|w| write_memory_map(w, "memory_a10_d8_dp", &params()));
        assert!(text.starts_with("module \\$__WEFT_MEMORY_A10_D8_DP ("));
        assert!(text.contains("    input [9:0] A1ADDR;\n"));
        assert!(text.contains("    memory_a10_d8_dp _TECHMAP_REPLACE_ (\n"));
        assert!(text.contains("        .we1(1'b0),\n"));
        assert!(text.contains("        .data1({8{1'b0}}),\n"));
    }
}
