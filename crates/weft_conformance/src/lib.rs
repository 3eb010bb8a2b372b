//! Conformance fixtures for the Weft fabric builder.
//!
//! Provides small reference fabrics and a helper that runs a flow and
//! collects its diagnostics, for assertion in the integration tests.

#![warn(missing_docs)]

use std::path::Path;

use weft_arch::{
    ArchError, ArchitectureContext, BlockId, Offset, Orientation, PortSpec, Position,
    IO_PAD_INSTANCE,
};
use weft_diagnostics::{Diagnostic, DiagnosticSink};
use weft_flow::{
    CompleteConnection, CompleteRoutingBox, CompleteSwitch, Flow, FlowError, FlowReport,
    GenerateArchXml,
};

/// Result of running a flow over a fixture.
pub struct FlowOutcome {
    /// The report, or the error that stopped the run.
    pub result: Result<FlowReport, FlowError>,
    /// All diagnostics emitted during the run.
    pub diagnostics: Vec<Diagnostic>,
    /// Number of warning-severity diagnostics.
    pub warning_count: usize,
}

/// Runs `flow` over `ctx`, collecting diagnostics.
pub fn run_flow(ctx: &mut ArchitectureContext, flow: &Flow) -> FlowOutcome {
    let sink = DiagnosticSink::new();
    let result = flow.run(ctx, &sink);
    FlowOutcome {
        result,
        warning_count: sink.warning_count(),
        diagnostics: sink.take_all(),
    }
}

/// Structural completion followed by the architecture XML export.
pub fn structural_export_flow(arch_dir: &Path) -> Flow {
    Flow::new()
        .with_pass(CompleteRoutingBox::default())
        .with_pass(CompleteSwitch)
        .with_pass(CompleteConnection)
        .with_pass(GenerateArchXml::new(arch_dir))
}

/// Adds a 2-pin IO block with its pad auto-connected.
fn io_block(ctx: &mut ArchitectureContext, capacity: u32) -> Result<BlockId, ArchError> {
    let iob = ctx.create_io_block("iob", capacity)?;
    let mut b = ctx.block_mut(iob)?;
    b.create_input("outpad", 1, Orientation::AUTO)?;
    b.create_output("inpad", 1, Orientation::AUTO)?;
    let io = b.instance(IO_PAD_INSTANCE)?;
    b.auto_connect(io)?;
    Ok(iob)
}

/// A 2×2 grid: IO tiles at (0, 0) on the south edge and (1, 1) on the
/// north edge, logic tiles at (1, 0) and (0, 1).
pub fn two_by_two() -> Result<ArchitectureContext, ArchError> {
    let mut ctx = ArchitectureContext::new("two_by_two", 2, 2)?;
    ctx.create_segment("L1", 1, 4)?;
    let iob = io_block(&mut ctx, 1)?;

    let lut = ctx.primitive("lut4")?;
    let clb = ctx.create_logic_block("clb", 1, 1)?;
    {
        let mut b = ctx.block_mut(clb)?;
        let inputs = b.create_input("in", 4, Orientation::WEST)?;
        let out = b.create_output("out", 1, Orientation::EAST)?;
        let l = b.instantiate_primitive(lut, "lut")?;
        let (lut_in, lut_out) = (b.pin(l, "in")?, b.pin(l, "out")?);
        b.connect(inputs, lut_in)?;
        b.connect(lut_out, out)?;
    }

    let io_south = ctx.create_tile("io_south", iob, Orientation::SOUTH)?;
    let io_north = ctx.create_tile("io_north", iob, Orientation::NORTH)?;
    let clb_tile = ctx.create_tile("clb_tile", clb, Orientation::AUTO)?;
    ctx.place(io_south, Position::new(0, 0))?;
    ctx.place(io_north, Position::new(1, 1))?;
    ctx.place(clb_tile, Position::new(1, 0))?;
    ctx.place(clb_tile, Position::new(0, 1))?;
    Ok(ctx)
}

/// A 3×4 fabric with a clock, a carry chain tagged `carrychain` through a
/// direct tunnel, and a dual-port memory block spanning two rows.
pub fn carry_fabric() -> Result<ArchitectureContext, ArchError> {
    let mut ctx = ArchitectureContext::new("carry_fabric", 3, 4)?;
    let clk = ctx.create_global("clk", true, Position::new(0, 1))?;
    ctx.create_segment("L1", 1, 6)?;
    ctx.create_segment("L4", 4, 1)?;
    let iob = io_block(&mut ctx, 2)?;

    let cluster = ctx.primitive("fraclut6sffc")?;
    let clb = ctx.create_logic_block("clb", 1, 1)?;
    {
        let mut b = ctx.block_mut(clb)?;
        let clk_port = b.create_global(clk, Orientation::SOUTH, Position::ORIGIN)?;
        let ce = b.create_input("ce", 1, Orientation::SOUTH)?;
        let sr = b.create_input("sr", 1, Orientation::SOUTH)?;
        let ia = b.create_input("ia", 6, Orientation::WEST)?;
        let ib = b.create_input("ib", 1, Orientation::WEST)?;
        let cin = b.create_input("cin", 1, Orientation::NORTH)?;
        let cout = b.create_output("cout", 1, Orientation::SOUTH)?;
        let inst = b.instantiate_primitive(cluster, "cluster")?;
        for (driver, pin) in [(clk_port, "clk"), (ce, "ce"), (sr, "sr"), (ia, "ia"), (ib, "ib")] {
            let sink = b.pin(inst, pin)?;
            b.connect(driver, sink)?;
        }
        let (cin_pin, cout_pin) = (b.pin(inst, "cin")?, b.pin(inst, "cout")?);
        b.connect_packed(cin, cin_pin, "carrychain")?;
        b.connect_packed(cout_pin, cout, "carrychain")?;
        for out in ["oa", "ob", "q"] {
            let port = b.create_output(out, 1, Orientation::EAST)?;
            let pin = b.pin(inst, out)?;
            b.connect(pin, port)?;
        }
    }
    ctx.create_direct_tunnel("carrychain", (clb, "cout"), (clb, "cin"), Offset::new(0, 1))?;

    let memory = ctx.get_or_create_memory(6, 4, true)?;
    let bram = ctx.create_logic_block("bram", 1, 2)?;
    {
        let mut b = ctx.block_mut(bram)?;
        b.create_global(clk, Orientation::SOUTH, Position::ORIGIN)?;
        for (row, suffix) in [(0, 1), (1, 2)] {
            b.create_port(PortSpec::input(format!("addr{suffix}"), 6, Orientation::WEST).at(0, row))?;
            b.create_port(PortSpec::input(format!("data{suffix}"), 4, Orientation::WEST).at(0, row))?;
            b.create_port(PortSpec::input(format!("we{suffix}"), 1, Orientation::WEST).at(0, row))?;
            b.create_port(PortSpec::output(format!("out{suffix}"), 4, Orientation::EAST).at(0, row))?;
        }
        let ram = b.instantiate_primitive(memory, "ram")?;
        b.auto_connect(ram)?;
    }

    let io_west = ctx.create_tile("io_west", iob, Orientation::WEST)?;
    let clb_tile = ctx.create_tile("clb_tile", clb, Orientation::AUTO)?;
    let bram_tile = ctx.create_tile("bram_tile", bram, Orientation::AUTO)?;
    ctx.place(io_west, Position::new(0, 1))?;
    ctx.place(io_west, Position::new(0, 2))?;
    ctx.place(clb_tile, Position::new(1, 0))?;
    ctx.place(clb_tile, Position::new(1, 1))?;
    ctx.place(clb_tile, Position::new(1, 2))?;
    ctx.place(bram_tile, Position::new(2, 1))?;
    Ok(ctx)
}
