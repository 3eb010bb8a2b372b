//! Fixtures shared by the pass and writer tests.

use weft_arch::{ArchitectureContext, Offset, Orientation, Position, IO_PAD_INSTANCE};

/// A 4×4 fabric with IO tiles, three logic tiles, one memory tile and a
/// carry tunnel. Channel width is 8 (`L1` ×4 plus `L2` ×2).
///
/// The memory's write enable is left undriven.
pub(crate) fn small_fabric() -> ArchitectureContext {
    let mut ctx = ArchitectureContext::new("small", 4, 4).unwrap();
    let clk = ctx.create_global("clk", true, Position::new(0, 1)).unwrap();
    ctx.create_segment("L1", 1, 4).unwrap();
    ctx.create_segment("L2", 2, 2).unwrap();

    let iob = ctx.create_io_block("iob", 2).unwrap();
    {
        let mut b = ctx.block_mut(iob).unwrap();
        b.create_input("outpad", 1, Orientation::AUTO).unwrap();
        b.create_output("inpad", 1, Orientation::AUTO).unwrap();
        let io = b.instance(IO_PAD_INSTANCE).unwrap();
        b.auto_connect(io).unwrap();
    }

    let lut = ctx.primitive("lut4").unwrap();
    let ff = ctx.primitive("flipflop").unwrap();
    let clb = ctx.create_logic_block("clb", 1, 1).unwrap();
    {
        let mut b = ctx.block_mut(clb).unwrap();
        let clk_port = b.create_global(clk, Orientation::SOUTH, Position::ORIGIN).unwrap();
        let inputs = b.create_input("in", 4, Orientation::WEST).unwrap();
        let cin = b.create_input("cin", 1, Orientation::SOUTH).unwrap();
        let q = b.create_output("q", 1, Orientation::EAST).unwrap();
        let cout = b.create_output("cout", 1, Orientation::NORTH).unwrap();
        let l = b.instantiate_primitive(lut, "lut").unwrap();
        let f = b.instantiate_primitive(ff, "ff").unwrap();
        b.connect(inputs, b.pin(l, "in").unwrap()).unwrap();
        b.connect(b.pin(l, "out").unwrap(), b.pin(f, "d").unwrap()).unwrap();
        b.connect(clk_port, b.pin(f, "clk").unwrap()).unwrap();
        b.connect(b.pin(f, "q").unwrap(), q).unwrap();
        b.connect_packed(cin, cout, "carrychain").unwrap();
    }
    ctx.create_direct_tunnel("carry", (clb, "cout"), (clb, "cin"), Offset::new(0, 1))
        .unwrap();

    let memory = ctx.get_or_create_memory(4, 4, false).unwrap();
    let mem = ctx.create_logic_block("mem", 1, 1).unwrap();
    {
        let mut b = ctx.block_mut(mem).unwrap();
        let clk_port = b.create_global(clk, Orientation::SOUTH, Position::ORIGIN).unwrap();
        let addr = b.create_input("addr", 4, Orientation::WEST).unwrap();
        let data = b.create_input("data", 4, Orientation::WEST).unwrap();
        let out = b.create_output("out", 4, Orientation::EAST).unwrap();
        let ram = b.instantiate_primitive(memory, "ram").unwrap();
        b.connect(clk_port, b.pin(ram, "clk").unwrap()).unwrap();
        b.connect(addr, b.pin(ram, "addr").unwrap()).unwrap();
        b.connect(data, b.pin(ram, "data").unwrap()).unwrap();
        b.connect(b.pin(ram, "out").unwrap(), out).unwrap();
    }

    let io_south = ctx.create_tile("io_south", iob, Orientation::SOUTH).unwrap();
    let io_north = ctx.create_tile("io_north", iob, Orientation::NORTH).unwrap();
    let clb_tile = ctx.create_tile("clb_tile", clb, Orientation::AUTO).unwrap();
    let mem_tile = ctx.create_tile("mem_tile", mem, Orientation::AUTO).unwrap();
    ctx.place(io_south, Position::new(1, 0)).unwrap();
    ctx.place(io_south, Position::new(2, 0)).unwrap();
    ctx.place(io_north, Position::new(1, 3)).unwrap();
    ctx.place(clb_tile, Position::new(1, 1)).unwrap();
    ctx.place(clb_tile, Position::new(1, 2)).unwrap();
    ctx.place(clb_tile, Position::new(2, 1)).unwrap();
    ctx.place(mem_tile, Position::new(2, 2)).unwrap();
    ctx
}
