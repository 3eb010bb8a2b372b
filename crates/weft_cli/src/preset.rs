//! Built-in fabric presets.

use weft_arch::{
    ArchError, ArchitectureContext, BlockId, ConflictPolicy, Dir, GlobalId, Offset, Orientation,
    PortSpec, Position, IO_PAD_INSTANCE,
};
use weft_config::WeftConfig;

/// Names accepted in `[fabric] preset`.
pub const PRESETS: &[&str] = &["tiny"];

/// Builds the preset fabric named in the config.
pub fn build(config: &WeftConfig) -> Result<ArchitectureContext, Box<dyn std::error::Error>> {
    let policy = match config.placement.conflict {
        weft_config::ConflictPolicy::Reject => ConflictPolicy::Reject,
        weft_config::ConflictPolicy::Overwrite => ConflictPolicy::Overwrite,
    };
    let fabric = &config.fabric;
    match fabric.preset.as_str() {
        "tiny" => Ok(tiny(&config.project.name, fabric.width, fabric.height, policy)?),
        other => Err(format!(
            "unknown fabric preset '{other}' (available: {})",
            PRESETS.join(", ")
        )
        .into()),
    }
}

/// A fracturable-LUT fabric with dual-port 8K memories.
///
/// IO tiles line the edges (corners stay empty), 1×2 memory tiles fill
/// columns 2 and 5 from odd rows, and logic tiles fill the rest. Each logic
/// block holds two `fraclut6sffc` clusters on a carry chain that continues
/// into the logic block above through the `carrychain` tunnel. The routing
/// channel is 20 tracks wide.
pub fn tiny(
    name: &str,
    width: u32,
    height: u32,
    policy: ConflictPolicy,
) -> Result<ArchitectureContext, ArchError> {
    if width < 3 || height < 3 {
        return Err(ArchError::InvalidParameters {
            what: "preset 'tiny'".to_string(),
            reason: format!("grid {width}x{height} is smaller than 3x3"),
        });
    }
    let mut ctx = ArchitectureContext::with_policy(name, width, height, policy)?;

    let clk = ctx.create_global("clk", true, Position::new(0, 1))?;
    ctx.create_segment("L1", 1, 12)?;
    ctx.create_segment("L2", 2, 4)?;

    let iob = ctx.create_io_block("iob", 4)?;
    {
        let mut b = ctx.block_mut(iob)?;
        b.create_input("outpad", 1, Orientation::AUTO)?;
        b.create_output("inpad", 1, Orientation::AUTO)?;
        let io = b.instance(IO_PAD_INSTANCE)?;
        b.auto_connect(io)?;
    }
    let io_tile = |ctx: &mut ArchitectureContext, dir: Dir| {
        ctx.create_tile(&format!("io_tile_{}", dir.name()), iob, Orientation::Concrete(dir))
    };
    let io_north = io_tile(&mut ctx, Dir::North)?;
    let io_east = io_tile(&mut ctx, Dir::East)?;
    let io_south = io_tile(&mut ctx, Dir::South)?;
    let io_west = io_tile(&mut ctx, Dir::West)?;

    let clb = logic_block(&mut ctx, clk)?;
    ctx.create_direct_tunnel("carrychain", (clb, "cout"), (clb, "cin"), Offset::new(0, 1))?;
    let clb_tile = ctx.create_tile("clb_tile", clb, Orientation::AUTO)?;

    let bram = memory_block(&mut ctx, clk)?;
    let bram_tile = ctx.create_tile("bram_tile", bram, Orientation::AUTO)?;

    for x in 0..width {
        for y in 0..height {
            let left = x == 0;
            let right = x == width - 1;
            let bottom = y == 0;
            let top = y == height - 1;
            let tile = match (left || right, bottom || top) {
                (true, true) => None,
                (true, false) => Some(if left { io_west } else { io_east }),
                (false, true) => Some(if bottom { io_south } else { io_north }),
                (false, false) if bram_column(x, width) => {
                    if y % 2 == 0 {
                        None
                    } else if y + 1 < height - 1 {
                        Some(bram_tile)
                    } else {
                        Some(clb_tile)
                    }
                }
                (false, false) => Some(clb_tile),
            };
            if let Some(tile) = tile {
                ctx.place(tile, Position::new(x, y))?;
            }
        }
    }
    log::debug!(
        "preset 'tiny': {} placements on a {width}x{height} grid",
        ctx.grid().placement_count()
    );
    Ok(ctx)
}

fn bram_column(x: u32, width: u32) -> bool {
    (x == 2 || x == 5) && x < width - 1
}

fn logic_block(
    ctx: &mut ArchitectureContext,
    clk: GlobalId,
) -> Result<BlockId, ArchError> {
    let cluster = ctx.primitive("fraclut6sffc")?;
    let clb = ctx.create_logic_block("clb", 1, 1)?;
    let mut b = ctx.block_mut(clb)?;
    let clk_port = b.create_global(clk, Orientation::SOUTH, Position::ORIGIN)?;
    let ce = b.create_input("ce", 1, Orientation::SOUTH)?;
    let sr = b.create_input("sr", 1, Orientation::SOUTH)?;
    let mut carry = b.create_input("cin", 1, Orientation::NORTH)?;
    for i in 0..2 {
        let inst = b.instantiate_primitive(cluster, &format!("cluster{i}"))?;
        for (driver, pin) in [(clk_port, "clk"), (ce, "ce"), (sr, "sr")] {
            let sink = b.pin(inst, pin)?;
            b.connect(driver, sink)?;
        }
        let ia = b.create_input(&format!("ia{i}"), 6, Orientation::WEST)?;
        let ib = b.create_input(&format!("ib{i}"), 1, Orientation::WEST)?;
        let (ia_pin, ib_pin, cin_pin) = (b.pin(inst, "ia")?, b.pin(inst, "ib")?, b.pin(inst, "cin")?);
        b.connect(ia, ia_pin)?;
        b.connect(ib, ib_pin)?;
        b.connect_packed(carry, cin_pin, "carrychain")?;
        carry = b.pin(inst, "cout")?;
        for out in ["oa", "ob", "q"] {
            let port = b.create_output(&format!("{out}{i}"), 1, Orientation::EAST)?;
            let pin = b.pin(inst, out)?;
            b.connect(pin, port)?;
        }
    }
    let cout = b.create_output("cout", 1, Orientation::SOUTH)?;
    b.connect_packed(carry, cout, "carrychain")?;
    Ok(clb)
}

fn memory_block(
    ctx: &mut ArchitectureContext,
    clk: GlobalId,
) -> Result<BlockId, ArchError> {
    let memory = ctx.get_or_create_memory(10, 8, true)?;
    let bram = ctx.create_logic_block("bram", 1, 2)?;
    let mut b = ctx.block_mut(bram)?;
    b.create_global(clk, Orientation::SOUTH, Position::ORIGIN)?;
    for (row, suffix) in [(0, 1), (1, 2)] {
        b.create_port(PortSpec::input(format!("addr{suffix}"), 10, Orientation::WEST).at(0, row))?;
        b.create_port(PortSpec::input(format!("data{suffix}"), 8, Orientation::WEST).at(0, row))?;
        b.create_port(PortSpec::input(format!("we{suffix}"), 1, Orientation::WEST).at(0, row))?;
        b.create_port(PortSpec::output(format!("out{suffix}"), 8, Orientation::EAST).at(0, row))?;
    }
    let ram = b.instantiate_primitive(memory, "ram")?;
    b.auto_connect(ram)?;
    Ok(bram)
}
