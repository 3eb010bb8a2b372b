//! `weft inspect`: summarize a snapshot.

use std::path::Path;

use weft_arch::ContextSummary;

use crate::{GlobalArgs, InspectArgs};

/// Runs the `weft inspect` command.
pub fn run(args: &InspectArgs, _global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let ctx = weft_snapshot::load(Path::new(&args.snapshot))?;
    let summary = ctx.summary();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", render_summary(&summary));
    }
    Ok(0)
}

/// Formats a summary as aligned `key: value` lines.
pub fn render_summary(summary: &ContextSummary) -> String {
    let facets = if summary.facets.is_empty() {
        "(none)".to_string()
    } else {
        summary.facets.join(", ")
    };
    let rows = [
        ("name", summary.name.clone()),
        ("grid", format!("{}x{}", summary.width, summary.height)),
        ("blocks", summary.blocks.to_string()),
        ("tiles", summary.tiles.to_string()),
        ("primitives", summary.primitives.to_string()),
        (
            "placements",
            format!("{} ({} empty cells)", summary.placements, summary.empty_cells),
        ),
        ("globals", summary.globals.to_string()),
        ("segments", summary.segments.to_string()),
        ("tunnels", summary.tunnels.to_string()),
        ("channel width", summary.channel_width.to_string()),
        ("config bits", summary.config_bits.to_string()),
        ("facets", facets),
    ];
    let mut out = String::new();
    for (key, value) in rows {
        out.push_str(&format!("{:>14}: {value}\n", key));
    }
    out
}
