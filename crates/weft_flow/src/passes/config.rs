//! Configuration chain layout.

use super::missing;
use crate::error::PassError;
use crate::pass::Pass;
use std::collections::HashMap;
use weft_arch::{
    block_config_bits, ArchitectureContext, Artifact, BlockId, ChainSegment, ConfigChain, Facet,
};
use weft_diagnostics::DiagnosticSink;

/// Threads a single configuration chain through every placement.
///
/// Placements are visited in column-major order of their root cell. Each
/// one contributes the configuration bits of its block copies, its
/// connection-box mux selects and the switch-box mux selects of the cells
/// it covers.
#[derive(Debug, Clone, Copy, Default)]
pub struct InjectConfigCircuitry;

impl Pass for InjectConfigCircuitry {
    fn name(&self) -> &'static str {
        "config"
    }

    fn requires(&self) -> &'static [Facet] {
        &[Facet::Connections]
    }

    fn produces(&self) -> &'static [Facet] {
        &[Facet::ConfigCircuitry]
    }

    fn forbids(&self) -> &'static [Facet] {
        &[
            Facet::Physical,
            Facet::MemoryDefaults,
            Facet::PinDefaults,
            Facet::SynthResources,
        ]
    }

    fn run(
        &self,
        ctx: &mut ArchitectureContext,
        _sink: &DiagnosticSink,
    ) -> Result<Vec<Artifact>, PassError> {
        let routing = &ctx.fabric().routing;
        let mut block_bits: HashMap<BlockId, u64> = HashMap::new();
        let mut chain = ConfigChain::default();
        for placement in ctx.grid().placements() {
            let tile = ctx.tile(placement.tile);
            let logic = *block_bits
                .entry(tile.block)
                .or_insert_with(|| block_config_bits(ctx, tile.block));
            let cbox = routing.boxes.get(&tile.id).ok_or_else(|| {
                missing(format!("connection box of tile '{}'", ctx.resolve(tile.name)))
            })?;
            let switch_boxes: u64 = placement
                .cells()
                .filter_map(|cell| routing.switch_boxes.get(&cell))
                .map(|sbox| routing.mux_config_bits(&sbox.muxes))
                .sum();
            let length =
                logic * u64::from(tile.capacity) + routing.mux_config_bits(&cbox.muxes) + switch_boxes;
            chain.segments.push(ChainSegment {
                root: placement.root,
                tile: tile.id,
                offset: chain.total_bits,
                length,
            });
            chain.total_bits += length;
        }
        log::info!(
            "configuration chain: {} bits over {} placements",
            chain.total_bits,
            chain.segments.len()
        );
        ctx.fabric_mut().config = chain;
        Ok(Vec::new())
    }
}
