//! Connection boxes: which side each port faces and how many tracks it taps.

use crate::error::PassError;
use crate::fc::FcTable;
use crate::pass::Pass;
use rayon::prelude::*;
use weft_arch::{
    ArchitectureContext, Artifact, CboxEntry, ConnectionBox, Facet, Tile,
};
use weft_common::InternalError;
use weft_diagnostics::DiagnosticSink;

/// Builds a connection box for every tile.
///
/// The channel width is the sum of `length × multiplicity` over all segment
/// families. Each non-global port gets one entry with its resolved side and
/// the track count from the [`FcTable`].
#[derive(Debug, Clone, Default)]
pub struct CompleteRoutingBox {
    fc: FcTable,
}

impl CompleteRoutingBox {
    /// Creates the pass with the given FC table.
    pub fn new(fc: FcTable) -> Self {
        Self { fc }
    }
}

impl Pass for CompleteRoutingBox {
    fn name(&self) -> &'static str {
        "routing-box"
    }

    fn produces(&self) -> &'static [Facet] {
        &[Facet::RoutingBoxes]
    }

    fn run(
        &self,
        ctx: &mut ArchitectureContext,
        _sink: &DiagnosticSink,
    ) -> Result<Vec<Artifact>, PassError> {
        let channel_width = ctx.channel_width().ok_or_else(|| PassError::Precondition {
            pass: self.name().to_string(),
            message: "the summed segment track counts overflow the channel width".to_string(),
        })?;
        if channel_width == 0 {
            return Err(PassError::Precondition {
                pass: self.name().to_string(),
                message: "at least one routing segment family is required".to_string(),
            });
        }

        let view: &ArchitectureContext = ctx;
        let tiles: Vec<&Tile> = view.tiles().collect();
        let boxes = tiles
            .par_iter()
            .map(|tile| self.build_box(view, tile, channel_width))
            .collect::<Result<Vec<_>, PassError>>()?;

        log::debug!(
            "channel width {channel_width}, {} connection boxes",
            boxes.len()
        );
        let routing = &mut ctx.fabric_mut().routing;
        routing.channel_width = channel_width;
        routing.boxes = boxes.into_iter().map(|b| (b.tile, b)).collect();
        Ok(Vec::new())
    }
}

impl CompleteRoutingBox {
    fn build_box(
        &self,
        ctx: &ArchitectureContext,
        tile: &Tile,
        channel_width: u32,
    ) -> Result<ConnectionBox, PassError> {
        let block = ctx.block(tile.block);
        let block_name = ctx.resolve(block.name);
        let mut entries = Vec::new();
        for port in block.ports().filter(|p| !p.is_global()) {
            let port_name = ctx.resolve(port.name);
            let side = tile.port_side(port).ok_or_else(|| {
                InternalError::new(format!(
                    "port '{block_name}.{port_name}' of tile '{}' has no side",
                    ctx.resolve(tile.name)
                ))
            })?;
            let tracks = self
                .fc
                .resolve(block_name, port_name, port.direction)
                .tracks(channel_width);
            entries.push(CboxEntry {
                port: port.id,
                side,
                position: port.position,
                tracks,
            });
        }
        Ok(ConnectionBox {
            tile: tile.id,
            entries,
            muxes: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fc::{BlockFc, Fc};
    use crate::testing::small_fabric;
    use weft_arch::Dir;

    fn run(pass: &CompleteRoutingBox, ctx: &mut ArchitectureContext) {
        pass.run(ctx, &DiagnosticSink::new()).unwrap();
    }

    #[test]
    fn channel_width_sums_segments() {
        let mut ctx = small_fabric();
        run(&CompleteRoutingBox::default(), &mut ctx);
        assert_eq!(ctx.fabric().routing.channel_width, 8);
        assert_eq!(ctx.fabric().routing.boxes.len(), ctx.tiles().count());
    }

    #[test]
    fn io_ports_face_interior() {
        let mut ctx = small_fabric();
        run(&CompleteRoutingBox::default(), &mut ctx);
        let north = ctx.tile_by_name("io_north").unwrap();
        let south = ctx.tile_by_name("io_south").unwrap();
        let boxes = &ctx.fabric().routing.boxes;
        assert!(boxes[&north].entries.iter().all(|e| e.side == Dir::South));
        assert!(boxes[&south].entries.iter().all(|e| e.side == Dir::North));
    }

    #[test]
    fn globals_are_skipped_and_fc_applied() {
        let mut ctx = small_fabric();
        run(&CompleteRoutingBox::default(), &mut ctx);
        let tile = ctx.tile_by_name("clb_tile").unwrap();
        let cbox = &ctx.fabric().routing.boxes[&tile];
        // in, cin, q, cout; clk is global
        assert_eq!(cbox.entries.len(), 4);
        let block = ctx.block(ctx.tile(tile).block);
        for entry in &cbox.entries {
            let port = block.port(entry.port).unwrap();
            let expected = match port.direction {
                weft_arch::PortDirection::Input => 2,
                weft_arch::PortDirection::Output => 4,
            };
            assert_eq!(entry.tracks, expected, "{}", ctx.resolve(port.name));
        }
    }

    #[test]
    fn per_port_override() {
        let mut ctx = small_fabric();
        let fc = FcTable::default()
            .with_block("clb", BlockFc::default().with_port("cin", Fc::Tracks(0)));
        run(&CompleteRoutingBox::new(fc), &mut ctx);
        let tile = ctx.tile_by_name("clb_tile").unwrap();
        let block = ctx.block(ctx.tile(tile).block);
        let cin = block
            .port_by_name(ctx.interner().get("cin").unwrap())
            .unwrap()
            .id;
        let entry = ctx.fabric().routing.boxes[&tile]
            .entries
            .iter()
            .find(|e| e.port == cin)
            .unwrap();
        assert_eq!(entry.tracks, 0);
    }

    #[test]
    fn no_segments_fails_without_mutation() {
        let mut ctx = ArchitectureContext::new("bare", 2, 2).unwrap();
        let before = ctx.clone();
        let err = CompleteRoutingBox::default()
            .run(&mut ctx, &DiagnosticSink::new())
            .unwrap_err();
        assert!(matches!(err, PassError::Precondition { .. }));
        assert_eq!(ctx, before);
    }

    #[test]
    fn overflowing_channel_width_fails() {
        let mut ctx = small_fabric();
        ctx.create_segment("long", 65_536, 65_535).unwrap();
        ctx.create_segment("more", 65_536, 1).unwrap();
        let before = ctx.clone();
        let err = CompleteRoutingBox::default()
            .run(&mut ctx, &DiagnosticSink::new())
            .unwrap_err();
        match err {
            PassError::Precondition { pass, message } => {
                assert_eq!(pass, "routing-box");
                assert!(message.contains("overflow"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(ctx, before);
    }
}
