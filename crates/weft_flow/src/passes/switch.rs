//! Routing muxes: connection-box input muxes and Wilton switch boxes.

use super::missing;
use crate::error::PassError;
use crate::pass::Pass;
use std::collections::BTreeMap;
use weft_arch::{ArchitectureContext, Artifact, Facet, MuxGroup, PortDirection, SwitchBox};
use weft_diagnostics::DiagnosticSink;

/// Fan-in of a switch-box mux: a Wilton switch box with `Fs = 3` lets each
/// track start take one of three incoming tracks.
pub const SWITCH_BOX_FANIN: u32 = 3;

/// Sizes connection-box muxes and builds a switch box per covered cell.
///
/// Every input bit with `t > 0` tracks gets a `t:1` mux; IO tiles need one
/// per pad. Every covered cell gets `4 × Σ multiplicity` 3:1 muxes, one per
/// track starting there in each direction.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompleteSwitch;

impl Pass for CompleteSwitch {
    fn name(&self) -> &'static str {
        "switch"
    }

    fn requires(&self) -> &'static [Facet] {
        &[Facet::RoutingBoxes]
    }

    fn produces(&self) -> &'static [Facet] {
        &[Facet::Switches]
    }

    fn run(
        &self,
        ctx: &mut ArchitectureContext,
        _sink: &DiagnosticSink,
    ) -> Result<Vec<Artifact>, PassError> {
        let mut routing = ctx.fabric().routing.clone();

        let mut tile_muxes = Vec::with_capacity(routing.boxes.len());
        for cbox in routing.boxes.values() {
            let tile = ctx.tile(cbox.tile);
            let block = ctx.block(tile.block);
            let mut by_fanin: BTreeMap<u32, u32> = BTreeMap::new();
            for entry in &cbox.entries {
                let port = block
                    .port(entry.port)
                    .ok_or_else(|| missing(format!("port #{}", entry.port.as_raw())))?;
                if port.direction == PortDirection::Input && entry.tracks > 0 {
                    let count = by_fanin.entry(entry.tracks).or_default();
                    *count = port
                        .width
                        .checked_mul(tile.capacity)
                        .and_then(|muxes| count.checked_add(muxes))
                        .ok_or_else(|| self.overflow("connection box mux count"))?;
                }
            }
            tile_muxes.push((cbox.tile, by_fanin));
        }
        for (tile, by_fanin) in tile_muxes {
            let muxes: Vec<MuxGroup> = by_fanin
                .into_iter()
                .map(|(fanin, count)| MuxGroup {
                    switch: routing.switch_for_fanin(fanin),
                    count,
                })
                .collect();
            if let Some(cbox) = routing.boxes.get_mut(&tile) {
                cbox.muxes = muxes;
            }
        }

        let starts = ctx
            .segments()
            .try_fold(0u32, |total, s| total.checked_add(s.multiplicity))
            .and_then(|wires| wires.checked_mul(4))
            .ok_or_else(|| self.overflow("switch box mux count"))?;
        if starts > 0 {
            let switch = routing.switch_for_fanin(SWITCH_BOX_FANIN);
            for placement in ctx.grid().placements() {
                for cell in placement.cells() {
                    routing.switch_boxes.insert(
                        cell,
                        SwitchBox {
                            position: cell,
                            muxes: vec![MuxGroup {
                                switch,
                                count: starts,
                            }],
                        },
                    );
                }
            }
        }

        log::debug!(
            "{} switch types, {} switch boxes",
            routing.switches.len(),
            routing.switch_boxes.len()
        );
        ctx.fabric_mut().routing = routing;
        Ok(Vec::new())
    }
}

impl CompleteSwitch {
    fn overflow(&self, what: &str) -> PassError {
        PassError::Precondition {
            pass: self.name().to_string(),
            message: format!("{what} does not fit in 32 bits"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::CompleteRoutingBox;
    use crate::testing::small_fabric;
    use weft_arch::Position;

    fn switched() -> ArchitectureContext {
        let mut ctx = small_fabric();
        let sink = DiagnosticSink::new();
        CompleteRoutingBox::default().run(&mut ctx, &sink).unwrap();
        CompleteSwitch.run(&mut ctx, &sink).unwrap();
        ctx
    }

    #[test]
    fn cbox_muxes_per_input_bit() {
        let ctx = switched();
        let routing = &ctx.fabric().routing;
        let mux2 = routing.find_switch(2).unwrap();
        let clb = ctx.tile_by_name("clb_tile").unwrap();
        // in[4] + cin, each tapping 2 tracks
        assert_eq!(
            routing.boxes[&clb].muxes,
            vec![MuxGroup { switch: mux2, count: 5 }]
        );
        let io = ctx.tile_by_name("io_south").unwrap();
        // one outpad mux per pad, capacity 2
        assert_eq!(routing.boxes[&io].muxes[0].count, 2);
    }

    #[test]
    fn switch_library_is_memoized() {
        let ctx = switched();
        let routing = &ctx.fabric().routing;
        let fanins: Vec<u32> = routing.switches.values().map(|s| s.fanin).collect();
        assert_eq!(fanins, vec![2, 3]);
    }

    #[test]
    fn switch_box_per_covered_cell() {
        let ctx = switched();
        let routing = &ctx.fabric().routing;
        assert_eq!(routing.switch_boxes.len(), 7);
        let sbox = &routing.switch_boxes[&Position::new(1, 1)];
        // 4 directions x (4 + 2) track families
        assert_eq!(sbox.muxes[0].count, 24);
        assert!(!routing.switch_boxes.contains_key(&Position::new(0, 0)));
    }

    #[test]
    fn zero_track_inputs_get_no_mux() {
        use crate::fc::{BlockFc, Fc, FcTable};
        let mut ctx = small_fabric();
        let sink = DiagnosticSink::new();
        let fc = FcTable::default().with_block("clb", BlockFc::default().with_port("cin", Fc::Tracks(0)));
        CompleteRoutingBox::new(fc).run(&mut ctx, &sink).unwrap();
        CompleteSwitch.run(&mut ctx, &sink).unwrap();
        let clb = ctx.tile_by_name("clb_tile").unwrap();
        assert_eq!(ctx.fabric().routing.boxes[&clb].muxes[0].count, 4);
    }

    #[test]
    fn overflowing_switch_box_count_fails() {
        let mut ctx = small_fabric();
        ctx.create_segment("wide", 1, 1 << 30).unwrap();
        let sink = DiagnosticSink::new();
        CompleteRoutingBox::default().run(&mut ctx, &sink).unwrap();
        let err = CompleteSwitch.run(&mut ctx, &sink).unwrap_err();
        assert!(matches!(err, PassError::Precondition { ref pass, .. } if pass == "switch"));
        assert!(ctx.fabric().routing.switch_boxes.is_empty());
        assert!(ctx.fabric().routing.switches.is_empty());
    }
}
