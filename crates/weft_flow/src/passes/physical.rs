//! Physical instances, one per placement.

use super::placement_instance_name;
use crate::error::PassError;
use crate::pass::Pass;
use weft_arch::{ArchitectureContext, Artifact, Facet, PhysicalInstance, PhysicalView};
use weft_diagnostics::DiagnosticSink;

/// Names each placement and records its slice of the configuration chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompletePhysical;

impl Pass for CompletePhysical {
    fn name(&self) -> &'static str {
        "physical"
    }

    fn requires(&self) -> &'static [Facet] {
        &[Facet::ConfigCircuitry]
    }

    fn produces(&self) -> &'static [Facet] {
        &[Facet::Physical]
    }

    fn run(
        &self,
        ctx: &mut ArchitectureContext,
        _sink: &DiagnosticSink,
    ) -> Result<Vec<Artifact>, PassError> {
        let mut view = PhysicalView::default();
        for segment in &ctx.fabric().config.segments {
            let placement = ctx.grid().placement_at(segment.root).ok_or_else(|| {
                super::missing(format!("placement at {}", segment.root))
            })?;
            view.instances.push(PhysicalInstance {
                name: placement_instance_name(ctx, placement),
                root: segment.root,
                tile: segment.tile,
                chain_offset: segment.offset,
                chain_length: segment.length,
            });
        }
        log::debug!("{} physical instances", view.instances.len());
        ctx.fabric_mut().physical = view;
        Ok(Vec::new())
    }
}
