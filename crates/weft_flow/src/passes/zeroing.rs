//! Tie-off passes: constant-zero defaults for undriven sinks.

use crate::codes;
use crate::error::PassError;
use crate::pass::Pass;
use weft_arch::{
    ArchitectureContext, Artifact, Bits, BlockId, DefaultReason, DefaultTie, ElementRef, Facet,
    NetNode, PortDirection, TieValue,
};
use weft_diagnostics::{Diagnostic, DiagnosticSink, Location};

/// Ties undriven memory write enables (`we`, or `we1`/`we2`) to zero, so an
/// unused memory port can never write.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroMemoryWriteEnable;

impl Pass for ZeroMemoryWriteEnable {
    fn name(&self) -> &'static str {
        "zero-memory-we"
    }

    fn requires(&self) -> &'static [Facet] {
        &[Facet::Physical]
    }

    fn produces(&self) -> &'static [Facet] {
        &[Facet::MemoryDefaults]
    }

    fn forbids(&self) -> &'static [Facet] {
        &[Facet::SynthResources]
    }

    fn run(
        &self,
        ctx: &mut ArchitectureContext,
        sink: &DiagnosticSink,
    ) -> Result<Vec<Artifact>, PassError> {
        let mut plan = Vec::new();
        for block in ctx.blocks() {
            for inst in block.instances() {
                let ElementRef::Primitive(prim) = inst.element else {
                    continue;
                };
                let Some(params) = ctx.library().get(prim).kind.memory() else {
                    continue;
                };
                for &name in params.write_enable_pins() {
                    let pin = ctx
                        .interner()
                        .get(name)
                        .and_then(|ident| inst.pin_index(ident));
                    let Some(pin) = pin else { continue };
                    let bits = Bits::whole(
                        block.id,
                        NetNode::Pin {
                            instance: inst.id,
                            pin,
                        },
                        inst.pins[pin as usize].width,
                    );
                    if !block.is_driven(&bits) {
                        plan.push((block.id, bits));
                    }
                }
            }
        }
        apply(ctx, sink, plan, DefaultReason::MemoryWriteEnable)
    }
}

/// Ties every remaining undriven input pin bit to zero and notes output pins
/// that drive nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroBlockPins;

impl Pass for ZeroBlockPins {
    fn name(&self) -> &'static str {
        "zero-block-pins"
    }

    fn requires(&self) -> &'static [Facet] {
        &[Facet::Physical]
    }

    fn produces(&self) -> &'static [Facet] {
        &[Facet::PinDefaults]
    }

    fn forbids(&self) -> &'static [Facet] {
        &[Facet::SynthResources]
    }

    fn run(
        &self,
        ctx: &mut ArchitectureContext,
        sink: &DiagnosticSink,
    ) -> Result<Vec<Artifact>, PassError> {
        let mut plan = Vec::new();
        for block in ctx.blocks() {
            for unconnected in block.unconnected_pins() {
                if unconnected.direction != PortDirection::Output {
                    continue;
                }
                let width = block
                    .instance(unconnected.instance)
                    .and_then(|inst| inst.pins.get(unconnected.pin as usize))
                    .map_or(1, |pin| pin.width);
                let bits = Bits::whole(
                    block.id,
                    NetNode::Pin {
                        instance: unconnected.instance,
                        pin: unconnected.pin,
                    },
                    width,
                );
                let block_name = ctx.resolve(block.name);
                sink.emit(Diagnostic::note(
                    codes::UNUSED_OUTPUT,
                    format!("{} drives nothing", ctx.describe_bits(block.id, &bits)),
                    Location::entity(block_name),
                ));
            }
            plan.extend(
                block
                    .undriven_input_bits()
                    .into_iter()
                    .map(|bits| (block.id, bits)),
            );
        }
        apply(ctx, sink, plan, DefaultReason::UnusedPin)
    }
}

fn apply(
    ctx: &mut ArchitectureContext,
    sink: &DiagnosticSink,
    plan: Vec<(BlockId, Bits)>,
    reason: DefaultReason,
) -> Result<Vec<Artifact>, PassError> {
    let code = match reason {
        DefaultReason::MemoryWriteEnable => codes::WRITE_ENABLE_TIED,
        DefaultReason::UnusedPin => codes::PIN_TIED,
    };
    for &(block, bits) in &plan {
        let what = ctx.describe_bits(block, &bits);
        let block_name = ctx.resolve(ctx.block(block).name).to_string();
        ctx.tie_off(block, bits, TieValue::Zero)?;
        log::debug!("tied {what} of '{block_name}' to 0");
        sink.emit(Diagnostic::warning(
            code,
            format!("{what} is undriven; tied to 0"),
            Location::entity(block_name),
        ));
    }
    let count = plan.len();
    ctx.fabric_mut()
        .defaults
        .ties
        .extend(plan.into_iter().map(|(block, sink)| DefaultTie {
            block,
            sink,
            reason,
        }));
    if count > 0 {
        log::info!("{count} default tie-offs applied");
    }
    Ok(Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::small_fabric;
    use weft_arch::{Orientation, TieOff};

    #[test]
    fn memory_write_enable_tied() {
        let mut ctx = small_fabric();
        let sink = DiagnosticSink::new();
        ZeroMemoryWriteEnable.run(&mut ctx, &sink).unwrap();

        let mem = ctx.block(ctx.block_by_name("mem").unwrap());
        assert_eq!(mem.tie_offs().len(), 1);
        assert_eq!(mem.tie_offs()[0].value, TieValue::Zero);
        assert_eq!(ctx.describe_bits(mem.id, &mem.tie_offs()[0].sink), "pin 'ram.we'");
        assert_eq!(ctx.fabric().defaults.count(DefaultReason::MemoryWriteEnable), 1);
        assert_eq!(sink.warning_count(), 1);
    }

    #[test]
    fn driven_write_enable_left_alone() {
        let mut ctx = ArchitectureContext::new("m", 2, 2).unwrap();
        let memory = ctx.get_or_create_memory(4, 4, true).unwrap();
        let block = ctx.create_logic_block("bram", 1, 1).unwrap();
        {
            let mut b = ctx.block_mut(block).unwrap();
            let we1 = b.create_input("we1", 1, Orientation::WEST).unwrap();
            let ram = b.instantiate_primitive(memory, "ram").unwrap();
            b.connect(we1, b.pin(ram, "we1").unwrap()).unwrap();
        }
        let sink = DiagnosticSink::new();
        ZeroMemoryWriteEnable.run(&mut ctx, &sink).unwrap();
        let ties: &[TieOff] = ctx.block(block).tie_offs();
        assert_eq!(ties.len(), 1);
        assert_eq!(ctx.describe_bits(block, &ties[0].sink), "pin 'ram.we2'");
    }

    #[test]
    fn block_pins_tied_in_ranges() {
        let mut ctx = ArchitectureContext::new("p", 2, 2).unwrap();
        let lut = ctx.primitive("lut4").unwrap();
        let block = ctx.create_logic_block("clb", 1, 1).unwrap();
        {
            let mut b = ctx.block_mut(block).unwrap();
            let a = b.create_input("a", 1, Orientation::WEST).unwrap();
            let l = b.instantiate_primitive(lut, "lut").unwrap();
            let pin = b.pin(l, "in").unwrap();
            b.connect(a, pin.bit(1).unwrap()).unwrap();
        }
        let sink = DiagnosticSink::new();
        ZeroBlockPins.run(&mut ctx, &sink).unwrap();

        let described: Vec<String> = ctx
            .block(block)
            .tie_offs()
            .iter()
            .map(|t| ctx.describe_bits(block, &t.sink))
            .collect();
        assert_eq!(described, vec!["pin 'lut.in[0]'", "pin 'lut.in[3:2]'"]);
        assert_eq!(ctx.fabric().defaults.count(DefaultReason::UnusedPin), 2);
        // lut.out drives nothing
        assert_eq!(sink.count_code(codes::UNUSED_OUTPUT), 1);
    }

    #[test]
    fn zeroing_is_idempotent_once_tied() {
        let mut ctx = small_fabric();
        let sink = DiagnosticSink::new();
        ZeroMemoryWriteEnable.run(&mut ctx, &sink).unwrap();
        ZeroBlockPins.run(&mut ctx, &sink).unwrap();
        assert_eq!(ctx.fabric().defaults.count(DefaultReason::UnusedPin), 0);
    }
}
