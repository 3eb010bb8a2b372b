//! Pass pipeline for the Weft fabric builder.
//!
//! A [`Flow`] is an ordered list of [`Pass`]es. Running it seals an
//! [`ArchitectureContext`](weft_arch::ArchitectureContext) against further
//! composition and lets each pass complete one aspect of the fabric:
//! connection boxes, switches, bindings, the configuration chain, physical
//! instances and default tie-offs. Writer passes emit structural Verilog,
//! architecture XML and synthesis resources.
//!
//! Each pass names the [`Facet`](weft_arch::Facet)s it requires, produces and
//! forbids, so a misordered flow fails before the offending pass touches
//! anything.

#![warn(missing_docs)]

pub mod codes;
pub mod error;
pub mod fc;
pub mod flow;
pub mod pass;
pub mod passes;
pub mod writers;

#[cfg(test)]
mod testing;

pub use error::{FlowError, PassError};
pub use fc::{BlockFc, Fc, FcTable};
pub use flow::{create_pass, Flow, FlowOptions, FlowReport, PassReport};
pub use pass::{check_prerequisites, Pass};
pub use passes::{
    placement_instance_name, CompleteConnection, CompletePhysical, CompleteRoutingBox,
    CompleteSwitch, InjectConfigCircuitry, ZeroBlockPins, ZeroMemoryWriteEnable,
};
pub use writers::{GenerateArchXml, GenerateRtl, GenerateSynthResources};
