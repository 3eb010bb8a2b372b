//! The fabric completion passes.

mod config;
mod connection;
mod physical;
mod routing_box;
mod switch;
mod zeroing;

pub use config::InjectConfigCircuitry;
pub use connection::CompleteConnection;
pub use physical::CompletePhysical;
pub use routing_box::CompleteRoutingBox;
pub use switch::{CompleteSwitch, SWITCH_BOX_FANIN};
pub use zeroing::{ZeroBlockPins, ZeroMemoryWriteEnable};

use weft_arch::{ArchitectureContext, Placement};
use weft_common::InternalError;

/// Returns the instance name of a placement, e.g. `clb_tile_x1y2`.
pub fn placement_instance_name(ctx: &ArchitectureContext, placement: &Placement) -> String {
    format!(
        "{}_x{}y{}",
        ctx.resolve(ctx.tile(placement.tile).name),
        placement.root.x,
        placement.root.y
    )
}

pub(crate) fn missing(what: impl std::fmt::Display) -> InternalError {
    InternalError::new(format!("{what} is missing although its facet is complete"))
}
