//! Port, global and tunnel bindings for every placement.

use super::missing;
use crate::codes;
use crate::error::PassError;
use crate::pass::Pass;
use weft_arch::{
    ArchitectureContext, Artifact, Facet, GlobalBinding, PortBinding, TunnelLink,
};
use weft_diagnostics::{Diagnostic, DiagnosticSink, Location};

/// Binds each placed tile's ports to the routing channel, its global ports
/// to their global networks, and resolves direct tunnels between placements.
///
/// A tunnel whose target cell is off the grid or holds a different block is
/// skipped with a warning; the fabric is still valid without it.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompleteConnection;

impl Pass for CompleteConnection {
    fn name(&self) -> &'static str {
        "connection"
    }

    fn requires(&self) -> &'static [Facet] {
        &[Facet::RoutingBoxes, Facet::Switches]
    }

    fn produces(&self) -> &'static [Facet] {
        &[Facet::Connections]
    }

    fn run(
        &self,
        ctx: &mut ArchitectureContext,
        sink: &DiagnosticSink,
    ) -> Result<Vec<Artifact>, PassError> {
        let routing = &ctx.fabric().routing;
        let mut port_bindings = Vec::new();
        let mut global_bindings = Vec::new();
        for placement in ctx.grid().placements() {
            let tile = ctx.tile(placement.tile);
            let cbox = routing.boxes.get(&tile.id).ok_or_else(|| {
                missing(format!("connection box of tile '{}'", ctx.resolve(tile.name)))
            })?;
            port_bindings.extend(cbox.entries.iter().map(|entry| PortBinding {
                root: placement.root,
                cell: placement.root.plus(entry.position),
                tile: tile.id,
                port: entry.port,
                side: entry.side,
                tracks: entry.tracks,
            }));
            for port in ctx.block(tile.block).ports() {
                if let Some(global) = port.global {
                    global_bindings.push(GlobalBinding {
                        root: placement.root,
                        tile: tile.id,
                        port: port.id,
                        global,
                    });
                }
            }
        }

        let mut tunnel_links = Vec::new();
        for tunnel in ctx.tunnels() {
            let tunnel_name = ctx.resolve(tunnel.name);
            let sink_block = ctx.resolve(ctx.block(tunnel.to.block).name);
            for placement in ctx.grid().placements() {
                if ctx.tile(placement.tile).block != tunnel.from.block {
                    continue;
                }
                let target = placement.root.offset(tunnel.offset);
                let occupant = target.and_then(|pos| ctx.grid().placement_at(pos));
                match (target, occupant) {
                    (Some(to), Some(other)) if ctx.tile(other.tile).block == tunnel.to.block => {
                        tunnel_links.push(TunnelLink {
                            tunnel: tunnel.id,
                            from: placement.root,
                            to,
                        });
                    }
                    (Some(to), _) if ctx.extent().contains(to) => {
                        log::warn!(
                            "tunnel '{tunnel_name}' from {}: no '{sink_block}' at {to}",
                            placement.root
                        );
                        sink.emit(Diagnostic::warning(
                            codes::TUNNEL_TARGET_MISMATCH,
                            format!(
                                "direct tunnel '{tunnel_name}' from {} has no '{sink_block}' to reach at {to}",
                                placement.root
                            ),
                            Location::entity(tunnel_name).at(placement.root.x, placement.root.y),
                        ));
                    }
                    _ => {
                        log::warn!(
                            "tunnel '{tunnel_name}' from {} leaves the grid",
                            placement.root
                        );
                        sink.emit(
                            Diagnostic::warning(
                                codes::TUNNEL_OFF_GRID,
                                format!(
                                    "direct tunnel '{tunnel_name}' from {} points off the grid",
                                    placement.root
                                ),
                                Location::entity(tunnel_name)
                                    .at(placement.root.x, placement.root.y),
                            )
                            .with_note(format!("offset is {}", tunnel.offset)),
                        );
                    }
                }
            }
        }

        log::debug!(
            "{} port bindings, {} global bindings, {} tunnel links",
            port_bindings.len(),
            global_bindings.len(),
            tunnel_links.len()
        );
        let routing = &mut ctx.fabric_mut().routing;
        routing.port_bindings = port_bindings;
        routing.global_bindings = global_bindings;
        routing.tunnel_links = tunnel_links;
        Ok(Vec::new())
    }
}
