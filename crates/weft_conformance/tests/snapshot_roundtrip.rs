//! A fully built context survives a snapshot round-trip unchanged.

use weft_arch::{ArchitectureContext, Facet, Offset};
use weft_conformance::{carry_fabric, run_flow};
use weft_flow::{Flow, FlowOptions};
use weft_snapshot::SnapshotError;

fn built(out: &std::path::Path) -> ArchitectureContext {
    let mut ctx = carry_fabric().unwrap();
    let flow = Flow::standard(&FlowOptions::new(out));
    run_flow(&mut ctx, &flow).result.unwrap();
    ctx
}

#[test]
fn roundtrip_preserves_structure() {
    let tmp = tempfile::tempdir().unwrap();
    let ctx = built(tmp.path());
    let path = tmp.path().join("ctx.snapshot");
    weft_snapshot::save(&ctx, &path, true).unwrap();
    let back = weft_snapshot::load(&path).unwrap();

    assert_eq!(back, ctx);
    assert_eq!(back.summary(), ctx.summary());
    assert!(back.is_sealed());
    assert!(back.facets().contains(Facet::SynthResources));

    let tunnel = back.tunnel(back.tunnel_by_name("carrychain").unwrap());
    assert_eq!(tunnel.offset, Offset::new(0, 1));

    let clb = back.block(back.block_by_name("clb").unwrap());
    let patterns: Vec<&str> = clb
        .connections()
        .iter()
        .filter_map(|c| c.pack_pattern)
        .map(|p| back.resolve(p))
        .collect();
    assert_eq!(patterns, vec!["carrychain", "carrychain"]);
    assert_eq!(clb.connections().len(), ctx.block(clb.id).connections().len());
}

#[test]
fn uncompressed_roundtrip() {
    let ctx = carry_fabric().unwrap();
    let bytes = weft_snapshot::encode(&ctx, false).unwrap();
    let back = weft_snapshot::decode(&bytes).unwrap();
    assert_eq!(back, ctx);
    assert!(!back.is_sealed());
}

#[test]
fn corrupted_snapshot_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let ctx = built(tmp.path());
    let path = tmp.path().join("ctx.snapshot");
    weft_snapshot::save(&ctx, &path, false).unwrap();

    let mut bytes = std::fs::read(&path).unwrap();
    let middle = bytes.len() - 16;
    bytes[middle] ^= 0xff;
    std::fs::write(&path, &bytes).unwrap();

    let err = weft_snapshot::load(&path).unwrap_err();
    assert!(matches!(err, SnapshotError::ChecksumMismatch { .. }));
}
