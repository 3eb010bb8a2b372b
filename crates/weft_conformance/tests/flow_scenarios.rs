//! End-to-end flow runs over the conformance fixtures.

use weft_arch::{ArtifactKind, Facet, FacetSet};
use weft_conformance::{carry_fabric, run_flow, structural_export_flow, two_by_two};
use weft_flow::{
    CompleteRoutingBox, CompleteSwitch, Flow, FlowOptions, GenerateArchXml, PassError,
};

#[test]
fn two_by_two_exports_four_tiles_and_no_empty_cells() {
    let tmp = tempfile::tempdir().unwrap();
    let mut ctx = two_by_two().unwrap();
    let outcome = run_flow(&mut ctx, &structural_export_flow(tmp.path()));
    let report = outcome.result.unwrap();

    let arch: Vec<_> = report
        .artifacts()
        .filter(|a| a.kind == ArtifactKind::ArchXml)
        .collect();
    assert_eq!(arch.len(), 1);
    let xml = std::fs::read_to_string(&arch[0].path).unwrap();
    assert_eq!(xml.matches("<single type=").count(), 4);
    assert_eq!(xml.matches("<single type=\"EMPTY\"").count(), 0);
    assert!(ctx.facets().contains(Facet::ArchDescription));
}

#[test]
fn export_before_completion_fails_without_mutation() {
    let tmp = tempfile::tempdir().unwrap();
    let arch_dir = tmp.path().join("vpr");
    let flow = Flow::new()
        .with_pass(GenerateArchXml::new(&arch_dir))
        .with_pass(CompleteRoutingBox::default());

    let mut ctx = two_by_two().unwrap();
    let mut expected = ctx.clone();
    expected.seal();

    let outcome = run_flow(&mut ctx, &flow);
    let err = outcome.result.unwrap_err();
    assert_eq!(err.index, 0);
    assert_eq!(err.pass, "arch-xml");
    assert!(matches!(
        err.source,
        PassError::UnmetPassPrerequisite { facet: Facet::Connections, .. }
    ));
    assert_eq!(ctx, expected);
    assert!(!arch_dir.exists());
    assert!(outcome.diagnostics.is_empty());
}

#[test]
fn failure_keeps_completed_passes() {
    let tmp = tempfile::tempdir().unwrap();
    let flow = Flow::new()
        .with_pass(CompleteRoutingBox::default())
        .with_pass(CompleteSwitch)
        .with_pass(GenerateArchXml::new(tmp.path()));

    let mut ctx = two_by_two().unwrap();
    let err = run_flow(&mut ctx, &flow).result.unwrap_err();
    assert_eq!(err.index, 2);
    let done: FacetSet = [Facet::RoutingBoxes, Facet::Switches].into_iter().collect();
    assert_eq!(ctx.facets(), &done);
    assert!(ctx.fabric().artifacts.is_empty());
}

#[test]
fn static_check_matches_run() {
    let flow = Flow::new().with_pass(GenerateArchXml::new("unused"));
    let err = flow.check(&FacetSet::new()).unwrap_err();
    assert_eq!(err.pass, "arch-xml");
}

#[test]
fn standard_flow_over_carry_fabric() {
    let tmp = tempfile::tempdir().unwrap();
    let mut ctx = carry_fabric().unwrap();
    let flow = Flow::standard(&FlowOptions::new(tmp.path()));
    let outcome = run_flow(&mut ctx, &flow);
    let report = outcome.result.unwrap();

    assert_eq!(report.passes.len(), 10);
    assert_eq!(ctx.facets().len(), Facet::ALL.len());
    // The top clb's carry tunnel points at an empty cell.
    assert_eq!(outcome.warning_count, 1);
    assert_eq!(ctx.fabric().routing.tunnel_links.len(), 2);
    assert!(ctx.fabric().config.total_bits > 0);
    assert_eq!(
        ctx.fabric().physical.instances.len(),
        ctx.grid().placement_count()
    );
    for name in ["top.v", "clb.v", "bram.v", "primitives.v"] {
        assert!(tmp.path().join("rtl").join(name).exists(), "missing {name}");
    }
    let rules = std::fs::read_to_string(tmp.path().join("syn").join("bram.rules")).unwrap();
    assert!(rules.contains("bram $__WEFT_MEMORY_A6_D4_DP"));
    ctx.verify().unwrap();
}
