//! Ordered pass pipelines.

use crate::error::{FlowError, PassError};
use crate::fc::FcTable;
use crate::pass::{check_prerequisites, Pass};
use crate::passes::{
    CompleteConnection, CompletePhysical, CompleteRoutingBox, CompleteSwitch,
    InjectConfigCircuitry, ZeroBlockPins, ZeroMemoryWriteEnable,
};
use crate::writers::{GenerateArchXml, GenerateRtl, GenerateSynthResources};
use std::path::{Path, PathBuf};
use weft_arch::{ArchitectureContext, Artifact, FacetSet};
use weft_config::{ConfigError, WeftConfig};
use weft_diagnostics::DiagnosticSink;

/// Settings the standard passes are built from.
#[derive(Debug, Clone)]
pub struct FlowOptions {
    /// Connection-box FC values.
    pub fc: FcTable,
    /// Directory for structural Verilog.
    pub rtl_dir: PathBuf,
    /// Directory for the architecture XML.
    pub arch_dir: PathBuf,
    /// Directory for synthesis resources.
    pub synth_dir: PathBuf,
}

impl FlowOptions {
    /// Default FC values and the default subdirectories of `out_dir`.
    pub fn new(out_dir: &Path) -> Self {
        Self {
            fc: FcTable::default(),
            rtl_dir: out_dir.join("rtl"),
            arch_dir: out_dir.join("vpr"),
            synth_dir: out_dir.join("syn"),
        }
    }

    /// Options from the `[routing]` and `[output]` sections of a config.
    pub fn from_config(config: &WeftConfig, out_dir: &Path) -> Self {
        Self {
            fc: FcTable::from(&config.routing),
            rtl_dir: out_dir.join(&config.output.rtl),
            arch_dir: out_dir.join(&config.output.arch),
            synth_dir: out_dir.join(&config.output.synth),
        }
    }
}

/// Creates the standard pass with the given configuration name.
pub fn create_pass(name: &str, options: &FlowOptions) -> Option<Box<dyn Pass>> {
    let pass: Box<dyn Pass> = match name {
        "routing-box" => Box::new(CompleteRoutingBox::new(options.fc.clone())),
        "switch" => Box::new(CompleteSwitch),
        "connection" => Box::new(CompleteConnection),
        "rtl" => Box::new(GenerateRtl::new(&options.rtl_dir)),
        "config" => Box::new(InjectConfigCircuitry),
        "arch-xml" => Box::new(GenerateArchXml::new(&options.arch_dir)),
        "physical" => Box::new(CompletePhysical),
        "zero-memory-we" => Box::new(ZeroMemoryWriteEnable),
        "zero-block-pins" => Box::new(ZeroBlockPins),
        "synth" => Box::new(GenerateSynthResources::new(&options.synth_dir)),
        _ => return None,
    };
    Some(pass)
}

/// What one pass did.
#[derive(Debug, Clone)]
pub struct PassReport {
    /// The pass name.
    pub name: &'static str,
    /// Files it wrote.
    pub artifacts: Vec<Artifact>,
}

/// What a flow run did, pass by pass.
#[derive(Debug, Clone, Default)]
pub struct FlowReport {
    /// One entry per pass, in run order.
    pub passes: Vec<PassReport>,
}

impl FlowReport {
    /// Iterates over every file written.
    pub fn artifacts(&self) -> impl Iterator<Item = &Artifact> {
        self.passes.iter().flat_map(|p| p.artifacts.iter())
    }
}

/// An ordered list of passes.
///
/// A flow is assembled with the by-value `with_*` builders and cannot be
/// changed afterwards; [`check`](Self::check) and [`run`](Self::run) borrow it
/// immutably. Passes run strictly in sequence. Before each one the flow checks its
/// facet declarations against the context; the first failure stops the run.
#[derive(Default)]
pub struct Flow {
    passes: Vec<Box<dyn Pass>>,
}

impl Flow {
    /// Creates an empty flow.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pass.
    pub fn with_pass(mut self, pass: impl Pass + 'static) -> Self {
        self.passes.push(Box::new(pass));
        self
    }

    /// Appends a boxed pass, as returned by [`create_pass`].
    pub fn with_boxed(mut self, pass: Box<dyn Pass>) -> Self {
        self.passes.push(pass);
        self
    }

    /// The reference ordering of all ten passes.
    pub fn standard(options: &FlowOptions) -> Self {
        Self {
            passes: weft_config::STANDARD_PASSES
                .iter()
                .filter_map(|name| create_pass(name, options))
                .collect(),
        }
    }

    /// The `[flow]` pass list of a config, with outputs under `out_dir`.
    pub fn from_config(config: &WeftConfig, out_dir: &Path) -> Result<Self, ConfigError> {
        let options = FlowOptions::from_config(config, out_dir);
        let passes = config
            .flow
            .passes
            .iter()
            .map(|name| {
                create_pass(name, &options).ok_or_else(|| ConfigError::UnknownPass(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { passes })
    }

    /// Returns the pass names in order.
    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    /// Returns the number of passes.
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// Returns `true` if the flow has no passes.
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Checks the ordering without running anything, starting from the
    /// facets in `initial`.
    pub fn check(&self, initial: &FacetSet) -> Result<(), FlowError> {
        let mut facets = initial.clone();
        for (index, pass) in self.passes.iter().enumerate() {
            check_prerequisites(pass.as_ref(), &facets)
                .map_err(|source| located(index, pass.as_ref(), source))?;
            for &facet in pass.produces() {
                facets.insert(facet);
            }
        }
        Ok(())
    }

    /// Seals the context and runs every pass in order.
    ///
    /// On failure the context keeps the results of the passes that
    /// completed; the failing pass leaves nothing behind.
    pub fn run(
        &self,
        ctx: &mut ArchitectureContext,
        sink: &DiagnosticSink,
    ) -> Result<FlowReport, FlowError> {
        ctx.seal();
        let mut report = FlowReport::default();
        for (index, pass) in self.passes.iter().enumerate() {
            let pass = pass.as_ref();
            check_prerequisites(pass, ctx.facets()).map_err(|e| located(index, pass, e))?;
            log::info!("running pass '{}'", pass.name());
            let artifacts = pass.run(ctx, sink).map_err(|e| located(index, pass, e))?;
            for &facet in pass.produces() {
                ctx.mark_complete(facet);
            }
            ctx.fabric_mut().artifacts.extend(artifacts.iter().cloned());
            log::debug!(
                "pass '{}' finished, {} artifacts",
                pass.name(),
                artifacts.len()
            );
            report.passes.push(PassReport {
                name: pass.name(),
                artifacts,
            });
        }
        Ok(report)
    }
}

fn located(index: usize, pass: &dyn Pass, source: PassError) -> FlowError {
    FlowError {
        index,
        pass: pass.name().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::small_fabric;
    use weft_arch::{DefaultReason, Facet, Phase};

    #[test]
    fn standard_order() {
        let flow = Flow::standard(&FlowOptions::new(Path::new("out")));
        assert_eq!(flow.pass_names(), weft_config::STANDARD_PASSES.to_vec());
        flow.check(&FacetSet::new()).unwrap();
    }

    #[test]
    fn static_check_finds_missing_prerequisite() {
        let flow = Flow::new()
            .with_pass(CompleteRoutingBox::default())
            .with_pass(GenerateArchXml::new("out"));
        let err = flow.check(&FacetSet::new()).unwrap_err();
        assert_eq!(err.index, 1);
        assert_eq!(err.pass, "arch-xml");
        assert!(matches!(
            err.source,
            PassError::UnmetPassPrerequisite {
                facet: Facet::Connections,
                ..
            }
        ));
    }

    #[test]
    fn static_check_finds_forbidden_order() {
        let options = FlowOptions::new(Path::new("out"));
        let names = [
            "routing-box",
            "switch",
            "connection",
            "config",
            "physical",
            "zero-block-pins",
            "zero-memory-we",
            "synth",
            "config",
        ];
        let flow = names
            .iter()
            .fold(Flow::new(), |flow, name| flow.with_boxed(create_pass(name, &options).unwrap()));
        assert_eq!(flow.pass_names(), names.to_vec());
        let err = flow.check(&FacetSet::new()).unwrap_err();
        assert_eq!(err.index, 8);
        assert!(matches!(err.source, PassError::PassOrderViolation { .. }));
    }

    #[test]
    fn out_of_order_run_leaves_context_untouched() {
        let mut ctx = small_fabric();
        let dir = tempfile::tempdir().unwrap();
        let flow = Flow::new().with_pass(GenerateArchXml::new(dir.path()));
        let mut before = ctx.clone();
        before.seal();
        let err = flow.run(&mut ctx, &DiagnosticSink::new()).unwrap_err();
        assert!(matches!(
            err.source,
            PassError::UnmetPassPrerequisite { .. }
        ));
        assert_eq!(ctx, before);
        assert!(!dir.path().join("arch.xml").exists());
    }

    #[test]
    fn full_run() {
        let mut ctx = small_fabric();
        let dir = tempfile::tempdir().unwrap();
        let flow = Flow::standard(&FlowOptions::new(dir.path()));
        let sink = DiagnosticSink::new();
        let report = flow.run(&mut ctx, &sink).unwrap();

        assert_eq!(ctx.phase(), Phase::Transforming);
        assert_eq!(ctx.facets().len(), Facet::ALL.len());
        assert_eq!(report.passes.len(), 10);
        assert!(report.artifacts().all(|a| a.path.exists()));
        assert_eq!(ctx.fabric().artifacts.len(), report.artifacts().count());
        assert!(dir.path().join("vpr").join("arch.xml").exists());
        assert!(dir.path().join("syn").join("bram.rules").exists());
        assert_eq!(ctx.fabric().defaults.count(DefaultReason::MemoryWriteEnable), 1);
        assert!(!sink.has_errors());
        ctx.verify().unwrap();
    }

    #[test]
    fn composition_closed_after_run() {
        let mut ctx = small_fabric();
        Flow::new()
            .with_pass(CompleteRoutingBox::default())
            .run(&mut ctx, &DiagnosticSink::new())
            .unwrap();
        assert!(matches!(
            ctx.create_segment("L4", 4, 1),
            Err(weft_arch::ArchError::CompositionClosed)
        ));
    }

    #[test]
    fn from_config_uses_pass_list_and_dirs() {
        let config = weft_config::load_config_from_str(
            r#"
[project]
name = "t"
[flow]
passes = ["routing-box", "switch"]
[output]
rtl = "verilog"
"#,
        )
        .unwrap();
        let flow = Flow::from_config(&config, Path::new("build")).unwrap();
        assert_eq!(flow.pass_names(), vec!["routing-box", "switch"]);
        let options = FlowOptions::from_config(&config, Path::new("build"));
        assert_eq!(options.rtl_dir, Path::new("build").join("verilog"));
    }
}
