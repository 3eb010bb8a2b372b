//! `weft build`: compose the preset fabric and run the flow.
//!
//! 1. Locate and load `weft.toml`
//! 2. Build the preset fabric into a fresh context
//! 3. Assemble the flow from `[flow] passes`
//! 4. Check the ordering (and stop there for `--dry-run`)
//! 5. Run the flow, render diagnostics, save the snapshot

use std::path::{Path, PathBuf};

use weft_arch::ArchitectureContext;
use weft_config::WeftConfig;
use weft_diagnostics::{DiagnosticRenderer, DiagnosticSink, TerminalRenderer};
use weft_flow::{Flow, FlowReport};

use crate::project::load_project;
use crate::{preset, BuildArgs, GlobalArgs};

/// What a build produced.
pub struct BuildOutcome {
    /// The context after the flow ran.
    pub context: ArchitectureContext,
    /// Per-pass report, `None` for a dry run.
    pub report: Option<FlowReport>,
    /// The snapshot path, `None` for a dry run.
    pub snapshot: Option<PathBuf>,
}

/// Runs the `weft build` command.
///
/// Returns exit code 0 on success, 1 if any diagnostic is an error.
pub fn run(args: &BuildArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let (root, config) = load_project(global)?;
    let out_dir = output_dir(&root, &config, args.out_dir.as_deref());

    if !global.quiet {
        eprintln!(
            "   Building {} ({} {}x{})",
            config.project.name, config.fabric.preset, config.fabric.width, config.fabric.height
        );
    }

    let sink = DiagnosticSink::new();
    let result = build_project(&config, &out_dir, args.dry_run, &sink);

    let renderer = TerminalRenderer::new(global.color);
    for diag in sink.diagnostics() {
        if global.quiet && !diag.severity.is_error() {
            continue;
        }
        eprint!("{}", renderer.render(&diag));
    }
    let outcome = result?;

    if !global.quiet {
        match (&outcome.report, &outcome.snapshot) {
            (Some(report), Some(snapshot)) => {
                for pass in &report.passes {
                    eprintln!("     Ran {} ({} files)", pass.name, pass.artifacts.len());
                }
                eprintln!("   Snapshot {}", snapshot.display());
            }
            _ => eprintln!("   Checked {} passes, nothing run", config.flow.passes.len()),
        }
        eprintln!(
            "   Result: {} error(s), {} warning(s)",
            sink.error_count(),
            sink.warning_count()
        );
    }

    Ok(if sink.has_errors() { 1 } else { 0 })
}

/// Resolves the output directory: `--out-dir` wins, else `[output] dir`
/// relative to the project root.
pub fn output_dir(root: &Path, config: &WeftConfig, override_dir: Option<&str>) -> PathBuf {
    match override_dir {
        Some(dir) => PathBuf::from(dir),
        None => root.join(&config.output.dir),
    }
}

/// Builds, checks and (unless `dry_run`) runs the configured flow.
pub fn build_project(
    config: &WeftConfig,
    out_dir: &Path,
    dry_run: bool,
    sink: &DiagnosticSink,
) -> Result<BuildOutcome, Box<dyn std::error::Error>> {
    let mut context = preset::build(config)?;
    let flow = Flow::from_config(config, out_dir)?;
    flow.check(context.facets())?;
    log::debug!("flow: {}", flow.pass_names().join(" -> "));

    if dry_run {
        return Ok(BuildOutcome {
            context,
            report: None,
            snapshot: None,
        });
    }

    let report = flow.run(&mut context, sink)?;
    let snapshot = out_dir.join(&config.output.snapshot);
    weft_snapshot::save(&context, &snapshot, config.output.compress)?;
    Ok(BuildOutcome {
        context,
        report: Some(report),
        snapshot: Some(snapshot),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(extra: &str) -> WeftConfig {
        let toml = format!(
            r#"
[project]
name = "tiny"

[routing.blocks.clb]
fc_in = 0.25
fc_out = 0.25
ports = {{ cin = 0, cout = 0 }}

{extra}
"#
        );
        weft_config::load_config_from_str(&toml).unwrap()
    }

    #[test]
    fn out_dir_override() {
        let cfg = config("");
        assert_eq!(
            output_dir(Path::new("/proj"), &cfg, None),
            Path::new("/proj/build")
        );
        assert_eq!(
            output_dir(Path::new("/proj"), &cfg, Some("elsewhere")),
            Path::new("elsewhere")
        );
    }

    #[test]
    fn full_build_writes_outputs() {
        let tmp = TempDir::new().unwrap();
        let cfg = config("[output]\ncompress = true\n");
        let sink = DiagnosticSink::new();
        let outcome = build_project(&cfg, tmp.path(), false, &sink).unwrap();

        let report = outcome.report.unwrap();
        assert_eq!(report.passes.len(), 10);
        assert!(tmp.path().join("rtl").join("top.v").exists());
        assert!(tmp.path().join("vpr").join("arch.xml").exists());
        assert!(tmp.path().join("syn").join("bram.rules").exists());
        assert!(!sink.has_errors());

        let snapshot = outcome.snapshot.unwrap();
        let reloaded = weft_snapshot::load(&snapshot).unwrap();
        assert_eq!(reloaded, outcome.context);
        assert_eq!(reloaded.summary().channel_width, 20);
    }

    #[test]
    fn dry_run_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out");
        let sink = DiagnosticSink::new();
        let outcome = build_project(&config(""), &out, true, &sink).unwrap();
        assert!(outcome.report.is_none());
        assert!(!out.exists());
        assert!(!outcome.context.is_sealed());
    }

    #[test]
    fn misordered_flow_rejected_before_running() {
        let tmp = TempDir::new().unwrap();
        let cfg = config("[flow]\npasses = [\"arch-xml\"]\n");
        let sink = DiagnosticSink::new();
        let err = build_project(&cfg, tmp.path(), false, &sink).err().unwrap();
        assert!(err.to_string().contains("arch-xml"));
        assert!(!tmp.path().join("vpr").exists());
    }
}
