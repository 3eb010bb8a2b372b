//! Weft CLI: builds FPGA fabric descriptions and inspects snapshots.
//!
//! `weft build` composes the preset fabric named in `weft.toml`, runs the
//! configured pass list and writes the snapshot; `weft inspect` prints a
//! summary of a snapshot written earlier.

#![warn(missing_docs)]

mod build;
mod inspect;
mod preset;
mod project;

use std::io::IsTerminal;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

/// Weft, an FPGA fabric architecture builder.
#[derive(Parser, Debug)]
#[command(name = "weft", version, about = "Weft FPGA fabric builder")]
pub struct Cli {
    /// Print errors only.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log every pass at debug level.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// When to color diagnostics.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a `weft.toml` file or the directory holding it.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// What to do.
    #[command(subcommand)]
    pub command: Command,
}

/// Weft subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the configured fabric and run its flow.
    Build(BuildArgs),
    /// Print a summary of a snapshot.
    Inspect(InspectArgs),
}

/// Arguments for the `weft build` subcommand.
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Output directory, overriding `[output] dir`.
    #[arg(long)]
    pub out_dir: Option<String>,

    /// Check the pass ordering and stop before running anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `weft inspect` subcommand.
#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// The snapshot file.
    pub snapshot: String,

    /// Print the summary as JSON.
    #[arg(long)]
    pub json: bool,
}

/// The `--color` setting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Color when stderr is a terminal.
    Auto,
    /// Always color.
    Always,
    /// Never color.
    Never,
}

/// Flags shared by every subcommand, resolved once in `main`.
pub struct GlobalArgs {
    /// `--quiet` was given.
    pub quiet: bool,
    /// `--verbose` was given.
    pub verbose: bool,
    /// Resolved color decision.
    pub color: bool,
    /// Optional path to a config file or directory.
    pub config: Option<String>,
}

fn init_logging(global: &GlobalArgs) {
    let level = if global.verbose {
        "debug"
    } else if global.quiet {
        "error"
    } else {
        "warn"
    };
    let env = env_logger::Env::default().default_filter_or(level);
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .try_init();
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => std::io::stderr().is_terminal(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
    };
    init_logging(&global);

    let result = match cli.command {
        Command::Build(ref args) => build::run(args, &global),
        Command::Inspect(ref args) => inspect::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_build_default() {
        let cli = Cli::parse_from(["weft", "build"]);
        match cli.command {
            Command::Build(ref args) => {
                assert!(args.out_dir.is_none());
                assert!(!args.dry_run);
            }
            _ => panic!("expected Build command"),
        }
        assert!(cli.config.is_none());
        assert_eq!(cli.color, ColorChoice::Auto);
    }

    #[test]
    fn parse_build_with_args() {
        let cli = Cli::parse_from([
            "weft",
            "build",
            "--config",
            "fabrics/tiny/weft.toml",
            "--out-dir",
            "out",
            "--dry-run",
        ]);
        assert_eq!(cli.config.as_deref(), Some("fabrics/tiny/weft.toml"));
        match cli.command {
            Command::Build(ref args) => {
                assert_eq!(args.out_dir.as_deref(), Some("out"));
                assert!(args.dry_run);
            }
            _ => panic!("expected Build command"),
        }
    }

    #[test]
    fn parse_inspect() {
        let cli = Cli::parse_from(["weft", "inspect", "build/ctx.snapshot", "--json"]);
        match cli.command {
            Command::Inspect(ref args) => {
                assert_eq!(args.snapshot, "build/ctx.snapshot");
                assert!(args.json);
            }
            _ => panic!("expected Inspect command"),
        }
    }

    #[test]
    fn parse_inspect_requires_path() {
        assert!(Cli::try_parse_from(["weft", "inspect"]).is_err());
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from(["weft", "-q", "--color", "never", "build"]);
        assert!(cli.quiet);
        assert!(!cli.verbose);
        assert_eq!(cli.color, ColorChoice::Never);
    }

    #[test]
    fn parse_verbose_after_subcommand() {
        let cli = Cli::parse_from(["weft", "build", "-v"]);
        assert!(cli.verbose);
    }
}
