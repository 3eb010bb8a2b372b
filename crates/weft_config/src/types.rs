//! Configuration types deserialized from `weft.toml`.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::fmt;

/// Pass names accepted in `[flow] passes`, in their reference order.
pub const STANDARD_PASSES: &[&str] = &[
    "routing-box",
    "switch",
    "connection",
    "rtl",
    "config",
    "arch-xml",
    "physical",
    "zero-memory-we",
    "zero-block-pins",
    "synth",
];

/// The top-level configuration parsed from `weft.toml`.
#[derive(Debug, Deserialize)]
pub struct WeftConfig {
    /// Project metadata.
    pub project: ProjectMeta,
    /// Which fabric to build and its grid size.
    #[serde(default)]
    pub fabric: FabricConfig,
    /// Grid placement behaviour.
    #[serde(default)]
    pub placement: PlacementConfig,
    /// Connection-box FC values.
    #[serde(default)]
    pub routing: RoutingConfig,
    /// Ordered pass list.
    #[serde(default)]
    pub flow: FlowConfig,
    /// Output locations.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Project metadata.
#[derive(Debug, Deserialize)]
pub struct ProjectMeta {
    /// The project name, also used as the architecture context name.
    pub name: String,
    /// A brief description.
    #[serde(default)]
    pub description: String,
}

/// The fabric preset and grid extent.
#[derive(Debug, Deserialize)]
pub struct FabricConfig {
    /// Name of the preset fabric builder.
    #[serde(default = "default_preset")]
    pub preset: String,
    /// Grid width in cells.
    #[serde(default = "default_grid_side")]
    pub width: u32,
    /// Grid height in cells.
    #[serde(default = "default_grid_side")]
    pub height: u32,
}

impl Default for FabricConfig {
    fn default() -> Self {
        Self {
            preset: default_preset(),
            width: default_grid_side(),
            height: default_grid_side(),
        }
    }
}

fn default_preset() -> String {
    "tiny".to_string()
}

fn default_grid_side() -> u32 {
    8
}

/// What happens when a tile is placed onto an occupied cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Fail with a placement conflict.
    #[default]
    Reject,
    /// Evict the previous occupant.
    Overwrite,
}

/// Grid placement behaviour.
#[derive(Debug, Default, Deserialize)]
pub struct PlacementConfig {
    /// Conflict policy for occupied cells.
    #[serde(default)]
    pub conflict: ConflictPolicy,
}

/// An FC value: either a fraction of the channel width or an absolute track count.
///
/// In TOML, integers are track counts and floats are fractions (`0` means no
/// tracks, `0.0` means a zero fraction, which is equivalent).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FcValue {
    /// Fraction of the channel width in `[0, 1]`.
    Fraction(f64),
    /// Absolute number of tracks.
    Tracks(u32),
}

impl<'de> Deserialize<'de> for FcValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FcVisitor;

        impl<'de> Visitor<'de> for FcVisitor {
            type Value = FcValue;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a track count (integer) or a fraction (float)")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                u32::try_from(v)
                    .map(FcValue::Tracks)
                    .map_err(|_| E::custom(format!("track count {v} out of range")))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                u32::try_from(v)
                    .map(FcValue::Tracks)
                    .map_err(|_| E::custom(format!("track count {v} out of range")))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                Ok(FcValue::Fraction(v))
            }
        }

        deserializer.deserialize_any(FcVisitor)
    }
}

/// Per-block FC overrides.
#[derive(Debug, Default, Deserialize)]
pub struct BlockFcConfig {
    /// FC for input ports of this block.
    #[serde(default)]
    pub fc_in: Option<FcValue>,
    /// FC for output ports of this block.
    #[serde(default)]
    pub fc_out: Option<FcValue>,
    /// FC for individual ports by name.
    #[serde(default)]
    pub ports: BTreeMap<String, FcValue>,
}

/// Connection-box FC defaults and overrides.
#[derive(Debug, Deserialize)]
pub struct RoutingConfig {
    /// Default FC for input ports.
    #[serde(default = "default_fc_in")]
    pub fc_in: FcValue,
    /// Default FC for output ports.
    #[serde(default = "default_fc_out")]
    pub fc_out: FcValue,
    /// Overrides keyed by block name.
    #[serde(default)]
    pub blocks: BTreeMap<String, BlockFcConfig>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            fc_in: default_fc_in(),
            fc_out: default_fc_out(),
            blocks: BTreeMap::new(),
        }
    }
}

fn default_fc_in() -> FcValue {
    FcValue::Fraction(0.25)
}

fn default_fc_out() -> FcValue {
    FcValue::Fraction(0.5)
}

/// The ordered pass list.
#[derive(Debug, Deserialize)]
pub struct FlowConfig {
    /// Pass names, run in this order.
    #[serde(default = "default_passes")]
    pub passes: Vec<String>,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            passes: default_passes(),
        }
    }
}

fn default_passes() -> Vec<String> {
    STANDARD_PASSES.iter().map(|s| s.to_string()).collect()
}

/// Output locations, relative to the output directory.
#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    /// Root output directory.
    #[serde(default = "default_output_dir")]
    pub dir: String,
    /// Subdirectory for structural Verilog.
    #[serde(default = "default_rtl_dir")]
    pub rtl: String,
    /// Subdirectory for the architecture XML.
    #[serde(default = "default_arch_dir")]
    pub arch: String,
    /// Subdirectory for synthesis resources.
    #[serde(default = "default_synth_dir")]
    pub synth: String,
    /// Snapshot file name.
    #[serde(default = "default_snapshot")]
    pub snapshot: String,
    /// Whether to gzip the snapshot payload.
    #[serde(default)]
    pub compress: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            rtl: default_rtl_dir(),
            arch: default_arch_dir(),
            synth: default_synth_dir(),
            snapshot: default_snapshot(),
            compress: false,
        }
    }
}

fn default_output_dir() -> String {
    "build".to_string()
}

fn default_rtl_dir() -> String {
    "rtl".to_string()
}

fn default_arch_dir() -> String {
    "vpr".to_string()
}

fn default_synth_dir() -> String {
    "syn".to_string()
}

fn default_snapshot() -> String {
    "ctx.snapshot".to_string()
}
