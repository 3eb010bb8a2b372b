//! Parsing and validation of `weft.toml` build configuration files.
//!
//! This crate reads the configuration file and produces a strongly-typed
//! [`WeftConfig`]: which fabric preset to build and how large, the grid
//! conflict policy, connection-box FC values, the ordered pass list, and
//! where the flow writes its outputs.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE_NAME};
pub use types::*;
