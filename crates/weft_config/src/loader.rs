//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::{FcValue, WeftConfig, STANDARD_PASSES};
use std::path::Path;

/// The configuration file name looked up in a project directory.
pub const CONFIG_FILE_NAME: &str = "weft.toml";

/// Loads and validates a configuration file.
///
/// `path` may name the file itself or a directory containing `weft.toml`.
pub fn load_config(path: &Path) -> Result<WeftConfig, ConfigError> {
    let config_path = if path.is_dir() {
        path.join(CONFIG_FILE_NAME)
    } else {
        path.to_path_buf()
    };
    let content = std::fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
        path: config_path.clone(),
        source,
    })?;
    load_config_from_str(&content)
}

/// Parses and validates a `weft.toml` configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<WeftConfig, ConfigError> {
    let config: WeftConfig =
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &WeftConfig) -> Result<(), ConfigError> {
    if config.project.name.is_empty() {
        return Err(ConfigError::MissingField("project.name".to_string()));
    }
    if config.fabric.width == 0 || config.fabric.height == 0 {
        return Err(ConfigError::invalid(
            "fabric",
            format!(
                "extent {}x{} must be positive in both dimensions",
                config.fabric.width, config.fabric.height
            ),
        ));
    }
    validate_fc("routing.fc_in", config.routing.fc_in)?;
    validate_fc("routing.fc_out", config.routing.fc_out)?;
    for (block, overrides) in &config.routing.blocks {
        if let Some(fc) = overrides.fc_in {
            validate_fc(&format!("routing.blocks.{block}.fc_in"), fc)?;
        }
        if let Some(fc) = overrides.fc_out {
            validate_fc(&format!("routing.blocks.{block}.fc_out"), fc)?;
        }
        for (port, fc) in &overrides.ports {
            validate_fc(&format!("routing.blocks.{block}.ports.{port}"), *fc)?;
        }
    }
    if config.flow.passes.is_empty() {
        return Err(ConfigError::MissingField("flow.passes".to_string()));
    }
    for pass in &config.flow.passes {
        if !STANDARD_PASSES.contains(&pass.as_str()) {
            return Err(ConfigError::UnknownPass(pass.clone()));
        }
    }
    if config.output.snapshot.is_empty() {
        return Err(ConfigError::MissingField("output.snapshot".to_string()));
    }
    Ok(())
}

fn validate_fc(field: &str, fc: FcValue) -> Result<(), ConfigError> {
    match fc {
        FcValue::Fraction(f) if !(0.0..=1.0).contains(&f) => Err(ConfigError::invalid(
            field,
            format!("{f} is not a fraction in [0, 1]"),
        )),
        _ => Ok(()),
    }
}
