//! Errors raised while reading `weft.toml`.

use std::path::PathBuf;

/// Why a project configuration could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Read {
        /// The file that was opened.
        path: PathBuf,
        /// The underlying I/O failure.
        source: std::io::Error,
    },

    /// The content is not valid TOML or does not match the schema.
    #[error("malformed configuration: {0}")]
    Parse(String),

    /// A required field is absent or empty.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// A field is present but its value is out of range.
    #[error("invalid value for {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending field, e.g. `routing.fc_in`.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// `[flow] passes` names a pass Weft does not provide.
    #[error("unknown pass '{0}'")]
    UnknownPass(String),
}

impl ConfigError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
