//! Error types for passes and flows.

use std::path::PathBuf;
use weft_arch::{ArchError, Facet};
use weft_common::InternalError;

/// Errors a single pass can fail with.
#[derive(Debug, thiserror::Error)]
pub enum PassError {
    /// A facet the pass requires has not been produced yet.
    #[error("pass '{pass}' requires '{facet}', which no earlier pass has produced")]
    UnmetPassPrerequisite {
        /// The pass name.
        pass: String,
        /// The missing facet.
        facet: Facet,
    },

    /// A facet the pass forbids or produces is already complete.
    #[error("pass '{pass}' cannot run after '{facet}' is complete")]
    PassOrderViolation {
        /// The pass name.
        pass: String,
        /// The offending facet.
        facet: Facet,
    },

    /// The architecture lacks something the pass needs.
    #[error("pass '{pass}': {message}")]
    Precondition {
        /// The pass name.
        pass: String,
        /// What is missing.
        message: String,
    },

    /// A mutation of the architecture was rejected.
    #[error(transparent)]
    Arch(#[from] ArchError),

    /// An output file could not be written.
    #[error("cannot write '{}': {source}", path.display())]
    Io {
        /// The file being written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The architecture was in a state the pass's prerequisites rule out.
    #[error(transparent)]
    Internal(#[from] InternalError),
}

/// A pass failure, located within its flow.
#[derive(Debug, thiserror::Error)]
#[error("pass #{index} '{pass}' failed: {source}")]
pub struct FlowError {
    /// Position of the pass in the flow, from 0.
    pub index: usize,
    /// The pass name.
    pub pass: String,
    /// What went wrong.
    pub source: PassError,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn unmet_prerequisite_display() {
        let err = PassError::UnmetPassPrerequisite {
            pass: "arch-xml".to_string(),
            facet: Facet::Connections,
        };
        assert_eq!(
            format!("{err}"),
            "pass 'arch-xml' requires 'connections', which no earlier pass has produced"
        );
    }

    #[test]
    fn flow_error_chains_source() {
        let err = FlowError {
            index: 2,
            pass: "connection".to_string(),
            source: PassError::Precondition {
                pass: "connection".to_string(),
                message: "boom".to_string(),
            },
        };
        assert!(format!("{err}").starts_with("pass #2 'connection' failed"));
        assert!(err.source().is_some());
    }

    #[test]
    fn io_error_names_path() {
        let err = PassError::Io {
            path: PathBuf::from("/out/arch.xml"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(format!("{err}").contains("/out/arch.xml"));
    }
}
