//! Error types for snapshot encoding and file access.

use std::path::PathBuf;
use weft_arch::IntegrityError;

/// Errors that can occur while saving or loading a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// Reading or writing the snapshot file failed.
    #[error("snapshot I/O error at {}: {source}", path.display())]
    Io {
        /// The file being accessed.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The bytes do not start with a valid snapshot header.
    #[error("invalid snapshot header: {reason}")]
    InvalidHeader {
        /// What is wrong with the header.
        reason: String,
    },

    /// The snapshot was written in a different format version.
    #[error("snapshot format version mismatch: expected {expected}, got {actual} (written by weft {producer})")]
    VersionMismatch {
        /// The version this build reads.
        expected: u32,
        /// The version found in the file.
        actual: u32,
        /// The Weft version that wrote the file.
        producer: String,
    },

    /// The payload does not hash to the checksum in the header.
    #[error("snapshot checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// The checksum stored in the header.
        expected: String,
        /// The checksum of the payload as read.
        actual: String,
    },

    /// Encoding or decoding the context failed.
    #[error("snapshot serialization error: {reason}")]
    Serialization {
        /// Description of the failure.
        reason: String,
    },

    /// The decoded context has dangling references.
    #[error(transparent)]
    Integrity(#[from] IntegrityError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_display_names_path() {
        let err = SnapshotError::Io {
            path: PathBuf::from("build/ctx.snapshot"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert!(err.to_string().contains("build/ctx.snapshot"));
    }

    #[test]
    fn version_mismatch_display() {
        let err = SnapshotError::VersionMismatch {
            expected: 2,
            actual: 1,
            producer: "0.0.9".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("expected 2"));
        assert!(msg.contains("got 1"));
        assert!(msg.contains("0.0.9"));
    }

    #[test]
    fn checksum_mismatch_display() {
        let err = SnapshotError::ChecksumMismatch {
            expected: "aabb".to_string(),
            actual: "ccdd".to_string(),
        };
        assert!(err.to_string().contains("aabb"));
    }
}
