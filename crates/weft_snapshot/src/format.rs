//! The snapshot byte layout.
//!
//! ```text
//! +----------------+----------------------+---------------------------+
//! | header length  | header (bincode)     | payload (bincode, maybe   |
//! | u32 LE         | magic, versions,     | gzip-compressed context)  |
//! |                | compressed, checksum |                           |
//! +----------------+----------------------+---------------------------+
//! ```
//!
//! The checksum covers the payload bytes as stored, so corruption is caught
//! before decompression.

use crate::error::SnapshotError;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use weft_arch::ArchitectureContext;
use weft_common::ContentHash;

/// Magic bytes identifying a Weft snapshot.
pub const SNAPSHOT_MAGIC: [u8; 4] = *b"WEFT";

/// Current format version. Increment on breaking changes to the header or
/// to any serialized type.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Header prepended to every snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    /// Must be `b"WEFT"`.
    pub magic: [u8; 4],
    /// Format version.
    pub format_version: u32,
    /// Weft version that wrote the snapshot.
    pub producer_version: String,
    /// Whether the payload is gzip-compressed.
    pub compressed: bool,
    /// Hash of the stored payload bytes.
    pub checksum: ContentHash,
}

fn serialization(e: impl std::fmt::Display) -> SnapshotError {
    SnapshotError::Serialization {
        reason: e.to_string(),
    }
}

/// Encodes a context into snapshot bytes.
pub fn encode(ctx: &ArchitectureContext, compress: bool) -> Result<Vec<u8>, SnapshotError> {
    let raw = bincode::serde::encode_to_vec(ctx, bincode::config::standard())
        .map_err(serialization)?;
    let payload = if compress {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&raw).map_err(serialization)?;
        encoder.finish().map_err(serialization)?
    } else {
        raw
    };

    let header = SnapshotHeader {
        magic: SNAPSHOT_MAGIC,
        format_version: SNAPSHOT_FORMAT_VERSION,
        producer_version: env!("CARGO_PKG_VERSION").to_string(),
        compressed: compress,
        checksum: ContentHash::from_bytes(&payload),
    };
    let header_bytes = bincode::serde::encode_to_vec(&header, bincode::config::standard())
        .map_err(serialization)?;

    let header_len = header_bytes.len() as u32;
    let mut output = Vec::with_capacity(4 + header_bytes.len() + payload.len());
    output.extend_from_slice(&header_len.to_le_bytes());
    output.extend_from_slice(&header_bytes);
    output.extend_from_slice(&payload);
    Ok(output)
}

/// Reads and validates the header, returning it with the payload slice.
pub fn read_header(bytes: &[u8]) -> Result<(SnapshotHeader, &[u8]), SnapshotError> {
    let invalid = |reason: &str| SnapshotError::InvalidHeader {
        reason: reason.to_string(),
    };
    let len_bytes: [u8; 4] = bytes
        .get(..4)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| invalid("file is shorter than the length prefix"))?;
    let header_len = u32::from_le_bytes(len_bytes) as usize;
    let header_bytes = bytes
        .get(4..4 + header_len)
        .ok_or_else(|| invalid("file is shorter than its header"))?;
    let (header, _): (SnapshotHeader, usize) =
        bincode::serde::decode_from_slice(header_bytes, bincode::config::standard())
            .map_err(|e| invalid(&e.to_string()))?;

    if header.magic != SNAPSHOT_MAGIC {
        return Err(invalid("missing WEFT magic bytes"));
    }
    if header.format_version != SNAPSHOT_FORMAT_VERSION {
        return Err(SnapshotError::VersionMismatch {
            expected: SNAPSHOT_FORMAT_VERSION,
            actual: header.format_version,
            producer: header.producer_version,
        });
    }
    Ok((header, &bytes[4 + header_len..]))
}

/// Decodes snapshot bytes into a verified context.
pub fn decode(bytes: &[u8]) -> Result<ArchitectureContext, SnapshotError> {
    let (header, payload) = read_header(bytes)?;
    let actual = ContentHash::from_bytes(payload);
    if actual != header.checksum {
        return Err(SnapshotError::ChecksumMismatch {
            expected: header.checksum.to_string(),
            actual: actual.to_string(),
        });
    }

    let inflated;
    let raw = if header.compressed {
        let mut decoder = GzDecoder::new(payload);
        let mut buf = Vec::new();
        decoder.read_to_end(&mut buf).map_err(serialization)?;
        inflated = buf;
        &inflated[..]
    } else {
        payload
    };

    let (ctx, consumed): (ArchitectureContext, usize) =
        bincode::serde::decode_from_slice(raw, bincode::config::standard())
            .map_err(serialization)?;
    if consumed != raw.len() {
        return Err(SnapshotError::Serialization {
            reason: format!("{} trailing bytes after the context", raw.len() - consumed),
        });
    }
    ctx.verify()?;
    Ok(ctx)
}
