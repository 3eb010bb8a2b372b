//! Binary snapshots of architecture contexts.
//!
//! A snapshot captures a whole [`ArchitectureContext`]: registries, blocks
//! with their connections and pack patterns, placements, tunnels and
//! everything the flow passes attached. [`save`] writes one atomically;
//! [`load`] validates the header and checksum and then
//! [verifies](ArchitectureContext::verify) that every handle resolves.

#![warn(missing_docs)]

pub mod error;
pub mod format;

pub use error::SnapshotError;
pub use format::{
    decode, encode, read_header, SnapshotHeader, SNAPSHOT_FORMAT_VERSION, SNAPSHOT_MAGIC,
};

use std::path::{Path, PathBuf};
use weft_arch::ArchitectureContext;

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> SnapshotError + '_ {
    move |source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Writes a snapshot of `ctx` to `path`.
///
/// The bytes go to a temporary sibling file first, which is then renamed
/// over `path`, so readers never see a partial snapshot.
pub fn save(ctx: &ArchitectureContext, path: &Path, compress: bool) -> Result<(), SnapshotError> {
    let bytes = encode(ctx, compress)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_error(parent))?;
    }
    let temp = temp_sibling(path);
    std::fs::write(&temp, &bytes).map_err(io_error(&temp))?;
    if let Err(source) = std::fs::rename(&temp, path) {
        let _ = std::fs::remove_file(&temp);
        return Err(SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        });
    }
    log::info!("saved snapshot {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

/// Reads and validates a snapshot from `path`.
pub fn load(path: &Path) -> Result<ArchitectureContext, SnapshotError> {
    let bytes = std::fs::read(path).map_err(io_error(path))?;
    let ctx = decode(&bytes)?;
    log::debug!("loaded snapshot {} ('{}')", path.display(), ctx.name());
    Ok(ctx)
}
