//! Writer passes: structural Verilog, architecture XML and synthesis
//! resources.
//!
//! Writers only read the architecture. Each output file is rendered through
//! a buffered writer that is flushed explicitly, so a failed write surfaces
//! as [`PassError::Io`] naming the file.

mod arch_xml;
mod rtl;
mod synth;

pub use arch_xml::GenerateArchXml;
pub use rtl::GenerateRtl;
pub use synth::GenerateSynthResources;

use crate::error::PassError;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use weft_arch::{Artifact, ArtifactKind};

pub(crate) fn create_dir(dir: &Path) -> Result<(), PassError> {
    std::fs::create_dir_all(dir).map_err(|source| PassError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

pub(crate) fn emit_file(
    dir: &Path,
    name: &str,
    kind: ArtifactKind,
    render: impl FnOnce(&mut dyn Write) -> io::Result<()>,
) -> Result<Artifact, PassError> {
    let path = dir.join(name);
    let io_err = |source| PassError::Io {
        path: path.clone(),
        source,
    };
    let file = File::create(&path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    render(&mut writer).map_err(io_err)?;
    writer.flush().map_err(io_err)?;
    log::debug!("wrote {}", path.display());
    Ok(Artifact { kind, path })
}

/// Formats a bit range suffix: empty for a whole signal, `[i]` or `[hi:lo]`.
pub(crate) fn bit_range(offset: u32, width: u32, full_width: u32) -> String {
    if offset == 0 && width == full_width {
        String::new()
    } else if width == 1 {
        format!("[{offset}]")
    } else {
        format!("[{}:{offset}]", offset + width - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges() {
        assert_eq!(bit_range(0, 4, 4), "");
        assert_eq!(bit_range(2, 1, 4), "[2]");
        assert_eq!(bit_range(0, 3, 4), "[2:0]");
    }

    #[test]
    fn emit_file_reports_path_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = emit_file(&missing, "x.v", ArtifactKind::Rtl, |_| Ok(())).unwrap_err();
        match err {
            PassError::Io { path, .. } => assert_eq!(path, missing.join("x.v")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn emit_file_writes_content() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = emit_file(dir.path(), "a.txt", ArtifactKind::SynthResources, |w| {
            writeln!(w, "hello")
        })
        .unwrap();
        assert_eq!(std::fs::read_to_string(&artifact.path).unwrap(), "hello\n");
        assert_eq!(artifact.kind, ArtifactKind::SynthResources);
    }
}
