use crate::error::{NormalizeError, Result};
use serde_json::Value;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Replace `path` with `doc` in one rename: 2-space indentation, UTF-8,
/// non-ASCII left unescaped. The previous content stays intact if anything
/// fails before the rename.
pub fn write_document(path: &Path, doc: &Value) -> Result<()> {
    let io_err = |source: std::io::Error| NormalizeError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let tmp = NamedTempFile::new_in(dir).map_err(io_err)?;

    // Keep the original file mode; the temp file is created 0600.
    if let Ok(meta) = std::fs::metadata(path) {
        tmp.as_file()
            .set_permissions(meta.permissions())
            .map_err(io_err)?;
    }

    {
        let mut writer = BufWriter::new(tmp.as_file());
        serde_json::to_writer_pretty(&mut writer, doc)
            .map_err(|e| io_err(std::io::Error::from(e)))?;
        writer.flush().map_err(io_err)?;
    }

    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}
