use crate::error::EtlError;
use anyhow::{Context, Result};
use glob::glob;
use std::path::{Path, PathBuf};

/// Collect the absolute path of every `*.json` file under `root`,
/// recursively, in walk order. Content is not inspected; malformed files
/// surface later at parse time.
pub fn find_json_files(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(EtlError::MissingRoot(root.to_path_buf()).into());
    }

    let pattern = format!("{}/**/*.json", root.display());
    let mut files = Vec::new();
    for entry in glob(&pattern).context("invalid glob pattern for data root")? {
        let path = entry.context("failed to read directory entry")?;
        if !path.is_file() {
            continue;
        }
        let abs = path
            .canonicalize()
            .with_context(|| format!("failed to resolve {}", path.display()))?;
        files.push(abs);
    }
    Ok(files)
}
