//! Output path resolution

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Directory a package with `title_id` is extracted into under `base`.
///
/// Appends `title_id` unless `base` already ends in it, so resolving
/// `out/CUSA00001` for `CUSA00001` does not produce `out/CUSA00001/CUSA00001`.
#[must_use]
pub fn output_dir_for(base: &Path, title_id: &str) -> PathBuf {
    if base.file_name().is_some_and(|name| name == title_id) {
        base.to_path_buf()
    } else {
        base.join(title_id)
    }
}

/// Resolve and create the output directory for a package.
///
/// The directory and its parents are created if absent.
///
/// # Errors
/// Returns [`Error::InvalidMetadata`] for an empty title id and
/// [`Error::OutputDirectory`] if creation fails.
pub fn resolve_output_dir(base: &Path, title_id: &str) -> Result<PathBuf> {
    if title_id.is_empty() {
        return Err(Error::InvalidMetadata("empty title id".to_string()));
    }

    let dir = output_dir_for(base, title_id);
    std::fs::create_dir_all(&dir).map_err(|source| Error::OutputDirectory {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}
