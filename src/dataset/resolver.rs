//! Dataset Resolver: validates a candidate `(name, path)` pair and produces a
//! descriptor the catalog can store.
//!
//! Checks run in a fixed order: name, kind, existence, readability. The file is
//! only opened to prove it is readable; nothing is copied or moved.

use super::{DatasetDescriptor, DatasetKind, is_valid_identifier};
use crate::error::{DataPulseError, Result};
use std::fs::File;
use std::path::{Component, Path, PathBuf};

/// Resolve a dataset for a catalog rooted at `root`.
///
/// Relative `raw_path`s are taken relative to `root`. An explicit kind always
/// wins over the file extension.
///
/// # Errors
///
/// `InvalidName` for a bad dataset or table name, `UnsupportedKind` for an
/// unknown extension without an explicit kind, `FileNotFound` when the path is
/// not an existing file, `Io` when it cannot be opened.
pub fn resolve(
    root: &Path,
    name: &str,
    raw_path: &Path,
    explicit_kind: Option<DatasetKind>,
    table: Option<&str>,
) -> Result<DatasetDescriptor> {
    if !is_valid_identifier(name) {
        return Err(DataPulseError::InvalidName(name.to_owned()));
    }

    let kind = match explicit_kind {
        Some(kind) => kind,
        None => infer_kind(raw_path)?,
    };

    let table = match table {
        None => None,
        Some(t) if !is_valid_identifier(t) => {
            return Err(DataPulseError::InvalidName(t.to_owned()));
        }
        Some(_) if kind != DatasetKind::Sqlite => {
            return Err(DataPulseError::Other(format!(
                "A table can only be selected for sqlite datasets, '{name}' is {kind}"
            )));
        }
        Some(t) => Some(t.to_owned()),
    };

    let candidate = if raw_path.is_absolute() {
        raw_path.to_path_buf()
    } else {
        root.join(raw_path)
    };
    let resolved = candidate
        .canonicalize()
        .map_err(|_| DataPulseError::FileNotFound(candidate.clone()))?;
    if !resolved.is_file() {
        return Err(DataPulseError::FileNotFound(candidate));
    }
    File::open(&resolved)?;

    let path = storage_path(root, &resolved)?;
    tracing::debug!(dataset = name, path = %path.display(), %kind, "Resolved dataset");

    Ok(DatasetDescriptor {
        name: name.to_owned(),
        path,
        kind,
        table,
    })
}

/// Infer the dataset kind from the path's extension.
pub fn infer_kind(path: &Path) -> Result<DatasetKind> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("");
    DatasetKind::from_extension(ext).ok_or_else(|| {
        DataPulseError::UnsupportedKind(if ext.is_empty() {
            String::new()
        } else {
            format!(".{}", ext.to_lowercase())
        })
    })
}

/// Root-relative path with `/` separators when `resolved` lives under `root`,
/// otherwise the absolute path.
fn storage_path(root: &Path, resolved: &Path) -> Result<PathBuf> {
    let root = root.canonicalize()?;
    let Ok(relative) = resolved.strip_prefix(&root) else {
        return Ok(resolved.to_path_buf());
    };

    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    Ok(PathBuf::from(parts.join("/")))
}
