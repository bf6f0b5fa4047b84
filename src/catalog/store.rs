//! Catalog persistence.
//!
//! The on-disk document is `<root>/.datapulse/catalog.json`, a JSON object
//! mapping each dataset name to `{ "path": ..., "kind": ... }` (plus `"table"`
//! for SQLite datasets that pin one). Keys are written sorted and pretty-printed
//! so the file stays hand-editable.

use super::Catalog;
use crate::dataset::{DatasetDescriptor, DatasetKind, is_valid_identifier};
use crate::error::{DataPulseError, Result};
use crate::utils::write_atomic;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Directory under the project root holding datapulse state.
pub const CATALOG_DIR: &str = ".datapulse";

/// Catalog document file name inside [`CATALOG_DIR`].
pub const CATALOG_FILE: &str = "catalog.json";

/// Load/save pair for a single catalog document.
///
/// Commands load, compute, then save; no implementation keeps state that
/// outlives the document it persists.
pub trait CatalogStore {
    /// Read the catalog, returning an empty one when nothing was saved yet.
    fn load(&self) -> Result<Catalog>;

    /// Replace the persisted catalog with `catalog`.
    fn save(&self, catalog: &Catalog) -> Result<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredDataset {
    path: PathBuf,
    #[serde(alias = "format")]
    kind: DatasetKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    table: Option<String>,
}

fn encode(catalog: &Catalog) -> Result<String> {
    let document: BTreeMap<&str, StoredDataset> = catalog
        .iter()
        .map(|d| {
            (
                d.name.as_str(),
                StoredDataset {
                    path: d.path.clone(),
                    kind: d.kind,
                    table: d.table.clone(),
                },
            )
        })
        .collect();
    let mut json = serde_json::to_string_pretty(&document)?;
    json.push('\n');
    Ok(json)
}

fn decode(origin: &Path, json: &str) -> Result<Catalog> {
    let corrupt = |message: String| DataPulseError::CatalogCorrupt {
        path: origin.to_path_buf(),
        message,
    };

    let document: BTreeMap<String, StoredDataset> =
        serde_json::from_str(json).map_err(|e| corrupt(e.to_string()))?;

    document
        .into_iter()
        .map(|(name, stored)| {
            if !is_valid_identifier(&name) {
                return Err(corrupt(format!("invalid dataset name '{name}'")));
            }
            if let Some(table) = &stored.table
                && !is_valid_identifier(table)
            {
                return Err(corrupt(format!(
                    "invalid table name '{table}' for dataset '{name}'"
                )));
            }
            Ok(DatasetDescriptor {
                name,
                path: stored.path,
                kind: stored.kind,
                table: stored.table,
            })
        })
        .collect()
}

/// Catalog stored as a JSON file under a project root.
#[derive(Debug, Clone)]
pub struct FsCatalogStore {
    root: PathBuf,
}

impl FsCatalogStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full path of the catalog document.
    pub fn path(&self) -> PathBuf {
        self.root.join(CATALOG_DIR).join(CATALOG_FILE)
    }
}

impl CatalogStore for FsCatalogStore {
    fn load(&self) -> Result<Catalog> {
        let path = self.path();
        let json = match std::fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No catalog yet, starting empty");
                return Ok(Catalog::new());
            }
            Err(e) => return Err(io_error(e, "Failed to read catalog", &path)),
        };

        let catalog = decode(&path, &json)?;
        tracing::debug!(path = %path.display(), datasets = catalog.len(), "Loaded catalog");
        Ok(catalog)
    }

    /// Write-temp-then-rename so an interrupted save leaves the previous
    /// document intact.
    fn save(&self, catalog: &Catalog) -> Result<()> {
        let path = self.path();
        let dir = self.root.join(CATALOG_DIR);
        std::fs::create_dir_all(&dir)
            .map_err(|e| io_error(e, "Failed to create catalog directory", &dir))?;

        let json = encode(catalog)?;
        write_atomic(&path, json.as_bytes())?;

        tracing::debug!(path = %path.display(), datasets = catalog.len(), "Saved catalog");
        Ok(())
    }
}

/// Keep the error kind but name the path in the message.
fn io_error(err: std::io::Error, action: &str, path: &Path) -> DataPulseError {
    DataPulseError::Io(std::io::Error::new(
        err.kind(),
        format!("{action} {}: {err}", path.display()),
    ))
}

/// In-memory catalog document, for exercising commands without a filesystem.
///
/// The catalog is kept in its serialized form so loads and saves go through the
/// same encoding as [`FsCatalogStore`].
#[derive(Debug, Default)]
pub struct MemoryCatalogStore {
    document: RwLock<Option<String>>,
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing (possibly malformed) document.
    pub fn with_document(json: impl Into<String>) -> Self {
        Self {
            document: RwLock::new(Some(json.into())),
        }
    }

    /// The currently persisted document, if any.
    pub fn document(&self) -> Option<String> {
        self.document.read().ok().and_then(|d| d.clone())
    }
}

impl CatalogStore for MemoryCatalogStore {
    fn load(&self) -> Result<Catalog> {
        let document = self
            .document
            .read()
            .map_err(|e| DataPulseError::Other(format!("Lock poisoned: {e}")))?;
        match document.as_deref() {
            Some(json) => decode(Path::new("<memory>"), json),
            None => Ok(Catalog::new()),
        }
    }

    fn save(&self, catalog: &Catalog) -> Result<()> {
        let json = encode(catalog)?;
        let mut document = self
            .document
            .write()
            .map_err(|e| DataPulseError::Other(format!("Lock poisoned: {e}")))?;
        *document = Some(json);
        Ok(())
    }
}
