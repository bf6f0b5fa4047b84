//! Commands over one project root.
//!
//! A [`Workspace`] ties a project root to its catalog store, query engine and
//! settings. Every command loads the catalog fresh, so separate invocations
//! only share state through the store.

use crate::catalog::{Catalog, CatalogStore, FsCatalogStore};
use crate::config::Settings;
use crate::dataset::{self, DatasetDescriptor, DatasetKind};
use crate::error::{DataPulseError, Result};
use crate::notebook::{self, NotebookOptions};
use crate::query::{self, PolarsEngine, QueryEngine, ResultGrid};
use crate::utils::{normalize_lexically, relative_path};
use std::path::{Path, PathBuf};
use tracing::info;

pub struct Workspace<S = FsCatalogStore, E = PolarsEngine> {
    root: PathBuf,
    store: S,
    engine: E,
    settings: Settings,
}

impl Workspace {
    /// Open the project at `root` with the on-disk catalog and the Polars engine.
    pub fn open(root: &Path) -> Result<Self> {
        let root = root
            .canonicalize()
            .map_err(|_| DataPulseError::FileNotFound(root.to_path_buf()))?;
        let settings = Settings::load(&root)?;
        let engine = PolarsEngine::new(settings.csv_infer_schema_length);
        Ok(Self::new(root.clone(), FsCatalogStore::new(root), engine, settings))
    }
}

impl<S: CatalogStore, E: QueryEngine> Workspace<S, E> {
    pub fn new(root: PathBuf, store: S, engine: E, settings: Settings) -> Self {
        Self {
            root,
            store,
            engine,
            settings,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Where an output file goes: relative paths are taken from the project
    /// root, with `.` and `..` resolved lexically.
    pub fn output_path(&self, path: &Path) -> PathBuf {
        normalize_lexically(&self.root.join(path))
    }

    pub fn catalog(&self) -> Result<Catalog> {
        self.store.load()
    }

    /// Register a dataset. Relative paths are taken from the project root.
    ///
    /// # Errors
    ///
    /// Resolution errors, or `DatasetExists` when `name` is taken and
    /// `overwrite` is false.
    pub fn add(
        &self,
        name: &str,
        path: &Path,
        kind: Option<DatasetKind>,
        table: Option<&str>,
        overwrite: bool,
    ) -> Result<DatasetDescriptor> {
        let catalog = self.store.load()?;
        let descriptor = dataset::resolve(&self.root, name, path, kind, table)?;

        let replaced = catalog.contains(name);
        let updated = if overwrite {
            catalog.upsert(descriptor.clone())
        } else {
            catalog.insert_new(descriptor.clone())?
        };
        self.store.save(&updated)?;

        info!(
            dataset = name,
            path = %descriptor.path.display(),
            kind = %descriptor.kind,
            replaced,
            "Registered dataset"
        );
        Ok(descriptor)
    }

    pub fn remove(&self, name: &str) -> Result<DatasetDescriptor> {
        let catalog = self.store.load()?;
        let descriptor = catalog
            .get(name)
            .cloned()
            .ok_or_else(|| DataPulseError::UnknownDataset(name.to_owned()))?;
        self.store.save(&catalog.remove(name)?)?;

        info!(dataset = name, "Removed dataset");
        Ok(descriptor)
    }

    pub fn list(&self) -> Result<Vec<DatasetDescriptor>> {
        Ok(self.store.load()?.iter().cloned().collect())
    }

    /// First rows of a dataset; `limit` defaults to the configured head limit.
    pub fn head(&self, name: &str, limit: Option<usize>) -> Result<ResultGrid> {
        let catalog = self.store.load()?;
        let limit = limit.unwrap_or(self.settings.head_limit);
        query::head(&self.engine, &catalog, &self.root, name, limit)
    }

    pub fn sql(&self, sql: &str) -> Result<ResultGrid> {
        let catalog = self.store.load()?;
        let bindings = query::bind_all(&catalog, &self.root);
        let grid = query::execute(&self.engine, sql, &bindings)?;
        info!(rows = grid.height(), columns = grid.width(), "Query finished");
        Ok(grid)
    }

    /// Generate and write a notebook for `sql`, returning where it was written.
    ///
    /// `out` defaults to the configured notebook path; relative paths are taken
    /// from the project root. The notebook locates datasets relative to its own
    /// directory, so the project can be moved as a whole.
    pub fn notebook(
        &self,
        sql: &str,
        out: Option<&Path>,
        options: NotebookOptions,
        overwrite: bool,
    ) -> Result<PathBuf> {
        let out = self.output_path(out.unwrap_or(self.settings.notebook_path.as_path()));
        if out.exists() && !overwrite {
            return Err(DataPulseError::PathExists(out));
        }

        // Nothing touches the filesystem until the document is generated
        let notebook_dir = out
            .parent()
            .map_or_else(|| self.root.clone(), Path::to_path_buf);
        let data_root = relative_path(&notebook_dir, &self.root);

        let options = NotebookOptions {
            data_root: data_root.to_string_lossy().into_owned(),
            csv_infer_schema_length: self.settings.csv_infer_schema_length,
            ..options
        };
        let catalog = self.store.load()?;
        let doc = notebook::generate(sql, &catalog, &options)?;
        notebook::write_notebook(&doc, &out, overwrite)?;

        info!(path = %out.display(), cells = doc.cells.len(), "Generated notebook");
        Ok(out)
    }
}
