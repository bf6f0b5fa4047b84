//! Query Binder: exposes cataloged datasets to the execution engine.
//!
//! Binding is a pure mapping from descriptors to [`RelationBinding`]s. The
//! binder parses the SQL first so a reference to an unbound relation fails with
//! [`DataPulseError::UnknownRelation`] before anything is handed to the engine.
//! When the SQL cannot be parsed the engine receives every binding and reports
//! its own diagnostics.
//!
//! Result order is whatever the engine produces. A query without `ORDER BY` is
//! not guaranteed to return rows in the same order twice.

pub mod engine;
pub mod grid;
pub mod relations;
pub mod sqlite;

pub use engine::{PolarsEngine, QueryEngine};
pub use grid::{ColumnInfo, ResultGrid};
pub use relations::referenced_relations;

use crate::catalog::Catalog;
use crate::dataset::{DatasetDescriptor, DatasetKind};
use crate::error::{DataPulseError, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// How the engine should expose one file as a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationBinding {
    /// Relation name, identical to the dataset name
    pub name: String,
    /// Absolute path to the backing file
    pub source: PathBuf,
    pub kind: DatasetKind,
    pub table: Option<String>,
}

impl RelationBinding {
    pub fn from_descriptor(descriptor: &DatasetDescriptor, root: &Path) -> Self {
        Self {
            name: descriptor.name.clone(),
            source: descriptor.source_path(root),
            kind: descriptor.kind,
            table: descriptor.table.clone(),
        }
    }
}

/// Relation bindings keyed by relation name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationBindings {
    relations: BTreeMap<String, RelationBinding>,
}

impl RelationBindings {
    pub fn get(&self, name: &str) -> Option<&RelationBinding> {
        self.relations.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.relations.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RelationBinding> {
        self.relations.values()
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    /// Only the bindings whose names appear in `names`.
    #[must_use]
    pub fn subset<S: AsRef<str>>(&self, names: &[S]) -> Self {
        names
            .iter()
            .filter_map(|n| self.get(n.as_ref()).cloned())
            .collect()
    }
}

impl FromIterator<RelationBinding> for RelationBindings {
    fn from_iter<I: IntoIterator<Item = RelationBinding>>(iter: I) -> Self {
        Self {
            relations: iter.into_iter().map(|b| (b.name.clone(), b)).collect(),
        }
    }
}

/// Bind every cataloged dataset under its own name.
pub fn bind_all(catalog: &Catalog, root: &Path) -> RelationBindings {
    catalog
        .iter()
        .map(|d| RelationBinding::from_descriptor(d, root))
        .collect()
}

/// Run `sql` against `bindings`.
///
/// # Errors
///
/// `UnknownRelation` naming the first unbound relation the query references;
/// otherwise whatever the engine reports.
pub fn execute<E: QueryEngine + ?Sized>(
    engine: &E,
    sql: &str,
    bindings: &RelationBindings,
) -> Result<ResultGrid> {
    let scoped = match check_relations(sql, bindings)? {
        Some(referenced) => bindings.subset(&referenced),
        None => bindings.clone(),
    };

    tracing::debug!(relations = scoped.len(), "Delegating query to engine");
    engine.execute(sql, &scoped)
}

/// Relations referenced by `sql`, after checking each one is bound.
///
/// `Ok(None)` when the SQL could not be parsed and nothing was checked.
pub fn check_relations(sql: &str, bindings: &RelationBindings) -> Result<Option<Vec<String>>> {
    let Some(referenced) = referenced_relations(sql) else {
        tracing::warn!("Could not parse query, relation names are left to the engine");
        return Ok(None);
    };

    if let Some(missing) = referenced.iter().find(|name| !bindings.contains(name)) {
        return Err(DataPulseError::UnknownRelation(missing.clone()));
    }
    Ok(Some(referenced))
}

/// First `limit` rows of a cataloged dataset, in source order.
///
/// # Errors
///
/// `UnknownDataset` if `name` is not cataloged.
pub fn head<E: QueryEngine + ?Sized>(
    engine: &E,
    catalog: &Catalog,
    root: &Path,
    name: &str,
    limit: usize,
) -> Result<ResultGrid> {
    let descriptor = catalog
        .get(name)
        .ok_or_else(|| DataPulseError::UnknownDataset(name.to_owned()))?;

    let bindings: RelationBindings = [RelationBinding::from_descriptor(descriptor, root)]
        .into_iter()
        .collect();
    let sql = format!("SELECT * FROM {} LIMIT {limit}", sqlite::quote_ident(name));
    engine.execute(&sql, &bindings)
}
