//! Dataset descriptors and file-kind handling.
//!
//! A [`DatasetDescriptor`] is the validated snapshot the catalog stores for one
//! registered file. Descriptors are produced by [`resolve`] and never mutated in
//! place; re-adding a dataset replaces the whole descriptor.

pub mod resolver;

pub use resolver::resolve;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// File formats a dataset can be backed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    Csv,
    #[serde(alias = "pq")]
    Parquet,
    #[serde(alias = "db", alias = "sqlite3")]
    Sqlite,
}

impl DatasetKind {
    pub const ALL: [Self; 3] = [Self::Csv, Self::Parquet, Self::Sqlite];

    /// Map a file extension (without the dot, any case) to a kind.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "parquet" | "pq" => Some(Self::Parquet),
            "db" | "sqlite" | "sqlite3" => Some(Self::Sqlite),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Parquet => "parquet",
            Self::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s.trim_start_matches('.'))
            .ok_or_else(|| format!("unknown dataset kind '{s}' (expected csv, parquet or sqlite)"))
    }
}

/// One registered dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetDescriptor {
    /// Relation name in SQL and registration key in notebooks
    pub name: String,
    /// Root-relative (with `/` separators) or absolute path to the backing file
    pub path: PathBuf,
    pub kind: DatasetKind,
    /// Table exposed for SQLite datasets; `None` picks the first table by name
    pub table: Option<String>,
}

impl DatasetDescriptor {
    /// Absolute location of the backing file for a catalog rooted at `root`.
    pub fn source_path(&self, root: &Path) -> PathBuf {
        if self.path.is_absolute() {
            self.path.clone()
        } else {
            root.join(&self.path)
        }
    }

    /// Whether the stored path is relative to the catalog root.
    pub fn is_root_relative(&self) -> bool {
        self.path.is_relative()
    }
}

/// Whether `name` matches `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_extension_is_case_insensitive() {
        assert_eq!(DatasetKind::from_extension("CSV"), Some(DatasetKind::Csv));
        assert_eq!(DatasetKind::from_extension("Pq"), Some(DatasetKind::Parquet));
        assert_eq!(
            DatasetKind::from_extension("sqlite3"),
            Some(DatasetKind::Sqlite)
        );
        assert_eq!(DatasetKind::from_extension("xlsx"), None);
    }

    #[test]
    fn test_kind_serde_accepts_legacy_names() -> anyhow::Result<()> {
        let kind: DatasetKind = serde_json::from_str("\"db\"")?;
        assert_eq!(kind, DatasetKind::Sqlite);
        assert_eq!(serde_json::to_string(&DatasetKind::Parquet)?, "\"parquet\"");
        Ok(())
    }

    #[test]
    fn test_identifiers() {
        assert!(is_valid_identifier("sales"));
        assert!(is_valid_identifier("_tmp2"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("2020_sales"));
        assert!(!is_valid_identifier("sales-2020"));
        assert!(!is_valid_identifier("my table"));
    }

    #[test]
    fn test_source_path() {
        let root = Path::new("/project");
        let relative = DatasetDescriptor {
            name: "sales".to_owned(),
            path: PathBuf::from("data/sales.csv"),
            kind: DatasetKind::Csv,
            table: None,
        };
        assert_eq!(
            relative.source_path(root),
            PathBuf::from("/project/data/sales.csv")
        );
        assert!(relative.is_root_relative());
    }
}
