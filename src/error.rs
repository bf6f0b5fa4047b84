//! Centralized error handling for datapulse.
//!
//! Errors fall into three families:
//!
//! - **Input errors** ([`DataPulseError::InvalidName`], [`DataPulseError::FileNotFound`],
//!   [`DataPulseError::UnsupportedKind`], [`DataPulseError::UnknownDataset`],
//!   [`DataPulseError::UnknownRelation`], [`DataPulseError::DatasetExists`],
//!   [`DataPulseError::PathExists`]) always carry the offending identifier or path.
//! - **Persistence errors** ([`DataPulseError::CatalogCorrupt`], [`DataPulseError::Io`])
//!   are surfaced verbatim. A corrupt catalog is never repaired automatically.
//! - **Engine errors** ([`DataPulseError::QueryExecution`], [`DataPulseError::Database`])
//!   pass the engine's own diagnostic text through unchanged.
//!
//! Nothing in the crate retries; every error is terminal for the current command.
//!
//! ```
//! use datapulse::error::DataPulseError;
//!
//! let err = DataPulseError::UnknownRelation("ghost".to_owned());
//! assert_eq!(err.to_string(), "Unknown relation 'ghost' referenced in query");
//! ```

use std::fmt;
use std::path::PathBuf;

/// Main error type for datapulse operations.
#[derive(Debug)]
pub enum DataPulseError {
    /// Dataset or table name is not a plain SQL identifier
    InvalidName(String),

    /// Backing file does not exist (or is not a regular file)
    FileNotFound(PathBuf),

    /// File extension does not map to a supported dataset kind
    UnsupportedKind(String),

    /// Dataset name is not present in the catalog
    UnknownDataset(String),

    /// SQL references a relation that is not bound
    UnknownRelation(String),

    /// Dataset name is already cataloged and overwrite was not requested
    DatasetExists(String),

    /// Output path exists and overwrite was not requested
    PathExists(PathBuf),

    /// Persisted catalog document could not be parsed
    CatalogCorrupt { path: PathBuf, message: String },

    /// I/O errors (permissions, disk, etc.)
    Io(std::io::Error),

    /// Query engine failure, message passed through from the engine
    QueryExecution(String),

    /// SQLite access errors
    Database(String),

    /// Settings errors
    Config(String),

    /// Generic error with context
    Other(String),
}

impl fmt::Display for DataPulseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidName(name) => write!(
                f,
                "Invalid name '{name}': use letters, digits and underscores, not starting with a digit"
            ),
            Self::FileNotFound(path) => write!(f, "File not found: {}", path.display()),
            Self::UnsupportedKind(ext) => write!(
                f,
                "Unsupported file extension '{ext}'. Supported: .csv, .parquet, .pq, .db, .sqlite, .sqlite3"
            ),
            Self::UnknownDataset(name) => write!(
                f,
                "No dataset named '{name}'. Add it first with `datapulse add {name} <path>`"
            ),
            Self::UnknownRelation(name) => {
                write!(f, "Unknown relation '{name}' referenced in query")
            }
            Self::DatasetExists(name) => write!(
                f,
                "Dataset '{name}' already exists in the catalog (use --force to replace it)"
            ),
            Self::PathExists(path) => write!(
                f,
                "Output path already exists: {} (use --force to overwrite)",
                path.display()
            ),
            Self::CatalogCorrupt { path, message } => {
                write!(f, "Catalog at {} is corrupt: {message}", path.display())
            }
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::QueryExecution(msg) => write!(f, "Query execution error: {msg}"),
            Self::Database(msg) => write!(f, "Database error: {msg}"),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for DataPulseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DataPulseError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<anyhow::Error> for DataPulseError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<serde_json::Error> for DataPulseError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(format!("JSON error: {err}"))
    }
}

impl From<polars::error::PolarsError> for DataPulseError {
    fn from(err: polars::error::PolarsError) -> Self {
        Self::QueryExecution(err.to_string())
    }
}

impl From<rusqlite::Error> for DataPulseError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<tempfile::PersistError> for DataPulseError {
    fn from(err: tempfile::PersistError) -> Self {
        Self::Io(err.error)
    }
}

/// Result type alias for datapulse operations.
pub type Result<T> = std::result::Result<T, DataPulseError>;

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<DataPulseError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err: DataPulseError = e.into();
            DataPulseError::Other(format!("{}: {}", msg.into(), err))
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err: DataPulseError = e.into();
            DataPulseError::Other(format!("{}: {}", f(), err))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_names_offender() {
        let err = DataPulseError::UnknownDataset("sales".to_owned());
        assert!(err.to_string().contains("'sales'"));

        let err = DataPulseError::FileNotFound(PathBuf::from("/missing/path.csv"));
        assert_eq!(err.to_string(), "File not found: /missing/path.csv");
    }

    #[test]
    fn test_engine_error_passthrough() {
        let err = DataPulseError::QueryExecution("syntax error at or near FORM".to_owned());
        assert_eq!(
            err.to_string(),
            "Query execution error: syntax error at or near FORM"
        );
    }

    #[test]
    fn test_result_context() {
        let result: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "catalog.json",
        ));

        let result: Result<()> = result.context("Failed to read catalog");
        assert!(
            result
                .unwrap_err()
                .to_string()
                .starts_with("Failed to read catalog: I/O error")
        );
    }
}
