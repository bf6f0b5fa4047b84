//! Project settings.
//!
//! Optional `<root>/.datapulse/settings.json`; every field has a default, so a
//! partial file only overrides what it names.

use crate::catalog::CATALOG_DIR;
use crate::error::{DataPulseError, Result, ResultExt as _};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SETTINGS_FILE: &str = "settings.json";

pub const DEFAULT_HEAD_LIMIT: usize = 5;
pub const DEFAULT_CSV_INFER_SCHEMA_LENGTH: usize = 10_000;
pub const DEFAULT_NOTEBOOK_PATH: &str = "notebooks/analysis.ipynb";
pub const DEFAULT_EXPORT_CSV_PATH: &str = "notebooks/last_result.csv";

/// Overrides `csv_infer_schema_length` when set to a positive integer.
pub const ENV_CSV_INFER_SCHEMA_LENGTH: &str = "DATAPULSE_CSV_INFER_SCHEMA_LENGTH";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Rows shown by `head` when no limit is given
    pub head_limit: usize,
    /// Rows sampled to infer CSV column types
    pub csv_infer_schema_length: usize,
    /// Default `notebook --out` path, relative to the project root
    pub notebook_path: PathBuf,
    /// Default CSV path written by a notebook's export cell
    pub export_csv_path: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            head_limit: DEFAULT_HEAD_LIMIT,
            csv_infer_schema_length: DEFAULT_CSV_INFER_SCHEMA_LENGTH,
            notebook_path: PathBuf::from(DEFAULT_NOTEBOOK_PATH),
            export_csv_path: DEFAULT_EXPORT_CSV_PATH.to_owned(),
        }
    }
}

impl Settings {
    pub fn path(root: &Path) -> PathBuf {
        root.join(CATALOG_DIR).join(SETTINGS_FILE)
    }

    /// Load settings for `root`, then apply environment overrides.
    pub fn load(root: &Path) -> Result<Self> {
        let path = Self::path(root);

        let mut settings = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str::<Self>(&contents).map_err(|e| {
                DataPulseError::Config(format!("{}: {e}", path.display()))
            })?
        } else {
            Self::default()
        };

        if let Ok(value) = std::env::var(ENV_CSV_INFER_SCHEMA_LENGTH)
            && let Ok(parsed) = value.parse::<usize>()
            && parsed > 0
        {
            settings.csv_infer_schema_length = parsed;
        }

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_file() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let settings = Settings::load(temp.path())?;
        assert_eq!(settings.head_limit, 5);
        assert_eq!(
            settings.notebook_path,
            PathBuf::from("notebooks/analysis.ipynb")
        );
        Ok(())
    }

    #[test]
    fn test_partial_file() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        std::fs::create_dir_all(temp.path().join(CATALOG_DIR))?;
        std::fs::write(Settings::path(temp.path()), r#"{"head_limit": 20}"#)?;

        let settings = Settings::load(temp.path())?;
        assert_eq!(settings.head_limit, 20);
        assert_eq!(settings.export_csv_path, DEFAULT_EXPORT_CSV_PATH);
        Ok(())
    }

    #[test]
    fn test_malformed_file() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        std::fs::create_dir_all(temp.path().join(CATALOG_DIR))?;
        std::fs::write(Settings::path(temp.path()), "head_limit = 20")?;

        assert!(matches!(
            Settings::load(temp.path()),
            Err(DataPulseError::Config(_))
        ));
        Ok(())
    }
}
