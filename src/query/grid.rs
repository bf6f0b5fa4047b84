//! Result grids returned by the engine.

use crate::error::Result;
use polars::prelude::*;
use std::fmt;
use std::path::Path;

/// Name and engine type of one result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub dtype: String,
}

/// Column-typed tabular query result.
#[derive(Debug, Clone)]
pub struct ResultGrid {
    frame: DataFrame,
}

impl ResultGrid {
    pub fn new(frame: DataFrame) -> Self {
        Self { frame }
    }

    pub fn columns(&self) -> Vec<ColumnInfo> {
        self.frame
            .get_columns()
            .iter()
            .map(|c| ColumnInfo {
                name: c.name().to_string(),
                dtype: c.dtype().to_string(),
            })
            .collect()
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn width(&self) -> usize {
        self.frame.width()
    }

    /// Text of one cell; nulls render as the empty string.
    pub fn cell_text(&self, row: usize, column: &str) -> Option<String> {
        let column = self.frame.column(column).ok()?;
        let value = column.as_materialized_series().get(row).ok()?;
        Some(any_value_text(&value))
    }

    /// All rows as text, row-major.
    pub fn rows(&self) -> Vec<Vec<String>> {
        let series: Vec<&Series> = self
            .frame
            .get_columns()
            .iter()
            .map(Column::as_materialized_series)
            .collect();
        (0..self.height())
            .map(|row| {
                series
                    .iter()
                    .map(|s| s.get(row).map(|v| any_value_text(&v)).unwrap_or_default())
                    .collect()
            })
            .collect()
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn into_frame(self) -> DataFrame {
        self.frame
    }

    /// Write the grid to `path`: Parquet for `.parquet`/`.pq`, CSV otherwise.
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();
        let mut df = self.frame.clone();
        let file = std::fs::File::create(path)?;
        if matches!(ext.as_str(), "parquet" | "pq") {
            ParquetWriter::new(file).finish(&mut df)?;
        } else {
            CsvWriter::new(file).include_header(true).finish(&mut df)?;
        }
        tracing::info!(path = %path.display(), rows = df.height(), "Exported result");
        Ok(())
    }
}

impl fmt::Display for ResultGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.frame, f)
    }
}

fn any_value_text(value: &AnyValue<'_>) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::String(s) => (*s).to_owned(),
        AnyValue::StringOwned(s) => s.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn grid() -> anyhow::Result<ResultGrid> {
        Ok(ResultGrid::new(df!(
            "name" => &[Some("ada"), None],
            "score" => &[1.5f64, 2.0]
        )?))
    }

    #[test]
    fn test_columns_and_cells() -> anyhow::Result<()> {
        let grid = grid()?;
        assert_eq!(grid.width(), 2);
        assert_eq!(
            grid.columns()[0],
            ColumnInfo {
                name: "name".to_owned(),
                dtype: "str".to_owned()
            }
        );
        assert_eq!(grid.cell_text(0, "name").as_deref(), Some("ada"));
        assert_eq!(grid.cell_text(1, "name").as_deref(), Some(""));
        assert_eq!(grid.cell_text(0, "missing"), None);
        assert_eq!(grid.rows().len(), 2);
        Ok(())
    }

    #[test]
    fn test_write_csv_creates_parent() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("out/result.csv");
        grid()?.write(&path)?;
        let text = std::fs::read_to_string(&path)?;
        assert!(text.starts_with("name,score\n"));
        Ok(())
    }
}
