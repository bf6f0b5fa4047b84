//! Execution engines.
//!
//! [`PolarsEngine`] registers each binding as a lazy Polars relation inside a
//! fresh `SQLContext` and collects the query result. CSV and Parquet are
//! scanned lazily; SQLite tables are read eagerly through [`super::sqlite`].

use super::{RelationBinding, RelationBindings, ResultGrid, sqlite};
use crate::dataset::DatasetKind;
use crate::error::{DataPulseError, Result};
use polars::prelude::*;
use polars::sql::SQLContext;

/// Runs SQL over a set of relation bindings.
pub trait QueryEngine {
    /// Execute `sql` with exactly `bindings` visible as tables.
    fn execute(&self, sql: &str, bindings: &RelationBindings) -> Result<ResultGrid>;
}

#[derive(Debug, Clone)]
pub struct PolarsEngine {
    csv_infer_schema_length: usize,
}

impl Default for PolarsEngine {
    fn default() -> Self {
        Self {
            csv_infer_schema_length: crate::config::DEFAULT_CSV_INFER_SCHEMA_LENGTH,
        }
    }
}

impl PolarsEngine {
    pub fn new(csv_infer_schema_length: usize) -> Self {
        Self {
            csv_infer_schema_length,
        }
    }

    /// Lazy frame for one binding.
    ///
    /// A backing file deleted after it was cataloged surfaces here as
    /// `FileNotFound`.
    pub fn relation(&self, binding: &RelationBinding) -> Result<LazyFrame> {
        if !binding.source.is_file() {
            return Err(DataPulseError::FileNotFound(binding.source.clone()));
        }

        let lf = match binding.kind {
            DatasetKind::Csv => LazyCsvReader::new(&binding.source)
                .with_infer_schema_length(Some(self.csv_infer_schema_length))
                .with_has_header(true)
                .with_try_parse_dates(true)
                .finish()?,
            DatasetKind::Parquet => {
                LazyFrame::scan_parquet(&binding.source, ScanArgsParquet::default())?
            }
            DatasetKind::Sqlite => {
                sqlite::read_table(&binding.source, binding.table.as_deref())?.lazy()
            }
        };
        Ok(lf)
    }
}

impl QueryEngine for PolarsEngine {
    fn execute(&self, sql: &str, bindings: &RelationBindings) -> Result<ResultGrid> {
        let mut ctx = SQLContext::new();
        for binding in bindings.iter() {
            tracing::debug!(
                relation = %binding.name,
                source = %binding.source.display(),
                kind = %binding.kind,
                "Registering relation"
            );
            ctx.register(&binding.name, self.relation(binding)?);
        }

        let frame = ctx.execute(sql)?.collect()?;
        tracing::debug!(rows = frame.height(), columns = frame.width(), "Query finished");
        Ok(ResultGrid::new(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::execute;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn binding(name: &str, source: &Path, kind: DatasetKind) -> RelationBinding {
        RelationBinding {
            name: name.to_owned(),
            source: source.to_path_buf(),
            kind,
            table: None,
        }
    }

    fn write_csv(dir: &Path, name: &str, body: &str) -> anyhow::Result<PathBuf> {
        let path = dir.join(name);
        std::fs::write(&path, body)?;
        Ok(path)
    }

    #[test]
    fn test_csv_query() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let path = write_csv(temp.path(), "t.csv", "a,b\n1,2\n3,4\n")?;
        let bindings: RelationBindings = [binding("t", &path, DatasetKind::Csv)].into_iter().collect();

        let grid = execute(
            &PolarsEngine::default(),
            "SELECT COUNT(*) AS n FROM t",
            &bindings,
        )?;
        assert_eq!(grid.height(), 1);
        assert_eq!(grid.cell_text(0, "n").as_deref(), Some("2"));
        Ok(())
    }

    #[test]
    fn test_parquet_query() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("t.parquet");
        let mut df = df!(
            "city" => &["Leeds", "York", "Leeds"],
            "amount" => &[10i64, 20, 30]
        )?;
        ParquetWriter::new(std::fs::File::create(&path)?).finish(&mut df)?;

        let bindings: RelationBindings = [binding("t", &path, DatasetKind::Parquet)]
            .into_iter()
            .collect();
        let grid = execute(
            &PolarsEngine::default(),
            "SELECT city, SUM(amount) AS total FROM t GROUP BY city ORDER BY city",
            &bindings,
        )?;
        assert_eq!(
            grid.rows(),
            vec![
                vec!["Leeds".to_owned(), "40".to_owned()],
                vec!["York".to_owned(), "20".to_owned()],
            ]
        );
        Ok(())
    }

    #[test]
    fn test_deleted_source_fails_at_query_time() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let path = write_csv(temp.path(), "gone.csv", "a\n1\n")?;
        let bindings: RelationBindings = [binding("gone", &path, DatasetKind::Csv)]
            .into_iter()
            .collect();
        std::fs::remove_file(&path)?;

        let err = execute(&PolarsEngine::default(), "SELECT * FROM gone", &bindings).unwrap_err();
        assert!(matches!(err, DataPulseError::FileNotFound(ref p) if *p == path));
        Ok(())
    }

    #[test]
    fn test_engine_errors_pass_through() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let path = write_csv(temp.path(), "t.csv", "a\n1\n")?;
        let bindings: RelationBindings = [binding("t", &path, DatasetKind::Csv)].into_iter().collect();

        let err = execute(
            &PolarsEngine::default(),
            "SELECT no_such_column FROM t",
            &bindings,
        )
        .unwrap_err();
        assert!(matches!(err, DataPulseError::QueryExecution(_)));
        Ok(())
    }
}
