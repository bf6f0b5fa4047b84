//! Read a SQLite table into a `DataFrame`.

use crate::error::{DataPulseError, Result};
use polars::prelude::*;
use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;

/// Quote `name` as a SQL identifier.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// User tables in `conn`, sorted by name.
pub fn list_tables(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master \
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )?;
    let tables = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(tables)
}

/// Load `table` (or the first table by name) from the database at `path`.
pub fn read_table(path: &Path, table: Option<&str>) -> Result<DataFrame> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;

    let table = match table {
        Some(t) => t.to_owned(),
        None => list_tables(&conn)?.into_iter().next().ok_or_else(|| {
            DataPulseError::Database(format!("No tables found in SQLite DB: {}", path.display()))
        })?,
    };
    tracing::debug!(db = %path.display(), %table, "Reading SQLite table");

    let mut stmt = conn.prepare(&format!("SELECT * FROM {}", quote_ident(&table)))?;
    let names: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(str::to_owned)
        .collect();

    let mut values: Vec<Vec<AnyValue<'static>>> = vec![Vec::new(); names.len()];
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        for (idx, column) in values.iter_mut().enumerate() {
            column.push(any_value(row.get::<_, Value>(idx)?));
        }
    }

    let columns = names
        .iter()
        .zip(values)
        .map(|(name, column)| {
            Series::from_any_values(name.as_str().into(), &column, false).map(Series::into_column)
        })
        .collect::<PolarsResult<Vec<_>>>()?;
    Ok(DataFrame::new(columns)?)
}

fn any_value(value: Value) -> AnyValue<'static> {
    match value {
        Value::Null => AnyValue::Null,
        Value::Integer(v) => AnyValue::Int64(v),
        Value::Real(v) => AnyValue::Float64(v),
        Value::Text(v) => AnyValue::StringOwned(v.into()),
        Value::Blob(v) => AnyValue::BinaryOwned(v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixture(dir: &Path) -> anyhow::Result<std::path::PathBuf> {
        let path = dir.join("shop.db");
        let conn = Connection::open(&path)?;
        conn.execute_batch(
            "CREATE TABLE orders (id INTEGER, customer TEXT, total REAL);
             INSERT INTO orders VALUES (1, 'ada', 9.5), (2, 'bob', NULL), (3, 'cy', 1.25);
             CREATE TABLE audit (note TEXT);",
        )?;
        Ok(path)
    }

    #[test]
    fn test_first_table_by_name() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let path = fixture(temp.path())?;
        let df = read_table(&path, None)?;
        assert_eq!(df.shape(), (0, 1));
        assert!(df.column("note").is_ok());
        Ok(())
    }

    #[test]
    fn test_named_table_types() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let path = fixture(temp.path())?;
        let df = read_table(&path, Some("orders"))?;
        assert_eq!(df.shape(), (3, 3));
        assert_eq!(df.column("id")?.dtype(), &DataType::Int64);
        assert_eq!(df.column("total")?.dtype(), &DataType::Float64);
        assert_eq!(df.column("total")?.null_count(), 1);
        Ok(())
    }

    #[test]
    fn test_empty_database() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("empty.db");
        Connection::open(&path)?.execute_batch("PRAGMA user_version = 1;")?;
        assert!(matches!(
            read_table(&path, None),
            Err(DataPulseError::Database(_))
        ));
        Ok(())
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }
}
