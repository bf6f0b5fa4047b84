//! Python source for each notebook stage.
//!
//! Cells only depend on `polars` (plus `matplotlib` for the optional plot), so
//! a generated notebook runs without datapulse installed.

use crate::dataset::{DatasetDescriptor, DatasetKind};
use std::path::Path;

/// Quote `value` as a Python string literal.
pub fn py_str(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", u32::from(c))),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Python expression for a stored path: joined onto `DATA_ROOT` when relative.
pub fn path_expr(path: &Path) -> String {
    let text = path.to_string_lossy().replace('\\', "/");
    if path.is_absolute() {
        format!("pathlib.Path({})", py_str(&text))
    } else {
        format!("DATA_ROOT / {}", py_str(&text))
    }
}

/// SQL as a Python literal that evaluates to exactly `sql`.
pub fn sql_literal(sql: &str) -> String {
    if sql.contains("\"\"\"") || sql.contains('\\') || sql.ends_with('"') || sql.contains('\r') {
        py_str(sql)
    } else {
        format!("\"\"\"{sql}\"\"\"")
    }
}

pub fn header_markdown(sql: &str) -> String {
    format!(
        r#"# DataPulse analysis

The cells below register each dataset with a Polars `SQLContext`, run the query and keep the result in `result`.

```sql
{}
```"#,
        sql.trim()
    )
}

pub fn setup_snippet(data_root: &str) -> String {
    format!(
        r#"import pathlib

import polars as pl

# Dataset paths are resolved against the project root
DATA_ROOT = pathlib.Path({}).resolve()

ctx = pl.SQLContext()"#,
        py_str(data_root)
    )
}

pub fn register_snippet(dataset: &DatasetDescriptor, csv_infer_schema_length: usize) -> String {
    let name = py_str(&dataset.name);
    let path = path_expr(&dataset.path);
    match dataset.kind {
        DatasetKind::Csv => format!(
            r#"ctx.register(
    {name},
    pl.scan_csv({path}, infer_schema_length={csv_infer_schema_length}, try_parse_dates=True),
)"#
        ),
        DatasetKind::Parquet => format!(r#"ctx.register({name}, pl.scan_parquet({path}))"#),
        DatasetKind::Sqlite => {
            let table = match &dataset.table {
                Some(table) => py_str(table),
                None => r#"con.execute(
    "SELECT name FROM sqlite_master "
    "WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name LIMIT 1"
).fetchone()[0]"#
                    .to_owned(),
            };
            format!(
                r#"import sqlite3

con = sqlite3.connect({path})
table = {table}
quoted = '"' + table.replace('"', '""') + '"'
frame = pl.read_database(f"SELECT * FROM {{quoted}}", connection=con)
con.close()
ctx.register({name}, frame.lazy())"#
            )
        }
    }
}

pub fn query_snippet(sql: &str) -> String {
    format!(
        r#"sql = {}
result = ctx.execute(sql).collect()
result"#,
        sql_literal(sql)
    )
}

pub fn export_snippet(path: &Path) -> String {
    format!(
        r#"export_path = {}
export_path.parent.mkdir(parents=True, exist_ok=True)
result.write_csv(export_path)
print(f"Saved {{result.height}} rows to {{export_path}}")"#,
        path_expr(path)
    )
}

/// Bar chart of the first text column against the first numeric column, or a
/// scatter of the first two numeric columns; otherwise just display the table.
pub fn plot_snippet() -> String {
    r#"import matplotlib.pyplot as plt

numeric = [c for c, t in result.schema.items() if t.is_numeric()]
categorical = [c for c, t in result.schema.items() if t == pl.String or t == pl.Categorical]

if categorical and numeric:
    x, y = categorical[0], numeric[0]
    data = result.head(50)
    plt.figure(figsize=(10, 5))
    plt.bar(data[x].cast(pl.String).to_list(), data[y].to_list())
    plt.xticks(rotation=45, ha="right")
    plt.xlabel(x)
    plt.ylabel(y)
    plt.tight_layout()
    plt.show()
elif len(numeric) >= 2:
    x, y = numeric[0], numeric[1]
    plt.figure(figsize=(8, 5))
    plt.scatter(result[x].to_list(), result[y].to_list())
    plt.xlabel(x)
    plt.ylabel(y)
    plt.tight_layout()
    plt.show()
else:
    from IPython.display import display

    display(result)"#
        .to_owned()
}
