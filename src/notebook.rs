//! Notebook Generator: a runnable Jupyter notebook (nbformat 4.5) for one query.
//!
//! The notebook registers the datasets the query needs with a Polars
//! `SQLContext`, runs the query, and optionally exports and plots the result.
//! Output is a pure function of the SQL, the catalog and the options: cell ids
//! are stable, nothing time- or run-dependent is embedded, and JSON keys are
//! emitted in a fixed order.

pub mod builder;
pub mod cells;

pub use builder::NotebookBuilder;

use crate::catalog::Catalog;
use crate::config::DEFAULT_CSV_INFER_SCHEMA_LENGTH;
use crate::dataset::DatasetDescriptor;
use crate::error::{DataPulseError, Result};
use crate::query::referenced_relations;
use crate::utils::write_atomic;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const NBFORMAT: u32 = 4;
pub const NBFORMAT_MINOR: u32 = 5;

/// Optional notebook stages and rendering knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotebookOptions {
    /// Add a cell writing the result to this CSV path
    pub export_csv: Option<PathBuf>,
    /// Add a plot cell
    pub plot: bool,
    /// Add a markdown cell describing the query
    pub header: bool,
    /// Register every cataloged dataset, not only the ones the query names
    pub register_all: bool,
    /// Project root relative to the notebook's directory
    pub data_root: String,
    pub csv_infer_schema_length: usize,
}

impl Default for NotebookOptions {
    fn default() -> Self {
        Self {
            export_csv: None,
            plot: false,
            header: false,
            register_all: false,
            data_root: ".".to_owned(),
            csv_infer_schema_length: DEFAULT_CSV_INFER_SCHEMA_LENGTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KernelSpec {
    pub display_name: String,
    pub language: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageInfo {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotebookMetadata {
    pub kernelspec: KernelSpec,
    pub language_info: LanguageInfo,
}

impl Default for NotebookMetadata {
    fn default() -> Self {
        Self {
            kernelspec: KernelSpec {
                display_name: "Python 3".to_owned(),
                language: "python".to_owned(),
                name: "python3".to_owned(),
            },
            language_info: LanguageInfo {
                name: "python".to_owned(),
            },
        }
    }
}

/// One notebook cell. Fields are declared in the order Jupyter writes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cell_type", rename_all = "lowercase")]
pub enum Cell {
    Code {
        execution_count: Option<u32>,
        id: String,
        metadata: BTreeMap<String, serde_json::Value>,
        outputs: Vec<serde_json::Value>,
        source: Vec<String>,
    },
    Markdown {
        id: String,
        metadata: BTreeMap<String, serde_json::Value>,
        source: Vec<String>,
    },
}

impl Cell {
    pub fn code(id: &str, source: &str) -> Self {
        Self::Code {
            execution_count: None,
            id: id.to_owned(),
            metadata: BTreeMap::new(),
            outputs: Vec::new(),
            source: source_lines(source),
        }
    }

    pub fn markdown(id: &str, source: &str) -> Self {
        Self::Markdown {
            id: id.to_owned(),
            metadata: BTreeMap::new(),
            source: source_lines(source),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Code { id, .. } | Self::Markdown { id, .. } => id,
        }
    }

    pub fn is_code(&self) -> bool {
        matches!(self, Self::Code { .. })
    }

    /// Source joined back into a single string.
    pub fn source(&self) -> String {
        match self {
            Self::Code { source, .. } | Self::Markdown { source, .. } => source.concat(),
        }
    }
}

/// Split text into nbformat source lines: every line but the last keeps its `\n`.
fn source_lines(text: &str) -> Vec<String> {
    text.split_inclusive('\n').map(str::to_owned).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotebookDocument {
    pub cells: Vec<Cell>,
    pub metadata: NotebookMetadata,
    pub nbformat: u32,
    pub nbformat_minor: u32,
}

impl NotebookDocument {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self {
            cells,
            metadata: NotebookMetadata::default(),
            nbformat: NBFORMAT,
            nbformat_minor: NBFORMAT_MINOR,
        }
    }

    pub fn cell_ids(&self) -> Vec<&str> {
        self.cells.iter().map(Cell::id).collect()
    }

    pub fn cell(&self, id: &str) -> Option<&Cell> {
        self.cells.iter().find(|c| c.id() == id)
    }

    /// Serialize with one-space indentation, as Jupyter does.
    pub fn to_json(&self) -> Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b" ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        buf.push(b'\n');
        String::from_utf8(buf).map_err(|e| DataPulseError::Other(e.to_string()))
    }
}

/// Build the notebook for `sql` over `catalog`.
///
/// Registers the datasets the query references, in catalog (name) order. When
/// the SQL cannot be parsed, or `register_all` is set, every dataset is
/// registered.
///
/// # Errors
///
/// `UnknownRelation` if the query references a name that is not cataloged.
pub fn generate(sql: &str, catalog: &Catalog, options: &NotebookOptions) -> Result<NotebookDocument> {
    let referenced = referenced_relations(sql);
    if let Some(names) = &referenced
        && let Some(missing) = names.iter().find(|n| !catalog.contains(n))
    {
        return Err(DataPulseError::UnknownRelation(missing.clone()));
    }

    let datasets: Vec<&DatasetDescriptor> = match &referenced {
        Some(names) if !options.register_all => catalog
            .iter()
            .filter(|d| names.contains(&d.name))
            .collect(),
        _ => catalog.list(),
    };

    let mut builder = NotebookBuilder::new(sql, &options.data_root, options.csv_infer_schema_length);
    if options.header {
        builder = builder.header(sql);
    }
    for dataset in &datasets {
        builder = builder.register(dataset);
    }
    if let Some(path) = &options.export_csv {
        builder = builder.export_csv(path);
    }
    if options.plot {
        builder = builder.plot();
    }

    let doc = builder.build();
    tracing::debug!(
        cells = doc.cells.len(),
        registered = datasets.len(),
        "Generated notebook"
    );
    Ok(doc)
}

/// Write `doc` to `path`, creating parent directories.
///
/// # Errors
///
/// `PathExists` if `path` exists and `overwrite` is false.
pub fn write_notebook(doc: &NotebookDocument, path: &Path, overwrite: bool) -> Result<()> {
    if path.exists() && !overwrite {
        return Err(DataPulseError::PathExists(path.to_path_buf()));
    }
    write_atomic(path, doc.to_json()?.as_bytes())?;
    tracing::info!(path = %path.display(), cells = doc.cells.len(), "Wrote notebook");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DatasetKind;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn dataset(name: &str, path: &str, kind: DatasetKind) -> DatasetDescriptor {
        DatasetDescriptor {
            name: name.to_owned(),
            path: PathBuf::from(path),
            kind,
            table: None,
        }
    }

    fn catalog() -> Catalog {
        [
            dataset("sales", "data/sales.csv", DatasetKind::Csv),
            dataset("customers", "data/customers.csv", DatasetKind::Csv),
            dataset("events", "data/events.parquet", DatasetKind::Parquet),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_cell_sequence() -> anyhow::Result<()> {
        let options = NotebookOptions {
            export_csv: Some(PathBuf::from("out/x.csv")),
            ..Default::default()
        };
        let doc = generate("SELECT COUNT(*) AS n FROM sales", &catalog(), &options)?;

        assert_eq!(doc.cell_ids(), ["setup", "register-sales", "query", "export"]);
        let query = doc.cell("query").map(Cell::source).unwrap_or_default();
        assert!(query.contains(r#"sql = """SELECT COUNT(*) AS n FROM sales""""#));
        let export = doc.cell("export").map(Cell::source).unwrap_or_default();
        assert!(export.contains(r#"DATA_ROOT / "out/x.csv""#));
        Ok(())
    }

    #[test]
    fn test_registrations_follow_catalog_order() -> anyhow::Result<()> {
        let doc = generate(
            "SELECT * FROM sales s JOIN customers c ON s.customer_id = c.id",
            &catalog(),
            &NotebookOptions::default(),
        )?;
        assert_eq!(
            doc.cell_ids(),
            ["setup", "register-customers", "register-sales", "query"]
        );
        Ok(())
    }

    #[test]
    fn test_register_all_and_unparseable() -> anyhow::Result<()> {
        let all = NotebookOptions {
            register_all: true,
            ..Default::default()
        };
        assert_eq!(generate("SELECT 1", &catalog(), &all)?.cells.len(), 5);

        let doc = generate("SELEC nonsense FROM", &catalog(), &NotebookOptions::default())?;
        assert_eq!(doc.cells.len(), 5);
        Ok(())
    }

    #[test]
    fn test_unknown_relation() {
        let result = generate("SELECT * FROM nope", &catalog(), &NotebookOptions::default());
        assert!(matches!(
            result,
            Err(DataPulseError::UnknownRelation(name)) if name == "nope"
        ));
    }

    #[test]
    fn test_deterministic() -> anyhow::Result<()> {
        let options = NotebookOptions {
            plot: true,
            header: true,
            ..Default::default()
        };
        let sql = "SELECT region, SUM(amount) AS total FROM sales GROUP BY region";
        let first = generate(sql, &catalog(), &options)?.to_json()?;
        let second = generate(sql, &catalog(), &options)?.to_json()?;
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn test_nbformat_shape() -> anyhow::Result<()> {
        let doc = generate("SELECT * FROM events", &catalog(), &NotebookOptions::default())?;
        let value: serde_json::Value = serde_json::from_str(&doc.to_json()?)?;

        assert_eq!(value["nbformat"], 4);
        assert_eq!(value["nbformat_minor"], 5);
        assert_eq!(value["metadata"]["kernelspec"]["name"], "python3");
        let first = &value["cells"][0];
        assert_eq!(first["cell_type"], "code");
        assert!(first["execution_count"].is_null());
        assert_eq!(first["outputs"], serde_json::json!([]));
        assert!(first["source"].is_array());

        let parsed: NotebookDocument = serde_json::from_value(value)?;
        assert_eq!(parsed, doc);
        Ok(())
    }

    #[test]
    fn test_self_contained() -> anyhow::Result<()> {
        let options = NotebookOptions {
            plot: true,
            header: true,
            export_csv: Some(PathBuf::from("notebooks/last_result.csv")),
            ..Default::default()
        };
        let json = generate("SELECT * FROM sales", &catalog(), &options)?.to_json()?;
        assert!(!json.contains("import datapulse"));
        assert!(!json.contains("catalog.json"));
        Ok(())
    }

    #[test]
    fn test_source_lines() {
        assert_eq!(source_lines("a\nb"), ["a\n", "b"]);
        assert_eq!(source_lines("a\n"), ["a\n"]);
    }

    #[test]
    fn test_write_overwrite_policy() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("notebooks/analysis.ipynb");
        let doc = generate("SELECT * FROM sales", &catalog(), &NotebookOptions::default())?;

        write_notebook(&doc, &path, false)?;
        assert!(matches!(
            write_notebook(&doc, &path, false),
            Err(DataPulseError::PathExists(_))
        ));
        write_notebook(&doc, &path, true)?;
        assert_eq!(std::fs::read_to_string(&path)?, doc.to_json()?);
        Ok(())
    }
}
