use super::cells;
use super::{Cell, NotebookDocument};
use crate::dataset::DatasetDescriptor;
use std::path::Path;

/// Assembles a notebook in a fixed stage order:
/// header, setup, registrations, query, export, plot.
///
/// Cells are rendered as they are added; [`build`](Self::build) only
/// concatenates the stages, so call order does not affect the result.
///
/// ```
/// use datapulse::notebook::NotebookBuilder;
///
/// let doc = NotebookBuilder::new("SELECT 1 AS one", ".", 100)
///     .plot()
///     .build();
/// assert_eq!(doc.cell_ids(), ["setup", "query", "plot"]);
/// ```
#[derive(Debug, Clone)]
pub struct NotebookBuilder {
    csv_infer_schema_length: usize,
    header: Option<Cell>,
    setup: Cell,
    registrations: Vec<Cell>,
    query: Cell,
    export: Option<Cell>,
    plot: Option<Cell>,
}

impl NotebookBuilder {
    /// `data_root` is the project root as seen from the notebook's directory.
    pub fn new(sql: &str, data_root: &str, csv_infer_schema_length: usize) -> Self {
        Self {
            csv_infer_schema_length,
            header: None,
            setup: Cell::code("setup", &cells::setup_snippet(data_root)),
            registrations: Vec::new(),
            query: Cell::code("query", &cells::query_snippet(sql)),
            export: None,
            plot: None,
        }
    }

    #[must_use]
    pub fn header(mut self, sql: &str) -> Self {
        self.header = Some(Cell::markdown("header", &cells::header_markdown(sql)));
        self
    }

    /// Registration cells keep the order they are added in.
    #[must_use]
    pub fn register(mut self, dataset: &DatasetDescriptor) -> Self {
        let id = format!("register-{}", dataset.name);
        let source = cells::register_snippet(dataset, self.csv_infer_schema_length);
        self.registrations.push(Cell::code(&id, &source));
        self
    }

    #[must_use]
    pub fn export_csv(mut self, path: &Path) -> Self {
        self.export = Some(Cell::code("export", &cells::export_snippet(path)));
        self
    }

    #[must_use]
    pub fn plot(mut self) -> Self {
        self.plot = Some(Cell::code("plot", &cells::plot_snippet()));
        self
    }

    pub fn build(self) -> NotebookDocument {
        let cells = self
            .header
            .into_iter()
            .chain(std::iter::once(self.setup))
            .chain(self.registrations)
            .chain(std::iter::once(self.query))
            .chain(self.export)
            .chain(self.plot)
            .collect();
        NotebookDocument::new(cells)
    }
}
