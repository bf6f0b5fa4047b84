use anyhow::{Context as _, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory as _, Parser, Subcommand};
use datapulse::dataset::DatasetKind;
use datapulse::notebook::NotebookOptions;
use datapulse::workspace::Workspace;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "datapulse",
    version,
    about = "Catalog local data files, query them with SQL and generate notebooks"
)]
pub struct Cli {
    /// Project root holding the .datapulse/ catalog
    #[arg(long, global = true, env = "DATAPULSE_ROOT", default_value = ".")]
    pub root: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Register a CSV, Parquet or SQLite file under a name
    Add {
        /// Relation name used in SQL
        name: String,

        /// Path to the file. Relative paths are taken from the project root.
        path: PathBuf,

        /// Dataset kind. Inferred from the file extension when omitted.
        #[arg(long)]
        kind: Option<DatasetKind>,

        /// Table to expose from a SQLite database. Defaults to the first table by name.
        #[arg(long)]
        table: Option<String>,

        /// Replace an existing dataset with the same name
        #[arg(long)]
        force: bool,
    },
    /// List registered datasets
    #[command(alias = "list")]
    Ls,
    /// Remove a dataset from the catalog (the file itself is left alone)
    #[command(alias = "remove")]
    Rm {
        name: String,
    },
    /// Show the first rows of a dataset
    Head {
        name: String,

        /// Number of rows. Defaults to the configured head limit.
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Run a SQL query over the registered datasets
    Sql {
        /// Query text; multiple arguments are joined with spaces
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Also write the result to a .csv or .parquet file, relative to the project root
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Generate a Jupyter notebook that reproduces a query
    Notebook {
        /// Query to reproduce
        #[arg(long)]
        sql: String,

        /// Notebook path, relative to the project root. Defaults to the configured notebook path.
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Add a cell that writes the result to CSV (optionally at PATH)
        #[arg(long, value_name = "PATH", num_args = 0..=1)]
        export_csv: Option<Option<PathBuf>>,

        /// Add a plot cell
        #[arg(long)]
        plot: bool,

        /// Add a markdown cell describing the query
        #[arg(long)]
        header: bool,

        /// Register every dataset, not only those the query references
        #[arg(long)]
        all_datasets: bool,

        /// Overwrite an existing notebook
        #[arg(long)]
        force: bool,
    },
}

/// Query words joined with spaces; blank input is a usage error.
fn query_text(words: &[String]) -> std::result::Result<String, clap::Error> {
    let sql = words.join(" ");
    if sql.trim().is_empty() {
        return Err(Cli::command().error(ErrorKind::ValueValidation, "the SQL query is empty"));
    }
    Ok(sql)
}

pub fn run_command(cli: Cli) -> Result<()> {
    if let Commands::Sql { query, .. } = &cli.command
        && let Err(err) = query_text(query)
    {
        err.exit();
    }

    let workspace = Workspace::open(&cli.root)
        .with_context(|| format!("Failed to open project root {}", cli.root.display()))?;
    tracing::info!(root = %workspace.root().display(), "Opened project");

    match cli.command {
        Commands::Add {
            name,
            path,
            kind,
            table,
            force,
        } => {
            let descriptor = workspace.add(&name, &path, kind, table.as_deref(), force)?;
            println!(
                "Registered '{}' -> {} ({})",
                descriptor.name,
                descriptor.path.display(),
                descriptor.kind
            );
        }
        Commands::Ls => {
            let datasets = workspace.list()?;
            if datasets.is_empty() {
                println!("No datasets registered.");
            }
            for d in datasets {
                match &d.table {
                    Some(table) => {
                        println!("{}\t{}\t{} [{table}]", d.name, d.kind, d.path.display());
                    }
                    None => println!("{}\t{}\t{}", d.name, d.kind, d.path.display()),
                }
            }
        }
        Commands::Rm { name } => {
            workspace.remove(&name)?;
            println!("Removed '{name}'");
        }
        Commands::Head { name, limit } => {
            println!("{}", workspace.head(&name, limit)?);
        }
        Commands::Sql { query, out } => {
            let grid = workspace.sql(&query_text(&query)?)?;
            println!("{grid}");
            if let Some(out) = out {
                let out = workspace.output_path(&out);
                grid.write(&out)?;
                println!("Wrote {} rows to {}", grid.height(), out.display());
            }
        }
        Commands::Notebook {
            sql,
            out,
            export_csv,
            plot,
            header,
            all_datasets,
            force,
        } => {
            let export_csv = export_csv.map(|path| {
                path.unwrap_or_else(|| PathBuf::from(&workspace.settings().export_csv_path))
            });
            let options = NotebookOptions {
                export_csv,
                plot,
                header,
                register_all: all_datasets,
                ..Default::default()
            };
            let path = workspace.notebook(&sql, out.as_deref(), options, force)?;
            println!("Notebook written to {}", path.display());
        }
    }
    Ok(())
}
