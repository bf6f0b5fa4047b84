//! # DataPulse - SQL over local data files
//!
//! DataPulse keeps a small catalog of local CSV, Parquet and SQLite files,
//! runs SQL over them through Polars, and emits Jupyter notebooks that
//! reproduce a query without DataPulse installed.
//!
//! ## Quick Start
//!
//! ```no_run
//! use datapulse::workspace::Workspace;
//! use std::path::Path;
//!
//! let workspace = Workspace::open(Path::new("."))?;
//! workspace.add("sales", Path::new("data/sales.csv"), None, None, false)?;
//!
//! let grid = workspace.sql("SELECT region, SUM(amount) AS total FROM sales GROUP BY region")?;
//! println!("{grid}");
//! # Ok::<(), datapulse::error::DataPulseError>(())
//! ```
//!
//! ## Core Modules
//!
//! - [`dataset`]: Dataset kinds, descriptors and path resolution
//! - [`catalog`]: The name → dataset mapping and its persistence
//! - [`query`]: Relation binding and SQL execution
//! - [`notebook`]: Notebook generation
//! - [`workspace`]: Commands over one project root
//! - [`config`]: Project settings
//! - [`logging`]: Tracing setup
//! - [`error`]: Error types and handling utilities
//!
//! ## Project layout
//!
//! ```text
//! <root>/
//!   .datapulse/
//!     catalog.json      registered datasets
//!     settings.json     optional overrides
//!     logs/             daily-rotated logs
//!   notebooks/
//!     analysis.ipynb    default notebook output
//! ```

#![warn(clippy::all, rust_2018_idioms)]

pub mod catalog;
pub mod config;
pub mod dataset;
pub mod error;
pub mod logging;
pub mod notebook;
pub mod query;
pub mod utils;
pub mod workspace;
