//! # DataPulse command-line entry point
//!
//! ```text
//! main()
//!   │
//!   ├─> Parse CLI arguments (clap)
//!   ├─> Initialize logging under <root>/.datapulse/logs
//!   └─> Run the command; any error is printed and exits with status 1
//! ```
//!
//! ```bash
//! datapulse add sales data/sales.csv
//! datapulse sql "SELECT region, SUM(amount) FROM sales GROUP BY region"
//! datapulse notebook --sql "SELECT * FROM sales" --export-csv --plot
//! ```

#![warn(clippy::all, rust_2018_idioms)]
#![expect(clippy::print_stdout, clippy::print_stderr)] // CLI output

mod cli;

use clap::Parser as _;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();

    // Logging is best-effort: a read-only root should not block queries.
    // A missing root is left for the command to report.
    if cli.root.is_dir()
        && let Err(e) = datapulse::logging::init(&cli.root)
    {
        eprintln!("Warning: logging disabled: {e:#}");
    }

    match cli::run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(target: datapulse::logging::FILE_ONLY_TARGET, "{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
