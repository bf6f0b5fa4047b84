//! Logging setup for the datapulse binary.
//!
//! Two targets:
//!
//! - **stderr**: compact, `warn` by default, overridable with `RUST_LOG`. Stdout
//!   is left for query results. Events on [`FILE_ONLY_TARGET`] never reach it.
//! - **file**: `<root>/.datapulse/logs/datapulse.<date>.log` at `info`, rotated
//!   daily with 10 files retained.
//!
//! ```no_run
//! use std::path::Path;
//!
//! datapulse::logging::init(Path::new(".")).expect("Failed to initialize logging");
//! tracing::info!("Command started");
//! ```

use crate::catalog::CATALOG_DIR;
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer as _, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

/// Target for events that only belong in the log file, such as the final
/// command error the binary already prints on stderr.
pub const FILE_ONLY_TARGET: &str = "datapulse::file_only";

/// Log directory for a project root.
pub fn log_dir(root: &Path) -> PathBuf {
    root.join(CATALOG_DIR).join("logs")
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns error if the log directory cannot be created, the file appender
/// fails, or a subscriber is already installed.
pub fn init(root: &Path) -> Result<()> {
    let log_dir = log_dir(root);
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(10)
        .filename_prefix("datapulse")
        .filename_suffix("log")
        .build(&log_dir)
        .context("Failed to create file appender")?;

    let spec = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_else(|_| "warn".to_owned());
    let console_filter = console_filter(&spec)?;

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .with_filter(console_filter);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false)
        .with_writer(file_appender)
        .with_filter(EnvFilter::new("datapulse=info"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::debug!("Logging initialized, log directory: {}", log_dir.display());
    Ok(())
}

/// Console filter for `spec`, with [`FILE_ONLY_TARGET`] always silenced.
fn console_filter(spec: &str) -> Result<EnvFilter> {
    let silenced = format!("{FILE_ONLY_TARGET}=off")
        .parse()
        .context("Failed to parse console directive")?;
    Ok(EnvFilter::try_new(spec)
        .context("Failed to create env filter")?
        .add_directive(silenced))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if let Ok(mut inner) = self.0.lock() {
                inner.extend_from_slice(buf);
            }
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_console_skips_file_only_events() -> anyhow::Result<()> {
        let captured = Captured::default();
        let writer = captured.clone();
        let layer = fmt::layer()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .with_filter(console_filter("trace")?);
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            tracing::error!(target: FILE_ONLY_TARGET, "already printed");
            tracing::warn!("shown on console");
        });

        let bytes = captured.0.lock().map(|b| b.clone()).unwrap_or_default();
        let output = String::from_utf8(bytes)?;
        assert!(output.contains("shown on console"));
        assert!(!output.contains("already printed"));
        Ok(())
    }

    #[test]
    fn test_log_dir() {
        let dir = log_dir(Path::new("/project"));
        assert_eq!(dir, PathBuf::from("/project/.datapulse/logs"));
    }
}
