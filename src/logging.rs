//! Logging configuration and initialization for depot.

use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::prelude::*;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::Result;

/// HTTP stack targets capped at warn.
const QUIET_TARGETS: &[&str] = &["hyper=warn", "hyper_util=warn", "h2=warn"];

/// Parse log level string to tracing Level.
fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Log file to append to, or `None` when `logging.file` is blank.
fn log_file_path(config: &LoggingConfig) -> Option<&Path> {
    let file = config.file.trim();
    (!file.is_empty()).then(|| Path::new(file))
}

/// Build the filter: `RUST_LOG`, then the configured level, then the
/// HTTP stack caps.
fn build_filter(level: &str) -> EnvFilter {
    let mut filter = EnvFilter::from_default_env().add_directive(parse_level(level).into());
    for target in QUIET_TARGETS {
        if let Ok(directive) = target.parse::<Directive>() {
            filter = filter.add_directive(directive);
        }
    }
    filter
}

/// Open `path` for appending, creating its directory first.
fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    Ok(File::options().create(true).append(true).open(path)?)
}

/// Initialize the logging system with the given configuration.
///
/// Logs always go to stdout. When `logging.file` is set they are also
/// appended there.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let writer = match log_file_path(config) {
        Some(path) => {
            let log_file = Arc::new(open_log_file(path)?);
            BoxMakeWriter::new(std::io::stdout.and(log_file))
        }
        None => BoxMakeWriter::new(std::io::stdout),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false),
        )
        .with(build_filter(&config.level))
        .init();

    Ok(())
}

/// Initialize console-only logging (for development/testing).
pub fn init_console_only(level: &str) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .with(build_filter(level))
        .init();
}
