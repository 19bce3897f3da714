//! Logging initialization.
//!
//! Thin wrapper over the `observability` package: structured JSONL goes to
//! `<base_dir>/logs/dev.jsonl`, and `RUST_LOG` overrides the level passed in.

use crate::{CoreResult, Paths};

/// Install the global subscriber for a portal binary.
///
/// `verbose` mirrors events to stderr in compact form.
pub fn init_logging(service_name: &str, level: &str, paths: &Paths, verbose: bool) -> CoreResult<()> {
    paths.ensure_dirs()?;
    observability::init_with_config(observability::LogConfig {
        service_name: service_name.into(),
        default_level: parse_level(level).as_str().to_ascii_lowercase(),
        log_path: Some(paths.log_file()),
        also_stderr: verbose,
    })?;
    Ok(())
}

/// Parse a log level string; unknown values fall back to INFO.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.trim().to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
