//! # Observability
//!
//! Logging setup shared by the client portal binaries.
//!
//! Library crates only emit `tracing` events. Binaries call
//! [`init_with_config`] once at startup; everything after that is routed by
//! the subscriber installed here.
//!
//! ## Dev Mode
//!
//! With the `dev` feature (on by default) every process appends structured
//! JSONL to `~/.nhd-portal/logs/dev.jsonl`:
//!
//! - `tail -f ~/.nhd-portal/logs/dev.jsonl | jq` for pretty JSON
//! - `lnav ~/.nhd-portal/logs/dev.jsonl` for interactive exploration
//!
//! Field values whose names look like credentials (`token`, `password`,
//! `authorization`, ...) are masked before they reach the file.
//!
//! ## Usage
//!
//! ```rust,ignore
//! observability::init_with_config(observability::LogConfig {
//!     service_name: "nhd-portal".into(),
//!     default_level: "debug".into(),
//!     also_stderr: true,
//!     ..Default::default()
//! })?;
//! tracing::info!("portal started");
//! ```

#[cfg(feature = "dev")]
mod dev;

mod json_layer;

use std::path::PathBuf;

pub use json_layer::{is_sensitive_field, LogEntry, REDACTED};

/// Directory under the home directory that holds portal runtime files.
pub const DEFAULT_BASE_DIR_NAME: &str = ".nhd-portal";

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the emitting binary, written into every log line.
    pub service_name: String,

    /// Default filter directive (e.g. "debug", "info,portal_api=trace").
    /// `RUST_LOG` takes precedence when set.
    pub default_level: String,

    /// Custom log file path. Defaults to `~/.nhd-portal/logs/dev.jsonl`.
    pub log_path: Option<PathBuf>,

    /// Also emit compact human-readable logs to stderr.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: false,
        }
    }
}

/// Errors raised while installing the subscriber.
#[derive(Debug)]
pub enum InitError {
    /// The log file or its parent directory could not be opened.
    LogFile {
        path: PathBuf,
        source: std::io::Error,
    },
    /// No home directory and no explicit `log_path`.
    NoHomeDir,
    /// A global subscriber was already installed.
    AlreadyInitialized,
}

impl std::fmt::Display for InitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InitError::LogFile { path, source } => {
                write!(f, "failed to open log file {}: {}", path.display(), source)
            }
            InitError::NoHomeDir => write!(f, "could not determine home directory for logs"),
            InitError::AlreadyInitialized => write!(f, "logging already initialized"),
        }
    }
}

impl std::error::Error for InitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InitError::LogFile { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Initialize with default settings for the given service.
pub fn init(service_name: &str) -> Result<(), InitError> {
    init_with_config(LogConfig {
        service_name: service_name.into(),
        ..Default::default()
    })
}

/// Initialize the global tracing subscriber.
pub fn init_with_config(config: LogConfig) -> Result<(), InitError> {
    #[cfg(feature = "dev")]
    {
        dev::init_dev_subscriber(&config)
    }

    #[cfg(not(feature = "dev"))]
    {
        use tracing_subscriber::util::SubscriberInitExt;
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.default_level)),
            )
            .with_target(true)
            .compact()
            .with_writer(std::io::stderr)
            .finish()
            .try_init()
            .map_err(|_| InitError::AlreadyInitialized)
    }
}

/// Default central log path, `~/.nhd-portal/logs/dev.jsonl`.
pub fn default_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(DEFAULT_BASE_DIR_NAME).join("logs").join("dev.jsonl"))
}

pub use tracing::{debug, error, info, instrument, trace, warn};
pub use tracing::Level;
