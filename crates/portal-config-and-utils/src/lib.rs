//! Configuration, file system layout and logging bootstrap for the client portal.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{
    Config, Profile, DEFAULT_API_BASE_URL, DEFAULT_LOG_LEVEL, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_SUPABASE_ANON_KEY, DEFAULT_SUPABASE_URL,
};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, parse_level};
pub use paths::Paths;
