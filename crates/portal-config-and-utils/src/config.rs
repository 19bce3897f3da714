//! Portal configuration.
//!
//! Values come from three layers, later ones winning:
//! built-in defaults, `~/.nhd-portal/config.json`, then `NHD_*` environment
//! variables.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Default REST backend origin (overridable at compile time via NHD_API_BASE_URL).
pub const DEFAULT_API_BASE_URL: &str = match option_env!("NHD_API_BASE_URL") {
    Some(url) => url,
    None => "http://localhost:5000",
};

/// Default Supabase project URL for the organization profile.
pub const DEFAULT_SUPABASE_URL: &str = match option_env!("NHD_SUPABASE_URL") {
    Some(url) => url,
    None => "http://localhost:54321",
};

/// Default Supabase anon key for the organization profile.
pub const DEFAULT_SUPABASE_ANON_KEY: &str = match option_env!("NHD_SUPABASE_ANON_KEY") {
    Some(key) => key,
    None => "",
};

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Message poll cadence while a message view is mounted.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10_000;

pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 15_000;

/// Which backend the session talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    /// Custom REST API (`{api_base_url}/api`).
    #[default]
    Rest,
    /// Supabase auth, organizations and file storage.
    Organization,
}

impl std::str::FromStr for Profile {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rest" => Ok(Profile::Rest),
            "organization" | "org" => Ok(Profile::Organization),
            other => Err(CoreError::Config(format!("unknown profile: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub profile: Profile,
    /// REST backend origin, without the `/api` suffix.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_supabase_url")]
    pub supabase_url: String,
    #[serde(default = "default_supabase_anon_key")]
    pub supabase_anon_key: String,
    #[serde(default = "default_poll_interval_ms")]
    pub message_poll_interval_ms: u64,
    /// Poll messages on a timer while mounted.
    #[serde(default = "default_true")]
    pub auto_refresh: bool,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_supabase_url() -> String {
    DEFAULT_SUPABASE_URL.to_string()
}

fn default_supabase_anon_key() -> String {
    DEFAULT_SUPABASE_ANON_KEY.to_string()
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            profile: Profile::default(),
            api_base_url: default_api_base_url(),
            supabase_url: default_supabase_url(),
            supabase_anon_key: default_supabase_anon_key(),
            message_poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            auto_refresh: true,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl Config {
    /// Load `config.json` under `paths` if present, then apply the environment.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env();
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    fn load_from_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply `NHD_*` overrides from an arbitrary lookup. Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(level) = get("NHD_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(url) = get("NHD_API_BASE_URL") {
            self.api_base_url = url;
        }
        if let Some(url) = get("NHD_SUPABASE_URL") {
            self.supabase_url = url;
        }
        if let Some(key) = get("NHD_SUPABASE_ANON_KEY") {
            self.supabase_anon_key = key;
        }
        if let Some(profile) = get("NHD_PROFILE") {
            match profile.parse() {
                Ok(profile) => self.profile = profile,
                Err(e) => tracing::warn!(error = %e, "Ignoring NHD_PROFILE override"),
            }
        }
    }

    /// Reject configurations that cannot produce a working client.
    pub fn validate(&self) -> CoreResult<()> {
        self.api_base_url()?;
        if self.profile == Profile::Organization {
            self.supabase_url()?;
            if self.supabase_anon_key.is_empty() {
                return Err(CoreError::Config(
                    "organization profile requires supabase_anon_key".to_string(),
                ));
            }
        }
        if self.message_poll_interval_ms == 0 {
            return Err(CoreError::Config(
                "message_poll_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn api_base_url(&self) -> CoreResult<Url> {
        Url::parse(&self.api_base_url).map_err(CoreError::from)
    }

    /// REST root, e.g. `http://localhost:5000/api`.
    pub fn api_url(&self) -> String {
        format!("{}/api", self.api_base_url.trim_end_matches('/'))
    }

    pub fn supabase_url(&self) -> CoreResult<Url> {
        Url::parse(&self.supabase_url).map_err(CoreError::from)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.message_poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert_eq!(config.profile, Profile::Rest);
        assert_eq!(config.message_poll_interval_ms, 10_000);
        assert!(config.auto_refresh);
    }

    #[test]
    fn test_api_url_appends_api_suffix() {
        let mut config = Config::default();
        config.api_base_url = "https://api.northheaddigital.com/".to_string();
        assert_eq!(config.api_url(), "https://api.northheaddigital.com/api");
    }

    #[test]
    fn test_config_load_from_file_partial() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        std::fs::write(
            &config_path,
            r#"{ "log_level": "debug", "profile": "organization", "auto_refresh": false }"#,
        )
        .unwrap();

        let config = Config::load_from_file(&config_path).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.profile, Profile::Organization);
        assert!(!config.auto_refresh);
        assert_eq!(config.message_poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
    }

    #[test]
    fn test_config_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        let mut config = Config::default();
        config.message_poll_interval_ms = 2_500;
        config.save(&paths).unwrap();

        let loaded = Config::load_from_file(&paths.config_file()).unwrap();
        assert_eq!(loaded.message_poll_interval_ms, 2_500);
    }

    #[test]
    fn test_overrides_win_and_blank_values_are_ignored() {
        let env: HashMap<&str, &str> = [
            ("NHD_LOG_LEVEL", "trace"),
            ("NHD_API_BASE_URL", "https://api.example.com"),
            ("NHD_SUPABASE_URL", "  "),
            ("NHD_PROFILE", "org"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.log_level, "trace");
        assert_eq!(config.api_base_url, "https://api.example.com");
        assert_eq!(config.supabase_url, DEFAULT_SUPABASE_URL);
        assert_eq!(config.profile, Profile::Organization);
    }

    #[test]
    fn test_unknown_profile_override_is_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|name| (name == "NHD_PROFILE").then(|| "mainframe".to_string()));
        assert_eq!(config.profile, Profile::Rest);
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut config = Config::default();
        config.api_base_url = "not a url".to_string();
        assert!(matches!(config.validate(), Err(CoreError::InvalidUrl(_))));
    }

    #[test]
    fn test_validate_organization_requires_anon_key() {
        let mut config = Config::default();
        config.profile = Profile::Organization;
        config.supabase_anon_key = String::new();
        assert!(matches!(config.validate(), Err(CoreError::Config(_))));

        config.supabase_anon_key = "anon".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_poll_interval() {
        let mut config = Config::default();
        config.message_poll_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_durations() {
        let config = Config::default();
        assert_eq!(config.poll_interval(), Duration::from_secs(10));
        assert_eq!(config.request_timeout(), Duration::from_secs(15));
    }
}
