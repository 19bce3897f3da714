//! Theme and profile preferences.

use crate::{SecureStorage, StorageKeys, StorageResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl std::str::FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("unknown theme: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationPreferences {
    pub email: bool,
    pub sms: bool,
    pub push: bool,
    pub marketing: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            email: true,
            sms: false,
            push: true,
            marketing: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SecurityPreferences {
    pub two_factor: bool,
    pub session_timeout: String,
}

impl Default for SecurityPreferences {
    fn default() -> Self {
        Self {
            two_factor: false,
            session_timeout: "24 hours".to_string(),
        }
    }
}

/// Stored field by field over the defaults, so older blobs missing a key
/// still read back complete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilePreferences {
    pub notifications: NotificationPreferences,
    pub security: SecurityPreferences,
}

#[derive(Clone)]
pub struct PreferencesStore {
    storage: Arc<dyn SecureStorage>,
}

impl PreferencesStore {
    pub fn new(storage: Arc<dyn SecureStorage>) -> Self {
        Self { storage }
    }

    /// Stored theme, light when unset or unreadable.
    pub fn theme(&self) -> Theme {
        match self.storage.get(StorageKeys::THEME) {
            Ok(Some(raw)) => raw.parse::<Theme>().unwrap_or_else(|e| {
                warn!(error = %e, "Ignoring stored theme");
                Theme::default()
            }),
            Ok(None) => Theme::default(),
            Err(e) => {
                warn!(error = %e, "Failed to read theme");
                Theme::default()
            }
        }
    }

    pub fn set_theme(&self, theme: Theme) -> StorageResult<()> {
        self.storage.set(StorageKeys::THEME, theme.as_str())
    }

    pub fn toggle_theme(&self) -> StorageResult<Theme> {
        let next = self.theme().toggled();
        self.set_theme(next)?;
        Ok(next)
    }

    /// Stored preferences merged over the defaults.
    pub fn profile(&self) -> ProfilePreferences {
        match self.storage.get(StorageKeys::PROFILE_PREFERENCES) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "Stored profile preferences are unreadable");
                ProfilePreferences::default()
            }),
            Ok(None) => ProfilePreferences::default(),
            Err(e) => {
                warn!(error = %e, "Failed to read profile preferences");
                ProfilePreferences::default()
            }
        }
    }

    pub fn save_profile(&self, preferences: &ProfilePreferences) -> StorageResult<()> {
        let json = serde_json::to_string(preferences)?;
        self.storage.set(StorageKeys::PROFILE_PREFERENCES, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStorage;

    fn store() -> (Arc<MemoryStorage>, PreferencesStore) {
        let storage = Arc::new(MemoryStorage::new());
        (storage.clone(), PreferencesStore::new(storage))
    }

    #[test]
    fn test_theme_defaults_to_light_and_toggles() {
        let (storage, prefs) = store();
        assert_eq!(prefs.theme(), Theme::Light);

        assert_eq!(prefs.toggle_theme().unwrap(), Theme::Dark);
        assert_eq!(storage.get(StorageKeys::THEME).unwrap().as_deref(), Some("dark"));
        assert_eq!(prefs.toggle_theme().unwrap(), Theme::Light);
    }

    #[test]
    fn test_unknown_theme_reads_as_default() {
        let (storage, prefs) = store();
        storage.set(StorageKeys::THEME, "solarized").unwrap();
        assert_eq!(prefs.theme(), Theme::Light);
    }

    #[test]
    fn test_partial_blob_merges_over_defaults() {
        let (storage, prefs) = store();
        storage
            .set(
                StorageKeys::PROFILE_PREFERENCES,
                r#"{"notifications":{"sms":true},"security":{"twoFactor":true}}"#,
            )
            .unwrap();

        let loaded = prefs.profile();
        assert!(loaded.notifications.sms);
        assert!(loaded.notifications.email);
        assert!(!loaded.notifications.marketing);
        assert!(loaded.security.two_factor);
        assert_eq!(loaded.security.session_timeout, "24 hours");
    }

    #[test]
    fn test_corrupt_blob_reads_as_defaults() {
        let (storage, prefs) = store();
        storage.set(StorageKeys::PROFILE_PREFERENCES, "[1,2").unwrap();
        assert_eq!(prefs.profile(), ProfilePreferences::default());
    }

    #[test]
    fn test_save_profile_roundtrip() {
        let (_, prefs) = store();
        let mut updated = ProfilePreferences::default();
        updated.notifications.push = false;
        updated.security.session_timeout = "1 hour".to_string();
        prefs.save_profile(&updated).unwrap();

        assert_eq!(prefs.profile(), updated);
    }
}
