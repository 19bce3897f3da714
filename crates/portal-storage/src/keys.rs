//! Storage key constants.

/// Keys shared with the browser build of the portal, so an exported
/// localStorage dump can be dropped into `storage.json` as-is.
pub struct StorageKeys;

impl StorageKeys {
    /// Bearer token
    pub const AUTH_TOKEN: &'static str = "nhd_auth_token";

    /// Cached user snapshot (JSON)
    pub const USER_DATA: &'static str = "nhd_user_data";

    /// Refresh token (organization profile only)
    pub const REFRESH_TOKEN: &'static str = "nhd_refresh_token";

    /// Selected organization id (organization profile only)
    pub const CURRENT_ORG_ID: &'static str = "nhd_current_org_id";

    /// "light" or "dark"
    pub const THEME: &'static str = "nhd-theme";

    /// Notification and security preference blob (JSON)
    pub const PROFILE_PREFERENCES: &'static str = "nhd_profile_preferences";

    pub const ALL: [&'static str; 6] = [
        Self::AUTH_TOKEN,
        Self::USER_DATA,
        Self::REFRESH_TOKEN,
        Self::CURRENT_ORG_ID,
        Self::THEME,
        Self::PROFILE_PREFERENCES,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_keys_are_unique() {
        let unique: std::collections::HashSet<_> = StorageKeys::ALL.iter().collect();
        assert_eq!(unique.len(), StorageKeys::ALL.len(), "Storage keys must be unique");
        assert!(StorageKeys::ALL.iter().all(|k| !k.is_empty()));
    }
}
