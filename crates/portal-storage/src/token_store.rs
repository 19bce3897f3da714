//! Token store: the persisted credential.
//!
//! Nothing read from here is trusted. At startup the session layer must send
//! the token to the backend before treating the snapshot as an identity.

use crate::{SecureStorage, StorageKeys, StorageResult, User};
use std::sync::Arc;
use tracing::{debug, warn};

/// Bearer token plus the user snapshot saved alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    /// Only issued by the organization profile's auth backend.
    pub refresh_token: Option<String>,
    pub user: User,
}

impl Credential {
    pub fn new(token: impl Into<String>, user: User) -> Self {
        Self {
            token: token.into(),
            refresh_token: None,
            user,
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }
}

#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn SecureStorage>,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn SecureStorage>) -> Self {
        Self { storage }
    }

    /// Persist token and snapshot, replacing whatever was stored.
    ///
    /// A credential without a refresh token removes any stale one.
    pub fn save(&self, credential: &Credential) -> StorageResult<()> {
        self.storage.set(StorageKeys::AUTH_TOKEN, &credential.token)?;
        self.save_user(&credential.user)?;
        match &credential.refresh_token {
            Some(refresh) => self.storage.set(StorageKeys::REFRESH_TOKEN, refresh)?,
            None => {
                self.storage.delete(StorageKeys::REFRESH_TOKEN)?;
            }
        }
        debug!(user_id = %credential.user.id, "Credential saved");
        Ok(())
    }

    /// Replace only the cached snapshot, e.g. after a verification round-trip.
    pub fn save_user(&self, user: &User) -> StorageResult<()> {
        let json = serde_json::to_string(user)?;
        self.storage.set(StorageKeys::USER_DATA, &json)
    }

    /// Replace the token pair after a refresh, keeping the snapshot.
    pub fn save_tokens(&self, token: &str, refresh_token: Option<&str>) -> StorageResult<()> {
        self.storage.set(StorageKeys::AUTH_TOKEN, token)?;
        if let Some(refresh) = refresh_token {
            self.storage.set(StorageKeys::REFRESH_TOKEN, refresh)?;
        }
        Ok(())
    }

    /// Whatever is persisted, unvalidated.
    ///
    /// Storage failures read as "nothing stored". A token whose snapshot is
    /// missing or unreadable still loads, with an empty placeholder snapshot,
    /// since verification will replace it anyway.
    pub fn load(&self) -> Option<Credential> {
        let token = self.token()?;

        let user = match self.storage.get(StorageKeys::USER_DATA) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "Cached user snapshot is unreadable, ignoring it");
                User::default()
            }),
            Ok(None) => User::default(),
            Err(e) => {
                warn!(error = %e, "Failed to read cached user snapshot");
                User::default()
            }
        };

        Some(Credential {
            token,
            refresh_token: self.refresh_token(),
            user,
        })
    }

    /// The bearer token, for request headers.
    pub fn token(&self) -> Option<String> {
        self.read(StorageKeys::AUTH_TOKEN)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read(StorageKeys::REFRESH_TOKEN)
    }

    /// Remove token, refresh token and snapshot. Safe to call repeatedly.
    pub fn clear(&self) -> StorageResult<()> {
        self.storage.delete(StorageKeys::AUTH_TOKEN)?;
        self.storage.delete(StorageKeys::REFRESH_TOKEN)?;
        self.storage.delete(StorageKeys::USER_DATA)?;
        debug!("Credential cleared");
        Ok(())
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.storage.get(key) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                warn!(key = %key, error = %e, "Storage unavailable, treating as empty");
                None
            }
        }
    }
}
