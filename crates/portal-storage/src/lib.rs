//! Persistent client-side state for the portal.
//!
//! A small key-value abstraction ([`SecureStorage`]) with a JSON-file backend
//! for real use and an in-memory backend for tests, plus typed views over it:
//!
//! - [`TokenStore`]: bearer token, refresh token and cached user snapshot
//! - [`PreferencesStore`]: theme and profile notification/security settings
//! - [`OrgSelection`]: currently selected organization (organization profile)

mod file;
mod keys;
mod memory;
mod org_selection;
mod preferences;
mod token_store;
mod traits;
mod user;

pub use file::FileStorage;
pub use keys::StorageKeys;
pub use memory::MemoryStorage;
pub use org_selection::OrgSelection;
pub use preferences::{
    NotificationPreferences, PreferencesStore, ProfilePreferences, SecurityPreferences, Theme,
};
pub use token_store::{Credential, TokenStore};
pub use traits::SecureStorage;
pub use user::User;

use thiserror::Error;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backend could not be read or written
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Stored value is not in the expected format
    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;
