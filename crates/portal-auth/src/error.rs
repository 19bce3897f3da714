//! Session error types.

use crate::verifier::VerifyError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    /// Operation needs an authenticated session
    #[error("Not logged in")]
    NotLoggedIn,

    /// Invalid state transition in the session FSM
    #[error("Invalid session state transition: {0}")]
    InvalidStateTransition(String),

    /// Stored token failed verification
    #[error("Verification failed: {0}")]
    Verification(#[from] VerifyError),

    #[error("Storage error: {0}")]
    Storage(#[from] portal_storage::StorageError),

    #[error(transparent)]
    Api(#[from] portal_api::ApiError),
}

impl AuthError {
    /// True when retrying the same operation later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            AuthError::Api(e) => e.is_retryable(),
            AuthError::Verification(e) => e.is_transient(),
            _ => false,
        }
    }
}

pub type AuthResult<T> = Result<T, AuthError>;
