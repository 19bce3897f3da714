//! Auth verifier: turns a stored token into a server-confirmed user.

use portal_api::{ApiError, AuthBackend, ErrorKind};
use portal_storage::User;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    /// Backend rejected the token
    #[error("Token rejected: {0}")]
    Unauthorized(String),

    /// Request could not complete
    #[error("Backend unreachable: {0}")]
    Network(String),

    /// Backend answered without a usable user
    #[error("Verification returned no usable user")]
    MissingUser,

    /// Any other backend failure
    #[error("Verification failed: {0}")]
    Backend(ApiError),
}

impl VerifyError {
    pub fn is_transient(&self) -> bool {
        matches!(self, VerifyError::Network(_))
    }
}

impl From<ApiError> for VerifyError {
    fn from(e: ApiError) -> Self {
        match e.kind() {
            ErrorKind::Unauthorized => VerifyError::Unauthorized(e.message().to_string()),
            ErrorKind::NetworkError => VerifyError::Network(e.message().to_string()),
            _ => VerifyError::Backend(e),
        }
    }
}

/// Single-attempt "who am I" round-trip. Every failure, including an
/// unreachable backend, is a verification failure.
#[derive(Clone)]
pub struct AuthVerifier {
    backend: Arc<dyn AuthBackend>,
}

impl AuthVerifier {
    pub fn new(backend: Arc<dyn AuthBackend>) -> Self {
        Self { backend }
    }

    pub async fn verify(&self, token: &str) -> Result<User, VerifyError> {
        if token.trim().is_empty() {
            return Err(VerifyError::Unauthorized("empty token".to_string()));
        }

        let user = self.backend.current_user(token).await?;
        if !user.is_identified() {
            return Err(VerifyError::MissingUser);
        }

        debug!(user_id = %user.id, "Token verified");
        Ok(user)
    }
}
