//! Seams between the session/sync layers and a concrete backend.

use crate::models::{Message, MessageDraft, Registration};
use crate::ApiResult;
use async_trait::async_trait;
use portal_storage::{Credential, User};

/// Credential exchange and "who am I" for one deployment profile.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Exchange email and password for a credential.
    async fn login(&self, email: &str, password: &str) -> ApiResult<Credential>;

    /// Create an account; success implies an authenticated credential.
    async fn register(&self, registration: &Registration) -> ApiResult<Credential>;

    /// Resolve a token to the authoritative user record. Never retried.
    async fn current_user(&self, token: &str) -> ApiResult<User>;

    /// Best-effort server-side sign-out.
    async fn sign_out(&self, _token: &str) -> ApiResult<()> {
        Ok(())
    }
}

/// The message collection as seen by the current user.
#[async_trait]
pub trait MessageBackend: Send + Sync {
    async fn list_messages(&self) -> ApiResult<Vec<Message>>;

    async fn send_message(&self, draft: &MessageDraft) -> ApiResult<()>;

    async fn reply_to_message(&self, message_id: &str, content: &str) -> ApiResult<()>;

    async fn mark_as_read(&self, message_id: &str) -> ApiResult<()>;
}
