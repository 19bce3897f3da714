//! HTTP client for the custom REST backend.

use crate::backend::{AuthBackend, MessageBackend};
use crate::models::{
    AuthResponse, HealthStatus, Message, MessageDraft, MessagesEnvelope, Project, ProjectDraft,
    ProjectEnvelope, ProjectsEnvelope, Registration, User, UserEnvelope, UserUpdate,
    UsersEnvelope, VerifyResponse,
};
use crate::retry::RetryPolicy;
use crate::{ApiError, ApiResult};
use async_trait::async_trait;
use portal_storage::{Credential, TokenStore};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Which bearer token, if any, a request carries.
enum Bearer<'a> {
    /// Whatever the token store currently holds.
    Stored,
    /// An explicit token, e.g. one being verified.
    Token(&'a str),
}

/// Client for `{api_base_url}/api`.
///
/// Every request reads the bearer token from the token store at send time, so
/// a login or logout elsewhere takes effect on the next call.
#[derive(Clone)]
pub struct RestClient {
    http: Client,
    api_url: String,
    tokens: TokenStore,
    retry: RetryPolicy,
}

impl RestClient {
    pub fn new(api_url: impl Into<String>, tokens: TokenStore) -> ApiResult<Self> {
        Self::with_timeout(api_url, tokens, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        api_url: impl Into<String>,
        tokens: TokenStore,
        timeout: Duration,
    ) -> ApiResult<Self> {
        let api_url = api_url.into();
        url::Url::parse(&api_url)?;
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            tokens,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    // =========================================================================
    // Auth
    // =========================================================================

    pub async fn register(&self, registration: &Registration) -> ApiResult<AuthResponse> {
        let body = serde_json::to_value(registration)?;
        self.request(Method::POST, "/auth/register", Some(body)).await
    }

    pub async fn login(&self, email: &str, password: &str) -> ApiResult<AuthResponse> {
        let body = json!({ "email": email, "password": password });
        self.request(Method::POST, "/auth/login", Some(body)).await
    }

    /// `GET /auth/me` with an explicit token. Single attempt.
    pub async fn me(&self, token: &str) -> ApiResult<User> {
        let value = self
            .send_once(Method::GET, "/auth/me", None, Bearer::Token(token))
            .await?;
        let envelope: UserEnvelope = serde_json::from_value(value)?;
        match envelope.user {
            Some(user) if user.is_identified() => Ok(user),
            _ => Err(ApiError::unknown("Verification response did not include a user")),
        }
    }

    /// `GET /auth/verify` with an explicit token. Single attempt.
    pub async fn verify(&self, token: &str) -> ApiResult<VerifyResponse> {
        let value = self
            .send_once(Method::GET, "/auth/verify", None, Bearer::Token(token))
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn health(&self) -> ApiResult<HealthStatus> {
        self.request(Method::GET, "/health", None).await
    }

    // =========================================================================
    // Projects
    // =========================================================================

    pub async fn list_projects(&self) -> ApiResult<Vec<Project>> {
        let envelope: ProjectsEnvelope = self.request(Method::GET, "/projects", None).await?;
        Ok(envelope.projects)
    }

    pub async fn create_project(&self, draft: &ProjectDraft) -> ApiResult<Project> {
        let body = serde_json::to_value(draft)?;
        let envelope: ProjectEnvelope = self.request(Method::POST, "/projects", Some(body)).await?;
        envelope
            .project
            .ok_or_else(|| ApiError::unknown("Create response did not include a project"))
    }

    pub async fn update_project(&self, id: &str, draft: &ProjectDraft) -> ApiResult<Option<Project>> {
        let body = serde_json::to_value(draft)?;
        let path = format!("/projects/{}", urlencoding::encode(id));
        let envelope: ProjectEnvelope = self.request(Method::PUT, &path, Some(body)).await?;
        Ok(envelope.project)
    }

    pub async fn delete_project(&self, id: &str) -> ApiResult<()> {
        let path = format!("/projects/{}", urlencoding::encode(id));
        self.request::<Value>(Method::DELETE, &path, None).await?;
        Ok(())
    }

    // =========================================================================
    // Messages
    // =========================================================================

    pub async fn list_messages(&self) -> ApiResult<Vec<Message>> {
        let envelope: MessagesEnvelope = self.request(Method::GET, "/messages", None).await?;
        Ok(envelope.messages)
    }

    pub async fn send_message(&self, draft: &MessageDraft) -> ApiResult<()> {
        let body = serde_json::to_value(draft)?;
        self.request::<Value>(Method::POST, "/messages", Some(body)).await?;
        Ok(())
    }

    pub async fn reply(&self, message_id: &str, content: &str) -> ApiResult<()> {
        let path = format!("/messages/{}/reply", urlencoding::encode(message_id));
        let body = json!({ "content": content });
        self.request::<Value>(Method::POST, &path, Some(body)).await?;
        Ok(())
    }

    pub async fn mark_read(&self, message_id: &str) -> ApiResult<()> {
        let path = format!("/messages/{}/read", urlencoding::encode(message_id));
        self.request::<Value>(Method::PUT, &path, None).await?;
        Ok(())
    }

    // =========================================================================
    // Users (admin)
    // =========================================================================

    pub async fn list_users(&self) -> ApiResult<Vec<User>> {
        let envelope: UsersEnvelope = self.request(Method::GET, "/users", None).await?;
        Ok(envelope.users)
    }

    pub async fn update_user(&self, id: &str, update: &UserUpdate) -> ApiResult<Option<User>> {
        let body = serde_json::to_value(update)?;
        let path = format!("/users/{}", urlencoding::encode(id));
        let envelope: UserEnvelope = self.request(Method::PUT, &path, Some(body)).await?;
        Ok(envelope.user)
    }

    /// Deactivates the account; the backend keeps the record.
    pub async fn delete_user(&self, id: &str) -> ApiResult<()> {
        let path = format!("/users/{}", urlencoding::encode(id));
        self.request::<Value>(Method::DELETE, &path, None).await?;
        Ok(())
    }

    // =========================================================================
    // Request helper
    // =========================================================================

    /// Send with the stored token, retrying per the client's policy.
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> ApiResult<T> {
        let what = format!("{} {}", method, path);
        let client = self;
        let body = body.as_ref();
        let value = self
            .retry
            .run(&what, move || {
                client.send_once(method.clone(), path, body, Bearer::Stored)
            })
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn send_once(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        bearer: Bearer<'_>,
    ) -> ApiResult<Value> {
        let url = format!("{}{}", self.api_url, path);
        let mut request = self
            .http
            .request(method.clone(), &url)
            .header(CONTENT_TYPE, "application/json");

        let token = match bearer {
            Bearer::Stored => self.tokens.token(),
            Bearer::Token(token) => Some(token.to_string()),
        };
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        debug!(%method, path, status = status.as_u16(), "API response");

        if status.is_success() {
            if text.trim().is_empty() {
                return Ok(Value::Null);
            }
            return Ok(serde_json::from_str(&text)?);
        }

        let message = error_message(&text)
            .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()));
        warn!(%method, path, status = status.as_u16(), error = %message, "API request failed");
        Err(ApiError::from_status(status, message))
    }
}

/// `{error}` or `{message}` from an error body.
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["error", "message"]
        .iter()
        .filter_map(|key| value.get(*key).and_then(Value::as_str))
        .find(|msg| !msg.trim().is_empty())
        .map(str::to_string)
}

#[async_trait]
impl AuthBackend for RestClient {
    async fn login(&self, email: &str, password: &str) -> ApiResult<Credential> {
        let response = RestClient::login(self, email, password).await?;
        Ok(Credential::new(response.token, response.user))
    }

    async fn register(&self, registration: &Registration) -> ApiResult<Credential> {
        let response = RestClient::register(self, registration).await?;
        Ok(Credential::new(response.token, response.user))
    }

    async fn current_user(&self, token: &str) -> ApiResult<User> {
        self.me(token).await
    }
}

#[async_trait]
impl MessageBackend for RestClient {
    async fn list_messages(&self) -> ApiResult<Vec<Message>> {
        RestClient::list_messages(self).await
    }

    async fn send_message(&self, draft: &MessageDraft) -> ApiResult<()> {
        RestClient::send_message(self, draft).await
    }

    async fn reply_to_message(&self, message_id: &str, content: &str) -> ApiResult<()> {
        self.reply(message_id, content).await
    }

    async fn mark_as_read(&self, message_id: &str) -> ApiResult<()> {
        self.mark_read(message_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_storage::MemoryStorage;
    use std::sync::Arc;

    fn tokens() -> TokenStore {
        TokenStore::new(Arc::new(MemoryStorage::new()))
    }

    #[test]
    fn test_error_message_prefers_error_field() {
        assert_eq!(
            error_message(r#"{"error":"Invalid credentials","message":"ignored"}"#).as_deref(),
            Some("Invalid credentials")
        );
        assert_eq!(
            error_message(r#"{"message":"Validation failed"}"#).as_deref(),
            Some("Validation failed")
        );
        assert_eq!(error_message(r#"{"error":""}"#), None);
        assert_eq!(error_message("<html>oops</html>"), None);
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        assert!(RestClient::new("not a url", tokens()).is_err());
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = RestClient::new("http://localhost:5000/api/", tokens()).unwrap();
        assert_eq!(client.api_url(), "http://localhost:5000/api");
    }
}
