//! Supabase client for the organization profile.
//!
//! Covers GoTrue auth (`/auth/v1`), PostgREST (`/rest/v1`), storage
//! (`/storage/v1`) and edge functions (`/functions/v1`). Every request sends
//! the project's anon key as `apikey`; the bearer is the stored access token,
//! or the anon key itself when nobody is signed in.

use async_trait::async_trait;
use portal_api::{ApiError, ApiResult, AuthBackend, Registration, User};
use portal_storage::{Credential, TokenStore};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Password and refresh grant response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    user: SupabaseUser,
}

/// The subset of a GoTrue user record the portal shows.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct SupabaseUser {
    id: String,
    email: Option<String>,
    created_at: Option<String>,
    last_sign_in_at: Option<String>,
    user_metadata: UserMetadata,
    app_metadata: AppMetadata,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct UserMetadata {
    name: Option<String>,
    full_name: Option<String>,
    company: Option<String>,
    avatar_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct AppMetadata {
    role: Option<String>,
}

impl From<SupabaseUser> for User {
    fn from(u: SupabaseUser) -> Self {
        let email = u.email.unwrap_or_default();
        let name = u
            .user_metadata
            .name
            .or(u.user_metadata.full_name)
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| email.clone());
        User {
            id: u.id,
            name,
            email,
            company: u.user_metadata.company.unwrap_or_default(),
            role: u.app_metadata.role.unwrap_or_else(|| "client".to_string()),
            is_active: Some(true),
            avatar: u.user_metadata.avatar_url,
            created_at: u.created_at,
            last_login: u.last_sign_in_at,
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize)]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    data: SignUpMetadata<'a>,
}

#[derive(Debug, Serialize)]
struct SignUpMetadata<'a> {
    name: &'a str,
    company: &'a str,
}

/// Which bearer a request carries.
pub(crate) enum Bearer<'a> {
    /// Stored access token, falling back to the anon key.
    Session,
    Token(&'a str),
}

#[derive(Clone)]
pub struct SupabaseClient {
    pub(crate) http: Client,
    pub(crate) api_url: String,
    pub(crate) anon_key: String,
    pub(crate) tokens: TokenStore,
}

impl SupabaseClient {
    /// Create a client for `api_url` (e.g. `https://xyz.supabase.co`).
    pub fn new(
        api_url: impl Into<String>,
        anon_key: impl Into<String>,
        tokens: TokenStore,
    ) -> ApiResult<Self> {
        Self::with_timeout(api_url, anon_key, tokens, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        api_url: impl Into<String>,
        anon_key: impl Into<String>,
        tokens: TokenStore,
        timeout: Duration,
    ) -> ApiResult<Self> {
        let api_url = api_url.into();
        url::Url::parse(&api_url)?;
        Ok(Self {
            http: Client::builder().timeout(timeout).build()?,
            api_url: api_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            tokens,
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Build the REST API URL for a table.
    pub(crate) fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.api_url, table)
    }

    // =========================================================================
    // Auth
    // =========================================================================

    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> ApiResult<Credential> {
        let url = format!("{}/auth/v1/token?grant_type=password", self.api_url);
        debug!("Attempting password sign-in");
        let body = json!({ "email": email, "password": password });
        let value = self
            .send(Method::POST, &url, Some(&body), Bearer::Token(&self.anon_key))
            .await
            .map_err(|e| match e {
                // GoTrue answers a bad password with 400 invalid_grant.
                ApiError::Validation { message } => ApiError::Unauthorized { message },
                other => other,
            })?;
        let credential = credential_from(serde_json::from_value(value)?);
        info!(user_id = %credential.user.id, "Signed in");
        Ok(credential)
    }

    /// Sign up. Projects that require email confirmation return no session,
    /// which is reported as an error since nothing can be stored.
    pub async fn sign_up(&self, registration: &Registration) -> ApiResult<Credential> {
        let url = format!("{}/auth/v1/signup", self.api_url);
        let body = serde_json::to_value(SignUpRequest {
            email: &registration.email,
            password: &registration.password,
            data: SignUpMetadata {
                name: &registration.name,
                company: &registration.company,
            },
        })?;
        let value = self
            .send(Method::POST, &url, Some(&body), Bearer::Token(&self.anon_key))
            .await?;

        if value.get("access_token").is_none() {
            return Err(ApiError::validation(
                "Account created. Confirm your email address, then sign in.",
            ));
        }
        Ok(credential_from(serde_json::from_value(value)?))
    }

    /// `GET /auth/v1/user` with an explicit access token. Single attempt.
    pub async fn get_user(&self, access_token: &str) -> ApiResult<User> {
        let url = format!("{}/auth/v1/user", self.api_url);
        let value = self
            .send(Method::GET, &url, None, Bearer::Token(access_token))
            .await?;
        let user: SupabaseUser = serde_json::from_value(value)?;
        if user.id.is_empty() {
            return Err(ApiError::unknown("Verification response did not include a user"));
        }
        Ok(user.into())
    }

    /// Exchange the stored refresh token for a new pair and persist it.
    pub async fn refresh_session(&self) -> ApiResult<Credential> {
        let refresh_token = self
            .tokens
            .refresh_token()
            .ok_or_else(|| ApiError::unauthorized("No refresh token stored"))?;
        let url = format!("{}/auth/v1/token?grant_type=refresh_token", self.api_url);
        debug!("Refreshing access token");

        let body = json!({ "refresh_token": refresh_token });
        let value = self
            .send(Method::POST, &url, Some(&body), Bearer::Token(&self.anon_key))
            .await?;
        let credential = credential_from(serde_json::from_value(value)?);

        if let Err(e) = self
            .tokens
            .save_tokens(&credential.token, credential.refresh_token.as_deref())
        {
            warn!(error = %e, "Failed to persist refreshed tokens");
        }
        info!(user_id = %credential.user.id, "Token refreshed");
        Ok(credential)
    }

    pub async fn sign_out_token(&self, access_token: &str) -> ApiResult<()> {
        let url = format!("{}/auth/v1/logout", self.api_url);
        self.send(Method::POST, &url, None, Bearer::Token(access_token))
            .await?;
        Ok(())
    }

    // =========================================================================
    // Request helper
    // =========================================================================

    pub(crate) fn bearer_value(&self, bearer: Bearer<'_>) -> String {
        match bearer {
            Bearer::Session => self
                .tokens
                .token()
                .unwrap_or_else(|| self.anon_key.clone()),
            Bearer::Token(token) => token.to_string(),
        }
    }

    pub(crate) async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        bearer: Bearer<'_>,
    ) -> ApiResult<Value> {
        let mut request = self
            .http
            .request(method.clone(), url)
            .header("apikey", &self.anon_key)
            .header(ACCEPT, "application/json")
            .bearer_auth(self.bearer_value(bearer));
        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, "application/json")
                .json(body);
        }

        let response = request.send().await?;
        parse_response(&method, url, response).await
    }
}

/// Decode a 2xx body (empty reads as null) or classify the failure.
pub(crate) async fn parse_response(
    method: &Method,
    url: &str,
    response: reqwest::Response,
) -> ApiResult<Value> {
    let status = response.status();
    let text = response.text().await?;
    let path = request_path(url);
    debug!(%method, path, status = status.as_u16(), "Supabase response");

    if status.is_success() {
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        return Ok(serde_json::from_str(&text)?);
    }

    let message = error_message(&text)
        .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()));
    warn!(%method, path, status = status.as_u16(), error = %message, "Supabase request failed");
    Err(ApiError::from_status(status, message))
}

/// GoTrue, PostgREST and storage each name the message differently.
pub(crate) fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["error_description", "msg", "message", "error"]
        .iter()
        .filter_map(|key| value.get(*key).and_then(Value::as_str))
        .find(|msg| !msg.trim().is_empty())
        .map(str::to_string)
}

/// Path component for logs; query strings can carry ids.
fn request_path(url: &str) -> &str {
    let without_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let path = without_scheme
        .find('/')
        .map(|i| &without_scheme[i..])
        .unwrap_or("/");
    path.split('?').next().unwrap_or(path)
}

fn credential_from(response: TokenResponse) -> Credential {
    let credential = Credential::new(response.access_token, response.user.into());
    match response.refresh_token {
        Some(refresh) => credential.with_refresh_token(refresh),
        None => credential,
    }
}

#[async_trait]
impl AuthBackend for SupabaseClient {
    async fn login(&self, email: &str, password: &str) -> ApiResult<Credential> {
        self.sign_in_with_password(email, password).await
    }

    async fn register(&self, registration: &Registration) -> ApiResult<Credential> {
        self.sign_up(registration).await
    }

    async fn current_user(&self, token: &str) -> ApiResult<User> {
        self.get_user(token).await
    }

    async fn sign_out(&self, token: &str) -> ApiResult<()> {
        self.sign_out_token(token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_storage::MemoryStorage;
    use std::sync::Arc;

    #[test]
    fn test_user_mapping() {
        let user: SupabaseUser = serde_json::from_value(json!({
            "id": "u-1",
            "email": "ada@example.com",
            "last_sign_in_at": "2024-05-01T10:00:00Z",
            "user_metadata": {"full_name": "Ada Lovelace", "company": "Engines"},
            "app_metadata": {"provider": "email"}
        }))
        .unwrap();
        let user: User = user.into();
        assert_eq!(user.id, "u-1");
        assert_eq!(user.name, "Ada Lovelace");
        assert_eq!(user.company, "Engines");
        assert_eq!(user.role, "client");
        assert_eq!(user.last_login.as_deref(), Some("2024-05-01T10:00:00Z"));
        assert!(user.is_identified());
    }

    #[test]
    fn test_user_name_falls_back_to_email() {
        let user: SupabaseUser =
            serde_json::from_value(json!({"id": "u-2", "email": "x@y.io"})).unwrap();
        assert_eq!(User::from(user).name, "x@y.io");
    }

    #[test]
    fn test_error_message_keys() {
        assert_eq!(
            error_message(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#)
                .as_deref(),
            Some("Invalid login credentials")
        );
        assert_eq!(
            error_message(r#"{"code":"PGRST301","message":"JWT expired"}"#).as_deref(),
            Some("JWT expired")
        );
        assert_eq!(error_message(r#"{"msg":"User not found"}"#).as_deref(), Some("User not found"));
        assert_eq!(error_message("gateway"), None);
    }

    #[test]
    fn test_request_path_strips_origin_and_query() {
        assert_eq!(
            request_path("http://127.0.0.1:54321/rest/v1/organizations?id=in.(a)"),
            "/rest/v1/organizations"
        );
        assert_eq!(request_path("https://xyz.supabase.co"), "/");
    }

    #[test]
    fn test_bearer_falls_back_to_anon_key() {
        let storage = Arc::new(MemoryStorage::new());
        let tokens = TokenStore::new(storage);
        let client = SupabaseClient::new("http://localhost:54321/", "anon", tokens.clone()).unwrap();
        assert_eq!(client.api_url(), "http://localhost:54321");
        assert_eq!(client.bearer_value(Bearer::Session), "anon");

        tokens
            .save(&Credential::new("access-1", User::default()))
            .unwrap();
        assert_eq!(client.bearer_value(Bearer::Session), "access-1");
        assert_eq!(client.bearer_value(Bearer::Token("t")), "t");
    }
}
