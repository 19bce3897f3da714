//! Organization creation through the `create_org` edge function.

use crate::slug::{build_valid_slug, is_valid_slug};
use crate::supabase::{parse_response, SupabaseClient};
use crate::{OrgError, OrgResult};
use portal_api::ApiError;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde::Serialize;
use tracing::{debug, info, warn};

const DEFAULT_CREATE_ERROR: &str = "Unable to create organization.";

/// Body of `POST /functions/v1/create_org`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateOrgRequest {
    pub name: String,
    pub slug: String,
}

impl CreateOrgRequest {
    /// Trim the name and derive a valid slug from `raw_slug` (or the name).
    pub fn build(name: &str, raw_slug: &str) -> OrgResult<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(OrgError::Validation("Organization name is required.".to_string()));
        }
        let slug = build_valid_slug(raw_slug, name);
        if !is_valid_slug(&slug) {
            return Err(OrgError::Validation(
                "Slug must match: ^[a-z0-9][a-z0-9-]{1,62}[a-z0-9]$".to_string(),
            ));
        }
        Ok(Self {
            name: name.to_string(),
            slug,
        })
    }
}

impl SupabaseClient {
    /// Create an organization owned by the signed-in user.
    ///
    /// A 401 or a JWT complaint triggers one token refresh and one retry.
    pub async fn create_org(&self, request: &CreateOrgRequest) -> OrgResult<()> {
        let token = self.tokens.token().ok_or(OrgError::SessionExpired)?;

        match self.invoke_create_org(request, &token).await {
            Ok(()) => {}
            Err(e) if e.wants_token_refresh() => {
                debug!(error = %e, "create_org rejected the token, refreshing");
                let refreshed = self.refresh_session().await.map_err(|e| {
                    warn!(error = %e, "Token refresh failed");
                    OrgError::SessionExpired
                })?;
                self.invoke_create_org(request, &refreshed.token).await?;
            }
            Err(e) => return Err(e),
        }

        info!(slug = %request.slug, "Organization created");
        Ok(())
    }

    async fn invoke_create_org(&self, request: &CreateOrgRequest, token: &str) -> OrgResult<()> {
        let url = format!("{}/functions/v1/create_org", self.api_url);
        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .json(request)
            .send()
            .await
            .map_err(|e| OrgError::CreateOrg {
                status: None,
                message: ApiError::from(e).message().to_string(),
            })?;

        match parse_response(&Method::POST, &url, response).await {
            Ok(_) => Ok(()),
            Err(e) => Err(create_org_error(e)),
        }
    }
}

fn create_org_error(error: ApiError) -> OrgError {
    let status = match &error {
        ApiError::Validation { .. } => Some(400),
        ApiError::Unauthorized { .. } => Some(401),
        ApiError::Conflict { .. } => Some(409),
        ApiError::NotFound { .. } => Some(404),
        ApiError::RateLimited { .. } => Some(429),
        ApiError::Server { status, .. } => Some(*status),
        ApiError::Unknown { status, .. } => *status,
        ApiError::Network { .. } => None,
    };
    let message = if error.message().starts_with("HTTP error!") {
        DEFAULT_CREATE_ERROR.to_string()
    } else {
        error.message().to_string()
    };
    OrgError::CreateOrg { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request() {
        let request = CreateOrgRequest::build("  Acme Corp ", "").unwrap();
        assert_eq!(request.name, "Acme Corp");
        assert_eq!(request.slug, "acme-corp");

        let request = CreateOrgRequest::build("Acme", "Acme HQ").unwrap();
        assert_eq!(request.slug, "acme-hq");
    }

    #[test]
    fn test_build_rejects_blank_name() {
        let err = CreateOrgRequest::build("   ", "acme").unwrap_err();
        assert_eq!(err.to_string(), "Organization name is required.");
    }

    #[test]
    fn test_error_mapping_keeps_server_message() {
        let err = create_org_error(ApiError::Conflict {
            message: "Slug already in use".to_string(),
        });
        assert_eq!(err.to_string(), "409 Conflict: Slug already in use");
    }

    #[test]
    fn test_error_mapping_default_message() {
        let err = create_org_error(ApiError::Validation {
            message: "HTTP error! status: 400".to_string(),
        });
        assert_eq!(err.to_string(), "400 Bad Request: Unable to create organization.");
    }
}
