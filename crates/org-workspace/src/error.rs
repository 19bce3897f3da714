//! Error types for the organization profile.

use portal_api::ApiError;
use portal_storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrgError {
    /// No stored session to act on behalf of
    #[error("You must be signed in to continue.")]
    NotSignedIn,

    /// Refresh failed or returned no access token
    #[error("Your session is no longer valid. Please sign in again.")]
    SessionExpired,

    /// Rejected locally before any request was made
    #[error("{0}")]
    Validation(String),

    /// The `create_org` edge function refused the request
    #[error("{}", format_create_org_error(*.status, .message))]
    CreateOrg { status: Option<u16>, message: String },

    #[error("Unable to generate a signed URL for this file.")]
    SignedUrlUnavailable,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OrgError {
    /// Whether the edge function call should be retried after a refresh.
    pub(crate) fn wants_token_refresh(&self) -> bool {
        match self {
            OrgError::CreateOrg { status, message } => {
                *status == Some(401) || message.to_lowercase().contains("jwt")
            }
            _ => false,
        }
    }
}

fn format_create_org_error(status: Option<u16>, message: &str) -> String {
    match status {
        Some(400) => format!("400 Bad Request: {}", message),
        Some(401) => format!("401 Unauthorized: {}", message),
        Some(409) => format!("409 Conflict: {}", message),
        _ => message.to_string(),
    }
}

pub type OrgResult<T> = Result<T, OrgError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn create_org(status: Option<u16>, message: &str) -> OrgError {
        OrgError::CreateOrg {
            status,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_create_org_error_prefixes() {
        assert_eq!(
            create_org(Some(400), "slug taken").to_string(),
            "400 Bad Request: slug taken"
        );
        assert_eq!(
            create_org(Some(401), "Invalid JWT").to_string(),
            "401 Unauthorized: Invalid JWT"
        );
        assert_eq!(
            create_org(Some(409), "Organization exists").to_string(),
            "409 Conflict: Organization exists"
        );
        assert_eq!(create_org(Some(500), "boom").to_string(), "boom");
        assert_eq!(create_org(None, "offline").to_string(), "offline");
    }

    #[test]
    fn test_refresh_trigger() {
        assert!(create_org(Some(401), "nope").wants_token_refresh());
        assert!(create_org(Some(400), "JWT expired").wants_token_refresh());
        assert!(!create_org(Some(409), "exists").wants_token_refresh());
        assert!(!OrgError::NotSignedIn.wants_token_refresh());
    }
}
