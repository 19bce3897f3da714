//! API error taxonomy.
//!
//! Every failure that leaves this crate is one of a fixed set of kinds, so
//! callers can branch on [`ErrorKind`] instead of parsing messages.

use reqwest::StatusCode;
use thiserror::Error;

/// Coarse classification used for retry decisions and user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unauthorized,
    NetworkError,
    ValidationError,
    ServerError,
    NotFound,
    Conflict,
    RateLimited,
    Unknown,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Bad, expired or revoked credential (401/403)
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// Backend unreachable, connection dropped, or request timed out
    #[error("Network error: {message}")]
    Network { message: String, timed_out: bool },

    /// Missing or malformed input, rejected locally or with 400/422
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// 5xx
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Rate limited: {message}")]
    RateLimited { message: String },

    #[error("{message}")]
    Unknown {
        message: String,
        status: Option<u16>,
    },
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized {
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        ApiError::Network {
            message: message.into(),
            timed_out: false,
        }
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        ApiError::Unknown {
            message: message.into(),
            status: None,
        }
    }

    /// Classify a non-2xx response by status, falling back to the message
    /// text for statuses without a fixed meaning.
    pub fn from_status(status: StatusCode, message: impl Into<String>) -> Self {
        let message = message.into();
        match status.as_u16() {
            400 | 422 => ApiError::Validation { message },
            401 | 403 => ApiError::Unauthorized { message },
            404 => ApiError::NotFound { message },
            408 => ApiError::Network {
                message,
                timed_out: true,
            },
            409 => ApiError::Conflict { message },
            429 => ApiError::RateLimited { message },
            code @ 500..=599 => ApiError::Server {
                status: code,
                message,
            },
            code => match Self::from_message(&message) {
                ApiError::Unknown { message, .. } => ApiError::Unknown {
                    message,
                    status: Some(code),
                },
                classified => classified,
            },
        }
    }

    /// Classify from free-form error text, for errors that carry no status.
    pub fn from_message(message: &str) -> Self {
        let lower = message.to_lowercase();
        let owned = message.to_string();

        if lower.contains("timeout") || lower.contains("timed out") {
            ApiError::Network {
                message: owned,
                timed_out: true,
            }
        } else if lower.contains("network") || lower.contains("fetch") || lower.contains("connection")
        {
            ApiError::Network {
                message: owned,
                timed_out: false,
            }
        } else if lower.contains("unauthorized")
            || lower.contains("401")
            || (lower.contains("invalid")
                && (lower.contains("credential") || lower.contains("password")))
        {
            ApiError::Unauthorized { message: owned }
        } else if lower.contains("rate limit") || lower.contains("429") {
            ApiError::RateLimited { message: owned }
        } else if lower.contains("500") || lower.contains("server error") {
            ApiError::Server {
                status: 500,
                message: owned,
            }
        } else if lower.contains("not found") || lower.contains("404") {
            ApiError::NotFound { message: owned }
        } else {
            ApiError::Unknown {
                message: owned,
                status: None,
            }
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Unauthorized { .. } => ErrorKind::Unauthorized,
            ApiError::Network { .. } => ErrorKind::NetworkError,
            ApiError::Validation { .. } => ErrorKind::ValidationError,
            ApiError::Server { .. } => ErrorKind::ServerError,
            ApiError::NotFound { .. } => ErrorKind::NotFound,
            ApiError::Conflict { .. } => ErrorKind::Conflict,
            ApiError::RateLimited { .. } => ErrorKind::RateLimited,
            ApiError::Unknown { .. } => ErrorKind::Unknown,
        }
    }

    /// The server's (or transport's) message without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            ApiError::Unauthorized { message }
            | ApiError::Network { message, .. }
            | ApiError::Validation { message }
            | ApiError::Server { message, .. }
            | ApiError::NotFound { message }
            | ApiError::Conflict { message }
            | ApiError::RateLimited { message }
            | ApiError::Unknown { message, .. } => message,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Network { timed_out: true, .. })
    }

    /// Network failures, timeouts and 502/503 are retried by the request
    /// helper. Everything else propagates immediately.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Network { .. } => true,
            ApiError::Server { status, .. } => matches!(status, 502 | 503),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Network {
                message: e.to_string(),
                timed_out: true,
            }
        } else if e.is_connect() || e.is_request() || e.is_body() {
            ApiError::network(e.to_string())
        } else if let Some(status) = e.status() {
            ApiError::from_status(status, e.to_string())
        } else if e.is_decode() {
            ApiError::unknown(format!("Invalid response body: {}", e))
        } else {
            ApiError::network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::unknown(format!("Invalid response body: {}", e))
    }
}

impl From<url::ParseError> for ApiError {
    fn from(e: url::ParseError) -> Self {
        ApiError::unknown(format!("Invalid URL: {}", e))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        let cases = [
            (400, ErrorKind::ValidationError),
            (401, ErrorKind::Unauthorized),
            (403, ErrorKind::Unauthorized),
            (404, ErrorKind::NotFound),
            (409, ErrorKind::Conflict),
            (422, ErrorKind::ValidationError),
            (429, ErrorKind::RateLimited),
            (500, ErrorKind::ServerError),
            (503, ErrorKind::ServerError),
        ];
        for (code, kind) in cases {
            let status = StatusCode::from_u16(code).unwrap();
            assert_eq!(ApiError::from_status(status, "x").kind(), kind, "status {}", code);
        }
    }

    #[test]
    fn test_request_timeout_status_is_network_timeout() {
        let err = ApiError::from_status(StatusCode::REQUEST_TIMEOUT, "slow");
        assert!(err.is_timeout());
        assert!(err.is_retryable());
    }

    #[test]
    fn test_unmapped_status_uses_message_text() {
        let err = ApiError::from_status(StatusCode::IM_A_TEAPOT, "Invalid credentials");
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        let err = ApiError::from_status(StatusCode::IM_A_TEAPOT, "short and stout");
        assert_eq!(
            err,
            ApiError::Unknown {
                message: "short and stout".to_string(),
                status: Some(418)
            }
        );
    }

    #[test]
    fn test_message_classification() {
        assert_eq!(ApiError::from_message("Failed to fetch").kind(), ErrorKind::NetworkError);
        assert!(ApiError::from_message("Request timeout").is_timeout());
        assert_eq!(ApiError::from_message("Invalid password").kind(), ErrorKind::Unauthorized);
        assert_eq!(ApiError::from_message("Rate limit exceeded").kind(), ErrorKind::RateLimited);
        assert_eq!(ApiError::from_message("Internal server error").kind(), ErrorKind::ServerError);
        assert_eq!(ApiError::from_message("Project not found").kind(), ErrorKind::NotFound);
        assert_eq!(ApiError::from_message("boom").kind(), ErrorKind::Unknown);
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(ApiError::network("down").is_retryable());
        assert!(ApiError::Server { status: 502, message: String::new() }.is_retryable());
        assert!(ApiError::Server { status: 503, message: String::new() }.is_retryable());
        assert!(!ApiError::Server { status: 500, message: String::new() }.is_retryable());
        assert!(!ApiError::unauthorized("no").is_retryable());
        assert!(!ApiError::validation("no").is_retryable());
        assert!(!ApiError::RateLimited { message: String::new() }.is_retryable());
    }

    #[test]
    fn test_message_strips_kind_prefix() {
        let err = ApiError::from_status(StatusCode::UNAUTHORIZED, "Invalid credentials");
        assert_eq!(err.message(), "Invalid credentials");
        assert_eq!(err.to_string(), "Unauthorized: Invalid credentials");
    }
}
