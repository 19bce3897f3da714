//! User-facing error catalog.
//!
//! Failures shown to a person are always one of these entries, picked by
//! [`ErrorMessage::for_error`] from the error kind and what the user was doing.

use portal_api::{ApiError, ErrorKind};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// What the user was doing when the error happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorContext {
    Login,
    Register,
    Message,
    Reply,
    Project,
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ErrorMessage {
    /// Catalog key, e.g. `AUTH.INVALID_CREDENTIALS`.
    pub code: &'static str,
    pub title: &'static str,
    pub message: &'static str,
    pub action: Option<&'static str>,
    pub severity: Severity,
}

macro_rules! catalog {
    ($($name:ident = $code:literal, $sev:ident, $title:literal, $message:literal, $action:literal;)*) => {
        impl ErrorMessage {
            $(
                pub const $name: ErrorMessage = ErrorMessage {
                    code: $code,
                    title: $title,
                    message: $message,
                    action: Some($action),
                    severity: Severity::$sev,
                };
            )*

            /// Every catalog entry.
            pub const ALL: &'static [ErrorMessage] = &[$(ErrorMessage::$name),*];
        }
    };
}

catalog! {
    AUTH_INVALID_CREDENTIALS = "AUTH.INVALID_CREDENTIALS", Error,
        "Login Failed",
        "The email or password you entered is incorrect. Please check your credentials and try again.",
        "Forgot your password? Contact support for assistance.";
    AUTH_ACCOUNT_LOCKED = "AUTH.ACCOUNT_LOCKED", Warning,
        "Account Temporarily Locked",
        "Your account has been temporarily locked due to multiple failed login attempts. Please wait 15 minutes before trying again.",
        "Contact support if you need immediate access.";
    AUTH_TOKEN_EXPIRED = "AUTH.TOKEN_EXPIRED", Info,
        "Session Expired",
        "Your session has expired for security reasons. Please log in again to continue.",
        "Log in again to continue.";
    AUTH_NETWORK_ERROR = "AUTH.NETWORK_ERROR", Error,
        "Connection Problem",
        "Unable to connect to our servers. Please check your internet connection and try again.",
        "If the problem persists, contact support.";
    AUTH_SERVER_ERROR = "AUTH.SERVER_ERROR", Error,
        "Server Error",
        "We're experiencing technical difficulties. Our team has been notified and is working to resolve this.",
        "Please try again in a few minutes.";

    VALIDATION_REQUIRED_FIELD = "VALIDATION.REQUIRED_FIELD", Warning,
        "Required Information Missing",
        "Please fill in all required fields to continue.",
        "Check the fields you left empty.";
    VALIDATION_INVALID_EMAIL = "VALIDATION.INVALID_EMAIL", Warning,
        "Invalid Email Format",
        "Please enter a valid email address (e.g., user@company.com).",
        "Check for typos in your email address.";
    VALIDATION_WEAK_PASSWORD = "VALIDATION.WEAK_PASSWORD", Warning,
        "Password Too Weak",
        "Your password must be at least 8 characters long and include letters and numbers.",
        "Try adding numbers or special characters.";
    VALIDATION_PASSWORD_MISMATCH = "VALIDATION.PASSWORD_MISMATCH", Warning,
        "Passwords Don't Match",
        "The passwords you entered don't match. Please try again.",
        "Make sure both password fields are identical.";

    API_NETWORK_TIMEOUT = "API.NETWORK_TIMEOUT", Warning,
        "Request Timed Out",
        "The request is taking longer than expected. This might be due to a slow connection.",
        "Please try again or check your internet connection.";
    API_RATE_LIMITED = "API.RATE_LIMITED", Warning,
        "Too Many Requests",
        "You've made too many requests in a short time. Please wait a moment before trying again.",
        "Wait 30 seconds before retrying.";
    API_UNAUTHORIZED = "API.UNAUTHORIZED", Error,
        "Access Denied",
        "You don't have permission to perform this action. Please contact your administrator.",
        "Contact support if you believe this is an error.";
    API_NOT_FOUND = "API.NOT_FOUND", Error,
        "Resource Not Found",
        "The requested information could not be found. It may have been moved or deleted.",
        "Try refreshing or contact support.";
    API_CONFLICT = "API.CONFLICT", Warning,
        "Conflict Detected",
        "This action conflicts with existing data. Please review and try again.",
        "Check for duplicate entries or conflicting information.";

    PROJECTS_CREATE_FAILED = "PROJECTS.CREATE_FAILED", Error,
        "Project Creation Failed",
        "We couldn't create your project request. This might be due to missing information or a server issue.",
        "Please review your project details and try again.";
    PROJECTS_UPDATE_FAILED = "PROJECTS.UPDATE_FAILED", Error,
        "Project Update Failed",
        "We couldn't save your project changes. Your data is safe and hasn't been modified.",
        "Please try again or contact support if the problem persists.";
    PROJECTS_DELETE_FAILED = "PROJECTS.DELETE_FAILED", Error,
        "Project Deletion Failed",
        "We couldn't delete the project. It may be in use or you may not have permission.",
        "Contact support if you need to delete this project.";

    MESSAGES_SEND_FAILED = "MESSAGES.SEND_FAILED", Error,
        "Message Not Sent",
        "We couldn't send your message. Please check your connection and try again.",
        "Try sending your message again.";
    MESSAGES_REPLY_FAILED = "MESSAGES.REPLY_FAILED", Error,
        "Reply Not Sent",
        "We couldn't send your reply. The original message is still available.",
        "Try sending your reply again.";
    MESSAGES_LOAD_FAILED = "MESSAGES.LOAD_FAILED", Error,
        "Messages Not Loaded",
        "We couldn't load your messages. This might be a temporary connection issue.",
        "Try refreshing or contact support.";

    FILES_TOO_LARGE = "FILES.TOO_LARGE", Warning,
        "File Too Large",
        "The file you're trying to upload is too large. Maximum size is 10MB.",
        "Try compressing the file or choose a smaller file.";
    FILES_INVALID_TYPE = "FILES.INVALID_TYPE", Warning,
        "Invalid File Type",
        "This file type is not supported. Please use PDF, DOC, DOCX, or image files.",
        "Convert your file to a supported format.";
    FILES_UPLOAD_FAILED = "FILES.UPLOAD_FAILED", Error,
        "Upload Failed",
        "We couldn't upload your file. This might be due to a connection issue.",
        "Try uploading again or contact support.";

    SYSTEM_UNEXPECTED_ERROR = "SYSTEM.UNEXPECTED_ERROR", Error,
        "Unexpected Error",
        "Something went wrong that we didn't expect. Our team has been notified.",
        "Please try again or contact support if the problem continues.";
    SYSTEM_MAINTENANCE = "SYSTEM.MAINTENANCE", Info,
        "System Maintenance",
        "We're currently performing scheduled maintenance. The system will be back online shortly.",
        "Please try again in a few minutes.";
    SYSTEM_FEATURE_UNAVAILABLE = "SYSTEM.FEATURE_UNAVAILABLE", Info,
        "Feature Temporarily Unavailable",
        "This feature is currently being updated and is temporarily unavailable.",
        "Please try again later or use an alternative method.";
}

impl ErrorMessage {
    /// Pick the catalog entry for an API failure.
    pub fn for_error(error: &ApiError, context: ErrorContext) -> ErrorMessage {
        match error.kind() {
            ErrorKind::Unauthorized => match context {
                ErrorContext::Login | ErrorContext::Register => Self::AUTH_INVALID_CREDENTIALS,
                _ => Self::AUTH_TOKEN_EXPIRED,
            },
            ErrorKind::NetworkError if error.is_timeout() => Self::API_NETWORK_TIMEOUT,
            ErrorKind::NetworkError => Self::AUTH_NETWORK_ERROR,
            ErrorKind::ServerError => Self::AUTH_SERVER_ERROR,
            ErrorKind::RateLimited => Self::API_RATE_LIMITED,
            ErrorKind::NotFound => Self::API_NOT_FOUND,
            ErrorKind::Conflict => Self::API_CONFLICT,
            ErrorKind::ValidationError => match context {
                ErrorContext::Login | ErrorContext::Register => Self::VALIDATION_REQUIRED_FIELD,
                _ => Self::fallback(context),
            },
            ErrorKind::Unknown => Self::fallback(context),
        }
    }

    /// Entry used when nothing more specific is known.
    pub fn fallback(context: ErrorContext) -> ErrorMessage {
        match context {
            ErrorContext::Login => Self::AUTH_INVALID_CREDENTIALS,
            ErrorContext::Message => Self::MESSAGES_SEND_FAILED,
            ErrorContext::Reply => Self::MESSAGES_REPLY_FAILED,
            ErrorContext::Project => Self::PROJECTS_CREATE_FAILED,
            ErrorContext::Register | ErrorContext::General => Self::SYSTEM_UNEXPECTED_ERROR,
        }
    }

    /// Look an entry up by catalog code.
    pub fn by_code(code: &str) -> Option<ErrorMessage> {
        Self::ALL.iter().copied().find(|m| m.code == code)
    }

    /// The action line with a retry allowance appended.
    pub fn action_with_retry(&self, max_retries: u32) -> String {
        let suffix = format!("You can try again up to {} times.", max_retries);
        match self.action {
            Some(action) => format!("{} {}", action, suffix),
            None => suffix,
        }
    }
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}
