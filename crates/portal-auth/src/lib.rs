//! Session bootstrap and token trust for the portal.
//!
//! A stored credential is only an identity claim. [`SessionManager::initialize`]
//! sends it to the backend through the [`AuthVerifier`] before anything is
//! rendered, and the [`RouteGuard`] refuses to render until that resolves.

mod error;
mod error_messages;
mod guard;
mod navigator;
mod session;
pub mod session_fsm;
mod validation;
mod verifier;

pub use error::{AuthError, AuthResult};
pub use error_messages::{ErrorContext, ErrorMessage, Severity};
pub use guard::{
    is_admin_route, landing_route, GuardDecision, RouteGuard, ADMIN_ROUTE, DASHBOARD_ROUTE,
    LOGIN_ROUTE,
};
pub use navigator::{Navigator, RecordingNavigator};
pub use session::{AuthOutcome, Session, SessionManager, LOGOUT_REDIRECT};
pub use session_fsm::SessionState;
pub use validation::{
    is_strong_password, is_valid_email, validate_login, validate_registration, MIN_PASSWORD_LEN,
};
pub use verifier::{AuthVerifier, VerifyError};
