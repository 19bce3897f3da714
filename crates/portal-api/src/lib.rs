//! REST client for the portal backend.
//!
//! Wire models, the error taxonomy shared by every backend profile, the
//! retrying request helper, and the [`AuthBackend`] / [`MessageBackend`]
//! seams consumed by the session and sync layers.

mod backend;
mod client;
mod error;
pub mod models;
mod retry;

#[cfg(any(test, feature = "test-support"))]
pub mod test_server;

pub use backend::{AuthBackend, MessageBackend};
pub use client::RestClient;
pub use error::{ApiError, ApiResult, ErrorKind};
pub use models::{
    AuthResponse, ClientRef, ClientSummary, HealthStatus, Message, MessageDraft, Priority,
    Project, ProjectDraft, Registration, Reply, User, UserUpdate, VerifyResponse,
};
pub use retry::RetryPolicy;
