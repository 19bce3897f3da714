//! Route guard for protected views.

use crate::session::{Session, SessionManager};
use portal_storage::User;
use std::sync::Arc;

pub const LOGIN_ROUTE: &str = "/login";
pub const DASHBOARD_ROUTE: &str = "/dashboard";
pub const ADMIN_ROUTE: &str = "/admin";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session still resolving; show a placeholder, never the view.
    Loading,
    Render(User),
    Redirect(String),
}

/// Decides whether a protected route may render.
///
/// Reads only the in-memory session, never the token store, so a cached
/// snapshot can not leak into a rendered view before verification.
#[derive(Clone)]
pub struct RouteGuard {
    session: Arc<SessionManager>,
}

impl RouteGuard {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self { session }
    }

    pub fn check(&self, route: &str) -> GuardDecision {
        decide(&self.session.current(), route)
    }

    /// Wait for the session to settle, then decide.
    pub async fn resolve(&self, route: &str) -> GuardDecision {
        let session = self.session.wait_until_resolved().await;
        decide(&session, route)
    }
}

fn decide(session: &Session, route: &str) -> GuardDecision {
    if session.is_loading {
        return GuardDecision::Loading;
    }
    match &session.identity {
        Some(user) if is_admin_route(route) && !user.is_admin() => {
            GuardDecision::Redirect(DASHBOARD_ROUTE.to_string())
        }
        Some(user) => GuardDecision::Render(user.clone()),
        None => GuardDecision::Redirect(LOGIN_ROUTE.to_string()),
    }
}

pub fn is_admin_route(route: &str) -> bool {
    let path = route.split(['?', '#']).next().unwrap_or(route);
    path == ADMIN_ROUTE || path.starts_with("/admin/")
}

/// Where a user lands after login.
pub fn landing_route(user: &User) -> &'static str {
    if user.is_admin() {
        ADMIN_ROUTE
    } else {
        DASHBOARD_ROUTE
    }
}
