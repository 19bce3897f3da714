//! Session management with FSM-based state tracking.
//!
//! `SessionManager` owns the in-memory session and is the only writer of the
//! token store during login, registration, verification and logout. Every
//! mutation is published on a watch channel so guards and views can react
//! without polling.

use crate::error_messages::{ErrorContext, ErrorMessage};
use crate::navigator::Navigator;
use crate::session_fsm::{SessionMachine, SessionMachineInput, SessionState};
use crate::validation;
use crate::verifier::AuthVerifier;
use crate::{AuthError, AuthResult};
use parking_lot::Mutex;
use portal_api::{AuthBackend, Registration};
use portal_storage::{Credential, TokenStore, User};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Where a hard logout lands.
pub const LOGOUT_REDIRECT: &str = "/";

/// Snapshot of the session as published to observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    /// Server-confirmed user. Never populated from the cached snapshot alone.
    pub identity: Option<User>,
    /// True from construction until startup verification resolves, and while
    /// a login or registration is in flight.
    pub is_loading: bool,
    pub state: SessionState,
}

impl Session {
    fn initial() -> Self {
        Self {
            identity: None,
            is_loading: true,
            state: SessionState::Initializing,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.is_authenticated() && self.identity.is_some()
    }
}

/// `{success, error}` shape of a login or registration attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorMessage>,
}

impl From<&Result<User, ErrorMessage>> for AuthOutcome {
    fn from(result: &Result<User, ErrorMessage>) -> Self {
        match result {
            Ok(_) => AuthOutcome {
                success: true,
                error: None,
            },
            Err(message) => AuthOutcome {
                success: false,
                error: Some(*message),
            },
        }
    }
}

pub struct SessionManager {
    backend: Arc<dyn AuthBackend>,
    verifier: AuthVerifier,
    tokens: TokenStore,
    navigator: Arc<dyn Navigator>,
    /// Internal FSM for tracking session state transitions.
    fsm: Mutex<SessionMachine>,
    session: watch::Sender<Session>,
    /// Bumped by every logout; an exchange that began under an older value
    /// must not persist its credential.
    logout_epoch: AtomicU64,
}

impl SessionManager {
    pub fn new(
        backend: Arc<dyn AuthBackend>,
        tokens: TokenStore,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let (session, _) = watch::channel(Session::initial());
        Self {
            verifier: AuthVerifier::new(backend.clone()),
            backend,
            tokens,
            navigator,
            fsm: Mutex::new(SessionMachine::new()),
            session,
            logout_epoch: AtomicU64::new(0),
        }
    }

    /// Current FSM state.
    pub fn state(&self) -> SessionState {
        SessionState::from(self.fsm.lock().state())
    }

    pub fn current(&self) -> Session {
        self.session.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.session.subscribe()
    }

    /// Wait until startup verification (and any in-flight login) settles.
    pub async fn wait_until_resolved(&self) -> Session {
        let mut rx = self.subscribe();
        let resolved = match rx.wait_for(|s| !s.is_loading).await {
            Ok(session) => session.clone(),
            Err(_) => self.current(),
        };
        resolved
    }

    fn transition(&self, input: &SessionMachineInput) -> AuthResult<SessionState> {
        let mut fsm = self.fsm.lock();
        let old_state = SessionState::from(fsm.state());

        fsm.consume(input).map_err(|_| {
            AuthError::InvalidStateTransition(format!(
                "Cannot apply {:?} in state {:?}",
                input, old_state
            ))
        })?;

        let new_state = SessionState::from(fsm.state());
        drop(fsm);

        if old_state != new_state {
            debug!(
                old_state = ?old_state,
                new_state = ?new_state,
                "Session state transition"
            );
        }
        self.session.send_modify(|s| s.state = new_state);

        Ok(new_state)
    }

    fn publish(&self, identity: Option<User>, is_loading: bool) {
        self.session.send_modify(|s| {
            s.identity = identity;
            s.is_loading = is_loading;
        });
    }

    fn set_loading(&self, is_loading: bool) {
        self.session.send_modify(|s| s.is_loading = is_loading);
    }

    /// Startup: verify whatever the token store holds before trusting it.
    ///
    /// Any verification failure, including an unreachable backend, clears the
    /// stored credential. A second call is a no-op returning the current
    /// session.
    pub async fn initialize(&self) -> Session {
        let Some(credential) = self.tokens.load() else {
            if self.transition(&SessionMachineInput::NoStoredToken).is_ok() {
                info!("No stored credential");
                self.publish(None, false);
            }
            return self.current();
        };

        if self
            .transition(&SessionMachineInput::StoredTokenFound)
            .is_err()
        {
            return self.current();
        }

        match self.verifier.verify(&credential.token).await {
            Ok(user) if self.tokens.token().as_deref() == Some(credential.token.as_str()) => {
                if let Err(e) = self.tokens.save_user(&user) {
                    warn!(error = %e, "Failed to refresh cached user snapshot");
                }
                let _ = self.transition(&SessionMachineInput::VerifySucceeded);
                info!(user_id = %user.id, "Session restored");
                self.publish(Some(user), false);
            }
            Ok(_) => {
                debug!("Credential changed during verification, discarding result");
                let _ = self.transition(&SessionMachineInput::VerifyFailed);
                self.publish(None, false);
            }
            Err(e) => {
                warn!(error = %e, "Stored credential failed verification, clearing it");
                if let Err(e) = self.tokens.clear() {
                    warn!(error = %e, "Failed to clear stored credential");
                }
                let _ = self.transition(&SessionMachineInput::VerifyFailed);
                self.publish(None, false);
            }
        }

        self.current()
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, ErrorMessage> {
        validation::validate_login(email, password)?;
        let epoch = self.begin(&SessionMachineInput::LoginAttempt)?;

        let result = self.backend.login(email.trim(), password).await;
        self.finish(
            epoch,
            result,
            ErrorContext::Login,
            &SessionMachineInput::LoginSucceeded,
            &SessionMachineInput::LoginFailed,
        )
        .await
    }

    pub async fn register(&self, registration: &Registration) -> Result<User, ErrorMessage> {
        validation::validate_registration(registration)?;
        let epoch = self.begin(&SessionMachineInput::RegisterAttempt)?;

        let registration = Registration {
            email: registration.email.trim().to_string(),
            ..registration.clone()
        };
        let result = self.backend.register(&registration).await;
        self.finish(
            epoch,
            result,
            ErrorContext::Register,
            &SessionMachineInput::RegisterSucceeded,
            &SessionMachineInput::RegisterFailed,
        )
        .await
    }

    /// Returns the logout epoch the exchange started under.
    fn begin(&self, attempt: &SessionMachineInput) -> Result<u64, ErrorMessage> {
        if let Err(e) = self.transition(attempt) {
            warn!(error = %e, "Credential exchange rejected in current state");
            return Err(ErrorMessage::SYSTEM_UNEXPECTED_ERROR);
        }
        let epoch = self.logout_epoch.load(Ordering::SeqCst);
        self.set_loading(true);
        Ok(epoch)
    }

    async fn finish(
        &self,
        epoch: u64,
        result: portal_api::ApiResult<Credential>,
        context: ErrorContext,
        succeeded: &SessionMachineInput,
        failed: &SessionMachineInput,
    ) -> Result<User, ErrorMessage> {
        let credential = match result {
            Ok(credential) => credential,
            Err(e) => {
                warn!(error = %e, ?context, "Credential exchange failed");
                let _ = self.transition(failed);
                self.set_loading(false);
                return Err(ErrorMessage::for_error(&e, context));
            }
        };

        if self.logout_epoch.load(Ordering::SeqCst) != epoch {
            info!(?context, "Logged out during credential exchange, dropping credential");
            if let Err(e) = self.backend.sign_out(&credential.token).await {
                debug!(error = %e, "Server-side sign-out failed");
            }
            let _ = self.transition(failed);
            self.publish(None, false);
            return Err(ErrorMessage::SYSTEM_UNEXPECTED_ERROR);
        }

        if let Err(e) = self.tokens.save(&credential) {
            warn!(error = %e, "Failed to persist credential");
            let _ = self.transition(failed);
            self.set_loading(false);
            return Err(ErrorMessage::SYSTEM_UNEXPECTED_ERROR);
        }

        let _ = self.transition(succeeded);
        info!(user_id = %credential.user.id, ?context, "Authenticated");
        self.publish(Some(credential.user.clone()), false);
        Ok(credential.user)
    }

    /// Clear the credential, reset the session and hard-redirect to `/`.
    ///
    /// Safe from any state; a logout without a session still clears storage
    /// and redirects.
    pub async fn logout(&self) {
        self.logout_epoch.fetch_add(1, Ordering::SeqCst);
        let was_authenticated = self
            .transition(&SessionMachineInput::LogoutRequested)
            .is_ok();

        if let Some(token) = self.tokens.token() {
            if let Err(e) = self.backend.sign_out(&token).await {
                debug!(error = %e, "Server-side sign-out failed");
            }
        }
        if let Err(e) = self.tokens.clear() {
            warn!(error = %e, "Failed to clear stored credential");
        }

        if was_authenticated {
            let _ = self.transition(&SessionMachineInput::LogoutComplete);
        }
        info!("Logged out");
        self.session.send_modify(|s| {
            s.identity = None;
            if !s.state.is_transient() {
                s.is_loading = false;
            }
        });
        self.navigator.hard_redirect(LOGOUT_REDIRECT);
    }

    /// Replace the identity after a profile edit.
    pub fn update_profile_snapshot(&self, user: User) -> AuthResult<()> {
        if !self.state().is_authenticated() {
            return Err(AuthError::NotLoggedIn);
        }
        self.tokens.save_user(&user)?;
        self.session.send_modify(|s| s.identity = Some(user));
        Ok(())
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }
}
