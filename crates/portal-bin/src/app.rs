//! Wiring: storage, backend client and session for the configured profile.

use org_workspace::{OrgWorkspace, SupabaseClient};
use portal_api::{AuthBackend, RestClient};
use portal_auth::{GuardDecision, Navigator, RouteGuard, SessionManager};
use portal_config_and_utils::{Config, Paths, Profile};
use portal_storage::{FileStorage, OrgSelection, PreferencesStore, SecureStorage, TokenStore, User};
use std::sync::Arc;
use tracing::debug;

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// The concrete client behind the session.
#[derive(Clone)]
pub enum Backend {
    Rest(Arc<RestClient>),
    Organization(Arc<SupabaseClient>),
}

/// A CLI has no page to leave; the redirect target is reported instead.
pub struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn hard_redirect(&self, path: &str) {
        debug!(path, "Redirect requested");
        eprintln!("-> {}", path);
    }
}

pub struct AppContext {
    pub config: Config,
    pub paths: Paths,
    pub storage: Arc<dyn SecureStorage>,
    pub tokens: TokenStore,
    pub backend: Backend,
    pub session: Arc<SessionManager>,
}

impl AppContext {
    pub fn build(config: Config, paths: Paths) -> CliResult<Self> {
        paths.ensure_dirs()?;
        let storage: Arc<dyn SecureStorage> = Arc::new(FileStorage::new(paths.storage_file()));
        let tokens = TokenStore::new(storage.clone());

        let (backend, auth): (Backend, Arc<dyn AuthBackend>) = match config.profile {
            Profile::Rest => {
                let client = Arc::new(RestClient::with_timeout(
                    config.api_url(),
                    tokens.clone(),
                    config.request_timeout(),
                )?);
                (Backend::Rest(client.clone()), client)
            }
            Profile::Organization => {
                let client = Arc::new(SupabaseClient::with_timeout(
                    config.supabase_url.clone(),
                    config.supabase_anon_key.clone(),
                    tokens.clone(),
                    config.request_timeout(),
                )?);
                (Backend::Organization(client.clone()), client)
            }
        };
        debug!(profile = ?config.profile, "Backend selected");

        let session = Arc::new(SessionManager::new(
            auth,
            tokens.clone(),
            Arc::new(TerminalNavigator),
        ));

        Ok(Self {
            config,
            paths,
            storage,
            tokens,
            backend,
            session,
        })
    }

    pub fn preferences(&self) -> PreferencesStore {
        PreferencesStore::new(self.storage.clone())
    }

    pub fn rest(&self) -> CliResult<&Arc<RestClient>> {
        match &self.backend {
            Backend::Rest(client) => Ok(client),
            Backend::Organization(_) => {
                Err("this command needs the rest profile (set NHD_PROFILE=rest)".into())
            }
        }
    }

    pub fn workspace(&self) -> CliResult<OrgWorkspace> {
        match &self.backend {
            Backend::Organization(client) => Ok(OrgWorkspace::new(
                client.clone(),
                OrgSelection::new(self.storage.clone()),
            )),
            Backend::Rest(_) => Err(
                "this command needs the organization profile (set NHD_PROFILE=organization)".into(),
            ),
        }
    }

    /// Verify the stored credential and run the route guard for `route`.
    pub async fn require_user(&self, route: &str) -> CliResult<User> {
        self.session.initialize().await;
        match RouteGuard::new(self.session.clone()).resolve(route).await {
            GuardDecision::Render(user) => Ok(user),
            GuardDecision::Redirect(to) => {
                Err(format!("not allowed here, redirected to {} (try `nhd-portal login`)", to).into())
            }
            GuardDecision::Loading => Err("session did not resolve".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_rest_profile_wiring() {
        let dir = tempdir().unwrap();
        let ctx = AppContext::build(Config::default(), Paths::with_base_dir(dir.path().into())).unwrap();

        assert_eq!(ctx.rest().unwrap().api_url(), ctx.config.api_url());
        assert!(ctx.workspace().is_err());
    }

    #[test]
    fn test_organization_profile_wiring() {
        let dir = tempdir().unwrap();
        let config = Config {
            profile: Profile::Organization,
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "anon".to_string(),
            ..Config::default()
        };
        let ctx = AppContext::build(config, Paths::with_base_dir(dir.path().into())).unwrap();

        assert!(ctx.rest().is_err());
        assert_eq!(ctx.workspace().unwrap().client().api_url(), "http://localhost:54321");
    }

    #[test]
    fn test_credential_persists_in_storage_file() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().into());
        let ctx = AppContext::build(Config::default(), paths.clone()).unwrap();
        ctx.tokens
            .save(&portal_storage::Credential::new("T1", User::default()))
            .unwrap();

        let reopened = AppContext::build(Config::default(), paths).unwrap();
        assert_eq!(reopened.tokens.token().as_deref(), Some("T1"));
    }
}
