//! Current-organization resolution and the per-organization dashboard.

use crate::create_org::CreateOrgRequest;
use crate::files::OrgStorageFile;
use crate::queries::{ActiveMembership, OrgProjectRecord, OrganizationRecord};
use crate::supabase::SupabaseClient;
use crate::{OrgError, OrgResult};
use portal_storage::OrgSelection;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where a signed-in user without an organization is sent.
pub const CREATE_ORGANIZATION_ROUTE: &str = "/create-organization";
/// Organization dashboard.
pub const APP_ROUTE: &str = "/app";

/// Outcome of resolving which organization the user is working in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrgLanding {
    /// No active membership; the selection has been cleared.
    NeedsOrganization,
    Ready {
        org_id: String,
        memberships: Vec<ActiveMembership>,
    },
}

impl OrgLanding {
    pub fn route(&self) -> &'static str {
        match self {
            OrgLanding::NeedsOrganization => CREATE_ORGANIZATION_ROUTE,
            OrgLanding::Ready { .. } => APP_ROUTE,
        }
    }
}

/// Everything the dashboard shows for the current organization.
#[derive(Debug, Clone, Serialize)]
pub struct OrgDashboard {
    pub current_org_id: String,
    pub memberships: Vec<ActiveMembership>,
    pub organizations: Vec<OrganizationRecord>,
    pub projects: Vec<OrgProjectRecord>,
    pub files: Vec<OrgStorageFile>,
}

impl OrgDashboard {
    pub fn current_organization(&self) -> Option<&OrganizationRecord> {
        self.organizations
            .iter()
            .find(|org| org.id == self.current_org_id)
    }
}

/// Projects and files of one organization, reloaded on switch.
#[derive(Debug, Clone, Serialize)]
pub struct OrgContents {
    pub projects: Vec<OrgProjectRecord>,
    pub files: Vec<OrgStorageFile>,
}

pub struct OrgWorkspace {
    client: Arc<SupabaseClient>,
    selection: OrgSelection,
}

impl OrgWorkspace {
    pub fn new(client: Arc<SupabaseClient>, selection: OrgSelection) -> Self {
        Self { client, selection }
    }

    pub fn client(&self) -> &Arc<SupabaseClient> {
        &self.client
    }

    pub fn current_org_id(&self) -> Option<String> {
        self.selection.get()
    }

    /// Right after sign-in: select the oldest active membership.
    pub async fn bootstrap_after_login(&self) -> OrgResult<OrgLanding> {
        let memberships = self.client.active_memberships().await?;
        self.land(memberships, |memberships| memberships[0].organization_id.clone())
    }

    /// Keep the stored selection if it is still an active membership,
    /// otherwise fall back to the oldest one.
    pub async fn resolve_current_org(&self) -> OrgResult<OrgLanding> {
        let memberships = self.client.active_memberships().await?;
        let stored = self.selection.get();
        self.land(memberships, |memberships| {
            resolve_org_id(stored.as_deref(), memberships)
        })
    }

    fn land(
        &self,
        memberships: Vec<ActiveMembership>,
        pick: impl FnOnce(&[ActiveMembership]) -> String,
    ) -> OrgResult<OrgLanding> {
        if memberships.is_empty() {
            debug!("No active memberships");
            self.selection.clear()?;
            return Ok(OrgLanding::NeedsOrganization);
        }
        let org_id = pick(&memberships);
        self.selection.set(&org_id)?;
        debug!(org_id = %org_id, "Current organization resolved");
        Ok(OrgLanding::Ready {
            org_id,
            memberships,
        })
    }

    /// Resolve the current organization and load everything for it.
    /// `Ok(None)` means the user has no organization yet.
    pub async fn load_dashboard(&self) -> OrgResult<Option<OrgDashboard>> {
        let (org_id, memberships) = match self.resolve_current_org().await? {
            OrgLanding::NeedsOrganization => return Ok(None),
            OrgLanding::Ready {
                org_id,
                memberships,
            } => (org_id, memberships),
        };

        let org_ids: Vec<String> = memberships
            .iter()
            .map(|m| m.organization_id.clone())
            .collect();
        let (organizations, projects, files) = tokio::try_join!(
            self.client.organizations(&org_ids),
            self.client.organization_projects(&org_id),
            self.client.list_org_files(&org_id),
        )?;

        Ok(Some(OrgDashboard {
            current_org_id: org_id,
            memberships,
            organizations,
            projects,
            files,
        }))
    }

    /// Select another organization and load its projects and files.
    pub async fn switch_org(&self, org_id: &str) -> OrgResult<OrgContents> {
        if org_id.is_empty() {
            return Err(OrgError::Validation("Organization id is required.".to_string()));
        }
        self.selection.set(org_id)?;
        info!(org_id, "Switched organization");

        let (projects, files) = tokio::try_join!(
            self.client.organization_projects(org_id),
            self.client.list_org_files(org_id),
        )?;
        Ok(OrgContents { projects, files })
    }

    /// Upload into the current organization and return the refreshed listing.
    pub async fn upload_file(
        &self,
        file_name: &str,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> OrgResult<Vec<OrgStorageFile>> {
        let org_id = self
            .selection
            .get()
            .ok_or_else(|| OrgError::Validation("Select an organization first.".to_string()))?;
        self.client
            .upload_org_file(&org_id, file_name, content_type, bytes)
            .await?;
        self.client.list_org_files(&org_id).await
    }

    /// Create an organization, then select the user's oldest membership.
    pub async fn create_organization(&self, name: &str, raw_slug: &str) -> OrgResult<OrgLanding> {
        let request = CreateOrgRequest::build(name, raw_slug)?;
        self.client.create_org(&request).await?;

        let memberships = self.client.active_memberships().await?;
        if memberships.is_empty() {
            warn!(slug = %request.slug, "Organization created but no membership visible yet");
            return Err(OrgError::Validation(
                "Organization was created, but no active membership was found yet. Please refresh."
                    .to_string(),
            ));
        }
        self.land(memberships, |memberships| memberships[0].organization_id.clone())
    }
}

/// Stored id when it is still an active membership, else the oldest one.
/// `memberships` must be non-empty and ordered oldest first.
pub fn resolve_org_id(stored: Option<&str>, memberships: &[ActiveMembership]) -> String {
    match stored {
        Some(id) if memberships.iter().any(|m| m.organization_id == id) => id.to_string(),
        _ => memberships[0].organization_id.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn membership(org_id: &str) -> ActiveMembership {
        ActiveMembership {
            organization_id: org_id.to_string(),
            status: "active".to_string(),
            created_at: None,
        }
    }

    #[test]
    fn test_resolve_keeps_valid_selection() {
        let memberships = vec![membership("a"), membership("b")];
        assert_eq!(resolve_org_id(Some("b"), &memberships), "b");
    }

    #[test]
    fn test_resolve_falls_back_to_oldest() {
        let memberships = vec![membership("a"), membership("b")];
        assert_eq!(resolve_org_id(Some("gone"), &memberships), "a");
        assert_eq!(resolve_org_id(None, &memberships), "a");
    }

    #[test]
    fn test_landing_routes() {
        assert_eq!(OrgLanding::NeedsOrganization.route(), "/create-organization");
        let ready = OrgLanding::Ready {
            org_id: "a".to_string(),
            memberships: vec![membership("a")],
        };
        assert_eq!(ready.route(), "/app");
    }
}
