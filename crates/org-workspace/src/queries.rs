//! PostgREST reads: memberships, organizations, projects.

use crate::supabase::{Bearer, SupabaseClient};
use crate::{OrgError, OrgResult};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveMembership {
    pub organization_id: String,
    pub status: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgProjectRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    pub organization_id: String,
}

impl SupabaseClient {
    /// Id of the signed-in user, as the server sees it.
    pub async fn current_user_id(&self) -> OrgResult<String> {
        let token = self.tokens.token().ok_or(OrgError::NotSignedIn)?;
        match self.get_user(&token).await {
            Ok(user) => Ok(user.id),
            Err(e) => {
                debug!(error = %e, "Could not resolve current user");
                Err(OrgError::NotSignedIn)
            }
        }
    }

    /// Active memberships of the signed-in user, oldest first.
    pub async fn active_memberships(&self) -> OrgResult<Vec<ActiveMembership>> {
        let user_id = self.current_user_id().await?;
        let url = format!(
            "{}?select=organization_id,status,created_at&user_id=eq.{}&status=eq.active&order=created_at.asc",
            self.rest_url("organization_memberships"),
            urlencoding::encode(&user_id)
        );
        let memberships: Vec<ActiveMembership> = self.select(&url).await?;
        debug!(count = memberships.len(), "Fetched active memberships");
        Ok(memberships)
    }

    pub async fn organization(&self, org_id: &str) -> OrgResult<OrganizationRecord> {
        let url = format!(
            "{}?select=id,name,slug,created_at&id=eq.{}&limit=1",
            self.rest_url("organizations"),
            urlencoding::encode(org_id)
        );
        let orgs: Vec<OrganizationRecord> = self.select(&url).await?;
        orgs.into_iter().next().ok_or_else(|| {
            OrgError::Api(portal_api::ApiError::NotFound {
                message: format!("Organization {} not found", org_id),
            })
        })
    }

    /// Organizations by id. No request is made for an empty list.
    pub async fn organizations(&self, org_ids: &[String]) -> OrgResult<Vec<OrganizationRecord>> {
        if org_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = org_ids
            .iter()
            .map(|id| urlencoding::encode(id).into_owned())
            .collect::<Vec<_>>()
            .join(",");
        let url = format!(
            "{}?select=id,name,slug,created_at&id=in.({})",
            self.rest_url("organizations"),
            ids
        );
        self.select(&url).await
    }

    /// Projects of one organization, newest first.
    pub async fn organization_projects(&self, org_id: &str) -> OrgResult<Vec<OrgProjectRecord>> {
        let url = format!(
            "{}?select=id,name,status,created_at,organization_id&organization_id=eq.{}&order=created_at.desc",
            self.rest_url("projects"),
            urlencoding::encode(org_id)
        );
        self.select(&url).await
    }

    async fn select<T: serde::de::DeserializeOwned>(&self, url: &str) -> OrgResult<Vec<T>> {
        let value = self.send(Method::GET, url, None, Bearer::Session).await?;
        if value.is_null() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_value(value).map_err(portal_api::ApiError::from)?)
    }
}
