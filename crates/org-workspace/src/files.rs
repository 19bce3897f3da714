//! Per-organization files in the private `client-files` bucket.
//!
//! Objects live under `<org_id>/`. Downloads go through short-lived signed
//! URLs; the bucket itself is never public.

use crate::supabase::{parse_response, Bearer, SupabaseClient};
use crate::{OrgError, OrgResult};
use chrono::{DateTime, Utc};
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

pub const STORAGE_BUCKET: &str = "client-files";
pub const DOWNLOAD_URL_TTL_SECS: u64 = 600;
const LIST_LIMIT: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrgStorageFile {
    pub name: String,
    /// `<org_id>/<name>`, as accepted by [`SupabaseClient::signed_file_url`].
    pub path: String,
    pub size_bytes: Option<u64>,
    pub mime_type: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Storage list entry. Folders come back without an `id`.
#[derive(Debug, Deserialize)]
struct ObjectEntry {
    #[serde(default)]
    id: Option<String>,
    name: String,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
    #[serde(default)]
    metadata: Option<ObjectMetadata>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ObjectMetadata {
    size: Option<u64>,
    mimetype: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SignedUrlResponse {
    #[serde(rename = "signedURL", alias = "signedUrl")]
    signed_url: Option<String>,
}

/// Whitespace and anything outside `[a-zA-Z0-9._-]` become single dashes.
pub fn sanitize_file_name(file_name: &str) -> String {
    let mut out = String::with_capacity(file_name.len());
    for ch in file_name.trim().chars() {
        let mapped = if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_') {
            ch
        } else {
            '-'
        };
        if mapped == '-' && out.ends_with('-') {
            continue;
        }
        out.push(mapped);
    }
    out
}

/// Object path for an upload made at `now_ms`.
pub fn object_path(org_id: &str, file_name: &str, now_ms: i64) -> String {
    let safe = sanitize_file_name(file_name);
    let safe = if safe.is_empty() {
        format!("file-{}", now_ms)
    } else {
        safe
    };
    format!("{}/{}-{}", org_id, now_ms, safe)
}

fn timestamp_millis(value: Option<&str>) -> i64 {
    value
        .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
        .map(|dt| dt.timestamp_millis())
        .unwrap_or(0)
}

fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

impl SupabaseClient {
    fn storage_url(&self, rest: &str) -> String {
        format!("{}/storage/v1/{}", self.api_url, rest)
    }

    /// Files directly under the organization's folder, most recently
    /// changed first.
    pub async fn list_org_files(&self, org_id: &str) -> OrgResult<Vec<OrgStorageFile>> {
        let url = self.storage_url(&format!("object/list/{}", STORAGE_BUCKET));
        let body = json!({
            "prefix": org_id,
            "limit": LIST_LIMIT,
            "offset": 0,
            "sortBy": { "column": "name", "order": "asc" }
        });
        let value = self
            .send(Method::POST, &url, Some(&body), Bearer::Session)
            .await?;
        let entries: Vec<ObjectEntry> = if value.is_null() {
            Vec::new()
        } else {
            serde_json::from_value(value).map_err(portal_api::ApiError::from)?
        };

        let mut files: Vec<OrgStorageFile> = entries
            .into_iter()
            .filter(|entry| entry.id.as_deref().is_some_and(|id| !id.is_empty()))
            .map(|entry| {
                let metadata = entry.metadata.unwrap_or_default();
                OrgStorageFile {
                    path: format!("{}/{}", org_id, entry.name),
                    name: entry.name,
                    size_bytes: metadata.size,
                    mime_type: metadata.mimetype,
                    created_at: entry.created_at,
                    updated_at: entry.updated_at,
                }
            })
            .collect();

        files.sort_by_key(|f| {
            std::cmp::Reverse(timestamp_millis(
                f.updated_at.as_deref().or(f.created_at.as_deref()),
            ))
        });
        debug!(org_id, count = files.len(), "Listed organization files");
        Ok(files)
    }

    /// Upload under a fresh timestamped name. Returns the object path.
    pub async fn upload_org_file(
        &self,
        org_id: &str,
        file_name: &str,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> OrgResult<String> {
        let path = object_path(org_id, file_name, Utc::now().timestamp_millis());
        self.upload_object(&path, content_type, bytes).await?;
        Ok(path)
    }

    /// Upload to an exact object path. Existing objects are not overwritten.
    pub async fn upload_object(
        &self,
        path: &str,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> OrgResult<()> {
        let url = self.storage_url(&format!("object/{}/{}", STORAGE_BUCKET, encode_path(path)));
        let size = bytes.len();
        let response = self
            .http
            .post(&url)
            .header("apikey", &self.anon_key)
            .header("x-upsert", "false")
            .header(
                CONTENT_TYPE,
                content_type
                    .filter(|t| !t.is_empty())
                    .unwrap_or("application/octet-stream"),
            )
            .bearer_auth(self.bearer_value(Bearer::Session))
            .body(bytes)
            .send()
            .await
            .map_err(portal_api::ApiError::from)?;
        parse_response(&Method::POST, &url, response).await?;
        info!(path, size, "Uploaded organization file");
        Ok(())
    }

    /// Download URL valid for [`DOWNLOAD_URL_TTL_SECS`].
    pub async fn signed_file_url(&self, path: &str) -> OrgResult<String> {
        let url = self.storage_url(&format!(
            "object/sign/{}/{}",
            STORAGE_BUCKET,
            encode_path(path)
        ));
        let body = json!({ "expiresIn": DOWNLOAD_URL_TTL_SECS });
        let value = self
            .send(Method::POST, &url, Some(&body), Bearer::Session)
            .await?;
        if value == Value::Null {
            return Err(OrgError::SignedUrlUnavailable);
        }
        let response: SignedUrlResponse =
            serde_json::from_value(value).map_err(|_| OrgError::SignedUrlUnavailable)?;

        match response.signed_url.filter(|u| !u.is_empty()) {
            Some(signed) if signed.starts_with("http") => Ok(signed),
            Some(signed) => Ok(format!("{}/storage/v1{}", self.api_url, signed)),
            None => Err(OrgError::SignedUrlUnavailable),
        }
    }
}
