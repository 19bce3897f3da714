//! Organization deployment profile on Supabase.
//!
//! [`SupabaseClient`] implements the session layer's `AuthBackend` against
//! GoTrue and adds the organization surface: active memberships,
//! organizations and their projects (PostgREST), a private file bucket per
//! organization, and the `create_org` edge function. [`OrgWorkspace`] keeps
//! track of which organization the user is working in.
//!
//! ```text
//!   sign-in ──► bootstrap_after_login ──► memberships? ──no──► /create-organization
//!                                              │                       │
//!                                             yes                 create_org
//!                                              ▼                       │
//!                                    select oldest, /app ◄─────────────┘
//! ```

mod create_org;
mod error;
mod files;
mod queries;
pub mod slug;
mod supabase;
mod workspace;

pub use create_org::CreateOrgRequest;
pub use error::{OrgError, OrgResult};
pub use files::{
    object_path, sanitize_file_name, OrgStorageFile, DOWNLOAD_URL_TTL_SECS, STORAGE_BUCKET,
};
pub use queries::{ActiveMembership, OrgProjectRecord, OrganizationRecord};
pub use supabase::SupabaseClient;
pub use workspace::{
    resolve_org_id, OrgContents, OrgDashboard, OrgLanding, OrgWorkspace, APP_ROUTE,
    CREATE_ORGANIZATION_ROUTE,
};
