//! # Message sync
//!
//! Keeps a client-side copy of the message collection fresh while a view is
//! mounted.
//!
//! ```text
//! ┌───────────────┐  mount()   ┌──────────────┐  fetch_messages  ┌─────────┐
//! │  MountGuard   │──────────▶│  poll task   │─────────────────▶│ backend │
//! │ (view scope)  │  drop      │ interval +   │                  └────┬────┘
//! └───────────────┘──────────▶│ select!      │                       │
//!                   shutdown   └──────────────┘                       ▼
//!                                          ┌───────────┐  watch  ┌──────────┐
//!   send / reply / mark_as_read ─────────▶│ SyncCache │────────▶│ subscribers │
//!                                          └───────────┘         └──────────┘
//! ```
//!
//! - **Re-entrancy guard**: a fetch requested while one is in flight is
//!   dropped, never queued.
//! - **Optimistic read flags**: `mark_as_read` updates the cache before the
//!   request; a failed request triggers a re-fetch instead of a manual undo.
//! - **Late results**: a fetch completing after unmount does not touch the
//!   cache.

mod cache;
mod sync;
pub mod sync_fsm;

pub use cache::{count_unread, SyncCache};
pub use sync::{
    FetchOutcome, MessageSync, MessageSyncConfig, MountGuard, SyncResult,
    DEFAULT_POLLING_INTERVAL,
};
pub use sync_fsm::SyncState;
