use async_trait::async_trait;
use message_sync_poller::{
    FetchOutcome, MessageSync, MessageSyncConfig, SyncResult, SyncState,
};
use portal_api::{ApiError, ApiResult, Message, MessageBackend, MessageDraft};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

fn message(id: &str, is_read: bool) -> Message {
    Message {
        id: id.to_string(),
        subject: format!("Subject {}", id),
        is_read,
        ..Default::default()
    }
}

#[derive(Default)]
struct FakeMessages {
    server: Mutex<Vec<Message>>,
    list_error: Mutex<Option<ApiError>>,
    send_error: Mutex<Option<ApiError>>,
    mark_error: Mutex<Option<ApiError>>,
    list_gate: Option<Arc<Notify>>,
    mark_gate: Option<Arc<Notify>>,
    list_calls: AtomicUsize,
    send_calls: AtomicUsize,
    reply_calls: AtomicUsize,
    mark_calls: AtomicUsize,
}

impl FakeMessages {
    fn with(messages: Vec<Message>) -> Self {
        let fake = Self::default();
        *fake.server.lock().unwrap() = messages;
        fake
    }

    fn lists(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessageBackend for FakeMessages {
    async fn list_messages(&self) -> ApiResult<Vec<Message>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.list_gate {
            gate.notified().await;
        }
        if let Some(e) = self.list_error.lock().unwrap().clone() {
            return Err(e);
        }
        Ok(self.server.lock().unwrap().clone())
    }

    async fn send_message(&self, draft: &MessageDraft) -> ApiResult<()> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = self.send_error.lock().unwrap().clone() {
            return Err(e);
        }
        let mut server = self.server.lock().unwrap();
        let id = format!("m{}", server.len() + 1);
        server.push(Message {
            id,
            subject: draft.subject.clone(),
            content: draft.content.clone(),
            is_read: true,
            ..Default::default()
        });
        Ok(())
    }

    async fn reply_to_message(&self, _message_id: &str, _content: &str) -> ApiResult<()> {
        self.reply_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn mark_as_read(&self, _message_id: &str) -> ApiResult<()> {
        self.mark_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.mark_gate {
            gate.notified().await;
        }
        match self.mark_error.lock().unwrap().clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

fn sync_with(backend: Arc<FakeMessages>, config: MessageSyncConfig) -> Arc<MessageSync> {
    Arc::new(MessageSync::new(backend, config))
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    while !condition() {
        tokio::task::yield_now().await;
    }
}

// =============================================================================
// Fetching
// =============================================================================

#[tokio::test]
async fn test_fetch_replaces_cache_and_counts_unread() {
    let backend = Arc::new(FakeMessages::with(vec![
        message("m1", false),
        message("m2", true),
        message("m3", false),
    ]));
    let sync = sync_with(backend, MessageSyncConfig::default());
    assert!(sync.snapshot().loading);

    let outcome = sync.fetch_messages(true).await;

    assert_eq!(outcome, FetchOutcome::Updated { count: 3, unread: 2 });
    let cache = sync.snapshot();
    assert_eq!(cache.unread_count, 2);
    assert!(!cache.loading);
    assert!(cache.last_fetch.is_some());
    assert_eq!(cache.state, SyncState::Idle);
}

#[tokio::test]
async fn test_concurrent_fetch_is_skipped() {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(FakeMessages {
        list_gate: Some(gate.clone()),
        ..FakeMessages::with(vec![message("m1", false)])
    });
    let sync = sync_with(backend.clone(), MessageSyncConfig::default());

    let first = {
        let sync = sync.clone();
        tokio::spawn(async move { sync.fetch_messages(false).await })
    };
    wait_until(|| backend.lists() == 1).await;

    assert_eq!(sync.state(), SyncState::Fetching);
    assert_eq!(sync.fetch_messages(false).await, FetchOutcome::Skipped);
    assert_eq!(backend.lists(), 1);

    gate.notify_one();
    assert_eq!(
        first.await.unwrap(),
        FetchOutcome::Updated { count: 1, unread: 1 }
    );
    assert_eq!(backend.lists(), 1);
}

#[tokio::test]
async fn test_failed_fetch_keeps_previous_cache() {
    let backend = Arc::new(FakeMessages::with(vec![message("m1", false)]));
    let sync = sync_with(backend.clone(), MessageSyncConfig::default());
    sync.fetch_messages(true).await;

    *backend.list_error.lock().unwrap() = Some(ApiError::Server {
        status: 500,
        message: "boom".to_string(),
    });
    let outcome = sync.fetch_messages(false).await;

    assert!(matches!(outcome, FetchOutcome::Failed(_)));
    let cache = sync.snapshot();
    assert_eq!(cache.messages.len(), 1);
    assert_eq!(cache.unread_count, 1);
    assert_eq!(cache.error.as_deref(), Some("Failed to fetch messages"));
    assert_eq!(cache.state, SyncState::Failed);

    // recovers on the next fetch
    *backend.list_error.lock().unwrap() = None;
    sync.fetch_messages(false).await;
    assert_eq!(sync.snapshot().error, None);
    assert_eq!(sync.state(), SyncState::Idle);
}

#[tokio::test]
async fn test_network_failure_message() {
    let backend = Arc::new(FakeMessages::default());
    *backend.list_error.lock().unwrap() = Some(ApiError::network("connection refused"));
    let sync = sync_with(backend, MessageSyncConfig::default());

    sync.fetch_messages(true).await;
    assert_eq!(sync.snapshot().error.as_deref(), Some("Error fetching messages"));
}

// =============================================================================
// Mark as read
// =============================================================================

#[tokio::test]
async fn test_mark_as_read_is_optimistic() {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(FakeMessages {
        mark_gate: Some(gate.clone()),
        ..FakeMessages::with(vec![message("m1", false)])
    });
    let sync = sync_with(backend.clone(), MessageSyncConfig::default());
    sync.fetch_messages(true).await;
    assert_eq!(sync.snapshot().unread_count, 1);

    let marking = {
        let sync = sync.clone();
        tokio::spawn(async move { sync.mark_as_read("m1").await })
    };
    wait_until(|| backend.mark_calls.load(Ordering::SeqCst) == 1).await;

    // flipped before the request resolves
    let cache = sync.snapshot();
    assert_eq!(cache.unread_count, 0);
    assert!(cache.message("m1").unwrap().is_read);

    gate.notify_one();
    assert_eq!(
        marking.await.unwrap(),
        SyncResult {
            success: true,
            error: None
        }
    );
    assert_eq!(sync.snapshot().unread_count, 0);
    assert_eq!(backend.lists(), 1);
}

#[tokio::test]
async fn test_mark_as_read_failure_reconciles() {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(FakeMessages {
        mark_gate: Some(gate.clone()),
        ..FakeMessages::with(vec![message("m1", false)])
    });
    *backend.mark_error.lock().unwrap() = Some(ApiError::Server {
        status: 500,
        message: "db down".to_string(),
    });
    let sync = sync_with(backend.clone(), MessageSyncConfig::default());
    sync.fetch_messages(true).await;

    let marking = {
        let sync = sync.clone();
        tokio::spawn(async move { sync.mark_as_read("m1").await })
    };
    wait_until(|| backend.mark_calls.load(Ordering::SeqCst) == 1).await;
    assert_eq!(sync.snapshot().unread_count, 0);

    gate.notify_one();
    let result = marking.await.unwrap();

    assert!(!result.success);
    // server still says unread
    let cache = sync.snapshot();
    assert_eq!(cache.unread_count, 1);
    assert!(!cache.message("m1").unwrap().is_read);
    assert_eq!(backend.lists(), 2);
}

#[tokio::test]
async fn test_mark_unknown_or_read_message_keeps_count() {
    let backend = Arc::new(FakeMessages::with(vec![message("m1", true), message("m2", false)]));
    let sync = sync_with(backend, MessageSyncConfig::default());
    sync.fetch_messages(true).await;

    sync.mark_as_read("m1").await;
    sync.mark_as_read("nope").await;
    assert_eq!(sync.snapshot().unread_count, 1);
}

// =============================================================================
// Send / reply
// =============================================================================

#[tokio::test]
async fn test_send_refetches_silently() {
    let backend = Arc::new(FakeMessages::default());
    let sync = sync_with(backend.clone(), MessageSyncConfig::default());
    sync.fetch_messages(true).await;

    let result = sync.send_message(&MessageDraft::new("Launch", "Ready?")).await;

    assert!(result.success);
    assert_eq!(backend.lists(), 2);
    let cache = sync.snapshot();
    assert_eq!(cache.messages.len(), 1);
    assert_eq!(cache.messages[0].subject, "Launch");
    assert!(!cache.loading);
}

#[tokio::test]
async fn test_send_failure_leaves_cache() {
    let backend = Arc::new(FakeMessages::with(vec![message("m1", false)]));
    *backend.send_error.lock().unwrap() = Some(ApiError::validation("Subject is required"));
    let sync = sync_with(backend.clone(), MessageSyncConfig::default());
    sync.fetch_messages(true).await;
    let before = sync.snapshot();

    let result = sync.send_message(&MessageDraft::new("x", "y")).await;

    assert_eq!(result.error.as_deref(), Some("Subject is required"));
    assert_eq!(sync.snapshot(), before);
    assert_eq!(backend.lists(), 1);
}

#[tokio::test]
async fn test_send_failure_generic_messages() {
    let backend = Arc::new(FakeMessages::default());
    let sync = sync_with(backend.clone(), MessageSyncConfig::default());

    *backend.send_error.lock().unwrap() = Some(ApiError::Server {
        status: 500,
        message: "HTTP error! status: 500".to_string(),
    });
    let result = sync.send_message(&MessageDraft::new("x", "y")).await;
    assert_eq!(result.error.as_deref(), Some("Failed to send message"));

    *backend.send_error.lock().unwrap() = Some(ApiError::network("offline"));
    let result = sync.send_message(&MessageDraft::new("x", "y")).await;
    assert_eq!(result.error.as_deref(), Some("Error sending message"));
}

#[tokio::test]
async fn test_blank_input_rejected_locally() {
    let backend = Arc::new(FakeMessages::default());
    let sync = sync_with(backend.clone(), MessageSyncConfig::default());

    assert!(!sync.send_message(&MessageDraft::new("  ", "body")).await.success);
    assert!(!sync.reply_to_message("m1", "\n").await.success);
    assert_eq!(backend.send_calls.load(Ordering::SeqCst), 0);
    assert_eq!(backend.reply_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_reply_refetches() {
    let backend = Arc::new(FakeMessages::with(vec![message("m1", true)]));
    let sync = sync_with(backend.clone(), MessageSyncConfig::default());

    let result = sync.reply_to_message("m1", "Thanks!").await;
    assert!(result.success);
    assert_eq!(backend.reply_calls.load(Ordering::SeqCst), 1);
    assert_eq!(backend.lists(), 1);
}

// =============================================================================
// Mount lifecycle
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_mount_fetches_then_polls() {
    let backend = Arc::new(FakeMessages::with(vec![message("m1", false)]));
    let sync = sync_with(backend.clone(), MessageSyncConfig::default());

    let guard = sync.mount();
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(backend.lists(), 1);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(backend.lists(), 2);

    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(backend.lists(), 4);

    guard.unmount().await;
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(backend.lists(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_drop_guard_stops_polling() {
    let backend = Arc::new(FakeMessages::default());
    let sync = sync_with(
        backend.clone(),
        MessageSyncConfig {
            polling_interval: Duration::from_secs(2),
            auto_refresh: true,
        },
    );

    {
        let _guard = sync.mount();
        tokio::time::sleep(Duration::from_millis(2_500)).await;
    }
    let after_drop = backend.lists();
    assert_eq!(after_drop, 2);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(backend.lists(), after_drop);
}

#[tokio::test(start_paused = true)]
async fn test_no_polling_without_auto_refresh() {
    let backend = Arc::new(FakeMessages::default());
    let sync = sync_with(
        backend.clone(),
        MessageSyncConfig {
            auto_refresh: false,
            ..Default::default()
        },
    );

    let _guard = sync.mount();
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(backend.lists(), 1);
}

#[tokio::test]
async fn test_late_result_discarded_after_unmount() {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(FakeMessages {
        list_gate: Some(gate.clone()),
        ..FakeMessages::with(vec![message("m1", false)])
    });
    let sync = sync_with(
        backend.clone(),
        MessageSyncConfig {
            auto_refresh: false,
            ..Default::default()
        },
    );

    let guard = sync.mount();
    // the mount's own initial fetch is in flight
    wait_until(|| backend.lists() == 1).await;
    let manual = {
        let sync = sync.clone();
        tokio::spawn(async move { sync.fetch_messages(false).await })
    };
    assert_eq!(manual.await.unwrap(), FetchOutcome::Skipped);

    drop(guard);
    gate.notify_one();
    tokio::task::yield_now().await;

    let cache = sync.snapshot();
    assert!(cache.messages.is_empty());
    assert_eq!(cache.unread_count, 0);

    // the machine is free again for a fresh mount
    wait_until(|| sync.state() == SyncState::Idle).await;
    let guard = sync.mount();
    gate.notify_one();
    wait_until(|| sync.snapshot().messages.len() == 1).await;
    drop(guard);
}

#[tokio::test]
async fn test_in_flight_fetch_discarded_by_unmount() {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(FakeMessages {
        list_gate: Some(gate.clone()),
        ..FakeMessages::with(vec![message("m1", false)])
    });
    let sync = sync_with(backend.clone(), MessageSyncConfig::default());

    let guard = sync.mount();
    wait_until(|| backend.lists() == 1).await;
    assert!(sync.snapshot().loading);
    guard.unmount().await;
    assert_eq!(sync.state(), SyncState::Idle);
    let cache = sync.snapshot();
    assert_eq!(cache.state, sync.state());
    assert!(!cache.loading);

    // a fetch started outside any mount, completing after an unmount
    let pending = {
        let sync = sync.clone();
        tokio::spawn(async move { sync.fetch_messages(false).await })
    };
    wait_until(|| backend.lists() == 2).await;
    let other = sync.mount();
    drop(other);
    gate.notify_one();

    assert_eq!(pending.await.unwrap(), FetchOutcome::Discarded);
    assert!(sync.snapshot().messages.is_empty());
}

#[tokio::test]
async fn test_discarded_fetch_keeps_previous_error() {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(FakeMessages {
        list_gate: Some(gate.clone()),
        ..FakeMessages::default()
    });
    *backend.list_error.lock().unwrap() = Some(ApiError::network("connection refused"));
    let sync = sync_with(backend.clone(), MessageSyncConfig::default());

    gate.notify_one();
    sync.fetch_messages(true).await;
    assert_eq!(sync.snapshot().state, SyncState::Failed);

    *backend.list_error.lock().unwrap() = None;
    let pending = {
        let sync = sync.clone();
        tokio::spawn(async move { sync.fetch_messages(true).await })
    };
    wait_until(|| backend.lists() == 2).await;
    assert_eq!(sync.snapshot().state, SyncState::Fetching);
    drop(sync.mount());
    gate.notify_one();

    assert_eq!(pending.await.unwrap(), FetchOutcome::Discarded);
    let cache = sync.snapshot();
    assert_eq!(cache.state, sync.state());
    assert!(!cache.loading);
    assert_eq!(cache.error.as_deref(), Some("Error fetching messages"));
}
