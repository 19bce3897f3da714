use crate::cache::SyncCache;
use crate::sync_fsm::{SyncMachine, SyncMachineInput, SyncState};
use chrono::Utc;
use parking_lot::Mutex;
use portal_api::{ApiError, ErrorKind, MessageBackend, MessageDraft};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Default time between background polls.
pub const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_millis(10_000);

#[derive(Debug, Clone)]
pub struct MessageSyncConfig {
    pub polling_interval: Duration,
    /// Poll in the background while mounted.
    pub auto_refresh: bool,
}

impl Default for MessageSyncConfig {
    fn default() -> Self {
        Self {
            polling_interval: DEFAULT_POLLING_INTERVAL,
            auto_refresh: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Cache replaced with `count` messages.
    Updated { count: usize, unread: usize },
    /// Another fetch was in flight; no request was made.
    Skipped,
    /// Request failed; previous cache kept.
    Failed(ApiError),
    /// Completed after unmount; result dropped.
    Discarded,
}

/// `{success, error}` result of a user-initiated mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SyncResult {
    fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Near-real-time view of the message collection.
///
/// Fetches never overlap, optimistic read flags are reconciled against the
/// server on failure, and results landing after unmount are dropped.
pub struct MessageSync {
    backend: Arc<dyn MessageBackend>,
    config: MessageSyncConfig,
    fsm: Mutex<SyncMachine>,
    cache: watch::Sender<SyncCache>,
    /// Bumped on every unmount; a fetch that sees a different value on
    /// completion discards its result.
    generation: AtomicU64,
}

impl MessageSync {
    pub fn new(backend: Arc<dyn MessageBackend>, config: MessageSyncConfig) -> Self {
        let (cache, _) = watch::channel(SyncCache::default());
        Self {
            backend,
            config,
            fsm: Mutex::new(SyncMachine::new()),
            cache,
            generation: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &MessageSyncConfig {
        &self.config
    }

    pub fn snapshot(&self) -> SyncCache {
        self.cache.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncCache> {
        self.cache.subscribe()
    }

    pub fn state(&self) -> SyncState {
        SyncState::from(self.fsm.lock().state())
    }

    fn transition(&self, input: &SyncMachineInput) -> Option<SyncState> {
        let mut fsm = self.fsm.lock();
        fsm.consume(input).ok()?;
        Some(SyncState::from(fsm.state()))
    }

    /// Fetch the collection and replace the cache wholesale.
    ///
    /// Returns [`FetchOutcome::Skipped`] without touching the network when a
    /// fetch is already in flight.
    pub async fn fetch_messages(&self, show_loading: bool) -> FetchOutcome {
        if self.transition(&SyncMachineInput::FetchStarted).is_none() {
            debug!("Fetch already in flight, skipping");
            return FetchOutcome::Skipped;
        }
        let generation = self.generation.load(Ordering::SeqCst);

        let mut prior_error = None;
        self.cache.send_modify(|c| {
            if show_loading {
                c.loading = true;
            }
            prior_error = c.error.take();
            c.state = SyncState::Fetching;
        });
        let mut in_flight = InFlight {
            sync: self,
            settled: false,
            prior_error,
        };

        let result = self.backend.list_messages().await;

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("Fetch completed after unmount, discarding result");
            return FetchOutcome::Discarded;
        }

        match result {
            Ok(messages) => {
                let state = in_flight.settle(&SyncMachineInput::FetchSucceeded);
                let count = messages.len();
                let mut unread = 0;
                self.cache.send_modify(|c| {
                    c.replace(messages, Utc::now());
                    c.loading = false;
                    c.state = state;
                    unread = c.unread_count;
                });
                debug!(count, unread, "Messages fetched");
                FetchOutcome::Updated { count, unread }
            }
            Err(e) => {
                let state = in_flight.settle(&SyncMachineInput::FetchFailed);
                warn!(error = %e, "Failed to fetch messages");
                let message = match e.kind() {
                    ErrorKind::NetworkError => "Error fetching messages",
                    _ => "Failed to fetch messages",
                };
                self.cache.send_modify(|c| {
                    c.error = Some(message.to_string());
                    c.loading = false;
                    c.state = state;
                });
                FetchOutcome::Failed(e)
            }
        }
    }

    /// Post a new message, then silently re-fetch.
    pub async fn send_message(&self, draft: &MessageDraft) -> SyncResult {
        if draft.subject.trim().is_empty() || draft.content.trim().is_empty() {
            return SyncResult::failed("Subject and message are required");
        }

        match self.backend.send_message(draft).await {
            Ok(()) => {
                info!("Message sent");
                self.fetch_messages(false).await;
                SyncResult::ok()
            }
            Err(e) => {
                warn!(error = %e, "Failed to send message");
                SyncResult::failed(mutation_error(&e, "Error sending message", "Failed to send message"))
            }
        }
    }

    /// Reply to a message, then silently re-fetch.
    pub async fn reply_to_message(&self, message_id: &str, content: &str) -> SyncResult {
        if content.trim().is_empty() {
            return SyncResult::failed("Reply cannot be empty");
        }

        match self.backend.reply_to_message(message_id, content).await {
            Ok(()) => {
                info!(message_id, "Reply sent");
                self.fetch_messages(false).await;
                SyncResult::ok()
            }
            Err(e) => {
                warn!(message_id, error = %e, "Failed to send reply");
                let error = match e.kind() {
                    ErrorKind::NetworkError => "Error sending reply",
                    _ => "Failed to send reply",
                };
                SyncResult::failed(error)
            }
        }
    }

    /// Optimistically mark a message read, reconciling by re-fetch on failure.
    pub async fn mark_as_read(&self, message_id: &str) -> SyncResult {
        let mut flipped = false;
        self.cache.send_modify(|c| flipped = c.mark_read(message_id));
        debug!(message_id, flipped, "Marked read locally");

        match self.backend.mark_as_read(message_id).await {
            Ok(()) => SyncResult::ok(),
            Err(e) => {
                warn!(message_id, error = %e, "Failed to mark message read, reconciling");
                // a fetch already in flight will deliver server truth instead
                self.fetch_messages(false).await;
                SyncResult::failed("Failed to mark message as read")
            }
        }
    }

    /// Start the view lifecycle: initial fetch with loading shown, then a
    /// silent poll every `polling_interval` while `auto_refresh` is on.
    ///
    /// Polling stops when the returned guard is dropped.
    pub fn mount(self: &Arc<Self>) -> MountGuard {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let sync = self.clone();
        let period = self.config.polling_interval;
        let auto_refresh = self.config.auto_refresh;

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            // an unmount that lands before the task runs must win
            tokio::select! {
                biased;
                _ = &mut shutdown_rx => return,
                _ = sync.fetch_messages(true) => {}
            }
            if !auto_refresh {
                return;
            }

            loop {
                tokio::select! {
                    biased;
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        sync.fetch_messages(false).await;
                    }
                }
            }
            debug!("Message polling stopped");
        });

        debug!(
            interval_ms = period.as_millis() as u64,
            auto_refresh, "Message view mounted"
        );
        MountGuard {
            sync: self.clone(),
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    fn unmount(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

fn mutation_error(e: &ApiError, network: &str, fallback: &str) -> String {
    match e.kind() {
        ErrorKind::NetworkError => network.to_string(),
        _ if e.message().is_empty() || e.message().starts_with("HTTP error!") => {
            fallback.to_string()
        }
        _ => e.message().to_string(),
    }
}

/// Returns the machine to `Idle` if a fetch is dropped or discarded, and
/// puts the published cache back in step with it.
struct InFlight<'a> {
    sync: &'a MessageSync,
    settled: bool,
    prior_error: Option<String>,
}

impl InFlight<'_> {
    fn settle(&mut self, input: &SyncMachineInput) -> SyncState {
        self.settled = true;
        self.sync
            .transition(input)
            .unwrap_or_else(|| self.sync.state())
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        self.sync.transition(&SyncMachineInput::FetchAbandoned);
        let state = self.sync.state();
        let prior_error = self.prior_error.take();
        self.sync.cache.send_modify(|c| {
            c.state = state;
            c.loading = false;
            if c.error.is_none() {
                c.error = prior_error;
            }
        });
    }
}

/// Scoped handle for a mounted message view.
pub struct MountGuard {
    sync: Arc<MessageSync>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl MountGuard {
    /// Unmount and wait for the polling task to exit.
    pub async fn unmount(mut self) {
        self.stop();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }

    fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            self.sync.unmount();
            let _ = shutdown.send(());
            debug!("Message view unmounted");
        }
    }
}

impl Drop for MountGuard {
    fn drop(&mut self) {
        self.stop();
    }
}
