use super::{print_json, MessagesCommand};
use crate::app::{AppContext, CliResult};
use message_sync_poller::{
    FetchOutcome, MessageSync, MessageSyncConfig, SyncCache, SyncResult, SyncState,
};
use portal_api::{MessageDraft, Priority};
use portal_auth::DASHBOARD_ROUTE;
use std::sync::Arc;
use tracing::info;

pub async fn run(ctx: &AppContext, cmd: MessagesCommand) -> CliResult {
    let client = ctx.rest()?.clone();
    ctx.require_user(DASHBOARD_ROUTE).await?;

    let sync = Arc::new(MessageSync::new(
        client,
        MessageSyncConfig {
            polling_interval: ctx.config.poll_interval(),
            auto_refresh: ctx.config.auto_refresh,
        },
    ));

    match cmd {
        MessagesCommand::List => {
            if let FetchOutcome::Failed(e) = sync.fetch_messages(true).await {
                return Err(e.into());
            }
            let cache = sync.snapshot();
            for msg in &cache.messages {
                let marker = if msg.is_read { " " } else { "*" };
                println!(
                    "{} {}  [{:?}] {} - {} ({} replies)",
                    marker,
                    msg.id,
                    msg.priority,
                    msg.subject,
                    msg.sender_name,
                    msg.replies.len()
                );
            }
            println!("{} unread of {}", cache.unread_count, cache.messages.len());
        }
        MessagesCommand::Send {
            subject,
            content,
            priority,
            category,
        } => {
            let mut draft = MessageDraft::new(subject, content);
            draft.priority = priority.parse::<Priority>()?;
            draft.category = category;
            report(sync.send_message(&draft).await, "Message sent")?;
        }
        MessagesCommand::Reply { id, content } => {
            report(sync.reply_to_message(&id, &content).await, "Reply sent")?;
        }
        MessagesCommand::Read { id } => {
            sync.fetch_messages(true).await;
            report(sync.mark_as_read(&id).await, "Marked as read")?;
            println!("{} unread", sync.snapshot().unread_count);
        }
        MessagesCommand::Watch => watch(sync).await?,
    }
    Ok(())
}

fn report(result: SyncResult, success: &str) -> CliResult {
    match result.error {
        None if result.success => {
            println!("{}", success);
            Ok(())
        }
        error => Err(error.unwrap_or_else(|| "Request failed".to_string()).into()),
    }
}

/// Mount the message view and print the cache whenever it changes.
async fn watch(sync: Arc<MessageSync>) -> CliResult {
    let mut updates = sync.subscribe();
    let mount = sync.mount();
    info!(interval_ms = sync.config().polling_interval.as_millis() as u64, "Watching messages");

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let cache = updates.borrow_and_update().clone();
                if !is_settled(&cache) {
                    continue;
                }
                print_json(&serde_json::json!({
                    "unread": cache.unread_count,
                    "total": cache.messages.len(),
                    "last_fetch": cache.last_fetch,
                    "error": cache.error,
                }))?;
            }
            _ = &mut ctrl_c => break,
        }
    }

    mount.unmount().await;
    Ok(())
}

/// Only settled caches are worth printing; silent polls publish a
/// `Fetching` update without the loading flag.
fn is_settled(cache: &SyncCache) -> bool {
    !cache.loading && cache.state != SyncState::Fetching
}
