use crate::SyncState;
use chrono::{DateTime, Utc};
use portal_api::Message;
use serde::Serialize;

/// Client-side copy of the message collection.
///
/// `unread_count` always equals the number of messages with `is_read == false`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncCache {
    pub messages: Vec<Message>,
    pub unread_count: usize,
    pub last_fetch: Option<DateTime<Utc>>,
    pub loading: bool,
    pub error: Option<String>,
    pub state: SyncState,
}

impl Default for SyncCache {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            unread_count: 0,
            last_fetch: None,
            // nothing has been fetched yet
            loading: true,
            error: None,
            state: SyncState::Idle,
        }
    }
}

impl SyncCache {
    pub fn message(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub(crate) fn replace(&mut self, messages: Vec<Message>, at: DateTime<Utc>) {
        self.unread_count = count_unread(&messages);
        self.messages = messages;
        self.last_fetch = Some(at);
    }

    /// Flip one message to read. Returns whether anything changed.
    pub(crate) fn mark_read(&mut self, id: &str) -> bool {
        let flipped = match self.messages.iter_mut().find(|m| m.id == id) {
            Some(message) if !message.is_read => {
                message.is_read = true;
                true
            }
            _ => false,
        };
        if flipped {
            self.unread_count = count_unread(&self.messages);
        }
        flipped
    }
}

pub fn count_unread(messages: &[Message]) -> usize {
    messages.iter().filter(|m| !m.is_read).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(id: &str, is_read: bool) -> Message {
        Message {
            id: id.to_string(),
            is_read,
            ..Default::default()
        }
    }

    #[test]
    fn test_replace_recomputes_unread() {
        let mut cache = SyncCache {
            unread_count: 7,
            ..Default::default()
        };
        cache.replace(
            vec![message("a", false), message("b", true), message("c", false)],
            Utc::now(),
        );
        assert_eq!(cache.unread_count, 2);
        assert!(cache.last_fetch.is_some());
    }

    #[test]
    fn test_mark_read_only_counts_real_flips() {
        let mut cache = SyncCache::default();
        cache.replace(vec![message("a", false), message("b", true)], Utc::now());

        assert!(cache.mark_read("a"));
        assert_eq!(cache.unread_count, 0);

        // already read, unknown id: no change, never negative
        assert!(!cache.mark_read("a"));
        assert!(!cache.mark_read("b"));
        assert!(!cache.mark_read("zzz"));
        assert_eq!(cache.unread_count, 0);
    }

    #[test]
    fn test_lookup() {
        let mut cache = SyncCache::default();
        cache.replace(vec![message("a", false)], Utc::now());
        assert!(cache.message("a").is_some());
        assert!(cache.message("b").is_none());
    }
}
