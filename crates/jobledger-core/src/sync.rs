// ABOUTME: Consumer-held bookmark for incremental event sync against the ledger.
// ABOUTME: Tracks the last seen timestamp and the ids already seen at exactly that timestamp.

use serde::{Deserialize, Serialize};

use crate::event::Event;

/// Resumption state for a consumer polling a job's events.
///
/// Timestamps only have millisecond resolution, so several events can share
/// `since_time`. The next poll asks for everything at or after `since_time`
/// and excludes `seen_ids`, which returns newer events plus any late arrivals
/// at the bookmark time without repeating the ones already delivered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncBookmark {
    pub since_time: i64,
    pub seen_ids: Vec<String>,
}

impl SyncBookmark {
    /// Bookmark for a first sync starting at `since_time`.
    pub fn starting_at(since_time: i64) -> Self {
        Self {
            since_time,
            seen_ids: Vec::new(),
        }
    }

    /// Move the bookmark past a batch returned for this bookmark.
    ///
    /// The batch order does not matter. Events older than the bookmark are
    /// ignored.
    pub fn advance(&mut self, batch: &[Event]) {
        for event in batch {
            let Some(id) = event.id.as_deref() else {
                continue;
            };
            if event.created_time > self.since_time {
                self.since_time = event.created_time;
                self.seen_ids.clear();
            }
            if event.created_time == self.since_time && !self.seen_ids.iter().any(|seen| seen == id) {
                self.seen_ids.push(id.to_string());
            }
        }
    }
}
