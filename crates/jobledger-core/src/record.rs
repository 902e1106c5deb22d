// ABOUTME: The Record contract shared by every persisted row: an opaque id plus timestamps.
// ABOUTME: Also provides record id generation and the epoch-millisecond clock used for stamping.

use std::fmt::Debug;

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use ulid::Ulid;

/// A persisted row with a store-assigned id and creation/update timestamps
/// in epoch milliseconds.
///
/// Once a record has been saved its id never changes, and
/// `created_time <= updated_time` holds for every row the store writes with
/// automatic timestamping.
pub trait Record: Clone + Debug + Serialize + DeserializeOwned {
    fn id(&self) -> Option<&str>;
    fn set_id(&mut self, id: String);

    fn created_time(&self) -> i64;
    fn set_created_time(&mut self, time: i64);

    fn updated_time(&self) -> i64;
    fn set_updated_time(&mut self, time: i64);

    /// True when the record carries a non-empty id.
    fn has_id(&self) -> bool {
        self.id().is_some_and(|id| !id.is_empty())
    }
}

/// Generate a fresh, collision-free record id.
pub fn new_record_id() -> String {
    Ulid::new().to_string()
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
