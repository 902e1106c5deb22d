// ABOUTME: Core library for jobledger, containing the record types shared by every store.
// ABOUTME: Defines the Record contract, job events, job states, and the consumer sync bookmark.

pub mod event;
pub mod job_state;
pub mod record;
pub mod sync;

pub use event::{DEFAULT_BODY_TYPE, Event};
pub use job_state::JobState;
pub use record::{Record, new_record_id, now_millis};
pub use sync::SyncBookmark;
