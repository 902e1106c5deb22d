// ABOUTME: Defines the Event record stored in the job event ledger.
// ABOUTME: Events are job-scoped, timestamped facts appended as a job makes progress.

use serde::{Deserialize, Serialize};

use crate::record::Record;

/// Body encoding tag used when the caller does not pick one.
pub const DEFAULT_BODY_TYPE: i64 = 1;

fn default_body_type() -> i64 {
    DEFAULT_BODY_TYPE
}

/// A single event in a job's history. `hash` is a caller-supplied
/// correlation token and is not required to be unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub job_id: String,
    #[serde(default)]
    pub hash: String,
    pub name: String,
    #[serde(default = "default_body_type")]
    pub body_type: i64,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub created_time: i64,
    #[serde(default)]
    pub updated_time: i64,
}

impl Event {
    /// Create an unsaved event with the default body type, an empty body,
    /// and zero timestamps. The store assigns the id and timestamps on save.
    pub fn new(job_id: impl Into<String>, name: impl Into<String>, hash: impl Into<String>) -> Self {
        Self {
            id: None,
            job_id: job_id.into(),
            hash: hash.into(),
            name: name.into(),
            body_type: DEFAULT_BODY_TYPE,
            body: String::new(),
            created_time: 0,
            updated_time: 0,
        }
    }

    /// Replace the body, keeping the current body type.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Pre-set both timestamps, for saves that disable automatic timestamping.
    pub fn at(mut self, time: i64) -> Self {
        self.created_time = time;
        self.updated_time = time;
        self
    }
}

impl Record for Event {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }

    fn created_time(&self) -> i64 {
        self.created_time
    }

    fn set_created_time(&mut self, time: i64) {
        self.created_time = time;
    }

    fn updated_time(&self) -> i64 {
        self.updated_time
    }

    fn set_updated_time(&mut self, time: i64) {
        self.updated_time = time;
    }
}
