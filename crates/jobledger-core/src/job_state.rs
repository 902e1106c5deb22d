// ABOUTME: Defines the JobState record holding the mutable current state of one job.
// ABOUTME: Tracks when the job last started and finished plus an opaque serialized context.

use serde::{Deserialize, Serialize};

use crate::record::Record;

/// The current state of a job. Callers keep one row per job; the store
/// does not enforce that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub job_id: String,
    #[serde(default)]
    pub last_started: i64,
    #[serde(default)]
    pub last_finished: i64,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub created_time: i64,
    #[serde(default)]
    pub updated_time: i64,
}

impl JobState {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            id: None,
            job_id: job_id.into(),
            last_started: 0,
            last_finished: 0,
            context: String::new(),
            created_time: 0,
            updated_time: 0,
        }
    }

    /// True while the job has started more recently than it finished.
    pub fn is_running(&self) -> bool {
        self.last_started > self.last_finished
    }
}

impl Record for JobState {
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
