// ABOUTME: Record store over the job_states table, one current-state row per job by convention.
// ABOUTME: Adds a required job_id check on top of the base validation rule.

use jobledger_core::JobState;

use crate::error::StoreError;
use crate::store::{RecordStore, ValidateOptions, require_id_for_update};

/// Record store for job current-state rows.
#[derive(Debug, Default, Clone, Copy)]
pub struct JobStateStore;

impl RecordStore for JobStateStore {
    type Record = JobState;

    fn validate(&self, state: &JobState, options: &ValidateOptions<'_>) -> Result<(), StoreError> {
        require_id_for_update(state, options)?;
        if state.job_id.is_empty() {
            return Err(StoreError::UnprocessableEntity("job_id is required".to_string()));
        }
        Ok(())
    }
}
