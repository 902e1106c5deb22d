// ABOUTME: The job event ledger: a record store over the events table plus incremental sync.
// ABOUTME: Consumers catch up with events_since or poll, carrying a timestamp and a seen-id set.

use jobledger_core::{Event, SyncBookmark};
use rusqlite::params_from_iter;
use rusqlite::types::Value;

use crate::error::StoreError;
use crate::store::{RecordStore, ValidateOptions, require_id_for_update};
use crate::table::{TableRecord, column_list};
use crate::transaction::TransactionManager;

/// Record store for job events with the incremental catch-up query.
#[derive(Debug, Default, Clone, Copy)]
pub struct EventLedger;

impl RecordStore for EventLedger {
    type Record = Event;

    fn validate(&self, event: &Event, options: &ValidateOptions<'_>) -> Result<(), StoreError> {
        require_id_for_update(event, options)?;
        if event.job_id.is_empty() {
            return Err(StoreError::UnprocessableEntity("job_id is required".to_string()));
        }
        if event.name.is_empty() {
            return Err(StoreError::UnprocessableEntity("name is required".to_string()));
        }
        Ok(())
    }
}

impl EventLedger {
    /// Events of `job_id` created at or after `since_time`, minus
    /// `excluded_ids`, oldest first. Events sharing a timestamp come back in
    /// insertion order.
    ///
    /// Pass the highest `created_time` seen so far as `since_time` and the
    /// ids already seen at that time as `excluded_ids`; see `SyncBookmark`.
    pub fn events_since<S: AsRef<str>>(
        &self,
        tx: &TransactionManager,
        job_id: &str,
        since_time: i64,
        excluded_ids: &[S],
    ) -> Result<Vec<Event>, StoreError> {
        // Exclusions bind as one JSON array so any number of ids fits in a
        // single parameter.
        let mut sql = format!(
            "SELECT {} FROM {} WHERE job_id = ?1 AND created_time >= ?2",
            column_list::<Event>(),
            Event::TABLE
        );
        let mut params = vec![
            Value::Text(job_id.to_string()),
            Value::Integer(since_time),
        ];
        if !excluded_ids.is_empty() {
            sql.push_str(" AND id NOT IN (SELECT value FROM json_each(?3))");
            let excluded: Vec<&str> = excluded_ids.iter().map(|id| id.as_ref()).collect();
            params.push(Value::Text(serde_json::to_string(&excluded)?));
        }
        sql.push_str(" ORDER BY created_time ASC, rowid ASC");

        let mut stmt = tx.connection().prepare_cached(&sql)?;
        let rows = stmt.query_map(params_from_iter(params), Event::from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Fetch the events `bookmark` has not seen yet and move it past them.
    pub fn poll(
        &self,
        tx: &TransactionManager,
        job_id: &str,
        bookmark: &mut SyncBookmark,
    ) -> Result<Vec<Event>, StoreError> {
        let events = self.events_since(tx, job_id, bookmark.since_time, &bookmark.seen_ids)?;
        bookmark.advance(&events);
        tracing::debug!(
            "polled {} event(s) for job {}; bookmark now at {} with {} seen id(s)",
            events.len(),
            job_id,
            bookmark.since_time,
            bookmark.seen_ids.len()
        );
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, SaveOptions};
    use jobledger_core::now_millis;
    use tempfile::TempDir;

    fn open_db(dir: &TempDir) -> Database {
        Database::open(&dir.path().join("ledger.db")).unwrap()
    }

    fn save_at(tx: &TransactionManager, job_id: &str, body: &str, time: i64) -> Event {
        EventLedger
            .save(
                tx,
                Event::new(job_id, "test", "123").with_body(body).at(time),
                &SaveOptions::default().without_auto_timestamp(),
            )
            .unwrap()
    }

    fn ids(events: &[Event]) -> Vec<String> {
        events.iter().filter_map(|e| e.id.clone()).collect()
    }

    #[test]
    fn returns_all_events_since_zero_and_none_from_now() {
        let dir = TempDir::new().unwrap();
        let tx = open_db(&dir).unit_of_work().unwrap();

        for body in ["one", "two", "three"] {
            EventLedger
                .save(
                    &tx,
                    Event::new("test", "test", "123").with_body(body),
                    &SaveOptions::default(),
                )
                .unwrap();
        }

        let none: [&str; 0] = [];
        let events = EventLedger.events_since(&tx, "test", 0, &none).unwrap();
        assert_eq!(events.len(), 3);
        let bodies: Vec<&str> = events.iter().map(|e| e.body.as_str()).collect();
        assert_eq!(bodies, vec!["one", "two", "three"]);

        let later = now_millis() + 1;
        assert!(EventLedger.events_since(&tx, "test", later, &none).unwrap().is_empty());
    }

    #[test]
    fn excludes_already_seen_events_at_same_timestamp() {
        let dir = TempDir::new().unwrap();
        let tx = open_db(&dir).unit_of_work().unwrap();

        let e1 = save_at(&tx, "test", "one", 1000);
        let e2 = save_at(&tx, "test", "two", 1000);
        let e3 = save_at(&tx, "test", "three", 1000);
        let e4 = save_at(&tx, "test", "four", 2000);

        let none: [&str; 0] = [];
        let all = EventLedger.events_since(&tx, "test", 1000, &none).unwrap();
        assert_eq!(ids(&all), ids(&[e1.clone(), e2.clone(), e3.clone(), e4.clone()]));

        let e1_id = e1.id.clone().unwrap();
        let rest = EventLedger.events_since(&tx, "test", 1000, &[&e1_id]).unwrap();
        assert_eq!(ids(&rest), ids(&[e2.clone(), e3.clone(), e4.clone()]));

        let seen = ids(&[e1, e2, e3]);
        let newest = EventLedger.events_since(&tx, "test", 1000, &seen).unwrap();
        assert_eq!(newest.len(), 1);
        assert_eq!(newest[0].id, e4.id);
    }

    #[test]
    fn accepts_more_exclusions_than_one_statement_can_bind() {
        let dir = TempDir::new().unwrap();
        let tx = open_db(&dir).unit_of_work().unwrap();

        let seen = save_at(&tx, "job", "seen", 1000);
        let fresh = save_at(&tx, "job", "fresh", 1000);

        let mut excluded: Vec<String> = (0..40_000).map(|i| format!("gone-{i}")).collect();
        excluded.push(seen.id.clone().unwrap());

        let events = EventLedger.events_since(&tx, "job", 1000, &excluded).unwrap();
        assert_eq!(ids(&events), ids(&[fresh]));
    }

    #[test]
    fn orders_by_created_time_then_insertion() {
        let dir = TempDir::new().unwrap();
        let tx = open_db(&dir).unit_of_work().unwrap();

        save_at(&tx, "job", "late", 3000);
        save_at(&tx, "job", "early-a", 1000);
        save_at(&tx, "job", "early-b", 1000);
        save_at(&tx, "job", "middle", 2000);

        let none: [&str; 0] = [];
        let bodies: Vec<String> = EventLedger
            .events_since(&tx, "job", 0, &none)
            .unwrap()
            .into_iter()
            .map(|e| e.body)
            .collect();
        assert_eq!(bodies, vec!["early-a", "early-b", "middle", "late"]);
    }

    #[test]
    fn only_returns_events_of_requested_job() {
        let dir = TempDir::new().unwrap();
        let tx = open_db(&dir).unit_of_work().unwrap();

        save_at(&tx, "job-a", "a", 1000);
        save_at(&tx, "job-b", "b", 1000);

        let none: [&str; 0] = [];
        let events = EventLedger.events_since(&tx, "job-a", 0, &none).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].job_id, "job-a");
    }

    #[test]
    fn poll_delivers_each_event_once_including_late_same_timestamp_arrivals() {
        let dir = TempDir::new().unwrap();
        let tx = open_db(&dir).unit_of_work().unwrap();
        let mut bookmark = SyncBookmark::default();

        let e1 = save_at(&tx, "job", "one", 1000);
        let e2 = save_at(&tx, "job", "two", 1000);

        let first = EventLedger.poll(&tx, "job", &mut bookmark).unwrap();
        assert_eq!(ids(&first), ids(&[e1, e2]));
        assert_eq!(bookmark.since_time, 1000);

        // Nothing new: nothing returned.
        assert!(EventLedger.poll(&tx, "job", &mut bookmark).unwrap().is_empty());

        // A late event at the bookmark time and a newer one.
        let e3 = save_at(&tx, "job", "three", 1000);
        let e4 = save_at(&tx, "job", "four", 1500);

        let second = EventLedger.poll(&tx, "job", &mut bookmark).unwrap();
        assert_eq!(ids(&second), ids(&[e3, e4.clone()]));
        assert_eq!(bookmark.since_time, 1500);
        assert_eq!(bookmark.seen_ids, ids(&[e4]));

        assert!(EventLedger.poll(&tx, "job", &mut bookmark).unwrap().is_empty());
    }

    #[test]
    fn validation_requires_job_id_and_name() {
        let dir = TempDir::new().unwrap();
        let tx = open_db(&dir).unit_of_work().unwrap();

        let no_job = EventLedger.save(&tx, Event::new("", "name", ""), &SaveOptions::default());
        assert!(matches!(no_job, Err(StoreError::UnprocessableEntity(_))));

        let no_name = EventLedger.save(&tx, Event::new("job", "", ""), &SaveOptions::default());
        assert!(matches!(no_name, Err(StoreError::UnprocessableEntity(_))));

        let skipped = EventLedger.save(
            &tx,
            Event::new("job", "", ""),
            &SaveOptions::default().skipping_validation(),
        );
        assert!(skipped.is_ok());
    }

    #[test]
    fn events_can_be_updated_and_deleted() {
        let dir = TempDir::new().unwrap();
        let tx = open_db(&dir).unit_of_work().unwrap();

        let mut event = EventLedger
            .save(&tx, Event::new("job", "progress", "h"), &SaveOptions::default())
            .unwrap();
        event.body = "50%".to_string();
        event.body_type = 2;
        let event = EventLedger.save(&tx, event, &SaveOptions::default()).unwrap();

        let id = event.id.clone().unwrap();
        let loaded = EventLedger.load(&tx, &id).unwrap().unwrap();
        assert_eq!(loaded.body, "50%");
        assert_eq!(loaded.body_type, 2);

        EventLedger.delete(&tx, &[&id]).unwrap();
        assert!(EventLedger.load(&tx, &id).unwrap().is_none());
    }
}
