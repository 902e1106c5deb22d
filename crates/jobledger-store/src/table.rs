// ABOUTME: Binds record types to their SQL tables with a statically declared field list.
// ABOUTME: Row mapping and parameter order both follow FIELDS, which always starts with id.

use jobledger_core::{Event, JobState, Record};
use rusqlite::Row;
use rusqlite::types::Value;

/// A record type stored in a SQL table.
///
/// `FIELDS` is the full column list, `id` first. Reads select exactly these
/// columns and writes bind `to_values()` in the same order.
pub trait TableRecord: Record {
    const TABLE: &'static str;
    const FIELDS: &'static [&'static str];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    /// Column values in `FIELDS` order. An absent id binds as NULL.
    fn to_values(&self) -> Vec<Value>;
}

fn id_value(id: Option<&str>) -> Value {
    id.map_or(Value::Null, |id| Value::Text(id.to_string()))
}

impl TableRecord for Event {
    const TABLE: &'static str = "events";
    const FIELDS: &'static [&'static str] = &[
        "id",
        "job_id",
        "hash",
        "name",
        "body_type",
        "body",
        "created_time",
        "updated_time",
    ];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Event {
            id: Some(row.get("id")?),
            job_id: row.get("job_id")?,
            hash: row.get("hash")?,
            name: row.get("name")?,
            body_type: row.get("body_type")?,
            body: row.get("body")?,
            created_time: row.get("created_time")?,
            updated_time: row.get("updated_time")?,
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            id_value(self.id()),
            Value::Text(self.job_id.clone()),
            Value::Text(self.hash.clone()),
            Value::Text(self.name.clone()),
            Value::Integer(self.body_type),
            Value::Text(self.body.clone()),
            Value::Integer(self.created_time),
            Value::Integer(self.updated_time),
        ]
    }
}

impl TableRecord for JobState {
    const TABLE: &'static str = "job_states";
    const FIELDS: &'static [&'static str] = &[
        "id",
        "job_id",
        "last_started",
        "last_finished",
        "context",
        "created_time",
        "updated_time",
    ];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(JobState {
            id: Some(row.get("id")?),
            job_id: row.get("job_id")?,
            last_started: row.get("last_started")?,
            last_finished: row.get("last_finished")?,
            context: row.get("context")?,
            created_time: row.get("created_time")?,
            updated_time: row.get("updated_time")?,
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            id_value(self.id()),
            Value::Text(self.job_id.clone()),
            Value::Integer(self.last_started),
            Value::Integer(self.last_finished),
            Value::Text(self.context.clone()),
            Value::Integer(self.created_time),
            Value::Integer(self.updated_time),
        ]
    }
}

/// Comma-separated column list for `R`.
pub(crate) fn column_list<R: TableRecord>() -> String {
    R::FIELDS.join(", ")
}

/// `?1, ?2, ...` placeholders for `count` parameters starting at `first`.
pub(crate) fn placeholders(first: usize, count: usize) -> String {
    (first..first + count)
        .map(|n| format!("?{n}"))
        .collect::<Vec<_>>()
        .join(", ")
}
