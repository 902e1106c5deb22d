// ABOUTME: Table definitions for the events and job_states tables.
// ABOUTME: Applied idempotently when a database is opened; there is no migration history.

/// DDL for every table the stores read and write.
pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS events (
    id TEXT PRIMARY KEY NOT NULL,
    job_id TEXT NOT NULL,
    hash TEXT NOT NULL,
    name TEXT NOT NULL,
    body_type INTEGER NOT NULL DEFAULT 1,
    body TEXT NOT NULL DEFAULT '',
    created_time INTEGER NOT NULL,
    updated_time INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS events_job_id_created_time
    ON events (job_id, created_time);

CREATE TABLE IF NOT EXISTS job_states (
    id TEXT PRIMARY KEY NOT NULL,
    job_id TEXT NOT NULL,
    last_started INTEGER NOT NULL DEFAULT 0,
    last_finished INTEGER NOT NULL DEFAULT 0,
    context TEXT NOT NULL DEFAULT '',
    created_time INTEGER NOT NULL,
    updated_time INTEGER NOT NULL
);
";
