// ABOUTME: Persistence core for jobledger, built on SQLite.
// ABOUTME: Provides units of work with nested scopes, generic record stores, and the event ledger.

pub mod db;
pub mod error;
pub mod events;
pub mod job_states;
pub mod schema;
pub mod store;
pub mod table;
pub mod transaction;

pub use db::Database;
pub use error::StoreError;
pub use events::EventLedger;
pub use job_states::JobStateStore;
pub use store::{RecordStore, SaveOptions, ValidateOptions, require_id_for_update};
pub use table::TableRecord;
pub use transaction::{ScopeHandle, TransactionManager};
