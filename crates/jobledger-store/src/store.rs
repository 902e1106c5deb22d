// ABOUTME: The generic record store contract: save, load, delete, and list over one table.
// ABOUTME: Assigns ids, stamps times, runs the validation hook, and checks affected-row counts.

use jobledger_core::{Record, new_record_id, now_millis};
use rusqlite::types::Value as SqlValue;
use rusqlite::{OptionalExtension, params_from_iter};
use serde_json::Value;

use crate::error::StoreError;
use crate::table::{TableRecord, column_list, placeholders};
use crate::transaction::TransactionManager;

/// Options controlling a single `save`.
#[derive(Debug, Clone)]
pub struct SaveOptions {
    /// Force insert (`Some(true)`) or update (`Some(false)`). When unset a
    /// record is new iff it has no id.
    pub is_new: Option<bool>,
    pub skip_validation: bool,
    /// When false, caller-supplied `created_time`/`updated_time` are stored
    /// verbatim.
    pub auto_timestamp: bool,
    /// Passed through to the store's validation hook.
    pub validation_rules: Value,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            is_new: None,
            skip_validation: false,
            auto_timestamp: true,
            validation_rules: Value::Null,
        }
    }
}

impl SaveOptions {
    pub fn with_is_new(mut self, is_new: bool) -> Self {
        self.is_new = Some(is_new);
        self
    }

    pub fn skipping_validation(mut self) -> Self {
        self.skip_validation = true;
        self
    }

    pub fn without_auto_timestamp(mut self) -> Self {
        self.auto_timestamp = false;
        self
    }

    pub fn with_validation_rules(mut self, rules: Value) -> Self {
        self.validation_rules = rules;
        self
    }
}

/// What the validation hook is told about the save in progress.
#[derive(Debug, Clone, Copy)]
pub struct ValidateOptions<'a> {
    pub is_new: bool,
    pub rules: &'a Value,
}

/// The base validation rule: an update must reference an existing id.
/// Stores that override `validate` call this first.
pub fn require_id_for_update<R: Record>(
    record: &R,
    options: &ValidateOptions<'_>,
) -> Result<(), StoreError> {
    if !options.is_new && !record.has_id() {
        return Err(StoreError::UnprocessableEntity("id is missing".to_string()));
    }
    Ok(())
}

/// A stateless facade over one table.
///
/// Every operation takes the caller's unit of work and runs inside its
/// active scope, if any. Implementors pick the record type and may override
/// the hooks (`validate`, `is_new`, `from_api_input`, `to_api_output`); the
/// storage operations themselves are provided.
pub trait RecordStore {
    type Record: TableRecord;

    fn validate(
        &self,
        record: &Self::Record,
        options: &ValidateOptions<'_>,
    ) -> Result<(), StoreError> {
        require_id_for_update(record, options)
    }

    fn is_new(&self, record: &Self::Record, options: &SaveOptions) -> bool {
        options.is_new.unwrap_or_else(|| !record.has_id())
    }

    /// Turn an external representation into a record ready for `save`.
    fn from_api_input(&self, input: Value) -> Result<Self::Record, StoreError> {
        serde_json::from_value(input).map_err(|e| StoreError::UnprocessableEntity(e.to_string()))
    }

    /// Turn a loaded record into its external representation.
    fn to_api_output(&self, record: &Self::Record) -> Result<Value, StoreError> {
        Ok(serde_json::to_value(record)?)
    }

    /// Insert or update `record` and return it as persisted, including any
    /// assigned id and timestamps.
    ///
    /// Updates write every column except `id` and fail with
    /// `StoreError::Consistency` unless exactly one row matched. With
    /// automatic timestamping the stored `created_time` is left alone and
    /// copied into the returned record.
    fn save(
        &self,
        tx: &TransactionManager,
        record: Self::Record,
        options: &SaveOptions,
    ) -> Result<Self::Record, StoreError> {
        let mut to_save = record;
        let is_new = self.is_new(&to_save, options);

        if is_new && !to_save.has_id() {
            to_save.set_id(new_record_id());
        }

        if options.auto_timestamp {
            let now = now_millis();
            if is_new {
                to_save.set_created_time(now);
            }
            to_save.set_updated_time(now);
        }

        if !options.skip_validation {
            self.validate(
                &to_save,
                &ValidateOptions {
                    is_new,
                    rules: &options.validation_rules,
                },
            )?;
        }

        if is_new {
            insert_row(tx, &to_save)?;
        } else {
            update_row(tx, &mut to_save, options.auto_timestamp)?;
        }

        Ok(to_save)
    }

    /// Point lookup by id. A missing row is `Ok(None)`.
    fn load(&self, tx: &TransactionManager, id: &str) -> Result<Option<Self::Record>, StoreError> {
        if id.is_empty() {
            return Err(StoreError::InvalidArgument("id cannot be empty".to_string()));
        }

        let sql = format!(
            "SELECT {} FROM {} WHERE id = ?1 LIMIT 1",
            column_list::<Self::Record>(),
            Self::Record::TABLE
        );
        let mut stmt = tx.connection().prepare_cached(&sql)?;
        let record = stmt.query_row([id], Self::Record::from_row).optional()?;
        Ok(record)
    }

    /// Delete every row whose id is in `ids`, as one all-or-nothing
    /// operation. Fails with `StoreError::Consistency`, leaving the table
    /// untouched, unless exactly `ids.len()` rows were deleted.
    fn delete<S: AsRef<str>>(&self, tx: &TransactionManager, ids: &[S]) -> Result<(), StoreError> {
        if ids.is_empty() {
            return Err(StoreError::InvalidArgument("no id provided".to_string()));
        }
        if ids.iter().any(|id| id.as_ref().is_empty()) {
            return Err(StoreError::InvalidArgument("id cannot be empty".to_string()));
        }

        let table = Self::Record::TABLE;

        tx.all_or_nothing(|conn| {
            let mut deleted = 0;
            for chunk in ids.chunks(DELETE_CHUNK_SIZE) {
                let sql = format!(
                    "DELETE FROM {} WHERE id IN ({})",
                    table,
                    placeholders(1, chunk.len())
                );
                deleted += conn
                    .prepare_cached(&sql)?
                    .execute(params_from_iter(chunk.iter().map(|id| id.as_ref())))?;
            }
            if deleted != ids.len() {
                return Err(StoreError::Consistency {
                    table,
                    operation: "delete",
                    expected: ids.len(),
                    actual: deleted,
                });
            }
            Ok(())
        })?;

        tracing::debug!("deleted {} row(s) from {}", ids.len(), table);
        Ok(())
    }

    /// Every row in the table, in insertion order.
    fn all(&self, tx: &TransactionManager) -> Result<Vec<Self::Record>, StoreError> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY rowid ASC",
            column_list::<Self::Record>(),
            Self::Record::TABLE
        );
        let mut stmt = tx.connection().prepare_cached(&sql)?;
        let rows = stmt.query_map([], Self::Record::from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

/// Ids bound per DELETE statement; SQLite caps a statement at 32766 parameters.
const DELETE_CHUNK_SIZE: usize = 500;

fn insert_row<R: TableRecord>(tx: &TransactionManager, record: &R) -> Result<(), StoreError> {
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        R::TABLE,
        column_list::<R>(),
        placeholders(1, R::FIELDS.len())
    );
    tx.connection()
        .prepare_cached(&sql)?
        .execute(params_from_iter(record.to_values()))?;

    tracing::debug!(
        "inserted {} into {} (scope {:?})",
        record.id().unwrap_or_default(),
        R::TABLE,
        tx.active_scope()
    );
    Ok(())
}

/// Update every column but `id`. When `keep_created_time` is set the
/// stored `created_time` is kept and written back into `record`.
fn update_row<R: TableRecord>(
    tx: &TransactionManager,
    record: &mut R,
    keep_created_time: bool,
) -> Result<(), StoreError> {
    let Some(id) = record.id().filter(|id| !id.is_empty()).map(str::to_string) else {
        return Err(StoreError::InvalidArgument(
            "missing \"id\" property".to_string(),
        ));
    };

    let (columns, mut values): (Vec<&str>, Vec<SqlValue>) = R::FIELDS
        .iter()
        .copied()
        .zip(record.to_values())
        .skip(1)
        .filter(|(field, _)| !(keep_created_time && *field == "created_time"))
        .unzip();

    let assignments = columns
        .iter()
        .enumerate()
        .map(|(i, field)| format!("{} = ?{}", field, i + 1))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "UPDATE {} SET {} WHERE id = ?{} RETURNING created_time",
        R::TABLE,
        assignments,
        columns.len() + 1
    );
    values.push(SqlValue::Text(id.clone()));

    let mut stmt = tx.connection().prepare_cached(&sql)?;
    let stored_created: Vec<i64> = stmt
        .query_map(params_from_iter(values), |row| row.get(0))?
        .collect::<Result<_, _>>()?;
    let updated = stored_created.len();

    if let [created_time] = stored_created.as_slice() {
        record.set_created_time(*created_time);
    }

    if updated != 1 {
        return Err(StoreError::Consistency {
            table: R::TABLE,
            operation: "update",
            expected: 1,
            actual: updated,
        });
    }

    tracing::debug!(
        "updated {} in {} (scope {:?})",
        id,
        R::TABLE,
        tx.active_scope()
    );
    Ok(())
}
