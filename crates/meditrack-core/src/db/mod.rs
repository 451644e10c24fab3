//! Database layer for meditrack.
//!
//! A keyed-record store: each table holds whole entities as JSON, keyed by
//! their `id`. The store knows nothing about the entity schema; the service
//! layer validates everything that goes in or comes out.

mod schema;
mod store;

pub use schema::*;

use rusqlite::Connection;
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Duplicate id in {table}: {id}")]
    Duplicate { table: Table, id: String },

    #[error("Field '{field}' is not indexed on {table}")]
    NotIndexed { table: Table, field: String },

    #[error("Database lock poisoned")]
    Poisoned,
}

pub type DbResult<T> = Result<T, DbError>;

/// The two entity tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Patients,
    MedicalHistory,
}

impl Table {
    pub const ALL: [Table; 2] = [Table::Patients, Table::MedicalHistory];

    /// SQL table name.
    pub fn name(&self) -> &'static str {
        match self {
            Table::Patients => "patients",
            Table::MedicalHistory => "medical_history",
        }
    }

    /// Column backing an indexed JSON field, if any.
    pub fn indexed_column(&self, field: &str) -> Option<&'static str> {
        match (self, field) {
            (_, "id") => Some("id"),
            (Table::Patients, "name") => Some("name"),
            (Table::Patients, "email") => Some("email"),
            (Table::Patients, "phone") => Some("phone"),
            (Table::Patients, "dateOfBirth") => Some("date_of_birth"),
            (Table::Patients, "diagnosis") => Some("diagnosis"),
            (Table::MedicalHistory, "patientId") => Some("patient_id"),
            (Table::MedicalHistory, "category") => Some("category"),
            (Table::MedicalHistory, "type") => Some("record_type"),
            _ => None,
        }
    }

    pub(crate) fn column(&self, field: &str) -> DbResult<&'static str> {
        self.indexed_column(field).ok_or_else(|| DbError::NotIndexed {
            table: *self,
            field: field.to_string(),
        })
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Keyed storage of JSON entities.
///
/// Entities are JSON objects with a string `id`. Listing operations return
/// rows in insertion order. No schema or cross-table integrity is enforced.
pub trait RecordStore {
    fn get_all(&self, table: Table) -> DbResult<Vec<Value>>;

    fn get_by_id(&self, table: Table, id: &str) -> DbResult<Option<Value>>;

    /// Insert; fails with [`DbError::Duplicate`] if the id exists.
    fn add(&self, table: Table, entity: &Value) -> DbResult<()>;

    /// Insert or replace by id.
    fn put(&self, table: Table, entity: &Value) -> DbResult<()>;

    /// Remove by id. Removing a missing id is not an error.
    fn delete(&self, table: Table, id: &str) -> DbResult<()>;

    /// Rows whose indexed `field` equals `value`.
    fn find_equal(&self, table: Table, field: &str, value: &str) -> DbResult<Vec<Value>>;

    /// Rows where any of the indexed `fields` starts with `prefix`,
    /// ignoring ASCII case.
    fn find_prefix(&self, table: Table, fields: &[&str], prefix: &str) -> DbResult<Vec<Value>>;

    /// Insert every batch in one transaction; any duplicate aborts all.
    fn bulk_add(&self, batches: &[(Table, Vec<Value>)]) -> DbResult<()>;

    /// For each `(table, field, value)`, remove the rows whose indexed
    /// `field` equals `value`. All batches share one transaction; any error
    /// leaves every table untouched. Returns the number of rows removed.
    fn bulk_delete(&self, batches: &[(Table, &str, &str)]) -> DbResult<usize>;

    fn clear(&self, table: Table) -> DbResult<()>;
}

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize schema.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

macro_rules! forward_store {
    ($($target:tt)+) => {
        impl<S: RecordStore + ?Sized> RecordStore for $($target)+ {
            fn get_all(&self, table: Table) -> DbResult<Vec<Value>> {
                (**self).get_all(table)
            }
            fn get_by_id(&self, table: Table, id: &str) -> DbResult<Option<Value>> {
                (**self).get_by_id(table, id)
            }
            fn add(&self, table: Table, entity: &Value) -> DbResult<()> {
                (**self).add(table, entity)
            }
            fn put(&self, table: Table, entity: &Value) -> DbResult<()> {
                (**self).put(table, entity)
            }
            fn delete(&self, table: Table, id: &str) -> DbResult<()> {
                (**self).delete(table, id)
            }
            fn find_equal(&self, table: Table, field: &str, value: &str) -> DbResult<Vec<Value>> {
                (**self).find_equal(table, field, value)
            }
            fn find_prefix(&self, table: Table, fields: &[&str], prefix: &str) -> DbResult<Vec<Value>> {
                (**self).find_prefix(table, fields, prefix)
            }
            fn bulk_add(&self, batches: &[(Table, Vec<Value>)]) -> DbResult<()> {
                (**self).bulk_add(batches)
            }
            fn bulk_delete(&self, batches: &[(Table, &str, &str)]) -> DbResult<usize> {
                (**self).bulk_delete(batches)
            }
            fn clear(&self, table: Table) -> DbResult<()> {
                (**self).clear(table)
            }
        }
    };
}

forward_store!(&S);
forward_store!(Arc<S>);

/// Shared access for the FFI object; every call holds the lock.
impl<S: RecordStore> RecordStore for Mutex<S> {
    fn get_all(&self, table: Table) -> DbResult<Vec<Value>> {
        self.lock().map_err(|_| DbError::Poisoned)?.get_all(table)
    }
    fn get_by_id(&self, table: Table, id: &str) -> DbResult<Option<Value>> {
        self.lock().map_err(|_| DbError::Poisoned)?.get_by_id(table, id)
    }
    fn add(&self, table: Table, entity: &Value) -> DbResult<()> {
        self.lock().map_err(|_| DbError::Poisoned)?.add(table, entity)
    }
    fn put(&self, table: Table, entity: &Value) -> DbResult<()> {
        self.lock().map_err(|_| DbError::Poisoned)?.put(table, entity)
    }
    fn delete(&self, table: Table, id: &str) -> DbResult<()> {
        self.lock().map_err(|_| DbError::Poisoned)?.delete(table, id)
    }
    fn find_equal(&self, table: Table, field: &str, value: &str) -> DbResult<Vec<Value>> {
        self.lock()
            .map_err(|_| DbError::Poisoned)?
            .find_equal(table, field, value)
    }
    fn find_prefix(&self, table: Table, fields: &[&str], prefix: &str) -> DbResult<Vec<Value>> {
        self.lock()
            .map_err(|_| DbError::Poisoned)?
            .find_prefix(table, fields, prefix)
    }
    fn bulk_add(&self, batches: &[(Table, Vec<Value>)]) -> DbResult<()> {
        self.lock().map_err(|_| DbError::Poisoned)?.bulk_add(batches)
    }
    fn bulk_delete(&self, batches: &[(Table, &str, &str)]) -> DbResult<usize> {
        self.lock().map_err(|_| DbError::Poisoned)?.bulk_delete(batches)
    }
    fn clear(&self, table: Table) -> DbResult<()> {
        self.lock().map_err(|_| DbError::Poisoned)?.clear(table)
    }
}
