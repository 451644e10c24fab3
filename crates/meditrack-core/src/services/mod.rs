//! Service facades over the record store.
//!
//! Services are the only place where typed entities meet the untyped store:
//! writes are validated before they reach storage, and every row read back is
//! re-validated, since the database may have been imported or edited by hand.
//! A malformed row is an error, never silently skipped.

mod history;
mod patients;

pub use history::*;
pub use patients::*;

use serde_json::Value;
use thiserror::Error;

use crate::db::DbError;
use crate::models::ValidationError;

/// Service errors.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Storage(#[from] DbError),

    #[error("Stored {entity} '{id}' is malformed")]
    Corrupt {
        entity: &'static str,
        id: String,
        #[source]
        source: ValidationError,
    },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::NotFound { .. })
    }
}

/// Best-effort id of an untyped row, for error reporting.
fn row_id(value: &Value) -> String {
    value
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or("<unknown>")
        .to_string()
}

fn to_row<T: serde::Serialize>(entity: &T) -> ServiceResult<Value> {
    serde_json::to_value(entity).map_err(|e| ServiceError::Storage(e.into()))
}
