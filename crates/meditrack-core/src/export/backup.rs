//! Whole-database backup and restore.
//!
//! The envelope is the at-rest shape of both tables:
//!
//! ```json
//! { "version": 1, "timestamp": "2024-03-05T14:30:00.000Z",
//!   "data": { "patients": [...], "medicalHistory": [...] } }
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::BACKUP_VERSION;
use crate::db::{DbError, RecordStore, Table};
use crate::models::{dates, MedicalHistoryRecord, Patient, ValidationError};
use crate::services::{MedicalHistoryService, PatientService, ServiceError};

/// Backup errors.
#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Invalid backup format: {0}")]
    ImportFormat(String),

    #[error("Invalid {entity} at index {index}")]
    Invalid {
        entity: &'static str,
        index: usize,
        #[source]
        source: ValidationError,
    },

    #[error(transparent)]
    Storage(#[from] DbError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type BackupResult<T> = Result<T, BackupError>;

/// Backup file envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupEnvelope {
    pub version: u32,
    #[serde(with = "dates::timestamp")]
    pub timestamp: DateTime<Utc>,
    pub data: BackupData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupData {
    pub patients: Vec<Patient>,
    pub medical_history: Vec<MedicalHistoryRecord>,
}

/// Counts of imported entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportSummary {
    pub patients: usize,
    pub records: usize,
}

/// Snapshot both tables. Fails if any stored row is malformed.
pub fn export_backup<S: RecordStore>(store: &S) -> BackupResult<BackupEnvelope> {
    let patients = PatientService::new(store).list(None)?;
    let medical_history = MedicalHistoryService::new(store).list_all()?;
    info!(
        patients = patients.len(),
        records = medical_history.len(),
        "Exporting backup"
    );

    Ok(BackupEnvelope {
        version: BACKUP_VERSION,
        timestamp: Utc::now(),
        data: BackupData {
            patients,
            medical_history,
        },
    })
}

/// [`export_backup`] rendered as pretty JSON.
pub fn export_backup_json<S: RecordStore>(store: &S) -> BackupResult<String> {
    let envelope = export_backup(store)?;
    Ok(serde_json::to_string_pretty(&envelope)?)
}

/// Validate a backup and insert every entity in one transaction.
///
/// Nothing is written unless every entity validates and no id collides with
/// a stored one (or another in the file). An absent `version` is read as 1.
pub fn import_backup<S: RecordStore>(store: &S, json: &str) -> BackupResult<ImportSummary> {
    let envelope: Value = serde_json::from_str(json)?;

    match envelope.get("version") {
        None => {}
        Some(v) if v.as_u64() == Some(u64::from(BACKUP_VERSION)) => {}
        Some(v) => {
            return Err(BackupError::ImportFormat(format!(
                "unsupported version {}",
                v
            )))
        }
    }

    let data = envelope
        .get("data")
        .ok_or_else(|| BackupError::ImportFormat("missing data".to_string()))?;
    let patients = entity_array(data, "patients")?;
    let records = entity_array(data, "medicalHistory")?;

    let patients = patients
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            Patient::from_value(raw.clone()).map_err(|source| BackupError::Invalid {
                entity: "patient",
                index,
                source,
            })
        })
        .collect::<BackupResult<Vec<_>>>()?;

    let records = records
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            MedicalHistoryRecord::from_value(raw.clone()).map_err(|source| {
                BackupError::Invalid {
                    entity: "record",
                    index,
                    source,
                }
            })
        })
        .collect::<BackupResult<Vec<_>>>()?;

    let summary = ImportSummary {
        patients: patients.len(),
        records: records.len(),
    };

    let patient_rows = patients
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()?;
    let record_rows = records
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()?;

    store
        .bulk_add(&[
            (Table::Patients, patient_rows),
            (Table::MedicalHistory, record_rows),
        ])
        .inspect_err(|e| warn!(error = %e, "Backup import rolled back"))?;

    info!(
        patients = summary.patients,
        records = summary.records,
        "Backup imported"
    );
    Ok(summary)
}

fn entity_array<'a>(data: &'a Value, key: &str) -> BackupResult<&'a Vec<Value>> {
    match data.get(key) {
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(BackupError::ImportFormat(format!(
            "data.{} must be an array",
            key
        ))),
        None => Err(BackupError::ImportFormat(format!("missing data.{}", key))),
    }
}

/// Download name for a backup taken on `date`.
pub fn backup_file_name(date: NaiveDate) -> String {
    format!("meditrack-backup-{}.json", date.format("%Y-%m-%d"))
}
