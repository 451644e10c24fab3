//! Medical-history facade.

use serde_json::Value;
use tracing::{debug, info, warn};

use super::{row_id, to_row, ServiceError, ServiceResult};
use crate::db::{RecordStore, Table};
use crate::id::PATIENT_IDS;
use crate::models::{MedicalHistoryRecord, ValidationError};

/// Medical-history operations over a record store.
#[derive(Debug, Clone)]
pub struct MedicalHistoryService<S> {
    store: S,
}

impl<S: RecordStore> MedicalHistoryService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Records of one patient, in storage order.
    pub fn list(&self, patient_id: &str) -> ServiceResult<Vec<MedicalHistoryRecord>> {
        if !PATIENT_IDS.is_valid(patient_id) {
            return Err(ValidationError::single("patientId", "must match PAT-XXXXX-XXXXX").into());
        }

        let rows = self
            .store
            .find_equal(Table::MedicalHistory, "patientId", patient_id)?;
        debug!(patient_id, count = rows.len(), "Loaded medical history");
        rows.into_iter().map(decode).collect()
    }

    /// Every record of every patient, in storage order.
    pub fn list_all(&self) -> ServiceResult<Vec<MedicalHistoryRecord>> {
        self.store
            .get_all(Table::MedicalHistory)?
            .into_iter()
            .map(decode)
            .collect()
    }

    pub fn get(&self, id: &str) -> ServiceResult<Option<MedicalHistoryRecord>> {
        self.store
            .get_by_id(Table::MedicalHistory, id)?
            .map(decode)
            .transpose()
    }

    /// Like [`get`](Self::get), but absence is an error.
    pub fn require(&self, id: &str) -> ServiceResult<MedicalHistoryRecord> {
        self.get(id)?.ok_or_else(|| ServiceError::NotFound {
            entity: "record",
            id: id.to_string(),
        })
    }

    /// Store a record; fails if the id is taken.
    pub fn add(&self, record: &MedicalHistoryRecord) -> ServiceResult<()> {
        record.validate()?;
        self.store.add(Table::MedicalHistory, &to_row(record)?)?;
        info!(
            record_id = %record.id,
            patient_id = %record.patient_id,
            category = %record.category(),
            "Record added"
        );
        Ok(())
    }

    /// Replace an existing record.
    pub fn update(&self, record: &MedicalHistoryRecord) -> ServiceResult<()> {
        record.validate()?;
        if self
            .store
            .get_by_id(Table::MedicalHistory, &record.id)?
            .is_none()
        {
            return Err(ServiceError::NotFound {
                entity: "record",
                id: record.id.clone(),
            });
        }
        self.store.put(Table::MedicalHistory, &to_row(record)?)?;
        info!(record_id = %record.id, category = %record.category(), "Record updated");
        Ok(())
    }

    pub fn delete(&self, id: &str) -> ServiceResult<()> {
        self.store.delete(Table::MedicalHistory, id)?;
        info!(record_id = id, "Record deleted");
        Ok(())
    }

    /// Remove every record of a patient, returning how many were removed.
    ///
    /// Works on raw rows so that malformed records are removed too.
    pub fn delete_for_patient(&self, patient_id: &str) -> ServiceResult<usize> {
        let count = self
            .store
            .bulk_delete(&[(Table::MedicalHistory, "patientId", patient_id)])?;
        info!(patient_id, count, "Patient history deleted");
        Ok(count)
    }
}

fn decode(row: Value) -> ServiceResult<MedicalHistoryRecord> {
    let id = row_id(&row);
    MedicalHistoryRecord::from_value(row).map_err(|source| {
        warn!(record_id = %id, error = %source, "Malformed record row");
        ServiceError::Corrupt {
            entity: "record",
            id,
            source,
        }
    })
}
