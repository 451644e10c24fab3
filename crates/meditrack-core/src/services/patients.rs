//! Patient facade.

use serde_json::Value;
use tracing::{debug, info, warn};

use super::{row_id, to_row, ServiceError, ServiceResult};
use crate::db::{RecordStore, Table};
use crate::models::{create_patient, Patient, PatientData};

/// Fields matched by [`PatientService::list`] searches.
pub const PATIENT_SEARCH_FIELDS: [&str; 4] = ["name", "email", "phone", "id"];

/// Patient operations over a record store.
#[derive(Debug, Clone)]
pub struct PatientService<S> {
    store: S,
}

impl<S: RecordStore> PatientService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// All patients, or those where name, email, phone or id starts with
    /// `filter` (case-insensitive). A blank filter lists everything.
    pub fn list(&self, filter: Option<&str>) -> ServiceResult<Vec<Patient>> {
        let rows = match filter.map(str::trim).filter(|q| !q.is_empty()) {
            Some(query) => {
                debug!(query, "Searching patients");
                self.store
                    .find_prefix(Table::Patients, &PATIENT_SEARCH_FIELDS, query)?
            }
            None => self.store.get_all(Table::Patients)?,
        };

        rows.into_iter().map(decode).collect()
    }

    pub fn get(&self, id: &str) -> ServiceResult<Option<Patient>> {
        self.store
            .get_by_id(Table::Patients, id)?
            .map(decode)
            .transpose()
    }

    /// Like [`get`](Self::get), but absence is an error.
    pub fn require(&self, id: &str) -> ServiceResult<Patient> {
        self.get(id)?.ok_or_else(|| ServiceError::NotFound {
            entity: "patient",
            id: id.to_string(),
        })
    }

    /// Validate, assign an id and store a new patient.
    pub fn create(&self, data: PatientData) -> ServiceResult<Patient> {
        let patient = create_patient(data)?;
        self.add(&patient)?;
        Ok(patient)
    }

    /// Store a patient; fails if the id is taken.
    pub fn add(&self, patient: &Patient) -> ServiceResult<()> {
        patient.validate()?;
        self.store.add(Table::Patients, &to_row(patient)?)?;
        info!(patient_id = %patient.id, "Patient added");
        Ok(())
    }

    /// Replace an existing patient.
    pub fn update(&self, patient: &Patient) -> ServiceResult<()> {
        patient.validate()?;
        if self.store.get_by_id(Table::Patients, &patient.id)?.is_none() {
            return Err(ServiceError::NotFound {
                entity: "patient",
                id: patient.id.clone(),
            });
        }
        self.store.put(Table::Patients, &to_row(patient)?)?;
        info!(patient_id = %patient.id, "Patient updated");
        Ok(())
    }

    /// Remove a patient. Does not touch their history; see
    /// [`delete_with_history`](Self::delete_with_history).
    pub fn delete(&self, id: &str) -> ServiceResult<()> {
        self.store.delete(Table::Patients, id)?;
        info!(patient_id = id, "Patient deleted");
        Ok(())
    }

    /// Remove a patient and every record of theirs in one transaction.
    /// Malformed records are removed too.
    pub fn delete_with_history(&self, id: &str) -> ServiceResult<()> {
        let removed = self.store.bulk_delete(&[
            (Table::MedicalHistory, "patientId", id),
            (Table::Patients, "id", id),
        ])?;
        info!(patient_id = id, removed, "Patient and history deleted");
        Ok(())
    }
}

fn decode(row: Value) -> ServiceResult<Patient> {
    let id = row_id(&row);
    Patient::from_value(row).map_err(|source| {
        warn!(patient_id = %id, error = %source, "Malformed patient row");
        ServiceError::Corrupt {
            entity: "patient",
            id,
            source,
        }
    })
}
