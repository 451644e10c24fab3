//! MediTrack Core Library
//!
//! Local-first patient registry with breast-cancer diagnoses and a
//! per-patient treatment timeline.
//!
//! # Architecture
//!
//! ```text
//!   Host UI ──events──▶ controllers (PatientList, MedicalHistory)
//!                              │ effects
//!                              ▼
//!                     services (validate on read and write)
//!                              │
//!                              ▼
//!                RecordStore ── SQLite (JSON bodies + indexed columns)
//!                              │
//!                              ▼
//!                     export (versioned JSON backup)
//! ```
//!
//! # Modules
//!
//! - [`models`]: Domain types (Patient, MedicalHistoryRecord, categories)
//! - [`staging`]: TNM stage and molecular subtype derivation
//! - [`db`]: SQLite record store
//! - [`services`]: Validated CRUD over the store
//! - [`controllers`]: Patient list and medical history state machines
//! - [`export`]: Backup and restore
//! - [`config`] / [`logging`]: Startup configuration and tracing setup

pub mod config;
pub mod controllers;
pub mod db;
pub mod export;
pub mod id;
pub mod logging;
pub mod models;
pub mod services;
pub mod staging;

#[cfg(test)]
mod test_fixtures;

// Re-export commonly used types
pub use config::CoreConfig;
pub use controllers::{
    MedicalHistoryDriver, MedicalHistoryEvent, MedicalHistoryMachine, MedicalHistoryState,
    PatientListDriver, PatientListEvent, PatientListMachine, PatientListState, StateMachine,
};
pub use db::{Database, RecordStore, Table};
pub use export::{export_backup, export_backup_json, import_backup, BackupEnvelope};
pub use models::{
    Category, CategoryFilter, CategoryRegistry, Diagnosis, MedicalHistoryRecord, Patient,
    PatientData, RecordDetails, TemporalKind, ValidationError,
};
pub use services::{MedicalHistoryService, PatientService};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use models::dates;

type SharedStore = Arc<Mutex<Database>>;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum MediTrackError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Import error: {0}")]
    ImportError(String),
}

impl From<db::DbError> for MediTrackError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::NotFound(what) => MediTrackError::NotFound(what),
            other => MediTrackError::DatabaseError(other.to_string()),
        }
    }
}

impl From<services::ServiceError> for MediTrackError {
    fn from(e: services::ServiceError) -> Self {
        match e {
            services::ServiceError::Storage(e) => e.into(),
            services::ServiceError::Validation(e) => e.into(),
            e if e.is_not_found() => MediTrackError::NotFound(e.to_string()),
            e => MediTrackError::DatabaseError(e.to_string()),
        }
    }
}

impl From<ValidationError> for MediTrackError {
    fn from(e: ValidationError) -> Self {
        MediTrackError::InvalidInput(e.to_string())
    }
}

impl From<export::BackupError> for MediTrackError {
    fn from(e: export::BackupError) -> Self {
        MediTrackError::ImportError(format!("{:#}", anyhow::Error::from(e)))
    }
}

impl From<config::ConfigError> for MediTrackError {
    fn from(e: config::ConfigError) -> Self {
        MediTrackError::InvalidInput(e.to_string())
    }
}

impl From<serde_json::Error> for MediTrackError {
    fn from(e: serde_json::Error) -> Self {
        MediTrackError::SerializationError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for MediTrackError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        MediTrackError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<MediTrackCore>, MediTrackError> {
    let config = CoreConfig::new(Some(path.into()), config::DEFAULT_LOG_FILTER, CategoryFilter::All)?;
    MediTrackCore::from_config(&config)
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<MediTrackCore>, MediTrackError> {
    MediTrackCore::from_config(&CoreConfig::default())
}

/// Open from raw host settings. Blank values select the defaults.
#[uniffi::export]
pub fn open_with_config(
    database_path: Option<String>,
    log_filter: Option<String>,
    default_category_filter: Option<String>,
) -> Result<Arc<MediTrackCore>, MediTrackError> {
    let mut config = CoreConfig::from_env_values(database_path.as_deref(), log_filter.as_deref())?;
    if let Some(filter) = default_category_filter {
        config = config.with_default_category_filter(&filter)?;
    }
    logging::init_logging(config.log_filter());
    MediTrackCore::from_config(&config)
}

/// Install the tracing subscriber. Returns false if one was already set.
#[uniffi::export]
pub fn init_logging(filter: String) -> bool {
    logging::init_logging(&filter)
}

/// Derive the stage from wire TNM values (`"T2"`, `"N1"`, `"M0"`).
#[uniffi::export]
pub fn calculate_stage(t: String, n: String, m: String) -> Result<String, MediTrackError> {
    let t = models::TumorT::parse(&t).ok_or_else(|| invalid("tnmT", &t))?;
    let n = models::TumorN::parse(&n).ok_or_else(|| invalid("tnmN", &n))?;
    let m = models::TumorM::parse(&m).ok_or_else(|| invalid("tnmM", &m))?;
    Ok(staging::calculate_stage(t, n, m).as_str().to_string())
}

/// Derive the molecular subtype from wire receptor values.
#[uniffi::export]
pub fn calculate_subtype(
    er: String,
    pr: String,
    her2: String,
    ki67: Option<f64>,
) -> Result<String, MediTrackError> {
    let panel = staging::ReceptorPanel {
        er: models::ReceptorStatus::parse(&er).ok_or_else(|| invalid("er", &er))?,
        pr: models::ReceptorStatus::parse(&pr).ok_or_else(|| invalid("pr", &pr))?,
        her2: models::Her2Status::parse(&her2).ok_or_else(|| invalid("her2", &her2))?,
        ki67,
    };
    Ok(staging::calculate_subtype(&panel).as_str().to_string())
}

/// Suggested file name for a backup taken today.
#[uniffi::export]
pub fn backup_file_name() -> String {
    export::backup_file_name(chrono::Utc::now().date_naive())
}

fn invalid(field: &str, value: &str) -> MediTrackError {
    MediTrackError::InvalidInput(format!("{}: unknown value '{}'", field, value))
}

fn not_ready(load_error: Option<&str>) -> MediTrackError {
    MediTrackError::DatabaseError(match load_error {
        Some(message) => format!("Not loaded: {}", message),
        None => "Not loaded".to_string(),
    })
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe core handle for FFI.
///
/// Owns the patient list controller and one history controller per opened
/// patient. All writes go through the controllers so the views they expose
/// stay consistent with storage.
#[derive(uniffi::Object)]
pub struct MediTrackCore {
    db: SharedStore,
    patient_list: Mutex<PatientListDriver<SharedStore>>,
    histories: Mutex<HashMap<String, MedicalHistoryDriver<SharedStore>>>,
    default_category_filter: CategoryFilter,
}

impl MediTrackCore {
    fn from_config(config: &CoreConfig) -> Result<Arc<Self>, MediTrackError> {
        let db: SharedStore = Arc::new(Mutex::new(config.open_database()?));
        Ok(Arc::new(Self {
            patient_list: Mutex::new(PatientListDriver::new(db.clone())),
            histories: Mutex::new(HashMap::new()),
            default_category_filter: config.default_category_filter(),
            db,
        }))
    }

    /// Send an event and surface a write failure it caused.
    fn send_patient_event(&self, event: PatientListEvent) -> Result<FfiPatientList, MediTrackError> {
        let mut driver = self.patient_list.lock()?;
        let mutation = matches!(
            event,
            PatientListEvent::AddPatient(_)
                | PatientListEvent::UpdatePatient(_)
                | PatientListEvent::DeletePatient(_)
        );
        if mutation && driver.state() != PatientListState::Success {
            return Err(not_ready(driver.machine().context().error.as_deref()));
        }
        driver.send(PatientListEvent::ClearPersistError);
        driver.send(event);
        if let Some(message) = &driver.machine().context().persist_error {
            return Err(MediTrackError::DatabaseError(message.clone()));
        }
        FfiPatientList::try_from(driver.machine())
    }

    fn with_history<T>(
        &self,
        patient_id: &str,
        f: impl FnOnce(&mut MedicalHistoryDriver<SharedStore>) -> Result<T, MediTrackError>,
    ) -> Result<T, MediTrackError> {
        let mut histories = self.histories.lock()?;
        let driver = histories.entry(patient_id.to_string()).or_insert_with(|| {
            MedicalHistoryDriver::new(
                self.db.clone(),
                patient_id,
                self.default_category_filter,
            )
        });
        let result = f(driver);
        // Failed histories are not kept; the next call loads afresh.
        if driver.state() == MedicalHistoryState::Failure {
            histories.remove(patient_id);
        }
        result
    }

    fn send_history_event(
        &self,
        patient_id: &str,
        event: MedicalHistoryEvent,
    ) -> Result<FfiHistory, MediTrackError> {
        let validated = matches!(
            event,
            MedicalHistoryEvent::AddPointRecord(_)
                | MedicalHistoryEvent::AddContinuousRecord(_)
                | MedicalHistoryEvent::UpdateRecord(_)
        );
        let mutation = validated || matches!(event, MedicalHistoryEvent::DeleteRecord(_));
        self.with_history(patient_id, |driver| {
            if mutation && driver.state() != MedicalHistoryState::Success {
                return Err(not_ready(driver.machine().context().error.as_deref()));
            }
            driver.send(MedicalHistoryEvent::ClearPersistError);
            driver.send(event);
            let context = driver.machine().context();
            // last_error only describes the latest add or update.
            if let Some(e) = context.last_error.as_ref().filter(|_| validated) {
                return Err(MediTrackError::InvalidInput(e.to_string()));
            }
            if let Some(message) = &context.persist_error {
                return Err(MediTrackError::DatabaseError(message.clone()));
            }
            FfiHistory::try_from(driver.machine())
        })
    }
}

#[uniffi::export]
impl MediTrackCore {
    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// Current patient list view.
    pub fn patient_list(&self) -> Result<FfiPatientList, MediTrackError> {
        let driver = self.patient_list.lock()?;
        FfiPatientList::try_from(driver.machine())
    }

    /// Filter the list by name, email, phone or id prefix.
    pub fn search_patients(&self, query: String) -> Result<FfiPatientList, MediTrackError> {
        self.send_patient_event(PatientListEvent::Search(query))
    }

    /// Reload after a load or search failure.
    pub fn retry_patients(&self) -> Result<FfiPatientList, MediTrackError> {
        self.send_patient_event(PatientListEvent::Retry)
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, id: String) -> Result<Option<FfiPatient>, MediTrackError> {
        let patient = PatientService::new(&self.db).get(&id)?;
        patient.map(FfiPatient::try_from).transpose()
    }

    /// Create a new patient.
    pub fn create_patient(&self, data: FfiPatientData) -> Result<FfiPatient, MediTrackError> {
        let patient = models::create_patient(data.try_into()?)?;
        self.send_patient_event(PatientListEvent::AddPatient(patient.clone()))?;
        patient.try_into()
    }

    /// Replace the editable fields of a patient.
    pub fn update_patient(
        &self,
        id: String,
        data: FfiPatientData,
    ) -> Result<FfiPatient, MediTrackError> {
        let current = PatientService::new(&self.db).require(&id)?;
        let updated = current.with_updates(data.try_into()?)?;
        self.send_patient_event(PatientListEvent::UpdatePatient(updated.clone()))?;
        updated.try_into()
    }

    /// Delete a patient and their medical history.
    pub fn delete_patient(&self, id: String) -> Result<(), MediTrackError> {
        self.send_patient_event(PatientListEvent::DeletePatient(id.clone()))?;
        self.histories.lock()?.remove(&id);
        Ok(())
    }

    // =========================================================================
    // Medical History Operations
    // =========================================================================

    /// History view of a patient, loading it on first access.
    pub fn medical_history(&self, patient_id: String) -> Result<FfiHistory, MediTrackError> {
        self.with_history(&patient_id, |driver| FfiHistory::try_from(driver.machine()))
    }

    /// Drop the history controller of a patient whose view was closed.
    pub fn close_history(&self, patient_id: String) -> Result<(), MediTrackError> {
        self.histories.lock()?.remove(&patient_id);
        Ok(())
    }

    /// Reload a history that failed to load.
    pub fn retry_history(&self, patient_id: String) -> Result<FfiHistory, MediTrackError> {
        self.send_history_event(&patient_id, MedicalHistoryEvent::Retry)
    }

    /// Show only one category (`"all"` clears the filter).
    pub fn filter_history(
        &self,
        patient_id: String,
        filter: String,
    ) -> Result<FfiHistory, MediTrackError> {
        let filter = CategoryFilter::parse(&filter).ok_or_else(|| invalid("category", &filter))?;
        self.send_history_event(&patient_id, MedicalHistoryEvent::FilterByCategory(filter))
    }

    pub fn select_record(
        &self,
        patient_id: String,
        record_id: Option<String>,
    ) -> Result<FfiHistory, MediTrackError> {
        self.send_history_event(&patient_id, MedicalHistoryEvent::SelectRecord(record_id))
    }

    /// Add a record. Point or continuous handling follows the category.
    pub fn add_record(
        &self,
        patient_id: String,
        input: FfiRecordInput,
    ) -> Result<FfiHistory, MediTrackError> {
        let event = input.into_event(&patient_id)?;
        self.send_history_event(&patient_id, event)
    }

    /// Replace a record with its full JSON form.
    pub fn update_record(
        &self,
        patient_id: String,
        record_json: String,
    ) -> Result<FfiHistory, MediTrackError> {
        let mut value: serde_json::Value = serde_json::from_str(&record_json)?;
        // Continuous records are dated by their start.
        if let Some(start) = value.get("startDate").filter(|s| s.is_string()).cloned() {
            value["date"] = start;
        }
        let record = MedicalHistoryRecord::from_value(value)?;
        self.send_history_event(&patient_id, MedicalHistoryEvent::UpdateRecord(record))
    }

    pub fn delete_record(
        &self,
        patient_id: String,
        record_id: String,
    ) -> Result<FfiHistory, MediTrackError> {
        self.send_history_event(&patient_id, MedicalHistoryEvent::DeleteRecord(record_id))
    }

    // =========================================================================
    // Backup Operations
    // =========================================================================

    /// Export both tables as a versioned JSON envelope.
    pub fn export_backup_json(&self) -> Result<String, MediTrackError> {
        Ok(export::export_backup_json(&self.db)?)
    }

    /// Import a backup, then reload every open view.
    pub fn import_backup_json(&self, json: String) -> Result<FfiImportSummary, MediTrackError> {
        let summary = export::import_backup(&self.db, &json)?;
        *self.patient_list.lock()? = PatientListDriver::new(self.db.clone());
        self.histories.lock()?.clear();
        Ok(FfiImportSummary {
            patients: summary.patients as u64,
            records: summary.records as u64,
        })
    }

    // =========================================================================
    // Category Registry
    // =========================================================================

    pub fn categories(&self) -> Vec<FfiCategory> {
        CategoryRegistry::global()
            .all()
            .map(|config| FfiCategory {
                category: config.category.as_str().to_string(),
                name: config.name.to_string(),
                translation_key: config.translation_key.to_string(),
                record_type: config.temporal_kind.as_str().to_string(),
                supports_treatment_field: config.supports_treatment_field,
                supports_notes_field: config.supports_notes_field,
            })
            .collect()
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// Editable patient fields. `diagnosis_json` is the tagged diagnosis object.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientData {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: String,
    pub diagnosis_json: String,
    pub notes: Option<String>,
}

impl TryFrom<FfiPatientData> for PatientData {
    type Error = MediTrackError;

    fn try_from(data: FfiPatientData) -> Result<Self, Self::Error> {
        let date_of_birth = dates::parse_date(&data.date_of_birth)
            .ok_or_else(|| invalid("dateOfBirth", &data.date_of_birth))?;
        let diagnosis: Diagnosis = serde_json::from_str(&data.diagnosis_json)
            .map_err(|e| MediTrackError::InvalidInput(format!("diagnosis: {}", e)))?;
        Ok(PatientData {
            name: data.name,
            email: data.email,
            phone: data.phone,
            date_of_birth,
            diagnosis,
            notes: data.notes,
        })
    }
}

/// FFI-safe patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: String,
    pub diagnosis_json: String,
    /// Explicit stage, or the one derived from TNM
    pub stage: String,
    /// Explicit subtype, or the one derived from receptors
    pub subtype: String,
    pub notes: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl TryFrom<Patient> for FfiPatient {
    type Error = MediTrackError;

    fn try_from(patient: Patient) -> Result<Self, Self::Error> {
        let Diagnosis::BreastCancer(details) = &patient.diagnosis;
        Ok(Self {
            diagnosis_json: serde_json::to_string(&patient.diagnosis)?,
            stage: details.effective_stage().as_str().to_string(),
            subtype: details.effective_subtype().as_str().to_string(),
            date_of_birth: patient.date_of_birth.format("%Y-%m-%d").to_string(),
            created_at: patient.created_at.as_ref().map(dates::format_timestamp),
            updated_at: patient.updated_at.as_ref().map(dates::format_timestamp),
            id: patient.id,
            name: patient.name,
            email: patient.email,
            phone: patient.phone,
            notes: patient.notes,
        })
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientList {
    /// `loading`, `searching`, `success` or `failure`
    pub state: String,
    pub patients: Vec<FfiPatient>,
    pub search_query: String,
    pub error: Option<String>,
    pub persist_error: Option<String>,
}

impl TryFrom<&PatientListMachine> for FfiPatientList {
    type Error = MediTrackError;

    fn try_from(machine: &PatientListMachine) -> Result<Self, Self::Error> {
        let context = machine.context();
        let state = match machine.state() {
            PatientListState::Loading => "loading",
            PatientListState::Searching => "searching",
            PatientListState::Success => "success",
            PatientListState::Failure => "failure",
        };
        Ok(Self {
            state: state.to_string(),
            patients: context
                .patients
                .iter()
                .cloned()
                .map(FfiPatient::try_from)
                .collect::<Result<_, _>>()?,
            search_query: context.search_query.clone(),
            error: context.error.clone(),
            persist_error: context.persist_error.clone(),
        })
    }
}

/// Record to add. Dates accept RFC 3339 or `YYYY-MM-DD`.
///
/// Point categories use `date`; continuous ones use `start_date` (falling
/// back to `date`) and the optional `end_date`.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRecordInput {
    pub category: String,
    pub date: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub treatment: Option<String>,
    pub notes: Option<String>,
    /// Category fields without the `category` key
    pub details_json: Option<String>,
}

impl FfiRecordInput {
    fn into_event(self, patient_id: &str) -> Result<MedicalHistoryEvent, MediTrackError> {
        let category =
            Category::parse(&self.category).ok_or_else(|| invalid("category", &self.category))?;
        let payload = match &self.details_json {
            Some(raw) => serde_json::from_str(raw)?,
            None => serde_json::Value::Null,
        };
        let details = RecordDetails::from_payload(category, payload)?;
        let date = parse_optional_timestamp("date", self.date.as_deref())?;

        Ok(match category.temporal_kind() {
            TemporalKind::Point => {
                let date = date.ok_or_else(|| {
                    MediTrackError::InvalidInput("date: required for point records".to_string())
                })?;
                let mut input =
                    models::PointRecordInput::new(patient_id, category, date).with_details(details);
                input.treatment = self.treatment;
                input.notes = self.notes;
                MedicalHistoryEvent::AddPointRecord(input)
            }
            TemporalKind::Continuous => MedicalHistoryEvent::AddContinuousRecord(
                models::ContinuousRecordInput {
                    patient_id: patient_id.to_string(),
                    date,
                    start_date: parse_optional_timestamp("startDate", self.start_date.as_deref())?,
                    end_date: parse_optional_timestamp("endDate", self.end_date.as_deref())?,
                    treatment: self.treatment,
                    notes: self.notes,
                    details,
                },
            ),
        })
    }
}

fn parse_optional_timestamp(
    field: &str,
    raw: Option<&str>,
) -> Result<Option<chrono::DateTime<chrono::Utc>>, MediTrackError> {
    raw.filter(|r| !r.trim().is_empty())
        .map(|r| dates::parse_timestamp(r).ok_or_else(|| invalid(field, r)))
        .transpose()
}

/// FFI-safe medical history record.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRecord {
    pub id: String,
    pub patient_id: String,
    pub category: String,
    /// `point` or `continuous`
    pub record_type: String,
    pub date: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub treatment: Option<String>,
    pub notes: Option<String>,
    /// Category fields, tagged with `category`
    pub details_json: String,
    pub ongoing: bool,
    /// Days covered so far, for continuous records
    pub duration_days: Option<i64>,
    /// Full stored form, as accepted by `update_record`
    pub record_json: String,
}

impl TryFrom<&MedicalHistoryRecord> for FfiRecord {
    type Error = MediTrackError;

    fn try_from(record: &MedicalHistoryRecord) -> Result<Self, Self::Error> {
        let continuous = record.kind == TemporalKind::Continuous;
        Ok(Self {
            id: record.id.clone(),
            patient_id: record.patient_id.clone(),
            category: record.category().as_str().to_string(),
            record_type: record.kind.as_str().to_string(),
            date: dates::format_timestamp(&record.date),
            start_date: record.start_date.as_ref().map(dates::format_timestamp),
            end_date: record.end_date.as_ref().map(dates::format_timestamp),
            treatment: record.treatment.clone(),
            notes: record.notes.clone(),
            details_json: serde_json::to_string(&record.details)?,
            ongoing: record.is_ongoing(),
            duration_days: continuous.then(|| record.duration_days()),
            record_json: serde_json::to_string(record)?,
        })
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiHistory {
    pub patient_id: String,
    /// `loading`, `success` or `failure`
    pub state: String,
    /// Records passing the category filter, ascending by date
    pub records: Vec<FfiRecord>,
    pub selected_record: Option<FfiRecord>,
    /// `all` or a category wire name
    pub category_filter: String,
    pub error: Option<String>,
    pub persist_error: Option<String>,
}

impl TryFrom<&MedicalHistoryMachine> for FfiHistory {
    type Error = MediTrackError;

    fn try_from(machine: &MedicalHistoryMachine) -> Result<Self, Self::Error> {
        let context = machine.context();
        let state = match machine.state() {
            MedicalHistoryState::Loading => "loading",
            MedicalHistoryState::Success => "success",
            MedicalHistoryState::Failure => "failure",
        };
        let category_filter = match context.category_filter {
            CategoryFilter::All => "all",
            CategoryFilter::Only(category) => category.as_str(),
        };
        Ok(Self {
            patient_id: context.patient_id.clone(),
            state: state.to_string(),
            records: machine
                .filtered_records()
                .into_iter()
                .map(FfiRecord::try_from)
                .collect::<Result<_, _>>()?,
            selected_record: context
                .selected_record
                .as_ref()
                .map(FfiRecord::try_from)
                .transpose()?,
            category_filter: category_filter.to_string(),
            error: context.error.clone(),
            persist_error: context.persist_error.clone(),
        })
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCategory {
    pub category: String,
    pub name: String,
    pub translation_key: String,
    pub record_type: String,
    pub supports_treatment_field: bool,
    pub supports_notes_field: bool,
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiImportSummary {
    pub patients: u64,
    pub records: u64,
}
