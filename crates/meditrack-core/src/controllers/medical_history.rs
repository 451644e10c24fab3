//! Per-patient medical-history controller.

use anyhow::Context;
use tracing::{debug, warn};

use super::{drive, error_message, StateMachine};
use crate::db::RecordStore;
use crate::models::{
    create_continuous_record, create_point_record, sort_chronologically, CategoryFilter,
    ContinuousRecordInput, MedicalHistoryRecord, PointRecordInput, ValidationError,
};
use crate::services::MedicalHistoryService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MedicalHistoryState {
    Loading,
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MedicalHistoryContext {
    pub patient_id: String,
    /// Every record of the patient, ascending by date
    pub records: Vec<MedicalHistoryRecord>,
    pub selected_record: Option<MedicalHistoryRecord>,
    pub category_filter: CategoryFilter,
    /// Load failure shown by the failure state
    pub error: Option<String>,
    /// Most recent background write failure
    pub persist_error: Option<String>,
    /// Rejection of the most recent add or update
    pub last_error: Option<ValidationError>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MedicalHistoryEvent {
    FilterByCategory(CategoryFilter),
    /// Select a record by id, or clear the selection
    SelectRecord(Option<String>),
    AddPointRecord(PointRecordInput),
    AddContinuousRecord(ContinuousRecordInput),
    UpdateRecord(MedicalHistoryRecord),
    DeleteRecord(String),
    Retry,
    ClearPersistError,
    Loaded(Vec<MedicalHistoryRecord>),
    LoadFailed(String),
    PersistFailed(String),
}

impl MedicalHistoryEvent {
    fn name(&self) -> &'static str {
        match self {
            MedicalHistoryEvent::FilterByCategory(_) => "filter_by_category",
            MedicalHistoryEvent::SelectRecord(_) => "select_record",
            MedicalHistoryEvent::AddPointRecord(_) => "add_point_record",
            MedicalHistoryEvent::AddContinuousRecord(_) => "add_continuous_record",
            MedicalHistoryEvent::UpdateRecord(_) => "update_record",
            MedicalHistoryEvent::DeleteRecord(_) => "delete_record",
            MedicalHistoryEvent::Retry => "retry",
            MedicalHistoryEvent::ClearPersistError => "clear_persist_error",
            MedicalHistoryEvent::Loaded(_) => "loaded",
            MedicalHistoryEvent::LoadFailed(_) => "load_failed",
            MedicalHistoryEvent::PersistFailed(_) => "persist_failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MedicalHistoryEffect {
    Load(String),
    Add(MedicalHistoryRecord),
    Update(MedicalHistoryRecord),
    Delete(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MedicalHistoryMachine {
    state: MedicalHistoryState,
    context: MedicalHistoryContext,
}

impl MedicalHistoryMachine {
    /// A machine in `Loading` for `patient_id`.
    pub fn new(patient_id: impl Into<String>, category_filter: CategoryFilter) -> Self {
        Self {
            state: MedicalHistoryState::Loading,
            context: MedicalHistoryContext {
                patient_id: patient_id.into(),
                records: Vec::new(),
                selected_record: None,
                category_filter,
                error: None,
                persist_error: None,
                last_error: None,
            },
        }
    }

    pub fn initial_effects(&self) -> Vec<MedicalHistoryEffect> {
        vec![MedicalHistoryEffect::Load(self.context.patient_id.clone())]
    }

    pub fn state(&self) -> MedicalHistoryState {
        self.state
    }

    pub fn context(&self) -> &MedicalHistoryContext {
        &self.context
    }

    pub fn records(&self) -> &[MedicalHistoryRecord] {
        &self.context.records
    }

    /// Records passing the current category filter, in date order.
    pub fn filtered_records(&self) -> Vec<&MedicalHistoryRecord> {
        self.context
            .records
            .iter()
            .filter(|r| self.context.category_filter.matches(r.category()))
            .collect()
    }

    fn reload(&mut self) -> Vec<MedicalHistoryEffect> {
        self.state = MedicalHistoryState::Loading;
        self.initial_effects()
    }

    fn check_owner(&self, patient_id: &str) -> Result<(), ValidationError> {
        if patient_id == self.context.patient_id {
            Ok(())
        } else {
            Err(ValidationError::single(
                "patientId",
                format!("record belongs to {}, not {}", patient_id, self.context.patient_id),
            ))
        }
    }

    fn insert(
        &mut self,
        created: Result<MedicalHistoryRecord, ValidationError>,
    ) -> Vec<MedicalHistoryEffect> {
        match created {
            Ok(record) => {
                self.context.last_error = None;
                self.context.records.push(record.clone());
                sort_chronologically(&mut self.context.records);
                vec![MedicalHistoryEffect::Add(record)]
            }
            Err(e) => {
                debug!(patient_id = %self.context.patient_id, error = %e, "Record rejected");
                self.context.last_error = Some(e);
                vec![]
            }
        }
    }

    fn replace(&mut self, mut record: MedicalHistoryRecord) -> Vec<MedicalHistoryEffect> {
        record.sync_date_to_start();
        if let Err(e) = self
            .check_owner(&record.patient_id)
            .and_then(|_| record.validate())
        {
            self.context.last_error = Some(e);
            return vec![];
        }

        let Some(slot) = self.context.records.iter_mut().find(|r| r.id == record.id) else {
            debug!(record_id = %record.id, "Update for record not in list");
            return vec![];
        };

        record.touch();
        *slot = record.clone();
        sort_chronologically(&mut self.context.records);
        if let Some(selected) = &mut self.context.selected_record {
            if selected.id == record.id {
                *selected = record.clone();
            }
        }
        self.context.last_error = None;
        vec![MedicalHistoryEffect::Update(record)]
    }

    fn remove(&mut self, id: String) -> Vec<MedicalHistoryEffect> {
        let before = self.context.records.len();
        self.context.records.retain(|r| r.id != id);
        if self.context.records.len() == before {
            return vec![];
        }

        if self
            .context
            .selected_record
            .as_ref()
            .is_some_and(|r| r.id == id)
        {
            self.context.selected_record = None;
        }
        vec![MedicalHistoryEffect::Delete(id)]
    }
}

impl StateMachine for MedicalHistoryMachine {
    type Event = MedicalHistoryEvent;
    type Effect = MedicalHistoryEffect;

    fn handle(&mut self, event: MedicalHistoryEvent) -> Vec<MedicalHistoryEffect> {
        use MedicalHistoryEvent as E;
        use MedicalHistoryState as S;

        match (self.state, event) {
            (S::Loading, E::Loaded(mut records)) => {
                sort_chronologically(&mut records);
                let selected_id = self.context.selected_record.take().map(|r| r.id);
                self.context.selected_record = selected_id
                    .and_then(|id| records.iter().find(|r| r.id == id).cloned());
                self.context.records = records;
                self.context.error = None;
                self.state = S::Success;
                vec![]
            }
            (S::Loading, E::LoadFailed(message)) => {
                self.context.error = Some(message);
                self.state = S::Failure;
                vec![]
            }

            (S::Success, E::FilterByCategory(filter)) => {
                self.context.category_filter = filter;
                vec![]
            }
            (S::Success, E::SelectRecord(None)) => {
                self.context.selected_record = None;
                vec![]
            }
            (S::Success, E::SelectRecord(Some(id))) => {
                match self.context.records.iter().find(|r| r.id == id) {
                    Some(record) => self.context.selected_record = Some(record.clone()),
                    None => debug!(record_id = %id, "Selected record not in list"),
                }
                vec![]
            }
            (S::Success, E::AddPointRecord(input)) => {
                let created = self
                    .check_owner(&input.patient_id)
                    .and_then(|_| create_point_record(input));
                self.insert(created)
            }
            (S::Success, E::AddContinuousRecord(input)) => {
                let created = self
                    .check_owner(&input.patient_id)
                    .and_then(|_| create_continuous_record(input));
                self.insert(created)
            }
            (S::Success, E::UpdateRecord(record)) => self.replace(record),
            (S::Success, E::DeleteRecord(id)) => self.remove(id),
            (S::Success, E::PersistFailed(message)) => {
                warn!(
                    patient_id = %self.context.patient_id,
                    error = %message,
                    "Record write failed, reloading"
                );
                self.context.persist_error = Some(message);
                self.reload()
            }

            (S::Failure, E::Retry) => {
                self.context.error = None;
                self.reload()
            }

            (_, E::PersistFailed(message)) => {
                warn!(patient_id = %self.context.patient_id, error = %message, "Record write failed");
                self.context.persist_error = Some(message);
                vec![]
            }
            (_, E::ClearPersistError) => {
                self.context.persist_error = None;
                vec![]
            }

            (state, event) => {
                debug!(?state, event = event.name(), "Ignoring event");
                vec![]
            }
        }
    }
}

/// Runs a [`MedicalHistoryMachine`] against storage.
pub struct MedicalHistoryDriver<S> {
    machine: MedicalHistoryMachine,
    service: MedicalHistoryService<S>,
}

impl<S: RecordStore> MedicalHistoryDriver<S> {
    /// Create the driver and perform the initial load.
    pub fn new(store: S, patient_id: impl Into<String>, category_filter: CategoryFilter) -> Self {
        let mut driver = Self {
            machine: MedicalHistoryMachine::new(patient_id, category_filter),
            service: MedicalHistoryService::new(store),
        };
        for effect in driver.machine.initial_effects() {
            if let Some(event) = run_effect(&driver.service, effect) {
                driver.send(event);
            }
        }
        driver
    }

    pub fn machine(&self) -> &MedicalHistoryMachine {
        &self.machine
    }

    pub fn state(&self) -> MedicalHistoryState {
        self.machine.state()
    }

    /// Dispatch an event and run every effect it causes.
    pub fn send(&mut self, event: MedicalHistoryEvent) {
        let Self { machine, service } = self;
        drive(machine, event, |effect| run_effect(service, effect));
    }
}

fn run_effect<S: RecordStore>(
    service: &MedicalHistoryService<S>,
    effect: MedicalHistoryEffect,
) -> Option<MedicalHistoryEvent> {
    match effect {
        MedicalHistoryEffect::Load(patient_id) => Some(
            match service
                .list(&patient_id)
                .with_context(|| format!("Failed to load history of {}", patient_id))
            {
                Ok(records) => MedicalHistoryEvent::Loaded(records),
                Err(e) => MedicalHistoryEvent::LoadFailed(error_message(&e)),
            },
        ),
        MedicalHistoryEffect::Add(record) => service
            .add(&record)
            .with_context(|| format!("Failed to save record {}", record.id))
            .err()
            .map(|e| MedicalHistoryEvent::PersistFailed(error_message(&e))),
        MedicalHistoryEffect::Update(record) => service
            .update(&record)
            .with_context(|| format!("Failed to update record {}", record.id))
            .err()
            .map(|e| MedicalHistoryEvent::PersistFailed(error_message(&e))),
        MedicalHistoryEffect::Delete(id) => service
            .delete(&id)
            .with_context(|| format!("Failed to delete record {}", id))
            .err()
            .map(|e| MedicalHistoryEvent::PersistFailed(error_message(&e))),
    }
}
