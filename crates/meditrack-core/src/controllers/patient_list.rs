//! Patient list controller.

use anyhow::Context;
use tracing::{debug, warn};

use super::{drive, error_message, StateMachine};
use crate::db::RecordStore;
use crate::models::Patient;
use crate::services::PatientService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatientListState {
    Loading,
    Searching,
    Success,
    Failure,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientListContext {
    pub patients: Vec<Patient>,
    pub search_query: String,
    /// Load or search failure shown by the failure state
    pub error: Option<String>,
    /// Most recent background write failure
    pub persist_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PatientListEvent {
    Search(String),
    AddPatient(Patient),
    UpdatePatient(Patient),
    DeletePatient(String),
    Retry,
    ClearPersistError,
    Loaded(Vec<Patient>),
    LoadFailed(String),
    SearchCompleted(Vec<Patient>),
    SearchFailed(String),
    PersistFailed(String),
}

impl PatientListEvent {
    fn name(&self) -> &'static str {
        match self {
            PatientListEvent::Search(_) => "search",
            PatientListEvent::AddPatient(_) => "add_patient",
            PatientListEvent::UpdatePatient(_) => "update_patient",
            PatientListEvent::DeletePatient(_) => "delete_patient",
            PatientListEvent::Retry => "retry",
            PatientListEvent::ClearPersistError => "clear_persist_error",
            PatientListEvent::Loaded(_) => "loaded",
            PatientListEvent::LoadFailed(_) => "load_failed",
            PatientListEvent::SearchCompleted(_) => "search_completed",
            PatientListEvent::SearchFailed(_) => "search_failed",
            PatientListEvent::PersistFailed(_) => "persist_failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PatientListEffect {
    LoadAll,
    Search(String),
    Add(Patient),
    Update(Patient),
    /// Delete the patient and their history
    Delete(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatientListMachine {
    state: PatientListState,
    context: PatientListContext,
}

impl Default for PatientListMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl PatientListMachine {
    /// A machine in `Loading`; run [`initial_effects`](Self::initial_effects)
    /// to start the load.
    pub fn new() -> Self {
        Self {
            state: PatientListState::Loading,
            context: PatientListContext::default(),
        }
    }

    pub fn initial_effects(&self) -> Vec<PatientListEffect> {
        vec![PatientListEffect::LoadAll]
    }

    pub fn state(&self) -> PatientListState {
        self.state
    }

    pub fn context(&self) -> &PatientListContext {
        &self.context
    }

    pub fn patients(&self) -> &[Patient] {
        &self.context.patients
    }

    fn reload(&mut self) -> Vec<PatientListEffect> {
        self.state = PatientListState::Loading;
        self.context.search_query.clear();
        vec![PatientListEffect::LoadAll]
    }
}

impl StateMachine for PatientListMachine {
    type Event = PatientListEvent;
    type Effect = PatientListEffect;

    fn handle(&mut self, event: PatientListEvent) -> Vec<PatientListEffect> {
        use PatientListEvent as E;
        use PatientListState as S;

        match (self.state, event) {
            (S::Loading, E::Loaded(patients)) => {
                self.context.patients = patients;
                self.context.error = None;
                self.state = S::Success;
                vec![]
            }
            (S::Loading, E::LoadFailed(message)) => {
                self.context.error = Some(message);
                self.state = S::Failure;
                vec![]
            }

            (S::Searching, E::SearchCompleted(patients)) => {
                self.context.patients = patients;
                self.context.error = None;
                self.state = S::Success;
                vec![]
            }
            (S::Searching, E::SearchFailed(message)) => {
                self.context.error = Some(message);
                self.state = S::Failure;
                vec![]
            }

            (S::Success, E::Search(query)) => {
                self.context.search_query = query.clone();
                self.state = S::Searching;
                vec![PatientListEffect::Search(query)]
            }
            (S::Success, E::AddPatient(patient)) => {
                self.context.patients.push(patient.clone());
                vec![PatientListEffect::Add(patient)]
            }
            (S::Success, E::UpdatePatient(patient)) => {
                match self.context.patients.iter_mut().find(|p| p.id == patient.id) {
                    Some(slot) => {
                        *slot = patient.clone();
                        vec![PatientListEffect::Update(patient)]
                    }
                    None => {
                        debug!(patient_id = %patient.id, "Update for patient not in list");
                        vec![]
                    }
                }
            }
            (S::Success, E::DeletePatient(id)) => {
                let before = self.context.patients.len();
                self.context.patients.retain(|p| p.id != id);
                if self.context.patients.len() == before {
                    vec![]
                } else {
                    vec![PatientListEffect::Delete(id)]
                }
            }
            (S::Success, E::PersistFailed(message)) => {
                warn!(error = %message, "Patient write failed, reloading");
                self.context.persist_error = Some(message);
                self.reload()
            }

            (S::Failure, E::Retry) => {
                self.context.error = None;
                self.reload()
            }

            (_, E::PersistFailed(message)) => {
                warn!(error = %message, "Patient write failed");
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

/// Runs a [`PatientListMachine`] against storage.
pub struct PatientListDriver<S> {
    machine: PatientListMachine,
    patients: PatientService<S>,
}

impl<S: RecordStore> PatientListDriver<S> {
    /// Create the driver and perform the initial load.
    pub fn new(store: S) -> Self {
        let mut driver = Self {
            machine: PatientListMachine::new(),
            patients: PatientService::new(store),
        };
        for effect in driver.machine.initial_effects() {
            if let Some(event) = driver.execute(effect) {
                driver.send(event);
            }
        }
        driver
    }

    pub fn machine(&self) -> &PatientListMachine {
        &self.machine
    }

    pub fn state(&self) -> PatientListState {
        self.machine.state()
    }

    pub fn patients(&self) -> &[Patient] {
        self.machine.patients()
    }

    /// Dispatch an event and run every effect it causes.
    pub fn send(&mut self, event: PatientListEvent) {
        let Self { machine, patients } = self;
        drive(machine, event, |effect| run_effect(patients, effect));
    }

    fn execute(&self, effect: PatientListEffect) -> Option<PatientListEvent> {
        run_effect(&self.patients, effect)
    }
}

fn run_effect<S: RecordStore>(
    patients: &PatientService<S>,
    effect: PatientListEffect,
) -> Option<PatientListEvent> {
    match effect {
        PatientListEffect::LoadAll => Some(
            match patients.list(None).context("Failed to load patients") {
                Ok(list) => PatientListEvent::Loaded(list),
                Err(e) => PatientListEvent::LoadFailed(error_message(&e)),
            },
        ),
        PatientListEffect::Search(query) => Some(
            match patients
                .list(Some(&query))
                .with_context(|| format!("Failed to search patients for '{}'", query))
            {
                Ok(list) => PatientListEvent::SearchCompleted(list),
                Err(e) => PatientListEvent::SearchFailed(error_message(&e)),
            },
        ),
        PatientListEffect::Add(patient) => patients
            .add(&patient)
            .with_context(|| format!("Failed to save patient {}", patient.id))
            .err()
            .map(|e| PatientListEvent::PersistFailed(error_message(&e))),
        PatientListEffect::Update(patient) => patients
            .update(&patient)
            .with_context(|| format!("Failed to update patient {}", patient.id))
            .err()
            .map(|e| PatientListEvent::PersistFailed(error_message(&e))),
        PatientListEffect::Delete(id) => patients
            .delete_with_history(&id)
            .with_context(|| format!("Failed to delete patient {}", id))
            .err()
            .map(|e| PatientListEvent::PersistFailed(error_message(&e))),
    }
}
