//! End-to-end patient and treatment timeline tests.

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use meditrack_core::controllers::{
    MedicalHistoryDriver, MedicalHistoryEvent, MedicalHistoryState, PatientListDriver,
    PatientListEvent, PatientListState,
};
use meditrack_core::db::{Database, RecordStore, Table};
use meditrack_core::models::{
    create_continuous_record, create_patient, BreastCancerDetails, Category, CategoryFilter,
    ChemotherapyFields, ContinuousRecordInput, Diagnosis, Her2Status, MetastaticStatus,
    PatientData, PointRecordInput, ReceptorStatus, RecordDetails, TumorGrade,
    TumorLocalization, TumorM, TumorN, TumorStage, TumorT, TumorType,
};
use meditrack_core::services::{MedicalHistoryService, PatientService};
use std::sync::{Arc, Mutex};

fn diagnosis() -> Diagnosis {
    Diagnosis::BreastCancer(BreastCancerDetails {
        localization: TumorLocalization::Right,
        tnm_t: TumorT::T2,
        tnm_n: TumorN::N1,
        tnm_m: TumorM::M0,
        stage: None,
        metastatic_status: MetastaticStatus::Early,
        tumor_type: TumorType::Lobular,
        tumor_type_other: None,
        er: ReceptorStatus::Positive,
        pr: ReceptorStatus::Low,
        her2: Her2Status::Ihc2FishNegative,
        ki67: Some(30.0),
        grade: TumorGrade::G2,
        subtype: None,
    })
}

fn jane_doe() -> PatientData {
    PatientData {
        name: "Jane Doe".to_string(),
        email: "jane@x.com".to_string(),
        phone: "5551234567".to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(1975, 6, 15).unwrap(),
        diagnosis: diagnosis(),
        notes: None,
    }
}

fn shared_store() -> Arc<Mutex<Database>> {
    Arc::new(Mutex::new(Database::open_in_memory().unwrap()))
}

#[test]
fn test_jane_doe_chemotherapy_timeline() {
    let db = Database::open_in_memory().unwrap();
    let patients = PatientService::new(&db);
    let history = MedicalHistoryService::new(&db);

    let jane = patients.create(jane_doe()).unwrap();
    assert!(jane.id.starts_with("PAT-"));

    let Diagnosis::BreastCancer(details) = &jane.diagnosis;
    assert_eq!(details.effective_stage(), TumorStage::II);

    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let chemo = create_continuous_record(
        ContinuousRecordInput::new(jane.id.as_str(), Category::Chemotherapy, start).with_details(
            RecordDetails::Chemotherapy(ChemotherapyFields {
                regimen: Some("AC-T".to_string()),
                cycles: Some(4),
                ..Default::default()
            }),
        ),
    )
    .unwrap();
    history.add(&chemo).unwrap();

    let stored = history.list(&jane.id).unwrap();
    assert_eq!(stored.len(), 1);
    let record = &stored[0];
    assert!(record.id.starts_with("REC-"));
    assert!(record.is_ongoing());

    let now = Utc::now();
    let expected = (now - start).num_days();
    assert_eq!(record.duration_days_at(now), expected);
    assert_eq!(
        record.duration_days_at(start + Duration::days(10)),
        10
    );
}

#[test]
fn test_search_matches_any_indexed_field() {
    let db = Database::open_in_memory().unwrap();
    let patients = PatientService::new(&db);
    let jane = patients.create(jane_doe()).unwrap();
    patients
        .create(PatientData {
            name: "Maria Lopez".to_string(),
            email: "maria@clinic.org".to_string(),
            phone: "600111222".to_string(),
            ..jane_doe()
        })
        .unwrap();

    assert_eq!(patients.list(Some("jane")).unwrap().len(), 1);
    assert_eq!(patients.list(Some("MARIA@")).unwrap().len(), 1);
    assert_eq!(patients.list(Some("555")).unwrap().len(), 1);
    assert_eq!(patients.list(Some(&jane.id[..9])).unwrap()[0].id, jane.id);
    assert_eq!(patients.list(Some("  ")).unwrap().len(), 2);
    assert!(patients.list(Some("zzz")).unwrap().is_empty());
}

#[test]
fn test_controllers_against_shared_store() {
    let store = shared_store();
    let mut list = PatientListDriver::new(store.clone());
    assert_eq!(list.state(), PatientListState::Success);
    assert!(list.patients().is_empty());

    let jane = create_patient(jane_doe()).unwrap();
    list.send(PatientListEvent::AddPatient(jane.clone()));
    assert_eq!(store.get_all(Table::Patients).unwrap().len(), 1);

    let mut history = MedicalHistoryDriver::new(store.clone(), jane.id.as_str(), CategoryFilter::All);
    assert_eq!(history.state(), MedicalHistoryState::Success);

    history.send(MedicalHistoryEvent::AddContinuousRecord(ContinuousRecordInput::new(
        jane.id.as_str(),
        Category::Chemotherapy,
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    )));
    history.send(MedicalHistoryEvent::AddPointRecord(PointRecordInput::new(
        jane.id.as_str(),
        Category::Imaging,
        Utc.with_ymd_and_hms(2023, 12, 1, 0, 0, 0).unwrap(),
    )));

    let categories: Vec<_> = history
        .machine()
        .records()
        .iter()
        .map(|r| r.category())
        .collect();
    assert_eq!(categories, vec![Category::Imaging, Category::Chemotherapy]);

    history.send(MedicalHistoryEvent::FilterByCategory(CategoryFilter::Only(
        Category::Chemotherapy,
    )));
    assert_eq!(history.machine().filtered_records().len(), 1);

    // Deleting the patient removes their history too.
    list.send(PatientListEvent::DeletePatient(jane.id.clone()));
    assert!(list.patients().is_empty());
    assert!(store.get_all(Table::MedicalHistory).unwrap().is_empty());
}

#[test]
fn test_reopened_database_keeps_timeline() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("meditrack.db");

    let jane_id = {
        let db = Database::open(&path).unwrap();
        let jane = PatientService::new(&db).create(jane_doe()).unwrap();
        let record = create_continuous_record(
            ContinuousRecordInput::new(
                jane.id.as_str(),
                Category::Hospitalization,
                Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
            )
            .with_end_date(Some(Utc.with_ymd_and_hms(2024, 2, 4, 0, 0, 0).unwrap())),
        )
        .unwrap();
        MedicalHistoryService::new(&db).add(&record).unwrap();
        jane.id
    };

    let db = Database::open(&path).unwrap();
    let records = MedicalHistoryService::new(&db).list(&jane_id).unwrap();
    assert_eq!(records.len(), 1);
    assert!(!records[0].is_ongoing());
    assert_eq!(records[0].duration_days(), 3);
}
