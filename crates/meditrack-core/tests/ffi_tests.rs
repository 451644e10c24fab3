//! Tests for the FFI-facing `MediTrackCore` object.

use chrono::{TimeZone, Utc};
use meditrack_core::models::{create_patient, create_point_record, PointRecordInput};
use meditrack_core::{
    calculate_stage, calculate_subtype, open_database, open_database_in_memory, open_with_config,
    Category, CategoryFilter, FfiHistory, FfiPatientData, FfiPatientList, FfiRecordInput,
    MedicalHistoryEvent, MedicalHistoryMachine, MediTrackError, Patient, PatientListEvent,
    PatientListMachine, StateMachine,
};
use serde_json::json;

fn patient_data(name: &str) -> FfiPatientData {
    FfiPatientData {
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        phone: "5551234567".to_string(),
        date_of_birth: "1980-01-01".to_string(),
        diagnosis_json: json!({
            "diagnosis": "breast-cancer",
            "details": {
                "localization": "left", "tnmT": "T1c", "tnmN": "N0", "tnmM": "M0",
                "metastaticStatus": "early", "tumorType": "invasive-nst",
                "er": "+", "pr": "+", "her2": "0", "ki67": 12, "grade": "G2"
            }
        })
        .to_string(),
        notes: None,
    }
}

fn chemo_input(start: &str) -> FfiRecordInput {
    FfiRecordInput {
        category: "chemotherapy".to_string(),
        date: None,
        start_date: Some(start.to_string()),
        end_date: None,
        treatment: Some("AC-T".to_string()),
        notes: None,
        details_json: Some(json!({ "regimen": "AC-T", "cycles": 4 }).to_string()),
    }
}

#[test]
fn test_patient_lifecycle() {
    let core = open_database_in_memory().unwrap();
    assert_eq!(core.patient_list().unwrap().state, "success");

    let jane = core.create_patient(patient_data("Jane Doe")).unwrap();
    assert_eq!(jane.stage, "I");
    assert_eq!(jane.subtype, "luminal-a");
    assert_eq!(core.patient_list().unwrap().patients.len(), 1);

    let mut edited = patient_data("Jane Doe");
    edited.phone = "5559876543".to_string();
    let updated = core.update_patient(jane.id.clone(), edited).unwrap();
    assert_eq!(updated.phone, "5559876543");
    assert_eq!(updated.created_at, jane.created_at);

    let found = core.get_patient(jane.id.clone()).unwrap().unwrap();
    assert_eq!(found.phone, "5559876543");

    core.delete_patient(jane.id.clone()).unwrap();
    assert!(core.get_patient(jane.id).unwrap().is_none());
    assert!(core.patient_list().unwrap().patients.is_empty());
}

#[test]
fn test_invalid_patient_is_rejected() {
    let core = open_database_in_memory().unwrap();
    let mut data = patient_data("Jane Doe");
    data.email = "jane".to_string();

    let err = core.create_patient(data).unwrap_err();
    assert!(matches!(err, MediTrackError::InvalidInput(_)));
    assert!(core.patient_list().unwrap().patients.is_empty());
}

#[test]
fn test_search_patients() {
    let core = open_database_in_memory().unwrap();
    core.create_patient(patient_data("Jane Doe")).unwrap();
    core.create_patient(patient_data("Ada Byron")).unwrap();

    let view = core.search_patients("ada".to_string()).unwrap();
    assert_eq!(view.search_query, "ada");
    assert_eq!(view.patients.len(), 1);
    assert_eq!(view.patients[0].name, "Ada Byron");
}

#[test]
fn test_medical_history_flow() {
    let core = open_database_in_memory().unwrap();
    let jane = core.create_patient(patient_data("Jane Doe")).unwrap();

    let view = core
        .add_record(jane.id.clone(), chemo_input("2024-01-01"))
        .unwrap();
    assert_eq!(view.records.len(), 1);
    let chemo = &view.records[0];
    assert_eq!(chemo.record_type, "continuous");
    assert!(chemo.ongoing);
    assert!(chemo.duration_days.unwrap() > 0);
    assert_eq!(chemo.date, "2024-01-01T00:00:00.000Z");

    let imaging = FfiRecordInput {
        category: "imaging".to_string(),
        date: Some("2023-12-15".to_string()),
        start_date: None,
        end_date: None,
        treatment: None,
        notes: Some("Baseline".to_string()),
        details_json: None,
    };
    let view = core.add_record(jane.id.clone(), imaging).unwrap();
    let categories: Vec<_> = view.records.iter().map(|r| r.category.as_str()).collect();
    assert_eq!(categories, vec!["imaging", "chemotherapy"]);

    let view = core
        .filter_history(jane.id.clone(), "imaging".to_string())
        .unwrap();
    assert_eq!(view.category_filter, "imaging");
    assert_eq!(view.records.len(), 1);

    let chemo_id = core
        .filter_history(jane.id.clone(), "all".to_string())
        .unwrap()
        .records[1]
        .id
        .clone();
    let view = core
        .select_record(jane.id.clone(), Some(chemo_id.clone()))
        .unwrap();
    assert_eq!(view.selected_record.unwrap().id, chemo_id);

    let view = core.delete_record(jane.id.clone(), chemo_id).unwrap();
    assert_eq!(view.records.len(), 1);
    assert!(view.selected_record.is_none());
}

#[test]
fn test_update_record_ends_treatment() {
    let core = open_database_in_memory().unwrap();
    let jane = core.create_patient(patient_data("Jane Doe")).unwrap();
    let view = core
        .add_record(jane.id.clone(), chemo_input("2024-01-01"))
        .unwrap();

    let mut record: serde_json::Value = serde_json::from_str(&view.records[0].record_json).unwrap();
    record["endDate"] = json!("2024-03-01T00:00:00.000Z");
    let view = core
        .update_record(jane.id.clone(), record.to_string())
        .unwrap();
    assert!(!view.records[0].ongoing);
    assert_eq!(view.records[0].duration_days, Some(60));

    record["endDate"] = json!("2023-01-01T00:00:00.000Z");
    let err = core
        .update_record(jane.id.clone(), record.to_string())
        .unwrap_err();
    assert!(matches!(err, MediTrackError::InvalidInput(_)));
}

#[test]
fn test_update_record_moves_start_date() {
    let core = open_database_in_memory().unwrap();
    let jane = core.create_patient(patient_data("Jane Doe")).unwrap();
    core.add_record(jane.id.clone(), chemo_input("2024-01-01"))
        .unwrap();
    let lab = FfiRecordInput {
        category: "lab_test".to_string(),
        date: Some("2024-03-01".to_string()),
        start_date: None,
        end_date: None,
        treatment: None,
        notes: None,
        details_json: None,
    };
    let view = core.add_record(jane.id.clone(), lab).unwrap();
    assert_eq!(view.records[0].category, "chemotherapy");

    let mut record: serde_json::Value = serde_json::from_str(&view.records[0].record_json).unwrap();
    record["startDate"] = json!("2024-06-01T00:00:00.000Z");
    let view = core
        .update_record(jane.id.clone(), record.to_string())
        .unwrap();
    let categories: Vec<_> = view.records.iter().map(|r| r.category.as_str()).collect();
    assert_eq!(categories, vec!["lab_test", "chemotherapy"]);
    assert_eq!(view.records[1].date, "2024-06-01T00:00:00.000Z");

    let backup: serde_json::Value = serde_json::from_str(&core.export_backup_json().unwrap()).unwrap();
    let stored = backup["data"]["medicalHistory"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["category"] == "chemotherapy")
        .unwrap();
    assert_eq!(stored["date"], "2024-06-01T00:00:00.000Z");
}

#[test]
fn test_record_validation_errors() {
    let core = open_database_in_memory().unwrap();
    let jane = core.create_patient(patient_data("Jane Doe")).unwrap();

    let mut unknown = chemo_input("2024-01-01");
    unknown.category = "dentistry".to_string();
    assert!(matches!(
        core.add_record(jane.id.clone(), unknown).unwrap_err(),
        MediTrackError::InvalidInput(_)
    ));

    let mut backwards = chemo_input("2024-01-01");
    backwards.end_date = Some("2023-06-01".to_string());
    assert!(matches!(
        core.add_record(jane.id.clone(), backwards).unwrap_err(),
        MediTrackError::InvalidInput(_)
    ));

    let no_date = FfiRecordInput {
        category: "lab_test".to_string(),
        date: None,
        start_date: None,
        end_date: None,
        treatment: None,
        notes: None,
        details_json: None,
    };
    assert!(core.add_record(jane.id.clone(), no_date).is_err());
    assert!(core.medical_history(jane.id).unwrap().records.is_empty());
}

#[test]
fn test_backup_between_cores() {
    let source = open_database_in_memory().unwrap();
    let jane = source.create_patient(patient_data("Jane Doe")).unwrap();
    source
        .add_record(jane.id.clone(), chemo_input("2024-01-01"))
        .unwrap();
    let json = source.export_backup_json().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("restore.db");
    let target = open_database(path.to_string_lossy().into_owned()).unwrap();
    let summary = target.import_backup_json(json.clone()).unwrap();
    assert_eq!(summary.patients, 1);
    assert_eq!(summary.records, 1);
    assert_eq!(target.patient_list().unwrap().patients.len(), 1);
    assert_eq!(target.medical_history(jane.id).unwrap().records.len(), 1);

    let err = target.import_backup_json(json).unwrap_err();
    assert!(matches!(err, MediTrackError::ImportError(_)));
}

#[test]
fn test_open_with_config_category_filter() {
    let core = open_with_config(None, Some("warn".to_string()), Some("surgery".to_string())).unwrap();
    let jane = core.create_patient(patient_data("Jane Doe")).unwrap();
    let view = core.medical_history(jane.id).unwrap();
    assert_eq!(view.category_filter, "surgery");

    assert!(matches!(
        open_with_config(None, None, Some("dentistry".to_string())),
        Err(MediTrackError::InvalidInput(_))
    ));
}

#[test]
fn test_categories_and_derivations() {
    let core = open_database_in_memory().unwrap();
    let categories = core.categories();
    assert_eq!(categories.len(), 11);
    let surgery = categories.iter().find(|c| c.category == "surgery").unwrap();
    assert_eq!(surgery.record_type, "continuous");
    assert!(surgery.supports_treatment_field);

    assert_eq!(
        calculate_stage("T2".to_string(), "N1".to_string(), "M0".to_string()).unwrap(),
        "II"
    );
    assert_eq!(
        calculate_subtype("0".to_string(), "0".to_string(), "+".to_string(), None).unwrap(),
        "her2-positive"
    );
    assert!(calculate_stage("T9".to_string(), "N0".to_string(), "M0".to_string()).is_err());
}

#[test]
fn test_views_carry_every_entity() {
    let patients: Vec<Patient> = ["Jane Doe", "Ada Byron", "Mary Major"]
        .into_iter()
        .map(|name| create_patient(patient_data(name).try_into().unwrap()).unwrap())
        .collect();
    let mut list = PatientListMachine::new();
    list.handle(PatientListEvent::Loaded(patients.clone()));
    assert_eq!(FfiPatientList::try_from(&list).unwrap().patients.len(), 3);

    let pid = patients[0].id.as_str();
    let records: Vec<_> = [1, 2]
        .into_iter()
        .map(|month| {
            let date = Utc.with_ymd_and_hms(2024, month, 1, 0, 0, 0).unwrap();
            create_point_record(PointRecordInput::new(pid, Category::Imaging, date)).unwrap()
        })
        .collect();
    let mut history = MedicalHistoryMachine::new(pid, CategoryFilter::All);
    history.handle(MedicalHistoryEvent::Loaded(records.clone()));
    history.handle(MedicalHistoryEvent::SelectRecord(Some(records[1].id.clone())));

    let view = FfiHistory::try_from(&history).unwrap();
    assert_eq!(view.records.len(), 2);
    assert_eq!(view.selected_record.unwrap().id, records[1].id);
}
