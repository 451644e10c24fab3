//! Shared builders for unit tests.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::models::{
    BreastCancerDetails, Diagnosis, Her2Status, MetastaticStatus, PatientData, ReceptorStatus,
    TumorGrade, TumorLocalization, TumorM, TumorN, TumorT, TumorType,
};

pub fn breast_cancer() -> Diagnosis {
    Diagnosis::BreastCancer(BreastCancerDetails {
        localization: TumorLocalization::Left,
        tnm_t: TumorT::T1c,
        tnm_n: TumorN::N0,
        tnm_m: TumorM::M0,
        stage: None,
        metastatic_status: MetastaticStatus::Early,
        tumor_type: TumorType::InvasiveNst,
        tumor_type_other: None,
        er: ReceptorStatus::Positive,
        pr: ReceptorStatus::Positive,
        her2: Her2Status::Zero,
        ki67: Some(12.0),
        grade: TumorGrade::G2,
        subtype: None,
    })
}

pub fn patient_data(name: &str, email: &str, phone: &str) -> PatientData {
    PatientData {
        name: name.to_string(),
        email: email.to_string(),
        phone: phone.to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(1980, 1, 1).unwrap(),
        diagnosis: breast_cancer(),
        notes: None,
    }
}

pub fn jane() -> PatientData {
    patient_data("Jane Doe", "jane@x.com", "5551234567")
}

pub fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}
