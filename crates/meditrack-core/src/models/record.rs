//! Medical-history records.
//!
//! A record is a set of base fields shared by every category plus a
//! category-specific payload. The payload is a tagged union keyed by
//! `category`, flattened into the record on the wire:
//!
//! ```json
//! { "id": "REC-...", "patientId": "PAT-...", "category": "chemotherapy",
//!   "type": "continuous", "date": "...", "startDate": "...",
//!   "regimen": "AC-T", "cycles": 4 }
//! ```
//!
//! `type` always agrees with the category registry. Continuous records carry
//! a `startDate` and, once finished, an `endDate`; an absent `endDate` means
//! the treatment is ongoing. `endDate` is never written as `null`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    dates, optional_str, optional_timestamp, required_str, Category, FieldError, TemporalKind,
    ValidationError, ValidationResult,
};
use crate::id::{PATIENT_IDS, RECORD_IDS};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// A medical-history event attached to a patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalHistoryRecord {
    /// `REC-XXXXX-XXXXX`
    pub id: String,
    /// Owning patient, `PAT-XXXXX-XXXXX`. Not enforced by the store.
    pub patient_id: String,
    #[serde(rename = "type")]
    pub kind: TemporalKind,
    /// Event date; equal to `start_date` for continuous records
    #[serde(with = "dates::timestamp")]
    pub date: DateTime<Utc>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "dates::timestamp::option"
    )]
    pub start_date: Option<DateTime<Utc>>,
    /// Absent while the event is ongoing
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "dates::timestamp::option"
    )]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treatment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "dates::timestamp::option"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "dates::timestamp::option"
    )]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub details: RecordDetails,
}

impl MedicalHistoryRecord {
    pub fn category(&self) -> Category {
        self.details.category()
    }

    /// Check every record invariant, reporting all violations at once.
    pub fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();
        let config = self.category().config();

        if !RECORD_IDS.is_valid(&self.id) {
            errors.push(FieldError::new("id", "must match REC-XXXXX-XXXXX"));
        }
        if !PATIENT_IDS.is_valid(&self.patient_id) {
            errors.push(FieldError::new("patientId", "must match PAT-XXXXX-XXXXX"));
        }

        if self.kind != config.temporal_kind {
            errors.push(FieldError::new(
                "type",
                format!(
                    "must be '{}' for category '{}'",
                    config.temporal_kind.as_str(),
                    config.category
                ),
            ));
        }

        match config.temporal_kind {
            TemporalKind::Continuous => match self.start_date {
                None => errors.push(FieldError::new(
                    "startDate",
                    "is required for continuous records",
                )),
                Some(start) if start != self.date => {
                    errors.push(FieldError::new("date", "must equal startDate"))
                }
                Some(_) => {}
            },
            TemporalKind::Point => {
                if self.start_date.is_some() {
                    errors.push(FieldError::new("startDate", "not allowed on point records"));
                }
                if self.end_date.is_some() {
                    errors.push(FieldError::new("endDate", "not allowed on point records"));
                }
            }
        }

        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                errors.push(FieldError::new("endDate", "must not be before startDate"));
            }
        }

        if self.treatment.is_some() && !config.supports_treatment_field {
            errors.push(FieldError::new(
                "treatment",
                format!("not supported for category '{}'", config.category),
            ));
        }
        if self.notes.is_some() && !config.supports_notes_field {
            errors.push(FieldError::new(
                "notes",
                format!("not supported for category '{}'", config.category),
            ));
        }

        ValidationError::check(errors)
    }

    /// Parse and validate an untyped stored or imported record.
    ///
    /// Base fields are checked one by one so every problem is reported. A
    /// missing `type` is filled in from the registry. Payload shape errors
    /// are reported under `payload`.
    pub fn from_value(value: serde_json::Value) -> ValidationResult<MedicalHistoryRecord> {
        let serde_json::Value::Object(mut object) = value else {
            return Err(ValidationError::single("$", "expected an object"));
        };

        let mut errors = Vec::new();
        required_str(&object, "id", &mut errors);
        required_str(&object, "patientId", &mut errors);

        let category = required_str(&object, "category", &mut errors).and_then(|raw| {
            let parsed = Category::parse(raw);
            if parsed.is_none() {
                errors.push(FieldError::new("category", format!("unknown category: {}", raw)));
            }
            parsed
        });

        let kind_present = match optional_str(&object, "type", &mut errors) {
            Some("point") | Some("continuous") => true,
            Some(other) => {
                errors.push(FieldError::new("type", format!("unknown type: {}", other)));
                true
            }
            None => false,
        };

        if required_str(&object, "date", &mut errors).is_some() {
            optional_timestamp(&object, "date", &mut errors);
        }
        for key in ["startDate", "endDate", "createdAt", "updatedAt"] {
            optional_timestamp(&object, key, &mut errors);
        }
        for key in ["treatment", "notes"] {
            optional_str(&object, key, &mut errors);
        }

        if !errors.is_empty() {
            return Err(ValidationError { errors });
        }

        if let (Some(category), false) = (category, kind_present) {
            object.insert(
                "type".to_string(),
                serde_json::Value::String(category.temporal_kind().as_str().to_string()),
            );
        }

        let record: MedicalHistoryRecord =
            serde_json::from_value(serde_json::Value::Object(object))
                .map_err(|e| ValidationError::single("payload", e.to_string()))?;
        record.validate()?;
        Ok(record)
    }

    /// Re-date a continuous record to its `startDate`.
    pub fn sync_date_to_start(&mut self) {
        if self.category().temporal_kind() == TemporalKind::Continuous {
            if let Some(start) = self.start_date {
                self.date = start;
            }
        }
    }

    /// True for a continuous record with no `endDate`.
    pub fn is_ongoing(&self) -> bool {
        self.kind == TemporalKind::Continuous && self.end_date.is_none()
    }

    /// Whole days from `startDate` to `endDate`, or to now while ongoing.
    pub fn duration_days(&self) -> i64 {
        self.duration_days_at(Utc::now())
    }

    /// [`duration_days`](Self::duration_days) measured against `now`.
    ///
    /// Floors; 0 for point records or a missing `startDate`. A `startDate`
    /// after `now` gives a negative count.
    pub fn duration_days_at(&self, now: DateTime<Utc>) -> i64 {
        if self.kind != TemporalKind::Continuous {
            return 0;
        }
        let Some(start) = self.start_date else {
            return 0;
        };
        let end = self.end_date.unwrap_or(now);
        (end - start).num_milliseconds().div_euclid(MILLIS_PER_DAY)
    }

    /// Stamp `updated_at` with the current time.
    pub fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }
}

/// Input for [`create_point_record`].
#[derive(Debug, Clone, PartialEq)]
pub struct PointRecordInput {
    pub patient_id: String,
    pub date: DateTime<Utc>,
    pub treatment: Option<String>,
    pub notes: Option<String>,
    pub details: RecordDetails,
}

impl PointRecordInput {
    /// Input with an empty payload for `category`.
    pub fn new(patient_id: impl Into<String>, category: Category, date: DateTime<Utc>) -> Self {
        Self {
            patient_id: patient_id.into(),
            date,
            treatment: None,
            notes: None,
            details: RecordDetails::empty(category),
        }
    }

    pub fn with_details(mut self, details: RecordDetails) -> Self {
        self.details = details;
        self
    }

    pub fn with_treatment(mut self, treatment: impl Into<String>) -> Self {
        self.treatment = Some(treatment.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Input for [`create_continuous_record`].
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuousRecordInput {
    pub patient_id: String,
    /// Only used when `start_date` is absent
    pub date: Option<DateTime<Utc>>,
    pub start_date: Option<DateTime<Utc>>,
    /// `None` means ongoing
    pub end_date: Option<DateTime<Utc>>,
    pub treatment: Option<String>,
    pub notes: Option<String>,
    pub details: RecordDetails,
}

impl ContinuousRecordInput {
    /// Ongoing input starting at `start_date`, with an empty payload.
    pub fn new(
        patient_id: impl Into<String>,
        category: Category,
        start_date: DateTime<Utc>,
    ) -> Self {
        Self {
            patient_id: patient_id.into(),
            date: None,
            start_date: Some(start_date),
            end_date: None,
            treatment: None,
            notes: None,
            details: RecordDetails::empty(category),
        }
    }

    pub fn with_end_date(mut self, end_date: Option<DateTime<Utc>>) -> Self {
        self.end_date = end_date;
        self
    }

    pub fn with_details(mut self, details: RecordDetails) -> Self {
        self.details = details;
        self
    }

    pub fn with_treatment(mut self, treatment: impl Into<String>) -> Self {
        self.treatment = Some(treatment.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Build a validated point record with a fresh ID and timestamps.
pub fn create_point_record(input: PointRecordInput) -> ValidationResult<MedicalHistoryRecord> {
    let now = Utc::now();
    let record = MedicalHistoryRecord {
        id: RECORD_IDS.generate(),
        patient_id: input.patient_id,
        kind: TemporalKind::Point,
        date: input.date,
        start_date: None,
        end_date: None,
        treatment: input.treatment,
        notes: input.notes,
        created_at: Some(now),
        updated_at: Some(now),
        details: input.details,
    };

    record.validate()?;
    Ok(record)
}

/// Build a validated continuous record with a fresh ID and timestamps.
pub fn create_continuous_record(
    input: ContinuousRecordInput,
) -> ValidationResult<MedicalHistoryRecord> {
    let now = Utc::now();
    let record = MedicalHistoryRecord {
        id: RECORD_IDS.generate(),
        patient_id: input.patient_id,
        kind: TemporalKind::Continuous,
        date: input.start_date.or(input.date).unwrap_or(now),
        start_date: input.start_date,
        end_date: input.end_date,
        treatment: input.treatment,
        notes: input.notes,
        created_at: Some(now),
        updated_at: Some(now),
        details: input.details,
    };

    record.validate()?;
    Ok(record)
}

/// Stable sort, ascending by event date.
pub fn sort_chronologically(records: &mut [MedicalHistoryRecord]) {
    records.sort_by_key(|r| r.date);
}

/// Category-specific payload, tagged by `category`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum RecordDetails {
    Diagnosis(DiagnosisFields),
    FollowUp(FollowUpFields),
    Surgery(SurgeryFields),
    Chemotherapy(ChemotherapyFields),
    Radiotherapy(RadiotherapyFields),
    Immunotherapy(ImmunotherapyFields),
    Hospitalization(HospitalizationFields),
    LabTest(LabTestFields),
    Imaging(ImagingFields),
    Consultation(ConsultationFields),
    Other(OtherFields),
}

impl RecordDetails {
    /// Payload for `category` with every field unset.
    pub fn empty(category: Category) -> Self {
        match category {
            Category::Diagnosis => RecordDetails::Diagnosis(Default::default()),
            Category::FollowUp => RecordDetails::FollowUp(Default::default()),
            Category::Surgery => RecordDetails::Surgery(Default::default()),
            Category::Chemotherapy => RecordDetails::Chemotherapy(Default::default()),
            Category::Radiotherapy => RecordDetails::Radiotherapy(Default::default()),
            Category::Immunotherapy => RecordDetails::Immunotherapy(Default::default()),
            Category::Hospitalization => RecordDetails::Hospitalization(Default::default()),
            Category::LabTest => RecordDetails::LabTest(Default::default()),
            Category::Imaging => RecordDetails::Imaging(Default::default()),
            Category::Consultation => RecordDetails::Consultation(Default::default()),
            Category::Other => RecordDetails::Other(Default::default()),
        }
    }

    pub fn category(&self) -> Category {
        match self {
            RecordDetails::Diagnosis(_) => Category::Diagnosis,
            RecordDetails::FollowUp(_) => Category::FollowUp,
            RecordDetails::Surgery(_) => Category::Surgery,
            RecordDetails::Chemotherapy(_) => Category::Chemotherapy,
            RecordDetails::Radiotherapy(_) => Category::Radiotherapy,
            RecordDetails::Immunotherapy(_) => Category::Immunotherapy,
            RecordDetails::Hospitalization(_) => Category::Hospitalization,
            RecordDetails::LabTest(_) => Category::LabTest,
            RecordDetails::Imaging(_) => Category::Imaging,
            RecordDetails::Consultation(_) => Category::Consultation,
            RecordDetails::Other(_) => Category::Other,
        }
    }

    /// Parse a bare payload object (no `category` key) for `category`.
    /// `null` yields the empty payload.
    pub fn from_payload(category: Category, payload: serde_json::Value) -> ValidationResult<Self> {
        let mut object = match payload {
            serde_json::Value::Null => serde_json::Map::new(),
            serde_json::Value::Object(object) => object,
            _ => return Err(ValidationError::single("payload", "expected an object")),
        };
        object.insert(
            "category".to_string(),
            serde_json::Value::String(category.as_str().to_string()),
        );
        serde_json::from_value(serde_json::Value::Object(object))
            .map_err(|e| ValidationError::single("payload", e.to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DiagnosisFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnosis_name: Option<String>,
    /// ICD-10 or similar
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnosis_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FollowUpFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub findings: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SurgeryFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surgery_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surgeon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complications: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChemotherapyFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regimen: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycles: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<ChemotherapyResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side_effects: Option<String>,
}

/// Tumor response to chemotherapy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChemotherapyResponse {
    CompleteResponse,
    PartialResponse,
    StableDisease,
    ProgressiveDisease,
    NotAssessed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RadiotherapyFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_area: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technique: Option<String>,
    /// Free text, e.g. `50 Gy`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_dose: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fractions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side_effects: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImmunotherapyFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<ImmunotherapyResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side_effects: Option<String>,
}

/// Response to immunotherapy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImmunotherapyResponse {
    Complete,
    Partial,
    Stable,
    Progressive,
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HospitalizationFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LabTestFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImagingFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imaging_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub findings: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConsultationFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OtherFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CategoryRegistry;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;
    use serde_json::json;

    fn patient_id() -> String {
        PATIENT_IDS.generate()
    }

    fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_continuous_requires_start_date() {
        for category in CategoryRegistry::global().categories_of_kind(TemporalKind::Continuous) {
            let mut input = ContinuousRecordInput::new(patient_id(), category, day(2024, 1, 1));
            let record = create_continuous_record(input.clone()).unwrap();
            assert_eq!(record.kind, TemporalKind::Continuous);
            assert_eq!(record.date, day(2024, 1, 1));

            input.start_date = None;
            input.date = Some(day(2024, 1, 1));
            let err = create_continuous_record(input).unwrap_err();
            assert_eq!(err.fields(), vec!["startDate"], "{}", category);
        }
    }

    #[test]
    fn test_continuous_date_must_match_start() {
        let mut record = create_continuous_record(ContinuousRecordInput::new(
            patient_id(),
            Category::Chemotherapy,
            day(2024, 1, 1),
        ))
        .unwrap();
        record.start_date = Some(day(2024, 6, 1));
        assert_eq!(record.validate().unwrap_err().fields(), vec!["date"]);

        let err = MedicalHistoryRecord::from_value(serde_json::to_value(&record).unwrap())
            .unwrap_err();
        assert!(err.has_field("date"));

        record.sync_date_to_start();
        assert_eq!(record.date, day(2024, 6, 1));
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_end_before_start_rejected() {
        let input = ContinuousRecordInput::new(patient_id(), Category::Radiotherapy, day(2024, 3, 1))
            .with_end_date(Some(day(2024, 2, 1)));
        let err = create_continuous_record(input).unwrap_err();
        assert_eq!(err.fields(), vec!["endDate"]);
    }

    #[test]
    fn test_point_factory_rejects_continuous_category() {
        let input = PointRecordInput::new(patient_id(), Category::Surgery, day(2024, 1, 1));
        let err = create_point_record(input).unwrap_err();
        assert!(err.has_field("type"));
    }

    #[test]
    fn test_continuous_factory_rejects_point_category() {
        let input = ContinuousRecordInput::new(patient_id(), Category::LabTest, day(2024, 1, 1));
        let err = create_continuous_record(input).unwrap_err();
        assert!(err.has_field("type"));
        assert!(err.has_field("startDate"));
    }

    #[test]
    fn test_treatment_only_where_supported() {
        let ok = PointRecordInput::new(patient_id(), Category::Consultation, day(2024, 1, 1))
            .with_treatment("tamoxifen");
        assert!(create_point_record(ok).is_ok());

        let rejected = PointRecordInput::new(patient_id(), Category::Imaging, day(2024, 1, 1))
            .with_treatment("tamoxifen");
        let err = create_point_record(rejected).unwrap_err();
        assert_eq!(err.fields(), vec!["treatment"]);
    }

    #[test]
    fn test_bad_patient_id_rejected() {
        let input = PointRecordInput::new("patient-1", Category::Other, day(2024, 1, 1));
        let err = create_point_record(input).unwrap_err();
        assert_eq!(err.fields(), vec!["patientId"]);
    }

    #[test]
    fn test_ongoing_normalization_from_json() {
        let record = create_continuous_record(ContinuousRecordInput::new(
            patient_id(),
            Category::Chemotherapy,
            day(2024, 1, 1),
        ))
        .unwrap();

        let mut value = serde_json::to_value(&record).unwrap();
        assert!(value.get("endDate").is_none());

        value["endDate"] = serde_json::Value::Null;
        let parsed = MedicalHistoryRecord::from_value(value).unwrap();
        assert_eq!(parsed.end_date, None);
        assert!(parsed.is_ongoing());
        assert!(serde_json::to_value(&parsed).unwrap().get("endDate").is_none());
    }

    #[test]
    fn test_wire_shape_is_flat() {
        let details = RecordDetails::Chemotherapy(ChemotherapyFields {
            regimen: Some("AC-T".into()),
            cycles: Some(4),
            response: Some(ChemotherapyResponse::PartialResponse),
            side_effects: None,
        });
        let record = create_continuous_record(
            ContinuousRecordInput::new(patient_id(), Category::Chemotherapy, day(2024, 1, 1))
                .with_details(details),
        )
        .unwrap();

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["category"], "chemotherapy");
        assert_eq!(value["type"], "continuous");
        assert_eq!(value["startDate"], "2024-01-01T00:00:00.000Z");
        assert_eq!(value["regimen"], "AC-T");
        assert_eq!(value["cycles"], 4);
        assert_eq!(value["response"], "partial-response");
        assert!(value.get("sideEffects").is_none());

        let parsed = MedicalHistoryRecord::from_value(value).unwrap();
        assert_eq!(parsed.id, record.id);
        assert_eq!(parsed.start_date, record.start_date);
        assert_eq!(parsed.details, record.details);
    }

    #[test]
    fn test_from_value_fills_missing_type() {
        let raw = json!({
            "id": RECORD_IDS.generate(),
            "patientId": patient_id(),
            "category": "lab_test",
            "date": "2024-02-10",
            "testType": "CBC",
        });

        let record = MedicalHistoryRecord::from_value(raw).unwrap();
        assert_eq!(record.kind, TemporalKind::Point);
        assert_eq!(record.date, day(2024, 2, 10));
        assert_eq!(
            record.details,
            RecordDetails::LabTest(LabTestFields {
                test_type: Some("CBC".into()),
                results: None,
            })
        );
    }

    #[test]
    fn test_from_value_reports_base_fields() {
        let raw = json!({
            "patientId": 7,
            "category": "dentistry",
            "type": "sometimes",
            "date": "last week",
        });

        let err = MedicalHistoryRecord::from_value(raw).unwrap_err();
        assert_eq!(err.fields(), vec!["id", "patientId", "category", "type", "date"]);
    }

    #[test]
    fn test_from_value_rejects_mismatched_type() {
        let raw = json!({
            "id": RECORD_IDS.generate(),
            "patientId": patient_id(),
            "category": "surgery",
            "type": "point",
            "date": "2024-02-10",
        });

        let err = MedicalHistoryRecord::from_value(raw).unwrap_err();
        assert!(err.has_field("type"));
        assert!(err.has_field("startDate"));
    }

    #[test]
    fn test_from_value_payload_shape_error() {
        let raw = json!({
            "id": RECORD_IDS.generate(),
            "patientId": patient_id(),
            "category": "chemotherapy",
            "date": "2024-01-01",
            "startDate": "2024-01-01",
            "cycles": "four",
        });

        let err = MedicalHistoryRecord::from_value(raw).unwrap_err();
        assert_eq!(err.fields(), vec!["payload"]);
    }

    #[test]
    fn test_from_payload() {
        let details =
            RecordDetails::from_payload(Category::Surgery, json!({ "surgeon": "Dr. Lee" })).unwrap();
        assert_eq!(details.category(), Category::Surgery);

        let empty = RecordDetails::from_payload(Category::Other, serde_json::Value::Null).unwrap();
        assert_eq!(empty, RecordDetails::empty(Category::Other));

        assert!(RecordDetails::from_payload(Category::Other, json!([1, 2])).is_err());
    }

    #[test]
    fn test_duration_days() {
        let mut record = create_continuous_record(ContinuousRecordInput::new(
            patient_id(),
            Category::Hospitalization,
            day(2024, 1, 1),
        ))
        .unwrap();

        let now = day(2024, 1, 31) + Duration::hours(23);
        assert_eq!(record.duration_days_at(now), 30);

        record.end_date = Some(day(2024, 1, 11));
        assert!(!record.is_ongoing());
        assert_eq!(record.duration_days_at(now), 10);

        record.end_date = None;
        assert_eq!(record.duration_days_at(day(2023, 12, 31) + Duration::hours(1)), -1);
    }

    #[test]
    fn test_duration_zero_for_point_records() {
        let record = create_point_record(PointRecordInput::new(
            patient_id(),
            Category::Imaging,
            day(2020, 1, 1),
        ))
        .unwrap();
        assert!(!record.is_ongoing());
        assert_eq!(record.duration_days(), 0);
    }

    proptest! {
        #[test]
        fn prop_duration_non_negative_for_past_start(offset_minutes in 0i64..10_000_000) {
            let now = day(2025, 6, 1);
            let start = now - Duration::minutes(offset_minutes);
            let record = create_continuous_record(
                ContinuousRecordInput::new(patient_id(), Category::Surgery, start),
            ).unwrap();
            prop_assert!(record.duration_days_at(now) >= 0);
            prop_assert_eq!(record.duration_days_at(now), offset_minutes / (24 * 60));
        }

        #[test]
        fn prop_sort_is_chronological(days in prop::collection::vec(0i64..3650, 0..40)) {
            let pid = patient_id();
            let mut records: Vec<_> = days
                .iter()
                .map(|d| {
                    create_point_record(PointRecordInput::new(
                        pid.clone(),
                        Category::FollowUp,
                        day(2015, 1, 1) + Duration::days(*d),
                    ))
                    .unwrap()
                })
                .collect();

            sort_chronologically(&mut records);
            prop_assert!(records.windows(2).all(|w| w[0].date <= w[1].date));
        }
    }
}
