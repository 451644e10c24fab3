//! Patient models.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{
    dates, optional_str, optional_timestamp, required_str, Diagnosis, FieldError,
    ValidationError, ValidationResult,
};
use crate::id::PATIENT_IDS;

/// Minimum phone number length, in characters.
pub const PHONE_MIN_LEN: usize = 7;
/// Maximum phone number length, in characters.
pub const PHONE_MAX_LEN: usize = 15;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+'-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)*\.[A-Za-z]{2,}$")
        .expect("email pattern is valid")
});

/// Patient fields supplied by the clinician.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientData {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(with = "dates::calendar_date")]
    pub date_of_birth: NaiveDate,
    pub diagnosis: Diagnosis,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl PatientData {
    /// Check every field, reporting all violations at once.
    pub fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();
        self.collect_errors(&mut errors);
        ValidationError::check(errors)
    }

    fn collect_errors(&self, errors: &mut Vec<FieldError>) {
        collect_contact_errors(&self.name, &self.email, &self.phone, errors);
        self.diagnosis.collect_errors(errors);
    }
}

/// A stored patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    /// `PAT-XXXXX-XXXXX`
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(with = "dates::calendar_date")]
    pub date_of_birth: NaiveDate,
    pub diagnosis: Diagnosis,
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
}

/// Create a new patient with a fresh ID and timestamps.
pub fn create_patient(data: PatientData) -> ValidationResult<Patient> {
    data.validate()?;

    let now = Utc::now();
    let patient = Patient {
        id: PATIENT_IDS.generate(),
        name: data.name,
        email: data.email,
        phone: data.phone,
        date_of_birth: data.date_of_birth,
        diagnosis: data.diagnosis,
        notes: data.notes,
        created_at: Some(now),
        updated_at: Some(now),
    };

    patient.validate()?;
    Ok(patient)
}

impl Patient {
    /// Check the full patient, reporting all violations at once.
    pub fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();
        if !PATIENT_IDS.is_valid(&self.id) {
            errors.push(FieldError::new("id", "must match PAT-XXXXX-XXXXX"));
        }
        collect_contact_errors(&self.name, &self.email, &self.phone, &mut errors);
        self.diagnosis.collect_errors(&mut errors);
        ValidationError::check(errors)
    }

    /// Clinician-editable fields of this patient.
    pub fn data(&self) -> PatientData {
        PatientData {
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            date_of_birth: self.date_of_birth,
            diagnosis: self.diagnosis.clone(),
            notes: self.notes.clone(),
        }
    }

    /// Build the updated value: same ID and creation time, fresh `updated_at`.
    pub fn with_updates(&self, data: PatientData) -> ValidationResult<Patient> {
        data.validate()?;
        Ok(Patient {
            id: self.id.clone(),
            name: data.name,
            email: data.email,
            phone: data.phone,
            date_of_birth: data.date_of_birth,
            diagnosis: data.diagnosis,
            notes: data.notes,
            created_at: self.created_at,
            updated_at: Some(Utc::now()),
        })
    }

    /// Parse and validate an untyped stored or imported patient.
    pub fn from_value(value: serde_json::Value) -> ValidationResult<Patient> {
        let Some(object) = value.as_object() else {
            return Err(ValidationError::single("$", "expected an object"));
        };

        let mut errors = Vec::new();
        let id = required_str(object, "id", &mut errors).map(str::to_string);
        let name = required_str(object, "name", &mut errors).map(str::to_string);
        let email = required_str(object, "email", &mut errors).map(str::to_string);
        let phone = required_str(object, "phone", &mut errors).map(str::to_string);
        let date_of_birth = required_str(object, "dateOfBirth", &mut errors).and_then(|raw| {
            let parsed = dates::parse_date(raw);
            if parsed.is_none() {
                errors.push(FieldError::new("dateOfBirth", format!("invalid date: {}", raw)));
            }
            parsed
        });
        let diagnosis = match object.get("diagnosis") {
            None | Some(serde_json::Value::Null) => {
                errors.push(FieldError::new("diagnosis", "is required"));
                None
            }
            Some(raw) => match serde_json::from_value::<Diagnosis>(raw.clone()) {
                Ok(diagnosis) => Some(diagnosis),
                Err(e) => {
                    errors.push(FieldError::new("diagnosis", e.to_string()));
                    None
                }
            },
        };
        let notes = optional_str(object, "notes", &mut errors).map(str::to_string);
        let created_at = optional_timestamp(object, "createdAt", &mut errors);
        let updated_at = optional_timestamp(object, "updatedAt", &mut errors);

        match (id, name, email, phone, date_of_birth, diagnosis) {
            (Some(id), Some(name), Some(email), Some(phone), Some(date_of_birth), Some(diagnosis))
                if errors.is_empty() =>
            {
                let patient = Patient {
                    id,
                    name,
                    email,
                    phone,
                    date_of_birth,
                    diagnosis,
                    notes,
                    created_at,
                    updated_at,
                };
                patient.validate()?;
                Ok(patient)
            }
            _ => Err(ValidationError { errors }),
        }
    }
}

fn collect_contact_errors(name: &str, email: &str, phone: &str, errors: &mut Vec<FieldError>) {
    if name.trim().is_empty() {
        errors.push(FieldError::new("name", "Name is required"));
    }
    if !EMAIL_PATTERN.is_match(email) {
        errors.push(FieldError::new("email", "Invalid email address"));
    }
    let phone_len = phone.chars().count();
    if phone_len < PHONE_MIN_LEN {
        errors.push(FieldError::new("phone", "Phone number is too short"));
    } else if phone_len > PHONE_MAX_LEN {
        errors.push(FieldError::new("phone", "Phone number is too long"));
    }
}
