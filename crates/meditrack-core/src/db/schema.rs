//! SQLite schema definition.

/// Complete database schema for meditrack.
///
/// Every row stores the full entity as a JSON `body`; the lookup columns are
/// generated from it so they can never drift from the stored value.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    id TEXT PRIMARY KEY,
    body TEXT NOT NULL CHECK (json_valid(body)),
    name TEXT GENERATED ALWAYS AS (json_extract(body, '$.name')) VIRTUAL,
    email TEXT GENERATED ALWAYS AS (json_extract(body, '$.email')) VIRTUAL,
    phone TEXT GENERATED ALWAYS AS (json_extract(body, '$.phone')) VIRTUAL,
    date_of_birth TEXT GENERATED ALWAYS AS (json_extract(body, '$.dateOfBirth')) VIRTUAL,
    diagnosis TEXT GENERATED ALWAYS AS (json_extract(body, '$.diagnosis.diagnosis')) VIRTUAL,
    stored_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_patients_name ON patients(name);
CREATE INDEX IF NOT EXISTS idx_patients_email ON patients(email);
CREATE INDEX IF NOT EXISTS idx_patients_phone ON patients(phone);
CREATE INDEX IF NOT EXISTS idx_patients_date_of_birth ON patients(date_of_birth);
CREATE INDEX IF NOT EXISTS idx_patients_diagnosis ON patients(diagnosis);

-- ============================================================================
-- Medical History
-- ============================================================================

-- patient_id is a convention, not a foreign key: records may be imported
-- before (or without) their patient.
CREATE TABLE IF NOT EXISTS medical_history (
    id TEXT PRIMARY KEY,
    body TEXT NOT NULL CHECK (json_valid(body)),
    patient_id TEXT GENERATED ALWAYS AS (json_extract(body, '$.patientId')) VIRTUAL,
    category TEXT GENERATED ALWAYS AS (json_extract(body, '$.category')) VIRTUAL,
    record_type TEXT GENERATED ALWAYS AS (json_extract(body, '$.type')) VIRTUAL,
    stored_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_history_patient ON medical_history(patient_id);
CREATE INDEX IF NOT EXISTS idx_history_category ON medical_history(category);
CREATE INDEX IF NOT EXISTS idx_history_type ON medical_history(record_type);
"#;
