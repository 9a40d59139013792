//! SQLite schema definition.

/// Complete database schema for clinic-stats.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Tutors and Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS tutors (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    account_balance REAL NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS patients (
    id TEXT PRIMARY KEY,
    tutor_id TEXT NOT NULL REFERENCES tutors(id),
    name TEXT NOT NULL,
    species TEXT NOT NULL,
    breed TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_patients_tutor ON patients(tutor_id);

-- ============================================================================
-- Sales (ventas_presenciales)
-- ============================================================================

CREATE TABLE IF NOT EXISTS sales (
    id TEXT PRIMARY KEY,
    tutor_id TEXT NOT NULL,
    tutor_name TEXT NOT NULL,                    -- denormalized, as embedded in the ticket
    total REAL NOT NULL,
    items TEXT NOT NULL DEFAULT '[]',            -- JSON array of {name, quantity}
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_sales_created ON sales(created_at);
CREATE INDEX IF NOT EXISTS idx_sales_tutor ON sales(tutor_id, created_at);

-- ============================================================================
-- Appointments
-- ============================================================================

CREATE TABLE IF NOT EXISTS appointments (
    id TEXT PRIMARY KEY,
    kind TEXT NOT NULL CHECK (kind IN ('clinic', 'grooming')),
    tutor_id TEXT NOT NULL,
    patient_id TEXT,
    starts_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_appointments_kind_start ON appointments(kind, starts_at);
CREATE INDEX IF NOT EXISTS idx_appointments_tutor ON appointments(tutor_id, kind, starts_at);

-- ============================================================================
-- Per-patient sub-collections
-- ============================================================================

CREATE TABLE IF NOT EXISTS clinical_history (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES patients(id),
    recorded_at TEXT,
    summary TEXT NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS idx_history_patient ON clinical_history(patient_id);

CREATE TABLE IF NOT EXISTS prescriptions (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES patients(id),
    issued_at TEXT,
    medication TEXT NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS idx_prescriptions_patient ON prescriptions(patient_id);

CREATE TABLE IF NOT EXISTS expirables (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES patients(id),
    name TEXT NOT NULL,
    created_at TEXT,
    due_at TEXT,
    supplied INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_expirables_patient ON expirables(patient_id);
"#;
