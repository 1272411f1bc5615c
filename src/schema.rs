// 📐 Schema Registry - Expected column layout per entity
// One place that knows table names, key columns and the target DDL

use serde::{Deserialize, Serialize};

// ============================================================================
// COLUMN LISTS
// ============================================================================

pub const PROVIDER_COLUMNS: &[&str] = &["ProviderID", "Name", "Specialty", "City"];

pub const PATIENT_COLUMNS: &[&str] = &["PatientID", "Name", "DateOfBirth", "Gender"];

pub const CLAIM_COLUMNS: &[&str] = &[
    "ClaimID",
    "PatientID",
    "ProviderID",
    "ServiceDate",
    "ClaimAmount",
    "Status",
];

// ============================================================================
// DDL
// ============================================================================

const CREATE_PROVIDERS: &str = "CREATE TABLE IF NOT EXISTS Providers (
    ProviderID TEXT PRIMARY KEY,
    Name TEXT,
    Specialty TEXT,
    City TEXT
)";

const CREATE_PATIENTS: &str = "CREATE TABLE IF NOT EXISTS Patients (
    PatientID TEXT PRIMARY KEY,
    Name TEXT,
    DateOfBirth DATE,
    Gender TEXT
)";

const CREATE_CLAIMS: &str = "CREATE TABLE IF NOT EXISTS Claims (
    ClaimID TEXT PRIMARY KEY,
    PatientID TEXT,
    ProviderID TEXT,
    ServiceDate DATE,
    ClaimAmount NUMERIC,
    Status TEXT,
    FOREIGN KEY(PatientID) REFERENCES Patients(PatientID),
    FOREIGN KEY(ProviderID) REFERENCES Providers(ProviderID)
)";

// ============================================================================
// ENTITY KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Provider,
    Patient,
    Claim,
}

impl EntityKind {
    /// Load order. Claims reference both other tables, so they go last.
    pub const LOAD_ORDER: [EntityKind; 3] =
        [EntityKind::Provider, EntityKind::Patient, EntityKind::Claim];

    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Provider => "Providers",
            EntityKind::Patient => "Patients",
            EntityKind::Claim => "Claims",
        }
    }

    /// Target table in the store (same as the display name)
    pub fn table(&self) -> &'static str {
        self.name()
    }

    pub fn key_column(&self) -> &'static str {
        match self {
            EntityKind::Provider => "ProviderID",
            EntityKind::Patient => "PatientID",
            EntityKind::Claim => "ClaimID",
        }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            EntityKind::Provider => PROVIDER_COLUMNS,
            EntityKind::Patient => PATIENT_COLUMNS,
            EntityKind::Claim => CLAIM_COLUMNS,
        }
    }

    /// Columns that go through date normalization during cleaning
    pub fn date_columns(&self) -> &'static [&'static str] {
        match self {
            EntityKind::Provider => &[],
            EntityKind::Patient => &["DateOfBirth"],
            EntityKind::Claim => &["ServiceDate"],
        }
    }

    /// Columns whose null value gets a record dropped during cleaning
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            EntityKind::Provider => &["ProviderID"],
            EntityKind::Patient => &["PatientID"],
            EntityKind::Claim => &["ClaimID", "PatientID", "ProviderID"],
        }
    }

    pub fn create_table_sql(&self) -> &'static str {
        match self {
            EntityKind::Provider => CREATE_PROVIDERS,
            EntityKind::Patient => CREATE_PATIENTS,
            EntityKind::Claim => CREATE_CLAIMS,
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// TESTS
// ============================================================================
