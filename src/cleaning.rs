// 🧹 Cleaning - Align, normalize, validate and deduplicate each entity table
//
// Every procedure follows the same steps:
//   1. align to the registry column list
//   2. normalize the entity's date columns
//   3. drop rows missing a required field (claims: log each one)
//   4. dedup by primary key, last row wins

use crate::deduplication::dedup_keep_last;
use crate::entities::{Claim, DropReason, DroppedClaim, Patient, Provider, Record};
use crate::normalize::normalize_dates;
use crate::table::RawTable;
use tracing::{debug, warn};

// ============================================================================
// RESULTS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Cleaned<R> {
    pub records: Vec<R>,

    /// Rows read from the extracted table
    pub input_rows: usize,

    /// Rows dropped because the primary key was null
    pub missing_key: usize,

    pub duplicates_removed: usize,
}

impl<R> Cleaned<R> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Claims also keep every dropped row for reporting
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedClaims {
    pub cleaned: Cleaned<Claim>,
    pub dropped: Vec<DroppedClaim>,
}

impl CleanedClaims {
    /// Rows dropped for a null PatientID or ProviderID
    pub fn dropped_missing_references(&self) -> usize {
        self.dropped
            .iter()
            .filter(|d| d.reason == DropReason::MissingReference)
            .count()
    }
}

// ============================================================================
// PROCEDURES
// ============================================================================

fn prepare<R: Record>(table: RawTable) -> RawTable {
    let aligned = table.align(R::KIND.columns());
    normalize_dates(aligned, R::KIND.date_columns())
}

fn clean_keyed<R, F>(table: RawTable, from_row: F) -> Cleaned<R>
where
    R: Record,
    F: Fn(&RawTable, usize) -> Option<R>,
{
    let table = prepare::<R>(table);
    let input_rows = table.len();

    let records: Vec<R> = (0..input_rows).filter_map(|i| from_row(&table, i)).collect();
    let missing_key = input_rows - records.len();
    if missing_key > 0 {
        debug!(
            table = R::KIND.table(),
            missing_key, "Dropped rows without {}", R::KIND.key_column()
        );
    }

    let deduped = dedup_keep_last(records);

    Cleaned {
        records: deduped.records,
        input_rows,
        missing_key,
        duplicates_removed: deduped.duplicates_removed,
    }
}

/// Drops rows missing ProviderID and removes duplicates
pub fn clean_providers(table: RawTable) -> Cleaned<Provider> {
    clean_keyed(table, Provider::from_row)
}

/// Normalizes DateOfBirth, drops rows missing PatientID and removes duplicates
pub fn clean_patients(table: RawTable) -> Cleaned<Patient> {
    clean_keyed(table, Patient::from_row)
}

/// Normalizes ServiceDate, drops and logs rows missing PatientID, ProviderID
/// or ClaimID, then removes duplicates
pub fn clean_claims(table: RawTable) -> CleanedClaims {
    let table = prepare::<Claim>(table);
    let input_rows = table.len();

    let mut records = Vec::with_capacity(input_rows);
    let mut dropped = Vec::new();

    for i in 0..input_rows {
        match Claim::from_row(&table, i) {
            Ok(claim) => records.push(claim),
            Err(rejected) => {
                log_dropped_claim(&rejected);
                dropped.push(rejected);
            }
        }
    }

    let missing_key = dropped
        .iter()
        .filter(|d| d.reason == DropReason::MissingClaimId)
        .count();
    let deduped = dedup_keep_last(records);

    CleanedClaims {
        cleaned: Cleaned {
            records: deduped.records,
            input_rows,
            missing_key,
            duplicates_removed: deduped.duplicates_removed,
        },
        dropped,
    }
}

fn log_dropped_claim(dropped: &DroppedClaim) {
    warn!(
        event = "claim_dropped",
        reason = dropped.reason.as_str(),
        claim_id = dropped.claim_id.as_deref(),
        patient_id = dropped.patient_id.as_deref(),
        provider_id = dropped.provider_id.as_deref(),
        service_date = dropped.service_date.as_deref(),
        status = dropped.status.as_deref(),
        "claim_dropped"
    );
}

// ============================================================================
// TESTS
// ============================================================================
