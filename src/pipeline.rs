// 🚚 Pipeline - Extract → Clean → Load for Providers, Patients, Claims
//
// Tables load strictly in order: Claims carry foreign keys into the other two.

use crate::cleaning::{clean_claims, clean_patients, clean_providers, Cleaned};
use crate::config::{FilesConfig, Settings};
use crate::db;
use crate::entities::Record;
use crate::error::Result;
use crate::parser::extract_table;
use crate::schema::EntityKind;
use crate::upsert::{upsert, UpsertOutcome};
use rusqlite::Connection;
use serde::Serialize;
use std::fmt;
use tracing::{info, info_span, warn};

// ============================================================================
// SUMMARY
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EntitySummary {
    /// Rows read from the source file
    pub extracted: usize,

    /// Records left after validation and dedup
    pub cleaned: usize,

    /// Rows dropped for a missing key or reference
    pub dropped: usize,

    pub duplicates_removed: usize,

    pub inserted: usize,
    pub updated: usize,

    /// Records the store rejected (constraint violations etc.)
    pub failed: usize,
}

impl EntitySummary {
    fn new<R>(cleaned: &Cleaned<R>, dropped: usize, outcome: UpsertOutcome) -> Self {
        EntitySummary {
            extracted: cleaned.input_rows,
            cleaned: cleaned.len(),
            dropped,
            duplicates_removed: cleaned.duplicates_removed,
            inserted: outcome.inserted,
            updated: outcome.updated,
            failed: outcome.failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineSummary {
    pub run_id: String,
    pub providers: EntitySummary,
    pub patients: EntitySummary,
    pub claims: EntitySummary,
}

impl PipelineSummary {
    pub fn entities(&self) -> [(EntityKind, &EntitySummary); 3] {
        [
            (EntityKind::Provider, &self.providers),
            (EntityKind::Patient, &self.patients),
            (EntityKind::Claim, &self.claims),
        ]
    }

    pub fn total_failed(&self) -> usize {
        self.entities().iter().map(|(_, s)| s.failed).sum()
    }
}

impl fmt::Display for PipelineSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<10} {:>9} {:>8} {:>8} {:>6} {:>9} {:>8} {:>7}",
            "Table", "Extracted", "Cleaned", "Dropped", "Dupes", "Inserted", "Updated", "Failed"
        )?;
        for (kind, s) in self.entities() {
            writeln!(
                f,
                "{:<10} {:>9} {:>8} {:>8} {:>6} {:>9} {:>8} {:>7}",
                kind.table(),
                s.extracted,
                s.cleaned,
                s.dropped,
                s.duplicates_removed,
                s.inserted,
                s.updated,
                s.failed
            )?;
        }
        Ok(())
    }
}

// ============================================================================
// RUN
// ============================================================================

/// Full run against the configured store
///
/// The connection is opened once and closed at the end whether or not the run succeeded.
pub fn run(settings: &Settings) -> Result<PipelineSummary> {
    let conn = db::open_store(&settings.database.path)?;
    let result = run_with_connection(&conn, &settings.files);

    if let Err((_, e)) = conn.close() {
        warn!("Failed to close target store cleanly: {}", e);
    }

    result
}

/// Run against an already-open store (schema setup included)
pub fn run_with_connection(conn: &Connection, files: &FilesConfig) -> Result<PipelineSummary> {
    let run_id = uuid::Uuid::new_v4().to_string();
    let span = info_span!("etl_run", run_id = %run_id);
    let _entered = span.enter();

    db::enable_foreign_keys(conn)?;
    db::create_tables(conn)?;

    // Extract
    let providers_raw = extract_table(&files.providers);
    let patients_raw = extract_table(&files.patients);
    let claims_raw = extract_table(&files.claims);

    // Transform
    let providers = clean_providers(providers_raw);
    let patients = clean_patients(patients_raw);
    let claims = clean_claims(claims_raw);

    info!("Providers cleaned: {} rows", providers.len());
    info!("Patients cleaned: {} rows", patients.len());
    info!(
        "Claims cleaned: {} rows, dropped: {} (missing PatientID or ProviderID: {}, missing ClaimID: {})",
        claims.cleaned.len(),
        claims.dropped.len(),
        claims.dropped_missing_references(),
        claims.cleaned.missing_key
    );

    // Load
    let provider_outcome = load(conn, &providers.records)?;
    let patient_outcome = load(conn, &patients.records)?;
    let claim_outcome = load(conn, &claims.cleaned.records)?;

    let summary = PipelineSummary {
        run_id,
        providers: EntitySummary::new(&providers, providers.missing_key, provider_outcome),
        patients: EntitySummary::new(&patients, patients.missing_key, patient_outcome),
        claims: EntitySummary::new(&claims.cleaned, claims.dropped.len(), claim_outcome),
    };

    info!("ETL Summary:");
    for (kind, s) in summary.entities() {
        info!("{}: {} inserted, {} updated", kind.name(), s.inserted, s.updated);
    }
    info!("ETL pipeline completed successfully.");

    Ok(summary)
}

fn load<R: Record>(conn: &Connection, records: &[R]) -> Result<UpsertOutcome> {
    upsert(conn, records, R::KIND.table(), R::KIND.key_column())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DatabaseConfig, LoggingConfig};
    use std::fs;
    use std::io;
    use std::path::Path;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    #[derive(Clone, Default)]
    struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CaptureWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl CaptureWriter {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn write_sources(dir: &Path, claims_csv: &str) -> FilesConfig {
        let providers = dir.join("providers.csv");
        let patients = dir.join("patients.csv");
        let claims = dir.join("claims.csv");

        fs::write(
            &providers,
            "ProviderID,Name,Specialty,City,Phone\nPR1,Dr. A,Cardiology,Boston,555\nPR2,Dr. B,,Austin,\n,Nobody,,,\n",
        )
        .unwrap();
        fs::write(
            &patients,
            "PatientID,Name,DateOfBirth,Gender\nPT1,Alice,1985-05-05,F\nPT2,Bob,not-a-date,M\nPT1,Alice B,05/05/1985,F\n",
        )
        .unwrap();
        fs::write(&claims, claims_csv).unwrap();

        FilesConfig {
            providers,
            patients,
            claims,
        }
    }

    const CLAIMS_CSV: &str = "ClaimID,PatientID,ProviderID,ServiceDate,ClaimAmount,Status\n\
C1,PT1,PR1,2025-01-01,100,Approved\n\
C2,,PR2,2025-02-02,200,Denied\n\
C3,PT2,PR9,2025-03-03,300,Pending\n\
C4,PT2,PR2,03/04/2025,\"1,250.00\",Pending\n";

    fn settings_in(dir: &TempDir) -> Settings {
        Settings {
            files: write_sources(dir.path(), CLAIMS_CSV),
            database: DatabaseConfig {
                path: dir.path().join("healthcare.db"),
            },
            logging: LoggingConfig::default(),
        }
    }

    #[test]
    fn test_full_run_counts() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(&dir);

        let summary = run(&settings).unwrap();

        assert_eq!(summary.providers.extracted, 3);
        assert_eq!(summary.providers.cleaned, 2);
        assert_eq!(summary.providers.dropped, 1);
        assert_eq!(summary.providers.inserted, 2);

        assert_eq!(summary.patients.cleaned, 2);
        assert_eq!(summary.patients.duplicates_removed, 1);

        // C2 dropped for missing PatientID, C3 rejected by the store (PR9 unknown)
        assert_eq!(summary.claims.dropped, 1);
        assert_eq!(summary.claims.cleaned, 3);
        assert_eq!(summary.claims.inserted, 2);
        assert_eq!(summary.claims.failed, 1);

        let conn = db::open_store(&settings.database.path).unwrap();
        let report = db::integrity_report(&conn).unwrap();
        assert!(report.is_healthy());

        let (dob, amount): (Option<String>, f64) = conn
            .query_row(
                "SELECT p.DateOfBirth, c.ClaimAmount FROM Claims c
                 JOIN Patients p ON p.PatientID = c.PatientID WHERE c.ClaimID = 'C1'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(dob.as_deref(), Some("1985-05-05T00:00:00"));
        assert_eq!(amount, 100.0);
    }

    #[test]
    fn test_rerun_only_updates() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(&dir);

        let first = run(&settings).unwrap();
        let second = run(&settings).unwrap();

        assert_ne!(first.run_id, second.run_id);
        for (_, s) in second.entities() {
            assert_eq!(s.inserted, 0);
        }
        assert_eq!(second.providers.updated, 2);
        assert_eq!(second.patients.updated, 2);
        assert_eq!(second.claims.updated, 2);
        assert_eq!(second.total_failed(), 1);
    }

    #[test]
    fn test_missing_source_file_does_not_abort() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings_in(&dir);
        settings.files.providers = dir.path().join("missing.xlsx");

        let summary = run(&settings).unwrap();

        assert_eq!(summary.providers.extracted, 0);
        assert_eq!(summary.providers.inserted, 0);
        assert_eq!(summary.patients.inserted, 2);
        // every surviving claim now points at an unknown provider
        assert_eq!(summary.claims.inserted, 0);
        assert_eq!(summary.claims.failed, 3);
    }

    #[test]
    fn test_claims_drop_log_matches_summary() {
        let dir = tempfile::tempdir().unwrap();
        let claims_csv = format!("{}{}", CLAIMS_CSV, ",PT1,PR1,2025-05-05,50,Pending\n");
        let files = write_sources(dir.path(), &claims_csv);
        let conn = db::open_in_memory_store().unwrap();

        let writer = CaptureWriter::default();
        let sink = writer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || sink.clone())
            .with_ansi(false)
            .finish();
        let summary = tracing::subscriber::with_default(subscriber, || {
            run_with_connection(&conn, &files).unwrap()
        });
        let logs = writer.contents();

        assert_eq!(summary.claims.dropped, 2);
        assert!(logs.contains(
            "Claims cleaned: 3 rows, dropped: 2 (missing PatientID or ProviderID: 1, missing ClaimID: 1)"
        ));
    }

    #[test]
    fn test_summary_renders_every_table() {
        let dir = tempfile::tempdir().unwrap();
        let summary = run(&settings_in(&dir)).unwrap();

        let rendered = summary.to_string();
        for kind in EntityKind::LOAD_ORDER {
            assert!(rendered.contains(kind.table()));
        }

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["claims"]["failed"], 1);
    }
}
