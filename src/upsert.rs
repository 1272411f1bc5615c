// 🔁 Upsert Engine - Insert-or-update per record, with accurate counts
//
// Per record:
//   Pending → probe key → write (INSERT ... ON CONFLICT DO UPDATE) → Inserted | Updated
//   Pending → probe key → write fails → Failed (warned, skipped, not counted)
//
// The conflict clause does not say which branch it took, so the probe runs
// right before the write on the same connection. Single writer assumed.

use crate::db::validate_identifier;
use crate::entities::Record;
use crate::error::{EtlError, Result};
use rusqlite::{params, params_from_iter, Connection, Statement};
use serde::Serialize;
use tracing::{info, trace, warn};

// ============================================================================
// OUTCOMES
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpsertOutcome {
    /// Keys that were not in the table before the write
    pub inserted: usize,

    /// Keys that already existed and had their non-key columns overwritten
    pub updated: usize,

    /// Records skipped because the probe or the write failed
    pub failed: usize,
}

impl UpsertOutcome {
    /// `(inserted, updated)`
    pub fn counts(&self) -> (usize, usize) {
        (self.inserted, self.updated)
    }

    /// Records that made it into the table
    pub fn committed(&self) -> usize {
        self.inserted + self.updated
    }
}

#[derive(Debug, Clone, PartialEq)]
enum RowOutcome {
    Inserted,
    Updated,
    Failed(String),
}

// ============================================================================
// SQL
// ============================================================================

/// `INSERT INTO t (..) VALUES (..) ON CONFLICT(key) DO UPDATE SET c = excluded.c, ..`
///
/// With no non-key columns there is nothing to overwrite, so the conflict is a no-op.
pub fn build_upsert_sql(table_name: &str, columns: &[&str], key_column: &str) -> String {
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
    let updates: Vec<String> = columns
        .iter()
        .filter(|c| **c != key_column)
        .map(|c| format!("{c} = excluded.{c}"))
        .collect();

    let conflict_action = if updates.is_empty() {
        "DO NOTHING".to_string()
    } else {
        format!("DO UPDATE SET {}", updates.join(", "))
    };

    format!(
        "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT({}) {}",
        table_name,
        columns.join(", "),
        placeholders.join(", "),
        key_column,
        conflict_action
    )
}

// ============================================================================
// ENGINE
// ============================================================================

/// Upsert `records` into `table_name`, keyed on `key_column`
///
/// Records are processed in order inside one transaction. A failing row is
/// logged and skipped; only setup problems (bad identifiers, a key column the
/// record does not carry, a missing table, begin/commit errors) return `Err`.
pub fn upsert<R: Record>(
    conn: &Connection,
    records: &[R],
    table_name: &str,
    key_column: &str,
) -> Result<UpsertOutcome> {
    validate_identifier(table_name)?;
    validate_identifier(key_column)?;

    let columns = R::KIND.columns();
    let key_idx = columns
        .iter()
        .position(|c| *c == key_column)
        .ok_or_else(|| EtlError::UnknownColumn {
            table: table_name.to_string(),
            column: key_column.to_string(),
        })?;

    let probe_sql = format!("SELECT 1 FROM {} WHERE {} = ?1", table_name, key_column);
    let write_sql = build_upsert_sql(table_name, columns, key_column);

    let mut outcome = UpsertOutcome::default();
    let tx = conn.unchecked_transaction()?;
    {
        let mut probe = tx.prepare(&probe_sql)?;
        let mut write = tx.prepare(&write_sql)?;

        for record in records {
            let row = upsert_row(&mut probe, &mut write, record, key_idx);
            trace!(table = table_name, key = record.key(), outcome = ?row, "Upserted row");

            match row {
                RowOutcome::Inserted => outcome.inserted += 1,
                RowOutcome::Updated => outcome.updated += 1,
                RowOutcome::Failed(detail) => {
                    outcome.failed += 1;
                    warn!(
                        table = table_name,
                        key = record.key(),
                        "Row skipped due to error: {}",
                        detail
                    );
                }
            }
        }
    }
    tx.commit()?;

    info!(
        "{}: {} inserted, {} updated",
        table_name, outcome.inserted, outcome.updated
    );
    if outcome.failed > 0 {
        warn!(table = table_name, failed = outcome.failed, "Rows skipped during upsert");
    }

    Ok(outcome)
}

fn upsert_row<R: Record>(
    probe: &mut Statement<'_>,
    write: &mut Statement<'_>,
    record: &R,
    key_idx: usize,
) -> RowOutcome {
    let values = record.sql_values();

    let existed = match probe.exists(params![values[key_idx]]) {
        Ok(existed) => existed,
        Err(e) => return RowOutcome::Failed(e.to_string()),
    };

    match write.execute(params_from_iter(values.iter())) {
        Ok(_) if existed => RowOutcome::Updated,
        Ok(_) => RowOutcome::Inserted,
        Err(e) => RowOutcome::Failed(e.to_string()),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{count_rows, create_tables, open_in_memory_store};
    use crate::entities::{Claim, Patient, Provider};
    use crate::schema::EntityKind;

    fn store() -> Connection {
        let conn = open_in_memory_store().unwrap();
        create_tables(&conn).unwrap();
        conn
    }

    fn stored_name(conn: &Connection, provider_id: &str) -> Option<String> {
        conn.query_row(
            "SELECT Name FROM Providers WHERE ProviderID = ?1",
            [provider_id],
            |row| row.get(0),
        )
        .unwrap()
    }

    #[test]
    fn test_insert_then_update() {
        let conn = store();

        let first = upsert(&conn, &[Provider::new("P1").with_name("A")], "Providers", "ProviderID")
            .unwrap();
        assert_eq!(first.counts(), (1, 0));

        let second = upsert(&conn, &[Provider::new("P1").with_name("B")], "Providers", "ProviderID")
            .unwrap();
        assert_eq!(second.counts(), (0, 1));
        assert_eq!(stored_name(&conn, "P1").as_deref(), Some("B"));
        assert_eq!(count_rows(&conn, EntityKind::Provider).unwrap(), 1);

        println!("✅ Insert-then-update test PASSED");
    }

    #[test]
    fn test_rerun_same_batch_is_all_updates() {
        let conn = store();
        let batch = vec![
            Patient::new("PT1").with_name("Alice"),
            Patient::new("PT2").with_date_of_birth("1990-01-01T00:00:00"),
            Patient::new("PT3").with_gender("F"),
        ];

        let first = upsert(&conn, &batch, "Patients", "PatientID").unwrap();
        assert_eq!(first.counts(), (3, 0));
        assert_eq!(first.committed(), batch.len());

        let second = upsert(&conn, &batch, "Patients", "PatientID").unwrap();
        assert_eq!(second.counts(), (0, 3));
        assert_eq!(second.failed, 0);
    }

    #[test]
    fn test_inserted_counts_only_fresh_keys() {
        let conn = store();
        upsert(&conn, &[Provider::new("P1")], "Providers", "ProviderID").unwrap();

        let batch = vec![Provider::new("P1"), Provider::new("P2"), Provider::new("P3")];
        let outcome = upsert(&conn, &batch, "Providers", "ProviderID").unwrap();

        assert_eq!(outcome.counts(), (2, 1));
        assert_eq!(outcome.committed(), batch.len());
    }

    #[test]
    fn test_dangling_reference_is_skipped_not_fatal() {
        let conn = store();
        upsert(&conn, &[Provider::new("PR1")], "Providers", "ProviderID").unwrap();
        upsert(&conn, &[Patient::new("PT1")], "Patients", "PatientID").unwrap();

        let claims = vec![
            Claim::new("C1", "PT1", "PR1").with_amount(100.0),
            Claim::new("C2", "PT1", "NOT_A_PROVIDER").with_amount(200.0),
            Claim::new("C3", "PT1", "PR1").with_status("Pending"),
        ];

        let outcome = upsert(&conn, &claims, "Claims", "ClaimID").unwrap();

        assert_eq!(outcome.counts(), (2, 0));
        assert_eq!(outcome.failed, 1);
        assert!(outcome.committed() < claims.len());
        assert_eq!(count_rows(&conn, EntityKind::Claim).unwrap(), 2);

        let missing: i64 = conn
            .query_row("SELECT COUNT(*) FROM Claims WHERE ClaimID = 'C2'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(missing, 0);

        println!("✅ Dangling reference skipped, batch continued");
    }

    #[test]
    fn test_repeated_key_within_batch() {
        let conn = store();
        let batch = vec![
            Provider::new("P1").with_name("Old"),
            Provider::new("P1").with_name("New"),
        ];

        let outcome = upsert(&conn, &batch, "Providers", "ProviderID").unwrap();

        assert_eq!(outcome.counts(), (1, 1));
        assert_eq!(stored_name(&conn, "P1").as_deref(), Some("New"));
    }

    #[test]
    fn test_empty_batch() {
        let conn = store();
        let outcome = upsert(&conn, &Vec::<Provider>::new(), "Providers", "ProviderID").unwrap();
        assert_eq!(outcome, UpsertOutcome::default());
    }

    #[test]
    fn test_setup_errors_are_fatal() {
        let conn = store();
        let batch = vec![Provider::new("P1")];

        assert!(matches!(
            upsert(&conn, &batch, "Providers; --", "ProviderID"),
            Err(EtlError::InvalidIdentifier(_))
        ));
        assert!(matches!(
            upsert(&conn, &batch, "Providers", "PatientID"),
            Err(EtlError::UnknownColumn { .. })
        ));
        assert!(matches!(
            upsert(&conn, &batch, "NoSuchTable", "ProviderID"),
            Err(EtlError::Database(_))
        ));
    }

    #[test]
    fn test_build_upsert_sql() {
        let sql = build_upsert_sql("Providers", &["ProviderID", "Name", "City"], "ProviderID");
        assert_eq!(
            sql,
            "INSERT INTO Providers (ProviderID, Name, City) VALUES (?1, ?2, ?3) \
             ON CONFLICT(ProviderID) DO UPDATE SET Name = excluded.Name, City = excluded.City"
        );

        let key_only = build_upsert_sql("Keys", &["Id"], "Id");
        assert!(key_only.ends_with("ON CONFLICT(Id) DO NOTHING"));
    }
}
