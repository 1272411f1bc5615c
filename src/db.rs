// 🗄️ Target Store - SQLite connection, schema and integrity checks

use crate::error::{EtlError, Result};
use crate::schema::EntityKind;
use rusqlite::Connection;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// Open the store with foreign-key enforcement on for the whole connection
pub fn open_store(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let conn = Connection::open(path)?;
    enable_foreign_keys(&conn)?;
    info!(path = %path.display(), "Opened target store");
    Ok(conn)
}

/// In-memory store, same setup as `open_store`
pub fn open_in_memory_store() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    enable_foreign_keys(&conn)?;
    Ok(conn)
}

pub fn enable_foreign_keys(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    if !foreign_keys_enabled(conn)? {
        return Err(EtlError::Store(
            "SQLite refused to enable foreign key enforcement".to_string(),
        ));
    }
    Ok(())
}

pub fn foreign_keys_enabled(conn: &Connection) -> Result<bool> {
    let enabled: i64 = conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0))?;
    Ok(enabled == 1)
}

/// Create Providers, Patients and Claims if they do not exist yet
pub fn create_tables(conn: &Connection) -> Result<()> {
    for kind in EntityKind::LOAD_ORDER {
        conn.execute(kind.create_table_sql(), [])?;
        debug!(table = kind.table(), "Ensured table exists");
    }
    Ok(())
}

/// Accept plain SQL identifiers only: a letter or underscore, then letters, digits, underscores
pub fn validate_identifier(name: &str) -> Result<&str> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };

    if valid {
        Ok(name)
    } else {
        Err(EtlError::InvalidIdentifier(name.to_string()))
    }
}

pub fn count_rows(conn: &Connection, kind: EntityKind) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM {}", kind.table());
    let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
    Ok(count)
}

/// Claims whose PatientID or ProviderID has no matching parent row
pub fn count_orphan_claims(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM Claims
         WHERE PatientID NOT IN (SELECT PatientID FROM Patients)
            OR ProviderID NOT IN (SELECT ProviderID FROM Providers)",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}

// ============================================================================
// INTEGRITY REPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntegrityReport {
    pub providers: i64,
    pub patients: i64,
    pub claims: i64,
    pub foreign_keys_enabled: bool,
    pub orphan_claims: i64,
}

impl IntegrityReport {
    /// Every table populated, enforcement on, no dangling claim references
    pub fn is_healthy(&self) -> bool {
        self.providers > 0
            && self.patients > 0
            && self.claims > 0
            && self.foreign_keys_enabled
            && self.orphan_claims == 0
    }
}

pub fn integrity_report(conn: &Connection) -> Result<IntegrityReport> {
    Ok(IntegrityReport {
        providers: count_rows(conn, EntityKind::Provider)?,
        patients: count_rows(conn, EntityKind::Patient)?,
        claims: count_rows(conn, EntityKind::Claim)?,
        foreign_keys_enabled: foreign_keys_enabled(conn)?,
        orphan_claims: count_orphan_claims(conn)?,
    })
}
