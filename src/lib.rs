// Healthcare ETL - Core Library
// Providers, patients and claims from spreadsheets into SQLite, with upserts

pub mod error;
pub mod config;
pub mod logging;
pub mod schema;
pub mod table;
pub mod normalize;
pub mod entities;
pub mod deduplication;
pub mod cleaning;
pub mod parser;
pub mod db;
pub mod upsert;
pub mod pipeline;

// Re-export commonly used types
pub use error::{EtlError, Result};
pub use config::{Settings, FilesConfig, DatabaseConfig, LoggingConfig};
pub use schema::{EntityKind, PROVIDER_COLUMNS, PATIENT_COLUMNS, CLAIM_COLUMNS};
pub use table::{Cell, RawTable};
pub use normalize::{normalize_dates, parse_datetime, to_iso_string};
pub use entities::{Provider, Patient, Claim, DroppedClaim, DropReason, Record};
pub use deduplication::{dedup_keep_last, Deduplicated};
pub use cleaning::{clean_providers, clean_patients, clean_claims, Cleaned, CleanedClaims};
pub use parser::{SheetParser, SourceFormat, detect_format, get_parser, read_table, extract_table};
pub use db::{open_store, create_tables, integrity_report, IntegrityReport};
pub use upsert::{upsert, UpsertOutcome};
pub use pipeline::{run, run_with_connection, PipelineSummary, EntitySummary};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
