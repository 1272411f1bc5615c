// 🗓️ Field Normalizer - Dates to ISO-8601
// Anything that looks like a date becomes "YYYY-MM-DDTHH:MM:SS", everything else becomes null

use crate::table::{Cell, RawTable};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Date-time layouts tried in order. `%.f` also matches an absent fraction.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Date-only layouts; midnight is assumed
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d-%b-%Y",
    "%d %b %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%Y%m%d",
];

/// Canonical string form: `1990-01-01T00:00:00`, with a fraction only when non-zero
pub fn to_iso_string(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
}

/// Lenient parse of a single text value
///
/// Offsets are accepted (RFC 3339) and dropped, keeping the wall-clock time.
pub fn parse_datetime_str(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    None
}

/// Date reading of a cell. Numbers and booleans are not dates.
pub fn parse_datetime(cell: &Cell) -> Option<NaiveDateTime> {
    match cell {
        Cell::DateTime(dt) => Some(*dt),
        Cell::Text(s) => parse_datetime_str(s),
        _ => None,
    }
}

/// Rewrite each of `date_columns` to ISO-8601 text; unparseable or missing values become null
///
/// Columns absent from the table are skipped. Applying this twice gives the same table.
pub fn normalize_dates(mut table: RawTable, date_columns: &[&str]) -> RawTable {
    for column in date_columns {
        table.map_column(column, |cell| match parse_datetime(cell) {
            Some(dt) => Cell::Text(to_iso_string(&dt)),
            None => Cell::Null,
        });
    }
    table
}

// ============================================================================
// TESTS
// ============================================================================
