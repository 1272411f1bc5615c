// 🏗️ Sheet Parsers - Spreadsheet files into raw tables
// One parser per file family, picked by extension

use crate::error::{EtlError, Result};
use crate::table::{Cell, RawTable};
use calamine::{open_workbook_auto, Data, Reader};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{error, info};

// ============================================================================
// CORE TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceFormat {
    /// Comma-separated text with a header row
    Csv,

    /// Excel / OpenDocument workbook (xlsx, xlsm, xls, xlsb, ods)
    Workbook,
}

impl SourceFormat {
    pub fn name(&self) -> &str {
        match self {
            SourceFormat::Csv => "CSV",
            SourceFormat::Workbook => "Workbook",
        }
    }
}

/// SheetParser - read a tabular file whose first row is the header
pub trait SheetParser: Send + Sync {
    fn parse(&self, file_path: &Path) -> Result<RawTable>;

    fn format(&self) -> SourceFormat;
}

pub fn detect_format(file_path: &Path) -> Result<SourceFormat> {
    let extension = file_path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => Ok(SourceFormat::Csv),
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Ok(SourceFormat::Workbook),
        _ => Err(EtlError::UnsupportedFormat(file_path.display().to_string())),
    }
}

pub fn get_parser(format: SourceFormat) -> Box<dyn SheetParser> {
    match format {
        SourceFormat::Csv => Box::new(CsvParser),
        SourceFormat::Workbook => Box::new(WorkbookParser),
    }
}

/// Detect the format and parse; errors propagate
pub fn read_table(file_path: &Path) -> Result<(RawTable, SourceFormat)> {
    let parser = get_parser(detect_format(file_path)?);
    let table = parser.parse(file_path)?;
    Ok((table, parser.format()))
}

/// Extraction step of the pipeline: a file that cannot be read is logged and
/// replaced by an empty table so the run can continue
pub fn extract_table(file_path: &Path) -> RawTable {
    match read_table(file_path) {
        Ok((table, format)) => {
            info!(
                "Loaded {} rows from {} ({})",
                table.len(),
                file_path.display(),
                format.name()
            );
            table
        }
        Err(e) => {
            error!("Error reading {}: {}", file_path.display(), e);
            RawTable::empty()
        }
    }
}

fn clean_header(header: &str) -> String {
    header.trim_start_matches('\u{feff}').trim().to_string()
}

// ============================================================================
// CSV
// ============================================================================

pub struct CsvParser;

impl SheetParser for CsvParser {
    fn parse(&self, file_path: &Path) -> Result<RawTable> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(file_path)?;

        let headers: Vec<String> = reader.headers()?.iter().map(clean_header).collect();
        let mut table = RawTable::new(headers);

        for result in reader.records() {
            let record = result?;
            let row = record
                .iter()
                .map(|value| {
                    if value.trim().is_empty() {
                        Cell::Null
                    } else {
                        Cell::Text(value.to_string())
                    }
                })
                .collect();
            table.push_row(row);
        }

        Ok(table)
    }

    fn format(&self) -> SourceFormat {
        SourceFormat::Csv
    }
}

// ============================================================================
// WORKBOOK
// ============================================================================

/// Reads the first sheet of a workbook
pub struct WorkbookParser;

impl SheetParser for WorkbookParser {
    fn parse(&self, file_path: &Path) -> Result<RawTable> {
        let mut workbook = open_workbook_auto(file_path)?;

        let sheet_names = workbook.sheet_names().to_vec();
        let sheet_name = match sheet_names.first() {
            Some(name) => name.clone(),
            None => return Ok(RawTable::empty()),
        };

        let range = workbook.worksheet_range(&sheet_name)?;
        let mut rows = range.rows();

        let headers: Vec<String> = match rows.next() {
            Some(header_row) => header_row
                .iter()
                .map(|cell| match cell {
                    Data::String(s) => clean_header(s),
                    Data::Empty => String::new(),
                    other => other.to_string(),
                })
                .collect(),
            None => return Ok(RawTable::empty()),
        };

        let mut table = RawTable::new(headers);
        for row in rows {
            table.push_row(row.iter().map(cell_from_data).collect());
        }

        Ok(table)
    }

    fn format(&self) -> SourceFormat {
        SourceFormat::Workbook
    }
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) | Data::DurationIso(_) => Cell::Null,
        Data::String(s) if s.trim().is_empty() => Cell::Null,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) => Cell::Float(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) if dt.is_datetime() => {
            dt.as_datetime().map(Cell::DateTime).unwrap_or(Cell::Null)
        }
        Data::DateTime(_) => Cell::Null,
        Data::DateTimeIso(s) => Cell::Text(s.clone()),
    }
}

// ============================================================================
// TESTS
// ============================================================================
