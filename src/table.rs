// 📋 Raw Table - Loosely typed rows as they come out of a spreadsheet
// Column alignment lives here: every entity table is projected onto its schema

use crate::normalize::to_iso_string;
use chrono::NaiveDateTime;
use serde::Serialize;

// ============================================================================
// CELL
// ============================================================================

/// One spreadsheet cell, before it is validated into a typed record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Cell {
    Null,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl Cell {
    /// Null, or text that is empty after trimming
    pub fn is_null(&self) -> bool {
        match self {
            Cell::Null => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// Text rendering used for string fields of typed records
    ///
    /// Integral floats drop the trailing `.0` so that an ID typed as a number
    /// in a workbook ("101") survives as "101" rather than "101.0".
    pub fn as_text(&self) -> Option<String> {
        if self.is_null() {
            return None;
        }

        match self {
            Cell::Null => None,
            Cell::Text(s) => Some(s.trim().to_string()),
            Cell::Int(i) => Some(i.to_string()),
            Cell::Float(f) => {
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    Some(format!("{}", *f as i64))
                } else {
                    Some(f.to_string())
                }
            }
            Cell::Bool(b) => Some(b.to_string()),
            Cell::DateTime(dt) => Some(to_iso_string(dt)),
        }
    }

    /// Numeric reading. Text is accepted with currency symbols and thousands separators.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(i) => Some(*i as f64),
            Cell::Float(f) if f.is_finite() => Some(*f),
            Cell::Text(s) => {
                let cleaned: String = s
                    .chars()
                    .filter(|c| !c.is_whitespace() && *c != '$' && *c != ',')
                    .collect();
                if cleaned.is_empty() {
                    return None;
                }
                cleaned.parse::<f64>().ok().filter(|f| f.is_finite())
            }
            _ => None,
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<Option<&str>> for Cell {
    fn from(s: Option<&str>) -> Self {
        s.map(Cell::from).unwrap_or(Cell::Null)
    }
}

// ============================================================================
// RAW TABLE
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn new(columns: Vec<String>) -> Self {
        RawTable {
            columns,
            rows: Vec::new(),
        }
    }

    /// Table with no columns and no rows (stand-in for a failed extraction)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a table from string literals; `None` becomes a null cell
    pub fn from_rows(columns: &[&str], rows: Vec<Vec<Option<&str>>>) -> Self {
        let mut table = RawTable::new(columns.iter().map(|c| c.to_string()).collect());
        for row in rows {
            table.push_row(row.into_iter().map(Cell::from).collect());
        }
        table
    }

    /// Append a row, padding with nulls or truncating to the header width
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Null);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell at (row, column name); `None` when either is out of range
    pub fn get(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    pub fn text(&self, row: usize, column: &str) -> Option<String> {
        self.get(row, column).and_then(Cell::as_text)
    }

    pub fn number(&self, row: usize, column: &str) -> Option<f64> {
        self.get(row, column).and_then(Cell::as_f64)
    }

    /// Replace every cell of `column` with `f(cell)`. Absent columns are left alone.
    pub fn map_column<F>(&mut self, column: &str, mut f: F)
    where
        F: FnMut(&Cell) -> Cell,
    {
        if let Some(idx) = self.column_index(column) {
            for row in &mut self.rows {
                row[idx] = f(&row[idx]);
            }
        }
    }

    /// Project onto `expected` columns, in that order
    ///
    /// Missing columns come back full of nulls, unexpected ones are dropped.
    /// Never fails: the output header is always exactly `expected`.
    pub fn align(self, expected: &[&str]) -> RawTable {
        let sources: Vec<Option<usize>> =
            expected.iter().map(|name| self.column_index(name)).collect();

        let rows = self
            .rows
            .into_iter()
            .map(|row| {
                sources
                    .iter()
                    .map(|src| match src {
                        Some(idx) => row[*idx].clone(),
                        None => Cell::Null,
                    })
                    .collect()
            })
            .collect();

        RawTable {
            columns: expected.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PROVIDER_COLUMNS;

    #[test]
    fn test_align_adds_missing_and_orders_columns() {
        let table = RawTable::from_rows(
            &["Name", "ProviderID"],
            vec![vec![Some("Dr. A"), Some("P001")]],
        );

        let aligned = table.align(PROVIDER_COLUMNS);

        assert_eq!(aligned.columns(), PROVIDER_COLUMNS);
        assert_eq!(aligned.get(0, "ProviderID"), Some(&Cell::from("P001")));
        assert_eq!(aligned.get(0, "Name"), Some(&Cell::from("Dr. A")));
        assert_eq!(aligned.get(0, "City"), Some(&Cell::Null));
    }

    #[test]
    fn test_align_drops_unexpected_columns() {
        let table = RawTable::from_rows(
            &["ProviderID", "Fax", "City", "Notes"],
            vec![vec![Some("P1"), Some("555"), Some("Austin"), None]],
        );

        let aligned = table.align(PROVIDER_COLUMNS);

        assert_eq!(aligned.columns(), PROVIDER_COLUMNS);
        assert!(aligned.column_index("Fax").is_none());
        assert_eq!(aligned.rows()[0].len(), PROVIDER_COLUMNS.len());
        assert_eq!(aligned.get(0, "City"), Some(&Cell::from("Austin")));
    }

    #[test]
    fn test_align_empty_table_has_expected_header() {
        let aligned = RawTable::empty().align(PROVIDER_COLUMNS);

        assert_eq!(aligned.columns(), PROVIDER_COLUMNS);
        assert!(aligned.is_empty());
    }

    #[test]
    fn test_push_row_pads_and_truncates() {
        let mut table = RawTable::new(vec!["A".to_string(), "B".to_string()]);
        table.push_row(vec![Cell::Int(1)]);
        table.push_row(vec![Cell::Int(1), Cell::Int(2), Cell::Int(3)]);

        assert_eq!(table.rows()[0], vec![Cell::Int(1), Cell::Null]);
        assert_eq!(table.rows()[1], vec![Cell::Int(1), Cell::Int(2)]);
    }

    #[test]
    fn test_cell_text_rendering() {
        assert_eq!(Cell::Float(101.0).as_text(), Some("101".to_string()));
        assert_eq!(Cell::Float(1.5).as_text(), Some("1.5".to_string()));
        assert_eq!(Cell::from("  P7 ").as_text(), Some("P7".to_string()));
        assert_eq!(Cell::from("   ").as_text(), None);
        assert_eq!(Cell::Null.as_text(), None);
    }

    #[test]
    fn test_cell_numeric_reading() {
        assert_eq!(Cell::from("$1,250.50").as_f64(), Some(1250.5));
        assert_eq!(Cell::Int(300).as_f64(), Some(300.0));
        assert_eq!(Cell::from("n/a").as_f64(), None);
        assert_eq!(Cell::Bool(true).as_f64(), None);
    }
}
