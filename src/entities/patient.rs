// 🧑 Patient Entity

use super::{text_value, Record};
use crate::schema::EntityKind;
use crate::table::RawTable;
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    #[serde(rename = "PatientID")]
    pub patient_id: String,

    #[serde(rename = "Name")]
    pub name: Option<String>,

    /// ISO-8601 date-time, already normalized
    #[serde(rename = "DateOfBirth")]
    pub date_of_birth: Option<String>,

    #[serde(rename = "Gender")]
    pub gender: Option<String>,
}

impl Patient {
    pub fn new(patient_id: impl Into<String>) -> Self {
        Patient {
            patient_id: patient_id.into(),
            name: None,
            date_of_birth: None,
            gender: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_date_of_birth(mut self, date_of_birth: impl Into<String>) -> Self {
        self.date_of_birth = Some(date_of_birth.into());
        self
    }

    pub fn with_gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = Some(gender.into());
        self
    }

    /// Read one row of a normalized table aligned to `PATIENT_COLUMNS`
    pub fn from_row(table: &RawTable, row: usize) -> Option<Self> {
        Some(Patient {
            patient_id: table.text(row, "PatientID")?,
            name: table.text(row, "Name"),
            date_of_birth: table.text(row, "DateOfBirth"),
            gender: table.text(row, "Gender"),
        })
    }
}

impl Record for Patient {
    const KIND: EntityKind = EntityKind::Patient;

    fn key(&self) -> &str {
        &self.patient_id
    }

    fn sql_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.patient_id.clone()),
            text_value(&self.name),
            text_value(&self.date_of_birth),
            text_value(&self.gender),
        ]
    }
}
