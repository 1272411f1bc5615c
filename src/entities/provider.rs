// 🩺 Provider Entity

use super::{text_value, Record};
use crate::schema::EntityKind;
use crate::table::RawTable;
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    #[serde(rename = "ProviderID")]
    pub provider_id: String,

    #[serde(rename = "Name")]
    pub name: Option<String>,

    #[serde(rename = "Specialty")]
    pub specialty: Option<String>,

    #[serde(rename = "City")]
    pub city: Option<String>,
}

impl Provider {
    pub fn new(provider_id: impl Into<String>) -> Self {
        Provider {
            provider_id: provider_id.into(),
            name: None,
            specialty: None,
            city: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_specialty(mut self, specialty: impl Into<String>) -> Self {
        self.specialty = Some(specialty.into());
        self
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    /// Read one row of a table aligned to `PROVIDER_COLUMNS`; `None` without a ProviderID
    pub fn from_row(table: &RawTable, row: usize) -> Option<Self> {
        Some(Provider {
            provider_id: table.text(row, "ProviderID")?,
            name: table.text(row, "Name"),
            specialty: table.text(row, "Specialty"),
            city: table.text(row, "City"),
        })
    }
}

impl Record for Provider {
    const KIND: EntityKind = EntityKind::Provider;

    fn key(&self) -> &str {
        &self.provider_id
    }

    fn sql_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.provider_id.clone()),
            text_value(&self.name),
            text_value(&self.specialty),
            text_value(&self.city),
        ]
    }
}
