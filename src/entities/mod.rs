// Entity Models - Provider, Patient, Claim
// Fixed-schema records built from aligned rows. A record that exists here
// already carries its primary key; rows without one never become records.

pub mod provider;
pub mod patient;
pub mod claim;

pub use provider::Provider;
pub use patient::Patient;
pub use claim::{Claim, DropReason, DroppedClaim};

use crate::schema::EntityKind;
use rusqlite::types::Value;

/// A typed row that can be written to its table
///
/// `sql_values` follows `KIND.columns()` order exactly.
pub trait Record {
    const KIND: EntityKind;

    /// Primary key value
    fn key(&self) -> &str;

    fn sql_values(&self) -> Vec<Value>;
}

pub(crate) fn text_value(value: &Option<String>) -> Value {
    match value {
        Some(s) => Value::Text(s.clone()),
        None => Value::Null,
    }
}

pub(crate) fn real_value(value: Option<f64>) -> Value {
    match value {
        Some(f) => Value::Real(f),
        None => Value::Null,
    }
}
