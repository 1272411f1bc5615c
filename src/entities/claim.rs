// 🧾 Claim Entity
// Claims reference a patient and a provider; rows missing either are dropped
// during cleaning and reported as `DroppedClaim`.

use super::{real_value, text_value, Record};
use crate::schema::EntityKind;
use crate::table::RawTable;
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    #[serde(rename = "ClaimID")]
    pub claim_id: String,

    #[serde(rename = "PatientID")]
    pub patient_id: String,

    #[serde(rename = "ProviderID")]
    pub provider_id: String,

    /// ISO-8601 date-time, already normalized
    #[serde(rename = "ServiceDate")]
    pub service_date: Option<String>,

    #[serde(rename = "ClaimAmount")]
    pub claim_amount: Option<f64>,

    #[serde(rename = "Status")]
    pub status: Option<String>,
}

// ============================================================================
// DROPPED CLAIMS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropReason {
    /// PatientID or ProviderID is null
    MissingReference,

    /// ClaimID is null (references present)
    MissingClaimId,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::MissingReference => "Missing PatientID or ProviderID",
            DropReason::MissingClaimId => "Missing ClaimID",
        }
    }
}

/// Whatever could be read from a rejected claim row, kept for the drop log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroppedClaim {
    pub reason: DropReason,
    pub claim_id: Option<String>,
    pub patient_id: Option<String>,
    pub provider_id: Option<String>,
    pub service_date: Option<String>,
    pub status: Option<String>,
}

// ============================================================================
// CLAIM
// ============================================================================

impl Claim {
    pub fn new(
        claim_id: impl Into<String>,
        patient_id: impl Into<String>,
        provider_id: impl Into<String>,
    ) -> Self {
        Claim {
            claim_id: claim_id.into(),
            patient_id: patient_id.into(),
            provider_id: provider_id.into(),
            service_date: None,
            claim_amount: None,
            status: None,
        }
    }

    pub fn with_service_date(mut self, service_date: impl Into<String>) -> Self {
        self.service_date = Some(service_date.into());
        self
    }

    pub fn with_amount(mut self, amount: f64) -> Self {
        self.claim_amount = Some(amount);
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Read one row of a normalized table aligned to `CLAIM_COLUMNS`
    ///
    /// Missing references take precedence over a missing ClaimID when both apply.
    pub fn from_row(table: &RawTable, row: usize) -> Result<Self, DroppedClaim> {
        let claim_id = table.text(row, "ClaimID");
        let patient_id = table.text(row, "PatientID");
        let provider_id = table.text(row, "ProviderID");
        let service_date = table.text(row, "ServiceDate");
        let status = table.text(row, "Status");

        match (claim_id, patient_id, provider_id) {
            (Some(claim_id), Some(patient_id), Some(provider_id)) => Ok(Claim {
                claim_id,
                patient_id,
                provider_id,
                service_date,
                claim_amount: table.number(row, "ClaimAmount"),
                status,
            }),
            (claim_id, patient_id, provider_id) => {
                let reason = if patient_id.is_none() || provider_id.is_none() {
                    DropReason::MissingReference
                } else {
                    DropReason::MissingClaimId
                };
                Err(DroppedClaim {
                    reason,
                    claim_id,
                    patient_id,
                    provider_id,
                    service_date,
                    status,
                })
            }
        }
    }
}

impl Record for Claim {
    const KIND: EntityKind = EntityKind::Claim;

    fn key(&self) -> &str {
        &self.claim_id
    }

    fn sql_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.claim_id.clone()),
            Value::Text(self.patient_id.clone()),
            Value::Text(self.provider_id.clone()),
            text_value(&self.service_date),
            real_value(self.claim_amount),
            text_value(&self.status),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::CLAIM_COLUMNS;

    fn claims_table() -> RawTable {
        RawTable::from_rows(
            CLAIM_COLUMNS,
            vec![
                vec![Some("C1"), Some("PT1"), Some("PR1"), None, Some("$1,200.00"), Some("Approved")],
                vec![Some("C2"), None, Some("PR1"), None, Some("50"), Some("Denied")],
                vec![None, Some("PT1"), Some("PR1"), None, None, None],
                vec![None, None, None, None, None, Some("Pending")],
            ],
        )
    }

    #[test]
    fn test_from_row_valid_claim() {
        let claim = Claim::from_row(&claims_table(), 0).unwrap();

        assert_eq!(claim.claim_id, "C1");
        assert_eq!(claim.claim_amount, Some(1200.0));
        assert_eq!(claim.status.as_deref(), Some("Approved"));
    }

    #[test]
    fn test_from_row_drop_reasons() {
        let table = claims_table();

        let missing_patient = Claim::from_row(&table, 1).unwrap_err();
        assert_eq!(missing_patient.reason, DropReason::MissingReference);
        assert_eq!(missing_patient.claim_id.as_deref(), Some("C2"));
        assert_eq!(missing_patient.status.as_deref(), Some("Denied"));

        let missing_id = Claim::from_row(&table, 2).unwrap_err();
        assert_eq!(missing_id.reason, DropReason::MissingClaimId);

        let missing_everything = Claim::from_row(&table, 3).unwrap_err();
        assert_eq!(missing_everything.reason, DropReason::MissingReference);
    }
}
