use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{MAX_POSTING_ADDRESS_LEN, MAX_POSTING_NAME_LEN, SECTORS};

/// Verification lifecycle of a posting's supporting document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "verification_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    NotSubmitted,
    Pending,
    Approved,
    Rejected,
}

impl VerificationStatus {
    /// Whether a new verification document may be submitted in this state
    pub fn accepts_submission(self) -> bool {
        matches!(
            self,
            VerificationStatus::NotSubmitted | VerificationStatus::Rejected
        )
    }
}

/// Job placement posting
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Posting {
    pub id: i64,
    pub name: String,
    pub region: String,
    pub district: String,
    pub sector: String,
    pub stipend: Option<i32>,
    #[serde(rename = "accommodationAvailable")]
    pub accommodation_available: Option<bool>,
    pub description: String,
    pub contact: String,
    pub address: String,
    #[serde(rename = "postedBy")]
    pub posted_by: i64,
    #[serde(rename = "isApproved")]
    pub is_approved: bool,
    pub verified: bool,
    #[serde(rename = "verificationStatus")]
    pub verification_status: VerificationStatus,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Posting {
    /// Validate that a sector is one of the known choices
    pub fn validate_sector(sector: &str) -> bool {
        SECTORS.contains(&sector)
    }

    /// Validate the user-supplied fields of a create/edit request
    ///
    /// Returns the first problem found as a user-facing message.
    pub fn validate_fields(
        name: &str,
        region: &str,
        district: &str,
        sector: &str,
        address: &str,
        stipend: Option<i32>,
    ) -> Result<(), String> {
        if name.trim().is_empty() || name.len() > MAX_POSTING_NAME_LEN {
            return Err(format!(
                "Name is required and must be at most {} characters",
                MAX_POSTING_NAME_LEN
            ));
        }
        if region.trim().is_empty() {
            return Err("Region is required".to_string());
        }
        if district.trim().is_empty() {
            return Err("District is required".to_string());
        }
        if !Self::validate_sector(sector) {
            return Err(crate::constants::ERR_UNKNOWN_SECTOR.to_string());
        }
        if address.trim().is_empty() || address.len() > MAX_POSTING_ADDRESS_LEN {
            return Err(format!(
                "Address is required and must be at most {} characters",
                MAX_POSTING_ADDRESS_LEN
            ));
        }
        if let Some(stipend) = stipend {
            if stipend < 0 {
                return Err("Stipend cannot be negative".to_string());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_sector() {
        assert!(Posting::validate_sector("Health"));
        assert!(Posting::validate_sector("Oil and Gas"));
        assert!(!Posting::validate_sector("health"));
        assert!(!Posting::validate_sector("Aerospace"));
    }

    #[test]
    fn test_validate_fields_ok() {
        let result = Posting::validate_fields(
            "Unity College",
            "Lagos",
            "Ikeja",
            "Education",
            "12 College Road",
            Some(25_000),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_fields_rejects_blanks() {
        assert!(
            Posting::validate_fields("", "Lagos", "Ikeja", "Education", "12 College Road", None)
                .is_err()
        );
        assert!(
            Posting::validate_fields("Unity College", " ", "Ikeja", "Education", "addr", None)
                .is_err()
        );
        assert!(
            Posting::validate_fields("Unity College", "Lagos", "Ikeja", "Education", "", None)
                .is_err()
        );
    }

    #[test]
    fn test_validate_fields_rejects_negative_stipend() {
        let result = Posting::validate_fields(
            "Unity College",
            "Lagos",
            "Ikeja",
            "Education",
            "12 College Road",
            Some(-1),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_accepts_submission() {
        assert!(VerificationStatus::NotSubmitted.accepts_submission());
        assert!(VerificationStatus::Rejected.accepts_submission());
        assert!(!VerificationStatus::Pending.accepts_submission());
        assert!(!VerificationStatus::Approved.accepts_submission());
    }
}
