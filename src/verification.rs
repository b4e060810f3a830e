//! Posting verification: matches extracted document text against the
//! posting's own metadata. Text extraction (OCR) happens outside this
//! server; the endpoint receives the extracted text.

use sqlx::PgPool;

use crate::error::Result;
use crate::models::{Posting, VerificationStatus};

/// Result of matching a document against a posting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// The document names the posting; verified immediately
    Approved,
    /// The document could not be matched; queued for manual review
    Pending,
}

impl VerificationOutcome {
    pub fn verified(self) -> bool {
        matches!(self, VerificationOutcome::Approved)
    }

    pub fn status(self) -> VerificationStatus {
        match self {
            VerificationOutcome::Approved => VerificationStatus::Approved,
            VerificationOutcome::Pending => VerificationStatus::Pending,
        }
    }
}

/// Match extracted document text against posting metadata
///
/// The document must name either the posting together with its region, or
/// the district together with the street address. Comparison is
/// case-insensitive.
pub fn evaluate_document(
    name: &str,
    region: &str,
    district: &str,
    address: &str,
    document_text: &str,
) -> VerificationOutcome {
    let text = document_text.to_lowercase();
    let name = name.to_lowercase();
    let region = region.to_lowercase();
    let district = district.to_lowercase();
    let address = address.to_lowercase();

    if (text.contains(&name) && text.contains(&region))
        || (text.contains(&district) && text.contains(&address))
    {
        VerificationOutcome::Approved
    } else {
        VerificationOutcome::Pending
    }
}

/// Evaluate a submitted document and persist the outcome on the posting
pub async fn process_submission(
    pool: &PgPool,
    posting: &Posting,
    document_text: &str,
) -> Result<VerificationOutcome> {
    let outcome = evaluate_document(
        &posting.name,
        &posting.region,
        &posting.district,
        &posting.address,
        document_text,
    );

    sqlx::query(
        "UPDATE postings SET verified = $2, verification_status = $3, updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(posting.id)
    .bind(outcome.verified())
    .bind(outcome.status())
    .execute(pool)
    .await?;

    match outcome {
        VerificationOutcome::Approved => {
            tracing::info!("Document verified posting {} ({})", posting.id, posting.name);
        }
        VerificationOutcome::Pending => {
            tracing::info!(
                "Could not verify posting {} ({}), pending manual review",
                posting.id,
                posting.name
            );
        }
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAME: &str = "Unity College";
    const REGION: &str = "Lagos";
    const DISTRICT: &str = "Ikeja";
    const ADDRESS: &str = "12 College Road";

    fn evaluate(text: &str) -> VerificationOutcome {
        evaluate_document(NAME, REGION, DISTRICT, ADDRESS, text)
    }

    #[test]
    fn test_name_and_region_approves() {
        let outcome = evaluate("Placement letter for UNITY COLLEGE, Lagos State");
        assert_eq!(outcome, VerificationOutcome::Approved);
        assert!(outcome.verified());
    }

    #[test]
    fn test_district_and_address_approves() {
        let outcome = evaluate("Clearance issued at 12 college road, Ikeja LGA");
        assert_eq!(outcome, VerificationOutcome::Approved);
    }

    #[test]
    fn test_partial_match_is_pending() {
        // Name without region
        assert_eq!(
            evaluate("To whom it may concern: Unity College"),
            VerificationOutcome::Pending
        );
        // Region without name
        assert_eq!(
            evaluate("Issued in Lagos on behalf of the directorate"),
            VerificationOutcome::Pending
        );
    }

    #[test]
    fn test_unrelated_text_is_pending() {
        let outcome = evaluate("completely unrelated scan");
        assert_eq!(outcome, VerificationOutcome::Pending);
        assert!(!outcome.verified());
        assert_eq!(outcome.status(), VerificationStatus::Pending);
    }
}
