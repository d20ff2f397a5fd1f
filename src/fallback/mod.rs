//! Best-effort field extraction for visual-only intakes.
//!
//! When no structured CFDI accompanies the receipt, the four reference
//! fields are recovered from the PDF's text and fed into the same SAT
//! check. Extraction can fail locally ([`crate::core::ExtractionError`])
//! before any network call; that failure is reported distinctly from a
//! service error.

mod scan;

pub use scan::extract_reference;

use crate::core::ExtractionError;
use crate::sat::{AuthorityClient, AuthorityValidation};

/// Extract the reference fields from a visual document and validate them
/// against the authority.
pub async fn validate_scanned<A: AuthorityClient>(
    client: &A,
    pdf_bytes: &[u8],
) -> Result<AuthorityValidation, ExtractionError> {
    let query = extract_reference(pdf_bytes)?;
    Ok(client.check(&query).await)
}
