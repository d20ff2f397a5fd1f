//! QR verification payload extraction and cross-validation.
//!
//! The printed rendition of a CFDI carries a QR code encoding the SAT
//! verification URL (`?id=…&re=…&rr=…&tt=…&fe=…`). This module locates
//! that payload inside the PDF and compares it field by field against the
//! structured document. A proven mismatch blocks ingestion; a payload that
//! cannot be located only degrades to "unverified".

mod extract;
mod payload;

pub use extract::extract_qr_payload;
pub use payload::{CrossValidationResult, QrPayload, QrReference, cross_validate, parse_qr_payload};
