//! SAT ConsultaCFDI status validation.
//!
//! Checks a stamped invoice against the SAT's public consultation service
//! and classifies the outcome into a closed [`AuthorityStatus`] set. One
//! outbound call, no automatic retries: a failed call surfaces as
//! `ServiceError` and re-validation is a user-triggered action.
//!
//! # Example
//!
//! ```ignore
//! use facturamx::sat::*;
//!
//! let query = SatQuery::new(uuid, issuer_rfc, recipient_rfc, total);
//! let validation = SatClient::new().check(&query).await;
//! assert!(validation.status.allow_persist(false));
//! ```

mod consulta;
mod status;

pub use consulta::{SatClient, check_sat};
pub use status::{AuthorityClient, AuthorityStatus, AuthorityValidation, SatQuery, classify};
