//! Core invoice model, expense record, and reconciliation.
//!
//! This module provides the typed representation of a parsed CFDI, the
//! expense record that persists after a successful ingestion, and the
//! arithmetic reconciliation that gates persistence.

mod error;
mod reconcile;
pub mod rfc;
mod types;

pub use error::*;
pub use reconcile::*;
pub use rfc::{is_rfc, normalize_rfc};
pub use types::*;
