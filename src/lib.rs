//! # facturamx
//!
//! CFDI ingestion and validation pipeline: parse a stamped Mexican tax
//! invoice, reconcile its amounts, check the fiscal stamp against the SAT
//! ConsultaCFDI service, cross-check the printed QR payload, and only then
//! admit the expense record for persistence.
//!
//! All monetary values use [`rust_decimal::Decimal`] — never floating point.
//!
//! ## Quick Start
//!
//! ```rust
//! use facturamx::core::*;
//! use rust_decimal_macros::dec;
//!
//! let r = reconcile(dec!(195.00), dec!(31.20), dec!(0), dec!(226.20));
//! assert!(r.within_tolerance);
//! assert_eq!(r.computed_total, dec!(226.20));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Invoice model, expense record, reconciliation |
//! | `cfdi` | CFDI 3.3 / 4.0 XML parsing |
//! | `sat` | SAT ConsultaCFDI status client |
//! | `qr` | QR verification payload extraction & cross-validation |
//! | `fallback` | Best-effort field extraction for unstamped receipts |
//! | `ingest` | Ingestion state machine and async driver |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "cfdi")]
pub mod cfdi;

#[cfg(feature = "sat")]
pub mod sat;

#[cfg(feature = "qr")]
pub mod qr;

#[cfg(feature = "fallback")]
pub mod fallback;

#[cfg(feature = "ingest")]
pub mod ingest;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
