//! CFDI 3.3 / 4.0 parsing.
//!
//! Decodes the SAT Anexo 20 XML grammar into a typed [`crate::core::Cfdi`].
//! Pure over its input: same bytes, same result, no I/O.
//!
//! # Example
//!
//! ```ignore
//! use facturamx::cfdi::parse_cfdi;
//!
//! let cfdi = parse_cfdi(&xml)?;
//! assert!(cfdi.reconciliation().within_tolerance);
//! ```

mod parser;

pub use parser::parse_cfdi;
