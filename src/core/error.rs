use thiserror::Error;

/// Errors from parsing a structured CFDI document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// A required structural element (issuer, total, …) is missing or invalid.
    #[error("malformed CFDI: {0}")]
    Malformed(String),

    /// The document declares a schema version outside the supported set.
    #[error("unsupported CFDI version: {0}")]
    UnsupportedVersion(String),
}

/// Errors from best-effort field extraction on a visual-only document.
///
/// Distinct from a SAT service error: this is a local recognition failure,
/// raised before any network call is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ExtractionError {
    /// The document yielded no recoverable text at all.
    #[error("no text could be recovered from the document")]
    NoText,

    /// A required field could not be located in the recovered text.
    #[error("could not locate {0} in the document text")]
    FieldNotFound(&'static str),

    /// The document could not be opened as a PDF.
    #[error("PDF error: {0}")]
    Pdf(String),
}
