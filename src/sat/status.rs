use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::normalize_rfc;

/// Closed classification of a ConsultaCFDI response.
///
/// Modeled as a tagged enum rather than independent boolean flags so the
/// `Cancelled`-over-`Valid` precedence is checked exhaustively at compile
/// time instead of by the ordering of `if` chains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorityStatus {
    /// Vigente: the invoice is currently valid.
    Valid,
    /// Cancelado: terminal for this document, never overridable.
    Cancelled,
    /// The authority does not know the UUID. Blocking by default; a caller
    /// override exists for authority indexing lag.
    NotFound,
    /// Transport failure or unrecognized response. Eligible for a manual
    /// user-triggered retry.
    ServiceError(String),
}

impl AuthorityStatus {
    /// Whether a record with this status may be persisted.
    ///
    /// Only `Valid`, or `NotFound` when the caller explicitly set the
    /// override flag. `Cancelled` is never persistable.
    pub fn allow_persist(&self, override_not_found: bool) -> bool {
        match self {
            Self::Valid => true,
            Self::NotFound => override_not_found,
            Self::Cancelled | Self::ServiceError(_) => false,
        }
    }
}

/// The four fields the consultation service requires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SatQuery {
    pub uuid: String,
    pub issuer_rfc: String,
    pub recipient_rfc: String,
    pub total: Decimal,
}

impl SatQuery {
    pub fn new(
        uuid: impl Into<String>,
        issuer_rfc: impl Into<String>,
        recipient_rfc: impl Into<String>,
        total: Decimal,
    ) -> Self {
        Self {
            uuid: uuid.into(),
            issuer_rfc: normalize_rfc(&issuer_rfc.into()),
            recipient_rfc: normalize_rfc(&recipient_rfc.into()),
            total,
        }
    }

    /// Build a query from a parsed CFDI. The UUID is empty when the document
    /// is unstamped, which short-circuits the check to `missing-fields`.
    pub fn from_cfdi(cfdi: &crate::core::Cfdi) -> Self {
        Self::new(
            cfdi.uuid().unwrap_or_default(),
            cfdi.issuer.rfc.clone(),
            cfdi.recipient.rfc.clone(),
            cfdi.total,
        )
    }

    /// True when any of the four required fields is empty.
    pub fn has_missing_fields(&self) -> bool {
        self.uuid.trim().is_empty()
            || self.issuer_rfc.trim().is_empty()
            || self.recipient_rfc.trim().is_empty()
    }

    /// The `expresionImpresa` query string the service expects.
    pub fn expression(&self) -> String {
        format!(
            "?re={}&rr={}&tt={}&id={}",
            self.issuer_rfc, self.recipient_rfc, self.total, self.uuid
        )
    }
}

/// Result of one consultation call. Transient: its classification is copied
/// onto the expense record, the struct itself is not persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorityValidation {
    pub status: AuthorityStatus,
    /// Raw CodigoEstatus from the service, e.g. "S - Comprobante obtenido satisfactoriamente".
    pub raw_code: Option<String>,
    /// Human-readable detail, when the service provided one.
    pub message: Option<String>,
    /// EsCancelable flag as reported.
    pub cancelable: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl AuthorityValidation {
    /// Wrap a status with the current timestamp and no raw detail.
    pub fn from_status(status: AuthorityStatus) -> Self {
        Self {
            status,
            raw_code: None,
            message: None,
            cancelable: None,
            checked_at: Utc::now(),
        }
    }
}

/// Classify the service's response fields into an [`AuthorityStatus`].
///
/// Pure: two identical responses classify identically. The real service
/// occasionally reports a vigente estado together with a cancellation
/// estatus; cancellation takes precedence.
pub fn classify(
    codigo_estatus: Option<&str>,
    estado: Option<&str>,
    estatus_cancelacion: Option<&str>,
) -> AuthorityStatus {
    let estado = estado.unwrap_or("").trim();
    let cancel_status = estatus_cancelacion.unwrap_or("").trim();

    // Cancelled wins over Valid when both signals appear.
    if estado.eq_ignore_ascii_case("Cancelado") || cancel_status.to_lowercase().contains("cancelado")
    {
        return AuthorityStatus::Cancelled;
    }

    if estado.eq_ignore_ascii_case("Vigente") {
        return AuthorityStatus::Valid;
    }

    if estado.eq_ignore_ascii_case("No Encontrado") || estado.eq_ignore_ascii_case("No Existe") {
        return AuthorityStatus::NotFound;
    }

    // "N - 602 ..." means the expression matched nothing in the SAT index.
    if let Some(code) = codigo_estatus {
        if code.trim_start().starts_with("N - 602") {
            return AuthorityStatus::NotFound;
        }
        return AuthorityStatus::ServiceError(code.trim().to_string());
    }

    AuthorityStatus::ServiceError("unrecognized response".to_string())
}

/// Boundary for issuing consultation calls, so the ingestion driver can be
/// exercised without the network.
#[allow(async_fn_in_trait)]
pub trait AuthorityClient {
    /// Issue one consultation. Infallible at the type level: transport
    /// failures come back as `ServiceError`.
    async fn check(&self, query: &SatQuery) -> AuthorityValidation;
}
