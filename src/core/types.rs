use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::reconcile::{ReconciliationResult, reconcile};

/// Supported CFDI schema generations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CfdiVersion {
    /// Anexo 20 revision 3.3 (2017).
    V33,
    /// Anexo 20 revision 4.0 (2022).
    V40,
}

impl CfdiVersion {
    /// The version string as it appears on `cfdi:Comprobante`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V33 => "3.3",
            Self::V40 => "4.0",
        }
    }

    /// Parse from the `Version` attribute value.
    pub fn from_attr(value: &str) -> Option<Self> {
        match value {
            "3.3" => Some(Self::V33),
            "4.0" => Some(Self::V40),
            _ => None,
        }
    }
}

/// Emisor: the party that issued the invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issuer {
    /// Registered name (Nombre).
    pub name: String,
    /// Tax id (RFC).
    pub rfc: String,
}

/// Receptor: the party the invoice was issued to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    /// Tax id (RFC).
    pub rfc: String,
}

/// One entry of the document-level tax breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxLine {
    /// Human-readable tax name (IVA, ISR, IEPS, or the raw SAT code).
    pub name: String,
    /// Importe.
    pub amount: Decimal,
}

/// One invoiced item (cfdi:Concepto). Order is preserved from the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concept {
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

/// TimbreFiscalDigital: present once the authority has certified the invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalStamp {
    /// The folio fiscal — globally unique per company scope.
    pub uuid: String,
}

/// A parsed CFDI. Immutable once produced by the parser; projected into an
/// [`ExpenseRecord`] by the ingestion driver and then discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cfdi {
    pub version: CfdiVersion,
    pub serie: Option<String>,
    pub folio: Option<String>,
    /// Fecha attribute on the Comprobante.
    pub issued_at: Option<NaiveDateTime>,
    /// Moneda attribute; MXN on the vast majority of documents.
    pub currency: Option<String>,
    pub issuer: Issuer,
    pub recipient: Recipient,
    pub subtotal: Decimal,
    pub total: Decimal,
    /// Document-level traslados (transferred taxes).
    pub taxes_transferred: Vec<TaxLine>,
    /// Document-level retenciones (withheld taxes).
    pub taxes_withheld: Vec<TaxLine>,
    /// TotalImpuestosTrasladados when declared.
    pub total_transferred: Option<Decimal>,
    /// TotalImpuestosRetenidos when declared.
    pub total_withheld: Option<Decimal>,
    pub concepts: Vec<Concept>,
    /// Absent means the document is not yet stamped by the authority.
    pub stamp: Option<FiscalStamp>,
}

impl Cfdi {
    /// Total transferred tax: the declared total when present, otherwise the
    /// sum of the breakdown lines.
    pub fn tax_total(&self) -> Decimal {
        self.total_transferred
            .unwrap_or_else(|| self.taxes_transferred.iter().map(|t| t.amount).sum())
    }

    /// Total withheld tax, same resolution rule as [`Cfdi::tax_total`].
    pub fn withheld_total(&self) -> Decimal {
        self.total_withheld
            .unwrap_or_else(|| self.taxes_withheld.iter().map(|t| t.amount).sum())
    }

    /// Reconcile the document's own amounts. Retenciones reduce the total,
    /// so they enter the sum negated.
    pub fn reconciliation(&self) -> ReconciliationResult {
        reconcile(
            self.subtotal,
            self.tax_total(),
            -self.withheld_total(),
            self.total,
        )
    }

    /// The fiscal stamp UUID, if the document is stamped.
    pub fn uuid(&self) -> Option<&str> {
        self.stamp.as_ref().map(|s| s.uuid.as_str())
    }
}

/// Validation status carried on a persisted expense record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationStatus {
    /// Not yet checked against the authority.
    Pending,
    /// Authority reported the invoice as vigente.
    Correct,
    /// Admitted under an override (e.g. authority indexing lag) — flagged
    /// for a later manual re-check.
    NeedsReview,
}

/// Payment status of an expense record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Paid,
}

/// The persisted business entity produced by an admitted ingestion.
///
/// Created by the ingestion driver after the final gate passes; owned by the
/// persistence collaborator thereafter and mutated only through explicit
/// update calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub provider_id: String,
    pub concept: String,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub withholdings: Decimal,
    pub total: Decimal,
    pub expense_date: NaiveDate,
    pub payment_method_id: String,
    pub executive_id: String,
    pub validation_status: ValidationStatus,
    pub payment_status: PaymentStatus,
    /// Invoice folio (serie + folio, or the fiscal UUID for fallback intakes).
    pub folio: Option<String>,
    /// Public URL of the stored supporting document.
    pub document_url: Option<String>,
    /// Year-month the expense belongs to, `YYYY-MM`.
    pub period: String,
}

/// Format the `YYYY-MM` period key for an expense date.
pub fn period_for(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}
