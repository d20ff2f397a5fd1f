use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::core::{Cfdi, TOLERANCE};

/// Decoded QR verification payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrPayload {
    pub uuid: String,
    pub issuer_rfc: String,
    pub recipient_rfc: String,
    pub total: Decimal,
    /// Last characters of the digital seal (`fe` parameter).
    pub signature_fragment: Option<String>,
}

/// Reference fields taken from the structured invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrReference {
    pub uuid: String,
    pub issuer_rfc: String,
    pub recipient_rfc: String,
    pub total: Decimal,
}

impl QrReference {
    /// Build the reference from a parsed CFDI. `None` when the document is
    /// unstamped — there is no UUID to verify against.
    pub fn from_cfdi(cfdi: &Cfdi) -> Option<Self> {
        Some(Self {
            uuid: cfdi.uuid()?.to_string(),
            issuer_rfc: cfdi.issuer.rfc.clone(),
            recipient_rfc: cfdi.recipient.rfc.clone(),
            total: cfdi.total,
        })
    }
}

/// Outcome of comparing a QR payload against the structured invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossValidationResult {
    /// True only when all four fields match.
    pub is_valid: bool,
    /// True when a located payload mismatches. False when no payload was
    /// found at all: absence of proof is not proof of fraud.
    pub blocking: bool,
    /// Ordered mismatch reasons, or `["no-code-found"]`.
    pub reasons: Vec<String>,
}

/// Parse a SAT verification URL (or bare query string) into a [`QrPayload`].
///
/// Requires at least `id` and `tt`. Accepts `&amp;`-escaped separators as
/// they appear inside XML-embedded URLs, and both total encodings: plain
/// decimal (3.3+) and the legacy 17-digit zero-padded form with six implied
/// decimals.
pub fn parse_qr_payload(text: &str) -> Option<QrPayload> {
    let query = text.split_once('?').map_or(text, |(_, q)| q);
    let query = query.replace("&amp;", "&");

    let mut uuid = None;
    let mut re = None;
    let mut rr = None;
    let mut tt = None;
    let mut fe = None;

    for pair in query.split('&') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        match key {
            "id" => uuid = Some(value.to_string()),
            "re" => re = Some(value.to_string()),
            "rr" => rr = Some(value.to_string()),
            "tt" => tt = parse_total(value),
            "fe" => fe = Some(value.to_string()),
            _ => {}
        }
    }

    Some(QrPayload {
        uuid: uuid?,
        issuer_rfc: re.unwrap_or_default(),
        recipient_rfc: rr.unwrap_or_default(),
        total: tt?,
        signature_fragment: fe,
    })
}

fn parse_total(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    if raw.len() == 17 && raw.chars().all(|c| c.is_ascii_digit()) {
        // Legacy form: 10 integer digits + 6 decimals, no point.
        let (int, frac) = raw.split_at(11);
        return Decimal::from_str(&format!("{int}.{frac}")).ok();
    }
    Decimal::from_str(raw).ok()
}

/// Compare a decoded payload against the structured invoice's fields.
///
/// Identifiers use trimmed, ASCII-case-insensitive equality; the total uses
/// the same 0.01 tolerance as reconciliation. Every mismatching field is
/// reported, in document order, not just the first.
pub fn cross_validate(payload: Option<&QrPayload>, reference: &QrReference) -> CrossValidationResult {
    let Some(payload) = payload else {
        return CrossValidationResult {
            is_valid: false,
            blocking: false,
            reasons: vec!["no-code-found".to_string()],
        };
    };

    let mut reasons = Vec::new();

    if !ident_eq(&payload.uuid, &reference.uuid) {
        reasons.push("uuid-mismatch".to_string());
    }
    if !payload.issuer_rfc.is_empty() && !ident_eq(&payload.issuer_rfc, &reference.issuer_rfc) {
        reasons.push("issuer-rfc-mismatch".to_string());
    }
    if !payload.recipient_rfc.is_empty()
        && !ident_eq(&payload.recipient_rfc, &reference.recipient_rfc)
    {
        reasons.push("recipient-rfc-mismatch".to_string());
    }
    if (payload.total - reference.total).abs() > TOLERANCE {
        reasons.push("total-mismatch".to_string());
    }

    CrossValidationResult {
        is_valid: reasons.is_empty(),
        blocking: !reasons.is_empty(),
        reasons,
    }
}

fn ident_eq(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}
