use lopdf::Document;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::core::{ExtractionError, is_rfc, normalize_rfc};
use crate::qr::extract_qr_payload;
use crate::sat::SatQuery;

/// Recover {uuid, issuer RFC, recipient RFC, total} from a visual document.
///
/// Prefers an embedded verification payload when one exists; otherwise
/// scans the recovered text for a UUID, two distinct RFCs (issuer listed
/// first on every rendition the SAT mandates), and a total — the amount on
/// a "Total" line, or failing that the largest amount on the page.
pub fn extract_reference(pdf_bytes: &[u8]) -> Result<SatQuery, ExtractionError> {
    // The QR payload carries all four fields; best case.
    if let Some(payload) = extract_qr_payload(pdf_bytes) {
        return Ok(SatQuery::new(
            payload.uuid,
            payload.issuer_rfc,
            payload.recipient_rfc,
            payload.total,
        ));
    }

    let doc =
        Document::load_mem(pdf_bytes).map_err(|e| ExtractionError::Pdf(e.to_string()))?;

    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    let mut text = String::new();
    for page in pages {
        if let Ok(t) = doc.extract_text(&[page]) {
            text.push_str(&t);
            text.push('\n');
        }
    }

    if text.trim().is_empty() {
        return Err(ExtractionError::NoText);
    }

    let uuid = scan_uuid(&text).ok_or(ExtractionError::FieldNotFound("uuid"))?;
    let (issuer_rfc, recipient_rfc) =
        scan_rfcs(&text).ok_or(ExtractionError::FieldNotFound("rfc"))?;
    let total = scan_total(&text).ok_or(ExtractionError::FieldNotFound("total"))?;

    Ok(SatQuery::new(uuid, issuer_rfc, recipient_rfc, total))
}

/// Find the first 8-4-4-4-12 hex token in the text.
fn scan_uuid(text: &str) -> Option<String> {
    for token in text.split(|c: char| c.is_whitespace() || c == ':' || c == ',') {
        let token = token.trim();
        if is_uuid(token) {
            return Some(token.to_uppercase());
        }
    }
    None
}

fn is_uuid(s: &str) -> bool {
    if s.len() != 36 {
        return false;
    }
    s.char_indices().all(|(i, c)| match i {
        8 | 13 | 18 | 23 => c == '-',
        _ => c.is_ascii_hexdigit(),
    })
}

/// First two distinct RFC-shaped tokens, in reading order.
fn scan_rfcs(text: &str) -> Option<(String, String)> {
    let mut first: Option<String> = None;
    for token in text.split(|c: char| !(c.is_alphanumeric() || c == '&')) {
        let candidate = normalize_rfc(token);
        if !is_rfc(&candidate) {
            continue;
        }
        match &first {
            None => first = Some(candidate),
            Some(f) if *f != candidate => return Some((f.clone(), candidate)),
            Some(_) => {}
        }
    }
    None
}

/// The amount on a line labelled "Total", else the largest amount found.
fn scan_total(text: &str) -> Option<Decimal> {
    let mut labelled: Option<Decimal> = None;
    let mut largest: Option<Decimal> = None;

    for line in text.lines() {
        let has_total_label = {
            let lower = line.to_lowercase();
            lower.contains("total") && !lower.contains("subtotal")
        };

        for amount in amounts_in(line) {
            if has_total_label && labelled.is_none() {
                labelled = Some(amount);
            }
            if largest.is_none_or(|l| amount > l) {
                largest = Some(amount);
            }
        }
    }

    labelled.or(largest)
}

/// Parse every `$1,234.56`-shaped token on a line. Only tokens with an
/// explicit decimal point count — bare integers are folios, not amounts.
fn amounts_in(line: &str) -> Vec<Decimal> {
    let mut out = Vec::new();
    for token in line.split_whitespace() {
        let cleaned: String = token
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        if !cleaned.contains('.') || cleaned.ends_with('.') {
            continue;
        }
        if let Ok(v) = Decimal::from_str(&cleaned) {
            out.push(v);
        }
    }
    out
}
