use lopdf::{Dictionary, Document, Object};

use super::payload::{QrPayload, parse_qr_payload};

/// Locate the SAT verification payload inside a PDF rendition.
///
/// Looks at link annotations first (most generators emit the QR target as a
/// clickable `/URI` action), then falls back to the recovered page text.
/// Returns `None` when no payload can be located — including unreadable
/// input — so the caller degrades to "unverified" rather than "mismatched".
pub fn extract_qr_payload(pdf_bytes: &[u8]) -> Option<QrPayload> {
    let doc = Document::load_mem(pdf_bytes).ok()?;

    extract_via_annotations(&doc).or_else(|| extract_via_text(&doc))
}

fn extract_via_annotations(doc: &Document) -> Option<QrPayload> {
    for (_, page_id) in doc.get_pages() {
        let Ok(page) = doc.get_dictionary(page_id) else {
            continue;
        };
        let Ok(annots) = page.get(b"Annots") else {
            continue;
        };
        let Some(annots) = resolve_array(doc, annots) else {
            continue;
        };

        for annot in annots {
            let Some(annot) = resolve_dict(doc, annot) else {
                continue;
            };
            let Ok(action) = annot.get(b"A") else {
                continue;
            };
            let Some(action) = resolve_dict(doc, action) else {
                continue;
            };
            let uri = action.get(b"URI").ok().and_then(obj_to_string);
            if let Some(uri) = uri {
                if looks_like_verification_url(&uri) {
                    if let Some(payload) = parse_qr_payload(&uri) {
                        return Some(payload);
                    }
                }
            }
        }
    }
    None
}

fn extract_via_text(doc: &Document) -> Option<QrPayload> {
    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    for page in pages {
        if let Ok(text) = doc.extract_text(&[page]) {
            if let Some(payload) = find_payload_in_text(&text) {
                return Some(payload);
            }
        }
    }
    None
}

/// Scan free text for an embedded verification query string.
pub(crate) fn find_payload_in_text(text: &str) -> Option<QrPayload> {
    let start = text.find("?id=").or_else(|| text.find("?re="))?;
    let tail = &text[start..];
    let end = tail
        .find(|c: char| c.is_whitespace() || c == '"' || c == '\'' || c == ')' || c == '>')
        .unwrap_or(tail.len());
    parse_qr_payload(&tail[..end])
}

fn looks_like_verification_url(uri: &str) -> bool {
    let lower = uri.to_lowercase();
    lower.contains("verificacfdi") || lower.contains("?id=") || lower.contains("&id=")
}

fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    match obj {
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        Object::Dictionary(d) => Some(d),
        _ => None,
    }
}

fn resolve_array<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Vec<Object>> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok().and_then(|o| o.as_array().ok()),
        Object::Array(a) => Some(a),
        _ => None,
    }
}

fn obj_to_string(obj: &Object) -> Option<String> {
    match obj {
        Object::String(bytes, _) => String::from_utf8(bytes.clone()).ok(),
        _ => None,
    }
}
