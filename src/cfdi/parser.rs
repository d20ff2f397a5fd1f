use chrono::NaiveDateTime;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::core::*;

/// Parse a CFDI XML document into a [`Cfdi`].
///
/// Accepts schema generations 3.3 and 4.0; anything else is
/// [`ParseError::UnsupportedVersion`]. Matching is on local element names,
/// so non-standard namespace prefixes are tolerated. Declared amounts are
/// preserved exactly as written.
pub fn parse_cfdi(xml: &str) -> Result<Cfdi, ParseError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut p = CfdiParsed::default();
    let mut path: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = local_name(e);
                p.handle_element(&path, &name, e)?;
                path.push(name);
            }
            Ok(Event::Empty(ref e)) => {
                // Self-closing elements carry all their data in attributes.
                let name = local_name(e);
                p.handle_element(&path, &name, e)?;
            }
            Ok(Event::End(_)) => {
                path.pop();
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::Malformed(format!("XML error: {e}"))),
            _ => {}
        }
    }

    p.into_cfdi()
}

fn local_name(e: &BytesStart<'_>) -> String {
    let raw = e.name();
    std::str::from_utf8(raw.local_name().as_ref())
        .unwrap_or("")
        .to_string()
}

fn attr_value(e: &BytesStart<'_>, key: &str) -> Option<String> {
    for attr in e.attributes().flatten() {
        let name = attr.key;
        let local_name = name.local_name();
        let local = std::str::from_utf8(local_name.as_ref()).unwrap_or("");
        if local == key {
            return std::str::from_utf8(&attr.value).ok().map(str::to_string);
        }
    }
    None
}

fn parse_amount(raw: &str, field: &str) -> Result<Decimal, ParseError> {
    Decimal::from_str(raw)
        .map_err(|_| ParseError::Malformed(format!("{field} is not a valid amount: '{raw}'")))
}

/// Resolve a SAT impuesto code to its common name.
fn tax_name(code: &str) -> String {
    match code {
        "001" => "ISR".to_string(),
        "002" => "IVA".to_string(),
        "003" => "IEPS".to_string(),
        other => other.to_string(),
    }
}

#[derive(Default)]
struct CfdiParsed {
    version: Option<String>,
    serie: Option<String>,
    folio: Option<String>,
    issued_at: Option<String>,
    currency: Option<String>,
    subtotal: Option<String>,
    total: Option<String>,

    issuer_rfc: Option<String>,
    issuer_name: Option<String>,
    recipient_rfc: Option<String>,

    taxes_transferred: Vec<TaxLine>,
    taxes_withheld: Vec<TaxLine>,
    total_transferred: Option<String>,
    total_withheld: Option<String>,

    concepts: Vec<Concept>,
    uuid: Option<String>,
}

impl CfdiParsed {
    fn handle_element(
        &mut self,
        path: &[String],
        name: &str,
        e: &BytesStart<'_>,
    ) -> Result<(), ParseError> {
        let in_comprobante = path.first().is_some_and(|p| p == "Comprobante");
        let parent_is_comprobante = path.len() == 1 && in_comprobante;
        let in_concepto = path.iter().any(|p| p == "Concepto");

        match name {
            "Comprobante" if path.is_empty() => {
                self.version = attr_value(e, "Version").or_else(|| attr_value(e, "version"));
                self.serie = attr_value(e, "Serie");
                self.folio = attr_value(e, "Folio");
                self.issued_at = attr_value(e, "Fecha");
                self.currency = attr_value(e, "Moneda");
                self.subtotal = attr_value(e, "SubTotal").or_else(|| attr_value(e, "subTotal"));
                self.total = attr_value(e, "Total").or_else(|| attr_value(e, "total"));
            }
            // The nómina complement carries its own Emisor/Receptor; only the
            // Comprobante-level parties identify the invoice.
            "Emisor" if parent_is_comprobante => {
                self.issuer_rfc = attr_value(e, "Rfc").or_else(|| attr_value(e, "rfc"));
                self.issuer_name = attr_value(e, "Nombre").or_else(|| attr_value(e, "nombre"));
            }
            "Receptor" if parent_is_comprobante => {
                self.recipient_rfc = attr_value(e, "Rfc").or_else(|| attr_value(e, "rfc"));
            }
            "Concepto" => {
                let description = attr_value(e, "Descripcion").unwrap_or_default();
                let quantity = attr_value(e, "Cantidad")
                    .map(|v| parse_amount(&v, "Concepto.Cantidad"))
                    .transpose()?
                    .unwrap_or(Decimal::ONE);
                let unit_price = attr_value(e, "ValorUnitario")
                    .map(|v| parse_amount(&v, "Concepto.ValorUnitario"))
                    .transpose()?
                    .unwrap_or(Decimal::ZERO);
                self.concepts.push(Concept {
                    description,
                    quantity,
                    unit_price,
                });
            }
            // Document-level Impuestos is a direct child of Comprobante;
            // per-concept breakdowns are skipped.
            "Impuestos" if parent_is_comprobante => {
                self.total_transferred = attr_value(e, "TotalImpuestosTrasladados");
                self.total_withheld = attr_value(e, "TotalImpuestosRetenidos");
            }
            "Traslado" | "Retencion" if in_comprobante && !in_concepto => {
                let code = attr_value(e, "Impuesto").unwrap_or_default();
                let amount = attr_value(e, "Importe")
                    .map(|v| parse_amount(&v, "Impuestos.Importe"))
                    .transpose()?
                    .unwrap_or(Decimal::ZERO);
                let line = TaxLine {
                    name: tax_name(&code),
                    amount,
                };
                if name == "Traslado" {
                    self.taxes_transferred.push(line);
                } else {
                    self.taxes_withheld.push(line);
                }
            }
            "TimbreFiscalDigital" => {
                self.uuid = attr_value(e, "UUID");
            }
            _ => {}
        }

        Ok(())
    }

    fn into_cfdi(self) -> Result<Cfdi, ParseError> {
        let version_attr = self
            .version
            .ok_or_else(|| ParseError::Malformed("missing Comprobante or Version".into()))?;
        let version = CfdiVersion::from_attr(&version_attr)
            .ok_or(ParseError::UnsupportedVersion(version_attr))?;

        let issuer_rfc = self
            .issuer_rfc
            .ok_or_else(|| ParseError::Malformed("missing Emisor Rfc".into()))?;
        let issuer_name = self
            .issuer_name
            .ok_or_else(|| ParseError::Malformed("missing Emisor Nombre".into()))?;
        let recipient_rfc = self
            .recipient_rfc
            .ok_or_else(|| ParseError::Malformed("missing Receptor Rfc".into()))?;

        let subtotal = self
            .subtotal
            .ok_or_else(|| ParseError::Malformed("missing SubTotal".into()))
            .and_then(|v| parse_amount(&v, "SubTotal"))?;
        let total = self
            .total
            .ok_or_else(|| ParseError::Malformed("missing Total".into()))
            .and_then(|v| parse_amount(&v, "Total"))?;

        let total_transferred = self
            .total_transferred
            .map(|v| parse_amount(&v, "TotalImpuestosTrasladados"))
            .transpose()?;
        let total_withheld = self
            .total_withheld
            .map(|v| parse_amount(&v, "TotalImpuestosRetenidos"))
            .transpose()?;

        let issued_at = self
            .issued_at
            .and_then(|v| NaiveDateTime::parse_from_str(&v, "%Y-%m-%dT%H:%M:%S").ok());

        Ok(Cfdi {
            version,
            serie: self.serie,
            folio: self.folio,
            issued_at,
            currency: self.currency,
            issuer: Issuer {
                name: issuer_name,
                rfc: normalize_rfc(&issuer_rfc),
            },
            recipient: Recipient {
                rfc: normalize_rfc(&recipient_rfc),
            },
            subtotal,
            total,
            taxes_transferred: self.taxes_transferred,
            taxes_withheld: self.taxes_withheld,
            total_transferred,
            total_withheld,
            concepts: self.concepts,
            stamp: self.uuid.map(|uuid| FiscalStamp { uuid }),
        })
    }
}
