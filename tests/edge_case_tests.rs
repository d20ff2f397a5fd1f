#![cfg(feature = "cfdi")]

use facturamx::cfdi::parse_cfdi;
use facturamx::core::ParseError;
use rust_decimal_macros::dec;

fn minimal(extra: &str) -> String {
    format!(
        r#"<?xml version="1.0"?>
<cfdi:Comprobante xmlns:cfdi="http://www.sat.gob.mx/cfd/4" Version="4.0"
    SubTotal="100.00" Total="100.00">
  <cfdi:Emisor Rfc="AAA010101AAA" Nombre="AAA"/>
  <cfdi:Receptor Rfc="BBB010101BBB"/>
  {extra}
</cfdi:Comprobante>"#
    )
}

#[test]
fn invoice_without_taxes_reconciles_on_subtotal_alone() {
    let cfdi = parse_cfdi(&minimal("")).unwrap();
    assert_eq!(cfdi.tax_total(), dec!(0));
    assert_eq!(cfdi.withheld_total(), dec!(0));
    assert!(cfdi.concepts.is_empty());
    assert!(cfdi.reconciliation().within_tolerance);
}

#[test]
fn concept_attribute_defaults() {
    let cfdi = parse_cfdi(&minimal(
        r#"<cfdi:Conceptos><cfdi:Concepto Descripcion="Algo"/></cfdi:Conceptos>"#,
    ))
    .unwrap();
    assert_eq!(cfdi.concepts[0].quantity, dec!(1));
    assert_eq!(cfdi.concepts[0].unit_price, dec!(0));
}

#[test]
fn complement_level_parties_do_not_shadow_the_invoice_parties() {
    // A nómina complement carries its own Emisor; the Comprobante-level
    // parties identify the invoice.
    let cfdi = parse_cfdi(&minimal(
        r#"<cfdi:Complemento>
             <nomina:Nomina xmlns:nomina="http://www.sat.gob.mx/nomina12">
               <nomina:Emisor Rfc="ZZZ999999ZZ9"/>
             </nomina:Nomina>
           </cfdi:Complemento>"#,
    ))
    .unwrap();
    assert_eq!(cfdi.issuer.rfc, "AAA010101AAA");
}

#[test]
fn grouped_total_is_malformed() {
    let xml = minimal("").replace("SubTotal=\"100.00\"", "SubTotal=\"1,000.00\"");
    match parse_cfdi(&xml) {
        Err(ParseError::Malformed(msg)) => assert!(msg.contains("SubTotal")),
        other => panic!("expected Malformed, got {other:?}"),
    }
}

#[test]
fn stamp_uuid_is_kept_verbatim() {
    let cfdi = parse_cfdi(&minimal(
        r#"<cfdi:Complemento>
             <tfd:TimbreFiscalDigital xmlns:tfd="http://www.sat.gob.mx/TimbreFiscalDigital"
                 UUID="ad662d33-6810-4e45-a0e6-d5b2c2d1e9f3"/>
           </cfdi:Complemento>"#,
    ))
    .unwrap();
    // Case is left to the comparison layer, which ignores it.
    assert_eq!(cfdi.uuid(), Some("ad662d33-6810-4e45-a0e6-d5b2c2d1e9f3"));
}

#[test]
fn optional_header_attributes_may_be_absent() {
    let cfdi = parse_cfdi(&minimal("")).unwrap();
    assert!(cfdi.serie.is_none());
    assert!(cfdi.folio.is_none());
    assert!(cfdi.issued_at.is_none());
    assert!(cfdi.currency.is_none());
}

#[test]
fn unparseable_fecha_is_dropped_not_fatal() {
    let xml = minimal("").replace(
        "Version=\"4.0\"",
        "Version=\"4.0\" Fecha=\"ayer por la tarde\"",
    );
    let cfdi = parse_cfdi(&xml).unwrap();
    assert!(cfdi.issued_at.is_none());
}

#[test]
fn unknown_elements_are_ignored() {
    let cfdi = parse_cfdi(&minimal(
        r#"<cfdi:CfdiRelacionados TipoRelacion="04">
             <cfdi:CfdiRelacionado UUID="11111111-2222-3333-4444-555555555555"/>
           </cfdi:CfdiRelacionados>"#,
    ))
    .unwrap();
    assert!(cfdi.stamp.is_none());
}
