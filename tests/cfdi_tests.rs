#![cfg(feature = "cfdi")]

use chrono::NaiveDate;
use facturamx::cfdi::parse_cfdi;
use facturamx::core::{CfdiVersion, ParseError};
use rust_decimal_macros::dec;

const CFDI_40: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<cfdi:Comprobante xmlns:cfdi="http://www.sat.gob.mx/cfd/4"
    xmlns:tfd="http://www.sat.gob.mx/TimbreFiscalDigital"
    Version="4.0" Serie="A" Folio="1021" Fecha="2024-03-05T12:30:00"
    Moneda="MXN" SubTotal="195.00" Total="226.20">
  <cfdi:Emisor Rfc="AAA010101AAA" Nombre="COMERCIALIZADORA AAA SA DE CV" RegimenFiscal="601"/>
  <cfdi:Receptor Rfc="BBB010101BBB" UsoCFDI="G03" DomicilioFiscalReceptor="06600" RegimenFiscalReceptor="601"/>
  <cfdi:Conceptos>
    <cfdi:Concepto ClaveProdServ="44121700" Descripcion="Papelería" Cantidad="3" ValorUnitario="65.00" Importe="195.00">
      <cfdi:Impuestos>
        <cfdi:Traslados>
          <cfdi:Traslado Base="195.00" Impuesto="002" TipoFactor="Tasa" TasaOCuota="0.160000" Importe="31.20"/>
        </cfdi:Traslados>
      </cfdi:Impuestos>
    </cfdi:Concepto>
  </cfdi:Conceptos>
  <cfdi:Impuestos TotalImpuestosTrasladados="31.20">
    <cfdi:Traslados>
      <cfdi:Traslado Base="195.00" Impuesto="002" TipoFactor="Tasa" TasaOCuota="0.160000" Importe="31.20"/>
    </cfdi:Traslados>
  </cfdi:Impuestos>
  <cfdi:Complemento>
    <tfd:TimbreFiscalDigital Version="1.1" UUID="AD662D33-6810-4E45-A0E6-D5B2C2D1E9F3"
        FechaTimbrado="2024-03-05T12:31:44" SelloCFD="a23F9b"/>
  </cfdi:Complemento>
</cfdi:Comprobante>"#;

const CFDI_33: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<cfdi:Comprobante xmlns:cfdi="http://www.sat.gob.mx/cfd/3"
    version="3.3" Fecha="2019-07-18T09:00:00" Moneda="MXN"
    subTotal="1000.00" total="1063.60">
  <cfdi:Emisor rfc="CCC900101CC9" nombre="SERVICIOS CCC SC"/>
  <cfdi:Receptor rfc="BBB010101BBB"/>
  <cfdi:Conceptos>
    <cfdi:Concepto Descripcion="Honorarios" Cantidad="1" ValorUnitario="1000.00"/>
  </cfdi:Conceptos>
  <cfdi:Impuestos TotalImpuestosTrasladados="160.00" TotalImpuestosRetenidos="96.40">
    <cfdi:Retenciones>
      <cfdi:Retencion Impuesto="001" Importe="96.40"/>
    </cfdi:Retenciones>
    <cfdi:Traslados>
      <cfdi:Traslado Impuesto="002" Importe="160.00"/>
    </cfdi:Traslados>
  </cfdi:Impuestos>
</cfdi:Comprobante>"#;

#[test]
fn parses_a_stamped_40_invoice() {
    let cfdi = parse_cfdi(CFDI_40).unwrap();

    assert_eq!(cfdi.version, CfdiVersion::V40);
    assert_eq!(cfdi.serie.as_deref(), Some("A"));
    assert_eq!(cfdi.folio.as_deref(), Some("1021"));
    assert_eq!(
        cfdi.issued_at.map(|d| d.date()),
        NaiveDate::from_ymd_opt(2024, 3, 5)
    );
    assert_eq!(cfdi.currency.as_deref(), Some("MXN"));
    assert_eq!(cfdi.issuer.rfc, "AAA010101AAA");
    assert_eq!(cfdi.issuer.name, "COMERCIALIZADORA AAA SA DE CV");
    assert_eq!(cfdi.recipient.rfc, "BBB010101BBB");
    assert_eq!(cfdi.uuid(), Some("AD662D33-6810-4E45-A0E6-D5B2C2D1E9F3"));
}

#[test]
fn declared_amounts_survive_exactly() {
    let cfdi = parse_cfdi(CFDI_40).unwrap();
    assert_eq!(cfdi.subtotal, dec!(195.00));
    assert_eq!(cfdi.total, dec!(226.20));
    assert_eq!(cfdi.total_transferred, Some(dec!(31.20)));
    assert_eq!(cfdi.tax_total(), dec!(31.20));
}

#[test]
fn document_level_taxes_only() {
    // The per-concept breakdown repeats the same Traslado; it must not be
    // double-counted.
    let cfdi = parse_cfdi(CFDI_40).unwrap();
    assert_eq!(cfdi.taxes_transferred.len(), 1);
    assert_eq!(cfdi.taxes_transferred[0].name, "IVA");
    assert_eq!(cfdi.taxes_transferred[0].amount, dec!(31.20));
}

#[test]
fn concepts_keep_document_order() {
    let cfdi = parse_cfdi(CFDI_40).unwrap();
    assert_eq!(cfdi.concepts.len(), 1);
    assert_eq!(cfdi.concepts[0].description, "Papelería");
    assert_eq!(cfdi.concepts[0].quantity, dec!(3));
    assert_eq!(cfdi.concepts[0].unit_price, dec!(65.00));
}

#[test]
fn reconciliation_of_a_consistent_invoice() {
    let r = parse_cfdi(CFDI_40).unwrap().reconciliation();
    assert!(r.within_tolerance);
    assert_eq!(r.difference, dec!(0));
}

#[test]
fn parses_a_33_invoice_with_lowercase_attributes() {
    let cfdi = parse_cfdi(CFDI_33).unwrap();

    assert_eq!(cfdi.version, CfdiVersion::V33);
    assert_eq!(cfdi.issuer.rfc, "CCC900101CC9");
    assert_eq!(cfdi.subtotal, dec!(1000.00));
    assert_eq!(cfdi.total, dec!(1063.60));
    assert!(cfdi.stamp.is_none());
    assert_eq!(cfdi.uuid(), None);
}

#[test]
fn withholdings_subtract_in_reconciliation() {
    // 1000.00 + 160.00 - 96.40 = 1063.60
    let cfdi = parse_cfdi(CFDI_33).unwrap();
    assert_eq!(cfdi.withheld_total(), dec!(96.40));
    assert_eq!(cfdi.taxes_withheld[0].name, "ISR");
    assert!(cfdi.reconciliation().within_tolerance);
}

#[test]
fn namespace_prefix_does_not_matter() {
    let renamed = CFDI_40.replace("cfdi:", "c:").replace("xmlns:cfdi", "xmlns:c");
    let cfdi = parse_cfdi(&renamed).unwrap();
    assert_eq!(cfdi.issuer.rfc, "AAA010101AAA");
}

#[test]
fn version_32_is_unsupported_not_malformed() {
    let xml = CFDI_40.replace("Version=\"4.0\"", "Version=\"3.2\"");
    match parse_cfdi(&xml) {
        Err(ParseError::UnsupportedVersion(v)) => assert_eq!(v, "3.2"),
        other => panic!("expected UnsupportedVersion, got {other:?}"),
    }
}

#[test]
fn missing_issuer_is_malformed() {
    let xml = CFDI_40.replace("Rfc=\"AAA010101AAA\" ", "");
    assert!(matches!(parse_cfdi(&xml), Err(ParseError::Malformed(_))));
}

#[test]
fn missing_total_is_malformed() {
    let xml = CFDI_40.replace(" Total=\"226.20\"", "");
    assert!(matches!(parse_cfdi(&xml), Err(ParseError::Malformed(_))));
}

#[test]
fn truncated_document_is_malformed() {
    // Cut off inside the root element's attribute list.
    let xml = &CFDI_40[..120];
    assert!(matches!(parse_cfdi(xml), Err(ParseError::Malformed(_))));
}

#[test]
fn rfcs_are_normalized_on_parse() {
    let xml = CFDI_40.replace("Rfc=\"AAA010101AAA\"", "Rfc=\" aaa010101aaa \"");
    let cfdi = parse_cfdi(&xml).unwrap();
    assert_eq!(cfdi.issuer.rfc, "AAA010101AAA");
}
