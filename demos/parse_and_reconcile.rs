use facturamx::cfdi::parse_cfdi;

const XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<cfdi:Comprobante xmlns:cfdi="http://www.sat.gob.mx/cfd/4"
    xmlns:tfd="http://www.sat.gob.mx/TimbreFiscalDigital"
    Version="4.0" Serie="A" Folio="1021" Fecha="2024-03-05T12:30:00"
    Moneda="MXN" SubTotal="195.00" Total="226.20">
  <cfdi:Emisor Rfc="AAA010101AAA" Nombre="COMERCIALIZADORA AAA SA DE CV"/>
  <cfdi:Receptor Rfc="BBB010101BBB" UsoCFDI="G03"/>
  <cfdi:Conceptos>
    <cfdi:Concepto Descripcion="Papelería" Cantidad="3" ValorUnitario="65.00"/>
  </cfdi:Conceptos>
  <cfdi:Impuestos TotalImpuestosTrasladados="31.20">
    <cfdi:Traslados>
      <cfdi:Traslado Impuesto="002" Importe="31.20"/>
    </cfdi:Traslados>
  </cfdi:Impuestos>
  <cfdi:Complemento>
    <tfd:TimbreFiscalDigital Version="1.1" UUID="AD662D33-6810-4E45-A0E6-D5B2C2D1E9F3"/>
  </cfdi:Complemento>
</cfdi:Comprobante>"#;

fn main() {
    let cfdi = parse_cfdi(XML).expect("fixture should parse");

    println!("=== Parsed CFDI ===\n");
    println!("  version:   {}", cfdi.version.as_str());
    println!("  issuer:    {} ({})", cfdi.issuer.name, cfdi.issuer.rfc);
    println!("  recipient: {}", cfdi.recipient.rfc);
    println!("  subtotal:  {}", cfdi.subtotal);
    println!("  taxes:     {}", cfdi.tax_total());
    println!("  total:     {}", cfdi.total);
    if let Some(uuid) = cfdi.uuid() {
        println!("  uuid:      {uuid}");
    }

    println!("\n=== Reconciliation ===\n");
    let r = cfdi.reconciliation();
    println!("  computed: {}", r.computed_total);
    println!("  declared: {}", r.declared_total);
    println!(
        "  verdict:  {} (difference {})",
        if r.within_tolerance { "OK" } else { "MISMATCH" },
        r.difference
    );

    // Error handling: the parser distinguishes broken documents from
    // documents in a schema generation it does not speak.
    println!("\n=== Error cases ===\n");
    let unsupported = XML.replace("Version=\"4.0\"", "Version=\"3.2\"");
    if let Err(e) = parse_cfdi(&unsupported) {
        println!("  3.2 document: {e}");
    }
    if let Err(e) = parse_cfdi("<factura total=\"10\"/>") {
        println!("  foreign XML:  {e}");
    }
}
