use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rust_decimal_macros::dec;
use std::fmt::Write;

use facturamx::cfdi::parse_cfdi;
use facturamx::core::reconcile;

fn cfdi_xml(concepts: usize) -> String {
    let mut xml = String::with_capacity(1024 + concepts * 160);
    xml.push_str(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<cfdi:Comprobante xmlns:cfdi="http://www.sat.gob.mx/cfd/4"
    xmlns:tfd="http://www.sat.gob.mx/TimbreFiscalDigital"
    Version="4.0" Serie="B" Folio="8800" Fecha="2024-06-15T10:00:00"
    Moneda="MXN" SubTotal="1000.00" Total="1160.00">
  <cfdi:Emisor Rfc="AAA010101AAA" Nombre="PROVEEDOR BENCH SA DE CV"/>
  <cfdi:Receptor Rfc="BBB010101BBB"/>
  <cfdi:Conceptos>
"#,
    );
    for i in 1..=concepts {
        let _ = writeln!(
            xml,
            r#"    <cfdi:Concepto Descripcion="Servicio {i}" Cantidad="1" ValorUnitario="10.00" Importe="10.00"/>"#
        );
    }
    xml.push_str(
        r#"  </cfdi:Conceptos>
  <cfdi:Impuestos TotalImpuestosTrasladados="160.00">
    <cfdi:Traslados>
      <cfdi:Traslado Impuesto="002" Importe="160.00"/>
    </cfdi:Traslados>
  </cfdi:Impuestos>
  <cfdi:Complemento>
    <tfd:TimbreFiscalDigital Version="1.1" UUID="AD662D33-6810-4E45-A0E6-D5B2C2D1E9F3"/>
  </cfdi:Complemento>
</cfdi:Comprobante>"#,
    );
    xml
}

fn bench_parse_small(c: &mut Criterion) {
    let xml = cfdi_xml(10);
    c.bench_function("parse_cfdi_10_concepts", |b| {
        b.iter(|| parse_cfdi(black_box(&xml)).unwrap());
    });
}

fn bench_parse_large(c: &mut Criterion) {
    let xml = cfdi_xml(500);
    c.bench_function("parse_cfdi_500_concepts", |b| {
        b.iter(|| parse_cfdi(black_box(&xml)).unwrap());
    });
}

fn bench_reconcile(c: &mut Criterion) {
    c.bench_function("reconcile", |b| {
        b.iter(|| {
            reconcile(
                black_box(dec!(1000.00)),
                black_box(dec!(160.00)),
                black_box(dec!(-35.71)),
                black_box(dec!(1124.29)),
            )
        });
    });
}

fn bench_reconcile_from_parsed(c: &mut Criterion) {
    let cfdi = parse_cfdi(&cfdi_xml(10)).unwrap();
    c.bench_function("cfdi_reconciliation", |b| {
        b.iter(|| black_box(&cfdi).reconciliation());
    });
}

criterion_group!(
    benches,
    bench_parse_small,
    bench_parse_large,
    bench_reconcile,
    bench_reconcile_from_parsed
);
criterion_main!(benches);
