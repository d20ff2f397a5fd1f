//! Walks the ingestion state machine by hand, playing the driver's role.

use facturamx::ingest::{EffectRequest, IngestEvent, IngestMachine, IngestPolicy, IngestState};
use facturamx::sat::{AuthorityStatus, AuthorityValidation};

const XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<cfdi:Comprobante xmlns:cfdi="http://www.sat.gob.mx/cfd/4"
    xmlns:tfd="http://www.sat.gob.mx/TimbreFiscalDigital"
    Version="4.0" Serie="A" Folio="1021" Fecha="2024-03-05T12:30:00"
    Moneda="MXN" SubTotal="195.00" Total="226.20">
  <cfdi:Emisor Rfc="AAA010101AAA" Nombre="COMERCIALIZADORA AAA SA DE CV"/>
  <cfdi:Receptor Rfc="BBB010101BBB"/>
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

fn run(label: &str, status: AuthorityStatus, policy: IngestPolicy) {
    println!("=== {label} ===\n");
    let mut machine = IngestMachine::new(policy);

    let effects = machine.step(IngestEvent::DocumentsReceived {
        xml: Some(XML.to_string()),
        visual: None,
    });
    for effect in &effects {
        if let EffectRequest::QueryAuthority(q) = effect {
            println!("  effect: query authority for {}", q.uuid);
        }
    }

    // A real driver would issue the network call here.
    let effects = machine.step(IngestEvent::AuthorityChecked(
        AuthorityValidation::from_status(status),
    ));
    if effects.contains(&EffectRequest::PersistAdmitted) {
        println!("  effect: persist");
    }

    match machine.state() {
        IngestState::Admitted(a) => {
            println!("  outcome: admitted ({:?})", a.validation_status);
            for w in &a.warnings {
                println!("  warning: {w}");
            }
        }
        IngestState::Blocked(reasons) => {
            println!("  outcome: blocked");
            for r in reasons {
                println!("  reason:  {r}");
            }
        }
        other => println!("  outcome: {other:?}"),
    }
    println!();
}

fn main() {
    run("Vigente", AuthorityStatus::Valid, IngestPolicy::default());
    run("Cancelado", AuthorityStatus::Cancelled, IngestPolicy::default());
    run(
        "No encontrado",
        AuthorityStatus::NotFound,
        IngestPolicy::default(),
    );
    run(
        "No encontrado, override",
        AuthorityStatus::NotFound,
        IngestPolicy {
            override_not_found: true,
        },
    );
}
