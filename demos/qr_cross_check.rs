use facturamx::qr::{QrReference, cross_validate, parse_qr_payload};
use rust_decimal_macros::dec;

fn main() {
    let url = "https://verificacfdi.facturaelectronica.sat.gob.mx/default.aspx?id=AD662D33-6810-4E45-A0E6-D5B2C2D1E9F3&re=AAA010101AAA&rr=BBB010101BBB&tt=226.20&fe=a23F9b";

    let payload = parse_qr_payload(url).expect("well-formed verification URL");
    println!("=== Decoded payload ===\n");
    println!("  uuid:  {}", payload.uuid);
    println!("  re:    {}", payload.issuer_rfc);
    println!("  rr:    {}", payload.recipient_rfc);
    println!("  total: {}", payload.total);

    let reference = QrReference {
        uuid: "AD662D33-6810-4E45-A0E6-D5B2C2D1E9F3".into(),
        issuer_rfc: "AAA010101AAA".into(),
        recipient_rfc: "BBB010101BBB".into(),
        total: dec!(226.20),
    };

    println!("\n=== Cross-validation ===\n");
    let ok = cross_validate(Some(&payload), &reference);
    println!("  matching rendition: valid={}", ok.is_valid);

    // A rendition claiming a different amount than the structured document.
    let mut tampered = payload.clone();
    tampered.total = dec!(500.00);
    let bad = cross_validate(Some(&tampered), &reference);
    println!(
        "  tampered rendition: valid={} blocking={} reasons={:?}",
        bad.is_valid, bad.blocking, bad.reasons
    );

    // No QR located at all: unverified, but not treated as fraud.
    let none = cross_validate(None, &reference);
    println!(
        "  missing code:       valid={} blocking={} reasons={:?}",
        none.is_valid, none.blocking, none.reasons
    );
}
