//! Queries the live SAT consultation service. Requires network access.

use facturamx::sat::{AuthorityClient, SatClient, SatQuery};
use rust_decimal_macros::dec;

#[tokio::main]
async fn main() {
    // Substitute the fields of a real stamped invoice to get a meaningful
    // answer; this fixture UUID will come back "not found".
    let query = SatQuery::new(
        "AD662D33-6810-4E45-A0E6-D5B2C2D1E9F3",
        "AAA010101AAA",
        "BBB010101BBB",
        dec!(226.20),
    );

    println!("expression: {}", query.expression());

    let validation = SatClient::new().check(&query).await;
    println!("status:     {:?}", validation.status);
    if let Some(code) = &validation.raw_code {
        println!("raw code:   {code}");
    }
    if let Some(cancelable) = &validation.cancelable {
        println!("cancelable: {cancelable}");
    }
    println!("persistable without override: {}", validation.status.allow_persist(false));
    println!("persistable with override:    {}", validation.status.allow_persist(true));
}
