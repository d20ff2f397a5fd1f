//! ConsultaCFDIService SOAP client.

use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::{debug, warn};

use super::status::{AuthorityClient, AuthorityStatus, AuthorityValidation, SatQuery, classify};

const SAT_URL: &str =
    "https://consultaqr.facturaelectronica.sat.gob.mx/ConsultaCFDIService.svc";
const SOAP_ACTION: &str = "http://tempuri.org/IConsultaCFDIService/Consulta";

/// Client for the SAT consultation service.
///
/// Cheap to construct; holds only the request timeout. The public SAT
/// endpoint requires no authentication.
#[derive(Debug, Clone)]
pub struct SatClient {
    timeout: std::time::Duration,
}

impl SatClient {
    pub fn new() -> Self {
        Self {
            timeout: std::time::Duration::from_secs(30),
        }
    }

    pub fn with_timeout(timeout: std::time::Duration) -> Self {
        Self { timeout }
    }
}

impl Default for SatClient {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthorityClient for SatClient {
    async fn check(&self, query: &SatQuery) -> AuthorityValidation {
        check_sat_with(query, self.timeout).await
    }
}

/// Check a stamped invoice against the SAT consultation service.
///
/// Issues exactly one request. Empty query fields short-circuit to
/// `ServiceError("missing-fields")` without touching the network. Transport
/// failures and unexpected payloads also classify as `ServiceError`; the
/// caller decides whether to re-invoke.
pub async fn check_sat(query: &SatQuery) -> AuthorityValidation {
    check_sat_with(query, std::time::Duration::from_secs(30)).await
}

async fn check_sat_with(query: &SatQuery, timeout: std::time::Duration) -> AuthorityValidation {
    if query.has_missing_fields() {
        return AuthorityValidation::from_status(AuthorityStatus::ServiceError(
            "missing-fields".to_string(),
        ));
    }

    debug!(uuid = %query.uuid, "querying SAT consultation service");

    let client = match reqwest::Client::builder().timeout(timeout).build() {
        Ok(c) => c,
        Err(e) => return service_error(e.to_string()),
    };

    let envelope = soap_envelope(&query.expression());

    let resp = match client
        .post(SAT_URL)
        .header("Content-Type", "text/xml; charset=utf-8")
        .header("SOAPAction", SOAP_ACTION)
        .body(envelope)
        .send()
        .await
    {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, "SAT request failed");
            return service_error(e.to_string());
        }
    };

    let status = resp.status();
    let body = match resp.text().await {
        Ok(b) => b,
        Err(e) => return service_error(e.to_string()),
    };

    if !status.is_success() {
        warn!(%status, "SAT returned non-success status");
        return service_error(format!("HTTP {status}"));
    }

    let parsed = parse_consulta_response(&body);
    let classified = classify(
        parsed.codigo_estatus.as_deref(),
        parsed.estado.as_deref(),
        parsed.estatus_cancelacion.as_deref(),
    );

    AuthorityValidation {
        status: classified,
        raw_code: parsed.codigo_estatus,
        message: parsed.estado,
        cancelable: parsed.es_cancelable,
        checked_at: chrono::Utc::now(),
    }
}

fn service_error(message: String) -> AuthorityValidation {
    AuthorityValidation::from_status(AuthorityStatus::ServiceError(message))
}

fn soap_envelope(expression: &str) -> String {
    format!(
        concat!(
            r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" "#,
            r#"xmlns:tem="http://tempuri.org/">"#,
            "<soapenv:Header/><soapenv:Body><tem:Consulta>",
            "<tem:expresionImpresa><![CDATA[{}]]></tem:expresionImpresa>",
            "</tem:Consulta></soapenv:Body></soapenv:Envelope>"
        ),
        expression
    )
}

#[derive(Debug, Default, PartialEq)]
struct ConsultaResponse {
    codigo_estatus: Option<String>,
    estado: Option<String>,
    es_cancelable: Option<String>,
    estatus_cancelacion: Option<String>,
}

/// Pull the four response fields out of the SOAP body by local element name.
fn parse_consulta_response(xml: &str) -> ConsultaResponse {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut out = ConsultaResponse::default();
    let mut current: Option<&'static str> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let raw = e.name();
                let local_name = raw.local_name();
                let local = std::str::from_utf8(local_name.as_ref()).unwrap_or("");
                current = match local {
                    "CodigoEstatus" => Some("codigo"),
                    "Estado" => Some("estado"),
                    "EsCancelable" => Some("cancelable"),
                    "EstatusCancelacion" => Some("estatus"),
                    _ => None,
                };
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().unwrap_or_default().to_string();
                match current {
                    Some("codigo") => out.codigo_estatus = Some(text),
                    Some("estado") => out.estado = Some(text),
                    Some("cancelable") => out.es_cancelable = Some(text),
                    Some("estatus") => out.estatus_cancelacion = Some(text),
                    _ => {}
                }
            }
            Ok(Event::End(_)) => current = None,
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sat_url_is_https() {
        assert!(SAT_URL.starts_with("https://"));
    }

    #[test]
    fn envelope_embeds_expression() {
        let env = soap_envelope("?re=A&rr=B&tt=1&id=X");
        assert!(env.contains("<![CDATA[?re=A&rr=B&tt=1&id=X]]>"));
        assert!(env.contains("tem:Consulta"));
    }

    #[test]
    fn response_parsing() {
        let xml = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
          <s:Body><ConsultaResponse xmlns="http://tempuri.org/">
            <ConsultaResult xmlns:a="http://schemas.datacontract.org/2004/07/Sat.Cfdi">
              <a:CodigoEstatus>S - Comprobante obtenido satisfactoriamente.</a:CodigoEstatus>
              <a:EsCancelable>Cancelable con aceptación</a:EsCancelable>
              <a:Estado>Vigente</a:Estado>
              <a:EstatusCancelacion/>
            </ConsultaResult>
          </ConsultaResponse></s:Body></s:Envelope>"#;

        let parsed = parse_consulta_response(xml);
        assert_eq!(
            parsed.codigo_estatus.as_deref(),
            Some("S - Comprobante obtenido satisfactoriamente.")
        );
        assert_eq!(parsed.estado.as_deref(), Some("Vigente"));
        assert_eq!(parsed.es_cancelable.as_deref(), Some("Cancelable con aceptación"));
        assert_eq!(parsed.estatus_cancelacion, None);
    }

    #[test]
    fn cancelled_response_classifies() {
        let xml = r#"<r><Estado>Cancelado</Estado><EstatusCancelacion>Cancelado sin aceptación</EstatusCancelacion></r>"#;
        let parsed = parse_consulta_response(xml);
        let status = classify(
            parsed.codigo_estatus.as_deref(),
            parsed.estado.as_deref(),
            parsed.estatus_cancelacion.as_deref(),
        );
        assert_eq!(status, AuthorityStatus::Cancelled);
    }
}
