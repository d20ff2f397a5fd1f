use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::machine::{
    Admission, BlockReason, EffectRequest, IngestEvent, IngestMachine, IngestPolicy,
};
use crate::core::{Cfdi, ExpenseRecord, PaymentStatus, period_for};
use crate::sat::{AuthorityClient, AuthorityValidation, SatQuery};

/// Failure in a persistence or storage collaborator.
#[derive(Debug, Clone, Error)]
#[error("storage error: {0}")]
pub struct StoreError(pub String);

/// A provider as known to the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    pub id: String,
    pub name: String,
    pub rfc: Option<String>,
}

/// Lookup/insert capability over providers. CRUD internals are out of
/// scope; the pipeline only matches and creates.
#[allow(async_fn_in_trait)]
pub trait ProviderDirectory {
    async fn find_by_rfc(&self, rfc: &str) -> Result<Option<Provider>, StoreError>;
    async fn all(&self) -> Result<Vec<Provider>, StoreError>;
    async fn create(&self, name: &str, rfc: Option<&str>) -> Result<Provider, StoreError>;
}

/// Insert capability over expense records.
#[allow(async_fn_in_trait)]
pub trait ExpenseStore {
    async fn insert(&self, record: &ExpenseRecord) -> Result<(), StoreError>;
}

/// Binary storage: `store(path, bytes) -> public url`.
#[allow(async_fn_in_trait)]
pub trait DocumentStore {
    async fn store(&self, path: &str, bytes: &[u8]) -> Result<String, StoreError>;
}

/// One ingestion attempt as handed to the driver.
#[derive(Debug, Clone)]
pub struct IngestRequest {
    /// The structured CFDI XML, when supplied.
    pub xml: Option<String>,
    /// The visual rendition (PDF), when supplied.
    pub visual: Option<Vec<u8>>,
    /// Company scope — first segment of the storage path.
    pub domain: String,
    /// Classification used in the stored file name.
    pub category: String,
    /// Expense concept; when empty, the first invoiced item's description
    /// is used.
    pub concept: String,
    pub expense_date: NaiveDate,
    pub payment_method_id: String,
    pub executive_id: String,
    /// Admit `NotFound` authority results (flagged `NeedsReview`).
    pub override_not_found: bool,
}

/// What the caller gets back from one attempt.
#[derive(Debug, Clone)]
pub enum IngestOutcome {
    Admitted {
        record: ExpenseRecord,
        document_url: Option<String>,
        warnings: Vec<String>,
    },
    Blocked {
        reasons: Vec<BlockReason>,
    },
}

/// Drives one ingestion attempt to completion: runs the state machine,
/// executes its effect requests, and performs the persistence only after
/// the final gate admits. Each attempt owns its machine, so attempts can
/// run concurrently without shared state.
pub struct Ingestor<'a, A, P, E, D> {
    authority: &'a A,
    providers: &'a P,
    expenses: &'a E,
    documents: &'a D,
}

impl<'a, A, P, E, D> Ingestor<'a, A, P, E, D>
where
    A: AuthorityClient,
    P: ProviderDirectory,
    E: ExpenseStore,
    D: DocumentStore,
{
    pub fn new(authority: &'a A, providers: &'a P, expenses: &'a E, documents: &'a D) -> Self {
        Self {
            authority,
            providers,
            expenses,
            documents,
        }
    }

    pub async fn run(&self, request: IngestRequest) -> Result<IngestOutcome, StoreError> {
        let mut machine = IngestMachine::new(IngestPolicy {
            override_not_found: request.override_not_found,
        });

        let mut queue: VecDeque<EffectRequest> =
            machine
                .step(IngestEvent::DocumentsReceived {
                    xml: request.xml.clone(),
                    visual: request.visual.clone(),
                })
                .into();

        let mut persisted: Option<(ExpenseRecord, Option<String>)> = None;

        while let Some(effect) = queue.pop_front() {
            match effect {
                EffectRequest::QueryAuthority(query) => {
                    debug!(uuid = %query.uuid, "authority check");
                    let validation = self.authority.check(&query).await;
                    queue.extend(machine.step(IngestEvent::AuthorityChecked(validation)));
                }
                EffectRequest::PersistAdmitted => {
                    let admission = machine
                        .admission()
                        .ok_or_else(|| StoreError("persist requested without admission".into()))?;
                    persisted = Some(self.persist(&request, admission).await?);
                }
            }
        }

        if let Some(reasons) = machine.blocked() {
            warn!(reasons = ?reasons.iter().map(|r| r.code()).collect::<Vec<_>>(), "ingestion blocked");
            return Ok(IngestOutcome::Blocked {
                reasons: reasons.to_vec(),
            });
        }

        let admission = machine
            .admission()
            .ok_or_else(|| StoreError("attempt finished in a non-terminal state".into()))?;
        let (record, document_url) =
            persisted.ok_or_else(|| StoreError("admitted attempt was not persisted".into()))?;

        info!(provider = %record.provider_id, period = %record.period, "expense admitted");
        Ok(IngestOutcome::Admitted {
            record,
            document_url,
            warnings: admission.warnings.clone(),
        })
    }

    async fn persist(
        &self,
        request: &IngestRequest,
        admission: &Admission,
    ) -> Result<(ExpenseRecord, Option<String>), StoreError> {
        let provider = self.lookup_or_create_provider(admission).await?;

        let period = period_for(request.expense_date);
        let millis = Utc::now().timestamp_millis();

        let mut xml_url = None;
        let mut pdf_url = None;
        if let Some(xml) = &request.xml {
            let path = storage_path(&request.domain, &period, millis, &request.category, "xml");
            xml_url = Some(self.documents.store(&path, xml.as_bytes()).await?);
        }
        if let Some(visual) = &request.visual {
            let path = storage_path(&request.domain, &period, millis, &request.category, "pdf");
            pdf_url = Some(self.documents.store(&path, visual).await?);
        }
        let document_url = xml_url.or(pdf_url);

        let record = build_record(request, admission, &provider.id, &period, &document_url);
        self.expenses.insert(&record).await?;

        Ok((record, document_url))
    }

    /// Match by tax id first, then by normalized name, then create.
    async fn lookup_or_create_provider(
        &self,
        admission: &Admission,
    ) -> Result<Provider, StoreError> {
        let (name, rfc) = match &admission.cfdi {
            Some(cfdi) => (cfdi.issuer.name.clone(), cfdi.issuer.rfc.clone()),
            // Fallback path: the RFC is all we recovered.
            None => (
                admission.query.issuer_rfc.clone(),
                admission.query.issuer_rfc.clone(),
            ),
        };

        if !rfc.is_empty() {
            if let Some(p) = self.providers.find_by_rfc(&rfc).await? {
                return Ok(p);
            }
        }

        let wanted = normalize_provider_name(&name);
        if !wanted.is_empty() {
            for candidate in self.providers.all().await? {
                if normalize_provider_name(&candidate.name) == wanted {
                    return Ok(candidate);
                }
            }
        }

        debug!(%name, "creating provider");
        self.providers
            .create(&name, (!rfc.is_empty()).then_some(rfc.as_str()))
            .await
    }
}

/// Re-run only the authority check for an already-parsed invoice.
///
/// Idempotent: produces a fresh validation without mutating any persisted
/// record; the caller applies the result explicitly if accepted.
pub async fn revalidate<A: AuthorityClient>(authority: &A, cfdi: &Cfdi) -> AuthorityValidation {
    authority.check(&SatQuery::from_cfdi(cfdi)).await
}

/// `{domain}/{yearMonth}/{epochMillis}_{category}.{ext}`
pub fn storage_path(domain: &str, period: &str, millis: i64, category: &str, ext: &str) -> String {
    format!("{domain}/{period}/{millis}_{}.{ext}", slug(category))
}

fn slug(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.trim().chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else if (c == ' ' || c == '-' || c == '_') && !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_end_matches('-').to_string()
}

/// Uppercase, strip punctuation, and drop trailing corporate-form tokens so
/// "Comercializadora AAA, S.A. de C.V." matches "COMERCIALIZADORA AAA".
fn normalize_provider_name(name: &str) -> String {
    const SUFFIX_TOKENS: &[&str] = &["SA", "DE", "CV", "S", "RL", "SC", "SAPI", "SAB"];

    let upper: String = name
        .to_uppercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    let mut tokens: Vec<&str> = upper.split_whitespace().collect();
    while let Some(last) = tokens.last() {
        if SUFFIX_TOKENS.contains(last) && tokens.len() > 1 {
            tokens.pop();
        } else {
            break;
        }
    }
    tokens.join(" ")
}

fn build_record(
    request: &IngestRequest,
    admission: &Admission,
    provider_id: &str,
    period: &str,
    document_url: &Option<String>,
) -> ExpenseRecord {
    let (subtotal, tax, withholdings, total, folio) = match &admission.cfdi {
        Some(cfdi) => (
            cfdi.subtotal,
            cfdi.tax_total(),
            -cfdi.withheld_total(),
            cfdi.total,
            invoice_folio(cfdi),
        ),
        None => (
            admission.query.total,
            rust_decimal::Decimal::ZERO,
            rust_decimal::Decimal::ZERO,
            admission.query.total,
            Some(admission.query.uuid.clone()),
        ),
    };

    let concept = if request.concept.trim().is_empty() {
        admission
            .cfdi
            .as_ref()
            .and_then(|c| c.concepts.first())
            .map(|c| c.description.clone())
            .unwrap_or_default()
    } else {
        request.concept.clone()
    };

    ExpenseRecord {
        provider_id: provider_id.to_string(),
        concept,
        subtotal,
        tax,
        withholdings,
        total,
        expense_date: request.expense_date,
        payment_method_id: request.payment_method_id.clone(),
        executive_id: request.executive_id.clone(),
        validation_status: admission.validation_status,
        payment_status: PaymentStatus::Pending,
        folio,
        document_url: document_url.clone(),
        period: period.to_string(),
    }
}

fn invoice_folio(cfdi: &Cfdi) -> Option<String> {
    match (&cfdi.serie, &cfdi.folio) {
        (Some(serie), Some(folio)) => Some(format!("{serie}-{folio}")),
        (None, Some(folio)) => Some(folio.clone()),
        _ => cfdi.uuid().map(str::to_string),
    }
}
