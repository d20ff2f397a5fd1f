use rust_decimal::Decimal;
use std::fmt;

use crate::cfdi::parse_cfdi;
use crate::core::{
    Cfdi, ExtractionError, ParseError, ReconciliationResult, ValidationStatus,
};
use crate::fallback::extract_reference;
use crate::qr::{CrossValidationResult, QrReference, cross_validate, extract_qr_payload};
use crate::sat::{AuthorityStatus, AuthorityValidation, SatQuery};

/// Caller-supplied admission policy for one ingestion attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestPolicy {
    /// Admit a `NotFound` authority result (authority indexing lag). The
    /// record is then flagged `NeedsReview`. Who may set this is the
    /// integrating application's policy, not the pipeline's.
    pub override_not_found: bool,
}

/// A specific, attributable reason an ingestion was refused.
///
/// Multiple reasons co-occur and are all surfaced, never short-circuited
/// to the first.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockReason {
    ParseFailed(ParseError),
    ReconciliationFailed { difference: Decimal },
    AuthorityCancelled,
    AuthorityNotFound,
    AuthorityUnavailable(String),
    QrMismatch(Vec<String>),
    ExtractionFailed(ExtractionError),
}

impl BlockReason {
    /// Stable machine-readable code for user-facing messaging.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ParseFailed(_) => "parse-error",
            Self::ReconciliationFailed { .. } => "reconciliation-failed",
            Self::AuthorityCancelled => "authority-cancelled",
            Self::AuthorityNotFound => "authority-not-found",
            Self::AuthorityUnavailable(_) => "authority-error",
            Self::QrMismatch(_) => "qr-mismatch",
            Self::ExtractionFailed(_) => "extraction-failed",
        }
    }
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParseFailed(e) => write!(f, "{}: {e}", self.code()),
            Self::ReconciliationFailed { difference } => {
                write!(f, "{}: difference {difference}", self.code())
            }
            Self::AuthorityUnavailable(m) => write!(f, "{}: {m}", self.code()),
            Self::QrMismatch(fields) => write!(f, "{}: {}", self.code(), fields.join(", ")),
            Self::ExtractionFailed(e) => write!(f, "{}: {e}", self.code()),
            _ => f.write_str(self.code()),
        }
    }
}

/// Everything the driver needs to persist an admitted attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct Admission {
    /// Present on the structured-document path, absent on the fallback path.
    pub cfdi: Option<Cfdi>,
    pub query: SatQuery,
    pub authority: AuthorityValidation,
    pub reconciliation: Option<ReconciliationResult>,
    pub validation_status: ValidationStatus,
    /// Non-blocking observations, e.g. `no-code-found`.
    pub warnings: Vec<String>,
}

/// States of one ingestion attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestState {
    Idle,
    Parsing,
    Reconciling,
    AuthorityChecking,
    CrossValidating,
    Admitted(Admission),
    Blocked(Vec<BlockReason>),
}

/// Inputs that drive the machine forward.
#[derive(Debug, Clone)]
pub enum IngestEvent {
    /// The caller handed over the attempt's documents.
    DocumentsReceived {
        xml: Option<String>,
        visual: Option<Vec<u8>>,
    },
    /// The driver completed the authority query.
    AuthorityChecked(AuthorityValidation),
}

/// Side effects the machine asks the driver to perform. The machine itself
/// never touches the network or storage.
#[derive(Debug, Clone, PartialEq)]
pub enum EffectRequest {
    QueryAuthority(SatQuery),
    PersistAdmitted,
}

/// The per-attempt state machine.
///
/// An owned value passed explicitly through the pipeline: no shared state
/// exists between concurrent attempts, and abandoning an in-flight machine
/// has no side effects because nothing is written before the final gate.
#[derive(Debug)]
pub struct IngestMachine {
    policy: IngestPolicy,
    state: IngestState,
    cfdi: Option<Cfdi>,
    visual: Option<Vec<u8>>,
    reconciliation: Option<ReconciliationResult>,
    cross: Option<CrossValidationResult>,
    query: Option<SatQuery>,
}

impl IngestMachine {
    pub fn new(policy: IngestPolicy) -> Self {
        Self {
            policy,
            state: IngestState::Idle,
            cfdi: None,
            visual: None,
            reconciliation: None,
            cross: None,
            query: None,
        }
    }

    pub fn state(&self) -> &IngestState {
        &self.state
    }

    /// The admission data, once the final gate has passed.
    pub fn admission(&self) -> Option<&Admission> {
        match &self.state {
            IngestState::Admitted(a) => Some(a),
            _ => None,
        }
    }

    /// The blocking reasons, once the attempt was refused.
    pub fn blocked(&self) -> Option<&[BlockReason]> {
        match &self.state {
            IngestState::Blocked(r) => Some(r),
            _ => None,
        }
    }

    /// Advance the machine. Pure over its inputs: the returned effect
    /// requests are executed by the driver, results fed back as events.
    /// Events that do not apply to the current state are ignored.
    pub fn step(&mut self, event: IngestEvent) -> Vec<EffectRequest> {
        match (&self.state, event) {
            (IngestState::Idle, IngestEvent::DocumentsReceived { xml, visual }) => {
                self.visual = visual;
                self.receive(xml)
            }
            (IngestState::AuthorityChecking, IngestEvent::AuthorityChecked(validation)) => {
                self.authority_checked(validation)
            }
            _ => Vec::new(),
        }
    }

    fn receive(&mut self, xml: Option<String>) -> Vec<EffectRequest> {
        if let Some(xml) = xml {
            self.state = IngestState::Parsing;
            let cfdi = match parse_cfdi(&xml) {
                Ok(cfdi) => cfdi,
                Err(e) => return self.block(vec![BlockReason::ParseFailed(e)]),
            };

            // Reconciliation is evaluated here but only blocks at the final
            // gate; the authority check still runs.
            self.state = IngestState::Reconciling;
            self.reconciliation = Some(cfdi.reconciliation());
            self.query = Some(SatQuery::from_cfdi(&cfdi));
            self.cfdi = Some(cfdi);
        } else if let Some(visual) = &self.visual {
            match extract_reference(visual) {
                Ok(query) => self.query = Some(query),
                Err(e) => return self.block(vec![BlockReason::ExtractionFailed(e)]),
            }
        } else {
            return self.block(vec![BlockReason::ParseFailed(ParseError::Malformed(
                "no document supplied".into(),
            ))]);
        }

        self.state = IngestState::AuthorityChecking;
        let query = self.query.clone().unwrap_or_else(|| {
            SatQuery::new("", "", "", Decimal::ZERO)
        });
        vec![EffectRequest::QueryAuthority(query)]
    }

    fn authority_checked(&mut self, validation: AuthorityValidation) -> Vec<EffectRequest> {
        // Cross-validate only when both a visual document and a stamped
        // structured document are present.
        if let (Some(visual), Some(cfdi)) = (&self.visual, &self.cfdi) {
            if let Some(reference) = QrReference::from_cfdi(cfdi) {
                self.state = IngestState::CrossValidating;
                let payload = extract_qr_payload(visual);
                self.cross = Some(cross_validate(payload.as_ref(), &reference));
            }
        }

        self.finalize(validation)
    }

    /// The final gate. Admission requires reconciliation within tolerance,
    /// an authority result that allows persistence, and a non-blocking
    /// cross-validation — every failing condition is reported.
    fn finalize(&mut self, authority: AuthorityValidation) -> Vec<EffectRequest> {
        let mut reasons = Vec::new();

        if let Some(reconciliation) = &self.reconciliation {
            if !reconciliation.within_tolerance {
                reasons.push(BlockReason::ReconciliationFailed {
                    difference: reconciliation.difference,
                });
            }
        }

        match &authority.status {
            AuthorityStatus::Valid => {}
            AuthorityStatus::Cancelled => reasons.push(BlockReason::AuthorityCancelled),
            AuthorityStatus::NotFound => {
                if !self.policy.override_not_found {
                    reasons.push(BlockReason::AuthorityNotFound);
                }
            }
            AuthorityStatus::ServiceError(m) => {
                reasons.push(BlockReason::AuthorityUnavailable(m.clone()));
            }
        }

        let mut warnings = Vec::new();
        if let Some(cross) = &self.cross {
            if cross.blocking {
                reasons.push(BlockReason::QrMismatch(cross.reasons.clone()));
            } else if !cross.is_valid {
                warnings.extend(cross.reasons.iter().cloned());
            }
        }

        if !reasons.is_empty() {
            return self.block(reasons);
        }

        let validation_status = if authority.status == AuthorityStatus::NotFound {
            ValidationStatus::NeedsReview
        } else {
            ValidationStatus::Correct
        };

        let query = self
            .query
            .clone()
            .unwrap_or_else(|| SatQuery::new("", "", "", Decimal::ZERO));

        self.state = IngestState::Admitted(Admission {
            cfdi: self.cfdi.clone(),
            query,
            authority,
            reconciliation: self.reconciliation.clone(),
            validation_status,
            warnings,
        });

        vec![EffectRequest::PersistAdmitted]
    }

    fn block(&mut self, reasons: Vec<BlockReason>) -> Vec<EffectRequest> {
        self.state = IngestState::Blocked(reasons);
        Vec::new()
    }
}
