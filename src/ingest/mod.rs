//! Ingestion orchestration.
//!
//! One attempt moves through `Idle → Parsing → Reconciling →
//! AuthorityChecking → CrossValidating → Admitted | Blocked`. The decision
//! logic lives in a pure state machine ([`IngestMachine`]); the async
//! driver ([`Ingestor`]) executes its effect requests — the authority
//! query, then persistence and storage, which happen only after the final
//! gate admits. Nothing is written on a blocked attempt.
//!
//! # Example
//!
//! ```ignore
//! use facturamx::ingest::*;
//! use facturamx::sat::SatClient;
//!
//! let ingestor = Ingestor::new(&SatClient::new(), &providers, &expenses, &documents);
//! match ingestor.run(request).await? {
//!     IngestOutcome::Admitted { record, .. } => println!("saved {}", record.period),
//!     IngestOutcome::Blocked { reasons } => {
//!         for r in &reasons {
//!             eprintln!("{r}");
//!         }
//!     }
//! }
//! ```

mod driver;
mod machine;

pub use driver::{
    DocumentStore, ExpenseStore, IngestOutcome, IngestRequest, Ingestor, Provider,
    ProviderDirectory, StoreError, revalidate, storage_path,
};
pub use machine::{
    Admission, BlockReason, EffectRequest, IngestEvent, IngestMachine, IngestPolicy, IngestState,
};
