//! Ingestion pipeline for the Document Anchor Ledger.
//!
//! Every document goes through the same fixed sequence of stages before its
//! fingerprint is recorded against a subject:
//!
//! 1. **Validating**: payload non-empty, subject non-empty, ledger session
//!    installed. The per-subject single-flight slot is claimed here.
//! 2. **Storing**: the content store returns the fingerprint.
//! 3. **Anchoring**: the ledger session records `(subject, fingerprint)`.
//!
//! A failure at any stage ends the submission with a typed
//! [`PipelineError`]; nothing is retried automatically.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use dal_ledger::{ContractArtifact, InMemoryLedger, LedgerSession, StaticSigner};
//! use dal_pipeline::{IngestionPipeline, PipelineConfig};
//! use dal_store::InMemoryContentStore;
//! use dal_types::{DocumentPayload, NetworkId};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let ledger = Arc::new(InMemoryLedger::development());
//! let session = LedgerSession::connect(
//!     ledger,
//!     &StaticSigner::ephemeral(),
//!     &ContractArtifact::single(NetworkId::DEVELOPMENT, dal_ledger::development_contract_address()),
//!     Duration::from_secs(30),
//! )
//! .await?;
//!
//! let pipeline = IngestionPipeline::new(Arc::new(InMemoryContentStore::new()), PipelineConfig::default())
//!     .with_session(Arc::new(session));
//! let outcome = pipeline.submit("HH1001", DocumentPayload::from(&b"hello"[..])).await?;
//! println!("{} anchored in {}", outcome.fingerprint(), outcome.receipt().block);
//! # Ok(())
//! # }
//! ```

pub mod cancel;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod registry;
pub mod state;

pub use cancel::CancelToken;
pub use config::{PipelineConfig, SubmitOptions};
pub use error::{ErrorKind, PipelineError, PipelineResult};
pub use pipeline::{IngestionPipeline, SubmissionOutcome};
pub use registry::{InFlightGuard, InFlightRegistry};
pub use state::{Stage, StageTiming, SubmissionState};
