use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use dal_ledger::LedgerSession;
use dal_store::ContentStore;
use dal_types::{
    AnchorReceipt, AnchorRecord, DocumentPayload, Fingerprint, SubjectId, SubmissionId,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::cancel::CancelToken;
use crate::config::{PipelineConfig, SubmitOptions};
use crate::error::{PipelineError, PipelineResult};
use crate::registry::{InFlightGuard, InFlightRegistry};
use crate::state::{Stage, StageTiming, SubmissionState};

// ---------------------------------------------------------------------------
// SubmissionOutcome
// ---------------------------------------------------------------------------

/// The result of a submission that reached `Succeeded`.
#[derive(Clone, Debug)]
pub struct SubmissionOutcome {
    pub submission_id: SubmissionId,
    /// The anchor record created by this submission.
    pub record: AnchorRecord,
    /// Where the stored bytes can be retrieved.
    pub uri: String,
    /// Per-stage timings in execution order.
    pub stages: Vec<StageTiming>,
    /// Total wall-clock time for the submission.
    pub elapsed: Duration,
}

impl SubmissionOutcome {
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.record.fingerprint
    }

    pub fn receipt(&self) -> &AnchorReceipt {
        &self.record.receipt
    }
}

// ---------------------------------------------------------------------------
// Interruption
// ---------------------------------------------------------------------------

enum Interrupt {
    Cancelled,
    DeadlineExceeded,
}

impl Interrupt {
    fn into_error(self, stage: Stage, fingerprint: Option<Fingerprint>) -> PipelineError {
        let reason = match self {
            Self::Cancelled => "cancelled by caller",
            Self::DeadlineExceeded => "deadline exceeded",
        };
        PipelineError::Cancelled {
            stage,
            reason: reason.into(),
            fingerprint,
        }
    }
}

/// Run `fut` unless the token fires or the deadline passes first.
async fn interruptible<F: Future>(
    fut: F,
    cancel: Option<&CancelToken>,
    deadline: Option<tokio::time::Instant>,
) -> Result<F::Output, Interrupt> {
    let cancelled = async {
        match cancel {
            Some(token) => token.cancelled().await,
            None => std::future::pending().await,
        }
    };
    let expired = async {
        match deadline {
            Some(at) => tokio::time::sleep_until(at).await,
            None => std::future::pending().await,
        }
    };
    tokio::select! {
        biased;
        _ = cancelled => Err(Interrupt::Cancelled),
        _ = expired => Err(Interrupt::DeadlineExceeded),
        output = fut => Ok(output),
    }
}

// ---------------------------------------------------------------------------
// IngestionPipeline
// ---------------------------------------------------------------------------

/// Validate, store, then anchor a document for a subject.
///
/// The pipeline is **fail-fast**: the first stage that fails ends the
/// submission. A store failure never reaches the ledger, and a ledger
/// failure reports the fingerprint that was already stored.
pub struct IngestionPipeline {
    store: Arc<dyn ContentStore>,
    session: RwLock<Option<Arc<LedgerSession>>>,
    registry: Arc<InFlightRegistry>,
    config: PipelineConfig,
}

impl IngestionPipeline {
    /// Create a pipeline without a ledger session. Submissions fail
    /// validation until [`Self::install_session`] is called.
    pub fn new(store: Arc<dyn ContentStore>, config: PipelineConfig) -> Self {
        Self {
            store,
            session: RwLock::new(None),
            registry: Arc::new(InFlightRegistry::new()),
            config,
        }
    }

    pub fn with_session(self, session: Arc<LedgerSession>) -> Self {
        self.install_session(session);
        self
    }

    /// Make `session` the ledger session for all later submissions.
    pub fn install_session(&self, session: Arc<LedgerSession>) {
        tracing::info!(
            account = %session.account(),
            network = %session.network(),
            "ledger session installed"
        );
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
    }

    pub fn session(&self) -> Option<Arc<LedgerSession>> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn has_session(&self) -> bool {
        self.session().is_some()
    }

    pub fn store(&self) -> &Arc<dyn ContentStore> {
        &self.store
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// See [`InFlightRegistry::state`].
    pub fn state(&self, subject: &SubjectId) -> SubmissionState {
        self.registry.state(subject)
    }

    /// Follow the in-flight submission for `subject`.
    pub fn watch(&self, subject: &SubjectId) -> Option<watch::Receiver<SubmissionState>> {
        self.registry.watch(subject)
    }

    pub fn in_flight_count(&self) -> usize {
        self.registry.in_flight_count()
    }

    pub async fn submit(
        &self,
        subject: &str,
        payload: DocumentPayload,
    ) -> PipelineResult<SubmissionOutcome> {
        self.submit_with(subject, payload, SubmitOptions::default())
            .await
    }

    /// Submit with a deadline and/or cancellation token.
    pub async fn submit_with(
        &self,
        subject: &str,
        payload: DocumentPayload,
        options: SubmitOptions,
    ) -> PipelineResult<SubmissionOutcome> {
        let submission_id = SubmissionId::new();
        let span = tracing::info_span!(
            "submission",
            submission_id = %submission_id,
            subject = %subject.trim()
        );
        self.run(submission_id, subject, payload, options)
            .instrument(span)
            .await
    }

    /// Run a submission as its own task.
    pub fn spawn_submit(
        self: &Arc<Self>,
        subject: impl Into<String>,
        payload: DocumentPayload,
        options: SubmitOptions,
    ) -> JoinHandle<PipelineResult<SubmissionOutcome>> {
        let pipeline = Arc::clone(self);
        let subject = subject.into();
        tokio::spawn(async move { pipeline.submit_with(&subject, payload, options).await })
    }

    async fn run(
        &self,
        submission_id: SubmissionId,
        subject: &str,
        payload: DocumentPayload,
        options: SubmitOptions,
    ) -> PipelineResult<SubmissionOutcome> {
        let started = Instant::now();
        let deadline = options
            .deadline
            .or_else(|| self.config.default_deadline())
            .map(|d| tokio::time::Instant::now() + d);
        let cancel = options.cancel.as_ref();
        let mut stages = Vec::with_capacity(3);

        // Validating
        let stage_start = Instant::now();
        let subject = SubjectId::new(subject)
            .map_err(|_| PipelineError::InvalidInput("subject identifier is empty".into()))
            .inspect_err(|e| tracing::warn!(error = %e, "submission refused"))?;
        let session = match self.validate(&payload) {
            Ok(session) => session,
            Err(err) => {
                tracing::warn!(error = %err, "submission refused");
                self.registry
                    .record_outcome(&subject, SubmissionState::failed(&err));
                return Err(err);
            }
        };
        let guard = match self.registry.try_claim(&subject, SubmissionState::Validating) {
            Some(guard) => guard,
            None => {
                tracing::warn!("submission already in progress");
                return Err(PipelineError::SubmissionInProgress { subject });
            }
        };
        stages.push(StageTiming {
            stage: Stage::Validating,
            elapsed: stage_start.elapsed(),
        });

        // Storing
        guard.advance(SubmissionState::Storing);
        tracing::info!(
            stage = %Stage::Storing,
            backend = self.store.backend_name(),
            size = payload.len(),
            "storing document"
        );
        let stage_start = Instant::now();
        let stored = interruptible(self.store.put(&payload), cancel, deadline).await;
        let fingerprint = match stored {
            Ok(Ok(fingerprint)) => fingerprint,
            Ok(Err(e)) => return Err(Self::fail(&guard, Stage::Storing, PipelineError::Store(e))),
            Err(interrupt) => {
                return Err(Self::fail(
                    &guard,
                    Stage::Storing,
                    interrupt.into_error(Stage::Storing, None),
                ))
            }
        };
        drop(payload);
        guard.set_stored(fingerprint.clone());
        stages.push(StageTiming {
            stage: Stage::Storing,
            elapsed: stage_start.elapsed(),
        });

        // Anchoring
        guard.advance(SubmissionState::Anchoring);
        tracing::info!(stage = %Stage::Anchoring, fingerprint = %fingerprint, "anchoring fingerprint");
        let stage_start = Instant::now();
        let anchored = interruptible(session.anchor(&subject, &fingerprint), cancel, deadline).await;
        let receipt = match anchored {
            Ok(Ok(receipt)) => receipt,
            Ok(Err(source)) => {
                return Err(Self::fail(
                    &guard,
                    Stage::Anchoring,
                    PipelineError::Anchor {
                        source,
                        fingerprint,
                    },
                ))
            }
            Err(interrupt) => {
                return Err(Self::fail(
                    &guard,
                    Stage::Anchoring,
                    interrupt.into_error(Stage::Anchoring, Some(fingerprint)),
                ))
            }
        };
        stages.push(StageTiming {
            stage: Stage::Anchoring,
            elapsed: stage_start.elapsed(),
        });

        let record = AnchorRecord {
            subject,
            fingerprint,
            submitter: session.account(),
            receipt,
        };
        guard.advance(SubmissionState::Succeeded {
            fingerprint: record.fingerprint.clone(),
            tx_hash: record.receipt.tx_hash,
        });
        drop(guard);

        let uri = self.store.resolve_uri(&record.fingerprint);
        let elapsed = started.elapsed();
        tracing::info!(
            fingerprint = %record.fingerprint,
            tx_hash = %record.receipt.tx_hash,
            block = %record.receipt.block,
            elapsed_ms = elapsed.as_millis() as u64,
            "document anchored"
        );

        Ok(SubmissionOutcome {
            submission_id,
            record,
            uri,
            stages,
            elapsed,
        })
    }

    fn validate(&self, payload: &DocumentPayload) -> PipelineResult<Arc<LedgerSession>> {
        if payload.is_empty() {
            return Err(PipelineError::InvalidInput("payload is empty".into()));
        }
        self.session()
            .ok_or_else(|| PipelineError::InvalidInput("ledger session not initialized".into()))
    }

    fn fail(guard: &InFlightGuard, stage: Stage, err: PipelineError) -> PipelineError {
        tracing::warn!(
            stage = %stage,
            error_kind = %err.kind(),
            error = %err,
            "submission failed"
        );
        guard.advance(SubmissionState::failed(&err));
        err
    }
}

impl std::fmt::Debug for IngestionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestionPipeline")
            .field("store", &self.store.backend_name())
            .field("session", &self.session())
            .field("registry", &self.registry)
            .finish()
    }
}
