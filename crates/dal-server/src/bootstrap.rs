use std::sync::Arc;
use std::time::Duration;

use dal_ledger::{LedgerBackend, LedgerConfig, LedgerResult, LedgerSession, SignerProvider};
use dal_pipeline::IngestionPipeline;
use tokio::task::JoinHandle;

/// Establishes the ledger session and installs it into the pipeline.
///
/// Submissions are refused with `InvalidInput` until an attempt succeeds.
#[derive(Clone)]
pub struct SessionConnector {
    backend: Arc<dyn LedgerBackend>,
    signers: Arc<dyn SignerProvider>,
    ledger: LedgerConfig,
    pipeline: Arc<IngestionPipeline>,
}

impl SessionConnector {
    pub fn new(
        backend: Arc<dyn LedgerBackend>,
        signers: Arc<dyn SignerProvider>,
        ledger: LedgerConfig,
        pipeline: Arc<IngestionPipeline>,
    ) -> Self {
        Self {
            backend,
            signers,
            ledger,
            pipeline,
        }
    }

    /// One attempt. The artifact is reloaded each time so a corrected file
    /// is picked up without a restart.
    pub async fn connect_once(&self) -> LedgerResult<Arc<LedgerSession>> {
        let artifact = self.ledger.artifact()?;
        let session = LedgerSession::connect(
            Arc::clone(&self.backend),
            self.signers.as_ref(),
            &artifact,
            self.ledger.confirmation_timeout(),
        )
        .await?;
        let session = Arc::new(session);
        self.pipeline.install_session(Arc::clone(&session));
        Ok(session)
    }

    /// Retry [`Self::connect_once`] every `session_retry_ms` until it succeeds.
    pub async fn run(self) -> Arc<LedgerSession> {
        let retry = self.ledger.session_retry().max(Duration::from_millis(1));
        let mut attempt: u64 = 0;
        loop {
            attempt += 1;
            match self.connect_once().await {
                Ok(session) => return session,
                Err(e) => {
                    tracing::warn!(
                        attempt,
                        error_kind = %e.kind(),
                        error = %e,
                        retry_ms = retry.as_millis() as u64,
                        "ledger session not established"
                    );
                    tokio::time::sleep(retry).await;
                }
            }
        }
    }

    pub fn spawn(self) -> JoinHandle<Arc<LedgerSession>> {
        tokio::spawn(self.run())
    }
}
