use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cancel::CancelToken;

/// Configuration for the ingestion pipeline.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Deadline applied to submissions that do not bring their own.
    /// `None` waits as long as the store and ledger allow.
    pub default_deadline_ms: Option<u64>,
}

impl PipelineConfig {
    pub fn default_deadline(&self) -> Option<Duration> {
        self.default_deadline_ms.map(Duration::from_millis)
    }
}

/// Per-submission controls.
#[derive(Clone, Debug, Default)]
pub struct SubmitOptions {
    /// Give up if the submission has not finished within this long.
    pub deadline: Option<Duration>,
    /// Give up when this token is cancelled.
    pub cancel: Option<CancelToken>,
}

impl SubmitOptions {
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}
