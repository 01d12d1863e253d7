use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use dal_pipeline::{ErrorKind, PipelineError};
use dal_types::Fingerprint;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store error: {0}")]
    Store(#[from] dal_store::StoreError),

    #[error("ledger error: {0}")]
    Ledger(#[from] dal_ledger::LedgerError),
}

pub type ServerResult<T> = Result<T, ServerError>;

/// Error body returned by every API endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error_kind: ErrorKind,
    pub message: String,
    /// Set when the document was stored before the submission failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<Fingerprint>,
    pub retryable: bool,
}

/// A failed request, rendered as a status code and [`ErrorBody`].
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            status: status_for(kind),
            body: ErrorBody {
                error_kind: kind,
                message: message.into(),
                fingerprint: None,
                retryable: kind.is_retryable(),
            },
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &ErrorBody {
        &self.body
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        let mut api = Self::new(err.kind(), err.to_string());
        api.body.fingerprint = err.stored_fingerprint().cloned();
        api
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// HTTP status for each failure kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidInput | ErrorKind::EmptyPayload => StatusCode::BAD_REQUEST,
        ErrorKind::SubmissionInProgress => StatusCode::CONFLICT,
        ErrorKind::StoreRejected => StatusCode::PAYLOAD_TOO_LARGE,
        ErrorKind::StoreUnavailable => StatusCode::BAD_GATEWAY,
        ErrorKind::TransactionRejected => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::TransactionTimeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::NetworkMismatch
        | ErrorKind::IdentityUnavailable
        | ErrorKind::InvalidArtifact => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Cancelled => StatusCode::REQUEST_TIMEOUT,
    }
}
