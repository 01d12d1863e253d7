use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap};
use axum::response::Json;
use dal_pipeline::{ErrorKind, SubmissionOutcome, SubmissionState};
use dal_types::{AccountId, AnchorReceipt, DocumentPayload, Fingerprint, SubjectId, SubmissionId};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::ApiError;
use crate::router::AppState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".into(),
            version: env!("CARGO_PKG_VERSION").into(),
        }
    }
}

/// Body of a successful document submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub submission_id: SubmissionId,
    pub subject: SubjectId,
    pub fingerprint: Fingerprint,
    pub uri: String,
    pub receipt: AnchorReceipt,
    pub submitter: AccountId,
    pub elapsed_ms: u64,
}

impl From<SubmissionOutcome> for SubmitResponse {
    fn from(outcome: SubmissionOutcome) -> Self {
        Self {
            submission_id: outcome.submission_id,
            subject: outcome.record.subject,
            fingerprint: outcome.record.fingerprint,
            uri: outcome.uri,
            receipt: outcome.record.receipt,
            submitter: outcome.record.submitter,
            elapsed_ms: outcome.elapsed.as_millis() as u64,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct StatusResponse {
    pub subject: SubjectId,
    #[serde(flatten)]
    pub state: SubmissionState,
}

/// Health check handler.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

/// Info handler.
pub async fn info_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let session = state.pipeline.session();
    Json(json!({
        "name": "dal-server",
        "version": env!("CARGO_PKG_VERSION"),
        "store_backend": state.pipeline.store().backend_name(),
        "session_ready": session.is_some(),
        "network": session.as_ref().map(|s| s.network()),
        "account": session.as_ref().map(|s| s.account().to_hex()),
        "contract": session.as_ref().map(|s| s.binding().address.to_hex()),
        "in_flight": state.pipeline.in_flight_count(),
    }))
}

/// Store the request body and anchor its fingerprint against the subject.
pub async fn submit_handler(
    State(state): State<AppState>,
    Path(subject): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SubmitResponse>, ApiError> {
    let mut payload = DocumentPayload::new(body);
    if let Some(media_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
    {
        payload = payload.with_media_type(media_type);
    }
    let outcome = state.pipeline.submit(&subject, payload).await?;
    Ok(Json(SubmitResponse::from(outcome)))
}

/// Current, or most recent, submission state for a subject.
pub async fn status_handler(
    State(state): State<AppState>,
    Path(subject): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let subject = SubjectId::new(&subject)
        .map_err(|e| ApiError::new(ErrorKind::InvalidInput, e.to_string()))?;
    let current = state.pipeline.state(&subject);
    Ok(Json(StatusResponse {
        subject,
        state: current,
    }))
}
