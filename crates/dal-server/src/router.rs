use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use dal_pipeline::IngestionPipeline;
use tower_http::trace::TraceLayer;

use crate::handler;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<IngestionPipeline>,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(pipeline: Arc<IngestionPipeline>, max_body_bytes: usize) -> Self {
        Self {
            pipeline,
            max_body_bytes,
        }
    }
}

/// Build the axum router with all DAL endpoints.
pub fn build_router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.max_body_bytes);
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/info", get(handler::info_handler))
        .route(
            "/v1/subjects/:subject/documents",
            post(handler::submit_handler),
        )
        .route("/v1/subjects/:subject/status", get(handler::status_handler))
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use dal_ledger::{
        development_contract_address, ContractArtifact, InMemoryLedger, LedgerSession,
        StaticSigner,
    };
    use dal_pipeline::PipelineConfig;
    use dal_store::InMemoryContentStore;
    use dal_types::NetworkId;
    use serde_json::Value;
    use tower::util::ServiceExt;

    struct Fixture {
        state: AppState,
        store: Arc<InMemoryContentStore>,
        ledger: Arc<InMemoryLedger>,
    }

    fn fixture_without_session() -> Fixture {
        let store = Arc::new(InMemoryContentStore::new().with_max_payload_bytes(64));
        let ledger = Arc::new(InMemoryLedger::development());
        let pipeline = Arc::new(IngestionPipeline::new(
            store.clone(),
            PipelineConfig::default(),
        ));
        Fixture {
            state: AppState::new(pipeline, 1024),
            store,
            ledger,
        }
    }

    async fn fixture() -> Fixture {
        let fixture = fixture_without_session();
        let session = LedgerSession::connect(
            fixture.ledger.clone(),
            &StaticSigner::from_secret([9u8; 32]),
            &ContractArtifact::single(NetworkId::DEVELOPMENT, development_contract_address()),
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        fixture.state.pipeline.install_session(Arc::new(session));
        fixture
    }

    async fn send(state: &AppState, request: Request<Body>) -> Response {
        build_router(state.clone()).oneshot(request).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_document(subject: &str, body: &'static [u8]) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(format!("/v1/subjects/{subject}/documents"))
            .header("content-type", "application/pdf")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn health_endpoint() {
        let fixture = fixture_without_session();
        let response = send(&fixture.state, get_request("/v1/health")).await;
        assert_eq!(response.status(), 200);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn info_reports_session_readiness() {
        let pending = fixture_without_session();
        let body = json_body(send(&pending.state, get_request("/v1/info")).await).await;
        assert_eq!(body["name"], "dal-server");
        assert_eq!(body["session_ready"], false);
        assert!(body["account"].is_null());

        let ready = fixture().await;
        let body = json_body(send(&ready.state, get_request("/v1/info")).await).await;
        assert_eq!(body["session_ready"], true);
        assert_eq!(body["network"], 5777);
        assert_eq!(body["store_backend"], "memory");
        assert_eq!(body["account"].as_str().unwrap().len(), 64);
    }

    #[tokio::test]
    async fn submit_document_anchors_fingerprint() {
        let fixture = fixture().await;
        let response = send(&fixture.state, post_document("HH1001", b"hello")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;

        let fingerprint = body["fingerprint"].as_str().unwrap().to_string();
        assert!(fingerprint.starts_with("1e20"));
        assert_eq!(body["subject"], "HH1001");
        assert!(body["uri"].as_str().unwrap().ends_with(&fingerprint));
        assert_eq!(body["receipt"]["status"], "confirmed");

        let stored = fixture.store.get(&dal_types::Fingerprint::parse(&fingerprint).unwrap()).unwrap();
        assert_eq!(stored.media_type.as_deref(), Some("application/pdf"));
        assert_eq!(
            fixture
                .ledger
                .anchors_for(&dal_types::SubjectId::new("HH1001").unwrap())
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn empty_body_is_bad_request() {
        let fixture = fixture().await;
        let response = send(&fixture.state, post_document("HH1001", b"")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error_kind"], "InvalidInput");
        assert_eq!(body["retryable"], false);
        assert_eq!(fixture.store.put_calls(), 0);
    }

    #[tokio::test]
    async fn submit_without_session_is_refused() {
        let fixture = fixture_without_session();
        let response = send(&fixture.state, post_document("HH1001", b"hello")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(fixture.store.put_calls(), 0);
    }

    #[tokio::test]
    async fn store_outage_is_bad_gateway() {
        let fixture = fixture().await;
        fixture.store.set_available(false);
        let response = send(&fixture.state, post_document("HH1001", b"hello")).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = json_body(response).await;
        assert_eq!(body["error_kind"], "StoreUnavailable");
        assert_eq!(body["retryable"], true);
        assert_eq!(fixture.ledger.anchor_count(), 0);
    }

    #[tokio::test]
    async fn oversized_document_is_rejected_by_store() {
        let fixture = fixture().await;
        let response = send(&fixture.state, post_document("HH1001", &[7u8; 128])).await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let body = json_body(response).await;
        assert_eq!(body["error_kind"], "StoreRejected");
    }

    #[tokio::test]
    async fn body_over_server_limit_never_reaches_pipeline() {
        let fixture = fixture().await;
        let response = send(&fixture.state, post_document("HH1001", &[7u8; 2048])).await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(fixture.store.put_calls(), 0);
    }

    #[tokio::test]
    async fn status_follows_submission() {
        let fixture = fixture().await;
        let body = json_body(send(&fixture.state, get_request("/v1/subjects/HH1001/status")).await).await;
        assert_eq!(body["subject"], "HH1001");
        assert_eq!(body["state"], "idle");

        send(&fixture.state, post_document("HH1001", b"hello")).await;
        let body = json_body(send(&fixture.state, get_request("/v1/subjects/HH1001/status")).await).await;
        assert_eq!(body["state"], "succeeded");
        assert!(body["fingerprint"].as_str().unwrap().starts_with("1e20"));
    }

    #[tokio::test]
    async fn blank_subject_status_is_bad_request() {
        let fixture = fixture_without_session();
        let response = send(&fixture.state, get_request("/v1/subjects/%20/status")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error_kind"], "InvalidInput");
    }

    #[tokio::test]
    async fn concurrent_submission_for_subject_conflicts() {
        let fixture = fixture_without_session();
        let ledger = Arc::new(
            InMemoryLedger::development().with_confirmation_delay(Duration::from_millis(200)),
        );
        let session = LedgerSession::connect(
            ledger,
            &StaticSigner::from_secret([9u8; 32]),
            &ContractArtifact::single(NetworkId::DEVELOPMENT, development_contract_address()),
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        fixture.state.pipeline.install_session(Arc::new(session));

        let (first, second) = tokio::join!(
            send(&fixture.state, post_document("HH1001", b"first")),
            async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                send(&fixture.state, post_document("HH1001", b"second")).await
            }
        );
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(second.status(), StatusCode::CONFLICT);
        assert_eq!(json_body(second).await["error_kind"], "SubmissionInProgress");
    }
}
