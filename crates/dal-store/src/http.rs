//! Client for an IPFS-compatible HTTP API.
//!
//! Documents are uploaded with `POST /api/v0/add?pin=true` as a single
//! multipart `file` part. The backend answers with a JSON object whose
//! `Hash` field is the content identifier:
//!
//! ```json
//! {"Name":"document","Hash":"QmT78zSuBmuS4z925WZfrqQ1qHaJ56DQaTfyMUF7F8ff5o","Size":"13"}
//! ```
//!
//! Error mapping: transport failures, timeouts, 5xx responses, and 2xx
//! responses without a usable `Hash` are `Unavailable`; 4xx responses and
//! payloads over the configured limit are `Rejected`.

use std::time::Duration;

use async_trait::async_trait;
use dal_types::{DocumentPayload, Fingerprint};
use serde::Deserialize;

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::gateway::Gateway;
use crate::traits::ContentStore;

const ADD_PATH: &str = "api/v0/add";

/// One line of the `add` response.
#[derive(Debug, Deserialize)]
struct AddResponse {
    #[serde(rename = "Name", default)]
    name: Option<String>,
    #[serde(rename = "Hash", default)]
    hash: Option<String>,
    #[serde(rename = "Size", default)]
    size: Option<String>,
}

/// HTTP content store client.
///
/// Wraps a `reqwest::Client` with the backend address and per-request
/// timeout. Retries are not built in: a failed `put` is reported and the
/// caller decides whether to resubmit.
#[derive(Debug)]
pub struct HttpContentStore {
    client: reqwest::Client,
    add_url: url::Url,
    gateway: Gateway,
    max_payload_bytes: Option<usize>,
}

impl HttpContentStore {
    /// Create a client from configuration.
    pub fn new(config: &StoreConfig) -> StoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| StoreError::Config(format!("failed to build HTTP client: {e}")))?;

        let mut add_url = config
            .api_base()?
            .join(ADD_PATH)
            .map_err(|e| StoreError::Config(e.to_string()))?;
        add_url.query_pairs_mut().append_pair("pin", "true");

        Ok(Self {
            client,
            add_url,
            gateway: Gateway::parse(&config.gateway_base)?,
            max_payload_bytes: config.max_payload_bytes,
        })
    }

    /// The full upload endpoint.
    pub fn add_url(&self) -> &url::Url {
        &self.add_url
    }

    fn build_form(payload: &DocumentPayload) -> StoreResult<reqwest::multipart::Form> {
        let mut part = reqwest::multipart::Part::bytes(payload.bytes().to_vec()).file_name("document");
        if let Some(media_type) = payload.media_type() {
            part = part
                .mime_str(media_type)
                .map_err(|_| StoreError::Rejected(format!("invalid media type {media_type:?}")))?;
        }
        Ok(reqwest::multipart::Form::new().part("file", part))
    }

    /// Extract the fingerprint from an `add` response body.
    ///
    /// The API streams newline-delimited JSON; the last object describes the
    /// uploaded file.
    fn parse_add_response(body: &str) -> StoreResult<Fingerprint> {
        let line = body
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .last()
            .ok_or_else(|| StoreError::Unavailable("no fingerprint returned".into()))?;

        let response: AddResponse = serde_json::from_str(line)
            .map_err(|e| StoreError::Unavailable(format!("malformed add response: {e}")))?;

        let hash = response
            .hash
            .filter(|hash| !hash.is_empty())
            .ok_or_else(|| StoreError::Unavailable("no fingerprint returned".into()))?;

        tracing::debug!(
            name = ?response.name,
            size = ?response.size,
            hash = %hash,
            "store accepted document"
        );

        Fingerprint::parse(hash)
            .map_err(|e| StoreError::Unavailable(format!("backend returned {e}")))
    }
}

#[async_trait]
impl ContentStore for HttpContentStore {
    async fn put(&self, payload: &DocumentPayload) -> StoreResult<Fingerprint> {
        if payload.is_empty() {
            return Err(StoreError::EmptyPayload);
        }
        if let Some(limit) = self.max_payload_bytes {
            if payload.len() > limit {
                return Err(StoreError::Rejected(format!(
                    "payload of {} bytes exceeds limit of {limit} bytes",
                    payload.len()
                )));
            }
        }

        let form = Self::build_form(payload)?;
        let response = self
            .client
            .post(self.add_url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    StoreError::Unavailable(format!("timed out calling {}", self.add_url))
                } else {
                    StoreError::Unavailable(format!("{}: {e}", self.add_url))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StoreError::Unavailable(format!("failed to read add response: {e}")))?;

        if status.is_server_error() {
            tracing::warn!(%status, "store backend error");
            return Err(StoreError::Unavailable(format!("HTTP {status}: {}", excerpt(&body))));
        }
        if status.is_client_error() {
            tracing::warn!(%status, "store refused document");
            return Err(StoreError::Rejected(format!("HTTP {status}: {}", excerpt(&body))));
        }
        if !status.is_success() {
            return Err(StoreError::Unavailable(format!("unexpected HTTP {status}")));
        }

        Self::parse_add_response(&body)
    }

    fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    fn backend_name(&self) -> &'static str {
        "http"
    }
}

/// First 200 characters of a response body, for error messages.
fn excerpt(body: &str) -> &str {
    match body.char_indices().nth(200) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
