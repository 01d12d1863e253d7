use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::gateway::DEFAULT_GATEWAY;

/// Which store client to build.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local store (development and tests).
    Memory,
    /// IPFS-compatible HTTP API.
    Http,
}

/// Configuration for the content store client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// `http` or `https`.
    pub protocol: String,
    pub host: String,
    pub port: u16,
    /// Base of the retrieval URI (`<gateway_base>/<fingerprint>`).
    pub gateway_base: String,
    /// Largest payload accepted, checked before any backend I/O.
    pub max_payload_bytes: Option<usize>,
    /// Per-request timeout for the HTTP backend.
    pub timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            protocol: "http".into(),
            host: "localhost".into(),
            port: 5001,
            gateway_base: DEFAULT_GATEWAY.into(),
            max_payload_bytes: None,
            timeout_ms: 30_000,
        }
    }
}

impl StoreConfig {
    /// Configuration for an HTTP store at `protocol://host:port`.
    pub fn http(protocol: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            backend: StoreBackend::Http,
            protocol: protocol.into(),
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Base URL of the HTTP API, e.g. `http://localhost:5001/`.
    pub fn api_base(&self) -> StoreResult<url::Url> {
        if self.protocol != "http" && self.protocol != "https" {
            return Err(StoreError::Config(format!(
                "unsupported protocol {:?}",
                self.protocol
            )));
        }
        let raw = format!("{}://{}:{}/", self.protocol, self.host, self.port);
        url::Url::parse(&raw).map_err(|e| StoreError::Config(format!("invalid store address {raw:?}: {e}")))
    }
}
