//! Content-addressed document storage for the Document Anchor Ledger.
//!
//! A store client turns document bytes into a [`Fingerprint`] and durably
//! persists the bytes under it. The fingerprint is then the only thing the
//! ledger ever sees.
//!
//! # Storage Backends
//!
//! All backends implement the [`ContentStore`] trait:
//!
//! - [`InMemoryContentStore`] -- `HashMap`-based store for tests and local runs
//! - [`HttpContentStore`] -- client for an IPFS-compatible HTTP API
//!
//! # Design Rules
//!
//! 1. `put` is idempotent: identical bytes always yield the identical fingerprint.
//! 2. Deduplication of physical copies is the backend's concern.
//! 3. Empty payloads are refused before any backend I/O.
//! 4. Stored bytes are retrievable at `<gateway>/<fingerprint>`.
//! 5. All backend errors are propagated, never silently ignored.

pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod memory;
pub mod traits;

use std::sync::Arc;

pub use config::{StoreBackend, StoreConfig};
pub use error::{StoreError, StoreErrorKind, StoreResult};
pub use gateway::Gateway;
pub use http::HttpContentStore;
pub use memory::{InMemoryContentStore, StoredDocument};
pub use traits::ContentStore;

use dal_types::Fingerprint;

/// Build the store client selected by `config`.
pub fn open_store(config: &StoreConfig) -> StoreResult<Arc<dyn ContentStore>> {
    let gateway = Gateway::parse(&config.gateway_base)?;
    match config.backend {
        StoreBackend::Memory => {
            let mut store = InMemoryContentStore::new().with_gateway(gateway);
            if let Some(limit) = config.max_payload_bytes {
                store = store.with_max_payload_bytes(limit);
            }
            Ok(Arc::new(store))
        }
        StoreBackend::Http => Ok(Arc::new(HttpContentStore::new(config)?)),
    }
}

/// Retrieval URI of a fingerprint under the default public gateway.
pub fn default_uri(fingerprint: &Fingerprint) -> String {
    Gateway::default().resolve(fingerprint)
}
