use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use bytes::Bytes;
use dal_types::{DocumentPayload, Fingerprint};

use crate::error::{StoreError, StoreResult};
use crate::gateway::Gateway;
use crate::traits::ContentStore;

/// A document held by the in-memory store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredDocument {
    pub fingerprint: Fingerprint,
    pub bytes: Bytes,
    pub media_type: Option<String>,
}

/// In-memory, HashMap-based content store.
///
/// Intended for tests and local runs. Fingerprints are BLAKE3 multihashes
/// computed locally, so identical bytes map to one entry. The store can be
/// switched offline to simulate an unreachable backend, and can enforce a
/// payload size limit to simulate backend refusal.
pub struct InMemoryContentStore {
    documents: RwLock<HashMap<Fingerprint, StoredDocument>>,
    gateway: Gateway,
    max_payload_bytes: Option<usize>,
    available: AtomicBool,
    put_calls: AtomicU64,
}

impl InMemoryContentStore {
    /// Create a new empty, available store with no size limit.
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
            gateway: Gateway::default(),
            max_payload_bytes: None,
            available: AtomicBool::new(true),
            put_calls: AtomicU64::new(0),
        }
    }

    pub fn with_gateway(mut self, gateway: Gateway) -> Self {
        self.gateway = gateway;
        self
    }

    /// Refuse payloads larger than `limit` bytes.
    pub fn with_max_payload_bytes(mut self, limit: usize) -> Self {
        self.max_payload_bytes = Some(limit);
        self
    }

    /// Take the store online or offline.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    /// Number of `put` calls received, including failed ones.
    pub fn put_calls(&self) -> u64 {
        self.put_calls.load(Ordering::SeqCst)
    }

    /// Look up a stored document by fingerprint.
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<StoredDocument> {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(fingerprint)
            .cloned()
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(fingerprint)
    }

    /// Number of distinct documents stored.
    pub fn len(&self) -> usize {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total bytes across all stored documents.
    pub fn total_bytes(&self) -> u64 {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|doc| doc.bytes.len() as u64)
            .sum()
    }
}

impl Default for InMemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn put(&self, payload: &DocumentPayload) -> StoreResult<Fingerprint> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);

        if payload.is_empty() {
            return Err(StoreError::EmptyPayload);
        }
        if !self.is_available() {
            return Err(StoreError::Unavailable("in-memory store is offline".into()));
        }
        if let Some(limit) = self.max_payload_bytes {
            if payload.len() > limit {
                return Err(StoreError::Rejected(format!(
                    "payload of {} bytes exceeds limit of {limit} bytes",
                    payload.len()
                )));
            }
        }

        let fingerprint = payload.fingerprint();
        let mut documents = self
            .documents
            .write()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))?;
        // Idempotent: the first copy wins, later copies are identical bytes.
        documents
            .entry(fingerprint.clone())
            .or_insert_with(|| StoredDocument {
                fingerprint: fingerprint.clone(),
                bytes: payload.bytes().clone(),
                media_type: payload.media_type().map(str::to_string),
            });
        tracing::debug!(fingerprint = %fingerprint, size = payload.len(), "stored document in memory");
        Ok(fingerprint)
    }

    fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

impl std::fmt::Debug for InMemoryContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryContentStore")
            .field("document_count", &self.len())
            .field("available", &self.is_available())
            .finish()
    }
}
