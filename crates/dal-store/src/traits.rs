use async_trait::async_trait;
use dal_types::{DocumentPayload, Fingerprint};

use crate::error::StoreResult;
use crate::gateway::Gateway;

/// Content-addressed document store client.
///
/// All implementations must satisfy these invariants:
/// - `put` with identical bytes returns the identical fingerprint.
/// - An empty payload fails with `EmptyPayload` before any backend I/O.
/// - Once `put` returns, the bytes are durably retrievable at
///   [`ContentStore::resolve_uri`].
/// - Backend failures surface as `Unavailable` or `Rejected`, never as success.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Store the payload bytes and return their fingerprint.
    async fn put(&self, payload: &DocumentPayload) -> StoreResult<Fingerprint>;

    /// The retrieval convention of this store.
    fn gateway(&self) -> &Gateway;

    /// Short backend name for logs and diagnostics.
    fn backend_name(&self) -> &'static str;

    /// The URI at which the bytes for `fingerprint` can be retrieved.
    fn resolve_uri(&self, fingerprint: &Fingerprint) -> String {
        self.gateway().resolve(fingerprint)
    }
}
