use dal_types::Fingerprint;

use crate::error::{StoreError, StoreResult};

/// Public gateway base used when none is configured.
pub const DEFAULT_GATEWAY: &str = "https://ipfs.io/ipfs";

/// Retrieval URI convention of a store: `<gateway-base>/<fingerprint>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Gateway {
    base: String,
}

impl Gateway {
    /// Validate a gateway base URL. Trailing slashes are dropped.
    pub fn parse(base: &str) -> StoreResult<Self> {
        let parsed = url::Url::parse(base)
            .map_err(|e| StoreError::Config(format!("invalid gateway base {base:?}: {e}")))?;
        if parsed.cannot_be_a_base() {
            return Err(StoreError::Config(format!(
                "gateway base {base:?} cannot carry a path"
            )));
        }
        Ok(Self {
            base: base.trim_end_matches('/').to_string(),
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// The URI at which the bytes for `fingerprint` can be retrieved.
    pub fn resolve(&self, fingerprint: &Fingerprint) -> String {
        format!("{}/{}", self.base, fingerprint)
    }
}

impl Default for Gateway {
    fn default() -> Self {
        Self {
            base: DEFAULT_GATEWAY.to_string(),
        }
    }
}
