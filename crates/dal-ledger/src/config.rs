use std::path::PathBuf;
use std::time::Duration;

use dal_types::{AccountId, NetworkId};
use serde::{Deserialize, Serialize};

use crate::contract::{development_contract_address, ContractArtifact};
use crate::error::{LedgerError, LedgerResult};
use crate::memory::InMemoryLedger;
use crate::signer::StaticSigner;

/// Ledger connection and signer settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub network_id: u64,
    /// Contract address used when no artifact file is given.
    pub contract_address: Option<String>,
    /// Path to a contract build artifact (`networks` keyed by network id).
    pub artifact_path: Option<PathBuf>,
    /// Hex-encoded 32-byte signer secret.
    pub signer_seed_hex: Option<String>,
    /// Generate a throwaway signer when no seed is configured.
    pub ephemeral_signer: bool,
    pub confirmation_timeout_ms: u64,
    /// Delay between attempts to establish the session.
    pub session_retry_ms: u64,
    /// Accounts allowed to anchor on the development ledger. Empty allows all.
    pub authorized_accounts: Vec<String>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            network_id: NetworkId::DEVELOPMENT.as_u64(),
            contract_address: None,
            artifact_path: None,
            signer_seed_hex: None,
            ephemeral_signer: true,
            confirmation_timeout_ms: 30_000,
            session_retry_ms: 2_000,
            authorized_accounts: Vec::new(),
        }
    }
}

impl LedgerConfig {
    pub fn network(&self) -> NetworkId {
        NetworkId(self.network_id)
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_millis(self.confirmation_timeout_ms)
    }

    pub fn session_retry(&self) -> Duration {
        Duration::from_millis(self.session_retry_ms)
    }

    /// Signer source: the configured seed, else an ephemeral key if allowed.
    pub fn signer_provider(&self) -> LedgerResult<StaticSigner> {
        match (&self.signer_seed_hex, self.ephemeral_signer) {
            (Some(seed), _) => StaticSigner::from_hex(seed),
            (None, true) => Ok(StaticSigner::ephemeral()),
            (None, false) => Ok(StaticSigner::none()),
        }
    }

    /// The contract artifact: from file, from the configured address, or the
    /// development default, in that order of preference.
    pub fn artifact(&self) -> LedgerResult<ContractArtifact> {
        if let Some(path) = &self.artifact_path {
            return ContractArtifact::load(path);
        }
        let address = match &self.contract_address {
            Some(hex) => AccountId::from_hex(hex)
                .map_err(|e| LedgerError::InvalidArtifact(format!("contract address: {e}")))?,
            None => development_contract_address(),
        };
        Ok(ContractArtifact::single(self.network(), address))
    }

    pub fn authorized_accounts(&self) -> LedgerResult<Vec<AccountId>> {
        self.authorized_accounts
            .iter()
            .map(|hex| {
                AccountId::from_hex(hex).map_err(|e| {
                    LedgerError::IdentityUnavailable(format!("authorized account {hex:?}: {e}"))
                })
            })
            .collect()
    }

    /// A development ledger serving this network, with the artifact's
    /// contract deployed if the artifact knows the network.
    pub fn development_ledger(&self) -> LedgerResult<InMemoryLedger> {
        let mut ledger = InMemoryLedger::new(self.network());
        match self.artifact()?.binding_for(self.network()) {
            Ok(binding) => ledger = ledger.with_contract(binding.address),
            Err(LedgerError::NetworkMismatch { .. }) => {
                tracing::warn!(network = %self.network(), "artifact has no deployment for network");
            }
            Err(e) => return Err(e),
        }
        let authorized = self.authorized_accounts()?;
        if !authorized.is_empty() {
            ledger = ledger.with_authorized_accounts(authorized);
        }
        Ok(ledger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::SignerProvider;

    #[test]
    fn defaults() {
        let config = LedgerConfig::default();
        assert_eq!(config.network(), NetworkId::DEVELOPMENT);
        assert_eq!(config.confirmation_timeout(), Duration::from_secs(30));
        assert!(config.ephemeral_signer);
        assert_eq!(
            config
                .artifact()
                .unwrap()
                .binding_for(NetworkId::DEVELOPMENT)
                .unwrap()
                .address,
            development_contract_address()
        );
    }

    #[tokio::test]
    async fn seed_takes_precedence() {
        let config = LedgerConfig {
            signer_seed_hex: Some("22".repeat(32)),
            ..Default::default()
        };
        let a = config.signer_provider().unwrap().request_identity().await.unwrap();
        let b = config.signer_provider().unwrap().request_identity().await.unwrap();
        assert_eq!(a.account(), b.account());
    }

    #[tokio::test]
    async fn no_seed_and_no_ephemeral_has_no_identity() {
        let config = LedgerConfig {
            ephemeral_signer: false,
            ..Default::default()
        };
        assert!(config
            .signer_provider()
            .unwrap()
            .request_identity()
            .await
            .is_err());
    }

    #[test]
    fn bad_contract_address_is_invalid_artifact() {
        let config = LedgerConfig {
            contract_address: Some("0xnothex".into()),
            ..Default::default()
        };
        assert!(matches!(config.artifact(), Err(LedgerError::InvalidArtifact(_))));
    }

    #[test]
    fn development_ledger_deploys_bound_contract() {
        let config = LedgerConfig {
            network_id: 1337,
            ..Default::default()
        };
        let ledger = config.development_ledger().unwrap();
        assert_eq!(ledger.network(), NetworkId(1337));
    }

    #[test]
    fn artifact_without_network_still_builds_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifact.json");
        std::fs::write(
            &path,
            r#"{"contractName":"PatientRegistration","networks":{"1":{"address":"0x5b1869d9a4c187f2eaa108f3062412ecf0526b24"}}}"#,
        )
        .unwrap();
        let config = LedgerConfig {
            artifact_path: Some(path),
            ..Default::default()
        };
        assert!(config.development_ledger().is_ok());
        assert!(matches!(
            config.artifact().unwrap().binding_for(config.network()),
            Err(LedgerError::NetworkMismatch { .. })
        ));
    }

    #[test]
    fn parses_authorized_accounts() {
        let config = LedgerConfig {
            authorized_accounts: vec!["0x5b1869d9a4c187f2eaa108f3062412ecf0526b24".into()],
            ..Default::default()
        };
        assert_eq!(config.authorized_accounts().unwrap().len(), 1);

        let bad = LedgerConfig {
            authorized_accounts: vec!["zz".into()],
            ..Default::default()
        };
        assert!(bad.authorized_accounts().is_err());
    }
}
