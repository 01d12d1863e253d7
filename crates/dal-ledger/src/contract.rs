//! Contract artifacts and per-network bindings.
//!
//! An artifact is the build output of the anchoring contract. It lists the
//! contract ABI and, per network id, the address the contract was deployed
//! at:
//!
//! ```json
//! {
//!   "contractName": "PatientRegistration",
//!   "abi": [{"type": "function", "name": "storePatientDocument"}],
//!   "networks": {"5777": {"address": "0x5b1869d9a4c187f2eaa108f3062412ecf0526b24"}}
//! }
//! ```
//!
//! Binding resolution fails closed: a network id without a deployment entry
//! is a [`LedgerError::NetworkMismatch`], never a fallback address.

use std::collections::BTreeMap;
use std::path::Path;

use dal_types::{AccountId, NetworkId};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};

/// Contract method that records `(subject, fingerprint)`.
pub const ANCHOR_METHOD: &str = "storePatientDocument";

/// Name of the anchoring contract used when none is given.
pub const DEFAULT_CONTRACT_NAME: &str = "PatientRegistration";

/// A single deployment of the contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub address: String,
}

/// Build artifact of the anchoring contract.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContractArtifact {
    #[serde(rename = "contractName")]
    pub contract_name: String,
    #[serde(default)]
    pub abi: serde_json::Value,
    #[serde(default)]
    pub networks: BTreeMap<String, Deployment>,
}

/// The contract instance a session talks to.
///
/// Contract addresses use the same 20-byte format as accounts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractBinding {
    pub contract_name: String,
    pub network: NetworkId,
    pub address: AccountId,
    pub method: String,
}

impl ContractArtifact {
    /// Artifact with a single deployment and a minimal ABI.
    pub fn single(network: NetworkId, address: AccountId) -> Self {
        let mut networks = BTreeMap::new();
        networks.insert(
            network.to_string(),
            Deployment {
                address: address.to_hex(),
            },
        );
        Self {
            contract_name: DEFAULT_CONTRACT_NAME.into(),
            abi: serde_json::json!([{
                "type": "function",
                "name": ANCHOR_METHOD,
                "inputs": [
                    {"name": "hhNumber", "type": "string"},
                    {"name": "documentHash", "type": "string"}
                ]
            }]),
            networks,
        }
    }

    pub fn from_json(json: &str) -> LedgerResult<Self> {
        serde_json::from_str(json).map_err(|e| LedgerError::InvalidArtifact(e.to_string()))
    }

    /// Read an artifact file.
    pub fn load(path: &Path) -> LedgerResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            LedgerError::InvalidArtifact(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    /// Whether the ABI declares a function called `name`.
    ///
    /// An artifact without ABI entries is treated as declaring everything.
    pub fn declares_method(&self, name: &str) -> bool {
        match self.abi.as_array() {
            Some(entries) if !entries.is_empty() => entries.iter().any(|entry| {
                entry.get("name").and_then(|n| n.as_str()) == Some(name)
                    && entry.get("type").and_then(|t| t.as_str()).unwrap_or("function") == "function"
            }),
            _ => true,
        }
    }

    /// Resolve the deployment for `network`.
    pub fn binding_for(&self, network: NetworkId) -> LedgerResult<ContractBinding> {
        let deployment = self
            .networks
            .get(&network.to_string())
            .ok_or(LedgerError::NetworkMismatch { network })?;

        let address = AccountId::from_hex(&deployment.address).map_err(|e| {
            LedgerError::InvalidArtifact(format!(
                "bad address {:?} for network {network}: {e}",
                deployment.address
            ))
        })?;

        if !self.declares_method(ANCHOR_METHOD) {
            return Err(LedgerError::InvalidArtifact(format!(
                "{} does not declare {ANCHOR_METHOD}",
                self.contract_name
            )));
        }

        Ok(ContractBinding {
            contract_name: self.contract_name.clone(),
            network,
            address,
            method: ANCHOR_METHOD.into(),
        })
    }
}

/// Deterministic contract address used by development ledgers.
pub fn development_contract_address() -> AccountId {
    AccountId::from_public_key(&dal_crypto::ContentHasher::CONTRACT.hash(
        DEFAULT_CONTRACT_NAME.as_bytes(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTIFACT: &str = r#"{
        "contractName": "PatientRegistration",
        "abi": [
            {"type": "constructor"},
            {"type": "function", "name": "storePatientDocument"},
            {"type": "event", "name": "DocumentStored"}
        ],
        "networks": {
            "5777": {"address": "0x5b1869d9a4c187f2eaa108f3062412ecf0526b24"}
        }
    }"#;

    #[test]
    fn resolves_known_network() {
        let artifact = ContractArtifact::from_json(ARTIFACT).unwrap();
        let binding = artifact.binding_for(NetworkId::DEVELOPMENT).unwrap();
        assert_eq!(binding.contract_name, "PatientRegistration");
        assert_eq!(binding.method, ANCHOR_METHOD);
        assert_eq!(
            binding.address.to_hex(),
            "0x5b1869d9a4c187f2eaa108f3062412ecf0526b24"
        );
    }

    #[test]
    fn unknown_network_is_mismatch() {
        let artifact = ContractArtifact::from_json(ARTIFACT).unwrap();
        assert_eq!(
            artifact.binding_for(NetworkId(1)).unwrap_err(),
            LedgerError::NetworkMismatch {
                network: NetworkId(1)
            }
        );
    }

    #[test]
    fn malformed_json_is_invalid_artifact() {
        let err = ContractArtifact::from_json("{not json").unwrap_err();
        assert!(matches!(err, LedgerError::InvalidArtifact(_)));
    }

    #[test]
    fn bad_address_is_invalid_artifact() {
        let artifact = ContractArtifact::from_json(
            r#"{"contractName":"X","networks":{"1":{"address":"0x1234"}}}"#,
        )
        .unwrap();
        assert!(matches!(
            artifact.binding_for(NetworkId(1)),
            Err(LedgerError::InvalidArtifact(_))
        ));
    }

    #[test]
    fn abi_without_anchor_method_is_invalid() {
        let artifact = ContractArtifact::from_json(
            r#"{"contractName":"X","abi":[{"type":"function","name":"other"}],
                "networks":{"1":{"address":"0x5b1869d9a4c187f2eaa108f3062412ecf0526b24"}}}"#,
        )
        .unwrap();
        assert!(matches!(
            artifact.binding_for(NetworkId(1)),
            Err(LedgerError::InvalidArtifact(_))
        ));
    }

    #[test]
    fn single_deployment_roundtrips_through_json() {
        let address = development_contract_address();
        let artifact = ContractArtifact::single(NetworkId(42), address);
        let json = serde_json::to_string(&artifact).unwrap();
        let parsed = ContractArtifact::from_json(&json).unwrap();
        assert_eq!(parsed.binding_for(NetworkId(42)).unwrap().address, address);
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("PatientRegistration.json");
        std::fs::write(&path, ARTIFACT).unwrap();
        assert!(ContractArtifact::load(&path).is_ok());
        assert!(matches!(
            ContractArtifact::load(&dir.path().join("missing.json")),
            Err(LedgerError::InvalidArtifact(_))
        ));
    }
}
