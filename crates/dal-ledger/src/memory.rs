use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use dal_types::{
    AccountId, AnchorReceipt, AnchorRecord, BlockRef, NetworkId, SubjectId, TxHash, TxStatus,
};
use tokio::sync::Notify;

use crate::backend::LedgerBackend;
use crate::block::{verify_blocks, Block, ChainError};
use crate::contract::{development_contract_address, ANCHOR_METHOD};
use crate::error::{LedgerError, LedgerResult};
use crate::transaction::SignedTransaction;

#[derive(Default)]
struct LedgerState {
    contracts: HashSet<AccountId>,
    authorized: Option<HashSet<AccountId>>,
    nonces: HashMap<AccountId, u64>,
    blocks: Vec<Block>,
    receipts: HashMap<TxHash, AnchorReceipt>,
    known: HashSet<TxHash>,
    pending: Vec<(TxHash, SignedTransaction)>,
    anchors: Vec<AnchorRecord>,
    halted: bool,
}

impl LedgerState {
    /// Mine `tx` into a new block and record its outcome.
    fn mine(&mut self, tx_hash: TxHash, tx: SignedTransaction) -> AnchorReceipt {
        let sender = tx.tx.from;
        let status = match &self.authorized {
            Some(allowed) if !allowed.contains(&sender) => TxStatus::Reverted {
                reason: "caller unauthorized".into(),
            },
            _ => TxStatus::Confirmed,
        };

        let block = Block::seal(
            self.blocks.last(),
            tx_hash,
            sender,
            !status.is_confirmed(),
            Utc::now(),
        );
        let (number, hash, timestamp) = (block.number, block.hash, block.timestamp);
        self.blocks.push(block);

        let receipt = AnchorReceipt {
            tx_hash,
            block: BlockRef { number, hash },
            status,
            confirmed_at: timestamp,
        };

        if receipt.is_confirmed() {
            self.anchors.push(AnchorRecord {
                subject: tx.tx.call.subject,
                fingerprint: tx.tx.call.fingerprint,
                submitter: sender,
                receipt: receipt.clone(),
            });
        }
        self.receipts.insert(tx_hash, receipt.clone());
        receipt
    }
}

/// In-process development ledger.
///
/// Serves a single network id, hosts a set of deployed anchoring contracts,
/// and mines every accepted transaction into its own hash-chained block.
/// Confirmations can be delayed or halted to exercise timeout handling.
pub struct InMemoryLedger {
    network: NetworkId,
    confirmation_delay: Duration,
    inner: RwLock<LedgerState>,
    mined: Notify,
}

impl InMemoryLedger {
    /// An empty ledger with no contracts deployed.
    pub fn new(network: NetworkId) -> Self {
        Self {
            network,
            confirmation_delay: Duration::ZERO,
            inner: RwLock::new(LedgerState::default()),
            mined: Notify::new(),
        }
    }

    /// A development-network ledger with the default contract deployed.
    pub fn development() -> Self {
        Self::new(NetworkId::DEVELOPMENT).with_contract(development_contract_address())
    }

    pub fn with_contract(mut self, address: AccountId) -> Self {
        self.state_mut().contracts.insert(address);
        self
    }

    /// Only these accounts may anchor; others get a reverted receipt.
    pub fn with_authorized_accounts(mut self, accounts: impl IntoIterator<Item = AccountId>) -> Self {
        self.state_mut().authorized = Some(accounts.into_iter().collect());
        self
    }

    /// Delay every confirmation by `delay`.
    pub fn with_confirmation_delay(mut self, delay: Duration) -> Self {
        self.confirmation_delay = delay;
        self
    }

    pub fn network(&self) -> NetworkId {
        self.network
    }

    pub fn deploy_contract(&self, address: AccountId) {
        self.write().contracts.insert(address);
    }

    /// Add `account` to the allow-list, creating the list if needed.
    pub fn authorize(&self, account: AccountId) {
        self.write()
            .authorized
            .get_or_insert_with(HashSet::new)
            .insert(account);
    }

    /// Stop or resume mining. Resuming mines everything that queued up.
    pub fn set_halted(&self, halted: bool) {
        let mined = {
            let mut state = self.write();
            state.halted = halted;
            if halted {
                0
            } else {
                let pending = std::mem::take(&mut state.pending);
                let count = pending.len();
                for (tx_hash, tx) in pending {
                    state.mine(tx_hash, tx);
                }
                count
            }
        };
        if mined > 0 {
            tracing::debug!(count = mined, "mined queued transactions");
            self.mined.notify_waiters();
        }
    }

    pub fn is_halted(&self) -> bool {
        self.read().halted
    }

    /// Confirmed anchor records for `subject`, oldest first.
    pub fn anchors_for(&self, subject: &SubjectId) -> Vec<AnchorRecord> {
        self.read()
            .anchors
            .iter()
            .filter(|record| &record.subject == subject)
            .cloned()
            .collect()
    }

    pub fn anchor_count(&self) -> usize {
        self.read().anchors.len()
    }

    pub fn blocks(&self) -> Vec<Block> {
        self.read().blocks.clone()
    }

    pub fn block_count(&self) -> usize {
        self.read().blocks.len()
    }

    pub fn pending_count(&self) -> usize {
        self.read().pending.len()
    }

    pub fn receipt(&self, tx_hash: &TxHash) -> Option<AnchorReceipt> {
        self.read().receipts.get(tx_hash).cloned()
    }

    /// Verify the hash links of every mined block.
    pub fn validate_chain(&self) -> Result<(), ChainError> {
        verify_blocks(&self.read().blocks)
    }

    fn read(&self) -> RwLockReadGuard<'_, LedgerState> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, LedgerState> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn state_mut(&mut self) -> &mut LedgerState {
        self.inner.get_mut().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::development()
    }
}

impl std::fmt::Debug for InMemoryLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read();
        f.debug_struct("InMemoryLedger")
            .field("network", &self.network)
            .field("blocks", &state.blocks.len())
            .field("anchors", &state.anchors.len())
            .field("halted", &state.halted)
            .finish()
    }
}

#[async_trait]
impl LedgerBackend for InMemoryLedger {
    async fn network_id(&self) -> LedgerResult<NetworkId> {
        Ok(self.network)
    }

    async fn transaction_count(&self, account: AccountId) -> LedgerResult<u64> {
        Ok(self.read().nonces.get(&account).copied().unwrap_or(0))
    }

    async fn submit(&self, tx: SignedTransaction) -> LedgerResult<TxHash> {
        if tx.tx.network != self.network {
            return Err(LedgerError::TransactionRejected(format!(
                "transaction for network {} sent to network {}",
                tx.tx.network, self.network
            )));
        }
        tx.verify()?;
        let tx_hash = tx.tx_hash()?;

        let queued = {
            let mut state = self.write();
            if !state.contracts.contains(&tx.tx.call.contract) {
                return Err(LedgerError::TransactionRejected(format!(
                    "no contract deployed at {}",
                    tx.tx.call.contract
                )));
            }
            if tx.tx.call.method != ANCHOR_METHOD {
                return Err(LedgerError::TransactionRejected(format!(
                    "unknown method {}",
                    tx.tx.call.method
                )));
            }

            let expected = state.nonces.get(&tx.tx.from).copied().unwrap_or(0);
            if tx.tx.nonce != expected {
                return Err(LedgerError::NonceMismatch {
                    expected,
                    got: tx.tx.nonce,
                });
            }
            state.nonces.insert(tx.tx.from, expected + 1);
            state.known.insert(tx_hash);

            if state.halted {
                state.pending.push((tx_hash, tx));
                true
            } else {
                state.mine(tx_hash, tx);
                false
            }
        };

        if queued {
            tracing::debug!(tx_hash = %tx_hash, "mining halted, transaction queued");
        } else {
            self.mined.notify_waiters();
        }
        Ok(tx_hash)
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> LedgerResult<AnchorReceipt> {
        if !self.confirmation_delay.is_zero() {
            tokio::time::sleep(self.confirmation_delay).await;
        }
        loop {
            let notified = self.mined.notified();
            {
                let state = self.read();
                if let Some(receipt) = state.receipts.get(&tx_hash) {
                    return Ok(receipt.clone());
                }
                if !state.known.contains(&tx_hash) {
                    return Err(LedgerError::TransactionRejected(format!(
                        "unknown transaction {tx_hash}"
                    )));
                }
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::ContractArtifact;
    use crate::signer::LedgerSigner;
    use crate::transaction::{AnchorCall, UnsignedTransaction};
    use dal_crypto::SigningKey;
    use dal_types::Fingerprint;

    fn signer(seed: u8) -> LedgerSigner {
        LedgerSigner::new(SigningKey::from_bytes([seed; 32]))
    }

    fn anchor_tx(signer: &LedgerSigner, nonce: u64, subject: &str, content: &[u8]) -> SignedTransaction {
        let binding = ContractArtifact::single(NetworkId::DEVELOPMENT, development_contract_address())
            .binding_for(NetworkId::DEVELOPMENT)
            .unwrap();
        UnsignedTransaction {
            network: NetworkId::DEVELOPMENT,
            from: signer.account(),
            nonce,
            call: AnchorCall::new(
                &binding,
                SubjectId::new(subject).unwrap(),
                Fingerprint::from_content(content),
            ),
        }
        .sign(signer)
        .unwrap()
    }

    // -----------------------------------------------------------------------
    // Mining
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn submit_mines_one_block_per_transaction() {
        let ledger = InMemoryLedger::development();
        let alice = signer(1);

        let h0 = ledger.submit(anchor_tx(&alice, 0, "HH1001", b"a")).await.unwrap();
        let h1 = ledger.submit(anchor_tx(&alice, 1, "HH1001", b"b")).await.unwrap();

        let r0 = ledger.wait_for_receipt(h0).await.unwrap();
        let r1 = ledger.wait_for_receipt(h1).await.unwrap();
        assert!(r0.is_confirmed());
        assert_eq!(r0.block.number, 0);
        assert_eq!(r1.block.number, 1);
        assert_eq!(ledger.block_count(), 2);
        assert!(ledger.validate_chain().is_ok());
    }

    #[tokio::test]
    async fn anchors_are_recorded_per_subject() {
        let ledger = InMemoryLedger::development();
        let alice = signer(1);
        ledger.submit(anchor_tx(&alice, 0, "HH1001", b"a")).await.unwrap();
        ledger.submit(anchor_tx(&alice, 1, "HH2002", b"b")).await.unwrap();
        ledger.submit(anchor_tx(&alice, 2, "HH1001", b"a")).await.unwrap();

        let records = ledger.anchors_for(&SubjectId::new("HH1001").unwrap());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].fingerprint, records[1].fingerprint);
        assert_ne!(records[0].receipt.tx_hash, records[1].receipt.tx_hash);
        assert_eq!(records[0].submitter, alice.account());
        assert_eq!(ledger.anchor_count(), 3);
    }

    #[tokio::test]
    async fn transaction_count_tracks_nonces() {
        let ledger = InMemoryLedger::development();
        let alice = signer(1);
        assert_eq!(ledger.transaction_count(alice.account()).await.unwrap(), 0);
        ledger.submit(anchor_tx(&alice, 0, "HH1001", b"a")).await.unwrap();
        assert_eq!(ledger.transaction_count(alice.account()).await.unwrap(), 1);
    }

    // -----------------------------------------------------------------------
    // Rejections
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn reused_nonce_is_rejected() {
        let ledger = InMemoryLedger::development();
        let alice = signer(1);
        ledger.submit(anchor_tx(&alice, 0, "HH1001", b"a")).await.unwrap();
        let err = ledger.submit(anchor_tx(&alice, 0, "HH1001", b"b")).await.unwrap_err();
        assert!(matches!(err, LedgerError::NonceMismatch { expected: 1, got: 0 }));
        assert_eq!(ledger.block_count(), 1);
    }

    #[tokio::test]
    async fn tampered_transaction_is_rejected() {
        let ledger = InMemoryLedger::development();
        let mut tx = anchor_tx(&signer(1), 0, "HH1001", b"a");
        tx.tx.call.subject = SubjectId::new("HH9999").unwrap();
        assert!(ledger.submit(tx).await.is_err());
        assert_eq!(ledger.block_count(), 0);
    }

    #[tokio::test]
    async fn missing_contract_is_rejected() {
        let ledger = InMemoryLedger::new(NetworkId::DEVELOPMENT);
        let err = ledger.submit(anchor_tx(&signer(1), 0, "HH1001", b"a")).await.unwrap_err();
        assert!(matches!(err, LedgerError::TransactionRejected(msg) if msg.contains("no contract")));
    }

    #[tokio::test]
    async fn deployed_contract_accepts_anchors() {
        let ledger = InMemoryLedger::new(NetworkId::DEVELOPMENT);
        ledger.deploy_contract(development_contract_address());
        let hash = ledger.submit(anchor_tx(&signer(1), 0, "HH1001", b"a")).await.unwrap();
        assert!(ledger.wait_for_receipt(hash).await.unwrap().is_confirmed());
    }

    #[tokio::test]
    async fn wrong_network_is_rejected() {
        let ledger = InMemoryLedger::new(NetworkId(1)).with_contract(development_contract_address());
        assert!(ledger.submit(anchor_tx(&signer(1), 0, "HH1001", b"a")).await.is_err());
    }

    #[tokio::test]
    async fn unauthorized_caller_gets_reverted_receipt() {
        let alice = signer(1);
        let mallory = signer(2);
        let ledger = InMemoryLedger::development().with_authorized_accounts([alice.account()]);

        let hash = ledger.submit(anchor_tx(&mallory, 0, "HH1001", b"a")).await.unwrap();
        let receipt = ledger.wait_for_receipt(hash).await.unwrap();
        assert_eq!(
            receipt.status,
            TxStatus::Reverted {
                reason: "caller unauthorized".into()
            }
        );
        assert!(ledger.anchors_for(&SubjectId::new("HH1001").unwrap()).is_empty());
        assert_eq!(ledger.block_count(), 1);

        ledger.authorize(mallory.account());
        let hash = ledger.submit(anchor_tx(&mallory, 1, "HH1001", b"a")).await.unwrap();
        assert!(ledger.wait_for_receipt(hash).await.unwrap().is_confirmed());
    }

    #[tokio::test]
    async fn unknown_receipt_is_rejected() {
        let ledger = InMemoryLedger::development();
        assert!(ledger
            .wait_for_receipt(TxHash::from_hash([0; 32]))
            .await
            .is_err());
    }

    // -----------------------------------------------------------------------
    // Confirmation control
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn halted_ledger_queues_until_resumed() {
        let ledger = std::sync::Arc::new(InMemoryLedger::development());
        ledger.set_halted(true);
        let hash = ledger.submit(anchor_tx(&signer(1), 0, "HH1001", b"a")).await.unwrap();
        assert_eq!(ledger.pending_count(), 1);
        assert!(ledger.receipt(&hash).is_none());

        let waiter = {
            let ledger = ledger.clone();
            tokio::spawn(async move { ledger.wait_for_receipt(hash).await })
        };
        tokio::task::yield_now().await;
        ledger.set_halted(false);

        let receipt = waiter.await.unwrap().unwrap();
        assert!(receipt.is_confirmed());
        assert_eq!(ledger.pending_count(), 0);
        assert!(!ledger.is_halted());
    }

    #[tokio::test]
    async fn halted_ledger_never_confirms_within_window() {
        let ledger = InMemoryLedger::development();
        ledger.set_halted(true);
        let hash = ledger.submit(anchor_tx(&signer(1), 0, "HH1001", b"a")).await.unwrap();
        let waited =
            tokio::time::timeout(Duration::from_millis(50), ledger.wait_for_receipt(hash)).await;
        assert!(waited.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn confirmation_delay_is_applied() {
        let ledger = InMemoryLedger::development().with_confirmation_delay(Duration::from_secs(5));
        let hash = ledger.submit(anchor_tx(&signer(1), 0, "HH1001", b"a")).await.unwrap();
        let start = tokio::time::Instant::now();
        ledger.wait_for_receipt(hash).await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[test]
    fn tampered_block_fails_chain_validation() {
        let ledger = InMemoryLedger::development();
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        rt.block_on(async {
            ledger.submit(anchor_tx(&signer(1), 0, "HH1001", b"a")).await.unwrap();
            ledger.submit(anchor_tx(&signer(1), 1, "HH1001", b"b")).await.unwrap();
        });
        let mut blocks = ledger.blocks();
        blocks[1].reverted = true;
        assert_eq!(
            verify_blocks(&blocks).unwrap_err(),
            ChainError::HashMismatch { number: 1 }
        );
    }
}
