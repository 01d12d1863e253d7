use async_trait::async_trait;
use dal_types::{AccountId, AnchorReceipt, NetworkId, TxHash};

use crate::error::LedgerResult;
use crate::transaction::SignedTransaction;

/// Boundary to the ledger network a session is connected to.
#[async_trait]
pub trait LedgerBackend: Send + Sync {
    /// Id of the network this endpoint serves.
    async fn network_id(&self) -> LedgerResult<NetworkId>;

    /// Number of transactions `account` has submitted, i.e. its next nonce.
    async fn transaction_count(&self, account: AccountId) -> LedgerResult<u64>;

    /// Submit a signed transaction. Returns once the transaction is accepted
    /// into the pool, not once it is confirmed.
    async fn submit(&self, tx: SignedTransaction) -> LedgerResult<TxHash>;

    /// Wait until `tx_hash` is mined. Callers bound the wait themselves.
    async fn wait_for_receipt(&self, tx_hash: TxHash) -> LedgerResult<AnchorReceipt>;
}
