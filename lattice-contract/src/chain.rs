use crate::error::ContractError;
use crate::types::{Log, NewFilter, TransactionReceipt};
use async_trait::async_trait;
use lattice::Address;
use num256::Uint256;

/// The slice of the chain's JSONRPC surface the binding layer consumes.
///
/// Every [`ContractBinding`](crate::ContractBinding) takes its client at
/// construction, there is no process-wide default. Implementations own the
/// transport: HTTP, IPC or an in-process double all look the same from
/// here. On the wire all quantities are 0x prefixed hex strings, addresses
/// are 20 bytes and hashes 32 bytes of hex; the types in
/// [`types`](crate::types) carry the matching serde conversions.
///
/// None of these methods retry on their own. Submissions are not
/// idempotent, polling is, and the waiting logic upstream leans on that
/// split.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Read-only contract invocation. Executes against current state and
    /// returns the raw output bytes, nothing enters the chain.
    async fn call(
        &self,
        to: Address,
        from: Address,
        data: Vec<u8>,
    ) -> Result<Vec<u8>, ContractError>;

    /// Submits a state-mutating transaction and returns its hash. A missing
    /// `to` address makes this a contract deployment.
    async fn send_transaction(
        &self,
        to: Option<Address>,
        from: Address,
        data: Vec<u8>,
    ) -> Result<Uint256, ContractError>;

    /// Asks the chain to estimate the gas needed to execute `data` from the
    /// given sender.
    async fn estimate_gas(&self, from: Address, data: Vec<u8>) -> Result<Uint256, ContractError>;

    /// Fetches the receipt for a transaction hash, `None` while the
    /// transaction is pending or unknown.
    async fn get_transaction_receipt(
        &self,
        txhash: Uint256,
    ) -> Result<Option<TransactionReceipt>, ContractError>;

    /// Registers a server-side log filter and returns its identifier.
    async fn new_filter(&self, filter: NewFilter) -> Result<Uint256, ContractError>;

    /// All logs matching a registered filter.
    async fn get_filter_logs(&self, filter_id: Uint256) -> Result<Vec<Log>, ContractError>;

    /// Logs that arrived since the filter was last polled.
    async fn get_filter_changes(&self, filter_id: Uint256) -> Result<Vec<Log>, ContractError>;
}
