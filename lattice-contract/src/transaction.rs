use crate::chain::ChainClient;
use crate::error::ContractError;
use crate::types::TransactionReceipt;
use lattice::Address;
use num256::Uint256;
use num_traits::Zero;
use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::time::sleep;

/// Knobs for receipt polling: how long to sleep between attempts and when
/// to give up, whichever of the attempt budget or the wall clock runs out
/// first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub timeout: Duration,
    pub max_attempts: usize,
}

impl Default for PollConfig {
    fn default() -> Self {
        PollConfig {
            interval: Duration::from_secs(1),
            timeout: Duration::from_secs(60),
            max_attempts: 60,
        }
    }
}

/// Lifecycle state of a submitted transaction as last observed. Pending is
/// where every handle starts, Mined and Failed are terminal. A timed-out
/// wait does not change the state, the chain may still mine the
/// transaction later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxState {
    Pending,
    Mined(Box<TransactionReceipt>),
    Failed(String),
}

/// Tracks one submitted transaction by hash. The handle never retries the
/// submission, it only polls for the receipt, so waiting can be abandoned
/// and resumed freely. What actually happened on chain is resolved by
/// re-querying, never assumed.
pub struct TransactionHandle {
    hash: Uint256,
    client: Arc<dyn ChainClient>,
    state: Mutex<TxState>,
}

impl fmt::Debug for TransactionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransactionHandle({:#066x})", self.hash)
    }
}

impl TransactionHandle {
    pub(crate) fn new(hash: Uint256, client: Arc<dyn ChainClient>) -> Self {
        TransactionHandle {
            hash,
            client,
            state: Mutex::new(TxState::Pending),
        }
    }

    pub fn tx_hash(&self) -> Uint256 {
        self.hash.clone()
    }

    pub fn state(&self) -> TxState {
        self.state.lock().expect("state lock poisoned").clone()
    }

    /// Polls the chain until the transaction is mined, sleeping between
    /// attempts. Returns the receipt on success. A receipt with a zero
    /// status means the transaction reverted and moves the handle to
    /// Failed. Running out of attempts or wall clock returns
    /// [`ContractError::TransactionTimeout`] and leaves the handle
    /// Pending, calling this again resumes polling the same hash.
    pub async fn wait_for_mined(
        &self,
        poll: PollConfig,
    ) -> Result<TransactionReceipt, ContractError> {
        match self.state() {
            TxState::Mined(receipt) => return Ok(*receipt),
            TxState::Failed(reason) => return Err(ContractError::Transaction(reason)),
            TxState::Pending => {}
        }
        let start = Instant::now();
        let mut attempts = 0usize;
        loop {
            sleep(poll.interval).await;
            attempts += 1;
            trace!(
                "polling receipt for {:#066x}, attempt {}",
                self.hash,
                attempts
            );
            if let Some(receipt) = self
                .client
                .get_transaction_receipt(self.hash.clone())
                .await?
            {
                if matches!(&receipt.status, Some(status) if status.is_zero()) {
                    let reason = format!("transaction {:#066x} reverted", self.hash);
                    *self.state.lock().expect("state lock poisoned") =
                        TxState::Failed(reason.clone());
                    return Err(ContractError::Transaction(reason));
                }
                *self.state.lock().expect("state lock poisoned") =
                    TxState::Mined(Box::new(receipt.clone()));
                return Ok(receipt);
            }
            if attempts >= poll.max_attempts || start.elapsed() >= poll.timeout {
                return Err(ContractError::TransactionTimeout);
            }
        }
    }
}

/// A [`TransactionHandle`] for a deployment, which additionally resolves
/// the new contract address from the receipt and pushes it into the
/// owning binding's shared address cell.
pub struct DeploymentHandle {
    handle: TransactionHandle,
    binding_address: Arc<Mutex<Option<Address>>>,
    deployed: Mutex<Option<Address>>,
}

impl Deref for DeploymentHandle {
    type Target = TransactionHandle;

    fn deref(&self) -> &TransactionHandle {
        &self.handle
    }
}

impl fmt::Debug for DeploymentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeploymentHandle({:#066x})", self.handle.hash)
    }
}

impl DeploymentHandle {
    pub(crate) fn new(
        hash: Uint256,
        client: Arc<dyn ChainClient>,
        binding_address: Arc<Mutex<Option<Address>>>,
    ) -> Self {
        DeploymentHandle {
            handle: TransactionHandle::new(hash, client),
            binding_address,
            deployed: Mutex::new(None),
        }
    }

    /// The resolved contract address, present once the deployment was
    /// observed mined.
    pub fn deployed_address(&self) -> Option<Address> {
        *self.deployed.lock().expect("address lock poisoned")
    }

    /// Waits until the deployment is mined, then resolves the contract
    /// address from the receipt. The address is written to the owning
    /// binding before returning, so filters created from that binding at
    /// any point resolve against it.
    pub async fn wait_for_deployment(&self, poll: PollConfig) -> Result<Address, ContractError> {
        let receipt = self.handle.wait_for_mined(poll).await?;
        let address = receipt.contract_address.ok_or_else(|| {
            ContractError::Deployment(format!(
                "receipt for {:#066x} carries no contract address",
                self.handle.hash
            ))
        })?;
        *self.deployed.lock().expect("address lock poisoned") = Some(address);
        *self.binding_address.lock().expect("address lock poisoned") = Some(address);
        debug!("contract deployed at {address}");
        Ok(address)
    }
}

#[test]
fn default_poll_config_sleeps_between_attempts() {
    let poll = PollConfig::default();
    assert!(poll.interval >= Duration::from_millis(100));
    assert_eq!(poll.max_attempts, 60);
}
