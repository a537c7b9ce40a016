use crate::chain::ChainClient;
use crate::error::ContractError;
use crate::events::EventFilter;
use crate::transaction::{DeploymentHandle, PollConfig, TransactionHandle};
use lattice::abi::{AbiToken, Constructor, Contract, Function};
use lattice::Address;
use num256::Uint256;
use num_traits::Zero;
use std::sync::{Arc, Mutex};

/// A contract bound to an ABI, a sender and a chain client.
///
/// Function and event descriptors are resolved by name from the parsed
/// ABI's dispatch table, arguments travel as [`AbiToken`] lists. Read-only
/// invocations go through [`call`](ContractBinding::call), state-mutating
/// ones through [`transact`](ContractBinding::transact) which hands back a
/// pollable [`TransactionHandle`].
///
/// The address cell is the one piece of state that changes after
/// construction: a deployment resolves it, and every filter or handle
/// derived from this binding shares it. Clones of the binding share it
/// too.
#[derive(Clone)]
pub struct ContractBinding {
    address: Arc<Mutex<Option<Address>>>,
    sender: Address,
    abi: Contract,
    bytecode: Vec<u8>,
    client: Arc<dyn ChainClient>,
}

impl ContractBinding {
    /// Binding for a contract that has yet to be deployed from `bytecode`.
    pub fn new(
        abi: Contract,
        bytecode: Vec<u8>,
        sender: Address,
        client: Arc<dyn ChainClient>,
    ) -> Self {
        ContractBinding {
            address: Arc::new(Mutex::new(None)),
            sender,
            abi,
            bytecode,
            client,
        }
    }

    /// Binding for a contract already living at `address`.
    pub fn at(
        address: Address,
        abi: Contract,
        sender: Address,
        client: Arc<dyn ChainClient>,
    ) -> Self {
        ContractBinding {
            address: Arc::new(Mutex::new(Some(address))),
            sender,
            abi,
            bytecode: Vec::new(),
            client,
        }
    }

    pub fn address(&self) -> Option<Address> {
        *self.address.lock().expect("address lock poisoned")
    }

    /// Points the binding at a deployed instance. This is the single
    /// allowed post-construction mutation and is immediately visible to
    /// every filter and handle derived from this binding.
    pub fn set_address(&self, address: Address) {
        *self.address.lock().expect("address lock poisoned") = Some(address);
    }

    pub fn sender(&self) -> Address {
        self.sender
    }

    pub fn abi(&self) -> &Contract {
        &self.abi
    }

    /// Asks the chain what deploying this contract with the given
    /// constructor arguments would cost.
    pub async fn estimate_gas(&self, args: &[AbiToken]) -> Result<Uint256, ContractError> {
        let payload = self.deployment_payload(args)?;
        self.client.estimate_gas(self.sender, payload).await
    }

    /// Submits the deployment transaction and returns a pending handle
    /// without waiting for it to be mined. An all-zero transaction hash
    /// from the client is how an unauthorized or locked sender surfaces
    /// and is rejected here rather than handed back as a pending handle.
    pub async fn deploy(&self, args: &[AbiToken]) -> Result<DeploymentHandle, ContractError> {
        let payload = self.deployment_payload(args)?;
        let hash = self
            .client
            .send_transaction(None, self.sender, payload)
            .await?;
        if hash.is_zero() {
            return Err(ContractError::Deployment(
                "chain client returned the all-zero transaction hash".to_string(),
            ));
        }
        debug!("submitted deployment {hash:#066x}");
        Ok(DeploymentHandle::new(
            hash,
            self.client.clone(),
            self.address.clone(),
        ))
    }

    /// Read-only invocation of `name`. Nothing enters the chain and no
    /// transaction hash exists, the declared outputs are decoded from the
    /// raw return data. A function with exactly one declared output comes
    /// back as the bare token, anything else as an ordered tuple.
    pub async fn call(&self, name: &str, args: &[AbiToken]) -> Result<AbiToken, ContractError> {
        let function = self.function(name)?;
        let to = self.bound_address()?;
        let payload = function.encode_call(args)?;
        let raw = self.client.call(to, self.sender, payload).await?;
        let mut outputs = function.decode_outputs(&raw)?;
        if outputs.len() == 1 {
            Ok(outputs.remove(0))
        } else {
            Ok(AbiToken::Tuple(outputs))
        }
    }

    /// Submits a state-mutating invocation of `name` and returns a pending
    /// handle immediately.
    pub async fn transact(
        &self,
        name: &str,
        args: &[AbiToken],
    ) -> Result<TransactionHandle, ContractError> {
        let function = self.function(name)?;
        let to = self.bound_address()?;
        let payload = function.encode_call(args)?;
        let hash = self
            .client
            .send_transaction(Some(to), self.sender, payload)
            .await?;
        if hash.is_zero() {
            return Err(ContractError::Transaction(
                "chain client returned the all-zero transaction hash".to_string(),
            ));
        }
        trace!("submitted {name} as {hash:#066x}");
        Ok(TransactionHandle::new(hash, self.client.clone()))
    }

    /// Convenience composition of [`transact`](ContractBinding::transact)
    /// and [`wait_for_mined`](TransactionHandle::wait_for_mined). Timeout
    /// and failure errors propagate; callers that want to resume a wait
    /// after a timeout should hold the handle from `transact` themselves.
    pub async fn transact_and_wait(
        &self,
        name: &str,
        args: &[AbiToken],
        poll: PollConfig,
    ) -> Result<TransactionHandle, ContractError> {
        let handle = self.transact(name, args).await?;
        handle.wait_for_mined(poll).await?;
        Ok(handle)
    }

    /// Creates a log filter for the named event, with topic zero pinned to
    /// the event's signature hash and the address criteria following this
    /// binding. Block bounds default to the genesis block and the latest
    /// block respectively. When the binding does not have an address yet
    /// the chain-side registration is deferred until it does.
    pub async fn create_filter(
        &self,
        event: &str,
        from_block: Option<Uint256>,
        to_block: Option<Uint256>,
    ) -> Result<EventFilter, ContractError> {
        let descriptor = self
            .abi
            .event(event)
            .ok_or_else(|| ContractError::EventNotFound(event.to_string()))?
            .clone();
        let filter = EventFilter::new(
            descriptor,
            self.address.clone(),
            self.client.clone(),
            from_block,
            to_block,
        );
        filter.ensure_installed().await?;
        Ok(filter)
    }

    fn function(&self, name: &str) -> Result<&Function, ContractError> {
        self.abi
            .function(name)
            .ok_or_else(|| ContractError::FunctionNotFound(name.to_string()))
    }

    fn bound_address(&self) -> Result<Address, ContractError> {
        self.address().ok_or(ContractError::AddressNotSet)
    }

    fn deployment_payload(&self, args: &[AbiToken]) -> Result<Vec<u8>, ContractError> {
        if self.bytecode.is_empty() {
            return Err(ContractError::BadInput(
                "no bytecode attached to this binding".to_string(),
            ));
        }
        // an absent constructor entry means a strict no-argument constructor
        let no_args = Constructor::default();
        let constructor = self.abi.constructor().unwrap_or(&no_args);
        if constructor.inputs.len() != args.len() {
            return Err(ContractError::Arity {
                expected: constructor.inputs.len(),
                got: args.len(),
            });
        }
        Ok(constructor.encode_input(&self.bytecode, args)?)
    }
}
