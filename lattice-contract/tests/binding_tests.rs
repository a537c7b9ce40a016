use async_trait::async_trait;
use lattice::abi::{AbiToken, Contract};
use lattice::Address;
use lattice_contract::types::{Data, Log, NewFilter, TransactionReceipt};
use lattice_contract::{ChainClient, ContractBinding, ContractError, PollConfig, TxState};
use num256::Uint256;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const STORAGE_ABI: &str = r#"[
  {"type": "constructor", "inputs": [{"name": "initial", "type": "uint256"}]},
  {"type": "function", "name": "get", "inputs": [],
   "outputs": [{"name": "", "type": "uint256"}]},
  {"type": "function", "name": "stats", "inputs": [],
   "outputs": [{"name": "value", "type": "uint256"}, {"name": "frozen", "type": "bool"}]},
  {"type": "function", "name": "set",
   "inputs": [{"name": "value", "type": "uint256"}], "outputs": []},
  {"type": "event", "name": "Transfer", "inputs": [
    {"indexed": true, "name": "from", "type": "address"},
    {"indexed": true, "name": "to", "type": "address"},
    {"indexed": false, "name": "value", "type": "uint256"}
  ]}
]"#;

/// A chain client double whose responses are scripted per test. Receipts
/// are consumed front to back, an exhausted queue answers like a chain
/// that has not mined the transaction yet.
struct MockChain {
    call_response: Mutex<Vec<u8>>,
    tx_hash: Mutex<Uint256>,
    receipts: Mutex<VecDeque<Option<TransactionReceipt>>>,
    logs: Mutex<Vec<Log>>,
    filters: Mutex<Vec<NewFilter>>,
    next_filter_id: Mutex<u64>,
    sent: Mutex<Vec<(Option<Address>, Address, Vec<u8>)>>,
}

impl MockChain {
    fn new() -> Arc<MockChain> {
        Arc::new(MockChain {
            call_response: Mutex::new(Vec::new()),
            tx_hash: Mutex::new(Uint256::from(0xabcdu32)),
            receipts: Mutex::new(VecDeque::new()),
            logs: Mutex::new(Vec::new()),
            filters: Mutex::new(Vec::new()),
            next_filter_id: Mutex::new(0),
            sent: Mutex::new(Vec::new()),
        })
    }

    fn set_call_response(&self, data: Vec<u8>) {
        *self.call_response.lock().unwrap() = data;
    }

    fn set_tx_hash(&self, hash: Uint256) {
        *self.tx_hash.lock().unwrap() = hash;
    }

    fn push_missing_receipts(&self, count: usize) {
        let mut receipts = self.receipts.lock().unwrap();
        for _ in 0..count {
            receipts.push_back(None);
        }
    }

    fn push_receipt(&self, receipt: TransactionReceipt) {
        self.receipts.lock().unwrap().push_back(Some(receipt));
    }

    fn push_log(&self, log: Log) {
        self.logs.lock().unwrap().push(log);
    }

    fn recorded_filters(&self) -> Vec<NewFilter> {
        self.filters.lock().unwrap().clone()
    }

    fn recorded_sends(&self) -> Vec<(Option<Address>, Address, Vec<u8>)> {
        self.sent.lock().unwrap().clone()
    }
}

fn receipt(contract_address: Option<Address>, status: u8) -> TransactionReceipt {
    TransactionReceipt {
        transaction_hash: Uint256::from(0xabcdu32),
        transaction_index: Some(0u8.into()),
        block_hash: None,
        block_number: Some(42u8.into()),
        from: None,
        to: None,
        cumulative_gas_used: None,
        gas_used: Some(21000u32.into()),
        contract_address,
        logs: Vec::new(),
        status: Some(status.into()),
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn call(
        &self,
        _to: Address,
        _from: Address,
        _data: Vec<u8>,
    ) -> Result<Vec<u8>, ContractError> {
        Ok(self.call_response.lock().unwrap().clone())
    }

    async fn send_transaction(
        &self,
        to: Option<Address>,
        from: Address,
        data: Vec<u8>,
    ) -> Result<Uint256, ContractError> {
        self.sent.lock().unwrap().push((to, from, data));
        Ok(self.tx_hash.lock().unwrap().clone())
    }

    async fn estimate_gas(&self, _from: Address, data: Vec<u8>) -> Result<Uint256, ContractError> {
        Ok(Uint256::from(data.len() as u64))
    }

    async fn get_transaction_receipt(
        &self,
        _txhash: Uint256,
    ) -> Result<Option<TransactionReceipt>, ContractError> {
        Ok(self.receipts.lock().unwrap().pop_front().flatten())
    }

    async fn new_filter(&self, filter: NewFilter) -> Result<Uint256, ContractError> {
        self.filters.lock().unwrap().push(filter);
        let mut id = self.next_filter_id.lock().unwrap();
        *id += 1;
        Ok(Uint256::from(*id))
    }

    async fn get_filter_logs(&self, _filter_id: Uint256) -> Result<Vec<Log>, ContractError> {
        Ok(self.logs.lock().unwrap().clone())
    }

    async fn get_filter_changes(&self, _filter_id: Uint256) -> Result<Vec<Log>, ContractError> {
        Ok(self.logs.lock().unwrap().clone())
    }
}

fn abi() -> Contract {
    Contract::from_json(STORAGE_ABI).unwrap()
}

fn sender() -> Address {
    "0x00000000000000000000000000000000000000aa".parse().unwrap()
}

fn contract_address() -> Address {
    "0x00000000000000000000000000000000000000cc".parse().unwrap()
}

fn fast_poll() -> PollConfig {
    PollConfig {
        interval: Duration::from_millis(1),
        timeout: Duration::from_secs(5),
        max_attempts: 10,
    }
}

fn word(value: u64) -> Vec<u8> {
    let mut out = vec![0u8; 32];
    out[24..].copy_from_slice(&value.to_be_bytes());
    out
}

#[tokio::test]
async fn call_with_single_output_returns_bare_value() {
    let chain = MockChain::new();
    chain.set_call_response(word(42));
    let binding = ContractBinding::at(contract_address(), abi(), sender(), chain);
    let result = binding.call("get", &[]).await.unwrap();
    assert_eq!(result, AbiToken::Uint(42u8.into()));
}

#[tokio::test]
async fn call_with_two_outputs_returns_ordered_tuple() {
    let chain = MockChain::new();
    let mut response = word(7);
    response.extend(word(1));
    chain.set_call_response(response);
    let binding = ContractBinding::at(contract_address(), abi(), sender(), chain);
    let result = binding.call("stats", &[]).await.unwrap();
    assert_eq!(
        result,
        AbiToken::Tuple(vec![AbiToken::Uint(7u8.into()), AbiToken::Bool(true)])
    );
}

#[tokio::test]
async fn call_unknown_function_errors() {
    let chain = MockChain::new();
    let binding = ContractBinding::at(contract_address(), abi(), sender(), chain);
    match binding.call("missing", &[]).await.unwrap_err() {
        ContractError::FunctionNotFound(name) => assert_eq!(name, "missing"),
        _ => panic!(),
    }
}

#[tokio::test]
async fn transact_sends_selector_prefixed_payload() {
    let chain = MockChain::new();
    let binding = ContractBinding::at(contract_address(), abi(), sender(), chain.clone());
    let handle = binding.transact("set", &[5u32.into()]).await.unwrap();
    assert_eq!(handle.state(), TxState::Pending);

    let sends = chain.recorded_sends();
    assert_eq!(sends.len(), 1);
    let (to, from, data) = &sends[0];
    assert_eq!(*to, Some(contract_address()));
    assert_eq!(*from, sender());
    // selector of set(uint256) followed by one argument word
    assert_eq!(data[..4], [0x60, 0xfe, 0x47, 0xb1]);
    assert_eq!(data.len(), 36);
    assert_eq!(data[35], 5);
}

#[tokio::test]
async fn transact_rejects_zero_hash_sentinel() {
    let chain = MockChain::new();
    chain.set_tx_hash(Uint256::from(0u8));
    let binding = ContractBinding::at(contract_address(), abi(), sender(), chain);
    match binding.transact("set", &[5u32.into()]).await.unwrap_err() {
        ContractError::Transaction(_) => {}
        _ => panic!(),
    }
}

#[tokio::test]
async fn deploy_rejects_zero_hash_sentinel() {
    let chain = MockChain::new();
    chain.set_tx_hash(Uint256::from(0u8));
    let binding = ContractBinding::new(abi(), vec![0x60, 0x80], sender(), chain);
    match binding.deploy(&[1u32.into()]).await.unwrap_err() {
        ContractError::Deployment(_) => {}
        _ => panic!(),
    }
}

#[tokio::test]
async fn deploy_checks_constructor_arity() {
    let chain = MockChain::new();
    let binding = ContractBinding::new(abi(), vec![0x60, 0x80], sender(), chain);
    match binding.deploy(&[]).await.unwrap_err() {
        ContractError::Arity {
            expected: 1,
            got: 0,
        } => {}
        _ => panic!(),
    }
}

#[tokio::test]
async fn estimate_gas_covers_bytecode_and_arguments() {
    let chain = MockChain::new();
    let bytecode = vec![0x60, 0x80, 0x60, 0x40];
    let binding = ContractBinding::new(abi(), bytecode.clone(), sender(), chain);
    let gas = binding.estimate_gas(&[1u32.into()]).await.unwrap();
    // the mock prices gas at one unit per payload byte
    assert_eq!(gas, Uint256::from((bytecode.len() + 32) as u64));
}

#[tokio::test]
async fn deployment_resolves_address_and_repoints_existing_filters() {
    let _ = env_logger::builder().is_test(true).try_init();
    let chain = MockChain::new();
    let binding = ContractBinding::new(abi(), vec![0x60, 0x80], sender(), chain.clone());

    // created before deployment: no address yet, chain-side registration
    // is deferred
    let early_filter = binding.create_filter("Transfer", None, None).await.unwrap();
    assert_eq!(early_filter.filter_id(), None);
    assert!(chain.recorded_filters().is_empty());

    // two empty polls, then the receipt carrying the new address
    chain.push_missing_receipts(2);
    chain.push_receipt(receipt(Some(contract_address()), 1));

    let handle = binding.deploy(&[1u32.into()]).await.unwrap();
    assert_eq!(handle.deployed_address(), None);
    let resolved = handle.wait_for_deployment(fast_poll()).await.unwrap();
    assert_eq!(resolved, contract_address());
    assert_eq!(handle.deployed_address(), Some(contract_address()));
    assert_eq!(binding.address(), Some(contract_address()));

    // polling the early filter now installs it against the resolved address
    assert!(early_filter.changes().await.unwrap().is_empty());
    assert!(early_filter.filter_id().is_some());
    let filters = chain.recorded_filters();
    assert_eq!(filters.len(), 1);
    assert_eq!(filters[0].address, vec![contract_address()]);
    assert_eq!(filters[0].from_block.as_deref(), Some("0x0"));
    assert_eq!(filters[0].to_block.as_deref(), Some("latest"));

    // filters created after resolution pick the address up immediately
    let late_filter = binding.create_filter("Transfer", None, None).await.unwrap();
    assert!(late_filter.filter_id().is_some());
    assert_eq!(chain.recorded_filters()[1].address, vec![contract_address()]);
}

#[tokio::test]
async fn deployment_without_receipt_address_errors() {
    let chain = MockChain::new();
    chain.push_receipt(receipt(None, 1));
    let binding = ContractBinding::new(abi(), vec![0x60, 0x80], sender(), chain);
    let handle = binding.deploy(&[1u32.into()]).await.unwrap();
    match handle.wait_for_deployment(fast_poll()).await.unwrap_err() {
        ContractError::Deployment(_) => {}
        _ => panic!(),
    }
}

#[tokio::test]
async fn timed_out_wait_can_be_resumed() {
    let chain = MockChain::new();
    let binding = ContractBinding::at(contract_address(), abi(), sender(), chain.clone());
    let handle = binding.transact("set", &[5u32.into()]).await.unwrap();

    // the chain never answers within the attempt budget
    let poll = PollConfig {
        interval: Duration::from_millis(1),
        timeout: Duration::from_secs(5),
        max_attempts: 3,
    };
    match handle.wait_for_mined(poll).await.unwrap_err() {
        ContractError::TransactionTimeout => {}
        _ => panic!(),
    }
    // the handle stays pending, nothing was given up on chain
    assert_eq!(handle.state(), TxState::Pending);

    // once the chain produces a receipt the same handle resolves
    chain.push_receipt(receipt(None, 1));
    let mined = handle.wait_for_mined(poll).await.unwrap();
    assert_eq!(mined.block_number, Some(42u8.into()));
    assert!(matches!(handle.state(), TxState::Mined(_)));

    // later waits answer from the captured receipt without polling
    handle.wait_for_mined(poll).await.unwrap();
}

#[tokio::test]
async fn reverted_transaction_moves_handle_to_failed() {
    let chain = MockChain::new();
    chain.push_receipt(receipt(None, 0));
    let binding = ContractBinding::at(contract_address(), abi(), sender(), chain);
    let handle = binding.transact("set", &[5u32.into()]).await.unwrap();
    match handle.wait_for_mined(fast_poll()).await.unwrap_err() {
        ContractError::Transaction(_) => {}
        _ => panic!(),
    }
    assert!(matches!(handle.state(), TxState::Failed(_)));
    // the failure is remembered, not re-polled
    match handle.wait_for_mined(fast_poll()).await.unwrap_err() {
        ContractError::Transaction(_) => {}
        _ => panic!(),
    }
}

#[tokio::test]
async fn transact_and_wait_returns_mined_handle() {
    let chain = MockChain::new();
    chain.push_receipt(receipt(None, 1));
    let binding = ContractBinding::at(contract_address(), abi(), sender(), chain);
    let handle = binding
        .transact_and_wait("set", &[5u32.into()], fast_poll())
        .await
        .unwrap();
    assert!(matches!(handle.state(), TxState::Mined(_)));
}

#[tokio::test]
async fn filter_poll_without_address_errors() {
    let chain = MockChain::new();
    let binding = ContractBinding::new(abi(), vec![0x60, 0x80], sender(), chain);
    let filter = binding.create_filter("Transfer", None, None).await.unwrap();
    match filter.changes().await.unwrap_err() {
        ContractError::AddressNotSet => {}
        _ => panic!(),
    }
}

#[tokio::test]
async fn filter_decodes_matching_logs() {
    let chain = MockChain::new();
    let binding = ContractBinding::at(contract_address(), abi(), sender(), chain.clone());
    let filter = binding.create_filter("Transfer", None, None).await.unwrap();

    let event = binding.abi().event("Transfer").unwrap().clone();
    let from = sender();
    let to = contract_address();
    let mut from_topic = vec![0u8; 12];
    from_topic.extend_from_slice(from.as_bytes());
    let mut to_topic = vec![0u8; 12];
    to_topic.extend_from_slice(to.as_bytes());
    chain.push_log(Log {
        block_number: Some(9u8.into()),
        topics: vec![
            Data(event.topic0().to_vec()),
            Data(from_topic),
            Data(to_topic),
        ],
        data: Data(word(5)),
        ..Default::default()
    });

    let decoded = filter.logs().await.unwrap();
    assert_eq!(decoded.len(), 1);
    assert_eq!(
        decoded[0].topics,
        vec![AbiToken::Address(from), AbiToken::Address(to)]
    );
    assert_eq!(decoded[0].block_number, Some(9u8.into()));
}

#[tokio::test]
async fn unknown_event_errors_at_filter_creation() {
    let chain = MockChain::new();
    let binding = ContractBinding::at(contract_address(), abi(), sender(), chain);
    match binding.create_filter("Missing", None, None).await.unwrap_err() {
        ContractError::EventNotFound(name) => assert_eq!(name, "Missing"),
        _ => panic!(),
    }
}
