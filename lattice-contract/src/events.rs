//! Event filter management and log decoding against ABI event descriptors.
use crate::chain::ChainClient;
use crate::error::ContractError;
use crate::types::{Data, Log, NewFilter};
use lattice::abi::{decode, AbiToken, Event, ParamType};
use lattice::utils::bytes_to_hex_str;
use lattice::Address;
use num256::Uint256;
use std::sync::{Arc, Mutex};

/// Converts raw bytes to a hex string with 0x prepended, the form topic
/// and block criteria travel in on the wire.
pub fn bytes_to_data(s: &[u8]) -> String {
    format!("0x{}", bytes_to_hex_str(s))
}

/// One log decoded against its event descriptor.
///
/// Only indexed parameters are recoverable from a log's topics. The
/// non-indexed arguments stay as raw bytes in `data`; decoding them is not
/// implemented and the gap is flagged with a warning rather than silently
/// dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedLog {
    pub block_number: Option<Uint256>,
    pub transaction_hash: Option<Uint256>,
    pub block_hash: Option<Uint256>,
    pub transaction_index: Option<Uint256>,
    /// Decoded indexed parameter values in declaration order. Indexed
    /// values of dynamic or composite type only exist on chain as their
    /// 32 byte hash and come back as raw `FixedBytes`.
    pub topics: Vec<AbiToken>,
    /// The raw non-indexed argument bytes, returned undecoded.
    pub data: Data,
}

struct Installed {
    id: Uint256,
    address: Address,
}

/// A registered log filter owned by one event descriptor.
///
/// The address criteria follow the owning binding: installation on the
/// chain is deferred until the binding has an address, and a filter
/// installed against an address that has since changed is re-registered on
/// the next poll. That keeps filters created before a deployment attached
/// to the final address instead of orphaned.
pub struct EventFilter {
    event: Event,
    address: Arc<Mutex<Option<Address>>>,
    client: Arc<dyn ChainClient>,
    from_block: Option<Uint256>,
    to_block: Option<Uint256>,
    installed: Mutex<Option<Installed>>,
}

impl std::fmt::Debug for EventFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventFilter")
            .field("event", &self.event)
            .field("from_block", &self.from_block)
            .field("to_block", &self.to_block)
            .finish_non_exhaustive()
    }
}

impl EventFilter {
    pub(crate) fn new(
        event: Event,
        address: Arc<Mutex<Option<Address>>>,
        client: Arc<dyn ChainClient>,
        from_block: Option<Uint256>,
        to_block: Option<Uint256>,
    ) -> Self {
        EventFilter {
            event,
            address,
            client,
            from_block,
            to_block,
            installed: Mutex::new(None),
        }
    }

    pub fn event(&self) -> &Event {
        &self.event
    }

    /// The chain-assigned filter identifier, present once the filter has
    /// been installed against a known address.
    pub fn filter_id(&self) -> Option<Uint256> {
        self.installed
            .lock()
            .expect("filter lock poisoned")
            .as_ref()
            .map(|installed| installed.id.clone())
    }

    /// All logs matching the filter, decoded.
    pub async fn logs(&self) -> Result<Vec<DecodedLog>, ContractError> {
        let id = self.installed_id().await?;
        let raw = self.client.get_filter_logs(id).await?;
        raw.into_iter()
            .map(|log| decode_log(&self.event, log))
            .collect()
    }

    /// Logs that arrived since the last poll, decoded.
    pub async fn changes(&self) -> Result<Vec<DecodedLog>, ContractError> {
        let id = self.installed_id().await?;
        let raw = self.client.get_filter_changes(id).await?;
        raw.into_iter()
            .map(|log| decode_log(&self.event, log))
            .collect()
    }

    /// Registers the chain-side filter once the owning binding has an
    /// address, re-registering when that address changed since the last
    /// installation. Returns `None` while no address is known.
    pub(crate) async fn ensure_installed(&self) -> Result<Option<Uint256>, ContractError> {
        let current = match *self.address.lock().expect("address lock poisoned") {
            Some(address) => address,
            None => {
                debug!(
                    "filter for {} is waiting for a contract address",
                    self.event.name
                );
                return Ok(None);
            }
        };
        {
            let installed = self.installed.lock().expect("filter lock poisoned");
            if let Some(existing) = installed.as_ref() {
                if existing.address == current {
                    return Ok(Some(existing.id.clone()));
                }
            }
        }
        let id = self.client.new_filter(self.criteria(current)).await?;
        debug!(
            "installed filter {:#x} for {} at {}",
            id, self.event.name, current
        );
        *self.installed.lock().expect("filter lock poisoned") = Some(Installed {
            id: id.clone(),
            address: current,
        });
        Ok(Some(id))
    }

    async fn installed_id(&self) -> Result<Uint256, ContractError> {
        self.ensure_installed()
            .await?
            .ok_or(ContractError::AddressNotSet)
    }

    fn criteria(&self, address: Address) -> NewFilter {
        let from_block = self
            .from_block
            .as_ref()
            .map(|block| format!("{block:#x}"))
            .unwrap_or_else(|| "0x0".to_string());
        let to_block = self
            .to_block
            .as_ref()
            .map(|block| format!("{block:#x}"))
            .unwrap_or_else(|| "latest".to_string());
        NewFilter {
            from_block: Some(from_block),
            to_block: Some(to_block),
            address: vec![address],
            topics: Some(vec![Some(vec![Some(bytes_to_data(&self.event.topic0()))])]),
        }
    }
}

/// Decodes the indexed parameters of a raw log against `event`. Topic zero
/// must carry the event's signature hash, the following topics are decoded
/// in declaration order of the indexed parameters.
pub fn decode_log(event: &Event, log: Log) -> Result<DecodedLog, ContractError> {
    let mut raw_topics = log.topics.iter();
    let topic0 = raw_topics.next().ok_or_else(|| {
        ContractError::BadResponse(format!("log for {} carries no topics", event.name))
    })?;
    if topic0.0.as_slice() != event.topic0().as_slice() {
        return Err(ContractError::BadResponse(format!(
            "log topic does not match the {} signature",
            event.name
        )));
    }
    let mut topics = Vec::new();
    for param in event.indexed_inputs() {
        let raw = raw_topics.next().ok_or_else(|| {
            ContractError::BadResponse(format!(
                "log for {} is missing a topic for {}",
                event.name, param.name
            ))
        })?;
        topics.push(decode_topic(&param.kind, raw)?);
    }
    if event.inputs.iter().any(|param| !param.indexed) {
        warn!(
            "event {} declares non-indexed parameters, returning their bytes undecoded",
            event.name
        );
    }
    Ok(DecodedLog {
        block_number: log.block_number,
        transaction_hash: log.transaction_hash,
        block_hash: log.block_hash,
        transaction_index: log.transaction_index,
        topics,
        data: log.data,
    })
}

fn decode_topic(kind: &ParamType, raw: &Data) -> Result<AbiToken, ContractError> {
    match kind {
        ParamType::Uint(_)
        | ParamType::Int(_)
        | ParamType::Address
        | ParamType::Bool
        | ParamType::FixedBytes(_) => {
            let mut decoded = decode(std::slice::from_ref(kind), &raw.0)?;
            Ok(decoded.remove(0))
        }
        // anything else is stored as its hash, hand the word back raw
        _ => Ok(AbiToken::FixedBytes(raw.0.clone())),
    }
}

#[cfg(test)]
fn test_event() -> Event {
    use lattice::abi::Contract;
    let abi = r#"[
      {"type": "event", "name": "Transfer", "inputs": [
        {"indexed": true, "name": "from", "type": "address"},
        {"indexed": true, "name": "to", "type": "address"},
        {"indexed": false, "name": "value", "type": "uint256"}
      ]}
    ]"#;
    Contract::from_json(abi).unwrap().event("Transfer").unwrap().clone()
}

#[cfg(test)]
fn topic_for_address(address: &Address) -> Data {
    let mut word = vec![0u8; 12];
    word.extend_from_slice(address.as_bytes());
    Data(word)
}

#[test]
fn decodes_indexed_topics_in_order() {
    let event = test_event();
    let from: Address = "0x00000000000000000000000000000000000000aa".parse().unwrap();
    let to: Address = "0x00000000000000000000000000000000000000bb".parse().unwrap();
    let mut value_word = vec![0u8; 32];
    value_word[31] = 5;
    let log = Log {
        block_number: Some(7u8.into()),
        topics: vec![
            Data(event.topic0().to_vec()),
            topic_for_address(&from),
            topic_for_address(&to),
        ],
        data: Data(value_word),
        ..Default::default()
    };
    let decoded = decode_log(&event, log).unwrap();
    assert_eq!(
        decoded.topics,
        vec![AbiToken::Address(from), AbiToken::Address(to)]
    );
    assert_eq!(decoded.block_number, Some(7u8.into()));
    // the non-indexed value rides along undecoded
    assert_eq!(decoded.data.len(), 32);
}

#[test]
fn rejects_foreign_topic0() {
    let event = test_event();
    let log = Log {
        topics: vec![Data(vec![0u8; 32])],
        ..Default::default()
    };
    match decode_log(&event, log).unwrap_err() {
        ContractError::BadResponse(_) => {}
        _ => panic!(),
    }
}

#[test]
fn rejects_missing_indexed_topic() {
    let event = test_event();
    let from: Address = "0x00000000000000000000000000000000000000aa".parse().unwrap();
    let log = Log {
        topics: vec![Data(event.topic0().to_vec()), topic_for_address(&from)],
        ..Default::default()
    };
    match decode_log(&event, log).unwrap_err() {
        ContractError::BadResponse(_) => {}
        _ => panic!(),
    }
}

#[test]
fn hashed_topic_kinds_come_back_raw() {
    use lattice::abi::Contract;
    let abi = r#"[
      {"type": "event", "name": "Named", "inputs": [
        {"indexed": true, "name": "name", "type": "string"}
      ]}
    ]"#;
    let event = Contract::from_json(abi).unwrap().event("Named").unwrap().clone();
    let hashed = vec![0xabu8; 32];
    let log = Log {
        topics: vec![Data(event.topic0().to_vec()), Data(hashed.clone())],
        ..Default::default()
    };
    let decoded = decode_log(&event, log).unwrap();
    assert_eq!(decoded.topics, vec![AbiToken::FixedBytes(hashed)]);
}
