use lattice::utils::{bytes_to_hex_str, hex_str_to_bytes};
use lattice::Address;
use num256::Uint256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::ops::Deref;

/// Serializes a slice of data as the "UNFORMATTED DATA" format required
/// by the chain's JSONRPC API, a 0x prefixed hex string.
pub fn data_serialize<S>(x: &[u8], s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.serialize_str(&format!("0x{}", bytes_to_hex_str(x)))
}

/// Deserializes a slice of data from the "UNFORMATTED DATA" format required
/// by the chain's JSONRPC API.
pub fn data_deserialize<'de, D>(d: D) -> Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(d)?;
    hex_str_to_bytes(&s).map_err(serde::de::Error::custom)
}

/// An opaque byte payload that travels as a 0x prefixed hex string.
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq, Eq, Hash)]
pub struct Data(
    #[serde(
        serialize_with = "data_serialize",
        deserialize_with = "data_deserialize"
    )]
    pub Vec<u8>,
);

impl Deref for Data {
    type Target = Vec<u8>;
    fn deref(&self) -> &Vec<u8> {
        &self.0
    }
}

impl From<Vec<u8>> for Data {
    fn from(v: Vec<u8>) -> Self {
        Data(v)
    }
}

/// A raw event log as handed out by the filter endpoints.
#[derive(Serialize, Deserialize, Debug, Default, Clone, Eq, PartialEq)]
pub struct Log {
    /// true when the log was removed due to a chain reorganization
    pub removed: Option<bool>,
    /// integer of the log index position in the block, null for pending logs
    #[serde(rename = "logIndex")]
    pub log_index: Option<Uint256>,
    /// integer of the transaction's index position in the block, null for pending logs
    #[serde(rename = "transactionIndex")]
    pub transaction_index: Option<Uint256>,
    /// hash of the transaction this log was created from, null for pending logs
    #[serde(rename = "transactionHash")]
    pub transaction_hash: Option<Uint256>,
    /// hash of the block this log was in, null for pending logs
    #[serde(rename = "blockHash")]
    pub block_hash: Option<Uint256>,
    /// the block number this log was in, null for pending logs
    #[serde(rename = "blockNumber")]
    pub block_number: Option<Uint256>,
    /// address the log originated from
    pub address: Address,
    /// the non-indexed arguments of the log
    pub data: Data,
    /// 0 to 4 32-byte topics. The first topic is the hash of the event
    /// signature unless the event was declared anonymous.
    pub topics: Vec<Data>,
}

/// As received by getTransactionReceipt once a transaction has been mined.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TransactionReceipt {
    /// hash of the transaction
    #[serde(rename = "transactionHash")]
    pub transaction_hash: Uint256,
    /// integer of the transaction's index position in the block
    #[serde(rename = "transactionIndex")]
    pub transaction_index: Option<Uint256>,
    /// hash of the block this transaction was in
    #[serde(rename = "blockHash")]
    pub block_hash: Option<Uint256>,
    /// block number this transaction was in
    #[serde(rename = "blockNumber")]
    pub block_number: Option<Uint256>,
    /// address of the sender
    pub from: Option<Address>,
    /// address of the receiver, null for contract deployments
    pub to: Option<Address>,
    /// total gas used in the block up to and including this transaction
    #[serde(rename = "cumulativeGasUsed")]
    pub cumulative_gas_used: Option<Uint256>,
    /// amount of gas used by this transaction alone
    #[serde(rename = "gasUsed")]
    pub gas_used: Option<Uint256>,
    /// the contract address created, null unless the transaction was a deployment
    #[serde(rename = "contractAddress")]
    pub contract_address: Option<Address>,
    /// log objects this transaction created
    #[serde(default)]
    pub logs: Vec<Log>,
    /// either 1 (success) or 0 (failure), only present post Byzantium
    pub status: Option<Uint256>,
}

/// Criteria for registering a new server-side log filter.
#[derive(Serialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct NewFilter {
    #[serde(rename = "fromBlock", skip_serializing_if = "Option::is_none")]
    pub from_block: Option<String>,
    #[serde(rename = "toBlock", skip_serializing_if = "Option::is_none")]
    pub to_block: Option<String>,
    pub address: Vec<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topics: Option<Vec<Option<Vec<Option<String>>>>>,
}

#[test]
fn data_round_trips_as_prefixed_hex() {
    let data = Data(vec![0xde, 0xad, 0xbe, 0xef]);
    let encoded = serde_json::to_string(&data).unwrap();
    assert_eq!(encoded, "\"0xdeadbeef\"");
    let decoded: Data = serde_json::from_str(&encoded).unwrap();
    assert_eq!(decoded, data);
}

#[test]
fn log_parses_from_wire_json() {
    let raw = r#"{
      "removed": false,
      "logIndex": "0x1",
      "transactionIndex": "0x0",
      "transactionHash": "0x5c504ed432cb51138bcf09aa5e8a410dd4a1e204ef84bfed1be16dfba1b22060",
      "blockHash": "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b",
      "blockNumber": "0x1b4",
      "address": "0x16c5785ac562ff41e2dcfdf829c5a142f1fccd7d",
      "data": "0x0000000000000000000000000000000000000000000000000000000000000005",
      "topics": ["0x59ebeb90bc63057b6515673c3ecf9438e5058bca0f92585014eced636878c9a5"]
    }"#;
    let log: Log = serde_json::from_str(raw).unwrap();
    assert_eq!(log.block_number, Some(Uint256::from(0x1b4u32)));
    assert_eq!(log.topics.len(), 1);
    assert_eq!(log.data.len(), 32);
    assert_eq!(
        log.address,
        "0x16c5785ac562ff41e2dcfdf829c5a142f1fccd7d".parse().unwrap()
    );
}

#[test]
fn receipt_parses_from_wire_json() {
    let raw = r#"{
      "transactionHash": "0xb903239f8543d04b5dc1ba6579132b143087c68db1b2168786408fcbce568238",
      "transactionIndex": "0x1",
      "blockNumber": "0xb",
      "blockHash": "0xc6ef2fc5426d6ad6fd9e2a26abeab0aa2411b7ab17f30a99d3cb96aed1d1055b",
      "cumulativeGasUsed": "0x33bc",
      "gasUsed": "0x4dc",
      "contractAddress": "0xb60e8dd61c5d32be8058bb8eb970870f07233155",
      "logs": [],
      "status": "0x1"
    }"#;
    let receipt: TransactionReceipt = serde_json::from_str(raw).unwrap();
    assert_eq!(receipt.block_number, Some(Uint256::from(11u8)));
    assert!(receipt.contract_address.is_some());
    assert_eq!(receipt.status, Some(Uint256::from(1u8)));
    assert_eq!(receipt.to, None);
}

#[test]
fn new_filter_serializes_sparse_fields() {
    let filter = NewFilter {
        from_block: Some("0x0".to_string()),
        to_block: None,
        address: vec!["0x16c5785ac562ff41e2dcfdf829c5a142f1fccd7d".parse().unwrap()],
        topics: None,
    };
    let encoded = serde_json::to_string(&filter).unwrap();
    assert!(encoded.contains("fromBlock"));
    assert!(!encoded.contains("toBlock"));
    assert!(!encoded.contains("topics"));
}
