use crate::abi::entry::{AbiInput, AbiItem, Operation};
use crate::abi::keccak256;
use crate::abi::param_type::ParamType;
use crate::abi::token::AbiToken;
use crate::abi::{decode, encode};
use crate::error::Error;
use std::collections::BTreeMap;
use std::io;

/// A named function or constructor parameter with its resolved type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub kind: ParamType,
}

/// An event parameter, which additionally knows whether it is indexed and
/// therefore recoverable from the log's topics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventParam {
    pub name: String,
    pub kind: ParamType,
    pub indexed: bool,
}

/// A callable function of a contract, with the derived 4 byte selector that
/// prefixes its call data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    pub inputs: Vec<Param>,
    pub outputs: Vec<Param>,
}

impl Function {
    /// The canonical signature string, parameter names do not participate.
    pub fn signature(&self) -> String {
        render_signature(&self.name, &self.inputs)
    }

    pub fn selector(&self) -> [u8; 4] {
        let digest = keccak256(self.signature().as_bytes());
        let mut id = [0u8; 4];
        id.copy_from_slice(&digest[0..4]);
        id
    }

    /// The name this function is reachable under when its plain name is
    /// shared by an overload, the canonical input types joined onto it.
    pub fn dispatch_name(&self) -> String {
        let mut name = self.name.clone();
        for input in &self.inputs {
            name.push_str("__");
            name.push_str(&input.kind.to_string());
        }
        name
    }

    /// Selector plus encoded arguments, ready to be used as call data.
    pub fn encode_call(&self, tokens: &[AbiToken]) -> Result<Vec<u8>, Error> {
        let kinds: Vec<ParamType> = self.inputs.iter().map(|p| p.kind.clone()).collect();
        let mut out = self.selector().to_vec();
        out.extend(encode(&kinds, tokens)?);
        Ok(out)
    }

    /// Decodes return data against the declared outputs, in order.
    pub fn decode_outputs(&self, data: &[u8]) -> Result<Vec<AbiToken>, Error> {
        let kinds: Vec<ParamType> = self.outputs.iter().map(|p| p.kind.clone()).collect();
        decode(&kinds, data)
    }
}

/// An event of a contract, with the derived 32 byte signature hash that the
/// chain places in topic zero of matching logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub name: String,
    pub inputs: Vec<EventParam>,
}

impl Event {
    pub fn signature(&self) -> String {
        let rendered: Vec<String> = self.inputs.iter().map(|p| p.kind.to_string()).collect();
        format!("{}({})", self.name, rendered.join(","))
    }

    pub fn topic0(&self) -> [u8; 32] {
        keccak256(self.signature().as_bytes())
    }

    pub fn indexed_inputs(&self) -> impl Iterator<Item = &EventParam> {
        self.inputs.iter().filter(|p| p.indexed)
    }
}

/// The constructor of a contract. A contract without a constructor entry
/// behaves as if it had one with no arguments.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Constructor {
    pub inputs: Vec<Param>,
}

impl Constructor {
    /// Deployment payload: the contract bytecode with the encoded
    /// constructor arguments appended, no selector involved.
    pub fn encode_input(&self, bytecode: &[u8], tokens: &[AbiToken]) -> Result<Vec<u8>, Error> {
        let kinds: Vec<ParamType> = self.inputs.iter().map(|p| p.kind.clone()).collect();
        let mut out = bytecode.to_vec();
        out.extend(encode(&kinds, tokens)?);
        Ok(out)
    }
}

/// A parsed ABI description: the constructor and the function and event
/// dispatch tables, resolved once at parse time.
///
/// When several functions share a name, the first declaration keeps the
/// bare name and later declarations are reachable under their
/// [`Function::dispatch_name`], so lookups stay unambiguous for a given ABI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contract {
    constructor: Option<Constructor>,
    functions: BTreeMap<String, Function>,
    events: BTreeMap<String, Event>,
}

impl Contract {
    pub fn load<T: io::Read>(reader: T) -> Result<Self, Error> {
        let items: Vec<AbiItem> =
            serde_json::from_reader(reader).map_err(|e| Error::InvalidAbiJson(e.to_string()))?;
        Contract::from_items(items)
    }

    pub fn from_json(abi: &str) -> Result<Self, Error> {
        let items: Vec<AbiItem> =
            serde_json::from_str(abi).map_err(|e| Error::InvalidAbiJson(e.to_string()))?;
        Contract::from_items(items)
    }

    pub fn from_items(items: Vec<AbiItem>) -> Result<Self, Error> {
        let mut constructor = None;
        let mut functions: BTreeMap<String, Function> = BTreeMap::new();
        let mut events = BTreeMap::new();
        for item in items {
            match item.operation {
                Operation::Constructor => {
                    // the first constructor entry wins, duplicates occur in
                    // the wild and are ignored
                    if constructor.is_none() {
                        constructor = Some(Constructor {
                            inputs: resolve_params(&item.inputs)?,
                        });
                    }
                }
                Operation::Function => {
                    let name = item.name.clone().ok_or(Error::UnnamedEntry("function"))?;
                    let function = Function {
                        name: name.clone(),
                        inputs: resolve_params(&item.inputs)?,
                        outputs: resolve_params(item.outputs.as_deref().unwrap_or(&[]))?,
                    };
                    let key = if functions.contains_key(&name) {
                        function.dispatch_name()
                    } else {
                        name
                    };
                    functions.insert(key, function);
                }
                Operation::Event => {
                    let name = item.name.clone().ok_or(Error::UnnamedEntry("event"))?;
                    let event = Event {
                        name: name.clone(),
                        inputs: resolve_event_params(&item.inputs)?,
                    };
                    events.insert(name, event);
                }
                Operation::Fallback | Operation::Receive | Operation::Other => {}
            }
        }
        if functions.is_empty() && events.is_empty() {
            return Err(Error::EmptyAbi);
        }
        Ok(Contract {
            constructor,
            functions,
            events,
        })
    }

    pub fn constructor(&self) -> Option<&Constructor> {
        self.constructor.as_ref()
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.functions.values()
    }

    pub fn event(&self, name: &str) -> Option<&Event> {
        self.events.get(name)
    }

    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.events.values()
    }
}

fn render_signature(name: &str, params: &[Param]) -> String {
    let rendered: Vec<String> = params.iter().map(|p| p.kind.to_string()).collect();
    format!("{}({})", name, rendered.join(","))
}

fn resolve_params(inputs: &[AbiInput]) -> Result<Vec<Param>, Error> {
    inputs
        .iter()
        .map(|input| {
            Ok(Param {
                name: input.name.clone(),
                kind: ParamType::from_abi(&input.type_, &input.components)?,
            })
        })
        .collect()
}

fn resolve_event_params(inputs: &[AbiInput]) -> Result<Vec<EventParam>, Error> {
    inputs
        .iter()
        .map(|input| {
            Ok(EventParam {
                name: input.name.clone(),
                kind: ParamType::from_abi(&input.type_, &input.components)?,
                indexed: input.indexed,
            })
        })
        .collect()
}

#[cfg(test)]
const TEST_ABI: &str = r#"[
  {
    "constant": true,
    "inputs": [
      {"name": "", "type": "bytes"},
      {"name": "", "type": "bool"},
      {"name": "", "type": "uint256[]"}
    ],
    "name": "sam",
    "outputs": [],
    "payable": false,
    "stateMutability": "pure",
    "type": "function"
  },
  {
    "inputs": [
      {"name": "x", "type": "uint32"},
      {"name": "y", "type": "bool"}
    ],
    "name": "baz",
    "outputs": [{"name": "r", "type": "bool"}],
    "stateMutability": "pure"
  },
  {
    "name": "f_nested",
    "type": "function",
    "inputs": [
      {
        "name": "s",
        "type": "tuple",
        "components": [
          {"name": "a", "type": "uint256"},
          {"name": "b", "type": "uint256[]"}
        ]
      },
      {"name": "a", "type": "uint256"}
    ],
    "outputs": [],
    "stateMutability": "nonpayable"
  },
  {
    "inputs": [{"name": "supply", "type": "uint256"}],
    "payable": false,
    "stateMutability": "nonpayable",
    "type": "constructor"
  },
  {
    "anonymous": false,
    "inputs": [
      {"indexed": true, "name": "a", "type": "uint256"},
      {"indexed": false, "name": "b", "type": "bytes32"}
    ],
    "name": "Shipped",
    "type": "event"
  },
  {
    "inputs": [],
    "payable": false,
    "stateMutability": "nonpayable",
    "type": "constructor"
  },
  {
    "stateMutability": "payable",
    "type": "fallback"
  }
]"#;

#[test]
fn parses_descriptor_collections() {
    use std::io::BufReader;
    let contract =
        Contract::load(BufReader::new(TEST_ABI.as_bytes())).expect("Unable to load contract");

    // the entry without a type tag still counts as a function
    assert_eq!(contract.functions().count(), 3);
    let baz = contract.function("baz").unwrap();
    assert_eq!(baz.signature(), "baz(uint32,bool)");
    assert_eq!(baz.inputs[0].name, "x");
    assert_eq!(baz.outputs.len(), 1);

    let nested = contract.function("f_nested").unwrap();
    assert_eq!(
        nested.inputs[0].kind,
        ParamType::Tuple(vec![
            ParamType::Uint(256),
            ParamType::Array(Box::new(ParamType::Uint(256)))
        ])
    );

    // the first constructor wins, the duplicate is ignored
    let ctor = contract.constructor().unwrap();
    assert_eq!(ctor.inputs.len(), 1);
    assert_eq!(ctor.inputs[0].kind, ParamType::Uint(256));

    let event = contract.event("Shipped").unwrap();
    assert_eq!(event.signature(), "Shipped(uint256,bytes32)");
    assert_eq!(event.indexed_inputs().count(), 1);
}

#[test]
fn selectors_match_known_values() {
    use crate::utils::bytes_to_hex_str;
    let contract = Contract::from_json(TEST_ABI).unwrap();
    assert_eq!(
        bytes_to_hex_str(&contract.function("baz").unwrap().selector()),
        "cdcd77c0"
    );
    assert_eq!(
        bytes_to_hex_str(&contract.function("sam").unwrap().selector()),
        "a5643bf2"
    );
}

#[test]
fn event_topic_matches_known_value() {
    use crate::utils::bytes_to_hex_str;
    let abi = r#"[
      {"type": "event", "name": "Transfer", "inputs": [
        {"indexed": true, "name": "from", "type": "address"},
        {"indexed": true, "name": "to", "type": "address"},
        {"indexed": false, "name": "value", "type": "uint256"}
      ]}
    ]"#;
    let contract = Contract::from_json(abi).unwrap();
    assert_eq!(
        bytes_to_hex_str(&contract.event("Transfer").unwrap().topic0()),
        "ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
    );
}

#[test]
fn overloads_get_distinct_dispatch_names() {
    let abi = r#"[
      {"type": "function", "name": "transfer",
       "inputs": [{"name": "to", "type": "address"}], "outputs": []},
      {"type": "function", "name": "transfer",
       "inputs": [{"name": "to", "type": "address"}, {"name": "value", "type": "uint256"}],
       "outputs": []}
    ]"#;
    let contract = Contract::from_json(abi).unwrap();
    assert_eq!(contract.functions().count(), 2);
    // the first declaration keeps the plain name
    let first = contract.function("transfer").unwrap();
    assert_eq!(first.inputs.len(), 1);
    // the later one is reachable under its augmented name
    let second = contract.function("transfer__address__uint256").unwrap();
    assert_eq!(second.inputs.len(), 2);
    assert_ne!(first.selector(), second.selector());
}

#[test]
fn rejects_unnamed_function() {
    let abi = r#"[{"type": "function", "inputs": [], "outputs": []}]"#;
    match Contract::from_json(abi).unwrap_err() {
        Error::UnnamedEntry("function") => {}
        _ => panic!(),
    }
}

#[test]
fn rejects_unparseable_type() {
    let abi = r#"[{"type": "function", "name": "f",
                   "inputs": [{"name": "x", "type": "uint12345"}], "outputs": []}]"#;
    match Contract::from_json(abi).unwrap_err() {
        Error::UnknownType(val) => assert_eq!(val, "uint12345"),
        _ => panic!(),
    }
}

#[test]
fn rejects_abi_with_nothing_callable() {
    match Contract::from_json("[]").unwrap_err() {
        Error::EmptyAbi => {}
        _ => panic!(),
    }
    // constructor and fallback entries alone do not make a usable schema
    let abi = r#"[
      {"type": "constructor", "inputs": []},
      {"type": "fallback", "stateMutability": "payable"}
    ]"#;
    match Contract::from_json(abi).unwrap_err() {
        Error::EmptyAbi => {}
        _ => panic!(),
    }
}

#[test]
fn rejects_malformed_json() {
    match Contract::from_json("{").unwrap_err() {
        Error::InvalidAbiJson(_) => {}
        _ => panic!(),
    }
}

#[test]
fn constructor_payload_appends_to_bytecode() {
    let contract = Contract::from_json(TEST_ABI).unwrap();
    let bytecode = vec![0x60, 0x80, 0x60, 0x40];
    let payload = contract
        .constructor()
        .unwrap()
        .encode_input(&bytecode, &[42u32.into()])
        .unwrap();
    assert_eq!(&payload[..4], &bytecode[..]);
    assert_eq!(payload.len(), 4 + 32);
    assert_eq!(payload[payload.len() - 1], 42);
}
