//! The serde-level data model of an ABI description. The JSON format for a
//! contract's interface is an array of entries, each tagged as a
//! constructor, function, event or fallback.

/// One raw entry of an ABI description. Entries without a `type` tag are
/// functions, unknown tags are tolerated and filtered out later.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AbiItem {
    #[serde(rename = "type", default)]
    pub operation: Operation,
    pub name: Option<String>,
    #[serde(default)]
    pub inputs: Vec<AbiInput>,
    pub outputs: Option<Vec<AbiInput>>,
    #[serde(rename = "stateMutability")]
    pub state_mutability: Option<StateMutability>,
    #[serde(default)]
    pub payable: bool,
    #[serde(default)]
    pub constant: bool,
    #[serde(default)]
    pub anonymous: bool,
}

/// A single input or output parameter of an entry. Tuple types carry their
/// member list in `components`, event parameters their `indexed` flag.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AbiInput {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub components: Vec<AbiInput>,
    #[serde(default)]
    pub indexed: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    #[default]
    Function,
    Constructor,
    Event,
    Fallback,
    Receive,
    #[serde(other)]
    Other,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateMutability {
    Pure,
    View,
    Nonpayable,
    Payable,
}
