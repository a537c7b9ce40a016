use lattice::Error as AbiError;
use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result;

/// Everything that can go wrong between a typed argument list and a settled
/// chain interaction.
///
/// Codec and schema problems arrive wrapped as `Abi` and never self-heal.
/// `TransactionTimeout` is the one retryable condition: the handle that
/// reported it stays pending and can be polled again.
#[derive(Debug)]
pub enum ContractError {
    Abi(AbiError),
    Arity { expected: usize, got: usize },
    AddressNotSet,
    FunctionNotFound(String),
    EventNotFound(String),
    Deployment(String),
    Transaction(String),
    TransactionTimeout,
    JsonRpcError { code: i64, message: String, data: String },
    BadResponse(String),
    FailedToSend(String),
    BadInput(String),
}

impl From<AbiError> for ContractError {
    fn from(error: AbiError) -> Self {
        ContractError::Abi(error)
    }
}

impl Display for ContractError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            ContractError::Abi(val) => write!(f, "Abi error {val}"),
            ContractError::Arity { expected, got } => {
                write!(f, "Wrong number of arguments, got {got} expected {expected}")
            }
            ContractError::AddressNotSet => {
                write!(f, "Contract binding has no address to talk to")
            }
            ContractError::FunctionNotFound(val) => {
                write!(f, "Failed to find function {val}")
            }
            ContractError::EventNotFound(val) => write!(f, "Failed to find event {val}"),
            ContractError::Deployment(val) => write!(f, "Contract deployment failed {val}"),
            ContractError::Transaction(val) => write!(f, "Transaction failed {val}"),
            ContractError::TransactionTimeout => {
                write!(f, "Transaction was not mined in time")
            }
            ContractError::JsonRpcError {
                code,
                message,
                data,
            } => write!(
                f,
                "Chain response error code {code} message {message} data {data:?}"
            ),
            ContractError::BadResponse(val) => write!(f, "Bad chain response {val}"),
            ContractError::FailedToSend(val) => write!(f, "Failed to send request {val}"),
            ContractError::BadInput(val) => write!(f, "Bad input {val}"),
        }
    }
}

impl Error for ContractError {}
