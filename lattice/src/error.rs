use std::fmt;
use std::num::ParseIntError;
use std::str::Utf8Error;

/// Custom error implementation that describes possible
/// error states.
///
/// This is shared by a whole crate.
#[derive(Debug)]
pub enum Error {
    UnknownType(String),
    InvalidSignature(String),
    InvalidAbiJson(String),
    UnnamedEntry(&'static str),
    EmptyAbi,
    WrongArgumentCount { expected: usize, got: usize },
    ValueOutOfRange(String),
    TypeMismatch { expected: String, got: String },
    TruncatedData { needed: usize, available: usize },
    OffsetOutOfBounds { offset: usize, length: usize },
    OversizedWord,
    InvalidUtf8(Utf8Error),
    InvalidHex(ParseIntError),
    InvalidAddressLength { got: usize, expected: usize },
    InvalidEip55,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnknownType(val) => write!(f, "Unable to parse type {val}"),
            Error::InvalidSignature(val) => write!(f, "Invalid signature {val}"),
            Error::InvalidAbiJson(val) => write!(f, "Malformed ABI description {val}"),
            Error::UnnamedEntry(kind) => write!(f, "ABI {kind} entry has no name"),
            Error::EmptyAbi => write!(f, "ABI describes no functions or events"),
            Error::WrongArgumentCount { expected, got } => {
                write!(f, "Wrong argument count, got {got} expected {expected}")
            }
            Error::ValueOutOfRange(val) => write!(f, "Value out of range, {val}"),
            Error::TypeMismatch { expected, got } => {
                write!(f, "Type mismatch, expected {expected} got {got}")
            }
            Error::TruncatedData { needed, available } => {
                write!(f, "Data too short, needed {needed} bytes have {available}")
            }
            Error::OffsetOutOfBounds { offset, length } => {
                write!(f, "Offset {offset} outside of data of length {length}")
            }
            Error::OversizedWord => {
                write!(f, "Offset or length word exceeds the addressable range")
            }
            Error::InvalidUtf8(_) => write!(f, "Failed to parse bytes as utf8"),
            Error::InvalidHex(_) => write!(f, "Invalid hex character"),
            Error::InvalidAddressLength { got, expected } => {
                write!(f, "Invalid address length, got {got} expected {expected}")
            }
            Error::InvalidEip55 => write!(f, "Invalid EIP-55 Address encoding"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidUtf8(inner) => Some(inner),
            Error::InvalidHex(inner) => Some(inner),
            _ => None,
        }
    }
}

impl From<Utf8Error> for Error {
    fn from(e: Utf8Error) -> Self {
        Error::InvalidUtf8(e)
    }
}

impl From<ParseIntError> for Error {
    fn from(e: ParseIntError) -> Self {
        Error::InvalidHex(e)
    }
}
