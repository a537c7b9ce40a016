//! A module for ABI handling.
//!
//! The ABI description of a contract is parsed into a [`Contract`] holding
//! typed function, event and constructor descriptors. Argument lists are
//! carried as [`AbiToken`] values and converted to and from the chain's
//! 32-byte-word binary format by [`encode()`] and [`decode()`].
//!
//! Additionally there are helpers to derive function selectors and event
//! topics from canonical signature strings.

pub mod contract;
pub mod decode;
pub mod encode;
pub mod entry;
pub mod param_type;
pub mod token;

pub use contract::{Constructor, Contract, Event, EventParam, Function, Param};
pub use decode::decode;
pub use encode::{derive_method_id, derive_signature, encode, encode_call};
pub use param_type::ParamType;
pub use token::AbiToken;

use sha3::{Digest, Keccak256};

pub(crate) fn keccak256(data: &[u8]) -> [u8; 32] {
    let digest = Keccak256::digest(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}
