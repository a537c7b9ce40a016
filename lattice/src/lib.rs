//! # Introduction
//! Lattice is the schema and binary codec layer for contracts on
//! account-based chains. It parses an ABI description into typed
//! descriptors, encodes argument lists into the 32-byte-word wire format
//! the chain's virtual machine expects, and decodes return values and
//! event topics back into typed values.
//!
//! ## Features
//! * Any-endian, 32/64-bit support
//! * ABI parsing with a static dispatch table for functions and events
//! * Full head/tail encoding for dynamic types, arrays and tuples
//! * Selector and event-topic derivation from canonical signatures
//!
//! ## Getting started
//! ```rust
//! use lattice::abi::{encode_call, Contract};
//! use lattice::Address;
//!
//! let recipient: Address = "0x00000000000000000000000000000000deadbeef"
//!     .parse()
//!     .unwrap();
//!
//! // One-shot encoding against a signature string
//! let payload = encode_call(
//!     "transfer(address,uint256)",
//!     &[recipient.into(), 100u32.into()],
//! )
//! .unwrap();
//! assert_eq!(payload.len(), 4 + 64);
//!
//! // Or parse a full ABI description and dispatch by name
//! let abi = Contract::from_json(
//!     r#"[{"type": "function", "name": "get", "inputs": [],
//!          "outputs": [{"name": "", "type": "uint256"}]}]"#,
//! )
//! .unwrap();
//! let call = abi.function("get").unwrap().encode_call(&[]).unwrap();
//! assert_eq!(call.len(), 4);
//! ```

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

#[macro_use]
extern crate serde_derive;

pub mod abi;
pub mod address;
pub mod error;
pub mod utils;

pub use abi::{AbiToken, Contract, ParamType};
pub use address::Address;
pub use error::Error;
pub use num256::{Int256, Uint256};
