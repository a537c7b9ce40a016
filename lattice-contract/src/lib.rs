//! Async contract layer on top of the `lattice` codec.
//!
//! A [`ContractBinding`] owns a parsed ABI, a sender and an injected
//! [`ChainClient`] and turns typed argument lists into read-only calls,
//! state-mutating transactions and deployments. Submissions hand back
//! handles that poll the chain for receipts, deployments additionally
//! resolve the new contract address, and event filters decode matching
//! logs against the ABI's event descriptors.
//!
//! The RPC transport itself is not part of this crate: anything that can
//! answer the handful of [`ChainClient`] methods, over HTTP, IPC or a test
//! double, plugs in at construction time.

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate log;

pub mod binding;
pub mod chain;
pub mod error;
pub mod events;
pub mod transaction;
pub mod types;

pub use binding::ContractBinding;
pub use chain::ChainClient;
pub use error::ContractError;
pub use events::{decode_log, DecodedLog, EventFilter};
pub use transaction::{DeploymentHandle, PollConfig, TransactionHandle, TxState};
