// This file is part of ammctl.
//
// ammctl is free software: you can redistribute it and/or modify it under the
// terms of the GNU Lesser General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later version.
//
// ammctl is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with ammctl.
// If not, see https://www.gnu.org/licenses/.


#![warn(missing_docs, unreachable_pub, unused_crate_dependencies)]
#![deny(unused_must_use, rust_2018_idioms)]
#![doc(test(
    no_crate_inject,
    attr(deny(warnings, rust_2018_idioms), allow(dead_code, unused_variables))
))]

//! Deployment and interaction flows for the AMM contracts.
//!
//! Every flow threads an explicit [`NonceCounter`] through its transactions so
//! that contract addresses can be predicted and wired together before any of
//! them is mined.

pub mod address_book;
pub use address_book::{AddressBook, DEFAULT_REGISTRY};

mod batch;
pub use batch::{await_all, MinedTx, PendingTx, TxBatch};

mod client;
pub use client::{ChainClient, GasFees, TxSettings};

pub mod channel;
pub use channel::{submit_signatures, Payment, StoredSignature, DEFAULT_CHANNEL};

pub mod deploy;
pub use deploy::{deploy_and_save, deploy_pairs, DeployConfig, DeployedPair};

mod error;
pub use error::{DeployError, DeployResult};

mod interact;
pub use interact::{approve_and_register, TokenAllowance};

mod nonce;
pub use nonce::{predict_create_address, NonceCounter};

#[cfg(test)]
mod test_utils;
