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


use std::path::PathBuf;

use alloy_primitives::{Address, TxHash, U256};
use ammctl_contracts::ArtifactError;
use ammctl_provider::ProviderError;

/// Deployer result type
pub type DeployResult<T> = Result<T, DeployError>;

/// Errors raised while deploying or interacting with contracts
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// Artifact could not be loaded or has no usable bytecode
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    /// Node request failed
    #[error(transparent)]
    Provider(#[from] ProviderError),
    /// Transaction or message could not be signed
    #[error(transparent)]
    Signer(#[from] ammctl_signer::Error),
    /// Address file could not be read or written
    #[error("address file {path}: {source}")]
    AddressFile {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
    /// Address file does not hold a JSON array of addresses
    #[error("address file {path} is malformed: {source}")]
    MalformedAddressFile {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: serde_json::Error,
    },
    /// Contract was created somewhere other than the predicted address
    #[error("{label} was predicted at {predicted} but the receipt reports {actual:?}")]
    PredictionMismatch {
        /// Transaction label
        label: String,
        /// Predicted address
        predicted: Address,
        /// Contract address from the receipt
        actual: Option<Address>,
    },
    /// No code found at a predicted contract address
    #[error("{label} has no code at {address}")]
    NoCode {
        /// Transaction label
        label: String,
        /// Predicted address
        address: Address,
    },
    /// Transaction was mined but reverted
    #[error("{label} transaction {tx_hash} reverted")]
    Reverted {
        /// Transaction label
        label: String,
        /// Transaction hash
        tx_hash: TxHash,
    },
    /// Receipt did not show up within the polling budget
    #[error("{label} transaction {tx_hash} not mined after {polls} polls")]
    NotMined {
        /// Transaction label
        label: String,
        /// Transaction hash
        tx_hash: TxHash,
        /// Number of polls made
        polls: u64,
    },
    /// Signature over a payment does not recover to the signer
    #[error("signature for payment {index} recovers to {recovered}, expected {signer}")]
    BadSignature {
        /// Payment index
        index: U256,
        /// Recovered address
        recovered: Address,
        /// Signer address
        signer: Address,
    },
    /// Other error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
