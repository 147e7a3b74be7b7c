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
//! Signer implementations for ammctl

use std::fmt::{self, Debug};

use alloy_consensus::TxEnvelope;
use alloy_eips::eip2718::Encodable2718;
use alloy_network::{EthereumWallet, TransactionBuilder};
use alloy_primitives::{Address, Bytes, PrimitiveSignature};
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use ammctl_provider::TransactionRequest;
use secrecy::SecretString;

mod error;
pub use error::{Error, Result};

mod local;

/// Where the signing key comes from
#[derive(Debug, Clone)]
pub enum SigningScheme {
    /// Hex encoded private key
    PrivateKey {
        /// Private key
        private_key: SecretString,
    },
    /// BIP-39 mnemonic, derived along the default Ethereum path
    Mnemonic {
        /// Mnemonic
        mnemonic: SecretString,
        /// Derivation index of the account to use
        index: u32,
    },
}

/// Create a signer for the given scheme, bound to `chain_id`
pub fn new_local_signer(scheme: &SigningScheme, chain_id: u64) -> Result<LocalTxSigner> {
    let signer = match scheme {
        SigningScheme::PrivateKey { private_key } => {
            local::construct_signer_from_private_key(private_key, chain_id)?
        }
        SigningScheme::Mnemonic { mnemonic, index } => {
            local::construct_signer_from_mnemonic(mnemonic, chain_id, *index)?
        }
    };
    tracing::info!("Signer address: {}", signer.address());
    Ok(LocalTxSigner::new(signer))
}

/// A single local key that signs transactions and messages.
///
/// Signing never touches the network. The caller is responsible for
/// filling in nonce, gas and fees.
#[derive(Clone)]
pub struct LocalTxSigner {
    signer: PrivateKeySigner,
    wallet: EthereumWallet,
}

impl Debug for LocalTxSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LocalTxSigner {{ address: {} }}", self.address())
    }
}

impl LocalTxSigner {
    /// Wrap an existing key
    pub fn new(signer: PrivateKeySigner) -> Self {
        let wallet = EthereumWallet::from(signer.clone());
        Self { signer, wallet }
    }

    /// Get the address of the signer
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Chain id used for EIP-155 replay protection, if any
    pub fn chain_id(&self) -> Option<u64> {
        self.signer.chain_id()
    }

    /// Sign a transaction.
    ///
    /// The transaction must be complete: nonce, gas limit, fees, chain id and
    /// destination (or deploy code) set.
    pub async fn sign_tx(&self, tx: TransactionRequest) -> Result<TxEnvelope> {
        Ok(tx.with_from(self.address()).build(&self.wallet).await?)
    }

    /// Sign a transaction and return the raw EIP-2718 bytes
    pub async fn sign_tx_raw(&self, tx: TransactionRequest) -> Result<Bytes> {
        let tx_envelope = self.sign_tx(tx).await?;
        let mut raw_tx = vec![];
        tx_envelope.encode_2718(&mut raw_tx);
        Ok(raw_tx.into())
    }

    /// Sign `message` as an EIP-191 personal message
    pub async fn sign_message(&self, message: &[u8]) -> Result<PrimitiveSignature> {
        Ok(self.signer.sign_message(message).await?)
    }
}
