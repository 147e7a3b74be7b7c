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


//! Signed payment submission to a `StateChannel` contract

use std::{fmt, str::FromStr};

use alloy_primitives::{address, keccak256, Address, Bytes, PrimitiveSignature, B256, U256};
use alloy_sol_types::SolValue;
use ammctl_contracts::channel::StateChannel;
use ammctl_provider::EvmProvider;
use ammctl_signer::LocalTxSigner;
use anyhow::Context;
use tracing::{debug, info};

use crate::{
    client::ChainClient,
    error::{DeployError, DeployResult},
    nonce::NonceCounter,
};

/// Well-known payment channel
pub const DEFAULT_CHANNEL: Address = address!("44315DE282695e32287A5a9B8317cA75c55e008A");

/// A payment to sign: the channel slot it is stored under and its amount in wei
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payment {
    /// Slot in the channel contract
    pub index: U256,
    /// Amount in wei
    pub amount: U256,
}

impl Payment {
    /// Create a payment
    pub fn new(index: u64, amount: u64) -> Self {
        Self {
            index: U256::from(index),
            amount: U256::from(amount),
        }
    }
}

impl FromStr for Payment {
    type Err = anyhow::Error;

    /// Parse `index:amount`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (index, amount) = s
            .split_once(':')
            .with_context(|| format!("payment {s:?} is not of the form index:amount"))?;
        Ok(Self {
            index: U256::from_str(index.trim())
                .with_context(|| format!("invalid payment index {index:?}"))?,
            amount: U256::from_str(amount.trim())
                .with_context(|| format!("invalid payment amount {amount:?}"))?,
        })
    }
}

impl fmt::Display for Payment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.index, self.amount)
    }
}

/// Payment stored in the channel, as read back from the contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSignature {
    /// Slot in the channel contract
    pub index: U256,
    /// Signature bytes
    pub signature: Bytes,
    /// Amount in wei
    pub amount: U256,
}

/// `keccak256(abi.encodePacked(uint256 amount, address channel))`
pub fn payment_digest(amount: U256, channel: Address) -> B256 {
    keccak256((amount, channel).abi_encode_packed())
}

/// Sign the payment digest as an EIP-191 personal message
pub async fn sign_payment(
    signer: &LocalTxSigner,
    amount: U256,
    channel: Address,
) -> DeployResult<PrimitiveSignature> {
    let digest = payment_digest(amount, channel);
    Ok(signer.sign_message(digest.as_slice()).await?)
}

/// Address that signed `signature` over the payment digest
pub fn recover_payment_signer(
    amount: U256,
    channel: Address,
    signature: &PrimitiveSignature,
) -> DeployResult<Address> {
    let digest = payment_digest(amount, channel);
    signature
        .recover_address_from_msg(digest.as_slice())
        .context("failed to recover payment signer")
        .map_err(DeployError::from)
}

/// Sign and store each payment in `channel`, one at a time.
///
/// Each `addSignature` transaction is mined before the next payment is signed.
/// Once all are stored, each slot is read back from the contract.
pub async fn submit_signatures<P: EvmProvider>(
    client: &ChainClient<P>,
    channel: Address,
    payments: &[Payment],
    nonces: &mut NonceCounter,
) -> DeployResult<Vec<StoredSignature>> {
    let signer = client.address();
    info!("Adding {} signatures to {channel}", payments.len());

    for payment in payments {
        let signature = sign_payment(client.signer(), payment.amount, channel).await?;
        let recovered = recover_payment_signer(payment.amount, channel, &signature)?;
        if recovered != signer {
            return Err(DeployError::BadSignature {
                index: payment.index,
                recovered,
                signer,
            });
        }
        let signature = Bytes::copy_from_slice(&signature.as_bytes());
        debug!("Payment {payment} signature {signature}");

        let mut batch = client.new_batch().await?;
        batch
            .queue_call(
                format!("signature {}", payment.index),
                channel,
                &StateChannel::addSignatureCall {
                    index: payment.index,
                    signature,
                    ethAmount: payment.amount,
                },
                nonces,
            )
            .await?;
        let pending = batch.submit_all().await?;
        client.await_all(pending).await?;
    }
    info!("Signatures added");

    let mut stored = Vec::with_capacity(payments.len());
    for payment in payments {
        let signature = client
            .call_view(
                channel,
                &StateChannel::getSignatureCall {
                    index: payment.index,
                },
            )
            .await?
            .signature;
        let amount = client
            .call_view(
                channel,
                &StateChannel::getSignatureEthAmountCall {
                    index: payment.index,
                },
            )
            .await?
            .ethAmount;
        info!("Signature {}: {signature}", payment.index);
        info!("Amount {}: {amount}", payment.index);
        stored.push(StoredSignature {
            index: payment.index,
            signature,
            amount,
        });
    }
    Ok(stored)
}
