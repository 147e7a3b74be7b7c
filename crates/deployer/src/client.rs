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


use std::time::Duration;

use alloy_network::TransactionBuilder;
use alloy_primitives::Address;
use alloy_sol_types::SolCall;
use ammctl_provider::{EvmProvider, ProviderError, TransactionRequest};
use ammctl_signer::LocalTxSigner;
use futures_util::future;
use tracing::info;

use crate::{
    batch::{self, MinedTx, PendingTx, TxBatch},
    error::DeployResult,
    nonce::NonceCounter,
};

/// Transaction settings shared by every operation of a run
#[derive(Debug, Clone, Copy)]
pub struct TxSettings {
    /// Interval between receipt polls
    pub poll_interval: Duration,
    /// Number of receipt polls before giving up on a transaction
    pub max_polls: u64,
    /// Percentage of the pending base fee to budget for in `max_fee_per_gas`
    pub base_fee_percent: u32,
    /// Percentage of the node's suggested priority fee to pay
    pub priority_fee_percent: u32,
}

impl Default for TxSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            max_polls: 120,
            base_fee_percent: 200,
            priority_fee_percent: 100,
        }
    }
}

/// EIP-1559 fees used for every transaction of a batch
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct GasFees {
    /// EIP-1559 max fee per gas
    pub max_fee_per_gas: u128,
    /// EIP-1559 max priority fee per gas
    pub max_priority_fee_per_gas: u128,
}

impl GasFees {
    /// Scale node reported fees by the configured percentages
    pub fn from_node(base_fee: u128, priority_fee: u128, settings: &TxSettings) -> Self {
        let max_priority_fee_per_gas = percent_ceil(priority_fee, settings.priority_fee_percent);
        Self {
            max_fee_per_gas: percent_ceil(base_fee, settings.base_fee_percent)
                .saturating_add(max_priority_fee_per_gas),
            max_priority_fee_per_gas,
        }
    }
}

fn percent_ceil(value: u128, percent: u32) -> u128 {
    value.saturating_mul(percent as u128).div_ceil(100)
}

/// Node connection and signing key used by an operation
#[derive(Debug)]
pub struct ChainClient<P> {
    provider: P,
    signer: LocalTxSigner,
    chain_id: u64,
    settings: TxSettings,
}

impl<P: EvmProvider> ChainClient<P> {
    /// Create a client. `signer` must be bound to `chain_id`.
    pub fn new(provider: P, signer: LocalTxSigner, chain_id: u64, settings: TxSettings) -> Self {
        Self {
            provider,
            signer,
            chain_id,
            settings,
        }
    }

    /// Node provider
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Signing key
    pub fn signer(&self) -> &LocalTxSigner {
        &self.signer
    }

    /// Address of the signing key
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Chain id transactions are signed for
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Transaction settings
    pub fn settings(&self) -> &TxSettings {
        &self.settings
    }

    /// Nonce counter starting at the signer's pending transaction count
    pub async fn fetch_nonces(&self) -> DeployResult<NonceCounter> {
        Ok(NonceCounter::fetch(&self.provider, self.address()).await?)
    }

    /// Current fees, scaled by the configured percentages
    pub async fn get_fees(&self) -> DeployResult<GasFees> {
        let (base_fee, priority_fee) = future::try_join(
            self.provider.get_pending_base_fee(),
            self.provider.get_max_priority_fee(),
        )
        .await?;
        let fees = GasFees::from_node(base_fee, priority_fee, &self.settings);
        info!(
            "Using max fee {} and priority fee {} (base fee {base_fee})",
            fees.max_fee_per_gas, fees.max_priority_fee_per_gas
        );
        Ok(fees)
    }

    /// Start a batch priced at the current fees
    pub async fn new_batch(&self) -> DeployResult<TxBatch<'_, P>> {
        let fees = self.get_fees().await?;
        Ok(TxBatch::new(self, fees))
    }

    /// Wait for every pending transaction to be mined, preserving order
    pub async fn await_all(&self, pending: Vec<PendingTx>) -> DeployResult<Vec<MinedTx>> {
        batch::await_all(self, pending).await
    }

    /// `eth_call` a view function on `to` from the signer's address
    pub async fn call_view<C: SolCall>(&self, to: Address, call: &C) -> DeployResult<C::Return> {
        let tx = TransactionRequest::default()
            .with_from(self.address())
            .with_to(to)
            .with_call(call);
        let data = self.provider.call(&tx, None).await?;
        Ok(C::abi_decode_returns(&data, true).map_err(ProviderError::from)?)
    }
}
