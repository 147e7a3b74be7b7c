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

use std::{future::IntoFuture, marker::PhantomData, time::Duration};

use alloy_primitives::{Address, Bytes, TxHash};
use alloy_provider::Provider as AlloyProvider;
use alloy_rpc_types_eth::{BlockId, BlockTransactionsKind, TransactionReceipt, TransactionRequest};
use alloy_transport::Transport;
use anyhow::Context;

use crate::{EvmProvider, ProviderError, ProviderResult};

/// [`EvmProvider`] over an alloy provider, each call bounded by a timeout
pub struct AlloyEvmProvider<AP, T> {
    inner: AP,
    timeout: Duration,
    _marker: PhantomData<T>,
}

impl<AP: Clone, T> Clone for AlloyEvmProvider<AP, T> {
    fn clone(&self) -> Self {
        Self::new(self.inner.clone(), self.timeout)
    }
}

impl<AP, T> AlloyEvmProvider<AP, T> {
    /// Create a new `AlloyEvmProvider`
    pub fn new(inner: AP, timeout: Duration) -> Self {
        Self {
            inner,
            timeout,
            _marker: PhantomData,
        }
    }

    async fn timed<F, R, E>(&self, request: F) -> ProviderResult<R>
    where
        F: IntoFuture<Output = Result<R, E>>,
        E: Into<ProviderError>,
    {
        match tokio::time::timeout(self.timeout, request).await {
            Ok(res) => res.map_err(Into::into),
            Err(_) => Err(ProviderError::Timeout(self.timeout)),
        }
    }
}

#[async_trait::async_trait]
impl<AP, T> EvmProvider for AlloyEvmProvider<AP, T>
where
    T: Transport + Clone,
    AP: AlloyProvider<T>,
{
    async fn get_chain_id(&self) -> ProviderResult<u64> {
        self.timed(self.inner.get_chain_id()).await
    }

    async fn get_transaction_count(
        &self,
        address: Address,
        block: BlockId,
    ) -> ProviderResult<u64> {
        self.timed(self.inner.get_transaction_count(address).block_id(block))
            .await
    }

    async fn get_code(&self, address: Address, block: Option<BlockId>) -> ProviderResult<Bytes> {
        let mut call = self.inner.get_code_at(address);
        if let Some(block) = block {
            call = call.block_id(block);
        }

        self.timed(call).await
    }

    async fn call(
        &self,
        tx: &TransactionRequest,
        block: Option<BlockId>,
    ) -> ProviderResult<Bytes> {
        let mut call = self.inner.call(tx);
        if let Some(block) = block {
            call = call.block(block);
        }

        self.timed(call).await
    }

    async fn estimate_gas(&self, tx: &TransactionRequest) -> ProviderResult<u64> {
        self.timed(self.inner.estimate_gas(tx)).await
    }

    async fn send_raw_transaction(&self, tx: Bytes) -> ProviderResult<TxHash> {
        let pending = self.timed(self.inner.send_raw_transaction(&tx)).await?;
        tracing::debug!("sent raw transaction {}", pending.tx_hash());
        Ok(*pending.tx_hash())
    }

    async fn get_transaction_receipt(
        &self,
        tx: TxHash,
    ) -> ProviderResult<Option<TransactionReceipt>> {
        self.timed(self.inner.get_transaction_receipt(tx)).await
    }

    async fn get_pending_base_fee(&self) -> ProviderResult<u128> {
        let base_fee = self
            .timed(
                self.inner
                    .get_block(BlockId::pending(), BlockTransactionsKind::Hashes),
            )
            .await?
            .context("pending block should exist")?
            .header
            .base_fee_per_gas
            .context("pending block should have a nonempty base fee")?;
        Ok(base_fee.into())
    }

    async fn get_max_priority_fee(&self) -> ProviderResult<u128> {
        self.timed(self.inner.get_max_priority_fee_per_gas())
            .await
    }
}
