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

//! Trait for interacting with chain data and contracts.

use alloy_primitives::{Address, Bytes, TxHash};
use alloy_rpc_types_eth::{BlockId, TransactionReceipt, TransactionRequest};
#[cfg(feature = "test-utils")]
use mockall::automock;

use super::error::ProviderResult;

/// Trait for interacting with chain data and contracts.
#[cfg_attr(feature = "test-utils", automock)]
#[async_trait::async_trait]
pub trait EvmProvider: Send + Sync {
    /// Get the chain id reported by the node
    async fn get_chain_id(&self) -> ProviderResult<u64>;

    /// Get the nonce/transaction count of an address at a block.
    ///
    /// Use [`BlockId::pending`] to include transactions still in the node's pool.
    async fn get_transaction_count(&self, address: Address, block: BlockId)
        -> ProviderResult<u64>;

    /// Get the code at an address
    async fn get_code(&self, address: Address, block: Option<BlockId>) -> ProviderResult<Bytes>;

    /// Simulate a transaction via an eth_call
    async fn call(&self, tx: &TransactionRequest, block: Option<BlockId>)
        -> ProviderResult<Bytes>;

    /// Estimate the gas a transaction needs
    async fn estimate_gas(&self, tx: &TransactionRequest) -> ProviderResult<u64>;

    /// Submit a signed, RLP encoded transaction. Does not wait for it to be mined.
    async fn send_raw_transaction(&self, tx: Bytes) -> ProviderResult<TxHash>;

    /// Get transaction receipt by hash
    async fn get_transaction_receipt(
        &self,
        tx: TxHash,
    ) -> ProviderResult<Option<TransactionReceipt>>;

    /// Get the base fee per gas of the pending block
    async fn get_pending_base_fee(&self) -> ProviderResult<u128>;

    /// Get the max priority fee per gas as reported by the node's RPC
    async fn get_max_priority_fee(&self) -> ProviderResult<u128>;
}
