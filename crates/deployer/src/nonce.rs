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


use alloy_primitives::Address;
use ammctl_provider::{BlockId, EvmProvider, ProviderResult};
use tracing::info;

/// Address of the contract created by `sender` in a transaction with `nonce`
pub fn predict_create_address(sender: Address, nonce: u64) -> Address {
    sender.create(nonce)
}

/// Nonces handed out to one signer's transactions during a run.
///
/// Every call to [`NonceCounter::allocate`] returns the next nonce and advances
/// the counter, so transactions built from one counter never reuse or skip a nonce.
#[derive(Debug)]
pub struct NonceCounter {
    address: Address,
    next: u64,
}

impl NonceCounter {
    /// Start counting at `next`
    pub fn new(address: Address, next: u64) -> Self {
        Self { address, next }
    }

    /// Start counting at the pending transaction count of `address`
    pub async fn fetch<P: EvmProvider>(provider: &P, address: Address) -> ProviderResult<Self> {
        let next = provider
            .get_transaction_count(address, BlockId::pending())
            .await?;
        info!("Starting nonce for {address}: {next}");
        Ok(Self::new(address, next))
    }

    /// Account the nonces belong to
    pub fn address(&self) -> Address {
        self.address
    }

    /// Nonce the next transaction will use
    pub fn peek(&self) -> u64 {
        self.next
    }

    /// Take the next nonce
    pub fn allocate(&mut self) -> u64 {
        let nonce = self.next;
        self.next += 1;
        nonce
    }

    /// Address the next contract deployment will be created at
    pub fn next_create_address(&self) -> Address {
        predict_create_address(self.address, self.next)
    }
}
