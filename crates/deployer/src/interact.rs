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


use alloy_primitives::{Address, U256};
use ammctl_contracts::amm::{AMMCoin, AMMRegistry};
use ammctl_provider::EvmProvider;
use tracing::info;

use crate::{
    client::ChainClient, deploy::DeployedPair, error::DeployResult, nonce::NonceCounter,
};

/// Allowance granted to the validator on one token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenAllowance {
    /// Token address
    pub token: Address,
    /// Signer balance approved to the validator
    pub balance: U256,
    /// Allowance read back after the approval was mined
    pub allowance: U256,
}

/// Approve each token's full balance to `validator` and register each AMM
/// with `registry`.
///
/// All approvals and registrations go out in one batch using `nonces`. Running
/// this twice approves and registers twice.
pub async fn approve_and_register<P: EvmProvider>(
    client: &ChainClient<P>,
    pairs: &[DeployedPair],
    validator: Address,
    registry: Address,
    nonces: &mut NonceCounter,
) -> DeployResult<Vec<TokenAllowance>> {
    let owner = client.address();

    let mut balances = Vec::with_capacity(pairs.len());
    for pair in pairs {
        let balance = client
            .call_view(pair.token, &AMMCoin::balanceOfCall { account: owner })
            .await?
            .balance;
        info!("Balance of {owner} on token {}: {balance}", pair.token);
        balances.push(balance);
    }

    let mut batch = client.new_batch().await?;
    for (idx, (pair, balance)) in pairs.iter().zip(&balances).enumerate() {
        batch
            .queue_call(
                format!("approve {idx}"),
                pair.token,
                &AMMCoin::approveCall {
                    spender: validator,
                    amount: *balance,
                },
                nonces,
            )
            .await?;
        batch
            .queue_call(
                format!("register {idx}"),
                registry,
                &AMMRegistry::registerAMMCall { amm: pair.amm },
                nonces,
            )
            .await?;
    }
    let pending = batch.submit_all().await?;
    client.await_all(pending).await?;

    let mut allowances = Vec::with_capacity(pairs.len());
    for (pair, balance) in pairs.iter().zip(balances) {
        let allowance = client
            .call_view(
                pair.token,
                &AMMCoin::allowanceCall {
                    owner,
                    spender: validator,
                },
            )
            .await?
            .remaining;
        info!(
            "Allowance of {validator} on token {}: {allowance}",
            pair.token
        );
        allowances.push(TokenAllowance {
            token: pair.token,
            balance,
            allowance,
        });
    }
    Ok(allowances)
}
