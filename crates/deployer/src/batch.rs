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


//! Two-phase transaction batches.
//!
//! Transactions are signed up front with consecutive nonces, then all sent
//! ([`TxBatch::submit_all`]), then all awaited ([`await_all`]). Every step
//! preserves the order the transactions were queued in.

use alloy_network::TransactionBuilder;
use alloy_primitives::{Address, Bytes, TxHash};
use alloy_sol_types::SolCall;
use ammctl_provider::{EvmProvider, TransactionReceipt, TransactionRequest};
use futures_util::future;
use tracing::{debug, info};

use crate::{
    client::{ChainClient, GasFees},
    error::{DeployError, DeployResult},
    nonce::{predict_create_address, NonceCounter},
};

#[derive(Debug)]
struct SignedTx {
    label: String,
    nonce: u64,
    predicted_address: Option<Address>,
    raw_tx: Bytes,
}

/// Transaction that was sent but not yet confirmed
#[derive(Debug, Clone)]
pub struct PendingTx {
    /// Label used in logs and errors
    pub label: String,
    /// Nonce the transaction was signed with
    pub nonce: u64,
    /// Hash returned by the node
    pub tx_hash: TxHash,
    /// Predicted address for contract deployments
    pub predicted_address: Option<Address>,
}

/// Transaction with a successful receipt
#[derive(Debug, Clone)]
pub struct MinedTx {
    /// Label used in logs and errors
    pub label: String,
    /// Nonce the transaction was signed with
    pub nonce: u64,
    /// Predicted address for contract deployments
    pub predicted_address: Option<Address>,
    /// Receipt
    pub receipt: TransactionReceipt,
}

/// Signed transactions waiting to be sent
#[derive(Debug)]
pub struct TxBatch<'a, P> {
    client: &'a ChainClient<P>,
    fees: GasFees,
    queued: Vec<SignedTx>,
}

impl<'a, P: EvmProvider> TxBatch<'a, P> {
    pub(crate) fn new(client: &'a ChainClient<P>, fees: GasFees) -> Self {
        Self {
            client,
            fees,
            queued: vec![],
        }
    }

    /// Number of queued transactions
    pub fn len(&self) -> usize {
        self.queued.len()
    }

    /// True if nothing is queued
    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }

    /// Sign a contract creation with the next nonce and return the address the
    /// contract will be created at
    pub async fn queue_deploy(
        &mut self,
        label: impl Into<String>,
        deploy_code: Bytes,
        gas_limit: u64,
        nonces: &mut NonceCounter,
    ) -> DeployResult<Address> {
        let label = label.into();
        let nonce = nonces.allocate();
        let predicted = predict_create_address(self.client.address(), nonce);
        debug!(
            "{label}: nonce {nonce}, {} bytes of deploy code",
            deploy_code.len()
        );

        let tx = TransactionRequest::default()
            .with_deploy_code(deploy_code)
            .with_gas_limit(gas_limit);
        self.push(label, nonce, Some(predicted), tx).await?;
        Ok(predicted)
    }

    /// Sign a contract call with the next nonce. Gas is estimated by the node.
    pub async fn queue_call<C: SolCall>(
        &mut self,
        label: impl Into<String>,
        to: Address,
        call: &C,
        nonces: &mut NonceCounter,
    ) -> DeployResult<()> {
        let label = label.into();
        let tx = TransactionRequest::default()
            .with_from(self.client.address())
            .with_to(to)
            .with_call(call);
        let gas_limit = self.client.provider().estimate_gas(&tx).await?;
        let nonce = nonces.allocate();
        debug!("{label}: nonce {nonce}, gas limit {gas_limit}");

        self.push(label, nonce, None, tx.with_gas_limit(gas_limit))
            .await
    }

    async fn push(
        &mut self,
        label: String,
        nonce: u64,
        predicted_address: Option<Address>,
        tx: TransactionRequest,
    ) -> DeployResult<()> {
        let tx = tx
            .with_nonce(nonce)
            .with_chain_id(self.client.chain_id())
            .with_max_fee_per_gas(self.fees.max_fee_per_gas)
            .with_max_priority_fee_per_gas(self.fees.max_priority_fee_per_gas);
        let raw_tx = self.client.signer().sign_tx_raw(tx).await?;
        self.queued.push(SignedTx {
            label,
            nonce,
            predicted_address,
            raw_tx,
        });
        Ok(())
    }

    /// Send every queued transaction without waiting for any of them to be mined
    pub async fn submit_all(self) -> DeployResult<Vec<PendingTx>> {
        let provider = self.client.provider();
        let tx_hashes = future::try_join_all(
            self.queued
                .iter()
                .map(|tx| provider.send_raw_transaction(tx.raw_tx.clone())),
        )
        .await?;
        info!("Sent {} transactions", tx_hashes.len());

        Ok(self
            .queued
            .into_iter()
            .zip(tx_hashes)
            .map(|(tx, tx_hash)| {
                info!("{} sent with nonce {}: {tx_hash}", tx.label, tx.nonce);
                PendingTx {
                    label: tx.label,
                    nonce: tx.nonce,
                    tx_hash,
                    predicted_address: tx.predicted_address,
                }
            })
            .collect())
    }
}

/// Wait for every pending transaction to be mined, preserving order.
///
/// Fails if any transaction reverts or is not mined within the configured
/// number of polls.
pub async fn await_all<P: EvmProvider>(
    client: &ChainClient<P>,
    pending: Vec<PendingTx>,
) -> DeployResult<Vec<MinedTx>> {
    let mined =
        future::try_join_all(pending.into_iter().map(|tx| wait_for_receipt(client, tx))).await?;
    info!("Mined {} transactions", mined.len());
    Ok(mined)
}

async fn wait_for_receipt<P: EvmProvider>(
    client: &ChainClient<P>,
    tx: PendingTx,
) -> DeployResult<MinedTx> {
    let settings = client.settings();
    for _ in 0..settings.max_polls {
        if let Some(receipt) = client
            .provider()
            .get_transaction_receipt(tx.tx_hash)
            .await?
        {
            if !receipt.status() {
                return Err(DeployError::Reverted {
                    label: tx.label,
                    tx_hash: tx.tx_hash,
                });
            }
            debug!(
                "{} mined in block {:?}, gas used {}",
                tx.label, receipt.block_number, receipt.gas_used
            );
            return Ok(MinedTx {
                label: tx.label,
                nonce: tx.nonce,
                predicted_address: tx.predicted_address,
                receipt,
            });
        }
        tokio::time::sleep(settings.poll_interval).await;
    }

    Err(DeployError::NotMined {
        label: tx.label,
        tx_hash: tx.tx_hash,
        polls: settings.max_polls,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use alloy_consensus::{Transaction, TxEnvelope};
    use alloy_eips::eip2718::Decodable2718;
    use alloy_primitives::{keccak256, TxKind, B256, U256};
    use ammctl_contracts::amm::AMMRegistry;
    use ammctl_provider::{mined_receipt, MockEvmProvider};

    use super::*;
    use crate::{
        client::TxSettings,
        test_utils::{hardhat_signer, test_settings},
    };

    fn fee_provider() -> MockEvmProvider {
        let mut provider = MockEvmProvider::new();
        provider
            .expect_get_pending_base_fee()
            .returning(|| Ok(1_000_000_000));
        provider
            .expect_get_max_priority_fee()
            .returning(|| Ok(100_000_000));
        provider
    }

    fn pending(label: &str, nonce: u64) -> PendingTx {
        PendingTx {
            label: label.to_string(),
            nonce,
            tx_hash: B256::repeat_byte(nonce as u8 + 1),
            predicted_address: None,
        }
    }

    #[tokio::test]
    async fn test_submit_all_preserves_order() {
        let mut provider = fee_provider();
        provider
            .expect_estimate_gas()
            .returning(|_| Ok(60_000));
        provider
            .expect_send_raw_transaction()
            .times(3)
            .returning(|raw| Ok(keccak256(&raw)));

        let client = ChainClient::new(provider, hardhat_signer(), 31337, test_settings());
        let mut nonces = NonceCounter::new(client.address(), 4);
        let mut batch = client.new_batch().await.unwrap();

        let first = batch
            .queue_deploy("first", Bytes::from_static(&[0x60, 0x80]), 100_000, &mut nonces)
            .await
            .unwrap();
        batch
            .queue_call(
                "register",
                Address::repeat_byte(0xaa),
                &AMMRegistry::registerAMMCall { amm: first },
                &mut nonces,
            )
            .await
            .unwrap();
        let third = batch
            .queue_deploy("third", Bytes::from_static(&[0x60, 0x80]), 100_000, &mut nonces)
            .await
            .unwrap();
        assert_eq!(batch.len(), 3);
        assert_eq!(nonces.peek(), 7);

        let sent = batch.submit_all().await.unwrap();
        let labels: Vec<_> = sent.iter().map(|tx| tx.label.as_str()).collect();
        let tx_nonces: Vec<_> = sent.iter().map(|tx| tx.nonce).collect();
        assert_eq!(labels, ["first", "register", "third"]);
        assert_eq!(tx_nonces, [4, 5, 6]);
        assert_eq!(sent[0].predicted_address, Some(first));
        assert_eq!(sent[1].predicted_address, None);
        assert_eq!(sent[2].predicted_address, Some(third));
        assert_eq!(third, client.address().create(6));
    }

    #[tokio::test]
    async fn test_signed_call_fields() {
        let registry = Address::repeat_byte(0xaa);
        let captured = Arc::new(std::sync::Mutex::new(vec![]));
        let sink = captured.clone();

        let mut provider = fee_provider();
        provider
            .expect_estimate_gas()
            .withf(move |tx| tx.to == Some(TxKind::Call(registry)))
            .returning(|_| Ok(45_000));
        provider
            .expect_send_raw_transaction()
            .returning(move |raw| {
                sink.lock().unwrap().push(raw.clone());
                Ok(keccak256(&raw))
            });

        let client = ChainClient::new(provider, hardhat_signer(), 31337, test_settings());
        let mut nonces = NonceCounter::new(client.address(), 0);
        let mut batch = client.new_batch().await.unwrap();
        let call = AMMRegistry::registerAMMCall {
            amm: Address::repeat_byte(0x01),
        };
        batch
            .queue_call("register", registry, &call, &mut nonces)
            .await
            .unwrap();
        batch.submit_all().await.unwrap();

        let raw = captured.lock().unwrap()[0].clone();
        let tx = TxEnvelope::decode_2718(&mut raw.as_ref()).unwrap();
        assert_eq!(tx.kind(), TxKind::Call(registry));
        assert_eq!(tx.gas_limit(), 45_000);
        assert_eq!(tx.chain_id(), Some(31337));
        assert_eq!(tx.max_priority_fee_per_gas(), Some(100_000_000));
        assert_eq!(tx.max_fee_per_gas(), 2_100_000_000);
        assert_eq!(tx.value(), U256::ZERO);
        assert_eq!(tx.input(), &Bytes::from(call.abi_encode()));
    }

    #[tokio::test]
    async fn test_await_all_preserves_order() {
        let polls = Arc::new(AtomicUsize::new(0));
        let counter = polls.clone();

        let mut provider = MockEvmProvider::new();
        provider
            .expect_get_transaction_receipt()
            .returning(move |hash| {
                // the first transaction takes a few polls to show up
                if hash == B256::repeat_byte(1) && counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    return Ok(None);
                }
                Ok(Some(mined_receipt(hash, Address::ZERO, None, true)))
            });

        let client = ChainClient::new(provider, hardhat_signer(), 31337, test_settings());
        let mined = client
            .await_all(vec![pending("a", 0), pending("b", 1), pending("c", 2)])
            .await
            .unwrap();

        let hashes: Vec<_> = mined.iter().map(|tx| tx.receipt.transaction_hash).collect();
        assert_eq!(
            hashes,
            [B256::repeat_byte(1), B256::repeat_byte(2), B256::repeat_byte(3)]
        );
        assert_eq!(polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_reverted() {
        let mut provider = MockEvmProvider::new();
        provider
            .expect_get_transaction_receipt()
            .returning(|hash| Ok(Some(mined_receipt(hash, Address::ZERO, None, false))));

        let client = ChainClient::new(provider, hardhat_signer(), 31337, test_settings());
        let err = client.await_all(vec![pending("approve", 0)]).await.unwrap_err();
        assert!(matches!(err, DeployError::Reverted { label, .. } if label == "approve"));
    }

    #[tokio::test]
    async fn test_not_mined() {
        let mut provider = MockEvmProvider::new();
        provider
            .expect_get_transaction_receipt()
            .times(3)
            .returning(|_| Ok(None));

        let settings = TxSettings {
            max_polls: 3,
            ..test_settings()
        };
        let client = ChainClient::new(provider, hardhat_signer(), 31337, settings);
        let err = client.await_all(vec![pending("token 0", 0)]).await.unwrap_err();
        assert!(matches!(err, DeployError::NotMined { polls: 3, .. }));
    }
}
