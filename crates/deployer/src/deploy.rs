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


//! Token and AMM pair deployment.
//!
//! All tokens and exchanges of a run go out in one batch. Each exchange's
//! constructor is given the predicted address of its token, which is still
//! unmined when the exchange transaction is signed.

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolConstructor;
use ammctl_contracts::{
    amm::{AMMCoin, AMMExchange},
    ArtifactStore, ContractKind,
};
use ammctl_provider::EvmProvider;
use tracing::info;

use crate::{
    address_book::{AddressBook, PAIRS_FILE},
    batch::MinedTx,
    client::ChainClient,
    error::{DeployError, DeployResult},
    nonce::NonceCounter,
};

/// Pair deployment parameters
#[derive(Debug, Clone)]
pub struct DeployConfig {
    /// Number of token/exchange pairs
    pub pairs: usize,
    /// Initial supply minted to the deployer by each token
    pub token_supply: U256,
    /// Gas limit of each token deployment
    pub token_gas_limit: u64,
    /// Gas limit of each exchange deployment
    pub amm_gas_limit: u64,
    /// Validator passed to every exchange
    pub validator: Address,
    /// Registry passed to every exchange
    pub registry: Address,
    /// Check that code exists at every predicted address once mined
    pub verify_code: bool,
}

impl DeployConfig {
    /// Defaults for `pairs` pairs wired to `validator` and `registry`
    pub fn new(pairs: usize, validator: Address, registry: Address) -> Self {
        Self {
            pairs,
            token_supply: U256::from(1000),
            token_gas_limit: 1_500_000,
            amm_gas_limit: 3_000_000,
            validator,
            registry,
            verify_code: false,
        }
    }
}

/// Deployed token and its exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeployedPair {
    /// Exchange address
    pub amm: Address,
    /// Token address
    pub token: Address,
}

/// Name and symbol of the `idx`th token
pub fn token_metadata(idx: usize) -> (String, String) {
    (format!("Cool Coin {idx}"), format!("CC{idx}"))
}

/// Flatten pairs into the persisted `[amm0, token0, amm1, token1, ...]` layout
pub fn pairs_to_addresses(pairs: &[DeployedPair]) -> Vec<Address> {
    pairs.iter().flat_map(|p| [p.amm, p.token]).collect()
}

/// Rebuild pairs from the persisted layout. A trailing unpaired address is ignored.
pub fn addresses_to_pairs(addresses: &[Address]) -> Vec<DeployedPair> {
    addresses
        .chunks_exact(2)
        .map(|chunk| DeployedPair {
            amm: chunk[0],
            token: chunk[1],
        })
        .collect()
}

/// Deploy `config.pairs` token/exchange pairs in a single batch.
///
/// Both artifacts are loaded before anything is signed, so a missing or empty
/// bytecode fails without sending a transaction. Every receipt is checked
/// against the predicted address.
pub async fn deploy_pairs<P: EvmProvider>(
    client: &ChainClient<P>,
    artifacts: &ArtifactStore,
    config: &DeployConfig,
    nonces: &mut NonceCounter,
) -> DeployResult<Vec<DeployedPair>> {
    if config.pairs == 0 {
        return Err(anyhow::anyhow!("at least one pair must be deployed").into());
    }
    let coin = artifacts.read_artifact(ContractKind::Coin)?;
    let exchange = artifacts.read_artifact(ContractKind::Exchange)?;

    info!(
        "Deploying {} pairs from {} starting at nonce {}",
        config.pairs,
        client.address(),
        nonces.peek()
    );
    let mut batch = client.new_batch().await?;

    let mut tokens = Vec::with_capacity(config.pairs);
    for idx in 0..config.pairs {
        let (name, symbol) = token_metadata(idx);
        let args = AMMCoin::constructorCall {
            name,
            symbol,
            initialSupply: config.token_supply,
        }
        .abi_encode();
        let token = batch
            .queue_deploy(
                format!("token {idx}"),
                coin.deploy_code(&args),
                config.token_gas_limit,
                nonces,
            )
            .await?;
        info!("Token {idx} will be deployed at {token}");
        tokens.push(token);
    }

    let mut pairs = Vec::with_capacity(config.pairs);
    for (idx, token) in tokens.into_iter().enumerate() {
        let args = AMMExchange::constructorCall {
            token,
            validator: config.validator,
            registry: config.registry,
        }
        .abi_encode();
        let amm = batch
            .queue_deploy(
                format!("amm {idx}"),
                exchange.deploy_code(&args),
                config.amm_gas_limit,
                nonces,
            )
            .await?;
        info!("AMM {idx} will be deployed at {amm}");
        pairs.push(DeployedPair { amm, token });
    }

    let pending = batch.submit_all().await?;
    let mined = client.await_all(pending).await?;
    for tx in &mined {
        verify_deployment(client, tx, config.verify_code).await?;
    }

    for (idx, pair) in pairs.iter().enumerate() {
        info!("Pair {idx}: token {} amm {}", pair.token, pair.amm);
    }
    Ok(pairs)
}

/// Deploy pairs and persist them to the address book
pub async fn deploy_and_save<P: EvmProvider>(
    client: &ChainClient<P>,
    artifacts: &ArtifactStore,
    book: &AddressBook,
    config: &DeployConfig,
    nonces: &mut NonceCounter,
) -> DeployResult<Vec<DeployedPair>> {
    let pairs = deploy_pairs(client, artifacts, config, nonces).await?;
    book.save(PAIRS_FILE, &pairs_to_addresses(&pairs))?;
    Ok(pairs)
}

async fn verify_deployment<P: EvmProvider>(
    client: &ChainClient<P>,
    tx: &MinedTx,
    verify_code: bool,
) -> DeployResult<()> {
    let Some(predicted) = tx.predicted_address else {
        return Ok(());
    };
    if tx.receipt.contract_address != Some(predicted) {
        return Err(DeployError::PredictionMismatch {
            label: tx.label.clone(),
            predicted,
            actual: tx.receipt.contract_address,
        });
    }
    if verify_code && client.provider().get_code(predicted, None).await?.is_empty() {
        return Err(DeployError::NoCode {
            label: tx.label.clone(),
            address: predicted,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        sync::{Arc, Mutex},
    };

    use alloy_consensus::{Transaction, TxEnvelope};
    use alloy_eips::eip2718::Decodable2718;
    use alloy_primitives::{address, keccak256, Bytes, TxKind};
    use ammctl_contracts::ArtifactError;
    use ammctl_provider::{mined_receipt, MockEvmProvider};

    use super::*;
    use crate::test_utils::{
        amm_artifacts, fake_chain, hardhat_signer, test_settings, write_artifact,
        EXCHANGE_BYTECODE,
    };

    const VALIDATOR: Address = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");
    const REGISTRY: Address = address!("a269147eD50Eb19038d88981Fbe408ac39954FBA");

    fn config(pairs: usize) -> DeployConfig {
        DeployConfig::new(pairs, VALIDATOR, REGISTRY)
    }

    #[tokio::test]
    async fn test_deploy_nonces_and_predictions() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = amm_artifacts(dir.path());
        let (provider, state) = fake_chain(5);
        let client = ChainClient::new(provider, hardhat_signer(), 31337, test_settings());
        let mut nonces = client.fetch_nonces().await.unwrap();

        let pairs = deploy_pairs(&client, &artifacts, &config(2), &mut nonces)
            .await
            .unwrap();

        let sender = client.address();
        assert_eq!(
            pairs,
            vec![
                DeployedPair {
                    token: sender.create(5),
                    amm: sender.create(7),
                },
                DeployedPair {
                    token: sender.create(6),
                    amm: sender.create(8),
                },
            ]
        );
        assert_eq!(nonces.peek(), 9);

        let state = state.lock().unwrap();
        let sent_nonces: Vec<_> = state.sent.iter().map(|tx| tx.nonce()).collect();
        assert_eq!(sent_nonces, [5, 6, 7, 8]);
        for tx in &state.sent {
            assert_eq!(tx.kind(), TxKind::Create);
            let receipt = &state.receipts[tx.tx_hash()];
            assert_eq!(receipt.contract_address, Some(sender.create(tx.nonce())));
        }
        assert_eq!(state.sent[0].gas_limit(), 1_500_000);
        assert_eq!(state.sent[2].gas_limit(), 3_000_000);
    }

    #[tokio::test]
    async fn test_amm_constructor_uses_predicted_token() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = amm_artifacts(dir.path());
        let (provider, state) = fake_chain(0);
        let client = ChainClient::new(provider, hardhat_signer(), 31337, test_settings());
        let mut nonces = client.fetch_nonces().await.unwrap();

        let pairs = deploy_pairs(&client, &artifacts, &config(1), &mut nonces)
            .await
            .unwrap();

        let state = state.lock().unwrap();
        let amm_input = state.sent[1].input();
        assert!(amm_input.starts_with(&EXCHANGE_BYTECODE));
        let args = &amm_input[EXCHANGE_BYTECODE.len()..];
        assert_eq!(args.len(), 96);
        assert_eq!(Address::from_slice(&args[12..32]), pairs[0].token);
        assert_eq!(Address::from_slice(&args[44..64]), VALIDATOR);
        assert_eq!(Address::from_slice(&args[76..96]), REGISTRY);
        assert_eq!(pairs[0].token, client.address().create(0));
    }

    #[tokio::test]
    async fn test_token_constructor_args() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = amm_artifacts(dir.path());
        let (provider, state) = fake_chain(0);
        let client = ChainClient::new(provider, hardhat_signer(), 31337, test_settings());
        let mut nonces = client.fetch_nonces().await.unwrap();

        let pairs = deploy_pairs(&client, &artifacts, &config(2), &mut nonces)
            .await
            .unwrap();

        let expected = AMMCoin::constructorCall {
            name: "Cool Coin 1".to_string(),
            symbol: "CC1".to_string(),
            initialSupply: U256::from(1000),
        }
        .abi_encode();
        let state = state.lock().unwrap();
        assert!(state.sent[1].input().ends_with(&expected));
        assert_eq!(
            state.balances[&(pairs[1].token, client.address())],
            U256::from(1000)
        );
    }

    #[tokio::test]
    async fn test_empty_bytecode_sends_nothing() {
        let dir = tempfile::tempdir().unwrap();
        write_artifact(dir.path(), "AMMCoin", "0x6001");
        write_artifact(dir.path(), "AMMExchange", "0x");
        let artifacts = ArtifactStore::new(dir.path());

        let mut provider = MockEvmProvider::new();
        provider.expect_send_raw_transaction().never();
        let client = ChainClient::new(provider, hardhat_signer(), 31337, test_settings());
        let mut nonces = NonceCounter::new(client.address(), 0);

        let err = deploy_pairs(&client, &artifacts, &config(1), &mut nonces)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DeployError::Artifact(ArtifactError::MissingBytecode { .. })
        ));
        assert_eq!(nonces.peek(), 0);
    }

    #[tokio::test]
    async fn test_missing_artifact_sends_nothing() {
        let dir = tempfile::tempdir().unwrap();
        write_artifact(dir.path(), "AMMCoin", "0x6001");
        let artifacts = ArtifactStore::new(dir.path());

        let mut provider = MockEvmProvider::new();
        provider.expect_send_raw_transaction().never();
        let client = ChainClient::new(provider, hardhat_signer(), 31337, test_settings());
        let mut nonces = NonceCounter::new(client.address(), 0);

        let err = deploy_pairs(&client, &artifacts, &config(1), &mut nonces)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DeployError::Artifact(ArtifactError::NotFound { .. })
        ));
    }

    fn misbehaving_node(contract_address: Option<Address>) -> MockEvmProvider {
        let mut provider = MockEvmProvider::new();
        provider
            .expect_get_pending_base_fee()
            .returning(|| Ok(1_000_000_000));
        provider
            .expect_get_max_priority_fee()
            .returning(|| Ok(1_000_000));
        provider
            .expect_send_raw_transaction()
            .returning(|raw| Ok(keccak256(&raw)));
        provider
            .expect_get_transaction_receipt()
            .returning(move |hash| {
                Ok(Some(mined_receipt(
                    hash,
                    Address::ZERO,
                    contract_address,
                    true,
                )))
            });
        provider
    }

    #[tokio::test]
    async fn test_prediction_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = amm_artifacts(dir.path());
        let provider = misbehaving_node(Some(Address::repeat_byte(0xee)));
        let client = ChainClient::new(provider, hardhat_signer(), 31337, test_settings());
        let mut nonces = NonceCounter::new(client.address(), 0);

        let err = deploy_pairs(&client, &artifacts, &config(1), &mut nonces)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DeployError::PredictionMismatch { label, actual, .. }
                if label == "token 0" && actual == Some(Address::repeat_byte(0xee))
        ));
    }

    #[tokio::test]
    async fn test_missing_code_detected() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = amm_artifacts(dir.path());
        let sender = hardhat_signer().address();

        let mut provider = MockEvmProvider::new();
        provider
            .expect_get_pending_base_fee()
            .returning(|| Ok(1_000_000_000));
        provider
            .expect_get_max_priority_fee()
            .returning(|| Ok(1_000_000));
        let created = Arc::new(Mutex::new(HashMap::new()));
        let sink = created.clone();
        provider
            .expect_send_raw_transaction()
            .returning(move |raw| {
                let tx = TxEnvelope::decode_2718(&mut raw.as_ref()).unwrap();
                let hash = *tx.tx_hash();
                sink.lock().unwrap().insert(hash, sender.create(tx.nonce()));
                Ok(hash)
            });
        provider
            .expect_get_transaction_receipt()
            .returning(move |hash| {
                let address = created.lock().unwrap().get(&hash).copied();
                Ok(Some(mined_receipt(hash, sender, address, true)))
            });
        provider
            .expect_get_code()
            .returning(|_, _| Ok(Bytes::new()));

        let client = ChainClient::new(provider, hardhat_signer(), 31337, test_settings());
        let mut nonces = NonceCounter::new(sender, 0);
        let mut config = config(1);
        config.verify_code = true;

        let err = deploy_pairs(&client, &artifacts, &config, &mut nonces)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DeployError::NoCode { address, .. } if address == sender.create(0)
        ));
    }

    #[tokio::test]
    async fn test_verify_code_passes() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = amm_artifacts(dir.path());
        let (provider, _) = fake_chain(0);
        let client = ChainClient::new(provider, hardhat_signer(), 31337, test_settings());
        let mut nonces = client.fetch_nonces().await.unwrap();
        let mut config = config(1);
        config.verify_code = true;

        deploy_pairs(&client, &artifacts, &config, &mut nonces)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_zero_pairs() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = amm_artifacts(dir.path());
        let client = ChainClient::new(
            MockEvmProvider::new(),
            hardhat_signer(),
            31337,
            test_settings(),
        );
        let mut nonces = NonceCounter::new(client.address(), 0);
        assert!(deploy_pairs(&client, &artifacts, &config(0), &mut nonces)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_deploy_and_save() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = amm_artifacts(&dir.path().join("artifacts"));
        let book = AddressBook::new(dir.path());
        let (provider, _) = fake_chain(0);
        let client = ChainClient::new(provider, hardhat_signer(), 31337, test_settings());
        let mut nonces = client.fetch_nonces().await.unwrap();

        let pairs = deploy_and_save(&client, &artifacts, &book, &config(2), &mut nonces)
            .await
            .unwrap();

        let saved = book.load(PAIRS_FILE).unwrap();
        assert_eq!(
            saved,
            vec![pairs[0].amm, pairs[0].token, pairs[1].amm, pairs[1].token]
        );
        assert_eq!(addresses_to_pairs(&saved), pairs);
    }

    #[test]
    fn test_addresses_to_pairs_ignores_trailing() {
        let addresses = [
            Address::repeat_byte(1),
            Address::repeat_byte(2),
            Address::repeat_byte(3),
        ];
        assert_eq!(
            addresses_to_pairs(&addresses),
            vec![DeployedPair {
                amm: Address::repeat_byte(1),
                token: Address::repeat_byte(2),
            }]
        );
    }
}
