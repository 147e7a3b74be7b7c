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


//! In-memory node used by the operation tests

use std::{
    collections::HashMap,
    fs,
    path::Path,
    sync::{Arc, Mutex},
    time::Duration,
};

use alloy_consensus::{Transaction, TxEnvelope};
use alloy_eips::eip2718::Decodable2718;
use alloy_primitives::{keccak256, Address, Bytes, TxHash, TxKind, U256};
use alloy_sol_types::{SolCall, SolInterface};
use ammctl_contracts::{
    amm::{AMMCoin, AMMRegistry},
    channel::StateChannel,
    ArtifactStore,
};
use ammctl_provider::{mined_receipt, MockEvmProvider, TransactionReceipt};
use ammctl_signer::{new_local_signer, LocalTxSigner, SigningScheme};
use secrecy::SecretString;

pub(crate) const HARDHAT_KEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub(crate) const COIN_BYTECODE: [u8; 3] = [0x60, 0x01, 0x00];
pub(crate) const EXCHANGE_BYTECODE: [u8; 3] = [0x60, 0x02, 0x00];

pub(crate) fn hardhat_signer() -> LocalTxSigner {
    new_local_signer(
        &SigningScheme::PrivateKey {
            private_key: SecretString::new(HARDHAT_KEY.to_string()),
        },
        31337,
    )
    .unwrap()
}

pub(crate) fn test_settings() -> crate::TxSettings {
    crate::TxSettings {
        poll_interval: Duration::from_millis(1),
        max_polls: 10,
        ..Default::default()
    }
}

pub(crate) fn write_artifact(root: &Path, name: &str, bytecode: &str) {
    let dir = root.join("contracts").join(format!("{name}.sol"));
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join(format!("{name}.json")),
        format!(r#"{{"contractName":"{name}","abi":[],"bytecode":"{bytecode}"}}"#),
    )
    .unwrap();
}

/// Artifacts tree holding the token and exchange contracts
pub(crate) fn amm_artifacts(root: &Path) -> ArtifactStore {
    write_artifact(root, "AMMCoin", &const_hex::encode_prefixed(COIN_BYTECODE));
    write_artifact(
        root,
        "AMMExchange",
        &const_hex::encode_prefixed(EXCHANGE_BYTECODE),
    );
    ArtifactStore::new(root)
}

/// State of the in-memory node
#[derive(Debug, Default)]
pub(crate) struct ChainState {
    pub(crate) sent: Vec<TxEnvelope>,
    pub(crate) receipts: HashMap<TxHash, TransactionReceipt>,
    pub(crate) code: HashMap<Address, Bytes>,
    /// (token, owner) -> balance
    pub(crate) balances: HashMap<(Address, Address), U256>,
    /// (token, owner, spender) -> allowance
    pub(crate) allowances: HashMap<(Address, Address, Address), U256>,
    /// (registry, amm)
    pub(crate) registered: Vec<(Address, Address)>,
    /// (channel, index) -> (signature, amount)
    pub(crate) signatures: HashMap<(Address, U256), (Bytes, U256)>,
}

impl ChainState {
    fn apply(&mut self, raw: &Bytes) -> TxHash {
        let tx = TxEnvelope::decode_2718(&mut raw.as_ref()).unwrap();
        let from = tx.recover_signer().unwrap();
        let tx_hash = keccak256(raw);

        let contract_address = match tx.kind() {
            TxKind::Create => {
                let created = from.create(tx.nonce());
                let input = tx.input();
                if input.starts_with(&COIN_BYTECODE) {
                    // constructor(string, string, uint256): supply is the third head word
                    let args = &input[COIN_BYTECODE.len()..];
                    let supply = U256::from_be_slice(&args[64..96]);
                    self.balances.insert((created, from), supply);
                }
                self.code.insert(created, input.clone());
                Some(created)
            }
            TxKind::Call(to) => {
                self.apply_call(from, to, tx.input());
                None
            }
        };

        self.receipts
            .insert(tx_hash, mined_receipt(tx_hash, from, contract_address, true));
        self.sent.push(tx);
        tx_hash
    }

    fn apply_call(&mut self, from: Address, to: Address, input: &[u8]) {
        if let Ok(AMMCoin::AMMCoinCalls::approve(call)) =
            AMMCoin::AMMCoinCalls::abi_decode(input, true)
        {
            self.allowances.insert((to, from, call.spender), call.amount);
        } else if let Ok(AMMRegistry::AMMRegistryCalls::registerAMM(call)) =
            AMMRegistry::AMMRegistryCalls::abi_decode(input, true)
        {
            self.registered.push((to, call.amm));
        } else if let Ok(StateChannel::StateChannelCalls::addSignature(call)) =
            StateChannel::StateChannelCalls::abi_decode(input, true)
        {
            self.signatures
                .insert((to, call.index), (call.signature, call.ethAmount));
        } else {
            panic!("unexpected call to {to}: {}", Bytes::copy_from_slice(input));
        }
    }

    fn view(&self, from: Address, to: Address, input: &[u8]) -> Bytes {
        let encoded = if let Ok(call) = AMMCoin::balanceOfCall::abi_decode(input, true) {
            let balance = self.balances.get(&(to, call.account)).copied();
            AMMCoin::balanceOfCall::abi_encode_returns(&(balance.unwrap_or_default(),))
        } else if let Ok(call) = AMMCoin::allowanceCall::abi_decode(input, true) {
            let allowance = self
                .allowances
                .get(&(to, call.owner, call.spender))
                .copied();
            AMMCoin::allowanceCall::abi_encode_returns(&(allowance.unwrap_or_default(),))
        } else if let Ok(call) = StateChannel::getSignatureCall::abi_decode(input, true) {
            let stored = self.signatures.get(&(to, call.index)).cloned();
            StateChannel::getSignatureCall::abi_encode_returns(&(stored
                .map(|(signature, _)| signature)
                .unwrap_or_default(),))
        } else if let Ok(call) = StateChannel::getSignatureEthAmountCall::abi_decode(input, true)
        {
            let stored = self.signatures.get(&(to, call.index)).cloned();
            StateChannel::getSignatureEthAmountCall::abi_encode_returns(&(stored
                .map(|(_, amount)| amount)
                .unwrap_or_default(),))
        } else {
            panic!(
                "unexpected view call from {from} to {to}: {}",
                Bytes::copy_from_slice(input)
            );
        };
        encoded.into()
    }
}

/// Mock provider backed by an in-memory node that mines every transaction
/// instantly. Contracts are created at `sender.create(nonce)`.
pub(crate) fn fake_chain(start_nonce: u64) -> (MockEvmProvider, Arc<Mutex<ChainState>>) {
    let state = Arc::new(Mutex::new(ChainState::default()));
    let mut provider = MockEvmProvider::new();

    provider
        .expect_get_chain_id()
        .returning(|| Ok(31337));
    provider
        .expect_get_transaction_count()
        .returning(move |_, _| Ok(start_nonce));
    provider
        .expect_get_pending_base_fee()
        .returning(|| Ok(1_000_000_000));
    provider
        .expect_get_max_priority_fee()
        .returning(|| Ok(1_000_000));
    provider.expect_estimate_gas().returning(|_| Ok(100_000));

    let s = state.clone();
    provider
        .expect_send_raw_transaction()
        .returning(move |raw| Ok(s.lock().unwrap().apply(&raw)));

    let s = state.clone();
    provider
        .expect_get_transaction_receipt()
        .returning(move |hash| Ok(s.lock().unwrap().receipts.get(&hash).cloned()));

    let s = state.clone();
    provider.expect_get_code().returning(move |address, _| {
        Ok(s.lock()
            .unwrap()
            .code
            .get(&address)
            .cloned()
            .unwrap_or_default())
    });

    let s = state.clone();
    provider.expect_call().returning(move |tx, _| {
        let from = tx.from.unwrap_or_default();
        let Some(TxKind::Call(to)) = tx.to else {
            panic!("view call without destination");
        };
        let input = tx.input.input().cloned().unwrap_or_default();
        Ok(s.lock().unwrap().view(from, to, &input))
    });

    (provider, state)
}
