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

use alloy_provider::{Provider as AlloyProvider, ProviderBuilder};
use alloy_rpc_client::ClientBuilder;
use alloy_transport_http::Http;
use anyhow::Context;
use evm::AlloyEvmProvider;
use reqwest::Client;
use url::Url;

use crate::EvmProvider;

pub(crate) mod evm;

/// Create a new alloy evm provider from a given RPC URL
///
/// Every RPC call is bounded by `provider_client_timeout_seconds`.
pub fn new_alloy_evm_provider(
    rpc_url: &str,
    provider_client_timeout_seconds: u64,
) -> anyhow::Result<impl EvmProvider + Clone> {
    let provider = new_alloy_provider(rpc_url)?;
    Ok(AlloyEvmProvider::new(
        provider,
        Duration::from_secs(provider_client_timeout_seconds),
    ))
}

/// Create a new alloy provider from a given RPC URL
///
/// The transport has no retry layer: a rejected request, including
/// `eth_sendRawTransaction`, reaches the caller as an error.
pub fn new_alloy_provider(
    rpc_url: &str,
) -> anyhow::Result<impl AlloyProvider<Http<Client>> + Clone> {
    let url = Url::parse(rpc_url).context("invalid rpc url")?;
    let client = ClientBuilder::default().http(url);
    Ok(ProviderBuilder::new().on_client(client))
}
