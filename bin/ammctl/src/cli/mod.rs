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


use std::time::{Duration, Instant};

use ammctl_contracts::ArtifactStore;
use ammctl_deployer::{AddressBook, ChainClient, TxSettings};
use ammctl_provider::EvmProvider;
use anyhow::Context;
use clap::{Args, Parser, Subcommand};

mod addresses;
mod deploy;
mod signatures;
mod signer;
mod tracing;

use addresses::AddressesArgs;
use deploy::{DeployArgs, RegisterArgs};
use signatures::SignaturesArgs;
use signer::SignerArgs;

pub async fn run() -> anyhow::Result<()> {
    let opt = Cli::parse();
    let _guard = tracing::configure_logging(&opt.logs)?;

    let start = Instant::now();
    match opt.command {
        Command::Deploy(args) => deploy::deploy(args, &opt.common).await?,
        Command::Register(args) => deploy::register(args, &opt.common).await?,
        Command::Signatures(args) => signatures::send_signatures(args, &opt.common).await?,
        Command::Addresses(args) => addresses::list_addresses(args, &opt.common)?,
    }
    tracing::info!("Execution time: {:?}", start.elapsed());

    Ok(())
}

/// CLI commands
#[derive(Debug, Subcommand)]
enum Command {
    /// Deploy command
    ///
    /// Deploys token/AMM pairs in one batch, saves their addresses, then
    /// approves each token's balance to the validator and registers each AMM.
    #[command(name = "deploy")]
    Deploy(DeployArgs),

    /// Register command
    ///
    /// Approves and registers the pairs saved by a previous deployment.
    #[command(name = "register")]
    Register(RegisterArgs),

    /// Signatures command
    ///
    /// Signs payments and stores them in the state channel contract.
    #[command(name = "signatures")]
    Signatures(SignaturesArgs),

    /// Addresses command
    ///
    /// Prints the saved address files.
    #[command(name = "addresses")]
    Addresses(AddressesArgs),
}

/// CLI common options
#[derive(Debug, Args)]
#[command(next_help_heading = "Common")]
pub struct CommonArgs {
    /// ETH Node HTTP URL to connect to
    #[arg(
        long = "node_http",
        name = "node_http",
        env = "NODE_HTTP",
        global = true
    )]
    node_http: Option<String>,

    /// Timeout for requests to the node, in seconds
    #[arg(
        long = "provider_client_timeout_seconds",
        name = "provider_client_timeout_seconds",
        env = "PROVIDER_CLIENT_TIMEOUT_SECONDS",
        default_value = "10",
        global = true
    )]
    provider_client_timeout_seconds: u64,

    /// Root of the compiled contract artifacts tree
    #[arg(
        long = "artifacts_dir",
        name = "artifacts_dir",
        env = "ARTIFACTS_DIR",
        default_value = "artifacts",
        global = true
    )]
    artifacts_dir: String,

    /// Directory holding the address files
    #[arg(
        long = "addresses_dir",
        name = "addresses_dir",
        env = "ADDRESSES_DIR",
        default_value = ".",
        global = true
    )]
    addresses_dir: String,

    /// Interval between receipt polls, in milliseconds
    #[arg(
        long = "tx_poll_interval_ms",
        name = "tx_poll_interval_ms",
        env = "TX_POLL_INTERVAL_MS",
        default_value = "1000",
        global = true
    )]
    tx_poll_interval_ms: u64,

    /// Number of receipt polls before a transaction is considered lost
    #[arg(
        long = "tx_poll_max_retries",
        name = "tx_poll_max_retries",
        env = "TX_POLL_MAX_RETRIES",
        default_value = "120",
        global = true
    )]
    tx_poll_max_retries: u64,

    /// Percentage of the pending base fee budgeted in the max fee
    #[arg(
        long = "base_fee_percent",
        name = "base_fee_percent",
        env = "BASE_FEE_PERCENT",
        default_value = "200",
        global = true
    )]
    base_fee_percent: u32,

    /// Percentage of the node's suggested priority fee to pay
    #[arg(
        long = "priority_fee_percent",
        name = "priority_fee_percent",
        env = "PRIORITY_FEE_PERCENT",
        default_value = "100",
        global = true
    )]
    priority_fee_percent: u32,
}

impl CommonArgs {
    pub(crate) fn address_book(&self) -> AddressBook {
        AddressBook::new(&self.addresses_dir)
    }

    pub(crate) fn artifact_store(&self) -> ArtifactStore {
        ArtifactStore::new(&self.artifacts_dir)
    }

    pub(crate) fn tx_settings(&self) -> TxSettings {
        TxSettings {
            poll_interval: Duration::from_millis(self.tx_poll_interval_ms),
            max_polls: self.tx_poll_max_retries,
            base_fee_percent: self.base_fee_percent,
            priority_fee_percent: self.priority_fee_percent,
        }
    }

    /// Connect to the node and load the signing key for its chain
    pub(crate) async fn connect(
        &self,
        signer_args: &SignerArgs,
    ) -> anyhow::Result<ChainClient<impl EvmProvider>> {
        let signing_scheme = signer_args.signing_scheme()?;
        let provider = ammctl_provider::new_alloy_evm_provider(
            self.node_http.as_ref().context("must provide node_http")?,
            self.provider_client_timeout_seconds,
        )?;
        let chain_id = provider
            .get_chain_id()
            .await
            .context("should get chain id from node")?;
        tracing::info!("Connected to chain {chain_id}");

        let signer = ammctl_signer::new_local_signer(&signing_scheme, chain_id)?;
        Ok(ChainClient::new(
            provider,
            signer,
            chain_id,
            self.tx_settings(),
        ))
    }
}

/// CLI options for logging
#[derive(Debug, Args)]
#[command(next_help_heading = "Logging")]
pub struct LogsArgs {
    /// Log file
    ///
    /// If not provided, logs will be written to stdout
    #[arg(
        long = "log.file",
        name = "log.file",
        env = "LOG_FILE",
        default_value = None,
        global = true
    )]
    file: Option<String>,

    /// Log JSON
    ///
    /// If set, logs will be written in JSON format
    #[arg(
        long = "log.json",
        name = "log.json",
        env = "LOG_JSON",
        required = false,
        num_args = 0,
        global = true
    )]
    json: bool,

    /// Log filter used when `RUST_LOG` is not set
    #[arg(
        long = "log.level",
        name = "log.level",
        env = "LOG_LEVEL",
        default_value = "info",
        global = true
    )]
    level: String,
}

/// CLI options
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    #[clap(subcommand)]
    command: Command,

    #[clap(flatten)]
    common: CommonArgs,

    #[clap(flatten)]
    logs: LogsArgs,
}
