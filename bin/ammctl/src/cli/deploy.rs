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
use ammctl_contracts::ContractKind;
use ammctl_deployer::{
    address_book::PAIRS_FILE, approve_and_register, deploy::addresses_to_pairs, deploy_and_save,
    DeployConfig,
};
use anyhow::bail;
use clap::Args;
use tracing::info;

use super::{signer::SignerArgs, CommonArgs};

/// Validator and registry the pairs are wired to
#[derive(Args, Debug)]
pub(crate) struct WiringArgs {
    /// Validator address. Defaults to the first entry of the validator address file.
    #[arg(long = "validator", name = "validator", env = "VALIDATOR")]
    validator: Option<Address>,

    /// Registry address. Defaults to the first entry of the registry address
    /// file, then to the well-known registry.
    #[arg(long = "registry", name = "registry", env = "REGISTRY")]
    registry: Option<Address>,
}

#[derive(Args, Debug)]
pub(crate) struct DeployArgs {
    /// Number of token/AMM pairs to deploy
    #[arg(long = "pairs", name = "pairs", env = "PAIRS", default_value = "2")]
    pairs: usize,

    /// Initial supply of each token, minted to the deployer
    #[arg(
        long = "token_supply",
        name = "token_supply",
        env = "TOKEN_SUPPLY",
        default_value = "1000"
    )]
    token_supply: U256,

    /// Gas limit of each token deployment
    #[arg(
        long = "token_gas_limit",
        name = "token_gas_limit",
        env = "TOKEN_GAS_LIMIT",
        default_value = "1500000"
    )]
    token_gas_limit: u64,

    /// Gas limit of each AMM deployment
    #[arg(
        long = "amm_gas_limit",
        name = "amm_gas_limit",
        env = "AMM_GAS_LIMIT",
        default_value = "3000000"
    )]
    amm_gas_limit: u64,

    /// Check that code exists at every predicted address once mined
    #[arg(long = "verify_code", name = "verify_code", env = "VERIFY_CODE")]
    verify_code: bool,

    /// Only deploy, skip the approve and register step
    #[arg(long = "skip_register", name = "skip_register", env = "SKIP_REGISTER")]
    skip_register: bool,

    #[command(flatten)]
    wiring: WiringArgs,

    #[command(flatten)]
    signer: SignerArgs,
}

#[derive(Args, Debug)]
pub(crate) struct RegisterArgs {
    #[command(flatten)]
    wiring: WiringArgs,

    #[command(flatten)]
    signer: SignerArgs,
}

pub(super) async fn deploy(args: DeployArgs, common: &CommonArgs) -> anyhow::Result<()> {
    let book = common.address_book();
    let validator = book.resolve_validator(args.wiring.validator)?;
    let registry = book.resolve_registry(args.wiring.registry)?;
    info!("Validator: {validator}");
    info!("Registry: {registry}");

    let artifacts = common.artifact_store();
    if !args.skip_register {
        artifacts.read_interface(ContractKind::Registry)?;
    }
    let client = common.connect(&args.signer).await?;
    let mut nonces = client.fetch_nonces().await?;

    let config = DeployConfig {
        pairs: args.pairs,
        token_supply: args.token_supply,
        token_gas_limit: args.token_gas_limit,
        amm_gas_limit: args.amm_gas_limit,
        validator,
        registry,
        verify_code: args.verify_code,
    };
    let pairs = deploy_and_save(&client, &artifacts, &book, &config, &mut nonces).await?;

    if args.skip_register {
        return Ok(());
    }
    approve_and_register(&client, &pairs, validator, registry, &mut nonces).await?;
    Ok(())
}

pub(super) async fn register(args: RegisterArgs, common: &CommonArgs) -> anyhow::Result<()> {
    let book = common.address_book();
    let pairs = addresses_to_pairs(&book.load(PAIRS_FILE)?);
    if pairs.is_empty() {
        bail!(
            "No deployed pairs found in {}",
            book.path(PAIRS_FILE).display()
        );
    }
    let validator = book.resolve_validator(args.wiring.validator)?;
    let registry = book.resolve_registry(args.wiring.registry)?;
    common
        .artifact_store()
        .read_interface(ContractKind::Registry)?;

    let client = common.connect(&args.signer).await?;
    let mut nonces = client.fetch_nonces().await?;
    approve_and_register(&client, &pairs, validator, registry, &mut nonces).await?;
    Ok(())
}
