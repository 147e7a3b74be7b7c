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
use ammctl_contracts::ContractKind;
use ammctl_deployer::{submit_signatures, Payment};
use clap::Args;

use super::{signer::SignerArgs, CommonArgs};

#[derive(Args, Debug)]
pub(crate) struct SignaturesArgs {
    /// State channel contract to store the signatures in
    #[arg(
        long = "channel",
        name = "channel",
        env = "CHANNEL",
        default_value = "0x44315DE282695e32287A5a9B8317cA75c55e008A"
    )]
    channel: Address,

    /// Payments to sign, as comma separated `index:amount` pairs (amounts in wei)
    #[arg(
        long = "payments",
        name = "payments",
        env = "PAYMENTS",
        value_delimiter = ',',
        default_value = "0:200,1:100"
    )]
    payments: Vec<Payment>,

    #[command(flatten)]
    signer: SignerArgs,
}

pub(super) async fn send_signatures(
    args: SignaturesArgs,
    common: &CommonArgs,
) -> anyhow::Result<()> {
    common
        .artifact_store()
        .read_interface(ContractKind::StateChannel)?;
    let client = common.connect(&args.signer).await?;
    let mut nonces = client.fetch_nonces().await?;
    submit_signatures(&client, args.channel, &args.payments, &mut nonces).await?;
    Ok(())
}
