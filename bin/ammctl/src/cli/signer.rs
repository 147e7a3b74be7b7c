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


use ammctl_signer::SigningScheme;
use anyhow::bail;
use clap::Args;
use secrecy::SecretString;

#[derive(Args, Debug)]
#[command(next_help_heading = "SIGNER")]
pub(crate) struct SignerArgs {
    /// Private key to sign transactions and payment messages with
    #[arg(
        long = "signer.private_key",
        name = "signer.private_key",
        env = "SIGNER_PRIVATE_KEY",
        conflicts_with = "signer.mnemonic"
    )]
    pub(crate) private_key: Option<String>,

    /// Mnemonic to derive the signing key from
    #[arg(
        long = "signer.mnemonic",
        name = "signer.mnemonic",
        env = "SIGNER_MNEMONIC"
    )]
    pub(crate) mnemonic: Option<String>,

    /// Index of the account derived from the mnemonic
    #[arg(
        long = "signer.index",
        name = "signer.index",
        env = "SIGNER_INDEX",
        default_value = "0"
    )]
    pub(crate) index: u32,
}

impl SignerArgs {
    pub(crate) fn signing_scheme(&self) -> anyhow::Result<SigningScheme> {
        if let Some(private_key) = &self.private_key {
            return Ok(SigningScheme::PrivateKey {
                private_key: SecretString::new(private_key.clone()),
            });
        }

        if let Some(mnemonic) = &self.mnemonic {
            return Ok(SigningScheme::Mnemonic {
                mnemonic: SecretString::new(mnemonic.clone()),
                index: self.index,
            });
        }

        bail!("No signing key provided. Provide either signer.private_key or signer.mnemonic");
    }
}
