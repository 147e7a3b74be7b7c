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

use alloy_signer::Signer;
use alloy_signer_local::{
    coins_bip39::English, LocalSignerError, MnemonicBuilder, PrivateKeySigner,
};
use anyhow::Context;
use secrecy::{ExposeSecret, SecretString};

use crate::{Error, Result};

pub(crate) fn construct_signer_from_private_key(
    private_key: &SecretString,
    chain_id: u64,
) -> Result<PrivateKeySigner> {
    let signer = private_key
        .expose_secret()
        .trim()
        .parse::<PrivateKeySigner>()
        .context("failed to parse private key signer")?
        .with_chain_id(Some(chain_id));
    Ok(signer)
}

pub(crate) fn construct_signer_from_mnemonic(
    mnemonic: &SecretString,
    chain_id: u64,
    index: u32,
) -> Result<PrivateKeySigner> {
    let signer = MnemonicBuilder::<English>::default()
        .phrase(mnemonic.expose_secret().trim())
        .index(index)?
        .build()?
        .with_chain_id(Some(chain_id));
    Ok(signer)
}

impl From<LocalSignerError> for Error {
    fn from(value: LocalSignerError) -> Self {
        Error::SigningError(value.to_string())
    }
}
