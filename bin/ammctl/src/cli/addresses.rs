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


use ammctl_deployer::{
    address_book::{PAIRS_FILE, REGISTRY_FILE, VALIDATOR_FILE},
    deploy::addresses_to_pairs,
};
use clap::Args;

use super::CommonArgs;

#[derive(Args, Debug)]
pub(crate) struct AddressesArgs {}

pub(super) fn list_addresses(_args: AddressesArgs, common: &CommonArgs) -> anyhow::Result<()> {
    let book = common.address_book();
    println!("Address files in {}", book.dir().display());

    let pairs = addresses_to_pairs(&book.load(PAIRS_FILE)?);
    println!("Pairs ({PAIRS_FILE}):");
    for (idx, pair) in pairs.iter().enumerate() {
        println!("  {idx}: amm {} token {}", pair.amm, pair.token);
    }

    for file in [VALIDATOR_FILE, REGISTRY_FILE] {
        println!("{file}:");
        for address in book.load(file)? {
            println!("  {address}");
        }
    }

    Ok(())
}
