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

use alloy_primitives::{Address, TxHash, B256};
use alloy_rpc_types_eth::TransactionReceipt;
use serde_json::json;

/// Build a receipt as a node would return it for a mined transaction.
///
/// `contract_address` is set for contract creations. A `success` of false
/// produces a reverted receipt.
pub fn mined_receipt(
    tx_hash: TxHash,
    from: Address,
    contract_address: Option<Address>,
    success: bool,
) -> TransactionReceipt {
    let value = json!({
        "type": "0x2",
        "status": if success { "0x1" } else { "0x0" },
        "cumulativeGasUsed": "0x5208",
        "logs": [],
        "logsBloom": format!("0x{}", "0".repeat(512)),
        "transactionHash": tx_hash,
        "transactionIndex": "0x0",
        "blockHash": B256::repeat_byte(0x11),
        "blockNumber": "0x1",
        "gasUsed": "0x5208",
        "effectiveGasPrice": "0x3b9aca00",
        "from": from,
        "to": if contract_address.is_some() { None } else { Some(Address::ZERO) },
        "contractAddress": contract_address,
    });
    serde_json::from_value(value).expect("receipt json should deserialize")
}
