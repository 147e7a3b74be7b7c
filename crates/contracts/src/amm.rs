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

//! Bindings for the AMM token, exchange and registry contracts.

use alloy_sol_types::sol;

sol! {
    /// ERC20 token paired with an exchange.
    #[allow(missing_docs)]
    #[derive(Debug, PartialEq, Eq)]
    contract AMMCoin {
        constructor(string name, string symbol, uint256 initialSupply);

        function balanceOf(address account) external view returns (uint256 balance);
        function approve(address spender, uint256 amount) external returns (bool success);
        function allowance(address owner, address spender) external view returns (uint256 remaining);
    }

    /// Exchange contract trading one token against ETH.
    #[allow(missing_docs)]
    #[derive(Debug, PartialEq, Eq)]
    contract AMMExchange {
        constructor(address token, address validator, address registry);
    }

    /// Shared registry of exchanges.
    #[allow(missing_docs)]
    #[derive(Debug, PartialEq, Eq)]
    contract AMMRegistry {
        function registerAMM(address amm) external;
    }
}
