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

//! Bindings for the payment channel state contract.

use alloy_sol_types::sol;

sol! {
    /// Stores signed off-chain payment messages by index.
    #[allow(missing_docs)]
    #[derive(Debug, PartialEq, Eq)]
    contract StateChannel {
        function addSignature(uint256 index, bytes signature, uint256 ethAmount) external;
        function getSignature(uint256 index) external view returns (bytes signature);
        function getSignatureEthAmount(uint256 index) external view returns (uint256 ethAmount);
    }
}
