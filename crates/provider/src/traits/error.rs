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

use alloy_transport::TransportError;

/// Error enumeration for the Provider trait
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// RPC Error
    #[error(transparent)]
    RPC(#[from] TransportError),
    /// ABI decoding error
    #[error(transparent)]
    AbiError(#[from] alloy_sol_types::Error),
    /// The node did not answer within the client timeout
    #[error("rpc call timed out after {0:?}")]
    Timeout(Duration),
    /// Internal errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result of a provider method call
pub type ProviderResult<T> = Result<T, ProviderError>;
