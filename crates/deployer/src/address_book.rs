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


//! Deployed addresses persisted as JSON arrays of hex strings

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use alloy_primitives::{address, Address};
use tracing::{debug, info};

use crate::error::{DeployError, DeployResult};

/// Deployed AMM/token pairs, `[amm0, token0, amm1, token1, ...]`
pub const PAIRS_FILE: &str = ".address.ass5.json";
/// Validator address, index 0 used
pub const VALIDATOR_FILE: &str = ".address.validator.json";
/// Registry address, index 0 used
pub const REGISTRY_FILE: &str = ".address.registry.json";

/// Well-known registry used when neither configuration nor the registry file names one
pub const DEFAULT_REGISTRY: Address = address!("a269147eD50Eb19038d88981Fbe408ac39954FBA");

/// Reads and writes address files under a base directory
#[derive(Debug, Clone)]
pub struct AddressBook {
    dir: PathBuf,
}

impl AddressBook {
    /// Create an address book rooted at `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Base directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of `file` within the book
    pub fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    /// Overwrite `file` with `addresses`, checksummed
    pub fn save(&self, file: &str, addresses: &[Address]) -> DeployResult<()> {
        let path = self.path(file);
        let entries: Vec<String> = addresses.iter().map(|a| a.to_checksum(None)).collect();
        let json = serde_json::to_string(&entries).map_err(|source| {
            DeployError::MalformedAddressFile {
                path: path.clone(),
                source,
            }
        })?;
        fs::write(&path, json).map_err(|source| DeployError::AddressFile {
            path: path.clone(),
            source,
        })?;
        info!("Saved {} addresses to {}", addresses.len(), path.display());
        Ok(())
    }

    /// Read `file`. A file that does not exist reads as an empty list.
    pub fn load(&self, file: &str) -> DeployResult<Vec<Address>> {
        let path = self.path(file);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("Address file {} not found, using empty list", path.display());
                return Ok(vec![]);
            }
            Err(source) => return Err(DeployError::AddressFile { path, source }),
        };
        let addresses: Vec<Address> = serde_json::from_str(&contents)
            .map_err(|source| DeployError::MalformedAddressFile { path: path.clone(), source })?;
        debug!("Loaded {} addresses from {}", addresses.len(), path.display());
        Ok(addresses)
    }

    /// First address stored in `file`, if any
    pub fn load_first(&self, file: &str) -> DeployResult<Option<Address>> {
        Ok(self.load(file)?.first().copied())
    }

    /// Validator to use: `configured` if set, else the first entry of the validator file
    pub fn resolve_validator(&self, configured: Option<Address>) -> DeployResult<Address> {
        if let Some(validator) = configured {
            return Ok(validator);
        }
        self.load_first(VALIDATOR_FILE)?.ok_or_else(|| {
            anyhow::anyhow!(
                "no validator configured and {} is empty",
                self.path(VALIDATOR_FILE).display()
            )
            .into()
        })
    }

    /// Registry to use: `configured` if set, else the first entry of the
    /// registry file, else [`DEFAULT_REGISTRY`]
    pub fn resolve_registry(&self, configured: Option<Address>) -> DeployResult<Address> {
        if let Some(registry) = configured {
            return Ok(registry);
        }
        Ok(self
            .load_first(REGISTRY_FILE)?
            .unwrap_or(DEFAULT_REGISTRY))
    }
}
