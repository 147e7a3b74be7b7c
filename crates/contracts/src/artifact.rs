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

use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
};

use alloy_primitives::Bytes;
use serde::Deserialize;

/// Contracts with a compiled artifact ammctl knows how to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractKind {
    /// `AMMCoin` token
    Coin,
    /// `AMMExchange` exchange
    Exchange,
    /// `AMMRegistry` registry
    Registry,
    /// `StateChannel` payment channel
    StateChannel,
}

impl ContractKind {
    /// Name of the contract as it appears in the artifacts tree
    pub fn artifact_name(&self) -> &'static str {
        match self {
            ContractKind::Coin => "AMMCoin",
            ContractKind::Exchange => "AMMExchange",
            ContractKind::Registry => "AMMRegistry",
            ContractKind::StateChannel => "StateChannel",
        }
    }

    /// Functions called on an instance this tool did not deploy
    pub fn required_functions(&self) -> &'static [&'static str] {
        match self {
            ContractKind::Coin | ContractKind::Exchange => &[],
            ContractKind::Registry => &["registerAMM"],
            ContractKind::StateChannel => {
                &["addSignature", "getSignature", "getSignatureEthAmount"]
            }
        }
    }
}

impl fmt::Display for ContractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.artifact_name())
    }
}

/// Errors raised while locating or parsing a compiled artifact
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    /// No artifact file for the contract under the artifacts root
    #[error("artifact for {name} not found under {root}")]
    NotFound {
        /// Contract name
        name: String,
        /// Artifacts root searched
        root: PathBuf,
    },
    /// The artifact file could not be read
    #[error("failed to read artifact {path}: {source}")]
    Io {
        /// Artifact path
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },
    /// The artifact is not valid JSON
    #[error("artifact for {name} is not valid JSON: {source}")]
    Json {
        /// Contract name
        name: String,
        /// Underlying error
        source: serde_json::Error,
    },
    /// The artifact has no ABI, or the ABI is not a list
    #[error("{name} abi is missing or invalid")]
    InvalidAbi {
        /// Contract name
        name: String,
    },
    /// The artifact has no creation bytecode
    #[error("{name} bytecode is missing or invalid")]
    MissingBytecode {
        /// Contract name
        name: String,
    },
    /// The ABI lacks a function that will be called
    #[error("{name} abi has no function {function}")]
    MissingFunction {
        /// Contract name
        name: String,
        /// Function name
        function: String,
    },
    /// The creation bytecode is not hex
    #[error("{name} bytecode is not valid hex: {source}")]
    InvalidBytecode {
        /// Contract name
        name: String,
        /// Underlying error
        source: const_hex::FromHexError,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBytecode {
    Hex(String),
    // foundry output
    Object { object: String },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArtifact {
    #[serde(default)]
    contract_name: Option<String>,
    #[serde(default)]
    abi: Option<serde_json::Value>,
    #[serde(default)]
    bytecode: Option<RawBytecode>,
}

/// A compiled contract: its ABI and creation bytecode
#[derive(Debug, Clone)]
pub struct Artifact {
    /// Contract name
    pub contract_name: String,
    /// JSON ABI as produced by the compiler
    pub abi: serde_json::Value,
    /// Creation bytecode, never empty
    pub bytecode: Bytes,
}

impl Artifact {
    /// Parse and validate an artifact from its JSON text.
    ///
    /// Fails if the ABI is not a list or if the bytecode is absent, empty
    /// or `0x`.
    pub fn from_json(name: &str, json: &str) -> Result<Self, ArtifactError> {
        let raw: RawArtifact = serde_json::from_str(json).map_err(|source| ArtifactError::Json {
            name: name.to_string(),
            source,
        })?;

        let abi = match raw.abi {
            Some(abi) if abi.is_array() => abi,
            _ => {
                return Err(ArtifactError::InvalidAbi {
                    name: name.to_string(),
                })
            }
        };

        let code = match &raw.bytecode {
            Some(RawBytecode::Hex(code)) | Some(RawBytecode::Object { object: code }) => {
                code.as_str()
            }
            None => "",
        };
        let code = code.strip_prefix("0x").unwrap_or(code);
        if code.is_empty() {
            return Err(ArtifactError::MissingBytecode {
                name: name.to_string(),
            });
        }
        let bytecode =
            const_hex::decode(code).map_err(|source| ArtifactError::InvalidBytecode {
                name: name.to_string(),
                source,
            })?;

        Ok(Self {
            contract_name: raw.contract_name.unwrap_or_else(|| name.to_string()),
            abi,
            bytecode: bytecode.into(),
        })
    }

    /// Whether the ABI declares a function called `name`
    pub fn has_function(&self, name: &str) -> bool {
        self.abi.as_array().is_some_and(|items| {
            items
                .iter()
                .any(|item| item["type"] == "function" && item["name"] == name)
        })
    }

    /// Creation payload: bytecode followed by the ABI encoded constructor arguments
    pub fn deploy_code(&self, constructor_args: &[u8]) -> Bytes {
        let mut code = Vec::with_capacity(self.bytecode.len() + constructor_args.len());
        code.extend_from_slice(&self.bytecode);
        code.extend_from_slice(constructor_args);
        code.into()
    }
}

/// Reads artifacts from a compiled-artifacts directory tree.
///
/// Hardhat places `<Name>.json` inside a `<Name>.sol` directory somewhere
/// under the root. Foundry uses the same layout under `out/`.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Create a store rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The artifacts root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read and validate the artifact for `kind`
    pub fn read_artifact(&self, kind: ContractKind) -> Result<Artifact, ArtifactError> {
        self.read_artifact_by_name(kind.artifact_name())
    }

    /// Read the artifact for `kind` and check its ABI declares every
    /// [`ContractKind::required_functions`] entry
    pub fn read_interface(&self, kind: ContractKind) -> Result<Artifact, ArtifactError> {
        let artifact = self.read_artifact(kind)?;
        if let Some(missing) = kind
            .required_functions()
            .iter()
            .find(|function| !artifact.has_function(function))
        {
            return Err(ArtifactError::MissingFunction {
                name: artifact.contract_name,
                function: missing.to_string(),
            });
        }
        tracing::info!(
            "{} interface checked: {}",
            artifact.contract_name,
            kind.required_functions().join(", ")
        );
        Ok(artifact)
    }

    /// Read and validate the artifact of the contract called `name`
    pub fn read_artifact_by_name(&self, name: &str) -> Result<Artifact, ArtifactError> {
        let path = self.find(name)?;
        tracing::debug!("reading {name} artifact from {}", path.display());
        let json = fs::read_to_string(&path).map_err(|source| ArtifactError::Io {
            path: path.clone(),
            source,
        })?;
        Artifact::from_json(name, &json)
    }

    /// Locate the artifact file for `name`.
    ///
    /// A `<name>.sol/<name>.json` match wins over a bare `<name>.json`.
    pub fn find(&self, name: &str) -> Result<PathBuf, ArtifactError> {
        let file_name = format!("{name}.json");
        let dir_name = format!("{name}.sol");
        let mut candidates = vec![];
        collect_files(&self.root, &file_name, &mut candidates).map_err(|source| {
            ArtifactError::Io {
                path: self.root.clone(),
                source,
            }
        })?;
        candidates.sort();

        let preferred = candidates.iter().position(|p| {
            p.parent()
                .and_then(Path::file_name)
                .is_some_and(|dir| dir == dir_name.as_str())
        });
        match preferred {
            Some(idx) => Ok(candidates.swap_remove(idx)),
            None => candidates
                .into_iter()
                .next()
                .ok_or_else(|| ArtifactError::NotFound {
                    name: name.to_string(),
                    root: self.root.clone(),
                }),
        }
    }
}

fn collect_files(dir: &Path, file_name: &str, out: &mut Vec<PathBuf>) -> io::Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            // hardhat keeps solc inputs here, never artifacts
            if path.file_name().is_some_and(|n| n == "build-info") {
                continue;
            }
            collect_files(&path, file_name, out)?;
        } else if path.file_name().is_some_and(|n| n == file_name) {
            out.push(path);
        }
    }
    Ok(())
}
