//! Discovery and validation of Hardhat build artifacts.
//!
//! Hardhat writes one JSON file per contract to
//! `<artifacts>/<sourceName>/<ContractName>.json`, next to a `.dbg.json` file
//! and a shared `build-info/` directory.

use {
    crate::error::DeploymentError,
    alloy::primitives::{Bytes, hex},
    alloy_json_abi::JsonAbi,
    serde::Deserialize,
    std::{
        collections::BTreeMap,
        path::{Path, PathBuf},
    },
    walkdir::WalkDir,
};

const BUILD_INFO_DIR: &str = "build-info";
const DEBUG_SUFFIX: &str = ".dbg.json";

/// A compiled contract ready to be deployed.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub contract_name: String,
    pub source_name: String,
    pub bytecode: Bytes,
}

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("failed to read artifact file")]
    Io(#[from] std::io::Error),
    #[error("malformed artifact JSON")]
    Malformed(#[from] serde_json::Error),
    #[error("artifact describes contract {found}, expected {expected}")]
    NameMismatch { expected: String, found: String },
    #[error("contract {0} has no bytecode, it is abstract or an interface")]
    Abstract(String),
    #[error("bytecode references unlinked libraries: {}", .0.join(", "))]
    UnlinkedLibraries(Vec<String>),
    #[error("malformed bytecode")]
    Bytecode(#[from] hex::FromHexError),
    #[error("constructor expects {0} argument(s) but none are passed on deployment")]
    ConstructorArguments(usize),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArtifact {
    contract_name: String,
    source_name: String,
    abi: JsonAbi,
    bytecode: String,
    #[serde(default)]
    link_references: BTreeMap<String, BTreeMap<String, serde_json::Value>>,
}

impl Artifact {
    /// Parses and validates the contents of an artifact file for the contract
    /// `expected_name`.
    pub fn from_json(expected_name: &str, json: &str) -> Result<Self, ArtifactError> {
        let raw: RawArtifact = serde_json::from_str(json)?;
        if raw.contract_name != expected_name {
            return Err(ArtifactError::NameMismatch {
                expected: expected_name.to_string(),
                found: raw.contract_name,
            });
        }

        // Placeholders for unlinked libraries are not valid hex, so this has to
        // be checked before decoding.
        if !raw.link_references.is_empty() {
            let libraries = raw
                .link_references
                .iter()
                .flat_map(|(source, libraries)| {
                    libraries.keys().map(move |library| format!("{source}:{library}"))
                })
                .collect();
            return Err(ArtifactError::UnlinkedLibraries(libraries));
        }

        let bytecode = Bytes::from(hex::decode(&raw.bytecode)?);
        if bytecode.is_empty() {
            return Err(ArtifactError::Abstract(raw.contract_name));
        }

        let arguments = raw
            .abi
            .constructor
            .as_ref()
            .map_or(0, |constructor| constructor.inputs.len());
        if arguments > 0 {
            return Err(ArtifactError::ConstructorArguments(arguments));
        }

        Ok(Self {
            contract_name: raw.contract_name,
            source_name: raw.source_name,
            bytecode,
        })
    }
}

/// The artifacts directory of a Hardhat project.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Finds the artifact file for `name`, which is either a bare contract
    /// name or a fully qualified `<sourceName>:<ContractName>`.
    pub fn find(&self, name: &str) -> Result<PathBuf, DeploymentError> {
        let not_found = || DeploymentError::ArtifactNotFound {
            name: name.to_string(),
            searched: self.root.clone(),
        };

        if let Some((source, contract)) = name.rsplit_once(':') {
            let path = self.root.join(source).join(format!("{contract}.json"));
            return if path.is_file() {
                Ok(path)
            } else {
                Err(not_found())
            };
        }

        if !self.root.is_dir() {
            return Err(not_found());
        }

        // Symlinks are not followed, so links pointing back into the tree cannot
        // produce duplicate candidates.
        let file_name = format!("{name}.json");
        let mut candidates = Vec::new();
        let entries = WalkDir::new(&self.root)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || entry.file_name() != BUILD_INFO_DIR);
        for entry in entries {
            let entry = entry.map_err(|source| DeploymentError::ArtifactSearch {
                searched: self.root.clone(),
                source,
            })?;
            if entry.file_type().is_file() && is_artifact_file(entry.path(), &file_name) {
                candidates.push(entry.into_path());
            }
        }
        candidates.sort();

        match candidates.len() {
            0 => Err(not_found()),
            1 => Ok(candidates.remove(0)),
            _ => Err(DeploymentError::AmbiguousArtifact {
                name: name.to_string(),
                candidates,
            }),
        }
    }

    /// Finds, reads and validates the artifact for `name`.
    pub async fn load(&self, name: &str) -> Result<Artifact, DeploymentError> {
        let path = self.find(name)?;
        let contract = name.rsplit_once(':').map_or(name, |(_, contract)| contract);
        let invalid = |source: ArtifactError| DeploymentError::InvalidArtifact {
            path: path.clone(),
            source,
        };

        let json = tokio::fs::read_to_string(&path)
            .await
            .map_err(|err| invalid(err.into()))?;
        let artifact = Artifact::from_json(contract, &json).map_err(invalid)?;
        tracing::debug!(
            path = %path.display(),
            source = %artifact.source_name,
            bytecode_len = artifact.bytecode.len(),
            "loaded artifact"
        );
        Ok(artifact)
    }
}

fn is_artifact_file(path: &Path, file_name: &str) -> bool {
    let matches_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name == file_name && !name.ends_with(DEBUG_SUFFIX));
    let in_source_dir = path
        .parent()
        .and_then(|parent| parent.extension())
        .is_some_and(|extension| extension == "sol");
    matches_name && in_source_dir
}

#[cfg(test)]
mod tests {
    use {super::*, serde_json::json, std::fs};

    fn artifact_json(name: &str, bytecode: &str) -> serde_json::Value {
        json!({
            "_format": "hh-sol-artifact-1",
            "contractName": name,
            "sourceName": format!("contracts/{name}.sol"),
            "abi": [],
            "bytecode": bytecode,
            "deployedBytecode": "0x6080",
            "linkReferences": {},
            "deployedLinkReferences": {}
        })
    }

    fn write(root: &Path, relative: &str, contents: &serde_json::Value) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents.to_string()).unwrap();
    }

    #[test]
    fn parses_valid_artifact() {
        let artifact =
            Artifact::from_json("DappTorch", &artifact_json("DappTorch", "0x6080").to_string())
                .unwrap();
        assert_eq!(artifact.contract_name, "DappTorch");
        assert_eq!(artifact.source_name, "contracts/DappTorch.sol");
        assert_eq!(artifact.bytecode, Bytes::from(vec![0x60, 0x80]));
    }

    #[test]
    fn rejects_abstract_contract() {
        let err = Artifact::from_json("DappTorch", &artifact_json("DappTorch", "0x").to_string())
            .unwrap_err();
        assert!(matches!(err, ArtifactError::Abstract(name) if name == "DappTorch"));
    }

    #[test]
    fn rejects_unlinked_libraries() {
        let mut json = artifact_json("DappTorch", "0x73__$abcdef$__60");
        json["linkReferences"] = json!({
            "contracts/Math.sol": { "Math": [{ "start": 1, "length": 20 }] }
        });
        let err = Artifact::from_json("DappTorch", &json.to_string()).unwrap_err();
        assert!(
            matches!(err, ArtifactError::UnlinkedLibraries(libraries) if libraries == ["contracts/Math.sol:Math"])
        );
    }

    #[test]
    fn rejects_constructor_arguments() {
        let mut json = artifact_json("DappTorch", "0x6080");
        json["abi"] = json!([{
            "type": "constructor",
            "stateMutability": "nonpayable",
            "inputs": [{ "name": "owner", "type": "address", "internalType": "address" }]
        }]);
        let err = Artifact::from_json("DappTorch", &json.to_string()).unwrap_err();
        assert!(matches!(err, ArtifactError::ConstructorArguments(1)));
    }

    #[test]
    fn rejects_other_contract_and_garbage() {
        let err =
            Artifact::from_json("DappTorch", &artifact_json("Other", "0x6080").to_string())
                .unwrap_err();
        assert!(matches!(err, ArtifactError::NameMismatch { .. }));

        let err = Artifact::from_json("DappTorch", "not json").unwrap_err();
        assert!(matches!(err, ArtifactError::Malformed(_)));

        let err = Artifact::from_json("DappTorch", &artifact_json("DappTorch", "0xzz").to_string())
            .unwrap_err();
        assert!(matches!(err, ArtifactError::Bytecode(_)));
    }

    #[test]
    fn finds_artifact_by_name_and_skips_debug_files() {
        let dir = tempfile::tempdir().unwrap();
        let contents = artifact_json("DappTorch", "0x6080");
        write(dir.path(), "contracts/DappTorch.sol/DappTorch.json", &contents);
        write(dir.path(), "contracts/DappTorch.sol/DappTorch.dbg.json", &json!({}));
        write(dir.path(), "build-info/DappTorch.sol/DappTorch.json", &contents);

        let store = ArtifactStore::new(dir.path());
        assert_eq!(
            store.find("DappTorch").unwrap(),
            dir.path().join("contracts/DappTorch.sol/DappTorch.json")
        );
    }

    #[test]
    fn reports_missing_and_ambiguous_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        assert!(matches!(
            store.find("DappTorch"),
            Err(DeploymentError::ArtifactNotFound { .. })
        ));

        let missing = ArtifactStore::new(dir.path().join("does-not-exist"));
        assert!(matches!(
            missing.find("DappTorch"),
            Err(DeploymentError::ArtifactNotFound { .. })
        ));

        let contents = artifact_json("DappTorch", "0x6080");
        write(dir.path(), "contracts/DappTorch.sol/DappTorch.json", &contents);
        write(dir.path(), "contracts/v2/DappTorch.sol/DappTorch.json", &contents);
        match store.find("DappTorch") {
            Err(DeploymentError::AmbiguousArtifact { candidates, .. }) => {
                assert_eq!(candidates.len(), 2)
            }
            other => panic!("unexpected result {other:?}"),
        }

        assert_eq!(
            store
                .find("contracts/v2/DappTorch.sol:DappTorch")
                .unwrap(),
            dir.path().join("contracts/v2/DappTorch.sol/DappTorch.json")
        );
    }

    #[cfg(unix)]
    #[test]
    fn ignores_symlinks_pointing_back_into_the_tree() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "contracts/DappTorch.sol/DappTorch.json",
            &artifact_json("DappTorch", "0x6080"),
        );
        std::os::unix::fs::symlink(dir.path(), dir.path().join("contracts/loop")).unwrap();

        let store = ArtifactStore::new(dir.path());
        assert_eq!(
            store.find("DappTorch").unwrap(),
            dir.path().join("contracts/DappTorch.sol/DappTorch.json")
        );
    }

    #[cfg(unix)]
    #[test]
    fn surfaces_unreadable_directories() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let locked = dir.path().join("contracts");
        fs::create_dir_all(&locked).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        // Permissions are not enforced for privileged users.
        let enforced = fs::read_dir(&locked).is_err();

        let result = ArtifactStore::new(dir.path()).find("DappTorch");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        if enforced {
            match result {
                Err(DeploymentError::ArtifactSearch { searched, source }) => {
                    assert_eq!(searched, dir.path());
                    assert!(source.io_error().is_some());
                }
                other => panic!("unexpected result {other:?}"),
            }
        } else {
            assert!(matches!(
                result,
                Err(DeploymentError::ArtifactNotFound { .. })
            ));
        }
    }

    #[tokio::test]
    async fn load_wraps_validation_errors_with_path() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "contracts/DappTorch.sol/DappTorch.json",
            &artifact_json("DappTorch", "0x"),
        );

        let store = ArtifactStore::new(dir.path());
        match store.load("DappTorch").await {
            Err(DeploymentError::InvalidArtifact { path, source }) => {
                assert!(path.ends_with("contracts/DappTorch.sol/DappTorch.json"));
                assert!(matches!(source, ArtifactError::Abstract(_)));
            }
            other => panic!("unexpected result {other:?}"),
        }

        write(
            dir.path(),
            "contracts/DappTorch.sol/DappTorch.json",
            &artifact_json("DappTorch", "0x6080"),
        );
        let artifact = store.load("contracts/DappTorch.sol:DappTorch").await.unwrap();
        assert_eq!(artifact.contract_name, "DappTorch");
    }
}
