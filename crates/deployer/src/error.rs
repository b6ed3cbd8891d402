use {
    crate::artifact::ArtifactError,
    alloy::primitives::{Address, TxHash},
    std::path::PathBuf,
};

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Everything that can abort a deployment. None of these are recovered from:
/// the first failure ends the run.
#[derive(Debug, thiserror::Error)]
pub enum DeploymentError {
    #[error("artifact for contract {name} not found in {}", .searched.display())]
    ArtifactNotFound { name: String, searched: PathBuf },

    #[error("failed to search {} for artifacts", .searched.display())]
    ArtifactSearch {
        searched: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error(
        "multiple artifacts for contract {name}, use a fully qualified name: {}",
        display_paths(.candidates)
    )]
    AmbiguousArtifact {
        name: String,
        candidates: Vec<PathBuf>,
    },

    #[error("invalid artifact {}", .path.display())]
    InvalidArtifact {
        path: PathBuf,
        #[source]
        source: ArtifactError,
    },

    #[error("failed to submit deployment transaction")]
    Submission(#[source] BoxError),

    #[error("deployment was not confirmed")]
    Confirmation(#[source] BoxError),
}

impl DeploymentError {
    pub fn submission(err: impl Into<BoxError>) -> Self {
        Self::Submission(err.into())
    }

    pub fn confirmation(err: impl Into<BoxError>) -> Self {
        Self::Confirmation(err.into())
    }
}

/// Reasons a submitted deployment transaction did not end up as a contract.
#[derive(Debug, thiserror::Error)]
pub enum ConfirmationFailure {
    #[error("transaction {0} reverted")]
    Reverted(TxHash),
    #[error("receipt of transaction {0} has no contract address")]
    MissingContractAddress(TxHash),
    #[error("no code at {0} after deployment")]
    EmptyCode(Address),
    #[error("deployment transaction {0} was already awaited")]
    AlreadyAwaited(TxHash),
    #[error("address requested before the deployment was confirmed")]
    Unconfirmed,
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
