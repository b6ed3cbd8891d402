use {
    crate::{
        error::{ConfirmationFailure, DeploymentError},
        traits::ArtifactResolver,
    },
    alloy::primitives::Address,
    std::fmt::{self, Display, Formatter},
};

/// The contract this tool deploys.
pub const CONTRACT_NAME: &str = "DappTorch";

/// Outcome of a confirmed deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentResult {
    pub contract_name: String,
    pub address: Address,
}

impl Display for DeploymentResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "✅ Project deployed to: {}", self.address)
    }
}

/// Deploys [`CONTRACT_NAME`] once: resolve the factory, submit, wait for
/// confirmation, read the address. Any failure aborts the remaining steps.
pub struct Deployer<R> {
    resolver: R,
}

impl<R: ArtifactResolver> Deployer<R> {
    pub fn new(resolver: R) -> Self {
        Self { resolver }
    }

    #[tracing::instrument(skip_all, fields(contract = CONTRACT_NAME))]
    pub async fn run(&self) -> Result<DeploymentResult, DeploymentError> {
        let factory = self.resolver.contract_factory(CONTRACT_NAME).await?;
        tracing::debug!("resolved contract factory");

        let mut pending = factory.deploy().await?;
        let tx_hash = pending.tx_hash();
        tracing::info!(?tx_hash, "submitted deployment transaction");

        pending.wait_for_deployment().await?;
        tracing::debug!(?tx_hash, "deployment confirmed");

        let address = pending
            .address()
            .ok_or_else(|| DeploymentError::confirmation(ConfirmationFailure::Unconfirmed))?;
        tracing::info!(?address, "contract deployed");

        Ok(DeploymentResult {
            contract_name: CONTRACT_NAME.to_string(),
            address,
        })
    }
}
