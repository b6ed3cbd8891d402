pub mod arguments;
pub mod artifact;
pub mod deployer;
pub mod error;
pub mod onchain;
pub mod traits;

pub use {
    deployer::{CONTRACT_NAME, Deployer, DeploymentResult},
    error::DeploymentError,
};

/// Deploys the contract with the node and artifacts described by `args`.
pub async fn run(args: arguments::Arguments) -> Result<DeploymentResult, DeploymentError> {
    let onchain = onchain::Onchain::new(args.into());
    Deployer::new(onchain).run().await
}
