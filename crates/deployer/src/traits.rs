//! Seams between the deployment workflow and the outside world.
//!
//! The workflow only talks to the build artifacts and the chain through these
//! traits so it can be unit tested with mocks.

use {
    crate::error::DeploymentError,
    alloy::primitives::{Address, TxHash},
};

/// Resolves compiled contracts by name.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ArtifactResolver: Send + Sync {
    /// Returns a factory able to deploy the contract `name`.
    async fn contract_factory(
        &self,
        name: &str,
    ) -> Result<Box<dyn ContractFactory>, DeploymentError>;
}

/// Deploys new instances of one compiled contract.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ContractFactory: Send + Sync {
    /// Submits a contract creation transaction. Returns as soon as the
    /// transaction was accepted by the node, without waiting for it to be
    /// mined.
    async fn deploy(&self) -> Result<Box<dyn PendingDeployment>, DeploymentError>;
}

/// A submitted contract creation transaction.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PendingDeployment: Send + Sync {
    fn tx_hash(&self) -> TxHash;

    /// Waits until the transaction is confirmed and the contract exists.
    async fn wait_for_deployment(&mut self) -> Result<(), DeploymentError>;

    /// The address of the deployed contract. `None` until
    /// [`PendingDeployment::wait_for_deployment`] succeeded.
    fn address(&self) -> Option<Address>;
}
