//! Collaborators backed by an Ethereum node and the local artifacts directory.

use {
    crate::{
        artifact::{Artifact, ArtifactStore},
        error::{ConfirmationFailure, DeploymentError},
        traits::{ArtifactResolver, ContractFactory, PendingDeployment},
    },
    alloy::{
        network::{Ethereum, EthereumWallet, ReceiptResponse, TransactionBuilder},
        primitives::{Address, TxHash},
        providers::{DynProvider, PendingTransactionBuilder, Provider, ProviderBuilder},
        rpc::types::TransactionRequest,
        signers::local::PrivateKeySigner,
    },
    std::{path::PathBuf, time::Duration},
    url::Url,
};

/// Everything needed to reach the chain and the build output.
#[derive(Debug, Clone)]
pub struct Config {
    pub node_url: Url,
    /// Signs transactions locally. When `None` the node's first account is
    /// used, which is what local development nodes expose.
    pub signer: Option<PrivateKeySigner>,
    pub artifacts: PathBuf,
    pub confirmations: u64,
    pub confirmation_timeout: Option<Duration>,
}

/// Creates an HTTP provider that fills nonce, gas and chain id, and signs with
/// `signer` if one is given.
pub fn provider(node_url: Url, signer: Option<PrivateKeySigner>) -> DynProvider {
    let builder = ProviderBuilder::new();
    match signer {
        Some(signer) => builder
            .wallet(EthereumWallet::from(signer))
            .connect_http(node_url)
            .erased(),
        None => builder.connect_http(node_url).erased(),
    }
}

#[derive(Debug, Clone, Copy)]
enum Sender {
    Wallet(Address),
    NodeAccount,
}

#[derive(Debug, Clone, Copy)]
struct Confirmation {
    confirmations: u64,
    timeout: Option<Duration>,
}

/// Resolves contracts from the artifacts directory into factories that deploy
/// through the configured node.
pub struct Onchain {
    artifacts: ArtifactStore,
    provider: DynProvider,
    sender: Sender,
    confirmation: Confirmation,
}

impl Onchain {
    pub fn new(config: Config) -> Self {
        let sender = match &config.signer {
            Some(signer) => Sender::Wallet(signer.address()),
            None => Sender::NodeAccount,
        };
        if config.confirmation_timeout.is_none() {
            tracing::warn!("no confirmation timeout configured, waiting for the deployment without limit");
        }

        Self {
            artifacts: ArtifactStore::new(config.artifacts),
            provider: provider(config.node_url, config.signer),
            sender,
            confirmation: Confirmation {
                confirmations: config.confirmations,
                timeout: config.confirmation_timeout,
            },
        }
    }
}

#[async_trait::async_trait]
impl ArtifactResolver for Onchain {
    async fn contract_factory(
        &self,
        name: &str,
    ) -> Result<Box<dyn ContractFactory>, DeploymentError> {
        let artifact = self.artifacts.load(name).await?;
        Ok(Box::new(Factory {
            artifact,
            provider: self.provider.clone(),
            sender: self.sender,
            confirmation: self.confirmation,
        }))
    }
}

struct Factory {
    artifact: Artifact,
    provider: DynProvider,
    sender: Sender,
    confirmation: Confirmation,
}

impl Factory {
    async fn sender(&self) -> Result<Address, DeploymentError> {
        match self.sender {
            Sender::Wallet(address) => Ok(address),
            Sender::NodeAccount => {
                let accounts = self
                    .provider
                    .get_accounts()
                    .await
                    .map_err(DeploymentError::submission)?;
                accounts.first().copied().ok_or_else(|| {
                    DeploymentError::submission("node has no accounts, configure a private key")
                })
            }
        }
    }
}

#[async_trait::async_trait]
impl ContractFactory for Factory {
    async fn deploy(&self) -> Result<Box<dyn PendingDeployment>, DeploymentError> {
        let from = self.sender().await?;
        let pending = self
            .provider
            .send_transaction(self.creation_tx(from))
            .await
            .map_err(DeploymentError::submission)?;
        let tx_hash = *pending.tx_hash();
        tracing::debug!(?from, ?tx_hash, "sent contract creation transaction");

        Ok(Box::new(Deployment::new(
            self.provider.clone(),
            tx_hash,
            self.confirmation,
        )))
    }
}

impl Factory {
    fn creation_tx(&self, from: Address) -> TransactionRequest {
        TransactionRequest::default()
            .with_from(from)
            .with_deploy_code(self.artifact.bytecode.clone())
    }
}

struct Deployment {
    provider: DynProvider,
    tx_hash: TxHash,
    pending: Option<PendingTransactionBuilder<Ethereum>>,
    address: Option<Address>,
}

impl Deployment {
    fn new(provider: DynProvider, tx_hash: TxHash, confirmation: Confirmation) -> Self {
        let pending = PendingTransactionBuilder::new(provider.root().clone(), tx_hash)
            .with_required_confirmations(confirmation.confirmations)
            .with_timeout(confirmation.timeout);
        Self {
            provider,
            tx_hash,
            pending: Some(pending),
            address: None,
        }
    }

    /// Checks a mined receipt and that the created account holds code.
    async fn confirm(
        &mut self,
        status: bool,
        contract_address: Option<Address>,
    ) -> Result<(), DeploymentError> {
        let address = deployed_address(self.tx_hash, status, contract_address)?;

        let code = self
            .provider
            .get_code_at(address)
            .await
            .map_err(DeploymentError::confirmation)?;
        if code.is_empty() {
            return Err(DeploymentError::confirmation(ConfirmationFailure::EmptyCode(
                address,
            )));
        }

        self.address = Some(address);
        Ok(())
    }
}

#[async_trait::async_trait]
impl PendingDeployment for Deployment {
    fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }

    async fn wait_for_deployment(&mut self) -> Result<(), DeploymentError> {
        let pending = self.pending.take().ok_or_else(|| {
            DeploymentError::confirmation(ConfirmationFailure::AlreadyAwaited(self.tx_hash))
        })?;

        let receipt = pending
            .get_receipt()
            .await
            .map_err(DeploymentError::confirmation)?;
        tracing::debug!(
            block = ?receipt.block_number(),
            gas_used = receipt.gas_used(),
            "received deployment receipt"
        );

        self.confirm(receipt.status(), receipt.contract_address()).await
    }

    fn address(&self) -> Option<Address> {
        self.address
    }
}

/// Extracts the created contract from a mined contract creation receipt.
fn deployed_address(
    tx_hash: TxHash,
    status: bool,
    contract_address: Option<Address>,
) -> Result<Address, DeploymentError> {
    if !status {
        return Err(DeploymentError::confirmation(ConfirmationFailure::Reverted(
            tx_hash,
        )));
    }
    contract_address.ok_or_else(|| {
        DeploymentError::confirmation(ConfirmationFailure::MissingContractAddress(tx_hash))
    })
}
