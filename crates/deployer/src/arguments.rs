use {
    crate::onchain::Config,
    alloy::signers::local::PrivateKeySigner,
    std::{
        fmt::{self, Display, Formatter},
        path::PathBuf,
        time::Duration,
    },
    url::Url,
};

#[derive(clap::Parser)]
pub struct LoggingArguments {
    #[clap(long, env, default_value = "warn,deployer=info")]
    pub log_filter: String,

    /// Emit log events as JSON.
    #[clap(long, env)]
    pub log_json: bool,
}

#[derive(clap::Parser)]
#[clap(
    name = "deployer",
    about = "Deploys the DappTorch contract and prints its address"
)]
pub struct Arguments {
    #[clap(flatten)]
    pub logging: LoggingArguments,

    /// The Ethereum node URL to connect to.
    #[clap(long, env, default_value = "http://localhost:8545")]
    pub node_url: Url,

    /// Hex encoded private key of the deploying account. Without it the
    /// transaction is sent from the node's first account.
    #[clap(long, env)]
    pub private_key: Option<PrivateKeySigner>,

    /// Directory holding the Hardhat build artifacts.
    #[clap(long, env, default_value = "artifacts")]
    pub artifacts: PathBuf,

    /// Number of confirmations to wait for after the deployment was mined.
    #[clap(
        long,
        env,
        default_value = "1",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub confirmations: u64,

    /// Give up waiting for the confirmation after this long, e.g. `5m`.
    /// Waits indefinitely when unset.
    #[clap(long, env, value_parser = humantime::parse_duration)]
    pub confirmation_timeout: Option<Duration>,
}

impl Display for Arguments {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Self {
            logging,
            node_url,
            private_key,
            artifacts,
            confirmations,
            confirmation_timeout,
        } = self;

        writeln!(f, "log_filter: {}", logging.log_filter)?;
        writeln!(f, "log_json: {}", logging.log_json)?;
        writeln!(f, "node_url: {node_url}")?;
        writeln!(
            f,
            "private_key: {}",
            private_key.as_ref().map_or("None", |_| "SECRET")
        )?;
        writeln!(f, "artifacts: {}", artifacts.display())?;
        writeln!(f, "confirmations: {confirmations}")?;
        writeln!(f, "confirmation_timeout: {confirmation_timeout:?}")?;
        Ok(())
    }
}

impl From<Arguments> for Config {
    fn from(args: Arguments) -> Self {
        Self {
            node_url: args.node_url,
            signer: args.private_key,
            artifacts: args.artifacts,
            confirmations: args.confirmations,
            confirmation_timeout: args.confirmation_timeout,
        }
    }
}
