use {clap::Parser, deployer::arguments::Arguments};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Arguments::parse();
    observe::tracing::initialize(&observe::Config::new(
        &args.logging.log_filter,
        args.logging.log_json,
    ));
    tracing::info!("running deployer with arguments:\n{}", args);

    let result = deployer::run(args).await?;
    println!("{result}");
    Ok(())
}
