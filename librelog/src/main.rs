//! librelog server binary entry point.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use librelog::server::{CliArgs, Command, LogServer, LogServerConfig};
use librelog::{LogDb, OwnerId};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = CliArgs::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("librelog: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    let log_config = args.to_log_config()?;
    let server_config = LogServerConfig::from(&args);

    tracing::info!("Opening log with config: {:?}", log_config);
    let log = Arc::new(LogDb::open(log_config).await?);

    match args.command() {
        Command::Serve => {
            LogServer::new(log, server_config).run().await?;
        }
        Command::IssueToken { name, owner } => {
            let owner = owner.unwrap_or_else(OwnerId::generate);
            let issued = log.credentials().issue(owner, &name).await?;
            println!("owner: {}", issued.owner);
            println!("token: {}", issued.token);
            println!("hash:  {}", issued.key.hash);
            log.close().await?;
        }
        Command::CreateLogset {
            owner,
            name,
            description,
        } => {
            let logset = log.create_logset(&owner, &name, &description).await?;
            println!("{}", logset.id);
            log.close().await?;
        }
    }
    Ok(())
}
