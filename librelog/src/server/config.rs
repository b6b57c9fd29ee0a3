//! Command-line and file configuration for the librelog server.

use std::path::Path;

use clap::{ArgAction, Parser, Subcommand};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::OwnerId;

/// Default cap on a single ingest message.
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 1024 * 1024;

/// CLI arguments for the server.
#[derive(Parser, Debug)]
#[command(name = "librelog")]
#[command(about = "Log ingestion and retrieval service")]
pub struct CliArgs {
    /// Path to the YAML configuration file
    #[arg(short, long, env = "LIBRELOG_CONFIG", global = true)]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(short, long, default_value = "9000", env = "LIBRELOG_PORT")]
    pub port: u16,

    /// Wait for writes to reach durable storage before acknowledging them
    #[arg(
        long,
        default_value_t = true,
        action = ArgAction::Set,
        env = "LIBRELOG_AWAIT_DURABLE"
    )]
    pub await_durable: bool,

    /// Largest accepted ingest message, in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_MESSAGE_BYTES)]
    pub max_message_bytes: usize,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP server (the default)
    Serve,

    /// Issue an API token and print it once
    IssueToken {
        /// Display name for the token
        #[arg(long)]
        name: String,

        /// Owner to issue for; a new owner is created when omitted
        #[arg(long)]
        owner: Option<OwnerId>,
    },

    /// Create a logset and print its id
    CreateLogset {
        #[arg(long)]
        owner: OwnerId,

        #[arg(long)]
        name: String,

        #[arg(long, default_value = "")]
        description: String,
    },
}

impl CliArgs {
    /// Builds the store configuration from the config file (if any) and flags.
    pub fn to_log_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => Config::default(),
        };
        config.await_durable = self.await_durable;
        Ok(config)
    }

    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }
}

/// Load the store configuration from a YAML file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref())
        .map_err(|e| Error::InvalidInput(format!("Failed to read config file: {}", e)))?;

    serde_yaml::from_str(&contents)
        .map_err(|e| Error::InvalidInput(format!("Failed to parse config file: {}", e)))
}

/// Server-level settings.
#[derive(Debug, Clone)]
pub struct LogServerConfig {
    pub port: u16,
    pub max_message_bytes: usize,
}

impl Default for LogServerConfig {
    fn default() -> Self {
        Self {
            port: 9000,
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
        }
    }
}

impl From<&CliArgs> for LogServerConfig {
    fn from(args: &CliArgs) -> Self {
        Self {
            port: args.port,
            max_message_bytes: args.max_message_bytes,
        }
    }
}
