use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;

#[derive(Parser)]
#[command(name = "compat-gate")]
#[command(version, about = "Upstream compatibility gate")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project directory (defaults to the current directory)
    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    /// Compat store connection string. Overrides COMPAT_DB and compat.toml
    #[arg(long, global = true)]
    pub store: Option<String>,

    /// Skip the store write but still run the cycle (dry run)
    #[arg(long, global = true)]
    pub no_write: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one compatibility cycle against the latest upstream release
    Check,
    /// Show the persisted compatibility state
    Status,
    /// View configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    let config = compat_gate::Config::load(project_dir, cli.verbose, cli.store.clone(), cli.no_write)?;

    match &cli.command {
        Commands::Check => cmd::cmd_check(&config).await?,
        Commands::Status => cmd::cmd_status(&config)?,
        Commands::Config { command } => cmd::cmd_config(&config, command.clone())?,
    }

    Ok(())
}
