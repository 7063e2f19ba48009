mod alerts;
mod audit;
mod config;
mod monitoring;
mod orchestrator;
mod store;

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use logger::LevelFilter;

use audit::AuditLog;
use config::Config;
use orchestrator::Orchestrator;

/// Background uptime monitor: probes every registered check, alerts owners
/// on state changes and keeps a rotating audit trail.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the config file (defaults to $XDG_CONFIG_HOME/uptime/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at DEBUG unless RUST_LOG is set
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the probe and log rotation loops (default)
    Run,
    /// Inspect audit logs
    Logs {
        #[command(subcommand)]
        command: LogsCommand,
    },
    /// Print the effective configuration
    Config,
}

#[derive(Debug, Subcommand)]
enum LogsCommand {
    /// List live logs, optionally with rotated archives
    List {
        #[arg(long)]
        archives: bool,
    },
    /// Decompress an archive to stdout
    Show {
        /// Archive id, e.g. `<checkId>-<rotationMillis>`
        archive: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if cli.verbose {
        logger::init_tracing_with_level(LevelFilter::DEBUG);
    } else {
        logger::init_tracing();
    }

    let config = Config::from_config(cli.config.as_ref())?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => Orchestrator::start(config).await,
        Command::Config => {
            print!("{config}");
            Ok(())
        }
        Command::Logs { command } => {
            let audit = AuditLog::new(&config.storage.logs_dir);
            match command {
                LogsCommand::List { archives } => {
                    for id in audit.list(archives).await? {
                        println!("{id}");
                    }
                }
                LogsCommand::Show { archive } => {
                    let contents = audit.decompress(&archive).await?;
                    std::io::stdout().write_all(&contents)?;
                }
            }
            Ok(())
        }
    }
}
