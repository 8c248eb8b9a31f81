mod check;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::check::CheckCommands;

#[derive(Debug, Parser)]
#[command(name = "sladash-cli")]
#[command(about = "sladash command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Run a serviceability or availability check and print the report
    Check {
        #[command(subcommand)]
        command: CheckCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Verify the database is reachable
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    // stdout carries the JSON report; logs go to stderr.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("sladash-cli: run with --help for available commands");
        return Ok(());
    };

    let config = sladash_core::load_app_config()?;
    match command {
        Commands::Db { command } => run_db_command(&config, command).await,
        Commands::Check { command } => check::run_check_command(&config, command).await,
    }
}

async fn run_db_command(
    config: &sladash_core::AppConfig,
    command: DbCommands,
) -> anyhow::Result<()> {
    let pool = sladash_db::connect(config).await?;
    match command {
        DbCommands::Ping => {
            sladash_db::health_check(&pool).await?;
            println!("database ok");
        }
        DbCommands::Migrate => {
            let applied = sladash_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
    }
    Ok(())
}
