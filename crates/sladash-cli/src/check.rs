//! `check` command: one run of the probing pipeline from the terminal.
//!
//! In test mode nothing is written and no database connection is opened.

use std::sync::Arc;

use clap::{Args, Subcommand};
use sladash_core::{AppConfig, CheckKind};
use sladash_db::PgRecordStore;
use sladash_prober::{
    CheckRequest, Checker, DiscardSink, FallbackGenerator, FixedFallback, RandomFallback,
};

const CLI_SOURCE: &str = "cli";

/// Sub-commands available under `check`.
#[derive(Debug, Subcommand)]
pub enum CheckCommands {
    /// Probe delivery SLA for every configured location
    Serviceability(CheckArgs),
    /// Probe item stock for every store × item pair
    Availability(CheckArgs),
}

impl CheckCommands {
    fn kind(&self) -> CheckKind {
        match self {
            CheckCommands::Serviceability(_) => CheckKind::Serviceability,
            CheckCommands::Availability(_) => CheckKind::Availability,
        }
    }

    fn args(&self) -> &CheckArgs {
        match self {
            CheckCommands::Serviceability(args) | CheckCommands::Availability(args) => args,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Args)]
pub struct CheckArgs {
    /// Probe without persisting anything
    #[arg(long)]
    pub test_mode: bool,

    /// Print full records instead of the simplified projection
    #[arg(long)]
    pub full: bool,

    /// Restrict the run to these location names or item ids
    #[arg(long, value_delimiter = ',')]
    pub units: Vec<String>,

    /// Override the configured chunk width
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Use fixed placeholder values for failed probes instead of random ones
    #[arg(long)]
    pub deterministic_fallback: bool,
}

impl CheckArgs {
    pub(crate) fn to_request(&self) -> CheckRequest {
        let units: Vec<String> = self
            .units
            .iter()
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .collect();

        CheckRequest {
            explicit_unit_ids: (!units.is_empty()).then_some(units),
            test_mode: self.test_mode,
            return_full_data: self.full,
            batch_size: self.batch_size,
            ..CheckRequest::new(CLI_SOURCE)
        }
    }

    fn fallback(&self) -> Arc<dyn FallbackGenerator> {
        if self.deterministic_fallback {
            Arc::new(FixedFallback::default())
        } else {
            Arc::new(RandomFallback)
        }
    }
}

/// Runs one check and prints the report as pretty JSON on stdout.
///
/// # Errors
///
/// Returns an error if the API client cannot be built, the database cannot
/// be reached (outside test mode), or the run aborts before probing.
pub(crate) async fn run_check_command(
    config: &AppConfig,
    command: CheckCommands,
) -> anyhow::Result<()> {
    let kind = command.kind();
    let args = command.args();
    let checker = Checker::from_app_config(config, args.fallback())?;
    let request = args.to_request();

    let report = if request.test_mode {
        checker.run_check(kind, &request, &DiscardSink).await?
    } else {
        let pool = sladash_db::connect(config).await?;
        let store = PgRecordStore::new(pool);
        checker.run_check(kind, &request, &store).await?
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
