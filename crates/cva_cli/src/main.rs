//! CVA request client CLI
//!
//! Operational entry point: loads configuration, initialises tracing and
//! dispatches to the command implementations in `cva_cli::commands`.

use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use cva_cli::commands;
use cva_client::config::{build_config, CliArgs as ConfigCliArgs};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Counterparty valuation adjustment requests
#[derive(Parser, Debug)]
#[command(name = "cva")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path (TOML format)
    #[arg(short, long, global = true, value_name = "FILE", env = "CVA_CONFIG")]
    config: Option<PathBuf>,

    /// Platform base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Bearer token
    #[arg(long, global = true)]
    api_token: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Maximum polls per job phase
    #[arg(long, global = true)]
    max_attempts: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a CVA calculation and write the result table as CSV
    Calculate {
        /// Job file (JSON)
        #[arg(short, long)]
        job: PathBuf,

        /// Output file; stdout if omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the request document of a job without sending it
    Assemble {
        /// Job file (JSON)
        #[arg(short, long)]
        job: PathBuf,

        /// Output file; stdout if omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List portfolios, or load one into a job file
    Portfolio {
        /// Portfolio scope; the authenticated user's scope if omitted
        #[arg(long)]
        scope: Option<String>,

        /// Portfolio code; lists the scope's portfolios if omitted
        #[arg(long)]
        code: Option<String>,

        /// Only include transactions up to this date (YYYY-MM-DD)
        #[arg(long)]
        effective_date: Option<NaiveDate>,

        /// Job template (JSON with pricingParameters, entity, enrichments)
        #[arg(short, long)]
        template: Option<PathBuf>,

        /// Output file; stdout if omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Rebuild index membership history from joiner/leaver events
    Constituents {
        /// Date of the initial constituent list (YYYY-MM-DD)
        #[arg(short, long)]
        start: NaiveDate,

        /// Initial constituent list, one code per line
        #[arg(short, long)]
        initial: PathBuf,

        /// Change table (JSON with headers and data)
        #[arg(long)]
        changes: PathBuf,

        /// Only print the membership effective on this date
        #[arg(long)]
        as_of: Option<NaiveDate>,

        /// Output file; stdout if omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl From<&Cli> for ConfigCliArgs {
    fn from(cli: &Cli) -> Self {
        ConfigCliArgs {
            config_file: cli.config.clone(),
            base_url: cli.base_url.clone(),
            api_token: cli.api_token.clone(),
            log_level: cli.log_level.clone(),
            max_attempts: cli.max_attempts,
        }
    }
}

fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = build_config(&ConfigCliArgs::from(&cli)).context("loading configuration")?;

    init_tracing(config.log_level.as_filter_str());
    tracing::debug!(
        version = cva_cli::VERSION,
        base_url = %config.base_url,
        endpoint = %config.cva_endpoint,
        max_attempts = config.poll.max_attempts,
        "Configuration loaded"
    );

    match cli.command {
        Commands::Calculate { job, output } => {
            commands::calculate::run(&config, &job, output.as_deref()).await?
        }
        Commands::Assemble { job, output } => commands::assemble::run(&job, output.as_deref())?,
        Commands::Portfolio {
            scope,
            code,
            effective_date,
            template,
            output,
        } => {
            commands::portfolio::run(
                &config,
                scope,
                code,
                effective_date,
                template.as_deref(),
                output.as_deref(),
            )
            .await?
        }
        Commands::Constituents {
            start,
            initial,
            changes,
            as_of,
            output,
        } => commands::constituents::run(start, &initial, &changes, as_of, output.as_deref())?,
    }

    Ok(())
}
