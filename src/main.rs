use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use pgfixture::config::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod exit_codes;

/// Version from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "pgfixture")]
#[command(version = VERSION)]
#[command(about = "Test database fixtures: schema sync, reset, and app lifecycle", long_about = None)]
#[command(subcommand_required = true, arg_required_else_help = true)]
struct Cli {
    /// Dotenv file to seed the environment from (default: ./.env if present)
    #[arg(long = "env-file", global = true)]
    env_file: Option<PathBuf>,

    /// Minimal output (errors only)
    #[arg(long, global = true)]
    quiet: bool,

    /// Show statements and tool output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the sequences and base tables a reset would touch
    Inspect {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Empty every table and restart every sequence
    Reset {
        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Apply the schema file with the schema tool
    Sync,
    /// Run the application until Ctrl+C
    Serve,
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "pgfixture=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match Config::load(cli.env_file.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {e:#}", "Error:".red());
            std::process::exit(exit_codes::CONFIG_ERROR);
        }
    };

    let failure_code = match cli.command {
        Commands::Sync => exit_codes::SCHEMA_SYNC_FAILURE,
        _ => exit_codes::OPERATIONAL_FAILURE,
    };

    if let Err(e) = run(cli, &config).await {
        eprintln!("{} {e:#}", "Error:".red());
        std::process::exit(failure_code);
    }
}

async fn run(cli: Cli, config: &Config) -> Result<()> {
    match cli.command {
        Commands::Inspect { json } => commands::inspect(config, json).await,
        Commands::Reset { yes } => commands::reset(config, yes, cli.quiet).await,
        Commands::Sync => commands::sync(config, cli.quiet, cli.verbose),
        Commands::Serve => commands::serve(config, cli.quiet).await,
    }
}
