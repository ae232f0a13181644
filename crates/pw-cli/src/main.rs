use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use pw_cli::commands::{normalize, report};
use pw_cli::{Cli, Commands, Config};

fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // stdout is reserved for command output
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let today = Local::now().date_naive();
    let mut stdout = std::io::stdout().lock();

    match &cli.command {
        Some(Commands::Report {
            history,
            metadata,
            period,
            json,
        }) => {
            let config = load_config(cli.config.as_deref())?;
            report::run(
                &mut stdout,
                &config,
                history,
                metadata.as_deref(),
                period.resolve(today),
                *json,
            )?;
        }
        Some(Commands::Normalize { history, period }) => {
            let config = load_config(cli.config.as_deref())?;
            normalize::run(&mut stdout, &config, history, period.resolve(today))?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
