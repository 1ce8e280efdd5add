use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tsr_cli::commands::{check, projects, reconcile, tasks, users};
use tsr_cli::{Cli, Commands, Config};

/// Load configuration and apply credential overrides from the command line.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config =
        Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(username) = &cli.username {
        config.username = Some(username.clone());
    }
    if let Some(password) = &cli.password {
        config.password = Some(password.clone());
    }
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
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let mut stdout = std::io::stdout();

    match &cli.command {
        Some(Commands::Reconcile(args)) => {
            let config = load_config(&cli)?;
            reconcile::run(&mut stdout, args, &config)?;
        }
        Some(Commands::Check(args)) => {
            check::run(&mut stdout, args)?;
        }
        Some(Commands::Projects) => {
            let config = load_config(&cli)?;
            projects::run(&mut stdout, &config)?;
        }
        Some(Commands::Tasks(args)) => {
            let config = load_config(&cli)?;
            tasks::run(&mut stdout, args, &config)?;
        }
        Some(Commands::Users) => {
            let config = load_config(&cli)?;
            users::run(&mut stdout, &config)?;
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
