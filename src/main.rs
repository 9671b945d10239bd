#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use pcmk_agents::agent::{AgentContext, StonithdCache};
use pcmk_agents::cli::{Cli, Commands};
use pcmk_agents::commands;
use pcmk_agents::config::Config;
use pcmk_agents::error::PcmkError;
use pcmk_agents::runner::SystemRunner;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load(cli.config.as_deref())
        .context("Failed to load configuration")?
        .with_cli_overrides(&cli);
    config.validate().context("Invalid command line options")?;

    if let Err(e) = run(&cli, &config) {
        match e {
            // Reports carry their own severity prefix
            PcmkError::Reported(_) => eprintln!("{}", e),
            _ => eprintln!("Error: {}", e),
        }
        std::process::exit(1);
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "debug" } else { "warn" })
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn run(cli: &Cli, config: &Config) -> pcmk_agents::error::Result<()> {
    let runner = SystemRunner::new().with_timeout(config.runner.timeout());
    let stonithd = StonithdCache::new();
    let ctx = AgentContext::new(&runner, &config.tools, &stonithd);

    match &cli.command {
        Commands::Standards { with_providers } => {
            commands::catalog::standards(ctx, *with_providers)
        }
        Commands::Providers => commands::catalog::providers(ctx),
        Commands::Agents { standard_provider } => {
            commands::catalog::agents(ctx, standard_provider.as_deref())
        }
        Commands::StonithAgents => commands::catalog::stonith_agents(ctx),
        Commands::Describe {
            name,
            stonith,
            json,
        } => commands::describe::execute(ctx, name, *stonith, *json)?,
        Commands::Validate {
            name,
            params,
            stonith,
            force,
        } => {
            if !commands::validate::execute(ctx, name, params, *stonith, *force)? {
                std::process::exit(1);
            }
        }
        Commands::Config { command } => {
            commands::config::execute(command, config, cli.config.as_deref())?
        }
    }

    Ok(())
}
