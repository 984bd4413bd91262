//! CLI entrypoint for vaultpilot
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

mod chat;
mod cli;
mod render;
mod wiring;

use anyhow::{Result, anyhow, bail};
use chat::ChatRepl;
use clap::Parser;
use cli::{Cli, Command};
use colored::Colorize;
use render::ConsoleFormatter;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vaultpilot_infrastructure::{ConfigIssue, ConfigLoader};
use wiring::Pipeline;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level; RUST_LOG wins when set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    info!("Starting vaultpilot");

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref())
            .map_err(|e| anyhow!("Failed to load configuration: {e}"))?
    };
    let issues = config.validate();

    let command = cli.resolved_command();
    if command == Command::Config {
        ConfigLoader::print_config_sources(cli.config.as_deref());
        print_issues(&issues);
        if issues.is_empty() {
            println!("{}", "Configuration OK".green());
        }
        return Ok(());
    }

    print_issues(&issues);
    if issues.iter().any(ConfigIssue::is_error) {
        bail!("Invalid configuration; run `vaultpilot config` for details");
    }

    // === Dependency Injection ===
    let pipeline = Pipeline::build(&config)?;

    match command {
        Command::Chat { conversation } => {
            ChatRepl::new(&pipeline, conversation).run().await?;
        }
        Command::Tools => {
            let snapshot = pipeline.catalog.get_tools(&CancellationToken::new()).await?;
            print!("{}", ConsoleFormatter::catalog(&snapshot));
        }
        Command::Resolve { candidate } => {
            let path = pipeline
                .resolver
                .resolve(&candidate, &CancellationToken::new())
                .await;
            println!("{path}");
        }
        Command::Config => {}
    }

    Ok(())
}

fn print_issues(issues: &[ConfigIssue]) {
    for issue in issues {
        if issue.is_error() {
            eprintln!("{} {}", "error:".red().bold(), issue.message());
        } else {
            eprintln!("{} {}", "warning:".yellow().bold(), issue.message());
        }
    }
}
