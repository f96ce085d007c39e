use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use commands::{CalendarCommand, ClientsCommand, ConfigCommand, PlanCommand};
use config::Config;

#[derive(Parser)]
#[command(name = "diet")]
#[command(version)]
#[command(about = "Schedule clients' meal plans on a calendar", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Log remote calls and updates to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List clients
    Clients(ClientsCommand),

    /// Manage a client's meal plans
    Plan(PlanCommand),

    /// Assign and remove plans on a client's calendar
    Calendar(CalendarCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cli_config_path = cli.config.clone();
    let config = Config::load(cli.config)?;

    match &cli.command {
        Some(Commands::Clients(cmd)) => cmd.run(&config)?,
        Some(Commands::Plan(cmd)) => cmd.run(&config)?,
        Some(Commands::Calendar(cmd)) => cmd.run(&config)?,
        Some(Commands::Config(cmd)) => cmd.run(&config, cli_config_path)?,
        None => println!("Use --help to see available commands"),
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("dietdesk_core=debug,dietdesk_cli=debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "dietdesk_core=warn,dietdesk_cli=warn".into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
