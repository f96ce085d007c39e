use clap::{Args, Subcommand};
use std::error::Error;

use super::{open_store, runtime, OutputFormat};
use crate::config::Config;

#[derive(Args)]
pub struct ClientsCommand {
    #[command(subcommand)]
    pub command: ClientsSubcommand,
}

#[derive(Subcommand)]
pub enum ClientsSubcommand {
    /// List the clients you manage
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl ClientsCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn Error>> {
        let rt = runtime()?;
        match &self.command {
            ClientsSubcommand::List { format } => rt.block_on(list(config, format)),
        }
    }
}

async fn list(config: &Config, format: &OutputFormat) -> Result<(), Box<dyn Error>> {
    let store = open_store(config)?;
    let clients = store.list_clients().await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&clients)?);
        }
        OutputFormat::Text => {
            if clients.is_empty() {
                println!("No clients found");
                return Ok(());
            }
            for client in &clients {
                println!("  {}", client);
                if let Some(plan) = &client.recent_plan {
                    println!("      recent plan: {}", plan);
                }
            }
            println!("\nTotal: {} client(s)", clients.len());
        }
    }
    Ok(())
}
