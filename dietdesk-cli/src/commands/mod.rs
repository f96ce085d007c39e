mod calendar;
mod clients;
mod config_cmd;
mod plan;

pub use calendar::CalendarCommand;
pub use clients::ClientsCommand;
pub use config_cmd::ConfigCommand;
pub use plan::PlanCommand;

use clap::ValueEnum;
use std::error::Error;
use std::io::{self, Write};

use dietdesk_core::{HttpPlanApi, PlanStore};

use crate::config::Config;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn runtime() -> Result<tokio::runtime::Runtime, Box<dyn Error>> {
    tokio::runtime::Runtime::new().map_err(|e| format!("Runtime error: {}", e).into())
}

/// Plan store talking to the configured backend as the configured dietitian.
fn open_store(config: &Config) -> Result<PlanStore<HttpPlanApi>, Box<dyn Error>> {
    let session = config.session()?;
    tracing::debug!(
        api_url = %session.api_url(),
        dietitian = %session.user().name,
        "opening plan store"
    );
    let api = HttpPlanApi::with_timeout(&session, config.request_timeout())?;
    Ok(PlanStore::new(api, &session)?)
}

fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}
