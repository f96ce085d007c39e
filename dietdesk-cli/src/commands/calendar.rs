use clap::{Args, Subcommand};
use std::collections::BTreeSet;
use std::error::Error;
use std::time::Duration;

use dietdesk_core::{
    AssignmentMode, CalendarController, CalendarMonth, ClientId, DateKey, HttpPlanApi, Intent,
    PlanApi, PlanDiff, PlanId, PlanStore, RefreshSchedule, TargetRequest,
};

use super::plan::find_plan;
use super::{open_store, runtime};
use crate::config::Config;

#[derive(Args)]
pub struct CalendarCommand {
    #[command(subcommand)]
    pub command: CalendarSubcommand,
}

#[derive(Subcommand)]
pub enum CalendarSubcommand {
    /// Show a client's month with scheduled plans
    Show {
        /// Client ID
        #[arg(long)]
        client: String,

        /// Month (YYYY-MM), defaults to the current month
        #[arg(long)]
        month: Option<String>,
    },

    /// Put a plan on one or more days
    Assign {
        /// Client ID
        #[arg(long)]
        client: String,

        /// Meal plan ID or name
        #[arg(long)]
        plan: String,

        #[command(subcommand)]
        target: Target,
    },

    /// Clear whatever plan is on one or more days
    Remove {
        /// Client ID
        #[arg(long)]
        client: String,

        #[command(subcommand)]
        target: Target,
    },

    /// Show the plan scheduled on a day
    View {
        /// Client ID
        #[arg(long)]
        client: String,

        /// Date (YYYY-MM-DD)
        date: String,
    },

    /// Follow a client's calendar and report remote changes until Ctrl-C
    Watch {
        /// Client ID
        #[arg(long)]
        client: String,

        /// Seconds between refreshes (defaults to refresh_interval_secs)
        #[arg(long)]
        interval: Option<u64>,
    },
}

/// Which days an assign or remove applies to.
#[derive(Subcommand)]
pub enum Target {
    /// One day
    Single {
        /// Date (YYYY-MM-DD)
        date: String,
    },

    /// Several days at once
    Multiple {
        /// Dates (YYYY-MM-DD)
        #[arg(required = true, num_args = 1..)]
        dates: Vec<String>,
    },

    /// Every day of a month, past days included
    Month {
        /// Month (YYYY-MM), defaults to the current month
        #[arg(long)]
        month: Option<String>,
    },

    /// Every day from start to end, inclusive
    Custom {
        /// Start date (YYYY-MM-DD)
        start: String,

        /// End date (YYYY-MM-DD)
        end: String,
    },
}

impl CalendarCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn Error>> {
        let rt = runtime()?;
        rt.block_on(self.execute(config))
    }

    async fn execute(&self, config: &Config) -> Result<(), Box<dyn Error>> {
        match &self.command {
            CalendarSubcommand::Show { client, month } => {
                let mut cal = open(config, client).await?;
                if let Some(month) = month {
                    cal.show_month(month.parse()?);
                }
                print!("{}", cal.month_view());
                Ok(())
            }

            CalendarSubcommand::Assign {
                client,
                plan,
                target,
            } => {
                let mut cal = open(config, client).await?;
                let found = find_plan(cal.store(), plan)?;
                let (plan_id, plan_name) = (found.id.clone(), found.plan_name.clone());

                cal.set_intent(Intent::Assign);
                let (request, _) = select_targets(&mut cal, target)?;
                let outcome = cal.assign(&plan_id, request).await?;

                println!(
                    "Assigned '{}' to {} day(s)",
                    plan_name,
                    outcome.dates.len()
                );
                for (owner, days) in &outcome.released {
                    let name = cal
                        .store()
                        .plan(owner)
                        .map(|p| p.plan_name.as_str())
                        .unwrap_or(owner.as_str());
                    println!("  replaced '{}' on {} day(s)", name, days.len());
                }
                if let Some(first) = outcome.dates.first() {
                    cal.show_month(first.month());
                }
                println!();
                print!("{}", cal.month_view());
                Ok(())
            }

            CalendarSubcommand::Remove { client, target } => {
                let mut cal = open(config, client).await?;

                cal.set_intent(Intent::Remove);
                let (request, free) = select_targets(&mut cal, target)?;
                if request == TargetRequest::Selection && cal.selection().is_empty() {
                    println!("No plans on the selected day(s)");
                    return Ok(());
                }
                let outcome = cal.remove(request).await?;

                if outcome.removed.is_empty() {
                    println!("No plans on the selected day(s)");
                    return Ok(());
                }
                println!("Cleared {} day(s)", outcome.removed_count());
                let skipped = outcome.skipped.len() + free.len();
                if skipped > 0 {
                    println!("  {} day(s) had no plan", skipped);
                }
                Ok(())
            }

            CalendarSubcommand::View { client, date } => {
                let cal = open(config, client).await?;
                let key: DateKey = date.parse()?;
                print!("{}", cal.view_plan(key)?);
                Ok(())
            }

            CalendarSubcommand::Watch { client, interval } => {
                let mut cal = open(config, client).await?;
                let period = interval
                    .map(|secs| Duration::from_secs(secs.max(1)))
                    .unwrap_or_else(|| config.refresh_interval());

                print!("{}", cal.month_view());
                println!(
                    "\nWatching for changes every {}s (Ctrl-C to stop)...",
                    period.as_secs()
                );

                let shutdown = async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        tracing::warn!("Could not listen for Ctrl-C, stopping: {}", e);
                    }
                };
                let stats = RefreshSchedule::new(period)
                    .run(cal.store_mut(), print_changes, shutdown)
                    .await;

                println!(
                    "\nStopped after {} refresh(es): {} with changes, {} failed",
                    stats.refreshes, stats.changes, stats.failures
                );
                Ok(())
            }
        }
    }
}

async fn open(
    config: &Config,
    client: &str,
) -> Result<CalendarController<HttpPlanApi>, Box<dyn Error>> {
    let mut cal = CalendarController::new(open_store(config)?);
    cal.select_client(&ClientId::from(client)).await?;
    Ok(cal)
}

/// Puts the controller in the mode `target` needs and returns the request.
///
/// When removing, listed days without a plan are left out of the selection
/// and returned separately.
fn select_targets<A: PlanApi>(
    cal: &mut CalendarController<A>,
    target: &Target,
) -> Result<(TargetRequest, BTreeSet<DateKey>), Box<dyn Error>> {
    let mut free = BTreeSet::new();
    let request = match target {
        Target::Single { date } => {
            cal.set_mode(AssignmentMode::Single);
            TargetRequest::Day(date.parse()?)
        }
        Target::Multiple { dates } => {
            cal.set_mode(AssignmentMode::Multiple);
            let keys = dates
                .iter()
                .map(|d| d.parse::<DateKey>())
                .collect::<Result<BTreeSet<_>, _>>()?;
            for key in keys {
                if cal.intent() == Intent::Remove && cal.store().owner_of(key).is_none() {
                    tracing::debug!(date = %key, "no plan on day, skipping removal");
                    free.insert(key);
                    continue;
                }
                cal.toggle(key)?;
            }
            TargetRequest::Selection
        }
        Target::Month { month } => {
            cal.set_mode(AssignmentMode::Month);
            let month = match month {
                Some(m) => m.parse()?,
                None => CalendarMonth::current(),
            };
            cal.show_month(month);
            TargetRequest::DisplayedMonth
        }
        Target::Custom { start, end } => {
            cal.set_mode(AssignmentMode::Custom);
            TargetRequest::Range {
                start: start.parse()?,
                end: end.parse()?,
            }
        }
    };
    Ok((request, free))
}

fn print_changes(diff: &PlanDiff, store: &PlanStore<HttpPlanApi>) {
    let name = |id: &PlanId| {
        store
            .plan(id)
            .map(|p| p.plan_name.clone())
            .unwrap_or_else(|| id.to_string())
    };

    println!("\nPlans changed: {}", diff);
    for id in &diff.added {
        println!("  new plan '{}'", name(id));
    }
    for id in &diff.removed {
        println!("  plan {} deleted", id);
    }
    for (id, days) in &diff.gained {
        println!("  + '{}': {}", name(id), join(days));
    }
    for (id, days) in &diff.lost {
        println!("  - '{}': {}", name(id), join(days));
    }
}

fn join(days: &BTreeSet<DateKey>) -> String {
    days.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
