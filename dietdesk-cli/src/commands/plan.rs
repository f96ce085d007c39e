use clap::{Args, Subcommand};
use std::error::Error;

use dietdesk_core::{ClientId, DietType, HttpPlanApi, Meal, MealPlan, MealPlanDraft, PlanStore};

use super::{confirm, open_store, runtime, OutputFormat};
use crate::config::Config;

#[derive(Args)]
pub struct PlanCommand {
    #[command(subcommand)]
    pub command: PlanSubcommand,
}

#[derive(Subcommand)]
pub enum PlanSubcommand {
    /// List a client's meal plans
    List {
        /// Client ID
        #[arg(long)]
        client: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show meal plan details
    Show {
        /// Client ID
        #[arg(long)]
        client: String,

        /// Meal plan ID or name
        plan: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Create a meal plan for a client
    Create {
        /// Client ID
        #[arg(long)]
        client: String,

        /// Plan name, unique per client (case-insensitive)
        #[arg(long)]
        name: String,

        /// Diet type (balanced, keto, vegan, vegetarian, paleo, ...)
        #[arg(long = "diet-type", value_name = "TYPE")]
        diet_type: String,

        /// Daily calorie target
        #[arg(long)]
        calories: u32,

        /// Notes for the client
        #[arg(long)]
        notes: Option<String>,

        /// Image URL
        #[arg(long = "image-url")]
        image_url: Option<String>,

        /// Meal as "name:calories[:details]" (can be repeated)
        #[arg(long = "meal", value_name = "MEAL")]
        meals: Vec<String>,
    },

    /// Delete a meal plan and all of its scheduled days
    Delete {
        /// Client ID
        #[arg(long)]
        client: String,

        /// Meal plan ID or name
        plan: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

impl PlanCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn Error>> {
        let rt = runtime()?;
        rt.block_on(self.execute(config))
    }

    async fn execute(&self, config: &Config) -> Result<(), Box<dyn Error>> {
        let mut store = open_store(config)?;

        match &self.command {
            PlanSubcommand::List { client, format } => {
                let plans = store.load_client(&ClientId::from(client.as_str())).await?;

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(plans)?);
                    }
                    OutputFormat::Text => {
                        if plans.is_empty() {
                            println!("No meal plans found");
                            return Ok(());
                        }
                        for plan in plans {
                            println!(
                                "  {:24} {:14} {:>5} kcal  {} day(s)  [{}]",
                                plan.plan_name,
                                plan.diet_type,
                                plan.calories,
                                plan.assigned_dates.len(),
                                plan.id
                            );
                        }
                        println!("\nTotal: {} meal plan(s)", plans.len());
                    }
                }
                Ok(())
            }

            PlanSubcommand::Show {
                client,
                plan,
                format,
            } => {
                store.load_client(&ClientId::from(client.as_str())).await?;
                let found = find_plan(&store, plan)?;

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(found)?);
                    }
                    OutputFormat::Text => {
                        print!("{}", found);
                        if found.assigned_dates.is_empty() {
                            println!("\nNot scheduled");
                        } else {
                            let days: Vec<String> =
                                found.assigned_dates.iter().map(ToString::to_string).collect();
                            println!("\nScheduled: {}", days.join(", "));
                        }
                    }
                }
                Ok(())
            }

            PlanSubcommand::Create {
                client,
                name,
                diet_type,
                calories,
                notes,
                image_url,
                meals,
            } => {
                let diet_type: DietType = diet_type.parse()?;
                let mut draft = MealPlanDraft::new(name.as_str(), diet_type, *calories);
                if let Some(notes) = notes {
                    draft = draft.with_notes(notes.as_str());
                }
                if let Some(url) = image_url {
                    draft = draft.with_image_url(url.as_str());
                }
                for meal in meals {
                    draft = draft.with_meal(parse_meal(meal)?);
                }

                let client = ClientId::from(client.as_str());
                store.load_client(&client).await?;
                let plan = store.create_plan(&client, draft).await?;

                println!("Created meal plan: {} ({})", plan.plan_name, plan.id);
                Ok(())
            }

            PlanSubcommand::Delete {
                client,
                plan,
                force,
            } => {
                store.load_client(&ClientId::from(client.as_str())).await?;
                let found = find_plan(&store, plan)?;
                let id = found.id.clone();

                if !force {
                    let prompt = format!(
                        "Delete meal plan '{}' scheduled on {} day(s)?",
                        found.plan_name,
                        found.assigned_dates.len()
                    );
                    if !confirm(&prompt)? {
                        println!("Deletion cancelled.");
                        return Ok(());
                    }
                }

                let deleted = store.delete_plan(&id).await?;
                println!("Deleted meal plan: {}", deleted.plan_name);
                Ok(())
            }
        }
    }
}

pub(crate) fn find_plan<'a>(
    store: &'a PlanStore<HttpPlanApi>,
    plan: &str,
) -> Result<&'a MealPlan, String> {
    store
        .find(plan)
        .ok_or_else(|| format!("Meal plan not found: {}", plan))
}

/// Parses "name:calories[:details]"; details may contain further colons.
fn parse_meal(s: &str) -> Result<Meal, String> {
    let mut parts = s.splitn(3, ':');
    let name = parts.next().map(str::trim).unwrap_or_default();
    let calories = parts.next().map(str::trim);

    if name.is_empty() {
        return Err(format!("Invalid meal '{}'. Use name:calories[:details]", s));
    }
    let calories: u32 = calories
        .and_then(|c| c.parse().ok())
        .ok_or_else(|| format!("Invalid calories in meal '{}'. Use name:calories[:details]", s))?;

    let meal = Meal::new(name, calories);
    Ok(match parts.next().map(str::trim) {
        Some(details) if !details.is_empty() => meal.with_details(details),
        _ => meal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_meal() {
        let meal = parse_meal("Oats:350").unwrap();
        assert_eq!(meal.name, "Oats");
        assert_eq!(meal.calories, 350);
        assert!(meal.details.is_empty());
    }

    #[test]
    fn test_parse_meal_with_details() {
        let meal = parse_meal("Salad : 420 : dressing on the side: lemon").unwrap();
        assert_eq!(meal.name, "Salad");
        assert_eq!(meal.calories, 420);
        assert_eq!(meal.details, "dressing on the side: lemon");
    }

    #[test]
    fn test_parse_meal_errors() {
        assert!(parse_meal("Oats").is_err());
        assert!(parse_meal("Oats:lots").is_err());
        assert!(parse_meal(":300").is_err());
    }
}
