mod client;
mod diet_type;
mod ids;
mod meal_plan;

pub use client::Client;
pub use diet_type::DietType;
pub use ids::{ClientId, DietitianId, PlanId};
pub use meal_plan::{Meal, MealPlan, MealPlanDraft};
