use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::diet_type::DietType;
use super::ids::PlanId;
use crate::date_key::DateKey;

/// A single meal inside a plan. Has no identity of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meal {
    pub name: String,
    pub calories: u32,
    #[serde(default)]
    pub details: String,
}

impl Meal {
    pub fn new(name: impl Into<String>, calories: u32) -> Self {
        Self {
            name: name.into(),
            calories,
            details: String::new(),
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }
}

impl fmt::Display for Meal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} kcal)", self.name, self.calories)?;
        if !self.details.is_empty() {
            write!(f, ": {}", self.details)?;
        }
        Ok(())
    }
}

/// A meal plan created by a dietitian for one client.
///
/// After creation the only mutations are date assignment and removal, which
/// touch `assigned_dates`, and deletion of the whole plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlan {
    #[serde(alias = "_id")]
    pub id: PlanId,
    pub plan_name: String,
    pub diet_type: DietType,
    pub calories: u32,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub meals: Vec<Meal>,
    #[serde(default)]
    pub assigned_dates: BTreeSet<DateKey>,
}

impl MealPlan {
    /// Case-insensitive name comparison used for the per-client uniqueness rule.
    pub fn has_name(&self, name: &str) -> bool {
        normalize_name(&self.plan_name) == normalize_name(name)
    }

    pub fn is_assigned(&self, key: DateKey) -> bool {
        self.assigned_dates.contains(&key)
    }

    /// Total calories of the listed meals, which may differ from the target.
    pub fn meal_calories(&self) -> u32 {
        self.meals.iter().map(|m| m.calories).sum()
    }
}

impl fmt::Display for MealPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.plan_name)?;
        writeln!(f, "{}", "=".repeat(self.plan_name.chars().count()))?;
        writeln!(f, "ID: {}", self.id)?;
        writeln!(f, "Diet: {}", self.diet_type)?;
        writeln!(f, "Calories: {} kcal", self.calories)?;

        if !self.meals.is_empty() {
            writeln!(f, "\nMeals:")?;
            for meal in &self.meals {
                writeln!(f, "  - {}", meal)?;
            }
        }

        if !self.notes.is_empty() {
            writeln!(f, "\nNotes: {}", self.notes)?;
        }
        if let Some(url) = &self.image_url {
            writeln!(f, "Image: {}", url)?;
        }

        Ok(())
    }
}

/// Everything needed to create a plan; the backend assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlanDraft {
    pub plan_name: String,
    pub diet_type: DietType,
    pub calories: u32,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub meals: Vec<Meal>,
}

impl MealPlanDraft {
    pub fn new(plan_name: impl Into<String>, diet_type: DietType, calories: u32) -> Self {
        Self {
            plan_name: plan_name.into(),
            diet_type,
            calories,
            notes: String::new(),
            image_url: None,
            meals: Vec::new(),
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    pub fn with_meal(mut self, meal: Meal) -> Self {
        self.meals.push(meal);
        self
    }
}

pub(crate) fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}
