use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed diet categories a plan can be filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DietType {
    Balanced,
    Keto,
    Vegan,
    Vegetarian,
    Paleo,
    Mediterranean,
    LowCarb,
    HighProtein,
    GlutenFree,
}

impl DietType {
    pub const ALL: [DietType; 9] = [
        DietType::Balanced,
        DietType::Keto,
        DietType::Vegan,
        DietType::Vegetarian,
        DietType::Paleo,
        DietType::Mediterranean,
        DietType::LowCarb,
        DietType::HighProtein,
        DietType::GlutenFree,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DietType::Balanced => "balanced",
            DietType::Keto => "keto",
            DietType::Vegan => "vegan",
            DietType::Vegetarian => "vegetarian",
            DietType::Paleo => "paleo",
            DietType::Mediterranean => "mediterranean",
            DietType::LowCarb => "low-carb",
            DietType::HighProtein => "high-protein",
            DietType::GlutenFree => "gluten-free",
        }
    }
}

impl fmt::Display for DietType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for DietType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '_'], "-");
        DietType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| {
                let options: Vec<&str> = DietType::ALL.iter().map(|t| t.as_str()).collect();
                format!(
                    "Invalid diet type '{}'. Valid options: {}",
                    s,
                    options.join(", ")
                )
            })
    }
}
