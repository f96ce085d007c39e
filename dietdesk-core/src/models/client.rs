use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::ClientId;

/// A person managed by the dietitian. Read-only on this side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    #[serde(alias = "_id")]
    pub id: ClientId,
    pub name: String,
    #[serde(default)]
    pub goal: Option<String>,
    #[serde(default)]
    pub recent_plan: Option<String>,
}

impl fmt::Display for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)?;
        if let Some(goal) = &self.goal {
            write!(f, " - goal: {}", goal)?;
        }
        Ok(())
    }
}
