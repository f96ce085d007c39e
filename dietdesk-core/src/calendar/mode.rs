use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::date_key::DateKey;

/// How a target set of days is picked. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentMode {
    /// The one day clicked.
    #[default]
    Single,
    /// Days toggled into a selection, then applied together.
    Multiple,
    /// Every day of the displayed month.
    Month,
    /// Every day between a start and end date, inclusive.
    Custom,
}

impl fmt::Display for AssignmentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignmentMode::Single => write!(f, "single"),
            AssignmentMode::Multiple => write!(f, "multiple"),
            AssignmentMode::Month => write!(f, "month"),
            AssignmentMode::Custom => write!(f, "custom"),
        }
    }
}

impl FromStr for AssignmentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single" => Ok(AssignmentMode::Single),
            "multiple" => Ok(AssignmentMode::Multiple),
            "month" => Ok(AssignmentMode::Month),
            "custom" => Ok(AssignmentMode::Custom),
            _ => Err(format!(
                "Invalid mode '{}'. Valid options: single, multiple, month, custom",
                s
            )),
        }
    }
}

/// Whether calendar picks add plans to days or clear them ("delete mode").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Intent {
    #[default]
    Assign,
    Remove,
}

/// User input to resolve into target days. Each variant belongs to one mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetRequest {
    Day(DateKey),
    Selection,
    DisplayedMonth,
    Range { start: DateKey, end: DateKey },
}

impl TargetRequest {
    pub fn mode(&self) -> AssignmentMode {
        match self {
            TargetRequest::Day(_) => AssignmentMode::Single,
            TargetRequest::Selection => AssignmentMode::Multiple,
            TargetRequest::DisplayedMonth => AssignmentMode::Month,
            TargetRequest::Range { .. } => AssignmentMode::Custom,
        }
    }
}
