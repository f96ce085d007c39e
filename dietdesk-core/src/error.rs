//! Error types for plan and calendar operations.

use thiserror::Error;

use crate::api::ApiError;
use crate::calendar::AssignmentMode;
use crate::date_key::DateKey;
use crate::models::{ClientId, PlanId};

/// Problems caught locally, before any remote call is made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No dates selected")]
    EmptyTargets,

    #[error("Start date {start} is after end date {end}")]
    InvertedRange { start: DateKey, end: DateKey },

    #[error("A plan named '{0}' already exists for this client")]
    DuplicateName(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Calendar is in {active} mode, not {requested} mode")]
    ModeMismatch {
        active: AssignmentMode,
        requested: AssignmentMode,
    },

    #[error("{0} already has a plan; remove it first")]
    DateAlreadyAssigned(DateKey),

    #[error("{0} is in the past")]
    PastDate(DateKey),

    #[error("{0} has no plan to remove")]
    NothingAssigned(DateKey),
}

/// The remote operation that failed, for user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ListClients,
    LoadPlans,
    CreatePlan,
    AssignDates,
    RemoveDates,
    DeletePlan,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::ListClients => write!(f, "load clients"),
            Operation::LoadPlans => write!(f, "load meal plans"),
            Operation::CreatePlan => write!(f, "create meal plan"),
            Operation::AssignDates => write!(f, "assign plan"),
            Operation::RemoveDates => write!(f, "remove plan dates"),
            Operation::DeletePlan => write!(f, "delete meal plan"),
        }
    }
}

/// Errors from the plan store and calendar controller.
#[derive(Error, Debug)]
pub enum PlanError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to {operation}: {source}")]
    Remote {
        operation: Operation,
        #[source]
        source: ApiError,
    },

    #[error("Meal plan not found: {0}")]
    PlanNotFound(PlanId),

    #[error("No plan is assigned on {0}")]
    NoPlanOnDate(DateKey),

    #[error("No client selected")]
    NoClientSelected,

    #[error("Client {0} is not loaded")]
    ClientNotLoaded(ClientId),

    #[error("Only dietitians can manage meal plans")]
    Forbidden,
}

impl PlanError {
    pub(crate) fn remote(operation: Operation) -> impl FnOnce(ApiError) -> PlanError {
        move |source| PlanError::Remote { operation, source }
    }

    /// True for errors raised before contacting the backend.
    pub fn is_validation(&self) -> bool {
        matches!(self, PlanError::Validation(_))
    }
}
