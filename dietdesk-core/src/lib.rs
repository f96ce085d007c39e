//! Dietdesk Core Library
//!
//! Meal plan models, the REST client, and the calendar that assigns plans
//! to a client's days.

pub mod api;
pub mod calendar;
pub mod date_key;
pub mod error;
pub mod models;
pub mod refresh;
pub mod session;
pub mod store;

pub use api::{ApiError, HttpPlanApi, MemoryPlanApi, PlanApi};
pub use calendar::{
    AssignOutcome, AssignmentMode, CalendarCell, CalendarController, CellAction, CellState,
    Intent, MonthView, PlanDetail, RemovalOutcome, TargetRequest,
};
pub use date_key::{keys_between, CalendarMonth, DateKey, DateKeyError};
pub use error::{Operation, PlanError, ValidationError};
pub use models::{Client, ClientId, DietType, DietitianId, Meal, MealPlan, MealPlanDraft, PlanId};
pub use refresh::{PlanDiff, RefreshSchedule, RefreshStats};
pub use session::{Role, Session, SessionUser};
pub use store::PlanStore;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
