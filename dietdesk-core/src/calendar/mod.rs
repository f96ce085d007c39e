//! Calendar-driven plan assignment.
//!
//! The [`CalendarController`] turns a mode plus user input into a set of
//! [`DateKey`](crate::DateKey)s and drives the plan store with it. Cell state
//! for rendering is derived from the store on demand.

mod cell;
mod controller;
mod mode;

pub use cell::{CalendarCell, CellState, MonthView, PlanDetail};
pub use controller::{AssignOutcome, CalendarController, CellAction, RemovalOutcome};
pub use mode::{AssignmentMode, Intent, TargetRequest};
