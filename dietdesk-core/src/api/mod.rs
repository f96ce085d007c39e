//! Backend access for clients and meal plans.
//!
//! [`PlanApi`] is the seam between the plan store and the REST backend.
//! [`HttpPlanApi`] talks to the real service; [`MemoryPlanApi`] keeps
//! everything in process.

mod envelope;
mod error;
mod http;
mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::date_key::DateKey;
use crate::models::{Client, ClientId, DietitianId, MealPlan, MealPlanDraft, PlanId};

pub use error::ApiError;
pub use http::HttpPlanApi;
pub use memory::{ApiCall, MemoryPlanApi};

/// Body of `POST /meal-plans`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlanRequest {
    #[serde(flatten)]
    pub draft: MealPlanDraft,
    pub dietitian_id: DietitianId,
    pub user_id: ClientId,
}

/// Body of `POST /meal-plans/{planId}/assign`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignDatesRequest {
    pub user_id: ClientId,
    pub dates: Vec<DateKey>,
}

/// Body of `DELETE /meal-plans/{planId}/dates`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveDatesRequest {
    pub user_id: ClientId,
    pub dietitian_id: DietitianId,
    pub dates: Vec<DateKey>,
}

/// Remote store of record for clients and meal plans.
///
/// Every method is a single request. Implementations must not retry.
#[async_trait]
pub trait PlanApi: Send + Sync {
    async fn list_clients(&self, dietitian: &DietitianId) -> Result<Vec<Client>, ApiError>;

    async fn list_plans(
        &self,
        dietitian: &DietitianId,
        client: &ClientId,
    ) -> Result<Vec<MealPlan>, ApiError>;

    async fn create_plan(&self, request: &CreatePlanRequest) -> Result<MealPlan, ApiError>;

    async fn assign_dates(
        &self,
        plan: &PlanId,
        request: &AssignDatesRequest,
    ) -> Result<(), ApiError>;

    async fn remove_dates(
        &self,
        plan: &PlanId,
        request: &RemoveDatesRequest,
    ) -> Result<(), ApiError>;

    async fn delete_plan(&self, plan: &PlanId) -> Result<(), ApiError>;
}
