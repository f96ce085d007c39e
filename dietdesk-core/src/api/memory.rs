//! In-process backend.
//!
//! Behaves like the REST service as observed from the client: date
//! assignment is a plain union, so nothing here stops two plans from claiming
//! the same day. Every call is recorded, and the next call can be made to
//! fail, which is what the store and calendar tests lean on.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::{ApiError, AssignDatesRequest, CreatePlanRequest, PlanApi, RemoveDatesRequest};
use crate::date_key::DateKey;
use crate::models::{Client, ClientId, DietitianId, MealPlan, PlanId};

/// A request as seen by [`MemoryPlanApi`].
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    ListClients(DietitianId),
    ListPlans(ClientId),
    CreatePlan(String),
    AssignDates(PlanId, BTreeSet<DateKey>),
    RemoveDates(PlanId, BTreeSet<DateKey>),
    DeletePlan(PlanId),
}

#[derive(Debug, Default)]
struct State {
    clients: Vec<Client>,
    plans: BTreeMap<ClientId, Vec<MealPlan>>,
    calls: Vec<ApiCall>,
    fail_next: Option<String>,
    next_id: u64,
}

/// Shared, cloneable in-memory [`PlanApi`].
#[derive(Debug, Clone, Default)]
pub struct MemoryPlanApi {
    state: Arc<Mutex<State>>,
}

impl MemoryPlanApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(self, client: Client) -> Self {
        self.state().clients.push(client);
        self
    }

    /// Seeds a plan for `client` as if it had been created earlier.
    pub fn with_plan(self, client: &ClientId, plan: MealPlan) -> Self {
        self.state()
            .plans
            .entry(client.clone())
            .or_default()
            .push(plan);
        self
    }

    /// Makes the next request fail with `success: false` and `message`.
    pub fn fail_next(&self, message: impl Into<String>) {
        self.state().fail_next = Some(message.into());
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// The backend's copy of a plan.
    pub fn stored_plan(&self, client: &ClientId, plan: &PlanId) -> Option<MealPlan> {
        self.state()
            .plans
            .get(client)
            .and_then(|plans| plans.iter().find(|p| &p.id == plan))
            .cloned()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records `call` and consumes a pending failure, if any.
    fn begin(&self, call: ApiCall) -> Result<MutexGuard<'_, State>, ApiError> {
        let mut state = self.state();
        state.calls.push(call);
        match state.fail_next.take() {
            Some(message) => Err(ApiError::Rejected { message }),
            None => Ok(state),
        }
    }
}

fn find_plan<'a>(
    state: &'a mut State,
    client: &ClientId,
    plan: &PlanId,
) -> Result<&'a mut MealPlan, ApiError> {
    state
        .plans
        .get_mut(client)
        .and_then(|plans| plans.iter_mut().find(|p| &p.id == plan))
        .ok_or_else(|| ApiError::Rejected {
            message: "Meal plan not found".to_string(),
        })
}

#[async_trait]
impl PlanApi for MemoryPlanApi {
    async fn list_clients(&self, dietitian: &DietitianId) -> Result<Vec<Client>, ApiError> {
        let state = self.begin(ApiCall::ListClients(dietitian.clone()))?;
        Ok(state.clients.clone())
    }

    async fn list_plans(
        &self,
        _dietitian: &DietitianId,
        client: &ClientId,
    ) -> Result<Vec<MealPlan>, ApiError> {
        let state = self.begin(ApiCall::ListPlans(client.clone()))?;
        Ok(state.plans.get(client).cloned().unwrap_or_default())
    }

    async fn create_plan(&self, request: &CreatePlanRequest) -> Result<MealPlan, ApiError> {
        let mut state = self.begin(ApiCall::CreatePlan(request.draft.plan_name.clone()))?;
        state.next_id += 1;
        let draft = request.draft.clone();
        let plan = MealPlan {
            id: PlanId::new(format!("plan-{}", state.next_id)),
            plan_name: draft.plan_name,
            diet_type: draft.diet_type,
            calories: draft.calories,
            notes: draft.notes,
            image_url: draft.image_url,
            meals: draft.meals,
            assigned_dates: BTreeSet::new(),
        };
        state
            .plans
            .entry(request.user_id.clone())
            .or_default()
            .push(plan.clone());
        Ok(plan)
    }

    async fn assign_dates(
        &self,
        plan: &PlanId,
        request: &AssignDatesRequest,
    ) -> Result<(), ApiError> {
        let dates: BTreeSet<DateKey> = request.dates.iter().copied().collect();
        let mut state = self.begin(ApiCall::AssignDates(plan.clone(), dates.clone()))?;
        find_plan(&mut state, &request.user_id, plan)?
            .assigned_dates
            .extend(dates);
        Ok(())
    }

    async fn remove_dates(
        &self,
        plan: &PlanId,
        request: &RemoveDatesRequest,
    ) -> Result<(), ApiError> {
        let dates: BTreeSet<DateKey> = request.dates.iter().copied().collect();
        let mut state = self.begin(ApiCall::RemoveDates(plan.clone(), dates.clone()))?;
        let stored = find_plan(&mut state, &request.user_id, plan)?;
        stored.assigned_dates.retain(|d| !dates.contains(d));
        Ok(())
    }

    async fn delete_plan(&self, plan: &PlanId) -> Result<(), ApiError> {
        let mut state = self.begin(ApiCall::DeletePlan(plan.clone()))?;
        let mut found = false;
        for plans in state.plans.values_mut() {
            let before = plans.len();
            plans.retain(|p| &p.id != plan);
            found |= plans.len() != before;
        }
        if found {
            Ok(())
        } else {
            Err(ApiError::Rejected {
                message: "Meal plan not found".to_string(),
            })
        }
    }
}
