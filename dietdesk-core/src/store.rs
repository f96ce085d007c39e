//! Client-side projection of one client's meal plans.
//!
//! Every mutation is two-phase: the request goes to the backend first, and
//! only a confirmed response is replayed into the local plans. A failed call
//! leaves the projection exactly as it was.

use std::collections::BTreeSet;

use crate::api::{AssignDatesRequest, CreatePlanRequest, PlanApi, RemoveDatesRequest};
use crate::date_key::DateKey;
use crate::error::{Operation, PlanError, ValidationError};
use crate::models::{Client, ClientId, DietitianId, MealPlan, MealPlanDraft, PlanId};
use crate::refresh::PlanDiff;
use crate::session::Session;

/// Meal plans of the selected client, kept in sync with the backend.
pub struct PlanStore<A> {
    api: A,
    dietitian: DietitianId,
    client: Option<ClientId>,
    plans: Vec<MealPlan>,
}

impl<A: PlanApi> PlanStore<A> {
    /// Creates an empty store acting for the session's dietitian.
    pub fn new(api: A, session: &Session) -> Result<Self, PlanError> {
        let dietitian = session.dietitian_id().ok_or(PlanError::Forbidden)?;
        Ok(Self {
            api,
            dietitian,
            client: None,
            plans: Vec::new(),
        })
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn dietitian(&self) -> &DietitianId {
        &self.dietitian
    }

    /// The client whose plans are loaded.
    pub fn client(&self) -> Option<&ClientId> {
        self.client.as_ref()
    }

    pub fn plans(&self) -> &[MealPlan] {
        &self.plans
    }

    pub fn plan(&self, id: &PlanId) -> Option<&MealPlan> {
        self.plans.iter().find(|p| &p.id == id)
    }

    /// The plan holding `key`, if any.
    pub fn owner_of(&self, key: DateKey) -> Option<&MealPlan> {
        self.plans.iter().find(|p| p.is_assigned(key))
    }

    /// Finds a plan by id, or by name ignoring case.
    pub fn find(&self, id_or_name: &str) -> Option<&MealPlan> {
        self.plans
            .iter()
            .find(|p| p.id.as_str() == id_or_name)
            .or_else(|| self.plans.iter().find(|p| p.has_name(id_or_name)))
    }

    pub async fn list_clients(&self) -> Result<Vec<Client>, PlanError> {
        self.api
            .list_clients(&self.dietitian)
            .await
            .map_err(PlanError::remote(Operation::ListClients))
    }

    /// Fetches `client`'s plans and makes them the current projection.
    pub async fn load_client(&mut self, client: &ClientId) -> Result<&[MealPlan], PlanError> {
        let plans = self
            .api
            .list_plans(&self.dietitian, client)
            .await
            .map_err(PlanError::remote(Operation::LoadPlans))?;

        tracing::debug!(client = %client, plans = plans.len(), "loaded meal plans");
        self.client = Some(client.clone());
        self.plans = plans;
        Ok(&self.plans)
    }

    /// Re-fetches the loaded client's plans and reports what changed.
    pub async fn refresh(&mut self) -> Result<PlanDiff, PlanError> {
        let client = self.client.clone().ok_or(PlanError::NoClientSelected)?;
        let fresh = self
            .api
            .list_plans(&self.dietitian, &client)
            .await
            .map_err(PlanError::remote(Operation::LoadPlans))?;

        let diff = PlanDiff::between(&self.plans, &fresh);
        self.plans = fresh;
        Ok(diff)
    }

    /// Creates a plan for `client`.
    ///
    /// Names are checked against the client's existing plans, ignoring case,
    /// before anything is sent.
    pub async fn create_plan(
        &mut self,
        client: &ClientId,
        draft: MealPlanDraft,
    ) -> Result<MealPlan, PlanError> {
        self.ensure_client(client)?;

        if draft.plan_name.trim().is_empty() {
            return Err(ValidationError::MissingField("planName").into());
        }
        if self.plans.iter().any(|p| p.has_name(&draft.plan_name)) {
            return Err(ValidationError::DuplicateName(draft.plan_name.trim().to_string()).into());
        }

        let request = CreatePlanRequest {
            draft,
            dietitian_id: self.dietitian.clone(),
            user_id: client.clone(),
        };
        let mut plan = self
            .api
            .create_plan(&request)
            .await
            .map_err(PlanError::remote(Operation::CreatePlan))?;

        // New plans start unscheduled regardless of what the backend echoes.
        plan.assigned_dates.clear();
        tracing::info!(plan = %plan.id, name = %plan.plan_name, "created meal plan");
        self.plans.push(plan.clone());
        Ok(plan)
    }

    /// Adds `keys` to a plan's schedule.
    ///
    /// Keys the plan already holds are fine; the local update is a set union.
    /// Other plans holding the same keys are not touched here.
    pub async fn assign_dates(
        &mut self,
        plan: &PlanId,
        client: &ClientId,
        keys: &BTreeSet<DateKey>,
    ) -> Result<(), PlanError> {
        self.ensure_client(client)?;
        self.ensure_plan(plan)?;
        if keys.is_empty() {
            return Ok(());
        }

        let request = AssignDatesRequest {
            user_id: client.clone(),
            dates: keys.iter().copied().collect(),
        };
        self.api
            .assign_dates(plan, &request)
            .await
            .map_err(PlanError::remote(Operation::AssignDates))?;

        if let Some(local) = self.plans.iter_mut().find(|p| &p.id == plan) {
            local.assigned_dates.extend(keys.iter().copied());
        }
        tracing::info!(plan = %plan, dates = keys.len(), "assigned dates");
        Ok(())
    }

    /// Drops `keys` from a plan's schedule.
    pub async fn remove_dates(
        &mut self,
        plan: &PlanId,
        client: &ClientId,
        keys: &BTreeSet<DateKey>,
    ) -> Result<(), PlanError> {
        self.ensure_client(client)?;
        self.ensure_plan(plan)?;
        if keys.is_empty() {
            return Ok(());
        }

        let request = RemoveDatesRequest {
            user_id: client.clone(),
            dietitian_id: self.dietitian.clone(),
            dates: keys.iter().copied().collect(),
        };
        self.api
            .remove_dates(plan, &request)
            .await
            .map_err(PlanError::remote(Operation::RemoveDates))?;

        if let Some(local) = self.plans.iter_mut().find(|p| &p.id == plan) {
            local.assigned_dates.retain(|d| !keys.contains(d));
        }
        tracing::info!(plan = %plan, dates = keys.len(), "removed dates");
        Ok(())
    }

    /// Deletes a plan, which also voids all of its assignments.
    pub async fn delete_plan(&mut self, plan: &PlanId) -> Result<MealPlan, PlanError> {
        self.ensure_plan(plan)?;

        self.api
            .delete_plan(plan)
            .await
            .map_err(PlanError::remote(Operation::DeletePlan))?;

        let index = self
            .plans
            .iter()
            .position(|p| &p.id == plan)
            .ok_or_else(|| PlanError::PlanNotFound(plan.clone()))?;
        let removed = self.plans.remove(index);
        tracing::info!(plan = %plan, "deleted meal plan");
        Ok(removed)
    }

    fn ensure_client(&self, client: &ClientId) -> Result<(), PlanError> {
        match &self.client {
            None => Err(PlanError::NoClientSelected),
            Some(loaded) if loaded != client => Err(PlanError::ClientNotLoaded(client.clone())),
            Some(_) => Ok(()),
        }
    }

    fn ensure_plan(&self, plan: &PlanId) -> Result<(), PlanError> {
        if self.plan(plan).is_some() {
            Ok(())
        } else {
            Err(PlanError::PlanNotFound(plan.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiCall, MemoryPlanApi};
    use crate::models::{DietType, Meal};
    use crate::session::{Role, SessionUser};

    fn key(s: &str) -> DateKey {
        s.parse().unwrap()
    }

    fn keys(list: &[&str]) -> BTreeSet<DateKey> {
        list.iter().map(|s| key(s)).collect()
    }

    fn session() -> Session {
        Session::dietitian("http://localhost", "tok", "D1", "Dee")
    }

    fn plan(id: &str, name: &str, dates: &[&str]) -> MealPlan {
        MealPlan {
            id: PlanId::new(id),
            plan_name: name.to_string(),
            diet_type: DietType::Balanced,
            calories: 1800,
            notes: String::new(),
            image_url: None,
            meals: vec![Meal::new("Oats", 350)],
            assigned_dates: keys(dates),
        }
    }

    async fn loaded_store(api: MemoryPlanApi, client: &str) -> PlanStore<MemoryPlanApi> {
        let mut store = PlanStore::new(api, &session()).unwrap();
        store.load_client(&ClientId::new(client)).await.unwrap();
        store.api().clear_calls();
        store
    }

    #[test]
    fn test_non_dietitian_session_is_forbidden() {
        let session = Session::new(
            "http://localhost",
            "tok",
            SessionUser {
                id: "C1".to_string(),
                name: "Ana".to_string(),
                role: Role::Client,
            },
        );
        let result = PlanStore::new(MemoryPlanApi::new(), &session);
        assert!(matches!(result, Err(PlanError::Forbidden)));
    }

    #[tokio::test]
    async fn test_load_client_replaces_projection() {
        let c1 = ClientId::new("C1");
        let api = MemoryPlanApi::new().with_plan(&c1, plan("P1", "Balanced Diet", &["2024-06-01"]));
        let mut store = PlanStore::new(api, &session()).unwrap();

        let plans = store.load_client(&c1).await.unwrap();
        assert_eq!(plans.len(), 1);
        assert_eq!(store.client(), Some(&c1));
        assert_eq!(store.owner_of(key("2024-06-01")).unwrap().id, PlanId::new("P1"));
        assert!(store.owner_of(key("2024-06-02")).is_none());

        store.load_client(&ClientId::new("C2")).await.unwrap();
        assert!(store.plans().is_empty());
    }

    #[tokio::test]
    async fn test_assign_then_remove_frees_the_day() {
        let c = ClientId::new("C");
        let api = MemoryPlanApi::new().with_plan(&c, plan("P1", "Balanced Diet", &[]));
        let mut store = loaded_store(api, "C").await;
        let p1 = PlanId::new("P1");
        let day = keys(&["2024-06-10"]);

        store.assign_dates(&p1, &c, &day).await.unwrap();
        assert_eq!(store.owner_of(key("2024-06-10")).unwrap().id, p1);

        store.remove_dates(&p1, &c, &day).await.unwrap();
        assert!(store.owner_of(key("2024-06-10")).is_none());
        assert!(store
            .api()
            .stored_plan(&c, &p1)
            .unwrap()
            .assigned_dates
            .is_empty());
    }

    #[tokio::test]
    async fn test_assign_is_idempotent() {
        let c = ClientId::new("C");
        let api = MemoryPlanApi::new().with_plan(&c, plan("P", "Plan", &["2024-06-01"]));
        let mut store = loaded_store(api, "C").await;
        let p = PlanId::new("P");
        let targets = keys(&["2024-06-01", "2024-06-02"]);

        store.assign_dates(&p, &c, &targets).await.unwrap();
        let after_first = store.plan(&p).unwrap().assigned_dates.clone();
        store.assign_dates(&p, &c, &targets).await.unwrap();

        assert_eq!(store.plan(&p).unwrap().assigned_dates, after_first);
        assert_eq!(after_first, targets);
    }

    #[tokio::test]
    async fn test_failed_assign_leaves_state_untouched() {
        let c = ClientId::new("C");
        let api = MemoryPlanApi::new().with_plan(&c, plan("P", "Plan", &["2024-06-01"]));
        let mut store = loaded_store(api, "C").await;
        let p = PlanId::new("P");

        store.api().fail_next("Server exploded");
        let err = store
            .assign_dates(&p, &c, &keys(&["2024-06-05"]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PlanError::Remote {
                operation: Operation::AssignDates,
                ..
            }
        ));
        assert_eq!(store.plan(&p).unwrap().assigned_dates, keys(&["2024-06-01"]));
    }

    #[tokio::test]
    async fn test_failed_remove_leaves_state_untouched() {
        let c = ClientId::new("C");
        let api = MemoryPlanApi::new().with_plan(&c, plan("P", "Plan", &["2024-06-01"]));
        let mut store = loaded_store(api, "C").await;
        let p = PlanId::new("P");

        store.api().fail_next("nope");
        assert!(store
            .remove_dates(&p, &c, &keys(&["2024-06-01"]))
            .await
            .is_err());
        assert!(store.plan(&p).unwrap().is_assigned(key("2024-06-01")));
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected_before_post() {
        let c42 = ClientId::new("C42");
        let api = MemoryPlanApi::new().with_plan(&c42, plan("P1", "keto plan", &[]));
        let mut store = loaded_store(api, "C42").await;

        let err = store
            .create_plan(&c42, MealPlanDraft::new("Keto Plan", DietType::Keto, 1600))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PlanError::Validation(ValidationError::DuplicateName(ref name)) if name == "Keto Plan"
        ));
        assert!(store.api().calls().is_empty());
        assert_eq!(store.plans().len(), 1);
    }

    #[tokio::test]
    async fn test_create_plan_appends_unscheduled_plan() {
        let c = ClientId::new("C");
        let mut store = loaded_store(MemoryPlanApi::new(), "C").await;

        let draft = MealPlanDraft::new("Vegan Week", DietType::Vegan, 2000)
            .with_meal(Meal::new("Lentil soup", 450));
        let created = store.create_plan(&c, draft).await.unwrap();

        assert!(created.assigned_dates.is_empty());
        assert_eq!(store.plans().len(), 1);
        assert_eq!(store.find("vegan week").unwrap().id, created.id);
        assert_eq!(
            store.api().calls(),
            vec![ApiCall::CreatePlan("Vegan Week".to_string())]
        );
    }

    #[tokio::test]
    async fn test_create_plan_requires_name() {
        let c = ClientId::new("C");
        let mut store = loaded_store(MemoryPlanApi::new(), "C").await;
        let err = store
            .create_plan(&c, MealPlanDraft::new("   ", DietType::Paleo, 2000))
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(store.api().calls().is_empty());
    }

    #[tokio::test]
    async fn test_delete_plan_drops_it() {
        let c = ClientId::new("C");
        let api = MemoryPlanApi::new()
            .with_plan(&c, plan("P1", "One", &["2024-06-01"]))
            .with_plan(&c, plan("P2", "Two", &[]));
        let mut store = loaded_store(api, "C").await;

        let removed = store.delete_plan(&PlanId::new("P1")).await.unwrap();
        assert_eq!(removed.plan_name, "One");
        assert!(store.owner_of(key("2024-06-01")).is_none());
        assert_eq!(store.plans().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_plan() {
        let c = ClientId::new("C");
        let api = MemoryPlanApi::new().with_plan(&c, plan("P1", "One", &[]));
        let mut store = loaded_store(api, "C").await;

        store.api().fail_next("locked");
        assert!(store.delete_plan(&PlanId::new("P1")).await.is_err());
        assert_eq!(store.plans().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_plan_and_client_fail_locally() {
        let c = ClientId::new("C");
        let api = MemoryPlanApi::new().with_plan(&c, plan("P1", "One", &[]));
        let mut store = loaded_store(api, "C").await;

        let err = store
            .assign_dates(&PlanId::new("nope"), &c, &keys(&["2024-06-01"]))
            .await
            .unwrap_err();
        assert!(matches!(err, PlanError::PlanNotFound(_)));

        let err = store
            .assign_dates(&PlanId::new("P1"), &ClientId::new("other"), &keys(&["2024-06-01"]))
            .await
            .unwrap_err();
        assert!(matches!(err, PlanError::ClientNotLoaded(_)));
        assert!(store.api().calls().is_empty());
    }

    #[tokio::test]
    async fn test_mutations_need_a_loaded_client() {
        let mut store = PlanStore::new(MemoryPlanApi::new(), &session()).unwrap();
        let err = store
            .create_plan(&ClientId::new("C"), MealPlanDraft::new("X", DietType::Keto, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, PlanError::NoClientSelected));
        assert!(matches!(
            store.refresh().await.unwrap_err(),
            PlanError::NoClientSelected
        ));
    }

    #[tokio::test]
    async fn test_refresh_reports_remote_changes() {
        let c = ClientId::new("C");
        let api = MemoryPlanApi::new().with_plan(&c, plan("P1", "One", &[]));
        let mut store = loaded_store(api, "C").await;

        // Another session assigns a date behind our back.
        store
            .api()
            .assign_dates(
                &PlanId::new("P1"),
                &AssignDatesRequest {
                    user_id: c.clone(),
                    dates: vec![key("2024-07-01")],
                },
            )
            .await
            .unwrap();

        let diff = store.refresh().await.unwrap();
        assert!(!diff.is_empty());
        assert_eq!(
            diff.gained.get(&PlanId::new("P1")),
            Some(&keys(&["2024-07-01"]))
        );
        assert!(store.plan(&PlanId::new("P1")).unwrap().is_assigned(key("2024-07-01")));
    }
}
