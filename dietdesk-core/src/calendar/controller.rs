use std::collections::{BTreeMap, BTreeSet};

use super::cell::{CalendarCell, CellState, MonthView, PlanDetail};
use super::mode::{AssignmentMode, Intent, TargetRequest};
use crate::api::PlanApi;
use crate::date_key::{keys_between, CalendarMonth, DateKey};
use crate::error::{PlanError, ValidationError};
use crate::models::{ClientId, MealPlan, MealPlanDraft, PlanId};
use crate::store::PlanStore;

/// Result of a successful assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignOutcome {
    pub plan: PlanId,
    pub dates: BTreeSet<DateKey>,
    /// Days taken over from other plans, by previous owner.
    pub released: BTreeMap<PlanId, BTreeSet<DateKey>>,
}

/// Result of a successful removal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovalOutcome {
    pub removed: BTreeMap<PlanId, BTreeSet<DateKey>>,
    /// Targeted days that had no plan.
    pub skipped: BTreeSet<DateKey>,
}

impl RemovalOutcome {
    pub fn removed_count(&self) -> usize {
        self.removed.values().map(BTreeSet::len).sum()
    }
}

/// What a click on a day leads to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellAction {
    /// Open the read-only view of the plan on this day.
    ViewPlan(DateKey),
    /// The day was added to or dropped from the selection.
    Toggled { key: DateKey, selected: bool },
    /// Single mode: the day is ready to be assigned or cleared.
    Target(TargetRequest),
    /// Nothing to do in the current mode.
    Ignored,
}

/// Drives plan assignment from a month calendar.
///
/// Holds the display state (month, mode, intent, selection) and owns the
/// [`PlanStore`] it mutates. All remote work goes through the store, so the
/// calendar always renders confirmed state.
pub struct CalendarController<A> {
    store: PlanStore<A>,
    month: CalendarMonth,
    mode: AssignmentMode,
    intent: Intent,
    selection: BTreeSet<DateKey>,
    today: DateKey,
}

impl<A: PlanApi> CalendarController<A> {
    pub fn new(store: PlanStore<A>) -> Self {
        let today = DateKey::today();
        Self {
            store,
            month: today.month(),
            mode: AssignmentMode::default(),
            intent: Intent::default(),
            selection: BTreeSet::new(),
            today,
        }
    }

    /// Pins "today", and shows its month.
    pub fn with_today(mut self, today: DateKey) -> Self {
        self.today = today;
        self.month = today.month();
        self
    }

    pub fn store(&self) -> &PlanStore<A> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut PlanStore<A> {
        &mut self.store
    }

    pub fn client(&self) -> Option<&ClientId> {
        self.store.client()
    }

    pub fn plans(&self) -> &[MealPlan] {
        self.store.plans()
    }

    pub fn today(&self) -> DateKey {
        self.today
    }

    pub fn month(&self) -> CalendarMonth {
        self.month
    }

    pub fn mode(&self) -> AssignmentMode {
        self.mode
    }

    pub fn intent(&self) -> Intent {
        self.intent
    }

    pub fn selection(&self) -> &BTreeSet<DateKey> {
        &self.selection
    }

    /// Loads a client's plans and starts from a clean selection.
    pub async fn select_client(&mut self, client: &ClientId) -> Result<&[MealPlan], PlanError> {
        self.store.load_client(client).await?;
        self.selection.clear();
        Ok(self.store.plans())
    }

    pub fn set_mode(&mut self, mode: AssignmentMode) {
        if mode != self.mode {
            self.selection.clear();
        }
        self.mode = mode;
    }

    pub fn set_intent(&mut self, intent: Intent) {
        if intent != self.intent {
            self.selection.clear();
        }
        self.intent = intent;
    }

    pub fn show_month(&mut self, month: CalendarMonth) {
        self.month = month;
    }

    pub fn next_month(&mut self) {
        self.month = self.month.next();
    }

    pub fn previous_month(&mut self) {
        self.month = self.month.previous();
    }

    pub fn cell_state(&self, key: DateKey) -> CellState {
        if self.selection.contains(&key) {
            return CellState::Selected;
        }
        match self.store.owner_of(key) {
            Some(plan) => CellState::Assigned(plan.id.clone()),
            None => CellState::Available,
        }
    }

    pub fn cell(&self, key: DateKey) -> CalendarCell {
        let owner = self.store.owner_of(key);
        CalendarCell {
            key,
            state: self.cell_state(key),
            plan: owner.map(|p| p.id.clone()),
            plan_name: owner.map(|p| p.plan_name.clone()),
            past: key < self.today,
            today: key == self.today,
        }
    }

    pub fn month_view(&self) -> MonthView {
        MonthView {
            month: self.month,
            cells: self.month.keys().into_iter().map(|k| self.cell(k)).collect(),
        }
    }

    /// The plan scheduled on `key`, for the detail view.
    pub fn view_plan(&self, key: DateKey) -> Result<PlanDetail<'_>, PlanError> {
        let plan = self
            .store
            .owner_of(key)
            .ok_or(PlanError::NoPlanOnDate(key))?;
        Ok(PlanDetail { date: key, plan })
    }

    /// Adds or drops a day from the selection in multiple mode.
    ///
    /// Returns whether the day is selected afterwards. Deselecting always
    /// works; selecting checks the day fits the current intent.
    pub fn toggle(&mut self, key: DateKey) -> Result<bool, PlanError> {
        self.expect_mode(AssignmentMode::Multiple)?;

        if self.selection.remove(&key) {
            return Ok(false);
        }
        self.check_pickable(key, self.intent)?;
        self.selection.insert(key);
        Ok(true)
    }

    /// Handles a click on a day the way the calendar grid does.
    pub fn click(&mut self, key: DateKey) -> Result<CellAction, PlanError> {
        let assigned = self.store.owner_of(key).is_some();

        if self.intent == Intent::Assign && assigned {
            return Ok(CellAction::ViewPlan(key));
        }

        match self.mode {
            AssignmentMode::Multiple => {
                let selected = self.toggle(key)?;
                Ok(CellAction::Toggled { key, selected })
            }
            AssignmentMode::Single if self.intent == Intent::Remove && !assigned => {
                Ok(CellAction::Ignored)
            }
            AssignmentMode::Single => {
                self.check_pickable(key, self.intent)?;
                Ok(CellAction::Target(TargetRequest::Day(key)))
            }
            AssignmentMode::Month | AssignmentMode::Custom => Ok(CellAction::Ignored),
        }
    }

    /// Turns a request into the concrete set of days it covers under the
    /// current intent.
    pub fn resolve(&self, request: &TargetRequest) -> Result<BTreeSet<DateKey>, PlanError> {
        self.resolve_for(self.intent, request)
    }

    /// Picked days are checked against the operation being run, not the
    /// intent they were picked under. Removal never rejects a picked day; free
    /// ones are skipped later.
    fn resolve_for(
        &self,
        intent: Intent,
        request: &TargetRequest,
    ) -> Result<BTreeSet<DateKey>, PlanError> {
        self.expect_mode(request.mode())?;

        let targets = match *request {
            TargetRequest::Day(key) => {
                if intent == Intent::Assign {
                    self.check_pickable(key, intent)?;
                }
                BTreeSet::from([key])
            }
            TargetRequest::Selection => {
                if intent == Intent::Assign {
                    for &key in &self.selection {
                        self.check_pickable(key, intent)?;
                    }
                }
                self.selection.clone()
            }
            TargetRequest::DisplayedMonth => self.month.keys().into_iter().collect(),
            TargetRequest::Range { start, end } => {
                if start > end {
                    return Err(ValidationError::InvertedRange { start, end }.into());
                }
                keys_between(start, end).into_iter().collect()
            }
        };
        Ok(targets)
    }

    /// Puts `plan` on every day the request resolves to.
    ///
    /// Days currently held by another plan are released from it first, one
    /// removal per previous owner, so each day ends up with exactly one plan.
    /// If a release or the assignment itself fails, released days are handed
    /// back to their previous owners before the error is returned.
    pub async fn assign(
        &mut self,
        plan: &PlanId,
        request: TargetRequest,
    ) -> Result<AssignOutcome, PlanError> {
        let client = self.loaded_client()?;
        if self.store.plan(plan).is_none() {
            return Err(PlanError::PlanNotFound(plan.clone()));
        }

        let targets = self.resolve_for(Intent::Assign, &request)?;
        if targets.is_empty() {
            return Err(ValidationError::EmptyTargets.into());
        }

        let released = self.group_by_owner(&targets, Some(plan)).0;
        let mut committed = BTreeMap::new();
        for (owner, keys) in &released {
            tracing::debug!(from = %owner, dates = keys.len(), "releasing days before reassignment");
            if let Err(e) = self.store.remove_dates(owner, &client, keys).await {
                self.restore(&client, &committed).await;
                return Err(e);
            }
            committed.insert(owner, keys);
        }

        if let Err(e) = self.store.assign_dates(plan, &client, &targets).await {
            self.restore(&client, &committed).await;
            return Err(e);
        }
        self.selection.clear();

        Ok(AssignOutcome {
            plan: plan.clone(),
            dates: targets,
            released,
        })
    }

    /// Clears whatever plans hold the days the request resolves to.
    ///
    /// One removal is sent per owning plan. Days with no plan are skipped.
    /// If a removal fails, the ones already confirmed stay applied.
    pub async fn remove(&mut self, request: TargetRequest) -> Result<RemovalOutcome, PlanError> {
        let client = self.loaded_client()?;

        let targets = self.resolve_for(Intent::Remove, &request)?;
        if targets.is_empty() {
            return Err(ValidationError::EmptyTargets.into());
        }

        let (removed, skipped) = self.group_by_owner(&targets, None);
        for key in &skipped {
            tracing::debug!(date = %key, "no plan on day, skipping removal");
        }
        for (owner, keys) in &removed {
            self.store.remove_dates(owner, &client, keys).await?;
        }
        self.selection.clear();

        Ok(RemovalOutcome { removed, skipped })
    }

    /// Creates a plan for the selected client.
    pub async fn create_plan(&mut self, draft: MealPlanDraft) -> Result<MealPlan, PlanError> {
        let client = self.loaded_client()?;
        self.store.create_plan(&client, draft).await
    }

    /// Deletes a plan; its days become free.
    pub async fn delete_plan(&mut self, plan: &PlanId) -> Result<MealPlan, PlanError> {
        let deleted = self.store.delete_plan(plan).await?;
        self.selection.retain(|d| !deleted.assigned_dates.contains(d));
        Ok(deleted)
    }

    /// Gives released days back to the plans they were taken from.
    async fn restore(
        &mut self,
        client: &ClientId,
        released: &BTreeMap<&PlanId, &BTreeSet<DateKey>>,
    ) {
        for (&owner, &keys) in released {
            if let Err(e) = self.store.assign_dates(owner, client, keys).await {
                tracing::warn!(plan = %owner, "Could not restore released days: {}", e);
            }
        }
    }

    fn loaded_client(&self) -> Result<ClientId, PlanError> {
        self.store
            .client()
            .cloned()
            .ok_or(PlanError::NoClientSelected)
    }

    fn expect_mode(&self, requested: AssignmentMode) -> Result<(), PlanError> {
        if requested == self.mode {
            Ok(())
        } else {
            Err(ValidationError::ModeMismatch {
                active: self.mode,
                requested,
            }
            .into())
        }
    }

    /// Whether a single day may be picked for `intent`.
    fn check_pickable(&self, key: DateKey, intent: Intent) -> Result<(), PlanError> {
        let assigned = self.store.owner_of(key).is_some();
        match intent {
            Intent::Assign if assigned => Err(ValidationError::DateAlreadyAssigned(key).into()),
            Intent::Assign if key < self.today => Err(ValidationError::PastDate(key).into()),
            Intent::Remove if !assigned => Err(ValidationError::NothingAssigned(key).into()),
            _ => Ok(()),
        }
    }

    /// Splits `keys` by the plan holding them, ignoring `except`.
    /// Free days come back separately.
    fn group_by_owner(
        &self,
        keys: &BTreeSet<DateKey>,
        except: Option<&PlanId>,
    ) -> (BTreeMap<PlanId, BTreeSet<DateKey>>, BTreeSet<DateKey>) {
        let mut owned: BTreeMap<PlanId, BTreeSet<DateKey>> = BTreeMap::new();
        let mut free = BTreeSet::new();
        for &key in keys {
            match self.store.owner_of(key) {
                Some(owner) if Some(&owner.id) == except => {}
                Some(owner) => {
                    owned.entry(owner.id.clone()).or_default().insert(key);
                }
                None => {
                    free.insert(key);
                }
            }
        }
        (owned, free)
    }
}
