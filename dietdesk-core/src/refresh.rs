//! Periodic re-fetch of the loaded client's plans.
//!
//! A refresh is timer, fetch, diff, merge: the store swaps in the fresh plans
//! and the caller sees a [`PlanDiff`] describing what moved.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::api::PlanApi;
use crate::date_key::DateKey;
use crate::models::{MealPlan, PlanId};
use crate::store::PlanStore;

/// Differences between two snapshots of a client's plans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanDiff {
    pub added: Vec<PlanId>,
    pub removed: Vec<PlanId>,
    /// Dates newly assigned to plans present in both snapshots.
    pub gained: BTreeMap<PlanId, BTreeSet<DateKey>>,
    /// Dates no longer assigned to plans present in both snapshots.
    pub lost: BTreeMap<PlanId, BTreeSet<DateKey>>,
}

impl PlanDiff {
    pub fn between(old: &[MealPlan], new: &[MealPlan]) -> Self {
        let mut diff = PlanDiff::default();

        for plan in new {
            match old.iter().find(|p| p.id == plan.id) {
                None => diff.added.push(plan.id.clone()),
                Some(previous) => {
                    let gained: BTreeSet<DateKey> = plan
                        .assigned_dates
                        .difference(&previous.assigned_dates)
                        .copied()
                        .collect();
                    let lost: BTreeSet<DateKey> = previous
                        .assigned_dates
                        .difference(&plan.assigned_dates)
                        .copied()
                        .collect();
                    if !gained.is_empty() {
                        diff.gained.insert(plan.id.clone(), gained);
                    }
                    if !lost.is_empty() {
                        diff.lost.insert(plan.id.clone(), lost);
                    }
                }
            }
        }

        diff.removed = old
            .iter()
            .filter(|p| !new.iter().any(|n| n.id == p.id))
            .map(|p| p.id.clone())
            .collect();

        diff
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.gained.is_empty()
            && self.lost.is_empty()
    }
}

impl fmt::Display for PlanDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "no changes");
        }
        let mut parts = Vec::new();
        if !self.added.is_empty() {
            parts.push(format!("{} plan(s) added", self.added.len()));
        }
        if !self.removed.is_empty() {
            parts.push(format!("{} plan(s) removed", self.removed.len()));
        }
        let gained: usize = self.gained.values().map(BTreeSet::len).sum();
        if gained > 0 {
            parts.push(format!("{} date(s) assigned", gained));
        }
        let lost: usize = self.lost.values().map(BTreeSet::len).sum();
        if lost > 0 {
            parts.push(format!("{} date(s) freed", lost));
        }
        write!(f, "{}", parts.join(", "))
    }
}

/// Counters from a finished [`RefreshSchedule::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshStats {
    pub refreshes: usize,
    pub changes: usize,
    pub failures: usize,
}

/// Refreshes a store on a fixed period until told to stop.
#[derive(Debug, Clone, Copy)]
pub struct RefreshSchedule {
    period: Duration,
}

impl RefreshSchedule {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }

    /// Runs until `shutdown` resolves.
    ///
    /// The first refresh happens one period after the call. `on_change` sees
    /// only non-empty diffs. Failed refreshes are logged and the next tick
    /// tries again.
    pub async fn run<A, F, S>(
        &self,
        store: &mut PlanStore<A>,
        mut on_change: F,
        shutdown: S,
    ) -> RefreshStats
    where
        A: PlanApi,
        F: FnMut(&PlanDiff, &PlanStore<A>),
        S: Future<Output = ()>,
    {
        let mut stats = RefreshStats::default();
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        interval.tick().await;

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = interval.tick() => {
                    stats.refreshes += 1;
                    match store.refresh().await {
                        Ok(diff) if diff.is_empty() => {}
                        Ok(diff) => {
                            stats.changes += 1;
                            tracing::info!(%diff, "plans changed remotely");
                            on_change(&diff, &*store);
                        }
                        Err(e) => {
                            stats.failures += 1;
                            tracing::warn!("Refresh failed: {}", e);
                        }
                    }
                }
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{AssignDatesRequest, MemoryPlanApi};
    use crate::models::{ClientId, DietType};
    use crate::session::Session;

    fn key(s: &str) -> DateKey {
        s.parse().unwrap()
    }

    fn plan(id: &str, dates: &[&str]) -> MealPlan {
        MealPlan {
            id: PlanId::new(id),
            plan_name: id.to_string(),
            diet_type: DietType::Keto,
            calories: 1500,
            notes: String::new(),
            image_url: None,
            meals: Vec::new(),
            assigned_dates: dates.iter().map(|d| key(d)).collect(),
        }
    }

    #[test]
    fn test_diff_between_snapshots() {
        let old = vec![plan("A", &["2024-06-01", "2024-06-02"]), plan("B", &[])];
        let new = vec![plan("A", &["2024-06-02", "2024-06-03"]), plan("C", &[])];

        let diff = PlanDiff::between(&old, &new);
        assert_eq!(diff.added, vec![PlanId::new("C")]);
        assert_eq!(diff.removed, vec![PlanId::new("B")]);
        assert_eq!(
            diff.gained[&PlanId::new("A")],
            [key("2024-06-03")].into_iter().collect::<BTreeSet<_>>()
        );
        assert_eq!(
            diff.lost[&PlanId::new("A")],
            [key("2024-06-01")].into_iter().collect::<BTreeSet<_>>()
        );
        assert_eq!(
            diff.to_string(),
            "1 plan(s) added, 1 plan(s) removed, 1 date(s) assigned, 1 date(s) freed"
        );
    }

    #[test]
    fn test_identical_snapshots() {
        let snapshot = vec![plan("A", &["2024-06-01"])];
        let diff = PlanDiff::between(&snapshot, &snapshot);
        assert!(diff.is_empty());
        assert_eq!(diff.to_string(), "no changes");
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_reports_changes_until_shutdown() {
        let c = ClientId::new("C");
        let api = MemoryPlanApi::new().with_plan(&c, plan("A", &[]));
        let remote = api.clone();
        let session = Session::dietitian("http://localhost", "tok", "D1", "Dee");
        let mut store = PlanStore::new(api, &session).unwrap();
        store.load_client(&c).await.unwrap();

        remote
            .assign_dates(
                &PlanId::new("A"),
                &AssignDatesRequest {
                    user_id: c.clone(),
                    dates: vec![key("2024-06-09")],
                },
            )
            .await
            .unwrap();

        let mut seen = Vec::new();
        let schedule = RefreshSchedule::new(Duration::from_secs(10));
        let stats = schedule
            .run(
                &mut store,
                |diff, _| seen.push(diff.clone()),
                tokio::time::sleep(Duration::from_secs(35)),
            )
            .await;

        assert_eq!(stats.refreshes, 3);
        assert_eq!(stats.changes, 1);
        assert_eq!(stats.failures, 0);
        assert_eq!(seen.len(), 1);
        assert!(store
            .plan(&PlanId::new("A"))
            .unwrap()
            .is_assigned(key("2024-06-09")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_survives_failures() {
        let c = ClientId::new("C");
        let api = MemoryPlanApi::new().with_plan(&c, plan("A", &["2024-06-01"]));
        let remote = api.clone();
        let session = Session::dietitian("http://localhost", "tok", "D1", "Dee");
        let mut store = PlanStore::new(api, &session).unwrap();
        store.load_client(&c).await.unwrap();

        remote.fail_next("temporarily unavailable");
        let stats = RefreshSchedule::new(Duration::from_secs(5))
            .run(
                &mut store,
                |_, _| {},
                tokio::time::sleep(Duration::from_secs(12)),
            )
            .await;

        assert_eq!(stats.refreshes, 2);
        assert_eq!(stats.failures, 1);
        assert_eq!(store.plans().len(), 1);
    }
}
