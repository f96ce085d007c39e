//! End-to-end calendar flows against the in-memory backend.

use std::collections::BTreeSet;

use dietdesk_core::api::ApiCall;
use dietdesk_core::{
    AssignmentMode, CalendarController, CalendarMonth, CellState, Client, ClientId, DateKey,
    DietType, Intent, Meal, MealPlanDraft, MemoryPlanApi, PlanError, PlanStore, Session,
    TargetRequest, ValidationError,
};

fn key(s: &str) -> DateKey {
    s.parse().unwrap()
}

fn calendar(api: MemoryPlanApi, today: &str) -> CalendarController<MemoryPlanApi> {
    let session = Session::dietitian("http://localhost:5000", "tok", "D1", "Dee");
    let store = PlanStore::new(api, &session).unwrap();
    CalendarController::new(store).with_today(key(today))
}

#[tokio::test]
async fn test_create_schedule_and_clear_a_week() {
    let api = MemoryPlanApi::new().with_client(Client {
        id: ClientId::new("C1"),
        name: "Ana".to_string(),
        goal: None,
        recent_plan: None,
    });
    let backend = api.clone();
    let mut cal = calendar(api, "2024-06-01");

    let clients = cal.store().list_clients().await.unwrap();
    assert_eq!(clients.len(), 1);
    let c1 = clients[0].id.clone();
    cal.select_client(&c1).await.unwrap();

    let balanced = cal
        .create_plan(
            MealPlanDraft::new("Balanced Diet", DietType::Balanced, 1800)
                .with_meal(Meal::new("Oats", 350).with_details("with berries")),
        )
        .await
        .unwrap();
    let keto = cal
        .create_plan(MealPlanDraft::new("Keto", DietType::Keto, 1600))
        .await
        .unwrap();

    // Same name, different case: rejected locally.
    let err = cal
        .create_plan(MealPlanDraft::new("keto", DietType::Keto, 1500))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PlanError::Validation(ValidationError::DuplicateName(_))
    ));

    // Balanced for the whole month.
    cal.set_mode(AssignmentMode::Month);
    let outcome = cal
        .assign(&balanced.id, TargetRequest::DisplayedMonth)
        .await
        .unwrap();
    assert_eq!(outcome.dates.len(), 30);
    assert!(outcome.released.is_empty());

    // Keto over the second week takes those days from Balanced.
    cal.set_mode(AssignmentMode::Custom);
    let outcome = cal
        .assign(
            &keto.id,
            TargetRequest::Range {
                start: key("2024-06-10"),
                end: key("2024-06-16"),
            },
        )
        .await
        .unwrap();
    assert_eq!(outcome.released[&balanced.id].len(), 7);

    for day in ["2024-06-09", "2024-06-17"] {
        assert_eq!(
            cal.cell_state(key(day)),
            CellState::Assigned(balanced.id.clone())
        );
    }
    assert_eq!(
        cal.cell_state(key("2024-06-12")),
        CellState::Assigned(keto.id.clone())
    );

    // Backend agrees: no day is held twice.
    let stored_balanced = backend.stored_plan(&c1, &balanced.id).unwrap();
    let stored_keto = backend.stored_plan(&c1, &keto.id).unwrap();
    assert!(stored_balanced
        .assigned_dates
        .is_disjoint(&stored_keto.assigned_dates));
    assert_eq!(stored_balanced.assigned_dates.len(), 23);

    // Clear the keto week again.
    cal.set_intent(Intent::Remove);
    let removal = cal
        .remove(TargetRequest::Range {
            start: key("2024-06-10"),
            end: key("2024-06-16"),
        })
        .await
        .unwrap();
    assert_eq!(removal.removed_count(), 7);
    assert!(cal.store().plan(&keto.id).unwrap().assigned_dates.is_empty());
    assert_eq!(cal.cell_state(key("2024-06-12")), CellState::Available);
}

#[tokio::test]
async fn test_multiple_selection_across_months() {
    let c1 = ClientId::new("C1");
    let api = MemoryPlanApi::new();
    let mut cal = calendar(api, "2024-06-20");
    cal.select_client(&c1).await.unwrap();
    let plan = cal
        .create_plan(MealPlanDraft::new("Vegan", DietType::Vegan, 2000))
        .await
        .unwrap();

    cal.set_mode(AssignmentMode::Multiple);
    cal.toggle(key("2024-06-29")).unwrap();
    cal.next_month();
    assert_eq!(cal.month(), CalendarMonth::new(2024, 7).unwrap());
    cal.toggle(key("2024-07-02")).unwrap();

    // The selection survives navigation.
    assert_eq!(cal.selection().len(), 2);

    let outcome = cal
        .assign(&plan.id, TargetRequest::Selection)
        .await
        .unwrap();
    assert_eq!(
        outcome.dates,
        BTreeSet::from([key("2024-06-29"), key("2024-07-02")])
    );

    let view = cal.month_view();
    assert!(view.cell(key("2024-07-02")).unwrap().is_assigned());
    assert!(view.to_string().contains("* Vegan: 2"));
}

#[tokio::test]
async fn test_failed_assignment_changes_nothing() {
    let c1 = ClientId::new("C1");
    let api = MemoryPlanApi::new();
    let backend = api.clone();
    let mut cal = calendar(api, "2024-06-01");
    cal.select_client(&c1).await.unwrap();
    let plan = cal
        .create_plan(MealPlanDraft::new("Paleo", DietType::Paleo, 2100))
        .await
        .unwrap();
    backend.clear_calls();

    backend.fail_next("Database unavailable");
    let err = cal
        .assign(&plan.id, TargetRequest::Day(key("2024-06-05")))
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Failed to assign plan: Database unavailable"
    );
    assert_eq!(cal.cell_state(key("2024-06-05")), CellState::Available);
    assert!(backend
        .stored_plan(&c1, &plan.id)
        .unwrap()
        .assigned_dates
        .is_empty());
    assert_eq!(backend.calls().len(), 1);
    assert!(matches!(backend.calls()[0], ApiCall::AssignDates(..)));
}

#[tokio::test]
async fn test_switching_client_reloads_calendar() {
    let c1 = ClientId::new("C1");
    let c2 = ClientId::new("C2");
    let api = MemoryPlanApi::new();
    let mut cal = calendar(api, "2024-06-01");

    cal.select_client(&c1).await.unwrap();
    let plan = cal
        .create_plan(MealPlanDraft::new("Balanced", DietType::Balanced, 1800))
        .await
        .unwrap();
    cal.assign(&plan.id, TargetRequest::Day(key("2024-06-03")))
        .await
        .unwrap();

    cal.select_client(&c2).await.unwrap();
    assert!(cal.plans().is_empty());
    assert_eq!(cal.cell_state(key("2024-06-03")), CellState::Available);

    // A plan from another client can't be assigned here.
    let err = cal
        .assign(&plan.id, TargetRequest::Day(key("2024-06-04")))
        .await
        .unwrap_err();
    assert!(matches!(err, PlanError::PlanNotFound(_)));
}
