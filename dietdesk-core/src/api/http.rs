//! REST client for the platform backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;

use super::envelope::read_envelope;
use super::{ApiError, AssignDatesRequest, CreatePlanRequest, PlanApi, RemoveDatesRequest};
use crate::models::{Client, ClientId, DietitianId, MealPlan, PlanId};
use crate::session::Session;

/// Request timeout when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// [`PlanApi`] over HTTP with bearer authentication.
#[derive(Debug, Clone)]
pub struct HttpPlanApi {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpPlanApi {
    /// Creates a client for the session's API URL and token.
    pub fn new(session: &Session) -> Result<Self, ApiError> {
        Self::with_timeout(session, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(session: &Session, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: normalize_base_url(session.api_url()),
            token: session.token().to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Option<T>, ApiError> {
        let response = request.bearer_auth(&self.token).send().await?;
        read_envelope(response).await
    }
}

/// Adds a scheme to bare hosts and drops trailing slashes.
fn normalize_base_url(url: &str) -> String {
    let url = url.trim();
    let with_scheme = if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("http://{}", url)
    };
    with_scheme.trim_end_matches('/').to_string()
}

fn segment(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

#[async_trait]
impl PlanApi for HttpPlanApi {
    async fn list_clients(&self, dietitian: &DietitianId) -> Result<Vec<Client>, ApiError> {
        let url = self.url(&format!("/clients/{}/clients", segment(dietitian.as_str())));
        tracing::debug!(%url, "GET clients");
        let clients: Option<Vec<Client>> = self.send(self.client.get(&url)).await?;
        Ok(clients.unwrap_or_default())
    }

    async fn list_plans(
        &self,
        dietitian: &DietitianId,
        client: &ClientId,
    ) -> Result<Vec<MealPlan>, ApiError> {
        let url = self.url(&format!(
            "/meal-plans/dietitian/{}/client/{}",
            segment(dietitian.as_str()),
            segment(client.as_str())
        ));
        tracing::debug!(%url, "GET meal plans");
        let plans: Option<Vec<MealPlan>> = self.send(self.client.get(&url)).await?;
        Ok(plans.unwrap_or_default())
    }

    async fn create_plan(&self, request: &CreatePlanRequest) -> Result<MealPlan, ApiError> {
        let url = self.url("/meal-plans");
        tracing::debug!(%url, plan_name = %request.draft.plan_name, "POST meal plan");
        let plan: Option<MealPlan> = self.send(self.client.post(&url).json(request)).await?;
        plan.ok_or(ApiError::MissingData("the created plan"))
    }

    async fn assign_dates(
        &self,
        plan: &PlanId,
        request: &AssignDatesRequest,
    ) -> Result<(), ApiError> {
        let url = self.url(&format!("/meal-plans/{}/assign", segment(plan.as_str())));
        tracing::debug!(%url, dates = request.dates.len(), "POST assign");
        self.send::<serde_json::Value>(self.client.post(&url).json(request))
            .await?;
        Ok(())
    }

    async fn remove_dates(
        &self,
        plan: &PlanId,
        request: &RemoveDatesRequest,
    ) -> Result<(), ApiError> {
        let url = self.url(&format!("/meal-plans/{}/dates", segment(plan.as_str())));
        tracing::debug!(%url, dates = request.dates.len(), "DELETE dates");
        self.send::<serde_json::Value>(self.client.delete(&url).json(request))
            .await?;
        Ok(())
    }

    async fn delete_plan(&self, plan: &PlanId) -> Result<(), ApiError> {
        let url = self.url(&format!("/meal-plans/{}", segment(plan.as_str())));
        tracing::debug!(%url, "DELETE meal plan");
        self.send::<serde_json::Value>(self.client.delete(&url))
            .await?;
        Ok(())
    }
}
