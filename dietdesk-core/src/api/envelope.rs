//! The `{ success, message, data }` wrapper every endpoint responds with.

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::error::ApiError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Envelope<T> {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(
        alias = "clients",
        alias = "plans",
        alias = "plan",
        alias = "mealPlan",
        alias = "mealPlans"
    )]
    pub data: Option<T>,
}

fn default_success() -> bool {
    true
}

/// Reads a response, treating `success: false` like any other failure.
///
/// Returns the payload when the body carried one.
pub(crate) async fn read_envelope<T: DeserializeOwned>(
    response: Response,
) -> Result<Option<T>, ApiError> {
    let status = response.status();
    let body = response.text().await?;
    parse_envelope(status, &body)
}

pub(crate) fn parse_envelope<T: DeserializeOwned>(
    status: StatusCode,
    body: &str,
) -> Result<Option<T>, ApiError> {
    if !status.is_success() {
        let message = serde_json::from_str::<Envelope<serde_json::Value>>(body)
            .ok()
            .and_then(|e| e.message)
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string()
            });
        return Err(ApiError::Status {
            status: status.as_u16(),
            message,
        });
    }

    if body.trim().is_empty() {
        return Ok(None);
    }

    let envelope: Envelope<T> =
        serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))?;

    if !envelope.success {
        return Err(ApiError::Rejected {
            message: envelope
                .message
                .unwrap_or_else(|| "Request failed".to_string()),
        });
    }

    Ok(envelope.data)
}
