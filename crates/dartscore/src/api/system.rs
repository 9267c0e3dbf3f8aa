//! Service information, health and the browser test page.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

use super::extract::Json;
use super::{AppState, DOCS_PATH};

/// Static page for exercising the API from a browser.
const TEST_PAGE: &str = include_str!("../../static/darts.html");

/// Version segment of every API path.
const API_VERSION: &str = "v1";

/// Description of the running service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct InfoResponse {
    /// Service name.
    #[schema(example = "dartscore")]
    pub name: String,
    /// Crate version of the running binary.
    #[schema(example = "0.1.0")]
    pub version: String,
    /// What the service does.
    pub description: String,
    /// API version served.
    #[schema(example = "v1")]
    pub api_version: String,
    /// Where the interactive documentation lives, when enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs_url: Option<String>,
    /// Storage backend in use.
    #[schema(example = "sqlite")]
    pub storage: String,
}

/// Overall health verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Every dependency answered.
    Healthy,
    /// At least one dependency failed.
    Unhealthy,
}

/// Health check result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Overall verdict.
    pub status: HealthStatus,
    /// `connected`, or the database error.
    pub database: String,
    /// Number of stored records, when the database answered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<i64>,
}

/// Describe the service.
#[utoipa::path(
    get,
    path = "/api/v1/darts/info",
    tag = "system",
    responses((status = 200, description = "Service description", body = InfoResponse))
)]
pub async fn info(State(state): State<AppState>) -> Json<InfoResponse> {
    let api = &state.config().api;
    Json(InfoResponse {
        name: api.name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        description: api.description.clone(),
        api_version: API_VERSION.to_string(),
        docs_url: api.docs_enabled.then(|| DOCS_PATH.to_string()),
        storage: "sqlite".to_string(),
    })
}

/// Check that the service and its database respond.
#[utoipa::path(
    get,
    path = "/api/v1/darts/health",
    tag = "system",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Database unavailable", body = HealthResponse),
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let probe = state
        .with_storage(|storage| {
            storage.ping()?;
            storage.count()
        })
        .await;

    match probe {
        Ok(records) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: HealthStatus::Healthy,
                database: "connected".to_string(),
                records: Some(records),
            }),
        ),
        Err(err) => {
            warn!(error = %err, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: HealthStatus::Unhealthy,
                    database: err.to_string(),
                    records: None,
                }),
            )
        }
    }
}

/// Serve the browser test page.
pub async fn test_page() -> Html<&'static str> {
    Html(TEST_PAGE)
}
