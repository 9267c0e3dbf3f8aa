//! `OpenAPI` document and the interactive documentation page.

use axum::routing::get;
use axum::Router;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use super::darts::{self, DeleteResponse};
use super::error::ErrorBody;
use super::system::{self, HealthResponse, HealthStatus, InfoResponse};
use super::{AppState, DOCS_PATH, OPENAPI_PATH};
use crate::darts::{Dart, DartPatch, NewDart};

/// The service's `OpenAPI` description, generated from the handlers.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "dartscore",
        description = "CRUD API for tracking darts game scores"
    ),
    paths(
        system::info,
        system::health,
        darts::list_darts,
        darts::get_dart,
        darts::create_dart,
        darts::update_dart,
        darts::patch_dart,
        darts::delete_dart,
    ),
    components(schemas(
        Dart,
        NewDart,
        DartPatch,
        DeleteResponse,
        ErrorBody,
        InfoResponse,
        HealthResponse,
        HealthStatus,
    )),
    tags(
        (name = "darts", description = "Darts game records"),
        (name = "system", description = "Service information and health"),
    )
)]
pub struct ApiDoc;

/// Routes serving the raw document and the Scalar UI.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(OPENAPI_PATH, get(openapi_json))
        .merge(Scalar::with_url(DOCS_PATH, ApiDoc::openapi()))
}

async fn openapi_json() -> axum::Json<utoipa::openapi::OpenApi> {
    axum::Json(ApiDoc::openapi())
}
