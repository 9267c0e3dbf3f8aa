//! Handlers for the `darts` resource.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error::{ApiError, ErrorBody};
use super::extract::{Json, Path, Query};
use super::{AppState, RESOURCE_PATH};
use crate::darts::{Dart, DartPatch, ListParams, NewDart, Page, FIRST_PAGE};
use crate::error::Error;

/// Body returned after a successful delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DeleteResponse {
    /// Confirmation message.
    #[schema(example = "darts with id 1 deleted successfully")]
    pub detail: String,
}

/// List one page of records.
///
/// # Errors
///
/// Returns 422 if `page` or `limit` is out of range.
#[utoipa::path(
    get,
    path = "/api/v1/darts",
    tag = "darts",
    params(ListParams),
    responses(
        (status = 200, description = "One page of records, ascending by id", body = [Dart]),
        (status = 422, description = "Page or limit out of range", body = ErrorBody),
    )
)]
pub async fn list_darts(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Dart>>, ApiError> {
    let api = &state.config().api;
    let page = Page::new(
        params.page.unwrap_or(FIRST_PAGE),
        params.limit.unwrap_or(api.default_page_size),
        api.max_page_size,
    )?;

    let darts = state.with_storage(move |storage| storage.list(page)).await?;
    Ok(Json(darts))
}

/// Fetch one record.
///
/// # Errors
///
/// Returns 404 if no record has the id.
#[utoipa::path(
    get,
    path = "/api/v1/darts/{id}",
    tag = "darts",
    params(("id" = i64, Path, description = "Record id")),
    responses(
        (status = 200, description = "The record", body = Dart),
        (status = 404, description = "No such record", body = ErrorBody),
    )
)]
pub async fn get_dart(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Dart>, ApiError> {
    let dart = state
        .with_storage(move |storage| storage.get(id))
        .await?
        .ok_or(Error::NotFound { id })?;
    Ok(Json(dart))
}

/// Create a record.
///
/// # Errors
///
/// Returns 422 for invalid fields and 409 if the username is taken.
#[utoipa::path(
    post,
    path = "/api/v1/darts",
    tag = "darts",
    request_body = NewDart,
    responses(
        (status = 201, description = "The created record", body = Dart),
        (status = 409, description = "Username already taken", body = ErrorBody),
        (status = 422, description = "Invalid fields", body = ErrorBody),
    )
)]
pub async fn create_dart(
    State(state): State<AppState>,
    Json(new_dart): Json<NewDart>,
) -> Result<impl IntoResponse, ApiError> {
    let dart = state
        .with_storage(move |storage| storage.insert(&new_dart))
        .await?;

    let location = format!("{RESOURCE_PATH}/{}", dart.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(dart)))
}

/// Replace every field of a record.
///
/// Omitted optional fields are cleared.
///
/// # Errors
///
/// Returns 404 if no record has the id, 422 for invalid fields and 409 if
/// the username belongs to another record.
#[utoipa::path(
    put,
    path = "/api/v1/darts/{id}",
    tag = "darts",
    params(("id" = i64, Path, description = "Record id")),
    request_body = NewDart,
    responses(
        (status = 200, description = "The updated record", body = Dart),
        (status = 404, description = "No such record", body = ErrorBody),
        (status = 409, description = "Username already taken", body = ErrorBody),
        (status = 422, description = "Invalid fields", body = ErrorBody),
    )
)]
pub async fn update_dart(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(new_dart): Json<NewDart>,
) -> Result<Json<Dart>, ApiError> {
    let dart = state
        .with_storage(move |storage| storage.replace(id, &new_dart))
        .await?
        .ok_or(Error::NotFound { id })?;
    Ok(Json(dart))
}

/// Update only the fields present in the body.
///
/// # Errors
///
/// Same as [`update_dart`], checked against the merged record.
#[utoipa::path(
    patch,
    path = "/api/v1/darts/{id}",
    tag = "darts",
    params(("id" = i64, Path, description = "Record id")),
    request_body = DartPatch,
    responses(
        (status = 200, description = "The updated record", body = Dart),
        (status = 404, description = "No such record", body = ErrorBody),
        (status = 409, description = "Username already taken", body = ErrorBody),
        (status = 422, description = "Invalid fields", body = ErrorBody),
    )
)]
pub async fn patch_dart(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<DartPatch>,
) -> Result<Json<Dart>, ApiError> {
    let dart = state
        .with_storage(move |storage| storage.patch(id, &patch))
        .await?
        .ok_or(Error::NotFound { id })?;
    Ok(Json(dart))
}

/// Delete a record.
///
/// # Errors
///
/// Returns 404 if no record has the id.
#[utoipa::path(
    delete,
    path = "/api/v1/darts/{id}",
    tag = "darts",
    params(("id" = i64, Path, description = "Record id")),
    responses(
        (status = 200, description = "Record deleted", body = DeleteResponse),
        (status = 404, description = "No such record", body = ErrorBody),
    )
)]
pub async fn delete_dart(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let deleted = state
        .with_storage(move |storage| storage.delete(id))
        .await?;
    if !deleted {
        return Err(Error::NotFound { id }.into());
    }
    Ok(Json(DeleteResponse {
        detail: format!("darts with id {id} deleted successfully"),
    }))
}
