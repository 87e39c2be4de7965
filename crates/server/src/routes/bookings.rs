use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::Value;
use service::auth::AuthenticatedUser;
use service::store::{DeleteResult, Document, InsertOneResult, UpdateResult};
use tracing::info;

use crate::{errors::JsonApiError, routes::auth::AppState};

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct BookingQuery {
    /// Owner email; must equal the session identity when given.
    pub email: Option<String>,
}

/// Reached only through the session gate, which supplies the user.
#[utoipa::path(
    get, path = "/bookings", tag = "bookings",
    params(BookingQuery),
    responses(
        (status = 200, description = "Bookings visible to the caller"),
        (status = 401, description = "Missing or invalid session"),
        (status = 403, description = "Email does not match the session")
    )
)]
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(q): Query<BookingQuery>,
) -> Result<Json<Vec<Document>>, JsonApiError> {
    let scope = state.policy.scope_bookings(q.email.as_deref(), &user)?;
    let docs = state.bookings.list(&scope).await?;
    info!(email = %user.email, count = docs.len(), "list bookings");
    Ok(Json(docs))
}

#[utoipa::path(
    post, path = "/bookings", tag = "bookings",
    request_body = crate::openapi::BookingDoc,
    responses(
        (status = 200, description = "Created", body = crate::openapi::InsertOneResultDoc),
        (status = 400, description = "Body is not a JSON object")
    )
)]
pub async fn create(State(state): State<AppState>, Json(body): Json<Value>) -> Result<Json<InsertOneResult>, JsonApiError> {
    Ok(Json(state.bookings.create(body).await?))
}

#[utoipa::path(
    delete, path = "/bookings/{id}", tag = "bookings",
    params(("id" = String, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Delete summary", body = crate::openapi::DeleteResultDoc),
        (status = 400, description = "Malformed id")
    )
)]
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<DeleteResult>, JsonApiError> {
    Ok(Json(state.bookings.delete(&id).await?))
}

#[utoipa::path(
    patch, path = "/bookings/{id}", tag = "bookings",
    params(("id" = String, Path, description = "Booking id")),
    request_body = crate::openapi::StatusUpdateDoc,
    responses(
        (status = 200, description = "Update summary", body = crate::openapi::UpdateResultDoc),
        (status = 400, description = "Malformed id or status")
    )
)]
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<UpdateResult>, JsonApiError> {
    Ok(Json(state.bookings.update_status(&id, body).await?))
}
