use axum::{
    extract::{Path, State},
    Json,
};
use service::store::Document;
use tracing::info;

use crate::{errors::JsonApiError, routes::auth::AppState};

#[utoipa::path(
    get, path = "/services", tag = "services",
    responses(
        (status = 200, description = "All services"),
        (status = 500, description = "Store failure")
    )
)]
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Document>>, JsonApiError> {
    let docs = state.catalog.list().await?;
    info!(count = docs.len(), "list services");
    Ok(Json(docs))
}

#[utoipa::path(
    get, path = "/services/{id}", tag = "services",
    params(("id" = String, Path, description = "Service id")),
    responses(
        (status = 200, description = "Service summary, or null when absent"),
        (status = 400, description = "Malformed id")
    )
)]
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Option<Document>>, JsonApiError> {
    Ok(Json(state.catalog.get(&id).await?))
}
