pub mod auth;
pub mod bookings;
pub mod services;

use axum::{
    handler::Handler,
    middleware,
    routing::{get, patch, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;

use crate::openapi::ApiDoc;
use auth::AppState;

pub const ROOT_BANNER: &str = "Car Doctor Server is Running";

#[utoipa::path(get, path = "/", tag = "health", responses((status = 200, description = "Liveness banner", body = String)))]
pub async fn root() -> &'static str {
    ROOT_BANNER
}

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the full application router. Only `GET /bookings` sits behind the session gate.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let gate = middleware::from_fn_with_state(state.clone(), auth::require_session);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/jwt", post(auth::issue_token))
        .route("/logout", post(auth::logout))
        .route("/services", get(services::list))
        .route("/services/:id", get(services::get))
        .route("/bookings", get(bookings::list.layer(gate)).post(bookings::create))
        .route("/bookings/:id", patch(bookings::update_status).delete(bookings::delete))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                // 5xx
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
