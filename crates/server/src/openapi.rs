use serde::Serialize;
use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct SuccessDoc { pub success: bool }

/// Body accepted by `/jwt`; fields other than `email` are ignored.
#[derive(ToSchema)]
pub struct IdentityClaimDoc { pub email: String }

/// Bookings are free-form objects; `email` names the owner.
#[derive(ToSchema)]
pub struct BookingDoc {
    pub email: String,
    pub service: Option<String>,
    pub service_id: Option<String>,
    pub date: Option<String>,
    pub price: Option<String>,
    pub status: Option<String>,
}

#[derive(ToSchema)]
pub struct StatusUpdateDoc { pub status: String }

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InsertOneResultDoc { pub acknowledged: bool, pub inserted_id: String }

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResultDoc {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_count: u64,
    pub upserted_id: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResultDoc { pub acknowledged: bool, pub deleted_count: u64 }

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::root,
        crate::routes::health,
        crate::routes::auth::issue_token,
        crate::routes::auth::logout,
        crate::routes::services::list,
        crate::routes::services::get,
        crate::routes::bookings::list,
        crate::routes::bookings::create,
        crate::routes::bookings::delete,
        crate::routes::bookings::update_status,
    ),
    components(
        schemas(
            HealthResponse,
            SuccessDoc,
            IdentityClaimDoc,
            BookingDoc,
            StatusUpdateDoc,
            InsertOneResultDoc,
            UpdateResultDoc,
            DeleteResultDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "services"),
        (name = "bookings")
    )
)]
pub struct ApiDoc;
