use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Request, State},
    middleware::Next,
    response::Response,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use common::types::Success;
use serde_json::Value;
use tracing::{debug, info, warn};

use service::auth::{AuthError, AuthenticatedUser, IdentityClaim, OwnershipPolicy, TokenService};
use service::services::{BookingService, CatalogService};
use service::store::DocumentStore;

use crate::errors::JsonApiError;

/// Attributes of the session cookie.
#[derive(Clone, Debug)]
pub struct CookieSettings {
    pub name: String,
    pub secure: bool,
    pub same_site: Option<SameSite>,
}

impl CookieSettings {
    pub fn from_config(cfg: &configs::AuthConfig) -> Self {
        let same_site = cfg.cookie_same_site.as_deref().and_then(|s| match s.to_ascii_lowercase().as_str() {
            "strict" => Some(SameSite::Strict),
            "lax" => Some(SameSite::Lax),
            "none" => Some(SameSite::None),
            _ => None,
        });
        Self { name: cfg.cookie_name.clone(), secure: cfg.cookie_secure, same_site }
    }

    /// HTTP-only session cookie on `/`; lives as long as the browser session.
    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        let mut cookie = Cookie::build((self.name.clone(), token))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .build();
        if let Some(same_site) = self.same_site {
            cookie.set_same_site(same_site);
        }
        cookie
    }

    /// Expired, empty cookie with the same name and path.
    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = self.session_cookie(String::new());
        cookie.make_removal();
        cookie
    }
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self::from_config(&configs::AuthConfig::default())
    }
}

/// Everything a request needs, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub tokens: TokenService,
    pub cookie: CookieSettings,
    pub policy: OwnershipPolicy,
    pub catalog: CatalogService,
    pub bookings: BookingService,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, tokens: TokenService, cookie: CookieSettings, policy: OwnershipPolicy) -> Self {
        Self {
            tokens,
            cookie,
            policy,
            catalog: CatalogService::new(store.clone()),
            bookings: BookingService::new(store),
        }
    }
}

#[utoipa::path(
    post, path = "/jwt", tag = "auth",
    request_body = crate::openapi::IdentityClaimDoc,
    responses(
        (status = 200, description = "Session cookie set", body = crate::openapi::SuccessDoc),
        (status = 400, description = "Malformed identity claim")
    )
)]
pub async fn issue_token(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<Value>,
) -> Result<(CookieJar, Json<Success>), JsonApiError> {
    let claim = IdentityClaim::from_json(body)?;
    let issued = state.tokens.issue(&claim)?;
    info!(email = %claim.email, "session_started");
    let jar = jar.add(state.cookie.session_cookie(issued.token));
    Ok((jar, Json(Success::ok())))
}

#[utoipa::path(
    post, path = "/logout", tag = "auth",
    responses((status = 200, description = "Session cookie cleared", body = crate::openapi::SuccessDoc))
)]
pub async fn logout(State(state): State<AppState>, jar: CookieJar, body: Bytes) -> (CookieJar, Json<Success>) {
    if !body.is_empty() {
        info!(body = %String::from_utf8_lossy(&body), "logging out");
    }
    let jar = jar.add(state.cookie.removal_cookie());
    (jar, Json(Success::ok()))
}

/// Session gate: reject requests without a valid session cookie, otherwise
/// attach the [`AuthenticatedUser`] to the request extensions.
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, JsonApiError> {
    let token = match jar.get(&state.cookie.name).map(Cookie::value) {
        Some(t) if !t.is_empty() => t,
        _ => {
            debug!(path = %req.uri().path(), "session cookie missing");
            return Err(AuthError::MissingToken.into());
        }
    };
    let claims = state.tokens.verify(token).map_err(|e| {
        warn!(path = %req.uri().path(), "session token rejected");
        JsonApiError::from(e)
    })?;
    req.extensions_mut().insert(AuthenticatedUser::from(claims));
    Ok(next.run(req).await)
}
