use std::{net::SocketAddr, sync::Arc};

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use migration::MigratorTrait;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use configs::{AppConfig, StoreBackend};
use service::auth::{OwnershipPolicy, TokenConfig, TokenService};
use service::store::{DocumentStore, InMemoryDocumentStore, SeaOrmDocumentStore};

use crate::errors::StartupError;
use crate::routes::{self, auth};

/// Credentialed CORS for the configured browser origins.
pub fn build_cors(origins: &[String]) -> Result<CorsLayer, StartupError> {
    let origins = origins
        .iter()
        .map(|o| HeaderValue::from_str(o).map_err(|_| StartupError::InvalidConfig(format!("invalid CORS origin `{o}`"))))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]))
}

/// Open the configured document store and make sure it answers.
pub async fn build_store(cfg: &configs::DatabaseConfig) -> Result<Arc<dyn DocumentStore>, StartupError> {
    let store: Arc<dyn DocumentStore> = match cfg.backend {
        StoreBackend::Postgres => {
            let db = models::db::connect_with_config(cfg).await?;
            migration::Migrator::up(&db, None)
                .await
                .map_err(|e| StartupError::Store(format!("migrations failed: {e}")))?;
            Arc::new(SeaOrmDocumentStore::new(db))
        }
        StoreBackend::Memory => {
            warn!("using in-memory document store; data is lost on restart");
            Arc::new(InMemoryDocumentStore::new())
        }
    };
    store.ping().await.map_err(|e| StartupError::Store(e.to_string()))?;
    Ok(store)
}

pub fn build_state(cfg: &AppConfig, store: Arc<dyn DocumentStore>) -> Result<auth::AppState, StartupError> {
    let tokens = TokenService::new(TokenConfig::new(cfg.auth.jwt_secret.clone(), cfg.auth.token_ttl_secs))
        .map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    Ok(auth::AppState::new(
        store,
        tokens,
        auth::CookieSettings::from_config(&cfg.auth),
        OwnershipPolicy::new(cfg.auth.strict_booking_scope),
    ))
}

/// Assemble the router for an already validated configuration.
pub async fn build_app(cfg: &AppConfig) -> Result<Router, StartupError> {
    let store = build_store(&cfg.database).await?;
    let state = build_state(cfg, store)?;
    let cors = build_cors(&cfg.cors.allowed_origins)?;
    Ok(routes::build_router(state, cors))
}

/// Public entry: build the app and run the HTTP server
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let app = build_app(&cfg).await?;

    let addr: SocketAddr = format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bind address: {e}")))?;
    info!(%addr, backend = ?cfg.database.backend, "starting car doctor server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cors_rejects_unparseable_origin() {
        assert!(build_cors(&["http://localhost:5173".into()]).is_ok());
        assert!(matches!(build_cors(&["bad\norigin".into()]), Err(StartupError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn memory_backend_builds_an_app() {
        let mut cfg = AppConfig::default();
        cfg.database.backend = StoreBackend::Memory;
        cfg.auth.jwt_secret = "s".into();
        assert!(build_app(&cfg).await.is_ok());

        cfg.auth.jwt_secret.clear();
        assert!(matches!(build_app(&cfg).await, Err(StartupError::InvalidConfig(_))));
    }
}
