#![cfg(test)]
use migration::MigratorTrait;
use models::db::connect_with_config;
use sea_orm::DatabaseConnection;
use tokio::sync::OnceCell;

// Ensure migrations run only once across the entire test process
static MIGRATED: OnceCell<()> = OnceCell::const_new();

fn test_config() -> configs::DatabaseConfig {
    let mut cfg = configs::DatabaseConfig::default();
    cfg.url = (*models::db::DATABASE_URL).clone();
    cfg.max_connections = cfg.max_connections.max(10);
    cfg.min_connections = cfg.min_connections.min(1);
    cfg.acquire_timeout_secs = 10;
    cfg
}

pub async fn get_db() -> Result<DatabaseConnection, anyhow::Error> {
    let cfg = test_config();
    if MIGRATED.get().is_none() {
        let db = connect_with_config(&cfg).await?;
        migration::Migrator::up(&db, None).await?;
        let _ = MIGRATED.set(());
    }
    // fresh connection bound to the current test's runtime
    connect_with_config(&cfg).await
}
