use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 5000, worker_threads: Some(4) }
    }
}

/// Which document store backs the collections.
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Postgres,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(anyhow!("unknown database.backend `{other}` (expected postgres or memory)")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
        }
    }
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }

/// Session token and cookie settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    #[serde(default)]
    pub cookie_secure: bool,
    /// `strict`, `lax` or `none`; unset means the attribute is omitted.
    #[serde(default)]
    pub cookie_same_site: Option<String>,
    /// Reject booking listings that do not name an owner email.
    #[serde(default)]
    pub strict_booking_scope: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_secs: default_token_ttl(),
            cookie_name: default_cookie_name(),
            cookie_secure: false,
            cookie_same_site: None,
            strict_booking_scope: false,
        }
    }
}

fn default_token_ttl() -> u64 { 3600 }

/// Upper bound for `auth.token_ttl_secs` (one year).
pub const MAX_TOKEN_TTL_SECS: u64 = 365 * 24 * 3600;
fn default_cookie_name() -> String { "token".into() }

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self { allowed_origins: default_allowed_origins() }
    }
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:5173".into(), "http://localhost:5174".into()]
}

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `config.toml` when present (defaults otherwise), overlay the
    /// environment, then normalize and validate.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(e) => match e.downcast_ref::<std::io::Error>() {
                Some(io) if io.kind() == std::io::ErrorKind::NotFound => AppConfig::default(),
                _ => return Err(e),
            },
        };
        cfg.apply_env()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Overlay values from process environment variables.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Overlay values from an arbitrary lookup; empty values are ignored,
    /// values that do not parse are an error naming the key.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = get("SERVER_HOST") { self.server.host = host; }
        let port = ["PORT", "SERVER_PORT"].into_iter().find_map(|k| get(k).map(|v| (k, v)));
        if let Some((key, port)) = port {
            self.server.port = parse_env(key, &port)?;
        }
        if let Some(w) = get("TOKIO_WORKER_THREADS") {
            self.server.worker_threads = Some(parse_env("TOKIO_WORKER_THREADS", &w)?);
        }

        if let Some(backend) = get("DATABASE_BACKEND") {
            self.database.backend = parse_env("DATABASE_BACKEND", &backend)?;
        }
        self.database.normalize_from(&get);

        if let Some(secret) = get("ACCESS_TOKEN_SECRET") { self.auth.jwt_secret = secret; }
        if let Some(ttl) = get("TOKEN_TTL_SECS") {
            self.auth.token_ttl_secs = parse_env("TOKEN_TTL_SECS", &ttl)?;
        }
        if let Some(secure) = get("COOKIE_SECURE") {
            self.auth.cookie_secure = parse_bool_env("COOKIE_SECURE", &secure)?;
        }
        if let Some(strict) = get("STRICT_BOOKING_SCOPE") {
            self.auth.strict_booking_scope = parse_bool_env("STRICT_BOOKING_SCOPE", &strict)?;
        }

        if let Some(origins) = get("CORS_ORIGINS") {
            self.cors.allowed_origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }
        Ok(())
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.database.validate()?;
        self.auth.validate()?;
        Ok(())
    }
}

fn parse_env<T>(key: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e| anyhow!("{key}={raw:?} is invalid: {e}"))
}

fn parse_bool_env(key: &str, raw: &str) -> Result<bool> {
    parse_bool(raw).ok_or_else(|| anyhow!("{key}={raw:?} is invalid: expected true/false"))
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        match self.worker_threads {
            Some(w) if w > 0 => {}
            _ => self.worker_threads = Some(4),
        }
        Ok(())
    }
}

impl DatabaseConfig {
    /// Fill the URL from `DATABASE_URL`, or compose one from the
    /// `DB_USER`/`DB_PASS`/`DB_HOST`/`DB_NAME` quartet.
    fn normalize_from<F>(&mut self, get: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = get("DATABASE_URL") {
            self.url = url;
            return;
        }
        if !self.url.trim().is_empty() {
            return;
        }
        if let (Some(user), Some(pass)) = (get("DB_USER"), get("DB_PASS")) {
            let host = get("DB_HOST").unwrap_or_else(|| "localhost:5432".into());
            let name = get("DB_NAME").unwrap_or_else(|| "car_doctor".into());
            self.url = format!("postgres://{user}:{pass}@{host}/{name}");
        }
    }

    pub fn validate(&self) -> Result<()> {
        // the memory backend needs no connection settings
        if self.backend == StoreBackend::Memory {
            return Ok(());
        }
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or via DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url must start with postgresql:// or postgres://"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }
}

impl AuthConfig {
    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.trim().is_empty() {
            return Err(anyhow!("auth.jwt_secret is empty; set ACCESS_TOKEN_SECRET"));
        }
        if self.token_ttl_secs == 0 || self.token_ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err(anyhow!("auth.token_ttl_secs must be within 1..={MAX_TOKEN_TTL_SECS}"));
        }
        if self.cookie_name.trim().is_empty() {
            return Err(anyhow!("auth.cookie_name must not be empty"));
        }
        if let Some(s) = &self.cookie_same_site {
            if !["strict", "lax", "none"].contains(&s.to_ascii_lowercase().as_str()) {
                return Err(anyhow!("auth.cookie_same_site must be strict, lax or none"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_serve_port_5000_with_token_cookie() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.server.port, 5000);
        assert_eq!(cfg.auth.cookie_name, "token");
        assert_eq!(cfg.auth.token_ttl_secs, 3600);
        assert!(!cfg.auth.cookie_secure);
        assert!(cfg.auth.cookie_same_site.is_none());
        assert_eq!(cfg.cors.allowed_origins.len(), 2);
    }

    #[test]
    fn missing_secret_is_fatal() {
        let mut cfg = AppConfig::default();
        cfg.database.backend = StoreBackend::Memory;
        let err = cfg.normalize_and_validate().unwrap_err();
        assert!(err.to_string().contains("ACCESS_TOKEN_SECRET"));
    }

    #[test]
    fn env_overlay_fills_values() {
        let mut cfg = AppConfig::default();
        cfg.apply_env_with(env(&[
            ("PORT", "8088"),
            ("ACCESS_TOKEN_SECRET", "s3cr3t"),
            ("DB_USER", "doc"),
            ("DB_PASS", "pw"),
            ("STRICT_BOOKING_SCOPE", "true"),
            ("CORS_ORIGINS", "http://a.test, http://b.test,"),
        ]))
        .unwrap();
        assert_eq!(cfg.server.port, 8088);
        assert_eq!(cfg.auth.jwt_secret, "s3cr3t");
        assert_eq!(cfg.database.url, "postgres://doc:pw@localhost:5432/car_doctor");
        assert!(cfg.auth.strict_booking_scope);
        assert_eq!(cfg.cors.allowed_origins, vec!["http://a.test", "http://b.test"]);
        cfg.normalize_and_validate().unwrap();
    }

    #[test]
    fn database_url_env_wins_over_parts() {
        let mut cfg = AppConfig::default();
        cfg.apply_env_with(env(&[
            ("DATABASE_URL", "postgres://x@db/y"),
            ("DB_USER", "doc"),
            ("DB_PASS", "pw"),
        ]))
        .unwrap();
        assert_eq!(cfg.database.url, "postgres://x@db/y");
    }

    #[test]
    fn postgres_requires_url() {
        let mut cfg = AppConfig::default();
        cfg.auth.jwt_secret = "s".into();
        assert!(cfg.normalize_and_validate().is_err());
        cfg.database.backend = StoreBackend::Memory;
        assert!(cfg.normalize_and_validate().is_ok());
    }

    #[test]
    fn parses_toml_sections() {
        let cfg = parse(
            r#"
            [server]
            host = "0.0.0.0"
            port = 7000

            [database]
            backend = "memory"

            [auth]
            jwt_secret = "abc"
            cookie_same_site = "lax"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.port, 7000);
        assert_eq!(cfg.database.backend, StoreBackend::Memory);
        assert_eq!(cfg.auth.cookie_same_site.as_deref(), Some("lax"));
        assert_eq!(cfg.auth.cookie_name, "token");
    }

    #[test]
    fn rejects_unknown_same_site() {
        let mut cfg = AppConfig::default();
        cfg.database.backend = StoreBackend::Memory;
        cfg.auth.jwt_secret = "s".into();
        cfg.auth.cookie_same_site = Some("sometimes".into());
        assert!(cfg.normalize_and_validate().is_err());
    }

    #[test]
    fn unparseable_env_values_are_reported_by_key() {
        let cases = [
            ("DATABASE_BACKEND", "memroy"),
            ("PORT", "80x0"),
            ("SERVER_PORT", "70000"),
            ("TOKIO_WORKER_THREADS", "many"),
            ("TOKEN_TTL_SECS", "-1"),
            ("COOKIE_SECURE", "maybe"),
            ("STRICT_BOOKING_SCOPE", "2"),
        ];
        for (key, value) in cases {
            let mut cfg = AppConfig::default();
            let err = cfg.apply_env_with(env(&[(key, value)])).unwrap_err();
            assert!(err.to_string().contains(key), "{key}: {err}");
        }
        let mut cfg = AppConfig::default();
        let err = cfg.apply_env_with(env(&[("DATABASE_BACKEND", "memroy")])).unwrap_err();
        assert!(err.to_string().contains("expected postgres or memory"));
    }

    #[test]
    fn token_ttl_is_bounded() {
        let mut cfg = AppConfig::default();
        cfg.database.backend = StoreBackend::Memory;
        cfg.auth.jwt_secret = "s".into();
        cfg.auth.token_ttl_secs = MAX_TOKEN_TTL_SECS;
        assert!(cfg.normalize_and_validate().is_ok());
        cfg.auth.token_ttl_secs = MAX_TOKEN_TTL_SECS + 1;
        assert!(cfg.normalize_and_validate().is_err());
        cfg.auth.token_ttl_secs = 10_000_000_000_000;
        assert!(cfg.normalize_and_validate().is_err());
    }
}
