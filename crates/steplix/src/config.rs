//! Connection configuration for [`Database`](crate::Database).

use crate::error::{OrmError, OrmResult};
use serde::Deserialize;
use std::time::Duration;

/// Pool size used when pooling is enabled without an explicit limit.
pub const DEFAULT_CONNECTION_LIMIT: usize = 100;

/// Prefix of the environment variables read by [`DatabaseConfig::from_env`].
pub const ENV_PREFIX: &str = "STEPLIX_DB_";

/// Connection settings.
///
/// Deserializable (e.g. from a `[database]` table of an application config
/// file) or built with the setter methods:
///
/// ```ignore
/// let config = DatabaseConfig::new("app")
///     .host("db.internal")
///     .user("app")
///     .password("secret")
///     .pool(32);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub database: String,
    /// Use a connection pool instead of one shared connection.
    pub use_pool: bool,
    /// Maximum pool size; only meaningful with `use_pool`.
    pub connection_limit: Option<usize>,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: None,
            database: "postgres".to_string(),
            use_pool: false,
            connection_limit: None,
            connect_timeout_secs: None,
        }
    }
}

impl DatabaseConfig {
    /// Defaults pointing at `database` on localhost.
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            ..Self::default()
        }
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Enable pooling with at most `limit` connections.
    pub fn pool(mut self, limit: usize) -> Self {
        self.use_pool = true;
        self.connection_limit = Some(limit);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_secs = Some(timeout.as_secs());
        self
    }

    /// The pool size actually used.
    pub fn effective_connection_limit(&self) -> usize {
        self.connection_limit.unwrap_or(DEFAULT_CONNECTION_LIMIT)
    }

    /// Load settings from `STEPLIX_DB_*` environment variables.
    ///
    /// A `.env` file in the working directory is loaded first, if present.
    /// Recognized variables: `HOST`, `PORT`, `USER`, `PASSWORD`, `NAME`,
    /// `USE_POOL`, `CONNECTION_LIMIT`, `CONNECT_TIMEOUT`. Unset variables keep
    /// their defaults.
    pub fn from_env() -> OrmResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(format!("{ENV_PREFIX}{key}")).ok())
    }

    /// Like [`DatabaseConfig::from_env`], reading variables (without prefix)
    /// through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> OrmResult<Self> {
        let mut config = Self::default();

        if let Some(host) = lookup("HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("PORT") {
            config.port = parse_var("PORT", &port)?;
        }
        if let Some(user) = lookup("USER") {
            config.user = user;
        }
        if let Some(password) = lookup("PASSWORD") {
            config.password = Some(password);
        }
        if let Some(name) = lookup("NAME") {
            config.database = name;
        }
        if let Some(use_pool) = lookup("USE_POOL") {
            config.use_pool = parse_flag(&use_pool);
        }
        if let Some(limit) = lookup("CONNECTION_LIMIT") {
            config.connection_limit = Some(parse_var("CONNECTION_LIMIT", &limit)?);
        }
        if let Some(timeout) = lookup("CONNECT_TIMEOUT") {
            config.connect_timeout_secs = Some(parse_var("CONNECT_TIMEOUT", &timeout)?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that can never connect.
    pub fn validate(&self) -> OrmResult<()> {
        if self.host.trim().is_empty() {
            return Err(OrmError::config("host must not be empty"));
        }
        if self.database.trim().is_empty() {
            return Err(OrmError::config("database must not be empty"));
        }
        if self.use_pool && self.connection_limit == Some(0) {
            return Err(OrmError::config("connection_limit must be at least 1"));
        }
        Ok(())
    }

    /// Build the `tokio_postgres` configuration.
    pub fn to_pg_config(&self) -> tokio_postgres::Config {
        let mut pg = tokio_postgres::Config::new();
        pg.host(&self.host)
            .port(self.port)
            .user(&self.user)
            .dbname(&self.database);
        if let Some(password) = &self.password {
            pg.password(password);
        }
        if let Some(secs) = self.connect_timeout_secs {
            pg.connect_timeout(Duration::from_secs(secs));
        }
        pg
    }
}

fn parse_var<T>(name: &str, raw: &str) -> OrmResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| OrmError::config(format!("invalid {ENV_PREFIX}{name} '{raw}': {e}")))
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
