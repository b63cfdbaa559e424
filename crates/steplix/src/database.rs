//! Database handle: connection management, execution and transactions.
//!
//! # Example
//!
//! ```ignore
//! use steplix::{Database, DatabaseConfig, GenericClient};
//!
//! let db = Database::connect(DatabaseConfig::from_env()?).await?;
//! let tables = db.query("SELECT table_name FROM information_schema.tables", &[]).await?;
//!
//! let total = db
//!     .transaction(|conn| async move {
//!         conn.execute("UPDATE accounts SET balance = balance - 10 WHERE id = 1", &[]).await?;
//!         conn.execute("UPDATE accounts SET balance = balance + 10 WHERE id = 2", &[]).await
//!     })
//!     .await?;
//!
//! db.end().await?;
//! ```

use crate::client::{Connection, GenericClient};
use crate::config::DatabaseConfig;
use crate::error::{OrmError, OrmResult};
use crate::log::SqlLogger;
use crate::log::SQL_TARGET;
use crate::map;
use crate::query::{self, StatementOptions};
use crate::row::RowExt;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tokio_postgres::types::ToSql;
use tokio_postgres::{NoTls, Row};
use tracing::Level;

/// A cloneable handle to a single connection or a connection pool.
///
/// Clones share the same connection(s). After [`Database::end`] every call
/// fails with a connection error until [`Database::reconnect`] is called.
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

struct DatabaseInner {
    config: DatabaseConfig,
    backend: RwLock<Option<Backend>>,
    logger: SqlLogger,
    /// Set when a transaction on the shared client was abandoned; the next
    /// `acquire` rolls it back before handing the client out.
    rollback_pending: AtomicBool,
}

#[derive(Clone)]
enum Backend {
    Single(Arc<tokio_postgres::Client>),
    #[cfg(feature = "pool")]
    Pool(deadpool_postgres::Pool),
}

impl Database {
    /// Connect according to `config`.
    ///
    /// With `use_pool` a pool of up to `connection_limit` connections is
    /// created (connections are opened lazily); otherwise one connection is
    /// opened now and its driver task is spawned on the current tokio runtime.
    pub async fn connect(config: DatabaseConfig) -> OrmResult<Self> {
        config.validate()?;
        let backend = open(&config).await?;
        Ok(Self {
            inner: Arc::new(DatabaseInner {
                config,
                backend: RwLock::new(Some(backend)),
                logger: SqlLogger::new().level(Level::TRACE),
                rollback_pending: AtomicBool::new(false),
            }),
        })
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.inner.config
    }

    /// Re-open the connection after [`Database::end`]. No-op while connected.
    pub async fn reconnect(&self) -> OrmResult<()> {
        let mut backend = self.inner.backend.write().await;
        if backend.is_none() {
            *backend = Some(open(&self.inner.config).await?);
        }
        Ok(())
    }

    pub async fn is_connected(&self) -> bool {
        self.inner.backend.read().await.is_some()
    }

    /// Get a connection: the shared client, or one checked out of the pool.
    pub async fn acquire(&self) -> OrmResult<Connection> {
        let backend = self.inner.backend.read().await.clone();
        match backend {
            Some(Backend::Single(client)) => {
                let conn = Connection::single(client);
                if self.inner.rollback_pending.swap(false, Ordering::SeqCst) {
                    conn.batch_execute("ROLLBACK").await?;
                }
                Ok(conn)
            }
            #[cfg(feature = "pool")]
            Some(Backend::Pool(pool)) => Ok(Connection::pooled(pool.get().await?)),
            None => Err(OrmError::closed()),
        }
    }

    /// Run `callback` inside a transaction.
    ///
    /// The callback receives the connection the transaction lives on; every
    /// statement of the transaction must go through it. `Ok` commits, `Err`
    /// rolls back and returns the original error.
    ///
    /// If the returned future is dropped before it completes (a timeout, a
    /// cancelled task) or the callback panics, the transaction is rolled
    /// back: a pooled connection is rolled back before it returns to the pool,
    /// the shared client before its next use through this handle.
    ///
    /// In single-connection mode other users of this handle share the same
    /// session while the transaction is open.
    pub async fn transaction<F, Fut, T>(&self, callback: F) -> OrmResult<T>
    where
        F: FnOnce(Connection) -> Fut,
        Fut: Future<Output = OrmResult<T>>,
    {
        let conn = self.acquire().await?;
        conn.batch_execute("BEGIN").await?;
        let guard = OpenTransaction {
            conn: Some(conn.clone()),
            inner: Arc::clone(&self.inner),
        };

        let result = match callback(conn.clone()).await {
            Ok(value) => conn.batch_execute("COMMIT").await.map(|()| value),
            Err(error) => match conn.batch_execute("ROLLBACK").await {
                Ok(()) => Err(error),
                Err(rollback_err) => Err(OrmError::Other(format!(
                    "{error} (rollback failed: {rollback_err})"
                ))),
            },
        };
        guard.disarm();
        result
    }

    /// `true` when the configured database has at least one table.
    ///
    /// Only schemas on the search path count; the system catalogs are always
    /// present and are ignored.
    pub async fn is_alive(&self) -> OrmResult<bool> {
        let sql = alive_statement(&self.inner.config.database);
        let rows = self.query(&sql, &[]).await?;
        for row in &rows {
            let name: Option<String> = row.try_get_column("name")?;
            if name.is_some_and(|n| !n.is_empty()) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Round-trip a trivial statement.
    pub async fn ping(&self) -> OrmResult<bool> {
        let conn = self.acquire().await?;
        conn.batch_execute("SELECT 1").await?;
        Ok(true)
    }

    /// Close the pool / drop the shared client.
    ///
    /// Connections still held by in-flight work close when released.
    pub async fn end(&self) -> OrmResult<()> {
        let backend = self.inner.backend.write().await.take();
        match backend {
            #[cfg(feature = "pool")]
            Some(Backend::Pool(pool)) => pool.close(),
            Some(Backend::Single(_)) => {}
            None => return Err(OrmError::closed()),
        }
        self.inner.rollback_pending.store(false, Ordering::SeqCst);
        tracing::debug!(target: SQL_TARGET, database = %self.inner.config.database, "database connection ended");
        Ok(())
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("host", &self.inner.config.host)
            .field("database", &self.inner.config.database)
            .field("use_pool", &self.inner.config.use_pool)
            .finish()
    }
}

impl GenericClient for Database {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<Vec<Row>> {
        self.inner.logger.log("query", sql);
        let conn = self.acquire().await?;
        conn.query(sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<u64> {
        self.inner.logger.log("execute", sql);
        let conn = self.acquire().await?;
        conn.execute(sql, params).await
    }

    async fn batch_execute(&self, sql: &str) -> OrmResult<()> {
        self.inner.logger.log("batch_execute", sql);
        let conn = self.acquire().await?;
        conn.batch_execute(sql).await
    }
}

/// Rolls back a transaction whose future was dropped before it finished.
struct OpenTransaction {
    conn: Option<Connection>,
    inner: Arc<DatabaseInner>,
}

impl OpenTransaction {
    /// The transaction ended through COMMIT or ROLLBACK.
    fn disarm(mut self) {
        self.conn = None;
    }
}

impl Drop for OpenTransaction {
    fn drop(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };
        tracing::warn!(target: SQL_TARGET, "transaction abandoned before completion; rolling back");

        if !conn.is_pooled() {
            self.inner.rollback_pending.store(true, Ordering::SeqCst);
            return;
        }

        // The spawned task owns the last handle to the pooled connection, so
        // the pool gets it back only after the rollback.
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(error) = conn.batch_execute("ROLLBACK").await {
                        tracing::warn!(target: SQL_TARGET, %error, "rollback of abandoned transaction failed");
                    }
                });
            }
            Err(_) => {
                tracing::warn!(
                    target: SQL_TARGET,
                    "no tokio runtime to roll back an abandoned transaction"
                );
            }
        }
    }
}

/// Query behind `is_alive`: user tables of `database` visible on the search path.
fn alive_statement(database: &str) -> String {
    query::select(
        "information_schema.tables",
        &StatementOptions::new()
            .fields(["table_name::text AS name"])
            .filter(map! {
                "table_catalog" => database,
                "table_schema" => query::literal("ANY(current_schemas(false))"),
            })
            .limit(1),
    )
}

async fn open(config: &DatabaseConfig) -> OrmResult<Backend> {
    if let Some(pool) = open_pool(config)? {
        return Ok(pool);
    }

    let (client, connection) = config
        .to_pg_config()
        .connect(NoTls)
        .await
        .map_err(|e| OrmError::Connection(e.to_string()))?;

    tokio::spawn(async move {
        if let Err(error) = connection.await {
            tracing::warn!(target: SQL_TARGET, %error, "database connection closed with error");
        }
    });

    Ok(Backend::Single(Arc::new(client)))
}

#[cfg(feature = "pool")]
fn open_pool(config: &DatabaseConfig) -> OrmResult<Option<Backend>> {
    if !config.use_pool {
        return Ok(None);
    }
    Ok(Some(Backend::Pool(crate::pool::create_pool(config)?)))
}

#[cfg(not(feature = "pool"))]
fn open_pool(config: &DatabaseConfig) -> OrmResult<Option<Backend>> {
    if config.use_pool {
        return Err(OrmError::config("use_pool requires the `pool` feature"));
    }
    Ok(None)
}
