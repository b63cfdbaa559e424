//! Generic client trait for unified database access.

use crate::error::{OrmError, OrmResult};
use std::fmt;
use std::sync::Arc;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// A trait that unifies database clients, pooled connections and transactions.
///
/// [`Model`](crate::Model) is generic over this trait, so the same model code
/// runs against a [`Database`](crate::Database), a single [`Connection`] handed
/// out by [`Database::transaction`](crate::Database::transaction), or a raw
/// `tokio_postgres` client.
pub trait GenericClient: Send + Sync {
    /// Execute a query and return all rows.
    fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = OrmResult<Vec<Row>>> + Send;

    /// Execute a query and return the **first** row.
    ///
    /// Semantics:
    /// - 0 rows: returns [`OrmError::NotFound`]
    /// - 1 or more rows: returns the first row
    fn query_one(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = OrmResult<Row>> + Send {
        async move {
            let rows = self.query(sql, params).await?;
            rows.into_iter()
                .next()
                .ok_or_else(|| OrmError::not_found("Expected one row, got none"))
        }
    }

    /// Execute a query and return the first row, if any.
    fn query_opt(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = OrmResult<Option<Row>>> + Send {
        async move {
            let rows = self.query(sql, params).await?;
            Ok(rows.into_iter().next())
        }
    }

    /// Execute a statement and return the number of affected rows.
    fn execute(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = OrmResult<u64>> + Send;

    /// Execute one or more statements over the simple query protocol.
    ///
    /// Used for `BEGIN` / `COMMIT` / `ROLLBACK`.
    fn batch_execute(&self, sql: &str) -> impl std::future::Future<Output = OrmResult<()>> + Send;
}

impl GenericClient for tokio_postgres::Client {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<Vec<Row>> {
        tokio_postgres::Client::query(self, sql, params)
            .await
            .map_err(OrmError::from_db_error)
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<u64> {
        tokio_postgres::Client::execute(self, sql, params)
            .await
            .map_err(OrmError::from_db_error)
    }

    async fn batch_execute(&self, sql: &str) -> OrmResult<()> {
        tokio_postgres::Client::batch_execute(self, sql)
            .await
            .map_err(OrmError::from_db_error)
    }
}

impl GenericClient for tokio_postgres::Transaction<'_> {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<Vec<Row>> {
        tokio_postgres::Transaction::query(self, sql, params)
            .await
            .map_err(OrmError::from_db_error)
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<u64> {
        tokio_postgres::Transaction::execute(self, sql, params)
            .await
            .map_err(OrmError::from_db_error)
    }

    async fn batch_execute(&self, sql: &str) -> OrmResult<()> {
        tokio_postgres::Transaction::batch_execute(self, sql)
            .await
            .map_err(OrmError::from_db_error)
    }
}

#[cfg(feature = "pool")]
impl GenericClient for deadpool_postgres::Client {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<Vec<Row>> {
        let client: &tokio_postgres::Client = self;
        GenericClient::query(client, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<u64> {
        let client: &tokio_postgres::Client = self;
        GenericClient::execute(client, sql, params).await
    }

    async fn batch_execute(&self, sql: &str) -> OrmResult<()> {
        let client: &tokio_postgres::Client = self;
        GenericClient::batch_execute(client, sql).await
    }
}

impl<C: GenericClient> GenericClient for &C {
    fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = OrmResult<Vec<Row>>> + Send {
        (**self).query(sql, params)
    }

    fn query_one(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = OrmResult<Row>> + Send {
        (**self).query_one(sql, params)
    }

    fn query_opt(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = OrmResult<Option<Row>>> + Send {
        (**self).query_opt(sql, params)
    }

    fn execute(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = OrmResult<u64>> + Send {
        (**self).execute(sql, params)
    }

    fn batch_execute(&self, sql: &str) -> impl std::future::Future<Output = OrmResult<()>> + Send {
        (**self).batch_execute(sql)
    }
}

/// An owned, cloneable handle to one physical connection.
///
/// Either the shared client of a single-connection [`Database`](crate::Database)
/// or a connection checked out of its pool (returned to the pool when the last
/// clone is dropped).
#[derive(Clone)]
pub struct Connection(ConnectionInner);

#[derive(Clone)]
enum ConnectionInner {
    Single(Arc<tokio_postgres::Client>),
    #[cfg(feature = "pool")]
    Pooled(Arc<deadpool_postgres::Client>),
}

impl Connection {
    pub(crate) fn single(client: Arc<tokio_postgres::Client>) -> Self {
        Self(ConnectionInner::Single(client))
    }

    #[cfg(feature = "pool")]
    pub(crate) fn pooled(client: deadpool_postgres::Client) -> Self {
        Self(ConnectionInner::Pooled(Arc::new(client)))
    }

    /// The underlying `tokio_postgres` client.
    pub fn client(&self) -> &tokio_postgres::Client {
        match &self.0 {
            ConnectionInner::Single(client) => client,
            #[cfg(feature = "pool")]
            ConnectionInner::Pooled(client) => client,
        }
    }

    pub fn is_pooled(&self) -> bool {
        !matches!(self.0, ConnectionInner::Single(_))
    }

    pub fn is_closed(&self) -> bool {
        self.client().is_closed()
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("pooled", &self.is_pooled())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl GenericClient for Connection {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<Vec<Row>> {
        GenericClient::query(self.client(), sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<u64> {
        GenericClient::execute(self.client(), sql, params).await
    }

    async fn batch_execute(&self, sql: &str) -> OrmResult<()> {
        GenericClient::batch_execute(self.client(), sql).await
    }
}
