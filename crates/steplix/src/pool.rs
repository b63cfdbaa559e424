//! Connection pool utilities

use crate::config::DatabaseConfig;
use crate::error::{OrmError, OrmResult};
use deadpool_postgres::{Manager, ManagerConfig, Pool, PoolBuilder, RecyclingMethod};
use tokio_postgres::NoTls;
use tokio_postgres::Socket;
use tokio_postgres::tls::{MakeTlsConnect, TlsConnect};

/// Create a connection pool for `config`, sized by its connection limit.
///
/// Uses `NoTls`; see [`create_pool_with_manager_config`] to inject a TLS
/// connector or tune the pool.
pub fn create_pool(config: &DatabaseConfig) -> OrmResult<Pool> {
    let max_size = config.effective_connection_limit();
    create_pool_with_manager_config(
        config.to_pg_config(),
        NoTls,
        default_manager_config(),
        |builder| builder.max_size(max_size),
    )
}

/// Create a connection pool with injected `deadpool_postgres::ManagerConfig` and `PoolBuilder`.
pub fn create_pool_with_manager_config<T>(
    pg_config: tokio_postgres::Config,
    tls: T,
    manager_config: ManagerConfig,
    configure_pool: impl FnOnce(PoolBuilder) -> PoolBuilder,
) -> OrmResult<Pool>
where
    T: MakeTlsConnect<Socket> + Clone + Sync + Send + 'static,
    T::Stream: Sync + Send,
    T::TlsConnect: Sync + Send,
    <T::TlsConnect as TlsConnect<Socket>>::Future: Send,
{
    let mgr = Manager::from_config(pg_config, tls, manager_config);
    configure_pool(Pool::builder(mgr))
        .build()
        .map_err(|e| OrmError::Pool(e.to_string()))
}

fn default_manager_config() -> ManagerConfig {
    ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    }
}
