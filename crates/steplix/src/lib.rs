//! # steplix
//!
//! A small Postgres data-access layer for Rust.
//!
//! ## Features
//!
//! - **SQL compiler**: turn a declarative field list, WHERE tree and trailing
//!   clauses into complete SQL strings (`query` module, no I/O)
//! - **Ordered WHERE trees**: nested `OR` groups, operator maps, `IN` and `BETWEEN`
//! - **Database handle**: one shared connection or a `deadpool-postgres` pool,
//!   with callback-scoped transactions
//! - **Models**: per-table CRUD (`find`, `get_by_id`, `create`, `update`,
//!   `destroy`, `count`, `exist`) generic over any `GenericClient`
//! - **Tracing**: compiled SQL is emitted under the `steplix.sql` target
//!
//! ## SQL compiler
//!
//! ```ignore
//! use steplix::{map, query, StatementOptions};
//!
//! let sql = query::select(
//!     "users",
//!     &StatementOptions::new()
//!         .fields(["id", "email"])
//!         .filter(map! {
//!             "active" => 1,
//!             "OR" => map! { "role" => "admin", "id" => vec![1, 2, 3] },
//!         })
//!         .order_by(("created_at", "DESC"))
//!         .limit(10),
//! );
//! assert_eq!(
//!     sql,
//!     "SELECT id,email FROM users WHERE active = 1 AND (role = 'admin' OR id IN (1,2,3)) \
//!      ORDER BY created_at DESC LIMIT 10"
//! );
//! ```
//!
//! Values are inlined into the SQL text without escaping; only pass trusted
//! input to the compiler.
//!
//! The compiler writes MySQL-dialect text. The one construct Postgres reads
//! differently is a text `IN` list: `name IN ("a","b")` names columns there.
//! When such a filter is executed through [`Database`] or [`Model`], pass the
//! elements as single-quoted literals instead:
//!
//! ```ignore
//! let names = vec![steplix::literal("'a'"), steplix::literal("'b'")];
//! let filter = map! { "name" => names }; // name IN ('a','b')
//! ```
//!
//! Numeric and boolean `IN` lists run unchanged.
//!
//! ## Database and models
//!
//! ```ignore
//! use steplix::{map, Database, DatabaseConfig, FromRow, Model, ModelOptions, Record};
//!
//! #[derive(Debug, FromRow, Record)]
//! #[orm(table = "users")]
//! struct User {
//!     id: i64,
//!     email: String,
//! }
//!
//! let db = Database::connect(DatabaseConfig::from_env()?).await?;
//! let users = Model::<User>::of(db.clone());
//!
//! let user = users.get_by_id(1, ModelOptions::new()).await?;
//! let removed = db
//!     .transaction(|conn| {
//!         let users = users.on(conn);
//!         async move { users.destroy(1, ModelOptions::new()).await }
//!     })
//!     .await?;
//! ```

pub mod client;
pub mod config;
pub mod database;
pub mod error;
pub mod log;
pub mod model;
pub mod query;
pub mod row;
pub mod value;

#[cfg(feature = "pool")]
pub mod pool;

pub use client::{Connection, GenericClient};
pub use config::DatabaseConfig;
pub use database::Database;
pub use error::{OrmError, OrmResult};
pub use log::SqlLogger;
pub use model::{Model, ModelOptions, Record};
pub use query::{FieldExpr, Fields, KeyParser, OrderSpec, StatementOptions, literal};
pub use row::{FromRow, RowExt};
pub use value::{ConditionMap, Data, Value};

#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_with_manager_config};

#[cfg(feature = "derive")]
pub use steplix_derive::{FromRow, Record};

// Used by the derive macros' generated code.
pub use tokio_postgres;
