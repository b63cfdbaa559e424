//! Minimal per-table CRUD layer on top of the SQL compiler.
//!
//! # Example
//!
//! ```ignore
//! use steplix::{map, Database, FromRow, Model, ModelOptions, Record};
//!
//! #[derive(Debug, FromRow, Record)]
//! #[orm(table = "users")]
//! struct User {
//!     id: i64,
//!     active: i32,
//! }
//!
//! let users = Model::<User>::of(db.clone());
//! let created = users
//!     .create(&map! { "active" => 1, "created_at" => steplix::literal("NOW()") }, ModelOptions::new())
//!     .await?;
//! let active = users.count(ModelOptions::new().filter(map! { "active" => 1 })).await?;
//! ```
//!
//! Filters go through the same compiler as [`query::select`], so a text `IN`
//! list renders its elements double-quoted and Postgres rejects it as an
//! unknown column. Use single-quoted literals for those elements
//! (`vec![literal("'a'"), literal("'b'")]`).

use crate::client::{Connection, GenericClient};
use crate::database::Database;
use crate::error::OrmResult;
use crate::log::SqlLogger;
use crate::query::{self, FieldExpr, Fields, StatementOptions};
use crate::row::{FromRow, RowExt};
use crate::value::{ConditionMap, Data, Value};
use futures_util::future::try_join_all;
use std::future::Future;
use std::marker::PhantomData;

/// Key column used when no other field is given.
pub const DEFAULT_FIELD_ID: &str = "id";

/// Environment variable that turns on SQL debug logging for every model call.
pub const DEBUG_ENV: &str = "LOG_DATABASE";

/// A row type managed by a [`Model`].
pub trait Record: FromRow + Send {
    /// Table used by [`Model::of`].
    const TABLE: &'static str;

    /// Hook run on every record fetched through [`Model::get_one`] (and the
    /// calls built on it) while `populate` is enabled. Load related data here.
    ///
    /// The default returns the record unchanged.
    fn populate<C: GenericClient>(
        self,
        conn: &C,
        options: &ModelOptions,
    ) -> impl Future<Output = OrmResult<Self>> + Send {
        let _ = (conn, options);
        async move { Ok(self) }
    }
}

/// Per-call options of a [`Model`].
#[derive(Debug, Clone, PartialEq)]
pub struct ModelOptions {
    /// Field list, WHERE tree and trailing clauses.
    pub query: StatementOptions,
    /// Run [`Record::populate`] on fetched records. Default `true`.
    pub populate: bool,
    /// Log compiled SQL. Defaults to the `LOG_DATABASE` environment variable.
    pub debug: bool,
    /// [`Model::find`] maps the selected rows directly instead of re-fetching
    /// each record by id.
    pub unfilled: bool,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            query: StatementOptions::default(),
            populate: true,
            debug: debug_from_env(),
            unfilled: false,
        }
    }
}

impl From<StatementOptions> for ModelOptions {
    fn from(query: StatementOptions) -> Self {
        Self {
            query,
            ..Self::default()
        }
    }
}

impl ModelOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, query: StatementOptions) -> Self {
        self.query = query;
        self
    }

    pub fn fields(mut self, fields: impl Into<Fields>) -> Self {
        self.query.fields = Some(fields.into());
        self
    }

    pub fn filter(mut self, filter: ConditionMap) -> Self {
        self.query.filter = Some(filter);
        self
    }

    pub fn populate(mut self, populate: bool) -> Self {
        self.populate = populate;
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn unfilled(mut self, unfilled: bool) -> Self {
        self.unfilled = unfilled;
        self
    }

    /// The flags of these options without any query part.
    pub fn without_query(&self) -> Self {
        Self {
            query: StatementOptions::default(),
            ..self.clone()
        }
    }

    fn with_key(mut self, field: &str, id: Value) -> Self {
        self.query
            .filter
            .get_or_insert_with(ConditionMap::new)
            .insert(field, id);
        self
    }
}

/// CRUD operations for one table.
///
/// `C` is the executor: a [`Database`] by default, or a [`Connection`] inside
/// a transaction (see [`Model::on`]).
pub struct Model<T, C = Database> {
    entity: String,
    conn: C,
    logger: SqlLogger,
    _marker: PhantomData<fn() -> T>,
}

impl<T, C: Clone> Clone for Model<T, C> {
    fn clone(&self) -> Self {
        Self {
            entity: self.entity.clone(),
            conn: self.conn.clone(),
            logger: self.logger.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T, C> std::fmt::Debug for Model<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model").field("entity", &self.entity).finish()
    }
}

impl<T: Record, C: GenericClient> Model<T, C> {
    /// A model for `entity` executing through `conn`.
    pub fn new(entity: impl Into<String>, conn: C) -> Self {
        Self {
            entity: entity.into(),
            conn,
            logger: SqlLogger::new(),
            _marker: PhantomData,
        }
    }

    /// A model for [`Record::TABLE`].
    pub fn of(conn: C) -> Self {
        Self::new(T::TABLE, conn)
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn client(&self) -> &C {
        &self.conn
    }

    /// The same model, executing through `conn` (e.g. a transaction's connection).
    pub fn on<D: GenericClient>(&self, conn: D) -> Model<T, D> {
        Model {
            entity: self.entity.clone(),
            conn,
            logger: self.logger.clone(),
            _marker: PhantomData,
        }
    }

    /// Mark `sql` for verbatim emission.
    pub fn literal(sql: impl Into<String>) -> Value {
        query::literal(sql)
    }

    /// Select matching records.
    ///
    /// Only the `id` column is selected unless fields are given; each id is
    /// then re-fetched with [`Model::get_by_id`] (populated records), unless
    /// `unfilled` is set, in which case the selected rows are mapped directly.
    pub async fn find(&self, options: ModelOptions) -> OrmResult<Vec<T>> {
        let mut options = options;
        if options.query.fields.as_ref().is_none_or(Fields::is_empty) {
            options.query.fields = Some(Fields::from([DEFAULT_FIELD_ID]));
        }

        let sql = query::select(&self.entity, &options.query);
        self.log(&options, &sql);
        let rows = self.conn.query(&sql, &[]).await?;

        if options.unfilled {
            return rows.iter().map(T::from_row).collect();
        }

        let nested = options.without_query();
        let ids = rows
            .iter()
            .map(|row| row.try_get_value(DEFAULT_FIELD_ID))
            .collect::<OrmResult<Vec<_>>>()?;
        let models = try_join_all(
            ids.into_iter()
                .map(|id| self.get_by_id(id, nested.clone())),
        )
        .await?;

        Ok(models.into_iter().flatten().collect())
    }

    /// Fetch the record whose `id` equals `id`.
    pub async fn get_by_id(
        &self,
        id: impl Into<Value>,
        options: ModelOptions,
    ) -> OrmResult<Option<T>> {
        self.get_by_field(DEFAULT_FIELD_ID, id, options).await
    }

    /// Fetch the first record whose `field` equals `value`.
    pub async fn get_by_field(
        &self,
        field: &str,
        value: impl Into<Value>,
        options: ModelOptions,
    ) -> OrmResult<Option<T>> {
        self.get_one(options.with_key(field, value.into())).await
    }

    /// Fetch the first matching record, populated when enabled.
    pub async fn get_one(&self, options: ModelOptions) -> OrmResult<Option<T>> {
        let sql = query::select(&self.entity, &options.query);
        self.log(&options, &sql);

        let Some(row) = self.conn.query_opt(&sql, &[]).await? else {
            return Ok(None);
        };
        let mut record = T::from_row(&row)?;
        if options.populate {
            record = record.populate(&self.conn, &options.without_query()).await?;
        }
        Ok(Some(record))
    }

    /// Insert `data` and fetch the new record by its `id`.
    ///
    /// The statement is sent with `RETURNING id` to learn the new key.
    pub async fn create(&self, data: &Data, options: ModelOptions) -> OrmResult<Option<T>> {
        let sql = format!(
            "{} RETURNING {DEFAULT_FIELD_ID}",
            query::insert(&self.entity, data, &options.query)
        );
        self.log(&options, &sql);

        let Some(row) = self.conn.query_opt(&sql, &[]).await? else {
            return Ok(None);
        };
        let id = row.try_get_value(DEFAULT_FIELD_ID)?;
        self.get_by_id(id, options.without_query()).await
    }

    /// Insert `data` and return the affected row count.
    pub async fn create_raw(&self, data: &Data, options: ModelOptions) -> OrmResult<u64> {
        let sql = query::insert(&self.entity, data, &options.query);
        self.log(&options, &sql);
        self.conn.execute(&sql, &[]).await
    }

    /// Insert several rows in one statement; all rows must share the first
    /// row's columns.
    pub async fn create_many(&self, rows: &[Data], options: ModelOptions) -> OrmResult<u64> {
        let sql = query::inserts(&self.entity, rows, &options.query);
        self.log(&options, &sql);
        self.conn.execute(&sql, &[]).await
    }

    /// Update the record(s) whose `id` equals `id`, then fetch them again.
    pub async fn update(
        &self,
        data: &Data,
        id: impl Into<Value>,
        options: ModelOptions,
    ) -> OrmResult<Vec<T>> {
        self.update_by(data, DEFAULT_FIELD_ID, id, options).await
    }

    /// Update the record(s) whose `field` equals `value`, then fetch them again.
    ///
    /// The re-fetch uses the same WHERE tree, so updating the key column
    /// itself returns no records.
    pub async fn update_by(
        &self,
        data: &Data,
        field: &str,
        value: impl Into<Value>,
        options: ModelOptions,
    ) -> OrmResult<Vec<T>> {
        let options = options.with_key(field, value.into());
        self.run_update(data, &options).await?;
        self.find(options).await
    }

    /// Update the record(s) whose `id` equals `id` and return the affected row count.
    pub async fn update_raw(
        &self,
        data: &Data,
        id: impl Into<Value>,
        options: ModelOptions,
    ) -> OrmResult<u64> {
        let options = options.with_key(DEFAULT_FIELD_ID, id.into());
        self.run_update(data, &options).await
    }

    /// Delete the record(s) whose `id` equals `id`.
    pub async fn destroy(&self, id: impl Into<Value>, options: ModelOptions) -> OrmResult<u64> {
        self.destroy_by(DEFAULT_FIELD_ID, id, options).await
    }

    /// Delete the record(s) whose `field` equals `value`.
    pub async fn destroy_by(
        &self,
        field: &str,
        value: impl Into<Value>,
        options: ModelOptions,
    ) -> OrmResult<u64> {
        let options = options.with_key(field, value.into());
        let sql = query::destroy(&self.entity, &options.query);
        self.log(&options, &sql);
        self.conn.execute(&sql, &[]).await
    }

    /// Count matching rows (`COUNT(*) AS total`).
    pub async fn count(&self, options: ModelOptions) -> OrmResult<i64> {
        let mut options = options;
        options.query.fields = Some(Fields::list([FieldExpr::literal(
            query::count_field_default(),
        )]));
        options.populate = false;

        let sql = query::select(&self.entity, &options.query);
        self.log(&options, &sql);

        match self.conn.query_opt(&sql, &[]).await? {
            Some(row) => Ok(row
                .try_get_column::<Option<i64>>(query::DEFAULT_COUNT_FIELD)?
                .unwrap_or(0)),
            None => Ok(0),
        }
    }

    /// `true` when at least one row matches.
    pub async fn exist(&self, options: ModelOptions) -> OrmResult<bool> {
        let sql = query::select(&self.entity, &options.query);
        self.log(&options, &sql);
        Ok(self.conn.query_opt(&sql, &[]).await?.is_some())
    }

    async fn run_update(&self, data: &Data, options: &ModelOptions) -> OrmResult<u64> {
        let sql = query::update(&self.entity, data, &options.query);
        self.log(options, &sql);
        self.conn.execute(&sql, &[]).await
    }

    fn log(&self, options: &ModelOptions, sql: &str) {
        if options.debug {
            self.logger.log(&self.entity, sql);
        }
    }
}

impl<T: Record> Model<T, Database> {
    /// Run `callback` inside a transaction of the model's database.
    ///
    /// Use [`Model::on`] with the given connection for statements that must
    /// be part of the transaction.
    pub async fn transaction<F, Fut, R>(&self, callback: F) -> OrmResult<R>
    where
        F: FnOnce(Connection) -> Fut,
        Fut: Future<Output = OrmResult<R>>,
    {
        self.conn.transaction(callback).await
    }
}

fn debug_from_env() -> bool {
    std::env::var(DEBUG_ENV).is_ok_and(|v| is_truthy(&v))
}

fn is_truthy(raw: &str) -> bool {
    let raw = raw.trim();
    !raw.is_empty() && raw != "0" && !raw.eq_ignore_ascii_case("false")
}
