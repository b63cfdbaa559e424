//! Row mapping traits and utilities

use crate::error::{OrmError, OrmResult};
use crate::value::Value;
use tokio_postgres::Row;
use tokio_postgres::types::Type;

/// Trait for converting a database row into a Rust struct
pub trait FromRow: Sized {
    /// Convert a database row into Self
    fn from_row(row: &Row) -> OrmResult<Self>;
}

/// Extension trait for Row to provide typed access
pub trait RowExt {
    /// Try to get a column value, returning OrmError::Decode on failure
    fn try_get_column<T>(&self, column: &str) -> OrmResult<T>
    where
        T: for<'a> tokio_postgres::types::FromSql<'a>;

    /// Read a column back into a compiler [`Value`].
    ///
    /// Supports the column types usually found in key columns: integers, text,
    /// booleans and UUIDs. SQL `NULL` becomes [`Value::Null`].
    fn try_get_value(&self, column: &str) -> OrmResult<Value>;
}

impl RowExt for Row {
    fn try_get_column<T>(&self, column: &str) -> OrmResult<T>
    where
        T: for<'a> tokio_postgres::types::FromSql<'a>,
    {
        self.try_get(column)
            .map_err(|e| OrmError::decode(column, e.to_string()))
    }

    fn try_get_value(&self, column: &str) -> OrmResult<Value> {
        let ty = self
            .columns()
            .iter()
            .find(|c| c.name() == column)
            .map(|c| c.type_().clone())
            .ok_or_else(|| OrmError::decode(column, "column not present in row"))?;

        let value = match ty {
            Type::INT8 => Value::from(self.try_get_column::<Option<i64>>(column)?),
            Type::INT4 => Value::from(self.try_get_column::<Option<i32>>(column)?),
            Type::INT2 => Value::from(self.try_get_column::<Option<i16>>(column)?),
            Type::BOOL => Value::from(self.try_get_column::<Option<bool>>(column)?),
            Type::UUID => Value::from(self.try_get_column::<Option<uuid::Uuid>>(column)?),
            Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => {
                Value::from(self.try_get_column::<Option<String>>(column)?)
            }
            other => {
                return Err(OrmError::decode(
                    column,
                    format!("unsupported column type '{other}' for a key value"),
                ));
            }
        };
        Ok(value)
    }
}
