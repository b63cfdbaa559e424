//! SQL text compiler.
//!
//! Every function here is pure: it takes an entity (table) name plus a
//! description of the statement and returns the SQL string. Values are
//! interpolated directly into the text (see [`Value::render`]); there are no
//! bind parameters and no escaping of embedded quotes.
//!
//! # Example
//!
//! ```ignore
//! use steplix::{map, query, StatementOptions};
//!
//! let sql = query::select(
//!     "users",
//!     &StatementOptions::new()
//!         .fields(["id", "name"])
//!         .filter(map! { "active" => 1 })
//!         .limit(10),
//! );
//! assert_eq!(sql, "SELECT id,name FROM users WHERE active = 1 LIMIT 10");
//! ```

mod condition;
mod options;

pub use condition::{AND, OR, compile, where_clause, where_leaf};
pub use options::{FieldExpr, Fields, KeyParser, OrderSpec, StatementOptions, resolve_options};

use crate::value::{Data, Value};

/// Alias used by [`count_field_default`].
pub const DEFAULT_COUNT_FIELD: &str = "total";

/// `SELECT <fields> FROM <entity><conditions>`
///
/// Options are resolved against [`StatementOptions::defaults`] first, so an
/// unset or empty field list selects `*`.
pub fn select(entity: &str, options: &StatementOptions) -> String {
    let options = resolve_options(options.clone(), &StatementOptions::defaults());
    let fields = options.fields.as_ref().map_or_else(|| "*".to_string(), fields);
    format!("SELECT {fields} FROM {entity}{}", conditions(&options))
}

/// `INSERT INTO <entity> (<keys>) VALUES (<values>)`
pub fn insert(entity: &str, data: &Data, options: &StatementOptions) -> String {
    let keys: Vec<String> = data.keys().map(|key| options.parse_key(key)).collect();
    format!(
        "INSERT INTO {entity} ({}) VALUES ({})",
        keys.join(", "),
        row_values(data)
    )
}

/// Multi-row insert.
///
/// Column names come from the first row only. Rows are expected to share its
/// key set and order; values of a row are emitted in that row's own order.
pub fn inserts(entity: &str, rows: &[Data], options: &StatementOptions) -> String {
    let keys: Vec<String> = rows
        .first()
        .map(|first| first.keys().map(|key| options.parse_key(key)).collect())
        .unwrap_or_default();
    let lines: Vec<String> = rows
        .iter()
        .map(|row| format!("({})", row_values(row)))
        .collect();

    format!(
        "INSERT INTO {entity} ({}) VALUES {}",
        keys.join(", "),
        lines.join(", ")
    )
}

/// `UPDATE <entity> SET <col> = <value>, ...<conditions>`
pub fn update(entity: &str, data: &Data, options: &StatementOptions) -> String {
    let assignments: Vec<String> = data
        .iter()
        .map(|(key, value)| format!("{} = {}", options.parse_key(key), value.render()))
        .collect();
    format!(
        "UPDATE {entity} SET {}{}",
        assignments.join(", "),
        conditions(options)
    )
}

/// `DELETE FROM <entity><conditions>`
pub fn destroy(entity: &str, options: &StatementOptions) -> String {
    format!("DELETE FROM {entity}{}", conditions(options))
}

/// `TRUNCATE TABLE <entity>`
pub fn truncate(entity: &str) -> String {
    format!("TRUNCATE TABLE {entity}")
}

/// Trailing clauses in fixed order: WHERE, ORDER BY, GROUP BY, LIMIT, OFFSET.
///
/// Only present clauses are emitted; an empty WHERE tree, empty order/group
/// lists and a zero limit/offset count as absent. The result is either empty
/// or starts with a single space.
pub fn conditions(options: &StatementOptions) -> String {
    let mut clauses = Vec::new();

    if let Some(filter) = options.filter.as_ref().filter(|f| !f.is_empty()) {
        clauses.push(format!("WHERE {}", where_clause(filter)));
    }
    if let Some(order) = options.order.as_ref().filter(|o| !o.is_empty()) {
        let order: Vec<String> = order.iter().map(ToString::to_string).collect();
        clauses.push(format!("ORDER BY {}", order.join(", ")));
    }
    if let Some(group) = options.group.as_ref().filter(|g| !g.is_empty()) {
        clauses.push(format!("GROUP BY {}", group.join(", ")));
    }
    if let Some(limit) = options.limit.filter(|&n| n > 0) {
        clauses.push(format!("LIMIT {limit}"));
    }
    if let Some(offset) = options.offset.filter(|&n| n > 0) {
        clauses.push(format!("OFFSET {offset}"));
    }

    if clauses.is_empty() {
        String::new()
    } else {
        format!(" {}", clauses.join(" "))
    }
}

/// Join a field list with `,`; a raw field string passes through unchanged.
pub fn fields(fields: &Fields) -> String {
    match fields {
        Fields::List(list) => list
            .iter()
            .map(FieldExpr::as_str)
            .collect::<Vec<_>>()
            .join(","),
        Fields::Raw(raw) => raw.clone(),
    }
}

/// `COUNT(*) AS <name>`
pub fn count_field(name: &str) -> String {
    format!("COUNT(*) AS {name}")
}

/// `COUNT(*) AS total`
pub fn count_field_default() -> String {
    count_field(DEFAULT_COUNT_FIELD)
}

/// Mark `sql` for verbatim emission.
pub fn literal(sql: impl Into<String>) -> Value {
    Value::literal(sql)
}

fn row_values(row: &Data) -> String {
    row.values()
        .map(Value::render)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests;
