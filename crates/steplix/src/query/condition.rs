//! WHERE-tree compiler.
//!
//! A [`ConditionMap`] is compiled entry by entry:
//!
//! - `"OR": {..}` (key matched case-insensitively) becomes a parenthesized group
//!   whose entries are joined with ` OR `.
//! - `"col": {"op": v, ..}` is an operator map: one comparison per operator,
//!   joined with the connector of the enclosing level.
//! - anything else is `col = value`.
//!
//! Leaves render arrays as `IN (...)` (JSON-quoted elements) or, for
//! `BETWEEN`/`NOT BETWEEN`, as two single-quoted bounds.

use crate::value::{ConditionMap, Value};

/// Connector between entries of a plain (AND) level.
pub const AND: &str = " AND ";
/// Connector between entries of an `OR` group.
pub const OR: &str = " OR ";

const OR_KEY: &str = "OR";

/// Compile a WHERE tree at the default ` AND ` connector.
///
/// ```ignore
/// let filter = map! { "id" => 1, "OR" => map! { "active" => 1, "banned" => 0 } };
/// assert_eq!(where_clause(&filter), "id = 1 AND (active = 1 OR banned = 0)");
/// ```
pub fn where_clause(filter: &ConditionMap) -> String {
    compile(filter, AND)
}

/// Compile a WHERE tree, joining entries of this level with `connector`.
pub fn compile(filter: &ConditionMap, connector: &str) -> String {
    let mut parts = Vec::with_capacity(filter.len());

    for (key, value) in filter.iter() {
        match value {
            Value::Map(group) if key.eq_ignore_ascii_case(OR_KEY) => {
                parts.push(format!("({})", compile(group, OR)));
            }
            Value::Map(operators) => {
                for (operator, operand) in operators.iter() {
                    parts.push(where_leaf(key, operand, operator));
                }
            }
            other => parts.push(where_leaf(key, other, "=")),
        }
    }

    parts.join(connector)
}

/// Compile a single comparison `key <operator> value`.
///
/// Arrays turn into `IN (...)` for every operator except `BETWEEN` and
/// `NOT BETWEEN`; the operator is not emitted in that case.
pub fn where_leaf(key: &str, value: &Value, operator: &str) -> String {
    match value {
        Value::Array(items) if is_between(operator) => {
            let bound = |idx: usize| items.get(idx).map(Value::natural).unwrap_or_default();
            format!("{key} {operator} '{}' AND '{}'", bound(0), bound(1))
        }
        Value::Array(items) => {
            let list = items.iter().map(Value::json).collect::<Vec<_>>().join(",");
            format!("{key} IN ({list})")
        }
        Value::Text(text) => format!("{key} {operator} '{text}'"),
        other => format!("{key} {operator} {}", other.natural()),
    }
}

fn is_between(operator: &str) -> bool {
    operator.eq_ignore_ascii_case("BETWEEN") || operator.eq_ignore_ascii_case("NOT BETWEEN")
}
