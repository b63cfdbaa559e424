//! Statement options: the declarative input to the compiler.

use crate::value::ConditionMap;
use std::fmt;
use std::sync::Arc;

/// A single entry of a field list: a column name or raw SQL.
///
/// Both render verbatim; the distinction only documents intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldExpr {
    Column(String),
    /// Raw SQL such as `COUNT(*) AS total`.
    Literal(String),
}

impl FieldExpr {
    pub fn literal(sql: impl Into<String>) -> Self {
        FieldExpr::Literal(sql.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            FieldExpr::Column(s) | FieldExpr::Literal(s) => s,
        }
    }
}

impl fmt::Display for FieldExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for FieldExpr {
    fn from(s: &str) -> Self {
        FieldExpr::Column(s.to_string())
    }
}

impl From<String> for FieldExpr {
    fn from(s: String) -> Self {
        FieldExpr::Column(s)
    }
}

/// The SELECT list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fields {
    /// Joined with `,`.
    List(Vec<FieldExpr>),
    /// A pre-joined field list, passed through unchanged.
    Raw(String),
}

impl Fields {
    /// `*`
    pub fn all() -> Self {
        Fields::List(vec![FieldExpr::from("*")])
    }

    pub fn list<I, F>(fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<FieldExpr>,
    {
        Fields::List(fields.into_iter().map(Into::into).collect())
    }

    pub fn raw(sql: impl Into<String>) -> Self {
        Fields::Raw(sql.into())
    }

    /// An empty list; a raw string never counts as empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, Fields::List(list) if list.is_empty())
    }
}

impl<F: Into<FieldExpr>> From<Vec<F>> for Fields {
    fn from(fields: Vec<F>) -> Self {
        Fields::list(fields)
    }
}

impl<F: Into<FieldExpr>, const N: usize> From<[F; N]> for Fields {
    fn from(fields: [F; N]) -> Self {
        Fields::list(fields)
    }
}

impl From<&str> for Fields {
    fn from(sql: &str) -> Self {
        Fields::raw(sql)
    }
}

impl From<String> for Fields {
    fn from(sql: String) -> Self {
        Fields::Raw(sql)
    }
}

/// One ORDER BY entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderSpec {
    Column(String),
    /// `(column, direction)`, e.g. `("created_at", "DESC")`.
    Directed(String, String),
}

impl OrderSpec {
    pub fn asc(column: impl Into<String>) -> Self {
        OrderSpec::Directed(column.into(), "ASC".to_string())
    }

    pub fn desc(column: impl Into<String>) -> Self {
        OrderSpec::Directed(column.into(), "DESC".to_string())
    }
}

impl fmt::Display for OrderSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSpec::Column(column) => f.write_str(column),
            OrderSpec::Directed(column, direction) => write!(f, "{column} {direction}"),
        }
    }
}

impl From<&str> for OrderSpec {
    fn from(column: &str) -> Self {
        OrderSpec::Column(column.to_string())
    }
}

impl From<String> for OrderSpec {
    fn from(column: String) -> Self {
        OrderSpec::Column(column)
    }
}

impl<C: Into<String>, D: Into<String>> From<(C, D)> for OrderSpec {
    fn from((column, direction): (C, D)) -> Self {
        OrderSpec::Directed(column.into(), direction.into())
    }
}

/// Transform applied to every data key before it is emitted
/// (e.g. identifier quoting or aliasing).
#[derive(Clone)]
pub struct KeyParser(Arc<dyn Fn(&str) -> String + Send + Sync>);

impl KeyParser {
    pub fn new(f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn parse(&self, key: &str) -> String {
        (self.0)(key)
    }
}

impl fmt::Debug for KeyParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyParser(..)")
    }
}

impl PartialEq for KeyParser {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Declarative description of a statement's field list and trailing clauses.
///
/// Every field is optional so that explicit options can be layered over
/// defaults with [`resolve_options`].
///
/// # Example
///
/// ```ignore
/// use steplix::{map, StatementOptions};
///
/// let options = StatementOptions::new()
///     .fields(["id", "name"])
///     .filter(map! { "active" => 1 })
///     .order_by(("created_at", "DESC"))
///     .limit(10);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementOptions {
    pub fields: Option<Fields>,
    /// The WHERE tree.
    pub filter: Option<ConditionMap>,
    pub order: Option<Vec<OrderSpec>>,
    pub group: Option<Vec<String>>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub key_parser: Option<KeyParser>,
}

impl StatementOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// The defaults every SELECT is resolved against: `fields = ["*"]`.
    pub fn defaults() -> Self {
        Self {
            fields: Some(Fields::all()),
            ..Self::default()
        }
    }

    pub fn fields(mut self, fields: impl Into<Fields>) -> Self {
        self.fields = Some(fields.into());
        self
    }

    pub fn filter(mut self, filter: ConditionMap) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Add one condition to the WHERE tree, creating it if needed.
    pub fn and_where(
        mut self,
        key: impl Into<String>,
        value: impl Into<crate::value::Value>,
    ) -> Self {
        self.filter
            .get_or_insert_with(ConditionMap::new)
            .insert(key, value);
        self
    }

    pub fn order_by(mut self, spec: impl Into<OrderSpec>) -> Self {
        self.order.get_or_insert_with(Vec::new).push(spec.into());
        self
    }

    pub fn group_by(mut self, column: impl Into<String>) -> Self {
        self.group.get_or_insert_with(Vec::new).push(column.into());
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn key_parser(mut self, f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.key_parser = Some(KeyParser::new(f));
        self
    }

    /// Apply the key parser, if any.
    pub fn parse_key(&self, key: &str) -> String {
        match &self.key_parser {
            Some(parser) => parser.parse(key),
            None => key.to_string(),
        }
    }
}

/// Layer `explicit` over `defaults`.
///
/// Unset fields take the default. An empty field list counts as unset. WHERE
/// trees are merged key by key: explicit entries first, then default entries
/// whose key is not already present, recursing into nested groups and
/// operator maps (see [`ConditionMap::merge_missing`]).
pub fn resolve_options(explicit: StatementOptions, defaults: &StatementOptions) -> StatementOptions {
    let fields = match explicit.fields {
        Some(fields) if !fields.is_empty() => Some(fields),
        _ => defaults.fields.clone(),
    };

    let filter = match (explicit.filter, &defaults.filter) {
        (Some(mut filter), Some(default_filter)) => {
            filter.merge_missing(default_filter);
            Some(filter)
        }
        (Some(filter), None) => Some(filter),
        (None, default_filter) => default_filter.clone(),
    };

    StatementOptions {
        fields,
        filter,
        order: explicit.order.or_else(|| defaults.order.clone()),
        group: explicit.group.or_else(|| defaults.group.clone()),
        limit: explicit.limit.or(defaults.limit),
        offset: explicit.offset.or(defaults.offset),
        key_parser: explicit.key_parser.or_else(|| defaults.key_parser.clone()),
    }
}
