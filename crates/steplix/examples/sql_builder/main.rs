//! Compile SQL from declarative options without a database.
//!
//! Run with:
//!   cargo run --example sql_builder -p steplix

use serde_json::json;
use steplix::{ConditionMap, OrderSpec, StatementOptions, Value, literal, map, query};

#[derive(Debug)]
struct Filters {
    status: Option<String>,
    roles_any_of: Vec<String>,
    created_after: Option<String>,
    include_deleted: bool,
    page: u64,
    per_page: u64,
}

fn list_users_options(filters: &Filters) -> StatementOptions {
    let mut filter = ConditionMap::new();

    if let Some(status) = &filters.status {
        filter.insert("status", status.as_str());
    }
    if !filters.roles_any_of.is_empty() {
        filter.insert("role", filters.roles_any_of.clone());
    }
    if let Some(after) = &filters.created_after {
        filter.insert("created_at", map! { ">=" => after.as_str() });
    }
    if !filters.include_deleted {
        filter.insert("deleted_at", map! { "IS" => Value::Null });
    }

    StatementOptions::new()
        .fields(["id", "name", "role"])
        .filter(filter)
        .order_by(OrderSpec::desc("created_at"))
        .order_by("id")
        .limit(filters.per_page)
        .offset(filters.page.saturating_sub(1) * filters.per_page)
}

fn main() {
    let filters = Filters {
        status: Some("active".to_string()),
        roles_any_of: vec!["admin".to_string(), "owner".to_string()],
        created_after: Some("2024-01-01".to_string()),
        include_deleted: false,
        page: 2,
        per_page: 20,
    };
    println!("{filters:?}");
    println!("{}\n", query::select("users", &list_users_options(&filters)));

    // WHERE trees can also come from JSON; key order is kept.
    let filter = match Value::from(json!({
        "tenant_id": 7,
        "OR": { "owner_id": 42, "shared": true },
        "score": { "BETWEEN": [10, 20] }
    })) {
        Value::Map(map) => map,
        _ => ConditionMap::new(),
    };
    println!("WHERE {}\n", query::where_clause(&filter));

    let data = map! {
        "name" => "alice",
        "role" => "admin",
        "created_at" => literal("NOW()"),
    };
    println!("{}", query::insert("users", &data, &StatementOptions::new()));
    println!(
        "{}",
        query::update(
            "users",
            &map! { "role" => "owner", "updated_at" => literal("NOW()") },
            &StatementOptions::new().filter(map! { "id" => 1 }),
        )
    );
    println!(
        "{}",
        query::destroy("users", &StatementOptions::new().filter(map! { "id" => vec![1, 2] }))
    );
    println!(
        "{}",
        query::select(
            "users",
            &StatementOptions::new()
                .fields(vec![query::FieldExpr::literal(query::count_field_default())])
                .group_by("role"),
        )
    );
}
