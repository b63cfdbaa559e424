use super::*;
use crate::map;
use crate::value::{ConditionMap, Value};
use serde_json::json;

fn tree(value: serde_json::Value) -> ConditionMap {
    match Value::from(value) {
        Value::Map(map) => map,
        other => panic!("expected an object, got {other:?}"),
    }
}

#[test]
fn test_select_defaults_to_star() {
    assert_eq!(select("users", &StatementOptions::new()), "SELECT * FROM users");
}

#[test]
fn test_select_empty_field_list_falls_back_to_star() {
    let options = StatementOptions::new().fields(Vec::<&str>::new());
    assert_eq!(select("users", &options), "SELECT * FROM users");
}

#[test]
fn test_select_field_list() {
    let options = StatementOptions::new().fields(["id", "name"]);
    assert_eq!(select("users", &options), "SELECT id,name FROM users");
}

#[test]
fn test_select_raw_fields_pass_through() {
    let options = StatementOptions::new().fields("id, name AS n");
    assert_eq!(select("users", &options), "SELECT id, name AS n FROM users");
}

#[test]
fn test_select_count_field() {
    let options = StatementOptions::new()
        .fields(vec![FieldExpr::literal(count_field_default())])
        .filter(map! { "active" => 1 });
    assert_eq!(
        select("users", &options),
        "SELECT COUNT(*) AS total FROM users WHERE active = 1"
    );
}

#[test]
fn test_where_flat_keeps_insertion_order() {
    let filter = map! { "a" => 1, "b" => "x" };
    assert_eq!(where_clause(&filter), "a = 1 AND b = 'x'");

    let filter = map! { "b" => "x", "a" => 1 };
    assert_eq!(where_clause(&filter), "b = 'x' AND a = 1");
}

#[test]
fn test_where_in_numbers() {
    let filter = map! { "id" => vec![1, 2, 3] };
    assert_eq!(where_clause(&filter), "id IN (1,2,3)");
}

#[test]
fn test_where_in_strings_are_double_quoted() {
    let filter = map! { "name" => vec!["a", "b"] };
    assert_eq!(where_clause(&filter), r#"name IN ("a","b")"#);
}

#[test]
fn test_where_in_mixed_with_literal() {
    let filter = map! {
        "v" => vec![Value::from(1), Value::from("x"), Value::Null, Value::literal("NOW()")],
    };
    assert_eq!(where_clause(&filter), r#"v IN (1,"x",null,NOW())"#);
}

#[test]
fn test_where_in_ignores_operator() {
    let filter = tree(json!({ "id": { "!=": [1, 2] } }));
    assert_eq!(where_clause(&filter), "id IN (1,2)");
}

#[test]
fn test_where_operator_map() {
    let filter = tree(json!({
        "created_at": { ">=": "1980-01-01", "<": "2000-01-01" }
    }));
    assert_eq!(
        where_clause(&filter),
        "created_at >= '1980-01-01' AND created_at < '2000-01-01'"
    );
}

#[test]
fn test_where_or_group() {
    let filter = tree(json!({ "id": 1, "OR": { "active": 1, "banned": 0 } }));
    assert_eq!(where_clause(&filter), "id = 1 AND (active = 1 OR banned = 0)");
}

#[test]
fn test_where_or_key_is_case_insensitive() {
    let filter = tree(json!({ "or": { "a": 1, "b": 2 } }));
    assert_eq!(where_clause(&filter), "(a = 1 OR b = 2)");
}

#[test]
fn test_where_operator_map_inside_or_group_uses_or() {
    let filter = tree(json!({
        "id": 1,
        "OR": { "created_at": { ">": "1980-01-01 00:00:00", "<": "2000-01-01 00:00:00" } }
    }));
    assert_eq!(
        where_clause(&filter),
        "id = 1 AND (created_at > '1980-01-01 00:00:00' OR created_at < '2000-01-01 00:00:00')"
    );
}

#[test]
fn test_where_nested_or_groups() {
    let filter = tree(json!({ "OR": { "a": 1, "OR": { "b": 2, "c": 3 } } }));
    assert_eq!(where_clause(&filter), "(a = 1 OR (b = 2 OR c = 3))");
}

#[test]
fn test_where_or_with_scalar_is_a_plain_column() {
    let filter = map! { "OR" => 1 };
    assert_eq!(where_clause(&filter), "OR = 1");
}

#[test]
fn test_where_between() {
    let filter = tree(json!({ "age": { "BETWEEN": [18, 30] } }));
    assert_eq!(where_clause(&filter), "age BETWEEN '18' AND '30'");
}

#[test]
fn test_where_not_between_lowercase() {
    let filter = tree(json!({ "day": { "not between": ["2020-01-01", "2020-12-31"] } }));
    assert_eq!(
        where_clause(&filter),
        "day not between '2020-01-01' AND '2020-12-31'"
    );
}

#[test]
fn test_where_null_operators() {
    let filter = tree(json!({ "auth_token": { "IS NOT": null }, "deleted_at": { "IS": null } }));
    assert_eq!(
        where_clause(&filter),
        "auth_token IS NOT null AND deleted_at IS null"
    );
}

#[test]
fn test_where_literal_value() {
    let filter = map! { "expires_at" => map! { "<" => literal("NOW()") } };
    assert_eq!(where_clause(&filter), "expires_at < NOW()");

    let filter = map! { "created_at" => literal("NOW()") };
    assert_eq!(where_clause(&filter), "created_at = NOW()");
}

#[test]
fn test_where_leaf_direct() {
    assert_eq!(where_leaf("name", &Value::from("x"), "LIKE"), "name LIKE 'x'");
    assert_eq!(where_leaf("n", &Value::from(2.5), ">"), "n > 2.5");
    assert_eq!(where_leaf("flag", &Value::from(true), "="), "flag = true");
}

#[test]
fn test_compile_with_or_connector() {
    let filter = map! { "a" => 1, "b" => 2 };
    assert_eq!(compile(&filter, OR), "a = 1 OR b = 2");
}

#[test]
fn test_empty_operator_map_emits_nothing() {
    let filter = tree(json!({ "a": {}, "b": 1 }));
    assert_eq!(where_clause(&filter), "b = 1");
}

#[test]
fn test_conditions_empty() {
    assert_eq!(conditions(&StatementOptions::new()), "");
}

#[test]
fn test_conditions_where_order_limit() {
    let options = StatementOptions::new()
        .filter(map! { "id" => 1 })
        .order_by("created_at")
        .limit(10);
    assert_eq!(
        conditions(&options),
        " WHERE id = 1 ORDER BY created_at LIMIT 10"
    );
}

#[test]
fn test_conditions_fixed_order() {
    // Options are set in reverse order; the output order never changes.
    let options = StatementOptions::new()
        .offset(20)
        .limit(10)
        .group_by("status")
        .order_by(("created_at", "DESC"))
        .filter(map! { "active" => 1 });
    assert_eq!(
        conditions(&options),
        " WHERE active = 1 ORDER BY created_at DESC GROUP BY status LIMIT 10 OFFSET 20"
    );
}

#[test]
fn test_conditions_multiple_order_and_group() {
    let options = StatementOptions::new()
        .order_by(OrderSpec::desc("a"))
        .order_by("b")
        .group_by("x")
        .group_by("y");
    assert_eq!(conditions(&options), " ORDER BY a DESC, b GROUP BY x, y");
}

#[test]
fn test_conditions_skip_falsy() {
    let options = StatementOptions::new()
        .filter(ConditionMap::new())
        .limit(0)
        .offset(0);
    assert_eq!(conditions(&options), "");

    let options = StatementOptions::new().offset(5);
    assert_eq!(conditions(&options), " OFFSET 5");
}

#[test]
fn test_insert() {
    let data = map! {
        "id" => Value::Null,
        "name" => "x",
        "ts" => literal("NOW()"),
    };
    assert_eq!(
        insert("t", &data, &StatementOptions::new()),
        "INSERT INTO t (id, name, ts) VALUES (null, 'x', NOW())"
    );
}

#[test]
fn test_insert_key_parser() {
    let data = map! { "id" => 1, "name" => "x" };
    let options = StatementOptions::new().key_parser(|key| format!("`{key}`"));
    assert_eq!(
        insert("t", &data, &options),
        "INSERT INTO t (`id`, `name`) VALUES (1, 'x')"
    );
}

#[test]
fn test_inserts_uses_first_row_keys() {
    let rows = vec![
        map! { "a" => 1, "b" => "x" },
        map! { "a" => 2, "b" => "y" },
    ];
    assert_eq!(
        inserts("t", &rows, &StatementOptions::new()),
        "INSERT INTO t (a, b) VALUES (1, 'x'), (2, 'y')"
    );
}

#[test]
fn test_inserts_misaligned_rows_are_not_detected() {
    let rows = vec![map! { "a" => 1, "b" => 2 }, map! { "b" => 3, "a" => 4 }];
    assert_eq!(
        inserts("t", &rows, &StatementOptions::new()),
        "INSERT INTO t (a, b) VALUES (1, 2), (3, 4)"
    );
}

#[test]
fn test_update_with_conditions() {
    let data = map! { "a" => 1, "b" => "x", "updated_at" => literal("NOW()") };
    let options = StatementOptions::new().filter(map! { "id" => 1 });
    assert_eq!(
        update("t", &data, &options),
        "UPDATE t SET a = 1, b = 'x', updated_at = NOW() WHERE id = 1"
    );
}

#[test]
fn test_update_key_parser_applies_to_set_columns() {
    let data = map! { "a" => 1 };
    let options = StatementOptions::new().key_parser(|key| format!("t.{key}"));
    assert_eq!(update("t", &data, &options), "UPDATE t SET t.a = 1");
}

#[test]
fn test_destroy() {
    assert_eq!(destroy("t", &StatementOptions::new()), "DELETE FROM t");
    let options = StatementOptions::new().filter(map! { "id" => vec![1, 2] });
    assert_eq!(destroy("t", &options), "DELETE FROM t WHERE id IN (1,2)");
}

#[test]
fn test_truncate() {
    assert_eq!(truncate("t"), "TRUNCATE TABLE t");
}

#[test]
fn test_fields_helper() {
    assert_eq!(fields(&Fields::from(["a", "b", "c"])), "a,b,c");
    assert_eq!(fields(&Fields::raw("a, b")), "a, b");
    assert_eq!(fields(&Fields::List(Vec::new())), "");
}

#[test]
fn test_count_field() {
    assert_eq!(count_field_default(), "COUNT(*) AS total");
    assert_eq!(count_field("n"), "COUNT(*) AS n");
}

#[test]
fn test_literal_is_verbatim() {
    assert_eq!(literal("COUNT(*) AS total").render(), "COUNT(*) AS total");
}

#[test]
fn test_compile_is_deterministic() {
    let options = StatementOptions::new()
        .fields(["id"])
        .filter(tree(json!({ "id": [1, 2], "OR": { "a": "x", "b": { ">": 3 } } })))
        .order_by("id")
        .limit(5);
    assert_eq!(select("t", &options), select("t", &options));
}

#[test]
fn test_resolve_options_fills_unset_fields() {
    let defaults = StatementOptions::defaults().limit(50).order_by("id");
    let explicit = StatementOptions::new().limit(10);
    let resolved = resolve_options(explicit, &defaults);

    assert_eq!(resolved.fields, Some(Fields::all()));
    assert_eq!(resolved.limit, Some(10));
    assert_eq!(resolved.order, Some(vec![OrderSpec::from("id")]));
}

#[test]
fn test_resolve_options_merges_where_trees() {
    let defaults = StatementOptions::new().filter(map! { "deleted" => 0, "id" => 9 });
    let explicit = StatementOptions::new().filter(map! { "id" => 1 });
    let resolved = resolve_options(explicit, &defaults);

    let filter = resolved.filter.expect("filter is set");
    assert_eq!(where_clause(&filter), "id = 1 AND deleted = 0");
}

#[test]
fn test_resolve_options_merges_nested_groups() {
    let defaults = StatementOptions::new().filter(tree(json!({
        "OR": { "owner_id": 7, "shared": 1 },
        "age": { "<": 65 }
    })));
    let explicit = StatementOptions::new().filter(tree(json!({
        "OR": { "owner_id": 42 },
        "age": { ">=": 18 }
    })));
    let resolved = resolve_options(explicit, &defaults);

    let filter = resolved.filter.expect("filter is set");
    assert_eq!(
        where_clause(&filter),
        "(owner_id = 42 OR shared = 1) AND age >= 18 AND age < 65"
    );
}
