//! Unit tests for column extraction

use std::collections::BTreeMap;

use pretty_assertions::assert_eq;
use sqlmeta::{get_query_columns, Query, Section};

fn columns(sql: &str) -> Vec<String> {
    let result = get_query_columns(sql);
    assert!(result.is_ok(), "Failed to analyze: {:?}", result.err());
    result.unwrap()
}

fn section_map(entries: &[(Section, &[&str])]) -> BTreeMap<Section, Vec<String>> {
    entries
        .iter()
        .map(|(section, columns)| (*section, columns.iter().map(|c| c.to_string()).collect()))
        .collect()
}

// ============================================================================
// Basic Columns
// ============================================================================

#[test]
fn test_select_list_in_order() {
    assert_eq!(columns("SELECT a, b, c FROM t"), vec!["a", "b", "c"]);
    assert_eq!(columns("SELECT b, a, b FROM t"), vec!["b", "a"]);
}

#[test]
fn test_wildcards() {
    assert_eq!(columns("SELECT * FROM t"), vec!["*"]);
    assert_eq!(columns("SELECT count(*) FROM t"), Vec::<String>::new());
    assert_eq!(columns("SELECT a * 2 FROM t"), vec!["a"]);
}

#[test]
fn test_functions_are_not_columns() {
    assert_eq!(
        columns("SELECT max(price), my_func(qty), COALESCE(x, y) FROM t"),
        vec!["price", "qty", "x", "y"]
    );
}

#[test]
fn test_alias_qualified_columns() {
    assert_eq!(
        columns("SELECT a.* FROM users1 AS a JOIN users2 AS b ON a.ip_address = b.ip_address"),
        vec!["users1.*", "users1.ip_address", "users2.ip_address"]
    );
}

#[test]
fn test_table_qualified_columns_are_kept() {
    assert_eq!(
        columns("SELECT t.a, db.t.b FROM db.t WHERE t.c > 0"),
        vec!["t.a", "db.t.b", "t.c"]
    );
}

#[test]
fn test_where_group_order_having() {
    assert_eq!(
        columns("SELECT a FROM t WHERE b = 1 AND c IS NOT NULL GROUP BY d HAVING sum(e) > 2 ORDER BY f DESC"),
        vec!["a", "b", "c", "d", "e", "f"]
    );
}

#[test]
fn test_cast_type_is_not_a_column() {
    assert_eq!(columns("SELECT CAST(a AS CHAR) FROM t"), vec!["a"]);
}

#[test]
fn test_interval_unit_is_not_a_column() {
    assert_eq!(
        columns("SELECT a FROM t WHERE created > NOW() - INTERVAL 7 DAY"),
        vec!["a", "created"]
    );
}

#[test]
fn test_signed_interval_unit_is_not_a_column() {
    assert_eq!(
        columns("SELECT a FROM t WHERE d >= last_day(date_add(now(), interval -13 month))"),
        vec!["a", "d"]
    );
    assert_eq!(
        columns("SELECT a FROM t WHERE d < NOW() + INTERVAL +2 DAY"),
        vec!["a", "d"]
    );
}

// ============================================================================
// Sections
// ============================================================================

#[test]
fn test_columns_dict_sections() {
    let query = Query::new(
        "SELECT u.name, o.total FROM users u JOIN orders o ON o.user_id = u.id \
         WHERE o.status = 'paid' GROUP BY u.name ORDER BY o.total",
    );
    assert_eq!(
        query.columns_dict().unwrap(),
        &section_map(&[
            (Section::Select, &["users.name", "orders.total"]),
            (Section::Where, &["orders.status"]),
            (Section::OrderBy, &["orders.total"]),
            (Section::GroupBy, &["users.name"]),
            (Section::Join, &["orders.user_id", "users.id"]),
        ])
    );
}

#[test]
fn test_join_using() {
    let query = Query::new("SELECT a FROM t JOIN u USING (id, day)");
    assert_eq!(query.columns().unwrap(), ["a", "id", "day"]);
    assert_eq!(query.columns_dict().unwrap()[&Section::Join], ["id", "day"]);
}

#[test]
fn test_insert_columns() {
    let query = Query::new("INSERT INTO t (a, b, c) VALUES (1, 2, 3)");
    assert_eq!(query.columns().unwrap(), ["a", "b", "c"]);
    assert_eq!(query.columns_dict().unwrap()[&Section::Insert], ["a", "b", "c"]);
}

#[test]
fn test_update_columns() {
    let query = Query::new("UPDATE t SET a = 1, b = c WHERE id = 5");
    assert_eq!(query.columns().unwrap(), ["a", "b", "c", "id"]);
    assert_eq!(query.columns_dict().unwrap()[&Section::Update], ["a", "b", "c"]);
    assert_eq!(query.columns_dict().unwrap()[&Section::Where], ["id"]);
}

#[test]
fn test_create_table_columns() {
    let query = Query::new(
        "CREATE TABLE t (id INT(11) NOT NULL, name VARCHAR(255), created DATETIME, PRIMARY KEY (id))",
    );
    assert_eq!(query.columns().unwrap(), ["id", "name", "created"]);
    assert!(query.columns_dict().unwrap().is_empty());
}

// ============================================================================
// Sub-queries and CTEs
// ============================================================================

#[test]
fn test_subquery_columns_resolve_through_body() {
    let query = Query::new("SELECT sq.total FROM (SELECT sum(amount) AS total FROM payments) sq");
    assert_eq!(query.columns().unwrap(), ["amount"]);
    assert_eq!(query.columns_without_subqueries().unwrap(), ["sq.total", "amount"]);
}

#[test]
fn test_subquery_column_by_bare_name() {
    let query = Query::new("SELECT sq.b FROM (SELECT t.a, t.b FROM t) sq");
    assert_eq!(query.columns().unwrap(), ["t.b", "t.a"]);
}

#[test]
fn test_subquery_wildcard_keeps_literal() {
    let query = Query::new("SELECT sq.x FROM (SELECT * FROM t) sq");
    assert_eq!(query.columns().unwrap(), ["sq.x", "*"]);
}

#[test]
fn test_subquery_wildcard_expands_to_body_columns() {
    let query = Query::new("SELECT sq.* FROM (SELECT a, b FROM t) sq");
    assert_eq!(query.columns().unwrap(), ["a", "b"]);
    assert_eq!(query.columns_without_subqueries().unwrap(), ["sq.*", "a", "b"]);
    assert_eq!(query.columns_dict().unwrap()[&Section::Select], ["a", "b"]);
}

#[test]
fn test_column_through_qualified_wildcard_body() {
    let query = Query::new(
        "WITH foo AS (SELECT test_table.* FROM test_table) SELECT foo.bar FROM foo",
    );
    assert_eq!(query.columns().unwrap(), ["test_table.*", "bar"]);

    let query = Query::new("SELECT sq.* FROM (SELECT * FROM t) sq");
    assert_eq!(query.columns().unwrap(), ["sq.*", "*"]);
}

#[test]
fn test_cte_columns() {
    let query = Query::new("WITH cte AS (SELECT a,b FROM t) SELECT a FROM cte");
    assert_eq!(query.columns().unwrap(), ["a", "b"]);

    let query = Query::new("WITH cte AS (SELECT x AS renamed FROM t) SELECT cte.renamed FROM cte");
    assert_eq!(query.columns().unwrap(), ["x"]);
}

#[test]
fn test_columns_are_idempotent() {
    let query = Query::new("SELECT a, b FROM t WHERE c = 1");
    let first = query.columns().unwrap().to_vec();
    let second = query.columns().unwrap().to_vec();
    assert_eq!(first, second);
}
