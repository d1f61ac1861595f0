//! Unit tests for table and table-alias extraction

use pretty_assertions::assert_eq;
use sqlmeta::{get_query_tables, Query};

fn tables(sql: &str) -> Vec<String> {
    let result = get_query_tables(sql);
    assert!(result.is_ok(), "Failed to analyze: {:?}", result.err());
    result.unwrap()
}

// ============================================================================
// Table Tests
// ============================================================================

#[test]
fn test_simple_select() {
    assert_eq!(tables("SELECT a, b FROM foo"), vec!["foo"]);
    assert_eq!(tables("select a from foo where b = 1"), vec!["foo"]);
}

#[test]
fn test_multiple_tables_keep_order() {
    assert_eq!(
        tables("SELECT * FROM product_a, product_b WHERE product_a.id = product_b.id"),
        vec!["product_a", "product_b"]
    );
}

#[test]
fn test_join_variants() {
    for join in [
        "JOIN",
        "INNER JOIN",
        "LEFT JOIN",
        "LEFT OUTER JOIN",
        "RIGHT OUTER JOIN",
        "FULL OUTER JOIN",
        "CROSS JOIN",
        "NATURAL JOIN",
    ] {
        let sql = format!("SELECT a.x FROM a {join} b ON a.id = b.id");
        assert_eq!(tables(&sql), vec!["a", "b"], "join variant: {join}");
    }
}

#[test]
fn test_qualified_table_names() {
    assert_eq!(
        tables("SELECT * FROM db.schema_name.events e JOIN db.users u ON e.user_id = u.id"),
        vec!["db.schema_name.events", "db.users"]
    );
}

#[test]
fn test_quoted_table_names() {
    assert_eq!(tables("SELECT `id` FROM `foo`.`bar`"), vec!["foo.bar"]);
    assert_eq!(tables("SELECT \"id\" FROM \"foo\".\"bar\""), vec!["foo.bar"]);
}

#[test]
fn test_digit_prefixed_table_name() {
    assert_eq!(tables("SELECT * FROM 0020_big_table"), vec!["0020_big_table"]);
}

#[test]
fn test_comments_do_not_hide_tables() {
    assert_eq!(
        tables("SELECT a /* FROM fake */ FROM -- comment\n real_table"),
        vec!["real_table"]
    );
}

#[test]
fn test_self_join_records_table_once() {
    let query = Query::new("SELECT a.x, b.y FROM t AS a JOIN t AS b ON a.id = b.parent_id");
    assert_eq!(query.tables().unwrap(), ["t"]);
    let aliases = query.tables_aliases().unwrap();
    assert_eq!(aliases.len(), 2);
    assert_eq!(aliases["a"], "t");
    assert_eq!(aliases["b"], "t");
}

#[test]
fn test_aliases_without_as() {
    let query = Query::new("SELECT u.name FROM users u LEFT JOIN orders o ON o.user_id = u.id");
    assert_eq!(query.tables().unwrap(), ["users", "orders"]);
    let aliases = query.tables_aliases().unwrap();
    assert_eq!(aliases["u"], "users");
    assert_eq!(aliases["o"], "orders");
}

#[test]
fn test_subquery_alias_is_not_a_table_alias() {
    let query = Query::new("SELECT sq.a FROM (SELECT a FROM t) AS sq");
    assert_eq!(query.tables().unwrap(), ["t"]);
    assert!(query.tables_aliases().unwrap().is_empty());
}

// ============================================================================
// Statement Kinds
// ============================================================================

#[test]
fn test_insert_select() {
    assert_eq!(
        tables("INSERT INTO target (a, b) SELECT x, y FROM source WHERE z = 1"),
        vec!["target", "source"]
    );
}

#[test]
fn test_replace_and_update() {
    assert_eq!(tables("REPLACE INTO t (a) VALUES (1)"), vec!["t"]);
    assert_eq!(tables("UPDATE t SET a = 1 WHERE id IN (SELECT id FROM u)"), vec!["t", "u"]);
}

#[test]
fn test_ddl_statements() {
    assert_eq!(tables("CREATE TABLE new_t (id INT)"), vec!["new_t"]);
    assert_eq!(tables("CREATE TEMPORARY TABLE tmp (id INT)"), vec!["tmp"]);
    assert_eq!(tables("ALTER TABLE foo ADD COLUMN bar INT"), vec!["foo"]);
    assert_eq!(tables("DROP TABLE IF EXISTS old_t"), vec!["old_t"]);
    assert_eq!(tables("TRUNCATE TABLE logs"), vec!["logs"]);
}

#[test]
fn test_with_names_are_not_tables() {
    assert_eq!(
        tables("WITH x AS (SELECT a FROM t1), y AS (SELECT b FROM t2) SELECT * FROM x JOIN y ON x.a = y.b"),
        vec!["t1", "t2"]
    );
}
