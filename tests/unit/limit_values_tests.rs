//! Unit tests for LIMIT/OFFSET and inserted values

use pretty_assertions::assert_eq;
use sqlmeta::{get_query_limit_and_offset, Query, SqlValue};

fn limit(sql: &str) -> Option<(u64, u64)> {
    get_query_limit_and_offset(sql).unwrap()
}

#[test]
fn test_limit_and_offset_forms() {
    assert_eq!(limit("SELECT * FROM t LIMIT 50"), Some((50, 0)));
    assert_eq!(limit("SELECT * FROM t LIMIT 50 OFFSET 1000"), Some((50, 1000)));
    assert_eq!(limit("SELECT * FROM t LIMIT 1000, 50"), Some((50, 1000)));
    assert_eq!(limit("select * from t limit 1000,50"), Some((50, 1000)));
}

#[test]
fn test_no_limit() {
    assert_eq!(limit("SELECT * FROM t"), None);
    assert_eq!(limit("SELECT * FROM t /* LIMIT 10 */"), None);
}

#[test]
fn test_values_dict_uses_insert_columns() {
    let query = Query::new("INSERT INTO t (a, b, c) VALUES (9, 2.15, 'test')");
    assert_eq!(
        query.values().unwrap(),
        [
            SqlValue::Integer(9),
            SqlValue::Float(2.15),
            SqlValue::Text("test".to_string())
        ]
    );
    assert_eq!(
        query.values_dict().unwrap(),
        [
            ("a".to_string(), SqlValue::Integer(9)),
            ("b".to_string(), SqlValue::Float(2.15)),
            ("c".to_string(), SqlValue::Text("test".to_string())),
        ]
    );
}

#[test]
fn test_values_dict_without_column_list() {
    let query = Query::new("REPLACE INTO t VALUES (-1, 'it''s')");
    assert_eq!(
        query.values_dict().unwrap(),
        [
            ("column_1".to_string(), SqlValue::Integer(-1)),
            ("column_2".to_string(), SqlValue::Text("it's".to_string())),
        ]
    );
}

#[test]
fn test_select_has_no_values() {
    let query = Query::new("SELECT a FROM t WHERE b = 5");
    assert!(query.values().unwrap().is_empty());
    assert!(query.values_dict().unwrap().is_empty());
}
