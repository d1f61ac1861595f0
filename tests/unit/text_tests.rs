//! Unit tests for comments and generalization

use pretty_assertions::assert_eq;
use sqlmeta::{generalize_sql, Query};

#[test]
fn test_comments_keep_delimiters() {
    let query = Query::new("SELECT * -- one\nFROM t # two\nWHERE /* three */ a = 1");
    assert_eq!(query.comments(), vec!["-- one\n", "# two\n", "/* three */"]);
}

#[test]
fn test_comment_markers_inside_literals() {
    let query = Query::new("SELECT '-- not a comment' FROM t");
    assert!(query.comments().is_empty());
}

#[test]
fn test_without_comments() {
    let query = Query::new("SELECT /* foo */ test\nFROM `foo`.`bar`");
    assert_eq!(query.without_comments(), "SELECT test FROM `foo`.`bar`");
    let query = Query::new("  SELECT * -- comment\n   FROM t  ");
    assert_eq!(query.without_comments(), "SELECT * FROM t");
}

#[test]
fn test_generalize() {
    let query = Query::new("SELECT * FROM foo WHERE id = 123");
    assert_eq!(query.generalize(), "SELECT * FROM foo WHERE id = N");
    assert_eq!(
        generalize_sql("UPDATE `user` SET user_touched = '20150112143631' WHERE user_id = '25239755'"),
        "UPDATE `user` SET user_touched = X WHERE user_id = X"
    );
    assert_eq!(
        generalize_sql("SELECT foo FROM bar WHERE id in ( 123, 456, 789 )"),
        "SELECT foo FROM bar WHERE id in (XYZ)"
    );
}

#[test]
fn test_generalize_masks_double_quoted_strings() {
    assert_eq!(
        generalize_sql("SELECT foo FROM bar WHERE baz = \"test\""),
        "SELECT foo FROM bar WHERE baz = X"
    );
    let query = Query::new("SELECT /* c */ foo\nFROM bar WHERE name = \"a b\" AND id = 5");
    assert_eq!(query.generalize(), "SELECT foo FROM bar WHERE name = X AND id = N");
}

#[test]
fn test_text_properties_do_not_need_valid_sql() {
    let query = Query::new("SELECT (a /* open */");
    assert!(query.tables().is_err());
    assert_eq!(query.comments(), vec!["/* open */"]);
    assert_eq!(query.without_comments(), "SELECT (a");
}
