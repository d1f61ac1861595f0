//! Query fingerprinting
//!
//! `generalize` masks every literal so queries differing only in their
//! parameters map to the same text: strings become `X`, numbers `N`,
//! multi-element `IN (...)` / `VALUES (...)` lists `(XYZ)`.

use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};

use crate::preprocess::strip_comments;

static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").expect("Invalid space regex"));
static ANY_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("Invalid space regex"));
static LIKE_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"LIKE '[^']+'").expect("Invalid LIKE regex"));
static LIKE_CONDITION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(or|and) [^\s]+ LIKE X").expect("Invalid LIKE chain regex"));
static ESCAPES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\\\\|\\'|\\""#).expect("Invalid escape regex"));
static SINGLE_QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r"'[^']*'").expect("Invalid string regex"));
static DOUBLE_QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#""[^"]*""#).expect("Invalid string regex"));
static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"-?[0-9]+").expect("Invalid number regex"));
static VALUE_LIST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i) (IN|VALUES)\s*\([^,]+,[^)]+\)").expect("Invalid value list regex")
});

/// Fingerprint `sql`. Empty input gives an empty string.
pub fn generalize_sql(sql: &str) -> String {
    if sql.trim().is_empty() {
        return String::new();
    }

    let sql = strip_comments(sql);
    let sql = MULTI_SPACE.replace_all(&sql, " ");
    let sql = normalize_likes(&sql);
    let sql = ESCAPES.replace_all(&sql, "");
    let sql = SINGLE_QUOTED.replace_all(&sql, "X");
    let sql = DOUBLE_QUOTED.replace_all(&sql, "X");
    let sql = ANY_SPACE.replace_all(&sql, " ");
    let sql = NUMBER.replace_all(&sql, "N");
    let sql = VALUE_LIST.replace_all(&sql, " ${1} (XYZ)");
    sql.trim().to_string()
}

/// Mask LIKE patterns and fold `or col LIKE X or col LIKE X ...` chains.
fn normalize_likes(sql: &str) -> String {
    let sql = sql.replace('%', "");
    let mut sql = LIKE_LITERAL.replace_all(&sql, "LIKE X").into_owned();

    let mut conditions: Vec<String> = Vec::new();
    for found in LIKE_CONDITION.find_iter(&sql) {
        if !conditions.iter().any(|c| c == found.as_str()) {
            conditions.push(found.as_str().to_string());
        }
    }

    for condition in conditions {
        let Ok(repeated) = Regex::new(&format!(r"(\s?{})+", regex::escape(&condition))) else {
            continue;
        };
        let folded = format!(" {condition} ...");
        sql = repeated.replace_all(&sql, NoExpand(&folded)).into_owned();
    }
    sql
}
