//! Table and table-alias extraction

use std::collections::HashMap;

use crate::keywords;
use crate::token::{Cursor, ParenKind, TokenSequence};
use crate::util::push_unique;

/// A parenthesis opened after the table keyword that is not a sub-query
/// holds column names: `INSERT INTO t (a, b)`, `CREATE TABLE t (...)`.
fn is_in_column_list(cursor: &Cursor<'_>) -> bool {
    let paren = cursor.enclosing_paren();
    if paren.is_empty() || paren.opens(ParenKind::Subquery) {
        return false;
    }
    match (paren.index(), cursor.last_keyword_position()) {
        (Some(paren), Some(keyword)) => paren > keyword,
        _ => false,
    }
}

fn is_keyword(cursor: &Cursor<'_>, normalized: &str) -> bool {
    cursor.is_keyword() && cursor.normalized() == normalized
}

/// Tables referenced by the statement, in order of first appearance,
/// excluding names declared by WITH clauses.
pub(crate) fn extract_tables(tokens: &TokenSequence, with_names: &[String]) -> Vec<String> {
    let mut tables = Vec::new();

    for token in tokens.cursors() {
        if !token.is_name() {
            continue;
        }
        let last_keyword = token.last_keyword();
        if !keywords::precedes_tables(last_keyword) {
            continue;
        }
        let previous = token.previous();
        if is_keyword(&previous, "AS") || is_keyword(&previous, "WITH") {
            continue;
        }
        if token.next().is_dot() || is_in_column_list(&token) {
            continue;
        }

        if previous.is_dot() {
            push_unique(&mut tables, token.left_expanded());
            continue;
        }

        // `FROM t1 alias`: only the first name after the keyword (or after a
        // comma / opening parenthesis) is a table.
        let follows_keyword = previous.normalized() == last_keyword || is_keyword(&previous, "EXISTS");
        if (!follows_keyword && !previous.is_punctuation()) || previous.is_right_paren() {
            continue;
        }
        push_unique(&mut tables, token.value());
    }

    tables.retain(|t| !with_names.contains(t));
    tables
}

/// `alias -> table` for every alias declared on a table in `tables`.
pub(crate) fn extract_table_aliases(tokens: &TokenSequence, tables: &[String]) -> HashMap<String, String> {
    let mut aliases = HashMap::new();

    for token in tokens.cursors() {
        if !token.is_name() || !keywords::precedes_tables(token.last_keyword()) {
            continue;
        }
        let next = token.next();
        if is_keyword(&next, "AS") || next.is_dot() || token.previous().is_dot() {
            continue;
        }
        let previous = token.previous();
        let candidate = if is_keyword(&previous, "AS") {
            previous.previous().left_expanded()
        } else {
            previous.left_expanded()
        };
        if tables.contains(&candidate) {
            aliases.insert(token.value().to_string(), candidate);
        }
    }

    log::trace!("Found {} table aliases", aliases.len());
    aliases
}
