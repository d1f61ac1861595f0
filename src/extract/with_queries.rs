//! WITH clause (CTE) extraction

use crate::error::{Result, SqlMetaError};
use crate::token::{Cursor, ParenKind, TokenSequence};
use crate::util::push_unique;

/// Everything declared by the WITH clauses of a statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct WithClause {
    pub names: Vec<String>,
    /// `(name, body)` in declaration order.
    pub queries: Vec<(String, String)>,
    /// Column lists declared as `name (c1, c2) AS (...)`, by CTE name.
    pub column_lists: Vec<WithColumnList>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct WithColumnList {
    pub cte: String,
    /// Token indices of the declared column names.
    pub columns: Vec<usize>,
}

#[cfg(test)]
impl WithClause {
    pub fn body(&self, name: &str) -> Option<&str> {
        self.queries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, body)| body.as_str())
    }
}

fn malformed(cursor: &Cursor<'_>, message: &str) -> SqlMetaError {
    SqlMetaError::MalformedWith {
        position: cursor.index().unwrap_or_default(),
        message: message.to_string(),
    }
}

/// A token that can name a CTE. Keywords are accepted when the CTE syntax
/// that follows leaves no doubt.
fn is_cte_name(cursor: &Cursor<'_>) -> bool {
    if cursor.is_name() {
        return true;
    }
    let next = cursor.next();
    cursor.is_keyword()
        && ((next.is_keyword() && next.normalized() == "AS") || next.opens(ParenKind::WithColumns))
}

/// Collect every CTE of every WITH block.
pub(crate) fn extract_with_queries(tokens: &TokenSequence) -> Result<WithClause> {
    let mut clause = WithClause::default();

    for start in tokens.cursors() {
        if !(start.is_keyword() && start.normalized() == "WITH") {
            continue;
        }
        let previous = start.previous();
        if !(previous.is_empty() || previous.is_left_paren()) {
            continue;
        }

        let mut current = start.next();
        if current.is_keyword() && current.normalized() == "RECURSIVE" {
            current = current.next();
        }

        loop {
            if !is_cte_name(&current) {
                return Err(malformed(&current, "expected a CTE name"));
            }
            let mut name_end = current;
            while name_end.next().is_dot() && name_end.next().next().is_name() {
                name_end = name_end.next().next();
            }
            let name = name_end.left_expanded();

            let mut after = name_end.next();
            if after.opens(ParenKind::WithColumns) {
                let close = after.matching_paren();
                let columns = tokens
                    .cursors()
                    .skip(after.index().unwrap_or_default() + 1)
                    .take_while(|c| c.index() < close.index())
                    .filter(|c| c.is_name() && !c.next().is_dot())
                    .filter_map(|c| c.index())
                    .collect();
                clause.column_lists.push(WithColumnList {
                    cte: name.clone(),
                    columns,
                });
                after = close.next();
            }

            if !(after.is_keyword() && after.normalized() == "AS") {
                return Err(malformed(&after, "expected AS after the CTE name"));
            }
            let open = after.next();
            if !open.opens(ParenKind::WithQuery) {
                return Err(malformed(&open, "expected a parenthesized query after AS"));
            }
            let close = open.matching_paren();
            let (Some(open_index), Some(close_index)) = (open.index(), close.index()) else {
                return Err(malformed(&open, "CTE body is never closed"));
            };

            let body = tokens.stringify_between(open_index, close_index);
            if push_unique(&mut clause.names, name.clone()) {
                clause.queries.push((name, body));
            }

            let next = close.next();
            if next.is_comma() {
                current = next.next();
                continue;
            }
            if next.is_keyword() && next.normalized() == "AS" {
                return Err(malformed(&next, "unexpected AS after the CTE body"));
            }
            break;
        }
    }

    Ok(clause)
}
