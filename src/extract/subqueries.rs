//! Aliased sub-queries in table position

use crate::token::{ParenKind, TokenSequence};

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Subqueries {
    pub names: Vec<String>,
    /// `(alias, body)`, innermost first.
    pub queries: Vec<(String, String)>,
}

#[cfg(test)]
impl Subqueries {
    pub fn body(&self, name: &str) -> Option<&str> {
        self.queries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, body)| body.as_str())
    }
}

/// `FROM (SELECT ...) [AS] alias` and the JOIN equivalents.
///
/// Ordered by where each sub-query closes, so nested sub-queries come before
/// the ones containing them.
pub(crate) fn extract_subqueries(tokens: &TokenSequence) -> Subqueries {
    let mut found: Vec<(usize, String, String)> = Vec::new();

    for open in tokens.cursors() {
        if !open.opens(ParenKind::Subquery) {
            continue;
        }
        if !matches!(open.next().normalized(), "SELECT" | "WITH") {
            continue;
        }
        let close = open.matching_paren();
        let mut alias = close.next();
        if alias.is_keyword() && alias.normalized() == "AS" {
            alias = alias.next();
        }
        if !alias.is_name() {
            continue;
        }
        let (Some(open_index), Some(close_index)) = (open.index(), close.index()) else {
            continue;
        };
        let body = tokens.stringify_between(open_index, close_index);
        found.push((close_index, alias.value().to_string(), body));
    }

    found.sort_by_key(|(close, _, _)| *close);

    let mut subqueries = Subqueries::default();
    for (_, name, body) in found {
        if subqueries.names.contains(&name) {
            continue;
        }
        subqueries.names.push(name.clone());
        subqueries.queries.push((name, body));
    }
    subqueries
}
