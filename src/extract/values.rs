//! INSERT / REPLACE value extraction

use std::fmt;

use crate::token::{Cursor, TokenSequence};
use crate::util::strip_quotes;

/// A literal from a `VALUES (...)` list.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

/// `-` directly in front of a number at the start of a list item.
fn is_negated(token: &Cursor<'_>) -> bool {
    let sign = token.previous();
    let before = sign.previous();
    sign.value() == "-" && (before.is_comma() || before.is_left_paren())
}

fn parse_value(token: &Cursor<'_>) -> SqlValue {
    let negated = is_negated(token);
    let text = if negated {
        format!("-{}", token.value())
    } else {
        token.value().to_string()
    };

    if token.is_integer() {
        if let Ok(value) = text.parse::<i64>() {
            return SqlValue::Integer(value);
        }
    }
    if token.is_integer() || token.is_float() {
        if let Ok(value) = text.parse::<f64>() {
            return SqlValue::Float(value);
        }
    }
    if token.is_literal() && token.value().starts_with('\'') {
        return SqlValue::Text(strip_quotes(token.value()).replace("''", "'"));
    }
    SqlValue::Text(strip_quotes(&text).to_string())
}

/// Every value of every `VALUES` row, in order.
pub(crate) fn extract_values(tokens: &TokenSequence) -> Vec<SqlValue> {
    tokens
        .cursors()
        .filter(|token| {
            let next = token.next();
            token.last_keyword() == "VALUES"
                && token.is_in_parenthesis()
                && !token.is_punctuation()
                && token.value() != "-"
                && (next.is_comma() || next.is_right_paren())
        })
        .map(|token| parse_value(&token))
        .collect()
}
