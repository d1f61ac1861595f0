//! Statement classification from the leading tokens.

use std::fmt;

use crate::error::{Result, SqlMetaError};
use crate::token::TokenSequence;

/// Kind of statement a query is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryType {
    Select,
    Insert,
    Replace,
    Update,
    Create,
    Alter,
    Drop,
    Truncate,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Select => "SELECT",
            Self::Insert => "INSERT",
            Self::Replace => "REPLACE",
            Self::Update => "UPDATE",
            Self::Create => "CREATE TABLE",
            Self::Alter => "ALTER TABLE",
            Self::Drop => "DROP TABLE",
            Self::Truncate => "TRUNCATE TABLE",
        }
    }

    /// Statements that carry a `VALUES (...)` list.
    pub fn has_values(&self) -> bool {
        matches!(self, Self::Insert | Self::Replace)
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a tokenized statement.
///
/// Leading parentheses are skipped so `(SELECT ...) UNION (SELECT ...)` is a
/// select.
pub fn detect_query_type(tokens: &TokenSequence) -> Result<QueryType> {
    let mut words = tokens
        .tokens()
        .iter()
        .skip_while(|t| t.value == "(")
        .map(|t| t.normalized.as_str());

    let Some(first) = words.next() else {
        return Err(SqlMetaError::EmptyQuery);
    };
    let second = words.next().unwrap_or("");
    let third = words.next().unwrap_or("");

    let query_type = match first {
        "SELECT" | "WITH" => QueryType::Select,
        "INSERT" => QueryType::Insert,
        "REPLACE" => QueryType::Replace,
        "UPDATE" => QueryType::Update,
        "CREATE" if second == "TABLE" || (second == "TEMPORARY" && third == "TABLE") => {
            QueryType::Create
        }
        "ALTER" if second == "TABLE" => QueryType::Alter,
        "DROP" if second == "TABLE" => QueryType::Drop,
        "TRUNCATE" => QueryType::Truncate,
        _ => {
            let shown = if second.is_empty() {
                first.to_string()
            } else {
                format!("{first} {second}")
            };
            return Err(SqlMetaError::UnsupportedQueryType { query_type: shown });
        }
    };
    Ok(query_type)
}
