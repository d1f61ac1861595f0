//! Error types for sqlmeta

use std::path::PathBuf;
use std::sync::Arc;

use sqlparser::tokenizer::TokenizerError;
use thiserror::Error;

/// Errors that can occur while analyzing a query
///
/// Cached analysis stages hand out clones of the error they failed with,
/// so every variant is cheap to clone.
#[derive(Error, Debug, Clone)]
pub enum SqlMetaError {
    #[error("Empty queries are not supported!")]
    EmptyQuery,

    #[error("Not supported query type: {query_type}")]
    UnsupportedQueryType { query_type: String },

    #[error("Failed to tokenize query: {message}")]
    Tokenize { message: String },

    #[error("Unmatched closing parenthesis at token {position}")]
    UnmatchedParenthesis { position: usize },

    #[error("Parenthesis opened at token {position} is never closed")]
    UnclosedParenthesis { position: usize },

    #[error("Malformed WITH clause at token {position}: {message}")]
    MalformedWith { position: usize, message: String },

    #[error("Malformed CREATE TABLE statement: {message}")]
    MalformedCreateTable { message: String },

    #[error("Parenthesis nesting depth {depth} exceeds the limit of {limit}")]
    NestingTooDeep { depth: usize, limit: usize },

    #[error("Query has {count} tokens, more than the limit of {limit}")]
    TooManyTokens { count: usize, limit: usize },

    #[error("Nested query depth {depth} exceeds the limit of {limit}")]
    RecursionLimit { depth: usize, limit: usize },

    #[error("Failed to read SQL file: {path}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: Arc<std::io::Error>,
    },

    #[error("SQL file is neither UTF-8 nor Windows-1252: {path}")]
    InvalidEncoding { path: PathBuf },
}

impl From<TokenizerError> for SqlMetaError {
    fn from(err: TokenizerError) -> Self {
        SqlMetaError::Tokenize {
            message: err.to_string(),
        }
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, SqlMetaError>;
