//! sqlmeta: metadata extraction from SQL query text
//!
//! This library reads a single SQL statement and reports what it touches:
//! tables and their aliases, columns (per clause), column aliases, CTEs,
//! sub-queries, LIMIT/OFFSET, inserted values and comments. It also produces
//! a literal-free fingerprint of the query. No schema or database is needed.
//!
//! ```no_run
//! use sqlmeta::Query;
//!
//! let query = Query::new("SELECT a.id FROM users AS a WHERE a.active = 1");
//! assert_eq!(query.tables().unwrap(), ["users"]);
//! assert_eq!(query.columns().unwrap(), ["users.id", "users.active"]);
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod extract;
pub mod generalize;
pub mod keywords;
pub mod preprocess;
pub mod query;
pub mod query_type;
pub mod token;
pub mod tokenizer;
pub mod util;

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{bail, Result};

pub use batch::{analyze_queries, analyze_sql_file, analyze_sql_files, split_statements, QueryReport};
pub use config::AnalyzerConfig;
pub use error::SqlMetaError;
pub use extract::{AliasTarget, SqlValue};
pub use generalize::generalize_sql;
pub use keywords::Section;
pub use preprocess::preprocess_query;
pub use query::Query;
pub use query_type::QueryType;

/// Tables used by `sql`.
pub fn get_query_tables(sql: &str) -> error::Result<Vec<String>> {
    Ok(Query::new(sql).tables()?.to_vec())
}

/// Columns used by `sql`.
pub fn get_query_columns(sql: &str) -> error::Result<Vec<String>> {
    Ok(Query::new(sql).columns()?.to_vec())
}

/// Columns of `sql` per clause.
pub fn get_query_columns_dict(sql: &str) -> error::Result<BTreeMap<Section, Vec<String>>> {
    Ok(Query::new(sql).columns_dict()?.clone())
}

/// `(limit, offset)` of `sql`.
pub fn get_query_limit_and_offset(sql: &str) -> error::Result<Option<(u64, u64)>> {
    Query::new(sql).limit_and_offset()
}

/// Options for a batch analysis run
#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    /// Query text given directly; takes precedence over `paths`
    pub query: Option<String>,
    /// SQL files, or directories searched for `*.sql` files
    pub paths: Vec<PathBuf>,
    pub config: AnalyzerConfig,
    /// Enable verbose output
    pub verbose: bool,
}

/// Analyze the query or files named by `options`
pub fn analyze(options: AnalyzeOptions) -> Result<Vec<QueryReport>> {
    if let Some(sql) = &options.query {
        let statements = split_statements(sql);
        if options.verbose {
            println!("Analyzing {} statements", statements.len());
        }
        return Ok(analyze_queries(&statements, options.config));
    }

    if options.paths.is_empty() {
        bail!("Nothing to analyze: pass --query or at least one path");
    }

    // Step 1: Expand directories into the SQL files they contain
    let mut files = Vec::new();
    for path in &options.paths {
        if path.is_dir() {
            files.extend(batch::collect_sql_files(path));
        } else {
            files.push(path.clone());
        }
    }

    if options.verbose {
        println!("Found {} SQL files", files.len());
    }

    // Step 2: Analyze every statement of every file
    let reports = analyze_sql_files(&files, options.config)?;

    if options.verbose {
        let failed = reports.iter().filter(|r| !r.is_ok()).count();
        println!("Analyzed {} statements ({} failed)", reports.len(), failed);
    }

    Ok(reports)
}
