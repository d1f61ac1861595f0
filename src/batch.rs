//! Batch analysis of SQL scripts
//!
//! Splits script text into statements and analyzes each one independently,
//! so a single malformed statement is reported without aborting the batch.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use encoding_rs::WINDOWS_1252;
use rayon::prelude::*;

use crate::config::AnalyzerConfig;
use crate::error::{Result, SqlMetaError};
use crate::extract::SqlValue;
use crate::keywords::Section;
use crate::preprocess::{segments, SegmentKind};
use crate::query::Query;
use crate::query_type::QueryType;

/// Minimum number of inputs to benefit from parallel processing.
/// Below this threshold, sequential processing is faster due to rayon overhead.
const PARALLEL_THRESHOLD: usize = 8;

/// Metadata of a statement that analyzed cleanly.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryMetadata {
    pub query_type: QueryType,
    pub tables: Vec<String>,
    pub tables_aliases: BTreeMap<String, String>,
    pub columns: Vec<String>,
    pub columns_dict: BTreeMap<Section, Vec<String>>,
    pub columns_aliases_names: Vec<String>,
    pub with_names: Vec<String>,
    pub subqueries_names: Vec<String>,
    pub limit_and_offset: Option<(u64, u64)>,
    pub values_dict: Vec<(String, SqlValue)>,
    pub comments: Vec<String>,
}

impl QueryMetadata {
    fn collect(query: &Query) -> Result<Self> {
        Ok(Self {
            query_type: query.query_type()?,
            tables: query.tables()?.to_vec(),
            tables_aliases: query
                .tables_aliases()?
                .iter()
                .map(|(alias, table)| (alias.clone(), table.clone()))
                .collect(),
            columns: query.columns()?.to_vec(),
            columns_dict: query.columns_dict()?.clone(),
            columns_aliases_names: query.columns_aliases_names()?.to_vec(),
            with_names: query.with_names()?.to_vec(),
            subqueries_names: query.subqueries_names()?.to_vec(),
            limit_and_offset: query.limit_and_offset()?,
            values_dict: query.values_dict()?.to_vec(),
            comments: query.comments(),
        })
    }
}

/// Result of analyzing one statement.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryReport {
    /// File the statement came from, if any.
    pub source: Option<PathBuf>,
    pub sql: String,
    /// The metadata, or the error message the statement failed with.
    pub outcome: std::result::Result<QueryMetadata, String>,
}

impl QueryReport {
    fn analyze(sql: &str, source: Option<&Path>, config: AnalyzerConfig) -> Self {
        let query = Query::with_config(sql, config);
        let outcome = QueryMetadata::collect(&query).map_err(|err| {
            log::warn!("Failed to analyze statement: {err}");
            err.to_string()
        });
        Self {
            source: source.map(Path::to_path_buf),
            sql: sql.to_string(),
            outcome,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, label: &str, items: &[String]) -> fmt::Result {
    if !items.is_empty() {
        writeln!(f, "  {label}: {}", items.join(", "))?;
    }
    Ok(())
}

impl fmt::Display for QueryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = &self.source {
            writeln!(f, "-- {}", source.display())?;
        }
        writeln!(f, "{}", self.sql.trim())?;

        let metadata = match &self.outcome {
            Ok(metadata) => metadata,
            Err(message) => return writeln!(f, "  error: {message}"),
        };
        writeln!(f, "  type: {}", metadata.query_type)?;
        write_list(f, "tables", &metadata.tables)?;
        if !metadata.tables_aliases.is_empty() {
            let aliases: Vec<String> = metadata
                .tables_aliases
                .iter()
                .map(|(alias, table)| format!("{alias} -> {table}"))
                .collect();
            write_list(f, "table aliases", &aliases)?;
        }
        write_list(f, "columns", &metadata.columns)?;
        for (section, columns) in &metadata.columns_dict {
            write_list(f, &format!("columns[{section}]"), columns)?;
        }
        write_list(f, "column aliases", &metadata.columns_aliases_names)?;
        write_list(f, "with", &metadata.with_names)?;
        write_list(f, "subqueries", &metadata.subqueries_names)?;
        if let Some((limit, offset)) = metadata.limit_and_offset {
            writeln!(f, "  limit: {limit} offset: {offset}")?;
        }
        if !metadata.values_dict.is_empty() {
            let values: Vec<String> = metadata
                .values_dict
                .iter()
                .map(|(column, value)| format!("{column}={value}"))
                .collect();
            write_list(f, "values", &values)?;
        }
        write_list(f, "comments", &metadata.comments)
    }
}

/// Split script text on `;` outside literals, quoted identifiers and
/// comments. Blank statements are dropped.
pub fn split_statements(text: &str) -> Vec<&str> {
    let mut statements = Vec::new();
    let mut start = 0;
    let mut offset = 0;

    for segment in segments(text) {
        if segment.kind == SegmentKind::Code {
            for (i, c) in segment.text.char_indices() {
                if c == ';' {
                    statements.push(&text[start..offset + i]);
                    start = offset + i + 1;
                }
            }
        }
        offset += segment.text.len();
    }
    statements.push(&text[start..]);

    statements
        .into_iter()
        .filter(|s| segments(s).iter().any(|seg| !seg.kind.is_comment() && !seg.text.trim().is_empty()))
        .map(str::trim)
        .collect()
}

/// Read a file as a string, trying UTF-8 first, then Windows-1252 as fallback
fn read_file_with_encoding_fallback(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| SqlMetaError::FileRead {
        path: path.to_path_buf(),
        source: Arc::new(e),
    })?;

    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            // Common for SQL files created on Windows
            let (decoded, _, had_errors) = WINDOWS_1252.decode(err.as_bytes());
            if had_errors {
                return Err(SqlMetaError::InvalidEncoding {
                    path: path.to_path_buf(),
                });
            }
            decoded.into_owned()
        }
    };

    Ok(match text.strip_prefix('\u{FEFF}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    })
}

/// Analyze every statement of a SQL file.
pub fn analyze_sql_file(path: &Path, config: AnalyzerConfig) -> Result<Vec<QueryReport>> {
    let content = read_file_with_encoding_fallback(path)?;
    let reports: Vec<QueryReport> = split_statements(&content)
        .into_iter()
        .map(|sql| QueryReport::analyze(sql, Some(path), config))
        .collect();
    log::debug!("Analyzed {} statements from {}", reports.len(), path.display());
    Ok(reports)
}

/// Analyze multiple SQL files, using parallel processing for larger file sets
pub fn analyze_sql_files(files: &[PathBuf], config: AnalyzerConfig) -> Result<Vec<QueryReport>> {
    let mut all_reports = Vec::with_capacity(files.len() * 2);

    if files.len() >= PARALLEL_THRESHOLD {
        let results: Vec<Result<Vec<QueryReport>>> = files
            .par_iter()
            .map(|file| analyze_sql_file(file, config))
            .collect();

        // Combine results, propagating the first error if any
        for result in results {
            all_reports.extend(result?);
        }
    } else {
        for file in files {
            all_reports.extend(analyze_sql_file(file, config)?);
        }
    }

    Ok(all_reports)
}

/// Analyze independent statements; each worker owns its own [`Query`].
pub fn analyze_queries<S: AsRef<str> + Sync>(queries: &[S], config: AnalyzerConfig) -> Vec<QueryReport> {
    if queries.len() >= PARALLEL_THRESHOLD {
        queries
            .par_iter()
            .map(|sql| QueryReport::analyze(sql.as_ref(), None, config))
            .collect()
    } else {
        queries
            .iter()
            .map(|sql| QueryReport::analyze(sql.as_ref(), None, config))
            .collect()
    }
}

/// Every `*.sql` file under `root`, sorted.
pub fn collect_sql_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("sql"))
        })
        .collect();
    files.sort();
    files
}
