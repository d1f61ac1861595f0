//! The query object
//!
//! A [`Query`] is built from raw SQL text and computes each property lazily,
//! at most once. Tokenization, query type and the extraction passes are
//! cached together with their error, so a malformed statement fails the same
//! way every time a dependent property is asked for, while text-only
//! properties (`comments`, `without_comments`, `generalize`) keep working.

use std::collections::{BTreeMap, HashMap};

use once_cell::unsync::OnceCell;

use crate::config::AnalyzerConfig;
use crate::error::{Result, SqlMetaError};
use crate::extract::{self, AliasTarget, Analysis, SqlValue};
use crate::generalize::generalize_sql;
use crate::keywords::Section;
use crate::preprocess::{extract_comments, preprocess_query, strip_comments};
use crate::query_type::{detect_query_type, QueryType};
use crate::token::TokenSequence;
use crate::tokenizer::tokenize;

/// One SQL statement and its lazily computed metadata.
#[derive(Debug)]
pub struct Query {
    raw: String,
    query: String,
    config: AnalyzerConfig,
    depth: usize,
    tokens: OnceCell<Result<TokenSequence>>,
    query_type: OnceCell<Result<QueryType>>,
    analysis: OnceCell<Result<Analysis>>,
    values: OnceCell<Result<Vec<SqlValue>>>,
    values_dict: OnceCell<Result<Vec<(String, SqlValue)>>>,
}

/// Borrow the success value of a cached stage, cloning its error.
#[inline]
fn cached<T>(cell: &Result<T>) -> Result<&T> {
    cell.as_ref().map_err(Clone::clone)
}

impl Query {
    /// Wrap `sql` with the default limits. Nothing is parsed yet.
    pub fn new(sql: impl Into<String>) -> Self {
        Self::with_config(sql, AnalyzerConfig::default())
    }

    pub fn with_config(sql: impl Into<String>, config: AnalyzerConfig) -> Self {
        let raw = sql.into();
        let query = preprocess_query(&raw);
        Self {
            raw,
            query,
            config,
            depth: 0,
            tokens: OnceCell::new(),
            query_type: OnceCell::new(),
            analysis: OnceCell::new(),
            values: OnceCell::new(),
            values_dict: OnceCell::new(),
        }
    }

    /// A sub-query or CTE body analyzed on behalf of an enclosing query.
    pub(crate) fn nested(sql: &str, config: AnalyzerConfig, depth: usize) -> Result<Self> {
        if depth > config.max_recursion_depth {
            return Err(SqlMetaError::RecursionLimit {
                depth,
                limit: config.max_recursion_depth,
            });
        }
        let mut query = Self::with_config(sql, config);
        query.depth = depth;
        Ok(query)
    }

    /// The text exactly as given.
    pub fn raw_query(&self) -> &str {
        &self.raw
    }

    /// The preprocessed text the analysis runs on.
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn tokens(&self) -> Result<&TokenSequence> {
        cached(self.tokens.get_or_init(|| tokenize(&self.query, &self.config)))
    }

    pub fn query_type(&self) -> Result<QueryType> {
        self.query_type
            .get_or_init(|| {
                let query_type = detect_query_type(self.tokens()?);
                if let Err(err) = &query_type {
                    log::debug!("Query type detection failed: {err}");
                }
                query_type
            })
            .clone()
    }

    pub(crate) fn analysis(&self) -> Result<&Analysis> {
        cached(self.analysis.get_or_init(|| {
            let tokens = self.tokens()?;
            let query_type = self.query_type()?;
            Analysis::build(tokens, query_type, self.config, self.depth)
        }))
    }

    // ========================================================================
    // Tables
    // ========================================================================

    /// Tables in order of first appearance, without CTE names.
    pub fn tables(&self) -> Result<&[String]> {
        Ok(&self.analysis()?.tables)
    }

    /// `alias -> table`.
    pub fn tables_aliases(&self) -> Result<&HashMap<String, String>> {
        Ok(&self.analysis()?.tables_aliases)
    }

    // ========================================================================
    // Columns
    // ========================================================================

    /// Columns in order of first appearance, qualified with real table names
    /// where the query qualifies them with an alias.
    pub fn columns(&self) -> Result<&[String]> {
        Ok(&self.analysis()?.columns)
    }

    /// Like [`Query::columns`], but `sq.col` for a sub-query or CTE `sq` is
    /// kept as written instead of being resolved through its body.
    pub fn columns_without_subqueries(&self) -> Result<&[String]> {
        Ok(&self.analysis()?.columns_without_subqueries)
    }

    /// Columns per clause; aliases are replaced by the columns they stand for.
    pub fn columns_dict(&self) -> Result<&BTreeMap<Section, Vec<String>>> {
        Ok(&self.analysis()?.columns_dict)
    }

    pub fn columns_aliases_names(&self) -> Result<&[String]> {
        Ok(&self.analysis()?.columns_aliases_names)
    }

    pub fn columns_aliases(&self) -> Result<&HashMap<String, AliasTarget>> {
        Ok(&self.analysis()?.columns_aliases)
    }

    /// Alias names per clause: where each is declared and where it is used.
    pub fn columns_aliases_dict(&self) -> Result<&BTreeMap<Section, Vec<String>>> {
        Ok(&self.analysis()?.columns_aliases_dict)
    }

    // ========================================================================
    // WITH clauses and sub-queries
    // ========================================================================

    pub fn with_names(&self) -> Result<&[String]> {
        Ok(&self.analysis()?.with_names)
    }

    /// `(name, body)` of each CTE, in declaration order.
    pub fn with_queries(&self) -> Result<&[(String, String)]> {
        Ok(&self.analysis()?.with_queries)
    }

    pub fn subqueries_names(&self) -> Result<&[String]> {
        Ok(&self.analysis()?.subqueries_names)
    }

    /// `(alias, body)` of each aliased sub-query, innermost first.
    pub fn subqueries(&self) -> Result<&[(String, String)]> {
        Ok(&self.analysis()?.subqueries)
    }

    // ========================================================================
    // LIMIT and VALUES
    // ========================================================================

    /// `(limit, offset)`, or `None` without a LIMIT clause.
    pub fn limit_and_offset(&self) -> Result<Option<(u64, u64)>> {
        Ok(extract::extract_limit_and_offset(self.tokens()?))
    }

    /// Literals of the VALUES lists of an INSERT or REPLACE; empty otherwise.
    pub fn values(&self) -> Result<&[SqlValue]> {
        let values = self.values.get_or_init(|| {
            if !self.query_type()?.has_values() {
                return Ok(Vec::new());
            }
            Ok(extract::extract_values(self.tokens()?))
        });
        Ok(cached(values)?.as_slice())
    }

    /// Values paired with the insert column list, or with `column_1`,
    /// `column_2`, ... when the statement names no columns.
    pub fn values_dict(&self) -> Result<&[(String, SqlValue)]> {
        let pairs = self.values_dict.get_or_init(|| {
            let values = self.values()?;
            let columns = self
                .columns_dict()?
                .get(&Section::Insert)
                .filter(|columns| !columns.is_empty());
            let pairs = match columns {
                Some(columns) => columns.iter().cloned().zip(values.iter().cloned()).collect(),
                None => values
                    .iter()
                    .enumerate()
                    .map(|(i, value)| (format!("column_{}", i + 1), value.clone()))
                    .collect(),
            };
            Ok(pairs)
        });
        Ok(cached(pairs)?.as_slice())
    }

    // ========================================================================
    // Text
    // ========================================================================

    /// Comments of the raw text, with delimiters.
    pub fn comments(&self) -> Vec<String> {
        extract_comments(&self.raw)
    }

    /// The raw text without comments, whitespace collapsed.
    pub fn without_comments(&self) -> String {
        strip_comments(&self.raw)
    }

    /// Literal-free fingerprint of the raw text.
    pub fn generalize(&self) -> String {
        generalize_sql(&self.raw)
    }
}
