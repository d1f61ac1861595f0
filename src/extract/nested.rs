//! Sub-query and CTE bodies re-analyzed on demand
//!
//! `sq.col` can only be resolved by looking inside `sq`. Each body is parsed
//! into its own [`Query`] at most once per analysis, one recursion level
//! deeper than the query referencing it.

use std::collections::{HashMap, HashSet};

use crate::config::AnalyzerConfig;
use crate::error::{Result, SqlMetaError};
use crate::keywords::Section;
use crate::query::Query;
use crate::util::push_unique;

use super::aliases::resolve_alias;
use super::subqueries::Subqueries;
use super::with_queries::WithClause;
use super::Analysis;

pub(crate) struct NestedQueries<'a> {
    bodies: HashMap<&'a str, &'a str>,
    /// Declared column lists of CTEs, by CTE name.
    with_columns: HashMap<&'a str, Vec<String>>,
    parsed: HashMap<String, Query>,
    config: AnalyzerConfig,
    depth: usize,
}

impl<'a> NestedQueries<'a> {
    pub fn new(
        with: &'a WithClause,
        subqueries: &'a Subqueries,
        column_names: HashMap<&'a str, Vec<String>>,
        config: AnalyzerConfig,
        depth: usize,
    ) -> Self {
        let mut bodies = HashMap::new();
        for (name, body) in subqueries.queries.iter().chain(with.queries.iter()) {
            bodies.entry(name.as_str()).or_insert(body.as_str());
        }
        Self {
            bodies,
            with_columns: column_names,
            parsed: HashMap::new(),
            config,
            depth,
        }
    }

    #[inline]
    pub fn contains(&self, alias: &str) -> bool {
        self.bodies.contains_key(alias)
    }

    /// Analysis of the body named `alias`.
    ///
    /// Bodies that fail to analyze are logged and treated as opaque; only
    /// exceeding the recursion limit is an error.
    fn analysis(&mut self, alias: &str) -> Result<Option<&Analysis>> {
        let Some(&body) = self.bodies.get(alias) else {
            return Ok(None);
        };
        if !self.parsed.contains_key(alias) {
            let query = Query::nested(body, self.config, self.depth + 1)?;
            self.parsed.insert(alias.to_string(), query);
        }
        let Some(query) = self.parsed.get(alias) else {
            return Ok(None);
        };

        match query.analysis() {
            Ok(analysis) => Ok(Some(analysis)),
            Err(err @ SqlMetaError::RecursionLimit { .. }) => Err(err),
            Err(err) => {
                log::warn!("Could not analyze body of {alias}: {err}");
                Ok(None)
            }
        }
    }

    /// Columns that `alias.column` refers to.
    ///
    /// A result qualified by another sub-query or CTE name is resolved
    /// through that body in turn, so `b AS (SELECT a.x FROM a)` reaches the
    /// columns of `a`.
    pub fn resolve_column(&mut self, alias: &str, column: &str) -> Result<Vec<String>> {
        let mut resolved = Vec::new();
        let mut visited = HashSet::new();
        self.resolve_into(alias, column, &mut visited, &mut resolved)?;
        Ok(resolved)
    }

    fn resolve_into(
        &mut self,
        alias: &str,
        column: &str,
        visited: &mut HashSet<String>,
        out: &mut Vec<String>,
    ) -> Result<()> {
        let literal = format!("{alias}.{column}");
        if !visited.insert(literal.clone()) {
            push_unique(out, literal);
            return Ok(());
        }

        for found in self.resolve_in_body(alias, column)? {
            match found.rsplit_once('.') {
                Some((qualifier, name)) if found != literal && self.contains(qualifier) => {
                    self.resolve_into(qualifier, name, visited, out)?;
                }
                _ => {
                    push_unique(out, found.as_str());
                }
            }
        }
        Ok(())
    }

    /// One step of [`Self::resolve_column`]: look `column` up in the body
    /// named `alias`.
    ///
    /// `alias.*` expands to the select list of the body. Falls back to the
    /// literal `alias.column` when the body does not expose the column, and
    /// when it selects an unqualified `*`.
    fn resolve_in_body(&mut self, alias: &str, column: &str) -> Result<Vec<String>> {
        let literal = format!("{alias}.{column}");
        let declared_position = self
            .with_columns
            .get(alias)
            .and_then(|columns| columns.iter().position(|c| c == column));

        let Some(analysis) = self.analysis(alias)? else {
            return Ok(vec![literal]);
        };
        let selected = analysis
            .columns_dict
            .get(&Section::Select)
            .map(Vec::as_slice)
            .unwrap_or_default();

        if column == "*" {
            if selected.is_empty() || selected.iter().any(|c| c == "*") {
                return Ok(vec![literal]);
            }
            return Ok(selected.to_vec());
        }
        if analysis.columns_aliases.contains_key(column) {
            return Ok(resolve_alias(&analysis.columns_aliases, column));
        }
        let by_name = analysis
            .columns
            .iter()
            .find(|c| c.as_str() == column || c.rsplit('.').next() == Some(column));
        if let Some(found) = by_name {
            return Ok(vec![found.clone()]);
        }
        if let Some(found) = declared_position.and_then(|p| select_at(analysis, p)) {
            return Ok(vec![found]);
        }
        // SELECT t.* exposes every column of t under its own name
        if selected.iter().any(|c| c.ends_with(".*")) {
            return Ok(vec![column.to_string()]);
        }
        Ok(vec![literal])
    }

    /// The `position`-th column of the select list of the body named `alias`.
    pub fn select_column(&mut self, alias: &str, position: usize) -> Result<Option<String>> {
        Ok(self
            .analysis(alias)?
            .and_then(|analysis| select_at(analysis, position)))
    }
}

fn select_at(analysis: &Analysis, position: usize) -> Option<String> {
    analysis
        .columns_dict
        .get(&Section::Select)
        .and_then(|columns| columns.get(position))
        .cloned()
}
