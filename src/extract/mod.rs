//! Metadata extraction over an annotated token sequence
//!
//! Each submodule answers one question about the statement. [`Analysis`]
//! runs them in dependency order: WITH clauses and sub-queries first (they
//! name things that are not tables), then tables and table aliases, then
//! columns and column aliases, which need all of the above.

mod aliases;
mod columns;
mod limit;
mod nested;
mod subqueries;
mod tables;
mod values;
mod with_queries;

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::config::AnalyzerConfig;
use crate::error::{Result, SqlMetaError};
use crate::keywords::Section;
use crate::query_type::QueryType;
use crate::token::TokenSequence;
use crate::util::{extend_unique, push_unique};

pub use aliases::AliasTarget;
pub use values::SqlValue;

pub(crate) use aliases::resolve_alias;
pub(crate) use limit::extract_limit_and_offset;
pub(crate) use values::extract_values;

use columns::{ColumnContext, ColumnEvent};
use nested::NestedQueries;

/// Everything extracted from one statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Analysis {
    pub tables: Vec<String>,
    pub tables_aliases: HashMap<String, String>,
    pub columns: Vec<String>,
    pub columns_without_subqueries: Vec<String>,
    pub columns_dict: BTreeMap<Section, Vec<String>>,
    pub columns_aliases_names: Vec<String>,
    pub columns_aliases: HashMap<String, AliasTarget>,
    pub columns_aliases_dict: BTreeMap<Section, Vec<String>>,
    pub with_names: Vec<String>,
    pub with_queries: Vec<(String, String)>,
    pub subqueries_names: Vec<String>,
    pub subqueries: Vec<(String, String)>,
}

/// `CREATE TABLE t AS SELECT ...` is not supported.
fn reject_create_table_as_select(tokens: &TokenSequence) -> Result<()> {
    let found = tokens.cursors().any(|token| {
        let next = token.next();
        token.is_keyword()
            && token.normalized() == "AS"
            && !token.is_in_parenthesis()
            && ((next.is_keyword() && next.normalized() == "SELECT") || next.is_left_paren())
    });
    if found {
        return Err(SqlMetaError::MalformedCreateTable {
            message: "CREATE TABLE ... AS SELECT is not supported".to_string(),
        });
    }
    Ok(())
}

impl Analysis {
    /// Run every extraction pass over `tokens`.
    ///
    /// `depth` is how many sub-query / CTE bodies deep this statement sits.
    pub(crate) fn build(
        tokens: &TokenSequence,
        query_type: QueryType,
        config: AnalyzerConfig,
        depth: usize,
    ) -> Result<Self> {
        if query_type == QueryType::Create {
            reject_create_table_as_select(tokens)?;
        }

        let with = with_queries::extract_with_queries(tokens)?;
        let subqueries = subqueries::extract_subqueries(tokens);
        let tables = tables::extract_tables(tokens, &with.names);
        let tables_aliases = tables::extract_table_aliases(tokens, &tables);

        let declarations = aliases::collect_declarations(tokens, &with, &subqueries);
        let alias_names = aliases::alias_names(&declarations);
        let declared: HashSet<usize> = declarations.iter().map(|d| d.index).collect();

        let with_columns: HashMap<&str, Vec<String>> = with
            .column_lists
            .iter()
            .map(|list| {
                let names = list
                    .columns
                    .iter()
                    .map(|&i| tokens.cursor(i).value().to_string())
                    .collect();
                (list.cte.as_str(), names)
            })
            .collect();
        let mut nested = NestedQueries::new(&with, &subqueries, with_columns, config, depth);

        let scan = columns::scan_columns(
            tokens,
            &mut ColumnContext {
                query_type,
                tables_aliases: &tables_aliases,
                alias_names: &alias_names,
                declarations: &declared,
                nested: &mut nested,
            },
        )?;
        let columns_aliases = aliases::resolve_declarations(
            tokens,
            &declarations,
            &scan.known,
            &alias_names,
            &mut nested,
        )?;

        let mut analysis = Analysis {
            tables,
            tables_aliases,
            columns_aliases_names: alias_names,
            with_names: with.names.clone(),
            with_queries: with.queries.clone(),
            subqueries_names: subqueries.names.clone(),
            subqueries: subqueries.queries.clone(),
            ..Analysis::default()
        };

        for declaration in &declarations {
            if let Some(section) = declaration.section {
                push_unique(
                    analysis.columns_aliases_dict.entry(section).or_default(),
                    declaration.name.as_str(),
                );
            }
        }

        for event in scan.events {
            match event {
                ColumnEvent::Column {
                    values,
                    literal,
                    section,
                } => {
                    if let Some(section) = section {
                        extend_unique(analysis.columns_dict.entry(section).or_default(), values.iter().cloned());
                    }
                    extend_unique(&mut analysis.columns, values);
                    push_unique(&mut analysis.columns_without_subqueries, literal);
                }
                ColumnEvent::AliasReference { name, section } => {
                    if columns_aliases.contains_key(&name) {
                        push_unique(analysis.columns_aliases_dict.entry(section).or_default(), name);
                    } else {
                        // an alias of itself is just the column
                        push_unique(analysis.columns_dict.entry(section).or_default(), name.as_str());
                        push_unique(&mut analysis.columns, name.as_str());
                        push_unique(&mut analysis.columns_without_subqueries, name);
                    }
                }
            }
        }

        for (section, names) in &analysis.columns_aliases_dict {
            for name in names.iter().filter(|n| columns_aliases.contains_key(*n)) {
                extend_unique(
                    analysis.columns_dict.entry(*section).or_default(),
                    resolve_alias(&columns_aliases, name),
                );
            }
        }
        // an alias cycle ends on a name no column token spelled out
        for names in analysis.columns_dict.values() {
            extend_unique(&mut analysis.columns, names.iter().cloned());
        }
        analysis.columns_aliases = columns_aliases;

        log::debug!(
            "Analyzed {} query: {} tables, {} columns, {} column aliases",
            query_type,
            analysis.tables.len(),
            analysis.columns.len(),
            analysis.columns_aliases.len()
        );
        Ok(analysis)
    }
}
