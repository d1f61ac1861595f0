//! Column alias declarations and their resolution
//!
//! An alias is declared with `AS`, implicitly after a closing parenthesis
//! (`count(x) cnt`), implicitly after a name in a select list
//! (`t.a alias_name`), or positionally through a CTE column list
//! (`WITH cte (c1, c2) AS (...)`).

use std::collections::{HashMap, HashSet};

use crate::error::Result;
use crate::keywords::{self, Section};
use crate::token::{Cursor, Direction, ParenKind, TokenSequence};
use crate::util::{extend_unique, push_unique};

use super::nested::NestedQueries;
use super::subqueries::Subqueries;
use super::with_queries::WithClause;

/// What a column alias stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AliasTarget {
    /// The alias renames a single column.
    Column(String),
    /// The alias names an expression over several columns.
    Columns(Vec<String>),
}

impl AliasTarget {
    pub fn columns(&self) -> &[String] {
        match self {
            Self::Column(column) => std::slice::from_ref(column),
            Self::Columns(columns) => columns,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DeclarationKind {
    Expression,
    /// `position`-th entry of the column list of `cte`.
    WithColumn { cte: String, position: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AliasDeclaration {
    pub name: String,
    pub index: usize,
    pub section: Option<Section>,
    pub kind: DeclarationKind,
}

/// `SELECT t.a alias_name FROM ...`: a name directly following a column
/// expression, itself followed by a list separator or the end of the list.
pub(crate) fn is_alias_without_as(token: &Cursor<'_>) -> bool {
    if !token.is_name() || token.last_keyword() != "SELECT" || token.is_in_nested_function() {
        return false;
    }

    let next = token.next();
    let ends_item = next.is_empty()
        || next.is_comma()
        || (next.is_keyword() && next.normalized() == "FROM")
        || next.closes(ParenKind::Subquery)
        || next.closes(ParenKind::ColumnDefinition)
        || next.closes(ParenKind::WithQuery);
    if !ends_item {
        return false;
    }

    let previous = token.previous();
    previous.is_name()
        || previous.is_literal()
        || previous.closes(ParenKind::NestedFunction)
        || previous.closes(ParenKind::ColumnDefinition)
        || (previous.is_keyword() && previous.normalized() == "END")
}

fn is_expression_alias(token: &Cursor<'_>) -> bool {
    if !token.is_name() || token.next().is_dot() || token.next().is_left_paren() {
        return false;
    }
    let last_keyword = token.last_keyword();
    if !keywords::precedes_columns(last_keyword) || last_keyword == "USING" {
        return false;
    }
    let previous = token.previous();
    (previous.is_keyword() && previous.normalized() == "AS" && !token.is_in_type_cast())
        || previous.closes(ParenKind::NestedFunction)
        || previous.closes(ParenKind::ColumnDefinition)
        || is_alias_without_as(token)
}

/// Every alias declaration, in source order.
pub(crate) fn collect_declarations(
    tokens: &TokenSequence,
    with: &WithClause,
    subqueries: &Subqueries,
) -> Vec<AliasDeclaration> {
    let reserved = |name: &str| {
        with.names.iter().any(|n| n == name) || subqueries.names.iter().any(|n| n == name)
    };

    let mut declarations: Vec<AliasDeclaration> = tokens
        .cursors()
        .filter(|token| is_expression_alias(token) && !reserved(token.value()))
        .filter_map(|token| {
            Some(AliasDeclaration {
                name: token.value().to_string(),
                index: token.index()?,
                section: Section::from_keyword(token.last_keyword()),
                kind: DeclarationKind::Expression,
            })
        })
        .collect();

    for list in &with.column_lists {
        for (position, &index) in list.columns.iter().enumerate() {
            declarations.push(AliasDeclaration {
                name: tokens.cursor(index).value().to_string(),
                index,
                section: None,
                kind: DeclarationKind::WithColumn {
                    cte: list.cte.clone(),
                    position,
                },
            });
        }
    }

    declarations.sort_by_key(|d| d.index);
    declarations
}

/// Declared alias names without duplicates, in source order.
pub(crate) fn alias_names(declarations: &[AliasDeclaration]) -> Vec<String> {
    let mut names = Vec::new();
    for declaration in declarations {
        push_unique(&mut names, declaration.name.as_str());
    }
    names
}

/// Resolve every declaration to the columns it stands for.
///
/// `known` maps the dotted spelling of each column token seen by the column
/// pass to its resolved column names. Aliases that resolve to themselves, or
/// to nothing, get no entry.
pub(crate) fn resolve_declarations(
    tokens: &TokenSequence,
    declarations: &[AliasDeclaration],
    known: &HashMap<String, Vec<String>>,
    names: &[String],
    nested: &mut NestedQueries<'_>,
) -> Result<HashMap<String, AliasTarget>> {
    let mut aliases = HashMap::new();

    for declaration in declarations {
        if aliases.contains_key(&declaration.name) {
            continue;
        }
        let targets = match &declaration.kind {
            DeclarationKind::Expression => {
                expression_columns(tokens.cursor(declaration.index), known, names)
            }
            DeclarationKind::WithColumn { cte, position } => nested
                .select_column(cte, *position)?
                .into_iter()
                .collect(),
        };

        let target = match targets.as_slice() {
            [] => continue,
            [single] if *single == declaration.name => continue,
            [single] => AliasTarget::Column(single.clone()),
            _ => AliasTarget::Columns(targets),
        };
        aliases.insert(declaration.name.clone(), target);
    }

    log::trace!("Resolved {} of {} column aliases", aliases.len(), declarations.len());
    Ok(aliases)
}

/// Columns used by the expression an alias token names.
fn expression_columns(
    alias: Cursor<'_>,
    known: &HashMap<String, Vec<String>>,
    names: &[String],
) -> Vec<String> {
    let previous = alias.previous();
    let checked = if previous.is_keyword() && previous.normalized() == "AS" {
        previous.previous()
    } else {
        previous
    };

    let is_checkable = |c: &Cursor<'_>| {
        if c.next().is_dot() || !(c.is_name() || c.is_wildcard()) {
            return false;
        }
        let spelled = c.left_expanded();
        c.is_wildcard() || known.contains_key(&spelled) || names.contains(&spelled)
    };
    let resolved = |c: &Cursor<'_>| {
        let spelled = c.left_expanded();
        known.get(&spelled).cloned().unwrap_or_else(|| vec![spelled])
    };

    // `(SELECT max(b) FROM u) AS m` aliases the first column of the sub-select
    if checked.closes(ParenKind::ColumnDefinition) {
        let open = checked.matching_paren();
        let select = open.next();
        if select.is_keyword() && select.normalized() == "SELECT" {
            let found = select.find_nearest(Direction::Right, |c| {
                c.index() >= checked.index() || is_checkable(c)
            });
            if found.index() < checked.index() && !found.is_empty() {
                return resolved(&found);
            }
            return Vec::new();
        }
    }

    let depth = alias.enclosing_paren().index();
    let start = alias.find_nearest(Direction::Left, |c| {
        c.enclosing_paren().index() == depth
            && (c.is_comma() || (c.is_keyword() && keywords::precedes_columns(c.normalized())))
    });
    let from = start.index().map_or(0, |i| i + 1);
    let to = alias.index().unwrap_or_default();

    let mut columns = Vec::new();
    let mut current = alias.at_index(from);
    while let Some(index) = current.index() {
        if index >= to {
            break;
        }
        if is_checkable(&current) {
            extend_unique(&mut columns, resolved(&current));
        }
        current = current.next();
    }
    columns
}

/// Substitute alias chains (`a -> b -> col`) down to real columns.
///
/// A cycle stops at the last alias seen before it repeats.
pub(crate) fn resolve_alias(aliases: &HashMap<String, AliasTarget>, name: &str) -> Vec<String> {
    let mut visited = HashSet::new();
    let mut columns = Vec::new();
    resolve_into(aliases, name, &mut visited, &mut columns);
    columns
}

fn resolve_into(
    aliases: &HashMap<String, AliasTarget>,
    name: &str,
    visited: &mut HashSet<String>,
    out: &mut Vec<String>,
) {
    if !visited.insert(name.to_string()) {
        push_unique(out, name);
        return;
    }
    match aliases.get(name) {
        None => {
            push_unique(out, name);
        }
        Some(target) => {
            for column in target.columns() {
                resolve_into(aliases, column, visited, out);
            }
        }
    }
}
