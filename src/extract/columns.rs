//! Column reference extraction
//!
//! The pass records one [`ColumnEvent`] per column token, in source order.
//! Bare names that match a declared alias are kept as
//! [`ColumnEvent::AliasReference`] and settled once aliases are resolved.

use std::collections::{HashMap, HashSet};

use crate::error::Result;
use crate::keywords::{self, Section};
use crate::query_type::QueryType;
use crate::token::{Cursor, Direction, ParenKind, TokenSequence};

use super::nested::NestedQueries;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ColumnEvent {
    Column {
        /// Resolved column names; several when a sub-query column stands for
        /// an expression.
        values: Vec<String>,
        /// Spelling with table aliases substituted but sub-queries unresolved.
        literal: String,
        section: Option<Section>,
    },
    AliasReference {
        name: String,
        section: Section,
    },
}

#[derive(Debug, Default)]
pub(crate) struct ColumnScan {
    pub events: Vec<ColumnEvent>,
    /// Dotted spelling of each column token -> resolved columns.
    pub known: HashMap<String, Vec<String>>,
}

pub(crate) struct ColumnContext<'a, 'n> {
    pub query_type: QueryType,
    pub tables_aliases: &'a HashMap<String, String>,
    pub alias_names: &'a [String],
    /// Token indices of alias declarations.
    pub declarations: &'a HashSet<usize>,
    pub nested: &'a mut NestedQueries<'n>,
}

fn is_keyword(cursor: &Cursor<'_>, normalized: &str) -> bool {
    cursor.is_keyword() && cursor.normalized() == normalized
}

/// Section a name token sits in, when the position holds column names.
fn column_section(token: &Cursor<'_>) -> Option<Section> {
    let last_keyword = token.last_keyword();
    match last_keyword {
        // INSERT INTO t (a, b): only the column list opened after INTO
        "INTO" => {
            let paren = token.enclosing_paren();
            let opened_after_into = match (paren.index(), token.last_keyword_position()) {
                (Some(paren), Some(keyword)) => paren > keyword,
                _ => false,
            };
            (opened_after_into && token.previous().is_punctuation()).then_some(Section::Insert)
        }
        // JOIN t USING (a, b)
        "USING" => {
            let paren = token.enclosing_paren();
            is_keyword(&paren.previous(), "USING").then_some(Section::Join)
        }
        _ if keywords::precedes_columns(last_keyword) => Section::from_keyword(last_keyword),
        _ => None,
    }
}

/// Names in column position that are something else: aliases, types,
/// function names, interval units, CTE column lists.
fn is_excluded_name(token: &Cursor<'_>, declarations: &HashSet<usize>) -> bool {
    let previous = token.previous();
    let next = token.next();

    if next.is_dot() || next.is_left_paren() || keywords::is_ignored_function(token.normalized()) {
        return true;
    }
    if is_keyword(&previous, "AS") || previous.is_right_paren() || previous.value() == "::" {
        return true;
    }
    if previous.is_integer() || previous.is_literal() {
        // INTERVAL 7 DAY, INTERVAL -13 MONTH
        let mut before = previous.previous();
        if matches!(before.value(), "-" | "+") {
            before = before.previous();
        }
        if is_keyword(&before, "INTERVAL") {
            return true;
        }
    }
    if token.index().is_some_and(|i| declarations.contains(&i)) {
        return true;
    }
    let paren = token.enclosing_paren();
    paren.opens(ParenKind::WithColumns) || paren.opens(ParenKind::CreateTableColumns)
}

/// Column names declared by `CREATE TABLE t (...)`: the leading name of each
/// item that is not a constraint.
fn create_table_columns(tokens: &TokenSequence) -> Vec<ColumnEvent> {
    let mut events = Vec::new();

    for open in tokens.cursors() {
        if !open.opens(ParenKind::CreateTableColumns) {
            continue;
        }
        let close = open.matching_paren();
        let mut item_start = open.next();
        while !item_start.is_empty() && item_start.index() < close.index() {
            if item_start.is_name() && !keywords::is_table_constraint(item_start.normalized()) {
                events.push(ColumnEvent::Column {
                    values: vec![item_start.value().to_string()],
                    literal: item_start.value().to_string(),
                    section: None,
                });
            }
            item_start = item_start
                .find_nearest(Direction::Right, |c| {
                    c.index() >= close.index() || (c.is_comma() && c.enclosing_paren() == open)
                })
                .next();
        }
    }
    events
}

/// Walk every token and record column references.
pub(crate) fn scan_columns(tokens: &TokenSequence, ctx: &mut ColumnContext<'_, '_>) -> Result<ColumnScan> {
    let mut scan = ColumnScan::default();

    if ctx.query_type == QueryType::Create {
        scan.events = create_table_columns(tokens);
        return Ok(scan);
    }

    for token in tokens.cursors() {
        if token.is_wildcard() {
            if token.last_keyword() == "SELECT" && !token.previous().is_left_paren() {
                record(&mut scan, ctx, &token, Some(Section::Select))?;
            }
            continue;
        }
        if !token.is_name() {
            continue;
        }
        let Some(section) = column_section(&token) else {
            continue;
        };
        if is_excluded_name(&token, ctx.declarations) {
            continue;
        }

        let spelled = token.left_expanded();
        if !spelled.contains('.') && ctx.alias_names.iter().any(|a| *a == spelled) {
            scan.events.push(ColumnEvent::AliasReference {
                name: spelled,
                section,
            });
            continue;
        }
        record(&mut scan, ctx, &token, Some(section))?;
    }

    log::trace!("Column pass recorded {} references", scan.events.len());
    Ok(scan)
}

fn record(
    scan: &mut ColumnScan,
    ctx: &mut ColumnContext<'_, '_>,
    token: &Cursor<'_>,
    section: Option<Section>,
) -> Result<()> {
    let spelled = token.left_expanded();
    let (values, literal) = qualify(ctx, &spelled)?;
    scan.known.entry(spelled).or_insert_with(|| values.clone());
    scan.events.push(ColumnEvent::Column {
        values,
        literal,
        section,
    });
    Ok(())
}

/// Replace a table alias qualifier with its table, and resolve columns of
/// aliased sub-queries and CTEs through their bodies.
fn qualify(ctx: &mut ColumnContext<'_, '_>, spelled: &str) -> Result<(Vec<String>, String)> {
    let Some((qualifier, column)) = spelled.rsplit_once('.') else {
        return Ok((vec![spelled.to_string()], spelled.to_string()));
    };

    if let Some(table) = ctx.tables_aliases.get(qualifier) {
        let qualified = format!("{table}.{column}");
        return Ok((vec![qualified.clone()], qualified));
    }
    if ctx.nested.contains(qualifier) {
        let values = ctx.nested.resolve_column(qualifier, column)?;
        return Ok((values, spelled.to_string()));
    }
    Ok((vec![spelled.to_string()], spelled.to_string()))
}
