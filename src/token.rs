//! Token model and navigation.
//!
//! Tokens live in a [`TokenSequence`], an owning vector; neighbours are
//! reached by index. [`Cursor`] wraps an optional index into that vector and
//! stands in for the "empty token": a cursor that walked off either end of
//! the sequence answers every query with `false` / `""` instead of forcing
//! callers to null-check.

use crate::keywords;

/// Lexical class of a token after keyword classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Keyword,
    Name,
    /// Parentheses, comma, semicolon, colon.
    Punctuation,
    Dot,
    Wildcard,
    Integer,
    Float,
    /// Quoted string literals and bind placeholders.
    Literal,
    /// Comparison / arithmetic operators and anything else the lexer emits.
    Operator,
}

/// Role of a parenthesis pair, decided when the opening parenthesis is seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParenKind {
    /// `FROM (SELECT ...)` / `JOIN (...)`
    Subquery,
    /// Parenthesized expression in a column position, e.g. a scalar sub-select.
    ColumnDefinition,
    /// Function call arguments or a plain grouping.
    NestedFunction,
    /// Body of a CTE: `name AS (...)`.
    WithQuery,
    /// Column list of a CTE: `name (c1, c2) AS`.
    WithColumns,
    /// Column definitions of `CREATE TABLE name (...)`.
    CreateTableColumns,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParenSide {
    Open,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParenRole {
    pub kind: ParenKind,
    pub side: ParenSide,
}

/// Search direction for [`Cursor::find_nearest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

/// One significant token of a query.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlToken {
    /// Token text with identifier quotes removed; string literals keep theirs.
    pub value: String,
    /// Uppercased, whitespace-free form of unquoted words; `value` otherwise.
    pub normalized: String,
    pub kind: TokenKind,
    /// Quote character of a delimited identifier.
    pub quote: Option<char>,
    /// Whitespace or a comment separated this token from the previous one.
    pub space_before: bool,
    pub paren: Option<ParenRole>,
    /// Nearest preceding significant keyword, normalized.
    pub last_keyword: Option<String>,
    /// Index of the token `last_keyword` came from.
    pub last_keyword_position: Option<usize>,
    pub subquery_level: usize,
    /// Index of the innermost open parenthesis containing this token.
    pub enclosing_paren: Option<usize>,
    /// For parentheses, the index of the partner parenthesis.
    pub matching_paren: Option<usize>,
    pub position: usize,
}

impl SqlToken {
    /// Text used when the token is stitched back into SQL.
    pub fn display(&self) -> String {
        match self.quote {
            Some(quote) => {
                let close = if quote == '[' { ']' } else { quote };
                format!("{quote}{}{close}", self.value)
            }
            None => self.value.clone(),
        }
    }
}

/// The annotated token sequence of one query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenSequence {
    tokens: Vec<SqlToken>,
}

impl TokenSequence {
    pub(crate) fn new(tokens: Vec<SqlToken>) -> Self {
        Self { tokens }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    #[inline]
    pub fn tokens(&self) -> &[SqlToken] {
        &self.tokens
    }

    /// Cursor at `index`; the empty cursor when out of range.
    #[inline]
    pub fn cursor(&self, index: usize) -> Cursor<'_> {
        Cursor::new(&self.tokens, index)
    }

    #[inline]
    pub fn first(&self) -> Cursor<'_> {
        self.cursor(0)
    }

    /// Cursors over every token, left to right.
    pub fn cursors(&self) -> impl Iterator<Item = Cursor<'_>> + '_ {
        (0..self.tokens.len()).map(move |i| Cursor::new(&self.tokens, i))
    }

    /// Re-assemble the tokens strictly between `open` and `close` into SQL text.
    ///
    /// Tokens that were separated in the source get a single space, except
    /// after `(` or `.` and before `)`, `.` or `,`.
    pub fn stringify_between(&self, open: usize, close: usize) -> String {
        let mut out = String::new();
        let mut previous: Option<&SqlToken> = None;
        for token in self.tokens.iter().take(close).skip(open + 1) {
            if let Some(prev) = previous {
                if needs_space(prev, token) {
                    out.push(' ');
                }
            }
            out.push_str(&token.display());
            previous = Some(token);
        }
        out
    }
}

fn needs_space(prev: &SqlToken, token: &SqlToken) -> bool {
    if !token.space_before || prev.kind == TokenKind::Dot || prev.value == "(" {
        return false;
    }
    !(token.kind == TokenKind::Dot || token.value == ")" || token.value == ",")
}

/// Position in a [`TokenSequence`], or the empty token.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    tokens: &'a [SqlToken],
    index: Option<usize>,
}

impl PartialEq for Cursor<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && std::ptr::eq(self.tokens, other.tokens)
    }
}

impl<'a> Cursor<'a> {
    #[inline]
    pub fn new(tokens: &'a [SqlToken], index: usize) -> Self {
        let index = (index < tokens.len()).then_some(index);
        Self { tokens, index }
    }

    #[inline]
    pub fn empty(tokens: &'a [SqlToken]) -> Self {
        Self {
            tokens,
            index: None,
        }
    }

    #[inline]
    fn at(&self, index: Option<usize>) -> Self {
        Self {
            tokens: self.tokens,
            index,
        }
    }

    /// Another position in the same sequence.
    #[inline]
    pub fn at_index(&self, index: usize) -> Self {
        Self::new(self.tokens, index)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_none()
    }

    #[inline]
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    #[inline]
    pub fn token(&self) -> Option<&'a SqlToken> {
        self.index.map(|i| &self.tokens[i])
    }

    // ========================================================================
    // Text and flags
    // ========================================================================

    #[inline]
    pub fn value(&self) -> &'a str {
        self.token().map_or("", |t| t.value.as_str())
    }

    #[inline]
    pub fn normalized(&self) -> &'a str {
        self.token().map_or("", |t| t.normalized.as_str())
    }

    #[inline]
    pub fn kind(&self) -> Option<TokenKind> {
        self.token().map(|t| t.kind)
    }

    #[inline]
    fn has_kind(&self, kind: TokenKind) -> bool {
        self.kind() == Some(kind)
    }

    #[inline]
    pub fn is_name(&self) -> bool {
        self.has_kind(TokenKind::Name)
    }

    #[inline]
    pub fn is_keyword(&self) -> bool {
        self.has_kind(TokenKind::Keyword)
    }

    /// Commas, parentheses, semicolons, colons and dots.
    #[inline]
    pub fn is_punctuation(&self) -> bool {
        self.has_kind(TokenKind::Punctuation) || self.is_dot()
    }

    #[inline]
    pub fn is_dot(&self) -> bool {
        self.has_kind(TokenKind::Dot)
    }

    #[inline]
    pub fn is_comma(&self) -> bool {
        self.has_kind(TokenKind::Punctuation) && self.value() == ","
    }

    #[inline]
    pub fn is_wildcard(&self) -> bool {
        self.has_kind(TokenKind::Wildcard)
    }

    #[inline]
    pub fn is_integer(&self) -> bool {
        self.has_kind(TokenKind::Integer)
    }

    #[inline]
    pub fn is_float(&self) -> bool {
        self.has_kind(TokenKind::Float)
    }

    #[inline]
    pub fn is_literal(&self) -> bool {
        self.has_kind(TokenKind::Literal)
    }

    #[inline]
    pub fn paren_role(&self) -> Option<ParenRole> {
        self.token().and_then(|t| t.paren)
    }

    #[inline]
    pub fn is_left_paren(&self) -> bool {
        matches!(self.paren_role(), Some(role) if role.side == ParenSide::Open)
    }

    #[inline]
    pub fn is_right_paren(&self) -> bool {
        matches!(self.paren_role(), Some(role) if role.side == ParenSide::Close)
    }

    /// True for the opening parenthesis of a pair of the given kind.
    #[inline]
    pub fn opens(&self, kind: ParenKind) -> bool {
        self.paren_role() == Some(ParenRole {
            kind,
            side: ParenSide::Open,
        })
    }

    /// True for the closing parenthesis of a pair of the given kind.
    #[inline]
    pub fn closes(&self, kind: ParenKind) -> bool {
        self.paren_role() == Some(ParenRole {
            kind,
            side: ParenSide::Close,
        })
    }

    #[inline]
    pub fn last_keyword(&self) -> &'a str {
        self.token()
            .and_then(|t| t.last_keyword.as_deref())
            .unwrap_or("")
    }

    #[inline]
    pub fn last_keyword_position(&self) -> Option<usize> {
        self.token().and_then(|t| t.last_keyword_position)
    }

    #[inline]
    pub fn subquery_level(&self) -> usize {
        self.token().map_or(0, |t| t.subquery_level)
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    #[inline]
    pub fn previous(&self) -> Self {
        self.at(self.index.and_then(|i| i.checked_sub(1)))
    }

    #[inline]
    pub fn next(&self) -> Self {
        self.at(self.index.map(|i| i + 1).filter(|&i| i < self.tokens.len()))
    }

    /// The token `k` positions to the left; `nth_previous(1) == previous()`.
    #[inline]
    pub fn nth_previous(&self, k: usize) -> Self {
        self.at(self.index.and_then(|i| i.checked_sub(k)))
    }

    /// Walk in `direction` (starting at the neighbour) until `predicate` matches.
    pub fn find_nearest(&self, direction: Direction, predicate: impl Fn(&Cursor<'a>) -> bool) -> Self {
        let mut current = self.step(direction);
        while !current.is_empty() {
            if predicate(&current) {
                return current;
            }
            current = current.step(direction);
        }
        current
    }

    #[inline]
    fn step(&self, direction: Direction) -> Self {
        match direction {
            Direction::Left => self.previous(),
            Direction::Right => self.next(),
        }
    }

    /// Innermost open parenthesis containing this token.
    #[inline]
    pub fn enclosing_paren(&self) -> Self {
        self.at(self.token().and_then(|t| t.enclosing_paren))
    }

    /// Partner of a parenthesis token.
    #[inline]
    pub fn matching_paren(&self) -> Self {
        self.at(self.token().and_then(|t| t.matching_paren))
    }

    #[inline]
    pub fn is_in_parenthesis(&self) -> bool {
        !self.enclosing_paren().is_empty()
    }

    /// Inside the arguments of a function call (or a plain grouping).
    #[inline]
    pub fn is_in_nested_function(&self) -> bool {
        self.enclosing_paren().opens(ParenKind::NestedFunction)
    }

    /// Inside the arguments of `CAST(...)` and friends.
    pub fn is_in_type_cast(&self) -> bool {
        let paren = self.enclosing_paren();
        paren.opens(ParenKind::NestedFunction)
            && keywords::is_type_cast_function(paren.previous().normalized())
    }

    /// Dotted name ending at this token: `schema.table.column`.
    pub fn left_expanded(&self) -> String {
        let mut parts = vec![self.value()];
        let mut current = *self;
        while current.previous().is_dot() && current.nth_previous(2).is_name() {
            current = current.nth_previous(2);
            parts.push(current.value());
        }
        parts.reverse();
        parts.join(".")
    }

    /// This token's text as it is written back into SQL.
    pub fn display(&self) -> String {
        self.token().map(SqlToken::display).unwrap_or_default()
    }
}
