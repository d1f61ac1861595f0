//! Tokenization pass
//!
//! Turns a preprocessed query into an annotated [`TokenSequence`]:
//! - runs the sqlparser lexer (MySQL dialect) and drops whitespace and comments
//! - classifies words as keywords or names using [`crate::keywords`]
//! - glues digit-prefixed identifiers (`0020_big_table`) back together
//! - merges multi-word keywords (`ORDER BY`, `LEFT OUTER JOIN`, ...)
//! - assigns `last_keyword`, parenthesis roles, nesting information

use sqlparser::dialect::MySqlDialect;
use sqlparser::tokenizer::{Token, Tokenizer};

use crate::config::AnalyzerConfig;
use crate::error::{Result, SqlMetaError};
use crate::keywords;
use crate::token::{ParenKind, ParenRole, ParenSide, SqlToken, TokenKind, TokenSequence};
use crate::util::normalize_keyword;

/// A lexer token reduced to what the annotation pass needs.
#[derive(Debug, Clone)]
struct Lexeme {
    kind: TokenKind,
    value: String,
    quote: Option<char>,
    space_before: bool,
}

impl Lexeme {
    fn new(kind: TokenKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
            quote: None,
            space_before: true,
        }
    }

    #[inline]
    fn is_punctuation(&self, text: &str) -> bool {
        self.kind == TokenKind::Punctuation && self.value == text
    }

    #[inline]
    fn is_keyword(&self, upper: &str) -> bool {
        self.kind == TokenKind::Keyword && self.value.eq_ignore_ascii_case(upper)
    }
}

/// Tokenize and annotate `sql`.
pub fn tokenize(sql: &str, config: &AnalyzerConfig) -> Result<TokenSequence> {
    let mut lexemes = merge_compound_keywords(classify(lex(sql)?));

    // A trailing statement terminator carries no information.
    while lexemes.last().is_some_and(|l| l.is_punctuation(";")) {
        lexemes.pop();
    }

    if lexemes.len() > config.max_tokens {
        return Err(SqlMetaError::TooManyTokens {
            count: lexemes.len(),
            limit: config.max_tokens,
        });
    }

    let sequence = Annotator::new(config, is_create_table(&lexemes)).run(lexemes)?;
    log::debug!("Tokenized query into {} tokens", sequence.len());
    Ok(sequence)
}

// ============================================================================
// Lexing
// ============================================================================

fn lex(sql: &str) -> Result<Vec<Lexeme>> {
    let dialect = MySqlDialect {};
    let raw = Tokenizer::new(&dialect, sql).tokenize()?;

    let mut lexemes: Vec<Lexeme> = Vec::with_capacity(raw.len());
    // Whether the previous lexer token touches the current one (no whitespace between).
    let mut glued = false;

    for token in raw {
        let lexeme = match token {
            Token::Whitespace(_) => {
                glued = false;
                continue;
            }
            Token::EOF => continue,
            Token::Word(word) => {
                if word.quote_style.is_none() && glued {
                    // `0020_big_table` may come out of the lexer as a number
                    // followed by a word; rebuild the identifier.
                    if let Some(last) = lexemes.last_mut() {
                        if last.kind == TokenKind::Integer {
                            last.value.push_str(&word.value);
                            last.kind = TokenKind::Name;
                            glued = true;
                            continue;
                        }
                    }
                }
                match word.quote_style {
                    Some(quote) => Lexeme {
                        kind: TokenKind::Name,
                        value: word.value,
                        quote: Some(quote),
                        space_before: true,
                    },
                    None => {
                        let kind = if keywords::is_keyword(&word.value.to_uppercase()) {
                            TokenKind::Keyword
                        } else {
                            TokenKind::Name
                        };
                        Lexeme::new(kind, word.value)
                    }
                }
            }
            Token::Number(number, _) => {
                let kind = if number.bytes().all(|b| b.is_ascii_digit()) {
                    TokenKind::Integer
                } else {
                    TokenKind::Float
                };
                Lexeme::new(kind, number)
            }
            Token::SingleQuotedString(s) => {
                Lexeme::new(TokenKind::Literal, format!("'{}'", s.replace('\'', "''")))
            }
            Token::DoubleQuotedString(s) => Lexeme::new(TokenKind::Literal, format!("\"{s}\"")),
            Token::NationalStringLiteral(s) => Lexeme::new(TokenKind::Literal, format!("N'{s}'")),
            Token::HexStringLiteral(s) => Lexeme::new(TokenKind::Literal, format!("X'{s}'")),
            Token::Placeholder(p) => Lexeme::new(TokenKind::Literal, p),
            Token::LParen => Lexeme::new(TokenKind::Punctuation, "("),
            Token::RParen => Lexeme::new(TokenKind::Punctuation, ")"),
            Token::Comma => Lexeme::new(TokenKind::Punctuation, ","),
            Token::SemiColon => Lexeme::new(TokenKind::Punctuation, ";"),
            Token::Colon => Lexeme::new(TokenKind::Punctuation, ":"),
            Token::Period => Lexeme::new(TokenKind::Dot, "."),
            Token::Mul => Lexeme::new(TokenKind::Wildcard, "*"),
            other => Lexeme::new(TokenKind::Operator, other.to_string()),
        };
        lexemes.push(Lexeme {
            space_before: !glued,
            ..lexeme
        });
        glued = true;
    }

    Ok(lexemes)
}

/// Context-dependent reclassification that needs both neighbours.
fn classify(mut lexemes: Vec<Lexeme>) -> Vec<Lexeme> {
    for i in 0..lexemes.len() {
        let prev_kind = i.checked_sub(1).map(|j| lexemes[j].kind);
        let next = lexemes.get(i + 1);
        let next_is_dot = next.is_some_and(|l| l.kind == TokenKind::Dot);
        let next_is_lparen = next.is_some_and(|l| l.is_punctuation("("));

        match lexemes[i].kind {
            TokenKind::Keyword => {
                let upper = lexemes[i].value.to_uppercase();
                let qualified = prev_kind == Some(TokenKind::Dot) || next_is_dot;
                if qualified || (next_is_lparen && keywords::is_function_like_keyword(&upper)) {
                    lexemes[i].kind = TokenKind::Name;
                }
            }
            TokenKind::Wildcard => {
                let in_select_list = match i.checked_sub(1).map(|j| &lexemes[j]) {
                    None => true,
                    Some(prev) => {
                        matches!(prev.kind, TokenKind::Dot | TokenKind::Keyword)
                            || prev.is_punctuation(",")
                            || prev.is_punctuation("(")
                    }
                };
                if !in_select_list {
                    lexemes[i].kind = TokenKind::Operator;
                }
            }
            _ => {}
        }
    }
    lexemes
}

fn merge_compound_keywords(lexemes: Vec<Lexeme>) -> Vec<Lexeme> {
    let mut merged = Vec::with_capacity(lexemes.len());
    let mut i = 0;

    while i < lexemes.len() {
        let current = &lexemes[i];
        if current.kind == TokenKind::Keyword {
            let upper = current.value.to_uppercase();

            if matches!(upper.as_str(), "ORDER" | "GROUP" | "PARTITION")
                && lexemes.get(i + 1).is_some_and(|l| l.is_keyword("BY"))
            {
                merged.push(join_lexemes(&lexemes[i..=i + 1]));
                i += 2;
                continue;
            }

            if keywords::is_join_prefix(&upper) {
                let mut end = i;
                while end < lexemes.len()
                    && lexemes[end].kind == TokenKind::Keyword
                    && keywords::is_join_prefix(&lexemes[end].value.to_uppercase())
                {
                    end += 1;
                }
                if lexemes.get(end).is_some_and(|l| l.is_keyword("JOIN")) {
                    merged.push(join_lexemes(&lexemes[i..=end]));
                    i = end + 1;
                    continue;
                }
            }
        }
        merged.push(current.clone());
        i += 1;
    }

    merged
}

fn join_lexemes(parts: &[Lexeme]) -> Lexeme {
    let value = parts
        .iter()
        .map(|l| l.value.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    Lexeme {
        space_before: parts.first().is_some_and(|l| l.space_before),
        ..Lexeme::new(TokenKind::Keyword, value)
    }
}

/// `CREATE [TEMPORARY] TABLE ...`
fn is_create_table(lexemes: &[Lexeme]) -> bool {
    let mut words = lexemes.iter().filter(|l| l.kind == TokenKind::Keyword);
    if !words.next().is_some_and(|l| l.is_keyword("CREATE")) {
        return false;
    }
    match words.next() {
        Some(l) if l.is_keyword("TEMPORARY") => words.next().is_some_and(|l| l.is_keyword("TABLE")),
        Some(l) => l.is_keyword("TABLE"),
        None => false,
    }
}

// ============================================================================
// Annotation
// ============================================================================

struct OpenParen {
    index: usize,
    kind: ParenKind,
    saved_keyword: Option<String>,
    saved_keyword_position: Option<usize>,
}

struct Annotator<'c> {
    config: &'c AnalyzerConfig,
    tokens: Vec<SqlToken>,
    stack: Vec<OpenParen>,
    last_keyword: Option<String>,
    last_keyword_position: Option<usize>,
    level: usize,
    /// Parenthesis depths at which a WITH header is still open.
    with_headers: Vec<usize>,
    create_table: bool,
    create_columns_seen: bool,
}

impl<'c> Annotator<'c> {
    fn new(config: &'c AnalyzerConfig, create_table: bool) -> Self {
        Self {
            config,
            tokens: Vec::new(),
            stack: Vec::new(),
            last_keyword: None,
            last_keyword_position: None,
            level: 0,
            with_headers: Vec::new(),
            create_table,
            create_columns_seen: false,
        }
    }

    fn run(mut self, lexemes: Vec<Lexeme>) -> Result<TokenSequence> {
        self.tokens.reserve(lexemes.len());

        for (position, lexeme) in lexemes.into_iter().enumerate() {
            let normalized = match (lexeme.kind, lexeme.quote) {
                (TokenKind::Keyword | TokenKind::Name, None) => normalize_keyword(&lexeme.value),
                _ => lexeme.value.clone(),
            };

            let mut token = SqlToken {
                value: lexeme.value,
                normalized,
                kind: lexeme.kind,
                quote: lexeme.quote,
                space_before: lexeme.space_before,
                paren: None,
                last_keyword: self.last_keyword.clone(),
                last_keyword_position: self.last_keyword_position,
                subquery_level: self.level,
                enclosing_paren: self.stack.last().map(|p| p.index),
                matching_paren: None,
                position,
            };

            if token.kind == TokenKind::Punctuation && token.value == "(" {
                self.open_paren(&mut token)?;
            } else if token.kind == TokenKind::Punctuation && token.value == ")" {
                self.close_paren(&mut token)?;
            } else if token.kind == TokenKind::Keyword {
                self.track_keyword(&token);
            }

            self.tokens.push(token);
        }

        if let Some(open) = self.stack.last() {
            return Err(SqlMetaError::UnclosedParenthesis {
                position: open.index,
            });
        }

        Ok(TokenSequence::new(self.tokens))
    }

    fn track_keyword(&mut self, token: &SqlToken) {
        let normalized = token.normalized.as_str();

        if normalized == "WITH" {
            let starts_block = match self.tokens.last() {
                None => true,
                Some(prev) => prev.kind == TokenKind::Punctuation && prev.value == "(",
            };
            if starts_block {
                self.with_headers.push(self.stack.len());
            }
        } else if keywords::ends_with_block(normalized)
            && self.with_headers.last() == Some(&self.stack.len())
        {
            self.with_headers.pop();
        }

        if !keywords::is_ignored_for_last_keyword(normalized) {
            self.last_keyword = Some(normalized.to_string());
            self.last_keyword_position = Some(token.position);
        }
    }

    fn open_paren(&mut self, token: &mut SqlToken) -> Result<()> {
        let kind = self.classify_paren();

        if kind == ParenKind::Subquery {
            self.level += 1;
            token.subquery_level = self.level;
        }
        if kind == ParenKind::CreateTableColumns {
            self.create_columns_seen = true;
        }

        token.paren = Some(ParenRole {
            kind,
            side: ParenSide::Open,
        });
        self.stack.push(OpenParen {
            index: token.position,
            kind,
            saved_keyword: self.last_keyword.clone(),
            saved_keyword_position: self.last_keyword_position,
        });

        if self.stack.len() > self.config.max_nesting_depth {
            return Err(SqlMetaError::NestingTooDeep {
                depth: self.stack.len(),
                limit: self.config.max_nesting_depth,
            });
        }
        Ok(())
    }

    fn close_paren(&mut self, token: &mut SqlToken) -> Result<()> {
        let open = self
            .stack
            .pop()
            .ok_or(SqlMetaError::UnmatchedParenthesis {
                position: token.position,
            })?;

        token.paren = Some(ParenRole {
            kind: open.kind,
            side: ParenSide::Close,
        });
        token.matching_paren = Some(open.index);
        token.enclosing_paren = self.stack.last().map(|p| p.index);
        self.tokens[open.index].matching_paren = Some(token.position);

        if open.kind == ParenKind::Subquery {
            self.level = self.level.saturating_sub(1);
        }

        // Whatever clause the parenthesis interrupted continues after it.
        self.last_keyword = open.saved_keyword;
        self.last_keyword_position = open.saved_keyword_position;

        while self
            .with_headers
            .last()
            .is_some_and(|&depth| depth > self.stack.len())
        {
            self.with_headers.pop();
        }
        Ok(())
    }

    fn classify_paren(&self) -> ParenKind {
        let Some(prev) = self.tokens.last() else {
            return ParenKind::NestedFunction;
        };
        let prev_is_keyword = prev.kind == TokenKind::Keyword;
        let prev_norm = prev.normalized.as_str();

        if prev_is_keyword && keywords::precedes_subquery(prev_norm) {
            return ParenKind::Subquery;
        }

        if self.with_headers.last() == Some(&self.stack.len()) {
            if prev_is_keyword && prev_norm == "AS" {
                return ParenKind::WithQuery;
            }
            if prev.kind == TokenKind::Name {
                return ParenKind::WithColumns;
            }
        }

        if self.create_table
            && !self.create_columns_seen
            && self.stack.is_empty()
            && prev.kind == TokenKind::Name
            && self.last_keyword.as_deref() != Some("SELECT")
        {
            return ParenKind::CreateTableColumns;
        }

        if prev_is_keyword && keywords::precedes_columns(prev_norm) {
            return ParenKind::ColumnDefinition;
        }

        let prev_is_comma = prev.kind == TokenKind::Punctuation && prev.value == ",";
        if prev_is_comma {
            let enclosing = self.stack.last().map(|p| p.kind);
            if matches!(
                enclosing,
                None | Some(ParenKind::Subquery | ParenKind::ColumnDefinition | ParenKind::WithQuery)
            ) {
                return ParenKind::ColumnDefinition;
            }
        }

        ParenKind::NestedFunction
    }
}
