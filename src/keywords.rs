//! Keyword taxonomy
//!
//! Every predicate here takes the *normalized* form of a token (uppercase,
//! whitespace removed), so compound keywords merged by the tokenizer appear
//! as `ORDERBY`, `GROUPBY`, `LEFTOUTERJOIN` and so on.

use std::fmt;

/// Words the tokenizer classifies as keywords when they appear unquoted.
///
/// Narrower than a full SQL keyword list: `name`, `type`, `date` and
/// `status` stay names.
pub fn is_keyword(word: &str) -> bool {
    matches!(
        word,
        "SELECT"
            | "FROM"
            | "WHERE"
            | "JOIN"
            | "ON"
            | "USING"
            | "AS"
            | "AND"
            | "OR"
            | "NOT"
            | "IN"
            | "IS"
            | "NULL"
            | "LIKE"
            | "ILIKE"
            | "BETWEEN"
            | "EXISTS"
            | "CASE"
            | "WHEN"
            | "THEN"
            | "ELSE"
            | "END"
            | "DISTINCT"
            | "UNIQUE"
            | "ALL"
            | "ANY"
            | "SOME"
            | "UNION"
            | "INTERSECT"
            | "EXCEPT"
            | "ORDER"
            | "GROUP"
            | "PARTITION"
            | "BY"
            | "HAVING"
            | "LIMIT"
            | "OFFSET"
            | "INSERT"
            | "INTO"
            | "VALUES"
            | "UPDATE"
            | "SET"
            | "DELETE"
            | "REPLACE"
            | "IGNORE"
            | "OVERWRITE"
            | "TABLE"
            | "CREATE"
            | "ALTER"
            | "DROP"
            | "TRUNCATE"
            | "ADD"
            | "KEY"
            | "INDEX"
            | "PRIMARY"
            | "FOREIGN"
            | "REFERENCES"
            | "CONSTRAINT"
            | "DEFAULT"
            | "WITH"
            | "RECURSIVE"
            | "OVER"
            | "WINDOW"
            | "ASC"
            | "DESC"
            | "FORCE"
            | "USE"
            | "RETURNING"
            | "INTERVAL"
            | "IF"
            | "TEMPORARY"
            | "VIEW"
            | "DATABASE"
            | "SCHEMA"
            | "FOR"
            | "TOP"
            | "TRUE"
            | "FALSE"
            | "DIV"
            | "MOD"
            | "XOR"
            | "REGEXP"
            | "RLIKE"
            | "COLLATE"
            | "ESCAPE"
            | "CHARACTER"
            | "NATURAL"
            | "INNER"
            | "CROSS"
            | "LEFT"
            | "RIGHT"
            | "FULL"
            | "OUTER"
    )
}

/// Keywords that do not update the "last significant keyword" state.
pub fn is_ignored_for_last_keyword(normalized: &str) -> bool {
    matches!(
        normalized,
        "AS" | "AND"
            | "OR"
            | "IN"
            | "IS"
            | "NULL"
            | "NOT"
            | "LIKE"
            | "ILIKE"
            | "BETWEEN"
            | "EXISTS"
            | "CASE"
            | "WHEN"
            | "THEN"
            | "ELSE"
            | "END"
            | "DISTINCT"
            | "UNIQUE"
            | "ALL"
            | "ANY"
            | "SOME"
            | "ASC"
            | "DESC"
            | "DIV"
            | "MOD"
            | "XOR"
            | "REGEXP"
            | "RLIKE"
            | "COLLATE"
            | "ESCAPE"
            | "INTERVAL"
            | "TRUE"
            | "FALSE"
            | "RECURSIVE"
            | "IGNORE"
            | "TOP"
            | "IF"
            | "OVER"
            | "PARTITIONBY"
    )
}

/// Words that start a multi-word JOIN keyword.
pub fn is_join_prefix(normalized: &str) -> bool {
    matches!(
        normalized,
        "NATURAL" | "INNER" | "CROSS" | "LEFT" | "RIGHT" | "FULL" | "OUTER"
    )
}

/// Any JOIN variant after compound-keyword merging.
#[inline]
pub fn is_join(normalized: &str) -> bool {
    normalized.ends_with("JOIN")
}

/// Keywords after which names are column references.
pub fn precedes_columns(normalized: &str) -> bool {
    matches!(
        normalized,
        "SELECT" | "WHERE" | "ORDERBY" | "GROUPBY" | "ON" | "SET" | "HAVING" | "USING"
    )
}

/// Keywords after which names are table references.
pub fn precedes_tables(normalized: &str) -> bool {
    matches!(normalized, "FROM" | "INTO" | "UPDATE" | "TABLE") || is_join(normalized)
}

/// Keywords whose following parenthesis opens a sub-query in table position.
pub fn precedes_subquery(normalized: &str) -> bool {
    normalized == "FROM" || is_join(normalized)
}

/// Keywords that close a WITH block and start the main statement.
pub fn ends_with_block(normalized: &str) -> bool {
    matches!(
        normalized,
        "SELECT" | "UPDATE" | "DELETE" | "REPLACE" | "INSERT"
    )
}

/// Keywords that double as function names when directly followed by `(`.
pub fn is_function_like_keyword(normalized: &str) -> bool {
    matches!(
        normalized,
        "REPLACE" | "LEFT" | "RIGHT" | "IF" | "INSERT" | "MOD"
    )
}

/// Function names that are never reported as columns.
pub fn is_ignored_function(normalized: &str) -> bool {
    matches!(
        normalized,
        "COUNT"
            | "MIN"
            | "MAX"
            | "SUM"
            | "AVG"
            | "CAST"
            | "CONVERT"
            | "TRY_CAST"
            | "COALESCE"
            | "IFNULL"
            | "NULLIF"
            | "CONCAT"
            | "FROM_UNIXTIME"
            | "UNIX_TIMESTAMP"
            | "DATE_FORMAT"
            | "DATE_ADD"
            | "DATE_SUB"
            | "DATEDIFF"
            | "EXTRACT"
            | "NOW"
            | "CURRENT_DATE"
            | "CURRENT_TIMESTAMP"
    )
}

/// Functions whose `AS` introduces a type rather than an alias.
pub fn is_type_cast_function(normalized: &str) -> bool {
    matches!(normalized, "CAST" | "CONVERT" | "TRY_CAST" | "SAFE_CAST")
}

/// Leading words of CREATE TABLE column-list items that declare constraints.
pub fn is_table_constraint(normalized: &str) -> bool {
    matches!(
        normalized,
        "PRIMARY"
            | "KEY"
            | "INDEX"
            | "UNIQUE"
            | "CONSTRAINT"
            | "FOREIGN"
            | "CHECK"
            | "FULLTEXT"
            | "SPATIAL"
    )
}

/// Clause a column or alias reference was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Section {
    Select,
    Where,
    OrderBy,
    GroupBy,
    Join,
    Insert,
    Update,
    Having,
}

impl Section {
    /// Map a last-keyword value to the section it opens.
    pub fn from_keyword(normalized: &str) -> Option<Self> {
        match normalized {
            "SELECT" => Some(Self::Select),
            "WHERE" => Some(Self::Where),
            "ORDERBY" => Some(Self::OrderBy),
            "GROUPBY" => Some(Self::GroupBy),
            "ON" | "USING" => Some(Self::Join),
            "INTO" => Some(Self::Insert),
            "SET" => Some(Self::Update),
            "HAVING" => Some(Self::Having),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Where => "where",
            Self::OrderBy => "order_by",
            Self::GroupBy => "group_by",
            Self::Join => "join",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Having => "having",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
