//! Analyzer limits
//!
//! Pathological input (thousands of nested parentheses, deeply nested
//! sub-queries) makes the backward/forward token scans expensive. These
//! limits turn such input into an error instead.

/// Limits applied while tokenizing and analyzing a query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyzerConfig {
    /// Maximum number of significant tokens in one statement
    pub max_tokens: usize,
    /// Maximum number of simultaneously open parentheses
    pub max_nesting_depth: usize,
    /// Maximum depth of sub-query / CTE bodies re-parsed during column resolution
    pub max_recursion_depth: usize,
}

impl AnalyzerConfig {
    pub const DEFAULT_MAX_TOKENS: usize = 100_000;
    pub const DEFAULT_MAX_NESTING_DEPTH: usize = 512;
    pub const DEFAULT_MAX_RECURSION_DEPTH: usize = 16;
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            max_tokens: Self::DEFAULT_MAX_TOKENS,
            max_nesting_depth: Self::DEFAULT_MAX_NESTING_DEPTH,
            max_recursion_depth: Self::DEFAULT_MAX_RECURSION_DEPTH,
        }
    }
}
