//! LIMIT / OFFSET extraction

use crate::token::TokenSequence;

/// `(limit, offset)` of the statement; offset defaults to 0.
///
/// Understands `LIMIT n`, `LIMIT n OFFSET m` and MySQL's `LIMIT m, n`.
pub(crate) fn extract_limit_and_offset(tokens: &TokenSequence) -> Option<(u64, u64)> {
    let mut limit: Option<u64> = None;
    let mut offset: Option<u64> = None;

    for token in tokens.cursors().filter(|c| c.is_integer()) {
        let Ok(value) = token.value().parse::<u64>() else {
            continue;
        };
        match token.last_keyword() {
            "LIMIT" if limit.is_none() => limit = Some(value),
            "LIMIT" if token.previous().is_comma() => {
                offset = limit;
                limit = Some(value);
            }
            "OFFSET" => offset = Some(value),
            _ => {}
        }
    }

    limit.map(|limit| (limit, offset.unwrap_or(0)))
}
