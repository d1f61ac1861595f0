//! Shared utility helpers.

/// Uppercase `text` and drop all whitespace, giving the form keyword
/// comparisons use (`left  outer join` -> `LEFTOUTERJOIN`).
#[inline]
pub fn normalize_keyword(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Append `value` unless it is already present, keeping insertion order.
///
/// Returns true when the value was added.
#[inline]
pub fn push_unique(items: &mut Vec<String>, value: impl Into<String>) -> bool {
    let value = value.into();
    if items.contains(&value) {
        return false;
    }
    items.push(value);
    true
}

/// Append every value of `values` not already present in `items`.
pub fn extend_unique<I, S>(items: &mut Vec<String>, values: I)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    for value in values {
        push_unique(items, value);
    }
}

/// Strip one pair of matching surrounding quotes (`'`, `"` or backtick).
#[inline]
pub fn strip_quotes(value: &str) -> &str {
    for quote in ['\'', '"', '`'] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}
