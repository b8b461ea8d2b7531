//! Search term escaping helpers.
//!
//! - Search terms may be split into sub-terms on a configured delimiter. A
//!   delimiter preceded by `\` is kept literally (`\,` with delimiter `,`).
//! - User input is embedded in `LIKE` patterns with `%`, `_` and the escape
//!   character itself escaped, so terms always match as plain substrings.
//!   SQL Server additionally treats `[` as the start of a character class.

use crate::query_builder::{Dialect, LIKE_ESCAPE};

/// Split `input` on `delimiter`, honouring `\`-escaped delimiters.
///
/// Sub-terms are trimmed and empty sub-terms dropped. An empty delimiter
/// never splits.
pub(crate) fn split_unescaped(input: &str, delimiter: &str) -> Vec<String> {
    if delimiter.is_empty() {
        return non_empty(vec![input.to_string()]);
    }

    let escaped_delimiter = format!("\\{}", delimiter);
    let mut out = Vec::new();
    let mut current = String::new();
    let mut rest = input;
    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix(escaped_delimiter.as_str()) {
            current.push_str(delimiter);
            rest = after;
        } else if let Some(after) = rest.strip_prefix(delimiter) {
            out.push(std::mem::take(&mut current));
            rest = after;
        } else {
            let mut chars = rest.chars();
            if let Some(c) = chars.next() {
                current.push(c);
            }
            rest = chars.as_str();
        }
    }
    out.push(current);
    non_empty(out)
}

fn non_empty(terms: Vec<String>) -> Vec<String> {
    terms
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Escape SQL LIKE meta-characters of `dialect` so user input is treated
/// literally.
pub(crate) fn escape_like_pattern(s: &str, dialect: Dialect) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        let meta = match c {
            '%' | '_' => true,
            '[' => dialect == Dialect::SqlServer,
            c => c == LIKE_ESCAPE,
        };
        if meta {
            out.push(LIKE_ESCAPE);
        }
        out.push(c);
    }
    out
}

/// `%term%` containment pattern for `term`.
pub(crate) fn contains_pattern(term: &str, dialect: Dialect) -> String {
    format!("%{}%", escape_like_pattern(term, dialect))
}
