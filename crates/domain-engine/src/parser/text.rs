//! Quoting and `like` pattern helpers.
//!
//! In a `like` pattern `%` matches any run of characters and `_` any single
//! character. A backslash escapes exactly the character after it, so `\%`
//! and `\_` are literals and `\\` is a literal backslash.

use super::grouping::{AND_TOKEN, OR_TOKEN};
use super::tokenizer::is_punctuation;

/// Byte offsets of the unescaped `%` and `_` wildcards of a pattern.
fn wildcards(pattern: &str) -> Vec<usize> {
    let mut offsets = Vec::new();
    let mut escaped = false;
    for (offset, c) in pattern.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '%' || c == '_' {
            offsets.push(offset);
        }
    }
    offsets
}

/// Returns true if the pattern contains an unescaped wildcard.
pub fn is_like(pattern: &str) -> bool {
    !wildcards(pattern).is_empty()
}

/// Returns the inner text of a `%text%` pattern whose text has no wildcard.
///
/// `%` alone is the full-text pattern of the empty string.
pub fn strip_full_text(pattern: &str) -> Option<&str> {
    let offsets = wildcards(pattern);
    if pattern == "%" {
        return Some("");
    }
    match offsets.as_slice() {
        [0, last] if *last == pattern.len() - 1 && pattern.ends_with('%') && pattern.starts_with('%') => {
            Some(&pattern[1..pattern.len() - 1])
        }
        _ => None,
    }
}

/// Returns true for a `%text%` pattern without inner wildcards.
pub fn is_full_text(pattern: &str) -> bool {
    strip_full_text(pattern).is_some()
}

/// Wraps a value in `%` unless it already contains a wildcard.
///
/// ```
/// use domain_engine_rs::parser::likify;
///
/// assert_eq!(likify("foo"), "%foo%");
/// assert_eq!(likify("foo%"), "foo%");
/// assert_eq!(likify(r"50\%"), r"%50\%%");
/// assert_eq!(likify(""), "%");
/// ```
pub fn likify(value: &str) -> String {
    if value.is_empty() {
        "%".to_string()
    } else if is_like(value) {
        value.to_string()
    } else {
        format!("%{}%", value)
    }
}

/// Removes the escape from `\%` and `\_`.
pub fn unescape(pattern: &str) -> String {
    let mut result = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some(next @ ('%' | '_')) => result.push(next),
            Some(next) => {
                result.push(c);
                result.push(next);
            }
            None => result.push(c),
        }
    }
    result
}

/// Quotes a value when the tokenizer would otherwise split or reinterpret it.
///
/// The empty string is always quoted so that it survives as a token.
pub fn quote(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value == OR_TOKEN
        || value == AND_TOKEN
        || value
            .chars()
            .any(|c| c.is_whitespace() || c == '\\' || is_punctuation(c));
    if !needs_quotes {
        return value.to_string();
    }
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}
