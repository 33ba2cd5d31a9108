//! Lexical helpers for the reduction pipeline.
//!
//! The evaluator never builds a token stream; it repeatedly rewrites the
//! source string. What it needs from this module is character classification
//! (operator / special), word-boundary scanning, locating the leftmost
//! innermost parenthesis pair, top-level comma splitting, the comparison
//! split used by `if`, radix conversion and string similarity for
//! "did you mean" hints.

use crate::error::{EvalError, Result};

/// The supported binary operators, highest priority first.
pub const OPERATORS: [char; 6] = ['%', '^', '*', '/', '+', '-'];

/// Priority of each entry of [`OPERATORS`].
pub const OPERATOR_PRIORITY: [u8; 6] = [3, 2, 1, 1, 0, 0];

/// Characters that terminate a variable or function name.
pub const SPECIAL: [char; 13] = [
    '%', '^', '*', '/', '+', '-', ',', '(', ')', '!', '=', '<', '>',
];

/// True if `c` is one of the supported binary operators.
pub fn is_operator(c: char) -> bool {
    OPERATORS.contains(&c)
}

/// Priority of operator `c`, if it is one.
pub fn operator_priority(c: char) -> Option<u8> {
    OPERATORS
        .iter()
        .position(|op| *op == c)
        .map(|i| OPERATOR_PRIORITY[i])
}

/// True if `c` ends the name of a variable or function.
pub fn is_special(c: char) -> bool {
    SPECIAL.contains(&c)
}

/// The last non-whitespace character strictly before byte offset `end`.
pub fn char_before(src: &str, end: usize) -> Option<char> {
    src[..end].trim_end().chars().next_back()
}

/// The first non-whitespace character at or after byte offset `start`.
pub fn char_after(src: &str, start: usize) -> Option<char> {
    src[start..].trim_start().chars().next()
}

/// Byte offset where the trailing word of `src` begins: one past the last
/// special character or space, or zero when there is none.
pub fn word_start(src: &str) -> usize {
    let mut start = 0;
    for (i, c) in src.char_indices() {
        if c == ' ' || is_special(c) {
            start = i + c.len_utf8();
        }
    }
    start
}

/// Byte offset where the leading word of `src` ends: the first special
/// character or space, or the full length when there is none.
pub fn word_end(src: &str) -> usize {
    for (i, c) in src.char_indices() {
        if c == ' ' || is_special(c) {
            return i;
        }
    }
    src.len()
}

/// Locates the leftmost innermost parenthesis pair, returning the byte
/// offsets of `(` and `)`.
pub fn innermost_parens(src: &str) -> Option<(usize, usize)> {
    let mut open = None;
    for (i, c) in src.char_indices() {
        match c {
            '(' => open = Some(i),
            ')' => {
                if let Some(start) = open {
                    return Some((start, i));
                }
            }
            _ => {}
        }
    }
    None
}

/// Splits `inner` on commas that are not nested inside parentheses.
pub fn split_arguments(inner: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut piece_start = 0usize;
    for (i, c) in inner.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&inner[piece_start..i]);
                piece_start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&inner[piece_start..]);
    parts
}

/// The comparison operators recognised by `if`, longest first so that `>=`
/// wins over `>` at the same position.
const COMPARISONS: [&str; 8] = ["!=", "<>", ">=", "<=", "==", ">", "=", "<"];

/// Splits a condition at its first comparison operator.
pub fn split_comparison(cond: &str) -> Option<(&str, &'static str, &str)> {
    for (i, _) in cond.char_indices() {
        for op in COMPARISONS {
            if cond[i..].starts_with(op) {
                return Some((&cond[..i], op, &cond[i + op.len()..]));
            }
        }
    }
    None
}

/// True when `text` is a valid identifier: a letter or underscore followed by
/// letters, digits or underscores.
pub fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// True when `text` is a non-empty run of ASCII digits.
pub fn is_unsigned_integer(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}

/// Checks that parentheses balance and that no empty group appears.
pub fn validate_parentheses(src: &str) -> Result<()> {
    let mut last_open = false;
    for c in src.chars() {
        if c.is_whitespace() {
            continue;
        }
        if last_open && c == ')' {
            return Err(EvalError::UnbalancedParentheses {
                source: None,
                position: None,
            });
        }
        last_open = c == '(';
    }

    let mut opened = 0i64;
    for (column, c) in src.chars().enumerate() {
        if c == '(' {
            opened += 1;
        } else if c == ')' {
            opened -= 1;
            if opened < 0 {
                return Err(EvalError::UnbalancedParentheses {
                    source: Some(src.to_string()),
                    position: Some(column + 1),
                });
            }
        }
    }
    if opened != 0 {
        return Err(EvalError::UnbalancedParentheses {
            source: Some(src.to_string()),
            position: Some(src.chars().count()),
        });
    }
    Ok(())
}

/// Similarity between two strings as `(max_len - edit_distance) / max_len`,
/// in `0.0..=1.0`. Two empty strings are identical.
pub fn similarity(a: &str, b: &str) -> f64 {
    let (longer, shorter) = if a.chars().count() < b.chars().count() {
        (b, a)
    } else {
        (a, b)
    };
    let longer_len = longer.chars().count();
    if longer_len == 0 {
        return 1.0;
    }
    (longer_len - levenshtein_distance(longer, shorter)) as f64 / longer_len as f64
}

/// Levenshtein edit distance over chars, single-row formulation.
fn levenshtein_distance(s: &str, t: &str) -> usize {
    let s: Vec<char> = s.chars().collect();
    let t: Vec<char> = t.chars().collect();
    let (s, t) = if s.len() > t.len() { (t, s) } else { (s, t) };
    let n = s.len();
    let m = t.len();
    if n == 0 {
        return m;
    }

    let mut row: Vec<usize> = (0..=n).collect();
    for j in 1..=m {
        let mut upper_left = row[0];
        row[0] = j;
        for i in 1..=n {
            let upper = row[i];
            let cost = usize::from(s[i - 1] != t[j - 1]);
            row[i] = (row[i - 1] + 1).min(row[i] + 1).min(upper_left + cost);
            upper_left = upper;
        }
    }
    row[n]
}

/// Parses `digits` in the given radix, as the radix-literal folding pass
/// needs it.
pub fn parse_radix(digits: &str, radix: u32) -> Option<i64> {
    i64::from_str_radix(digits, radix).ok()
}
