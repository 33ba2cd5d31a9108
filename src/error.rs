//! Error types and handling for the calc-rs crate.
//!
//! This module defines the error taxonomy used throughout the crate for
//! expression parsing and evaluation. Every variant that originates from a
//! concrete spot in the input carries the original source string and a
//! 1-based column cursor, and `Display` renders the human diagnostic:
//!
//! ```text
//! x2 not found, did you mean x0?
//!     1 + x2 * 3
//!         ^
//! ```

use std::fmt;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, EvalError>;

/// Error type for expression parsing and evaluation.
///
/// Each variant represents one failure class of the evaluator. Variants carry
/// the original (user-entered) source where one is available, together with a
/// 1-based column pointing at the offending token.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// Parentheses in the input do not balance, or an empty group `()` was
    /// found. The position is the column of the offending `)`, or the end of
    /// the input for an unclosed `(`.
    UnbalancedParentheses {
        source: Option<String>,
        position: Option<usize>,
    },

    /// A parenthesised argument list is preceded by an identifier that no
    /// registered function answers to, or a comma-separated argument list has
    /// no function context at all (`call` holds the orphaned list text).
    UnknownFunction {
        source: String,
        position: Option<usize>,
        name: Option<String>,
        call: Option<String>,
    },

    /// A function exists under the called name but no overload accepts the
    /// call arity. `expected` is `None` for variadic registrations.
    InvalidFunctionCall {
        source: Option<String>,
        position: Option<usize>,
        name: String,
        expected: Option<usize>,
        found: usize,
    },

    /// The linear evaluator met an identifier that resolves to nothing, even
    /// after identifier splitting. When a resolved user variable is lexically
    /// close, `guess` carries a "did you mean" suggestion.
    UnknownVariable {
        source: String,
        position: usize,
        name: String,
        guess: Option<String>,
    },

    /// A higher-order builtin was invoked with an ill-formed special
    /// parameter: a bound-variable name that is not an identifier, a zero
    /// step, a malformed limit target, and so on.
    InvalidParameter(String),

    /// User-defined function recursion exceeded the session's depth limit.
    RecursionLimit(String),

    /// Any other failure, wrapped with the source it occurred in.
    Parse { source: String, message: String },
}

impl EvalError {
    /// The original source text the error points into, if any.
    pub fn source_text(&self) -> Option<&str> {
        match self {
            EvalError::UnbalancedParentheses { source, .. } => source.as_deref(),
            EvalError::UnknownFunction { source, .. } => Some(source),
            EvalError::InvalidFunctionCall { source, .. } => source.as_deref(),
            EvalError::UnknownVariable { source, .. } => Some(source),
            EvalError::Parse { source, .. } => Some(source),
            EvalError::InvalidParameter(_) | EvalError::RecursionLimit(_) => None,
        }
    }

    /// The 1-based column the error points at, if known.
    pub fn position(&self) -> Option<usize> {
        match self {
            EvalError::UnbalancedParentheses { position, .. } => *position,
            EvalError::UnknownFunction { position, .. } => *position,
            EvalError::InvalidFunctionCall { position, .. } => *position,
            EvalError::UnknownVariable { position, .. } => Some(*position),
            _ => None,
        }
    }

    fn message(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::UnbalancedParentheses { position, .. } => match position {
                Some(p) => write!(f, "unexpected parentheses at {}", p),
                None => write!(f, "unexpected parentheses"),
            },
            EvalError::UnknownFunction { name, call, .. } => match (name, call) {
                (Some(name), _) => write!(f, "{}() not found", name),
                (None, Some(call)) => write!(f, "couldn't find function: {}", call),
                (None, None) => write!(f, "couldn't find function"),
            },
            EvalError::InvalidFunctionCall {
                name,
                expected,
                found,
                ..
            } => match expected {
                Some(expected) => write!(
                    f,
                    "{}() expected {} arguments but found {}",
                    name, expected, found
                ),
                None => write!(f, "{}() can not take {} arguments", name, found),
            },
            EvalError::UnknownVariable { name, guess, .. } => match guess {
                Some(guess) => write!(f, "{} not found, did you mean {}?", name, guess),
                None => write!(f, "{} not found!", name),
            },
            EvalError::InvalidParameter(message) => write!(f, "{}", message),
            EvalError::RecursionLimit(name) => {
                write!(f, "recursion limit exceeded while evaluating {}()", name)
            }
            EvalError::Parse { message, .. } => write!(f, "{}", message),
        }
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.message(f)?;
        if let (Some(source), Some(position)) = (self.source_text(), self.position()) {
            if !source.is_empty() && position > 0 {
                write!(f, "\n\t{}\n\t", source)?;
                for _ in 0..position - 1 {
                    write!(f, " ")?;
                }
                write!(f, "^")?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for EvalError {}
