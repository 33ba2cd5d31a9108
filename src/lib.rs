//! # calc-rs
//!
//! An interactive evaluator for algebraic expressions written in
//! conventional infix notation.
//!
//! A [`Session`] holds named variables and user-defined functions, then
//! evaluates expressions against them in double precision. The accepted
//! language is deliberately rich: operator precedence with parentheses,
//! implicit multiplication (`2x`, `3(a+b)`, `2f(x)`), postfix factorial
//! (`5!`), degree suffixes (`45°`, `45deg`), binary/octal/hexadecimal
//! literals inside parentheses, scientific notation, a large builtin
//! function roster, and higher-order builtins (`sigma`, `integral`,
//! `derivative`, `limit`, `if`) that bind a fresh variable while they
//! evaluate a sub-expression.
//!
//! ## Quick start
//!
//! ```
//! use calc_rs::Session;
//!
//! let mut session = Session::new();
//! assert_eq!(session.parse("2 + 2").unwrap(), 4.0);
//! assert_eq!(session.parse("5^2 * (2 + 3 * 4) + 5!/4").unwrap(), 380.0);
//! ```
//!
//! ## Variables and functions
//!
//! Declarations go through [`Session::add_expression`]; anything with a
//! `(` left of the `=` is a function, everything else is a variable.
//! Variables resolve lazily, in declaration order, on the next parse.
//!
//! ```
//! use calc_rs::Session;
//!
//! let mut session = Session::new();
//! session.add_expression("f(x, y) = 2(x + y)").unwrap();
//! session.add_expression("x0 = 1 + 2 ^ 2").unwrap();
//! session.add_expression("y0 = 2x0").unwrap();
//! assert_eq!(session.parse("1 + 2f(x0, y0)/3").unwrap(), 21.0);
//! ```
//!
//! Recursive definitions work; each invocation runs against a clone of the
//! session holding only its parameter bindings:
//!
//! ```
//! use calc_rs::Session;
//!
//! let mut session = Session::new();
//! session.add_expression("gcd(x, y) = if(y = 0, x, gcd(y, x % y))").unwrap();
//! assert_eq!(session.parse("gcd(8, 20)").unwrap(), 4.0);
//! ```
//!
//! ## Higher-order builtins
//!
//! ```
//! use calc_rs::Session;
//!
//! let mut session = Session::new();
//! assert_eq!(session.parse("derivative(x, x^3, 2)").unwrap(), 12.0);
//! assert_eq!(session.parse("Σ(i, 2i^2, 1, 5)").unwrap(), 220.0);
//! assert_eq!(session.parse("lim(x->2, x^(x + 2)) / 2").unwrap(), 8.0);
//! ```
//!
//! ## Errors
//!
//! Failures come back as [`EvalError`] values carrying the original source
//! and a column cursor; their `Display` output points at the offending
//! token:
//!
//! ```
//! use calc_rs::{EvalError, Session};
//!
//! let mut session = Session::new();
//! session.add_expression("x0 = 5").unwrap();
//! match session.parse("2 * x2") {
//!     Err(EvalError::UnknownVariable { name, guess, .. }) => {
//!         assert_eq!(name, "x2");
//!         assert_eq!(guess.as_deref(), Some("x0"));
//!     }
//!     other => panic!("expected an unknown-variable error, got {:?}", other),
//! }
//! ```
//!
//! ## Grammar notes
//!
//! Operator priorities, highest first: `%`, then `^`, then `*` `/`, then
//! `+` `-`. Every operator associates to the left, `^` included: `2^3^2`
//! is `(2^3)^2 = 64`. Identifiers are case-insensitive. Final results are
//! rounded half-up at six decimal places by default; see
//! [`Session::set_round_enabled`] and [`Session::set_round_scale`].

pub mod calculus;
pub mod context;
pub mod engine;
pub mod error;
pub mod functions;
pub mod lexer;
pub mod normalize;
pub mod types;

pub use context::{Session, DEFAULT_ROUND_SCALE};
pub use error::{EvalError, Result};
pub use types::{Arg, ExpressionFunction, FunctionBinding, NativeFunction, Variable};

/// The numeric type every evaluation produces.
pub type Real = f64;

/// Shared numeric constants.
pub mod constants {
    use super::Real;

    pub const PI: Real = std::f64::consts::PI;
    pub const E: Real = std::f64::consts::E;

    /// Default epsilon for approximate comparisons in tests.
    pub const TEST_PRECISION: Real = 1e-9;
}

/// Checks that two floating point values agree within an epsilon.
///
/// NaN equals NaN and same-signed infinities are equal, which is what
/// evaluation tests want.
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr $(,)?) => {
        $crate::assert_approx_eq!($left, $right, $crate::constants::TEST_PRECISION)
    };
    ($left:expr, $right:expr, $epsilon:expr $(,)?) => {{
        let left_val: $crate::Real = $left;
        let right_val: $crate::Real = $right;
        let eps: $crate::Real = $epsilon;
        if left_val.is_nan() && right_val.is_nan() {
            // NaN == NaN for our purposes
        } else if left_val.is_infinite()
            && right_val.is_infinite()
            && left_val.signum() == right_val.signum()
        {
            // same-signed infinities are equal
        } else {
            assert!(
                (left_val - right_val).abs() < eps,
                "assertion failed: `(left ≈ right)` (left: `{}`, right: `{}`, epsilon: `{}`)",
                left_val,
                right_val,
                eps
            );
        }
    }};
}
