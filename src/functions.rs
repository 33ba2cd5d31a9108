//! Built-in mathematical functions and the default roster.
//!
//! This module implements every function the evaluator ships with, from the
//! trigonometric family through bitwise operations to the variadic
//! aggregates, and assembles them into the binding list a fresh [`Session`]
//! starts from. Functions handle edge cases the IEEE way: division by zero
//! yields infinities, `0/0` and out-of-domain inputs yield NaN.

use std::borrow::Cow;
use std::rc::Rc;

use crate::calculus;
use crate::context::Session;
use crate::error::{EvalError, Result};
use crate::types::{Arg, FunctionBinding, NativeCall, NativeFunction, ParametricKind};
use crate::Real;

/// Logarithm of `a` in base `b`.
pub fn log_base(a: Real, b: Real) -> Real {
    a.ln() / b.ln()
}

/// The nth root of `a`. Roots up to 2 are square roots, 3 is the cube root
/// (defined for negative inputs), anything else goes through `powf`.
pub fn radical(a: Real, n: Real) -> Real {
    if n <= 2.0 {
        a.sqrt()
    } else if n == 3.0 {
        a.cbrt()
    } else {
        a.powf(1.0 / n)
    }
}

/// Factorial, truncating the input toward zero first. `factorial(0) == 1`.
pub fn factorial(x: Real) -> Real {
    let n = x as i64;
    let mut result: Real = 1.0;
    let mut factor = 2i64;
    while factor <= n {
        result *= factor as Real;
        factor += 1;
    }
    result
}

/// Binomial coefficient through factorials.
pub fn binomial(x: Real, y: Real) -> Real {
    factorial(x) / (factorial(y) * factorial(x - y))
}

/// Greatest common divisor over any number of values.
pub fn gcd(values: &[Real]) -> Real {
    values.iter().fold(0.0, |acc, v| gcd2(*v, acc))
}

fn gcd2(a: Real, b: Real) -> Real {
    let mut x = a.abs();
    let mut y = b.abs();
    while y != 0.0 {
        let z = x % y;
        x = y;
        y = z;
    }
    x
}

pub fn sum(values: &[Real]) -> Real {
    values.iter().sum()
}

pub fn avg(values: &[Real]) -> Real {
    sum(values) / values.len() as Real
}

pub fn max_of(values: &[Real]) -> Real {
    let first = values.first().copied().unwrap_or(0.0);
    values.iter().fold(first, |out, v| out.max(*v))
}

pub fn min_of(values: &[Real]) -> Real {
    let first = values.first().copied().unwrap_or(0.0);
    values.iter().fold(first, |out, v| out.min(*v))
}

/// Sign of `a` as `-1`, `0` or `1`.
pub fn sign(a: Real) -> Real {
    if a > 0.0 {
        1.0
    } else if a < 0.0 {
        -1.0
    } else if a == 0.0 {
        0.0
    } else {
        1.0
    }
}

// Bitwise family. Operands truncate to i64 before operating; shift counts
// take their low six bits, like the hardware does.

pub fn bit_and(a: Real, b: Real) -> Real {
    ((a as i64) & (b as i64)) as Real
}

pub fn bit_or(a: Real, b: Real) -> Real {
    ((a as i64) | (b as i64)) as Real
}

pub fn bit_xor(a: Real, b: Real) -> Real {
    ((a as i64) ^ (b as i64)) as Real
}

pub fn bit_not(a: Real) -> Real {
    !(a as i64) as Real
}

pub fn bit_nor(a: Real, b: Real) -> Real {
    bit_not(bit_or(a, b))
}

pub fn shift_left(a: Real, b: Real) -> Real {
    (a as i64).wrapping_shl(b as i64 as u32) as Real
}

pub fn shift_right(a: Real, b: Real) -> Real {
    (a as i64).wrapping_shr(b as i64 as u32) as Real
}

pub fn unsigned_shift_right(a: Real, b: Real) -> Real {
    (a as i64 as u64).wrapping_shr(b as i64 as u32) as i64 as Real
}

// Reciprocal trigonometry and the inverse/hyperbolic forms the standard
// library does not carry.

pub fn cot(x: Real) -> Real {
    1.0 / x.tan()
}

pub fn sec(x: Real) -> Real {
    1.0 / x.cos()
}

pub fn csc(x: Real) -> Real {
    1.0 / x.sin()
}

pub fn coth(x: Real) -> Real {
    1.0 / x.tanh()
}

pub fn sech(x: Real) -> Real {
    1.0 / x.cosh()
}

pub fn csch(x: Real) -> Real {
    1.0 / x.sinh()
}

pub fn arccosh(x: Real) -> Real {
    (x + (x * x - 1.0).sqrt()).ln()
}

pub fn arcsinh(x: Real) -> Real {
    (x + (x * x + 1.0).sqrt()).ln()
}

pub fn arctanh(x: Real) -> Real {
    0.5 * ((1.0 + x) / (1.0 - x)).ln()
}

pub fn arcsec(x: Real) -> Real {
    (1.0 / x).acos()
}

pub fn arcsech(x: Real) -> Real {
    arccosh(1.0 / x)
}

pub fn arccsc(x: Real) -> Real {
    (1.0 / x).asin()
}

pub fn arccsch(x: Real) -> Real {
    arcsinh(1.0 / x)
}

pub fn arccot(x: Real) -> Real {
    (1.0 / x).atan()
}

pub fn arccoth(x: Real) -> Real {
    arctanh(1.0 / x)
}

fn native(
    name: &'static str,
    arity: usize,
    f: impl Fn(&[Real]) -> Real + 'static,
) -> FunctionBinding {
    FunctionBinding::Native(NativeFunction {
        name: Cow::Borrowed(name),
        arity: Some(arity),
        special: Cow::Borrowed(&[]),
        implementation: NativeCall::Plain(Rc::new(f)),
    })
}

fn variadic(name: &'static str, f: impl Fn(&[Real]) -> Real + 'static) -> FunctionBinding {
    FunctionBinding::Native(NativeFunction {
        name: Cow::Borrowed(name),
        arity: None,
        special: Cow::Borrowed(&[]),
        implementation: NativeCall::Plain(Rc::new(f)),
    })
}

fn session_native(
    name: &'static str,
    arity: usize,
    special: &'static [usize],
    f: impl Fn(&mut Session, &[Arg]) -> Result<Real> + 'static,
) -> FunctionBinding {
    FunctionBinding::Native(NativeFunction {
        name: Cow::Borrowed(name),
        arity: Some(arity),
        special: Cow::Borrowed(special),
        implementation: NativeCall::Session(Rc::new(f)),
    })
}

/// Builds the default binding list a new session starts from.
///
/// Ordering matters: lookup scans in registration order and the parametric
/// names go first so that `log2` resolves before the plain `log` overloads
/// are considered.
pub(crate) fn default_bindings() -> Vec<FunctionBinding> {
    let mut list = vec![
        FunctionBinding::Parametric(ParametricKind::Log),
        FunctionBinding::Parametric(ParametricKind::Radical),
    ];

    // Higher-order builtins. The leading string parameters carry raw
    // sub-expression text into the call.
    list.push(session_native("sigma", 4, &[0, 1], calculus::sigma));
    list.push(session_native("sigma", 5, &[0, 1], calculus::sigma));
    list.push(session_native("Σ", 4, &[0, 1], calculus::sigma));
    list.push(session_native("Σ", 5, &[0, 1], calculus::sigma));
    list.push(session_native("integral", 4, &[0, 1], calculus::integral));
    list.push(session_native("integral", 5, &[0, 1], calculus::integral));
    list.push(session_native("∫", 4, &[0, 1], calculus::integral));
    list.push(session_native("∫", 5, &[0, 1], calculus::integral));
    list.push(session_native("intg", 4, &[0, 1], calculus::integral));
    list.push(session_native("derivative", 3, &[0, 1], calculus::derivative));
    list.push(session_native("limit", 2, &[0, 1], calculus::limit));
    list.push(session_native("lim", 2, &[0, 1], calculus::limit));
    list.push(session_native("if", 3, &[0, 1, 2], calculus::if_branch));

    // Trigonometry and friends.
    list.push(native("sin", 1, |a| a[0].sin()));
    list.push(native("cos", 1, |a| a[0].cos()));
    list.push(native("tan", 1, |a| a[0].tan()));
    list.push(native("asin", 1, |a| a[0].asin()));
    list.push(native("acos", 1, |a| a[0].acos()));
    list.push(native("atan", 1, |a| a[0].atan()));
    list.push(native("atan2", 2, |a| a[0].atan2(a[1])));
    list.push(native("sinh", 1, |a| a[0].sinh()));
    list.push(native("cosh", 1, |a| a[0].cosh()));
    list.push(native("tanh", 1, |a| a[0].tanh()));
    list.push(native("cot", 1, |a| cot(a[0])));
    list.push(native("sec", 1, |a| sec(a[0])));
    list.push(native("csc", 1, |a| csc(a[0])));
    list.push(native("coth", 1, |a| coth(a[0])));
    list.push(native("sech", 1, |a| sech(a[0])));
    list.push(native("csch", 1, |a| csch(a[0])));
    list.push(native("arcsin", 1, |a| a[0].asin()));
    list.push(native("arccos", 1, |a| a[0].acos()));
    list.push(native("arctan", 1, |a| a[0].atan()));
    list.push(native("asinh", 1, |a| arcsinh(a[0])));
    list.push(native("arcsinh", 1, |a| arcsinh(a[0])));
    list.push(native("acosh", 1, |a| arccosh(a[0])));
    list.push(native("arccosh", 1, |a| arccosh(a[0])));
    list.push(native("atanh", 1, |a| arctanh(a[0])));
    list.push(native("arctanh", 1, |a| arctanh(a[0])));
    list.push(native("asec", 1, |a| arcsec(a[0])));
    list.push(native("arcsec", 1, |a| arcsec(a[0])));
    list.push(native("asech", 1, |a| arcsech(a[0])));
    list.push(native("arcsech", 1, |a| arcsech(a[0])));
    list.push(native("acsc", 1, |a| arccsc(a[0])));
    list.push(native("arccsc", 1, |a| arccsc(a[0])));
    list.push(native("acsch", 1, |a| arccsch(a[0])));
    list.push(native("arccsch", 1, |a| arccsch(a[0])));
    list.push(native("acot", 1, |a| arccot(a[0])));
    list.push(native("arccot", 1, |a| arccot(a[0])));
    list.push(native("acoth", 1, |a| arccoth(a[0])));
    list.push(native("arccoth", 1, |a| arccoth(a[0])));

    // Exponentials, logarithms, roots.
    list.push(native("exp", 1, |a| a[0].exp()));
    list.push(native("ln", 1, |a| a[0].ln()));
    // a bare log means log10; the 2-argument form takes an explicit base
    list.push(native("log", 1, |a| a[0].log10()));
    list.push(native("log", 2, |a| log_base(a[0], a[1])));
    list.push(native("sqrt", 1, |a| a[0].sqrt()));
    list.push(native("cbrt", 1, |a| a[0].cbrt()));
    list.push(native("pow", 2, |a| a[0].powf(a[1])));
    list.push(native("hypot", 2, |a| a[0].hypot(a[1])));
    list.push(native("radical", 1, |a| a[0].sqrt()));
    list.push(native("radical", 2, |a| radical(a[0], a[1])));
    list.push(native("√", 1, |a| a[0].sqrt()));

    // Rounding, magnitude, units.
    list.push(native("abs", 1, |a| a[0].abs()));
    list.push(native("ceil", 1, |a| a[0].ceil()));
    list.push(native("floor", 1, |a| a[0].floor()));
    list.push(native("round", 1, |a| a[0].round()));
    list.push(native("sign", 1, |a| sign(a[0])));
    list.push(native("mod", 2, |a| a[0] % a[1]));
    list.push(native("toRadians", 1, |a| a[0].to_radians()));
    list.push(native("toDegrees", 1, |a| a[0].to_degrees()));

    // Combinatorics.
    list.push(native("factorial", 1, |a| factorial(a[0])));
    list.push(native("c", 2, |a| binomial(a[0], a[1])));

    // Bitwise.
    list.push(native("and", 2, |a| bit_and(a[0], a[1])));
    list.push(native("or", 2, |a| bit_or(a[0], a[1])));
    list.push(native("xor", 2, |a| bit_xor(a[0], a[1])));
    list.push(native("nor", 2, |a| bit_nor(a[0], a[1])));
    list.push(native("not", 1, |a| bit_not(a[0])));
    list.push(native("shiftLeft", 2, |a| shift_left(a[0], a[1])));
    list.push(native("shiftRight", 2, |a| shift_right(a[0], a[1])));
    list.push(native("unsignedShiftRight", 2, |a| {
        unsigned_shift_right(a[0], a[1])
    }));

    // Variadic aggregates.
    list.push(variadic("max", |a| max_of(a)));
    list.push(variadic("min", |a| min_of(a)));
    list.push(variadic("sum", |a| sum(a)));
    list.push(variadic("avg", |a| avg(a)));
    list.push(variadic("average", |a| avg(a)));
    list.push(variadic("gcd", |a| gcd(a)));

    list
}

/// Resolves a call to a binding.
///
/// User functions are consulted before builtins. The first binding whose
/// declared arity equals the call arity wins, a variadic binding accepts any
/// arity, and a name that matches with no acceptable arity reports an
/// invalid call.
pub(crate) fn lookup(
    user: &[FunctionBinding],
    builtins: &[FunctionBinding],
    source: &str,
    position: Option<usize>,
    name: &str,
    count: usize,
) -> Result<Option<FunctionBinding>> {
    let mut name_match: Option<&FunctionBinding> = None;
    for binding in user.iter().chain(builtins.iter()) {
        if binding.matches(name) {
            if binding.arity().map_or(true, |arity| arity == count) {
                return Ok(Some(binding.clone()));
            }
            name_match.get_or_insert(binding);
        }
    }
    match name_match {
        Some(binding) => Err(EvalError::InvalidFunctionCall {
            source: Some(source.to_string()),
            position,
            name: binding.display_name().to_string(),
            expected: binding.arity(),
            found: count,
        }),
        None => Ok(None),
    }
}
