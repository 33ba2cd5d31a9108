//! Higher-order builtins: `sigma`, `integral`, `derivative`, `limit` and
//! `if`.
//!
//! Each of these receives at least one special (string) parameter holding an
//! unevaluated sub-expression. The pattern is always the same: clone the
//! evaluating session, inject the bound variable at the front of the clone's
//! variable list, and drive the evaluator against the clone with varying
//! values. The clone keeps the bound variable invisible to the caller, and
//! deferred argument texts force cleanly because the clone inherited the
//! temporaries of the enclosing reduction.

use crate::constants::PI;
use crate::context::Session;
use crate::error::{EvalError, Result};
use crate::lexer;
use crate::normalize;
use crate::types::Arg;
use crate::Real;

/// Central-difference step used by `derivative`.
const DERIVATIVE_EPSILON: Real = 1e-7;

/// Newton convergence bound for Gauss–Legendre roots.
const GL_EPSILON: Real = 3e-11;

/// Distance at which a limit probe snaps onto its target.
const LIMIT_EPSILON: Real = 1e-11;

/// Default Gauss–Legendre node count for `integral`.
const DEFAULT_GL_POINTS: Real = 20.0;

fn text_arg<'a>(args: &'a [Arg], index: usize, name: &str) -> Result<&'a str> {
    args.get(index).and_then(Arg::as_text).ok_or_else(|| {
        EvalError::InvalidParameter(format!("{}(): expected an expression argument", name))
    })
}

fn num_arg(args: &[Arg], index: usize, name: &str) -> Result<Real> {
    args.get(index).and_then(Arg::as_number).ok_or_else(|| {
        EvalError::InvalidParameter(format!("{}(): expected a numeric argument", name))
    })
}

fn identifier_check(name: &str, function: &str) -> Result<()> {
    if lexer::is_identifier(name) {
        Ok(())
    } else {
        Err(EvalError::InvalidParameter(format!(
            "{}(): invalid variable name ({})",
            function, name
        )))
    }
}

/// A sub-expression with one bound variable, sampled against a clone of the
/// session that introduced it.
pub(crate) struct BoundExpr {
    session: Session,
    expression: String,
}

impl BoundExpr {
    fn new(parent: &Session, variable: &str, expression: &str) -> Result<Self> {
        let mut session = parent.clone();
        session.add_variable_value_at(variable, 0.0, 0)?;
        Ok(BoundExpr {
            session,
            expression: expression.to_string(),
        })
    }

    fn disable_rounding(&mut self) {
        self.session.set_round_enabled(false);
    }

    /// Evaluates the expression with the bound variable set to `x`.
    fn apply(&mut self, x: Real) -> Result<Real> {
        self.session.variables[0].answers = vec![Arg::Number(x)];
        self.session.parse_in_place(&self.expression)
    }
}

/// `sigma(var, expr, from, to[, step])` — sums `expr` over the inclusive
/// range. A negative step swaps the bounds and walks forward.
pub(crate) fn sigma(session: &mut Session, args: &[Arg]) -> Result<Real> {
    let variable = text_arg(args, 0, "sigma")?.to_string();
    let expression = text_arg(args, 1, "sigma")?.to_string();
    let mut from = num_arg(args, 2, "sigma")?;
    let mut to = num_arg(args, 3, "sigma")?;
    let mut step = if args.len() > 4 {
        num_arg(args, 4, "sigma")?
    } else {
        1.0
    };

    identifier_check(&variable, "sigma")?;
    if step == 0.0 {
        return Err(EvalError::InvalidParameter(
            "sigma(): step can not be 0".to_string(),
        ));
    }

    let mut bound = BoundExpr::new(session, &variable, &expression)?;
    if step < 0.0 {
        std::mem::swap(&mut from, &mut to);
        step = -step;
    }
    let mut out = 0.0;
    let mut i = from;
    while i <= to {
        out += bound.apply(i)?;
        i += step;
    }
    Ok(out)
}

/// `integral(var, expr, lower, upper[, glPoints])` — Gauss–Legendre
/// quadrature with `|glPoints|` nodes (default 20). Rounding is disabled on
/// the sampling clone so the quadrature sees full precision.
pub(crate) fn integral(session: &mut Session, args: &[Arg]) -> Result<Real> {
    let variable = text_arg(args, 0, "integral")?.to_string();
    let expression = text_arg(args, 1, "integral")?.to_string();
    let lower = num_arg(args, 2, "integral")?;
    let upper = num_arg(args, 3, "integral")?;
    let points = if args.len() > 4 {
        num_arg(args, 4, "integral")?
    } else {
        DEFAULT_GL_POINTS
    };

    identifier_check(&variable, "integral")?;

    let mut bound = BoundExpr::new(session, &variable, &expression)?;
    bound.disable_rounding();

    let points = points.abs() as usize;
    let table = session.gauss_table(points);
    let xplus = 0.5 * (upper + lower);
    let xminus = 0.5 * (upper - lower);
    let mut sum = 0.0;
    for i in 0..points {
        let dx = xminus * table.nodes[i];
        sum += table.weights[i] * bound.apply(xplus + dx)?;
    }
    Ok(sum * xminus)
}

/// `derivative(var, expr, x)` — central difference around `x`.
pub(crate) fn derivative(session: &mut Session, args: &[Arg]) -> Result<Real> {
    let variable = text_arg(args, 0, "derivative")?.to_string();
    let expression = text_arg(args, 1, "derivative")?.to_string();
    let x = num_arg(args, 2, "derivative")?;

    identifier_check(&variable, "derivative")?;

    let mut bound = BoundExpr::new(session, &variable, &expression)?;
    bound.disable_rounding();
    let below = bound.apply(x - DERIVATIVE_EPSILON)?;
    let above = bound.apply(x + DERIVATIVE_EPSILON)?;
    Ok((above - below) / (2.0 * DERIVATIVE_EPSILON))
}

/// `limit(name->target, expr)` — probes the one-sided limits and returns
/// their common value, or NaN when they disagree. The binding accepts `=`
/// as well as `->`, and `inf`/`+inf`/`-inf` as targets.
pub(crate) fn limit(session: &mut Session, args: &[Arg]) -> Result<Real> {
    let binding = text_arg(args, 0, "limit")?.replace("->", "=");
    let expression = text_arg(args, 1, "limit")?.to_string();

    let Some(eq) = binding.find('=') else {
        return Err(EvalError::InvalidParameter(format!(
            "limit(): invalid variable ({}), must be something like x->2",
            binding
        )));
    };
    let variable = binding[..eq].to_string();
    let target_src = normalize::strip_whitespace(&binding[eq + 1..]);

    identifier_check(&variable, "limit")?;

    let target = if target_src.eq_ignore_ascii_case("inf") || target_src.eq_ignore_ascii_case("+inf")
    {
        Real::INFINITY
    } else if target_src.eq_ignore_ascii_case("-inf") {
        Real::NEG_INFINITY
    } else {
        let mut probe = session.clone();
        probe.parse_in_place(&target_src)?
    };

    let mut bound = BoundExpr::new(session, &variable, &expression)?;
    let below = limit_from_below(&mut bound, target)?;
    let above = limit_from_above(&mut bound, target)?;
    Ok(if below == above { below } else { Real::NAN })
}

fn limit_from_below(function: &mut BoundExpr, approach: Real) -> Result<Real> {
    let mut d = approach - 10.0;
    while d <= approach {
        let value = function.apply(d)?;
        if value == Real::INFINITY {
            return Ok(Real::INFINITY);
        }
        if value == Real::NEG_INFINITY {
            return Ok(Real::NEG_INFINITY);
        }
        if value.is_nan() {
            // lookback sample on the far side of the pole
            return function.apply(approach + (approach - d) * 10.0);
        }
        if d == approach {
            return Ok(value);
        }
        if approach - d < LIMIT_EPSILON {
            d = approach;
        } else {
            d = approach - (approach - d) / 10.0;
        }
    }
    Ok(Real::NAN)
}

fn limit_from_above(function: &mut BoundExpr, approach: Real) -> Result<Real> {
    let mut d = approach + 10.0;
    while d >= approach {
        let value = function.apply(d)?;
        if value == Real::INFINITY {
            return Ok(Real::INFINITY);
        }
        if value == Real::NEG_INFINITY {
            return Ok(Real::NEG_INFINITY);
        }
        if value.is_nan() {
            return function.apply(approach + (approach - d) * 10.0);
        }
        if d == approach {
            return Ok(value);
        }
        if d - approach < LIMIT_EPSILON {
            d = approach;
        } else {
            d = approach - (approach - d) / 10.0;
        }
    }
    Ok(Real::NAN)
}

/// `if(cond, a, b)` — evaluates the selected branch only.
///
/// The condition is split at its first comparison operator; a bare
/// condition is compared against zero. Both comparison sides evaluate in
/// the calling session, as does the chosen branch.
pub(crate) fn if_branch(session: &mut Session, args: &[Arg]) -> Result<Real> {
    let condition = normalize::strip_whitespace(text_arg(args, 0, "if")?);
    let when_true = text_arg(args, 1, "if")?.to_string();
    let when_false = text_arg(args, 2, "if")?.to_string();

    let (left, op, right) = match lexer::split_comparison(&condition) {
        Some((lhs, op, rhs)) => {
            let lhs = lhs.trim().to_string();
            let rhs = rhs.trim().to_string();
            (
                session.parse_in_place(&lhs)?,
                op,
                session.parse_in_place(&rhs)?,
            )
        }
        None => (session.parse_in_place(&condition)?, "!=", 0.0),
    };

    let holds = match op {
        "==" | "=" => left == right,
        ">=" => left >= right,
        "<=" => left <= right,
        ">" => left > right,
        "<" => left < right,
        _ => left != right,
    };
    session.parse_in_place(if holds { &when_true } else { &when_false })
}

/// Gauss–Legendre nodes and weights for one node count.
pub(crate) struct GaussTable {
    pub nodes: Vec<Real>,
    pub weights: Vec<Real>,
}

impl GaussTable {
    /// Computes the roots of the Legendre polynomial of degree `n`, scaled
    /// to `[-1, 1]`, with their quadrature weights.
    ///
    /// Roots are symmetric, so only half are computed. Each starts from the
    /// Chebyshev guess `cos(π(i - 1/4)/(n + 1/2))` and refines by Newton's
    /// method over the Legendre recurrence until successive iterates agree
    /// within 3e-11.
    pub(crate) fn new(n: usize) -> Self {
        let mut nodes = vec![0.0; n];
        let mut weights = vec![0.0; n];
        let half = (n + 1) / 2;

        for i in 1..=half {
            let mut z = (PI * (i as Real - 0.25) / (n as Real + 0.5)).cos();
            let pp = loop {
                let mut p1: Real = 1.0;
                let mut p2: Real = 0.0;
                for j in 1..=n {
                    let p3 = p2;
                    p2 = p1;
                    let jf = j as Real;
                    p1 = ((2.0 * jf - 1.0) * z * p2 - (jf - 1.0) * p3) / jf;
                }
                // derivative of the degree-n polynomial at z
                let pp = n as Real * (z * p1 - p2) / (z * z - 1.0);
                let z1 = z;
                z = z1 - p1 / pp;
                if (z - z1).abs() <= GL_EPSILON {
                    break pp;
                }
            };
            nodes[i - 1] = -z;
            nodes[n - i] = z;
            weights[i - 1] = 2.0 / ((1.0 - z * z) * pp * pp);
            weights[n - i] = weights[i - 1];
        }

        GaussTable { nodes, weights }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gauss_table_two_points() {
        let table = GaussTable::new(2);
        let expected = 1.0 / 3f64.sqrt();
        assert!((table.nodes[0] + expected).abs() < 1e-10);
        assert!((table.nodes[1] - expected).abs() < 1e-10);
        assert!((table.weights[0] - 1.0).abs() < 1e-10);
        assert!((table.weights[1] - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_gauss_weights_sum_to_two() {
        for n in [1usize, 3, 5, 20] {
            let table = GaussTable::new(n);
            let total: Real = table.weights.iter().sum();
            assert!(
                (total - 2.0).abs() < 1e-9,
                "weights for n={} sum to {}",
                n,
                total
            );
        }
    }

    #[test]
    fn test_gauss_quadrature_integrates_polynomials_exactly() {
        // 5 nodes integrate polynomials up to degree 9 exactly; check x^3
        // over [-1, 1] (0) and x^2 over [-1, 1] (2/3).
        let table = GaussTable::new(5);
        let cubic: Real = (0..5)
            .map(|i| table.weights[i] * table.nodes[i].powi(3))
            .sum();
        let square: Real = (0..5)
            .map(|i| table.weights[i] * table.nodes[i].powi(2))
            .sum();
        assert!(cubic.abs() < 1e-12);
        assert!((square - 2.0 / 3.0).abs() < 1e-12);
    }
}
