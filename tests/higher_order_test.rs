//! The higher-order builtins: sigma, integral, derivative, limit and if.
//! These all clone the session, bind a fresh variable, and drive the
//! evaluator — including through deferred sub-expressions that only become
//! evaluable once the bound variable exists.

use calc_rs::{assert_approx_eq, EvalError, Session};

#[test]
fn test_sigma_basics() {
    let mut session = Session::new();
    assert_eq!(session.parse("sigma(i, i, 1, 100)").unwrap(), 5050.0);
    assert_eq!(session.parse("Σ(i, 2i^2, 1, 5)").unwrap(), 220.0);
    assert_eq!(session.parse("sigma(i, i, 0, 10, 2)").unwrap(), 30.0);
}

#[test]
fn test_sigma_negative_step_swaps_bounds() {
    let mut session = Session::new();
    assert_eq!(session.parse("sigma(i, i, 10, 0, -2)").unwrap(), 30.0);
}

#[test]
fn test_sigma_rejects_bad_parameters() {
    let mut session = Session::new();
    assert!(matches!(
        session.parse("sigma(i, i, 1, 5, 0)"),
        Err(EvalError::InvalidParameter(_))
    ));
    assert!(matches!(
        session.parse("sigma(2i, i, 1, 5)"),
        Err(EvalError::InvalidParameter(_))
    ));
}

#[test]
fn test_sigma_over_deferred_function_call() {
    let mut session = Session::new();
    session.add_expression("f(x) = x * 10").unwrap();
    // f(i) reduces before sigma binds i, so the argument defers
    assert_eq!(session.parse("sigma(i, f(i), 1, 4)").unwrap(), 100.0);
}

#[test]
fn test_nested_sigma() {
    let mut session = Session::new();
    // inner upper bound refers to the outer bound variable
    assert_eq!(session.parse("Σ(i, Σ(j, j, 1, i), 1, 3)").unwrap(), 10.0);
}

#[test]
fn test_integral_polynomials() {
    let mut session = Session::new();
    assert_eq!(session.parse("integral(x, x^2, 0, 3)").unwrap(), 9.0);
    assert_eq!(session.parse("intg(x, 2x, 0, 4)").unwrap(), 16.0);
    // explicit node count
    assert_eq!(session.parse("integral(x, x^2, 0, 3, 5)").unwrap(), 9.0);
}

#[test]
fn test_integral_with_nested_groups() {
    let mut session = Session::new();
    assert_approx_eq!(
        session.parse("2 ∫(x, (x^3)/(x+1), 5, 10)").unwrap(),
        517.121062,
        1e-5
    );
}

#[test]
fn test_integral_of_trig() {
    let mut session = Session::new();
    // ∫ sin over [0, pi] = 2
    assert_approx_eq!(session.parse("∫(x, sin(x), 0, pi)").unwrap(), 2.0, 1e-6);
}

#[test]
fn test_derivative() {
    let mut session = Session::new();
    assert_eq!(session.parse("derivative(x, x^3, 2)").unwrap(), 12.0);
    assert_eq!(session.parse("derivative(x, sin(x), 0)").unwrap(), 1.0);
    assert_approx_eq!(
        session.parse("derivative(x, x^2 + 3x, 1)").unwrap(),
        5.0,
        1e-5
    );
}

#[test]
fn test_limit_finite() {
    let mut session = Session::new();
    assert_eq!(session.parse("lim(x->2, x^(x + 2)) / 2").unwrap(), 8.0);
    assert_eq!(session.parse("limit(x->3, x^2)").unwrap(), 9.0);
    // `=` works as the binding separator too
    assert_eq!(session.parse("limit(x = 3, x^2)").unwrap(), 9.0);
}

#[test]
fn test_limit_at_infinity() {
    let mut session = Session::new();
    assert_eq!(session.parse("lim(x->inf, 1/x)").unwrap(), 0.0);
    assert_eq!(session.parse("lim(x->+inf, 1/x)").unwrap(), 0.0);
}

#[test]
fn test_limit_disagreeing_sides_is_nan() {
    let mut session = Session::new();
    let result = session.parse("lim(x->0, abs(x)/x)").unwrap();
    assert!(result.is_nan());
}

#[test]
fn test_limit_rejects_malformed_binding() {
    let mut session = Session::new();
    assert!(matches!(
        session.parse("lim(x, x^2)"),
        Err(EvalError::InvalidParameter(_))
    ));
}

#[test]
fn test_if_comparisons() {
    let mut session = Session::new();
    assert_eq!(session.parse("if(2 > 1, 10, 20)").unwrap(), 10.0);
    assert_eq!(session.parse("if(1 = 2, 10, 20)").unwrap(), 20.0);
    assert_eq!(session.parse("if(2 >= 2, 1, 0)").unwrap(), 1.0);
    assert_eq!(session.parse("if(2 <= 1, 1, 0)").unwrap(), 0.0);
    assert_eq!(session.parse("if(1 < 2, 1, 0)").unwrap(), 1.0);
    assert_eq!(session.parse("if(1 <> 1, 1, 0)").unwrap(), 0.0);
}

#[test]
fn test_if_bare_condition_compares_to_zero() {
    let mut session = Session::new();
    assert_eq!(session.parse("if(3, 1, 2)").unwrap(), 1.0);
    assert_eq!(session.parse("if(0, 1, 2)").unwrap(), 2.0);
}

#[test]
fn test_if_evaluates_only_the_selected_branch() {
    let mut session = Session::new();
    // the false branch names an unknown variable but is never parsed
    assert_eq!(session.parse("if(1 = 1, 5, nosuchvariable)").unwrap(), 5.0);
}

#[test]
fn test_if_branches_may_use_session_state() {
    let mut session = Session::new();
    session.add_variable_value("x", 4.0).unwrap();
    assert_eq!(session.parse("if(x >= 4, 2x, x/2)").unwrap(), 8.0);
}

#[test]
fn test_recursive_fibonacci() {
    let mut session = Session::new();
    session
        .add_expression("fib(n) = if(n <= 1, n, fib(n-1) + fib(n-2))")
        .unwrap();
    assert_eq!(session.parse("fib(10)").unwrap(), 55.0);
}

#[test]
fn test_higher_order_composition() {
    let mut session = Session::new();
    // derivative of x^2 sampled by sigma at x = 1..3: 2 + 4 + 6
    assert_approx_eq!(
        session
            .parse("sigma(k, derivative(x, x^2, k), 1, 3)")
            .unwrap(),
        12.0,
        1e-4
    );
}
