//! End-to-end tests for the calc-rs library.
//! These walk the session surface at increasing levels of complexity, from
//! plain arithmetic up through declarations and the calculus builtins.

use calc_rs::{assert_approx_eq, Session};

/// Level 1: plain arithmetic with precedence and grouping.
#[test]
fn test_basic_arithmetic() {
    let mut session = Session::new();
    assert_eq!(session.parse("2 + 2").unwrap(), 4.0);
    assert_eq!(session.parse("2 + 3 * 4").unwrap(), 14.0);
    assert_eq!(session.parse("(2 + 3) * 4").unwrap(), 20.0);
    assert_eq!(session.parse("7 % 4 + 1").unwrap(), 4.0);
    assert_eq!(session.parse("5^2 * (2 + 3 * 4) + 5!/4").unwrap(), 380.0);
}

/// Level 2: declarations, implicit multiplication and user functions.
#[test]
fn test_declarations() {
    let mut session = Session::new();
    session.add_expression("f(x, y) = 2(x + y)").unwrap();
    session.add_expression("x0 = 1 + 2 ^ 2").unwrap();
    session.add_expression("y0 = 2x0").unwrap();
    assert_eq!(session.parse("1 + 2f(x0, y0)/3").unwrap(), 21.0);

    // declared values stay cached across parses
    assert_eq!(session.parse("x0 + y0").unwrap(), 15.0);
}

/// Level 3: trigonometry with degree suffixes and constants.
#[test]
fn test_trigonometry_and_degrees() {
    let mut session = Session::new();
    assert_approx_eq!(session.parse("sin(3pi/2) + tan(45°)").unwrap(), 0.0, 1e-6);
    assert_approx_eq!(
        session.parse("cos(45°) ^ (2 * sin(pi/2))").unwrap(),
        0.5,
        1e-6
    );
    assert_approx_eq!(session.parse("sin(90deg)").unwrap(), 1.0, 1e-6);
    assert_approx_eq!(session.parse("e^2").unwrap(), 7.389056, 1e-6);
}

/// Level 4: the numeric calculus builtins.
#[test]
fn test_calculus_builtins() {
    let mut session = Session::new();
    assert_approx_eq!(
        session.parse("2 ∫(x, (x^3)/(x+1), 5, 10)").unwrap(),
        517.121062,
        1e-5
    );
    assert_eq!(session.parse("derivative(x, x^3, 2)").unwrap(), 12.0);
    assert_eq!(session.parse("lim(x->2, x^(x + 2)) / 2").unwrap(), 8.0);
    assert_eq!(session.parse("Σ(i, 2i^2, 1, 5)").unwrap(), 220.0);
}

/// Level 5: factorial and multi-radix literals.
#[test]
fn test_factorial_and_radix_literals() {
    let mut session = Session::new();
    assert_eq!(session.parse("5!/4").unwrap(), 30.0);
    assert_eq!(session.parse("(0b100)!").unwrap(), 24.0);
    assert_eq!(session.parse("log2((0xFF) + 1)").unwrap(), 8.0);
    assert_eq!(session.parse("(0o777)").unwrap(), 511.0);
    assert_eq!(session.parse("0!").unwrap(), 1.0);
    // non-integers truncate toward zero before the factorial
    assert_eq!(session.parse("3.7!").unwrap(), 6.0);
}

/// Level 6: conditionals and recursive user functions.
#[test]
fn test_conditionals_and_recursion() {
    let mut session = Session::new();
    assert_eq!(session.parse("2 + if(2^5 >= 5!, 1, 0)").unwrap(), 2.0);

    session
        .add_expression("gcd(x, y) = if(y = 0, x, gcd(y, x % y))")
        .unwrap();
    assert_eq!(session.parse("gcd(8, 20)").unwrap(), 4.0);

    // the builtin variadic overload still answers other arities
    assert_eq!(session.parse("gcd(8, 20, 100, 150)").unwrap(), 2.0);
}

/// Level 7: variadic aggregates.
#[test]
fn test_variadic_aggregates() {
    let mut session = Session::new();
    assert_eq!(session.parse("sum(10, 20, 30, 40)").unwrap(), 100.0);
    assert_eq!(session.parse("max(3, 9, 4)").unwrap(), 9.0);
    assert_eq!(session.parse("min(3, 9, 4)").unwrap(), 3.0);
    assert_eq!(session.parse("avg(1, 2, 3, 4)").unwrap(), 2.5);
    assert_eq!(session.parse("average(1, 2, 3, 4)").unwrap(), 2.5);
}

/// Scientific notation folds inside parentheses and parses as a literal
/// when the token stands alone.
#[test]
fn test_scientific_notation() {
    let mut session = Session::new();
    assert_eq!(session.parse("(2e+2)").unwrap(), 200.0);
    assert_eq!(session.parse("(1.5e3) + 1").unwrap(), 1501.0);
    assert_eq!(session.parse("1e3").unwrap(), 1000.0);
}

/// The parametric names: an integer baked into the function name.
#[test]
fn test_parametric_function_names() {
    let mut session = Session::new();
    assert_eq!(session.parse("log2(1024)").unwrap(), 10.0);
    assert_eq!(session.parse("log10(1000)").unwrap(), 3.0);
    assert_eq!(session.parse("radical3(27)").unwrap(), 3.0);
    assert_eq!(session.parse("√4(16)").unwrap(), 2.0);
    assert_eq!(session.parse("√(25)").unwrap(), 5.0);
}

/// Bitwise builtins operate on truncated integers.
#[test]
fn test_bitwise_builtins() {
    let mut session = Session::new();
    assert_eq!(session.parse("and(12, 10)").unwrap(), 8.0);
    assert_eq!(session.parse("or(12, 10)").unwrap(), 14.0);
    assert_eq!(session.parse("xor(12, 10)").unwrap(), 6.0);
    assert_eq!(session.parse("shiftLeft(1, 10)").unwrap(), 1024.0);
    assert_eq!(session.parse("shiftRight(1024, 3)").unwrap(), 128.0);
    assert_eq!(session.parse("not(0)").unwrap(), -1.0);
}

/// Builtin names are case-insensitive.
#[test]
fn test_case_insensitive_names() {
    let mut session = Session::new();
    assert_eq!(session.parse("SIN(0) + COS(0)").unwrap(), 1.0);
    session.add_variable_value("Speed", 30.0).unwrap();
    assert_eq!(session.parse("SPEED * 2").unwrap(), 60.0);
}
