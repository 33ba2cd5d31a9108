//! The error taxonomy: every failure class, its source cursor, and the
//! diagnostic rendering.

use calc_rs::{EvalError, Session};

#[test]
fn test_unbalanced_open_parenthesis() {
    let mut session = Session::new();
    match session.parse("(1 + 2") {
        Err(EvalError::UnbalancedParentheses { position, .. }) => {
            assert_eq!(position, Some(6));
        }
        other => panic!("expected unbalanced parentheses, got {:?}", other),
    }
}

#[test]
fn test_unbalanced_close_parenthesis() {
    let mut session = Session::new();
    match session.parse("1 + 2) * 3") {
        Err(EvalError::UnbalancedParentheses { position, .. }) => {
            assert_eq!(position, Some(6));
        }
        other => panic!("expected unbalanced parentheses, got {:?}", other),
    }
}

#[test]
fn test_empty_parentheses() {
    let mut session = Session::new();
    assert!(matches!(
        session.parse("()"),
        Err(EvalError::UnbalancedParentheses { .. })
    ));
    assert!(matches!(
        session.parse("sin( )"),
        Err(EvalError::UnbalancedParentheses { .. })
    ));
}

#[test]
fn test_unknown_function_with_multiple_arguments() {
    let mut session = Session::new();
    match session.parse("nosuch(1, 2)") {
        Err(EvalError::UnknownFunction { name, .. }) => {
            assert_eq!(name.as_deref(), Some("nosuch"));
        }
        other => panic!("expected unknown function, got {:?}", other),
    }
}

#[test]
fn test_argument_list_without_function() {
    let mut session = Session::new();
    match session.parse("3 * (1, 2)") {
        Err(EvalError::UnknownFunction { name, call, .. }) => {
            assert_eq!(name, None);
            assert_eq!(call.as_deref(), Some("(1,2)"));
        }
        other => panic!("expected unknown function, got {:?}", other),
    }
}

#[test]
fn test_bare_comma_list_is_a_parse_failure() {
    let mut session = Session::new();
    // outer parentheses unwrap first, so the comma reaches the linear
    // evaluator with no call context left
    assert!(matches!(
        session.parse("(1, 2)"),
        Err(EvalError::Parse { .. })
    ));
}

#[test]
fn test_unknown_single_argument_call_reads_as_variable() {
    let mut session = Session::new();
    // with one argument the group evaluates and the name multiplies in,
    // so the failure is an unknown variable, not an unknown function
    assert!(matches!(
        session.parse("nosuch(1)"),
        Err(EvalError::UnknownVariable { .. })
    ));
}

#[test]
fn test_wrong_arity() {
    let mut session = Session::new();
    match session.parse("sin(1, 2)") {
        Err(EvalError::InvalidFunctionCall {
            name,
            expected,
            found,
            ..
        }) => {
            assert_eq!(name, "sin");
            assert_eq!(expected, Some(1));
            assert_eq!(found, 2);
        }
        other => panic!("expected invalid call, got {:?}", other),
    }
}

#[test]
fn test_user_function_wrong_arity() {
    let mut session = Session::new();
    session.add_expression("f(x, y) = x + y").unwrap();
    match session.parse("f(1)") {
        Err(EvalError::InvalidFunctionCall { name, expected, .. }) => {
            assert_eq!(name, "f");
            assert_eq!(expected, Some(2));
        }
        other => panic!("expected invalid call, got {:?}", other),
    }
}

#[test]
fn test_unknown_variable_position_and_guess() {
    let mut session = Session::new();
    session.add_variable_value("x0", 5.0).unwrap();
    match session.parse("1 + x2") {
        Err(EvalError::UnknownVariable {
            name,
            guess,
            position,
            source,
        }) => {
            assert_eq!(name, "x2");
            assert_eq!(guess.as_deref(), Some("x0"));
            assert_eq!(position, 5);
            assert_eq!(source, "1 + x2");
        }
        other => panic!("expected unknown variable, got {:?}", other),
    }
}

#[test]
fn test_unknown_variable_without_guess() {
    let mut session = Session::new();
    match session.parse("zz + 1") {
        Err(EvalError::UnknownVariable { name, guess, .. }) => {
            assert_eq!(name, "zz");
            assert_eq!(guess, None);
        }
        other => panic!("expected unknown variable, got {:?}", other),
    }
}

#[test]
fn test_diagnostic_rendering_points_at_token() {
    let mut session = Session::new();
    session.add_variable_value("x0", 5.0).unwrap();
    let err = session.parse("1 + x2").unwrap_err();
    let rendered = err.to_string();
    assert!(rendered.contains("did you mean x0"));
    assert!(rendered.contains("\n\t1 + x2\n\t    ^"));
}

#[test]
fn test_declaration_requires_equals() {
    let mut session = Session::new();
    assert!(matches!(
        session.add_expression("just text"),
        Err(EvalError::Parse { .. })
    ));
}

#[test]
fn test_variable_error_inside_resolution() {
    let mut session = Session::new();
    session.add_variable("bad", "nope + 1").unwrap();
    assert!(matches!(
        session.parse("bad * 2"),
        Err(EvalError::UnknownVariable { .. })
    ));
}

#[test]
fn test_errors_are_displayable_and_sourced() {
    let mut session = Session::new();
    let err = session.parse("3 * (1, 2)").unwrap_err();
    assert!(!err.to_string().is_empty());
    assert_eq!(err.source_text(), Some("3 * (1, 2)"));
}
