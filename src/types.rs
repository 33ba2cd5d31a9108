//! Type definitions for the expression evaluator.
//!
//! This module contains the core data structures used throughout the crate:
//! variable bindings, the argument slots a reduced call holds, and the three
//! shapes of function binding (native, parametric-name and user-defined).

use std::borrow::Cow;
use std::rc::Rc;

use crate::context::Session;
use crate::error::Result;
use crate::lexer;
use crate::Real;

/// One slot of a reduced function call or grouping.
///
/// Non-special arguments normally evaluate straight to a number. An argument
/// that cannot be evaluated yet (it mentions a variable a surrounding
/// higher-order builtin will introduce later) is kept as a deferred
/// expression and forced on second pass. Special parameters carry their raw
/// source text to the builtin untouched.
#[derive(Clone)]
pub enum Arg {
    /// An evaluated numeric argument.
    Number(Real),
    /// Raw source text for a special (string) parameter.
    Text(String),
    /// An argument whose first evaluation failed; the source is kept so it
    /// can be re-evaluated once the needed bindings exist.
    Deferred { text: String, original: String },
}

impl Arg {
    /// The numeric value, if this slot already holds one.
    pub fn as_number(&self) -> Option<Real> {
        match self {
            Arg::Number(value) => Some(*value),
            _ => None,
        }
    }

    /// The raw text of a special parameter, if this slot is one.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Arg::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// A named scalar binding.
///
/// Covers user-declared variables, the constants `e`/`pi`, and the synthetic
/// `__tmp` temporaries introduced while a parse reduces parentheses away.
/// A temporary that stands for a function call keeps the evaluated argument
/// slots and the function to apply; the call happens lazily when the linear
/// evaluator first reads the temporary.
#[derive(Clone)]
pub struct Variable {
    /// Lowercased name.
    pub name: String,
    /// Defining source expression (lowercased for user declarations).
    pub expression: String,
    /// The declaration as the user wrote it, for diagnostics.
    pub original: String,
    /// Evaluated argument slots; a plain binding has exactly one.
    pub answers: Vec<Arg>,
    /// True once the defining expression has been evaluated and cached.
    pub resolved: bool,
    /// The function to apply to `answers`, for call temporaries.
    pub function: Option<AttachedFunction>,
}

impl Variable {
    /// A user variable defined by a source expression, resolved lazily.
    pub fn from_expression(name: &str, expression: &str) -> Self {
        let name = name.trim().to_lowercase();
        let expression = expression.trim().to_lowercase();
        let original = format!("{} = {}", name, expression);
        Variable {
            name,
            expression,
            original,
            answers: vec![Arg::Number(0.0)],
            resolved: false,
            function: None,
        }
    }

    /// A variable bound directly to a value.
    pub fn from_value(name: &str, value: Real) -> Self {
        let name = name.trim().to_lowercase();
        let expression = value.to_string();
        let original = format!("{} = {}", name, expression);
        Variable {
            name,
            expression,
            original,
            answers: vec![Arg::Number(value)],
            resolved: true,
            function: None,
        }
    }

    /// A `__tmp` temporary synthesised during reduction.
    pub(crate) fn temporary(
        name: String,
        answers: Vec<Arg>,
        expression: &str,
        original: &str,
        function: Option<AttachedFunction>,
    ) -> Self {
        Variable {
            name,
            expression: expression.to_string(),
            original: original.to_string(),
            answers,
            resolved: true,
            function,
        }
    }

    /// The cached numeric answer, when one is present.
    pub fn answer(&self) -> Option<Real> {
        if self.function.is_some() {
            return None;
        }
        self.answers.first().and_then(Arg::as_number)
    }
}

/// A function binding resolved against a concrete call site.
///
/// Keeps the name as it was written (`log2`, `√3`, ...) so parametric
/// functions can recover their encoded parameter at call time.
#[derive(Clone)]
pub struct AttachedFunction {
    pub called_name: String,
    pub binding: FunctionBinding,
}

/// The implementation behind a native function.
#[derive(Clone)]
pub enum NativeCall {
    /// A pure numeric function.
    Plain(Rc<dyn Fn(&[Real]) -> Real>),
    /// A function that drives the session itself: the higher-order builtins
    /// receive the evaluating session plus the raw argument slots.
    Session(Rc<dyn Fn(&mut Session, &[Arg]) -> Result<Real>>),
}

impl std::fmt::Debug for NativeCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NativeCall::Plain(_) => f.write_str("NativeCall::Plain(..)"),
            NativeCall::Session(_) => f.write_str("NativeCall::Session(..)"),
        }
    }
}

/// A function implemented in Rust and registered with a session.
#[derive(Clone, Debug)]
pub struct NativeFunction {
    /// The name the function answers to, case-insensitively.
    pub name: Cow<'static, str>,
    /// Declared arity; `None` accepts any number of arguments.
    pub arity: Option<usize>,
    /// Positions of special (string) parameters, which receive raw
    /// unevaluated source text.
    pub special: Cow<'static, [usize]>,
    /// The actual implementation.
    pub implementation: NativeCall,
}

/// A function defined by the user as an expression over named parameters.
///
/// On invocation the owning session is cloned, each parameter is injected
/// into the clone as a resolved variable, and the body is parsed there. The
/// clone shares the function registry, which is what makes recursive
/// definitions work.
#[derive(Clone, Debug)]
pub struct ExpressionFunction {
    pub name: String,
    pub params: Vec<String>,
    pub expression: String,
}

/// Functions whose name encodes an integer parameter.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ParametricKind {
    /// `log2`, `log10`, ... `log<base>`.
    Log,
    /// `radical3`, `√4`, ... `radical<n>` / `√<n>`.
    Radical,
}

impl ParametricKind {
    /// Extracts the encoded integer when `name` matches this kind.
    pub fn parameter(&self, name: &str) -> Option<u32> {
        let name = name.trim();
        let rest = match self {
            ParametricKind::Log => strip_prefix_ignore_case(name, "log")?,
            ParametricKind::Radical => strip_prefix_ignore_case(name, "radical")
                .or_else(|| name.strip_prefix('√'))?,
        };
        if lexer::is_unsigned_integer(rest) {
            rest.parse().ok()
        } else {
            None
        }
    }
}

fn strip_prefix_ignore_case<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    if name.len() >= prefix.len()
        && name.is_char_boundary(prefix.len())
        && name[..prefix.len()].eq_ignore_ascii_case(prefix)
    {
        Some(&name[prefix.len()..])
    } else {
        None
    }
}

/// Polymorphic function binding: the three shapes a registered function can
/// take.
#[derive(Clone, Debug)]
pub enum FunctionBinding {
    Native(NativeFunction),
    Parametric(ParametricKind),
    Expression(ExpressionFunction),
}

impl FunctionBinding {
    /// The canonical name, for error messages.
    pub fn display_name(&self) -> &str {
        match self {
            FunctionBinding::Native(f) => &f.name,
            FunctionBinding::Parametric(ParametricKind::Log) => "log",
            FunctionBinding::Parametric(ParametricKind::Radical) => "radical",
            FunctionBinding::Expression(f) => &f.name,
        }
    }

    /// True if a call written as `name` refers to this binding.
    pub fn matches(&self, name: &str) -> bool {
        match self {
            FunctionBinding::Native(f) => f.name.trim().eq_ignore_ascii_case(name.trim()),
            FunctionBinding::Parametric(kind) => kind.parameter(name).is_some(),
            FunctionBinding::Expression(f) => f.name.trim().eq_ignore_ascii_case(name.trim()),
        }
    }

    /// Declared arity; `None` means variadic.
    pub fn arity(&self) -> Option<usize> {
        match self {
            FunctionBinding::Native(f) => f.arity,
            FunctionBinding::Parametric(_) => Some(1),
            FunctionBinding::Expression(f) => Some(f.params.len()),
        }
    }

    /// True if the parameter at `index` receives raw source text instead of
    /// an evaluated number.
    pub fn is_special_parameter(&self, index: usize) -> bool {
        match self {
            FunctionBinding::Native(f) => f.special.contains(&index),
            _ => false,
        }
    }
}
