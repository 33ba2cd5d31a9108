//! The reduction pipeline.
//!
//! Evaluation never builds a tree. The reducer repeatedly replaces the
//! leftmost innermost parenthesised group — a function call or a plain
//! grouping — with a fresh `__tmp` binding holding its evaluated (or
//! deferred) value. Once no parentheses remain, the precedence pass wraps
//! the leftmost highest-priority operator with its operands in parentheses
//! and feeds the string back, so that what finally reaches the linear
//! evaluator is a flat, single-priority sequence.
//!
//! Worked example for `cos(x) ^ 2 + (1 + x * sin(x)) / 2`:
//!
//! ```text
//! __tmp1 = cos(x)        ->  __tmp1 ^ 2 + (1 + x * sin(x)) / 2
//! __tmp2 = sin(x)        ->  __tmp1 ^ 2 + (1 + x * __tmp2) / 2
//! __tmp3 = (1+x*__tmp2)  ->  __tmp1 ^ 2 + __tmp3 / 2
//! wrap ^                 ->  (__tmp1 ^ 2) + __tmp3 / 2
//! __tmp4 = (__tmp1 ^ 2)  ->  __tmp4 + __tmp3 / 2
//! wrap /                 ->  __tmp4 + (__tmp3 / 2)
//! __tmp5 = (__tmp3 / 2)  ->  __tmp4 + __tmp5
//! ```

use crate::context::{Session, VarSlot};
use crate::error::{EvalError, Result};
use crate::functions;
use crate::lexer;
use crate::normalize;
use crate::types::{Arg, AttachedFunction, ExpressionFunction, FunctionBinding, NativeCall, ParametricKind, Variable};
use crate::Real;

/// Depth bound for user-function recursion.
const MAX_RECURSION_DEPTH: usize = 100;

/// Applies one binary operator with IEEE-754 semantics; `^` is `powf` and
/// `%` is the floating remainder.
pub(crate) fn apply_operator(op: char, a: Real, b: Real) -> Real {
    match op {
        '%' => a % b,
        '^' => a.powf(b),
        '*' => a * b,
        '/' => a / b,
        '+' => a + b,
        '-' => a - b,
        _ => Real::NAN,
    }
}

/// 1-based character column of `word` within `original`, when it occurs.
fn char_position(original: &str, word: &str) -> Option<usize> {
    original
        .find(word)
        .map(|byte| original[..byte].chars().count() + 1)
}

impl Session {
    /// Reduces `src` to a value by eliminating parentheses innermost-first.
    ///
    /// With `second_pass` set, argument evaluation failures propagate
    /// instead of producing deferred expressions; this is how a deferred
    /// expression forced from inside a higher-order builtin surfaces its
    /// real error rather than deferring forever.
    pub(crate) fn reduce(&mut self, src: &str, original: &str, second_pass: bool) -> Result<Real> {
        let mut src = normalize::strip_whitespace(src);
        if src.starts_with('(') && src.ends_with(')') && !src[1..].contains('(') {
            src = src[1..src.len() - 1].to_string();
        }

        while src.contains('(') || src.contains(')') {
            let Some((open, close)) = lexer::innermost_parens(&src) else {
                break;
            };
            let inner = src[open + 1..close].trim().to_string();
            let raw_args: Vec<String> = lexer::split_arguments(&inner)
                .into_iter()
                .map(str::to_string)
                .collect();

            let mut call_start = open;
            let mut sign_before = if open == 0
                || lexer::char_before(&src, open).map_or(true, lexer::is_special)
            {
                ""
            } else {
                "*"
            };
            let sign_after = if close + 1 >= src.len()
                || lexer::char_after(&src, close + 1).map_or(true, lexer::is_special)
            {
                ""
            } else {
                "*"
            };

            // The word immediately before the `(` decides whether this is a
            // call. Leading digits peel off as an implicit coefficient.
            let mut function: Option<AttachedFunction> = None;
            if open > 0 {
                let before = &src[..open];
                let mut word = before[lexer::word_start(before)..].trim();
                while word.chars().next().is_some_and(|c| c.is_ascii_digit()) {
                    word = &word[1..];
                }
                if !word.is_empty() {
                    let position = char_position(original, word);
                    match self.lookup_function(original, position, word, raw_args.len())? {
                        Some(binding) => {
                            sign_before = "";
                            call_start = open - word.len();
                            function = Some(AttachedFunction {
                                called_name: word.to_string(),
                                binding,
                            });
                        }
                        None if raw_args.len() > 1 => {
                            return Err(EvalError::UnknownFunction {
                                source: original.to_string(),
                                position,
                                name: Some(word.to_string()),
                                call: None,
                            });
                        }
                        None => {}
                    }
                }
            }
            if raw_args.len() > 1 && function.is_none() {
                return Err(EvalError::UnknownFunction {
                    source: original.to_string(),
                    position: None,
                    name: None,
                    call: Some(src[open..=close].to_string()),
                });
            }

            let mut answers = Vec::with_capacity(raw_args.len());
            for (i, text) in raw_args.iter().enumerate() {
                let special = function
                    .as_ref()
                    .is_some_and(|f| f.binding.is_special_parameter(i));
                if special {
                    answers.push(Arg::Text(normalize::strip_whitespace(text)));
                } else if second_pass {
                    answers.push(Arg::Number(self.reduce(text, original, false)?));
                } else {
                    match self.reduce(text, original, false) {
                        Ok(value) => answers.push(Arg::Number(value)),
                        Err(_) => answers.push(Arg::Deferred {
                            text: text.clone(),
                            original: original.to_string(),
                        }),
                    }
                }
            }

            let name = self.tmp_name();
            self.inner_variables.push(Variable::temporary(
                name.clone(),
                answers,
                &inner,
                original,
                function,
            ));
            src = format!(
                "{}{}{}{}{}",
                &src[..call_start],
                sign_before,
                name,
                sign_after,
                &src[close + 1..]
            );
        }

        self.order_operations(&src, original)
    }

    /// Groups the leftmost operator of the highest priority present with
    /// its operands in parentheses and hands back to the reducer. When all
    /// operators share one priority the sequence is already linear.
    fn order_operations(&mut self, src: &str, original: &str) -> Result<Real> {
        let mut all_same = true;
        let mut highest = None;
        for (i, op) in lexer::OPERATORS.iter().enumerate() {
            if src.contains(*op) {
                match highest {
                    Some(priority) if lexer::OPERATOR_PRIORITY[i] != priority => {
                        all_same = false;
                        break;
                    }
                    Some(_) => {}
                    // operators are scanned highest-priority first, so the
                    // first one present is the maximum
                    None => highest = Some(lexer::OPERATOR_PRIORITY[i]),
                }
            }
        }

        if let (false, Some(priority)) = (all_same, highest) {
            let mut target: Option<(usize, char)> = None;
            for (i, op) in lexer::OPERATORS.iter().enumerate() {
                if lexer::OPERATOR_PRIORITY[i] == priority {
                    if let Some(pos) = src.find(*op) {
                        if target.map_or(true, |(current, _)| pos < current) {
                            target = Some((pos, *op));
                        }
                    }
                }
            }
            if let Some((index, op)) = target {
                let after = &src[index + 1..];
                let rhs = &after[..lexer::word_end(after)];
                let before = &src[..index];
                let start = lexer::word_start(before);
                let rewritten = format!(
                    "{}({}{}{}){}",
                    &src[..start],
                    &before[start..],
                    op,
                    rhs,
                    &src[index + 1 + rhs.len()..]
                );
                return self.reduce(&rewritten, original, false);
            }
        }

        if src.contains('(') || src.contains(')') {
            return self.reduce(src, original, false);
        }
        self.eval_linear(src, original)
    }

    /// Evaluates a flat single-priority sequence left to right.
    fn eval_linear(&mut self, src: &str, original: &str) -> Result<Real> {
        let mut rest = src.trim();
        let mut acc: Real = 0.0;
        let mut pending = '+';
        let mut operand: Option<Real> = None;

        loop {
            rest = rest.trim_start();
            if let Some(value) = operand.take() {
                acc = apply_operator(pending, acc, value);
            }
            let Some(c) = rest.chars().next() else {
                return Ok(acc);
            };
            if lexer::is_operator(c) {
                pending = c;
                rest = &rest[c.len_utf8()..];
                continue;
            }

            let end = lexer::word_end(rest);
            let word = rest[..end].trim();
            if word.is_empty() {
                return Err(EvalError::Parse {
                    source: original.to_string(),
                    message: format!("unexpected character '{}'", c),
                });
            }
            rest = &rest[end..];
            let first_is_numeric = word
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_digit() || c == '.');
            let value = match word.parse::<Real>() {
                Ok(v) if first_is_numeric => v,
                _ => self.eval_word(word, original)?,
            };
            operand = Some(value);
        }
    }

    /// Resolves one operand token: a known variable, or a coefficient
    /// followed by identifiers to split.
    fn eval_word(&mut self, word: &str, original: &str) -> Result<Real> {
        if let Some(slot) = self.find_variable(word) {
            return self.variable_answer(slot, original);
        }
        if word.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            let prefix_len = word
                .chars()
                .take_while(|c| c.is_ascii_digit() || *c == '.')
                .count();
            let (number, rest) = word.split_at(prefix_len);
            let coefficient: Real = number.parse().map_err(|_| EvalError::Parse {
                source: original.to_string(),
                message: format!("invalid numeric literal ({})", number),
            })?;
            if let Some(slot) = self.find_variable(rest) {
                let value = self.variable_answer(slot, original)?;
                return Ok(coefficient * value);
            }
            return self.split_identifiers(rest, coefficient, original);
        }
        self.split_identifiers(word, 1.0, original)
    }

    /// Splits a run of characters into known variables by accumulating
    /// left to right and consuming a name as soon as the accumulator
    /// matches one, multiplying its value in. The shortest matching prefix
    /// wins: with `x` and `xy` both bound, `xyz` consumes `x` first. A
    /// whole word only reads as a single variable through the lookup in
    /// [`eval_word`](Self::eval_word), which runs before splitting starts.
    /// Digits glue to the name being built, so identifiers like `x0`
    /// survive. Whatever remains unmatched raises an unknown-variable
    /// error with a similarity-based suggestion.
    fn split_identifiers(
        &mut self,
        word: &str,
        mut coefficient: Real,
        original: &str,
    ) -> Result<Real> {
        let chars: Vec<char> = word.chars().collect();
        let mut builder = String::new();
        let mut consumed_end = 0;
        for i in 0..chars.len() {
            let c = chars[i];
            if i + 1 < chars.len() && chars[i + 1].is_ascii_digit() {
                builder.push(c);
                continue;
            }
            let mut candidate = builder.clone();
            candidate.push(c);
            match self.find_variable(&candidate) {
                None => builder.push(c),
                Some(slot) => {
                    consumed_end = i + 1;
                    builder.clear();
                    let value = self.variable_answer(slot, original)?;
                    coefficient *= value;
                }
            }
        }
        if !builder.is_empty() {
            let position = original
                .find(word)
                .map(|byte| original[..byte].chars().count())
                .unwrap_or(0)
                + 1
                + consumed_end;
            return Err(self.unknown_variable(original, position, &builder));
        }
        Ok(coefficient)
    }

    /// Builds the unknown-variable error, guessing the nearest resolved
    /// user variable by Levenshtein similarity.
    fn unknown_variable(&self, original: &str, position: usize, name: &str) -> EvalError {
        let mut best = 0.0;
        let mut guess = None;
        for variable in &self.variables {
            if !variable.resolved {
                continue;
            }
            let sim = lexer::similarity(name, &variable.name);
            if sim > best {
                best = sim;
                guess = Some(variable.name.clone());
            }
        }
        EvalError::UnknownVariable {
            source: original.to_string(),
            position,
            name: name.to_string(),
            guess,
        }
    }

    /// Produces the value of a binding: the cached number for plain
    /// variables, forcing any deferred expression, or the (lazy) function
    /// application for call temporaries.
    pub(crate) fn variable_answer(&mut self, slot: VarSlot, original: &str) -> Result<Real> {
        let variable = self.var(slot).clone();
        match variable.function {
            None => match variable.answers.first() {
                Some(Arg::Number(value)) => Ok(*value),
                Some(Arg::Deferred { text, original: captured }) => {
                    let (text, captured) = (text.clone(), captured.clone());
                    self.reduce(&text, &captured, true)
                }
                Some(Arg::Text(text)) => {
                    let text = text.clone();
                    self.reduce(&text, original, true)
                }
                None => Ok(0.0),
            },
            Some(attached) => {
                let mut forced = Vec::with_capacity(variable.answers.len());
                for arg in &variable.answers {
                    match arg {
                        Arg::Deferred { text, original: captured } => {
                            forced.push(Arg::Number(self.reduce(text, captured, true)?));
                        }
                        other => forced.push(other.clone()),
                    }
                }
                self.call_function(&attached, &forced, original)
            }
        }
    }

    /// Dispatches a call through whichever of the three binding shapes is
    /// attached.
    pub(crate) fn call_function(
        &mut self,
        attached: &AttachedFunction,
        args: &[Arg],
        original: &str,
    ) -> Result<Real> {
        match &attached.binding {
            FunctionBinding::Native(native) => match &native.implementation {
                NativeCall::Plain(f) => {
                    let mut values = Vec::with_capacity(args.len());
                    for arg in args {
                        match arg.as_number() {
                            Some(value) => values.push(value),
                            None => {
                                return Err(EvalError::InvalidParameter(format!(
                                    "{}(): expected a numeric argument",
                                    native.name
                                )))
                            }
                        }
                    }
                    Ok(f(&values))
                }
                NativeCall::Session(f) => {
                    let f = f.clone();
                    f(self, args)
                }
            },
            FunctionBinding::Parametric(kind) => {
                let parameter = kind.parameter(&attached.called_name).ok_or_else(|| {
                    EvalError::InvalidParameter(format!(
                        "invalid function name ({})",
                        attached.called_name
                    ))
                })?;
                let x = args.first().and_then(Arg::as_number).ok_or_else(|| {
                    EvalError::InvalidParameter(format!(
                        "{}(): expected a numeric argument",
                        attached.called_name
                    ))
                })?;
                Ok(match kind {
                    ParametricKind::Log => functions::log_base(x, parameter as Real),
                    ParametricKind::Radical => functions::radical(x, parameter as Real),
                })
            }
            FunctionBinding::Expression(function) => {
                self.call_expression(function, args, original)
            }
        }
    }

    /// Invokes a user-defined function: clone the session, inject the
    /// parameters as resolved variables ahead of everything else, parse the
    /// body in the clone. The shared registry lets the body see its own
    /// name, so recursion works without leaking bindings anywhere.
    fn call_expression(
        &mut self,
        function: &ExpressionFunction,
        args: &[Arg],
        original: &str,
    ) -> Result<Real> {
        if args.len() != function.params.len() {
            return Err(EvalError::InvalidFunctionCall {
                source: Some(original.to_string()),
                position: None,
                name: function.name.clone(),
                expected: Some(function.params.len()),
                found: args.len(),
            });
        }
        if self.depth >= MAX_RECURSION_DEPTH {
            return Err(EvalError::RecursionLimit(function.name.clone()));
        }
        let mut scope = self.clone();
        scope.depth = self.depth + 1;
        for (param, arg) in function.params.iter().zip(args).rev() {
            let value = arg.as_number().ok_or_else(|| {
                EvalError::InvalidParameter(format!(
                    "{}(): expected a numeric argument",
                    function.name
                ))
            })?;
            scope.add_variable_value_at(param, value, 0)?;
        }
        scope.parse(&function.expression)
    }
}
