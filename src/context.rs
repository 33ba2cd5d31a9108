//! The evaluation session.
//!
//! A [`Session`] owns everything a parse needs: the user's variables and
//! functions, the builtin registry, the inner variables (constants plus the
//! `__tmp` temporaries a reduction synthesises), the temporary counter and
//! the rounding policy. Sessions are single-threaded; for independent
//! evaluation, clone one — clones share no mutable variable state with their
//! origin, which is exactly what the higher-order builtins rely on when they
//! inject bound variables.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::calculus::GaussTable;
use crate::error::{EvalError, Result};
use crate::functions;
use crate::lexer;
use crate::normalize;
use crate::types::{Arg, ExpressionFunction, FunctionBinding, NativeCall, NativeFunction, Variable};
use crate::{constants, Real};

/// Decimal places kept by default when rounding final results.
pub const DEFAULT_ROUND_SCALE: u32 = 6;

/// Where a variable lives: the user list or the inner list.
#[derive(Clone, Copy, Debug)]
pub(crate) struct VarSlot {
    pub user: bool,
    pub index: usize,
}

/// The evaluation context for expressions.
///
/// ```
/// use calc_rs::Session;
///
/// let mut session = Session::new();
/// session.add_expression("f(x, y) = 2(x + y)").unwrap();
/// session.add_expression("x0 = 1 + 2 ^ 2").unwrap();
/// session.add_expression("y0 = 2x0").unwrap();
/// assert_eq!(session.parse("1 + 2f(x0, y0)/3").unwrap(), 21.0);
/// ```
#[derive(Clone)]
pub struct Session {
    pub(crate) variables: Vec<Variable>,
    pub(crate) functions: Vec<FunctionBinding>,
    pub(crate) builtins: Rc<Vec<FunctionBinding>>,
    pub(crate) inner_variables: Vec<Variable>,
    pub(crate) tmp_counter: u32,
    pub(crate) round_enabled: bool,
    pub(crate) round_scale: u32,
    pub(crate) depth: usize,
    gauss_cache: Rc<RefCell<BTreeMap<usize, Rc<GaussTable>>>>,
}

impl Session {
    /// Creates a fresh session with the full builtin roster registered.
    pub fn new() -> Self {
        Session {
            variables: Vec::new(),
            functions: Vec::new(),
            builtins: Rc::new(functions::default_bindings()),
            inner_variables: Vec::new(),
            tmp_counter: 0,
            round_enabled: true,
            round_scale: DEFAULT_ROUND_SCALE,
            depth: 0,
            gauss_cache: Rc::new(RefCell::new(BTreeMap::new())),
        }
    }

    /// Parses and evaluates an expression against this session.
    ///
    /// Unresolved user variables are resolved (in declaration order) and
    /// cached first; temporaries from any previous parse are dropped. The
    /// result is rounded according to the session's rounding policy.
    ///
    /// All operators, `^` included, associate to the left: `2^3^2` is
    /// `(2^3)^2`.
    pub fn parse(&mut self, expression: &str) -> Result<Real> {
        self.begin_parse();
        self.parse_in_place(expression)
    }

    /// The parse entry used internally by higher-order builtins: evaluates
    /// without dropping existing temporaries, which deferred argument texts
    /// may still reference.
    pub(crate) fn parse_in_place(&mut self, expression: &str) -> Result<Real> {
        let original = expression.to_string();
        lexer::validate_parentheses(&original)?;
        self.init_constants();
        let normalized = normalize::normalize(self, &original);
        self.resolve_variables()?;
        let value = self.reduce(&normalized, &original, false)?;
        Ok(self.round(value))
    }

    /// Registers a declaration, deciding its shape from the text: with a
    /// `(` on the left of `=` it is a function, otherwise a variable.
    ///
    /// ```
    /// use calc_rs::Session;
    ///
    /// let mut session = Session::new();
    /// session.add_expression("g(x) = x^2").unwrap();
    /// session.add_expression("a = 3").unwrap();
    /// assert_eq!(session.parse("g(a) + 1").unwrap(), 10.0);
    /// ```
    pub fn add_expression(&mut self, text: &str) -> Result<()> {
        let Some(eq) = text.find('=') else {
            return Err(EvalError::Parse {
                source: text.to_string(),
                message: "expected a declaration containing '='".to_string(),
            });
        };
        let (left, right) = (&text[..eq], &text[eq + 1..]);
        if left.contains('(') {
            let head = normalize::strip_whitespace(left);
            let open = head.find('(').unwrap();
            let close = head.find(')').ok_or_else(|| EvalError::UnbalancedParentheses {
                source: Some(text.to_string()),
                position: None,
            })?;
            let params: Vec<&str> = head[open + 1..close].split(',').collect();
            self.register_expression_function(&head[..open], &params, right.trim())
        } else {
            self.add_variable(left, right)
        }
    }

    /// Adds a variable defined by a source expression, replacing any
    /// existing binding of the same name. Resolution happens lazily on the
    /// next parse.
    pub fn add_variable(&mut self, name: &str, expression: &str) -> Result<()> {
        self.insert_variable(Variable::from_expression(name, expression), None)
    }

    /// Like [`add_variable`](Self::add_variable), inserting at `index` to
    /// control resolution order.
    pub fn add_variable_at(&mut self, name: &str, expression: &str, index: usize) -> Result<()> {
        self.insert_variable(Variable::from_expression(name, expression), Some(index))
    }

    /// Adds a variable bound directly to a value.
    pub fn add_variable_value(&mut self, name: &str, value: Real) -> Result<()> {
        self.insert_variable(Variable::from_value(name, value), None)
    }

    /// Like [`add_variable_value`](Self::add_variable_value), inserting at
    /// `index`.
    pub fn add_variable_value_at(&mut self, name: &str, value: Real, index: usize) -> Result<()> {
        self.insert_variable(Variable::from_value(name, value), Some(index))
    }

    fn insert_variable(&mut self, variable: Variable, index: Option<usize>) -> Result<()> {
        if variable.name.is_empty() || variable.name.starts_with("__tmp") {
            return Err(EvalError::InvalidParameter(format!(
                "invalid variable name ({})",
                variable.name
            )));
        }
        self.remove_variable(&variable.name);
        match index {
            Some(index) => {
                let index = index.min(self.variables.len());
                self.variables.insert(index, variable);
            }
            None => self.variables.push(variable),
        }
        Ok(())
    }

    /// Removes the named user variable, if present.
    pub fn remove_variable(&mut self, name: &str) {
        let name = name.trim().to_lowercase();
        if let Some(position) = self.variables.iter().position(|v| v.name == name) {
            self.variables.remove(position);
        }
    }

    /// True if a user variable of this name exists.
    pub fn contains_variable(&self, name: &str) -> bool {
        let name = name.trim().to_lowercase();
        self.variables.iter().any(|v| v.name == name)
    }

    /// The registered user variables, in resolution order.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Registers a function binding directly.
    pub fn add_function(&mut self, binding: FunctionBinding) {
        self.functions.push(binding);
    }

    /// Registers a collection of function bindings at once.
    pub fn add_functions<I>(&mut self, bindings: I)
    where
        I: IntoIterator<Item = FunctionBinding>,
    {
        self.functions.extend(bindings);
    }

    /// Registers a native function.
    ///
    /// Pass `Some(n)` for a fixed arity or `None` for variadic.
    ///
    /// ```
    /// use calc_rs::Session;
    ///
    /// let mut session = Session::new();
    /// session.register_native_function("double", Some(1), |args| args[0] * 2.0);
    /// assert_eq!(session.parse("double(21)").unwrap(), 42.0);
    /// ```
    pub fn register_native_function<F>(&mut self, name: &str, arity: Option<usize>, implementation: F)
    where
        F: Fn(&[Real]) -> Real + 'static,
    {
        self.functions.push(FunctionBinding::Native(NativeFunction {
            name: name.to_string().into(),
            arity,
            special: Vec::new().into(),
            implementation: NativeCall::Plain(Rc::new(implementation)),
        }));
    }

    /// Registers a user function defined by an expression body.
    ///
    /// Recursive definitions are supported; each invocation runs against a
    /// clone of the session holding only the parameter bindings on top of
    /// the shared registry.
    pub fn register_expression_function(
        &mut self,
        name: &str,
        params: &[&str],
        body: &str,
    ) -> Result<()> {
        let name = name.trim();
        if name.is_empty() || name.to_lowercase().starts_with("__tmp") {
            return Err(EvalError::InvalidParameter(format!(
                "invalid function name ({})",
                name
            )));
        }
        self.functions.push(FunctionBinding::Expression(ExpressionFunction {
            name: name.to_string(),
            params: params.iter().map(|p| p.trim().to_string()).collect(),
            expression: body.to_string(),
        }));
        Ok(())
    }

    /// Resets the session.
    ///
    /// A shallow reset drops inner variables (constants and temporaries)
    /// and the temporary counter; a deep reset additionally clears user
    /// variables and functions.
    pub fn reset(&mut self, deep: bool) {
        if deep {
            self.variables.clear();
            self.functions.clear();
        }
        self.inner_variables.clear();
        self.tmp_counter = 0;
    }

    /// Enables or disables rounding of final results.
    pub fn set_round_enabled(&mut self, enabled: bool) {
        self.round_enabled = enabled;
    }

    /// Whether final results are rounded.
    pub fn round_enabled(&self) -> bool {
        self.round_enabled
    }

    /// Sets the decimal scale used when rounding.
    pub fn set_round_scale(&mut self, scale: u32) {
        self.round_scale = scale;
    }

    /// The decimal scale used when rounding.
    pub fn round_scale(&self) -> u32 {
        self.round_scale
    }

    /// Rounds half-up at the session scale. NaN and infinities pass
    /// through untouched.
    pub(crate) fn round(&self, a: Real) -> Real {
        if !self.round_enabled || a.is_infinite() || a.is_nan() {
            return a;
        }
        let factor = 10f64.powi(self.round_scale as i32);
        (a * factor).round() / factor
    }

    /// True if any binding (user or inner) answers to this name. The
    /// normaliser uses this so unit suffixes never shadow user identifiers.
    pub(crate) fn has_binding(&self, name: &str) -> bool {
        self.find_variable(name).is_some()
    }

    pub(crate) fn find_variable(&self, name: &str) -> Option<VarSlot> {
        let name = name.trim().to_lowercase();
        if let Some(index) = self.variables.iter().position(|v| v.name == name) {
            return Some(VarSlot { user: true, index });
        }
        self.inner_variables
            .iter()
            .position(|v| v.name == name)
            .map(|index| VarSlot { user: false, index })
    }

    pub(crate) fn var(&self, slot: VarSlot) -> &Variable {
        if slot.user {
            &self.variables[slot.index]
        } else {
            &self.inner_variables[slot.index]
        }
    }

    /// Generates a fresh `__tmp{N}` name, skipping collisions with bindings
    /// that survived from an enclosing parse.
    pub(crate) fn tmp_name(&mut self) -> String {
        loop {
            self.tmp_counter += 1;
            let name = format!("__tmp{}", self.tmp_counter);
            if self.find_variable(&name).is_none() {
                return name;
            }
        }
    }

    pub(crate) fn lookup_function(
        &self,
        source: &str,
        position: Option<usize>,
        name: &str,
        count: usize,
    ) -> Result<Option<FunctionBinding>> {
        functions::lookup(
            &self.functions,
            &self.builtins,
            source,
            position,
            name,
            count,
        )
    }

    /// Gauss–Legendre coefficients for `points` nodes, computed once per
    /// node count and shared with clones.
    pub(crate) fn gauss_table(&self, points: usize) -> Rc<GaussTable> {
        let mut cache = self.gauss_cache.borrow_mut();
        cache
            .entry(points)
            .or_insert_with(|| Rc::new(GaussTable::new(points)))
            .clone()
    }

    /// Drops temporaries of the previous top-level parse and restarts the
    /// counter.
    fn begin_parse(&mut self) {
        self.inner_variables.retain(|v| !v.name.starts_with("__tmp"));
        self.tmp_counter = 0;
    }

    fn init_constants(&mut self) {
        for (name, value) in [
            ("e", constants::E),
            ("Π", constants::PI),
            ("π", constants::PI),
            ("pi", constants::PI),
        ] {
            let key = name.to_lowercase();
            self.remove_variable(&key);
            if !self.inner_variables.iter().any(|v| v.name == key) {
                self.inner_variables.push(Variable::from_value(name, value));
            }
        }
    }

    /// Resolves user variables in declaration order, each exactly once,
    /// caching the rounded answer.
    fn resolve_variables(&mut self) -> Result<()> {
        let mut i = 0;
        while i < self.variables.len() {
            if !self.variables[i].resolved {
                let expression = self.variables[i].expression.clone();
                let original = self.variables[i].original.clone();
                lexer::validate_parentheses(&expression)?;
                let fixed = normalize::fix_degrees(self, &expression);
                let value = self.reduce(&fixed, &original, false)?;
                let rounded = self.round(value);
                let variable = &mut self.variables[i];
                variable.answers = vec![Arg::Number(rounded)];
                variable.resolved = true;
            }
            i += 1;
        }
        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Session::new()
    }
}
