//! Expression evaluator
//!
//! Also home of the [`Interpreter`] itself: construction, program loading and
//! the top-level driver. Statements, calls and member resolution are further
//! `impl Interpreter` blocks in `exec.rs`, `call.rs` and `member.rs`.

use super::diagnostics::Diagnostics;
use super::env::{child_env, EnvRef, Environment};
use super::error::{InterpResult, RuntimeError};
use super::flow::{ControlFlow, EvalResult, Unwind};
use super::value::{map_lookup, normalize_key, FUNCTION_KEY, METHOD_KEY, OBJECT_KEY, TYPE_KEY};
use super::value::{Value, ValueMap};
use crate::ast::{BinaryOp, Expr, FunctionDecl, Ident, LambdaRef, MatchArm, Program, Stmt, SubDecl, UnaryOp};
use crate::config::InterpreterConfig;
use crate::runtime::{Host, TypeInfo, TypeRegistry};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::rc::Rc;

/// Stack growth parameters for deep recursion
pub(crate) const STACK_RED_ZONE: usize = 128 * 1024; // 128KB remaining triggers growth
pub(crate) const STACK_GROW_SIZE: usize = 4 * 1024 * 1024; // Grow by 4MB each time

/// The interpreter
///
/// Borrows its [`Host`] immutably for its whole lifetime; the only mutable
/// state is the program's own declarations and the environment chain.
pub struct Interpreter<'h> {
    /// Natives, namespaces, host types and member hooks
    pub(crate) host: &'h Host,
    pub(crate) config: InterpreterConfig,
    pub(crate) diagnostics: Diagnostics,
    /// Root environment
    pub(crate) global_env: EnvRef,
    /// User SUBs by canonical name
    pub(crate) subs: HashMap<Ident, Rc<SubDecl>>,
    /// User FUNCTIONs by canonical name
    pub(crate) functions: HashMap<Ident, Rc<FunctionDecl>>,
    /// Types declared by the program
    pub(crate) types: TypeRegistry,
    /// Lambda nodes by id, so lambda values can find their body again
    pub(crate) lambdas: HashMap<i64, LambdaRef>,
    /// Current user call nesting
    pub(crate) call_depth: usize,
}

impl<'h> Interpreter<'h> {
    /// Create a new interpreter with the default configuration
    pub fn new(host: &'h Host) -> Self {
        Interpreter {
            host,
            config: InterpreterConfig::default(),
            diagnostics: Diagnostics::default(),
            global_env: Environment::new().into_ref(),
            subs: HashMap::new(),
            functions: HashMap::new(),
            types: TypeRegistry::new(),
            lambdas: HashMap::new(),
            call_depth: 0,
        }
    }

    pub fn with_config(mut self, config: InterpreterConfig) -> Self {
        self.global_env.borrow_mut().set_strict(config.strict);
        self.config = config;
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Root environment, for hosts that pre-seed or inspect globals
    pub fn global_env(&self) -> &EnvRef {
        &self.global_env
    }

    /// Read a root-scope variable
    pub fn global(&self, name: &str) -> Option<Value> {
        self.global_env.borrow().lookup(&name.to_uppercase())
    }

    /// Collect SUB, FUNCTION and TYPE declarations from the top level
    pub fn load(&mut self, program: &Program) {
        for stmt in &program.statements {
            match stmt {
                Stmt::Sub(sub) => {
                    self.subs.insert(sub.name.clone(), Rc::new(sub.clone()));
                }
                Stmt::Function(func) => {
                    self.functions.insert(func.name.clone(), Rc::new(func.clone()));
                }
                Stmt::Type(decl) => self.load_type(decl),
                _ => {}
            }
        }
        tracing::debug!(
            subs = self.subs.len(),
            functions = self.functions.len(),
            types = self.types.len(),
            "program loaded"
        );
    }

    /// Load and execute a program's top-level statements
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn run(&mut self, program: &Program) -> InterpResult<()> {
        self.load(program);
        let env = Rc::clone(&self.global_env);
        for stmt in &program.statements {
            match self.exec(stmt, &env)? {
                ControlFlow::Normal => {}
                // RETURN / EXIT at top level end the program
                ControlFlow::Return(_) | ControlFlow::Exit(_) => break,
                ControlFlow::Break => return Err(RuntimeError::invalid_control_flow("BREAK")),
                ControlFlow::Continue => return Err(RuntimeError::invalid_control_flow("CONTINUE")),
            }
        }
        Ok(())
    }

    /// Run a program and map the outcome to a process exit status
    pub fn interpret(&mut self, program: &Program) -> i32 {
        match self.run(program) {
            Ok(()) => 0,
            Err(err) => {
                tracing::warn!(kind = err.kind.name(), "uncaught runtime failure");
                self.diagnostics
                    .emit(&format!("Runtime exception: {}", err.message));
                1
            }
        }
    }

    /// Evaluate one expression in the root environment
    pub fn eval_expr(&mut self, expr: &Expr) -> InterpResult<Value> {
        let env = Rc::clone(&self.global_env);
        settle(self.eval(expr, &env))
    }

    pub(crate) fn eval(&mut self, expr: &Expr, env: &EnvRef) -> EvalResult<Value> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.eval_inner(expr, env))
    }

    fn eval_inner(&mut self, expr: &Expr, env: &EnvRef) -> EvalResult<Value> {
        match expr {
            Expr::Nil => Ok(Value::Nil),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Int(n) => Ok(Value::Int(*n)),
            Expr::Float(x) => Ok(Value::Float(*x)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),

            Expr::Var(name) => Ok(env.borrow().get(name.as_str())?),

            Expr::Unary { op, operand } => {
                let value = self.eval(operand, env)?;
                Ok(eval_unary(*op, value)?)
            }

            // Both sides are always evaluated: AND/OR/XOR never short-circuit
            Expr::Binary { op, left, right } => {
                let left = self.eval(left, env)?;
                let right = self.eval(right, env)?;
                Ok(eval_binary(*op, left, right)?)
            }

            Expr::Index { target, indices } => {
                let mut value = self.eval(target, env)?;
                for index in indices {
                    let index = self.eval(index, env)?;
                    value = index_value(&value, &index);
                }
                Ok(value)
            }

            Expr::Call {
                callee,
                args,
                named,
            } => self.eval_call(callee, args, named, env),

            Expr::Member { object, member } => {
                let object = self.eval_receiver(object, env)?;
                Ok(self.resolve_member(&object, member.as_str(), true))
            }

            Expr::MethodCall {
                object,
                method,
                args,
            } => self.eval_method_call(object, method, args, env),

            Expr::Array(items) | Expr::Tuple(items) => Ok(Value::Array(self.eval_list(items, env)?)),

            Expr::Map(entries) => {
                let mut map = ValueMap::new();
                for entry in entries {
                    let key = self.eval(&entry.key, env)?;
                    let value = self.eval(&entry.value, env)?;
                    map.insert(normalize_key(&key.to_text()), value);
                }
                Ok(Value::Map(map))
            }

            Expr::Lambda(lambda) => Ok(self.make_lambda(lambda, env)),

            Expr::Interpolated(parts) => {
                let mut text = String::new();
                for part in parts {
                    text.push_str(&self.eval(part, env)?.to_text());
                }
                Ok(Value::Str(text))
            }

            Expr::Range { start, end } => {
                let start = self.eval(start, env)?;
                let end = self.eval(end, env)?;
                Ok(make_range(&start, &end, self.config.max_array_elements)?)
            }

            Expr::Comprehension {
                expr,
                var,
                source,
                filter,
            } => {
                let items = match self.eval(source, env)? {
                    Value::Array(items) => items,
                    _ => Vec::new(),
                };
                let scope = child_env(env);
                let mut out = Vec::new();
                for item in items {
                    scope.borrow_mut().bind(var.as_str(), item);
                    if let Some(filter) = filter {
                        if !self.eval(filter, &scope)?.is_truthy() {
                            continue;
                        }
                    }
                    out.push(self.eval(expr, &scope)?);
                }
                Ok(Value::Array(out))
            }

            Expr::Match {
                subject,
                arms,
                default,
            } => self.eval_match(subject, arms, default.as_deref(), env),

            Expr::NullSafeMember { object, member } => {
                let object = self.eval(object, env)?;
                if object.is_nil() {
                    return Ok(Value::Nil);
                }
                Ok(self.resolve_member(&object, member.as_str(), false))
            }

            Expr::NullSafeIndex { object, index } => {
                let object = self.eval(object, env)?;
                if object.is_nil() {
                    return Ok(Value::Nil);
                }
                let index = self.eval(index, env)?;
                Ok(index_value(&object, &index))
            }

            Expr::Coalesce { left, right } => {
                let left = self.eval(left, env)?;
                if left.is_nil() {
                    self.eval(right, env)
                } else {
                    Ok(left)
                }
            }

            Expr::Spread(inner) => self.eval(inner, env),

            Expr::TypeOf(inner) => {
                let value = self.eval(inner, env)?;
                let name = value.type_tag().unwrap_or(value.type_name()).to_string();
                Ok(Value::Str(name))
            }

            Expr::GetProperties(inner) => {
                let value = self.eval(inner, env)?;
                let keys = match value.as_map() {
                    Some(map) => map
                        .keys()
                        .filter(|k| !matches!(k.as_str(), TYPE_KEY | OBJECT_KEY | METHOD_KEY | FUNCTION_KEY))
                        .map(|k| Value::Str(k.clone()))
                        .collect(),
                    None => Vec::new(),
                };
                Ok(Value::Array(keys))
            }

            Expr::GetMethods(inner) => {
                let value = self.eval(inner, env)?;
                let methods = match value.type_tag() {
                    Some(tag) => self.methods_of(tag),
                    None => Vec::new(),
                };
                Ok(Value::Array(methods.into_iter().map(Value::Str).collect()))
            }

            Expr::SuperCall { method, args } => self.eval_super_call(method, args, env),
        }
    }

    /// Evaluate a list, expanding `...spread` items that yield arrays
    pub(crate) fn eval_list(&mut self, items: &[Expr], env: &EnvRef) -> EvalResult<Vec<Value>> {
        let mut values = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Expr::Spread(inner) => match self.eval(inner, env)? {
                    Value::Array(spread) => values.extend(spread),
                    other => values.push(other),
                },
                _ => values.push(self.eval(item, env)?),
            }
        }
        Ok(values)
    }

    fn eval_match(
        &mut self,
        subject: &Expr,
        arms: &[MatchArm],
        default: Option<&Expr>,
        env: &EnvRef,
    ) -> EvalResult<Value> {
        let subject = self.eval(subject, env)?;
        for arm in arms {
            let pattern = self.eval(&arm.pattern, env)?;
            if pattern_matches(&subject, &pattern) {
                return self.eval(&arm.result, env);
            }
        }
        match default {
            Some(default) => self.eval(default, env),
            None => Ok(Value::Nil),
        }
    }

    pub(crate) fn load_type(&mut self, decl: &crate::ast::TypeDecl) {
        self.types.register_type(TypeInfo::from_decl(decl));
        for method in &decl.methods {
            let name = Ident::new(format!("{}_{}", decl.name, method.name()));
            match method {
                crate::ast::MethodDecl::Sub(sub) => {
                    let mut sub = sub.clone();
                    sub.params.insert(0, crate::ast::Param::new("THIS"));
                    sub.name = name.clone();
                    self.subs.insert(name, Rc::new(sub));
                }
                crate::ast::MethodDecl::Function(func) => {
                    let mut func = func.clone();
                    func.params.insert(0, crate::ast::Param::new("THIS"));
                    func.name = name.clone();
                    self.functions.insert(name, Rc::new(func));
                }
            }
        }
    }

    /// Program type first, then host type
    pub(crate) fn find_type(&self, name: &str) -> Option<&TypeInfo> {
        self.types
            .get_type(name)
            .or_else(|| self.host.types.get_type(name))
    }

    pub(crate) fn create_instance(&self, name: &str) -> Option<Value> {
        self.types
            .create_instance(name)
            .or_else(|| self.host.types.create_instance(name))
    }

    fn methods_of(&self, type_name: &str) -> Vec<String> {
        if self.types.has_type(type_name) {
            self.types.methods_of(type_name)
        } else {
            self.host.types.methods_of(type_name)
        }
    }
}

/// Collapse a stray signal at an API boundary into a runtime failure
pub(crate) fn settle(result: EvalResult<Value>) -> InterpResult<Value> {
    match result {
        Ok(value) => Ok(value),
        Err(Unwind::Fail(err)) => Err(err),
        Err(Unwind::Signal(ControlFlow::Return(value))) => Ok(value),
        Err(Unwind::Signal(flow)) => Err(RuntimeError::invalid_control_flow(match flow {
            ControlFlow::Continue => "CONTINUE",
            ControlFlow::Exit(_) => "EXIT",
            _ => "BREAK",
        })),
    }
}

// ============================================================================
// Operators
// ============================================================================

fn to_number(value: &Value) -> InterpResult<f64> {
    value
        .as_float()
        .ok_or_else(|| RuntimeError::type_error("number", value.type_name()))
}

/// Truncate a numeric value to i64 (saturating for out-of-range floats)
pub(crate) fn to_int_trunc(value: &Value) -> InterpResult<i64> {
    match value {
        Value::Int(n) => Ok(*n),
        Value::Float(x) => Ok(x.trunc() as i64),
        other => Err(RuntimeError::type_error("number", other.type_name())),
    }
}

/// Evaluate a unary operation
pub fn eval_unary(op: UnaryOp, value: Value) -> InterpResult<Value> {
    match (op, value) {
        (UnaryOp::Not, v) => Ok(Value::Bool(!v.is_truthy())),
        (UnaryOp::Neg, Value::Int(n)) => Ok(n
            .checked_neg()
            .map_or(Value::Float(-(n as f64)), Value::Int)),
        (UnaryOp::Neg, Value::Float(x)) => Ok(Value::Float(-x)),
        (UnaryOp::Plus, v @ (Value::Int(_) | Value::Float(_))) => Ok(v),
        (_, v) => Err(RuntimeError::type_error("number", v.type_name())),
    }
}

/// Evaluate a binary operation on already-evaluated operands
pub fn eval_binary(op: BinaryOp, left: Value, right: Value) -> InterpResult<Value> {
    match op {
        BinaryOp::Add => {
            if matches!(left, Value::Str(_)) || matches!(right, Value::Str(_)) {
                let mut text = left.to_text();
                text.push_str(&right.to_text());
                return Ok(Value::Str(text));
            }
            arith(&left, &right, i64::checked_add, |a, b| a + b)
        }
        BinaryOp::Sub => arith(&left, &right, i64::checked_sub, |a, b| a - b),
        BinaryOp::Mul => arith(&left, &right, i64::checked_mul, |a, b| a * b),
        BinaryOp::Div => Ok(Value::Float(to_number(&left)? / to_number(&right)?)),
        BinaryOp::IntDiv => {
            let a = to_int_trunc(&left)?;
            let b = to_int_trunc(&right)?;
            if b == 0 {
                return Err(RuntimeError::division_by_zero());
            }
            Ok(Value::Int(a.wrapping_div(b)))
        }
        BinaryOp::Mod => match (&left, &right) {
            (Value::Int(a), Value::Int(b)) => {
                if *b == 0 {
                    return Err(RuntimeError::modulo_by_zero());
                }
                Ok(Value::Int(a.wrapping_rem(*b)))
            }
            _ => {
                let a = to_number(&left)?;
                let b = to_number(&right)?;
                if b == 0.0 {
                    return Err(RuntimeError::modulo_by_zero());
                }
                Ok(Value::Float(a % b))
            }
        },
        BinaryOp::Pow => match (&left, &right) {
            (Value::Int(a), Value::Int(b)) => {
                let int_pow = u32::try_from(*b).ok().and_then(|exp| a.checked_pow(exp));
                Ok(int_pow.map_or_else(|| Value::Float((*a as f64).powf(*b as f64)), Value::Int))
            }
            _ => Ok(Value::Float(to_number(&left)?.powf(to_number(&right)?))),
        },
        BinaryOp::Eq
        | BinaryOp::Ne
        | BinaryOp::Lt
        | BinaryOp::Le
        | BinaryOp::Gt
        | BinaryOp::Ge => Ok(Value::Bool(compare_op(op, compare_values(&left, &right)))),
        BinaryOp::And => Ok(Value::Bool(left.is_truthy() && right.is_truthy())),
        BinaryOp::Or => Ok(Value::Bool(left.is_truthy() || right.is_truthy())),
        BinaryOp::Xor => Ok(Value::Bool(left.is_truthy() != right.is_truthy())),
    }
}

fn arith(
    left: &Value,
    right: &Value,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> InterpResult<Value> {
    if let (Value::Int(a), Value::Int(b)) = (left, right) {
        if let Some(n) = int_op(*a, *b) {
            return Ok(Value::Int(n));
        }
    }
    Ok(Value::Float(float_op(to_number(left)?, to_number(right)?)))
}

/// Three-way compare used by `= <> < <= > >=`, SELECT CASE and MATCH.
///
/// Numbers compare numerically; if either side is a string both sides are
/// compared as rendered text. Other mixed kinds order by kind. `None` means
/// two distinct arrays or maps, in which case only `<>` holds.
pub fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (a, b) if a.is_numeric() && b.is_numeric() => {
            a.as_float()?.partial_cmp(&b.as_float()?)
        }
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        (Value::Str(_), other) | (other, Value::Str(_))
            if matches!(other, Value::Int(_) | Value::Float(_) | Value::Bool(_)) =>
        {
            Some(left.to_text().cmp(&right.to_text()))
        }
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Nil, Value::Nil) => Some(Ordering::Equal),
        (Value::Array(_), Value::Array(_)) | (Value::Map(_), Value::Map(_)) => {
            (left == right).then_some(Ordering::Equal)
        }
        _ => Some(type_rank(left).cmp(&type_rank(right))),
    }
}

/// Cross-kind ordering; kinds of different rank are never equal
fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Nil => 0,
        Value::Bool(_) => 1,
        Value::Int(_) | Value::Float(_) => 2,
        Value::Str(_) => 3,
        Value::Array(_) => 4,
        Value::Map(_) => 5,
    }
}

/// Apply a comparison operator to a three-way compare result
pub(crate) fn compare_op(op: BinaryOp, ordering: Option<Ordering>) -> bool {
    match (op, ordering) {
        (BinaryOp::Ne, None) => true,
        (_, None) => false,
        (BinaryOp::Eq, Some(o)) => o == Ordering::Equal,
        (BinaryOp::Ne, Some(o)) => o != Ordering::Equal,
        (BinaryOp::Lt, Some(o)) => o == Ordering::Less,
        (BinaryOp::Le, Some(o)) => o != Ordering::Greater,
        (BinaryOp::Gt, Some(o)) => o == Ordering::Greater,
        (BinaryOp::Ge, Some(o)) => o != Ordering::Less,
        _ => false,
    }
}

pub(crate) fn values_equal(left: &Value, right: &Value) -> bool {
    compare_values(left, right) == Some(Ordering::Equal)
}

// ============================================================================
// Indexing, ranges and patterns
// ============================================================================

/// Non-negative integral index
pub(crate) fn index_position(index: &Value) -> Option<usize> {
    match index {
        Value::Int(n) => usize::try_from(*n).ok(),
        Value::Float(x) if *x >= 0.0 && x.is_finite() => Some(x.trunc() as usize),
        _ => None,
    }
}

/// `target[index]`; never fails, misses are NIL
pub fn index_value(target: &Value, index: &Value) -> Value {
    match target {
        Value::Array(items) => index_position(index)
            .and_then(|i| items.get(i))
            .cloned()
            .unwrap_or(Value::Nil),
        Value::Str(s) => index_position(index)
            .and_then(|i| s.chars().nth(i))
            .map_or(Value::Nil, |c| Value::Str(c.to_string())),
        Value::Map(map) => map_lookup(map, &index.to_text())
            .cloned()
            .unwrap_or(Value::Nil),
        _ => Value::Nil,
    }
}

/// Eagerly materialize `start..end`, inclusive, in either direction
pub fn make_range(start: &Value, end: &Value, max_elements: usize) -> InterpResult<Value> {
    if let (Value::Str(a), Value::Str(b)) = (start, end) {
        let (mut ac, mut bc) = (a.chars(), b.chars());
        return match (ac.next(), ac.next(), bc.next(), bc.next()) {
            (Some(a), None, Some(b), None) => {
                let chars: Vec<Value> = if a <= b {
                    (a..=b).map(|c| Value::Str(c.to_string())).collect()
                } else {
                    (b..=a).rev().map(|c| Value::Str(c.to_string())).collect()
                };
                Ok(Value::Array(chars))
            }
            _ => Err(RuntimeError::type_error("single-character range bounds", "STRING")),
        };
    }

    let a = to_int_trunc(start)?;
    let b = to_int_trunc(end)?;
    let count = a.abs_diff(b).saturating_add(1);
    if count > max_elements as u64 {
        return Err(RuntimeError::allocation_too_large(
            "Range",
            &[a, b],
            usize::try_from(count).unwrap_or(usize::MAX),
        ));
    }
    let items: Vec<Value> = if a <= b {
        (a..=b).map(Value::Int).collect()
    } else {
        (b..=a).rev().map(Value::Int).collect()
    };
    Ok(Value::Array(items))
}

/// MATCH arm test: equality, `{_type:"Range", start, end}` membership, or
/// array membership
pub(crate) fn pattern_matches(subject: &Value, pattern: &Value) -> bool {
    if values_equal(subject, pattern) {
        return true;
    }
    match pattern {
        Value::Map(map) if pattern.type_tag() == Some("Range") => {
            match (map_lookup(map, "START"), map_lookup(map, "END")) {
                (Some(start), Some(end)) => {
                    compare_op(BinaryOp::Ge, compare_values(subject, start))
                        && compare_op(BinaryOp::Le, compare_values(subject, end))
                }
                _ => false,
            }
        }
        Value::Array(items) => items.iter().any(|item| values_equal(subject, item)),
        _ => false,
    }
}

/// Kind check used by debug-mode return type warnings
pub(crate) fn matches_declared_type(value: &Value, type_name: &str) -> bool {
    match type_name {
        "INTEGER" | "INT" | "LONG" => matches!(value, Value::Int(_)),
        "DOUBLE" | "SINGLE" | "FLOAT" | "NUMBER" => value.is_numeric(),
        "STRING" => matches!(value, Value::Str(_)),
        "BOOLEAN" | "BOOL" => matches!(value, Value::Bool(_)),
        "ARRAY" => matches!(value, Value::Array(_)),
        "MAP" | "OBJECT" => matches!(value, Value::Map(_)),
        "ANY" | "VARIANT" => true,
        other => value.is_nil()
            || value
                .type_tag()
                .is_some_and(|tag| tag.eq_ignore_ascii_case(other)),
    }
}
