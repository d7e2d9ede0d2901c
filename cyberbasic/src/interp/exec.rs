//! Statement executor
//!
//! Every statement yields a [`ControlFlow`]. Loop handlers classify the
//! body's flow with [`LoopStep::classify`]; call frames consume the
//! function-level signals in `call.rs`.

use super::env::{child_env, EnvRef};
use super::error::{InterpResult, RuntimeError};
use super::eval::{
    compare_op, compare_values, eval_binary, index_position, index_value, to_int_trunc, values_equal,
};
use super::eval::Interpreter;
use super::flow::{ControlFlow, EvalResult, LoopStep, Unwind};
use super::value::{find_key, map_lookup, normalize_key, Value, ValueMap};
use crate::ast::{BinaryOp, CaseBranch, CaseTest, CatchClause, EnumMember, ExitTarget, Expr, Ident, Stmt};
use std::cmp::Ordering;

/// One step of a member-assignment lvalue below its root variable
enum Segment {
    Field(String),
    Index(Value),
}

impl<'h> Interpreter<'h> {
    /// Execute one statement; signals raised inside expressions surface as
    /// ordinary flows here
    pub(crate) fn exec(&mut self, stmt: &Stmt, env: &EnvRef) -> InterpResult<ControlFlow> {
        match self.exec_inner(stmt, env) {
            Ok(flow) | Err(Unwind::Signal(flow)) => Ok(flow),
            Err(Unwind::Fail(err)) => Err(err),
        }
    }

    /// Execute statements in order until one yields a non-normal flow
    pub(crate) fn exec_block(&mut self, body: &[Stmt], env: &EnvRef) -> InterpResult<ControlFlow> {
        for stmt in body {
            let flow = self.exec(stmt, env)?;
            if !flow.is_normal() {
                return Ok(flow);
            }
        }
        Ok(ControlFlow::Normal)
    }

    fn exec_inner(&mut self, stmt: &Stmt, env: &EnvRef) -> EvalResult<ControlFlow> {
        match stmt {
            Stmt::OptionExplicit => env.borrow_mut().set_strict(true),

            Stmt::Local(bindings) => {
                for binding in bindings {
                    let value = match &binding.value {
                        Some(expr) => self.eval(expr, env)?,
                        None => Value::Nil,
                    };
                    env.borrow_mut().define_local(binding.name.as_str(), value)?;
                }
            }

            Stmt::Global(names) => {
                let mut scope = env.borrow_mut();
                for name in names {
                    scope.add_global(name.as_str());
                }
            }

            Stmt::Let { name, value } => {
                let value = self.eval(value, env)?;
                env.borrow_mut().define(name.as_str(), value)?;
            }

            Stmt::Assign { name, value } => {
                let value = self.eval(value, env)?;
                env.borrow_mut().set(name.as_str(), value)?;
            }

            Stmt::Const { name, value } => {
                let value = self.eval(value, env)?;
                env.borrow_mut().define_const(name.as_str(), value)?;
            }

            Stmt::AssignIndex {
                name,
                indices,
                value,
            } => self.exec_assign_index(name, indices, value, env)?,

            Stmt::AssignMember {
                object,
                member,
                value,
            } => self.exec_assign_member(object, member, value, env)?,

            Stmt::Destructure { names, value } => {
                let value = self.eval(value, env)?;
                let mut scope = env.borrow_mut();
                match value {
                    Value::Array(items) => {
                        for (name, item) in names.iter().zip(items) {
                            scope.define(name.as_str(), item)?;
                        }
                    }
                    Value::Map(map) => {
                        for name in names {
                            let item = map_lookup(&map, name.as_str()).cloned().unwrap_or_default();
                            scope.define(name.as_str(), item)?;
                        }
                    }
                    other => return Err(RuntimeError::type_error("array or map", other.type_name()).into()),
                }
            }

            Stmt::Print(expr) => {
                let value = self.eval(expr, env)?;
                self.host.functions.call("PRINT", &[value])?;
            }

            Stmt::Expr(expr) => {
                self.eval(expr, env)?;
            }

            Stmt::Call { name, args, named } => {
                let args = self.eval_list(args, env)?;
                let named = self.eval_named(named, env)?;
                self.dispatch(name.as_str(), args, &named, env, true)?;
            }

            Stmt::If { branches, else_body } => {
                for branch in branches {
                    if self.eval(&branch.cond, env)?.is_truthy() {
                        return Ok(self.exec_block(&branch.body, env)?);
                    }
                }
                if let Some(body) = else_body {
                    return Ok(self.exec_block(body, env)?);
                }
            }

            Stmt::While { cond, body } => {
                while self.eval(cond, env)?.is_truthy() {
                    match LoopStep::classify(self.exec_block(body, env)?, ExitTarget::While) {
                        LoopStep::Next => {}
                        LoopStep::Leave => break,
                        LoopStep::Propagate(flow) => return Ok(flow),
                    }
                }
            }

            Stmt::For {
                var,
                start,
                end,
                step,
                body,
            } => return self.exec_for(var, start, end, step.as_ref(), body, env),

            Stmt::ForEach {
                var,
                collection,
                body,
            } => {
                let items = match self.eval(collection, env)? {
                    Value::Array(items) => items,
                    Value::Map(map) => map
                        .into_iter()
                        .map(|(key, value)| Value::map_from([("KEY", Value::Str(key)), ("VALUE", value)]))
                        .collect(),
                    _ => Vec::new(),
                };
                for item in items {
                    env.borrow_mut().define(var.as_str(), item)?;
                    match LoopStep::classify(self.exec_block(body, env)?, ExitTarget::For) {
                        LoopStep::Next => {}
                        LoopStep::Leave => break,
                        LoopStep::Propagate(flow) => return Ok(flow),
                    }
                }
            }

            Stmt::Do { body } => loop {
                match LoopStep::classify(self.exec_block(body, env)?, ExitTarget::Do) {
                    LoopStep::Next => {}
                    LoopStep::Leave => break,
                    LoopStep::Propagate(flow) => return Ok(flow),
                }
            },

            // Post-test: CONTINUE still evaluates the condition
            Stmt::Repeat { body, until } => loop {
                match LoopStep::classify(self.exec_block(body, env)?, ExitTarget::Repeat) {
                    LoopStep::Next => {}
                    LoopStep::Leave => break,
                    LoopStep::Propagate(flow) => return Ok(flow),
                }
                if self.eval(until, env)?.is_truthy() {
                    break;
                }
            },

            Stmt::SelectCase { selector, branches } => return self.exec_select(selector, branches, env),

            Stmt::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval(expr, env)?,
                    None => Value::Nil,
                };
                return Ok(ControlFlow::Return(value));
            }
            Stmt::Break => return Ok(ControlFlow::Break),
            Stmt::Continue => return Ok(ControlFlow::Continue),
            Stmt::Exit(target) => return Ok(ControlFlow::Exit(*target)),

            Stmt::Dim { name, sizes } => {
                let sizes = self.eval_sizes(sizes, env)?;
                self.check_allocation("DIM", &sizes)?;
                let array = reshape(None, &to_lengths(&sizes));
                env.borrow_mut().define(name.as_str(), array)?;
            }

            Stmt::Redim {
                name,
                sizes,
                preserve,
            } => {
                if env.borrow().is_const(name.as_str()) {
                    return Err(RuntimeError::const_assignment(name.as_str()).into());
                }
                let sizes = self.eval_sizes(sizes, env)?;
                let what = if *preserve { "REDIM PRESERVE" } else { "REDIM" };
                if self.config.debug {
                    self.diagnostics
                        .emit(&format!("[REDIM] {name} sizes=[{}]", join_sizes(&sizes)));
                }
                self.check_allocation(what, &sizes)?;
                let old = if *preserve {
                    env.borrow().lookup(name.as_str())
                } else {
                    None
                };
                let array = reshape(old.as_ref(), &to_lengths(&sizes));
                env.borrow_mut().set(name.as_str(), array)?;
            }

            // Collected by `load` before execution
            Stmt::Sub(_) | Stmt::Function(_) => {}

            Stmt::Type(decl) => {
                if !self.types.has_type(decl.name.as_str()) {
                    self.load_type(decl);
                }
            }

            Stmt::Enum { name, members } => self.exec_enum(name, members, env)?,

            Stmt::Try {
                body,
                catch,
                finally,
            } => return self.exec_try(body, catch.as_ref(), finally.as_deref(), env),

            Stmt::Throw(expr) => {
                let value = self.eval(expr, env)?;
                let message = match &value {
                    Value::Str(s) => s.clone(),
                    Value::Map(map) => map_lookup(map, "MESSAGE")
                        .map(Value::to_text)
                        .unwrap_or_else(|| "Error thrown".to_string()),
                    _ => "Error thrown".to_string(),
                };
                return Err(RuntimeError::thrown(message).into());
            }

            Stmt::Assert { cond, message } => {
                if !self.eval(cond, env)?.is_truthy() {
                    let message = match message {
                        Some(expr) => Some(self.eval(expr, env)?.to_text()),
                        None => None,
                    };
                    return Err(RuntimeError::assertion_failed(message.as_deref()).into());
                }
            }

            Stmt::Using {
                name,
                resource,
                body,
            } => {
                let resource = self.eval(resource, env)?;
                let scope = child_env(env);
                scope.borrow_mut().bind(name.as_str(), resource);
                return Ok(self.exec_block(body, &scope)?);
            }

            Stmt::DebugPrint(expr) => {
                if self.config.debug {
                    let value = self.eval(expr, env)?;
                    self.diagnostics.emit(&format!("[DEBUG] {value}"));
                }
            }

            Stmt::Breakpoint => {
                if self.config.debug {
                    let scope = env.borrow();
                    let mut names: Vec<_> = scope.bindings().iter().collect();
                    names.sort_by(|a, b| a.0.cmp(b.0));
                    let locals = names
                        .iter()
                        .map(|(name, value)| format!("{name}={value}"))
                        .collect::<Vec<_>>()
                        .join(", ");
                    self.diagnostics.emit(&format!("[BREAKPOINT] {locals}"));
                }
            }
        }
        Ok(ControlFlow::Normal)
    }

    /// `FOR var = start TO end STEP step`
    ///
    /// Bounds and step are evaluated once. The direction follows the sign of
    /// the step; the variable is re-read each iteration so the body may
    /// move it.
    fn exec_for(
        &mut self,
        var: &Ident,
        start: &Expr,
        end: &Expr,
        step: Option<&Expr>,
        body: &[Stmt],
        env: &EnvRef,
    ) -> EvalResult<ControlFlow> {
        let start = self.eval(start, env)?;
        let end = self.eval(end, env)?;
        let step = match step {
            Some(expr) => self.eval(expr, env)?,
            None => Value::Int(1),
        };
        if !step.is_numeric() {
            return Err(RuntimeError::type_error("numeric STEP", step.type_name()).into());
        }
        let ascending = compare_values(&step, &Value::Int(0)) != Some(Ordering::Less);

        let name = var.as_str();
        env.borrow_mut().define(name, start)?;
        loop {
            let current = env.borrow().get(name)?;
            let in_range = match compare_values(&current, &end) {
                Some(ordering) if ascending => ordering != Ordering::Greater,
                Some(ordering) => ordering != Ordering::Less,
                None => false,
            };
            if !in_range {
                break;
            }
            match LoopStep::classify(self.exec_block(body, env)?, ExitTarget::For) {
                LoopStep::Next => {}
                LoopStep::Leave => break,
                LoopStep::Propagate(flow) => return Ok(flow),
            }
            let current = env.borrow().get(name)?;
            let next = eval_binary(BinaryOp::Add, current, step.clone())?;
            env.borrow_mut().set(name, next)?;
        }
        Ok(ControlFlow::Normal)
    }

    /// Selector evaluated once; ELSE only runs when no other branch matched
    fn exec_select(&mut self, selector: &Expr, branches: &[CaseBranch], env: &EnvRef) -> EvalResult<ControlFlow> {
        let selector = self.eval(selector, env)?;
        for branch in branches {
            let matched = match &branch.test {
                CaseTest::Else => false,
                CaseTest::Values(values) => {
                    let mut matched = false;
                    for expr in values {
                        if values_equal(&selector, &self.eval(expr, env)?) {
                            matched = true;
                            break;
                        }
                    }
                    matched
                }
                CaseTest::Relational { op, value } => {
                    let value = self.eval(value, env)?;
                    compare_op(*op, compare_values(&selector, &value))
                }
            };
            if matched {
                return Ok(self.exec_block(&branch.body, env)?);
            }
        }
        match branches.iter().find(|b| matches!(b.test, CaseTest::Else)) {
            Some(branch) => Ok(self.exec_block(&branch.body, env)?),
            None => Ok(ControlFlow::Normal),
        }
    }

    /// TRY catches runtime failures only; signals pass through, FINALLY runs
    /// on every path and a non-normal FINALLY flow wins
    fn exec_try(
        &mut self,
        body: &[Stmt],
        catch: Option<&CatchClause>,
        finally: Option<&[Stmt]>,
        env: &EnvRef,
    ) -> EvalResult<ControlFlow> {
        let outcome = match (self.exec_block(body, env), catch) {
            (Err(err), Some(clause)) => {
                tracing::debug!(kind = err.kind.name(), "caught runtime failure");
                if let Some(var) = &clause.var {
                    let error = Value::typed_map(
                        "Error",
                        [
                            ("MESSAGE", Value::Str(err.message)),
                            ("KIND", Value::from(err.kind.name())),
                        ],
                    );
                    env.borrow_mut().bind(var.as_str(), error);
                }
                self.exec_block(&clause.body, env)
            }
            (outcome, _) => outcome,
        };
        if let Some(finally) = finally {
            let flow = self.exec_block(finally, env)?;
            if !flow.is_normal() {
                return Ok(flow);
            }
        }
        Ok(outcome?)
    }

    fn exec_enum(&mut self, name: &Ident, members: &[EnumMember], env: &EnvRef) -> EvalResult<()> {
        let mut next = 0i64;
        for member in members {
            let value = match &member.value {
                Some(expr) => self.eval(expr, env)?,
                None => Value::Int(next),
            };
            next = match &value {
                Value::Int(n) => n.saturating_add(1),
                _ => next.saturating_add(1),
            };
            env.borrow_mut()
                .define_const(&format!("{name}_{}", member.name), value)?;
        }
        Ok(())
    }

    /// `name(i, j) = value`
    fn exec_assign_index(&mut self, name: &Ident, indices: &[Expr], value: &Expr, env: &EnvRef) -> EvalResult<()> {
        if env.borrow().is_const(name.as_str()) {
            return Err(RuntimeError::const_assignment(name.as_str()).into());
        }
        let mut keys = Vec::with_capacity(indices.len());
        for index in indices {
            keys.push(self.eval(index, env)?);
        }
        let value = self.eval(value, env)?;
        let current = env.borrow().lookup(name.as_str()).unwrap_or_default();
        let updated = write_path(current, &keys, value, self.config.max_array_elements)?;
        env.borrow_mut().set(name.as_str(), updated)?;
        Ok(())
    }

    /// `object.member = value`
    ///
    /// Index expressions along the target path run exactly once; the same
    /// evaluated path feeds both the hook check and the write-back.
    fn exec_assign_member(&mut self, object: &Expr, member: &Ident, value: &Expr, env: &EnvRef) -> EvalResult<()> {
        let value = self.eval(value, env)?;
        let lvalue = match lvalue_path(object) {
            Some((root, path)) => Some((root, self.eval_segments(path, env)?)),
            None => None,
        };

        if !self.host.hooks.is_empty() {
            let target = match &lvalue {
                Some((root, segments)) => {
                    let base = self.eval_receiver(&Expr::Var((*root).clone()), env)?;
                    self.follow_segments(base, segments)
                }
                None => self.eval_receiver(object, env)?,
            };
            if self.host.hooks.try_assign_member(&target, member.as_str(), &value) {
                return Ok(());
            }
        }

        let Some((root, segments)) = lvalue else {
            // Not assignable (call result, literal): nothing to write back
            return Ok(());
        };
        if env.borrow().is_const(root.as_str()) {
            return Err(RuntimeError::const_assignment(root.as_str()).into());
        }
        let current = env.borrow().lookup(root.as_str()).unwrap_or_default();
        let updated = assign_segments(current, &segments, member.as_str(), value);
        env.borrow_mut().set(root.as_str(), updated)?;
        Ok(())
    }

    fn eval_segments(&mut self, path: Vec<PathStep<'_>>, env: &EnvRef) -> EvalResult<Vec<Segment>> {
        let mut segments = Vec::with_capacity(path.len());
        for step in path {
            segments.push(match step {
                PathStep::Field(name) => Segment::Field(name.as_str().to_string()),
                PathStep::Index(expr) => Segment::Index(self.eval(expr, env)?),
            });
        }
        Ok(segments)
    }

    /// Read the value an evaluated path points at, as member access would
    fn follow_segments(&self, mut value: Value, segments: &[Segment]) -> Value {
        for segment in segments {
            value = match segment {
                Segment::Field(name) => self.resolve_member(&value, name, false),
                Segment::Index(index) => index_value(&value, index),
            };
        }
        value
    }

    /// Evaluate DIM/REDIM sizes once; negative sizes clamp to zero
    fn eval_sizes(&mut self, sizes: &[Expr], env: &EnvRef) -> EvalResult<Vec<i64>> {
        let mut out = Vec::with_capacity(sizes.len());
        for size in sizes {
            let value = self.eval(size, env)?;
            out.push(to_int_trunc(&value)?.max(0));
        }
        Ok(out)
    }

    /// Reject shapes whose element count, or the number of nested arrays
    /// built to hold them, exceeds the cap
    fn check_allocation(&self, what: &str, sizes: &[i64]) -> InterpResult<()> {
        let total = allocated_slots(sizes);
        if total > self.config.max_array_elements {
            return Err(RuntimeError::allocation_too_large(what, sizes, total));
        }
        Ok(())
    }
}

/// Unevaluated lvalue step
enum PathStep<'a> {
    Field(&'a Ident),
    Index(&'a Expr),
}

/// Root variable and steps of an assignable member target
fn lvalue_path(expr: &Expr) -> Option<(&Ident, Vec<PathStep<'_>>)> {
    match expr {
        Expr::Var(name) => Some((name, Vec::new())),
        Expr::Member { object, member } => {
            let (root, mut path) = lvalue_path(object)?;
            path.push(PathStep::Field(member));
            Some((root, path))
        }
        Expr::Index { target, indices } => {
            let (root, mut path) = lvalue_path(target)?;
            path.extend(indices.iter().map(PathStep::Index));
            Some((root, path))
        }
        _ => None,
    }
}

/// Stored key for `name`: an existing case-insensitive match, else normalized
fn field_key(map: &ValueMap, name: &str) -> String {
    find_key(map, name)
        .map(str::to_string)
        .unwrap_or_else(|| normalize_key(name))
}

fn assign_segments(target: Value, segments: &[Segment], member: &str, value: Value) -> Value {
    let Some((first, rest)) = segments.split_first() else {
        return set_field(target, member, value);
    };
    match (first, target) {
        (Segment::Field(name), target) => {
            let mut map = match target {
                Value::Map(map) => map,
                _ => ValueMap::new(),
            };
            let key = field_key(&map, name);
            let child = map.remove(&key).unwrap_or_default();
            map.insert(key, assign_segments(child, rest, member, value));
            Value::Map(map)
        }
        (Segment::Index(index), Value::Map(mut map)) => {
            let key = field_key(&map, &index.to_text());
            let child = map.remove(&key).unwrap_or_default();
            map.insert(key, assign_segments(child, rest, member, value));
            Value::Map(map)
        }
        (Segment::Index(index), Value::Array(mut items)) => {
            if let Some(slot) = index_position(index).and_then(|i| items.get_mut(i)) {
                let child = std::mem::take(slot);
                *slot = assign_segments(child, rest, member, value);
            }
            Value::Array(items)
        }
        // Indexing anything else cannot reach a field
        (Segment::Index(_), other) => other,
    }
}

/// Write `member` (possibly dotted) into a map, replacing a non-map target
fn set_field(target: Value, member: &str, value: Value) -> Value {
    let mut map = match target {
        Value::Map(map) => map,
        _ => ValueMap::new(),
    };
    match member.split_once('.') {
        Some((head, tail)) => {
            let key = field_key(&map, head);
            let child = map.remove(&key).unwrap_or_default();
            map.insert(key, set_field(child, tail, value));
        }
        None => {
            let key = field_key(&map, member);
            map.insert(key, value);
        }
    }
    Value::Map(map)
}

/// Write `value` at `indices` below `target`, growing arrays as needed
///
/// Negative or non-numeric array indices leave the target untouched. A map
/// level is addressed by the index's text.
fn write_path(target: Value, indices: &[Value], value: Value, max_elements: usize) -> InterpResult<Value> {
    let Some((first, rest)) = indices.split_first() else {
        return Ok(value);
    };
    if let Value::Map(mut map) = target {
        let key = field_key(&map, &first.to_text());
        let child = map.remove(&key).unwrap_or_default();
        map.insert(key, write_path(child, rest, value, max_elements)?);
        return Ok(Value::Map(map));
    }

    let Some(i) = index_position(first) else {
        return Ok(target);
    };
    let mut items = match target {
        Value::Array(items) => items,
        _ => Vec::new(),
    };
    if i >= items.len() {
        let needed = i.saturating_add(1);
        if needed > max_elements {
            return Err(RuntimeError::allocation_too_large(
                "Indexed assignment",
                &[i64::try_from(i).unwrap_or(i64::MAX)],
                needed,
            ));
        }
        items.resize(needed, Value::Nil);
    }
    let child = std::mem::take(&mut items[i]);
    // Intermediate levels are always arrays (or maps)
    let child = match (child, rest.is_empty()) {
        (child @ (Value::Array(_) | Value::Map(_)), false) => child,
        (_, false) => Value::Array(Vec::new()),
        (child, true) => child,
    };
    items[i] = write_path(child, rest, value, max_elements)?;
    Ok(Value::Array(items))
}

/// Larger of the element product and the running sum of the leading
/// prefix products (`n1 + n1*n2 + ...`), saturating
fn allocated_slots(sizes: &[i64]) -> usize {
    let Some((_, leading)) = sizes.split_last() else {
        return 0;
    };
    let dim = |n: i64| usize::try_from(n).unwrap_or(usize::MAX);
    let product = sizes.iter().fold(1usize, |acc, &n| acc.saturating_mul(dim(n)));
    let mut prefix = 1usize;
    let mut containers = 0usize;
    for &n in leading {
        prefix = prefix.saturating_mul(dim(n));
        containers = containers.saturating_add(prefix);
    }
    product.max(containers)
}

fn to_lengths(sizes: &[i64]) -> Vec<usize> {
    sizes.iter().map(|&n| usize::try_from(n).unwrap_or(0)).collect()
}

fn join_sizes(sizes: &[i64]) -> String {
    sizes.iter().map(i64::to_string).collect::<Vec<_>>().join(",")
}

/// Build a NIL-filled array of shape `sizes`, copying the overlap with `old`
/// dimension by dimension
fn reshape(old: Option<&Value>, sizes: &[usize]) -> Value {
    let Some((&len, rest)) = sizes.split_first() else {
        return Value::Array(Vec::new());
    };
    let old_items = old.and_then(Value::as_array);
    let items = (0..len)
        .map(|i| {
            let prev = old_items.and_then(|items| items.get(i));
            if rest.is_empty() {
                prev.cloned().unwrap_or_default()
            } else {
                reshape(prev, rest)
            }
        })
        .collect();
    Value::Array(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{CatchClause, IfBranch, LocalBinding, Program};
    use crate::config::InterpreterConfig;
    use crate::interp::{Diagnostics, ErrorKind};
    use crate::runtime::Host;

    fn run(statements: Vec<Stmt>) -> (InterpResult<()>, Host) {
        let host = Host::new();
        let result = {
            let mut interp = Interpreter::new(&host).with_diagnostics(Diagnostics::Silent);
            interp.run(&Program::new(statements))
        };
        (result, host)
    }

    fn run_and_read(statements: Vec<Stmt>, names: &[&str]) -> Vec<Value> {
        let host = Host::new();
        let mut interp = Interpreter::new(&host).with_diagnostics(Diagnostics::Silent);
        interp.run(&Program::new(statements)).unwrap();
        names
            .iter()
            .map(|name| interp.global(name).unwrap_or_default())
            .collect()
    }

    fn add(l: Expr, r: Expr) -> Expr {
        Expr::binary(BinaryOp::Add, l, r)
    }

    fn ints(values: &[i64]) -> Value {
        Value::Array(values.iter().copied().map(Value::Int).collect())
    }

    fn push(list: &str, item: Expr) -> Stmt {
        Stmt::assign(
            list,
            Expr::Array(vec![Expr::Spread(Box::new(Expr::var(list))), item]),
        )
    }

    // ========================================================================
    // Declarations and strict mode
    // ========================================================================

    #[test]
    fn test_option_explicit_read_and_write() {
        let (result, _) = run(vec![Stmt::OptionExplicit, Stmt::Print(Expr::var("x"))]);
        assert_eq!(result.unwrap_err().kind, ErrorKind::UndeclaredVariable);

        let (result, _) = run(vec![Stmt::OptionExplicit, Stmt::assign("x", Expr::int(1))]);
        assert_eq!(result.unwrap_err().kind, ErrorKind::UndeclaredAssignment);

        let got = run_and_read(
            vec![
                Stmt::OptionExplicit,
                Stmt::local("x", None),
                Stmt::assign("x", Expr::int(1)),
            ],
            &["x"],
        );
        assert_eq!(got, vec![Value::Int(1)]);
    }

    #[test]
    fn test_unset_names_read_as_nil_without_strict() {
        let got = run_and_read(
            vec![
                Stmt::assign("y", Expr::var("x")),
                Stmt::assign("z", add(Expr::str("v"), Expr::var("x"))),
            ],
            &["y", "z"],
        );
        assert_eq!(got, vec![Value::Nil, Value::from("v")]);
    }

    #[test]
    fn test_const_rejects_later_let() {
        let (result, _) = run(vec![
            Stmt::constant("limit", Expr::int(3)),
            Stmt::let_("limit", Expr::int(4)),
        ]);
        assert_eq!(result.unwrap_err().kind, ErrorKind::ConstAssignment);

        let (result, _) = run(vec![
            Stmt::constant("limit", Expr::int(3)),
            Stmt::while_(Expr::Bool(true), vec![Stmt::assign("limit", Expr::int(4))]),
        ]);
        assert_eq!(result.unwrap_err().kind, ErrorKind::ConstAssignment);
    }

    #[test]
    fn test_local_multiple_bindings() {
        let got = run_and_read(
            vec![Stmt::Local(vec![
                LocalBinding {
                    name: Ident::new("a"),
                    value: Some(Expr::int(1)),
                },
                LocalBinding {
                    name: Ident::new("b"),
                    value: None,
                },
            ])],
            &["a", "b"],
        );
        assert_eq!(got, vec![Value::Int(1), Value::Nil]);
    }

    // ========================================================================
    // Loops
    // ========================================================================

    #[test]
    fn test_for_step_both_directions() {
        let got = run_and_read(
            vec![
                Stmt::let_("up", Expr::Array(vec![])),
                Stmt::for_("i", Expr::int(1), Expr::int(5), Some(Expr::int(2)), vec![push("up", Expr::var("i"))]),
                Stmt::let_("down", Expr::Array(vec![])),
                Stmt::for_(
                    "i",
                    Expr::int(5),
                    Expr::int(1),
                    Some(Expr::int(-2)),
                    vec![push("down", Expr::var("i"))],
                ),
            ],
            &["up", "down"],
        );
        assert_eq!(got, vec![ints(&[1, 3, 5]), ints(&[5, 3, 1])]);
    }

    #[test]
    fn test_for_empty_range_runs_zero_times() {
        let got = run_and_read(
            vec![
                Stmt::let_("n", Expr::int(0)),
                Stmt::for_("i", Expr::int(5), Expr::int(1), None, vec![Stmt::assign("n", Expr::int(1))]),
            ],
            &["n"],
        );
        assert_eq!(got, vec![Value::Int(0)]);
    }

    #[test]
    fn test_break_in_for_inside_while() {
        // WHILE runs twice; the FOR body breaks at i = 2 each time
        let got = run_and_read(
            vec![
                Stmt::let_("outer", Expr::int(0)),
                Stmt::let_("seen", Expr::Array(vec![])),
                Stmt::while_(
                    Expr::binary(BinaryOp::Lt, Expr::var("outer"), Expr::int(2)),
                    vec![
                        Stmt::assign("outer", add(Expr::var("outer"), Expr::int(1))),
                        Stmt::for_(
                            "i",
                            Expr::int(1),
                            Expr::int(10),
                            None,
                            vec![
                                Stmt::if_(
                                    Expr::binary(BinaryOp::Eq, Expr::var("i"), Expr::int(2)),
                                    vec![Stmt::Break],
                                    None,
                                ),
                                push("seen", Expr::var("i")),
                            ],
                        ),
                    ],
                ),
            ],
            &["outer", "seen"],
        );
        assert_eq!(got, vec![Value::Int(2), ints(&[1, 1])]);
    }

    #[test]
    fn test_exit_while_from_nested_for() {
        let got = run_and_read(
            vec![
                Stmt::let_("count", Expr::int(0)),
                Stmt::while_(
                    Expr::Bool(true),
                    vec![Stmt::for_(
                        "i",
                        Expr::int(1),
                        Expr::int(10),
                        None,
                        vec![
                            Stmt::assign("count", add(Expr::var("count"), Expr::int(1))),
                            Stmt::if_(
                                Expr::binary(BinaryOp::Eq, Expr::var("i"), Expr::int(3)),
                                vec![Stmt::Exit(ExitTarget::While)],
                                None,
                            ),
                        ],
                    )],
                ),
            ],
            &["count"],
        );
        assert_eq!(got, vec![Value::Int(3)]);
    }

    #[test]
    fn test_continue_skips_rest_of_body() {
        let got = run_and_read(
            vec![
                Stmt::let_("odd", Expr::Array(vec![])),
                Stmt::for_(
                    "i",
                    Expr::int(1),
                    Expr::int(6),
                    None,
                    vec![
                        Stmt::if_(
                            Expr::binary(
                                BinaryOp::Eq,
                                Expr::binary(BinaryOp::Mod, Expr::var("i"), Expr::int(2)),
                                Expr::int(0),
                            ),
                            vec![Stmt::Continue],
                            None,
                        ),
                        push("odd", Expr::var("i")),
                    ],
                ),
            ],
            &["odd"],
        );
        assert_eq!(got, vec![ints(&[1, 3, 5])]);
    }

    #[test]
    fn test_do_and_repeat() {
        let got = run_and_read(
            vec![
                Stmt::let_("n", Expr::int(0)),
                Stmt::Do {
                    body: vec![
                        Stmt::assign("n", add(Expr::var("n"), Expr::int(1))),
                        Stmt::if_(
                            Expr::binary(BinaryOp::Ge, Expr::var("n"), Expr::int(4)),
                            vec![Stmt::Exit(ExitTarget::Do)],
                            None,
                        ),
                    ],
                },
                Stmt::let_("m", Expr::int(10)),
                // Post-test: body runs once even though the condition holds
                Stmt::Repeat {
                    body: vec![Stmt::assign("m", add(Expr::var("m"), Expr::int(1)))],
                    until: Expr::Bool(true),
                },
            ],
            &["n", "m"],
        );
        assert_eq!(got, vec![Value::Int(4), Value::Int(11)]);
    }

    #[test]
    fn test_exit_loop_alias_leaves_do() {
        let exit: ExitTarget = "LOOP".parse().unwrap();
        let got = run_and_read(
            vec![
                Stmt::let_("n", Expr::int(0)),
                Stmt::Do {
                    body: vec![Stmt::assign("n", Expr::int(1)), Stmt::Exit(exit)],
                },
            ],
            &["n"],
        );
        assert_eq!(got, vec![Value::Int(1)]);
    }

    #[test]
    fn test_for_each_array_and_map() {
        let got = run_and_read(
            vec![
                Stmt::let_("total", Expr::int(0)),
                Stmt::ForEach {
                    var: Ident::new("v"),
                    collection: Expr::Array(vec![Expr::int(1), Expr::int(2), Expr::int(3)]),
                    body: vec![Stmt::assign("total", add(Expr::var("total"), Expr::var("v")))],
                },
                Stmt::let_("keys", Expr::str("")),
                Stmt::ForEach {
                    var: Ident::new("e"),
                    collection: Expr::map(vec![("b", Expr::int(2)), ("a", Expr::int(1))]),
                    body: vec![Stmt::assign(
                        "keys",
                        add(Expr::var("keys"), Expr::member(Expr::var("e"), "key")),
                    )],
                },
            ],
            &["total", "keys"],
        );
        assert_eq!(got, vec![Value::Int(6), Value::from("AB")]);
    }

    #[test]
    fn test_stray_break_at_top_level() {
        let (result, _) = run(vec![Stmt::Break]);
        assert_eq!(result.unwrap_err().kind, ErrorKind::InvalidControlFlow);
    }

    #[test]
    fn test_top_level_return_ends_program() {
        let got = run_and_read(
            vec![
                Stmt::let_("a", Expr::int(1)),
                Stmt::Return(None),
                Stmt::let_("a", Expr::int(2)),
            ],
            &["a"],
        );
        assert_eq!(got, vec![Value::Int(1)]);
    }

    // ========================================================================
    // IF / SELECT CASE
    // ========================================================================

    #[test]
    fn test_if_elseif_else() {
        let chain = |x: i64| Stmt::If {
            branches: vec![
                IfBranch {
                    cond: Expr::binary(BinaryOp::Lt, Expr::int(x), Expr::int(0)),
                    body: vec![Stmt::let_("r", Expr::str("neg"))],
                },
                IfBranch {
                    cond: Expr::binary(BinaryOp::Eq, Expr::int(x), Expr::int(0)),
                    body: vec![Stmt::let_("r", Expr::str("zero"))],
                },
            ],
            else_body: Some(vec![Stmt::let_("r", Expr::str("pos"))]),
        };
        for (x, expected) in [(-1, "neg"), (0, "zero"), (5, "pos")] {
            assert_eq!(run_and_read(vec![chain(x)], &["r"]), vec![Value::from(expected)]);
        }
    }

    fn select(x: Expr) -> Stmt {
        Stmt::SelectCase {
            selector: x,
            branches: vec![
                CaseBranch {
                    test: CaseTest::Else,
                    body: vec![Stmt::let_("r", Expr::str("other"))],
                },
                CaseBranch {
                    test: CaseTest::Values(vec![Expr::int(1), Expr::int(2)]),
                    body: vec![Stmt::let_("r", Expr::str("small"))],
                },
                CaseBranch {
                    test: CaseTest::Relational {
                        op: BinaryOp::Ge,
                        value: Expr::int(10),
                    },
                    body: vec![Stmt::let_("r", Expr::str("big"))],
                },
            ],
        }
    }

    #[test]
    fn test_select_case_else_runs_last() {
        assert_eq!(run_and_read(vec![select(Expr::int(2))], &["r"]), vec![Value::from("small")]);
        assert_eq!(run_and_read(vec![select(Expr::int(12))], &["r"]), vec![Value::from("big")]);
        assert_eq!(run_and_read(vec![select(Expr::int(5))], &["r"]), vec![Value::from("other")]);
    }

    // ========================================================================
    // Arrays
    // ========================================================================

    #[test]
    fn test_dim_multi_dimensional() {
        let got = run_and_read(vec![Stmt::dim("grid", vec![Expr::int(2), Expr::int(3)])], &["grid"]);
        let row = Value::Array(vec![Value::Nil; 3]);
        assert_eq!(got, vec![Value::Array(vec![row.clone(), row])]);
    }

    #[test]
    fn test_redim_preserve_grow_and_shrink() {
        let got = run_and_read(
            vec![
                Stmt::dim("a", vec![Expr::int(2), Expr::int(2)]),
                Stmt::assign_index("a", vec![Expr::int(0), Expr::int(0)], Expr::int(1)),
                Stmt::assign_index("a", vec![Expr::int(1), Expr::int(1)], Expr::int(4)),
                Stmt::redim("a", vec![Expr::int(3), Expr::int(3)], true),
                Stmt::let_("grown", Expr::var("a")),
                Stmt::redim("a", vec![Expr::int(1), Expr::int(1)], true),
                Stmt::let_("shrunk", Expr::var("a")),
                Stmt::redim("a", vec![Expr::int(2)], false),
            ],
            &["grown", "shrunk", "a"],
        );
        let nil = Value::Nil;
        assert_eq!(
            got[0],
            Value::Array(vec![
                Value::Array(vec![Value::Int(1), nil.clone(), nil.clone()]),
                Value::Array(vec![nil.clone(), Value::Int(4), nil.clone()]),
                Value::Array(vec![nil.clone(), nil.clone(), nil.clone()]),
            ])
        );
        assert_eq!(got[1], Value::Array(vec![Value::Array(vec![Value::Int(1)])]));
        assert_eq!(got[2], Value::Array(vec![nil.clone(), nil]));
    }

    #[test]
    fn test_dim_allocation_cap() {
        let host = Host::new();
        let mut interp = Interpreter::new(&host)
            .with_config(InterpreterConfig::default().with_max_array_elements(100))
            .with_diagnostics(Diagnostics::Silent);
        let err = interp
            .run(&Program::new(vec![Stmt::dim("big", vec![Expr::int(20), Expr::int(20)])]))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::AllocationTooLarge);
        assert_eq!(err.message, "DIM too large. sizes=[20,20] total(capped)=400");
    }

    #[test]
    fn test_dim_zero_dimension_counts_outer_slots() {
        let host = Host::new();
        let mut interp = Interpreter::new(&host)
            .with_config(InterpreterConfig::default().with_max_array_elements(10))
            .with_diagnostics(Diagnostics::Silent);
        let err = interp
            .run(&Program::new(vec![Stmt::dim("a", vec![Expr::int(1000), Expr::int(0)])]))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::AllocationTooLarge);
        assert_eq!(err.message, "DIM too large. sizes=[1000,0] total(capped)=1000");
        assert_eq!(interp.global("A"), None);

        let err = interp
            .run(&Program::new(vec![Stmt::redim("b", vec![Expr::int(4), Expr::int(4), Expr::int(0)], true)]))
            .unwrap_err();
        assert_eq!(err.message, "REDIM PRESERVE too large. sizes=[4,4,0] total(capped)=20");
    }

    #[test]
    fn test_allocated_slots() {
        assert_eq!(allocated_slots(&[]), 0);
        assert_eq!(allocated_slots(&[7]), 7);
        assert_eq!(allocated_slots(&[20, 20]), 400);
        assert_eq!(allocated_slots(&[3, 0]), 3);
        assert_eq!(allocated_slots(&[2, 3, 0]), 8);
        assert_eq!(allocated_slots(&[i64::MAX, i64::MAX, 0]), usize::MAX);
    }

    fn global_sub(body: Vec<Stmt>) -> Stmt {
        Stmt::Sub(crate::ast::SubDecl {
            name: Ident::new("s"),
            params: Vec::new(),
            body,
        })
    }

    #[test]
    fn test_let_writes_through_global() {
        let got = run_and_read(
            vec![
                Stmt::let_("total", Expr::int(0)),
                global_sub(vec![Stmt::global(&["total"]), Stmt::let_("total", Expr::int(5))]),
                Stmt::call("s", vec![]),
            ],
            &["TOTAL"],
        );
        assert_eq!(got, vec![Value::Int(5)]);
    }

    #[test]
    fn test_for_over_global_counter() {
        let got = run_and_read(
            vec![
                global_sub(vec![
                    Stmt::global(&["i", "n"]),
                    Stmt::for_(
                        "i",
                        Expr::int(1),
                        Expr::int(3),
                        None,
                        vec![Stmt::assign("n", add(Expr::var("n"), Expr::int(1)))],
                    ),
                ]),
                Stmt::assign("n", Expr::int(0)),
                Stmt::call("s", vec![]),
            ],
            &["I", "N"],
        );
        assert_eq!(got, vec![Value::Int(4), Value::Int(3)]);
    }

    #[test]
    fn test_for_each_and_dim_through_global() {
        let got = run_and_read(
            vec![
                global_sub(vec![
                    Stmt::global(&["last", "grid"]),
                    Stmt::ForEach {
                        var: Ident::new("last"),
                        collection: Expr::Array(vec![Expr::int(1), Expr::int(2)]),
                        body: vec![],
                    },
                    Stmt::dim("grid", vec![Expr::int(2)]),
                ]),
                Stmt::call("s", vec![]),
            ],
            &["LAST", "GRID"],
        );
        assert_eq!(got, vec![Value::Int(2), Value::Array(vec![Value::Nil, Value::Nil])]);
    }

    #[test]
    fn test_redim_const_fails() {
        let (result, _) = run(vec![
            Stmt::constant("a", Expr::Array(vec![])),
            Stmt::redim("a", vec![Expr::int(2)], false),
        ]);
        assert_eq!(result.unwrap_err().kind, ErrorKind::ConstAssignment);
    }

    #[test]
    fn test_index_assignment_grows() {
        let got = run_and_read(
            vec![
                Stmt::assign_index("a", vec![Expr::int(2)], Expr::str("x")),
                Stmt::assign_index("a", vec![Expr::int(-1)], Expr::str("ignored")),
                Stmt::assign_index("m", vec![Expr::int(1), Expr::int(1)], Expr::int(9)),
            ],
            &["a", "m"],
        );
        assert_eq!(got[0], Value::Array(vec![Value::Nil, Value::Nil, Value::from("x")]));
        assert_eq!(
            got[1],
            Value::Array(vec![Value::Nil, Value::Array(vec![Value::Nil, Value::Int(9)])])
        );
    }

    #[test]
    fn test_index_assignment_into_map() {
        let got = run_and_read(
            vec![
                Stmt::let_("m", Expr::map(vec![])),
                Stmt::assign_index("m", vec![Expr::str("hp")], Expr::int(3)),
            ],
            &["m"],
        );
        assert_eq!(got[0], Value::map_from([("HP", Value::Int(3))]));
    }

    #[test]
    fn test_index_assignment_growth_capped() {
        let err = write_path(Value::Nil, &[Value::Int(1000)], Value::Int(1), 10).unwrap_err();
        assert_eq!(err.kind, ErrorKind::AllocationTooLarge);
    }

    // ========================================================================
    // Member assignment
    // ========================================================================

    #[test]
    fn test_member_assignment_creates_nested_maps() {
        let got = run_and_read(
            vec![
                Stmt::let_("p", Expr::map(vec![("Name", Expr::str("a"))])),
                Stmt::assign_member(Expr::var("p"), "name", Expr::str("b")),
                Stmt::assign_member(Expr::member(Expr::var("p"), "pos"), "x", Expr::int(5)),
            ],
            &["p"],
        );
        let p = got[0].as_map().unwrap();
        assert_eq!(p.get("NAME"), Some(&Value::from("b")));
        assert_eq!(p.len(), 2);
        assert_eq!(p.get("POS"), Some(&Value::map_from([("X", Value::Int(5))])));
    }

    #[test]
    fn test_member_assignment_through_index() {
        let got = run_and_read(
            vec![
                Stmt::let_(
                    "list",
                    Expr::Array(vec![Expr::map(vec![("hp", Expr::int(1))])]),
                ),
                Stmt::assign_member(
                    Expr::index(Expr::var("list"), vec![Expr::int(0)]),
                    "hp",
                    Expr::int(2),
                ),
            ],
            &["list"],
        );
        assert_eq!(
            got[0],
            Value::Array(vec![Value::map_from([("HP", Value::Int(2))])])
        );
    }

    #[test]
    fn test_member_assignment_indices_run_once_with_hooks() {
        let mut host = Host::new();
        host.hooks.add_write_hook(|object, member, _| {
            object.type_tag() == Some("Sprite") && member == "X"
        });
        let next_slot = Stmt::Function(crate::ast::FunctionDecl {
            name: Ident::new("next_slot"),
            params: Vec::new(),
            return_type: None,
            body: vec![
                Stmt::global(&["calls"]),
                Stmt::assign("calls", add(Expr::var("calls"), Expr::int(1))),
                Stmt::Return(Some(Expr::int(0))),
            ],
        });
        let slot = || Expr::index(Expr::var("items"), vec![Expr::call("next_slot", vec![])]);

        let mut interp = Interpreter::new(&host).with_diagnostics(Diagnostics::Silent);
        interp
            .run(&Program::new(vec![
                next_slot,
                Stmt::let_("calls", Expr::int(0)),
                Stmt::let_("items", Expr::Array(vec![Expr::map(vec![])])),
                Stmt::assign_member(slot(), "name", Expr::str("a")),
                Stmt::let_("sprites", Expr::Array(vec![Expr::map(vec![("_type", Expr::str("Sprite"))])])),
                Stmt::assign_member(
                    Expr::index(Expr::var("sprites"), vec![Expr::call("next_slot", vec![])]),
                    "x",
                    Expr::int(9),
                ),
            ]))
            .unwrap();

        assert_eq!(interp.global("CALLS"), Some(Value::Int(2)));
        assert_eq!(
            interp.global("ITEMS"),
            Some(Value::Array(vec![Value::map_from([("NAME", Value::from("a"))])]))
        );
        // Intercepted by the hook: the sprite map is left as it was
        assert_eq!(
            interp.global("SPRITES"),
            Some(Value::Array(vec![Value::map_from([("_type", Value::from("Sprite"))])]))
        );
    }

    #[test]
    fn test_member_assignment_on_const_fails() {
        let (result, _) = run(vec![
            Stmt::constant("cfg", Expr::map(vec![])),
            Stmt::assign_member(Expr::var("cfg"), "x", Expr::int(1)),
        ]);
        assert_eq!(result.unwrap_err().kind, ErrorKind::ConstAssignment);
    }

    #[test]
    fn test_set_field_dotted() {
        let v = set_field(Value::Nil, "a.b", Value::Int(1));
        assert_eq!(
            v,
            Value::map_from([("A", Value::map_from([("B", Value::Int(1))]))])
        );
    }

    // ========================================================================
    // TRY / THROW / ASSERT
    // ========================================================================

    #[test]
    fn test_try_catch_binds_error() {
        let got = run_and_read(
            vec![Stmt::try_(
                vec![Stmt::Throw(Expr::str("boom"))],
                Some(CatchClause {
                    var: Some(Ident::new("e")),
                    body: vec![Stmt::assign("msg", Expr::member(Expr::var("e"), "message"))],
                }),
                None,
            )],
            &["msg"],
        );
        assert_eq!(got, vec![Value::from("boom")]);
    }

    #[test]
    fn test_finally_runs_before_repropagation() {
        let host = Host::new();
        let mut interp = Interpreter::new(&host).with_diagnostics(Diagnostics::Silent);
        let program = Program::new(vec![Stmt::try_(
            vec![Stmt::Expr(Expr::binary(BinaryOp::IntDiv, Expr::int(1), Expr::int(0)))],
            None,
            Some(vec![Stmt::let_("cleaned", Expr::Bool(true))]),
        )]);
        let err = interp.run(&program).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DivisionByZero);
        assert_eq!(interp.global("cleaned"), Some(Value::Bool(true)));
    }

    #[test]
    fn test_try_does_not_catch_signals() {
        let got = run_and_read(
            vec![
                Stmt::let_("n", Expr::int(0)),
                Stmt::let_("finally_runs", Expr::int(0)),
                Stmt::while_(
                    Expr::Bool(true),
                    vec![Stmt::try_(
                        vec![Stmt::Break],
                        Some(CatchClause {
                            var: None,
                            body: vec![Stmt::assign("n", Expr::int(99))],
                        }),
                        Some(vec![Stmt::assign(
                            "finally_runs",
                            add(Expr::var("finally_runs"), Expr::int(1)),
                        )]),
                    )],
                ),
            ],
            &["n", "finally_runs"],
        );
        assert_eq!(got, vec![Value::Int(0), Value::Int(1)]);
    }

    #[test]
    fn test_throw_map_message() {
        let (result, _) = run(vec![Stmt::Throw(Expr::map(vec![("message", Expr::str("bad"))]))]);
        let err = result.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Thrown);
        assert_eq!(err.message, "bad");

        let (result, _) = run(vec![Stmt::Throw(Expr::int(5))]);
        assert_eq!(result.unwrap_err().message, "Error thrown");
    }

    #[test]
    fn test_assert() {
        let (result, _) = run(vec![Stmt::Assert {
            cond: Expr::Bool(false),
            message: Some(Expr::str("x must be positive")),
        }]);
        let err = result.unwrap_err();
        assert_eq!(err.kind, ErrorKind::AssertionFailed);
        assert_eq!(err.message, "x must be positive");

        let (result, _) = run(vec![Stmt::Assert {
            cond: Expr::int(1),
            message: None,
        }]);
        assert!(result.is_ok());
    }

    // ========================================================================
    // ENUM / destructuring / USING / debug statements
    // ========================================================================

    #[test]
    fn test_enum_values() {
        let got = run_and_read(
            vec![Stmt::Enum {
                name: Ident::new("Color"),
                members: vec![
                    EnumMember {
                        name: Ident::new("Red"),
                        value: None,
                    },
                    EnumMember {
                        name: Ident::new("Green"),
                        value: Some(Expr::int(10)),
                    },
                    EnumMember {
                        name: Ident::new("Blue"),
                        value: None,
                    },
                ],
            }],
            &["COLOR_RED", "COLOR_GREEN", "COLOR_BLUE"],
        );
        assert_eq!(got, vec![Value::Int(0), Value::Int(10), Value::Int(11)]);
    }

    #[test]
    fn test_destructure() {
        let got = run_and_read(
            vec![
                Stmt::Destructure {
                    names: vec![Ident::new("a"), Ident::new("b"), Ident::new("c")],
                    value: Expr::Array(vec![Expr::int(1), Expr::int(2)]),
                },
                Stmt::Destructure {
                    names: vec![Ident::new("x"), Ident::new("z")],
                    value: Expr::map(vec![("X", Expr::int(7))]),
                },
            ],
            &["a", "b", "c", "x", "z"],
        );
        assert_eq!(
            got,
            vec![Value::Int(1), Value::Int(2), Value::Nil, Value::Int(7), Value::Nil]
        );
    }

    #[test]
    fn test_using_scopes_resource() {
        let got = run_and_read(
            vec![
                Stmt::let_("seen", Expr::Nil),
                Stmt::Using {
                    name: Ident::new("file"),
                    resource: Expr::str("handle"),
                    body: vec![Stmt::assign("seen", Expr::var("file"))],
                },
            ],
            &["seen", "file"],
        );
        assert_eq!(got, vec![Value::from("handle"), Value::Nil]);
    }

    #[test]
    fn test_debug_statements_only_in_debug_mode() {
        let host = Host::new();
        let program = Program::new(vec![
            Stmt::let_("hp", Expr::int(3)),
            Stmt::DebugPrint(Expr::var("hp")),
            Stmt::Breakpoint,
        ]);

        let mut quiet = Interpreter::new(&host).with_diagnostics(Diagnostics::buffer());
        quiet.run(&program).unwrap();
        assert!(quiet.diagnostics().captured().is_empty());

        let mut debug = Interpreter::new(&host)
            .with_config(InterpreterConfig::default().with_debug(true))
            .with_diagnostics(Diagnostics::buffer());
        debug.run(&program).unwrap();
        assert_eq!(debug.diagnostics().captured(), vec!["[DEBUG] 3", "[BREAKPOINT] HP=3"]);
    }

    #[test]
    fn test_reshape_empty_sizes() {
        assert_eq!(reshape(None, &[]), Value::Array(vec![]));
        assert_eq!(reshape(Some(&Value::Int(1)), &[2]), Value::Array(vec![Value::Nil, Value::Nil]));
    }
}
