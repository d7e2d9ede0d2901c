//! Call dispatcher
//!
//! Resolution order for a call by name: user SUB, user FUNCTION, type
//! constructor, a variable holding a lambda or method object, then the host's
//! native registry.

use super::env::{frame_env, EnvRef};
use super::error::{InterpResult, RuntimeError};
use super::eval::{matches_declared_type, settle, Interpreter, STACK_GROW_SIZE, STACK_RED_ZONE};
use super::flow::{ControlFlow, EvalResult, Unwind};
use super::value::{find_key, normalize_key, FUNCTION_KEY, LAMBDA_TYPE, METHOD_TYPE, OBJECT_KEY, TYPE_KEY};
use super::value::{Value, ValueMap};
use crate::ast::{ExitTarget, Expr, FunctionDecl, Ident, LambdaRef, NamedArg, Param, Stmt, SubDecl};
use std::rc::Rc;

/// Lambda value keys
pub(crate) const LAMBDA_ID_KEY: &str = "_lambdaId";
pub(crate) const CLOSURE_KEY: &str = "_closure";
pub(crate) const PARAM_COUNT_KEY: &str = "_paramCount";

/// Evaluated named argument
type Named = (Ident, Value);

/// True for lambda and method objects
pub(crate) fn is_callable(value: &Value) -> bool {
    matches!(value.type_tag(), Some(LAMBDA_TYPE | METHOD_TYPE))
}

impl<'h> Interpreter<'h> {
    /// Call a SUB, FUNCTION, constructor or native by name from the host side
    pub fn call(&mut self, name: &str, args: Vec<Value>) -> InterpResult<Value> {
        let env = Rc::clone(&self.global_env);
        let name = name.to_uppercase();
        settle(self.dispatch(&name, args, &[], &env, true))
    }

    /// Invoke a lambda or method value from the host side
    pub fn call_value(&mut self, callee: &Value, args: Vec<Value>) -> InterpResult<Value> {
        let env = Rc::clone(&self.global_env);
        settle(self.invoke_callable(callee, args, &env))
    }

    /// `name(args, key := value)`
    pub(crate) fn eval_call(
        &mut self,
        callee: &Ident,
        args: &[Expr],
        named: &[NamedArg],
        env: &EnvRef,
    ) -> EvalResult<Value> {
        let args = self.eval_list(args, env)?;
        let named = self.eval_named(named, env)?;
        self.dispatch(callee.as_str(), args, &named, env, true)
    }

    pub(crate) fn eval_named(&mut self, named: &[NamedArg], env: &EnvRef) -> EvalResult<Vec<Named>> {
        let mut values = Vec::with_capacity(named.len());
        for arg in named {
            values.push((arg.name.clone(), self.eval(&arg.value, env)?));
        }
        Ok(values)
    }

    /// Dispatch a call by canonical name with automatic stack growth
    pub(crate) fn dispatch(
        &mut self,
        name: &str,
        args: Vec<Value>,
        named: &[Named],
        env: &EnvRef,
        allow_variables: bool,
    ) -> EvalResult<Value> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            self.dispatch_inner(name, args, named, env, allow_variables)
        })
    }

    fn dispatch_inner(
        &mut self,
        name: &str,
        args: Vec<Value>,
        named: &[Named],
        env: &EnvRef,
        allow_variables: bool,
    ) -> EvalResult<Value> {
        if let Some(sub) = self.subs.get(name).cloned() {
            self.call_sub(&sub, args, named, env)?;
            return Ok(Value::Nil);
        }
        if let Some(func) = self.functions.get(name).cloned() {
            return self.call_function(&func, args, named, env);
        }
        if let Some(instance) = self.create_instance(name) {
            return Ok(construct(instance, named));
        }
        if allow_variables {
            let bound = env.borrow().lookup(name);
            if let Some(callee) = bound.filter(is_callable) {
                return self.invoke_callable(&callee, args, env);
            }
        }
        Ok(self.host.functions.call(name, &args)?)
    }

    /// True when `name` is a user SUB/FUNCTION or a native
    pub(crate) fn is_known_callable(&self, name: &str) -> bool {
        self.subs.contains_key(name)
            || self.functions.contains_key(name)
            || self.host.functions.contains(name)
    }

    fn enter_frame(&mut self) -> InterpResult<()> {
        if self.call_depth >= self.config.max_call_depth {
            return Err(RuntimeError::stack_overflow(self.config.max_call_depth));
        }
        self.call_depth += 1;
        Ok(())
    }

    /// Run a body in a fresh call frame chained to `parent`
    fn run_frame(
        &mut self,
        params: &[Param],
        body: &[Stmt],
        args: Vec<Value>,
        named: &[Named],
        parent: &EnvRef,
        closure: Option<&ValueMap>,
    ) -> EvalResult<ControlFlow> {
        self.enter_frame()?;
        let frame = frame_env(parent);
        if let Some(closure) = closure {
            let mut scope = frame.borrow_mut();
            for (name, value) in closure {
                scope.bind(name, value.clone());
            }
        }
        let result = self
            .bind_params(params, args, named, &frame)
            .and_then(|()| self.exec_block(body, &frame).map_err(Unwind::from));
        self.call_depth -= 1;
        result
    }

    /// Positional args, then named overrides, then defaults for the rest
    fn bind_params(
        &mut self,
        params: &[Param],
        args: Vec<Value>,
        named: &[Named],
        frame: &EnvRef,
    ) -> EvalResult<()> {
        let mut slots: Vec<Option<Value>> = params.iter().map(|_| None).collect();
        // Extra positional arguments are dropped
        for (slot, arg) in slots.iter_mut().zip(args) {
            *slot = Some(arg);
        }
        for (name, value) in named {
            if let Some(i) = params.iter().position(|p| &p.name == name) {
                slots[i] = Some(value.clone());
            }
        }

        let mut unfilled = Vec::new();
        for (param, slot) in params.iter().zip(slots) {
            match slot {
                Some(value) => frame.borrow_mut().bind(param.name.as_str(), value),
                None => unfilled.push(param),
            }
        }
        for param in unfilled {
            let value = match &param.default {
                Some(default) => self.eval(default, frame)?,
                None => Value::Nil,
            };
            frame.borrow_mut().bind(param.name.as_str(), value);
        }
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip_all, fields(name = %sub.name))]
    fn call_sub(
        &mut self,
        sub: &SubDecl,
        args: Vec<Value>,
        named: &[Named],
        env: &EnvRef,
    ) -> EvalResult<()> {
        match self.run_frame(&sub.params, &sub.body, args, named, env, None)? {
            ControlFlow::Normal | ControlFlow::Return(_) | ControlFlow::Exit(ExitTarget::Sub) => Ok(()),
            flow => Err(Unwind::Signal(flow)),
        }
    }

    #[tracing::instrument(level = "debug", skip_all, fields(name = %func.name))]
    fn call_function(
        &mut self,
        func: &FunctionDecl,
        args: Vec<Value>,
        named: &[Named],
        env: &EnvRef,
    ) -> EvalResult<Value> {
        let flow = self.run_frame(&func.params, &func.body, args, named, env, None)?;
        let value = function_result(flow)?;
        if self.config.debug {
            if let Some(declared) = &func.return_type {
                if !matches_declared_type(&value, declared.as_str()) {
                    self.diagnostics.emit(&format!(
                        "Warning: Function {} declared AS {} returned {}",
                        func.name,
                        declared,
                        value.type_tag().unwrap_or(value.type_name())
                    ));
                }
            }
        }
        Ok(value)
    }

    // ========================================================================
    // Lambdas and method objects
    // ========================================================================

    /// Lambda value: a copy of every visible binding plus a handle to the node
    pub(crate) fn make_lambda(&mut self, lambda: &LambdaRef, env: &EnvRef) -> Value {
        let id = Rc::as_ptr(lambda) as usize as i64;
        self.lambdas.insert(id, Rc::clone(lambda));

        let closure: ValueMap = env.borrow().snapshot().into_iter().collect();
        let mut map = ValueMap::new();
        map.insert(TYPE_KEY.to_string(), Value::from(LAMBDA_TYPE));
        map.insert(PARAM_COUNT_KEY.to_string(), Value::Int(lambda.params.len() as i64));
        map.insert(CLOSURE_KEY.to_string(), Value::Map(closure));
        map.insert(LAMBDA_ID_KEY.to_string(), Value::Int(id));
        Value::Map(map)
    }

    /// Each invocation starts from a fresh copy of the captured bindings
    fn invoke_lambda(&mut self, lambda: &ValueMap, args: Vec<Value>) -> EvalResult<Value> {
        let node = lambda
            .get(LAMBDA_ID_KEY)
            .and_then(Value::as_int)
            .and_then(|id| self.lambdas.get(&id))
            .cloned()
            .ok_or_else(|| RuntimeError::type_error("lambda", "MAP"))?;
        let closure = match lambda.get(CLOSURE_KEY) {
            Some(Value::Map(closure)) => closure.clone(),
            _ => ValueMap::new(),
        };
        let global = Rc::clone(&self.global_env);
        let flow = self.run_frame(&node.params, &node.body, args, &[], &global, Some(&closure))?;
        function_result(flow)
    }

    /// Call a lambda or method object
    pub(crate) fn invoke_callable(
        &mut self,
        callee: &Value,
        mut args: Vec<Value>,
        env: &EnvRef,
    ) -> EvalResult<Value> {
        let Value::Map(map) = callee else {
            return Err(RuntimeError::type_error("callable", callee.type_name()).into());
        };
        match callee.type_tag() {
            Some(LAMBDA_TYPE) => self.invoke_lambda(map, args),
            Some(METHOD_TYPE) => {
                let Some(function) = map.get(FUNCTION_KEY).and_then(Value::as_str) else {
                    return Ok(Value::Nil);
                };
                let function = function.to_uppercase();
                if let Some(receiver) = map.get(OBJECT_KEY) {
                    args.insert(0, receiver.clone());
                }
                self.dispatch(&function, args, &[], env, false)
            }
            _ => Err(RuntimeError::type_error("callable", callee.type_tag().unwrap_or("MAP")).into()),
        }
    }

    /// `SUPER.method(args)` inside a type method: call `PARENT_METHOD` with
    /// `THIS` prepended
    pub(crate) fn eval_super_call(&mut self, method: &Ident, args: &[Expr], env: &EnvRef) -> EvalResult<Value> {
        let this = env.borrow().lookup("THIS");
        let Some(this) = this else {
            return Ok(Value::Nil);
        };
        let parent = this
            .type_tag()
            .and_then(|tag| self.find_type(tag))
            .and_then(|info| info.parent.clone());
        let Some(parent) = parent else {
            return Ok(Value::Nil);
        };

        let name = format!("{parent}_{method}");
        let mut values = vec![this];
        values.extend(self.eval_list(args, env)?);
        if self.host.functions.contains(&name) {
            return Ok(self.host.functions.call(&name, &values)?);
        }
        if self.subs.contains_key(name.as_str()) || self.functions.contains_key(name.as_str()) {
            return self.dispatch(&name, values, &[], env, false);
        }
        Err(RuntimeError::unknown_function(&name).into())
    }
}

/// What a FUNCTION-like body's final flow yields
fn function_result(flow: ControlFlow) -> EvalResult<Value> {
    match flow {
        ControlFlow::Return(value) => Ok(value),
        ControlFlow::Normal | ControlFlow::Exit(ExitTarget::Function) => Ok(Value::Nil),
        flow => Err(Unwind::Signal(flow)),
    }
}

/// Fresh instance with named arguments written over the field defaults
fn construct(instance: Value, named: &[Named]) -> Value {
    let Value::Map(mut fields) = instance else {
        return instance;
    };
    for (name, value) in named {
        let key = find_key(&fields, name.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| normalize_key(name.as_str()));
        fields.insert(key, value.clone());
    }
    Value::Map(fields)
}
