//! Member resolver
//!
//! `object.member` resolution order:
//! 1. host read hooks
//! 2. map field, exact key then case-insensitive
//! 3. dotted deep path (`"POS.X"`)
//! 4. namespace object method
//! 5. `TYPE_MEMBER` callable keyed by the map's `_type`, as a bound method
//!
//! Strings and arrays resolve `STRING_X` / `ARRAY_X` callables plus the
//! `LENGTH` and `SIZE` properties. Anything else is NIL.

use super::call::is_callable;
use super::env::EnvRef;
use super::eval::Interpreter;
use super::flow::EvalResult;
use super::value::{map_lookup, ValueMap, METHOD_KEY, NAMESPACE_TYPE, NAME_KEY, OBJECT_KEY};
use super::value::{Value, LAMBDA_TYPE, METHOD_TYPE};
use crate::ast::{Expr, Ident};
use crate::util::{format_member_warning, suggest_names};

/// Method name prefixes whose NIL result is replaced by the receiver
const CHAINABLE_PREFIXES: &[&str] = &[
    "SET", "ADD", "REMOVE", "CLEAR", "UPDATE", "MOVE", "SCALE", "ROTATE", "NORMALIZE",
    "TRANSFORM", "PUSH", "POP", "SHIFT", "UNSHIFT", "APPEND", "INSERT", "DELETE", "MODIFY",
    "CHANGE", "PREPEND",
];

pub(crate) fn is_chainable(method: &str) -> bool {
    let method = method.to_uppercase();
    CHAINABLE_PREFIXES.iter().any(|prefix| method.starts_with(prefix))
}

/// Follow a dotted path through nested maps
fn deep_lookup<'a>(map: &'a ValueMap, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = map_lookup(map, segments.next()?)?;
    for segment in segments {
        current = map_lookup(current.as_map()?, segment)?;
    }
    Some(current)
}

impl<'h> Interpreter<'h> {
    /// Evaluate a member/method receiver; an unbound name that is a
    /// registered namespace becomes the namespace object
    pub(crate) fn eval_receiver(&mut self, expr: &Expr, env: &EnvRef) -> EvalResult<Value> {
        if let Expr::Var(name) = expr {
            let bound = env.borrow().is_bound(name.as_str());
            if !bound {
                if let Some(namespace) = self.host.namespaces.create_namespace_object(name.as_str()) {
                    return Ok(namespace);
                }
            }
        }
        self.eval(expr, env)
    }

    /// Resolve `object.member`; misses are NIL
    pub(crate) fn resolve_member(&self, object: &Value, member: &str, warn: bool) -> Value {
        if let Some(value) = self.host.hooks.try_resolve_member(object, member) {
            return value;
        }
        match object {
            Value::Map(map) => self.resolve_map_member(object, map, member, warn),
            Value::Str(s) => self.builtin_member(object, "STRING", member, s.chars().count()),
            Value::Array(items) => self.builtin_member(object, "ARRAY", member, items.len()),
            _ => Value::Nil,
        }
    }

    fn resolve_map_member(&self, object: &Value, map: &ValueMap, member: &str, warn: bool) -> Value {
        if let Some(value) = map_lookup(map, member) {
            return value.clone();
        }
        if member.contains('.') {
            if let Some(value) = deep_lookup(map, member) {
                return value.clone();
            }
        }

        let tag = object.type_tag();
        if tag == Some(NAMESPACE_TYPE) {
            if let Some(Value::Str(namespace)) = map.get(NAME_KEY) {
                if let Some(function) = self.host.namespaces.resolve_method(namespace, member) {
                    return Value::namespace_method(namespace, &member.to_uppercase(), function);
                }
            }
        }
        if let Some(tag) = tag {
            let method = member.to_uppercase();
            let function = format!("{}_{}", tag.to_uppercase(), method);
            if self.is_known_callable(&function) {
                return Value::bound_method(object.clone(), &method, &function);
            }
        }

        if warn && self.config.debug {
            let keys = map.keys().map(String::as_str).filter(|k| !k.starts_with('_'));
            let suggestions = suggest_names(member, keys);
            self.diagnostics
                .emit(&format_member_warning(member, tag.unwrap_or("MAP"), &suggestions));
        }
        Value::Nil
    }

    fn builtin_member(&self, object: &Value, prefix: &str, member: &str, len: usize) -> Value {
        let method = member.to_uppercase();
        let function = format!("{prefix}_{method}");
        if self.is_known_callable(&function) {
            return Value::bound_method(object.clone(), &method, &function);
        }
        match method.as_str() {
            "LENGTH" | "SIZE" => Value::Int(len as i64),
            _ => Value::Nil,
        }
    }

    /// `object.method(args)`
    pub(crate) fn eval_method_call(
        &mut self,
        object: &Expr,
        method: &Ident,
        args: &[Expr],
        env: &EnvRef,
    ) -> EvalResult<Value> {
        let receiver = self.eval_receiver(object, env)?;
        let args = self.eval_list(args, env)?;

        if is_callable(&receiver) && matches!(method.as_str(), "CALL" | "INVOKE") {
            return self.invoke_callable(&receiver, args, env);
        }

        let resolved = self.resolve_member(&receiver, method.as_str(), false);
        let (result, chain_target) = if is_callable(&resolved) {
            let target = chain_target(&receiver, &resolved, method.as_str());
            (self.invoke_callable(&resolved, args, env)?, target)
        } else if !resolved.is_nil() && args.is_empty() {
            // Plain property read through call syntax, e.g. `s.LENGTH()`
            return Ok(resolved);
        } else {
            let target = is_chainable(method.as_str()).then(|| receiver.clone());
            (self.dispatch(method.as_str(), args, &[], env, true)?, target)
        };

        match chain_target {
            Some(target) if result.is_nil() => Ok(target),
            _ => Ok(result),
        }
    }
}

/// Receiver to hand back when a chainable method yields NIL
fn chain_target(receiver: &Value, method_object: &Value, method: &str) -> Option<Value> {
    if is_chainable(method) {
        return Some(receiver.clone());
    }
    let map = method_object.as_map()?;
    let name = map.get(METHOD_KEY).and_then(Value::as_str)?;
    if !is_chainable(name) {
        return None;
    }
    // Lambdas have no receiver to chain
    if method_object.type_tag() == Some(LAMBDA_TYPE) {
        return None;
    }
    Some(map.get(OBJECT_KEY).cloned().unwrap_or_else(|| receiver.clone()))
}
