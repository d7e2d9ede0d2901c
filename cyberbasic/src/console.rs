//! Console natives
//!
//! The small native set used by the CLI driver and by tests: line output,
//! string helpers, basic math and immutable array helpers. Real hosts bring
//! their own registry; nothing in the interpreter depends on these.

use crate::error::Result;
use crate::interp::{InterpResult, RuntimeError, Value};
use crate::runtime::{Arity, FunctionRegistry};
use std::cell::RefCell;
use std::rc::Rc;

/// Lines written by `PRINT` when output is captured
pub type CapturedOutput = Rc<RefCell<Vec<String>>>;

/// Register the console natives with `PRINT` writing to stdout
pub fn register_console(registry: &mut FunctionRegistry) -> Result<()> {
    registry.register("PRINT", Arity::Exact(1), |args| {
        println!("{}", args[0].to_text());
        Ok(Value::Nil)
    })?;
    register_helpers(registry)
}

/// Register the console natives with `PRINT` appending to a buffer
pub fn register_console_captured(registry: &mut FunctionRegistry) -> Result<CapturedOutput> {
    let output = CapturedOutput::default();
    let sink = Rc::clone(&output);
    registry.register("PRINT", Arity::Exact(1), move |args| {
        sink.borrow_mut().push(args[0].to_text());
        Ok(Value::Nil)
    })?;
    register_helpers(registry)?;
    Ok(output)
}

fn register_helpers(registry: &mut FunctionRegistry) -> Result<()> {
    // Strings
    registry.register("STR", Arity::Exact(1), |args| Ok(Value::Str(args[0].to_text())))?;
    registry.register("VAL", Arity::Exact(1), |args| Ok(parse_number(&args[0])))?;
    registry.register("LEN", Arity::Exact(1), |args| {
        let len = match &args[0] {
            Value::Str(s) => s.chars().count(),
            Value::Array(items) => items.len(),
            Value::Map(map) => map.len(),
            _ => 0,
        };
        Ok(Value::Int(i64::try_from(len).unwrap_or(i64::MAX)))
    })?;
    registry.register("UCASE", Arity::Exact(1), |args| Ok(Value::Str(args[0].to_text().to_uppercase())))?;
    registry.register("LCASE", Arity::Exact(1), |args| Ok(Value::Str(args[0].to_text().to_lowercase())))?;
    registry.register("SUBSTR", Arity::Exact(3), |args| {
        let text: Vec<char> = args[0].to_text().chars().collect();
        let start = clamp_index(int_arg("SUBSTR", &args[1])?, text.len());
        let len = usize::try_from(int_arg("SUBSTR", &args[2])?.max(0)).unwrap_or(usize::MAX);
        let end = start.saturating_add(len).min(text.len());
        Ok(Value::Str(text[start..end].iter().collect()))
    })?;

    // Math
    registry.register("ABS", Arity::Exact(1), |args| match &args[0] {
        Value::Int(n) => Ok(n.checked_abs().map_or(Value::Float((*n as f64).abs()), Value::Int)),
        other => Ok(Value::Float(number_arg("ABS", other)?.abs())),
    })?;
    registry.register("SQR", Arity::Exact(1), |args| Ok(Value::Float(number_arg("SQR", &args[0])?.sqrt())))?;
    registry.register("INT", Arity::Exact(1), |args| match &args[0] {
        Value::Int(n) => Ok(Value::Int(*n)),
        other => Ok(Value::Int(number_arg("INT", other)?.floor() as i64)),
    })?;
    registry.register("MIN", Arity::Variadic, |args| extremum("MIN", args, |a, b| a < b))?;
    registry.register("MAX", Arity::Variadic, |args| extremum("MAX", args, |a, b| a > b))?;

    // Arrays: every helper returns a new array
    registry.register("ARRAY", Arity::Exact(1), |args| {
        let len = usize::try_from(int_arg("ARRAY", &args[0])?.max(0)).unwrap_or(0);
        Ok(Value::Array(vec![Value::Nil; len]))
    })?;
    registry.register("PUSH", Arity::Exact(2), |args| {
        let mut items = array_arg("PUSH", &args[0])?;
        items.push(args[1].clone());
        Ok(Value::Array(items))
    })?;
    registry.register("POP", Arity::Exact(1), |args| {
        let mut items = array_arg("POP", &args[0])?;
        items.pop();
        Ok(Value::Array(items))
    })?;
    Ok(())
}

fn number_arg(name: &str, value: &Value) -> InterpResult<f64> {
    value
        .as_float()
        .ok_or_else(|| RuntimeError::native(format!("{name}: expected a number, got {}", value.type_name())))
}

fn int_arg(name: &str, value: &Value) -> InterpResult<i64> {
    match value {
        Value::Int(n) => Ok(*n),
        other => Ok(number_arg(name, other)?.trunc() as i64),
    }
}

fn array_arg(name: &str, value: &Value) -> InterpResult<Vec<Value>> {
    value
        .as_array()
        .cloned()
        .ok_or_else(|| RuntimeError::native(format!("{name}: first argument must be an array")))
}

fn clamp_index(index: i64, len: usize) -> usize {
    usize::try_from(index.max(0)).map_or(len, |i| i.min(len))
}

/// `VAL`: numbers pass through, strings parse (0 when unparsable)
fn parse_number(value: &Value) -> Value {
    match value {
        Value::Int(_) | Value::Float(_) => value.clone(),
        Value::Bool(b) => Value::Int(i64::from(*b)),
        Value::Str(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .map(Value::Int)
                .or_else(|_| s.parse::<f64>().map(Value::Float))
                .unwrap_or(Value::Int(0))
        }
        _ => Value::Int(0),
    }
}

fn extremum(name: &str, args: &[Value], better: fn(f64, f64) -> bool) -> InterpResult<Value> {
    let mut best: Option<(&Value, f64)> = None;
    for arg in args {
        let n = number_arg(name, arg)?;
        if best.is_none_or(|(_, b)| better(n, b)) {
            best = Some((arg, n));
        }
    }
    Ok(best.map(|(v, _)| v.clone()).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> (FunctionRegistry, CapturedOutput) {
        let mut registry = FunctionRegistry::new();
        let output = register_console_captured(&mut registry).unwrap();
        (registry, output)
    }

    #[test]
    fn test_print_captures_text() {
        let (registry, output) = registry();
        registry.call("PRINT", &[Value::from("hi")]).unwrap();
        registry.call("PRINT", &[Value::Nil]).unwrap();
        registry.call("PRINT", &[Value::Float(2.5)]).unwrap();
        assert_eq!(*output.borrow(), vec!["hi", "", "2.5"]);
    }

    #[test]
    fn test_double_registration_fails() {
        let (mut registry, _) = registry();
        assert!(register_console(&mut registry).is_err());
    }

    #[test]
    fn test_string_helpers() {
        let (registry, _) = registry();
        assert_eq!(registry.call("LEN", &[Value::from("héllo")]).unwrap(), Value::Int(5));
        assert_eq!(registry.call("UCASE", &[Value::from("abc")]).unwrap(), Value::from("ABC"));
        assert_eq!(registry.call("STR", &[Value::Int(42)]).unwrap(), Value::from("42"));
        assert_eq!(
            registry
                .call("SUBSTR", &[Value::from("cyberbasic"), Value::Int(5), Value::Int(100)])
                .unwrap(),
            Value::from("basic")
        );
        assert_eq!(registry.call("VAL", &[Value::from(" 3.5 ")]).unwrap(), Value::Float(3.5));
        assert_eq!(registry.call("VAL", &[Value::from("x")]).unwrap(), Value::Int(0));
    }

    #[test]
    fn test_math_helpers() {
        let (registry, _) = registry();
        assert_eq!(registry.call("ABS", &[Value::Int(-3)]).unwrap(), Value::Int(3));
        assert_eq!(registry.call("INT", &[Value::Float(-1.5)]).unwrap(), Value::Int(-2));
        assert_eq!(registry.call("SQR", &[Value::Int(9)]).unwrap(), Value::Float(3.0));
        assert_eq!(
            registry
                .call("MAX", &[Value::Int(1), Value::Float(7.5), Value::Int(3)])
                .unwrap(),
            Value::Float(7.5)
        );
        assert_eq!(registry.call("MIN", &[]).unwrap(), Value::Nil);
        assert!(registry.call("SQR", &[Value::from("x")]).is_err());
    }

    #[test]
    fn test_array_helpers_copy() {
        let (registry, _) = registry();
        let base = Value::Array(vec![Value::Int(1)]);
        let pushed = registry.call("PUSH", &[base.clone(), Value::Int(2)]).unwrap();
        assert_eq!(pushed, Value::Array(vec![Value::Int(1), Value::Int(2)]));
        assert_eq!(registry.call("POP", &[pushed]).unwrap(), base);
        assert_eq!(
            registry.call("ARRAY", &[Value::Int(2)]).unwrap(),
            Value::Array(vec![Value::Nil, Value::Nil])
        );
        let err = registry.call("PUSH", &[Value::Int(1), Value::Int(2)]).unwrap_err();
        assert_eq!(err.message, "PUSH: first argument must be an array");
    }

    #[test]
    fn test_arity_checked() {
        let (registry, _) = registry();
        let err = registry.call("LEN", &[]).unwrap_err();
        assert_eq!(err.kind, crate::interp::ErrorKind::ArityMismatch);
    }
}
