//! Native function registry
//!
//! Hosts register their built-ins here once at startup. Names are matched
//! case-insensitively; every lookup uppercases the requested name.

use crate::error::{Error, Result};
use crate::interp::{InterpResult, RuntimeError, Value};
use std::collections::HashMap;
use std::fmt;

/// Boxed native callable
pub type NativeFn = Box<dyn Fn(&[Value]) -> InterpResult<Value>>;

/// Declared argument count of a native function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    /// Any number of arguments (declared as `-1` by C-style hosts)
    Variadic,
}

impl Arity {
    /// Decode a host-declared arity where `-1` means variadic
    pub fn from_declared(n: i32) -> Self {
        usize::try_from(n).map_or(Arity::Variadic, Arity::Exact)
    }

    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => n == count,
            Arity::Variadic => true,
        }
    }
}

/// A registered native function
pub struct NativeFunction {
    name: String,
    arity: Arity,
    func: NativeFn,
}

impl NativeFunction {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }

    /// Check arity, then call
    pub fn invoke(&self, args: &[Value]) -> InterpResult<Value> {
        if let Arity::Exact(expected) = self.arity {
            if expected != args.len() {
                return Err(RuntimeError::arity_mismatch(&self.name, expected, args.len()));
            }
        }
        (self.func)(args)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// Name → native callable table
#[derive(Debug, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, NativeFunction>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a native; registering the same name twice is an error
    pub fn register<F>(&mut self, name: &str, arity: Arity, func: F) -> Result<()>
    where
        F: Fn(&[Value]) -> InterpResult<Value> + 'static,
    {
        let key = name.to_uppercase();
        if self.functions.contains_key(&key) {
            return Err(Error::DuplicateNative { name: key });
        }
        self.replace(&key, arity, func);
        Ok(())
    }

    /// Register a native, overwriting any previous registration
    pub fn replace<F>(&mut self, name: &str, arity: Arity, func: F)
    where
        F: Fn(&[Value]) -> InterpResult<Value> + 'static,
    {
        let key = name.to_uppercase();
        tracing::debug!(name = %key, ?arity, "registering native");
        self.functions.insert(
            key.clone(),
            NativeFunction {
                name: key,
                arity,
                func: Box::new(func),
            },
        );
    }

    pub fn find(&self, name: &str) -> Option<&NativeFunction> {
        self.functions.get(&name.to_uppercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Call a native by name
    pub fn call(&self, name: &str, args: &[Value]) -> InterpResult<Value> {
        match self.find(name) {
            Some(native) => native.invoke(args),
            None => Err(RuntimeError::unknown_function(&name.to_uppercase())),
        }
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
