//! Environment for variable bindings
//!
//! Scopes form a parent chain. A call frame is a scope marked `frame`;
//! comprehensions and USING blocks open non-frame block scopes inside it.
//! Implicit assignment never writes past the nearest frame, while reads see
//! the whole chain. Names listed by `GLOBAL` are redirected to the root.

use super::error::{InterpResult, RuntimeError};
use super::Value;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// Shared reference to an environment
pub type EnvRef = Rc<RefCell<Environment>>;

/// One scope in the chain
#[derive(Debug, Clone)]
pub struct Environment {
    /// Variable bindings in this scope
    vars: HashMap<String, Value>,
    /// Names bound by CONST in this scope
    consts: HashSet<String>,
    /// Names declared in this scope (OPTION EXPLICIT bookkeeping)
    declared: HashSet<String>,
    /// Names redirected to the root scope by GLOBAL
    globals_here: HashSet<String>,
    /// OPTION EXPLICIT in effect
    strict: bool,
    /// Call-frame boundary for implicit assignment
    frame: bool,
    /// Enclosing scope
    parent: Option<EnvRef>,
}

impl Environment {
    /// Create a new root environment
    pub fn new() -> Self {
        Environment {
            vars: HashMap::new(),
            consts: HashSet::new(),
            declared: HashSet::new(),
            globals_here: HashSet::new(),
            strict: false,
            frame: true,
            parent: None,
        }
    }

    /// Create a scope under `parent`; strictness is inherited
    pub fn with_parent(parent: EnvRef, frame: bool) -> Self {
        let strict = parent.borrow().strict;
        Environment {
            strict,
            frame,
            parent: Some(parent),
            ..Environment::new()
        }
    }

    /// Wrap in Rc<RefCell<>>
    pub fn into_ref(self) -> EnvRef {
        Rc::new(RefCell::new(self))
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// `OPTION EXPLICIT`
    pub fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// The root scope of this chain, or `None` when `self` is the root
    fn root(&self) -> Option<EnvRef> {
        let mut current = self.parent.clone()?;
        loop {
            let next = current.borrow().parent.clone();
            match next {
                Some(parent) => current = parent,
                None => return Some(current),
            }
        }
    }

    /// Mark `name` as declared in this scope only
    pub fn declare(&mut self, name: &str) {
        self.declared.insert(name.to_string());
    }

    /// True when `name` is declared or bound anywhere in the chain
    pub fn is_declared(&self, name: &str) -> bool {
        if self.declared.contains(name) || self.vars.contains_key(name) {
            true
        } else if let Some(parent) = &self.parent {
            parent.borrow().is_declared(name)
        } else {
            false
        }
    }

    /// Redirect `name` to the root scope for this scope (`GLOBAL`)
    pub fn add_global(&mut self, name: &str) {
        self.globals_here.insert(name.to_string());
        if self.strict {
            match self.root() {
                Some(root) => root.borrow_mut().declare(name),
                None => self.declare(name),
            }
        }
    }

    /// True when the nearest visible binding of `name` is a constant
    pub fn is_const(&self, name: &str) -> bool {
        if self.globals_here.contains(name) {
            return match self.root() {
                Some(root) => root.borrow().consts.contains(name),
                None => self.consts.contains(name),
            };
        }
        if self.consts.contains(name) {
            true
        } else if self.vars.contains_key(name) {
            false
        } else if let Some(parent) = &self.parent {
            parent.borrow().is_const(name)
        } else {
            false
        }
    }

    /// Look up a variable in the scope chain, honoring GLOBAL redirects
    pub fn lookup(&self, name: &str) -> Option<Value> {
        if self.globals_here.contains(name) {
            return match self.root() {
                Some(root) => root.borrow().vars.get(name).cloned(),
                None => self.vars.get(name).cloned(),
            };
        }
        if let Some(value) = self.vars.get(name) {
            Some(value.clone())
        } else if let Some(parent) = &self.parent {
            parent.borrow().lookup(name)
        } else {
            None
        }
    }

    /// True when `name` resolves to a binding
    pub fn is_bound(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Read a variable; unbound names are NIL unless OPTION EXPLICIT is on
    /// and the name was never declared
    pub fn get(&self, name: &str) -> InterpResult<Value> {
        match self.lookup(name) {
            Some(value) => Ok(value),
            None if self.strict && !self.is_declared(name) && !self.is_global_declared(name) => {
                Err(RuntimeError::undeclared_variable(name))
            }
            None => Ok(Value::Nil),
        }
    }

    fn is_global_declared(&self, name: &str) -> bool {
        self.globals_here.contains(name)
            && self
                .root()
                .is_some_and(|root| root.borrow().is_declared(name))
    }

    /// Assign a variable
    ///
    /// Fails if the nearest visible binding is a constant, or if OPTION
    /// EXPLICIT is on and the name was never declared. Writes go to the
    /// nearest existing binding inside the current frame, else to this scope.
    pub fn set(&mut self, name: &str, value: Value) -> InterpResult<()> {
        if self.globals_here.contains(name) {
            return self.set_global(name, value);
        }
        if self.is_const(name) {
            return Err(RuntimeError::const_assignment(name));
        }
        if self.strict && !self.is_declared(name) {
            return Err(RuntimeError::undeclared_assignment(name));
        }
        self.assign_in_frame(name, value)
    }

    fn set_global(&mut self, name: &str, value: Value) -> InterpResult<()> {
        let strict = self.strict;
        let Some(root) = self.root() else {
            if self.consts.contains(name) {
                return Err(RuntimeError::const_assignment(name));
            }
            if strict && !self.is_declared(name) {
                return Err(RuntimeError::undeclared_assignment(name));
            }
            self.vars.insert(name.to_string(), value);
            return Ok(());
        };
        let mut root = root.borrow_mut();
        if root.consts.contains(name) {
            return Err(RuntimeError::const_assignment(name));
        }
        if strict && !root.is_declared(name) {
            return Err(RuntimeError::undeclared_assignment(name));
        }
        root.vars.insert(name.to_string(), value);
        Ok(())
    }

    fn binds_in_frame(&self, name: &str) -> bool {
        if self.vars.contains_key(name) || self.globals_here.contains(name) {
            return true;
        }
        match &self.parent {
            Some(parent) if !self.frame => parent.borrow().binds_in_frame(name),
            _ => false,
        }
    }

    fn assign_in_frame(&mut self, name: &str, value: Value) -> InterpResult<()> {
        if self.globals_here.contains(name) {
            return self.set_global(name, value);
        }
        if self.vars.contains_key(name) || self.frame {
            self.vars.insert(name.to_string(), value);
            return Ok(());
        }
        match &self.parent {
            Some(parent) if parent.borrow().binds_in_frame(name) => {
                parent.borrow_mut().assign_in_frame(name, value)
            }
            _ => {
                self.vars.insert(name.to_string(), value);
                Ok(())
            }
        }
    }

    /// Declare and bind in this scope (parameters, loop and catch variables)
    pub fn bind(&mut self, name: &str, value: Value) {
        self.declared.insert(name.to_string());
        self.vars.insert(name.to_string(), value);
    }

    /// `LET`/`DIM`/`FOR`: declare in this scope, then bind, unless a
    /// visible constant owns the name. Names marked `GLOBAL` here are
    /// written to the root instead.
    pub fn define(&mut self, name: &str, value: Value) -> InterpResult<()> {
        if self.is_const(name) {
            return Err(RuntimeError::const_assignment(name));
        }
        if self.globals_here.contains(name) {
            self.declared.insert(name.to_string());
            return self.set_global(name, value);
        }
        self.bind(name, value);
        Ok(())
    }

    /// `LOCAL`: always binds in this scope, `GLOBAL` marks included
    pub fn define_local(&mut self, name: &str, value: Value) -> InterpResult<()> {
        if self.consts.contains(name) {
            return Err(RuntimeError::const_assignment(name));
        }
        self.bind(name, value);
        Ok(())
    }

    /// `CONST`: bind locally and mark constant, shadowing any ancestor
    pub fn define_const(&mut self, name: &str, value: Value) -> InterpResult<()> {
        if self.consts.contains(name) {
            return Err(RuntimeError::const_assignment(name));
        }
        self.consts.insert(name.to_string());
        self.bind(name, value);
        Ok(())
    }

    /// Copy of every visible binding, nearest scope winning
    pub fn snapshot(&self) -> HashMap<String, Value> {
        let mut bindings = match &self.parent {
            Some(parent) => parent.borrow().snapshot(),
            None => HashMap::new(),
        };
        for (name, value) in &self.vars {
            bindings.insert(name.clone(), value.clone());
        }
        bindings
    }

    /// Bindings of this scope only (for debugging)
    pub fn bindings(&self) -> &HashMap<String, Value> {
        &self.vars
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a block scope (comprehension, USING) under `parent`
pub fn child_env(parent: &EnvRef) -> EnvRef {
    Environment::with_parent(Rc::clone(parent), false).into_ref()
}

/// Create a call frame under `parent`
pub fn frame_env(parent: &EnvRef) -> EnvRef {
    Environment::with_parent(Rc::clone(parent), true).into_ref()
}
