//! Host member hooks
//!
//! Hooks let a host intercept `object.member` reads and writes for its own
//! object kinds before generic map resolution. The most recently added hook
//! is consulted first.

use crate::interp::Value;
use std::fmt;

/// Read hook: `Some(value)` claims the access
pub type ReadHook = Box<dyn Fn(&Value, &str) -> Option<Value>>;
/// Write hook: `true` claims the assignment
pub type WriteHook = Box<dyn Fn(&Value, &str, &Value) -> bool>;

#[derive(Default)]
pub struct MemberHooks {
    read: Vec<ReadHook>,
    write: Vec<WriteHook>,
}

impl MemberHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_read_hook<F>(&mut self, hook: F)
    where
        F: Fn(&Value, &str) -> Option<Value> + 'static,
    {
        self.read.push(Box::new(hook));
    }

    pub fn add_write_hook<F>(&mut self, hook: F)
    where
        F: Fn(&Value, &str, &Value) -> bool + 'static,
    {
        self.write.push(Box::new(hook));
    }

    pub fn try_resolve_member(&self, object: &Value, member: &str) -> Option<Value> {
        self.read.iter().rev().find_map(|hook| hook(object, member))
    }

    pub fn try_assign_member(&self, object: &Value, member: &str, value: &Value) -> bool {
        self.write.iter().rev().any(|hook| hook(object, member, value))
    }

    pub fn is_empty(&self) -> bool {
        self.read.is_empty() && self.write.is_empty()
    }
}

impl fmt::Debug for MemberHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberHooks")
            .field("read", &self.read.len())
            .field("write", &self.write.len())
            .finish()
    }
}
