//! Host-supplied runtime tables
//!
//! A [`Host`] bundles everything the interpreter consumes from the embedding
//! application. It is built once at startup and only borrowed immutably while
//! programs run.

mod functions;
mod hooks;
mod namespaces;
mod types;

pub use functions::{Arity, FunctionRegistry, NativeFn, NativeFunction};
pub use hooks::{MemberHooks, ReadHook, WriteHook};
pub use namespaces::NamespaceRegistry;
pub use types::{default_for_type, FieldInfo, TypeInfo, TypeRegistry};

/// Program context supplied by the embedding application
#[derive(Debug, Default)]
pub struct Host {
    pub functions: FunctionRegistry,
    pub namespaces: NamespaceRegistry,
    pub types: TypeRegistry,
    pub hooks: MemberHooks,
}

impl Host {
    pub fn new() -> Self {
        Self::default()
    }
}
