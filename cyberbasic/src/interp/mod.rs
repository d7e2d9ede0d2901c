//! Tree-walking interpreter
//!
//! The [`Interpreter`] evaluates the AST directly against a chain of
//! [`Environment`] scopes. Host functionality is reached only through the
//! borrowed [`Host`](crate::runtime::Host).

pub mod diagnostics;
pub mod env;
pub mod error;
pub mod flow;
pub mod value;

mod call;
mod eval;
mod exec;
mod member;

pub use diagnostics::Diagnostics;
pub use env::{EnvRef, Environment};
pub use error::{ErrorKind, InterpResult, RuntimeError};
pub use eval::{compare_values, eval_binary, eval_unary, index_value, make_range, Interpreter};
pub use flow::{ControlFlow, EvalResult, LoopStep, Unwind};
pub use value::{Value, ValueMap};
