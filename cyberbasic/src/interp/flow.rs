//! Control-flow signals
//!
//! Statement execution returns a [`ControlFlow`] that loop and call-frame
//! handlers inspect explicitly. Expressions can also raise a signal (a
//! Function body that issues `EXIT WHILE` propagates through the call
//! expression), so the evaluator's error channel is [`Unwind`].

use super::error::RuntimeError;
use super::value::Value;
use crate::ast::ExitTarget;

/// Outcome of executing a statement
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ControlFlow {
    /// Fell through to the next statement
    #[default]
    Normal,
    Return(Value),
    Break,
    Continue,
    Exit(ExitTarget),
}

impl ControlFlow {
    pub fn is_normal(&self) -> bool {
        matches!(self, ControlFlow::Normal)
    }
}

/// Non-local exit out of expression evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum Unwind {
    /// Runtime failure, catchable by TRY
    Fail(RuntimeError),
    /// Signal raised inside a call, handled by the enclosing statement
    Signal(ControlFlow),
}

impl From<RuntimeError> for Unwind {
    fn from(err: RuntimeError) -> Self {
        Unwind::Fail(err)
    }
}

/// Result of evaluating an expression
pub type EvalResult<T> = Result<T, Unwind>;

/// Outcome of a loop body iteration, as seen by the loop handler
pub enum LoopStep {
    /// Run the post-body step and test again
    Next,
    /// Leave the loop normally
    Leave,
    /// Leave the loop and hand this flow to the enclosing statement
    Propagate(ControlFlow),
}

impl LoopStep {
    /// Classify a body outcome for a loop of kind `target`
    pub fn classify(flow: ControlFlow, target: ExitTarget) -> Self {
        match flow {
            ControlFlow::Normal | ControlFlow::Continue => LoopStep::Next,
            ControlFlow::Break => LoopStep::Leave,
            ControlFlow::Exit(t) if t == target => LoopStep::Leave,
            other => LoopStep::Propagate(other),
        }
    }
}
