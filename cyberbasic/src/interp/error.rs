//! Runtime errors for the interpreter
//!
//! Runtime failures are the only things TRY/CATCH ever sees. Control-flow
//! signals (RETURN, BREAK, CONTINUE, EXIT) live in [`super::flow`] and never
//! become a `RuntimeError`.

use std::fmt;

/// Runtime error during interpretation
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub message: String,
}

/// Kinds of runtime errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Read of an undeclared name under OPTION EXPLICIT
    UndeclaredVariable,
    /// Write to an undeclared name under OPTION EXPLICIT
    UndeclaredAssignment,
    /// Write to a CONST binding
    ConstAssignment,
    /// `\` with a zero divisor
    DivisionByZero,
    /// MOD with a zero divisor
    ModuloByZero,
    /// Array shape over the configured element cap
    AllocationTooLarge,
    /// ASSERT with a falsy condition
    AssertionFailed,
    /// User THROW
    Thrown,
    /// Failure raised by a native function
    Native,
    /// No Sub, Function, type or native with that name
    UnknownFunction,
    /// Native called with the wrong number of arguments
    ArityMismatch,
    /// Operand of the wrong kind
    TypeError,
    /// Call nesting over the configured limit
    StackOverflow,
    /// BREAK/CONTINUE with no enclosing loop
    InvalidControlFlow,
}

impl ErrorKind {
    /// Stable name exposed to CATCH handlers as the `KIND` field
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::UndeclaredVariable => "UndeclaredVariable",
            ErrorKind::UndeclaredAssignment => "UndeclaredAssignment",
            ErrorKind::ConstAssignment => "ConstAssignment",
            ErrorKind::DivisionByZero => "DivisionByZero",
            ErrorKind::ModuloByZero => "ModuloByZero",
            ErrorKind::AllocationTooLarge => "AllocationTooLarge",
            ErrorKind::AssertionFailed => "AssertionFailed",
            ErrorKind::Thrown => "Thrown",
            ErrorKind::Native => "Native",
            ErrorKind::UnknownFunction => "UnknownFunction",
            ErrorKind::ArityMismatch => "ArityMismatch",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::StackOverflow => "StackOverflow",
            ErrorKind::InvalidControlFlow => "InvalidControlFlow",
        }
    }
}

impl RuntimeError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        RuntimeError {
            kind,
            message: message.into(),
        }
    }

    pub fn undeclared_variable(name: &str) -> Self {
        RuntimeError {
            kind: ErrorKind::UndeclaredVariable,
            message: format!("Use of undeclared variable '{name}'"),
        }
    }

    pub fn undeclared_assignment(name: &str) -> Self {
        RuntimeError {
            kind: ErrorKind::UndeclaredAssignment,
            message: format!("Assignment to undeclared variable '{name}'"),
        }
    }

    pub fn const_assignment(name: &str) -> Self {
        RuntimeError {
            kind: ErrorKind::ConstAssignment,
            message: format!("Assignment to constant '{name}'"),
        }
    }

    pub fn division_by_zero() -> Self {
        RuntimeError {
            kind: ErrorKind::DivisionByZero,
            message: "Integer division by zero".to_string(),
        }
    }

    pub fn modulo_by_zero() -> Self {
        RuntimeError {
            kind: ErrorKind::ModuloByZero,
            message: "Modulo by zero".to_string(),
        }
    }

    pub fn allocation_too_large(what: &str, sizes: &[i64], total: usize) -> Self {
        let dims = sizes
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(",");
        RuntimeError {
            kind: ErrorKind::AllocationTooLarge,
            message: format!("{what} too large. sizes=[{dims}] total(capped)={total}"),
        }
    }

    pub fn assertion_failed(msg: Option<&str>) -> Self {
        RuntimeError {
            kind: ErrorKind::AssertionFailed,
            message: msg.unwrap_or("Assertion failed").to_string(),
        }
    }

    pub fn thrown(message: impl Into<String>) -> Self {
        RuntimeError {
            kind: ErrorKind::Thrown,
            message: message.into(),
        }
    }

    pub fn native(message: impl Into<String>) -> Self {
        RuntimeError {
            kind: ErrorKind::Native,
            message: message.into(),
        }
    }

    pub fn unknown_function(name: &str) -> Self {
        RuntimeError {
            kind: ErrorKind::UnknownFunction,
            message: format!("Unknown function: {name}"),
        }
    }

    pub fn arity_mismatch(name: &str, expected: usize, got: usize) -> Self {
        RuntimeError {
            kind: ErrorKind::ArityMismatch,
            message: format!("{name}: expected {expected} args, got {got}"),
        }
    }

    pub fn type_error(expected: &str, got: &str) -> Self {
        RuntimeError {
            kind: ErrorKind::TypeError,
            message: format!("type error: expected {expected}, got {got}"),
        }
    }

    pub fn stack_overflow(limit: usize) -> Self {
        RuntimeError {
            kind: ErrorKind::StackOverflow,
            message: format!("stack overflow: call depth exceeded {limit}"),
        }
    }

    pub fn invalid_control_flow(what: &str) -> Self {
        RuntimeError {
            kind: ErrorKind::InvalidControlFlow,
            message: format!("{what} outside of a loop"),
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Runtime error: {}", self.message)
    }
}

impl std::error::Error for RuntimeError {}

/// Result type for interpreter operations
pub type InterpResult<T> = Result<T, RuntimeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undeclared_variable() {
        let err = RuntimeError::undeclared_variable("SCORE");
        assert_eq!(err.kind, ErrorKind::UndeclaredVariable);
        assert_eq!(err.message, "Use of undeclared variable 'SCORE'");
    }

    #[test]
    fn test_undeclared_assignment() {
        let err = RuntimeError::undeclared_assignment("SCORE");
        assert_eq!(err.kind, ErrorKind::UndeclaredAssignment);
        assert!(err.message.contains("SCORE"));
    }

    #[test]
    fn test_const_assignment() {
        let err = RuntimeError::const_assignment("PI");
        assert_eq!(err.kind, ErrorKind::ConstAssignment);
        assert_eq!(err.message, "Assignment to constant 'PI'");
    }

    #[test]
    fn test_division_and_modulo_by_zero() {
        assert_eq!(RuntimeError::division_by_zero().kind, ErrorKind::DivisionByZero);
        assert_eq!(RuntimeError::modulo_by_zero().kind, ErrorKind::ModuloByZero);
        assert_eq!(RuntimeError::modulo_by_zero().message, "Modulo by zero");
    }

    #[test]
    fn test_allocation_too_large() {
        let err = RuntimeError::allocation_too_large("REDIM PRESERVE", &[100000, 100000], 50_000_001);
        assert_eq!(err.kind, ErrorKind::AllocationTooLarge);
        assert_eq!(
            err.message,
            "REDIM PRESERVE too large. sizes=[100000,100000] total(capped)=50000001"
        );
    }

    #[test]
    fn test_assertion_failed_default_message() {
        assert_eq!(RuntimeError::assertion_failed(None).message, "Assertion failed");
        assert_eq!(RuntimeError::assertion_failed(Some("x > 0")).message, "x > 0");
    }

    #[test]
    fn test_arity_mismatch() {
        let err = RuntimeError::arity_mismatch("CLAMP", 3, 2);
        assert_eq!(err.kind, ErrorKind::ArityMismatch);
        assert_eq!(err.message, "CLAMP: expected 3 args, got 2");
    }

    #[test]
    fn test_display() {
        let err = RuntimeError::unknown_function("FOO");
        assert_eq!(err.to_string(), "Runtime error: Unknown function: FOO");
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(ErrorKind::Thrown.name(), "Thrown");
        assert_eq!(ErrorKind::AllocationTooLarge.name(), "AllocationTooLarge");
    }
}
