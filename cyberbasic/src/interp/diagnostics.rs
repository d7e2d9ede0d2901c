//! Diagnostic output for the interpreter
//!
//! User-facing diagnostics (uncaught failure reports, debug-mode member
//! suggestions, DEBUGPRINT, return-type warnings) go through a
//! [`Diagnostics`] sink instead of straight to stderr, so embedders and
//! tests can capture them.

use std::cell::RefCell;

/// Where diagnostic lines go
#[derive(Debug, Default)]
pub enum Diagnostics {
    /// Write each line to stderr
    #[default]
    Stderr,
    /// Capture lines in memory
    Buffer(RefCell<Vec<String>>),
    /// Drop everything
    Silent,
}

impl Diagnostics {
    pub fn buffer() -> Self {
        Diagnostics::Buffer(RefCell::new(Vec::new()))
    }

    /// Emit one diagnostic (may span several lines)
    pub fn emit(&self, message: &str) {
        match self {
            Diagnostics::Stderr => eprintln!("{message}"),
            Diagnostics::Buffer(lines) => lines.borrow_mut().push(message.to_string()),
            Diagnostics::Silent => {}
        }
    }

    /// Captured output, one entry per emit; empty unless buffering
    pub fn captured(&self) -> Vec<String> {
        match self {
            Diagnostics::Buffer(lines) => lines.borrow().clone(),
            Diagnostics::Stderr | Diagnostics::Silent => Vec::new(),
        }
    }

    /// Clear captured output
    pub fn clear(&self) {
        if let Diagnostics::Buffer(lines) = self {
            lines.borrow_mut().clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_captures() {
        let diag = Diagnostics::buffer();
        diag.emit("first");
        diag.emit("second\n  more");
        assert_eq!(diag.captured(), vec!["first", "second\n  more"]);
        diag.clear();
        assert!(diag.captured().is_empty());
    }

    #[test]
    fn test_silent_and_stderr_capture_nothing() {
        let silent = Diagnostics::Silent;
        silent.emit("dropped");
        assert!(silent.captured().is_empty());
        assert!(Diagnostics::default().captured().is_empty());
    }
}
