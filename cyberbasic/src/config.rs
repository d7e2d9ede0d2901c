//! Interpreter configuration
//!
//! Loaded from a TOML file; every key is optional.
//!
//! ```toml
//! strict = true
//! debug = false
//! max_array_elements = 1000000
//! max_call_depth = 2000
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default cap on the total element count of one array shape
pub const DEFAULT_MAX_ARRAY_ELEMENTS: usize = 50_000_000;
/// Default limit on nested Sub/Function/lambda calls
pub const DEFAULT_MAX_CALL_DEPTH: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InterpreterConfig {
    /// Start the root scope under OPTION EXPLICIT
    pub strict: bool,
    /// Debug-mode diagnostics (member suggestions, DEBUGPRINT, breakpoints)
    pub debug: bool,
    /// Allocation cap for DIM/REDIM, indexed growth and ranges
    pub max_array_elements: usize,
    /// Nesting limit for user calls
    pub max_call_depth: usize,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        InterpreterConfig {
            strict: false,
            debug: false,
            max_array_elements: DEFAULT_MAX_ARRAY_ELEMENTS,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

impl InterpreterConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| Error::io_error(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&source)
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_max_array_elements(mut self, max: usize) -> Self {
        self.max_array_elements = max;
        self
    }

    pub fn with_max_call_depth(mut self, max: usize) -> Self {
        self.max_call_depth = max;
        self
    }
}
