//! CyberBasic runtime core
//!
//! Tree-walking interpreter for a BASIC-derived scripting language. Programs
//! arrive as an already-parsed AST (built with the [`ast`] constructors or
//! deserialized from JSON) and run against a [`Host`] that supplies native
//! functions, namespaces, types and member hooks.

pub mod ast;
pub mod config;
pub mod console;
pub mod error;
pub mod interp;
pub mod runtime;
pub mod util;

pub use ast::{Expr, Ident, Program, Stmt};
pub use config::InterpreterConfig;
pub use error::{Error, Result};
pub use interp::{Diagnostics, ErrorKind, Interpreter, RuntimeError, Value};
pub use runtime::Host;

use std::path::Path;
use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call multiple times. Nothing is installed unless `RUST_LOG` is
/// set, e.g. `RUST_LOG=cyberbasic=debug`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true).with_writer(std::io::stderr))
                .with(filter)
                .init();
        }
    });
}

/// Decode a program from its JSON form
pub fn parse_program(json: &str) -> Result<Program> {
    Ok(serde_json::from_str(json)?)
}

/// Read and decode a JSON program file
pub fn load_program(path: &Path) -> Result<Program> {
    let source = std::fs::read_to_string(path)
        .map_err(|e| Error::io_error(format!("{}: {e}", path.display())))?;
    parse_program(&source)
}
