//! Abstract Syntax Tree definitions
//!
//! The tree is produced by an external parser and consumed read-only by the
//! interpreter. Every identifier is wrapped in [`Ident`], which canonicalizes
//! case once at construction (or deserialization) so the evaluator only ever
//! compares pre-normalized names.

mod expr;
mod stmt;

pub use expr::*;
pub use stmt::*;

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::rc::Rc;

/// Case-normalized identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Ident(String);

impl Ident {
    pub fn new(name: impl AsRef<str>) -> Self {
        Ident(name.as_ref().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Ident {
    fn from(name: String) -> Self {
        Ident::new(name)
    }
}

impl From<&str> for Ident {
    fn from(name: &str) -> Self {
        Ident::new(name)
    }
}

impl From<Ident> for String {
    fn from(ident: Ident) -> Self {
        ident.0
    }
}

impl Borrow<str> for Ident {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Ident {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A program is an ordered sequence of top-level statements
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl Program {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Program { statements }
    }
}

/// Sub / Function / lambda parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Param {
    pub name: Ident,
    /// Default value, evaluated in the partially bound call frame
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Expr>,
}

impl Param {
    pub fn new(name: impl Into<Ident>) -> Self {
        Param {
            name: name.into(),
            default: None,
        }
    }

    pub fn with_default(name: impl Into<Ident>, default: Expr) -> Self {
        Param {
            name: name.into(),
            default: Some(default),
        }
    }
}

/// SUB declaration (never yields a value)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubDecl {
    pub name: Ident,
    #[serde(default)]
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
}

/// FUNCTION declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: Ident,
    #[serde(default)]
    pub params: Vec<Param>,
    /// Declared return type (INTEGER, STRING, ...), checked only in debug mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<Ident>,
    pub body: Vec<Stmt>,
}

/// Method declared inside a TYPE block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MethodDecl {
    Sub(SubDecl),
    Function(FunctionDecl),
}

impl MethodDecl {
    pub fn name(&self) -> &Ident {
        match self {
            MethodDecl::Sub(sub) => &sub.name,
            MethodDecl::Function(func) => &func.name,
        }
    }
}

/// Field of a user-defined TYPE
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeField {
    pub name: Ident,
    /// Declared field type, used to pick the default value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<Ident>,
}

/// TYPE ... END TYPE declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: Ident,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<Ident>,
    #[serde(default)]
    pub fields: Vec<TypeField>,
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
}

/// ENUM member with an optional explicit value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumMember {
    pub name: Ident,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Expr>,
}

/// Lambda literal; shared so lambda values can refer back to their node
pub type LambdaRef = Rc<LambdaExpr>;

/// Lambda body and parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LambdaExpr {
    #[serde(default)]
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
}
