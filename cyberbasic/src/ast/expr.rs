//! Expression AST nodes

use super::{Ident, LambdaExpr, LambdaRef, Param, Stmt};
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// Expression
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expr {
    /// NIL literal
    Nil,
    /// TRUE / FALSE
    Bool(bool),
    /// Integer literal
    Int(i64),
    /// Floating point literal
    Float(f64),
    /// String literal
    Str(String),

    /// Variable reference
    Var(Ident),

    /// Unary operation
    Unary { op: UnaryOp, operand: Box<Expr> },

    /// Binary operation
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// `target(i, j, ...)` / `target[i]`
    Index { target: Box<Expr>, indices: Vec<Expr> },

    /// Call by name: Sub, Function, type constructor, callable variable or native
    Call {
        callee: Ident,
        #[serde(default)]
        args: Vec<Expr>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        named: Vec<NamedArg>,
    },

    /// `object.member`
    Member { object: Box<Expr>, member: Ident },

    /// `object.method(args)`
    MethodCall {
        object: Box<Expr>,
        method: Ident,
        #[serde(default)]
        args: Vec<Expr>,
    },

    /// `[a, b, ...rest]`
    Array(Vec<Expr>),

    /// `{key: value, ...}`
    Map(Vec<MapEntry>),

    /// `FUNCTION(params) ... END FUNCTION` used as a value
    Lambda(LambdaRef),

    /// Interpolated string, parts concatenated in order
    Interpolated(Vec<Expr>),

    /// `start..end`, inclusive
    Range { start: Box<Expr>, end: Box<Expr> },

    /// `[expr FOR var IN source IF filter]`
    Comprehension {
        expr: Box<Expr>,
        var: Ident,
        source: Box<Expr>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filter: Option<Box<Expr>>,
    },

    /// `MATCH subject CASE ... END MATCH`
    Match {
        subject: Box<Expr>,
        arms: Vec<MatchArm>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<Box<Expr>>,
    },

    /// `object?.member`
    NullSafeMember { object: Box<Expr>, member: Ident },

    /// `object?[index]`
    NullSafeIndex { object: Box<Expr>, index: Box<Expr> },

    /// `left ?? right`
    Coalesce { left: Box<Expr>, right: Box<Expr> },

    /// `...expr`, expanded inside array literals and argument lists
    Spread(Box<Expr>),

    /// `(a, b, c)`, represented as an array value
    Tuple(Vec<Expr>),

    /// `TYPEOF(expr)`
    TypeOf(Box<Expr>),

    /// `GETPROPERTIES(expr)`
    GetProperties(Box<Expr>),

    /// `GETMETHODS(expr)`
    GetMethods(Box<Expr>),

    /// `SUPER.method(args)` inside a type method
    SuperCall {
        method: Ident,
        #[serde(default)]
        args: Vec<Expr>,
    },
}

/// Named call argument: `name := value`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedArg {
    pub name: Ident,
    pub value: Expr,
}

/// Map literal entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapEntry {
    pub key: Expr,
    pub value: Expr,
}

/// One `CASE pattern => result` arm of a MATCH expression
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchArm {
    pub pattern: Expr,
    pub result: Expr,
}

/// Binary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    /// Integer division `\`
    IntDiv,
    Mod,
    Pow,

    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    // Logical (never short-circuit)
    And,
    Or,
    Xor,
}

impl BinaryOp {
    /// True for `= <> < <= > >=`
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinaryOp::Add => write!(f, "+"),
            BinaryOp::Sub => write!(f, "-"),
            BinaryOp::Mul => write!(f, "*"),
            BinaryOp::Div => write!(f, "/"),
            BinaryOp::IntDiv => write!(f, "\\"),
            BinaryOp::Mod => write!(f, "MOD"),
            BinaryOp::Pow => write!(f, "^"),
            BinaryOp::Eq => write!(f, "="),
            BinaryOp::Ne => write!(f, "<>"),
            BinaryOp::Lt => write!(f, "<"),
            BinaryOp::Le => write!(f, "<="),
            BinaryOp::Gt => write!(f, ">"),
            BinaryOp::Ge => write!(f, ">="),
            BinaryOp::And => write!(f, "AND"),
            BinaryOp::Or => write!(f, "OR"),
            BinaryOp::Xor => write!(f, "XOR"),
        }
    }
}

/// Unary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Negation (-)
    Neg,
    /// Identity (+)
    Plus,
    /// Logical NOT over truthiness
    Not,
}

impl std::fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnaryOp::Neg => write!(f, "-"),
            UnaryOp::Plus => write!(f, "+"),
            UnaryOp::Not => write!(f, "NOT"),
        }
    }
}

// Constructors used by hosts that build trees directly and by tests.
impl Expr {
    pub fn int(n: i64) -> Self {
        Expr::Int(n)
    }

    pub fn float(x: f64) -> Self {
        Expr::Float(x)
    }

    pub fn str(s: impl Into<String>) -> Self {
        Expr::Str(s.into())
    }

    pub fn var(name: impl Into<Ident>) -> Self {
        Expr::Var(name.into())
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn index(target: Expr, indices: Vec<Expr>) -> Self {
        Expr::Index {
            target: Box::new(target),
            indices,
        }
    }

    pub fn call(callee: impl Into<Ident>, args: Vec<Expr>) -> Self {
        Expr::Call {
            callee: callee.into(),
            args,
            named: Vec::new(),
        }
    }

    pub fn call_named(callee: impl Into<Ident>, args: Vec<Expr>, named: Vec<(&str, Expr)>) -> Self {
        Expr::Call {
            callee: callee.into(),
            args,
            named: named
                .into_iter()
                .map(|(name, value)| NamedArg {
                    name: Ident::new(name),
                    value,
                })
                .collect(),
        }
    }

    pub fn member(object: Expr, member: impl Into<Ident>) -> Self {
        Expr::Member {
            object: Box::new(object),
            member: member.into(),
        }
    }

    pub fn method(object: Expr, method: impl Into<Ident>, args: Vec<Expr>) -> Self {
        Expr::MethodCall {
            object: Box::new(object),
            method: method.into(),
            args,
        }
    }

    /// Map literal from `(key, value)` pairs with string keys
    pub fn map(entries: Vec<(&str, Expr)>) -> Self {
        Expr::Map(
            entries
                .into_iter()
                .map(|(key, value)| MapEntry {
                    key: Expr::str(key),
                    value,
                })
                .collect(),
        )
    }

    pub fn lambda(params: Vec<Param>, body: Vec<Stmt>) -> Self {
        Expr::Lambda(Rc::new(LambdaExpr { params, body }))
    }

    pub fn range(start: Expr, end: Expr) -> Self {
        Expr::Range {
            start: Box::new(start),
            end: Box::new(end),
        }
    }
}
