//! Statement AST nodes

use super::{BinaryOp, EnumMember, Expr, FunctionDecl, Ident, NamedArg, SubDecl, TypeDecl};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Statement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Stmt {
    /// `OPTION EXPLICIT`
    OptionExplicit,
    /// `LOCAL a [= expr], b`
    Local(Vec<LocalBinding>),
    /// `GLOBAL a, b`
    Global(Vec<Ident>),
    /// `LET name = value` (declares in the current scope)
    Let { name: Ident, value: Expr },
    /// `name = value`
    Assign { name: Ident, value: Expr },
    /// `CONST name = value`
    Const { name: Ident, value: Expr },
    /// `name(i, j) = value`
    AssignIndex {
        name: Ident,
        indices: Vec<Expr>,
        value: Expr,
    },
    /// `object.member = value`
    AssignMember {
        object: Expr,
        member: Ident,
        value: Expr,
    },
    /// `LET [a, b] = value` / `LET {a, b} = value`
    Destructure { names: Vec<Ident>, value: Expr },
    /// `PRINT expr`
    Print(Expr),
    /// Expression evaluated for its side effects
    Expr(Expr),
    /// `CALL name(args)` or bare `name args`
    Call {
        name: Ident,
        #[serde(default)]
        args: Vec<Expr>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        named: Vec<NamedArg>,
    },
    /// `IF ... ELSEIF ... ELSE ... END IF`
    If {
        branches: Vec<IfBranch>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        else_body: Option<Vec<Stmt>>,
    },
    /// `WHILE cond ... WEND`
    While { cond: Expr, body: Vec<Stmt> },
    /// `FOR var = start TO end [STEP step] ... NEXT`
    For {
        var: Ident,
        start: Expr,
        end: Expr,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        step: Option<Expr>,
        body: Vec<Stmt>,
    },
    /// `FOR EACH var IN collection ... NEXT`
    ForEach {
        var: Ident,
        collection: Expr,
        body: Vec<Stmt>,
    },
    /// `DO ... LOOP` (left via BREAK / EXIT DO)
    Do { body: Vec<Stmt> },
    /// `REPEAT ... UNTIL cond`
    Repeat { body: Vec<Stmt>, until: Expr },
    /// `SELECT CASE selector ... END SELECT`
    SelectCase {
        selector: Expr,
        branches: Vec<CaseBranch>,
    },
    /// `RETURN [value]`
    Return(Option<Expr>),
    /// `BREAK`
    Break,
    /// `CONTINUE`
    Continue,
    /// `EXIT FOR | WHILE | DO | REPEAT | SUB | FUNCTION`
    Exit(ExitTarget),
    /// `DIM name(s1, s2, ...)`
    Dim { name: Ident, sizes: Vec<Expr> },
    /// `REDIM [PRESERVE] name(s1, s2, ...)`
    Redim {
        name: Ident,
        sizes: Vec<Expr>,
        #[serde(default)]
        preserve: bool,
    },
    /// `SUB ... END SUB` (collected before execution)
    Sub(SubDecl),
    /// `FUNCTION ... END FUNCTION` (collected before execution)
    Function(FunctionDecl),
    /// `TYPE ... END TYPE` (collected before execution)
    Type(TypeDecl),
    /// `ENUM name ... END ENUM`
    Enum { name: Ident, members: Vec<EnumMember> },
    /// `TRY ... CATCH e ... FINALLY ... END TRY`
    Try {
        body: Vec<Stmt>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        catch: Option<CatchClause>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        finally: Option<Vec<Stmt>>,
    },
    /// `THROW value`
    Throw(Expr),
    /// `ASSERT cond [, message]`
    Assert {
        cond: Expr,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<Expr>,
    },
    /// `USING name = resource ... END USING`
    Using {
        name: Ident,
        resource: Expr,
        body: Vec<Stmt>,
    },
    /// `DEBUGPRINT expr` (debug mode only)
    DebugPrint(Expr),
    /// `BREAKPOINT` (debug mode only)
    Breakpoint,
}

/// One name of a LOCAL declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalBinding {
    pub name: Ident,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Expr>,
}

/// `IF cond THEN body` / `ELSEIF cond THEN body`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IfBranch {
    pub cond: Expr,
    pub body: Vec<Stmt>,
}

/// `CATCH var` clause
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatchClause {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub var: Option<Ident>,
    pub body: Vec<Stmt>,
}

/// One branch of SELECT CASE
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseBranch {
    pub test: CaseTest,
    pub body: Vec<Stmt>,
}

/// What a CASE branch matches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CaseTest {
    /// `CASE a, b, c` (exact equality against any value)
    Values(Vec<Expr>),
    /// `CASE IS < expr`
    Relational { op: BinaryOp, value: Expr },
    /// `CASE ELSE`
    Else,
}

/// Target of an `EXIT` statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ExitTarget {
    For,
    While,
    /// `EXIT DO`, also spelled `EXIT LOOP`
    Do,
    /// `EXIT REPEAT`, also spelled `EXIT UNTIL`
    Repeat,
    Sub,
    Function,
}

impl ExitTarget {
    pub fn keyword(self) -> &'static str {
        match self {
            ExitTarget::For => "FOR",
            ExitTarget::While => "WHILE",
            ExitTarget::Do => "DO",
            ExitTarget::Repeat => "REPEAT",
            ExitTarget::Sub => "SUB",
            ExitTarget::Function => "FUNCTION",
        }
    }
}

impl fmt::Display for ExitTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for ExitTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "FOR" => Ok(ExitTarget::For),
            "WHILE" => Ok(ExitTarget::While),
            "DO" | "LOOP" => Ok(ExitTarget::Do),
            "REPEAT" | "UNTIL" => Ok(ExitTarget::Repeat),
            "SUB" => Ok(ExitTarget::Sub),
            "FUNCTION" => Ok(ExitTarget::Function),
            other => Err(format!("unknown EXIT target: {other}")),
        }
    }
}

impl TryFrom<String> for ExitTarget {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ExitTarget> for String {
    fn from(target: ExitTarget) -> Self {
        target.keyword().to_string()
    }
}

// Constructors used by hosts that build trees directly and by tests.
impl Stmt {
    pub fn let_(name: impl Into<Ident>, value: Expr) -> Self {
        Stmt::Let {
            name: name.into(),
            value,
        }
    }

    pub fn assign(name: impl Into<Ident>, value: Expr) -> Self {
        Stmt::Assign {
            name: name.into(),
            value,
        }
    }

    pub fn constant(name: impl Into<Ident>, value: Expr) -> Self {
        Stmt::Const {
            name: name.into(),
            value,
        }
    }

    pub fn local(name: impl Into<Ident>, value: Option<Expr>) -> Self {
        Stmt::Local(vec![LocalBinding {
            name: name.into(),
            value,
        }])
    }

    pub fn global(names: &[&str]) -> Self {
        Stmt::Global(names.iter().map(Ident::new).collect())
    }

    pub fn call(name: impl Into<Ident>, args: Vec<Expr>) -> Self {
        Stmt::Call {
            name: name.into(),
            args,
            named: Vec::new(),
        }
    }

    pub fn if_(cond: Expr, body: Vec<Stmt>, else_body: Option<Vec<Stmt>>) -> Self {
        Stmt::If {
            branches: vec![IfBranch { cond, body }],
            else_body,
        }
    }

    pub fn while_(cond: Expr, body: Vec<Stmt>) -> Self {
        Stmt::While { cond, body }
    }

    pub fn for_(var: impl Into<Ident>, start: Expr, end: Expr, step: Option<Expr>, body: Vec<Stmt>) -> Self {
        Stmt::For {
            var: var.into(),
            start,
            end,
            step,
            body,
        }
    }

    pub fn dim(name: impl Into<Ident>, sizes: Vec<Expr>) -> Self {
        Stmt::Dim {
            name: name.into(),
            sizes,
        }
    }

    pub fn redim(name: impl Into<Ident>, sizes: Vec<Expr>, preserve: bool) -> Self {
        Stmt::Redim {
            name: name.into(),
            sizes,
            preserve,
        }
    }

    pub fn assign_index(name: impl Into<Ident>, indices: Vec<Expr>, value: Expr) -> Self {
        Stmt::AssignIndex {
            name: name.into(),
            indices,
            value,
        }
    }

    pub fn assign_member(object: Expr, member: impl Into<Ident>, value: Expr) -> Self {
        Stmt::AssignMember {
            object,
            member: member.into(),
            value,
        }
    }

    pub fn try_(body: Vec<Stmt>, catch: Option<CatchClause>, finally: Option<Vec<Stmt>>) -> Self {
        Stmt::Try {
            body,
            catch,
            finally,
        }
    }
}
