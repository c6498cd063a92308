//! # AST Nodes
//!
//! This module defines the node shapes that make up the Abstract Syntax Tree
//! of the Whacky language. Nodes reference each other through the typed
//! handles of [`crate::ast::arena`], and the whole tree is owned by a single
//! [`Program`].

use crate::ast::arena::{Arena, ExprId, PredId, ScopeId, StmtId, TermId};
use crate::ast::types::{ReturnType, VarType};

/// The root of a parsed Whacky program: the arena holding every node plus
/// the ordered list of top-level statements.
#[derive(Debug)]
pub struct Program {
    /// The arena all node handles below resolve against.
    pub arena: Arena,
    /// Top-level statements in source order.
    pub statements: Vec<StmtId>,
}

// -----------------------------------------------------------------------------

/// Binary operators, one enum for every binary node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Or,
    And,
    Band,
    Bor,
    Xor,
    Eq,
    Neq,
    Le,
    Ge,
    Lt,
    Gt,
    Add,
    Sub,
    Mul,
    Div,
}

impl BinOp {
    /// Precedence level; higher binds tighter. All operators are
    /// left-associative.
    pub fn precedence(&self) -> u8 {
        match self {
            Self::Or | Self::And => 0,
            Self::Bor | Self::Band | Self::Xor => 1,
            Self::Eq | Self::Neq | Self::Le | Self::Ge | Self::Lt | Self::Gt => 2,
            Self::Add | Self::Sub => 3,
            Self::Mul | Self::Div => 4,
        }
    }
}

// -----------------------------------------------------------------------------

/// Atomic expressions.
#[derive(Debug)]
pub enum Term {
    /// An integer literal; the lexeme is kept verbatim.
    IntLit(String),
    /// A boolean literal (`yep` / `nope`).
    BoolLit(bool),
    /// A string literal; raw contents with escape sequences unexpanded.
    StringLit(String),
    /// A variable reference.
    Ident(String),
    /// A parenthesised expression.
    Paren(ExprId),
    /// A function call.
    Call { name: String, args: Vec<ExprId> },
}

/// Expressions: a term or a binary operation.
#[derive(Debug)]
pub enum Expr {
    Term(TermId),
    Binary {
        op: BinOp,
        left: ExprId,
        right: ExprId,
    },
}

// -----------------------------------------------------------------------------

/// A single `name: type` function parameter.
#[derive(Debug)]
pub struct Param {
    pub name: String,
    pub ty: VarType,
}

/// A braced statement list.
#[derive(Debug)]
pub struct Scope {
    pub statements: Vec<StmtId>,
}

/// The `but` / `nah` continuation chain of a `maybe` statement. At most one
/// `nah` may appear and it terminates the chain.
#[derive(Debug)]
pub enum Pred {
    But {
        condition: ExprId,
        body: ScopeId,
        next: Option<PredId>,
    },
    Nah {
        body: ScopeId,
    },
}

/// All statement forms of the Whacky language.
#[derive(Debug)]
pub enum Stmt {
    /// `bye ( expr ) ;`: terminate the process with the given status.
    Bye { value: ExprId },
    /// `gimme ident : type = expr ;`: typed variable declaration.
    Gimme {
        name: String,
        ty: VarType,
        value: ExprId,
    },
    /// `ident = expr ;`: assignment to an existing variable.
    Assign { name: String, value: ExprId },
    /// `{ stmt* }`: a nested scope.
    Scope { body: ScopeId },
    /// `maybe ( expr ) scope pred?`: conditional with optional chain.
    Maybe {
        condition: ExprId,
        body: ScopeId,
        pred: Option<PredId>,
    },
    /// `yell ( expr ) ;`: write a string to stdout.
    Yell { value: ExprId },
    /// `thingy ident ( params ) : type scope`: function definition.
    Thingy {
        name: String,
        params: Vec<Param>,
        return_type: ReturnType,
        body: ScopeId,
    },
    /// `gimmeback expr ;`: return from the enclosing function.
    Gimmeback { value: ExprId },
    /// `roundandround ( ident in expr .. expr ) scope`: range loop.
    RoundAndRound {
        var: String,
        start: ExprId,
        end: ExprId,
        body: ScopeId,
    },
    /// `keepgoing ( expr ) scope`: while loop.
    KeepGoing { condition: ExprId, body: ScopeId },
}
