//! # AST Arena
//!
//! A bump allocator for AST records. Every node produced by the parser lives
//! here; nodes refer to each other through the typed index handles below, so
//! the mutually recursive shapes (expression under term, predicate chains,
//! statements under scopes) never need reference counting. The whole arena
//! is released in one go when the compile ends.
//!
//! Allocation is charged against a fixed byte budget (4 MiB by default);
//! running out is a fatal compile error.

use crate::ast::nodes::{Expr, Pred, Scope, Stmt, Term};
use crate::compiler::error::CompileError;

/// Default arena budget in bytes.
pub const DEFAULT_CAPACITY: usize = 4 * 1024 * 1024;

/// Handle to a [`Term`] record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermId(u32);

/// Handle to an [`Expr`] record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExprId(u32);

/// Handle to a [`Stmt`] record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StmtId(u32);

/// Handle to a [`Pred`] record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredId(u32);

/// Handle to a [`Scope`] record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeId(u32);

/// The arena itself. One instance per compile, owned by the [`Program`]
/// the parser returns.
///
/// [`Program`]: crate::ast::nodes::Program
#[derive(Debug)]
pub struct Arena {
    capacity: usize,
    used: usize,
    terms: Vec<Term>,
    exprs: Vec<Expr>,
    stmts: Vec<Stmt>,
    preds: Vec<Pred>,
    scopes: Vec<Scope>,
}

impl Arena {
    /// Creates an arena with the default 4 MiB budget.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates an arena with an explicit byte budget.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            used: 0,
            terms: Vec::new(),
            exprs: Vec::new(),
            stmts: Vec::new(),
            preds: Vec::new(),
            scopes: Vec::new(),
        }
    }

    /// Bytes handed out so far.
    pub fn used(&self) -> usize {
        self.used
    }

    fn charge(&mut self, bytes: usize) -> Result<(), CompileError> {
        if self.used + bytes > self.capacity {
            return Err(CompileError::ast_alloc(format!(
                "AST arena exhausted ({} of {} bytes used)",
                self.used, self.capacity
            )));
        }
        self.used += bytes;
        Ok(())
    }

    pub fn alloc_term(&mut self, term: Term) -> Result<TermId, CompileError> {
        self.charge(std::mem::size_of::<Term>())?;
        self.terms.push(term);
        Ok(TermId(self.terms.len() as u32 - 1))
    }

    pub fn alloc_expr(&mut self, expr: Expr) -> Result<ExprId, CompileError> {
        self.charge(std::mem::size_of::<Expr>())?;
        self.exprs.push(expr);
        Ok(ExprId(self.exprs.len() as u32 - 1))
    }

    pub fn alloc_stmt(&mut self, stmt: Stmt) -> Result<StmtId, CompileError> {
        self.charge(std::mem::size_of::<Stmt>())?;
        self.stmts.push(stmt);
        Ok(StmtId(self.stmts.len() as u32 - 1))
    }

    pub fn alloc_pred(&mut self, pred: Pred) -> Result<PredId, CompileError> {
        self.charge(std::mem::size_of::<Pred>())?;
        self.preds.push(pred);
        Ok(PredId(self.preds.len() as u32 - 1))
    }

    pub fn alloc_scope(&mut self, scope: Scope) -> Result<ScopeId, CompileError> {
        self.charge(std::mem::size_of::<Scope>())?;
        self.scopes.push(scope);
        Ok(ScopeId(self.scopes.len() as u32 - 1))
    }

    pub fn term(&self, id: TermId) -> &Term {
        &self.terms[id.0 as usize]
    }

    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.0 as usize]
    }

    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.0 as usize]
    }

    pub fn pred(&self, id: PredId) -> &Pred {
        &self.preds[id.0 as usize]
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::nodes::{Expr, Term};

    #[test]
    fn test_alloc_and_fetch() {
        let mut arena = Arena::new();
        let term = arena.alloc_term(Term::IntLit("42".to_string())).unwrap();
        let expr = arena.alloc_expr(Expr::Term(term)).unwrap();

        assert!(matches!(arena.term(term), Term::IntLit(v) if v == "42"));
        assert!(matches!(arena.expr(expr), Expr::Term(t) if *t == term));
        assert!(arena.used() > 0);
    }

    #[test]
    fn test_exhaustion_is_fatal() {
        let mut arena = Arena::with_capacity(std::mem::size_of::<Term>());
        arena.alloc_term(Term::BoolLit(true)).unwrap();

        let err = arena.alloc_term(Term::BoolLit(false)).unwrap_err();
        assert!(err.to_string().contains("AST arena exhausted"));
    }
}
