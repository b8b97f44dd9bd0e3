// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! Abstract Syntax Tree definitions for the Hiesenoether language.
//!
//! A [`Program`] is what a parser hands to the interpreter: an ordered list of
//! top-level statements whose nodes live in arenas. The AST preserves source
//! spans for failure reporting and covers:
//!
//! - Energy declarations and capability removal
//! - Stable and unstable bindings, stabilization and exact inspection
//! - Invariants and assertions
//! - Stable and unstable control structures, ranged loops and functions

pub mod builder;
pub mod span;

use la_arena::{Arena, Idx};
use smol_str::SmolStr;
use span::Span;
use std::fmt;

pub use builder::ProgramBuilder;

/// Interned string type for identifiers
pub type Ident = SmolStr;

/// Index into an expression arena
pub type ExprId = Idx<Expr>;

/// Index into a statement arena
pub type StmtId = Idx<Stmt>;

/// A complete parsed program.
#[derive(Debug, Clone, Default)]
pub struct Program {
    /// Top-level statements in source order
    pub body: Vec<StmtId>,
    /// Expression arena
    pub exprs: Arena<Expr>,
    /// Statement arena (top-level and nested)
    pub stmts: Arena<Stmt>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc_expr(&mut self, kind: ExprKind, span: Span) -> ExprId {
        self.exprs.alloc(Expr { span, kind })
    }

    pub fn alloc_stmt(&mut self, kind: StmtKind, span: Span) -> StmtId {
        self.stmts.alloc(Stmt { span, kind })
    }

    /// Allocate a statement and append it to the top-level body.
    pub fn push_stmt(&mut self, kind: StmtKind, span: Span) -> StmtId {
        let id = self.alloc_stmt(kind, span);
        self.body.push(id);
        id
    }

    /// Render an expression back to surface syntax.
    pub fn display_expr(&self, expr: ExprId) -> ExprDisplay<'_> {
        ExprDisplay { program: self, expr }
    }
}

/// A sequence of statements (loop bodies, branches, function bodies)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block {
    pub stmts: Vec<StmtId>,
}

impl Block {
    pub fn new(stmts: Vec<StmtId>) -> Self {
        Self { stmts }
    }
}

// === Statements ===

/// Whether a binding or control structure pays for stability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Stability {
    Stable,
    #[default]
    Unstable,
}

/// Control structure shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ControlKind {
    If,
    While,
}

/// Declared purity of a function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Purity {
    #[default]
    Regular,
    Pure,
    Unstable,
}

/// A function declaration
#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: Ident,
    pub params: Vec<Ident>,
    pub purity: Purity,
    pub body: Block,
}

/// A statement
#[derive(Debug, Clone)]
pub struct Stmt {
    pub span: Span,
    pub kind: StmtKind,
}

/// Statement kinds
#[derive(Debug, Clone)]
pub enum StmtKind {
    /// `energy[amount]`
    EnergyDecl(u64),
    /// `x <- init` or `stable x <- init`
    Bind {
        name: Ident,
        stability: Stability,
        init: ExprId,
    },
    /// Reassignment of an existing binding
    Assign { name: Ident, value: ExprId },
    /// `print expr`
    Print(ExprId),
    /// `inspect x`
    Inspect(Ident),
    /// `stabilize x`
    Stabilize(Ident),
    /// `invariant predicate`
    Invariant(ExprId),
    /// `[stable] if` / `[stable] while`
    Control {
        stability: Stability,
        kind: ControlKind,
        condition: ExprId,
        then_body: Block,
        else_body: Option<Block>,
    },
    /// `remove capability`
    RemoveCapability(Ident),
    /// `query energy`
    QueryEnergy,
    /// `assert condition`
    Assert(ExprId),
    /// `for var in start..end`
    For {
        var: Ident,
        start: ExprId,
        end: ExprId,
        body: Block,
    },
    /// `declare [pure|unstable] fn name(params) { body }`
    FunctionDecl(FunctionDecl),
    /// `return [expr]`
    Return(Option<ExprId>),
    /// Expression evaluated for its effects
    Expr(ExprId),
}

// === Expressions ===

/// An expression
#[derive(Debug, Clone)]
pub struct Expr {
    pub span: Span,
    pub kind: ExprKind,
}

/// Expression kinds
#[derive(Debug, Clone)]
pub enum ExprKind {
    Literal(Literal),
    /// Variable reference
    Var(Ident),
    Unary { op: UnaryOp, operand: ExprId },
    Binary {
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
    },
    /// Function call
    Call { func: Ident, args: Vec<ExprId> },
}

/// Literal values
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Literal {
    Int(i64),
    Float(f64),
    Bool(bool),
    String(SmolStr),
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UnaryOp {
    Neg,
    Not,
}

impl UnaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "not ",
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(n) => write!(f, "{}", n),
            Literal::Float(x) => write!(f, "{:?}", x),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::String(s) => write!(f, "\"{}\"", s),
        }
    }
}

/// Surface-syntax rendering of an expression, see [`Program::display_expr`].
pub struct ExprDisplay<'a> {
    program: &'a Program,
    expr: ExprId,
}

impl fmt::Display for ExprDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sub = |expr: ExprId| self.program.display_expr(expr);
        match &self.program.exprs[self.expr].kind {
            ExprKind::Literal(lit) => write!(f, "{}", lit),
            ExprKind::Var(name) => write!(f, "{}", name),
            ExprKind::Unary { op, operand } => write!(f, "{}{}", op.as_str(), sub(*operand)),
            ExprKind::Binary { op, lhs, rhs } => {
                let nested = |id: ExprId| {
                    matches!(self.program.exprs[id].kind, ExprKind::Binary { .. })
                };
                if nested(*lhs) {
                    write!(f, "({})", sub(*lhs))?;
                } else {
                    write!(f, "{}", sub(*lhs))?;
                }
                write!(f, " {} ", op.as_str())?;
                if nested(*rhs) {
                    write!(f, "({})", sub(*rhs))
                } else {
                    write!(f, "{}", sub(*rhs))
                }
            }
            ExprKind::Call { func, args } => {
                write!(f, "{}(", func)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", sub(*arg))?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_expr() {
        let mut program = Program::new();
        let x = program.alloc_expr(ExprKind::Var("x".into()), Span::dummy());
        let one = program.alloc_expr(ExprKind::Literal(Literal::Int(1)), Span::dummy());
        let sum = program.alloc_expr(
            ExprKind::Binary { op: BinaryOp::Add, lhs: x, rhs: one },
            Span::dummy(),
        );
        let zero = program.alloc_expr(ExprKind::Literal(Literal::Int(0)), Span::dummy());
        let cmp = program.alloc_expr(
            ExprKind::Binary { op: BinaryOp::Gt, lhs: sum, rhs: zero },
            Span::dummy(),
        );
        assert_eq!(program.display_expr(cmp).to_string(), "(x + 1) > 0");
    }

    #[test]
    fn test_push_stmt_appends_to_body() {
        let mut program = Program::new();
        let a = program.push_stmt(StmtKind::EnergyDecl(10), Span::new(0, 10));
        let nested = program.alloc_stmt(StmtKind::QueryEnergy, Span::dummy());
        let b = program.push_stmt(StmtKind::QueryEnergy, Span::new(11, 23));
        assert_eq!(program.body, vec![a, b]);
        assert_eq!(program.stmts.len(), 3);
        assert!(!program.body.contains(&nested));
    }
}
