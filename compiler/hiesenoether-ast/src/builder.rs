// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! Programmatic construction of [`Program`]s.
//!
//! Statements are appended to the innermost open block, so nested bodies read
//! in source order:
//!
//! ```
//! use hiesenoether_ast::{BinaryOp, ProgramBuilder, Stability};
//!
//! let mut b = ProgramBuilder::new();
//! b.energy(100);
//! let ten = b.int(10);
//! b.bind("x", ten);
//! let x = b.var("x");
//! let limit = b.int(20);
//! let cond = b.binary(BinaryOp::Lt, x, limit);
//! b.while_loop(Stability::Unstable, cond, |b| {
//!     let x = b.var("x");
//!     b.print(x);
//! });
//! let program = b.finish();
//! assert_eq!(program.body.len(), 3);
//! ```

use crate::span::Span;
use crate::{
    BinaryOp, Block, ControlKind, ExprId, ExprKind, FunctionDecl, Ident, Literal, Program,
    Purity, Stability, StmtId, StmtKind, UnaryOp,
};

/// Incremental builder for a [`Program`].
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    program: Program,
    /// Open nested blocks, innermost last
    frames: Vec<Vec<StmtId>>,
    next_span: Option<Span>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> Program {
        debug_assert!(self.frames.is_empty(), "unclosed block");
        self.program
    }

    /// Attach `span` to the next statement.
    pub fn at(&mut self, span: Span) -> &mut Self {
        self.next_span = Some(span);
        self
    }

    // === Expressions ===

    pub fn expr(&mut self, kind: ExprKind) -> ExprId {
        self.program.alloc_expr(kind, Span::dummy())
    }

    pub fn int(&mut self, value: i64) -> ExprId {
        self.expr(ExprKind::Literal(Literal::Int(value)))
    }

    pub fn float(&mut self, value: f64) -> ExprId {
        self.expr(ExprKind::Literal(Literal::Float(value)))
    }

    pub fn boolean(&mut self, value: bool) -> ExprId {
        self.expr(ExprKind::Literal(Literal::Bool(value)))
    }

    pub fn string(&mut self, value: &str) -> ExprId {
        self.expr(ExprKind::Literal(Literal::String(value.into())))
    }

    pub fn var(&mut self, name: &str) -> ExprId {
        self.expr(ExprKind::Var(name.into()))
    }

    pub fn neg(&mut self, operand: ExprId) -> ExprId {
        self.expr(ExprKind::Unary { op: UnaryOp::Neg, operand })
    }

    pub fn not(&mut self, operand: ExprId) -> ExprId {
        self.expr(ExprKind::Unary { op: UnaryOp::Not, operand })
    }

    pub fn binary(&mut self, op: BinaryOp, lhs: ExprId, rhs: ExprId) -> ExprId {
        self.expr(ExprKind::Binary { op, lhs, rhs })
    }

    pub fn call(&mut self, func: &str, args: Vec<ExprId>) -> ExprId {
        self.expr(ExprKind::Call { func: func.into(), args })
    }

    // === Statements ===

    /// Append a statement to the innermost open block.
    pub fn stmt(&mut self, kind: StmtKind) -> StmtId {
        let span = self.next_span.take().unwrap_or_else(Span::dummy);
        let id = self.program.alloc_stmt(kind, span);
        match self.frames.last_mut() {
            Some(frame) => frame.push(id),
            None => self.program.body.push(id),
        }
        id
    }

    pub fn energy(&mut self, amount: u64) -> StmtId {
        self.stmt(StmtKind::EnergyDecl(amount))
    }

    /// Unstable binding (`x <- init`).
    pub fn bind(&mut self, name: &str, init: ExprId) -> StmtId {
        self.stmt(StmtKind::Bind {
            name: name.into(),
            stability: Stability::Unstable,
            init,
        })
    }

    /// Stable binding (`stable x <- init`).
    pub fn bind_stable(&mut self, name: &str, init: ExprId) -> StmtId {
        self.stmt(StmtKind::Bind {
            name: name.into(),
            stability: Stability::Stable,
            init,
        })
    }

    pub fn assign(&mut self, name: &str, value: ExprId) -> StmtId {
        self.stmt(StmtKind::Assign { name: name.into(), value })
    }

    pub fn print(&mut self, value: ExprId) -> StmtId {
        self.stmt(StmtKind::Print(value))
    }

    pub fn inspect(&mut self, name: &str) -> StmtId {
        self.stmt(StmtKind::Inspect(name.into()))
    }

    pub fn stabilize(&mut self, name: &str) -> StmtId {
        self.stmt(StmtKind::Stabilize(name.into()))
    }

    pub fn invariant(&mut self, predicate: ExprId) -> StmtId {
        self.stmt(StmtKind::Invariant(predicate))
    }

    pub fn remove(&mut self, capability: &str) -> StmtId {
        self.stmt(StmtKind::RemoveCapability(capability.into()))
    }

    pub fn query_energy(&mut self) -> StmtId {
        self.stmt(StmtKind::QueryEnergy)
    }

    pub fn assert(&mut self, condition: ExprId) -> StmtId {
        self.stmt(StmtKind::Assert(condition))
    }

    pub fn ret(&mut self, value: Option<ExprId>) -> StmtId {
        self.stmt(StmtKind::Return(value))
    }

    pub fn expr_stmt(&mut self, expr: ExprId) -> StmtId {
        self.stmt(StmtKind::Expr(expr))
    }

    /// Collect the statements appended by `f` into a block.
    pub fn block(&mut self, f: impl FnOnce(&mut Self)) -> Block {
        self.frames.push(Vec::new());
        f(self);
        Block::new(self.frames.pop().unwrap_or_default())
    }

    pub fn if_then(
        &mut self,
        stability: Stability,
        condition: ExprId,
        then_body: impl FnOnce(&mut Self),
    ) -> StmtId {
        let span = self.next_span.take();
        let then_body = self.block(then_body);
        self.next_span = span;
        self.stmt(StmtKind::Control {
            stability,
            kind: ControlKind::If,
            condition,
            then_body,
            else_body: None,
        })
    }

    pub fn if_else(
        &mut self,
        stability: Stability,
        condition: ExprId,
        then_body: impl FnOnce(&mut Self),
        else_body: impl FnOnce(&mut Self),
    ) -> StmtId {
        let span = self.next_span.take();
        let then_body = self.block(then_body);
        let else_body = self.block(else_body);
        self.next_span = span;
        self.stmt(StmtKind::Control {
            stability,
            kind: ControlKind::If,
            condition,
            then_body,
            else_body: Some(else_body),
        })
    }

    pub fn while_loop(
        &mut self,
        stability: Stability,
        condition: ExprId,
        body: impl FnOnce(&mut Self),
    ) -> StmtId {
        let span = self.next_span.take();
        let then_body = self.block(body);
        self.next_span = span;
        self.stmt(StmtKind::Control {
            stability,
            kind: ControlKind::While,
            condition,
            then_body,
            else_body: None,
        })
    }

    pub fn for_range(
        &mut self,
        var: &str,
        start: ExprId,
        end: ExprId,
        body: impl FnOnce(&mut Self),
    ) -> StmtId {
        let span = self.next_span.take();
        let body = self.block(body);
        self.next_span = span;
        self.stmt(StmtKind::For {
            var: var.into(),
            start,
            end,
            body,
        })
    }

    pub fn function(
        &mut self,
        name: &str,
        params: &[&str],
        purity: Purity,
        body: impl FnOnce(&mut Self),
    ) -> StmtId {
        let span = self.next_span.take();
        let body = self.block(body);
        self.next_span = span;
        self.stmt(StmtKind::FunctionDecl(FunctionDecl {
            name: name.into(),
            params: params.iter().map(|p| Ident::from(*p)).collect(),
            purity,
            body,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_blocks_stay_out_of_body() {
        let mut b = ProgramBuilder::new();
        b.energy(10);
        let cond = b.boolean(true);
        let stmt = b.if_then(Stability::Stable, cond, |b| {
            let one = b.int(1);
            b.print(one);
        });
        let program = b.finish();

        assert_eq!(program.body.len(), 2);
        assert_eq!(program.body[1], stmt);
        match &program.stmts[stmt].kind {
            StmtKind::Control { then_body, stability, .. } => {
                assert_eq!(then_body.stmts.len(), 1);
                assert_eq!(*stability, Stability::Stable);
            }
            other => panic!("unexpected statement {:?}", other),
        }
    }

    #[test]
    fn test_span_applies_to_outer_statement() {
        let mut b = ProgramBuilder::new();
        let cond = b.boolean(false);
        let outer = b.at(Span::new(4, 9)).while_loop(Stability::Unstable, cond, |b| {
            b.query_energy();
        });
        let program = b.finish();

        assert_eq!(program.stmts[outer].span, Span::new(4, 9));
        let StmtKind::Control { then_body, .. } = &program.stmts[outer].kind else {
            panic!("expected control statement");
        };
        assert_eq!(program.stmts[then_body.stmts[0]].span, Span::dummy());
    }
}
