// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! Declared invariants and their checkpoints.
//!
//! Predicates are evaluated with [`Environment::peek`], never with the
//! canonical read, so checking an invariant cannot advance the unstable state
//! it is checking.

use crate::env::Environment;
use crate::error::{RuntimeError, RuntimeResult};
use crate::ops;
use crate::value::Value;
use hiesenoether_ast::span::Span;
use hiesenoether_ast::{ExprId, ExprKind, Program};
use hiesenoether_runtime::{Capability, Energy, EnergyLedger};

/// A registered invariant.
#[derive(Debug, Clone)]
pub struct Invariant {
    pub predicate: ExprId,
    /// Span of the declaring statement
    pub site: Span,
    /// Declaration order, starting at 1
    pub ordinal: usize,
    /// Predicate rendered back to surface syntax
    pub rendered: String,
}

/// Registry of every invariant declared during a run.
#[derive(Debug, Default)]
pub struct InvariantEngine {
    invariants: Vec<Invariant>,
}

impl InvariantEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `predicate`, paying `cost` out of `ledger`.
    ///
    /// Predicates may not call functions: a call could print or mutate
    /// bindings, and checking must be free of side effects.
    pub fn declare(
        &mut self,
        program: &Program,
        predicate: ExprId,
        site: Span,
        ledger: &mut EnergyLedger,
        cost: Energy,
    ) -> RuntimeResult<&Invariant> {
        ledger.require(Capability::Invariants)?;
        reject_calls(program, predicate)?;
        ledger.charge(cost, Capability::Invariants)?;

        let invariant = Invariant {
            predicate,
            site,
            ordinal: self.invariants.len() + 1,
            rendered: program.display_expr(predicate).to_string(),
        };
        tracing::debug!(ordinal = invariant.ordinal, predicate = %invariant.rendered, "invariant declared");
        self.invariants.push(invariant);
        Ok(&self.invariants[self.invariants.len() - 1])
    }

    /// Evaluate every predicate against `env`; the first false one fails.
    pub fn check_all(&self, program: &Program, env: &Environment) -> RuntimeResult<()> {
        for invariant in &self.invariants {
            let holds = observe(program, invariant.predicate, env)?.is_truthy();
            if !holds {
                return Err(RuntimeError::InvariantViolated {
                    ordinal: invariant.ordinal,
                    predicate: invariant.rendered.clone(),
                    site: invariant.site,
                });
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Invariant> {
        self.invariants.iter()
    }
}

/// Evaluate an expression without evolving any binding.
fn observe(program: &Program, expr: ExprId, env: &Environment) -> RuntimeResult<Value> {
    match &program.exprs[expr].kind {
        ExprKind::Literal(lit) => Ok(Value::from(lit)),
        ExprKind::Var(name) => env.lookup(name).map(|slot| slot.peek().clone()),
        ExprKind::Unary { op, operand } => ops::unary(*op, observe(program, *operand, env)?),
        ExprKind::Binary { op, lhs, rhs } => {
            let lhs = observe(program, *lhs, env)?;
            let rhs = observe(program, *rhs, env)?;
            ops::binary(*op, lhs, rhs)
        }
        ExprKind::Call { func, .. } => Err(call_in_predicate(func)),
    }
}

fn reject_calls(program: &Program, expr: ExprId) -> RuntimeResult<()> {
    match &program.exprs[expr].kind {
        ExprKind::Literal(_) | ExprKind::Var(_) => Ok(()),
        ExprKind::Unary { operand, .. } => reject_calls(program, *operand),
        ExprKind::Binary { lhs, rhs, .. } => {
            reject_calls(program, *lhs)?;
            reject_calls(program, *rhs)
        }
        ExprKind::Call { func, .. } => Err(call_in_predicate(func)),
    }
}

fn call_in_predicate(func: &str) -> RuntimeError {
    RuntimeError::type_error("side-effect-free predicate", format!("call to '{}'", func))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Slot;
    use hiesenoether_ast::{BinaryOp, ProgramBuilder};

    fn positive_x() -> (Program, ExprId) {
        let mut b = ProgramBuilder::new();
        let x = b.var("x");
        let zero = b.int(0);
        let predicate = b.binary(BinaryOp::Gt, x, zero);
        (b.finish(), predicate)
    }

    fn funded() -> EnergyLedger {
        let mut ledger = EnergyLedger::new();
        ledger.initialize(100).unwrap();
        ledger
    }

    #[test]
    fn test_declare_charges_ledger() {
        let (program, predicate) = positive_x();
        let mut ledger = funded();
        let mut engine = InvariantEngine::new();
        let invariant = engine
            .declare(&program, predicate, Span::new(3, 17), &mut ledger, 10)
            .unwrap();
        assert_eq!(invariant.ordinal, 1);
        assert_eq!(invariant.rendered, "x > 0");
        assert_eq!(ledger.current(), 90);
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn test_declare_after_removal_fails() {
        let (program, predicate) = positive_x();
        let mut ledger = funded();
        ledger.remove_capability(Capability::Invariants, 20).unwrap();
        let mut engine = InvariantEngine::new();
        let err = engine
            .declare(&program, predicate, Span::dummy(), &mut ledger, 10)
            .unwrap_err();
        assert_eq!(err, RuntimeError::CapabilityDisabled { capability: Capability::Invariants });
        assert!(engine.is_empty());
    }

    #[test]
    fn test_check_does_not_evolve() {
        let (program, predicate) = positive_x();
        let mut ledger = funded();
        let mut engine = InvariantEngine::new();
        engine
            .declare(&program, predicate, Span::dummy(), &mut ledger, 10)
            .unwrap();

        let env = Environment::new();
        env.define("x".into(), Slot::unstable(Value::Int(4)));
        for _ in 0..3 {
            engine.check_all(&program, &env).unwrap();
        }
        assert_eq!(env.peek("x"), Some(Slot::unstable(Value::Int(4))));
    }

    #[test]
    fn test_violation_names_site() {
        let (program, predicate) = positive_x();
        let mut ledger = funded();
        let mut engine = InvariantEngine::new();
        engine
            .declare(&program, predicate, Span::new(12, 27), &mut ledger, 10)
            .unwrap();

        let env = Environment::new();
        env.define("x".into(), Slot::unstable(Value::Int(-1)));
        match engine.check_all(&program, &env) {
            Err(RuntimeError::InvariantViolated { ordinal, predicate, site }) => {
                assert_eq!(ordinal, 1);
                assert_eq!(predicate, "x > 0");
                assert_eq!(site, Span::new(12, 27));
            }
            other => panic!("expected violation, got {:?}", other),
        }
    }

    #[test]
    fn test_predicate_with_call_rejected_before_charge() {
        let mut b = ProgramBuilder::new();
        let arg = b.int(1);
        let predicate = b.call("sample", vec![arg]);
        let program = b.finish();
        let mut ledger = funded();
        let mut engine = InvariantEngine::new();
        let err = engine
            .declare(&program, predicate, Span::dummy(), &mut ledger, 10)
            .unwrap_err();
        assert!(matches!(err, RuntimeError::TypeError { .. }));
        assert_eq!(ledger.current(), 100);
    }
}
