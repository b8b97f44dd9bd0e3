// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! Expression and statement evaluation.
//!
//! Statements run strictly in program order and sub-expressions strictly
//! left to right. That order decides which unstable reads happen first, so it
//! is part of a program's observable meaning.

use crate::env::Environment;
use crate::error::{RuntimeError, RuntimeResult};
use crate::invariant::InvariantEngine;
use crate::ops;
use crate::outcome::{Failure, Outcome, State, Status};
use crate::value::{Slot, Value};
use hiesenoether_ast::*;
use hiesenoether_ast::span::Span;
use hiesenoether_runtime::{Capability, EnergyLedger, EscrowBook, RuntimeConfig, Settlement};
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use std::rc::Rc;

/// Remaining stack below which evaluation switches to a fresh segment
const STACK_RED_ZONE: usize = 128 * 1024;

/// Size of each stack segment allocated for deep recursion
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

/// How control leaves a statement.
enum Flow {
    Next,
    Return(Value),
}

/// The Hiesenoether interpreter.
///
/// One instance executes one program; all run state (environment, ledger,
/// invariants, output) lives here, so independent runs never share anything.
pub struct Interpreter {
    config: RuntimeConfig,
    ledger: EnergyLedger,
    /// Global environment
    global: Environment,
    invariants: InvariantEngine,
    functions: FxHashMap<SmolStr, Rc<FunctionDecl>>,
    /// Escrow held for functions declared unstable
    escrow: EscrowBook,
    output: Vec<String>,
    /// Span of the innermost statement that failed
    failure_site: Option<Span>,
    /// Current call depth for recursion limiting
    call_depth: usize,
    state: State,
}

impl Interpreter {
    /// Create a new interpreter with default costs and limits.
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        Self {
            config,
            ledger: EnergyLedger::new(),
            global: Environment::new(),
            invariants: InvariantEngine::new(),
            functions: FxHashMap::default(),
            escrow: EscrowBook::new(),
            output: Vec::new(),
            failure_site: None,
            call_depth: 0,
            state: State::Running,
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn ledger(&self) -> &EnergyLedger {
        &self.ledger
    }

    pub fn global(&self) -> &Environment {
        &self.global
    }

    pub fn invariants(&self) -> &InvariantEngine {
        &self.invariants
    }

    pub fn escrow(&self) -> &EscrowBook {
        &self.escrow
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Run a program to completion or to its first failure.
    ///
    /// Halting is terminal: running again on a halted interpreter executes
    /// nothing and reports the earlier status.
    pub fn run(&mut self, program: &Program) -> Outcome {
        if let State::Halted(status) = &self.state {
            return Outcome {
                output: Vec::new(),
                status: status.clone(),
            };
        }

        let span = tracing::debug_span!("run", statements = program.body.len());
        let _enter = span.enter();

        let global = self.global.clone();
        let mut status = Status::Success;
        for (index, stmt_id) in program.body.iter().enumerate() {
            match self.exec_stmt(*stmt_id, program, &global) {
                Ok(Flow::Next) => {}
                Ok(Flow::Return(_)) => break,
                Err(error) => {
                    let location = self
                        .failure_site
                        .take()
                        .unwrap_or(program.stmts[*stmt_id].span);
                    tracing::warn!(statement = index, %location, %error, "run halted");
                    status = Status::Failure(Failure {
                        kind: error.kind(),
                        message: error.to_string(),
                        hint: error.hint().map(str::to_string),
                        statement: index,
                        location,
                    });
                    break;
                }
            }
        }

        let forfeited = self.escrow.burn_unreleased();
        if forfeited > 0 {
            let burned = self.ledger.burn(forfeited);
            tracing::warn!(burned, "unreleased escrow burned");
        }

        self.state = State::Halted(status.clone());
        Outcome {
            output: std::mem::take(&mut self.output),
            status,
        }
    }

    /// Execute a statement, then re-validate invariants.
    ///
    /// The first statement to see an error is the innermost one, so it is the
    /// one whose span gets reported.
    fn exec_stmt(
        &mut self,
        stmt_id: StmtId,
        program: &Program,
        env: &Environment,
    ) -> RuntimeResult<Flow> {
        let result = match self.exec_stmt_kind(stmt_id, program, env) {
            Ok(flow) => self.checkpoint(program).map(|()| flow),
            Err(error) => Err(error),
        };
        if result.is_err() && self.failure_site.is_none() {
            self.failure_site = Some(program.stmts[stmt_id].span);
        }
        result
    }

    /// Invariants are enforced only while the capability is held.
    fn checkpoint(&self, program: &Program) -> RuntimeResult<()> {
        if self.ledger.has_capability(Capability::Invariants) {
            self.invariants.check_all(program, &self.global)?;
        }
        Ok(())
    }

    fn exec_stmt_kind(
        &mut self,
        stmt_id: StmtId,
        program: &Program,
        env: &Environment,
    ) -> RuntimeResult<Flow> {
        let stmt = &program.stmts[stmt_id];
        tracing::trace!(span = %stmt.span, "statement");

        match &stmt.kind {
            StmtKind::EnergyDecl(amount) => {
                self.ledger.initialize(*amount)?;
            }

            StmtKind::Bind {
                name,
                stability,
                init,
            } => {
                let value = self.eval_expr(*init, program, env)?;
                let slot = match stability {
                    Stability::Stable => {
                        self.ledger
                            .charge(self.config.costs.stabilize, Capability::Stabilization)?;
                        Slot::stable(value)
                    }
                    Stability::Unstable => {
                        self.ledger.gain(self.config.costs.unstable_value_gain);
                        Slot::unstable(value)
                    }
                };
                env.define(name.clone(), slot);
            }

            StmtKind::Assign { name, value } => {
                env.lookup(name)?;
                let value = self.eval_expr(*value, program, env)?;
                env.update(name, |slot| match slot {
                    Slot::Stable { .. } => Err(RuntimeError::ImmutableBinding {
                        name: name.to_string(),
                    }),
                    Slot::Unstable { .. } => Ok(Slot::unstable(value)),
                })?;
            }

            StmtKind::Print(expr) => {
                let value = self.eval_expr(*expr, program, env)?;
                self.ledger.spend(self.config.costs.observation)?;
                self.output.push(value.to_string());
            }

            StmtKind::Inspect(name) => {
                let slot = env.lookup(name)?;
                self.ledger
                    .charge(self.config.costs.exact_introspection, Capability::ExactIntrospection)?;
                let inspection = slot.inspect();
                let rendered = serde_json::to_string(&inspection)
                    .unwrap_or_else(|_| format!("{:?}", inspection));
                self.output.push(format!("[INSPECT] {} {}", name, rendered));
            }

            StmtKind::Stabilize(name) => {
                env.lookup(name)?;
                self.ledger
                    .charge(self.config.costs.stabilize, Capability::Stabilization)?;
                env.update(name, |slot| Ok(slot.clone().stabilize()))?;
            }

            StmtKind::Invariant(predicate) => {
                let cost = self.config.costs.declare_invariant;
                self.invariants
                    .declare(program, *predicate, stmt.span, &mut self.ledger, cost)?;
            }

            StmtKind::Control {
                stability,
                kind,
                condition,
                then_body,
                else_body,
            } => {
                return self.exec_control(
                    *stability,
                    *kind,
                    *condition,
                    then_body,
                    else_body.as_ref(),
                    program,
                    env,
                );
            }

            StmtKind::RemoveCapability(name) => {
                let capability: Capability = name.parse()?;
                self.ledger
                    .remove_capability(capability, self.config.costs.removal_bonus)?;
            }

            StmtKind::QueryEnergy => {
                let line = format!("Energy: {}/{}", self.ledger.current(), self.ledger.maximum());
                self.output.push(line);
            }

            StmtKind::Assert(condition) => {
                self.ledger.spend(self.config.costs.assertion)?;
                if !self.eval_expr(*condition, program, env)?.is_truthy() {
                    return Err(RuntimeError::AssertionFailed {
                        condition: program.display_expr(*condition).to_string(),
                    });
                }
            }

            StmtKind::For {
                var,
                start,
                end,
                body,
            } => {
                let start = self.eval_int(*start, program, env)?;
                let end = self.eval_int(*end, program, env)?;
                let limit = self.config.limits.max_loop_iterations;
                for (iteration, i) in (start..end).enumerate() {
                    if iteration as u64 >= limit {
                        return Err(RuntimeError::LoopLimitExceeded { limit });
                    }
                    env.define(var.clone(), Slot::stable(Value::Int(i)));
                    if let Flow::Return(value) = self.exec_block(body, program, env)? {
                        return Ok(Flow::Return(value));
                    }
                }
            }

            StmtKind::FunctionDecl(decl) => {
                match decl.purity {
                    Purity::Regular => self.ledger.spend(self.config.costs.declare_function)?,
                    Purity::Pure => {
                        self.ledger.gain(self.config.costs.pure_function_gain);
                    }
                    Purity::Unstable => {
                        self.ledger.gain(self.config.costs.unstable_function_gain);
                        self.escrow
                            .open(&decl.name, self.config.costs.unstable_function_escrow);
                    }
                }
                self.functions
                    .insert(decl.name.clone(), Rc::new(decl.clone()));
            }

            StmtKind::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.eval_expr(*expr, program, env)?,
                    None => Value::Int(0),
                };
                return Ok(Flow::Return(value));
            }

            StmtKind::Expr(expr) => {
                self.eval_expr(*expr, program, env)?;
            }
        }

        Ok(Flow::Next)
    }

    /// Run an `if` or `while`, stable or not.
    ///
    /// A stable structure pays once on entry and evaluates its condition
    /// exactly once; that snapshot decides every test of this instance.
    #[allow(clippy::too_many_arguments)]
    fn exec_control(
        &mut self,
        stability: Stability,
        kind: ControlKind,
        condition: ExprId,
        then_body: &Block,
        else_body: Option<&Block>,
        program: &Program,
        env: &Environment,
    ) -> RuntimeResult<Flow> {
        let snapshot = match stability {
            Stability::Stable => {
                self.ledger
                    .charge(self.config.costs.stable_control, Capability::StableControl)?;
                Some(self.eval_expr(condition, program, env)?.is_truthy())
            }
            Stability::Unstable => None,
        };

        match kind {
            ControlKind::If => {
                let taken = match snapshot {
                    Some(taken) => taken,
                    None => self.eval_expr(condition, program, env)?.is_truthy(),
                };
                if taken {
                    self.exec_block(then_body, program, env)
                } else if let Some(else_body) = else_body {
                    self.exec_block(else_body, program, env)
                } else {
                    Ok(Flow::Next)
                }
            }
            ControlKind::While => {
                let limit = self.config.limits.max_loop_iterations;
                let mut iterations: u64 = 0;
                loop {
                    let proceed = match snapshot {
                        Some(proceed) => proceed,
                        None => self.eval_expr(condition, program, env)?.is_truthy(),
                    };
                    if !proceed {
                        return Ok(Flow::Next);
                    }
                    iterations += 1;
                    if iterations > limit {
                        return Err(RuntimeError::LoopLimitExceeded { limit });
                    }
                    if let Flow::Return(value) = self.exec_block(then_body, program, env)? {
                        return Ok(Flow::Return(value));
                    }
                }
            }
        }
    }

    /// Execute a block in `env`; blocks do not open a scope.
    fn exec_block(
        &mut self,
        block: &Block,
        program: &Program,
        env: &Environment,
    ) -> RuntimeResult<Flow> {
        for stmt_id in &block.stmts {
            if let Flow::Return(value) = self.exec_stmt(*stmt_id, program, env)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Next)
    }

    /// Evaluate an expression, growing the stack for deep recursion.
    fn eval_expr(
        &mut self,
        expr_id: ExprId,
        program: &Program,
        env: &Environment,
    ) -> RuntimeResult<Value> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            self.eval_expr_inner(expr_id, program, env)
        })
    }

    fn eval_expr_inner(
        &mut self,
        expr_id: ExprId,
        program: &Program,
        env: &Environment,
    ) -> RuntimeResult<Value> {
        match &program.exprs[expr_id].kind {
            ExprKind::Literal(lit) => Ok(Value::from(lit)),

            ExprKind::Var(name) => env.read(name),

            ExprKind::Unary { op, operand } => {
                let value = self.eval_expr(*operand, program, env)?;
                ops::unary(*op, value)
            }

            // Both operands are always evaluated, `and`/`or` included:
            // skipping a read would change how unstable values evolve.
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs = self.eval_expr(*lhs, program, env)?;
                let rhs = self.eval_expr(*rhs, program, env)?;
                ops::binary(*op, lhs, rhs)
            }

            ExprKind::Call { func, args } => {
                let Some(decl) = self.functions.get(func).cloned() else {
                    let names: Vec<&str> = self.functions.keys().map(SmolStr::as_str).collect();
                    return Err(RuntimeError::undefined_function(func.as_str(), &names));
                };
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval_expr(*arg, program, env)?);
                }
                self.call_function(&decl, values, program)
            }
        }
    }

    fn eval_int(&mut self, expr: ExprId, program: &Program, env: &Environment) -> RuntimeResult<i64> {
        let value = self.eval_expr(expr, program, env)?;
        value
            .as_int()
            .ok_or_else(|| RuntimeError::type_error("Int", value.type_name()))
    }

    /// Call a declared function with automatic stack growth.
    fn call_function(
        &mut self,
        decl: &FunctionDecl,
        args: Vec<Value>,
        program: &Program,
    ) -> RuntimeResult<Value> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            self.call_function_inner(decl, args, program)
        })
    }

    /// Call a declared function with already-evaluated arguments.
    fn call_function_inner(
        &mut self,
        decl: &FunctionDecl,
        args: Vec<Value>,
        program: &Program,
    ) -> RuntimeResult<Value> {
        if args.len() != decl.params.len() {
            return Err(RuntimeError::ArityMismatch {
                name: decl.name.to_string(),
                expected: decl.params.len(),
                got: args.len(),
            });
        }

        let limit = self.config.limits.max_call_depth;
        if self.call_depth >= limit {
            return Err(RuntimeError::CallDepthExceeded { limit });
        }

        // Parameters are stable copies of the argument values.
        let call_env = self.global.child();
        for (param, arg) in decl.params.iter().zip(args) {
            call_env.define(param.clone(), Slot::stable(arg));
        }

        self.call_depth += 1;
        let result = self.exec_block(&decl.body, program, &call_env);
        self.call_depth -= 1;

        let value = match result? {
            Flow::Return(value) => value,
            Flow::Next => Value::Int(0),
        };

        if decl.purity == Purity::Unstable {
            self.settle_escrow(decl, &value)?;
        }
        Ok(value)
    }

    /// Pay out or penalize an unstable function's escrow after a call.
    fn settle_escrow(&mut self, decl: &FunctionDecl, output: &Value) -> RuntimeResult<()> {
        let penalty = self.config.costs.unstable_function_penalty;
        match self.escrow.settle(&decl.name, &output.to_string(), penalty) {
            Settlement::Released(amount) => {
                self.ledger.gain(amount);
            }
            Settlement::Penalized(penalty) => self.ledger.spend(penalty)?,
            Settlement::Settled => {}
        }
        Ok(())
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
