// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! Tree-walking interpreter for Hiesenoether.
//!
//! Hiesenoether programs run against a finite energy ledger. Unstable
//! bindings change each time they are read, stability and exact observation
//! cost energy, and declared invariants are re-checked after every statement.
//! The interpreter supports:
//!
//! - Stable and unstable bindings with read-driven evolution
//! - Invariants checked at every statement boundary
//! - Stable `if`/`while` that decide their condition once
//! - Irreversible capability removal in exchange for energy
//! - Functions, `for` ranges, assertions and energy queries

mod env;
mod error;
mod eval;
mod invariant;
mod ops;
mod outcome;
mod value;

pub use env::Environment;
pub use error::{RuntimeError, RuntimeResult};
pub use eval::Interpreter;
pub use invariant::{Invariant, InvariantEngine};
pub use outcome::{Failure, FailureKind, Outcome, State, Status};
pub use value::{Inspection, Slot, Value, Variant};

use hiesenoether_ast::Program;
use hiesenoether_runtime::RuntimeConfig;

/// Execute a Hiesenoether program with the default costs and limits.
pub fn run(program: &Program) -> Outcome {
    let mut interp = Interpreter::new();
    interp.run(program)
}

/// Execute a Hiesenoether program with a custom cost policy and limits.
pub fn run_with_config(program: &Program, config: RuntimeConfig) -> Outcome {
    let mut interp = Interpreter::with_config(config);
    interp.run(program)
}
