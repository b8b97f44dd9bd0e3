// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! Runtime errors for the interpreter.
//!
//! Every error is fatal to the running program: the interpreter halts on the
//! first one and reports it as the run's failure status.

use crate::outcome::FailureKind;
use hiesenoether_ast::span::Span;
use hiesenoether_runtime::{Capability, Energy, LedgerError, UnknownCapability};
use thiserror::Error;

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// A runtime error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// A charge exceeded the energy currently available
    #[error("energy exhausted: need {needed}, have {available}")]
    EnergyExhausted { needed: Energy, available: Energy },

    /// Use of a guarantee category after its removal
    #[error("capability '{capability}' has been removed")]
    CapabilityDisabled { capability: Capability },

    /// A declared invariant evaluated false
    #[error("invariant #{ordinal} violated: {predicate}")]
    InvariantViolated {
        ordinal: usize,
        predicate: String,
        site: Span,
    },

    /// Redundant capability removal
    #[error("capability '{capability}' was already removed")]
    AlreadyRemoved { capability: Capability },

    /// Reference to a binding that was never declared
    #[error("unbound variable: {name}")]
    UnboundVariable { name: String, hint: Option<String> },

    /// Second energy declaration in one run
    #[error("energy budget already declared ({current}/{maximum})")]
    AlreadyInitialized { current: Energy, maximum: Energy },

    /// Capability name not recognized by `remove`
    #[error("unknown capability '{name}'")]
    UnknownCapability { name: String, hint: Option<String> },

    /// Assignment to a stable binding
    #[error("cannot assign to stable binding '{name}'")]
    ImmutableBinding { name: String },

    /// Type mismatch during evaluation
    #[error("type error: expected {expected}, got {got}")]
    TypeError { expected: String, got: String },

    /// Division or remainder by zero
    #[error("division by zero")]
    DivisionByZero,

    /// Checked integer arithmetic overflowed
    #[error("integer overflow in {operation}")]
    Overflow { operation: String },

    /// Wrong number of arguments passed to a function
    #[error("arity mismatch calling '{name}': expected {expected} arguments, got {got}")]
    ArityMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    /// Call to a function that was never declared
    #[error("undefined function: {name}")]
    UndefinedFunction { name: String, hint: Option<String> },

    /// An `assert` condition evaluated false
    #[error("assertion failed: {condition}")]
    AssertionFailed { condition: String },

    /// A single loop ran more iterations than allowed
    #[error("maximum loop iterations ({limit}) exceeded")]
    LoopLimitExceeded { limit: u64 },

    /// Function calls nested deeper than allowed
    #[error("maximum call depth of {limit} exceeded (possible infinite recursion)")]
    CallDepthExceeded { limit: usize },
}

impl RuntimeError {
    /// Create a type error with expected and actual type names.
    pub fn type_error(expected: impl Into<String>, got: impl Into<String>) -> Self {
        Self::TypeError {
            expected: expected.into(),
            got: got.into(),
        }
    }

    pub fn overflow(operation: impl Into<String>) -> Self {
        Self::Overflow {
            operation: operation.into(),
        }
    }

    /// Create an unbound variable error with a "did you mean?" suggestion.
    pub fn unbound_with_suggestions(name: impl Into<String>, available: &[&str]) -> Self {
        let name = name.into();
        let hint = find_closest_match(&name, available)
            .map(|suggestion| format!("did you mean '{}'?", suggestion))
            .or_else(|| Some("bind the variable before reading it".to_string()));
        Self::UnboundVariable { name, hint }
    }

    /// Create an undefined function error with a "did you mean?" suggestion.
    pub fn undefined_function(name: impl Into<String>, available: &[&str]) -> Self {
        let name = name.into();
        let hint = find_closest_match(&name, available)
            .map(|suggestion| format!("did you mean '{}'?", suggestion));
        Self::UndefinedFunction { name, hint }
    }

    /// Get the hint for this error, if any.
    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::UnboundVariable { hint, .. }
            | Self::UnknownCapability { hint, .. }
            | Self::UndefinedFunction { hint, .. } => hint.as_deref(),
            Self::ImmutableBinding { .. } => {
                Some("use `stabilize` only once a value should stop changing")
            }
            Self::EnergyExhausted { .. } => {
                Some("relinquish a guarantee (`remove`) or declare values unstable to regain energy")
            }
            _ => None,
        }
    }

    /// Taxonomy tag reported in a failed run's status.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::EnergyExhausted { .. } => FailureKind::EnergyExhausted,
            Self::CapabilityDisabled { .. } => FailureKind::CapabilityDisabled,
            Self::InvariantViolated { .. } => FailureKind::InvariantViolated,
            Self::AlreadyRemoved { .. } => FailureKind::AlreadyRemoved,
            Self::UnboundVariable { .. } => FailureKind::UnboundVariable,
            Self::AlreadyInitialized { .. } => FailureKind::AlreadyInitialized,
            Self::UnknownCapability { .. } => FailureKind::UnknownCapability,
            Self::ImmutableBinding { .. } => FailureKind::ImmutableBinding,
            Self::TypeError { .. } => FailureKind::TypeError,
            Self::DivisionByZero => FailureKind::DivisionByZero,
            Self::Overflow { .. } => FailureKind::Overflow,
            Self::ArityMismatch { .. } => FailureKind::ArityMismatch,
            Self::UndefinedFunction { .. } => FailureKind::UndefinedFunction,
            Self::AssertionFailed { .. } => FailureKind::AssertionFailed,
            Self::LoopLimitExceeded { .. } => FailureKind::LoopLimitExceeded,
            Self::CallDepthExceeded { .. } => FailureKind::CallDepthExceeded,
        }
    }
}

impl From<LedgerError> for RuntimeError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::EnergyExhausted { needed, available } => {
                Self::EnergyExhausted { needed, available }
            }
            LedgerError::CapabilityDisabled(capability) => Self::CapabilityDisabled { capability },
            LedgerError::AlreadyRemoved(capability) => Self::AlreadyRemoved { capability },
            LedgerError::AlreadyInitialized { current, maximum } => {
                Self::AlreadyInitialized { current, maximum }
            }
        }
    }
}

impl From<UnknownCapability> for RuntimeError {
    fn from(err: UnknownCapability) -> Self {
        let known: Vec<&str> = Capability::ALL.iter().map(|c| c.as_str()).collect();
        let hint = find_closest_match(&err.0, &known)
            .map(|suggestion| format!("did you mean '{}'?", suggestion))
            .or_else(|| Some(format!("known capabilities: {}", known.join(", "))));
        Self::UnknownCapability { name: err.0, hint }
    }
}

/// Calculate Levenshtein distance between two strings.
fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev_row: Vec<usize> = (0..=b.len()).collect();
    let mut curr_row = vec![0; b.len() + 1];

    for (i, a_char) in a.iter().enumerate() {
        curr_row[0] = i + 1;
        for (j, b_char) in b.iter().enumerate() {
            let cost = usize::from(a_char != b_char);
            curr_row[j + 1] = (curr_row[j] + 1)
                .min(prev_row[j + 1] + 1)
                .min(prev_row[j] + cost);
        }
        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[b.len()]
}

/// Find the closest matching name, if any is within a plausible edit distance.
fn find_closest_match<'a>(target: &str, available: &[&'a str]) -> Option<&'a str> {
    let (best, distance) = available
        .iter()
        .map(|candidate| (*candidate, levenshtein_distance(target, candidate)))
        .min_by_key(|(_, distance)| *distance)?;

    let max_distance = (target.len() / 3).max(2);
    (distance <= max_distance).then_some(best)
}
