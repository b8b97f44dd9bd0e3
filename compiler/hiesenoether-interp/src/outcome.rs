// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! What a finished run reports back to its host.

use hiesenoether_ast::span::Span;
use serde::Serialize;

/// Taxonomy tag of a fatal runtime failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    EnergyExhausted,
    CapabilityDisabled,
    InvariantViolated,
    AlreadyRemoved,
    UnboundVariable,
    AlreadyInitialized,
    UnknownCapability,
    ImmutableBinding,
    TypeError,
    DivisionByZero,
    Overflow,
    ArityMismatch,
    UndefinedFunction,
    AssertionFailed,
    LoopLimitExceeded,
    CallDepthExceeded,
}

/// The first failure of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Index of the top-level statement that was executing
    pub statement: usize,
    /// Span of the innermost statement that failed
    pub location: Span,
}

/// Final status of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Status {
    Success,
    Failure(Failure),
}

/// Execution state of an interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State {
    Running,
    Halted(Status),
}

/// Printed lines plus the final status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub output: Vec<String>,
    #[serde(flatten)]
    pub status: Status,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, Status::Success)
    }

    pub fn failure(&self) -> Option<&Failure> {
        match &self.status {
            Status::Failure(failure) => Some(failure),
            Status::Success => None,
        }
    }

    /// Convenience accessor for the failure's kind.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.failure().map(|f| f.kind)
    }
}
