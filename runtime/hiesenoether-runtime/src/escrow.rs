// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! Energy escrow for functions declared unstable.
//!
//! Declaring a function unstable is a promise that its output keeps changing.
//! The reward for that promise is held in escrow: the first call releases it,
//! a second call that repeats the first output is penalized, and escrow that
//! is never released is burned when the run ends.

use crate::ledger::Energy;
use serde::Serialize;

/// Lifecycle of one escrow entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EscrowState {
    /// Waiting for the first call
    Held,
    /// Paid out on the first call
    Released,
    /// Forfeited at the end of the run
    Burned,
}

/// Energy held on behalf of one unstable function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Escrow {
    pub function: String,
    pub amount: Energy,
    pub state: EscrowState,
    pub calls: u64,
    /// Rendered result of the first call
    pub first_output: Option<String>,
}

/// What a call did to its function's escrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// First call: credit this much.
    Released(Energy),
    /// Second call repeated the first output: debit this much.
    Penalized(Energy),
    /// Nothing to pay either way.
    Settled,
}

/// Every escrow opened during a run, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct EscrowBook {
    entries: Vec<Escrow>,
}

impl EscrowBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold `amount` for `function`. Redeclaring a function starts a fresh entry.
    pub fn open(&mut self, function: &str, amount: Energy) {
        let entry = Escrow {
            function: function.to_string(),
            amount,
            state: EscrowState::Held,
            calls: 0,
            first_output: None,
        };
        match self.entries.iter_mut().find(|e| e.function == function) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
        tracing::debug!(function, amount, "escrow opened");
    }

    /// Record a call of `function` that produced `output`.
    pub fn settle(&mut self, function: &str, output: &str, penalty: Energy) -> Settlement {
        let Some(entry) = self.entries.iter_mut().find(|e| e.function == function) else {
            return Settlement::Settled;
        };
        entry.calls += 1;
        match entry.calls {
            1 => {
                entry.state = EscrowState::Released;
                entry.first_output = Some(output.to_string());
                tracing::debug!(function, amount = entry.amount, "escrow released");
                Settlement::Released(entry.amount)
            }
            2 if entry.first_output.as_deref() == Some(output) => {
                tracing::warn!(function, penalty, "unstable function repeated its output");
                Settlement::Penalized(penalty)
            }
            _ => Settlement::Settled,
        }
    }

    /// Forfeit every entry still held; returns the total forfeited.
    pub fn burn_unreleased(&mut self) -> Energy {
        let mut burned: Energy = 0;
        for entry in self.entries.iter_mut().filter(|e| e.state == EscrowState::Held) {
            entry.state = EscrowState::Burned;
            burned = burned.saturating_add(entry.amount);
        }
        burned
    }

    pub fn get(&self, function: &str) -> Option<&Escrow> {
        self.entries.iter().find(|e| e.function == function)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Escrow> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
