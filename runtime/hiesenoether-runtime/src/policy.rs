// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! Cost policy and runtime configuration.
//!
//! Every price the runtime charges lives here rather than in the ledger, so
//! a host can run the same program under a different economy. Configuration
//! can be built in code or loaded from TOML:
//!
//! ```toml
//! [costs]
//! stabilize = 5
//! removal_bonus = 20
//!
//! [limits]
//! max_loop_iterations = 100000
//! ```

use crate::ledger::Energy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Energy prices and rewards for each guarded operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostPolicy {
    /// Creating a stable binding or stabilizing an existing one.
    pub stabilize: Energy,
    /// Exact inspection of a binding.
    pub exact_introspection: Energy,
    /// Declaring an invariant.
    pub declare_invariant: Energy,
    /// Entering a stable control structure (once per entry, not per iteration).
    pub stable_control: Energy,
    /// Declaring a plain function.
    pub declare_function: Energy,
    /// Evaluating an assertion.
    pub assertion: Energy,
    /// Approximate observation (print).
    pub observation: Energy,
    /// Credited when a binding is declared unstable.
    pub unstable_value_gain: Energy,
    /// Credited when a function is declared unstable.
    pub unstable_function_gain: Energy,
    /// Credited when a function is declared pure.
    pub pure_function_gain: Energy,
    /// Held for an unstable function and released by its first call.
    pub unstable_function_escrow: Energy,
    /// Debited when an unstable function's second call repeats its first output.
    pub unstable_function_penalty: Energy,
    /// Added to both maximum and current energy when a capability is removed.
    pub removal_bonus: Energy,
}

impl Default for CostPolicy {
    fn default() -> Self {
        Self {
            stabilize: 5,
            exact_introspection: 2,
            declare_invariant: 10,
            stable_control: 3,
            declare_function: 3,
            assertion: 1,
            observation: 0,
            unstable_value_gain: 2,
            unstable_function_gain: 3,
            pure_function_gain: 4,
            unstable_function_escrow: 4,
            unstable_function_penalty: 6,
            removal_bonus: 20,
        }
    }
}

/// Execution limits that keep runaway programs bounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum iterations of a single loop instance.
    pub max_loop_iterations: u64,
    /// Maximum nesting of function calls.
    pub max_call_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_loop_iterations: 10_000_000,
            max_call_depth: 1000,
        }
    }
}

/// Complete configuration for one interpreter instance.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub costs: CostPolicy,
    pub limits: Limits,
}

/// Errors raised while loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid runtime configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

impl RuntimeConfig {
    /// Parse a configuration from TOML text. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a configuration file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}
