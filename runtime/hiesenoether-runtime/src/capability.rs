// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! Guarantee categories that a running program can pay for or give up.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A guarantee category governed by the energy ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Declaring and enforcing invariants.
    Invariants,
    /// Creating stable bindings and stabilizing unstable ones.
    Stabilization,
    /// Non-mutating, costed inspection of a binding's internal state.
    ExactIntrospection,
    /// Stable (snapshot-condition) control structures.
    StableControl,
}

impl Capability {
    /// Every category, in declaration order.
    pub const ALL: [Capability; 4] = [
        Capability::Invariants,
        Capability::Stabilization,
        Capability::ExactIntrospection,
        Capability::StableControl,
    ];

    /// The name used in source programs.
    pub fn as_str(self) -> &'static str {
        match self {
            Capability::Invariants => "invariants",
            Capability::Stabilization => "stabilization",
            Capability::ExactIntrospection => "inspection",
            Capability::StableControl => "stable_control",
        }
    }

    fn bit(self) -> u8 {
        match self {
            Capability::Invariants => 1 << 0,
            Capability::Stabilization => 1 << 1,
            Capability::ExactIntrospection => 1 << 2,
            Capability::StableControl => 1 << 3,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a capability name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown capability '{0}'")]
pub struct UnknownCapability(pub String);

impl FromStr for Capability {
    type Err = UnknownCapability;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "invariants" => Ok(Capability::Invariants),
            "stabilization" | "stabilize" => Ok(Capability::Stabilization),
            "inspection" | "exact_introspection" => Ok(Capability::ExactIntrospection),
            "stable_control" => Ok(Capability::StableControl),
            other => Err(UnknownCapability(other.to_string())),
        }
    }
}

/// The set of still-enabled capabilities.
///
/// Removal is one-way: the type offers no operation that re-adds a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilitySet {
    bits: u8,
}

impl CapabilitySet {
    /// A set with every category enabled.
    pub fn all() -> Self {
        Self {
            bits: Capability::ALL.iter().fold(0, |acc, c| acc | c.bit()),
        }
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.bits & capability.bit() != 0
    }

    /// Remove a category. Returns `false` if it was already absent.
    pub fn remove(&mut self, capability: Capability) -> bool {
        let present = self.contains(capability);
        self.bits &= !capability.bit();
        present
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Enabled categories in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = Capability> {
        let set = *self;
        Capability::ALL.into_iter().filter(move |c| set.contains(*c))
    }
}

impl Default for CapabilitySet {
    fn default() -> Self {
        Self::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!("invariants".parse::<Capability>(), Ok(Capability::Invariants));
        assert_eq!("inspection".parse::<Capability>(), Ok(Capability::ExactIntrospection));
        assert_eq!("exact_introspection".parse::<Capability>(), Ok(Capability::ExactIntrospection));
        assert_eq!("stable_control".parse::<Capability>(), Ok(Capability::StableControl));
        assert!("telepathy".parse::<Capability>().is_err());
    }

    #[test]
    fn test_name_round_trip() {
        for cap in Capability::ALL {
            assert_eq!(cap.as_str().parse::<Capability>(), Ok(cap));
        }
    }

    #[test]
    fn test_removal_is_one_way() {
        let mut set = CapabilitySet::all();
        assert!(set.remove(Capability::StableControl));
        assert!(!set.contains(Capability::StableControl));
        assert!(!set.remove(Capability::StableControl));
        assert_eq!(set.iter().count(), 3);
    }
}
