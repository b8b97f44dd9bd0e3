// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! The energy ledger.
//!
//! Energy is conserved: `current` only falls through bounded subtractions that
//! are validated before they apply, and only rises through [`EnergyLedger::gain`]
//! (clamped to the maximum) or [`EnergyLedger::remove_capability`]. Every
//! movement is journaled so hosts and tests can audit the run afterwards.

use crate::capability::{Capability, CapabilitySet};
use serde::Serialize;
use thiserror::Error;

/// Unit of the energy budget.
pub type Energy = u64;

/// Ledger failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("energy exhausted: need {needed}, have {available}")]
    EnergyExhausted { needed: Energy, available: Energy },

    #[error("capability '{0}' has been removed")]
    CapabilityDisabled(Capability),

    #[error("capability '{0}' was already removed")]
    AlreadyRemoved(Capability),

    #[error("energy budget already declared ({current}/{maximum})")]
    AlreadyInitialized { current: Energy, maximum: Energy },
}

/// What caused a journaled energy movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "capability", rename_all = "snake_case")]
pub enum LedgerAction {
    Initialize,
    Charge(Capability),
    Spend,
    Gain,
    RemoveCapability(Capability),
    Burn,
}

/// One journaled movement of energy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerEvent {
    pub action: LedgerAction,
    /// Signed change applied to `current`.
    pub delta: i64,
    /// `current` after the movement.
    pub current: Energy,
    /// `maximum` after the movement.
    pub maximum: Energy,
}

/// Tracks available and maximum energy plus the enabled capabilities.
#[derive(Debug, Clone)]
pub struct EnergyLedger {
    current: Energy,
    maximum: Energy,
    capabilities: CapabilitySet,
    initialized: bool,
    history: Vec<LedgerEvent>,
}

impl EnergyLedger {
    /// An uninitialized ledger holding no energy and every capability.
    pub fn new() -> Self {
        Self {
            current: 0,
            maximum: 0,
            capabilities: CapabilitySet::all(),
            initialized: false,
            history: Vec::new(),
        }
    }

    /// Set the starting budget. Allowed once per ledger.
    pub fn initialize(&mut self, starting: Energy) -> Result<(), LedgerError> {
        if self.initialized {
            return Err(LedgerError::AlreadyInitialized {
                current: self.current,
                maximum: self.maximum,
            });
        }
        self.initialized = true;
        let before = self.current;
        self.current = starting;
        self.maximum = starting;
        tracing::debug!(energy = starting, "energy budget declared");
        self.record(LedgerAction::Initialize, signed(starting) - signed(before));
        Ok(())
    }

    /// Pay `amount` for an operation guarded by `capability`.
    ///
    /// The capability is checked before the balance.
    pub fn charge(&mut self, amount: Energy, capability: Capability) -> Result<(), LedgerError> {
        self.require(capability)?;
        self.debit(amount)?;
        tracing::debug!(%capability, amount, current = self.current, "charged");
        self.record(LedgerAction::Charge(capability), -signed(amount));
        Ok(())
    }

    /// Pay `amount` for an operation no capability governs.
    pub fn spend(&mut self, amount: Energy) -> Result<(), LedgerError> {
        self.debit(amount)?;
        tracing::debug!(amount, current = self.current, "spent");
        self.record(LedgerAction::Spend, -signed(amount));
        Ok(())
    }

    /// Credit energy for a relinquished guarantee, never past the maximum.
    ///
    /// Returns the amount actually credited.
    pub fn gain(&mut self, amount: Energy) -> Energy {
        let credited = amount.min(self.maximum - self.current);
        self.current += credited;
        tracing::debug!(amount, credited, current = self.current, "gained");
        self.record(LedgerAction::Gain, signed(credited));
        credited
    }

    /// Destroy up to `amount` of the current balance.
    ///
    /// Used for forfeits that must not fail the run; returns the amount
    /// actually destroyed.
    pub fn burn(&mut self, amount: Energy) -> Energy {
        let burned = amount.min(self.current);
        self.current -= burned;
        tracing::debug!(amount, burned, current = self.current, "burned");
        self.record(LedgerAction::Burn, -signed(burned));
        burned
    }

    /// Irreversibly give up a capability in exchange for `bonus` extra
    /// maximum (and current) energy.
    pub fn remove_capability(
        &mut self,
        capability: Capability,
        bonus: Energy,
    ) -> Result<(), LedgerError> {
        if !self.capabilities.remove(capability) {
            return Err(LedgerError::AlreadyRemoved(capability));
        }
        self.maximum = self.maximum.saturating_add(bonus);
        let credited = bonus.min(self.maximum - self.current);
        self.current += credited;
        tracing::info!(
            %capability,
            current = self.current,
            maximum = self.maximum,
            "capability removed"
        );
        self.record(LedgerAction::RemoveCapability(capability), signed(credited));
        Ok(())
    }

    /// Fail unless `capability` is still enabled.
    pub fn require(&self, capability: Capability) -> Result<(), LedgerError> {
        if self.capabilities.contains(capability) {
            Ok(())
        } else {
            Err(LedgerError::CapabilityDisabled(capability))
        }
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(capability)
    }

    pub fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }

    pub fn current(&self) -> Energy {
        self.current
    }

    pub fn maximum(&self) -> Energy {
        self.maximum
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Every energy movement so far, oldest first.
    pub fn history(&self) -> &[LedgerEvent] {
        &self.history
    }

    fn debit(&mut self, amount: Energy) -> Result<(), LedgerError> {
        if amount > self.current {
            return Err(LedgerError::EnergyExhausted {
                needed: amount,
                available: self.current,
            });
        }
        self.current -= amount;
        Ok(())
    }

    fn record(&mut self, action: LedgerAction, delta: i64) {
        debug_assert!(self.current <= self.maximum);
        self.history.push(LedgerEvent {
            action,
            delta,
            current: self.current,
            maximum: self.maximum,
        });
    }
}

impl Default for EnergyLedger {
    fn default() -> Self {
        Self::new()
    }
}

fn signed(amount: Energy) -> i64 {
    i64::try_from(amount).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger(energy: Energy) -> EnergyLedger {
        let mut ledger = EnergyLedger::new();
        ledger.initialize(energy).unwrap();
        ledger
    }

    #[test]
    fn test_initialize_sets_both_bounds() {
        let ledger = ledger(100);
        assert_eq!(ledger.current(), 100);
        assert_eq!(ledger.maximum(), 100);
        assert!(ledger.is_initialized());
    }

    #[test]
    fn test_initialize_twice_fails() {
        let mut ledger = ledger(100);
        assert_eq!(
            ledger.initialize(50),
            Err(LedgerError::AlreadyInitialized { current: 100, maximum: 100 })
        );
        assert_eq!(ledger.current(), 100);
    }

    #[test]
    fn test_charge_exact_balance() {
        let mut ledger = ledger(5);
        ledger.charge(5, Capability::Stabilization).unwrap();
        assert_eq!(ledger.current(), 0);
        assert_eq!(
            ledger.charge(5, Capability::Stabilization),
            Err(LedgerError::EnergyExhausted { needed: 5, available: 0 })
        );
    }

    #[test]
    fn test_failed_charge_leaves_balance() {
        let mut ledger = ledger(3);
        assert!(ledger.charge(10, Capability::Invariants).is_err());
        assert_eq!(ledger.current(), 3);
        assert_eq!(ledger.history().len(), 1);
    }

    #[test]
    fn test_capability_checked_before_balance() {
        let mut ledger = ledger(0);
        ledger.remove_capability(Capability::Invariants, 0).unwrap();
        assert_eq!(
            ledger.charge(10, Capability::Invariants),
            Err(LedgerError::CapabilityDisabled(Capability::Invariants))
        );
    }

    #[test]
    fn test_gain_is_clamped() {
        let mut ledger = ledger(100);
        assert_eq!(ledger.gain(2), 0);
        assert_eq!(ledger.current(), 100);

        ledger.spend(10).unwrap();
        assert_eq!(ledger.gain(4), 4);
        assert_eq!(ledger.gain(20), 6);
        assert_eq!(ledger.current(), 100);
    }

    #[test]
    fn test_remove_capability_raises_bounds() {
        let mut ledger = ledger(50);
        ledger.remove_capability(Capability::StableControl, 20).unwrap();
        assert_eq!(ledger.maximum(), 70);
        assert_eq!(ledger.current(), 70);
        assert!(!ledger.has_capability(Capability::StableControl));
        assert_eq!(
            ledger.remove_capability(Capability::StableControl, 20),
            Err(LedgerError::AlreadyRemoved(Capability::StableControl))
        );
        assert_eq!(ledger.maximum(), 70);
    }

    #[test]
    fn test_burn_never_goes_negative() {
        let mut ledger = ledger(5);
        assert_eq!(ledger.burn(3), 3);
        assert_eq!(ledger.burn(4), 2);
        assert_eq!(ledger.current(), 0);
        assert_eq!(ledger.maximum(), 5);
        assert_eq!(ledger.history().last().map(|e| e.action), Some(LedgerAction::Burn));
    }

    #[test]
    fn test_history_tracks_movements() {
        let mut ledger = ledger(10);
        ledger.charge(2, Capability::ExactIntrospection).unwrap();
        ledger.gain(1);
        let deltas: Vec<i64> = ledger.history().iter().map(|e| e.delta).collect();
        assert_eq!(deltas, vec![10, -2, 1]);
        assert_eq!(ledger.history()[1].action, LedgerAction::Charge(Capability::ExactIntrospection));
    }
}
