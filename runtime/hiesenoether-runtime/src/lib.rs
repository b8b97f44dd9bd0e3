// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! Runtime economy for Hiesenoether.
//!
//! Runtime guarantees are paid for out of a finite, conserved energy budget.
//! This crate provides:
//! - The energy ledger and its conservation rules
//! - Capabilities (guarantee categories) and their irreversible removal
//! - Escrow for functions declared unstable
//! - The cost policy and runtime configuration

pub mod capability;
pub mod escrow;
pub mod ledger;
pub mod policy;

pub use capability::{Capability, CapabilitySet, UnknownCapability};
pub use escrow::{Escrow, EscrowBook, EscrowState, Settlement};
pub use ledger::{Energy, EnergyLedger, LedgerAction, LedgerError, LedgerEvent};
pub use policy::{ConfigError, CostPolicy, Limits, RuntimeConfig};
