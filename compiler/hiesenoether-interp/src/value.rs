// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! Runtime values and the slots that hold them.
//!
//! A [`Value`] is plain data. A [`Slot`] is what a binding owns: either a
//! stable value, or an unstable one that evolves every time it is read.

use crate::error::{RuntimeError, RuntimeResult};
use hiesenoether_ast::Literal;
use serde::Serialize;
use smol_str::SmolStr;
use std::fmt;

/// A runtime value in Hiesenoether.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Integer (64-bit signed)
    Int(i64),
    /// Floating point (64-bit)
    Float(f64),
    /// Boolean
    Bool(bool),
    /// String
    String(SmolStr),
}

impl Value {
    /// Check if this value is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::Bool(b) => *b,
            Value::String(s) => !s.is_empty(),
        }
    }

    /// Get the type name of this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::Bool(_) => "Bool",
            Value::String(_) => "String",
        }
    }

    /// Try to convert to i64.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Try to convert to f64.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Apply one step of the canonical evolution rule: `value + access_count`.
    pub fn evolve(&self, access_count: u64) -> RuntimeResult<Value> {
        match self {
            Value::Int(n) => i64::try_from(access_count)
                .ok()
                .and_then(|count| n.checked_add(count))
                .map(Value::Int)
                .ok_or_else(|| RuntimeError::overflow("unstable evolution")),
            Value::Float(f) => Ok(Value::Float(f + access_count as f64)),
            other => Err(RuntimeError::type_error("numeric unstable value", other.type_name())),
        }
    }
}

impl From<&Literal> for Value {
    fn from(lit: &Literal) -> Self {
        match lit {
            Literal::Int(n) => Value::Int(*n),
            Literal::Float(f) => Value::Float(*f),
            Literal::Bool(b) => Value::Bool(*b),
            Literal::String(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Bool(b) => write!(f, "{}", b),
            Value::String(s) => write!(f, "{}", s),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) => (*a as f64) == *b,
            (Value::Float(a), Value::Int(b)) => *a == (*b as f64),
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            _ => false,
        }
    }
}

/// The value slot owned by a binding.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    /// Never changes on access.
    Stable { value: Value },
    /// Evolves on every read.
    Unstable { value: Value, access_count: u64 },
}

/// Which kind of slot was inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    Stable,
    Unstable,
}

/// Full internal state of a slot, as seen by exact introspection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Inspection {
    pub variant: Variant,
    pub value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_count: Option<u64>,
}

impl Slot {
    pub fn stable(value: Value) -> Self {
        Slot::Stable { value }
    }

    /// A fresh unstable slot with no access history.
    pub fn unstable(value: Value) -> Self {
        Slot::Unstable {
            value,
            access_count: 0,
        }
    }

    /// The canonical access.
    ///
    /// Stable slots return their value untouched. Unstable slots apply
    /// `value += access_count; access_count += 1` and return the new value.
    /// On error the slot is left unchanged.
    pub fn read(&mut self) -> RuntimeResult<Value> {
        match self {
            Slot::Stable { value } => Ok(value.clone()),
            Slot::Unstable {
                value,
                access_count,
            } => {
                let next = value.evolve(*access_count)?;
                *value = next.clone();
                *access_count += 1;
                Ok(next)
            }
        }
    }

    /// The stored value, without advancing evolution.
    pub fn peek(&self) -> &Value {
        match self {
            Slot::Stable { value } | Slot::Unstable { value, .. } => value,
        }
    }

    pub fn is_stable(&self) -> bool {
        matches!(self, Slot::Stable { .. })
    }

    /// Freeze the slot at its current value, discarding access history.
    pub fn stabilize(self) -> Slot {
        match self {
            Slot::Stable { value } | Slot::Unstable { value, .. } => Slot::Stable { value },
        }
    }

    /// Exact introspection: the whole state, without evolving it.
    pub fn inspect(&self) -> Inspection {
        match self {
            Slot::Stable { value } => Inspection {
                variant: Variant::Stable,
                value: value.clone(),
                access_count: None,
            },
            Slot::Unstable {
                value,
                access_count,
            } => Inspection {
                variant: Variant::Unstable,
                value: value.clone(),
                access_count: Some(*access_count),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_evolution() {
        let mut slot = Slot::unstable(Value::Int(10));
        assert_eq!(slot.read().unwrap(), Value::Int(10));
        assert_eq!(slot, Slot::Unstable { value: Value::Int(10), access_count: 1 });
        assert_eq!(slot.read().unwrap(), Value::Int(11));
        assert_eq!(slot, Slot::Unstable { value: Value::Int(11), access_count: 2 });
        assert_eq!(slot.read().unwrap(), Value::Int(13));
        assert_eq!(slot, Slot::Unstable { value: Value::Int(13), access_count: 3 });
    }

    #[test]
    fn test_stable_read_is_idempotent() {
        let mut slot = Slot::stable(Value::Int(5));
        for _ in 0..5 {
            assert_eq!(slot.read().unwrap(), Value::Int(5));
        }
        assert_eq!(slot, Slot::stable(Value::Int(5)));
    }

    #[test]
    fn test_stabilize_freezes_evolved_value() {
        let mut slot = Slot::unstable(Value::Int(10));
        slot.read().unwrap();
        slot.read().unwrap();
        let mut frozen = slot.stabilize();
        assert_eq!(frozen.read().unwrap(), Value::Int(11));
        assert_eq!(frozen.read().unwrap(), Value::Int(11));
    }

    #[test]
    fn test_inspect_does_not_evolve() {
        let mut slot = Slot::unstable(Value::Int(7));
        slot.read().unwrap();
        let before = slot.clone();
        let inspection = slot.inspect();
        assert_eq!(inspection.variant, Variant::Unstable);
        assert_eq!(inspection.access_count, Some(1));
        assert_eq!(slot, before);
        assert_eq!(
            serde_json::to_string(&inspection).unwrap(),
            r#"{"variant":"unstable","value":7,"access_count":1}"#
        );
    }

    #[test]
    fn test_float_evolution() {
        let mut slot = Slot::unstable(Value::Float(0.5));
        slot.read().unwrap();
        assert_eq!(slot.read().unwrap(), Value::Float(1.5));
    }

    #[test]
    fn test_unstable_string_cannot_evolve() {
        let mut slot = Slot::unstable(Value::String("hi".into()));
        assert!(matches!(slot.read(), Err(RuntimeError::TypeError { .. })));
        assert_eq!(slot, Slot::unstable(Value::String("hi".into())));
    }

    #[test]
    fn test_evolution_overflow() {
        let mut slot = Slot::Unstable { value: Value::Int(i64::MAX), access_count: 1 };
        assert!(matches!(slot.read(), Err(RuntimeError::Overflow { .. })));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Int(-3).to_string(), "-3");
        assert_eq!(Value::Float(2.5).to_string(), "2.5");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::String("energy".into()).to_string(), "energy");
    }
}
