// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! Operator semantics shared by the evaluator and the invariant checker.

use crate::error::{RuntimeError, RuntimeResult};
use crate::value::Value;
use hiesenoether_ast::{BinaryOp, UnaryOp};
use smol_str::SmolStr;
use std::cmp::Ordering;

/// Apply a binary operator to two already-evaluated operands.
pub fn binary(op: BinaryOp, lhs: Value, rhs: Value) -> RuntimeResult<Value> {
    match op {
        BinaryOp::Add => match (&lhs, &rhs) {
            (Value::Int(a), Value::Int(b)) => checked(a.checked_add(*b), "addition"),
            (Value::String(a), Value::String(b)) => {
                Ok(Value::String(SmolStr::new(format!("{}{}", a, b))))
            }
            _ => float_op(&lhs, &rhs, |a, b| a + b),
        },
        BinaryOp::Sub => match (&lhs, &rhs) {
            (Value::Int(a), Value::Int(b)) => checked(a.checked_sub(*b), "subtraction"),
            _ => float_op(&lhs, &rhs, |a, b| a - b),
        },
        BinaryOp::Mul => match (&lhs, &rhs) {
            (Value::Int(a), Value::Int(b)) => checked(a.checked_mul(*b), "multiplication"),
            _ => float_op(&lhs, &rhs, |a, b| a * b),
        },
        BinaryOp::Div => match (&lhs, &rhs) {
            (_, Value::Int(0)) => Err(RuntimeError::DivisionByZero),
            (_, Value::Float(f)) if *f == 0.0 => Err(RuntimeError::DivisionByZero),
            (Value::Int(a), Value::Int(b)) => checked(a.checked_div(*b), "division"),
            _ => float_op(&lhs, &rhs, |a, b| a / b),
        },
        BinaryOp::Rem => match (&lhs, &rhs) {
            (_, Value::Int(0)) => Err(RuntimeError::DivisionByZero),
            (Value::Int(a), Value::Int(b)) => checked(a.checked_rem(*b), "remainder"),
            _ => Err(RuntimeError::type_error("Int", mismatched(&lhs, &rhs))),
        },
        BinaryOp::Eq => Ok(Value::Bool(lhs == rhs)),
        BinaryOp::Ne => Ok(Value::Bool(lhs != rhs)),
        BinaryOp::Lt => compare(&lhs, &rhs, Ordering::is_lt),
        BinaryOp::Le => compare(&lhs, &rhs, Ordering::is_le),
        BinaryOp::Gt => compare(&lhs, &rhs, Ordering::is_gt),
        BinaryOp::Ge => compare(&lhs, &rhs, Ordering::is_ge),
        BinaryOp::And => Ok(Value::Bool(lhs.is_truthy() && rhs.is_truthy())),
        BinaryOp::Or => Ok(Value::Bool(lhs.is_truthy() || rhs.is_truthy())),
    }
}

/// Apply a unary operator.
pub fn unary(op: UnaryOp, value: Value) -> RuntimeResult<Value> {
    match op {
        UnaryOp::Neg => match value {
            Value::Int(n) => checked(n.checked_neg(), "negation"),
            Value::Float(f) => Ok(Value::Float(-f)),
            other => Err(RuntimeError::type_error("numeric", other.type_name())),
        },
        UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
    }
}

fn checked(result: Option<i64>, operation: &str) -> RuntimeResult<Value> {
    result
        .map(Value::Int)
        .ok_or_else(|| RuntimeError::overflow(operation))
}

fn float_op(lhs: &Value, rhs: &Value, f: impl FnOnce(f64, f64) -> f64) -> RuntimeResult<Value> {
    match (lhs.as_float(), rhs.as_float()) {
        (Some(a), Some(b)) => Ok(Value::Float(f(a, b))),
        _ => Err(RuntimeError::type_error("numeric", mismatched(lhs, rhs))),
    }
}

fn compare(lhs: &Value, rhs: &Value, test: fn(Ordering) -> bool) -> RuntimeResult<Value> {
    let ordering = match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => match (lhs.as_float(), rhs.as_float()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => return Err(RuntimeError::type_error("comparable values", mismatched(lhs, rhs))),
        },
    };
    // NaN compares false under every ordering
    Ok(Value::Bool(ordering.map_or(false, test)))
}

/// Name the offending operand type for error messages.
fn mismatched(lhs: &Value, rhs: &Value) -> String {
    if lhs.as_float().is_none() {
        lhs.type_name().to_string()
    } else {
        rhs.type_name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_arithmetic() {
        assert_eq!(binary(BinaryOp::Add, Value::Int(2), Value::Int(3)).unwrap(), Value::Int(5));
        assert_eq!(binary(BinaryOp::Div, Value::Int(7), Value::Int(2)).unwrap(), Value::Int(3));
        assert_eq!(binary(BinaryOp::Rem, Value::Int(7), Value::Int(2)).unwrap(), Value::Int(1));
    }

    #[test]
    fn test_mixed_arithmetic_promotes() {
        assert_eq!(
            binary(BinaryOp::Mul, Value::Int(2), Value::Float(1.5)).unwrap(),
            Value::Float(3.0)
        );
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(
            binary(BinaryOp::Div, Value::Int(1), Value::Int(0)),
            Err(RuntimeError::DivisionByZero)
        );
        assert_eq!(
            binary(BinaryOp::Rem, Value::Int(1), Value::Int(0)),
            Err(RuntimeError::DivisionByZero)
        );
    }

    #[test]
    fn test_overflow_is_reported() {
        assert!(matches!(
            binary(BinaryOp::Add, Value::Int(i64::MAX), Value::Int(1)),
            Err(RuntimeError::Overflow { .. })
        ));
        assert!(matches!(
            unary(UnaryOp::Neg, Value::Int(i64::MIN)),
            Err(RuntimeError::Overflow { .. })
        ));
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(binary(BinaryOp::Gt, Value::Int(1), Value::Int(0)).unwrap(), Value::Bool(true));
        assert_eq!(
            binary(BinaryOp::Le, Value::Float(1.0), Value::Int(1)).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            binary(BinaryOp::Lt, Value::Float(f64::NAN), Value::Int(1)).unwrap(),
            Value::Bool(false)
        );
        assert!(matches!(
            binary(BinaryOp::Lt, Value::Bool(true), Value::Int(1)),
            Err(RuntimeError::TypeError { .. })
        ));
    }

    #[test]
    fn test_string_concat() {
        assert_eq!(
            binary(BinaryOp::Add, Value::String("a".into()), Value::String("b".into())).unwrap(),
            Value::String("ab".into())
        );
    }

    #[test]
    fn test_logic_uses_truthiness() {
        assert_eq!(binary(BinaryOp::And, Value::Int(1), Value::Int(0)).unwrap(), Value::Bool(false));
        assert_eq!(binary(BinaryOp::Or, Value::Int(1), Value::Int(0)).unwrap(), Value::Bool(true));
        assert_eq!(unary(UnaryOp::Not, Value::Int(0)).unwrap(), Value::Bool(true));
    }
}
