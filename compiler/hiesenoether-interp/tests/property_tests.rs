// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! Property-based tests for unstable evolution and observation.

use hiesenoether_ast::{BinaryOp, ProgramBuilder};
use hiesenoether_interp::{run, Environment, Interpreter, Slot, Value};
use proptest::prelude::*;

proptest! {
    /// After n reads the slot holds v0 + n(n-1)/2 and remembers n accesses.
    #[test]
    fn nth_read_follows_closed_form(v0 in -1_000_000i64..1_000_000, n in 1u64..200) {
        let env = Environment::new();
        env.define("x".into(), Slot::unstable(Value::Int(v0)));

        let mut last = Value::Int(v0);
        for _ in 0..n {
            last = env.read("x").unwrap();
        }

        let expected = v0 + ((n * (n - 1)) / 2) as i64;
        prop_assert_eq!(last, Value::Int(expected));
        prop_assert_eq!(
            env.peek("x"),
            Some(Slot::Unstable { value: Value::Int(expected), access_count: n })
        );
    }

    /// Once stabilized, every later read returns the frozen value.
    #[test]
    fn stabilize_freezes(v0 in -1000i64..1000, before in 0usize..20, after in 1usize..20) {
        let mut b = ProgramBuilder::new();
        b.energy(100);
        let init = b.int(v0);
        b.bind("x", init);
        for _ in 0..before {
            let x = b.var("x");
            b.print(x);
        }
        b.stabilize("x");
        for _ in 0..after {
            let x = b.var("x");
            b.print(x);
        }
        let program = b.finish();

        let outcome = run(&program);
        prop_assert!(outcome.is_success());
        let frozen = &outcome.output[before..];
        prop_assert_eq!(frozen.len(), after);
        let expected = match outcome.output[..before].last() {
            Some(last) => last.clone(),
            None => v0.to_string(),
        };
        prop_assert!(frozen.iter().all(|line| *line == expected));
    }

    /// Invariant checkpoints never advance unstable bindings.
    #[test]
    fn invariant_checks_do_not_evolve(v0 in 1i64..1000, statements in 1usize..30) {
        let mut b = ProgramBuilder::new();
        b.energy(100);
        let init = b.int(v0);
        b.bind("x", init);
        let x = b.var("x");
        let zero = b.int(0);
        let positive = b.binary(BinaryOp::Gt, x, zero);
        b.invariant(positive);
        for _ in 0..statements {
            b.query_energy();
        }
        let program = b.finish();

        let mut interp = Interpreter::new();
        let outcome = interp.run(&program);
        prop_assert!(outcome.is_success());
        prop_assert_eq!(interp.global().peek("x"), Some(Slot::unstable(Value::Int(v0))));
    }
}
