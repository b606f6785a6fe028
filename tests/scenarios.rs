//! End-to-end scenarios (spec.md §8), each formula reproduced verbatim as an
//! SMT-LIB2 fixture file and run through the full `psmt` pipeline.

use std::io::Write;

use psmt::reasoner::ContextPool;
use psmt::{reconcile, Config, Verdict};

fn solve(smt2: &str, n: usize) -> Verdict {
    let mut file = tempfile::Builder::new().suffix(".smt2").tempfile().unwrap();
    write!(file, "{smt2}").unwrap();
    let pool = ContextPool::new(n);
    let config = Config::default();
    reconcile::solve(&pool, file.path(), &config).expect("solve should not error")
}

#[test]
fn scenario_1_contradictory_bounds_is_unsat() {
    let smt2 = r#"
        (declare-const x Int)
        (assert (> x 0))
        (assert (< x 0))
        (check-sat)
    "#;
    assert_eq!(solve(smt2, 2), Verdict::Unsat);
}

#[test]
fn scenario_2_equality_chain_with_disequality_is_unsat() {
    let smt2 = r#"
        (declare-const x Int)
        (declare-const y Int)
        (declare-const z Int)
        (assert (= x y))
        (assert (= y z))
        (assert (not (= x z)))
        (check-sat)
    "#;
    assert_eq!(solve(smt2, 3), Verdict::Unsat);
}

#[test]
fn scenario_3_function_instance_conflict_is_unsat() {
    let smt2 = r#"
        (declare-const a Int)
        (declare-const b Int)
        (declare-fun f (Int) Int)
        (assert (= (f a) b))
        (assert (not (= (f a) b)))
        (check-sat)
    "#;
    assert_eq!(solve(smt2, 2), Verdict::Unsat);
}

#[test]
fn scenario_4_disjoint_symbols_is_sat_via_short_circuit() {
    let smt2 = r#"
        (declare-const x Int)
        (declare-const y Int)
        (assert (= x 1))
        (assert (= y 2))
        (check-sat)
    "#;
    assert_eq!(solve(smt2, 2), Verdict::Sat);
}

#[test]
fn scenario_5_accumulator_becomes_inconsistent_is_unsat() {
    let smt2 = r#"
        (declare-const a Int)
        (declare-const b Int)
        (declare-fun f (Int) Int)
        (assert (= (f a) a))
        (assert (= (f (f a)) a))
        (assert (= a b))
        (assert (not (= (f b) a)))
        (check-sat)
    "#;
    assert_eq!(solve(smt2, 2), Verdict::Unsat);
}

#[test]
fn scenario_6_disjunction_is_trivially_sat() {
    let smt2 = r#"
        (declare-const x Int)
        (assert (or (= x 1) (= x 2)))
        (check-sat)
    "#;
    assert_eq!(solve(smt2, 2), Verdict::Sat);
}
