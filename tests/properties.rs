//! Round-trip / permutation laws from spec.md §8, as property tests.

use proptest::prelude::*;
use z3::ast::Ast;

use psmt::clause::ClauseFootprint;
use psmt::partition::partition_clauses;
use psmt::reasoner::ContextPool;
use psmt::symbol::SymbolId;

fn arb_symbol() -> impl Strategy<Value = SymbolId> {
    "[a-z]{1,4}".prop_map(|name| SymbolId::for_const(&name, "Int"))
}

proptest! {
    /// Re-decomposing the same footprints with the same N is deterministic,
    /// so in particular it produces the same `dist` every time (a stronger
    /// statement than "modulo permutation", since the partitioner itself
    /// never renumbers buckets between runs).
    #[test]
    fn repartitioning_same_input_is_deterministic(
        symbols in prop::collection::vec(arb_symbol(), 1..6),
        weights in prop::collection::vec(1u32..5, 1..6),
        n in 1usize..4,
    ) {
        let universe: Vec<SymbolId> = symbols.clone();
        let mut footprints = Vec::new();
        for (i, (&sym, &w)) in symbols.iter().zip(weights.iter()).enumerate() {
            let mut fp = ClauseFootprint::new(i);
            fp.record(sym, w);
            footprints.push(fp);
        }

        let first = partition_clauses(&universe, &footprints, n);
        let second = partition_clauses(&universe, &footprints, n);
        prop_assert_eq!(first.dist, second.dist);
    }

    /// Translating a term from one context to another and back yields a
    /// syntactically equal term in the original context.
    #[test]
    fn translate_round_trip_preserves_term(value in 0i64..1000) {
        let pool = ContextPool::new(1);
        let a = pool.worker(0);
        let b = pool.shared();

        let term = z3::ast::Int::from_i64(a, value);
        let there = term.translate(b);
        let back = there.translate(a);
        prop_assert_eq!(back.to_string(), term.to_string());
    }
}
