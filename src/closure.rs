//! Equivalence-class tags ("closures") and uninterpreted-function instances.
//!
//! Ported from the original `closure`/`func_inst` classes
//! (`examples/original_source/core.hpp`), which overloaded `<`, `==`, `!=`,
//! `>` by hand on raw `unsigned` pairs. Design Notes §9 calls for replacing
//! overloaded comparisons with one explicit total order per key type, so
//! both types below simply derive `Ord` from field declaration order, which
//! already gives the lexicographic order the spec requires.

use crate::symbol::SymbolId;

/// An equivalence-class tag `(sort_id, value_id)` identifying a class of
/// ground terms modulo the current shared model. Totally ordered
/// lexicographically by `(sort_id, value_id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Closure {
    pub sort_id: u32,
    pub value_id: u32,
}

impl Closure {
    pub const fn new(sort_id: u32, value_id: u32) -> Self {
        Self { sort_id, value_id }
    }

    /// Reserved sort id for the two boolean closures, chosen to never
    /// collide with a real sort fingerprint.
    const BOOL_SORT: u32 = u32::MAX;

    /// The closure of `true`.
    pub const TRUE: Closure = Closure::new(Self::BOOL_SORT, 1);
    /// The closure of `false`.
    pub const FALSE: Closure = Closure::new(Self::BOOL_SORT, 0);
    /// Sentinel meaning "no sort is known yet" — distinct from
    /// [`MappingOutcome::Unmapped`], per the Open Questions in spec.md §9
    /// ("the zero closure sentinel is used both to mean unknown sort and
    /// unmapped range; these are distinct conditions"). This crate keeps
    /// `UNKNOWN_SORT` only for genuinely sort-less placeholders and uses
    /// [`MappingOutcome`] everywhere a range might simply be unmapped.
    pub const UNKNOWN_SORT: Closure = Closure::new(0, 0);

    pub fn is_bool(self) -> bool {
        self.sort_id == Self::BOOL_SORT
    }
}

/// The outcome of mapping a local closure into global terms during
/// function-instance harvesting (spec.md §4.7). Kept distinct from
/// `Closure::UNKNOWN_SORT` so "the argument has no global mapping yet" can
/// never be silently confused with "the argument's sort is unknown".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingOutcome {
    Mapped(Closure),
    Unmapped,
}

/// An uninterpreted-function application identified up to closure
/// equivalence of its arguments: `(func_id, [closure_0, ..., closure_{k-1}])`.
/// Ordered lexicographically by `func_id` then by the argument vector.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FunctionInstance {
    pub func_id: SymbolId,
    pub args: Vec<Closure>,
}

impl FunctionInstance {
    pub fn new(func_id: SymbolId, args: Vec<Closure>) -> Self {
        Self { func_id, args }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closure_order_is_lexicographic() {
        assert!(Closure::new(1, 5) < Closure::new(2, 0));
        assert!(Closure::new(1, 5) < Closure::new(1, 6));
        assert_eq!(Closure::new(3, 3), Closure::new(3, 3));
    }

    #[test]
    fn true_false_and_unknown_sort_are_distinct() {
        assert_ne!(Closure::TRUE, Closure::FALSE);
        assert_ne!(Closure::TRUE, Closure::UNKNOWN_SORT);
        assert_ne!(Closure::FALSE, Closure::UNKNOWN_SORT);
        assert!(Closure::TRUE.is_bool());
        assert!(!Closure::UNKNOWN_SORT.is_bool());
    }

    #[test]
    fn function_instance_order_compares_args_after_func_id() {
        let f = SymbolId::for_func("f", &["Int".to_string()], "Int");
        let a = FunctionInstance::new(f, vec![Closure::new(1, 0)]);
        let b = FunctionInstance::new(f, vec![Closure::new(1, 1)]);
        assert!(a < b);
    }
}
