//! Stable, content-based symbol identity.
//!
//! The underlying reasoner's AST handles are only valid within the context
//! that produced them, so they cannot serve as the cross-context key the
//! registry needs (spec.md §3, "Symbol id"). Instead each declaration is
//! fingerprinted from its name, arity, and sort signature with `crc32fast`
//! (already used elsewhere in the ambient stack for content checksums),
//! giving two declarations the same id iff they would print identically in
//! SMT-LIB2 — which is exactly the notion of "the same logical symbol"
//! spec.md asks for.

use std::fmt;

/// A stable fingerprint identifying a variable or function declaration
/// across reasoner contexts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolId(u32);

impl SymbolId {
    /// Fingerprint an uninterpreted constant (0-arity symbol) from its name
    /// and sort name.
    pub fn for_const(name: &str, sort_name: &str) -> Self {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(b"const\0");
        hasher.update(name.as_bytes());
        hasher.update(b"\0");
        hasher.update(sort_name.as_bytes());
        Self(hasher.finalize())
    }

    /// Fingerprint an uninterpreted function declaration from its name,
    /// domain sort names (in order), and range sort name.
    pub fn for_func(name: &str, domain_sorts: &[String], range_sort: &str) -> Self {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(b"func\0");
        hasher.update(name.as_bytes());
        hasher.update(b"\0");
        for sort in domain_sorts {
            hasher.update(sort.as_bytes());
            hasher.update(b",");
        }
        hasher.update(b"\0");
        hasher.update(range_sort.as_bytes());
        Self(hasher.finalize())
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sym#{:08x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_signature_same_id() {
        let a = SymbolId::for_const("x", "Int");
        let b = SymbolId::for_const("x", "Int");
        assert_eq!(a, b);
    }

    #[test]
    fn different_sort_different_id() {
        let a = SymbolId::for_const("x", "Int");
        let b = SymbolId::for_const("x", "Bool");
        assert_ne!(a, b);
    }

    #[test]
    fn const_and_func_namespaces_disjoint() {
        let c = SymbolId::for_const("f", "Int");
        let f = SymbolId::for_func("f", &[], "Int");
        assert_ne!(c, f);
    }

    #[test]
    fn domain_order_is_significant() {
        let a = SymbolId::for_func("g", &["Int".to_string(), "Bool".to_string()], "Int");
        let b = SymbolId::for_func("g", &["Bool".to_string(), "Int".to_string()], "Int");
        assert_ne!(a, b);
    }
}
