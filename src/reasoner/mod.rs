//! The Reasoner Adapter and Context Pool (spec.md §2, §4.1, §6): the only
//! part of the crate that speaks `z3` directly. Everything above this
//! module works in terms of [`crate::closure::Closure`],
//! [`crate::symbol::SymbolId`], and plain `z3::ast` values borrowed with an
//! explicit `'ctx` lifetime.

pub mod adapter;
pub mod context;
pub mod interpolate;

pub use context::ContextPool;
