//! # psmt
//!
//! A parallel decision procedure for quantifier-free first-order formulas in
//! SMT-LIB2 format.
//!
//! ## Pipeline
//!
//! ```text
//! SMT-LIB2 file
//!     ↓
//! [Reasoner Adapter]         → parsed formula, per-worker contexts
//!     ↓
//! [CNF + Footprints]         → clauses, per-clause symbol weights
//!     ↓
//! [Partitioner]               → clause → bucket assignment
//!     ↓
//! [Shared-Symbol Registry]    → shared vars/funcs, local↔global plumbing
//!     ↓
//! [Reconciliation Loop]       → barrier-synchronized master/worker rounds
//!     ↓
//! Verdict (sat / unsat / unknown)
//! ```
//!
//! ## Module organization
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `reasoner` | The only module that speaks `z3` directly: contexts, parsing, interpolation |
//! | `symbol` | Stable identifiers for uninterpreted constants/functions |
//! | `closure` | Content-addressed value fingerprints shared across contexts |
//! | `clause` | Per-clause symbol footprints used by the partitioner |
//! | `partition` | Greedy weighted clause → bucket assignment |
//! | `registry` | Cross-bucket shared-symbol bookkeeping |
//! | `bucket` | Per-worker subproblem state and round results |
//! | `reconcile` | The master/worker reconciliation loop itself |
//! | `verdict` | The `sat`/`unsat`/`unknown` result type |
//! | `config` | Layered configuration (defaults, file, environment) |
//! | `error` | Fatal error conditions and their exit codes |

pub mod bucket;
pub mod clause;
pub mod closure;
pub mod config;
pub mod error;
pub mod partition;
pub mod reasoner;
pub mod reconcile;
pub mod registry;
pub mod symbol;
pub mod verdict;

pub use config::Config;
pub use error::{PsmtError, PsmtResult};
pub use reasoner::ContextPool;
pub use verdict::Verdict;
