//! Error types for the decision procedure.

use std::path::PathBuf;

use thiserror::Error;

/// Result type used throughout the crate.
pub type PsmtResult<T> = Result<T, PsmtError>;

/// All fatal error conditions the core can raise.
///
/// Every variant is fatal: the top-level driver prints it to stderr (under
/// a shared lock so racing worker threads cannot interleave messages) and
/// exits with a non-zero status. There are no recoverable conditions in the
/// core; the partitioner's heuristic-to-round-robin fallback is a design
/// decision, not an error path.
#[derive(Error, Debug)]
pub enum PsmtError {
    #[error("usage: {0}")]
    UsageError(String),

    #[error("input file not found: {0}")]
    InputMissing(PathBuf),

    #[error("input malformed: {0}")]
    InputMalformed(String),

    #[error("input corrupt: {0}")]
    InputCorrupt(String),

    #[error("tactic pipeline produced {0} subgoals, expected exactly 1")]
    EngineTacticUnexpectedSubgoals(usize),

    #[error("reasoner returned unknown during reconciliation")]
    EngineUnknownResult,

    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),
}

impl PsmtError {
    /// Exit code the process should terminate with for this error.
    ///
    /// spec.md §7 defines only a two-way split (0 success / 1 any fatal
    /// error); engine and invariant failures share code 1 with
    /// usage/input errors since no separate code is defined for them.
    pub fn exit_code(&self) -> i32 {
        1
    }
}
