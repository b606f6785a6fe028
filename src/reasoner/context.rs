//! Owns one reasoner context per worker plus the master's shared context.
//!
//! Ported from `contextManager` in `examples/original_source/contextManager.hpp`
//! (`s_ctx` for the single shared context, `q_ctx` for the per-worker
//! vector). All contexts are created once, up front, and live for the
//! duration of the session — `mk_q_ctx`/`mk_s_ctx` become constructors run
//! inside `ContextPool::new`, and `get_q_ctx`/`get_s_ctx` become plain field
//! accessors since there is no longer a process-wide singleton to reach
//! through.

use z3::{Config, Context};

/// Builds a [`Context`] with the options spec.md §6 requires of the
/// underlying reasoner contract: models and proofs both enabled.
fn reasoning_config() -> Config {
    let mut cfg = Config::new();
    cfg.set_model_generation(true);
    cfg.set_proof_generation(true);
    cfg
}

/// Owns every reasoner [`Context`] used in a single solve: one per worker
/// bucket plus the master's shared context, allocated up front so that
/// `'ctx`-bound AST values can safely borrow from them for the lifetime of
/// the scoped thread session.
pub struct ContextPool {
    workers: Vec<Context>,
    shared: Context,
}

impl ContextPool {
    /// Allocate `n` worker contexts plus the shared context.
    pub fn new(n: usize) -> Self {
        let workers = (0..n).map(|_| Context::new(&reasoning_config())).collect();
        let shared = Context::new(&reasoning_config());
        Self { workers, shared }
    }

    pub fn worker(&self, rank: usize) -> &Context {
        &self.workers[rank]
    }

    pub fn shared(&self) -> &Context {
        &self.shared
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }
}
