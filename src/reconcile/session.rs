//! Barrier-synchronized reconciliation session (spec.md §4.5, §5 "Threading
//! model"): owns every bucket, the master's cross-round state, and the two
//! barriers that drive the round loop.
//!
//! Ported from the `barrier1`/`barrier2`/`need_term` protocol in
//! `master_func`/`slave_func` (`examples/original_source/core.cpp`). A true
//! lock-free, barrier-only shared memory model (as in the original's raw
//! pthread globals) is not expressible in safe Rust without per-field
//! `unsafe` cells; this uses uncontended `parking_lot` locks instead, since
//! every lock is only ever touched by one thread inside any given barrier
//! window. Ordering still comes entirely from the barriers, not from lock
//! contention.

use std::sync::Barrier;

use parking_lot::Mutex;
use z3::Context;

use crate::bucket::Bucket;
use crate::config::Config;
use crate::error::PsmtError;
use crate::reconcile::master::{master_round, MasterState};
use crate::reconcile::worker::worker_round;
use crate::registry::Registry;
use crate::verdict::Verdict;

/// A single reconciliation run over an already-partitioned, already
/// initial-checked set of buckets.
pub struct SolveSession<'ctx> {
    shared_ctx: &'ctx Context,
    registry: Registry<'ctx>,
    config: Config,
    buckets: Vec<Mutex<Bucket<'ctx>>>,
    master: parking_lot::RwLock<MasterState<'ctx>>,
    /// First fatal error observed by any thread (a worker's `EngineUnknown`
    /// or an internal invariant violation surfaced by the master). Ported
    /// from the original's `exit(1)` deep inside `slave_func`, which this
    /// crate replaces with a typed error surfaced through this slot instead
    /// of aborting the process (Design Notes §9).
    fatal: Mutex<Option<PsmtError>>,
    barrier1: Barrier,
    barrier2: Barrier,
}

impl<'ctx> SolveSession<'ctx> {
    pub fn new(shared_ctx: &'ctx Context, registry: Registry<'ctx>, config: Config, buckets: Vec<Bucket<'ctx>>) -> Result<Self, PsmtError> {
        let master = MasterState::new(&registry, shared_ctx)?;
        let n = buckets.len();
        Ok(Self {
            shared_ctx,
            registry,
            config,
            buckets: buckets.into_iter().map(Mutex::new).collect(),
            master: parking_lot::RwLock::new(master),
            fatal: Mutex::new(None),
            barrier1: Barrier::new(n + 1),
            barrier2: Barrier::new(n + 1),
        })
    }

    /// Runs the reconciliation loop to completion and returns the verdict
    /// (spec.md §4.5-§4.8). Spawns `n` scoped worker threads; the calling
    /// thread itself plays the role of the master (spec.md §5: "`n` worker
    /// threads... plus one master thread" — the master is whichever thread
    /// invokes this method, not a literal extra spawn).
    pub fn run(&self) -> Result<Verdict, PsmtError> {
        std::thread::scope(|scope| {
            for rank in 0..self.buckets.len() {
                std::thread::Builder::new()
                    .stack_size(self.config.execution.worker_stack_bytes)
                    .spawn_scoped(scope, move || self.worker_loop(rank))
                    .expect("failed to spawn reconciliation worker thread");
            }
            self.master_loop()
        })
    }

    fn worker_loop(&self, rank: usize) {
        loop {
            self.barrier1.wait();
            if self.master.read().need_term {
                break;
            }

            let (svexpr, sfist) = {
                let m = self.master.read();
                (m.svexpr.clone(), m.sfist.clone())
            };
            {
                let mut bucket = self.buckets[rank].lock();
                match worker_round(rank, &mut bucket, &svexpr, &sfist, &self.config.reconcile) {
                    Ok(output) => bucket.last_round = Some(output),
                    Err(e) => {
                        bucket.last_round = None;
                        *self.fatal.lock() = Some(e);
                    }
                }
            }

            self.barrier2.wait();
        }
    }

    fn master_loop(&self) -> Result<Verdict, PsmtError> {
        loop {
            self.barrier1.wait();
            if self.master.read().need_term {
                break;
            }

            self.barrier2.wait();

            if self.fatal.lock().is_some() {
                // A worker hit a fatal condition this round; fold it into
                // `need_term` so every thread breaks together at the next
                // `barrier1` rendezvous instead of this thread returning
                // early and leaving the others blocked forever.
                self.master.write().need_term = true;
                continue;
            }

            let mut master = self.master.write();
            if let Err(e) = master_round(&mut master, &self.registry, &self.buckets, self.shared_ctx) {
                *self.fatal.lock() = Some(e);
                master.need_term = true;
            }
        }

        if let Some(e) = self.fatal.lock().take() {
            return Err(e);
        }
        Ok(self.master.read().verdict.unwrap_or(Verdict::Unknown))
    }
}
