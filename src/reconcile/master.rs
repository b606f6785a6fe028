//! Master-side round logic (spec.md §4.7): interpolant accumulation,
//! shared-variable re-evaluation, and function-instance harvesting/voting.
//!
//! Ported from `master_func` and `get_most_freq` in
//! `examples/original_source/core.cpp`.

use std::collections::{BTreeMap, HashMap};

use parking_lot::Mutex;
use z3::{SatResult, Solver};

use crate::bucket::{Bucket, RoundOutput};
use crate::closure::{Closure, FunctionInstance, MappingOutcome};
use crate::error::{PsmtError, PsmtResult};
use crate::reasoner::adapter::{closure_of_value, eval_closure};
use crate::registry::Registry;
use crate::symbol::SymbolId;
use crate::verdict::Verdict;

/// Everything only the master thread owns across rounds: the interpolant
/// accumulator (`sv_solve` in the original), the current best-known closure
/// of every shared variable, and the currently-agreed shared function
/// instances.
pub struct MasterState<'ctx> {
    pub accumulator: Solver<'ctx>,
    pub svexpr: HashMap<SymbolId, Closure>,
    pub sfist: HashMap<FunctionInstance, Closure>,
    pub need_term: bool,
    pub verdict: Option<Verdict>,
}

impl<'ctx> MasterState<'ctx> {
    /// Seeds `svexpr` by evaluating every shared variable's shared-context
    /// term under the model of an empty solver (`model_completion = true`
    /// gives every shared variable of the same sort the same default
    /// closure, which is exactly the round-0 "assume equal, let the solver
    /// refute it" probe spec.md §4.6/§4.7 rely on).
    pub fn new(registry: &Registry<'ctx>, shared_ctx: &'ctx z3::Context) -> PsmtResult<Self> {
        let accumulator = Solver::new(shared_ctx);
        accumulator.check();
        let pre_model = accumulator
            .get_model()
            .ok_or_else(|| PsmtError::InternalInvariant("empty accumulator solver produced no model".to_string()))?;

        let mut svexpr = HashMap::new();
        for (&sym, term) in &registry.shared_var_term {
            if let MappingOutcome::Mapped(c) = eval_closure(&pre_model, term) {
                svexpr.insert(sym, c);
            }
        }

        Ok(Self {
            accumulator,
            svexpr,
            sfist: HashMap::new(),
            need_term: false,
            verdict: None,
        })
    }
}

/// Picks the plurality-vote closure among `observed`, ties broken in favor
/// of the lexicographically-smaller closure since both `BTreeMap` iteration
/// order and the strict `>` comparison in `get_most_freq` agree on that
/// (ported from `get_most_freq`).
fn most_frequent(observed: &[Closure]) -> Closure {
    let mut counts: BTreeMap<Closure, u32> = BTreeMap::new();
    for &c in observed {
        *counts.entry(c).or_insert(0) += 1;
    }
    let mut best = Closure::UNKNOWN_SORT;
    let mut max = 0u32;
    for (&clo, &count) in &counts {
        if count > max {
            max = count;
            best = clo;
        }
    }
    best
}

/// Reads every SAT bucket's model + local→global table and counts, per
/// shared function instance, how many distinct buckets observed it (step 1
/// of the ALLSAT branch in `master_func`).
///
/// Range closures that the owning bucket cannot map to a global closure
/// fall back to a sort-tagged placeholder rather than the original's bare
/// zero closure, and booleans keep their real truth value instead of
/// always collapsing to `TRUE` — both were open `FIXME`s in `master_func`
/// ("sort information should be retained", "if its range is of boolean
/// type, set it as true or false instead of zero closure").
fn harvest_function_instances<'ctx>(buckets: &[Mutex<Bucket<'ctx>>]) -> HashMap<FunctionInstance, Vec<Closure>> {
    let mut fist_count: HashMap<FunctionInstance, Vec<Closure>> = HashMap::new();
    for bucket_lock in buckets {
        let bucket = bucket_lock.lock();
        let (model, table) = match &bucket.last_round {
            Some(RoundOutput::Sat { model, table }) => (model, table),
            _ => continue,
        };
        for (&func_id, decl) in &bucket.fun_expr {
            let Some(interp) = model.get_func_interp(decl) else {
                continue;
            };
            for entry in interp.get_entries() {
                let args = entry.args();
                let mut mapped_args = Vec::with_capacity(args.len());
                let mut all_shared = true;
                for arg in &args {
                    let local_clo = closure_of_value(arg);
                    match table.get(&local_clo) {
                        Some(&global_clo) => mapped_args.push(global_clo),
                        None => {
                            all_shared = false;
                            break;
                        }
                    }
                }
                if !all_shared {
                    continue;
                }
                let local_range_clo = closure_of_value(&entry.value());
                let range_clo = match table.get(&local_range_clo) {
                    Some(&g) => g,
                    None if local_range_clo.is_bool() => local_range_clo,
                    None => Closure::new(local_range_clo.sort_id, 0),
                };
                let fi = FunctionInstance::new(func_id, mapped_args);
                fist_count.entry(fi).or_default().push(range_clo);
            }
        }
    }
    fist_count
}

/// Every bucket reported SAT this round (spec.md §4.7 ALLSAT branch).
fn process_allsat<'ctx>(state: &mut MasterState<'ctx>, registry: &Registry<'ctx>, buckets: &[Mutex<Bucket<'ctx>>]) -> PsmtResult<()> {
    if registry.pure_literal {
        // No shared functions: a fake witness is impossible, ALLSAT alone
        // settles it.
        state.need_term = true;
        state.verdict = Some(Verdict::Sat);
        return Ok(());
    }

    let fist_count = harvest_function_instances(buckets);
    let mut found_new = false;
    for (fi, observed) in fist_count {
        if observed.len() > 1 && !state.sfist.contains_key(&fi) {
            found_new = true;
            state.sfist.insert(fi, most_frequent(&observed));
        }
    }

    if !found_new {
        state.need_term = true;
        state.verdict = Some(Verdict::Sat);
    }
    Ok(())
}

/// At least one bucket reported UNSAT this round (spec.md §4.7 SOME_UNSAT
/// branch): accumulate every UNSAT bucket's interpolant and re-derive
/// `svexpr`/`sfist` from the accumulator's model, or conclude the whole
/// input is UNSAT.
fn process_some_unsat<'ctx>(
    state: &mut MasterState<'ctx>,
    registry: &Registry<'ctx>,
    buckets: &[Mutex<Bucket<'ctx>>],
    shared_ctx: &'ctx z3::Context,
) -> PsmtResult<()> {
    for bucket_lock in buckets {
        let bucket = bucket_lock.lock();
        if let Some(RoundOutput::Unsat { interpolant }) = &bucket.last_round {
            let translated = interpolant.translate(shared_ctx);
            state.accumulator.assert(&translated);
        }
    }

    match state.accumulator.check() {
        SatResult::Sat => {
            let model = state
                .accumulator
                .get_model()
                .ok_or_else(|| PsmtError::InternalInvariant("accumulator sat with no model".to_string()))?;

            state.svexpr.clear();
            for (&sym, term) in &registry.shared_var_term {
                if let MappingOutcome::Mapped(c) = eval_closure(&model, term) {
                    state.svexpr.insert(sym, c);
                }
            }

            // Rebuilt from scratch every time (a naive but correct
            // overwrite, matching the original), restricted to declared
            // shared functions rather than every function decl the
            // accumulator's model happens to mention — interpolation can
            // introduce auxiliary symbols that were never actually shared.
            state.sfist.clear();
            for (&func_id, decl) in &registry.shared_func_decl {
                let Some(interp) = model.get_func_interp(decl) else {
                    continue;
                };
                for entry in interp.get_entries() {
                    let args: Vec<Closure> = entry.args().iter().map(closure_of_value).collect();
                    let range = closure_of_value(&entry.value());
                    state.sfist.insert(FunctionInstance::new(func_id, args), range);
                }
            }
            Ok(())
        }
        SatResult::Unsat => {
            state.need_term = true;
            state.verdict = Some(Verdict::Unsat);
            Ok(())
        }
        SatResult::Unknown => Err(PsmtError::EngineUnknownResult),
    }
}

/// Dispatches to the ALLSAT or SOME_UNSAT branch based on this round's
/// `checklist` (each bucket's `last_round`).
pub fn master_round<'ctx>(
    state: &mut MasterState<'ctx>,
    registry: &Registry<'ctx>,
    buckets: &[Mutex<Bucket<'ctx>>],
    shared_ctx: &'ctx z3::Context,
) -> PsmtResult<()> {
    let all_sat = buckets
        .iter()
        .all(|b| matches!(b.lock().last_round, Some(RoundOutput::Sat { .. })));
    if all_sat {
        process_allsat(state, registry, buckets)
    } else {
        process_some_unsat(state, registry, buckets, shared_ctx)
    }
}
