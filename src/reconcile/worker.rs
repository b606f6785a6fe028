//! Per-round worker logic (spec.md §4.6): localization, term-statistics
//! grouping, constraint-formula construction, and solving `expr_list ∧ C_r`.
//!
//! Ported from `localization`/`slave_func` in
//! `examples/original_source/core.cpp`.

use std::collections::{BTreeMap, HashMap};

use z3::ast::{Ast, Bool, Dynamic};
use z3::SatResult;

use crate::bucket::{Bucket, RoundOutput};
use crate::closure::{Closure, FunctionInstance};
use crate::config::ReconcileConfig;
use crate::error::{PsmtError, PsmtResult};
use crate::reasoner::adapter::eval_closure;
use crate::reasoner::interpolate::interpolate;
use crate::closure::MappingOutcome;
use crate::symbol::SymbolId;

/// Step 1: builds every term this bucket can currently name under a known
/// global closure — its own shared variables (seeded from `svexpr`) plus
/// any shared function instance whose arguments are all already named,
/// applied via this bucket's own declaration and propagated to a fixpoint
/// (ported from `localization` in `core.cpp`).
///
/// Uses a `BTreeMap` rather than a hash map so later iteration is already
/// sorted by `(sort_id, value_id)` — Step 3's disequality fan relies on
/// that order to cluster representatives by sort.
fn localize<'ctx>(
    bucket: &Bucket<'ctx>,
    svexpr: &HashMap<SymbolId, Closure>,
    sfist: &HashMap<FunctionInstance, Closure>,
) -> BTreeMap<Closure, Vec<Dynamic<'ctx>>> {
    let mut term_stat: BTreeMap<Closure, Vec<Dynamic<'ctx>>> = BTreeMap::new();

    for (sym, term) in &bucket.var_expr {
        if let Some(&clo) = svexpr.get(sym) {
            term_stat.entry(clo).or_default().push(term.clone());
        }
    }

    let mut pending: Vec<(&FunctionInstance, Closure)> = sfist
        .iter()
        .filter(|(fi, _)| bucket.fun_expr.contains_key(&fi.func_id))
        .map(|(fi, &range)| (fi, range))
        .collect();

    loop {
        let mut made_progress = false;
        pending.retain(|&(fi, range_clo)| {
            let mut args = Vec::with_capacity(fi.args.len());
            for dom_clo in &fi.args {
                match term_stat.get(dom_clo).map(|terms| terms[0].clone()) {
                    Some(t) => args.push(t),
                    None => return true, // not ready yet
                }
            }
            // Always record the instantiated term, even if `range_clo`
            // already has a representative from another path: ground truth
            // `localization` (examples/original_source/core.cpp:1636-1852)
            // pushes every localized instance into `result` unconditionally
            // once its domain is ready — `set_status()` only gates further
            // propagation, not whether the term itself gets recorded.
            let decl = &bucket.fun_expr[&fi.func_id];
            let arg_refs: Vec<&dyn Ast> = args.iter().map(|a| a as &dyn Ast).collect();
            let new_term = decl.apply(&arg_refs);
            term_stat.entry(range_clo).or_default().push(new_term);
            made_progress = true;
            false
        });
        if !made_progress {
            break;
        }
    }

    term_stat
}

/// Step 3: builds `C_r` from the term groups computed in Step 1 (spec.md
/// §4.6): positive literals for the `TRUE` group, negated literals for the
/// `FALSE` group, adjacent-chain equalities inside every other group, and
/// (when `cfg.disequality_fan` is set) an `O(m^2)` disequality fan between
/// representatives of distinct groups sharing a sort.
fn build_constraint<'ctx>(
    ctx: &'ctx z3::Context,
    term_stat: &BTreeMap<Closure, Vec<Dynamic<'ctx>>>,
    cfg: &ReconcileConfig,
) -> Bool<'ctx> {
    let mut conjuncts: Vec<Bool<'ctx>> = Vec::new();

    for (&clo, terms) in term_stat {
        if clo == Closure::TRUE {
            for t in terms {
                conjuncts.push(t.as_bool().expect("TRUE-group term must be boolean"));
            }
        } else if clo == Closure::FALSE {
            for t in terms {
                conjuncts.push(t.as_bool().expect("FALSE-group term must be boolean").not());
            }
        } else {
            for pair in terms.windows(2) {
                conjuncts.push(pair[0]._eq(&pair[1]));
            }
        }
    }

    if cfg.disequality_fan {
        let reps_by_sort: Vec<(Closure, &Dynamic<'ctx>)> = term_stat
            .iter()
            .filter(|(&clo, _)| clo != Closure::TRUE && clo != Closure::FALSE)
            .map(|(&clo, terms)| (clo, &terms[0]))
            .collect();
        // `term_stat` is a `BTreeMap`, so this is already grouped by sort_id.
        let mut i = 0;
        while i < reps_by_sort.len() {
            let mut j = i + 1;
            while j < reps_by_sort.len() && reps_by_sort[j].0.sort_id == reps_by_sort[i].0.sort_id {
                j += 1;
            }
            for a in i..j {
                for b in (a + 1)..j {
                    conjuncts.push(reps_by_sort[a].1._eq(reps_by_sort[b].1).not());
                }
            }
            i = j;
        }
    }

    if conjuncts.is_empty() {
        Bool::from_bool(ctx, true)
    } else {
        let refs: Vec<&Bool> = conjuncts.iter().collect();
        Bool::and(ctx, &refs)
    }
}

/// Runs one full reconciliation round for `bucket` (spec.md §4.6, all four
/// steps): localize, build `C_r`, solve `expr_list ∧ C_r`, and on SAT build
/// the local→global closure table the master needs for harvesting.
///
/// `svexpr`/`sfist` are read-only snapshots of the master's state as of the
/// start of this round — the worker never mutates master state directly
/// (spec.md §5 "no per-element locks", adapted here as "workers write only
/// their own bucket slot").
pub fn worker_round<'ctx>(
    rank: usize,
    bucket: &mut Bucket<'ctx>,
    svexpr: &HashMap<SymbolId, Closure>,
    sfist: &HashMap<FunctionInstance, Closure>,
    cfg: &ReconcileConfig,
) -> PsmtResult<RoundOutput<'ctx>> {
    let term_stat = localize(bucket, svexpr, sfist);
    let c_r = build_constraint(bucket.ctx, &term_stat, cfg);

    let (result, model) = bucket.check_round(&c_r);
    match result {
        SatResult::Unsat => {
            let interpolant = interpolate(bucket.ctx, &bucket.conjunction, &c_r)?;
            Ok(RoundOutput::Unsat { interpolant })
        }
        SatResult::Sat => {
            let model = model.ok_or_else(|| {
                PsmtError::InternalInvariant(format!("bucket {rank} reported sat with no model"))
            })?;
            let mut table = HashMap::new();
            for (&global_clo, terms) in &term_stat {
                if let MappingOutcome::Mapped(local_clo) = eval_closure(&model, &terms[0]) {
                    table.insert(local_clo, global_clo);
                }
            }
            Ok(RoundOutput::Sat { model, table })
        }
        SatResult::Unknown => Err(PsmtError::EngineUnknownResult),
    }
}
