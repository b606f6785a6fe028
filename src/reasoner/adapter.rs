//! Thin boundary over the underlying SMT engine (spec.md §2 "Reasoner
//! Adapter", §6 "Underlying reasoner contract").
//!
//! Everything here wraps the `z3` crate directly; idioms (explicit `'ctx`
//! lifetimes, `Config`/`Context`/`Solver` construction, `SatResult`
//! matching, push/pop-scoped assertions) are ported from
//! `examples/Brahmastra-Labs-logicaffeine/crates/logicaffeine_verify/src/solver.rs`.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use z3::ast::{Ast, Bool, Dynamic};
use z3::{DeclKind, Goal, Model, SatResult, Solver, Tactic};
use z3::Context;

use crate::closure::{Closure, MappingOutcome};
use crate::clause::ClauseFootprint;
use crate::config::PartitionConfig;
use crate::error::{PsmtError, PsmtResult};
use crate::symbol::SymbolId;

/// Parses an SMT-LIB2 file into a single conjoined formula in `ctx`.
///
/// Each worker calls this independently into its own context (spec.md
/// §4.1), so every bucket ends up with its own syntactically-equal but
/// context-local copy of the parsed formula.
pub fn parse_file<'ctx>(ctx: &'ctx Context, path: &Path) -> PsmtResult<Bool<'ctx>> {
    if path.extension().and_then(|e| e.to_str()) == Some("smt") {
        return Err(PsmtError::InputMalformed(
            "SMT-LIB1 (.smt) input is recognized but unimplemented".to_string(),
        ));
    }
    let text = fs::read_to_string(path).map_err(|_| PsmtError::InputMissing(path.to_path_buf()))?;

    let solver = Solver::new(ctx);
    solver.from_string(&text);
    let assertions = solver.get_assertions();
    if assertions.is_empty() {
        return Ok(Bool::from_bool(ctx, true));
    }
    let refs: Vec<&Bool> = assertions.iter().collect();
    Ok(Bool::and(ctx, &refs))
}

/// Runs the fixed tactic pipeline `simplify -> elim-term-ite -> tseitin-cnf`
/// and returns the resulting clauses (spec.md §4.1).
pub fn to_cnf_clauses<'ctx>(ctx: &'ctx Context, formula: &Bool<'ctx>) -> PsmtResult<Vec<Bool<'ctx>>> {
    let mut goal = Goal::new(ctx, false, false, false);
    goal.assert(formula);

    let simplify = Tactic::new(ctx, "simplify");
    let elim_ite = Tactic::new(ctx, "elim-term-ite");
    let tseitin = Tactic::new(ctx, "tseitin-cnf");
    let pipeline = simplify.and_then(&elim_ite).and_then(&tseitin);

    let result = pipeline
        .apply(&goal, None)
        .map_err(|_| PsmtError::InputCorrupt("tactic pipeline rejected the input formula".to_string()))?;

    if result.num_subgoals() != 1 {
        return Err(PsmtError::EngineTacticUnexpectedSubgoals(result.num_subgoals()));
    }
    let subgoal = result.get_subgoal(0);
    Ok(subgoal.get_formulas::<Bool>())
}

/// Walks `term`'s AST, recording every uninterpreted constant and function
/// application's symbol into `footprint` with the weights spec.md §4.1
/// assigns (`W_VAR` per constant, `arity * W_FUNC` per function
/// application). Numerals and interpreted operators have a non-uninterpreted
/// `DeclKind` and are skipped; Tseitin auxiliary variables are ordinary
/// 0-arity uninterpreted constants and are tagged like any other variable.
///
/// Each distinct symbol is recorded at most once for the whole clause, no
/// matter how many times it recurs in the walk, matching ground truth
/// `get_vars` (examples/original_source/core.cpp:607-646: "we don't care if
/// this symbol appears for several times").
pub fn extend_footprint(term: &Dynamic, cfg: &PartitionConfig, footprint: &mut ClauseFootprint) {
    let mut seen = HashSet::new();
    extend_footprint_rec(term, cfg, footprint, &mut seen);
}

fn extend_footprint_rec(term: &Dynamic, cfg: &PartitionConfig, footprint: &mut ClauseFootprint, seen: &mut HashSet<SymbolId>) {
    let decl = term.decl();
    if decl.kind() == DeclKind::Uninterpreted {
        let arity = decl.arity();
        let name = decl.name();
        let (symbol, weight) = if arity == 0 {
            let sort_name = decl.range().to_string();
            (SymbolId::for_const(&name, &sort_name), cfg.var_weight)
        } else {
            let domain: Vec<String> = (0..arity).map(|i| decl.domain(i).to_string()).collect();
            let range = decl.range().to_string();
            (SymbolId::for_func(&name, &domain, &range), arity as u32 * cfg.func_weight)
        };
        if seen.insert(symbol) {
            footprint.record(symbol, weight);
        }
    }
    for child in term.children() {
        extend_footprint_rec(&child, cfg, footprint, seen);
    }
}

/// Collects the set of uninterpreted symbols (variables and function
/// declarations) reachable from `term`, without weighting — used by the
/// Shared-Symbol Registry (spec.md §4.4) rather than the partitioner.
pub fn collect_symbols(term: &Dynamic, vars: &mut HashSet<SymbolId>, funcs: &mut HashSet<SymbolId>) {
    let decl = term.decl();
    if decl.kind() == DeclKind::Uninterpreted {
        let arity = decl.arity();
        let name = decl.name();
        if arity == 0 {
            vars.insert(SymbolId::for_const(&name, &decl.range().to_string()));
        } else {
            let domain: Vec<String> = (0..arity).map(|i| decl.domain(i).to_string()).collect();
            funcs.insert(SymbolId::for_func(&name, &domain, &decl.range().to_string()));
        }
    }
    for child in term.children() {
        collect_symbols(&child, vars, funcs);
    }
}

/// Checks `formula` in a fresh solver bound to `ctx` (spec.md §4.3, the
/// Subsolver Pool's one-shot initial check).
pub fn check_once(ctx: &Context, formula: &Bool) -> SatResult {
    let solver = Solver::new(ctx);
    solver.assert(formula);
    solver.check()
}

/// Derives the closure `(sort_id, value_id)` of a concrete model value.
/// Booleans map onto the two reserved closures; everything else is
/// fingerprinted from its sort name and printed representation, which is
/// stable for any two syntactically-equal ground values (spec.md §3
/// "Closure").
pub fn closure_of_value(term: &Dynamic) -> Closure {
    if let Some(b) = term.as_bool() {
        if let Some(v) = b.as_bool() {
            return if v { Closure::TRUE } else { Closure::FALSE };
        }
    }
    let mut sort_hasher = crc32fast::Hasher::new();
    sort_hasher.update(term.sort().to_string().as_bytes());
    let sort_id = sort_hasher.finalize();

    let mut value_hasher = crc32fast::Hasher::new();
    value_hasher.update(term.to_string().as_bytes());
    let value_id = value_hasher.finalize();

    Closure::new(sort_id, value_id)
}

/// Evaluates `term` under `model`, returning its closure, or
/// [`MappingOutcome::Unmapped`] when the model has no value for it
/// (distinct from an unknown sort, per the Open Questions fix in
/// `src/closure.rs`).
pub fn eval_closure(model: &Model, term: &Dynamic) -> MappingOutcome {
    match model.eval(term, true) {
        Some(value) => MappingOutcome::Mapped(closure_of_value(&value)),
        None => MappingOutcome::Unmapped,
    }
}
