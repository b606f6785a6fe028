//! The Shared-Symbol Registry (spec.md §4.4): identifies which variables
//! and function symbols cross bucket boundaries, and builds the per-bucket
//! projections the reconciliation loop reads every round.

use std::collections::{BTreeSet, HashMap, HashSet};

use z3::ast::{Ast, Dynamic};
use z3::{Context, DeclKind, FuncDecl};

use crate::reasoner::adapter::collect_symbols;
use crate::symbol::SymbolId;

/// Per-bucket and shared-context projections of the symbols that occur in
/// more than one bucket.
pub struct Registry<'ctx> {
    pub vars_by_bucket: Vec<HashSet<SymbolId>>,
    pub funcs_by_bucket: Vec<HashSet<SymbolId>>,
    pub shared_vars: BTreeSet<SymbolId>,
    pub shared_funcs: BTreeSet<SymbolId>,
    /// `var_expr[bucket]`: shared variable id -> term in that bucket's context.
    pub var_expr: Vec<HashMap<SymbolId, Dynamic<'ctx>>>,
    /// `fun_expr[bucket]`: shared function id -> declaration in that bucket's context.
    pub fun_expr: Vec<HashMap<SymbolId, FuncDecl<'ctx>>>,
    /// Shared variable id -> term translated into the shared context.
    pub shared_var_term: HashMap<SymbolId, Dynamic<'ctx>>,
    /// Shared function id -> declaration translated into the shared context.
    pub shared_func_decl: HashMap<SymbolId, FuncDecl<'ctx>>,
    /// True when there are shared variables but no shared functions: only
    /// equalities/disequalities are exchanged, function-instance harvesting
    /// is skipped (spec.md §4.6/§4.7).
    pub pure_literal: bool,
}

impl<'ctx> Registry<'ctx> {
    /// `conjunctions[i]` must be bucket `i`'s own conjunction, living in
    /// `bucket_contexts[i]`. `shared_ctx` is the master's shared context,
    /// into which one representative term/declaration per shared symbol is
    /// translated.
    pub fn build(conjunctions: &[Dynamic<'ctx>], shared_ctx: &'ctx Context) -> Self {
        let n = conjunctions.len();
        let mut vars_by_bucket: Vec<HashSet<SymbolId>> = Vec::with_capacity(n);
        let mut funcs_by_bucket: Vec<HashSet<SymbolId>> = Vec::with_capacity(n);
        for conjunction in conjunctions {
            let mut vars = HashSet::new();
            let mut funcs = HashSet::new();
            collect_symbols(conjunction, &mut vars, &mut funcs);
            vars_by_bucket.push(vars);
            funcs_by_bucket.push(funcs);
        }

        let shared_vars = symbols_in_multiple(&vars_by_bucket);
        let shared_funcs = symbols_in_multiple(&funcs_by_bucket);
        let pure_literal = !shared_vars.is_empty() && shared_funcs.is_empty();

        let mut var_expr: Vec<HashMap<SymbolId, Dynamic<'ctx>>> = Vec::with_capacity(n);
        let mut fun_expr: Vec<HashMap<SymbolId, FuncDecl<'ctx>>> = Vec::with_capacity(n);
        for (i, conjunction) in conjunctions.iter().enumerate() {
            let mut remaining_vars: HashSet<SymbolId> = shared_vars
                .iter()
                .filter(|s| vars_by_bucket[i].contains(s))
                .copied()
                .collect();
            let mut remaining_funcs: HashSet<SymbolId> = shared_funcs
                .iter()
                .filter(|s| funcs_by_bucket[i].contains(s))
                .copied()
                .collect();
            let mut ve = HashMap::new();
            let mut fe = HashMap::new();
            locate(conjunction, &mut remaining_vars, &mut remaining_funcs, &mut ve, &mut fe);
            var_expr.push(ve);
            fun_expr.push(fe);
        }

        let mut shared_var_term = HashMap::new();
        for &sym in &shared_vars {
            if let Some((_, term)) = var_expr.iter().enumerate().find_map(|(i, ve)| ve.get(&sym).map(|t| (i, t))) {
                shared_var_term.insert(sym, term.translate(shared_ctx));
            }
        }
        let mut shared_func_decl = HashMap::new();
        for &sym in &shared_funcs {
            if let Some((_, decl)) = fun_expr.iter().enumerate().find_map(|(i, fe)| fe.get(&sym).map(|d| (i, d))) {
                shared_func_decl.insert(sym, decl.translate(shared_ctx));
            }
        }

        Self {
            vars_by_bucket,
            funcs_by_bucket,
            shared_vars,
            shared_funcs,
            var_expr,
            fun_expr,
            shared_var_term,
            shared_func_decl,
            pure_literal,
        }
    }

    /// No shared variables at all ⇒ the buckets are completely decoupled
    /// and the overall verdict is SAT without entering reconciliation
    /// (spec.md §4.4 short-circuit, §8 boundary behavior).
    pub fn fully_decoupled(&self) -> bool {
        self.shared_vars.is_empty()
    }
}

fn symbols_in_multiple(by_bucket: &[HashSet<SymbolId>]) -> BTreeSet<SymbolId> {
    let mut counts: HashMap<SymbolId, u32> = HashMap::new();
    for set in by_bucket {
        for &sym in set {
            *counts.entry(sym).or_insert(0) += 1;
        }
    }
    counts.into_iter().filter(|&(_, c)| c > 1).map(|(s, _)| s).collect()
}

/// Recursively walks `term` looking for a representative term/declaration
/// for each symbol still in `remaining_vars`/`remaining_funcs`, stopping
/// early once both sets are empty (spec.md §4.4: "stopping early when every
/// shared symbol has been located").
fn locate<'ctx>(
    term: &Dynamic<'ctx>,
    remaining_vars: &mut HashSet<SymbolId>,
    remaining_funcs: &mut HashSet<SymbolId>,
    var_expr: &mut HashMap<SymbolId, Dynamic<'ctx>>,
    fun_expr: &mut HashMap<SymbolId, FuncDecl<'ctx>>,
) {
    if remaining_vars.is_empty() && remaining_funcs.is_empty() {
        return;
    }
    let decl = term.decl();
    if decl.kind() == DeclKind::Uninterpreted {
        let arity = decl.arity();
        if arity == 0 {
            let sym = SymbolId::for_const(&decl.name(), &decl.range().to_string());
            if remaining_vars.remove(&sym) {
                var_expr.insert(sym, term.clone());
            }
        } else {
            let domain: Vec<String> = (0..arity).map(|i| decl.domain(i).to_string()).collect();
            let sym = SymbolId::for_func(&decl.name(), &domain, &decl.range().to_string());
            if remaining_funcs.remove(&sym) {
                fun_expr.insert(sym, decl.clone());
            }
        }
    }
    for child in term.children() {
        if remaining_vars.is_empty() && remaining_funcs.is_empty() {
            break;
        }
        locate(&child, remaining_vars, remaining_funcs, var_expr, fun_expr);
    }
}
