//! Per-bucket subproblem state and state machine (spec.md §3 "Bucket",
//! §4.8).

use std::collections::{HashMap, HashSet};

use z3::ast::{Ast, Bool};
use z3::{Context, Model, SatResult, Solver};

use crate::closure::Closure;
use crate::symbol::SymbolId;

/// `UNCHECKED → LOCAL_SAT_OR_UNKNOWN → (round: LOCAL_SAT | LOCAL_UNSAT)*`
/// (spec.md §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketState {
    Unchecked,
    LocalSatOrUnknown,
    LocalSat,
    LocalUnsat,
}

/// What a worker writes for its bucket at the end of a reconciliation
/// round (spec.md §4.6 outputs: `checklist`, `interpo_list` or
/// `model_list` + `table_list`).
pub enum RoundOutput<'ctx> {
    Unsat { interpolant: Bool<'ctx> },
    Sat { model: Model<'ctx>, table: HashMap<Closure, Closure> },
}

/// One subproblem: its own reasoner context, its assigned conjunction of
/// clauses, the symbols it mentions, and the latest round's output.
///
/// Owns its context, formula, model, and translation table exclusively
/// (spec.md §3 "Ownership"); `var_expr`/`fun_expr` are written once by the
/// registry during decomposition and read-only afterward.
pub struct Bucket<'ctx> {
    pub index: usize,
    pub ctx: &'ctx Context,
    pub conjunction: Bool<'ctx>,
    pub solver: Solver<'ctx>,
    pub vars: HashSet<SymbolId>,
    pub funcs: HashSet<SymbolId>,
    pub var_expr: HashMap<SymbolId, z3::ast::Dynamic<'ctx>>,
    pub fun_expr: HashMap<SymbolId, z3::FuncDecl<'ctx>>,
    pub state: BucketState,
    pub last_round: Option<RoundOutput<'ctx>>,
}

impl<'ctx> Bucket<'ctx> {
    pub fn new(
        index: usize,
        ctx: &'ctx Context,
        conjunction: Bool<'ctx>,
        vars: HashSet<SymbolId>,
        funcs: HashSet<SymbolId>,
    ) -> Self {
        let solver = Solver::new(ctx);
        solver.assert(&conjunction);
        Self {
            index,
            ctx,
            conjunction,
            solver,
            vars,
            funcs,
            var_expr: HashMap::new(),
            fun_expr: HashMap::new(),
            state: BucketState::Unchecked,
            last_round: None,
        }
    }

    /// The Subsolver Pool's one-shot initial check (spec.md §4.3). Returns
    /// `true` iff the bucket is locally UNSAT, in which case the whole
    /// input is UNSAT and reconciliation never starts.
    pub fn initial_check(&mut self) -> SatResult {
        let result = self.solver.check();
        self.state = match result {
            SatResult::Unsat => BucketState::LocalUnsat,
            _ => BucketState::LocalSatOrUnknown,
        };
        result
    }

    /// Checks `expr_list ∧ c_r` for the current round using a push/pop
    /// scope so the persistent solver's base assertions are untouched for
    /// the next round (ported from the push/pop pattern in
    /// `logicaffeine_verify/src/solver.rs`). The model, when SAT, is
    /// extracted before popping since it is only valid while `c_r` is
    /// still asserted.
    pub fn check_round(&mut self, c_r: &Bool<'ctx>) -> (SatResult, Option<Model<'ctx>>) {
        self.solver.push();
        self.solver.assert(c_r);
        let result = self.solver.check();
        let model = if result == SatResult::Sat {
            self.solver.get_model()
        } else {
            None
        };
        self.solver.pop(1);
        self.state = match result {
            SatResult::Unsat => BucketState::LocalUnsat,
            SatResult::Sat => BucketState::LocalSat,
            SatResult::Unknown => BucketState::LocalSatOrUnknown,
        };
        (result, model)
    }
}
