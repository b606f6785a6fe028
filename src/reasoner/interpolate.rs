//! Craig interpolation.
//!
//! The original core's *active*, executed interpolation call is
//! `Z3_interpolate_proof` (examples/original_source/core.cpp:1500), taking
//! the UNSAT proof object plus the two original constraint ASTs directly:
//!
//! ```c++
//! expr proof = solve.proof();
//! array<Z3_ast> _sts(2);
//! _sts[0] = expr_list.at(my_rank);
//! _sts[1] = constr_expr;
//! Z3_ast _interp;
//! Z3_interpolate_proof(my_ctx, proof, 2, _sts.ptr(), 0, 0, &_interp, 0, 0);
//! ```
//!
//! (`Z3_mk_interpolant`/`Z3_compute_interpolant`, by contrast, only appear
//! inside the dead `#if 0`-wrapped `PZ3_interpolate` helper at
//! core.cpp:1614-1627, which is never called.) This predates and was never
//! folded into the `z3`/`z3-sys` crates' safe surface, so this module links
//! `Z3_interpolate_proof` directly against the linked `libz3` (via
//! `z3-sys`'s FFI types), exactly as the original build depended on an
//! interpolation-enabled Z3. This is a deliberate, minimal escape hatch, not
//! a new dependency: it assumes the linked Z3 exports
//! `Z3_interpolate_proof`, which is true of Z3 builds configured with
//! `--interpolation` (the same precondition the original C++ core carried).

use z3::ast::{Ast, Bool};
use z3::{Context, SatResult, Solver};
use z3_sys::{Z3_ast, Z3_context, Z3_params};

use crate::error::{PsmtError, PsmtResult};

extern "C" {
    /// `num` constraints in `cnsts` form a refutation chain; `parents`
    /// (nullable) describes a tree rather than a chain when non-null;
    /// `options` (nullable) carries interpolation-specific parameters. Writes
    /// `num - 1` interpolants into caller-allocated `interps`. `num_theory`/
    /// `theory` (nullable when 0) list extra background theory axioms.
    fn Z3_interpolate_proof(
        ctx: Z3_context,
        proof: Z3_ast,
        num: u32,
        cnsts: *const Z3_ast,
        parents: *const u32,
        options: Z3_params,
        interps: *mut Z3_ast,
        num_theory: u32,
        theory: *const Z3_ast,
    );
}

/// Computes a reverse interpolant `I` for `(a, b)`: `a => I`, `I ∧ b` is
/// UNSAT, and `I` mentions only symbols shared between `a` and `b`
/// (spec.md §3 "Per-bucket interpolant", GLOSSARY "Interpolant").
///
/// Callers must already know `a ∧ b` is UNSAT in `ctx` (the worker round
/// only calls this after its local `solve.check` reports UNSAT).
pub fn interpolate<'ctx>(ctx: &'ctx Context, a: &Bool<'ctx>, b: &Bool<'ctx>) -> PsmtResult<Bool<'ctx>> {
    let solver = Solver::new(ctx);
    solver.assert(a);
    solver.assert(b);
    match solver.check() {
        SatResult::Unsat => {}
        _ => {
            return Err(PsmtError::InternalInvariant(
                "interpolate called without a local UNSAT proof".to_string(),
            ))
        }
    }
    let proof = solver
        .get_proof()
        .ok_or_else(|| PsmtError::InternalInvariant("solver produced no proof for UNSAT result".to_string()))?;

    let mut interp: Z3_ast = std::ptr::null_mut();
    unsafe {
        let raw_ctx = ctx.get_z3_context();
        let cnsts = [a.get_z3_ast(), b.get_z3_ast()];
        Z3_interpolate_proof(
            raw_ctx,
            proof.get_z3_ast(),
            2,
            cnsts.as_ptr(),
            std::ptr::null(),
            std::ptr::null_mut(),
            &mut interp,
            0,
            std::ptr::null(),
        );
        if interp.is_null() {
            return Err(PsmtError::InternalInvariant(
                "Z3_interpolate_proof produced no interpolant".to_string(),
            ));
        }
        Ok(Bool::wrap(ctx, interp))
    }
}
