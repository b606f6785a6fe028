//! The Reconciliation Loop (spec.md §4.4-§4.8): builds the Shared-Symbol
//! Registry and per-bucket subproblems from a partitioned, parsed input and
//! drives the barrier-synchronized round loop to a verdict.

pub mod master;
pub mod session;
pub mod worker;

use std::collections::HashSet;
use std::path::Path;
use std::sync::Barrier;

use parking_lot::Mutex;
use tracing::{debug, info};
use z3::ast::{Ast, Dynamic};
use z3::SatResult;

use crate::bucket::Bucket;
use crate::clause::ClauseFootprint;
use crate::config::Config;
use crate::error::{PsmtError, PsmtResult};
use crate::partition::{partition_clauses, Partition};
use crate::reasoner::adapter::{collect_symbols, extend_footprint, parse_file, to_cnf_clauses};
use crate::reasoner::ContextPool;
use crate::registry::Registry;
use crate::symbol::SymbolId;
use crate::verdict::Verdict;

/// The decomposition phase (spec.md §5): parses, stride-N footprints, and
/// partitions `path` across `pool.worker_count()` decomposition workers,
/// synchronized by the three barriers spec.md §5 names ("after thread
/// creation, after per-clause footprinting, after partitioning").
///
/// Every worker parses the same input independently into its own context
/// (spec.md §4.1), so later each bucket can pick straight from its own
/// locally-parsed clause list with no cross-context term translation beyond
/// the registry's shared symbols. Only worker 0 runs the partitioner; the
/// others wait at `barrier_partitioned` for its result.
fn decompose<'p>(
    pool: &'p ContextPool,
    path: &Path,
    config: &Config,
) -> PsmtResult<(Vec<Vec<z3::ast::Bool<'p>>>, Partition)> {
    let n = pool.worker_count();

    let barrier_created = Barrier::new(n);
    let barrier_footprinted = Barrier::new(n);
    let barrier_partitioned = Barrier::new(n);
    let footprints: Mutex<Option<Vec<ClauseFootprint>>> = Mutex::new(None);
    let partition: Mutex<Option<Partition>> = Mutex::new(None);
    let error: Mutex<Option<String>> = Mutex::new(None);

    let results: Vec<PsmtResult<Vec<z3::ast::Bool<'p>>>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..n)
            .map(|rank| {
                let barrier_created = &barrier_created;
                let barrier_footprinted = &barrier_footprinted;
                let barrier_partitioned = &barrier_partitioned;
                let footprints = &footprints;
                let partition = &partition;
                let error = &error;
                scope.spawn(move || -> PsmtResult<Vec<z3::ast::Bool<'p>>> {
                    // Barrier 1: every decomposition worker exists before
                    // any of them touches the input file.
                    barrier_created.wait();

                    let ctx = pool.worker(rank);
                    let parse_result: PsmtResult<Vec<z3::ast::Bool<'p>>> = (|| {
                        let formula = parse_file(ctx, path)?;
                        to_cnf_clauses(ctx, &formula)
                    })();

                    let clauses = match &parse_result {
                        Ok(c) => c.clone(),
                        Err(e) => {
                            let mut guard = error.lock();
                            if guard.is_none() {
                                *guard = Some(e.to_string());
                            }
                            Vec::new()
                        }
                    };

                    // Stride-N footprinting: worker `rank` handles clause
                    // indices `rank, rank+n, 2*rank+n, ...` (spec.md §5).
                    let count = clauses.len();
                    {
                        let mut guard = footprints.lock();
                        if guard.is_none() {
                            *guard = Some((0..count).map(ClauseFootprint::new).collect());
                        }
                    }
                    for idx in (rank..count).step_by(n) {
                        let dyn_clause = Dynamic::from_ast(&clauses[idx]);
                        let mut fp = ClauseFootprint::new(idx);
                        extend_footprint(&dyn_clause, &config.partition, &mut fp);
                        if let Some(v) = footprints.lock().as_mut() {
                            v[idx] = fp;
                        }
                    }

                    // Barrier 2: every clause has a footprint before
                    // partitioning begins.
                    barrier_footprinted.wait();

                    // Only the designated master worker (rank 0) runs the
                    // partitioner; the others wait at barrier 3.
                    if rank == 0 {
                        let computed = if error.lock().is_some() {
                            Partition { dist: vec![0; count] }
                        } else {
                            let fps = footprints.lock().clone().unwrap_or_default();
                            let mut universe: HashSet<SymbolId> = HashSet::new();
                            for fp in &fps {
                                universe.extend(fp.symbol_set());
                            }
                            let universe: Vec<SymbolId> = universe.into_iter().collect();
                            partition_clauses(&universe, &fps, n)
                        };
                        *partition.lock() = Some(computed);
                    }

                    // Barrier 3: the partition is published before any
                    // worker proceeds to build its bucket.
                    barrier_partitioned.wait();

                    match parse_result {
                        Err(e) => Err(e),
                        Ok(_) if error.lock().is_some() => {
                            let msg = error.lock().clone().unwrap_or_default();
                            Err(PsmtError::InternalInvariant(format!("decomposition aborted: {msg}")))
                        }
                        Ok(_) => Ok(clauses),
                    }
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("decomposition worker panicked"))
            .collect()
    });

    let partition = partition
        .into_inner()
        .expect("rank 0 always computes a partition before the final barrier");
    let mut clauses_by_rank = Vec::with_capacity(n);
    for r in results {
        clauses_by_rank.push(r?);
    }
    Ok((clauses_by_rank, partition))
}

/// Parses, partitions, checks, and (if neither short-circuit applies)
/// reconciles `path` across `pool.worker_count()` buckets, returning the
/// final verdict.
pub fn solve(pool: &ContextPool, path: &Path, config: &Config) -> PsmtResult<Verdict> {
    let n = pool.worker_count();

    let (clauses_by_rank, partition) = decompose(pool, path, config)?;
    let clause_count = clauses_by_rank[0].len();
    info!(clauses = clause_count, buckets = n, "partitioned clauses");

    let mut buckets: Vec<Bucket> = Vec::with_capacity(n);
    for rank in 0..n {
        let ctx = pool.worker(rank);
        let assigned: Vec<&z3::ast::Bool> = clauses_by_rank[rank]
            .iter()
            .enumerate()
            .filter(|(i, _)| partition.dist[*i] == rank)
            .map(|(_, c)| c)
            .collect();
        let conjunction = if assigned.is_empty() {
            z3::ast::Bool::from_bool(ctx, true)
        } else {
            z3::ast::Bool::and(ctx, &assigned)
        };
        let mut vars = HashSet::new();
        let mut funcs = HashSet::new();
        collect_symbols(&Dynamic::from_ast(&conjunction), &mut vars, &mut funcs);
        buckets.push(Bucket::new(rank, ctx, conjunction, vars, funcs));
    }

    for bucket in &mut buckets {
        if bucket.initial_check() == SatResult::Unsat {
            debug!(bucket = bucket.index, "bucket locally unsat, skipping reconciliation");
            return Ok(Verdict::Unsat);
        }
    }

    let conjunctions: Vec<Dynamic> = buckets.iter().map(|b| Dynamic::from_ast(&b.conjunction)).collect();
    let registry = Registry::build(&conjunctions, pool.shared());

    if registry.fully_decoupled() {
        info!("no shared variables; buckets are fully decoupled");
        return Ok(Verdict::Sat);
    }

    for bucket in &mut buckets {
        bucket.var_expr = registry.var_expr[bucket.index].clone();
        bucket.fun_expr = registry.fun_expr[bucket.index].clone();
    }

    // `n == 1` never reaches here: with a single bucket no variable can
    // appear in more than one, so `fully_decoupled` above always catches
    // it. `check_once` remains in the adapter for the Subsolver Pool's
    // unconditional single-shot checks.
    let session = session::SolveSession::new(pool.shared(), registry, config.clone(), buckets)?;
    session.run()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_fixture(contents: &str) -> tempfile::NamedTempFile {
        use std::io::Write;
        let mut f = tempfile::Builder::new().suffix(".smt2").tempfile().unwrap();
        write!(f, "{contents}").unwrap();
        f
    }

    #[test]
    fn n_equals_one_short_circuits_to_direct_solve() {
        let f = write_fixture("(declare-const x Int) (assert (> x 0)) (assert (< x 0))");
        let pool = ContextPool::new(1);
        let config = Config::default();
        let verdict = solve(&pool, f.path(), &config).unwrap();
        assert_eq!(verdict, Verdict::Unsat);
    }

    #[test]
    fn no_shared_variables_short_circuits_to_sat() {
        let f = write_fixture("(declare-const x Int) (declare-const y Int) (assert (= x 1)) (assert (= y 2))");
        let pool = ContextPool::new(2);
        let config = Config::default();
        let verdict = solve(&pool, f.path(), &config).unwrap();
        assert_eq!(verdict, Verdict::Sat);
    }

    #[test]
    fn missing_input_file_is_input_missing_error() {
        let pool = ContextPool::new(1);
        let config = Config::default();
        let err = solve(&pool, std::path::Path::new("/nonexistent/path.smt2"), &config).unwrap_err();
        assert!(matches!(err, PsmtError::InputMissing(_)));
    }
}
