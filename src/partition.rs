//! The clause partitioner (spec.md §4.2).
//!
//! Ported from `examples/original_source/dist/dist.hpp` and
//! `dist/heur1.cpp`'s `simple_node`/`node`/`dist_clause`/`top_search`/
//! `sub_search`/`find_shortest`. The original graph used raw `node*`
//! pointers wired up by hand; Design Notes §9 calls for an arena of
//! records indexed by stable integer ids instead, so the DAG here is a
//! `Vec<Node>` with `NodeId` indices for the child/parent edges.
//!
//! One behavioral fix relative to the original: `simple_node::is_subset`
//! compared true-bit counts with strict `<`, which can never hold when the
//! argument is an intersection of `self` with something else (an
//! intersection's true-bit count is always `<=` either operand's). That
//! makes the original's "this top node could be replaced" branch
//! unreachable. This implementation uses the non-strict `<=` spec.md §4.2
//! step 2 actually describes ("the top's vector is a subset of that
//! intersection").

use std::collections::BTreeMap;

use crate::clause::ClauseFootprint;
use crate::symbol::SymbolId;

type NodeId = usize;

/// A clause's footprint reduced to a boolean membership vector over the
/// global symbol universe, plus the combined weight of its clause group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct SimpleNode {
    true_count: u32,
    bits: Vec<bool>,
}

impl SimpleNode {
    fn from_membership(universe: &[SymbolId], present: &std::collections::BTreeSet<SymbolId>) -> Self {
        let mut bits = Vec::with_capacity(universe.len());
        let mut true_count = 0u32;
        for sym in universe {
            let present = present.contains(sym);
            if present {
                true_count += 1;
            }
            bits.push(present);
        }
        Self { true_count, bits }
    }

    fn intersect(&self, other: &SimpleNode) -> SimpleNode {
        debug_assert_eq!(self.bits.len(), other.bits.len());
        let mut true_count = 0u32;
        let bits = self
            .bits
            .iter()
            .zip(other.bits.iter())
            .map(|(a, b)| {
                let v = *a && *b;
                if v {
                    true_count += 1;
                }
                v
            })
            .collect();
        SimpleNode { true_count, bits }
    }

    /// Non-strict subset test: every true bit of `self` is also true in
    /// `other`. See the module doc for why this is `<=`, not `<`.
    fn is_subset_of(&self, other: &SimpleNode) -> bool {
        if self.true_count > other.true_count {
            return false;
        }
        self.bits.iter().zip(other.bits.iter()).all(|(a, b)| !*a || *b)
    }
}

struct Node {
    simple: SimpleNode,
    clause_indices: Vec<usize>,
    weight: u32,
    clause_count: u32,
    children: Vec<NodeId>,
    parents: Vec<NodeId>,
}

impl Node {
    fn has_child(&self) -> bool {
        !self.children.is_empty()
    }

    fn has_parent(&self) -> bool {
        !self.parents.is_empty()
    }
}

/// Assignment of each clause to a bucket in `[0, n)`.
#[derive(Debug, Clone)]
pub struct Partition {
    pub dist: Vec<usize>,
}

/// Partition `footprints` into `n` buckets using the DAG-cut heuristic,
/// falling back to contiguous round-robin blocks when no valid cut covers
/// `n - 1` clause-equivalence-classes (spec.md §4.2 step 5).
pub fn partition_clauses(universe: &[SymbolId], footprints: &[ClauseFootprint], n: usize) -> Partition {
    let m = footprints.len();
    if n <= 1 || m == 0 {
        return Partition { dist: vec![0; m] };
    }

    let mut groups: BTreeMap<SimpleNode, Vec<usize>> = BTreeMap::new();
    for fp in footprints {
        let present: std::collections::BTreeSet<SymbolId> = fp.symbol_set().collect();
        let sn = SimpleNode::from_membership(universe, &present);
        groups.entry(sn).or_default().push(fp.index);
    }

    let mut arena: Vec<Node> = Vec::with_capacity(groups.len());
    let mut bottom_nodes: Vec<NodeId> = Vec::new();
    let mut frontier: Vec<NodeId> = Vec::new();

    for (simple, clause_indices) in groups {
        let weight: u32 = clause_indices.iter().map(|&i| footprints[i].weight).sum();
        let clause_count = clause_indices.len() as u32;
        let new_id = arena.len();
        arena.push(Node {
            simple,
            clause_indices,
            weight,
            clause_count,
            children: Vec::new(),
            parents: Vec::new(),
        });

        let mut i = 0;
        while i < frontier.len() {
            let top_id = frontier[i];
            if top_search(&mut arena, new_id, top_id) {
                frontier.remove(i);
            } else {
                i += 1;
            }
        }

        if !arena[new_id].has_child() {
            bottom_nodes.push(new_id);
        }
        if !arena[new_id].has_parent() {
            frontier.push(new_id);
        }
    }

    let n_minus_1 = (n - 1) as u32;
    let mut search = ShortestCutSearch {
        arena: &arena,
        n_minus_1,
        best: None,
    };
    for &bottom in &bottom_nodes {
        search.find_shortest(bottom, Vec::new(), 0, 0);
    }

    let mut dist = vec![0usize; m];
    if let Some((_, _, path)) = search.best {
        for (bucket_offset, node_id) in path.into_iter().enumerate() {
            let bucket = bucket_offset + 1;
            for &clause_idx in &arena[node_id].clause_indices {
                dist[clause_idx] = bucket;
            }
        }
        return Partition { dist };
    }

    // Fallback: contiguous round-robin blocks, sizes ceil(M/N) then floor(M/N).
    let q = m / n;
    let r = m % n;
    let mut idx = 0usize;
    for bucket in 0..n {
        let take = if bucket < r { q + 1 } else { q };
        for _ in 0..take {
            if idx >= m {
                break;
            }
            dist[idx] = bucket;
            idx += 1;
        }
    }
    Partition { dist }
}

/// Attempts to adopt `top_id` as a child of `new_id`, recursing into
/// `top_id`'s children otherwise. Mirrors `top_search`/`sub_search` in
/// `heur1.cpp`; returns `true` iff `top_id` was adopted directly (the
/// caller then evicts it from the frontier list).
fn top_search(arena: &mut Vec<Node>, new_id: NodeId, top_id: NodeId) -> bool {
    let insc = arena[new_id].simple.intersect(&arena[top_id].simple);
    if insc.true_count == 0 {
        return false;
    }
    if arena[top_id].simple.is_subset_of(&insc) {
        arena[new_id].children.push(top_id);
        arena[top_id].parents.push(new_id);
        return true;
    }
    let children = arena[top_id].children.clone();
    for child_id in children {
        sub_search(arena, &insc, new_id, child_id);
    }
    false
}

fn sub_search(arena: &mut Vec<Node>, insc: &SimpleNode, new_id: NodeId, sub_id: NodeId) {
    if arena[sub_id].simple.is_subset_of(insc) {
        arena[new_id].children.push(sub_id);
        arena[sub_id].parents.push(new_id);
        return;
    }
    let children = arena[sub_id].children.clone();
    for child_id in children {
        sub_search(arena, insc, new_id, child_id);
    }
}

/// Tracks the globally minimal-weight path across repeated
/// `find_shortest` calls from each bottom node, tie-broken lexicographically
/// on `(weight, path length, bottom-node id)` per spec.md §4.2.
struct ShortestCutSearch<'a> {
    arena: &'a [Node],
    n_minus_1: u32,
    best: Option<(u32, usize, Vec<NodeId>)>,
}

impl<'a> ShortestCutSearch<'a> {
    fn find_shortest(&mut self, node_id: NodeId, mut path: Vec<NodeId>, cur_weight: u32, cur_count: u32) {
        let node = &self.arena[node_id];
        let new_count = cur_count + node.clause_count;
        let new_weight = cur_weight + node.weight;
        path.push(node_id);

        if new_count >= self.n_minus_1 {
            let candidate = (new_weight, path.len(), path.clone());
            let better = match &self.best {
                None => true,
                Some((w, l, p)) => {
                    (new_weight, path.len(), path[0]) < (*w, *l, p[0])
                }
            };
            if better {
                self.best = Some(candidate);
            }
            return;
        }

        for &parent_id in &node.parents {
            self.find_shortest(parent_id, path.clone(), new_weight, new_count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(index: usize, syms: &[(SymbolId, u32)]) -> ClauseFootprint {
        let mut f = ClauseFootprint::new(index);
        for &(s, w) in syms {
            f.record(s, w);
        }
        f
    }

    #[test]
    fn falls_back_to_round_robin_when_no_shared_structure() {
        let a = SymbolId::for_const("a", "Int");
        let b = SymbolId::for_const("b", "Int");
        let universe = vec![a, b];
        let footprints = vec![fp(0, &[(a, 1)]), fp(1, &[(b, 1)])];
        let part = partition_clauses(&universe, &footprints, 2);
        assert_eq!(part.dist.len(), 2);
        assert!(part.dist.iter().all(|&b| b < 2));
    }

    #[test]
    fn every_clause_assigned_to_a_bucket_in_range() {
        let a = SymbolId::for_const("a", "Int");
        let b = SymbolId::for_const("b", "Int");
        let c = SymbolId::for_const("c", "Int");
        let universe = vec![a, b, c];
        let footprints = vec![
            fp(0, &[(a, 1), (b, 1)]),
            fp(1, &[(b, 1), (c, 1)]),
            fp(2, &[(a, 1)]),
            fp(3, &[(c, 1)]),
        ];
        let part = partition_clauses(&universe, &footprints, 3);
        assert_eq!(part.dist.len(), 4);
        assert!(part.dist.iter().all(|&bucket| bucket < 3));
    }

    #[test]
    fn n_equals_one_puts_everything_in_bucket_zero() {
        let a = SymbolId::for_const("a", "Int");
        let universe = vec![a];
        let footprints = vec![fp(0, &[(a, 1)]), fp(1, &[(a, 1)])];
        let part = partition_clauses(&universe, &footprints, 1);
        assert_eq!(part.dist, vec![0, 0]);
    }
}
