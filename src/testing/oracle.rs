//! Brute-force oracles for small graphs.
//!
//! Two independent slow computations back the fast algorithm: exhaustive
//! enumeration of simple undirected cycles (the definition of cycle
//! equivalence) and iterative-set dominators on the edge-split graph (the
//! definition of canonical SESE pairs).

use crate::pst::Pst;
use crate::types::EdgeKind;
use fixedbitset::FixedBitSet;
use hashbrown::{HashMap, HashSet};
use petgraph::visit::EdgeRef;

/// All simple cycles of the undirected view of the augmented graph, each a
/// sorted list of arc ids. Parallel arcs are distinct, so two opposite
/// edges between the same nodes form a two-arc cycle; a self-loop is a
/// one-arc cycle.
pub fn enumerate_cycles(pst: &Pst) -> Vec<Vec<usize>> {
    let node_count = pst.graph.node_count();
    let mut adj: Vec<Vec<(usize, usize)>> = vec![Vec::new(); node_count];
    let mut cycles: HashSet<Vec<usize>> = HashSet::new();

    for edge in pst.graph.edge_references() {
        let id = edge.id().index();
        let (a, b) = (edge.source().index(), edge.target().index());
        if a == b {
            cycles.insert(vec![id]);
            continue;
        }
        adj[a].push((id, b));
        adj[b].push((id, a));
    }

    for start in 0..node_count {
        let mut stack: Vec<(usize, usize, Vec<usize>, Vec<usize>)> =
            vec![(start, usize::MAX, vec![start], Vec::new())];
        while let Some((node, via, path_nodes, path_arcs)) = stack.pop() {
            for &(arc, next) in &adj[node] {
                if arc == via {
                    continue;
                }
                if next == start {
                    let mut cycle = path_arcs.clone();
                    cycle.push(arc);
                    cycle.sort_unstable();
                    cycles.insert(cycle);
                    continue;
                }
                if next < start || path_nodes.contains(&next) {
                    continue;
                }
                let mut nodes = path_nodes.clone();
                nodes.push(next);
                let mut arcs = path_arcs.clone();
                arcs.push(arc);
                stack.push((next, arc, nodes, arcs));
            }
        }
    }

    cycles.into_iter().collect()
}

/// Per-arc sorted list of the cycles (indices into `cycles`) containing it.
pub fn cycle_sets(pst: &Pst, cycles: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let mut sets = vec![Vec::new(); pst.graph.edge_count()];
    for (idx, cycle) in cycles.iter().enumerate() {
        for &arc in cycle {
            sets[arc].push(idx);
        }
    }
    sets
}

/// Checks that two arcs share a class exactly when they lie on the same
/// nonempty set of simple cycles, and that cycle-free arcs sit alone in
/// their class.
pub fn assert_classes_match_cycles(pst: &Pst) {
    let cycles = enumerate_cycles(pst);
    let sets = cycle_sets(pst, &cycles);
    let classified: Vec<usize> = (0..pst.graph.edge_count())
        .filter(|&arc| pst.arc_class[arc].is_some())
        .collect();

    for &a in &classified {
        for &b in &classified {
            if a >= b {
                continue;
            }
            let same_class = pst.arc_class[a] == pst.arc_class[b];
            let same_cycles = !sets[a].is_empty() && sets[a] == sets[b];
            assert_eq!(
                same_class, same_cycles,
                "arcs {} and {}: classes {:?}/{:?} but cycle sets {:?}/{:?}",
                a, b, pst.arc_class[a], pst.arc_class[b], sets[a], sets[b]
            );
        }
    }
}

/// Iterative-set dominators: `dom[v]` holds every node on all paths from
/// `start` to `v`. Quadratic and proud of it.
fn dominators(total: usize, start: usize, preds: &[Vec<usize>]) -> Vec<FixedBitSet> {
    let mut full = FixedBitSet::with_capacity(total);
    full.insert_range(..);
    let mut dom = vec![full; total];
    dom[start].clear();
    dom[start].insert(start);

    let mut changed = true;
    while changed {
        changed = false;
        for v in 0..total {
            if v == start {
                continue;
            }
            let mut next = if preds[v].is_empty() {
                FixedBitSet::with_capacity(total)
            } else {
                let mut inter = dom[preds[v][0]].clone();
                for &p in &preds[v][1..] {
                    inter.intersect_with(&dom[p]);
                }
                inter
            };
            next.insert(v);
            if next != dom[v] {
                dom[v] = next;
                changed = true;
            }
        }
    }
    dom
}

/// Canonical SESE boundary pairs `(entry arc, exit arc)`, computed the slow
/// way: equal nonempty cycle sets, entry dominating exit, exit
/// postdominating entry (both on the edge-split graph), then reduction to
/// consecutive pairs.
pub fn naive_region_pairs(pst: &Pst) -> HashSet<(usize, usize)> {
    let cycles = enumerate_cycles(pst);
    let sets = cycle_sets(pst, &cycles);

    // edge-split graph: every non-back arc becomes a node of its own
    let node_count = pst.graph.node_count();
    let mut arc_node: HashMap<usize, usize> = HashMap::new();
    let mut arcs: Vec<usize> = Vec::new();
    for edge in pst.graph.edge_references() {
        if *edge.weight() == EdgeKind::Back {
            continue;
        }
        arc_node.insert(edge.id().index(), node_count + arcs.len());
        arcs.push(edge.id().index());
    }

    let total = node_count + arcs.len();
    let mut preds: Vec<Vec<usize>> = vec![Vec::new(); total];
    let mut succs: Vec<Vec<usize>> = vec![Vec::new(); total];
    for edge in pst.graph.edge_references() {
        if *edge.weight() == EdgeKind::Back {
            continue;
        }
        let split = arc_node[&edge.id().index()];
        let (u, v) = (edge.source().index(), edge.target().index());
        succs[u].push(split);
        preds[split].push(u);
        succs[split].push(v);
        preds[v].push(split);
    }

    let dom = dominators(total, pst.entry.index(), &preds);
    let postdom = dominators(total, pst.exit.index(), &succs);

    // The iterative sets degenerate to "everything" on nodes with no path
    // from the start, so arcs in components the entry cannot reach must be
    // excluded outright (they bound no region).
    let mut reachable = FixedBitSet::with_capacity(total);
    let mut queue = vec![pst.entry.index()];
    reachable.insert(pst.entry.index());
    while let Some(v) = queue.pop() {
        for &s in &succs[v] {
            if !reachable.contains(s) {
                reachable.insert(s);
                queue.push(s);
            }
        }
    }
    let arcs: Vec<usize> = arcs
        .into_iter()
        .filter(|a| reachable.contains(arc_node[a]))
        .collect();

    let mut sese: Vec<(usize, usize)> = Vec::new();
    for &a in &arcs {
        for &b in &arcs {
            if a == b || sets[a].is_empty() || sets[a] != sets[b] {
                continue;
            }
            if !dom[arc_node[&b]].contains(arc_node[&a]) {
                continue;
            }
            if !postdom[arc_node[&a]].contains(arc_node[&b]) {
                continue;
            }
            sese.push((a, b));
        }
    }

    let mut by_entry: HashMap<usize, Vec<usize>> = HashMap::new();
    let mut by_exit: HashMap<usize, Vec<usize>> = HashMap::new();
    for &(a, b) in &sese {
        by_entry.entry(a).or_default().push(b);
        by_exit.entry(b).or_default().push(a);
    }

    // canonical exit of `a`: the one dominating every other exit of `a`;
    // symmetrically the canonical entry postdominates every other entry
    let mut canonical = HashSet::new();
    for (&a, exits) in &by_entry {
        for &b in exits {
            if exits
                .iter()
                .all(|&x| dom[arc_node[&x]].contains(arc_node[&b]))
            {
                canonical.insert((a, b));
            }
        }
    }

    let mut pairs = HashSet::new();
    for (&b, entries) in &by_exit {
        for &a in entries {
            if entries
                .iter()
                .all(|&x| postdom[arc_node[&x]].contains(arc_node[&a]))
                && canonical.contains(&(a, b))
            {
                pairs.insert((a, b));
            }
        }
    }
    pairs
}

/// Boundary pairs of every non-root region the fast algorithm produced.
pub fn region_pairs(pst: &Pst) -> HashSet<(usize, usize)> {
    pst.regions
        .iter()
        .filter_map(|r| match (r.entry_edge, r.exit_edge) {
            (Some(entry), Some(exit)) => Some((entry.index(), exit.index())),
            _ => None,
        })
        .collect()
}
