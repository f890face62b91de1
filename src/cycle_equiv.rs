//! Cycle-equivalence classes of arcs, the heart of the construction.
//!
//! One undirected depth-first search over the augmented graph splits the
//! arcs into tree arcs and backedges. A postorder sweep then maintains, per
//! node, the bracket list of backedges spanning it; two arcs bound the same
//! region exactly when they observe the same bracket list, which the sweep
//! detects in constant time through the (top bracket, list size) pair.
//!
//! Reference: <https://dl.acm.org/doi/10.1145/173262.155862>

use crate::bracket_list::{BracketArena, BracketList};
use crate::undirected::UndirectedView;
use fixedbitset::FixedBitSet;
use log::{debug, trace};

const UNSET: usize = usize::MAX;

/// Everything the undirected depth-first search records.
#[derive(Debug)]
pub(crate) struct DfsTree {
    /// Discovery index per node; `usize::MAX` when never reached.
    pub dfsnum: Vec<usize>,
    /// Largest discovery index inside the node's subtree.
    pub leave: Vec<usize>,
    /// Tree arc by which a node was first reached; `usize::MAX` at the root.
    pub parent_arc: Vec<usize>,
    /// Nodes in discovery order.
    pub node_by_num: Vec<usize>,
    children: Vec<Vec<usize>>,
    /// Backedges whose descendant endpoint is this node. Self-loops are
    /// excluded: they expire where they start.
    backedges_from: Vec<Vec<usize>>,
    /// Backedges whose ancestor endpoint is this node (self-loops included).
    backedges_to: Vec<Vec<usize>>,
    /// Ancestor-side endpoint of each backedge arc.
    arc_upper: Vec<usize>,
    postorder: Vec<usize>,
}

/// Output of the cycle-equivalence pass.
#[derive(Debug)]
pub(crate) struct CycleEquiv {
    /// Class per arc; `None` for arcs the traversal never reached.
    pub class_of: Vec<Option<usize>>,
    pub tree: DfsTree,
    pub class_count: usize,
}

/// Iterative undirected DFS from `root`, restricted to root's component.
fn explore(view: &UndirectedView, root: usize) -> DfsTree {
    let node_count = view.adj.len();
    let arc_count = view.ends.len();
    let mut tree = DfsTree {
        dfsnum: vec![UNSET; node_count],
        leave: vec![UNSET; node_count],
        parent_arc: vec![UNSET; node_count],
        node_by_num: Vec::with_capacity(node_count),
        children: vec![Vec::new(); node_count],
        backedges_from: vec![Vec::new(); node_count],
        backedges_to: vec![Vec::new(); node_count],
        arc_upper: vec![UNSET; arc_count],
        postorder: Vec::with_capacity(node_count),
    };
    let mut arc_seen = FixedBitSet::with_capacity(arc_count);

    tree.dfsnum[root] = 0;
    tree.node_by_num.push(root);
    let mut time = 1;

    // Explicit stack of (node, position in its incident list), so depth is
    // bounded by the tree height rather than the native call stack.
    let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
    while let Some(frame) = stack.last_mut() {
        let node = frame.0;
        if frame.1 >= view.adj[node].len() {
            tree.leave[node] = time - 1;
            tree.postorder.push(node);
            stack.pop();
            continue;
        }
        let arc = view.adj[node][frame.1];
        frame.1 += 1;
        if arc_seen.contains(arc) {
            continue;
        }
        arc_seen.insert(arc);

        let other = view.other(arc, node);
        if tree.dfsnum[other] == UNSET {
            tree.dfsnum[other] = time;
            tree.node_by_num.push(other);
            time += 1;
            tree.parent_arc[other] = arc;
            tree.children[node].push(other);
            stack.push((other, 0));
        } else {
            // An undirected DFS has no cross arcs: the first unseen scan of
            // an arc to a visited node always finds an ancestor (or, for a
            // self-loop, the node itself).
            let (desc, anc) = if tree.dfsnum[other] < tree.dfsnum[node] {
                (node, other)
            } else {
                (other, node)
            };
            tree.arc_upper[arc] = anc;
            if desc != anc {
                tree.backedges_from[desc].push(arc);
            }
            tree.backedges_to[anc].push(arc);
        }
    }

    tree
}

fn next_class(counter: &mut usize) -> usize {
    let class = *counter;
    *counter += 1;
    class
}

/// Assigns every arc in root's component its cycle-equivalence class.
pub(crate) fn cycle_equivalence(view: &UndirectedView, root: usize) -> CycleEquiv {
    let tree = explore(view, root);
    let node_count = view.adj.len();
    let arc_count = view.ends.len();

    let mut arena = BracketArena::new(arc_count);
    let mut blists = vec![BracketList::EMPTY; node_count];
    let mut capping_to: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    let mut hi = vec![UNSET; node_count];
    // `recent_size`/`recent_class` live on the bracket cells: the size the
    // list had the last time this cell was its top, and the class handed
    // out then. Matching size means the bracket set cannot have changed.
    let mut recent_size = vec![UNSET; arc_count];
    let mut recent_class = vec![UNSET; arc_count];
    let mut class_of: Vec<Option<usize>> = vec![None; arc_count];
    let mut class_count = 0;

    for &node in &tree.postorder {
        // hi0: nearest-to-root target of a backedge leaving `node` itself.
        let mut hi0 = UNSET;
        for &arc in &tree.backedges_from[node] {
            hi0 = hi0.min(tree.dfsnum[tree.arc_upper[arc]]);
        }

        // hi1/hi2: best and second best over the children's hi values.
        let mut hi1 = UNSET;
        let mut hi2 = UNSET;
        for &child in &tree.children[node] {
            let val = hi[child];
            if val < hi1 {
                hi2 = hi1;
                hi1 = val;
            } else if val < hi2 {
                hi2 = val;
            }
        }
        hi[node] = hi0.min(hi1);

        let mut bl = BracketList::EMPTY;
        for &child in &tree.children[node] {
            bl = arena.concat(bl, blists[child]);
        }

        for cap in capping_to[node].drain(..) {
            arena.delete(&mut bl, cap);
        }

        for &arc in &tree.backedges_to[node] {
            arena.delete(&mut bl, arc);
            if class_of[arc].is_none() {
                class_of[arc] = Some(next_class(&mut class_count));
            }
        }

        for &arc in &tree.backedges_from[node] {
            arena.push(&mut bl, arc);
        }

        // Capping backedge: when a second child subtree reaches a proper
        // ancestor and no backedge of `node` itself reaches as high, tree
        // arcs between here and that ancestor must not be conflated with
        // arcs below. The `hi2 < dfsnum` half matters: a subtree that only
        // loops back to `node` or within itself needs no cap, and capping
        // a non-ancestor would leave the cell undeletable.
        if hi2 < hi0 && hi2 < tree.dfsnum[node] {
            let cap = arena.alloc();
            recent_size.push(UNSET);
            recent_class.push(UNSET);
            arena.push(&mut bl, cap);
            capping_to[tree.node_by_num[hi2]].push(cap);
            trace!(
                "capping backedge {} from node {} to dfsnum {}",
                cap,
                node,
                hi2
            );
        }

        let parent_arc = tree.parent_arc[node];
        if parent_arc != UNSET {
            match bl.top() {
                Some(top) => {
                    if recent_size[top] != bl.len() {
                        recent_size[top] = bl.len();
                        recent_class[top] = next_class(&mut class_count);
                    }
                    class_of[parent_arc] = Some(recent_class[top]);
                    // A lone real bracket is cycle-equivalent with the tree
                    // arc it spans.
                    if recent_size[top] == 1 && top < arc_count {
                        class_of[top] = class_of[parent_arc];
                    }
                }
                None => {
                    // Undirected bridge: the subtree never reaches back
                    // above `node`, so its tree arc is alone in its class.
                    class_of[parent_arc] = Some(next_class(&mut class_count));
                }
            }
        }

        blists[node] = bl;
    }

    debug!(
        "cycle equivalence: {} classes over {} arcs, {} of {} nodes reached",
        class_count,
        arc_count,
        tree.node_by_num.len(),
        node_count
    );

    CycleEquiv {
        class_of,
        tree,
        class_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::augment::augment;
    use crate::input::from_edges;
    use crate::types::CfgGraph;
    use petgraph::visit::EdgeRef;

    fn classes_for(edges: &[(&str, &str)]) -> (CfgGraph, CycleEquiv) {
        let adj = from_edges(edges);
        let aug = augment(&adj).unwrap();
        let view = UndirectedView::new(&aug.graph);
        let eq = cycle_equivalence(&view, aug.entry.index());
        (aug.graph, eq)
    }

    fn arc(graph: &CfgGraph, from: &str, to: &str) -> usize {
        graph
            .edge_references()
            .find(|e| graph[e.source()] == from && graph[e.target()] == to)
            .map(|e| e.id().index())
            .unwrap()
    }

    #[test]
    fn test_every_reachable_arc_classified() {
        let (graph, eq) = classes_for(&[("s", "a"), ("a", "b"), ("a", "c"), ("b", "t"), ("c", "t")]);
        for id in 0..graph.edge_count() {
            assert!(eq.class_of[id].is_some(), "arc {} unclassified", id);
        }
    }

    #[test]
    fn test_diamond_classes() {
        let (graph, eq) = classes_for(&[
            ("s", "a"),
            ("a", "b"),
            ("a", "c"),
            ("b", "d"),
            ("c", "d"),
            ("d", "t"),
        ]);
        let class = |u, v| eq.class_of[arc(&graph, u, v)];
        // outer chain: s->a, d->t and the virtual back arc
        assert_eq!(class("s", "a"), class("d", "t"));
        assert_eq!(class("s", "a"), class("t", "s"));
        // each branch pairs up with itself only
        assert_eq!(class("a", "b"), class("b", "d"));
        assert_eq!(class("a", "c"), class("c", "d"));
        assert_ne!(class("a", "b"), class("a", "c"));
        assert_ne!(class("a", "b"), class("s", "a"));
    }

    #[test]
    fn test_loop_classes() {
        let (graph, eq) = classes_for(&[("s", "a"), ("a", "b"), ("b", "a"), ("a", "t")]);
        let class = |u, v| eq.class_of[arc(&graph, u, v)];
        assert_eq!(class("s", "a"), class("a", "t"));
        assert_eq!(class("a", "b"), class("b", "a"));
        assert_ne!(class("a", "b"), class("s", "a"));
    }

    #[test]
    fn test_self_loop_is_singleton() {
        let (graph, eq) = classes_for(&[("s", "a"), ("a", "a"), ("a", "t")]);
        let self_arc = arc(&graph, "a", "a");
        let self_class = eq.class_of[self_arc].unwrap();
        for id in 0..graph.edge_count() {
            if id != self_arc {
                assert_ne!(eq.class_of[id], Some(self_class));
            }
        }
    }

    #[test]
    fn test_side_loop_does_not_split_the_chain() {
        // A two-node cycle hanging off `a` reaches `a` and nothing higher;
        // the straight-line chain through `b` must stay one class.
        let (graph, eq) = classes_for(&[("s", "a"), ("a", "b"), ("a", "c"), ("c", "a"), ("b", "t")]);
        let class = |u, v| eq.class_of[arc(&graph, u, v)];
        assert_eq!(class("s", "a"), class("a", "b"));
        assert_eq!(class("a", "b"), class("b", "t"));
        assert_eq!(class("a", "c"), class("c", "a"));
        assert_ne!(class("a", "c"), class("s", "a"));
    }

    #[test]
    fn test_exit_free_loop_gets_singleton_bridge_classes() {
        // `b` and `c` cycle forever; the arc into the cycle is an
        // undirected bridge and must not share a class with anything.
        let (graph, eq) = classes_for(&[("s", "a"), ("a", "t"), ("a", "b"), ("b", "c"), ("c", "b")]);
        let bridge = eq.class_of[arc(&graph, "a", "b")].unwrap();
        for id in 0..graph.edge_count() {
            if id != arc(&graph, "a", "b") {
                assert_ne!(eq.class_of[id], Some(bridge));
            }
        }
    }

    #[test]
    fn test_determinism() {
        let edges = [
            ("s", "a"),
            ("a", "b"),
            ("a", "c"),
            ("b", "d"),
            ("c", "d"),
            ("d", "a"),
            ("d", "t"),
        ];
        let (_, eq1) = classes_for(&edges);
        let (_, eq2) = classes_for(&edges);
        assert_eq!(eq1.class_of, eq2.class_of);
        assert_eq!(eq1.tree.dfsnum, eq2.tree.dfsnum);
    }
}
