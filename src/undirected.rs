use crate::types::CfgGraph;
use petgraph::visit::EdgeRef;

/// Undirected multigraph view of the augmented graph.
///
/// Arc ids coincide with the petgraph edge indices, so everything the
/// traversal computes maps straight back onto the directed graph. Opposite
/// directed edges between the same pair of nodes stay distinct arcs.
#[derive(Debug)]
pub(crate) struct UndirectedView {
    /// Arc endpoints as node indices, in edge-index order.
    pub ends: Vec<(usize, usize)>,
    /// Incident arc ids per node, in edge insertion order. A self-loop
    /// appears once in its node's list.
    pub adj: Vec<Vec<usize>>,
}

impl UndirectedView {
    pub fn new(graph: &CfgGraph) -> Self {
        let mut ends = Vec::with_capacity(graph.edge_count());
        let mut adj = vec![Vec::new(); graph.node_count()];
        for e in graph.edge_references() {
            let id = e.id().index();
            let (a, b) = (e.source().index(), e.target().index());
            ends.push((a, b));
            adj[a].push(id);
            if a != b {
                adj[b].push(id);
            }
        }
        UndirectedView { ends, adj }
    }

    /// The endpoint of `arc` that is not `n` (or `n` again for a self-loop).
    pub fn other(&self, arc: usize, n: usize) -> usize {
        let (a, b) = self.ends[arc];
        if a == n {
            b
        } else {
            a
        }
    }
}
