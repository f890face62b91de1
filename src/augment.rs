use crate::error::PstError;
use crate::input::{validate, Adjacency};
use crate::types::{CfgGraph, EdgeKind};
use hashbrown::{HashMap, HashSet};
use log::debug;
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::Direction::{Incoming, Outgoing};

/// Label of the super-entry node, when one has to be inserted.
pub const ENTRY_LABEL: &str = "__entry__";
/// Label of the super-exit node, when one has to be inserted.
pub const EXIT_LABEL: &str = "__exit__";

/// The input graph after single-entry/single-exit normalization.
#[derive(Debug, Clone)]
pub struct Augmented {
    pub graph: CfgGraph,
    pub entry: NodeIndex,
    pub exit: NodeIndex,
    /// The virtual back edge from `exit` to `entry`. Always the last edge.
    pub back_edge: EdgeIndex,
    /// Whether `entry` / `exit` are inserted nodes rather than caller nodes.
    pub synthetic_entry: bool,
    pub synthetic_exit: bool,
}

/// Normalizes the input to a single entry and a single exit.
///
/// A unique source or sink is reused as is. Otherwise a super-node is
/// inserted and wired to every source (resp. sink) in input order, so the
/// result is deterministic. The virtual back edge from exit to entry closes
/// the graph for the undirected traversal.
pub fn augment(adj: &Adjacency) -> Result<Augmented, PstError> {
    validate(adj)?;

    let mut graph = CfgGraph::with_capacity(adj.len() + 2, adj.len());
    let mut index = HashMap::with_capacity(adj.len());
    for label in adj.keys() {
        index.insert(label.as_str(), graph.add_node(label.clone()));
    }

    // Duplicate ordered pairs collapse to a single arc.
    let mut seen = HashSet::new();
    for (u, io) in adj {
        for v in &io.out {
            if seen.insert((u.as_str(), v.as_str())) {
                graph.add_edge(index[u.as_str()], index[v.as_str()], EdgeKind::Orig);
            }
        }
    }

    let mut sources = Vec::new();
    let mut sinks = Vec::new();
    for n in graph.node_indices() {
        if graph.edges_directed(n, Incoming).next().is_none() {
            sources.push(n);
        }
        if graph.edges_directed(n, Outgoing).next().is_none() {
            sinks.push(n);
        }
    }

    if sources.is_empty() {
        return Err(PstError::Unsupported(
            "no source node: every node lies on a cycle".into(),
        ));
    }

    let (entry, synthetic_entry) = match sources.as_slice() {
        [single] => (*single, false),
        _ => {
            if adj.contains_key(ENTRY_LABEL) {
                return Err(PstError::InvalidInput(format!(
                    "reserved label `{}` already present in the input",
                    ENTRY_LABEL
                )));
            }
            let e = graph.add_node(ENTRY_LABEL.to_string());
            for &s in &sources {
                graph.add_edge(e, s, EdgeKind::SuperEntry);
            }
            (e, true)
        }
    };

    let (exit, synthetic_exit) = match sinks.as_slice() {
        [single] => (*single, false),
        _ => {
            // A graph without sinks still gets a super-exit; it is then
            // reachable through the back edge only.
            if adj.contains_key(EXIT_LABEL) {
                return Err(PstError::InvalidInput(format!(
                    "reserved label `{}` already present in the input",
                    EXIT_LABEL
                )));
            }
            let x = graph.add_node(EXIT_LABEL.to_string());
            for &s in &sinks {
                graph.add_edge(s, x, EdgeKind::SuperExit);
            }
            (x, true)
        }
    };

    let back_edge = graph.add_edge(exit, entry, EdgeKind::Back);

    debug!(
        "augmented graph: {} nodes, {} arcs, entry {:?}, exit {:?}",
        graph.node_count(),
        graph.edge_count(),
        entry,
        exit
    );

    Ok(Augmented {
        graph,
        entry,
        exit,
        back_edge,
        synthetic_entry,
        synthetic_exit,
    })
}
