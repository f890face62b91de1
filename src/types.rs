/// Enum representing the kind of a directed edge in the augmented graph.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EdgeKind {
    /// Edge taken from the caller's adjacency.
    Orig,
    /// Edge from the super-entry to an original source.
    SuperEntry,
    /// Edge from an original sink to the super-exit.
    SuperExit,
    /// The virtual back edge from the super-exit to the super-entry.
    Back,
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EdgeKind::Orig => write!(f, "orig"),
            EdgeKind::SuperEntry => write!(f, "super_entry"),
            EdgeKind::SuperExit => write!(f, "super_exit"),
            EdgeKind::Back => write!(f, "back"),
        }
    }
}

/// Wrapper for petgraph's directed graph type.
///
/// Node weights are the caller's labels. Edge indices double as arc ids
/// everywhere in this crate: the undirected view, `arc_class` and the
/// region boundaries all refer to them.
pub type CfgGraph = petgraph::graph::DiGraph<String, EdgeKind>;
