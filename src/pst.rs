use crate::augment::{augment, Augmented};
use crate::cycle_equiv::cycle_equivalence;
use crate::error::PstError;
use crate::input::Adjacency;
use crate::regions::{assemble, check_nesting, forward_dfs, layout, synthesize};
use crate::types::CfgGraph;
use crate::undirected::UndirectedView;
use log::info;
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;

/// One SESE region of the program structure tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    /// Pre-order id; equals the region's position in [`Pst::regions`].
    pub id: usize,
    /// Arc entering the region. `None` only for the root, which is bounded
    /// by the virtual back edge.
    pub entry_edge: Option<EdgeIndex>,
    /// Arc leaving the region.
    pub exit_edge: Option<EdgeIndex>,
    /// Nodes of the region in discovery order. Boundary nodes (the entry
    /// arc's source and the exit arc's target) belong to the parent.
    pub nodes: Vec<NodeIndex>,
    /// Parent region id; `None` only for the root.
    pub parent: Option<usize>,
}

/// Bookkeeping of the undirected depth-first search, kept for debugging
/// and visualization. All vectors are indexed by node index; unreached
/// nodes hold `usize::MAX` / `None`.
#[derive(Debug, Clone)]
pub struct DfsInfo {
    pub enter: Vec<usize>,
    pub leave: Vec<usize>,
    pub parent_arc: Vec<Option<EdgeIndex>>,
}

/// Result of the Program Structure Tree construction.
#[derive(Debug, Clone)]
pub struct Pst {
    /// The augmented graph: the caller's edges plus super-entry/super-exit
    /// wiring and the virtual back edge. All indices below refer to it.
    pub graph: CfgGraph,
    pub entry: NodeIndex,
    pub exit: NodeIndex,
    pub back_edge: EdgeIndex,
    /// Whether entry/exit were inserted rather than taken from the input.
    pub synthetic_entry: bool,
    pub synthetic_exit: bool,
    /// Regions in pre-order: parents precede children, the root is first.
    pub regions: Vec<Region>,
    /// Cycle-equivalence class per arc; `None` only for arcs in components
    /// the entry cannot see.
    pub arc_class: Vec<Option<usize>>,
    pub dfs: DfsInfo,
    /// Nodes disconnected from the entry even in the undirected view.
    /// These appear in no region and their arcs carry no class.
    pub unreachable: Vec<NodeIndex>,
}

impl Pst {
    /// The caller-visible label of a node.
    pub fn label(&self, node: NodeIndex) -> &str {
        &self.graph[node]
    }

    /// Labels of a region's nodes, in discovery order.
    pub fn region_labels(&self, region: &Region) -> Vec<&str> {
        region.nodes.iter().map(|&n| self.label(n)).collect()
    }

    /// Ids of the regions directly contained in `id`.
    pub fn children(&self, id: usize) -> Vec<usize> {
        self.regions
            .iter()
            .filter(|r| r.parent == Some(id))
            .map(|r| r.id)
            .collect()
    }

    /// Looks a region up by the labels of its boundary arcs.
    pub fn find_region(&self, entry: (&str, &str), exit: (&str, &str)) -> Option<&Region> {
        self.regions.iter().find(|r| {
            match (r.entry_edge, r.exit_edge) {
                (Some(en), Some(ex)) => self.arc_labels(en) == entry && self.arc_labels(ex) == exit,
                _ => false,
            }
        })
    }

    /// Source and target labels of an arc.
    pub fn arc_labels(&self, arc: EdgeIndex) -> (&str, &str) {
        let (s, t) = self
            .graph
            .edge_endpoints(arc)
            .expect("arc ids always come from this graph");
        (self.label(s), self.label(t))
    }
}

/// Builds the Program Structure Tree of the given adjacency.
///
/// The pipeline is strictly forward: augmentation, the undirected view,
/// the bracket-list traversal, region synthesis, tree assembly. A pure
/// function of the input; no stage mutates an earlier stage's output.
pub fn compute_pst(adj: &Adjacency) -> Result<Pst, PstError> {
    let Augmented {
        graph,
        entry,
        exit,
        back_edge,
        synthetic_entry,
        synthetic_exit,
    } = augment(adj)?;

    let view = UndirectedView::new(&graph);
    let eq = cycle_equivalence(&view, entry.index());

    let unreachable: Vec<NodeIndex> = graph
        .node_indices()
        .filter(|n| eq.tree.dfsnum[n.index()] == usize::MAX)
        .collect();
    if !unreachable.is_empty() {
        info!(
            "{} nodes are disconnected from the entry and will be ignored",
            unreachable.len()
        );
    }

    for e in graph.edge_references() {
        let reached = eq.tree.dfsnum[e.source().index()] != usize::MAX;
        if reached && eq.class_of[e.id().index()].is_none() {
            return Err(PstError::InternalInvariantViolation(format!(
                "arc {} left unclassified after the traversal",
                e.id().index()
            )));
        }
    }

    let fwd = forward_dfs(&graph, entry.index());
    let ends: Vec<(usize, usize)> = graph
        .edge_references()
        .map(|e| (e.source().index(), e.target().index()))
        .collect();

    let mut raw = synthesize(&ends, &eq.class_of, &fwd)?;
    assemble(&mut raw);
    check_nesting(&raw)?;

    let root_nodes = eq.tree.node_by_num.clone();
    let layouts = layout(&raw, &fwd.node_by_time, root_nodes);

    let regions: Vec<Region> = layouts
        .into_iter()
        .enumerate()
        .map(|(id, l)| Region {
            id,
            entry_edge: l.entry_arc.map(EdgeIndex::new),
            exit_edge: l.exit_arc.map(EdgeIndex::new),
            nodes: l.nodes.into_iter().map(NodeIndex::new).collect(),
            parent: l.parent,
        })
        .collect();

    let dfs = DfsInfo {
        enter: eq.tree.dfsnum.clone(),
        leave: eq.tree.leave.clone(),
        parent_arc: eq
            .tree
            .parent_arc
            .iter()
            .map(|&arc| {
                if arc == usize::MAX {
                    None
                } else {
                    Some(EdgeIndex::new(arc))
                }
            })
            .collect(),
    };

    info!(
        "pst: {} regions, {} classes, {} arcs",
        regions.len(),
        eq.class_count,
        graph.edge_count()
    );

    Ok(Pst {
        graph,
        entry,
        exit,
        back_edge,
        synthetic_entry,
        synthetic_exit,
        regions,
        arc_class: eq.class_of,
        dfs,
        unreachable,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::augment::ENTRY_LABEL;
    use crate::input::from_edges;
    use crate::testing::fixtures;
    use hashbrown::HashSet;

    fn pst_of(edges: &[(&str, &str)]) -> Pst {
        compute_pst(&from_edges(edges)).unwrap()
    }

    fn sorted_labels(pst: &Pst, region: &Region) -> Vec<String> {
        let mut labels: Vec<String> = pst
            .region_labels(region)
            .iter()
            .map(|s| s.to_string())
            .collect();
        labels.sort();
        labels
    }

    /// Universal invariants from the algorithm: the tree shape, proper
    /// containment, and one leaf-most region per node.
    fn assert_well_formed(pst: &Pst) {
        assert!(!pst.regions.is_empty());
        assert_eq!(pst.regions[0].parent, None);
        for (id, region) in pst.regions.iter().enumerate() {
            assert_eq!(region.id, id);
            match region.parent {
                None => assert_eq!(id, 0),
                Some(parent) => {
                    // pre-order: parents come first, so parent chains can
                    // never cycle
                    assert!(parent < id);
                    let parent_nodes: HashSet<_> =
                        pst.regions[parent].nodes.iter().copied().collect();
                    for n in &region.nodes {
                        assert!(parent_nodes.contains(n), "region {} escapes its parent", id);
                    }
                    assert!(region.nodes.len() < pst.regions[parent].nodes.len() + 1);
                }
            }
        }
        // siblings are disjoint
        for a in &pst.regions {
            for b in &pst.regions {
                if a.id != b.id && a.parent == b.parent && a.parent.is_some() {
                    let bn: HashSet<_> = b.nodes.iter().copied().collect();
                    assert!(a.nodes.iter().all(|n| !bn.contains(n)));
                }
            }
        }
    }

    #[test]
    fn test_scenario_diamond() {
        let pst = pst_of(&fixtures::diamond());
        assert_well_formed(&pst);
        assert!(!pst.synthetic_entry);
        assert!(!pst.synthetic_exit);

        // root covers the whole graph
        assert_eq!(
            sorted_labels(&pst, &pst.regions[0]),
            vec!["A", "B", "C", "D", "S", "T"]
        );

        let outer = pst.find_region(("S", "A"), ("D", "T")).unwrap();
        assert_eq!(sorted_labels(&pst, outer), vec!["A", "B", "C", "D"]);
        assert_eq!(outer.parent, Some(0));

        let left = pst.find_region(("A", "B"), ("B", "D")).unwrap();
        let right = pst.find_region(("A", "C"), ("C", "D")).unwrap();
        assert_eq!(sorted_labels(&pst, left), vec!["B"]);
        assert_eq!(sorted_labels(&pst, right), vec!["C"]);
        assert_eq!(left.parent, Some(outer.id));
        assert_eq!(right.parent, Some(outer.id));

        // outer class spans S->A and D->T
        let class_of = |u: &str, v: &str| {
            let arc = pst
                .graph
                .edge_references()
                .find(|e| pst.label(e.source()) == u && pst.label(e.target()) == v)
                .unwrap();
            pst.arc_class[arc.id().index()]
        };
        assert_eq!(class_of("S", "A"), class_of("D", "T"));
    }

    #[test]
    fn test_scenario_loop() {
        let pst = pst_of(&fixtures::loop_graph());
        assert_well_formed(&pst);
        // loop body region: entered from outside the header, left by the
        // fall-through
        let body = pst.find_region(("S", "A"), ("A", "T")).unwrap();
        assert_eq!(sorted_labels(&pst, body), vec!["A", "B"]);
        // the backedge pairs with the loop entry arc in its own tiny region
        let back = pst.find_region(("A", "B"), ("B", "A")).unwrap();
        assert_eq!(sorted_labels(&pst, back), vec!["B"]);
        assert_eq!(back.parent, Some(body.id));
    }

    #[test]
    fn test_scenario_multi_source() {
        let pst = pst_of(&[("A", "C"), ("B", "C"), ("C", "D")]);
        assert_well_formed(&pst);
        assert!(pst.synthetic_entry);
        assert_eq!(pst.label(pst.entry), ENTRY_LABEL);
        assert_eq!(pst.label(pst.exit), "D");
        // augmented adjacency carries the new arcs
        let entry_targets: HashSet<&str> = pst
            .graph
            .edges(pst.entry)
            .filter(|e| e.target() != pst.entry)
            .map(|e| pst.label(e.target()))
            .collect();
        assert_eq!(entry_targets, HashSet::from_iter(["A", "B"]));
    }

    #[test]
    fn test_scenario_unreachable_island() {
        // a pure cycle with no source or sink stays disconnected
        let pst = pst_of(&[("S", "A"), ("A", "T"), ("X", "Y"), ("Y", "X"), ("Y", "Y")]);
        assert_well_formed(&pst);
        let unreachable: HashSet<&str> =
            pst.unreachable.iter().map(|&n| pst.label(n)).collect();
        assert_eq!(unreachable, HashSet::from_iter(["X", "Y"]));
        for region in &pst.regions {
            for &n in &region.nodes {
                assert!(!pst.unreachable.contains(&n));
            }
        }
        // island arcs carry no class
        for e in pst.graph.edge_references() {
            let on_island = pst.unreachable.contains(&e.source());
            assert_eq!(pst.arc_class[e.id().index()].is_none(), on_island);
        }
    }

    #[test]
    fn test_scenario_self_loop() {
        let pst = pst_of(&[("S", "A"), ("A", "A"), ("A", "T")]);
        assert_well_formed(&pst);
        // A sits in the region bounded by S->A and A->T
        let region = pst.find_region(("S", "A"), ("A", "T")).unwrap();
        assert_eq!(sorted_labels(&pst, region), vec!["A"]);
        // the self-arc forms no region of its own
        for r in &pst.regions {
            if let (Some(en), Some(ex)) = (r.entry_edge, r.exit_edge) {
                assert_ne!(pst.arc_labels(en), ("A", "A"));
                assert_ne!(pst.arc_labels(ex), ("A", "A"));
            }
        }
    }

    #[test]
    fn test_scenario_nested_diamond_chain() {
        let pst = pst_of(&fixtures::nested_diamonds());
        assert_well_formed(&pst);

        let first = pst.find_region(("S", "A"), ("D", "E")).unwrap();
        let second = pst.find_region(("D", "E"), ("H", "I")).unwrap();
        let third = pst.find_region(("H", "I"), ("L", "T")).unwrap();
        assert_eq!(sorted_labels(&pst, first), vec!["A", "B", "C", "D"]);
        assert_eq!(sorted_labels(&pst, second), vec!["E", "F", "G", "H"]);
        assert_eq!(sorted_labels(&pst, third), vec!["I", "J", "K", "L"]);
        // three siblings at the same depth
        assert_eq!(first.parent, Some(0));
        assert_eq!(second.parent, Some(0));
        assert_eq!(third.parent, Some(0));
        // each with its two branch regions
        for diamond in [first, second, third] {
            assert_eq!(pst.children(diamond.id).len(), 2);
        }
        // all chain arcs carry the root class
        let class = |u: &str, v: &str| {
            let arc = pst
                .graph
                .edge_references()
                .find(|e| pst.label(e.source()) == u && pst.label(e.target()) == v)
                .unwrap();
            pst.arc_class[arc.id().index()]
        };
        assert_eq!(class("S", "A"), class("D", "E"));
        assert_eq!(class("S", "A"), class("H", "I"));
        assert_eq!(class("S", "A"), class("L", "T"));
    }

    #[test]
    fn test_boundary_single_node() {
        let mut adj = Adjacency::new();
        adj.insert("only".to_string(), Default::default());
        let pst = compute_pst(&adj).unwrap();
        assert_eq!(pst.regions.len(), 1);
        assert_eq!(pst.region_labels(&pst.regions[0]), vec!["only"]);
    }

    #[test]
    fn test_boundary_single_edge() {
        let pst = pst_of(&[("u", "v")]);
        assert_well_formed(&pst);
        // u and v serve as entry and exit: only the root region remains
        assert_eq!(pst.regions.len(), 1);
        assert_eq!(sorted_labels(&pst, &pst.regions[0]), vec!["u", "v"]);
    }

    #[test]
    fn test_empty_graph_is_invalid() {
        let adj = Adjacency::new();
        assert!(matches!(
            compute_pst(&adj),
            Err(PstError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_determinism() {
        let edges = fixtures::paper_figure();
        let a = compute_pst(&from_edges(&edges)).unwrap();
        let b = compute_pst(&from_edges(&edges)).unwrap();
        assert_eq!(a.regions, b.regions);
        assert_eq!(a.arc_class, b.arc_class);
        assert_eq!(a.unreachable, b.unreachable);
    }

    #[test]
    fn test_paper_figure_well_formed() {
        let pst = pst_of(&fixtures::paper_figure());
        assert_well_formed(&pst);
    }
}
