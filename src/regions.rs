//! Region synthesis and tree assembly.
//!
//! A forward (directed) traversal of the augmented graph, minus the virtual
//! back edge, fixes the order in which arcs are discovered. Within one
//! cycle-equivalence class that order runs down a single tree path, so each
//! consecutive pair of class members delimits one canonical region. Node
//! sets and nesting both come from interval arithmetic over the forward
//! spanning tree.

use crate::error::PstError;
use crate::types::{CfgGraph, EdgeKind};
use hashbrown::HashMap;
use log::debug;
use petgraph::visit::EdgeRef;

const UNSET: usize = usize::MAX;

/// Spanning-tree bookkeeping of the forward traversal.
pub(crate) struct ForwardDfs {
    /// Arc ids in scan order; every arc reachable from the entry appears
    /// exactly once, the virtual back edge not at all.
    pub order: Vec<usize>,
    pub enter: Vec<usize>,
    pub leave: Vec<usize>,
    /// Nodes in discovery order, i.e. the inverse of `enter`.
    pub node_by_time: Vec<usize>,
}

pub(crate) fn forward_dfs(graph: &CfgGraph, entry: usize) -> ForwardDfs {
    let node_count = graph.node_count();

    // Out-adjacency in edge insertion order; petgraph's own edge walker
    // yields newest-first, which would flip every branch.
    let mut adj: Vec<Vec<(usize, usize)>> = vec![Vec::new(); node_count];
    for e in graph.edge_references() {
        if *e.weight() == EdgeKind::Back {
            continue;
        }
        adj[e.source().index()].push((e.id().index(), e.target().index()));
    }

    let mut fwd = ForwardDfs {
        order: Vec::with_capacity(graph.edge_count()),
        enter: vec![UNSET; node_count],
        leave: vec![UNSET; node_count],
        node_by_time: Vec::with_capacity(node_count),
    };

    fwd.enter[entry] = 0;
    fwd.node_by_time.push(entry);
    let mut time = 1;
    let mut stack: Vec<(usize, usize)> = vec![(entry, 0)];
    while let Some(frame) = stack.last_mut() {
        let node = frame.0;
        if frame.1 >= adj[node].len() {
            fwd.leave[node] = time - 1;
            stack.pop();
            continue;
        }
        let (arc, target) = adj[node][frame.1];
        frame.1 += 1;
        fwd.order.push(arc);
        if fwd.enter[target] == UNSET {
            fwd.enter[target] = time;
            fwd.node_by_time.push(target);
            time += 1;
            stack.push((target, 0));
        }
    }

    fwd
}

/// A region before renumbering: boundary arcs plus its interval footprint
/// on the forward spanning tree. The footprint is the subtree of the entry
/// arc's target, minus the subtree of the exit arc's target when that one
/// is nested inside (everything past the exit).
#[derive(Debug, Clone)]
pub(crate) struct RawRegion {
    pub entry_arc: Option<usize>,
    pub exit_arc: Option<usize>,
    pub outer: (usize, usize),
    pub hole: Option<(usize, usize)>,
    pub parent: usize,
}

/// Buckets forward-ordered arcs by class; consecutive members become
/// regions. Index 0 of the result is the root region.
pub(crate) fn synthesize(
    ends: &[(usize, usize)],
    class_of: &[Option<usize>],
    fwd: &ForwardDfs,
) -> Result<Vec<RawRegion>, PstError> {
    let span = fwd.node_by_time.len();
    let mut regions = vec![RawRegion {
        entry_arc: None,
        exit_arc: None,
        outer: (0, span.saturating_sub(1)),
        hole: None,
        parent: UNSET,
    }];

    let mut last_by_class: HashMap<usize, usize> = HashMap::new();
    for &arc in &fwd.order {
        let class = match class_of[arc] {
            Some(class) => class,
            None => {
                return Err(PstError::InternalInvariantViolation(format!(
                    "arc {} was scanned forward but never classified",
                    arc
                )))
            }
        };
        if let Some(&prev) = last_by_class.get(&class) {
            let (_, entry_target) = ends[prev];
            let (_, exit_target) = ends[arc];
            let (outer_start, outer_end) = (fwd.enter[entry_target], fwd.leave[entry_target]);
            if outer_start == UNSET {
                return Err(PstError::InternalInvariantViolation(format!(
                    "region entry arc {} targets a node outside the forward tree",
                    prev
                )));
            }
            let hole = {
                let (hole_start, hole_end) = (fwd.enter[exit_target], fwd.leave[exit_target]);
                if hole_start != UNSET && hole_start > outer_start && hole_end <= outer_end {
                    Some((hole_start, hole_end))
                } else {
                    None
                }
            };
            regions.push(RawRegion {
                entry_arc: Some(prev),
                exit_arc: Some(arc),
                outer: (outer_start, outer_end),
                hole,
                parent: UNSET,
            });
        }
        last_by_class.insert(class, arc);
    }

    debug!("synthesized {} regions", regions.len() - 1);
    Ok(regions)
}

fn hole_covers(hole: Option<(usize, usize)>, point: usize) -> bool {
    match hole {
        Some((start, end)) => start <= point && point <= end,
        None => false,
    }
}

/// Fills in every region's parent: the smallest region whose material
/// (outer interval minus hole) encloses it.
///
/// Regions are swept in pre-order of their outer intervals with a stack of
/// open ancestors. A region starting inside an ancestor's hole is a chain
/// sibling, not a child, so the parent is the first stack entry whose hole
/// does not cover the region's start; entries skipped that way stay on the
/// stack because their material resumes past the hole.
pub(crate) fn assemble(regions: &mut [RawRegion]) {
    let mut order: Vec<usize> = (1..regions.len()).collect();
    order.sort_by(|&a, &b| {
        let (ra, rb) = (&regions[a], &regions[b]);
        let hole_start = |r: &RawRegion| r.hole.map_or(UNSET, |(start, _)| start);
        ra.outer
            .0
            .cmp(&rb.outer.0)
            .then(rb.outer.1.cmp(&ra.outer.1))
            // same outer interval: the one whose hole opens later has the
            // larger material and encloses the other
            .then(hole_start(rb).cmp(&hole_start(ra)))
            .then(a.cmp(&b))
    });

    let mut stack: Vec<usize> = vec![0];
    for &region in &order {
        let start = regions[region].outer.0;
        while stack.len() > 1 && regions[*stack.last().unwrap()].outer.1 < start {
            stack.pop();
        }
        let mut parent = 0;
        for &open in stack.iter().rev() {
            if !hole_covers(regions[open].hole, start) {
                parent = open;
                break;
            }
        }
        regions[region].parent = parent;
        stack.push(region);
    }
}

/// Verifies that every region's material nests inside its parent's.
pub(crate) fn check_nesting(regions: &[RawRegion]) -> Result<(), PstError> {
    for (id, region) in regions.iter().enumerate().skip(1) {
        let parent = &regions[region.parent];
        let inside_outer =
            parent.outer.0 <= region.outer.0 && region.outer.1 <= parent.outer.1;
        let clear_of_hole = match parent.hole {
            None => true,
            Some((hole_start, hole_end)) => {
                let disjoint = hole_end < region.outer.0 || region.outer.1 < hole_start;
                let swallowed = match region.hole {
                    Some((child_start, child_end)) => {
                        child_start <= hole_start && hole_end <= child_end
                    }
                    None => false,
                };
                disjoint || swallowed
            }
        };
        if !inside_outer || !clear_of_hole {
            return Err(PstError::InternalInvariantViolation(format!(
                "region {} does not nest inside its parent {}",
                id, region.parent
            )));
        }
    }
    Ok(())
}

/// A region in final form: pre-order id implied by position, nodes
/// materialized, parent remapped.
#[derive(Debug)]
pub(crate) struct RegionLayout {
    pub entry_arc: Option<usize>,
    pub exit_arc: Option<usize>,
    pub nodes: Vec<usize>,
    pub parent: Option<usize>,
}

/// Renumbers regions in pre-order (parents before children, root first) and
/// materializes node sets. The root gets `root_nodes`: every node the
/// analysis saw, including ones the forward traversal missed.
pub(crate) fn layout(
    raw: &[RawRegion],
    node_by_time: &[usize],
    root_nodes: Vec<usize>,
) -> Vec<RegionLayout> {
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); raw.len()];
    for (id, region) in raw.iter().enumerate().skip(1) {
        children[region.parent].push(id);
    }
    for siblings in &mut children {
        siblings.sort_by_key(|&c| (raw[c].outer.0, raw[c].hole));
    }

    let mut preorder = Vec::with_capacity(raw.len());
    let mut stack = vec![0];
    while let Some(region) = stack.pop() {
        preorder.push(region);
        for &child in children[region].iter().rev() {
            stack.push(child);
        }
    }

    let mut new_id = vec![0; raw.len()];
    for (id, &old) in preorder.iter().enumerate() {
        new_id[old] = id;
    }

    preorder
        .iter()
        .map(|&old| {
            let region = &raw[old];
            let nodes = if old == 0 {
                root_nodes.clone()
            } else {
                materialize(region, node_by_time)
            };
            RegionLayout {
                entry_arc: region.entry_arc,
                exit_arc: region.exit_arc,
                nodes,
                parent: if old == 0 {
                    None
                } else {
                    Some(new_id[region.parent])
                },
            }
        })
        .collect()
}

fn materialize(region: &RawRegion, node_by_time: &[usize]) -> Vec<usize> {
    let (start, end) = region.outer;
    let mut nodes = Vec::new();
    for time in start..=end {
        if hole_covers(region.hole, time) {
            continue;
        }
        nodes.push(node_by_time[time]);
    }
    nodes
}
