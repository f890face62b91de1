use crate::pst::Pst;
use crate::types::EdgeKind;
use petgraph::visit::EdgeRef;

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Returns the augmented control-flow graph in DOT format.
///
/// Entry and exit are drawn as double circles, augmentation edges dashed,
/// the virtual back edge dotted (and only on request). Every edge carries
/// its arc id and cycle-equivalence class as `id:class`.
pub fn cfg_to_dot(pst: &Pst, include_back: bool) -> String {
    let mut output = String::from("digraph CFG {\n  rankdir=LR;\n");

    for node in pst.graph.node_indices() {
        let mut attrs = vec![format!("label=\"{}\"", escape(pst.label(node)))];
        if node == pst.entry || node == pst.exit {
            attrs.push("shape=doublecircle".to_string());
        }
        output.push_str(&format!("  {} [{}];\n", node.index(), attrs.join(", ")));
    }

    for edge in pst.graph.edge_references() {
        let kind = *edge.weight();
        if kind == EdgeKind::Back && !include_back {
            continue;
        }
        let mut attrs = Vec::new();
        match kind {
            EdgeKind::Back => attrs.push("style=dotted".to_string()),
            EdgeKind::SuperEntry | EdgeKind::SuperExit => attrs.push("style=dashed".to_string()),
            EdgeKind::Orig => {}
        }
        let class = match pst.arc_class[edge.id().index()] {
            Some(class) => class.to_string(),
            None => "-".to_string(),
        };
        attrs.push(format!("label=\"{}:{}\"", edge.id().index(), class));
        output.push_str(&format!(
            "  {} -> {} [{}];\n",
            edge.source().index(),
            edge.target().index(),
            attrs.join(", ")
        ));
    }

    output.push_str("}\n");
    output
}

/// Returns the program structure tree in DOT format. Regions are boxes
/// labeled with their boundary arcs.
pub fn pst_to_dot(pst: &Pst) -> String {
    let mut output = String::from("digraph PST {\n  node [shape=box];\n");

    for region in &pst.regions {
        let label = match (region.entry_edge, region.exit_edge) {
            (Some(entry), Some(exit)) => {
                let (es, et) = pst.arc_labels(entry);
                let (xs, xt) = pst.arc_labels(exit);
                format!(
                    "R{}\\n{}->{}\\n{}->{}",
                    region.id,
                    escape(es),
                    escape(et),
                    escape(xs),
                    escape(xt)
                )
            }
            _ => "root".to_string(),
        };
        output.push_str(&format!("  R{} [label=\"{}\"];\n", region.id, label));
    }

    for region in &pst.regions {
        if let Some(parent) = region.parent {
            output.push_str(&format!("  R{} -> R{};\n", parent, region.id));
        }
    }

    output.push_str("}\n");
    output
}

/// Returns the control-flow graph with regions drawn as nested clusters,
/// one `subgraph cluster_*` per region following the tree. Every node sits
/// in the cluster of its innermost region.
///
/// Intended to be used with `dot`.
pub fn cfg_with_regions_to_dot(pst: &Pst, include_super: bool) -> String {
    // pre-order means the last region claiming a node is its innermost
    let mut innermost = vec![usize::MAX; pst.graph.node_count()];
    for region in &pst.regions {
        for &node in &region.nodes {
            innermost[node.index()] = region.id;
        }
    }

    let skip_node = |idx: petgraph::graph::NodeIndex| {
        !include_super
            && ((idx == pst.entry && pst.synthetic_entry)
                || (idx == pst.exit && pst.synthetic_exit))
    };

    let mut output = String::from("digraph CFG {\n  compound=true;\n  rankdir=LR;\n");
    emit_cluster(pst, 0, &innermost, &skip_node, 1, &mut output);

    // unreachable islands are drawn outside every cluster
    for &node in &pst.unreachable {
        output.push_str(&format!(
            "  {} [label=\"{}\", style=dashed];\n",
            node.index(),
            escape(pst.label(node))
        ));
    }

    for edge in pst.graph.edge_references() {
        let kind = *edge.weight();
        if kind == EdgeKind::Back {
            continue;
        }
        if skip_node(edge.source()) || skip_node(edge.target()) {
            continue;
        }
        output.push_str(&format!(
            "  {} -> {};\n",
            edge.source().index(),
            edge.target().index()
        ));
    }

    output.push_str("}\n");
    output
}

fn emit_cluster(
    pst: &Pst,
    id: usize,
    innermost: &[usize],
    skip_node: &dyn Fn(petgraph::graph::NodeIndex) -> bool,
    depth: usize,
    output: &mut String,
) {
    let pad = "  ".repeat(depth);

    for node in pst.graph.node_indices() {
        if innermost[node.index()] != id || skip_node(node) {
            continue;
        }
        output.push_str(&format!(
            "{}{} [label=\"{}\"];\n",
            pad,
            node.index(),
            escape(pst.label(node))
        ));
    }

    for region in &pst.regions {
        if region.parent != Some(id) {
            continue;
        }
        output.push_str(&format!("{}subgraph cluster_r{} {{\n", pad, region.id));
        output.push_str(&format!("{}  label=\"R{}\";\n", pad, region.id));
        emit_cluster(pst, region.id, innermost, skip_node, depth + 1, output);
        output.push_str(&format!("{}}}\n", pad));
    }
}

/// Writes a string to a file.
pub fn to_file(content: &str, path: &str) {
    std::fs::write(path, content).expect("Rust should write to file");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::from_edges;
    use crate::pst::compute_pst;

    fn diamond() -> Pst {
        let adj = from_edges(&[
            ("S", "A"),
            ("A", "B"),
            ("A", "C"),
            ("B", "D"),
            ("C", "D"),
            ("D", "T"),
        ]);
        compute_pst(&adj).unwrap()
    }

    #[test]
    fn test_cfg_dot() {
        let pst = diamond();
        let dot = cfg_to_dot(&pst, false);
        assert!(dot.starts_with("digraph CFG {"));
        assert!(dot.contains("doublecircle"));
        assert!(!dot.contains("dotted"));
        let with_back = cfg_to_dot(&pst, true);
        assert!(with_back.contains("dotted"));
    }

    #[test]
    fn test_pst_dot() {
        let pst = diamond();
        let dot = pst_to_dot(&pst);
        assert!(dot.starts_with("digraph PST {"));
        assert!(dot.contains("R0 [label=\"root\"]"));
        assert!(dot.contains("R0 -> R1;"));
    }

    #[test]
    fn test_region_clusters_nest() {
        let pst = diamond();
        let dot = cfg_with_regions_to_dot(&pst, true);
        // one cluster per non-root region
        assert_eq!(dot.matches("subgraph cluster_r").count(), pst.regions.len() - 1);
        assert!(dot.contains("compound=true"));
    }

    #[test]
    fn test_multi_source_super_nodes_can_be_hidden() {
        let adj = from_edges(&[("A", "C"), ("B", "C"), ("C", "D")]);
        let pst = compute_pst(&adj).unwrap();
        let hidden = cfg_with_regions_to_dot(&pst, false);
        assert!(!hidden.contains("__entry__"));
        let shown = cfg_with_regions_to_dot(&pst, true);
        assert!(shown.contains("__entry__"));
    }
}
