//! Renders the built-in example graphs to DOT.
//!
//! I use it with `pst_viz --out-dir viz` followed by e.g.
//! `dot -Tsvg viz/diamond_regions.dot > diamond.svg`.

use clap::Parser;
use log::info;
use pst_trees::output::{cfg_to_dot, cfg_with_regions_to_dot, pst_to_dot, to_file};
use pst_trees::testing::fixtures;
use pst_trees::{compute_pst, from_edges};
use std::path::PathBuf;

#[derive(Parser)]
#[command(about = "Emit DOT renderings of example control-flow graphs")]
struct Args {
    /// Directory the .dot files are written to.
    #[arg(long, default_value = "viz-out")]
    out_dir: PathBuf,
    /// Draw the virtual back edge in the plain CFG rendering.
    #[arg(long)]
    include_back: bool,
    /// Hide the super-entry/super-exit nodes in the region rendering.
    #[arg(long)]
    hide_super: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    std::fs::create_dir_all(&args.out_dir).expect("output directory should be writable");

    let examples = [
        ("diamond", fixtures::diamond()),
        ("loop", fixtures::loop_graph()),
        ("nested_diamonds", fixtures::nested_diamonds()),
        ("paper_figure", fixtures::paper_figure()),
    ];

    for (name, edges) in examples {
        let adj = from_edges(&edges);
        let pst = compute_pst(&adj).expect("example graphs are well-formed");

        let write = |suffix: &str, content: &str| {
            let path = args.out_dir.join(format!("{}_{}.dot", name, suffix));
            to_file(content, path.to_str().expect("paths are valid unicode"));
        };
        write("cfg", &cfg_to_dot(&pst, args.include_back));
        write("pst", &pst_to_dot(&pst));
        write("regions", &cfg_with_regions_to_dot(&pst, !args.hide_super));

        info!(
            "{}: {} nodes, {} arcs, {} regions",
            name,
            pst.graph.node_count(),
            pst.graph.edge_count(),
            pst.regions.len()
        );
    }
}
