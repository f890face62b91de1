//! # pst_trees
//!
//! Single-entry/single-exit region analysis for directed graphs: computes
//! the cycle-equivalence classes of all edges and arranges the resulting
//! canonical SESE regions into the Program Structure Tree, in time linear
//! in the size of the graph (Johnson, Pearson, Pingali).
//!
//! Based on [`petgraph`](https://docs.rs/petgraph).
//!
//! The one entry point is [`compute_pst`]; see [`Pst`] for what comes back.

pub mod augment;
mod bracket_list;
mod cycle_equiv;
pub mod error;
pub mod input;
pub mod output;
pub mod pst;
mod regions;
pub mod testing;
pub mod types;
mod undirected;

pub use error::PstError;
pub use input::{from_edges, from_file, from_str, Adjacency, NodeIo};
pub use pst::{compute_pst, DfsInfo, Pst, Region};
pub use types::CfgGraph;
pub use types::EdgeKind;
