use crate::input::{from_edges, Adjacency};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Generates a random directed graph in which every node is reachable from
/// `n0`. Based on a random spanning arborescence; the extra edges may
/// converge, form cycles or the occasional self-loop.
pub fn random_cfg(n: usize, m: usize, seed: u64) -> Adjacency {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut edges: Vec<(String, String)> = Vec::new();

    for i in 1..n {
        let j = rng.random_range(0..i);
        edges.push((format!("n{}", j), format!("n{}", i)));
    }

    while edges.len() < m {
        let s = rng.random_range(0..n);
        let t = rng.random_range(0..n);
        edges.push((format!("n{}", s), format!("n{}", t)));
    }

    from_edges(&edges)
}

/// Like [`random_cfg`], but acyclic: extra edges always point from a lower
/// to a higher node id, which keeps `n0` a source.
pub fn random_dag(n: usize, m: usize, seed: u64) -> Adjacency {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut edges: Vec<(String, String)> = Vec::new();

    for i in 1..n {
        let j = rng.random_range(0..i);
        edges.push((format!("n{}", j), format!("n{}", i)));
    }

    while n > 1 && edges.len() < m {
        let s = rng.random_range(0..n - 1);
        let t = rng.random_range(s + 1..n);
        edges.push((format!("n{}", s), format!("n{}", t)));
    }

    from_edges(&edges)
}
