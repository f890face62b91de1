//! Test support: example graphs, generators and brute-force oracles.
//!
//! Nothing here is needed to run the analysis; it exists so that the fast
//! algorithm can be checked against slow, obviously-correct computations
//! on small graphs.

pub mod enumerator;
pub mod fixtures;
pub mod oracle;
pub mod random_cfgs;
